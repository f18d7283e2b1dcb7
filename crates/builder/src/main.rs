//! # Browser Clang toolchain builder
//!
//! Provisions the toolchain sources and drives the staged build: host
//! Clang/LLVM, Binaryen, the Emscripten optimizer, the browser (wasm)
//! build of the compiler libraries, the runtime apps, and the distributable
//! file tree they are served from.
//!
//! ## Usage
//!
//! ```bash
//! builder all            # provision sources + run every stage
//! builder fetch          # clone missing source repositories
//! builder stage llvm     # run one stage by name
//! builder status         # show sources and stage markers
//! builder serve          # serve the packed result over HTTP
//! ```
//!
//! ## Workspace
//!
//! All state lives under one root (`--root`, default the current
//! directory): `repos/` for checkouts, `download/` for cached archives,
//! `build/` and `install/` for stage outputs, `dist/` and `build/http` for
//! the packaged result. The root is also expected to hold `src/`, the
//! native tool and web app sources the later stages compile and copy.

use anyhow::Result;
use clap::Parser;

mod builder;

#[derive(Parser)]
#[command(name = "builder", about = "Browser Clang toolchain builder")]
struct Cli {
    /// Workspace root holding repos/, download/, build/, install/, dist/
    #[arg(long, default_value = ".")]
    root: std::path::PathBuf,

    #[command(subcommand)]
    command: builder::BuildCommands,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let ctx = builder::context::BuildContext::new(cli.root)?;

    match cli.command {
        builder::BuildCommands::All => builder::build_all(&ctx)?,
        builder::BuildCommands::Fetch => builder::repos::provision(&ctx, builder::repos::REPOS)?,
        builder::BuildCommands::Stage { name } => builder::run_stage(&ctx, &name)?,
        builder::BuildCommands::Status => builder::status(&ctx)?,
        builder::BuildCommands::Clean => builder::clean(&ctx)?,
        builder::BuildCommands::Doctor => builder::preflight::doctor()?,
        builder::BuildCommands::Serve { port } => builder::serve::serve(&ctx, port)?,
    }

    Ok(())
}
