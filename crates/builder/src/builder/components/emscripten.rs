//! Emscripten optimizer build and first-run configuration.

use crate::builder::context::{BuildContext, OPTIMIZER_BUILD_TYPE};
use crate::builder::exec::Cmd;
use crate::builder::stage::Stage;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::PathBuf;

pub struct Emscripten;

impl Stage for Emscripten {
    fn name(&self) -> &'static str {
        "emscripten"
    }

    // Two independent gates inside: the optimizer build directory and the
    // per-user config file.
    fn marker(&self, _ctx: &BuildContext) -> Option<PathBuf> {
        None
    }

    fn run(&self, ctx: &BuildContext) -> Result<()> {
        let build = ctx.layout.optimizer_build();

        if !build.is_dir() {
            std::fs::create_dir_all(&build)?;
            Cmd::new("cmake")
                .args(["-G", "Ninja"])
                .arg(format!("-DCMAKE_BUILD_TYPE={OPTIMIZER_BUILD_TYPE}"))
                .arg(ctx.layout.repo("emscripten").join("tools/optimizer"))
                .dir(&build)
                .run(&ctx.tools)?;
        }

        Cmd::new("ninja").dir(&build).run(&ctx.tools)?;

        configure(ctx)
    }
}

/// One-time `~/.emscripten` setup: let em++ write its default config, point
/// it at the Binaryen install, then smoke-compile a test program so the
/// cached system libraries get built now rather than mid-pipeline.
fn configure(ctx: &BuildContext) -> Result<()> {
    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .context("HOME is not set")?;
    let config = home.join(".emscripten");
    if config.exists() {
        return Ok(());
    }

    Cmd::new("em++").run(&ctx.tools)?;

    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .open(&config)
        .with_context(|| format!("opening {}", config.display()))?;
    writeln!(
        file,
        "\nBINARYEN_ROOT='{}'",
        ctx.layout.binaryen_install().display()
    )?;

    let dummy = ctx.layout.build_dir().join("dummy");
    std::fs::create_dir_all(&dummy)?;
    Cmd::new("em++")
        .arg(ctx.layout.src_dir().join("say-hello.cpp"))
        .args(["-o", "say-hello.html"])
        .dir(&dummy)
        .run(&ctx.tools)?;

    Ok(())
}
