//! Staged build pipeline for the browser Clang toolchain.
//!
//! Structure:
//! - `context` - workspace layout and the shared, read-only build context
//! - `env` - tool environment applied to every spawned command
//! - `exec` - external command invocations
//! - `download` - third-party archive cache
//! - `repos` - source repository provisioning
//! - `stage` / `stamp` - stage abstraction, sequential pipeline, input stamps
//! - `components/` - the concrete stages, in dependency order
//! - `preflight` - host tool checks
//! - `serve` - static file serving of the packed output

pub mod components;
pub mod context;
pub mod download;
pub mod env;
pub mod exec;
pub mod preflight;
pub mod repos;
pub mod serve;
pub mod stage;
pub mod stamp;

use anyhow::{bail, Result};
use clap::Subcommand;
use context::BuildContext;
use stage::Outcome;

/// Build commands for the CLI.
#[derive(Subcommand)]
pub enum BuildCommands {
    /// Provision sources and run every stage in order
    All,
    /// Clone any missing source repositories
    Fetch,
    /// Run a single stage by name
    Stage {
        /// Stage name (see `builder status`)
        name: String,
    },
    /// Show source and stage status
    Status,
    /// Remove derived outputs (never sources or the download cache)
    Clean,
    /// Check that the required host tools are present
    Doctor,
    /// Serve the packed distribution over HTTP
    Serve {
        /// Port to listen on
        #[arg(long, default_value_t = serve::PORT)]
        port: u16,
    },
}

/// Run the whole pipeline and print the per-stage report.
pub fn build_all(ctx: &BuildContext) -> Result<()> {
    println!("=== Building browser toolchain ===\n");

    let report = stage::run_pipeline(ctx, components::STAGES)?;

    println!("\n=== Build complete ===");
    print_report(&report);
    println!("Serve with: builder serve");

    Ok(())
}

/// Run one stage by name, honoring its completion marker.
pub fn run_stage(ctx: &BuildContext, name: &str) -> Result<()> {
    let Some(found) = components::get(name) else {
        let known: Vec<_> = components::names().collect();
        bail!("unknown stage `{name}` (expected one of: {})", known.join(", "));
    };

    let report = stage::run_pipeline(ctx, &[found])?;
    print_report(&report);
    Ok(())
}

/// Show which sources are checked out and which stages are complete.
pub fn status(ctx: &BuildContext) -> Result<()> {
    repos::status(ctx, repos::REPOS);

    println!("\nStages:");
    for found in components::STAGES {
        match found.marker(ctx) {
            Some(marker) => {
                let state = if stage::is_complete(ctx, *found)? {
                    "done   "
                } else {
                    "pending"
                };
                println!("  {:16} [{state}] {}", found.name(), marker.display());
            }
            None => println!("  {:16} [always runs]", found.name()),
        }
    }

    Ok(())
}

/// Remove every derived output directory.
///
/// Sources and the download cache survive: re-fetching them is the expensive
/// part the cache exists to avoid.
pub fn clean(ctx: &BuildContext) -> Result<()> {
    for dir in [
        ctx.layout.build_dir(),
        ctx.layout.install_dir(),
        ctx.layout.dist_dir(),
    ] {
        if dir.exists() {
            std::fs::remove_dir_all(&dir)?;
            println!("Removed {}", dir.display());
        }
    }
    Ok(())
}

fn print_report(report: &[(&'static str, Outcome)]) {
    for (name, outcome) in report {
        let what = match outcome {
            Outcome::Built => "built",
            Outcome::Skipped => "skipped",
        };
        println!("  {name:16} {what}");
    }
}
