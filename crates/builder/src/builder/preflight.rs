//! Host tool checks.
//!
//! The pipeline shells out for everything, so a missing host tool surfaces
//! hours into a run otherwise. `doctor` front-loads that discovery.

use anyhow::{bail, Result};

/// Tools every full run needs on the host.
const REQUIRED: &[&str] = &["git", "curl", "tar", "make", "ninja", "python3", "c++"];

/// Tools that appear on the search path only after provisioning/building.
const BUILT_LATER: &[&str] = &["emcmake", "em++", "wasm-opt", "npm"];

pub fn doctor() -> Result<()> {
    println!("Checking host tools...");

    let mut missing = Vec::new();
    for tool in REQUIRED {
        match which::which(tool) {
            Ok(path) => println!("  {tool:10} {}", path.display()),
            Err(_) => {
                println!("  {tool:10} MISSING");
                missing.push(*tool);
            }
        }
    }

    for tool in BUILT_LATER {
        if which::which(tool).is_err() {
            println!("  {tool:10} not found yet (provided by the pipeline itself)");
        }
    }

    if !missing.is_empty() {
        bail!("missing host tools: {}", missing.join(", "));
    }

    println!("Host looks ready.");
    Ok(())
}
