//! Tool environment applied to every spawned command.
//!
//! Locally built binaries shadow the system ones, and the variables point
//! the invoked build tools at their sibling artifacts. Constructed once,
//! read-only afterwards; commands never see ad-hoc environment mutation
//! beyond this plus any per-invocation overrides on [`super::exec::Cmd`].

use super::context::Layout;
use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::process::Command;

#[derive(Debug, Clone)]
pub struct ToolEnv {
    /// Prepended to `PATH`, highest priority first.
    path_prefix: Vec<PathBuf>,
    vars: Vec<(&'static str, PathBuf)>,
}

impl ToolEnv {
    pub fn for_layout(layout: &Layout) -> Self {
        let path_prefix = vec![
            layout.node_dir().join("bin"),
            layout.repo("emscripten"),
            layout.cmake_install().join("bin"),
            layout.llvm_install().join("bin"),
            layout.binaryen_install().join("bin"),
        ];
        let vars = vec![
            ("BINARYEN", layout.binaryen_install()),
            (
                "EMSCRIPTEN_NATIVE_OPTIMIZER",
                layout.optimizer_build().join("optimizer"),
            ),
            ("LD_LIBRARY_PATH", layout.llvm_install().join("lib")),
            // npm must not touch the operator's per-user state.
            ("npm_config_cache", layout.build_dir().join(".npm")),
            (
                "npm_config_init_module",
                layout.build_dir().join(".npm-init.js"),
            ),
            ("npm_config_userconfig", layout.build_dir().join(".npmrc")),
        ];
        ToolEnv { path_prefix, vars }
    }

    /// Apply the search path and tool variables to one command.
    pub fn apply(&self, cmd: &mut Command) -> Result<()> {
        let existing = env::var_os("PATH").unwrap_or_default();
        let mut paths = self.path_prefix.clone();
        paths.extend(env::split_paths(&existing));
        cmd.env(
            "PATH",
            env::join_paths(paths).context("building the search path")?,
        );

        for (key, value) in &self.vars {
            cmd.env(key, value);
        }
        Ok(())
    }
}
