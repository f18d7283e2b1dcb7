//! Servable root assembly.
//!
//! `build/http` is a symlink farm over the freshest artifacts, so serving
//! never needs a re-copy after an app rebuild. Serving itself is delegated
//! to an external file server (see `serve`).

use crate::builder::context::BuildContext;
use crate::builder::stage::Stage;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub struct HttpRoot;

impl Stage for HttpRoot {
    fn name(&self) -> &'static str {
        "http-root"
    }

    fn marker(&self, _ctx: &BuildContext) -> Option<PathBuf> {
        None
    }

    fn run(&self, ctx: &BuildContext) -> Result<()> {
        let http = ctx.layout.http_dir();
        std::fs::create_dir_all(&http)?;

        let clang_format = ctx.layout.clang_format_build();
        let clang = ctx.layout.clang_build();
        let runtime = ctx.layout.runtime_build();
        let dist = ctx.layout.dist_dir();
        let src = ctx.layout.src_dir();

        let links: &[(PathBuf, &str)] = &[
            (clang_format.join("clang-format.js"), "clang-format.js"),
            (clang_format.join("clang-format.wasm"), "clang-format.wasm"),
            (clang.join("clang.js"), "clang.js"),
            (clang.join("clang.data"), "clang.data"),
            // The re-optimized binary serves under the plain name.
            (clang.join("clang-opt.wasm"), "clang.wasm"),
            (runtime.join("runtime.js"), "runtime.js"),
            (runtime.join("runtime.wasm"), "runtime.wasm"),
            (dist.join("monaco-editor"), "monaco-editor"),
            (dist.join("golden-layout"), "golden-layout"),
            (dist.join(super::dist::JQUERY_NAME), super::dist::JQUERY_NAME),
            (dist.join("zip.js"), "zip.js"),
            (dist.join("binaryen.js"), "binaryen.js"),
            (dist.join("binaryen.wasm"), "binaryen.wasm"),
            (src.join("clang.html"), "clang.html"),
            (src.join("process.js"), "process.js"),
            (src.join("process-manager.js"), "process-manager.js"),
            (src.join("process-clang-format.js"), "process-clang-format.js"),
            (src.join("process-clang.js"), "process-clang.js"),
            (src.join("process-runtime.js"), "process-runtime.js"),
            (src.join("wasm-tools.js"), "wasm-tools.js"),
        ];

        for (target, name) in links {
            link(&http, target, name)?;
        }

        println!("  Assembled {}", http.display());
        Ok(())
    }
}

/// Replace-then-link, so re-runs repoint stale links instead of failing.
fn link(http: &Path, target: &Path, name: &str) -> Result<()> {
    let path = http.join(name);
    if path.symlink_metadata().is_ok() {
        std::fs::remove_file(&path)?;
    }
    std::os::unix::fs::symlink(target, &path)
        .with_context(|| format!("linking {name} -> {}", target.display()))?;
    Ok(())
}
