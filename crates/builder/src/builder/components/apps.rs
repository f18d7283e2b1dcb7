//! Browser apps: the wasm tools users actually load.
//!
//! All three share one emcmake project; each stage configures the project
//! into its own build directory, compiles one ninja target, and copies the
//! artifacts into dist/.

use super::dist::{copy_into, copy_tree_into};
use crate::builder::context::{
    BuildContext, CLANG_BUILD_TYPE, CLANG_FORMAT_BUILD_TYPE, RUNTIME_BUILD_TYPE,
};
use crate::builder::exec::Cmd;
use crate::builder::stage::Stage;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Re-run wasm-opt over the compiler app; costs minutes, saves megabytes.
const REOPTIMIZE_CLANG: bool = true;

fn configure_app(ctx: &BuildContext, build_type: &str, build: &Path) -> Result<()> {
    if build.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(build)?;
    Cmd::new("emcmake")
        .args(["cmake", "-G", "Ninja"])
        .arg(format!("-DCMAKE_BUILD_TYPE={build_type}"))
        .arg(format!(
            "-DLLVM_BUILD={}",
            ctx.layout.llvm_browser_build().display()
        ))
        .arg("-DEMSCRIPTEN=on")
        .arg(ctx.layout.src_dir())
        .dir(build)
        .run(&ctx.tools)
}

fn compile_app(
    ctx: &BuildContext,
    target: &str,
    build: &Path,
    extra_env: Option<(&str, &str)>,
) -> Result<()> {
    let mut ninja = Cmd::new("ninja").arg(target).dir(build);
    if let Some((key, value)) = extra_env {
        ninja = ninja.env(key, value);
    }
    ninja.run(&ctx.tools)?;

    std::fs::create_dir_all(ctx.layout.dist_dir())?;
    Ok(())
}

pub struct ClangFormatApp;

impl Stage for ClangFormatApp {
    fn name(&self) -> &'static str {
        "app-clang-format"
    }

    fn marker(&self, _ctx: &BuildContext) -> Option<PathBuf> {
        None
    }

    fn run(&self, ctx: &BuildContext) -> Result<()> {
        let build = ctx.layout.clang_format_build();
        configure_app(ctx, CLANG_FORMAT_BUILD_TYPE, &build)?;
        compile_app(ctx, "clang-format", &build, None)?;

        let dist = ctx.layout.dist_dir();
        copy_into(ctx, &build.join("clang-format.js"), &dist)?;
        copy_into(ctx, &build.join("clang-format.wasm"), &dist)?;
        Ok(())
    }
}

pub struct ClangApp;

impl Stage for ClangApp {
    fn name(&self) -> &'static str {
        "app-clang"
    }

    fn marker(&self, _ctx: &BuildContext) -> Option<PathBuf> {
        None
    }

    fn run(&self, ctx: &BuildContext) -> Result<()> {
        let build = ctx.layout.clang_build();
        configure_app(ctx, CLANG_BUILD_TYPE, &build)?;
        prepare_sysroot(ctx, &build)?;
        compile_app(ctx, "clang", &build, None)?;

        if REOPTIMIZE_CLANG {
            Cmd::new("wasm-opt")
                .args(["-Os", "clang.wasm", "-o", "clang-opt.wasm"])
                .dir(&build)
                .run(&ctx.tools)?;
        } else {
            Cmd::new("cp")
                .args(["clang.wasm", "clang-opt.wasm"])
                .dir(&build)
                .run(&ctx.tools)?;
        }

        let dist = ctx.layout.dist_dir();
        copy_into(ctx, &build.join("clang.js"), &dist)?;
        copy_into(ctx, &build.join("clang.data"), &dist)?;
        copy_into(ctx, &build.join("clang-opt.wasm"), &dist.join("clang.wasm"))?;
        Ok(())
    }
}

/// Lay out the sysroot headers the in-browser compiler preloads: the
/// emscripten system headers plus the libc/libcxxabi arch includes, in the
/// tree shape the data bundler expects.
fn prepare_sysroot(ctx: &BuildContext, build: &Path) -> Result<()> {
    let usr = build.join("usr");
    std::fs::create_dir_all(usr.join("lib/libcxxabi"))?;
    std::fs::create_dir_all(usr.join("lib/libc/musl/arch/emscripten"))?;

    let system = ctx.layout.repo("emscripten").join("system");
    copy_tree_into(ctx, &system.join("include"), &usr)?;
    copy_tree_into(
        ctx,
        &system.join("lib/libcxxabi/include"),
        &usr.join("lib/libcxxabi"),
    )?;
    copy_tree_into(
        ctx,
        &system.join("lib/libc/musl/arch/emscripten"),
        &usr.join("lib/libc/musl/arch"),
    )?;
    Ok(())
}

pub struct RuntimeApp;

impl Stage for RuntimeApp {
    fn name(&self) -> &'static str {
        "app-runtime"
    }

    fn marker(&self, _ctx: &BuildContext) -> Option<PathBuf> {
        None
    }

    fn run(&self, ctx: &BuildContext) -> Result<()> {
        let build = ctx.layout.runtime_build();
        configure_app(ctx, RUNTIME_BUILD_TYPE, &build)?;
        compile_app(ctx, "runtime", &build, Some(("EMCC_FORCE_STDLIBS", "1")))?;

        // The support library is the payload the runtime app loads.
        Cmd::new("cp")
            .arg(ctx.layout.rtl_build().join("rtl"))
            .arg(build.join("runtime.wasm"))
            .run(&ctx.tools)?;

        let dist = ctx.layout.dist_dir();
        copy_into(ctx, &build.join("runtime.js"), &dist)?;
        copy_into(ctx, &build.join("runtime.wasm"), &dist)?;
        Ok(())
    }
}
