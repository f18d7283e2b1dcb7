//! Host LLVM/Clang build.
//!
//! Native X86 plus the experimental WebAssembly backend. The install feeds
//! the app link steps, and the browser cross build borrows its headers and
//! tablegen binaries.

use crate::builder::context::{BuildContext, LLVM_BUILD_TYPE};
use crate::builder::exec::Cmd;
use crate::builder::stage::Stage;
use anyhow::Result;
use std::path::PathBuf;

pub struct HostLlvm;

impl Stage for HostLlvm {
    fn name(&self) -> &'static str {
        "llvm"
    }

    fn marker(&self, ctx: &BuildContext) -> Option<PathBuf> {
        Some(ctx.layout.llvm_install())
    }

    fn run(&self, ctx: &BuildContext) -> Result<()> {
        let build = ctx.layout.llvm_build();
        let install = ctx.layout.llvm_install();

        if !build.is_dir() {
            std::fs::create_dir_all(&build)?;
            Cmd::new("cmake")
                .args(["-G", "Ninja"])
                .arg(format!("-DCMAKE_INSTALL_PREFIX={}", install.display()))
                .arg(format!("-DCMAKE_BUILD_TYPE={LLVM_BUILD_TYPE}"))
                .arg("-DLLVM_TARGETS_TO_BUILD=X86")
                .arg("-DLLVM_EXPERIMENTAL_TARGETS_TO_BUILD=WebAssembly")
                .arg(ctx.layout.repo("llvm"))
                .dir(&build)
                .run(&ctx.tools)?;
        }

        // ninja is incremental; rerunning after an interrupted compile
        // resumes where it stopped.
        Cmd::new("ninja").dir(&build).run(&ctx.tools)?;

        if !install.is_dir() {
            std::fs::create_dir_all(&install)?;
            Cmd::new("ninja")
                .args(["install", "install-cxx", "install-cxxabi", "install-compiler-rt"])
                .dir(&build)
                .run(&ctx.tools)?;
        }

        Ok(())
    }
}
