//! Runtime support library.
//!
//! Compiled with the freshly built clang out of the host LLVM build tree;
//! the runtime app ships the result as its wasm payload.

use crate::builder::context::BuildContext;
use crate::builder::exec::Cmd;
use crate::builder::stage::Stage;
use anyhow::Result;
use std::path::PathBuf;

pub struct Rtl;

impl Stage for Rtl {
    fn name(&self) -> &'static str {
        "rtl"
    }

    fn marker(&self, _ctx: &BuildContext) -> Option<PathBuf> {
        None
    }

    fn run(&self, ctx: &BuildContext) -> Result<()> {
        let build = ctx.layout.rtl_build();
        let llvm_build = ctx.layout.llvm_build();

        if !build.is_dir() {
            std::fs::create_dir_all(&build)?;
            Cmd::new("cmake")
                .args(["-G", "Ninja"])
                .arg(format!("-DLLVM_INSTALL={}", llvm_build.display()))
                .arg(format!(
                    "-DCMAKE_C_COMPILER={}",
                    llvm_build.join("bin/clang").display()
                ))
                .arg(format!(
                    "-DCMAKE_CXX_COMPILER={}",
                    llvm_build.join("bin/clang++").display()
                ))
                .arg(ctx.layout.src_dir().join("rtl"))
                .dir(&build)
                .run(&ctx.tools)?;
        }

        Cmd::new("ninja").dir(&build).run(&ctx.tools)?;

        Ok(())
    }
}
