//! Native helper tools, compiled with the freshly installed clang.
//!
//! These run on the host during later stages: the archive/link helpers the
//! browser apps use and the data combiner for their preload bundles.

use crate::builder::context::BuildContext;
use crate::builder::exec::Cmd;
use crate::builder::stage::Stage;
use anyhow::Result;
use std::path::PathBuf;

pub struct NativeTools;

impl Stage for NativeTools {
    fn name(&self) -> &'static str {
        "tools"
    }

    fn marker(&self, _ctx: &BuildContext) -> Option<PathBuf> {
        None
    }

    fn run(&self, ctx: &BuildContext) -> Result<()> {
        let build = ctx.layout.tools_build();

        if !build.is_dir() {
            std::fs::create_dir_all(&build)?;
            Cmd::new("cmake")
                .args(["-G", "Ninja", "-DCMAKE_BUILD_TYPE=Debug"])
                .arg(ctx.layout.src_dir())
                .dir(&build)
                .env("CXX", ctx.layout.llvm_install().join("bin/clang++"))
                .run(&ctx.tools)?;
        }

        Cmd::new("ninja")
            .args(["cib-link", "cib-ar", "combine-data"])
            .dir(&build)
            .run(&ctx.tools)?;

        Ok(())
    }
}
