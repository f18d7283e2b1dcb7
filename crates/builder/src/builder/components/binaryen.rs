//! Binaryen build: the wasm-level tools (wasm-opt and friends) plus the
//! binaryen.js artifacts the distribution ships.

use crate::builder::context::{BuildContext, BINARYEN_BUILD_TYPE};
use crate::builder::exec::Cmd;
use crate::builder::stage::Stage;
use anyhow::Result;
use std::path::PathBuf;

pub struct Binaryen;

impl Stage for Binaryen {
    fn name(&self) -> &'static str {
        "binaryen"
    }

    fn marker(&self, ctx: &BuildContext) -> Option<PathBuf> {
        Some(ctx.layout.binaryen_install())
    }

    fn run(&self, ctx: &BuildContext) -> Result<()> {
        let build = ctx.layout.binaryen_build();
        let install = ctx.layout.binaryen_install();

        if !build.is_dir() {
            std::fs::create_dir_all(&build)?;
            Cmd::new("cmake")
                .args(["-G", "Ninja"])
                .arg(format!("-DCMAKE_INSTALL_PREFIX={}", install.display()))
                .arg(format!("-DCMAKE_BUILD_TYPE={BINARYEN_BUILD_TYPE}"))
                .arg(ctx.layout.repo("binaryen"))
                .dir(&build)
                .run(&ctx.tools)?;
        }

        Cmd::new("ninja").dir(&build).run(&ctx.tools)?;

        if !install.is_dir() {
            std::fs::create_dir_all(&install)?;
            Cmd::new("ninja").arg("install").dir(&build).run(&ctx.tools)?;
        }

        Ok(())
    }
}
