//! CMake bootstrap.
//!
//! The toolchain pins its own cmake; once installed it sits at the front of
//! the search path and the system one is never consulted again.

use crate::builder::context::BuildContext;
use crate::builder::download;
use crate::builder::exec::Cmd;
use crate::builder::stage::Stage;
use anyhow::Result;
use std::path::PathBuf;

const VERSION: &str = "3.11.0";
const URL: &str = "https://cmake.org/files/v3.11/cmake-3.11.0.tar.gz";

pub struct CmakeToolchain;

impl Stage for CmakeToolchain {
    fn name(&self) -> &'static str {
        "cmake"
    }

    fn marker(&self, ctx: &BuildContext) -> Option<PathBuf> {
        Some(ctx.layout.cmake_install())
    }

    // A re-fetched tarball invalidates the install.
    fn inputs(&self, ctx: &BuildContext) -> Vec<PathBuf> {
        vec![ctx
            .layout
            .download_dir()
            .join(format!("cmake-{VERSION}.tar.gz"))]
    }

    fn run(&self, ctx: &BuildContext) -> Result<()> {
        let tarball = download::ensure(ctx, URL, None)?;

        let src = ctx.layout.build_dir().join(format!("cmake-{VERSION}"));
        if !src.is_dir() {
            std::fs::create_dir_all(ctx.layout.build_dir())?;
            Cmd::new("tar")
                .arg("xf")
                .arg(&tarball)
                .dir(ctx.layout.build_dir())
                .run(&ctx.tools)?;

            let prefix = ctx.layout.cmake_install();
            Cmd::new("./bootstrap")
                .arg(format!("--prefix={}", prefix.display()))
                .arg(format!("--parallel={}", ctx.jobs))
                .dir(&src)
                .run(&ctx.tools)?;
            Cmd::new("make")
                .arg(format!("-j{}", ctx.jobs))
                .dir(&src)
                .run(&ctx.tools)?;
            Cmd::new("make")
                .arg("install")
                .arg(format!("-j{}", ctx.jobs))
                .dir(&src)
                .run(&ctx.tools)?;
        }

        Ok(())
    }
}
