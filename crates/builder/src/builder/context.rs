//! Workspace layout and the shared build context.
//!
//! Every path the pipeline reads or writes derives from one root. Stages
//! never hand each other in-memory state; these well-known directories are
//! the only cross-stage channel.

use super::env::ToolEnv;
use super::repos;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// CMake build type per component.
pub const LLVM_BUILD_TYPE: &str = "Release";
pub const LLVM_BROWSER_BUILD_TYPE: &str = "Release";
pub const BINARYEN_BUILD_TYPE: &str = "RelWithDebInfo";
pub const OPTIMIZER_BUILD_TYPE: &str = "RelWithDebInfo";
pub const CLANG_FORMAT_BUILD_TYPE: &str = "Release";
pub const CLANG_BUILD_TYPE: &str = "Release";
pub const RUNTIME_BUILD_TYPE: &str = "Debug";

/// Directory layout under the workspace root.
#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Layout { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Native tool and web app sources compiled/copied by the later stages.
    pub fn src_dir(&self) -> PathBuf {
        self.root.join("src")
    }

    pub fn download_dir(&self) -> PathBuf {
        self.root.join("download")
    }

    pub fn repos_dir(&self) -> PathBuf {
        self.root.join("repos")
    }

    pub fn repo(&self, name: &str) -> PathBuf {
        self.repos_dir().join(name)
    }

    pub fn build_dir(&self) -> PathBuf {
        self.root.join("build")
    }

    pub fn install_dir(&self) -> PathBuf {
        self.root.join("install")
    }

    pub fn dist_dir(&self) -> PathBuf {
        self.root.join("dist")
    }

    /// Servable root assembled by the final stage.
    pub fn http_dir(&self) -> PathBuf {
        self.build_dir().join("http")
    }

    /// Input stamps for stages that declare inputs.
    pub fn stamp_dir(&self) -> PathBuf {
        self.build_dir().join(".stamps")
    }

    pub fn cmake_install(&self) -> PathBuf {
        self.install_dir().join("cmake")
    }

    pub fn llvm_build(&self) -> PathBuf {
        self.build_dir().join(format!("llvm-{LLVM_BUILD_TYPE}"))
    }

    pub fn llvm_install(&self) -> PathBuf {
        self.install_dir().join(format!("llvm-{LLVM_BUILD_TYPE}"))
    }

    pub fn llvm_browser_build(&self) -> PathBuf {
        self.build_dir()
            .join(format!("llvm-browser-{LLVM_BROWSER_BUILD_TYPE}"))
    }

    pub fn llvm_browser_install(&self) -> PathBuf {
        self.install_dir()
            .join(format!("llvm-browser-{LLVM_BROWSER_BUILD_TYPE}"))
    }

    pub fn binaryen_build(&self) -> PathBuf {
        self.build_dir()
            .join(format!("binaryen-{BINARYEN_BUILD_TYPE}"))
    }

    pub fn binaryen_install(&self) -> PathBuf {
        self.install_dir()
            .join(format!("binaryen-{BINARYEN_BUILD_TYPE}"))
    }

    pub fn optimizer_build(&self) -> PathBuf {
        self.build_dir()
            .join(format!("optimizer-{OPTIMIZER_BUILD_TYPE}"))
    }

    pub fn rtl_build(&self) -> PathBuf {
        self.build_dir().join("rtl")
    }

    pub fn tools_build(&self) -> PathBuf {
        self.build_dir().join("tools")
    }

    pub fn node_dir(&self) -> PathBuf {
        self.build_dir().join("node")
    }

    pub fn clang_format_build(&self) -> PathBuf {
        self.build_dir()
            .join(format!("clang-format-browser-{CLANG_FORMAT_BUILD_TYPE}"))
    }

    pub fn clang_build(&self) -> PathBuf {
        self.build_dir()
            .join(format!("clang-browser-{CLANG_BUILD_TYPE}"))
    }

    pub fn runtime_build(&self) -> PathBuf {
        self.build_dir()
            .join(format!("runtime-browser-{RUNTIME_BUILD_TYPE}"))
    }
}

/// Read-only state handed to every stage.
///
/// Constructed once per run; stages communicate only through the layout's
/// directories, never by mutating this.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub layout: Layout,
    pub tools: ToolEnv,
    /// Job count handed to the parallel-capable external builds.
    pub jobs: usize,
    /// Release tag pinning every pushable fork; `None` tracks branches.
    pub release_tag: Option<&'static str>,
}

impl BuildContext {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let layout = Layout::new(absolute(root.into())?);
        let tools = ToolEnv::for_layout(&layout);
        Ok(BuildContext {
            layout,
            tools,
            jobs: jobs(),
            release_tag: repos::RELEASE_TAG,
        })
    }
}

fn absolute(root: PathBuf) -> Result<PathBuf> {
    if root.is_absolute() {
        return Ok(root);
    }
    let cwd = std::env::current_dir().context("cannot determine the current directory")?;
    Ok(cwd.join(root))
}

fn jobs() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZero::get)
        .unwrap_or(1)
}
