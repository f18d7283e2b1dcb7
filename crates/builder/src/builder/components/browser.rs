//! Browser (WebAssembly) build of the compiler libraries.
//!
//! Cross-compiled with emcmake. Tablegen must run on the host, so the
//! configure points at the binaries from the native build; only the listed
//! static libraries are built, since the apps link them directly and the
//! LLVM tool binaries would be dead weight in a wasm bundle.

use crate::builder::context::{BuildContext, LLVM_BROWSER_BUILD_TYPE};
use crate::builder::exec::Cmd;
use crate::builder::stage::Stage;
use anyhow::Result;
use std::path::PathBuf;

/// Static libraries the browser apps link against.
pub const TARGETS: &[&str] = &[
    "clangAnalysis",
    "clangAST",
    "clangBasic",
    "clangCodeGen",
    "clangDriver",
    "clangEdit",
    "clangFormat",
    "clangFrontend",
    "clangLex",
    "clangParse",
    "clangRewrite",
    "clangSema",
    "clangSerialization",
    "clangToolingCore",
    "LLVMAnalysis",
    "LLVMAsmParser",
    "LLVMAsmPrinter",
    "LLVMBinaryFormat",
    "LLVMBitReader",
    "LLVMBitWriter",
    "LLVMCodeGen",
    "LLVMCore",
    "LLVMCoroutines",
    "LLVMCoverage",
    "LLVMDebugInfoCodeView",
    "LLVMGlobalISel",
    "LLVMInstCombine",
    "LLVMInstrumentation",
    "LLVMipo",
    "LLVMIRReader",
    "LLVMLinker",
    "LLVMLTO",
    "LLVMMC",
    "LLVMMCDisassembler",
    "LLVMMCParser",
    "LLVMObjCARCOpts",
    "LLVMObject",
    "LLVMOption",
    "LLVMPasses",
    "LLVMProfileData",
    "LLVMScalarOpts",
    "LLVMSelectionDAG",
    "LLVMSupport",
    "LLVMTarget",
    "LLVMTransformUtils",
    "LLVMVectorize",
    "LLVMWebAssemblyAsmPrinter",
    "LLVMWebAssemblyCodeGen",
    "LLVMWebAssemblyDesc",
    "LLVMWebAssemblyInfo",
];

pub struct BrowserLlvm;

impl Stage for BrowserLlvm {
    fn name(&self) -> &'static str {
        "llvm-browser"
    }

    fn marker(&self, _ctx: &BuildContext) -> Option<PathBuf> {
        None
    }

    fn run(&self, ctx: &BuildContext) -> Result<()> {
        let build = ctx.layout.llvm_browser_build();
        let host_install = ctx.layout.llvm_install();

        if !build.is_dir() {
            std::fs::create_dir_all(&build)?;
            Cmd::new("emcmake")
                .args(["cmake", "-G", "Ninja"])
                // Sanitizer switches get parked here when debugging the
                // wasm build; empty for release runs.
                .arg("-DCMAKE_CXX_FLAGS=")
                .arg(format!(
                    "-DLIBCXXABI_LIBCXX_INCLUDES={}",
                    host_install.join("include/c++/v1").display()
                ))
                .args([
                    "-DLLVM_ENABLE_DUMP=OFF",
                    "-DLLVM_ENABLE_ASSERTIONS=OFF",
                    "-DLLVM_ENABLE_EXPENSIVE_CHECKS=OFF",
                    "-DLLVM_ENABLE_BACKTRACES=OFF",
                ])
                .arg(format!(
                    "-DCMAKE_INSTALL_PREFIX={}",
                    ctx.layout.llvm_browser_install().display()
                ))
                .arg(format!("-DCMAKE_BUILD_TYPE={LLVM_BROWSER_BUILD_TYPE}"))
                .args([
                    "-DLLVM_TARGETS_TO_BUILD=",
                    "-DLLVM_EXPERIMENTAL_TARGETS_TO_BUILD=WebAssembly",
                    "-DLLVM_BUILD_TOOLS=OFF",
                    "-DLLVM_ENABLE_THREADS=OFF",
                    "-DLLVM_BUILD_LLVM_DYLIB=OFF",
                    "-DLLVM_INCLUDE_TESTS=OFF",
                ])
                .arg(format!(
                    "-DLLVM_TABLEGEN={}",
                    host_install.join("bin/llvm-tblgen").display()
                ))
                .arg(format!(
                    "-DCLANG_TABLEGEN={}",
                    ctx.layout.llvm_build().join("bin/clang-tblgen").display()
                ))
                .arg(ctx.layout.repo("llvm"))
                .dir(&build)
                .run(&ctx.tools)?;
        }

        Cmd::new("ninja")
            .args(TARGETS.iter().copied())
            .dir(&build)
            .run(&ctx.tools)?;

        Ok(())
    }
}
