//! Pipeline stages.
//!
//! Declaration order is execution order; dependencies come first. Each
//! module holds one stage (or one family of closely related stages) and
//! nothing else reaches into its build directories.

pub mod apps;
pub mod binaryen;
pub mod browser;
pub mod cmake;
pub mod dist;
pub mod emscripten;
pub mod llvm;
pub mod pack;
pub mod rtl;
pub mod sources;
pub mod tools;

use super::stage::Stage;

/// All registered stages, in dependency order.
pub static STAGES: &[&dyn Stage] = &[
    &sources::Sources,
    &cmake::CmakeToolchain,
    &llvm::HostLlvm,
    &binaryen::Binaryen,
    &emscripten::Emscripten,
    &tools::NativeTools,
    &browser::BrowserLlvm,
    &dist::Dist,
    &rtl::Rtl,
    &apps::ClangFormatApp,
    &apps::ClangApp,
    &apps::RuntimeApp,
    &pack::HttpRoot,
];

/// Get a stage by name.
pub fn get(name: &str) -> Option<&'static dyn Stage> {
    STAGES.iter().find(|s| s.name() == name).copied()
}

/// List all stage names.
pub fn names() -> impl Iterator<Item = &'static str> {
    STAGES.iter().map(|s| s.name())
}
