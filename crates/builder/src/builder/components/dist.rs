//! Third-party pieces of the distribution.
//!
//! Everything here is download-extract-copy. Archives stay in the download
//! cache, extraction is gated on the extracted directory, and the copies
//! use `cp -au` so re-runs only touch what changed.

use crate::builder::context::BuildContext;
use crate::builder::download;
use crate::builder::exec::Cmd;
use crate::builder::stage::Stage;
use anyhow::Result;
use std::path::{Path, PathBuf};

const NODE_NAME: &str = "node-v8.11.1-linux-x64";
const NODE_URL: &str = "https://nodejs.org/dist/v8.11.1/node-v8.11.1-linux-x64.tar.xz";

const MONACO_NAME: &str = "monaco-editor-0.10.1";
const MONACO_URL: &str =
    "https://registry.npmjs.org/monaco-editor/-/monaco-editor-0.10.1.tgz";

pub const JQUERY_NAME: &str = "jquery-1.11.1.min.js";
const JQUERY_URL: &str = "http://code.jquery.com/jquery-1.11.1.min.js";

const GOLDEN_LAYOUT_NAME: &str = "golden-layout-1.5.9";
const GOLDEN_LAYOUT_TARBALL: &str = "golden-layout-v1.5.9.tar.gz";
const GOLDEN_LAYOUT_URL: &str =
    "https://github.com/WolframHempel/golden-layout/archive/v1.5.9.tar.gz";

/// Editor page scripts copied straight from the app sources.
const APP_FILES: &[&str] = &[
    "clang.html",
    "process.js",
    "process-manager.js",
    "process-clang-format.js",
    "process-clang.js",
    "process-runtime.js",
    "wasm-tools.js",
];

pub struct Dist;

impl Stage for Dist {
    fn name(&self) -> &'static str {
        "dist"
    }

    // cp -au makes the whole action cheap to repeat, and repeating it is
    // what refreshes dist/ after an app rebuild.
    fn marker(&self, _ctx: &BuildContext) -> Option<PathBuf> {
        None
    }

    fn run(&self, ctx: &BuildContext) -> Result<()> {
        let dist = ctx.layout.dist_dir();
        std::fs::create_dir_all(&dist)?;

        node(ctx)?;
        monaco(ctx)?;
        jquery(ctx)?;
        golden_layout(ctx)?;
        zip_js(ctx)?;
        binaryen_js(ctx)?;
        app_sources(ctx)?;

        Ok(())
    }
}

/// Pinned node toolchain plus the bundler the web build invokes.
fn node(ctx: &BuildContext) -> Result<()> {
    let tarball = download::ensure(ctx, NODE_URL, None)?;
    let build = ctx.layout.build_dir();

    if !build.join(NODE_NAME).is_dir() {
        std::fs::create_dir_all(&build)?;
        Cmd::new("tar").arg("-xf").arg(&tarball).dir(&build).run(&ctx.tools)?;
        Cmd::new("ln")
            .args(["-sfn", NODE_NAME, "node"])
            .dir(&build)
            .run(&ctx.tools)?;
        // npm resolves through the node prefix on the search path.
        Cmd::new("npm").args(["i", "-g", "browserify"]).run(&ctx.tools)?;
    }

    Ok(())
}

fn monaco(ctx: &BuildContext) -> Result<()> {
    let tarball = download::ensure(ctx, MONACO_URL, None)?;

    let extracted = ctx.layout.download_dir().join(MONACO_NAME);
    if !extracted.is_dir() {
        std::fs::create_dir_all(&extracted)?;
        Cmd::new("tar").arg("-xf").arg(&tarball).dir(&extracted).run(&ctx.tools)?;
    }

    let dest = ctx.layout.dist_dir().join("monaco-editor");
    std::fs::create_dir_all(&dest)?;
    let package = extracted.join("package");
    for name in ["LICENSE", "README.md", "ThirdPartyNotices.txt"] {
        copy_into(ctx, &package.join(name), &dest)?;
    }
    copy_tree_into(ctx, &package.join("min"), &dest)?;

    Ok(())
}

fn jquery(ctx: &BuildContext) -> Result<()> {
    let file = download::ensure(ctx, JQUERY_URL, None)?;
    copy_into(ctx, &file, &ctx.layout.dist_dir())?;
    Ok(())
}

fn golden_layout(ctx: &BuildContext) -> Result<()> {
    let tarball = download::ensure(ctx, GOLDEN_LAYOUT_URL, Some(GOLDEN_LAYOUT_TARBALL))?;

    let extracted = ctx.layout.download_dir().join(GOLDEN_LAYOUT_NAME);
    if !extracted.is_dir() {
        Cmd::new("tar")
            .arg("-xf")
            .arg(&tarball)
            .dir(ctx.layout.download_dir())
            .run(&ctx.tools)?;
    }

    let dest = ctx.layout.dist_dir().join("golden-layout");
    std::fs::create_dir_all(&dest)?;
    copy_into(ctx, &extracted.join("LICENSE"), &dest)?;
    copy_into(ctx, &extracted.join("src/css/goldenlayout-base.css"), &dest)?;
    copy_into(
        ctx,
        &extracted.join("src/css/goldenlayout-light-theme.css"),
        &dest,
    )?;
    copy_into(ctx, &extracted.join("dist/goldenlayout.min.js"), &dest)?;

    Ok(())
}

fn zip_js(ctx: &BuildContext) -> Result<()> {
    let dest = ctx.layout.dist_dir().join("zip.js");
    std::fs::create_dir_all(&dest)?;
    let content = ctx.layout.repo("zip.js").join("WebContent");
    copy_into(ctx, &content.join("inflate.js"), &dest)?;
    copy_into(ctx, &content.join("zip.js"), &dest)?;
    Ok(())
}

fn binaryen_js(ctx: &BuildContext) -> Result<()> {
    let dist = ctx.layout.dist_dir();
    let repo = ctx.layout.repo("binaryen");
    copy_into(ctx, &repo.join("bin/binaryen.js"), &dist)?;
    copy_into(ctx, &repo.join("bin/binaryen.wasm"), &dist)?;
    copy_into(ctx, &repo.join("LICENSE"), &dist.join("binaryen-LICENSE"))?;
    Ok(())
}

fn app_sources(ctx: &BuildContext) -> Result<()> {
    let src = ctx.layout.src_dir();
    for name in APP_FILES {
        copy_into(ctx, &src.join(name), &ctx.layout.dist_dir())?;
    }
    Ok(())
}

/// `cp -au`: copy unless the destination is at least as new.
pub fn copy_into(ctx: &BuildContext, file: &Path, dest: &Path) -> Result<()> {
    Cmd::new("cp").arg("-au").arg(file).arg(dest).run(&ctx.tools)
}

/// Recursive `cp -au` for directory trees.
pub fn copy_tree_into(ctx: &BuildContext, tree: &Path, dest: &Path) -> Result<()> {
    Cmd::new("cp").arg("-auv").arg(tree).arg(dest).run(&ctx.tools)
}
