//! Third-party archive cache.
//!
//! A file already present under the download root is trusted as-is: no
//! checksum, no freshness check. A truncated download therefore satisfies
//! later runs until the operator deletes it by hand.

use super::context::BuildContext;
use super::exec::Cmd;
use anyhow::{bail, Context, Result};
use std::path::PathBuf;

/// Local filename for a URL: the final path segment, query/fragment
/// stripped.
pub fn basename(url: &str) -> Result<&str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let name = path.rsplit('/').next().unwrap_or("");
    if name.is_empty() {
        bail!("cannot derive a filename from `{url}`");
    }
    Ok(name)
}

/// Fetch `url` into the download cache unless the target file already
/// exists. Returns the cached path either way.
pub fn ensure(ctx: &BuildContext, url: &str, name: Option<&str>) -> Result<PathBuf> {
    let name = match name {
        Some(name) => name,
        None => basename(url)?,
    };
    let dest = ctx.layout.download_dir().join(name);

    if dest.exists() {
        return Ok(dest);
    }

    std::fs::create_dir_all(ctx.layout.download_dir())
        .context("creating the download directory")?;

    let dest_arg = dest
        .to_str()
        .context("download path contains invalid UTF-8")?;
    Cmd::new("curl")
        .args(["-L", "-f", "-S", "-o", dest_arg, url])
        .run(&ctx.tools)?;

    Ok(dest)
}
