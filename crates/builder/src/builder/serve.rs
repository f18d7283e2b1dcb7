//! Static file serving of the packed distribution.
//!
//! The server is an external collaborator like every other tool here: any
//! single-process static file server will do, so the stock python one is
//! spawned over the http root and blocks until interrupted.

use super::context::BuildContext;
use super::exec::Cmd;
use anyhow::{bail, Result};

/// Default port for the packed distribution.
pub const PORT: u16 = 8000;

pub fn serve(ctx: &BuildContext, port: u16) -> Result<()> {
    let http = ctx.layout.http_dir();
    if !http.is_dir() {
        bail!(
            "{} not assembled yet; run `builder all` (or `builder stage http-root`) first",
            http.display()
        );
    }

    println!("Serving {} at http://localhost:{port}/", http.display());
    Cmd::new("python3")
        .args(["-m", "http.server"])
        .arg(port.to_string())
        .dir(&http)
        .run(&ctx.tools)
}
