//! Source checkout stage.

use crate::builder::context::BuildContext;
use crate::builder::repos;
use crate::builder::stage::Stage;
use anyhow::Result;
use std::path::PathBuf;

pub struct Sources;

impl Stage for Sources {
    fn name(&self) -> &'static str {
        "sources"
    }

    // Skipping happens per repository inside the provisioner, so a partial
    // checkout set resumes at the first absent path.
    fn marker(&self, _ctx: &BuildContext) -> Option<PathBuf> {
        None
    }

    fn run(&self, ctx: &BuildContext) -> Result<()> {
        repos::provision(ctx, repos::REPOS)
    }
}
