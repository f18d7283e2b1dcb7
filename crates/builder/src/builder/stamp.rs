//! Input stamps for stages that declare an input set.
//!
//! A stamp records what the declared inputs looked like when the stage last
//! completed. The marker directory says "done"; a stale or missing stamp
//! downgrades that to "redo" without touching the outputs themselves.
//! Facts are existence, length, and mtime; content hashing would be far too
//! slow for multi-gigabyte trees.

use super::context::BuildContext;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

#[derive(Debug, Serialize, Deserialize)]
struct Stamp {
    recorded_at: DateTime<Utc>,
    inputs: Vec<InputFact>,
}

/// Cheap, comparable snapshot of one input path.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputFact {
    Missing { path: String },
    Dir { path: String },
    File { path: String, len: u64, mtime: u64 },
}

/// Snapshot one path.
pub fn observe(path: &Path) -> InputFact {
    let name = path.to_string_lossy().into_owned();
    match std::fs::metadata(path) {
        Err(_) => InputFact::Missing { path: name },
        Ok(meta) if meta.is_dir() => InputFact::Dir { path: name },
        Ok(meta) => {
            let mtime = meta
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_secs())
                .unwrap_or(0);
            InputFact::File {
                path: name,
                len: meta.len(),
                mtime,
            }
        }
    }
}

/// Write the stamp for a stage that just completed.
pub fn record(ctx: &BuildContext, stage: &str, inputs: &[PathBuf]) -> Result<()> {
    let stamp = Stamp {
        recorded_at: Utc::now(),
        inputs: inputs.iter().map(|p| observe(p)).collect(),
    };

    let dir = ctx.layout.stamp_dir();
    std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

    let path = stamp_path(ctx, stage);
    let json = serde_json::to_string_pretty(&stamp)?;
    std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Whether the recorded stamp for `stage` matches the inputs as they look
/// now. Missing or unreadable stamps count as stale.
pub fn matches(ctx: &BuildContext, stage: &str, inputs: &[PathBuf]) -> Result<bool> {
    let path = stamp_path(ctx, stage);
    let Ok(raw) = std::fs::read_to_string(&path) else {
        return Ok(false);
    };
    let Ok(stamp) = serde_json::from_str::<Stamp>(&raw) else {
        return Ok(false);
    };

    let current: Vec<InputFact> = inputs.iter().map(|p| observe(p)).collect();
    Ok(stamp.inputs == current)
}

fn stamp_path(ctx: &BuildContext, stage: &str) -> PathBuf {
    ctx.layout.stamp_dir().join(format!("{stage}.json"))
}
