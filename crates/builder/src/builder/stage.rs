//! Stage abstraction and the sequential pipeline.
//!
//! Registry order is the dependency order; there is no scheduling beyond
//! "run the list, stop at the first failure". Idempotency is two-level: a
//! stage with a marker directory is skipped outright when the marker exists
//! (and its input stamp, if any, still matches), while resumability inside a
//! stage lives in the action's own finer-grained gates.

use super::context::BuildContext;
use super::stamp;
use anyhow::{Context, Result};
use std::path::PathBuf;

/// One unit of the pipeline.
pub trait Stage: Sync {
    fn name(&self) -> &'static str;

    /// Directory whose existence marks the stage complete. `None` means the
    /// action runs every time and carries its own internal gates.
    fn marker(&self, ctx: &BuildContext) -> Option<PathBuf>;

    /// Inputs folded into the completion stamp. Empty means the marker
    /// alone decides; the marker then never goes stale, even when the
    /// directory behind it is incomplete.
    fn inputs(&self, _ctx: &BuildContext) -> Vec<PathBuf> {
        Vec::new()
    }

    fn run(&self, ctx: &BuildContext) -> Result<()>;
}

/// What happened to a stage during one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Built,
    Skipped,
}

/// Run `stages` strictly in order, stopping at the first failure.
///
/// Nothing from stage k+1 is issued before stage k finishes; the error for
/// a failed stage names it, and the stages after it are never consulted.
pub fn run_pipeline(
    ctx: &BuildContext,
    stages: &[&dyn Stage],
) -> Result<Vec<(&'static str, Outcome)>> {
    let mut report = Vec::with_capacity(stages.len());

    for stage in stages {
        if is_complete(ctx, *stage)? {
            println!("=== {} (already done) ===", stage.name());
            report.push((stage.name(), Outcome::Skipped));
            continue;
        }

        println!("=== {} ===", stage.name());
        stage
            .run(ctx)
            .with_context(|| format!("stage `{}` failed", stage.name()))?;

        let inputs = stage.inputs(ctx);
        if !inputs.is_empty() {
            stamp::record(ctx, stage.name(), &inputs)?;
        }
        report.push((stage.name(), Outcome::Built));
    }

    Ok(report)
}

/// Completion check: marker directory present and, when the stage declares
/// inputs, the recorded stamp still matching them.
pub fn is_complete(ctx: &BuildContext, stage: &dyn Stage) -> Result<bool> {
    let Some(marker) = stage.marker(ctx) else {
        return Ok(false);
    };
    if !marker.exists() {
        return Ok(false);
    }

    let inputs = stage.inputs(ctx);
    if inputs.is_empty() {
        return Ok(true);
    }
    stamp::matches(ctx, stage.name(), &inputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use std::path::Path;

    /// Scripted stage: appends its name to a log file when run, creates its
    /// marker, optionally fails.
    struct Scripted {
        name: &'static str,
        marker: Option<PathBuf>,
        inputs: Vec<PathBuf>,
        log: PathBuf,
        fail: bool,
    }

    impl Scripted {
        fn new(name: &'static str, log: &Path) -> Self {
            Scripted {
                name,
                marker: None,
                inputs: Vec::new(),
                log: log.to_path_buf(),
                fail: false,
            }
        }

        fn with_marker(mut self, marker: &Path) -> Self {
            self.marker = Some(marker.to_path_buf());
            self
        }

        fn with_input(mut self, input: &Path) -> Self {
            self.inputs.push(input.to_path_buf());
            self
        }

        fn failing(mut self) -> Self {
            self.fail = true;
            self
        }
    }

    impl Stage for Scripted {
        fn name(&self) -> &'static str {
            self.name
        }

        fn marker(&self, _ctx: &BuildContext) -> Option<PathBuf> {
            self.marker.clone()
        }

        fn inputs(&self, _ctx: &BuildContext) -> Vec<PathBuf> {
            self.inputs.clone()
        }

        fn run(&self, _ctx: &BuildContext) -> Result<()> {
            let mut ran = std::fs::read_to_string(&self.log).unwrap_or_default();
            ran.push_str(self.name);
            ran.push('\n');
            std::fs::write(&self.log, ran)?;

            if self.fail {
                bail!("scripted failure");
            }
            if let Some(marker) = &self.marker {
                std::fs::create_dir_all(marker)?;
            }
            Ok(())
        }
    }

    fn context() -> (tempfile::TempDir, BuildContext) {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = BuildContext::new(tmp.path()).unwrap();
        (tmp, ctx)
    }

    fn ran(log: &Path) -> Vec<String> {
        std::fs::read_to_string(log)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn stages_run_in_declaration_order() {
        let (tmp, ctx) = context();
        let log = tmp.path().join("log");
        let a = Scripted::new("a", &log);
        let b = Scripted::new("b", &log);
        let c = Scripted::new("c", &log);

        let report = run_pipeline(&ctx, &[&a, &b, &c]).unwrap();

        assert_eq!(ran(&log), ["a", "b", "c"]);
        assert!(report.iter().all(|(_, o)| *o == Outcome::Built));
    }

    #[test]
    fn failure_halts_before_later_stages() {
        let (tmp, ctx) = context();
        let log = tmp.path().join("log");
        let a = Scripted::new("a", &log);
        let b = Scripted::new("b", &log).failing();
        let c = Scripted::new("c", &log);

        let err = run_pipeline(&ctx, &[&a, &b, &c]).unwrap_err();

        assert!(err.to_string().contains("stage `b` failed"));
        assert_eq!(ran(&log), ["a", "b"], "c must never be invoked");
    }

    #[test]
    fn marker_presence_skips_the_action() {
        let (tmp, ctx) = context();
        let log = tmp.path().join("log");
        let marker = tmp.path().join("out");
        let stage = Scripted::new("a", &log).with_marker(&marker);

        run_pipeline(&ctx, &[&stage]).unwrap();
        let report = run_pipeline(&ctx, &[&stage]).unwrap();

        assert_eq!(report, [("a", Outcome::Skipped)]);
        assert_eq!(ran(&log), ["a"], "second run must not re-execute");
    }

    #[test]
    fn empty_preexisting_marker_still_skips() {
        // The staleness hazard by design: an empty directory left by an
        // interrupted run reads as done.
        let (tmp, ctx) = context();
        let log = tmp.path().join("log");
        let marker = tmp.path().join("out");
        std::fs::create_dir_all(&marker).unwrap();
        let stage = Scripted::new("a", &log).with_marker(&marker);

        let report = run_pipeline(&ctx, &[&stage]).unwrap();

        assert_eq!(report, [("a", Outcome::Skipped)]);
        assert!(ran(&log).is_empty());
    }

    #[test]
    fn changed_input_invalidates_the_marker() {
        let (tmp, ctx) = context();
        let log = tmp.path().join("log");
        let marker = tmp.path().join("out");
        let input = tmp.path().join("input.tar.gz");
        std::fs::write(&input, b"v1").unwrap();

        let stage = Scripted::new("a", &log)
            .with_marker(&marker)
            .with_input(&input);

        run_pipeline(&ctx, &[&stage]).unwrap();
        assert_eq!(
            run_pipeline(&ctx, &[&stage]).unwrap(),
            [("a", Outcome::Skipped)]
        );

        std::fs::write(&input, b"v2 longer").unwrap();
        assert_eq!(
            run_pipeline(&ctx, &[&stage]).unwrap(),
            [("a", Outcome::Built)]
        );
        assert_eq!(ran(&log), ["a", "a"]);
    }

    /// Stage whose action is a real shell command, like the production
    /// stages.
    struct CmdStage {
        name: &'static str,
        marker: PathBuf,
        script: String,
    }

    impl Stage for CmdStage {
        fn name(&self) -> &'static str {
            self.name
        }

        fn marker(&self, _ctx: &BuildContext) -> Option<PathBuf> {
            Some(self.marker.clone())
        }

        fn run(&self, ctx: &BuildContext) -> Result<()> {
            crate::builder::exec::Cmd::new("sh")
                .args(["-c", self.script.as_str()])
                .run(&ctx.tools)
        }
    }

    #[test]
    fn command_stage_builds_once_then_skips() {
        let (tmp, ctx) = context();
        let out = tmp.path().join("out");
        let stage = CmdStage {
            name: "build",
            marker: out.clone(),
            script: format!("mkdir -p {0} && echo done > {0}/result", out.display()),
        };

        let report = run_pipeline(&ctx, &[&stage]).unwrap();
        assert_eq!(report, [("build", Outcome::Built)]);
        assert!(out.join("result").exists());

        let report = run_pipeline(&ctx, &[&stage]).unwrap();
        assert_eq!(report, [("build", Outcome::Skipped)]);
    }

    #[test]
    fn failing_command_leaves_no_marker_and_halts_the_run() {
        let (tmp, ctx) = context();
        let good = tmp.path().join("good");
        let bad = tmp.path().join("bad");
        let later = tmp.path().join("later");

        let build = CmdStage {
            name: "build",
            marker: good.clone(),
            script: format!("mkdir -p {}", good.display()),
        };
        let broken = CmdStage {
            name: "broken",
            marker: bad.clone(),
            script: "exit 1".to_string(),
        };
        let after = CmdStage {
            name: "after",
            marker: later.clone(),
            script: format!("mkdir -p {}", later.display()),
        };

        let err = run_pipeline(&ctx, &[&build, &broken, &after]).unwrap_err();

        assert!(err.to_string().contains("stage `broken` failed"));
        assert!(good.is_dir(), "the stage before the failure completed");
        assert!(!bad.exists(), "the failed stage must not look done");
        assert!(!later.exists(), "no stage after the failure may run");
    }

    #[test]
    fn marker_without_stamp_reruns_an_input_declaring_stage() {
        let (tmp, ctx) = context();
        let log = tmp.path().join("log");
        let marker = tmp.path().join("out");
        let input = tmp.path().join("input.tar.gz");
        std::fs::write(&input, b"v1").unwrap();
        std::fs::create_dir_all(&marker).unwrap();

        let stage = Scripted::new("a", &log)
            .with_marker(&marker)
            .with_input(&input);

        assert_eq!(
            run_pipeline(&ctx, &[&stage]).unwrap(),
            [("a", Outcome::Built)]
        );
    }
}
