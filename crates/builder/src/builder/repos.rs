//! Source repository provisioning.
//!
//! The table below is the operator-edited configuration: which fork to
//! clone, where upstream lives, and which ref each checkout pins. A path
//! that already exists is left completely untouched, so a checkout that has
//! drifted from its configured ref is never reconciled automatically; that
//! is the operator's job.

use super::context::BuildContext;
use super::exec::Cmd;
use anyhow::{Context, Result};
use std::path::Path;

/// Release tag applied to every pushable fork; `None` tracks branches.
pub const RELEASE_TAG: Option<&str> = Some("cib-013");

/// One repository to clone and pin.
#[derive(Debug, Clone, Copy)]
pub struct RepoSpec<'a> {
    /// Checkout path relative to the workspace root; unique across the set.
    pub path: &'a str,
    /// Fork cloned as `origin`.
    pub fork: &'a str,
    /// Registered as the `upstream` remote, for rebasing the forks later;
    /// the pipeline itself never fetches from it.
    pub upstream: &'a str,
    /// Pushable forks follow [`RELEASE_TAG`] when one is configured.
    pub pushable: bool,
    /// Branch upstream development happens on.
    pub upstream_branch: &'a str,
    /// Branch or commit checked out when no tag override applies.
    pub branch: &'a str,
}

/// The toolchain sources. The LLVM subprojects nest inside the `llvm`
/// checkout, so it must stay first.
pub const REPOS: &[RepoSpec<'static>] = &[
    RepoSpec {
        path: "repos/llvm",
        fork: "https://github.com/tbfleming/cib-llvm.git",
        upstream: "https://github.com/llvm-mirror/llvm.git",
        pushable: true,
        upstream_branch: "master",
        branch: "cib",
    },
    RepoSpec {
        path: "repos/llvm/tools/clang",
        fork: "https://github.com/tbfleming/cib-clang.git",
        upstream: "https://github.com/llvm-mirror/clang.git",
        pushable: true,
        upstream_branch: "master",
        branch: "cib",
    },
    RepoSpec {
        path: "repos/llvm/tools/lld",
        fork: "https://github.com/tbfleming/cib-lld.git",
        upstream: "https://github.com/llvm-mirror/lld.git",
        pushable: true,
        upstream_branch: "master",
        branch: "master",
    },
    RepoSpec {
        path: "repos/llvm/projects/compiler-rt",
        fork: "https://github.com/tbfleming/cib-compiler-rt.git",
        upstream: "https://github.com/llvm-mirror/compiler-rt.git",
        pushable: true,
        upstream_branch: "master",
        branch: "master",
    },
    RepoSpec {
        path: "repos/llvm/projects/libcxx",
        fork: "https://github.com/tbfleming/cib-libcxx.git",
        upstream: "https://github.com/llvm-mirror/libcxx.git",
        pushable: true,
        upstream_branch: "master",
        branch: "master",
    },
    RepoSpec {
        path: "repos/llvm/projects/libcxxabi",
        fork: "https://github.com/tbfleming/cib-libcxxabi.git",
        upstream: "https://github.com/llvm-mirror/libcxxabi.git",
        pushable: true,
        upstream_branch: "master",
        branch: "master",
    },
    RepoSpec {
        path: "repos/emscripten",
        fork: "https://github.com/tbfleming/cib-emscripten.git",
        upstream: "https://github.com/kripken/emscripten.git",
        pushable: true,
        upstream_branch: "incoming",
        branch: "cib",
    },
    RepoSpec {
        path: "repos/binaryen",
        fork: "https://github.com/tbfleming/cib-binaryen.git",
        upstream: "https://github.com/WebAssembly/binaryen.git",
        pushable: true,
        upstream_branch: "master",
        branch: "cib",
    },
    RepoSpec {
        path: "repos/zip.js",
        fork: "https://github.com/gildas-lormeau/zip.js.git",
        upstream: "https://github.com/gildas-lormeau/zip.js.git",
        pushable: false,
        upstream_branch: "3e7920810f63d5057ef6028833243105521da369",
        branch: "3e7920810f63d5057ef6028833243105521da369",
    },
];

impl<'a> RepoSpec<'a> {
    /// Ref to check out: the release tag for pushable forks, otherwise the
    /// per-repo branch.
    pub fn resolved_ref(&self, release_tag: Option<&'a str>) -> &'a str {
        match release_tag {
            Some(tag) if self.pushable => tag,
            _ => self.branch,
        }
    }
}

/// Clone and pin every repository whose checkout path is absent.
///
/// A failure aborts the pass; the repositories already processed stay
/// cloned, and a re-run picks up from the first absent path.
pub fn provision(ctx: &BuildContext, specs: &[RepoSpec<'_>]) -> Result<()> {
    for spec in specs {
        let dest = ctx.layout.root().join(spec.path);
        if dest.is_dir() {
            continue;
        }
        clone(ctx, spec, &dest)?;
    }
    Ok(())
}

fn clone(ctx: &BuildContext, spec: &RepoSpec<'_>, dest: &Path) -> Result<()> {
    let parent = dest
        .parent()
        .with_context(|| format!("checkout path `{}` has no parent", spec.path))?;
    std::fs::create_dir_all(parent)
        .with_context(|| format!("creating {}", parent.display()))?;

    let dest_arg = dest
        .to_str()
        .context("checkout path contains invalid UTF-8")?;

    println!("Cloning {} -> {}", spec.fork, spec.path);
    Cmd::new("git")
        .args(["clone", spec.fork, dest_arg])
        .run(&ctx.tools)?;
    Cmd::new("git")
        .args(["remote", "add", "-t", spec.upstream_branch, "upstream", spec.upstream])
        .dir(dest)
        .run(&ctx.tools)?;
    Cmd::new("git")
        .args(["checkout", spec.resolved_ref(ctx.release_tag)])
        .dir(dest)
        .run(&ctx.tools)?;

    Ok(())
}

/// Report which checkouts exist and where their heads actually sit.
///
/// Provisioning never re-checks a present directory, so this is the only
/// place a drifted checkout becomes visible.
pub fn status(ctx: &BuildContext, specs: &[RepoSpec<'_>]) {
    println!("Sources:");
    for spec in specs {
        let want = spec.resolved_ref(ctx.release_tag);
        let dest = ctx.layout.root().join(spec.path);
        if dest.is_dir() {
            let head = Cmd::new("git")
                .args(["rev-parse", "--short", "HEAD"])
                .dir(&dest)
                .capture(&ctx.tools)
                .ok();
            let head = head.as_deref().map(str::trim).unwrap_or("unknown");
            println!("  {:28} [cached ] at {head} (want {want})", spec.path);
        } else {
            println!("  {:28} [missing] {} @ {want}", spec.path, spec.fork);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::stage::{run_pipeline, Outcome, Stage};
    use std::collections::HashSet;
    use std::path::PathBuf;

    #[test]
    fn checkout_paths_are_unique() {
        let mut seen = HashSet::new();
        for spec in REPOS {
            assert!(seen.insert(spec.path), "duplicate path {}", spec.path);
        }
    }

    #[test]
    fn tag_overrides_only_pushable_forks() {
        let pushable = RepoSpec {
            path: "repos/a",
            fork: "fork",
            upstream: "up",
            pushable: true,
            upstream_branch: "master",
            branch: "work",
        };
        let pinned = RepoSpec {
            pushable: false,
            ..pushable
        };

        assert_eq!(pushable.resolved_ref(Some("rel-1")), "rel-1");
        assert_eq!(pushable.resolved_ref(None), "work");
        assert_eq!(pinned.resolved_ref(Some("rel-1")), "work");
        assert_eq!(pinned.resolved_ref(None), "work");
    }

    fn git(dir: &Path, args: &[&str]) {
        let status = std::process::Command::new("git")
            .args([
                "-c",
                "user.email=builder@test",
                "-c",
                "user.name=builder",
                "-c",
                "protocol.file.allow=always",
            ])
            .args(args)
            .current_dir(dir)
            .status()
            .unwrap();
        assert!(status.success(), "git {args:?} failed");
    }

    fn make_origin(root: &Path) -> (PathBuf, String) {
        let origin = root.join("origin");
        std::fs::create_dir_all(&origin).unwrap();
        git(&origin, &["init"]);
        std::fs::write(origin.join("README"), "origin\n").unwrap();
        git(&origin, &["add", "."]);
        git(&origin, &["commit", "-m", "seed"]);
        let head = std::process::Command::new("git")
            .args(["rev-parse", "--abbrev-ref", "HEAD"])
            .current_dir(&origin)
            .output()
            .unwrap();
        let branch = String::from_utf8_lossy(&head.stdout).trim().to_string();
        (origin, branch)
    }

    #[test]
    fn provision_clones_pins_and_registers_upstream() {
        if which::which("git").is_err() {
            eprintln!("skipping: git not found");
            return;
        }

        let tmp = tempfile::tempdir().unwrap();
        let (origin, branch) = make_origin(tmp.path());
        git(&origin, &["tag", "rel-1"]);

        let origin_url = origin.display().to_string();
        let spec = RepoSpec {
            path: "repos/sample",
            fork: &origin_url,
            upstream: &origin_url,
            pushable: true,
            upstream_branch: &branch,
            branch: &branch,
        };

        let mut ctx = BuildContext::new(tmp.path().join("work")).unwrap();
        ctx.release_tag = None;
        std::fs::create_dir_all(ctx.layout.root()).unwrap();

        provision(&ctx, &[spec]).unwrap();

        let dest = ctx.layout.root().join("repos/sample");
        assert!(dest.join("README").exists());

        let upstream = std::process::Command::new("git")
            .args(["remote", "get-url", "upstream"])
            .current_dir(&dest)
            .output()
            .unwrap();
        assert_eq!(
            String::from_utf8_lossy(&upstream.stdout).trim(),
            origin_url
        );
    }

    #[test]
    fn provision_leaves_existing_checkouts_untouched() {
        if which::which("git").is_err() {
            eprintln!("skipping: git not found");
            return;
        }

        let tmp = tempfile::tempdir().unwrap();
        let (origin, branch) = make_origin(tmp.path());
        let origin_url = origin.display().to_string();
        let spec = RepoSpec {
            path: "repos/sample",
            fork: &origin_url,
            upstream: &origin_url,
            pushable: true,
            upstream_branch: &branch,
            branch: &branch,
        };

        let mut ctx = BuildContext::new(tmp.path().join("work")).unwrap();
        ctx.release_tag = None;

        // Pre-existing directory, not even a git checkout: provisioning must
        // not look inside.
        let dest = ctx.layout.root().join("repos/sample");
        std::fs::create_dir_all(&dest).unwrap();
        std::fs::write(dest.join("sentinel"), "keep me\n").unwrap();

        provision(&ctx, &[spec]).unwrap();

        assert!(dest.join("sentinel").exists());
        assert!(!dest.join("README").exists());
    }

    struct ProvisionStage<'a> {
        specs: Vec<RepoSpec<'a>>,
    }

    impl Stage for ProvisionStage<'_> {
        fn name(&self) -> &'static str {
            "provision"
        }

        fn marker(&self, _ctx: &BuildContext) -> Option<PathBuf> {
            None
        }

        fn run(&self, ctx: &BuildContext) -> Result<()> {
            provision(ctx, &self.specs)
        }
    }

    struct BuildStage {
        out: PathBuf,
        fail: bool,
    }

    impl Stage for BuildStage {
        fn name(&self) -> &'static str {
            "build"
        }

        fn marker(&self, _ctx: &BuildContext) -> Option<PathBuf> {
            Some(self.out.clone())
        }

        fn run(&self, ctx: &BuildContext) -> Result<()> {
            let script = if self.fail {
                "exit 1".to_string()
            } else {
                format!("mkdir -p {}", self.out.display())
            };
            Cmd::new("sh").args(["-c", script.as_str()]).run(&ctx.tools)
        }
    }

    #[test]
    fn pipeline_provisions_then_builds_from_an_empty_root() {
        if which::which("git").is_err() {
            eprintln!("skipping: git not found");
            return;
        }

        let tmp = tempfile::tempdir().unwrap();
        let (origin, branch) = make_origin(tmp.path());
        let origin_url = origin.display().to_string();

        let mut ctx = BuildContext::new(tmp.path().join("work")).unwrap();
        ctx.release_tag = None;

        let fetch = ProvisionStage {
            specs: vec![RepoSpec {
                path: "repos/sample",
                fork: &origin_url,
                upstream: &origin_url,
                pushable: true,
                upstream_branch: &branch,
                branch: &branch,
            }],
        };
        let build = BuildStage {
            out: ctx.layout.root().join("build/sample"),
            fail: false,
        };

        let report = run_pipeline(&ctx, &[&fetch, &build]).unwrap();

        assert!(ctx.layout.root().join("repos/sample/README").exists());
        assert!(ctx.layout.root().join("build/sample").is_dir());
        assert_eq!(
            report,
            [("provision", Outcome::Built), ("build", Outcome::Built)]
        );
    }

    #[test]
    fn failed_build_leaves_the_clone_but_no_output() {
        if which::which("git").is_err() {
            eprintln!("skipping: git not found");
            return;
        }

        let tmp = tempfile::tempdir().unwrap();
        let (origin, branch) = make_origin(tmp.path());
        let origin_url = origin.display().to_string();

        let mut ctx = BuildContext::new(tmp.path().join("work")).unwrap();
        ctx.release_tag = None;

        let fetch = ProvisionStage {
            specs: vec![RepoSpec {
                path: "repos/sample",
                fork: &origin_url,
                upstream: &origin_url,
                pushable: true,
                upstream_branch: &branch,
                branch: &branch,
            }],
        };
        let build = BuildStage {
            out: ctx.layout.root().join("build/sample"),
            fail: true,
        };

        let err = run_pipeline(&ctx, &[&fetch, &build]).unwrap_err();

        assert!(err.to_string().contains("stage `build` failed"));
        assert!(ctx.layout.root().join("repos/sample/README").exists());
        assert!(!ctx.layout.root().join("build/sample").exists());
    }

    #[test]
    fn provision_checks_out_the_release_tag_for_pushable_forks() {
        if which::which("git").is_err() {
            eprintln!("skipping: git not found");
            return;
        }

        let tmp = tempfile::tempdir().unwrap();
        let (origin, branch) = make_origin(tmp.path());
        git(&origin, &["tag", "rel-1"]);
        // Advance the branch past the tag so the two refs differ.
        std::fs::write(origin.join("LATER"), "later\n").unwrap();
        git(&origin, &["add", "."]);
        git(&origin, &["commit", "-m", "later"]);

        let origin_url = origin.display().to_string();
        let spec = RepoSpec {
            path: "repos/sample",
            fork: &origin_url,
            upstream: &origin_url,
            pushable: true,
            upstream_branch: &branch,
            branch: &branch,
        };

        let mut ctx = BuildContext::new(tmp.path().join("work")).unwrap();
        ctx.release_tag = Some("rel-1");

        provision(&ctx, &[spec]).unwrap();

        let dest = ctx.layout.root().join("repos/sample");
        assert!(dest.join("README").exists());
        assert!(
            !dest.join("LATER").exists(),
            "tagged checkout must not contain commits after the tag"
        );
    }
}
