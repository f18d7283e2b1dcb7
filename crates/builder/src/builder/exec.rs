//! External command invocations.
//!
//! Every build step is an opaque external command. The command line is
//! echoed before it runs, and a non-zero exit status is fatal to the run;
//! the error carries the command line so the failing step is visible in the
//! report.

use super::env::ToolEnv;
use anyhow::{bail, Context, Result};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// One external command: program, arguments, optional working directory,
/// optional per-invocation environment overrides.
#[derive(Debug, Clone)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    dir: Option<PathBuf>,
    envs: Vec<(OsString, OsString)>,
}

impl Cmd {
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Cmd {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
            dir: None,
            envs: Vec::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    #[must_use]
    pub fn dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.envs
            .push((key.as_ref().to_os_string(), value.as_ref().to_os_string()));
        self
    }

    /// Run to completion, inheriting stdout/stderr.
    pub fn run(&self, tools: &ToolEnv) -> Result<()> {
        println!("+ {self}");
        let status = self
            .command(tools)?
            .status()
            .with_context(|| format!("failed to spawn `{}`", self.program.to_string_lossy()))?;

        if !status.success() {
            bail!("`{self}` exited with {status}");
        }
        Ok(())
    }

    /// Run to completion, capturing stdout. Stderr stays on the console.
    ///
    /// The captured output is echoed as well, so a captured step reads the
    /// same on the console as an ordinary one.
    pub fn capture(&self, tools: &ToolEnv) -> Result<String> {
        println!("+ {self}");
        let output = self
            .command(tools)?
            .stderr(Stdio::inherit())
            .output()
            .with_context(|| format!("failed to spawn `{}`", self.program.to_string_lossy()))?;

        if !output.status.success() {
            bail!("`{self}` exited with {}", output.status);
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        print!("{stdout}");
        Ok(stdout)
    }

    fn command(&self, tools: &ToolEnv) -> Result<Command> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.dir {
            cmd.current_dir(dir);
        }
        tools.apply(&mut cmd)?;
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }
        Ok(cmd)
    }
}

impl fmt::Display for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        if let Some(dir) = &self.dir {
            write!(f, "  (in {})", dir.display())?;
        }
        Ok(())
    }
}
