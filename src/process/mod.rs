//! Engine process management (spawn and pipe handles).

use std::process::Stdio;

use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::info;

use crate::error::{Error, Result};

/// How to launch the engine. Arguments are passed straight to the executable,
/// never through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl EngineCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

impl Default for EngineCommand {
    fn default() -> Self {
        Self::new("gnuplot")
    }
}

pub struct ProcessHandle {
    pub child: Child,
    pub stdin: ChildStdin,
    pub stdout: ChildStdout,
}

/// Spawn the engine with piped stdin/stdout. Stderr is inherited so engine
/// diagnostics reach the user's terminal. Descriptors opened by this process
/// are close-on-exec, so the child only sees its three standard streams.
pub fn spawn(engine: &EngineCommand) -> Result<ProcessHandle> {
    let mut cmd = Command::new(&engine.program);
    cmd.args(&engine.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit());

    let spawn_err = |source| Error::Spawn {
        program: engine.program.clone(),
        source,
    };

    let mut child: Child = cmd.spawn().map_err(spawn_err)?;
    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| spawn_err(std::io::Error::other("no stdin pipe")))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| spawn_err(std::io::Error::other("no stdout pipe")))?;

    info!(program = %engine.program, pid = ?child.id(), "engine started");

    Ok(ProcessHandle {
        child,
        stdin,
        stdout,
    })
}
