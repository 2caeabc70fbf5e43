use log::{debug, error, info};
use std::{
    path::{Path, PathBuf},
    process::Stdio,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    process::{Child, ChildStderr, ChildStdin, ChildStdout, Command},
    task::JoinHandle,
};

use crate::error::{ClientError, Result};

/// How to launch the language server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerCommand {
    pub program: String,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
}

impl ServerCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }
}

pub(crate) struct ServerProcess {
    pub child: Child,
    pub stdin: ChildStdin,
    pub stdout: ChildStdout,
    pub stderr: ChildStderr,
}

/// Spawn the server with all three standard streams piped.
///
/// The child is killed if it is dropped, so a failure to take any stream
/// does not leave a stray process behind.
pub(crate) fn spawn_server(command: &ServerCommand) -> Result<ServerProcess> {
    let program = find_program(&command.program)?;
    info!("Starting language server: {}", program.display());

    let mut cmd = Command::new(&program);
    cmd.args(&command.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if let Some(dir) = &command.current_dir {
        cmd.current_dir(dir);
    }

    let mut child = cmd.spawn().map_err(|source| ClientError::Spawn {
        program: command.program.clone(),
        source,
    })?;

    let stdin = child
        .stdin
        .take()
        .ok_or(ClientError::StreamUnavailable("stdin"))?;
    let stdout = child
        .stdout
        .take()
        .ok_or(ClientError::StreamUnavailable("stdout"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or(ClientError::StreamUnavailable("stderr"))?;

    Ok(ServerProcess {
        child,
        stdin,
        stdout,
        stderr,
    })
}

fn find_program(program: &str) -> Result<PathBuf> {
    which::which(program).map_err(|e| ClientError::Spawn {
        program: program.to_string(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, e.to_string()),
    })
}

/// Log the server's stderr in the background until it closes.
pub(crate) fn drain_stderr(stderr: ChildStderr, program: String) -> JoinHandle<()> {
    tokio::spawn(handle_stderr(stderr, program))
}

async fn handle_stderr(stderr: ChildStderr, program: String) {
    let mut reader = BufReader::new(stderr);
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = match reader.read_line(&mut buffer).await {
            Ok(n) => n,
            Err(e) => {
                error!("Error reading {} stderr: {}", program, e);
                break;
            }
        };

        if bytes_read == 0 {
            break; // EOF
        }

        let trimmed = buffer.trim();
        if !trimmed.is_empty() {
            debug!("{} stderr: {}", program, trimmed);
        }
    }
}
