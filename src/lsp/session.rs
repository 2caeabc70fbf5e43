use log::{info, warn};
use serde_json::Value;
use std::process::ExitStatus;
use tokio::{
    process::{Child, ChildStdin, ChildStdout},
    task::JoinHandle,
    time::Instant,
};

use super::{
    client::{LspClient, SessionState, ShutdownReport, Step},
    connection::{drain_stderr, spawn_server, ServerCommand, ServerProcess},
};
use crate::{
    error::{ClientError, Result},
    protocol::LSPResponse,
};

/// One spawned language server and the client bound to its stdio.
pub struct LspSession {
    client: LspClient<ChildStdout, ChildStdin>,
    child: Child,
    program: String,
    stderr_task: Option<JoinHandle<()>>,
}

/// What happened while closing a session.
///
/// Each step is recorded rather than swallowed so callers can choose how
/// strict to be.
#[derive(Debug)]
pub struct CloseReport {
    pub shutdown: Step,
    pub exit: Step,
    pub status: Result<ExitStatus>,
}

impl CloseReport {
    /// Both handshake steps went through and the child exited successfully.
    pub fn is_clean(&self) -> bool {
        self.shutdown.is_done()
            && self.exit.is_done()
            && matches!(&self.status, Ok(status) if status.success())
    }

    pub fn errors(&self) -> Vec<&ClientError> {
        let mut errors: Vec<&ClientError> = [self.shutdown.error(), self.exit.error()]
            .into_iter()
            .flatten()
            .collect();
        if let Err(e) = &self.status {
            errors.push(e);
        }
        errors
    }

    /// The exit status, or the first failed step.
    pub fn into_result(self) -> Result<ExitStatus> {
        if let Step::Failed(e) = self.shutdown {
            return Err(e);
        }
        if let Step::Failed(e) = self.exit {
            return Err(e);
        }
        self.status
    }
}

impl LspSession {
    pub fn spawn(command: &ServerCommand) -> Result<Self> {
        let ServerProcess {
            child,
            stdin,
            stdout,
            stderr,
        } = spawn_server(command)?;

        let stderr_task = drain_stderr(stderr, command.program.clone());
        info!(
            "Language server {} started (pid {:?})",
            command.program,
            child.id()
        );

        Ok(Self {
            client: LspClient::new(stdout, stdin),
            child,
            program: command.program.clone(),
            stderr_task: Some(stderr_task),
        })
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    pub fn state(&self) -> SessionState {
        self.client.state()
    }

    pub fn next_id(&self) -> i64 {
        self.client.next_id()
    }

    pub async fn initialize(&mut self, root_uri: &str, deadline: Instant) -> Result<Value> {
        self.client.initialize(root_uri, deadline).await
    }

    pub async fn send_request(
        &mut self,
        method: &str,
        params: Option<Value>,
        deadline: Instant,
    ) -> Result<LSPResponse> {
        self.client.send_request(method, params, deadline).await
    }

    pub async fn send_notification(&mut self, method: &str, params: Option<Value>) -> Result<()> {
        self.client.send_notification(method, params).await
    }

    /// Run the shutdown handshake, close the streams and wait for the child.
    ///
    /// If the child is still running at `deadline` it is killed and the
    /// report carries [`ClientError::DeadlineExceeded`] for the wait.
    pub async fn close(mut self, deadline: Instant) -> CloseReport {
        let ShutdownReport { shutdown, exit } = self.client.shutdown(deadline).await;

        let status = match tokio::time::timeout_at(deadline, self.child.wait()).await {
            Ok(Ok(status)) => {
                info!("Language server {} exited with {}", self.program, status);
                Ok(status)
            }
            Ok(Err(e)) => Err(ClientError::Io(e)),
            Err(_) => {
                warn!(
                    "Language server {} did not exit in time, killing it",
                    self.program
                );
                if let Err(e) = self.child.kill().await {
                    warn!("Failed to kill {}: {}", self.program, e);
                }
                Err(ClientError::deadline(format!("{} to exit", self.program)))
            }
        };

        if let Some(task) = self.stderr_task.take() {
            let abort = task.abort_handle();
            if tokio::time::timeout_at(deadline, task).await.is_err() {
                abort.abort();
            }
        }

        CloseReport {
            shutdown,
            exit,
            status,
        }
    }
}
