//! Server process management — spawn the server as a child process and
//! wire the session driver to its stdio.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::time::timeout;

use crate::driver::SessionDriver;
use crate::error::{ClientError, ClientResult};

/// Configuration for spawning and tearing down the server process.
#[derive(Debug, Clone)]
pub struct ServerProcessConfig {
    /// Command to execute.
    pub command: String,

    /// Arguments to pass to the command.
    pub args: Vec<String>,

    /// How long to wait for graceful exit after closing stdin before
    /// forcing termination.
    pub shutdown_timeout: Duration,
}

impl Default for ServerProcessConfig {
    fn default() -> Self {
        Self {
            command: "mcp-hello-server".to_string(),
            args: Vec::new(),
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

/// A running server child process plus the driver attached to its stdio.
pub struct ServerProcess {
    child: Child,
    driver: SessionDriver,
    config: ServerProcessConfig,
    _stderr_task: tokio::task::JoinHandle<()>,
}

impl ServerProcess {
    /// Spawn the server with piped stdio and attach a session driver.
    /// Child stderr lines are forwarded to the log.
    pub async fn spawn(config: ServerProcessConfig) -> ClientResult<Self> {
        if config.command.is_empty() {
            return Err(ClientError::Transport("Command cannot be empty".to_string()));
        }

        tracing::info!("Starting server: {} {:?}", config.command, config.args);

        let mut child = Command::new(&config.command)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ClientError::Transport(format!("Failed to spawn server: {e}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ClientError::Transport("Failed to get stdin handle".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ClientError::Transport("Failed to get stdout handle".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ClientError::Transport("Failed to get stderr handle".to_string()))?;

        let stderr_task = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                tracing::debug!("Server stderr: {line}");
            }
        });

        let driver = SessionDriver::new(stdout, stdin);

        Ok(Self {
            child,
            driver,
            config,
            _stderr_task: stderr_task,
        })
    }

    pub fn driver(&mut self) -> &mut SessionDriver {
        &mut self.driver
    }

    /// Scoped teardown: signal end-of-input, then wait a bounded interval
    /// for graceful exit before forcing termination.
    pub async fn close(mut self) -> ClientResult<()> {
        self.driver.close();

        match timeout(self.config.shutdown_timeout, self.child.wait()).await {
            Ok(Ok(status)) => {
                tracing::info!("Server exited with status: {status}");
            }
            Ok(Err(e)) => {
                tracing::error!("Failed to wait for server exit: {e}");
            }
            Err(_) => {
                tracing::warn!("Server shutdown timed out, forcing kill");
                self.child
                    .kill()
                    .await
                    .map_err(|e| ClientError::Transport(format!("Failed to kill server: {e}")))?;
            }
        }

        Ok(())
    }
}
