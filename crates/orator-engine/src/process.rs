use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncReadExt as _;
use tokio::process::{Child, ChildStderr};
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::provider::{ProcessExit, SpeechProcess};

/// How long a terminated engine gets to exit before it is force killed
const TERMINATE_GRACE: Duration = Duration::from_secs(2);

/// A spawned engine command
pub struct ChildProcess {
    child: Child,
    stderr: Option<JoinHandle<String>>,
    exit: Option<ProcessExit>,
}

impl ChildProcess {
    /// Wrap a spawned child, draining its stderr in the background
    pub fn new(mut child: Child) -> Self {
        let stderr = child.stderr.take().map(|pipe| tokio::spawn(drain(pipe)));

        Self {
            child,
            stderr,
            exit: None,
        }
    }

    /// Ask the child to exit with SIGTERM; `false` when it could not be signalled
    #[cfg(unix)]
    async fn terminate(&self) -> bool {
        let Some(pid) = self.child.id() else {
            return false;
        };

        let sent = tokio::process::Command::new("kill")
            .arg("-TERM")
            .arg(pid.to_string())
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .await;

        match sent {
            Ok(status) => status.success(),
            Err(e) => {
                tracing::debug!(pid, error = %e, "failed to send SIGTERM to engine");
                false
            }
        }
    }

    #[cfg(not(unix))]
    #[allow(clippy::unused_async)]
    async fn terminate(&self) -> bool {
        false
    }
}

async fn drain(mut pipe: ChildStderr) -> String {
    let mut buf = String::new();
    if let Err(e) = pipe.read_to_string(&mut buf).await {
        tracing::debug!(error = %e, "failed to read engine stderr");
    }
    buf
}

#[async_trait]
impl SpeechProcess for ChildProcess {
    async fn wait(&mut self) -> Result<ProcessExit> {
        if let Some(ref exit) = self.exit {
            return Ok(exit.clone());
        }

        let status = self.child.wait().await?;

        let stderr = match self.stderr.take() {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };

        let exit = if status.success() {
            ProcessExit::Success
        } else {
            ProcessExit::Failure {
                code: status.code(),
                stderr,
            }
        };

        self.exit = Some(exit.clone());
        Ok(exit)
    }

    async fn kill(&mut self) -> Result<()> {
        if self.exit.is_some() {
            return Ok(());
        }

        let exited = self.terminate().await
            && tokio::time::timeout(TERMINATE_GRACE, self.child.wait())
                .await
                .is_ok_and(|status| status.is_ok());

        if !exited {
            // Reaps the child too
            self.child.kill().await?;
        }

        if let Some(task) = self.stderr.take() {
            task.abort();
        }

        self.exit = Some(ProcessExit::Failure {
            code: None,
            stderr: "killed".to_string(),
        });
        Ok(())
    }

    fn id(&self) -> Option<u32> {
        self.child.id()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::process::Stdio;

    use tokio::process::Command;

    use super::*;

    fn spawn(script: &str) -> ChildProcess {
        let child = Command::new("sh")
            .arg("-c")
            .arg(script)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .unwrap();
        ChildProcess::new(child)
    }

    #[tokio::test]
    async fn clean_exit_is_success() {
        let mut process = spawn("exit 0");
        assert_eq!(process.wait().await.unwrap(), ProcessExit::Success);
        // Repeated waits return the cached result
        assert!(process.wait().await.unwrap().is_success());
    }

    #[tokio::test]
    async fn failure_captures_code_and_stderr() {
        let mut process = spawn("echo 'no voices installed' >&2; exit 3");

        let exit = process.wait().await.unwrap();
        assert_eq!(
            exit,
            ProcessExit::Failure {
                code: Some(3),
                stderr: "no voices installed\n".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn kill_stops_long_running_process() {
        let mut process = spawn("sleep 30");

        assert!(process.wait_timeout(Duration::from_millis(50)).await.unwrap().is_none());
        process.kill().await.unwrap();

        let exit = process.wait().await.unwrap();
        assert!(!exit.is_success());
    }

    #[tokio::test]
    async fn kill_lets_process_exit_gracefully() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("terminated");
        let mut process = spawn(&format!(
            "trap 'echo bye > {}; exit 0' TERM; while :; do sleep 0.1; done",
            marker.display()
        ));

        assert!(process.wait_timeout(Duration::from_millis(200)).await.unwrap().is_none());
        process.kill().await.unwrap();

        assert_eq!(std::fs::read_to_string(&marker).unwrap(), "bye\n");
        assert!(!process.wait().await.unwrap().is_success());
    }

    #[tokio::test]
    async fn kill_forces_process_ignoring_terminate() {
        let mut process = spawn("trap '' TERM; while :; do sleep 0.1; done");

        assert!(process.wait_timeout(Duration::from_millis(200)).await.unwrap().is_none());
        let started = std::time::Instant::now();
        process.kill().await.unwrap();

        assert!(started.elapsed() >= TERMINATE_GRACE);
        assert!(!process.wait().await.unwrap().is_success());
    }

    #[tokio::test]
    async fn kill_after_exit_is_noop() {
        let mut process = spawn("exit 0");
        process.wait().await.unwrap();

        process.kill().await.unwrap();
        assert!(process.wait().await.unwrap().is_success());
    }
}
