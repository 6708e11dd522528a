//! Subprocess-backed [`ModelRunner`].
//!
//! One child process per computation pass: the JSON input is written to
//! stdin, stdin is closed, and stdout is parsed as a single JSON object.
//! The time budget starts at spawn and covers the whole exchange.

use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::{RunResult, RunnerInput, RunnerOutput};
use crate::error::RunnerError;
use crate::port::outbound::runner::ModelRunner;

/// Default per-invocation time budget.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs an external model binary as a child process.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl ProcessRunner {
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

fn collect<R>(mut stream: R) -> JoinHandle<Vec<u8>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Err(e) = stream.read_to_end(&mut buf).await {
            debug!(error = %e, "Runner stream read ended early");
        }
        buf
    })
}

async fn drain(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    match handle {
        Some(handle) => handle.await.unwrap_or_default(),
        None => Vec::new(),
    }
}

#[async_trait]
impl ModelRunner for ProcessRunner {
    async fn execute(&self, input: &RunnerInput) -> Result<RunResult, RunnerError> {
        let payload = serde_json::to_vec(input).map_err(RunnerError::Encode)?;
        let started = Instant::now();
        let deadline = tokio::time::Instant::now() + self.timeout;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RunnerError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take().map(collect);
        let stderr = child.stderr.take().map(collect);
        let collectors: Vec<_> = [&stdout, &stderr]
            .into_iter()
            .flatten()
            .map(JoinHandle::abort_handle)
            .collect();

        // Output collection is inside the budget: a runner that exits while
        // a descendant still holds its pipes must not outlive the deadline.
        let exchange = async {
            if let Some(mut stdin) = stdin {
                match stdin.write_all(&payload).await {
                    Ok(()) => {}
                    // Runner may exit without draining stdin.
                    Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                    Err(e) => return Err(RunnerError::Io(e)),
                }
                drop(stdin);
            }
            let (status, stdout, stderr) =
                tokio::join!(child.wait(), drain(stdout), drain(stderr));
            Ok((status.map_err(RunnerError::Io)?, stdout, stderr))
        };

        let (status, stdout, stderr) = match tokio::time::timeout_at(deadline, exchange).await {
            Ok(collected) => collected?,
            Err(_) => {
                let after_ms = self.timeout.as_millis() as u64;
                for collector in &collectors {
                    collector.abort();
                }
                match child.try_wait() {
                    Ok(Some(_)) => {}
                    _ => {
                        if let Err(e) = child.kill().await {
                            warn!(program = %self.program, error = %e, "Failed to kill timed-out runner");
                        }
                    }
                }
                warn!(program = %self.program, after_ms, "Runner timed out");
                return Err(RunnerError::Timeout { after_ms });
            }
        };

        let duration_ms = started.elapsed().as_millis() as u64;

        if !status.success() {
            return Err(RunnerError::NonZeroExit {
                code: status.code(),
                stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
            });
        }

        let output: RunnerOutput =
            serde_json::from_slice(&stdout).map_err(|source| RunnerError::MalformedOutput {
                source,
                stdout: String::from_utf8_lossy(&stdout).into_owned(),
            })?;

        debug!(run_id = output.run_id, duration_ms, "Runner finished");
        Ok(RunResult {
            output,
            duration_ms,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::domain::{build_input, ModelConfig};
    use crate::testkit::domain::candles_from_closes;

    fn input() -> RunnerInput {
        build_input(
            &candles_from_closes(0, &[1.0, 2.0, 3.0]),
            &ModelConfig::new("macd"),
        )
    }

    fn sh(script: &str) -> ProcessRunner {
        ProcessRunner::new("sh").with_args(vec!["-c".to_string(), script.to_string()])
    }

    #[tokio::test]
    async fn parses_run_id_and_extra_fields() {
        let runner = sh(r#"cat > /dev/null; echo '{"runId":7,"macd":[1,2]}'"#);
        let result = runner.execute(&input()).await.unwrap();
        assert_eq!(result.output.run_id, 7);
        assert!(result.output.series.contains_key("macd"));
    }

    #[tokio::test]
    async fn runner_receives_input_on_stdin() {
        let runner = sh(r#"grep -q '"formula":"macd"' && echo '{"runId":1}'"#);
        assert_eq!(runner.execute(&input()).await.unwrap().output.run_id, 1);
    }

    #[tokio::test]
    async fn non_zero_exit_carries_code_and_stderr() {
        let runner = sh("echo boom >&2; exit 3");
        match runner.execute(&input()).await {
            Err(RunnerError::NonZeroExit { code, stderr }) => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "boom");
            }
            other => panic!("expected NonZeroExit, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_stdout_is_rejected() {
        let runner = sh("echo not-json");
        assert!(matches!(
            runner.execute(&input()).await,
            Err(RunnerError::MalformedOutput { .. })
        ));
    }

    #[tokio::test]
    async fn missing_run_id_is_malformed() {
        let runner = sh(r#"echo '{"macd":[]}'"#);
        assert!(matches!(
            runner.execute(&input()).await,
            Err(RunnerError::MalformedOutput { .. })
        ));
    }

    #[tokio::test]
    async fn timeout_kills_child() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("runner.pid");
        let runner = sh(&format!("echo $$ > {}; exec sleep 5", pid_file.display()))
            .with_timeout(Duration::from_millis(300));
        let started = Instant::now();
        assert!(matches!(
            runner.execute(&input()).await,
            Err(RunnerError::Timeout { after_ms: 300 })
        ));
        assert!(started.elapsed() < Duration::from_secs(2));

        let pid = std::fs::read_to_string(&pid_file).unwrap();
        let alive = std::process::Command::new("kill")
            .args(["-0", pid.trim()])
            .stderr(Stdio::null())
            .status()
            .unwrap();
        assert!(!alive.success(), "runner {} still alive", pid.trim());
    }

    #[tokio::test]
    async fn timeout_covers_pipes_held_by_descendants() {
        let runner = sh(r#"cat > /dev/null; sleep 3 & echo '{"runId":1}'"#)
            .with_timeout(Duration::from_millis(200));
        let started = Instant::now();
        assert!(matches!(
            runner.execute(&input()).await,
            Err(RunnerError::Timeout { after_ms: 200 })
        ));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn missing_binary_is_spawn_error() {
        let runner = ProcessRunner::new("/nonexistent/cadence-runner");
        assert!(matches!(
            runner.execute(&input()).await,
            Err(RunnerError::Spawn { .. })
        ));
    }
}
