//! Out-of-process implementation under test.
//!
//! Each vector gets its own child process speaking the line protocol from
//! [`crate::io::protocol`]. Calls share a per-vector deadline; when it passes
//! the child is killed and the call fails with [`ModelError::Timeout`].

use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, error, instrument, warn};
use wait_timeout::ChildExt;

use crate::core::model::{ImplementationInfo, ModelError, ModelFactory, StateModel};
use crate::io::protocol::{CAPABILITY_ADVANCE_TIME, Description, Request, Response};

/// How long a child gets to exit after `shutdown` before it is killed.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);
/// Bytes of child stderr retained for diagnostics.
const STDERR_LIMIT_BYTES: usize = 8 * 1024;

/// Launch parameters shared by every spawned model.
#[derive(Debug, Clone)]
pub struct ProcessSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Budget for all calls made while executing one vector.
    pub vector_timeout: Duration,
}

/// Spawns one [`ProcessModel`] per vector.
#[derive(Debug)]
pub struct ProcessModelFactory {
    spec: ProcessSpec,
    info: ImplementationInfo,
}

impl ProcessModelFactory {
    /// Start the implementation once to read its self-description.
    #[instrument(skip_all, fields(program = %spec.program.display()))]
    pub fn probe(spec: ProcessSpec) -> Result<Self, ModelError> {
        let model = ProcessModel::spawn(&spec)?;
        let info = model
            .description()
            .implementation_info(&program_name(&spec.program));
        debug!(name = %info.name, version = %info.version, "implementation described");
        Ok(Self { spec, info })
    }
}

impl ModelFactory for ProcessModelFactory {
    fn info(&self) -> &ImplementationInfo {
        &self.info
    }

    fn create(&self) -> Result<Box<dyn StateModel>, ModelError> {
        Ok(Box::new(ProcessModel::spawn(&self.spec)?))
    }
}

fn program_name(program: &Path) -> String {
    program
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.display().to_string())
}

#[derive(Debug, Default)]
struct StderrCapture {
    bytes: Vec<u8>,
    truncated: usize,
}

/// A running child process acting as a [`StateModel`].
pub struct ProcessModel {
    child: Child,
    stdin: Option<ChildStdin>,
    responses: Receiver<std::io::Result<String>>,
    stderr: Arc<Mutex<StderrCapture>>,
    timeout: Duration,
    deadline: Instant,
    description: Description,
}

impl ProcessModel {
    /// Spawn the child and perform the `describe` handshake.
    pub fn spawn(spec: &ProcessSpec) -> Result<Self, ModelError> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!("spawning implementation process");
        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(err) => {
                error!(err = %err, program = %spec.program.display(), "failed to spawn implementation");
                return Err(ModelError::Io(err));
            }
        };

        let stdin = child.stdin.take();
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ModelError::Protocol("stdout was not piped".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ModelError::Protocol("stderr was not piped".to_string()))?;

        let (tx, responses) = mpsc::channel();
        thread::spawn(move || {
            for line in BufReader::new(stdout).lines() {
                if matches!(&line, Ok(text) if text.trim().is_empty()) {
                    continue;
                }
                let failed = line.is_err();
                if tx.send(line).is_err() || failed {
                    break;
                }
            }
        });

        let capture = Arc::new(Mutex::new(StderrCapture::default()));
        let sink = Arc::clone(&capture);
        thread::spawn(move || drain_stderr(stderr, &sink));

        let mut model = Self {
            child,
            stdin,
            responses,
            stderr: capture,
            timeout: spec.vector_timeout,
            deadline: Instant::now() + spec.vector_timeout,
            description: Description::default(),
        };
        let described = model.call(&Request::Describe)?;
        model.description = serde_json::from_value(described)
            .map_err(|err| ModelError::Protocol(format!("invalid describe result: {err}")))?;
        Ok(model)
    }

    pub fn description(&self) -> &Description {
        &self.description
    }

    fn call(&mut self, request: &Request) -> Result<Value, ModelError> {
        let mut line = serde_json::to_string(request)
            .map_err(|err| ModelError::Protocol(format!("encode request: {err}")))?;
        line.push('\n');

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(ModelError::Protocol("implementation stdin is closed".to_string()));
        };
        if let Err(err) = stdin
            .write_all(line.as_bytes())
            .and_then(|()| stdin.flush())
        {
            return Err(self.exited(&format!("write failed: {err}")));
        }

        let remaining = self.deadline.saturating_duration_since(Instant::now());
        match self.responses.recv_timeout(remaining) {
            Ok(Ok(reply)) => {
                let response: Response = serde_json::from_str(&reply).map_err(|err| {
                    ModelError::Protocol(format!("invalid response {reply:?}: {err}"))
                })?;
                response.into_result()
            }
            Ok(Err(err)) => Err(ModelError::Io(err)),
            Err(RecvTimeoutError::Timeout) => {
                warn!(timeout_secs = self.timeout.as_secs(), request = ?request, "implementation timed out, killing");
                self.kill();
                Err(ModelError::Timeout(self.timeout))
            }
            Err(RecvTimeoutError::Disconnected) => Err(self.exited("stdout closed")),
        }
    }

    fn call_unit(&mut self, request: &Request) -> Result<(), ModelError> {
        self.call(request).map(|_| ())
    }

    fn kill(&mut self) {
        self.stdin = None;
        if let Err(err) = self.child.kill() {
            debug!(err = %err, "kill implementation");
        }
        if let Err(err) = self.child.wait() {
            debug!(err = %err, "wait implementation after kill");
        }
    }

    fn exited(&mut self, what: &str) -> ModelError {
        let status = match self.child.wait_timeout(SHUTDOWN_GRACE) {
            Ok(Some(status)) => format!("{status}"),
            _ => "still running".to_string(),
        };
        self.stdin = None;
        ModelError::Protocol(format!(
            "implementation unavailable ({what}, {status}){}",
            self.stderr_tail()
        ))
    }

    fn stderr_tail(&self) -> String {
        let Ok(capture) = self.stderr.lock() else {
            return String::new();
        };
        let text = String::from_utf8_lossy(&capture.bytes);
        let text = text.trim();
        if text.is_empty() {
            return String::new();
        }
        let mut tail = format!("; stderr: {text}");
        if capture.truncated > 0 {
            tail.push_str(&format!(" [truncated {} bytes]", capture.truncated));
        }
        tail
    }
}

impl StateModel for ProcessModel {
    fn initialize(&mut self) -> Result<(), ModelError> {
        self.call_unit(&Request::Initialize)
    }

    fn set_field(&mut self, field: &str, value: &Value) -> Result<(), ModelError> {
        self.call_unit(&Request::SetField {
            field: field.to_string(),
            value: value.clone(),
        })
    }

    fn process_event(&mut self, event: &str) -> Result<(), ModelError> {
        self.call_unit(&Request::ProcessEvent {
            event: event.to_string(),
        })
    }

    fn apply_decay(&mut self) -> Result<(), ModelError> {
        self.call_unit(&Request::ApplyDecay)
    }

    fn recommended_action(&mut self) -> Result<String, ModelError> {
        match self.call(&Request::RecommendedAction)? {
            Value::String(action) => Ok(action),
            other => Err(ModelError::Protocol(format!(
                "recommended_action must be a string, got {other}"
            ))),
        }
    }

    fn supports_advance_time(&self) -> bool {
        self.description.supports(CAPABILITY_ADVANCE_TIME)
    }

    fn advance_time(&mut self, seconds: u64) -> Result<(), ModelError> {
        self.call_unit(&Request::AdvanceTime { seconds })
    }

    fn snapshot(&mut self) -> Result<Value, ModelError> {
        self.call(&Request::Snapshot)
    }
}

impl Drop for ProcessModel {
    fn drop(&mut self) {
        if let Some(mut stdin) = self.stdin.take() {
            let shutdown = serde_json::to_string(&Request::Shutdown)
                .map(|line| format!("{line}\n"))
                .unwrap_or_default();
            // The child may already be gone; a broken pipe here is expected.
            let _ = stdin.write_all(shutdown.as_bytes());
        }
        match self.child.wait_timeout(SHUTDOWN_GRACE) {
            Ok(Some(status)) => debug!(exit_code = ?status.code(), "implementation exited"),
            Ok(None) | Err(_) => {
                debug!("implementation did not exit after shutdown, killing");
                let _ = self.child.kill();
                let _ = self.child.wait();
            }
        }
    }
}

fn drain_stderr<R: Read>(mut reader: R, sink: &Mutex<StderrCapture>) {
    let mut chunk = [0u8; 4096];
    loop {
        let n = match reader.read(&mut chunk) {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        let Ok(mut capture) = sink.lock() else {
            break;
        };
        let remaining = STDERR_LIMIT_BYTES.saturating_sub(capture.bytes.len());
        let keep = n.min(remaining);
        capture.bytes.extend_from_slice(&chunk[..keep]);
        capture.truncated += n - keep;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_name_uses_file_stem() {
        assert_eq!(program_name(Path::new("/opt/models/aifeels.py")), "aifeels");
        assert_eq!(program_name(Path::new("model")), "model");
    }

    #[test]
    fn spawn_failure_is_io_error() {
        let spec = ProcessSpec {
            program: PathBuf::from("/nonexistent/definitely-not-a-model"),
            args: Vec::new(),
            vector_timeout: Duration::from_secs(1),
        };
        let err = ProcessModel::spawn(&spec).err().expect("spawn fails");
        assert!(matches!(err, ModelError::Io(_)));
    }

    #[test]
    fn stderr_capture_is_bounded() {
        let capture = Mutex::new(StderrCapture::default());
        let input = vec![b'x'; STDERR_LIMIT_BYTES + 10];
        drain_stderr(input.as_slice(), &capture);
        let capture = capture.lock().expect("lock");
        assert_eq!(capture.bytes.len(), STDERR_LIMIT_BYTES);
        assert_eq!(capture.truncated, 10);
    }
}
