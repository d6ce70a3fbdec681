use crate::shell::interpreter::Interpreter;
use std::io::{self, Read};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};
use wait_timeout::ChildExt;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How long output readers get to drain after the process group is killed
const KILL_GRACE: Duration = Duration::from_millis(500);

/// Faults raised while trying to run a command.
///
/// These never escape `ShellExecutor::execute`; they are folded into a
/// `Failure` result so the caller always gets an `ExecutionResult`.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("Command cannot be empty")]
    EmptyCommand,

    #[error("Shell interpreter not found: {0}")]
    InterpreterNotFound(String),

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Lost contact with the child process: {0}")]
    Communication(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    Success,
    Failure,
}

/// Result of one execution attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub status: ExecutionStatus,
    pub timed_out: bool,
}

impl ExecutionResult {
    fn from_fault(error: &ShellError) -> Self {
        Self {
            exit_code: -1,
            stdout: String::new(),
            stderr: error.to_string(),
            status: ExecutionStatus::Failure,
            timed_out: false,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Success
    }

    /// Status label written to the audit log
    pub fn audit_status(&self) -> String {
        match self.status {
            ExecutionStatus::Success => "Success".to_string(),
            ExecutionStatus::Failure => {
                let detail = self.stderr.trim();
                if detail.is_empty() {
                    format!("Failure (exit code: {})", self.exit_code)
                } else {
                    format!("Failure (stderr: {})", detail)
                }
            }
        }
    }
}

/// Runs commands through an external shell interpreter
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    interpreter: Interpreter,
    timeout: Duration,
}

impl ShellExecutor {
    pub fn new(interpreter: Interpreter) -> Self {
        Self {
            interpreter,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Execute a command and capture its output.
    ///
    /// The command is handed to the interpreter as a single argument. Every
    /// fault (empty command, missing interpreter, spawn or pipe errors) comes
    /// back as a `Failure` result rather than an error.
    pub fn execute(&self, command: &str) -> ExecutionResult {
        match self.run(command) {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "command did not run");
                ExecutionResult::from_fault(&e)
            }
        }
    }

    fn run(&self, command: &str) -> Result<ExecutionResult, ShellError> {
        if command.trim().is_empty() {
            return Err(ShellError::EmptyCommand);
        }

        let program = self.interpreter.resolve()?;

        debug!(program = %program.display(), command, "spawning interpreter");
        let mut cmd = Command::new(&program);
        cmd.args(self.interpreter.args())
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Own process group, so a timeout takes every descendant down with it
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let mut child = cmd.spawn().map_err(|source| ShellError::Spawn {
            program: self.interpreter.program().to_string(),
            source,
        })?;
        let deadline = Instant::now() + self.timeout;

        let mut stdout = PendingOutput::spawn(child.stdout.take());
        let mut stderr = PendingOutput::spawn(child.stderr.take());

        let (exit_code, mut timed_out) = self.wait(&mut child)?;

        // A descendant may still hold the pipes after the interpreter exits
        let read_until = if timed_out {
            Instant::now() + KILL_GRACE
        } else {
            deadline
        };
        let mut drained = drain_both(&mut stdout, &mut stderr, read_until)?;

        if !drained && !timed_out {
            warn!(timeout = ?self.timeout, "background process outlived the timeout, killing");
            kill_process_group(&child);
            timed_out = true;
            drained = drain_both(&mut stdout, &mut stderr, Instant::now() + KILL_GRACE)?;
        }
        if !drained {
            warn!("output pipes still open after kill, returning partial output");
        }

        let stdout = stdout.into_string();
        let mut stderr = stderr.into_string();

        if timed_out {
            if !stderr.is_empty() && !stderr.ends_with('\n') {
                stderr.push('\n');
            }
            stderr.push_str(&format!(
                "Command timed out after {:?} and was terminated",
                self.timeout
            ));
        }

        let status = if exit_code == 0 && !timed_out {
            ExecutionStatus::Success
        } else {
            ExecutionStatus::Failure
        };

        debug!(exit_code, timed_out, "command finished");
        Ok(ExecutionResult {
            exit_code,
            stdout,
            stderr,
            status,
            timed_out,
        })
    }

    /// Wait for exit, killing the child once the timeout passes
    fn wait(&self, child: &mut Child) -> Result<(i32, bool), ShellError> {
        let waited = child
            .wait_timeout(self.timeout)
            .map_err(|e| ShellError::Communication(format!("wait failed: {}", e)))?;

        match waited {
            Some(status) => Ok((status.code().unwrap_or(-1), false)),
            None => {
                warn!(timeout = ?self.timeout, "command timed out, killing");
                kill_process_group(child);
                child
                    .kill()
                    .map_err(|e| ShellError::Communication(format!("kill failed: {}", e)))?;
                let status = child
                    .wait()
                    .map_err(|e| ShellError::Communication(format!("wait after kill failed: {}", e)))?;
                Ok((status.code().unwrap_or(-1), true))
            }
        }
    }
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self::new(Interpreter::platform_default())
    }
}

/// Kill the child's whole process group. Best effort: the group may
/// already be gone.
fn kill_process_group(child: &Child) {
    #[cfg(unix)]
    {
        // The child leads its own group, so its pid is the pgid
        let pgid = child.id() as libc::pid_t;
        if unsafe { libc::killpg(pgid, libc::SIGKILL) } == -1 {
            let err = io::Error::last_os_error();
            if err.raw_os_error() != Some(libc::ESRCH) {
                warn!(error = %err, "could not kill process group");
            }
        }
    }
    #[cfg(not(unix))]
    let _ = child;
}

/// Output of one pipe, read to the end on its own thread
struct PendingOutput {
    receiver: Option<Receiver<io::Result<Vec<u8>>>>,
    bytes: Option<Vec<u8>>,
}

impl PendingOutput {
    fn spawn<R>(stream: Option<R>) -> Self
    where
        R: Read + Send + 'static,
    {
        let receiver = stream.map(|mut stream| {
            let (tx, rx) = mpsc::channel();
            thread::spawn(move || {
                let mut buf = Vec::new();
                let result = stream.read_to_end(&mut buf).map(|_| buf);
                let _ = tx.send(result);
            });
            rx
        });

        Self {
            receiver,
            bytes: None,
        }
    }

    /// Wait for the reader until `deadline`. Returns true once the pipe
    /// reached end of file.
    fn wait_until(&mut self, deadline: Instant) -> Result<bool, ShellError> {
        if self.bytes.is_some() {
            return Ok(true);
        }
        let Some(receiver) = &self.receiver else {
            self.bytes = Some(Vec::new());
            return Ok(true);
        };

        match receiver.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
            Ok(result) => {
                let bytes = result
                    .map_err(|e| ShellError::Communication(format!("failed to read output: {}", e)))?;
                self.bytes = Some(bytes);
                Ok(true)
            }
            Err(RecvTimeoutError::Timeout) => Ok(false),
            Err(RecvTimeoutError::Disconnected) => Err(ShellError::Communication(
                "output reader thread stopped".to_string(),
            )),
        }
    }

    fn into_string(self) -> String {
        String::from_utf8_lossy(&self.bytes.unwrap_or_default()).into_owned()
    }
}

fn drain_both(
    stdout: &mut PendingOutput,
    stderr: &mut PendingOutput,
    deadline: Instant,
) -> Result<bool, ShellError> {
    let stdout_done = stdout.wait_until(deadline)?;
    let stderr_done = stderr.wait_until(deadline)?;
    Ok(stdout_done && stderr_done)
}
