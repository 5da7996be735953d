use std::io::{self, Read, Write};
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::TtsError;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Exit status and captured streams of a finished engine process.
#[derive(Debug)]
pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    /// Last non-empty stderr line, used in error messages.
    pub fn stderr_tail(&self) -> &str {
        self.stderr
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .unwrap_or("")
            .trim()
    }
}

/// Run `command` to completion, capturing stdout and stderr.
///
/// `stdin`, if given, is written from a separate thread and then closed, so
/// a process that never reads its input is still bound by `deadline`. With a
/// `deadline` the process is killed once it has been running that long and
/// `Timeout` is returned; without one this blocks until the process exits.
pub fn run_captured(
    mut command: Command,
    stdin: Option<&str>,
    deadline: Option<Duration>,
) -> Result<ProcessOutput, TtsError> {
    let program = command.get_program().to_string_lossy().into_owned();
    log::debug!("Running {command:?}");

    let mut child = command
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TtsError::EngineNotFound(program.clone())
            } else {
                TtsError::Io(e)
            }
        })?;

    // Drain both pipes while waiting so a chatty process cannot block on a full pipe.
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let writer = match (stdin, child.stdin.take()) {
        (Some(payload), Some(pipe)) => Some(feed(pipe, payload.to_owned())),
        _ => None,
    };

    let status = match deadline {
        Some(limit) => wait_until(&mut child, &program, limit)?,
        None => child.wait()?,
    };

    if let Some(writer) = writer {
        writer
            .join()
            .map_err(|_| io::Error::other("stdin writer panicked"))??;
    }

    Ok(ProcessOutput {
        status,
        stdout: join(stdout),
        stderr: join(stderr),
    })
}

fn wait_until(child: &mut Child, program: &str, limit: Duration) -> Result<ExitStatus, TtsError> {
    let started = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        let elapsed = started.elapsed();
        if elapsed >= limit {
            log::warn!("{program} still running after {elapsed:?}, killing it");
            kill(child, program);
            return Err(TtsError::Timeout {
                program: program.to_string(),
                elapsed,
            });
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn kill(child: &mut Child, program: &str) {
    if let Err(e) = child.kill() {
        log::warn!("Failed to kill {program}: {e}");
    }
    let _ = child.wait();
}

fn feed(mut pipe: ChildStdin, payload: String) -> JoinHandle<io::Result<()>> {
    thread::spawn(move || match pipe.write_all(payload.as_bytes()) {
        // The process may exit without reading its input; its status decides.
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    })
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn join(handle: Option<JoinHandle<String>>) -> String {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

#[cfg(all(test, unix))]
mod tests {
    use super::run_captured;
    use crate::TtsError;
    use std::process::Command;
    use std::time::{Duration, Instant};

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[test]
    fn captures_both_streams() {
        let out = run_captured(sh("echo out; echo err >&2"), None, None).unwrap();
        assert!(out.status.success());
        assert_eq!(out.stdout.trim(), "out");
        assert_eq!(out.stderr_tail(), "err");
    }

    #[test]
    fn feeds_stdin() {
        let out = run_captured(sh("cat"), Some("سلام\n"), None).unwrap();
        assert_eq!(out.stdout, "سلام\n");
    }

    #[test]
    fn reports_non_zero_exit() {
        let out = run_captured(sh("echo boom >&2; exit 3"), None, None).unwrap();
        assert_eq!(out.status.code(), Some(3));
        assert_eq!(out.stderr_tail(), "boom");
    }

    #[test]
    fn kills_process_past_deadline() {
        let err = run_captured(sh("sleep 5"), None, Some(Duration::from_millis(100))).unwrap_err();
        assert!(matches!(err, TtsError::Timeout { .. }), "got {err:?}");
    }

    #[test]
    fn deadline_covers_unread_stdin() {
        // Larger than any pipe buffer, so the write blocks until the process dies.
        let payload = "a".repeat(1 << 20);
        let started = Instant::now();
        let err = run_captured(sh("sleep 5"), Some(&payload), Some(Duration::from_millis(200)))
            .unwrap_err();
        assert!(matches!(err, TtsError::Timeout { .. }), "got {err:?}");
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[test]
    fn process_ignoring_stdin_still_succeeds() {
        let payload = "a".repeat(1 << 20);
        let out = run_captured(sh("echo done"), Some(&payload), None).unwrap();
        assert!(out.status.success());
        assert_eq!(out.stdout.trim(), "done");
    }

    #[test]
    fn missing_program_is_engine_not_found() {
        let cmd = Command::new("/nonexistent/tts-engine");
        let err = run_captured(cmd, None, None).unwrap_err();
        assert!(matches!(err, TtsError::EngineNotFound(p) if p == "/nonexistent/tts-engine"));
    }
}
