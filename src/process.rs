//! Bounded-time subprocess execution.

use std::ffi::{OsStr, OsString};
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use thiserror::Error;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Error, Debug)]
pub enum RunError {
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` did not finish within {timeout:?}")]
    TimedOut { program: String, timeout: Duration },

    #[error("failed to wait for `{program}`: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Captured result of a finished process.
#[derive(Debug)]
pub struct Finished {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

/// A command line run with a deadline. The child is killed once the
/// deadline passes.
#[derive(Debug, Clone)]
pub struct Invocation {
    program: OsString,
    args: Vec<OsString>,
    env: Vec<(OsString, OsString)>,
    timeout: Duration,
}

impl Invocation {
    pub fn new(program: impl AsRef<OsStr>, timeout: Duration) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
            env: Vec::new(),
            timeout,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.env
            .push((key.as_ref().to_os_string(), value.as_ref().to_os_string()));
        self
    }

    fn display_program(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    pub fn run(&self) -> Result<Finished, RunError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        let mut child = cmd.spawn().map_err(|source| RunError::Spawn {
            program: self.display_program(),
            source,
        })?;

        // Pipes are drained concurrently with polling.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = self.wait_until_deadline(&mut child)?;

        Ok(Finished {
            status,
            stdout: join(stdout),
            stderr: join(stderr),
        })
    }

    fn wait_until_deadline(&self, child: &mut Child) -> Result<ExitStatus, RunError> {
        let deadline = Instant::now() + self.timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(RunError::TimedOut {
                        program: self.display_program(),
                        timeout: self.timeout,
                    });
                }
                Ok(None) => std::thread::sleep(POLL_INTERVAL),
                Err(source) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(RunError::Wait {
                        program: self.display_program(),
                        source,
                    });
                }
            }
        }
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<String>> {
    pipe.map(|mut reader| {
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = reader.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    })
}

fn join(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout_of_finished_process() {
        let finished = Invocation::new("sh", Duration::from_secs(5))
            .arg("-c")
            .arg("printf 'Version: 1.0\\n'")
            .run()
            .unwrap();
        assert!(finished.status.success());
        assert_eq!(finished.stdout, "Version: 1.0\n");
    }

    #[test]
    fn passes_environment() {
        let finished = Invocation::new("sh", Duration::from_secs(5))
            .arg("-c")
            .arg("printf \"$REQPIN_TEST_VALUE\"")
            .env("REQPIN_TEST_VALUE", "hello")
            .run()
            .unwrap();
        assert_eq!(finished.stdout, "hello");
    }

    #[test]
    fn kills_process_after_timeout() {
        let started = Instant::now();
        let err = Invocation::new("sh", Duration::from_millis(200))
            .arg("-c")
            .arg("sleep 10")
            .run()
            .unwrap_err();
        assert!(matches!(err, RunError::TimedOut { .. }));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let err = Invocation::new("reqpin-definitely-not-a-program", Duration::from_secs(1))
            .run()
            .unwrap_err();
        assert!(matches!(err, RunError::Spawn { .. }));
    }
}
