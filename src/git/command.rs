use crate::discovery::MARKER_DIR;
use crate::error::OracleError;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::warn;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// What a finished git call produced, successful or not.
struct Captured {
    success: bool,
    stdout:  String,
    stderr:  String,
}

/// Runs `git <args>` against the repository rooted at `repo` and returns stdout.
///
/// git is pinned to `repo/.git`, so a broken marker fails instead of falling
/// back to an enclosing repository. The child is killed once `timeout`
/// elapses. A failure on a repository whose HEAD is unborn is reported as
/// [`OracleError::EmptyHistory`].
pub fn run_git(repo: &Path, args: &[&str], timeout: Duration) -> Result<String, OracleError> {
    let out = capture(repo, args, timeout)?;
    if out.success {
        return Ok(out.stdout);
    }
    if is_unborn_head(repo, timeout) {
        return Err(OracleError::EmptyHistory);
    }
    Err(OracleError::Command {
        command: command_name(args),
        stderr:  out.stderr.trim().to_string(),
    })
}

fn capture(repo: &Path, args: &[&str], timeout: Duration) -> Result<Captured, OracleError> {
    let mut cmd = Command::new("git");
    cmd.args(args)
        .current_dir(repo)
        .env("GIT_DIR", repo.join(MARKER_DIR))
        .env("GIT_WORK_TREE", repo)
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    // Own process group: a terminal Ctrl+C reaches the scheduler only, and
    // in-flight calls run to completion.
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    let mut child = cmd.spawn().map_err(OracleError::Spawn)?;

    // stdout and stderr are drained on their own threads so a chatty child
    // never blocks on a full pipe.
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let stdout_reader = thread::spawn(move || drain(stdout));
    let stderr_reader = thread::spawn(move || drain(stderr));

    let start = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if start.elapsed() > timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    let command = command_name(args);
                    warn!(repo = %repo.display(), "git {command} timed out after {}s", timeout.as_secs());
                    return Err(OracleError::Timeout { command, timeout });
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(e) => {
                let _ = child.kill();
                return Err(OracleError::Spawn(e));
            }
        }
    };

    Ok(Captured {
        success: status.success(),
        stdout:  stdout_reader.join().unwrap_or_default(),
        stderr:  stderr_reader.join().unwrap_or_default(),
    })
}

/// HEAD names a branch that does not resolve, in a repository without a
/// single ref. A dangling or corrupt HEAD in a repository that has history
/// is not unborn.
fn is_unborn_head(repo: &Path, timeout: Duration) -> bool {
    let probe = |args: &[&str]| capture(repo, args, timeout).ok();

    if !matches!(probe(&["symbolic-ref", "-q", "HEAD"]), Some(o) if o.success) {
        return false;
    }
    if !matches!(probe(&["rev-parse", "-q", "--verify", "HEAD"]), Some(o) if !o.success) {
        return false;
    }
    // broken refs are skipped by for-each-ref but warned about on stderr
    matches!(
        probe(&["for-each-ref", "--count=1"]),
        Some(o) if o.success && o.stdout.trim().is_empty() && o.stderr.trim().is_empty()
    )
}

fn command_name(args: &[&str]) -> String {
    args.first().copied().unwrap_or("").to_string()
}

fn drain<R: Read>(pipe: Option<R>) -> String {
    let mut buf = Vec::new();
    if let Some(mut p) = pipe {
        let _ = p.read_to_end(&mut buf);
    }
    String::from_utf8_lossy(&buf).into_owned()
}
