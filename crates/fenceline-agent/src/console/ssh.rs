// Secure-transport variant: drive the system ssh client as a child
// process and wire its pipes into the same expect session.
//
// Without a pty the ssh client cannot ask for a password, so this path
// runs in BatchMode and relies on key or agent authentication. The
// username/password expect dance belongs to the telnet path.

use tokio::process::Command;
use tracing::debug;

use crate::console::expect::Session;
use crate::error::{Error, Result};

/// Default ssh port.
pub const DEFAULT_PORT: u16 = 22;

/// Spawn `ssh -p <port> -l <username> <host>` and wrap its stdio in a
/// [`Session`]. The child is reaped when the session closes.
pub fn connect(host: &str, port: u16, username: &str) -> Result<Session> {
    debug!(%host, port, %username, "spawning ssh client");

    let mut child = Command::new("ssh")
        .arg("-p")
        .arg(port.to_string())
        .arg("-l")
        .arg(username)
        .arg("-o")
        .arg("BatchMode=yes")
        .arg("-o")
        .arg("StrictHostKeyChecking=accept-new")
        .arg(host)
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| Error::Connection {
            reason: format!("failed to spawn ssh: {e}"),
        })?;

    let stdout = child.stdout.take().ok_or_else(|| Error::Connection {
        reason: "ssh child has no stdout pipe".into(),
    })?;
    let stdin = child.stdin.take().ok_or_else(|| Error::Connection {
        reason: "ssh child has no stdin pipe".into(),
    })?;

    Ok(Session::new(
        Box::new(stdout),
        Box::new(stdin),
        None,
        Some(child),
    ))
}
