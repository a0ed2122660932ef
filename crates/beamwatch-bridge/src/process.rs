use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use crate::error::BridgeError;

/// Environment variable carrying the XML-RPC port to the launched companion.
pub const PORT_ENV: &str = "BEAMWATCH_XMLRPC_PORT";

/// A companion process launched from a pre-built command line.
///
/// Nothing runs until [`CompanionProcess::start`]. An exited child is reported
/// once and then treated as not running; it is not restarted automatically.
#[derive(Debug)]
pub struct CompanionProcess {
    command: Vec<String>,
    port: u16,
    child: Option<Child>,
}

impl CompanionProcess {
    pub fn new(command: Vec<String>, port: u16) -> Self {
        Self {
            command,
            port,
            child: None,
        }
    }

    pub fn command(&self) -> &[String] {
        &self.command
    }

    /// Launch the companion. No-op while a previous launch is still running.
    pub fn start(&mut self) -> Result<(), BridgeError> {
        if self.is_running() {
            return Ok(());
        }
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| BridgeError::Process("empty launch command".into()))?;
        let child = Command::new(program)
            .args(args)
            .env(PORT_ENV, self.port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| BridgeError::Process(format!("failed to launch {program}: {e}")))?;
        tracing::info!(pid = child.id(), %program, port = self.port, "companion launched");
        self.child = Some(child);
        Ok(())
    }

    /// Whether the launched child is still running. Reaps it if it exited.
    pub fn is_running(&mut self) -> bool {
        let Some(child) = self.child.as_mut() else {
            return false;
        };
        match child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                tracing::warn!(pid = child.id(), %status, "companion exited");
                self.child = None;
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "cannot query companion status");
                false
            }
        }
    }

    pub fn id(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    /// Give the child `grace` to exit on its own, then kill it.
    pub fn stop(&mut self, grace: Duration) {
        let Some(mut child) = self.child.take() else {
            return;
        };
        let deadline = Instant::now() + grace;
        loop {
            match child.try_wait() {
                Ok(Some(_)) => return,
                Ok(None) if Instant::now() < deadline => {
                    std::thread::sleep(Duration::from_millis(50));
                }
                _ => break,
            }
        }
        tracing::debug!(pid = child.id(), "killing companion");
        child.kill().ok();
        child.wait().ok();
    }
}

impl Drop for CompanionProcess {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            child.kill().ok();
            child.wait().ok();
        }
    }
}
