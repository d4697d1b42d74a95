//! Backend Process Supervision
//!
//! Makes sure a local Ollama server is running before the first model
//! operation. The check looks the process up by name; when it is missing,
//! `ollama serve` is launched detached (its output discarded) and the
//! supervisor waits a fixed startup delay.
//!
//! Nothing here ever fails hard: a failed launch is reported as
//! [`LaunchOutcome::LaunchFailed`] and the session carries on, so later
//! backend calls surface their own connection errors.

use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

/// Result of [`BackendSupervisor::ensure_backend_running`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// A matching process was already running
    AlreadyRunning,
    /// The server was launched and the startup delay elapsed
    Launched,
    /// Process management is disabled (remote or externally managed server)
    Unmanaged,
    /// Launching failed; the reason is kept for the notice
    LaunchFailed(String),
}

/// Settings for the local server process
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessSettings {
    /// Whether to check for and launch the server at all
    pub manage: bool,
    /// Process name to look for
    pub name: String,
    /// Program used to launch the server
    pub command: String,
    /// Arguments passed to the program
    pub args: Vec<String>,
    /// Time to wait after launching before the server is used
    pub startup_delay: Duration,
}

impl Default for ProcessSettings {
    fn default() -> Self {
        Self {
            manage: true,
            name: "ollama".to_string(),
            command: "ollama".to_string(),
            args: vec!["serve".to_string()],
            startup_delay: Duration::from_secs(2),
        }
    }
}

/// Operating system process operations
///
/// Split out so the supervisor can be tested without touching real processes.
#[async_trait]
pub trait ProcessControl: Send + Sync {
    /// Whether any process with this name is running
    async fn is_running(&self, name: &str) -> anyhow::Result<bool>;

    /// Start a program detached from this process's stdio
    fn spawn_detached(&self, program: &str, args: &[String]) -> anyhow::Result<()>;
}

/// Case-insensitive whole-name process lookup
///
/// `ollama` also finds the desktop app's `Ollama` process. The pattern is
/// anchored so this program's own `ollama-chat` process never matches.
fn pgrep(name: &str) -> Command {
    let mut command = Command::new("pgrep");
    command.arg("-i").arg(format!("^{name}$"));
    command
}

/// [`ProcessControl`] backed by the host system
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemProcesses;

#[async_trait]
impl ProcessControl for SystemProcesses {
    async fn is_running(&self, name: &str) -> anyhow::Result<bool> {
        let status = pgrep(name)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .await?;

        // pgrep exits 1 for "no match"; anything above means it failed
        match status.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => anyhow::bail!("pgrep exited with {status}"),
        }
    }

    fn spawn_detached(&self, program: &str, args: &[String]) -> anyhow::Result<()> {
        let child = Command::new(program)
            .args(args)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(false)
            .spawn()?;

        tracing::info!(program = %program, pid = ?child.id(), "Launched backend process");
        drop(child);
        Ok(())
    }
}

/// Checks for and launches the local backend server
pub struct BackendSupervisor<P: ProcessControl = SystemProcesses> {
    control: P,
    settings: ProcessSettings,
}

impl<P: ProcessControl> BackendSupervisor<P> {
    /// Supervisor using a custom process control
    pub fn with_control(control: P, settings: ProcessSettings) -> Self {
        Self { control, settings }
    }

    /// Ensure the backend server is running, launching it if needed
    pub async fn ensure_backend_running(&self) -> LaunchOutcome {
        if !self.settings.manage {
            tracing::debug!("Backend process management disabled");
            return LaunchOutcome::Unmanaged;
        }

        match self.control.is_running(&self.settings.name).await {
            Ok(true) => {
                tracing::debug!(name = %self.settings.name, "Backend process already running");
                return LaunchOutcome::AlreadyRunning;
            }
            Ok(false) => {}
            Err(e) => {
                // Can't tell, so try to start it; a duplicate server exits on its own
                tracing::warn!(error = %e, "Process lookup failed, launching anyway");
            }
        }

        tracing::info!(
            command = %self.settings.command,
            args = ?self.settings.args,
            "Starting backend server"
        );

        if let Err(e) = self
            .control
            .spawn_detached(&self.settings.command, &self.settings.args)
        {
            tracing::error!(error = %e, "Failed to launch backend server");
            return LaunchOutcome::LaunchFailed(e.to_string());
        }

        if !self.settings.startup_delay.is_zero() {
            tokio::time::sleep(self.settings.startup_delay).await;
        }

        LaunchOutcome::Launched
    }
}
