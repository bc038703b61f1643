//! Confirmation-gated process and host lifecycle
//!
//! Exit, restart, shutdown and reboot never act on the first request. A
//! request is parked in the [`LifecycleGate`] and only a `confirm` from the
//! same origin within the confirmation window releases it. Released actions
//! are published on a watch channel; the daemon drains its workers and
//! [`perform`] then runs the action through a fixed argv, never a shell.

use std::fmt;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tokio::sync::watch;

use crate::capabilities::SystemLifecycle;
use crate::config::LifecycleConfig;
use crate::{Error, Result};

const AUDIT: &str = "ziggy::audit";

/// A process or host lifecycle action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    /// Stop the assistant
    Exit,
    /// Re-exec the assistant with the same arguments
    Restart,
    /// Power off the host
    Shutdown,
    /// Reboot the host
    Reboot,
}

impl LifecycleAction {
    /// Whether the action affects the host rather than this process
    #[must_use]
    pub const fn is_host_power(self) -> bool {
        matches!(self, Self::Shutdown | Self::Reboot)
    }
}

impl fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Exit => "exit",
            Self::Restart => "restart",
            Self::Shutdown => "shutdown",
            Self::Reboot => "reboot",
        })
    }
}

/// Where a command came from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Origin {
    /// The local CLI
    Local,
    /// The microphone
    Voice,
    /// A Telegram sender, by user id
    Telegram(i64),
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Voice => f.write_str("voice"),
            Self::Telegram(id) => write!(f, "telegram:{id}"),
        }
    }
}

/// Outcome of a lifecycle request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleDecision {
    /// Parked; a confirmation is expected within `window`
    AwaitingConfirmation {
        action: LifecycleAction,
        window: Duration,
    },
    /// Host power actions are disabled in configuration
    Refused(LifecycleAction),
}

/// Outcome of a confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// Released for execution
    Confirmed(LifecycleAction),
    /// The pending request timed out
    Expired(LifecycleAction),
    /// Nothing pending for this origin
    NothingPending,
}

struct Pending {
    action: LifecycleAction,
    origin: Origin,
    expires_at: Instant,
}

/// Holds at most one pending lifecycle request
pub struct LifecycleGate {
    pending: Mutex<Option<Pending>>,
    window: Duration,
    allow_host_power: bool,
    released: watch::Sender<Option<LifecycleAction>>,
}

impl LifecycleGate {
    #[must_use]
    pub fn new(config: &LifecycleConfig) -> Self {
        Self::with_window(config.confirm_window, config.allow_host_power)
    }

    #[must_use]
    pub fn with_window(window: Duration, allow_host_power: bool) -> Self {
        let (released, _) = watch::channel(None);
        Self {
            pending: Mutex::new(None),
            window,
            allow_host_power,
            released,
        }
    }

    /// Receiver that observes confirmed actions
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<LifecycleAction>> {
        self.released.subscribe()
    }

    /// The most recently confirmed action, if any
    #[must_use]
    pub fn released(&self) -> Option<LifecycleAction> {
        *self.released.borrow()
    }
}

impl SystemLifecycle for LifecycleGate {
    fn request(&self, action: LifecycleAction, origin: &Origin) -> LifecycleDecision {
        if action.is_host_power() && !self.allow_host_power {
            tracing::warn!(target: AUDIT, %action, %origin, "host power action refused");
            return LifecycleDecision::Refused(action);
        }

        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = pending.as_ref() {
            tracing::info!(
                target: AUDIT,
                action = %previous.action,
                origin = %previous.origin,
                "replacing pending lifecycle request"
            );
        }
        *pending = Some(Pending {
            action,
            origin: origin.clone(),
            expires_at: Instant::now() + self.window,
        });

        tracing::info!(target: AUDIT, %action, %origin, "lifecycle action awaiting confirmation");
        LifecycleDecision::AwaitingConfirmation {
            action,
            window: self.window,
        }
    }

    fn confirm(&self, origin: &Origin) -> ConfirmOutcome {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());

        let Some(request) = pending.take_if(|p| p.origin == *origin) else {
            tracing::info!(target: AUDIT, %origin, "confirmation with nothing pending");
            return ConfirmOutcome::NothingPending;
        };

        if Instant::now() > request.expires_at {
            tracing::info!(target: AUDIT, action = %request.action, %origin, "lifecycle request expired");
            return ConfirmOutcome::Expired(request.action);
        }

        tracing::warn!(target: AUDIT, action = %request.action, %origin, "lifecycle action confirmed");
        self.released.send_replace(Some(request.action));
        ConfirmOutcome::Confirmed(request.action)
    }
}

/// Carry out a confirmed action after the daemon has shut down
///
/// `Exit` is a no-op; the caller exits normally. `Restart` replaces the
/// current process image and only returns on failure.
///
/// # Errors
///
/// Returns `Error::Lifecycle` if the command cannot be started or exits
/// unsuccessfully
pub fn perform(action: LifecycleAction, config: &LifecycleConfig) -> Result<()> {
    tracing::warn!(target: AUDIT, %action, "performing lifecycle action");
    match action {
        LifecycleAction::Exit => Ok(()),
        LifecycleAction::Restart => restart_self(),
        LifecycleAction::Shutdown => run_argv(&config.poweroff_command),
        LifecycleAction::Reboot => run_argv(&config.reboot_command),
    }
}

fn run_argv(argv: &[String]) -> Result<()> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| Error::Lifecycle("empty command".to_string()))?;

    let status = std::process::Command::new(program)
        .args(args)
        .status()
        .map_err(|e| Error::Lifecycle(format!("failed to run {program}: {e}")))?;

    if status.success() {
        Ok(())
    } else {
        Err(Error::Lifecycle(format!("{program} exited with {status}")))
    }
}

#[cfg(unix)]
fn restart_self() -> Result<()> {
    use std::os::unix::process::CommandExt;

    let exe = std::env::current_exe()?;
    let err = std::process::Command::new(&exe)
        .args(std::env::args_os().skip(1))
        .exec();
    Err(Error::Lifecycle(format!("failed to re-exec {}: {err}", exe.display())))
}

#[cfg(not(unix))]
fn restart_self() -> Result<()> {
    let exe = std::env::current_exe()?;
    std::process::Command::new(&exe)
        .args(std::env::args_os().skip(1))
        .spawn()
        .map_err(|e| Error::Lifecycle(format!("failed to spawn {}: {e}", exe.display())))?;
    Ok(())
}
