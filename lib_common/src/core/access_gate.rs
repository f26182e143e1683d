//! # Access Gate
//!
//! Session-scoped PIN check in front of the dashboard. Local deployments start
//! unlocked; remote viewers must enter the PIN once per session. The unlocked
//! flag lives only in memory and is gone when the process exits.

use crate::backend::deployment::DeploymentMode;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// PIN used when none is configured.
pub const DEFAULT_PIN: &str = "8074";

/// # Access Error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    /// The attempt did not match the configured PIN.
    #[error("incorrect PIN")]
    IncorrectPin,
}

/// # Access Gate
#[derive(Debug)]
pub struct AccessGate {
    pin: String,
    unlocked: AtomicBool,
}

impl AccessGate {
    /// Builds a gate for `mode`. Only remote deployments start locked.
    pub fn new(mode: DeploymentMode, pin: impl Into<String>) -> Self {
        Self {
            pin: pin.into(),
            unlocked: AtomicBool::new(mode.is_local()),
        }
    }

    /// Whether the dashboard may be shown.
    pub fn is_unlocked(&self) -> bool {
        self.unlocked.load(Ordering::Acquire)
    }

    /// Unlocks the session if `attempt` matches the PIN, ignoring surrounding
    /// whitespace.
    ///
    /// # Errors
    /// `AccessError::IncorrectPin` on mismatch; the gate stays as it was.
    pub fn try_unlock(&self, attempt: &str) -> Result<(), AccessError> {
        if attempt.trim() == self.pin {
            self.unlocked.store(true, Ordering::Release);
            log::info!("Dashboard unlocked");
            Ok(())
        } else {
            log::warn!("Rejected PIN attempt");
            Err(AccessError::IncorrectPin)
        }
    }

    /// Ends the session.
    pub fn lock(&self) {
        self.unlocked.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_sessions_start_unlocked() {
        assert!(AccessGate::new(DeploymentMode::Local, DEFAULT_PIN).is_unlocked());
    }

    #[test]
    fn remote_sessions_need_the_pin() {
        let gate = AccessGate::new(DeploymentMode::Remote, DEFAULT_PIN);
        assert!(!gate.is_unlocked());

        assert_eq!(gate.try_unlock("1234"), Err(AccessError::IncorrectPin));
        assert!(!gate.is_unlocked());

        assert_eq!(gate.try_unlock(" 8074\n"), Ok(()));
        assert!(gate.is_unlocked());

        gate.lock();
        assert!(!gate.is_unlocked());
    }
}
