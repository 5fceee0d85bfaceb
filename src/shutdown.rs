//! Cooperative shutdown.
//!
//! Termination signals only set a flag; the simulator loop observes it
//! between receive deadlines and unwinds by closing its own socket. Nothing
//! in signal context ever touches connection state.

use signal_hook::consts::signal::{SIGINT, SIGTERM};
use signal_hook::flag;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A shared cancellation flag.
#[derive(Clone, Debug, Default)]
pub struct ShutdownToken {
    requested: Arc<AtomicBool>,
}

impl ShutdownToken {
    pub fn new() -> Self {
        ShutdownToken {
            requested: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Ask the loop to stop at its next iteration. Production shutdown goes
    /// through the registered signal handlers instead.
    #[cfg(test)]
    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Route SIGINT and SIGTERM into this token.
    pub fn install_signal_handlers(&self) -> io::Result<()> {
        for signal in [SIGINT, SIGTERM] {
            flag::register(signal, Arc::clone(&self.requested))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_starts_unrequested() {
        let token = ShutdownToken::new();
        assert!(!token.is_requested());
    }

    #[test]
    fn test_request_is_visible_to_clones() {
        let token = ShutdownToken::new();
        let observer = token.clone();
        token.request();
        assert!(observer.is_requested());
    }
}
