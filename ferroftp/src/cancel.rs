//! # Cancel
//!
//! Cooperative cancellation of session operations

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::types::{FtpError, FtpResult};

/// A flag checked before each command, at each accept poll and at each transfer chunk.
///
/// Cloning the token yields a handle to the same flag, so it can be fired from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of the running operation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Re-arm the token after a cancelled operation returned
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    /// Fails with [`FtpError::Cancelled`] once the token fired
    pub(crate) fn check(&self) -> FtpResult<()> {
        if self.is_cancelled() {
            Err(FtpError::Cancelled)
        } else {
            Ok(())
        }
    }
}
