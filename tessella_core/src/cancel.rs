//! Cooperative cancellation for mosaic jobs.
//!
//! The orchestrator checks the token between phases; a phase that has
//! started always runs to completion.

use crate::{MosaicError, MosaicResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A cloneable cancellation flag shared between a caller and a running job.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
	cancelled: Arc<AtomicBool>,
}

impl CancelToken {
	pub fn new() -> Self {
		Self::default()
	}

	/// Requests cancellation. The job stops at its next phase boundary.
	pub fn cancel(&self) {
		self.cancelled.store(true, Ordering::SeqCst);
	}

	pub fn is_cancelled(&self) -> bool {
		self.cancelled.load(Ordering::SeqCst)
	}

	/// Fails with [`MosaicError::Cancelled`] if cancellation was requested.
	///
	/// `phase` names the phase that would have run next.
	pub fn check(&self, phase: &'static str) -> MosaicResult<()> {
		if self.is_cancelled() {
			Err(MosaicError::Cancelled { phase })
		} else {
			Ok(())
		}
	}
}
