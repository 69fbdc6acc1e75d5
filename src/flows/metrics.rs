// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for lifecycle outcomes.
#[derive(Debug, Default)]
pub struct LifecycleMetrics {
	issued: AtomicU64,
	renewed: AtomicU64,
	revoked: AtomicU64,
	failure: AtomicU64,
}
impl LifecycleMetrics {
	/// Returns the number of service tokens issued.
	pub fn issued(&self) -> u64 {
		self.issued.load(Ordering::Relaxed)
	}

	/// Returns the number of successful lease renewals.
	pub fn renewed(&self) -> u64 {
		self.renewed.load(Ordering::Relaxed)
	}

	/// Returns the number of successful revocations.
	pub fn revoked(&self) -> u64 {
		self.revoked.load(Ordering::Relaxed)
	}

	/// Returns the number of failed lifecycle operations of any kind.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	pub(crate) fn record_issued(&self) {
		self.issued.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_renewed(&self) {
		self.renewed.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_revoked(&self) {
		self.revoked.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failure.fetch_add(1, Ordering::Relaxed);
	}
}
