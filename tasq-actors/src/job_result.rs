// Copyright (c) tasq contributors
// SPDX-License-Identifier: MIT

use std::{sync::Mutex, time::Duration};

use tokio::sync::Notify;

/// The outcome of waiting on a [`JobResult`].
///
/// A plain `Option<T>` can't tell "timed out" apart from "the value itself
/// was absent"; `Outcome` makes the two explicit.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Outcome<T> {
	Ready(T),
	TimedOut,
}

impl<T> Outcome<T> {
	pub fn ready(self) -> Option<T> {
		match self {
			Outcome::Ready(value) => Some(value),
			Outcome::TimedOut => None,
		}
	}
}

/// A one-shot value cell: a future-like handle that a worker completes exactly
/// once and any number of callers can await, with or without a timeout.
pub struct JobResult<T> {
	slot: Mutex<Option<T>>,
	notify: Notify,
}

impl<T> Default for JobResult<T> {
	fn default() -> Self {
		JobResult { slot: Mutex::new(None), notify: Notify::new() }
	}
}

impl<T: Clone> JobResult<T> {
	pub fn new() -> Self {
		Self::default()
	}

	/// Publishes `value`. The first call wins; later calls are rejected and
	/// logged rather than silently overwriting an already-published value.
	pub fn set(&self, value: T) {
		let mut slot = self.slot.lock().unwrap();
		if slot.is_some() {
			tracing::warn!("ignoring duplicate JobResult::set, a value was already published");
			return;
		}
		*slot = Some(value);
		drop(slot);
		self.notify.notify_waiters();
	}

	/// Waits up to `timeout` (or forever, if `None`) for a value to be
	/// published. Calling this again after a timeout observes a value set in
	/// the meantime.
	pub async fn get(&self, timeout: Option<Duration>) -> Outcome<T> {
		loop {
			if let Some(value) = self.slot.lock().unwrap().clone() {
				return Outcome::Ready(value);
			}
			let notified = self.notify.notified();
			// Re-check after subscribing, closing the race between the check
			// above and `set` firing its notification.
			if let Some(value) = self.slot.lock().unwrap().clone() {
				return Outcome::Ready(value);
			}
			match timeout {
				None => notified.await,
				Some(duration) => {
					if tokio::time::timeout(duration, notified).await.is_err() {
						return Outcome::TimedOut;
					}
				},
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use super::*;

	#[tokio::test]
	async fn set_before_get_is_observed_immediately() {
		let result = JobResult::new();
		result.set(42);
		assert_eq!(result.get(None).await, Outcome::Ready(42));
	}

	#[tokio::test]
	async fn timeout_then_later_set_is_observed() {
		let result = JobResult::new();
		assert_eq!(result.get(Some(Duration::from_millis(20))).await, Outcome::TimedOut);
		result.set(7);
		assert_eq!(result.get(None).await, Outcome::Ready(7));
	}

	#[tokio::test]
	async fn concurrent_waiters_all_observe_the_value() {
		let result = Arc::new(JobResult::new());
		let waiters: Vec<_> = (0..4)
			.map(|_| {
				let result = result.clone();
				tokio::spawn(async move { result.get(None).await })
			})
			.collect();
		tokio::time::sleep(Duration::from_millis(10)).await;
		result.set("done".to_string());
		for waiter in waiters {
			assert_eq!(waiter.await.unwrap(), Outcome::Ready("done".to_string()));
		}
	}

	#[tokio::test]
	async fn duplicate_set_does_not_overwrite() {
		let result = JobResult::new();
		result.set(1);
		result.set(2);
		assert_eq!(result.get(None).await, Outcome::Ready(1));
	}
}
