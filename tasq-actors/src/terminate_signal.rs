// Copyright (c) tasq contributors
// SPDX-License-Identifier: MIT

use std::sync::{
	atomic::{AtomicBool, Ordering},
	Arc, Mutex, Weak,
};

use tracing::debug;

/// A cooperative, inheritable kill switch.
///
/// Killing a signal also kills every child created through [`TerminateSignal::child`],
/// recursively. This is how a Master's shutdown reaches every actor it (transitively)
/// spawned without each of them holding a direct reference to the Master.
#[derive(Clone, Default)]
pub struct TerminateSignal {
	inner: Arc<Inner>,
}

struct Inner {
	alive: AtomicBool,
	children: Mutex<Vec<Weak<Inner>>>,
}

impl Default for Inner {
	fn default() -> Self {
		Self { alive: AtomicBool::new(true), children: Mutex::default() }
	}
}

fn garbage_collect(children: &mut Vec<Weak<Inner>>) {
	children.retain(|child| child.strong_count() > 0);
}

impl TerminateSignal {
	pub fn is_alive(&self) -> bool {
		self.inner.alive.load(Ordering::Relaxed)
	}

	pub fn is_dead(&self) -> bool {
		!self.is_alive()
	}

	pub fn kill(&self) {
		self.inner.kill();
	}

	/// Creates a child signal. If the parent is already dead, the child is born dead.
	pub fn child(&self) -> TerminateSignal {
		let mut children = self.inner.children.lock().unwrap();
		let child_inner = Arc::new(Inner { alive: AtomicBool::new(self.is_alive()), ..Default::default() });
		garbage_collect(&mut children);
		children.push(Arc::downgrade(&child_inner));
		TerminateSignal { inner: child_inner }
	}
}

impl Inner {
	fn kill(&self) {
		debug!("terminate-signal-activated");
		self.alive.store(false, Ordering::Relaxed);
		let mut children = self.children.lock().unwrap();
		for weak_child in children.drain(..) {
			if let Some(child) = weak_child.upgrade() {
				child.kill();
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::TerminateSignal;

	#[test]
	fn kill_is_idempotent() {
		let sig = TerminateSignal::default();
		assert!(sig.is_alive());
		sig.kill();
		assert!(sig.is_dead());
		sig.kill();
		assert!(sig.is_dead());
	}

	#[test]
	fn kill_propagates_to_children_and_grandchildren() {
		let sig = TerminateSignal::default();
		let child = sig.child();
		let grandchild = child.child();
		assert!(grandchild.is_alive());
		sig.kill();
		assert!(child.is_dead());
		assert!(grandchild.is_dead());
	}

	#[test]
	fn killing_a_child_does_not_kill_the_parent() {
		let sig = TerminateSignal::default();
		let child = sig.child();
		child.kill();
		assert!(sig.is_alive());
		assert!(child.is_dead());
	}
}
