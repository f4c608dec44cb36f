// Copyright (c) tasq contributors
// SPDX-License-Identifier: MIT

use std::sync::atomic::{AtomicU32, Ordering};

#[repr(u32)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ActorState {
	/// The actor has some message (including commands) left to process.
	Processing = 0,
	/// The actor is waiting for a message.
	Idle = 1,
	/// The actor processes no regular message but still honors commands.
	Paused = 2,
	/// The actor exited cleanly. Terminal.
	Success = 3,
	/// The actor exited with a failure or panicked. Terminal.
	Failure = 4,
}

impl From<u32> for ActorState {
	fn from(value: u32) -> Self {
		match value {
			0 => ActorState::Processing,
			1 => ActorState::Idle,
			2 => ActorState::Paused,
			3 => ActorState::Success,
			4 => ActorState::Failure,
			_ => panic!("found forbidden u32 value for ActorState `{value}`"),
		}
	}
}

impl ActorState {
	pub fn is_running(&self) -> bool {
		matches!(self, ActorState::Idle | ActorState::Processing)
	}

	pub fn is_terminated(&self) -> bool {
		matches!(self, ActorState::Success | ActorState::Failure)
	}
}

/// Lock-free state cell shared between an actor's task and its `ActorHandle`.
pub(crate) struct AtomicState(AtomicU32);

impl Default for AtomicState {
	fn default() -> Self {
		AtomicState(AtomicU32::new(ActorState::Processing as u32))
	}
}

impl AtomicState {
	pub(crate) fn idle(&self) {
		let _ = self.0.compare_exchange(
			ActorState::Processing as u32,
			ActorState::Idle as u32,
			Ordering::SeqCst,
			Ordering::SeqCst,
		);
	}

	pub(crate) fn process(&self) {
		let _ = self.0.compare_exchange(
			ActorState::Idle as u32,
			ActorState::Processing as u32,
			Ordering::SeqCst,
			Ordering::SeqCst,
		);
	}

	pub(crate) fn pause(&self) {
		let _ = self.0.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |state| {
			if ActorState::from(state).is_running() {
				Some(ActorState::Paused as u32)
			} else {
				None
			}
		});
	}

	pub(crate) fn resume(&self) {
		let _ = self.0.compare_exchange(
			ActorState::Paused as u32,
			ActorState::Processing as u32,
			Ordering::SeqCst,
			Ordering::SeqCst,
		);
	}

	/// Terminal states only ever move towards `Failure`: once an actor has
	/// failed, a later success report cannot resurrect it.
	pub(crate) fn exit(&self, success: bool) {
		let new_state = if success { ActorState::Success } else { ActorState::Failure };
		self.0.fetch_max(new_state as u32, Ordering::Release);
	}

	pub(crate) fn get(&self) -> ActorState {
		ActorState::from(self.0.load(Ordering::Acquire))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn processing_to_idle_and_back() {
		let state = AtomicState::default();
		assert_eq!(state.get(), ActorState::Processing);
		state.idle();
		assert_eq!(state.get(), ActorState::Idle);
		state.process();
		assert_eq!(state.get(), ActorState::Processing);
	}

	#[test]
	fn pause_resume() {
		let state = AtomicState::default();
		state.pause();
		assert_eq!(state.get(), ActorState::Paused);
		state.resume();
		assert_eq!(state.get(), ActorState::Processing);
	}

	#[test]
	fn exit_is_sticky_towards_failure() {
		let state = AtomicState::default();
		state.exit(true);
		assert_eq!(state.get(), ActorState::Success);
		state.exit(false);
		assert_eq!(state.get(), ActorState::Failure);
		// A later "success" report can never undo a failure.
		state.exit(true);
		assert_eq!(state.get(), ActorState::Failure);
	}
}
