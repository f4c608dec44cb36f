// Copyright (c) tasq contributors
// SPDX-License-Identifier: MIT

/// Control messages, delivered on an actor's high-priority lane ahead of any
/// regular message. They are the Rust analogue of UNIX signals.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Command {
	/// Temporarily stop processing regular messages. The actor keeps honoring
	/// commands and appears healthy to anything observing it.
	Pause,
	/// Undo a `Pause`. A no-op if the actor was not paused.
	Resume,
	/// The sentinel: stop processing and exit with `ActorExitStatus::Success`.
	///
	/// Pending messages already queued ahead of it are drained first.
	ExitWithSuccess,
	/// The sentinel: stop processing and exit with `ActorExitStatus::Quit`.
	///
	/// This is the equivalent of sending SIGINT to a process.
	Quit,
	/// A no-op that only serves to wake an actor blocked on `recv`.
	Nudge,
}
