// Copyright (c) tasq contributors
// SPDX-License-Identifier: MIT

use std::{fmt, sync::Arc};

use async_trait::async_trait;

use crate::actor_context::ActorContext;

/// How an actor's task loop came to an end.
#[derive(Debug, Clone)]
pub enum ActorExitStatus {
	/// Drained its mailbox and every `MessageBus` pointing to it was dropped,
	/// or it received `Command::ExitWithSuccess`.
	Success,
	/// Received `Command::Quit`.
	Quit,
	/// Its `TerminateSignal` was activated while it was running.
	Killed,
	/// An actor it was sending to is gone and can never receive again.
	DownstreamClosed,
	/// `process_message` returned an error.
	Failure(Arc<anyhow::Error>),
	/// The actor's task panicked.
	Panicked,
}

impl ActorExitStatus {
	pub fn is_success(&self) -> bool {
		matches!(self, ActorExitStatus::Success)
	}
}

impl fmt::Display for ActorExitStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ActorExitStatus::Success => write!(f, "success"),
			ActorExitStatus::Quit => write!(f, "quit"),
			ActorExitStatus::Killed => write!(f, "killed"),
			ActorExitStatus::DownstreamClosed => write!(f, "downstream-closed"),
			ActorExitStatus::Failure(err) => write!(f, "failure: {err}"),
			ActorExitStatus::Panicked => write!(f, "panicked"),
		}
	}
}

impl From<anyhow::Error> for ActorExitStatus {
	fn from(err: anyhow::Error) -> Self {
		ActorExitStatus::Failure(Arc::new(err))
	}
}

/// An isolated, mailbox-driven processing unit.
///
/// An actor handles exactly one message type (`Self::Message`) rather than an
/// open set of handlers — every actor in this system (`WorkerActor`,
/// `ResponseActor`) only ever needs one, and the simpler shape avoids
/// type-erased envelope dispatch.
#[async_trait]
pub trait Actor: Send + 'static {
	type Message: fmt::Debug + Send + 'static;
	type ObservableState: Clone + fmt::Debug + Send + Sync + 'static;

	/// A human-readable name, used as a tracing span tag and in logs.
	/// Defaults to the type name.
	fn name(&self) -> String {
		std::any::type_name::<Self>().to_string()
	}

	fn observable_state(&self) -> Self::ObservableState;

	/// Called once before the first message is processed. An error here
	/// skips `process_message` entirely but `finalize` still runs.
	async fn initialize(&mut self, _ctx: &ActorContext<Self>) -> Result<(), ActorExitStatus>
	where
		Self: Sized,
	{
		Ok(())
	}

	/// The actor's business logic for a single message.
	async fn process_message(
		&mut self,
		message: Self::Message,
		ctx: &ActorContext<Self>,
	) -> Result<(), ActorExitStatus>
	where
		Self: Sized;

	/// Called exactly once, regardless of how the actor exited (including on
	/// a caught panic or `initialize` failure), before its handle resolves.
	async fn finalize(
		&mut self,
		_exit_status: &ActorExitStatus,
		_ctx: &ActorContext<Self>,
	) -> anyhow::Result<()>
	where
		Self: Sized,
	{
		Ok(())
	}
}
