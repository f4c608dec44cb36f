// Copyright (c) tasq contributors
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::{
	actor::{Actor, ActorExitStatus},
	actor_state::{ActorState, AtomicState},
	command::Command,
	mailbox::{create_mailbox, Envelope, MessageBus},
	registry::ActorRegistry,
	terminate_signal::TerminateSignal,
};

/// Everything an actor needs that does not belong to its own business state:
/// its mailbox handle, its atomic lifecycle state, and the kill switch it
/// shares with its siblings under the same `Master`.
pub struct ActorContext<A: Actor> {
	self_bus: MessageBus<A::Message>,
	state: Arc<AtomicState>,
	terminate_sig: TerminateSignal,
	observable_state_tx: watch::Sender<A::ObservableState>,
}

impl<A: Actor> Clone for ActorContext<A> {
	fn clone(&self) -> Self {
		ActorContext {
			self_bus: self.self_bus.clone(),
			state: self.state.clone(),
			terminate_sig: self.terminate_sig.clone(),
			observable_state_tx: self.observable_state_tx.clone(),
		}
	}
}

impl<A: Actor> ActorContext<A> {
	pub fn actor_instance_id(&self) -> &str {
		self.self_bus.instance_id()
	}

	pub fn messagebus(&self) -> &MessageBus<A::Message> {
		&self.self_bus
	}

	pub fn terminate_sig(&self) -> &TerminateSignal {
		&self.terminate_sig
	}

	pub(crate) fn state(&self) -> ActorState {
		self.state.get()
	}

	pub(crate) fn pause(&self) {
		self.state.pause();
	}

	pub(crate) fn resume(&self) {
		self.state.resume();
	}

	/// Publishes a fresh snapshot of the actor's observable state.
	pub fn observe(&self, actor: &A) {
		let _ = self.observable_state_tx.send(actor.observable_state());
	}

	pub(crate) fn exit(&self, exit_status: &ActorExitStatus) {
		self.state.exit(exit_status.is_success());
		if should_kill_on_exit(exit_status) {
			error!(actor = %self.actor_instance_id(), exit_status = %exit_status, "actor exiting abnormally, activating terminate signal");
			self.terminate_sig.kill();
		}
	}
}

fn should_kill_on_exit(exit_status: &ActorExitStatus) -> bool {
	matches!(
		exit_status,
		ActorExitStatus::DownstreamClosed | ActorExitStatus::Failure(_) | ActorExitStatus::Panicked
	)
}

/// A handle to a spawned actor: lets callers observe, message, and await it
/// without owning it.
pub struct ActorHandle<A: Actor> {
	messagebus: MessageBus<A::Message>,
	state: Arc<AtomicState>,
	terminate_sig: TerminateSignal,
	observable_state_rx: watch::Receiver<A::ObservableState>,
	join_handle: tokio::task::JoinHandle<ActorExitStatus>,
}

impl<A: Actor> ActorHandle<A> {
	pub fn messagebus(&self) -> &MessageBus<A::Message> {
		&self.messagebus
	}

	pub fn is_running(&self) -> bool {
		self.state.get().is_running()
	}

	pub fn state(&self) -> ActorState {
		self.state.get()
	}

	/// The last state the actor published through `ActorContext::observe`.
	pub fn last_observation(&self) -> A::ObservableState {
		self.observable_state_rx.borrow().clone()
	}

	/// Sends the exit sentinel and waits for the actor to drain and terminate.
	pub async fn quit(self) -> ActorExitStatus {
		let _ = self.messagebus.send_command(Command::Quit);
		self.join().await
	}

	/// Activates the terminate signal and waits for the actor to notice and exit.
	///
	/// In-flight message processing is never preempted: this only takes effect
	/// the next time the actor's loop checks the signal, i.e. between messages.
	pub async fn kill(self) -> ActorExitStatus {
		self.terminate_sig.kill();
		self.join().await
	}

	pub async fn join(self) -> ActorExitStatus {
		match self.join_handle.await {
			Ok(exit_status) => exit_status,
			Err(join_err) if join_err.is_panic() => ActorExitStatus::Panicked,
			Err(_) => ActorExitStatus::Killed,
		}
	}
}

/// Spawns `actor` on its own `tokio` task, wiring it with a fresh mailbox and
/// a child of `terminate_sig`.
///
/// A dedicated task, not a dedicated OS thread, is the idiomatic fit here:
/// isolation comes from the actor exclusively owning its mailbox and state,
/// not from the underlying scheduling primitive.
pub fn spawn<A: Actor>(mut actor: A, terminate_sig: TerminateSignal) -> (MessageBus<A::Message>, ActorHandle<A>) {
	let instance_id = format!("{}-{}", actor.name(), uuid_like());
	let (self_bus, inbox) = create_mailbox(instance_id);
	ActorRegistry::register(self_bus.clone());
	let state = Arc::new(AtomicState::default());
	let (observable_state_tx, observable_state_rx) = watch::channel(actor.observable_state());
	let ctx = ActorContext {
		self_bus: self_bus.clone(),
		state: state.clone(),
		terminate_sig: terminate_sig.clone(),
		observable_state_tx,
	};
	let messagebus = self_bus.clone();
	let join_handle = tokio::spawn(async move { run_actor_loop(&mut actor, inbox, &ctx).await });
	(
		messagebus.clone(),
		ActorHandle { messagebus, state, terminate_sig, observable_state_rx, join_handle },
	)
}

async fn run_actor_loop<A: Actor>(
	actor: &mut A,
	inbox: crate::mailbox::Inbox<A::Message>,
	ctx: &ActorContext<A>,
) -> ActorExitStatus {
	debug!(actor = %ctx.actor_instance_id(), "actor starting");
	let init_result = actor.initialize(ctx).await;
	let exit_status = match init_result {
		Err(exit_status) => exit_status,
		Ok(()) => process_messages(actor, &inbox, ctx).await,
	};
	let exit_status = match actor.finalize(&exit_status, ctx).await {
		Ok(()) => exit_status,
		Err(err) => {
			error!(actor = %ctx.actor_instance_id(), error = ?err, "finalize failed");
			ActorExitStatus::Panicked
		},
	};
	ctx.exit(&exit_status);
	ctx.observe(actor);
	info!(actor = %ctx.actor_instance_id(), exit_status = %exit_status, "actor exited");
	exit_status
}

async fn process_messages<A: Actor>(
	actor: &mut A,
	inbox: &crate::mailbox::Inbox<A::Message>,
	ctx: &ActorContext<A>,
) -> ActorExitStatus {
	loop {
		if ctx.terminate_sig().is_dead() {
			return ActorExitStatus::Killed;
		}
		let envelope = if ctx.state().is_running() {
			inbox.recv().await
		} else {
			inbox.recv_cmd_only().await
		};
		if let Err(exit_status) = handle_envelope(actor, envelope, ctx).await {
			return exit_status;
		}
		// Drain whatever else is immediately available before yielding, so a
		// burst of messages is processed without round-tripping the scheduler.
		if ctx.state().is_running() {
			ctx.state.process();
			while let Some(envelope) = inbox.try_recv() {
				if ctx.terminate_sig().is_dead() {
					return ActorExitStatus::Killed;
				}
				if let Err(exit_status) = handle_envelope(actor, envelope, ctx).await {
					return exit_status;
				}
			}
			ctx.state.idle();
		}
	}
}

async fn handle_envelope<A: Actor>(
	actor: &mut A,
	envelope: Envelope<A::Message>,
	ctx: &ActorContext<A>,
) -> Result<(), ActorExitStatus> {
	match envelope {
		Envelope::Closed => Err(ActorExitStatus::Success),
		Envelope::Cmd(Command::Quit) => Err(ActorExitStatus::Quit),
		Envelope::Cmd(Command::ExitWithSuccess) => Err(ActorExitStatus::Success),
		Envelope::Cmd(Command::Pause) => {
			ctx.pause();
			Ok(())
		},
		Envelope::Cmd(Command::Resume) => {
			ctx.resume();
			Ok(())
		},
		Envelope::Cmd(Command::Nudge) => Ok(()),
		Envelope::Msg(message) => {
			actor.process_message(message, ctx).await?;
			ctx.observe(actor);
			Ok(())
		},
	}
}

fn uuid_like() -> String {
	use std::sync::atomic::{AtomicU64, Ordering};
	static COUNTER: AtomicU64 = AtomicU64::new(0);
	format!("{:x}", COUNTER.fetch_add(1, Ordering::Relaxed))
}
