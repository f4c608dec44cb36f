// Copyright (c) tasq contributors
// SPDX-License-Identifier: MIT

use std::fmt;

use crate::command::Command;

/// What an actor's task loop pulled out of its mailbox.
pub(crate) enum Envelope<M> {
	Cmd(Command),
	Msg(M),
	/// Every `MessageBus` for this actor has been dropped. There is no way
	/// any more messages could ever arrive; the loop should wind down as if
	/// it had received the `ExitWithSuccess` sentinel.
	Closed,
}

/// A lightweight, cloneable handle used to send messages into an actor's mailbox.
///
/// The actor holds the matching [`Inbox`]. Commands are queued on a dedicated
/// high-priority lane so that e.g. a `Quit` enqueued behind a thousand regular
/// messages is still observed promptly the next time the actor checks for one.
pub struct MessageBus<A> {
	cmd_tx: flume::Sender<Command>,
	msg_tx: flume::Sender<A>,
	instance_id: String,
}

impl<A> Clone for MessageBus<A> {
	fn clone(&self) -> Self {
		MessageBus {
			cmd_tx: self.cmd_tx.clone(),
			msg_tx: self.msg_tx.clone(),
			instance_id: self.instance_id.clone(),
		}
	}
}

impl<A> fmt::Debug for MessageBus<A> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("MessageBus").field(&self.instance_id).finish()
	}
}

impl<A> MessageBus<A> {
	pub fn instance_id(&self) -> &str {
		&self.instance_id
	}

	/// A weakly consistent snapshot of how many messages (commands included)
	/// are currently queued. Racy by design: see `SmallestMailbox` routing.
	pub fn mailbox_size(&self) -> usize {
		self.cmd_tx.len() + self.msg_tx.len()
	}

	pub fn is_disconnected(&self) -> bool {
		self.msg_tx.is_disconnected()
	}

	/// Enqueues a regular message. Never blocks: the mailbox is unbounded,
	/// so there is no backpressure to apply here.
	pub fn send(&self, msg: A) -> Result<(), crate::SendError> {
		self.msg_tx.send(msg).map_err(|_| crate::SendError::Disconnected)
	}

	pub(crate) fn send_command(&self, cmd: Command) -> Result<(), crate::SendError> {
		self.cmd_tx.send(cmd).map_err(|_| crate::SendError::Disconnected)
	}
}

pub(crate) struct Inbox<A> {
	cmd_rx: flume::Receiver<Command>,
	msg_rx: flume::Receiver<A>,
}

impl<A> Inbox<A> {
	/// Blocks until a message is available, always preferring the command lane.
	pub(crate) async fn recv(&self) -> Envelope<A> {
		if let Ok(cmd) = self.cmd_rx.try_recv() {
			return Envelope::Cmd(cmd);
		}
		tokio::select! {
			biased;
			cmd = self.cmd_rx.recv_async() => match cmd {
				Ok(cmd) => Envelope::Cmd(cmd),
				Err(_) => Envelope::Closed,
			},
			msg = self.msg_rx.recv_async() => match msg {
				Ok(msg) => Envelope::Msg(msg),
				Err(_) => Envelope::Closed,
			},
		}
	}

	/// Used while `Paused`: only commands (including scheduled wake-ups) are observed.
	pub(crate) async fn recv_cmd_only(&self) -> Envelope<A> {
		match self.cmd_rx.recv_async().await {
			Ok(cmd) => Envelope::Cmd(cmd),
			Err(_) => Envelope::Closed,
		}
	}

	pub(crate) fn try_recv(&self) -> Option<Envelope<A>> {
		if let Ok(cmd) = self.cmd_rx.try_recv() {
			return Some(Envelope::Cmd(cmd));
		}
		self.msg_rx.try_recv().ok().map(Envelope::Msg)
	}
}

pub(crate) fn create_mailbox<A>(instance_id: String) -> (MessageBus<A>, Inbox<A>) {
	let (cmd_tx, cmd_rx) = flume::unbounded();
	let (msg_tx, msg_rx) = flume::unbounded();
	(MessageBus { cmd_tx, msg_tx, instance_id }, Inbox { cmd_rx, msg_rx })
}
