// Copyright (c) tasq contributors
// SPDX-License-Identifier: MIT

use std::{
	any::{Any, TypeId},
	collections::HashMap,
	sync::Mutex,
};

use once_cell::sync::Lazy;

use crate::mailbox::MessageBus;

/// A registered mailbox, type-erased down to the operations the registry
/// needs without knowing the concrete message type.
trait RegisteredMailbox: Send {
	fn as_any(&self) -> &dyn Any;
	fn is_disconnected(&self) -> bool;
}

impl<M: Send + 'static> RegisteredMailbox for MessageBus<M> {
	fn as_any(&self) -> &dyn Any {
		self
	}

	fn is_disconnected(&self) -> bool {
		MessageBus::is_disconnected(self)
	}
}

type Entries = HashMap<TypeId, Vec<Box<dyn RegisteredMailbox>>>;

static REGISTRY: Lazy<Mutex<Entries>> = Lazy::new(|| Mutex::new(HashMap::new()));

/// A process-wide, weak registry of every live actor's mailbox, keyed by the
/// actor's message type.
///
/// "Weak" here means the registry never keeps an actor alive: it only holds
/// clones of a mailbox's `MessageBus`, the same handle every other caller
/// already holds, and a disconnected one (its actor task has exited) is
/// pruned the next time that type is looked up rather than kept around.
/// `spawn` registers every actor it creates; nothing needs to register by
/// hand.
pub struct ActorRegistry;

impl ActorRegistry {
	pub(crate) fn register<M: Send + 'static>(bus: MessageBus<M>) {
		REGISTRY.lock().unwrap().entry(TypeId::of::<M>()).or_default().push(Box::new(bus));
	}

	/// Every live mailbox currently accepting messages of type `M`.
	pub fn get<M: Send + 'static>() -> Vec<MessageBus<M>> {
		let mut registry = REGISTRY.lock().unwrap();
		let Some(mailboxes) = registry.get_mut(&TypeId::of::<M>()) else {
			return Vec::new();
		};
		mailboxes.retain(|mailbox| !mailbox.is_disconnected());
		mailboxes.iter().filter_map(|mailbox| mailbox.as_any().downcast_ref::<MessageBus<M>>().cloned()).collect()
	}

	/// One live mailbox of type `M`, if any is registered.
	pub fn get_one<M: Send + 'static>() -> Option<MessageBus<M>> {
		Self::get::<M>().into_iter().next()
	}

	/// True if no live (connected) mailbox of any type is registered.
	pub fn is_empty() -> bool {
		let mut registry = REGISTRY.lock().unwrap();
		for mailboxes in registry.values_mut() {
			mailboxes.retain(|mailbox| !mailbox.is_disconnected());
		}
		registry.values().all(Vec::is_empty)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{actor_context::spawn, response::ResponseActor, terminate_signal::TerminateSignal, worker::WorkerActor};

	#[tokio::test]
	async fn spawned_actors_are_discoverable_by_message_type() {
		let (bus, handle) = spawn(WorkerActor::default(), TerminateSignal::default());
		let registered = ActorRegistry::get::<crate::worker::Job>();
		assert!(registered.iter().any(|found| found.instance_id() == bus.instance_id()));
		handle.quit().await;
	}

	#[tokio::test]
	async fn a_quit_actor_is_pruned_from_the_registry() {
		let (bus, handle) = spawn(ResponseActor::default(), TerminateSignal::default());
		assert!(ActorRegistry::get::<crate::response::Dispatch>().iter().any(|registered| registered.instance_id() == bus.instance_id()));
		handle.quit().await;
		tokio::time::sleep(std::time::Duration::from_millis(10)).await;
		assert!(!ActorRegistry::get::<crate::response::Dispatch>().iter().any(|registered| registered.instance_id() == bus.instance_id()));
	}
}
