// Copyright (c) tasq contributors
// SPDX-License-Identifier: MIT

use std::sync::{
	atomic::{AtomicUsize, Ordering},
	Arc,
};

use rand::Rng;

use crate::{
	actor_context::ActorHandle,
	job_result::JobResult,
	mailbox::MessageBus,
	worker::{Job, JobOutcome, WorkerActor},
};

/// How a job is assigned to one worker out of the pool.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum RoutingPolicy {
	RoundRobin,
	Random,
	/// Picks the worker with the fewest queued messages. The snapshot taken
	/// across the pool is inherently racy (a worker's mailbox can grow the
	/// instant after it's sampled) but is good enough to steer load away from
	/// a backed-up worker, which is all this policy promises.
	SmallestMailbox,
}

/// A fixed-size pool of `WorkerActor`s with a policy for picking one per job.
pub struct Router {
	policy: RoutingPolicy,
	workers: Vec<(MessageBus<Job>, ActorHandle<WorkerActor>)>,
	round_robin_cursor: AtomicUsize,
}

impl Router {
	pub fn new(policy: RoutingPolicy, workers: Vec<(MessageBus<Job>, ActorHandle<WorkerActor>)>) -> Self {
		assert!(!workers.is_empty(), "a router needs at least one worker");
		Router { policy, workers, round_robin_cursor: AtomicUsize::new(0) }
	}

	/// Enqueues `payload` on whichever worker the policy selects and returns
	/// the handle its eventual `JobOutcome` will be published to.
	///
	/// If the chosen worker has already exited, the job is never silently
	/// dropped: the result is resolved with a failure outcome immediately.
	pub fn route(&self, payload: impl FnOnce() -> JobOutcome + Send + 'static) -> Arc<JobResult<JobOutcome>> {
		let result = Arc::new(JobResult::new());
		let job = Job::new(payload, result.clone());
		let index = self.pick_worker();
		let (messagebus, _handle) = &self.workers[index];
		if let Err(err) = messagebus.send(job) {
			tracing::error!(worker = index, error = %err, "routed job to a dead worker");
			result.set(JobOutcome::Err(err.to_string()));
		}
		result
	}

	pub fn pool_size(&self) -> usize {
		self.workers.len()
	}

	fn pick_worker(&self) -> usize {
		match self.policy {
			RoutingPolicy::RoundRobin => self.round_robin_cursor.fetch_add(1, Ordering::Relaxed) % self.workers.len(),
			RoutingPolicy::Random => rand::thread_rng().gen_range(0..self.workers.len()),
			RoutingPolicy::SmallestMailbox => self
				.workers
				.iter()
				.enumerate()
				.map(|(index, (bus, _))| (index, bus.mailbox_size()))
				.min_by_key(|(_, size)| *size)
				.map(|(index, _)| index)
				.expect("workers is non-empty, checked at construction"),
		}
	}

	/// Waits for every worker's mailbox to empty, then quits them all.
	///
	/// Draining before quitting matters because `Command::Quit` travels on a
	/// priority lane ahead of already-queued jobs: sending it while jobs are
	/// still queued would cut them off instead of letting them finish.
	pub async fn shutdown(self) {
		for (bus, _) in &self.workers {
			while bus.mailbox_size() > 0 {
				tokio::time::sleep(std::time::Duration::from_millis(5)).await;
			}
		}
		for (_, handle) in self.workers {
			handle.quit().await;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::terminate_signal::TerminateSignal;

	fn spawn_pool(n: usize) -> Vec<(MessageBus<Job>, ActorHandle<WorkerActor>)> {
		(0..n)
			.map(|_| crate::actor_context::spawn(WorkerActor::default(), TerminateSignal::default()))
			.collect()
	}

	#[tokio::test]
	async fn round_robin_visits_every_worker_in_turn() {
		let router = Router::new(RoutingPolicy::RoundRobin, spawn_pool(3));
		let picks: Vec<_> = (0..6).map(|_| router.pick_worker()).collect();
		assert_eq!(picks, vec![0, 1, 2, 0, 1, 2]);
		router.shutdown().await;
	}

	#[tokio::test]
	async fn smallest_mailbox_avoids_a_prefilled_worker() {
		let workers = spawn_pool(2);
		// Pause worker 0 so jobs pile up in its mailbox without being drained.
		workers[0].1.messagebus().send_command(crate::command::Command::Pause).unwrap();
		tokio::time::sleep(std::time::Duration::from_millis(10)).await;
		for _ in 0..5 {
			workers[0].0.send(Job::new(|| JobOutcome::Ok(vec![]), Arc::new(JobResult::new()))).unwrap();
		}
		tokio::time::sleep(std::time::Duration::from_millis(10)).await;

		let worker_zero_bus = workers[0].0.clone();
		let router = Router::new(RoutingPolicy::SmallestMailbox, workers);
		assert_eq!(router.pick_worker(), 1);
		worker_zero_bus.send_command(crate::command::Command::Resume).unwrap();
		router.shutdown().await;
	}

	#[tokio::test]
	async fn a_job_routed_to_a_dead_worker_resolves_with_a_failure() {
		let workers = spawn_pool(1);
		workers[0].1.messagebus().send_command(crate::command::Command::Quit).unwrap();
		tokio::time::sleep(std::time::Duration::from_millis(20)).await;
		let router = Router::new(RoutingPolicy::RoundRobin, workers);
		let result = router.route(|| JobOutcome::Ok(vec![]));
		assert!(matches!(result.get(None).await, crate::job_result::Outcome::Ready(JobOutcome::Err(_))));
	}
}
