// Copyright (c) tasq contributors
// SPDX-License-Identifier: MIT

use std::{fmt, panic::AssertUnwindSafe, sync::Arc};

use async_trait::async_trait;

use crate::{actor::Actor, actor_context::ActorContext, job_result::JobResult};

/// What a job produced: either its opaque return payload, or an error
/// descriptor if it panicked or returned an error.
///
/// The concrete payload format is opaque to everything except the
/// user-supplied closure that produced it, so this is simply a byte vector —
/// an arbitrary serialized value the caller knows how to interpret.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum JobOutcome {
	Ok(Vec<u8>),
	Err(String),
}

/// A unit of work routed to exactly one `WorkerActor`.
///
/// `payload` stands in for the out-of-scope "concrete job payload format":
/// any boxed closure that produces a `JobOutcome`. `result` is the one-shot
/// cell the router handed out to the caller when it routed this job; the
/// worker's only obligation is to fill it in exactly once.
pub struct Job {
	payload: Box<dyn FnOnce() -> JobOutcome + Send>,
	result: Arc<JobResult<JobOutcome>>,
}

impl Job {
	pub fn new(
		payload: impl FnOnce() -> JobOutcome + Send + 'static,
		result: Arc<JobResult<JobOutcome>>,
	) -> Self {
		Job { payload: Box::new(payload), result }
	}
}

impl fmt::Debug for Job {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Job").finish_non_exhaustive()
	}
}

/// A statistics snapshot published after every job, letting a supervisor or
/// the smallest-mailbox router observe how busy a worker has been.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct WorkerStats {
	pub jobs_succeeded: u64,
	pub jobs_failed: u64,
}

/// Dequeues a `Job`, executes its payload, and publishes the `JobOutcome`
/// into the `JobResult` the router is holding on the caller's behalf.
///
/// A job panicking is caught here and turned into `JobOutcome::Err`: a
/// failing job must not take down the worker, so it keeps serving its
/// mailbox afterwards.
#[derive(Default)]
pub struct WorkerActor {
	stats: WorkerStats,
}

#[async_trait]
impl Actor for WorkerActor {
	type Message = Job;
	type ObservableState = WorkerStats;

	fn name(&self) -> String {
		"worker".to_string()
	}

	fn observable_state(&self) -> WorkerStats {
		self.stats
	}

	async fn process_message(
		&mut self,
		job: Job,
		_ctx: &ActorContext<Self>,
	) -> Result<(), crate::ActorExitStatus> {
		let Job { payload, result } = job;
		// Payloads are arbitrary synchronous closures that may block (a sleep, a
		// CPU-bound computation); running them on a blocking thread keeps this
		// actor's tokio worker thread free for every other actor sharing it.
		let outcome = match tokio::task::spawn_blocking(move || std::panic::catch_unwind(AssertUnwindSafe(payload))).await
		{
			Ok(Ok(outcome)) => outcome,
			Ok(Err(panic)) => JobOutcome::Err(describe_panic(panic)),
			Err(join_err) => JobOutcome::Err(format!("job task was cancelled: {join_err}")),
		};
		match &outcome {
			JobOutcome::Ok(_) => self.stats.jobs_succeeded += 1,
			JobOutcome::Err(_) => self.stats.jobs_failed += 1,
		}
		result.set(outcome);
		Ok(())
	}
}

fn describe_panic(panic: Box<dyn std::any::Any + Send>) -> String {
	if let Some(message) = panic.downcast_ref::<&str>() {
		message.to_string()
	} else if let Some(message) = panic.downcast_ref::<String>() {
		message.clone()
	} else {
		"job panicked with a non-string payload".to_string()
	}
}
