// Copyright (c) tasq contributors
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
	actor::{Actor, ActorExitStatus},
	actor_context::ActorContext,
	job_result::JobResult,
	worker::JobOutcome,
};

/// Where a finished job's outcome actually goes out. `tasq-node` implements
/// this over a length-delimited TCP write half; tests use an in-memory one.
#[async_trait]
pub trait EgressSink: Send + Sync + 'static {
	async fn send(&self, outcome: JobOutcome) -> anyhow::Result<()>;
}

/// Either a result still being computed, or one already in hand.
///
/// `Pending` is the default path: the `ResponseActor` itself awaits the job,
/// which means responses leave in the order they were dispatched (the
/// mailbox is strictly FIFO) even if a later job finishes first — a slow job
/// head-of-lines the ones queued behind it. `Ready` is the escape hatch for a
/// caller that has already awaited completion out of band (e.g. via a
/// `select!` over several `JobResult`s) and wants responses flushed in
/// completion order instead.
pub enum Payload {
	Pending(Arc<JobResult<JobOutcome>>),
	Ready(JobOutcome),
}

/// A single response to deliver to a single sink.
pub struct Dispatch {
	sink: Arc<dyn EgressSink>,
	payload: Payload,
}

impl Dispatch {
	pub fn pending(sink: Arc<dyn EgressSink>, result: Arc<JobResult<JobOutcome>>) -> Self {
		Dispatch { sink, payload: Payload::Pending(result) }
	}

	pub fn ready(sink: Arc<dyn EgressSink>, outcome: JobOutcome) -> Self {
		Dispatch { sink, payload: Payload::Ready(outcome) }
	}
}

impl std::fmt::Debug for Dispatch {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let kind = match &self.payload {
			Payload::Pending(_) => "pending",
			Payload::Ready(_) => "ready",
		};
		f.debug_struct("Dispatch").field("payload", &kind).finish()
	}
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct ResponseStats {
	pub sent: u64,
	pub failed: u64,
}

/// Drains dispatches one at a time and writes each outcome to its sink.
///
/// Processing a `Dispatch` one at a time, in mailbox order, is what gives the
/// default `Payload::Pending` path its ordering guarantee: there is no
/// concurrency to reorder here.
#[derive(Default)]
pub struct ResponseActor {
	stats: ResponseStats,
}

#[async_trait]
impl Actor for ResponseActor {
	type Message = Dispatch;
	type ObservableState = ResponseStats;

	fn name(&self) -> String {
		"response".to_string()
	}

	fn observable_state(&self) -> ResponseStats {
		self.stats
	}

	async fn process_message(&mut self, dispatch: Dispatch, _ctx: &ActorContext<Self>) -> Result<(), ActorExitStatus> {
		let outcome = match dispatch.payload {
			Payload::Ready(outcome) => outcome,
			Payload::Pending(result) => match result.get(None).await {
				crate::job_result::Outcome::Ready(outcome) => outcome,
				crate::job_result::Outcome::TimedOut => unreachable!("get(None) never times out"),
			},
		};
		match dispatch.sink.send(outcome).await {
			Ok(()) => self.stats.sent += 1,
			Err(err) => {
				self.stats.failed += 1;
				tracing::warn!(error = %err, "failed to deliver job outcome to sink");
			},
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Mutex;

	use super::*;
	use crate::terminate_signal::TerminateSignal;

	struct RecordingSink(Mutex<Vec<JobOutcome>>);

	#[async_trait]
	impl EgressSink for RecordingSink {
		async fn send(&self, outcome: JobOutcome) -> anyhow::Result<()> {
			self.0.lock().unwrap().push(outcome);
			Ok(())
		}
	}

	fn outcome_bytes(outcome: &JobOutcome) -> &[u8] {
		match outcome {
			JobOutcome::Ok(bytes) => bytes,
			JobOutcome::Err(_) => panic!("expected Ok"),
		}
	}

	#[tokio::test]
	async fn pending_dispatches_are_delivered_in_mailbox_order() {
		let sink = Arc::new(RecordingSink(Mutex::new(Vec::new())));
		let (messagebus, handle) =
			crate::actor_context::spawn(ResponseActor::default(), TerminateSignal::default());

		let first = Arc::new(JobResult::new());
		let second = Arc::new(JobResult::new());
		messagebus.send(Dispatch::pending(sink.clone(), first.clone())).unwrap();
		messagebus.send(Dispatch::pending(sink.clone(), second.clone())).unwrap();

		// second finishes first; the response should still go out in dispatch order.
		second.set(JobOutcome::Ok(b"second".to_vec()));
		tokio::time::sleep(std::time::Duration::from_millis(10)).await;
		first.set(JobOutcome::Ok(b"first".to_vec()));
		tokio::time::sleep(std::time::Duration::from_millis(10)).await;

		{
			let delivered = sink.0.lock().unwrap();
			assert_eq!(outcome_bytes(&delivered[0]), b"first");
			assert_eq!(outcome_bytes(&delivered[1]), b"second");
		}
		handle.quit().await;
	}

	#[tokio::test]
	async fn ready_dispatches_skip_waiting() {
		let sink = Arc::new(RecordingSink(Mutex::new(Vec::new())));
		let (messagebus, handle) =
			crate::actor_context::spawn(ResponseActor::default(), TerminateSignal::default());
		messagebus.send(Dispatch::ready(sink.clone(), JobOutcome::Ok(b"instant".to_vec()))).unwrap();
		tokio::time::sleep(std::time::Duration::from_millis(10)).await;
		assert_eq!(outcome_bytes(&sink.0.lock().unwrap()[0]), b"instant");
		handle.quit().await;
	}
}
