// Copyright (c) tasq contributors
// SPDX-License-Identifier: MIT

use std::time::Duration;

use tasq_actors::JobOutcome;

/// The concrete job payload format is intentionally out of scope for the
/// core: this is a tiny stand-in grammar exercising every outcome a real job
/// could produce (`echo:<text>`, `sleep:<millis>`, `fail:<message>`), used by
/// the binary and its integration tests.
pub fn make_job(payload: &[u8]) -> impl FnOnce() -> JobOutcome + Send + 'static {
	let text = String::from_utf8_lossy(payload).into_owned();
	move || {
		if let Some(body) = text.strip_prefix("echo:") {
			JobOutcome::Ok(body.as_bytes().to_vec())
		} else if let Some(millis) = text.strip_prefix("sleep:") {
			let millis: u64 = millis.parse().unwrap_or(0);
			std::thread::sleep(Duration::from_millis(millis));
			JobOutcome::Ok(b"slept".to_vec())
		} else if let Some(message) = text.strip_prefix("fail:") {
			panic!("{message}");
		} else {
			JobOutcome::Err(format!("unrecognized job payload: {text}"))
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn echo_returns_its_argument() {
		assert!(matches!(make_job(b"echo:hi")(), JobOutcome::Ok(bytes) if bytes == b"hi"));
	}

	#[test]
	fn unrecognized_payload_is_an_error() {
		assert!(matches!(make_job(b"bogus")(), JobOutcome::Err(_)));
	}

	/// Four workers each sleeping half a second must overlap rather than
	/// serialize: if a sleeping job blocked its worker's tokio thread, four of
	/// them queued onto a small thread pool would take closer to 2s than 0.5s.
	#[tokio::test]
	async fn concurrent_sleeps_run_in_parallel_across_workers() {
		use std::time::Instant;

		use tasq_actors::{Router, RoutingPolicy, TerminateSignal};

		let pool: Vec<_> = (0..4)
			.map(|_| tasq_actors::spawn(tasq_actors::WorkerActor::default(), TerminateSignal::default()))
			.collect();
		let router = Router::new(RoutingPolicy::RoundRobin, pool);

		let started = Instant::now();
		let results: Vec<_> = (0..4).map(|_| router.route(make_job(b"sleep:500"))).collect();
		for result in results {
			assert!(matches!(
				result.get(None).await,
				tasq_actors::Outcome::Ready(JobOutcome::Ok(bytes)) if bytes == b"slept"
			));
		}
		assert!(started.elapsed() < std::time::Duration::from_millis(1500));

		router.shutdown().await;
	}
}
