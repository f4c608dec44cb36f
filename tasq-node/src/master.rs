// Copyright (c) tasq contributors
// SPDX-License-Identifier: MIT

use std::{net::SocketAddr, sync::Arc};

use async_trait::async_trait;
use tasq_actors::{
	spawn, ActorHandle, Dispatch, EgressSink, JobOutcome, MessageBus, ResponseActor, Router, RoutingPolicy,
	TerminateSignal, WorkerActor,
};
use tokio::{
	net::TcpListener,
	sync::Mutex,
};
use tracing::{error, info, warn};

use crate::wire::{egress_frames, ingress_frames, read_job_request, write_job_response, EgressFrames, JobResponse};

/// A TCP connection results are currently being written to. Shared behind a
/// `Mutex` because an egress connection is replaced, not multiplexed: at
/// most one is active at a time, and writes to it are already serialized by
/// the single `ResponseActor` that owns every `Dispatch`.
struct EgressConnection {
	frames: Mutex<EgressFrames>,
}

impl EgressConnection {
	async fn write_response(&self, response: JobResponse) -> anyhow::Result<()> {
		let mut frames = self.frames.lock().await;
		write_job_response(&mut frames, &response).await
	}
}

/// Tags a `JobOutcome` with the request id it answers before handing it to
/// the shared egress connection, so `ResponseActor` stays agnostic of wire
/// framing and correlation.
struct TaggedEgressSink {
	id: u64,
	conn: Arc<EgressConnection>,
}

#[async_trait]
impl EgressSink for TaggedEgressSink {
	async fn send(&self, outcome: JobOutcome) -> anyhow::Result<()> {
		self.conn.write_response(JobResponse { id: self.id, outcome }).await
	}
}

/// Binds an ingress and an egress TCP socket and bridges them through a pool
/// of worker actors: every accepted ingress connection reads `JobRequest`
/// frames and routes each one to a worker; a single active egress connection
/// receives the resulting `JobResponse` frames, one at a time, in the order
/// `ResponseActor` drains its mailbox.
pub struct Master {
	host: String,
	ingress_port: u16,
	egress_port: u16,
	router: Router,
	response_messagebus: MessageBus<Dispatch>,
	response_handle: ActorHandle<ResponseActor>,
}

impl Master {
	pub fn new(host: impl Into<String>, ingress_port: u16, egress_port: u16, workers: usize, routing: RoutingPolicy) -> Self {
		let worker_pool: Vec<_> =
			(0..workers).map(|_| spawn(WorkerActor::default(), TerminateSignal::default())).collect();
		let router = Router::new(routing, worker_pool);
		let (response_messagebus, response_handle) = spawn(ResponseActor::default(), TerminateSignal::default());
		Master { host: host.into(), ingress_port, egress_port, router, response_messagebus, response_handle }
	}

	/// Binds both sockets, reporting the actual addresses bound (letting
	/// callers request an ephemeral port with `0`).
	pub async fn bind(self) -> anyhow::Result<BoundMaster> {
		let ingress_listener = TcpListener::bind((self.host.as_str(), self.ingress_port)).await?;
		let egress_listener = TcpListener::bind((self.host.as_str(), self.egress_port)).await?;
		let ingress_addr = ingress_listener.local_addr()?;
		let egress_addr = egress_listener.local_addr()?;
		info!(
			%ingress_addr,
			%egress_addr,
			workers = self.router.pool_size(),
			"master bound"
		);
		Ok(BoundMaster {
			ingress_listener,
			egress_listener,
			ingress_addr,
			egress_addr,
			router: self.router,
			response_messagebus: self.response_messagebus,
			response_handle: self.response_handle,
		})
	}
}

/// A `Master` whose sockets are already bound, ready to serve.
pub struct BoundMaster {
	ingress_listener: TcpListener,
	egress_listener: TcpListener,
	ingress_addr: SocketAddr,
	egress_addr: SocketAddr,
	router: Router,
	response_messagebus: MessageBus<Dispatch>,
	response_handle: ActorHandle<ResponseActor>,
}

impl BoundMaster {
	pub fn ingress_addr(&self) -> SocketAddr {
		self.ingress_addr
	}

	pub fn egress_addr(&self) -> SocketAddr {
		self.egress_addr
	}

	/// Serves until a `ctrl_c` signal is received.
	pub async fn serve_forever(self) -> anyhow::Result<()> {
		self.serve_until(async {
			let _ = tokio::signal::ctrl_c().await;
		})
		.await
	}

	/// Serves until `shutdown` resolves, then closes each socket exactly
	/// once and drains every in-flight job before returning.
	pub async fn serve_until(self, shutdown: impl std::future::Future<Output = ()> + Send + 'static) -> anyhow::Result<()> {
		let BoundMaster { ingress_listener, egress_listener, router, response_messagebus, response_handle, .. } = self;

		let egress_sink: Arc<Mutex<Option<Arc<EgressConnection>>>> = Arc::new(Mutex::new(None));

		let accept_egress = {
			let egress_sink = egress_sink.clone();
			tokio::spawn(async move {
				loop {
					match egress_listener.accept().await {
						Ok((stream, addr)) => {
							info!(%addr, "egress connection accepted");
							let (_read_half, write_half) = stream.into_split();
							let conn = Arc::new(EgressConnection { frames: Mutex::new(egress_frames(write_half)) });
							*egress_sink.lock().await = Some(conn);
						},
						Err(err) => {
							error!(error = %err, "egress accept failed");
							break;
						},
					}
				}
				egress_listener
			})
		};

		let router = Arc::new(router);
		let accept_ingress = {
			let router = router.clone();
			let response_messagebus = response_messagebus.clone();
			let egress_sink = egress_sink.clone();
			tokio::spawn(async move {
				loop {
					match ingress_listener.accept().await {
						Ok((stream, addr)) => {
							info!(%addr, "ingress connection accepted");
							tokio::spawn(handle_ingress_connection(
								stream,
								router.clone(),
								response_messagebus.clone(),
								egress_sink.clone(),
							));
						},
						Err(err) => {
							error!(error = %err, "ingress accept failed");
							break;
						},
					}
				}
				ingress_listener
			})
		};

		shutdown.await;
		info!("shutdown signal received, draining");

		accept_ingress.abort();
		accept_egress.abort();
		// Abort only stops the accept loop; the listeners themselves are
		// dropped here, closing each socket exactly once.
		drop(accept_ingress);
		drop(accept_egress);

		while response_messagebus.mailbox_size() > 0 {
			tokio::time::sleep(std::time::Duration::from_millis(5)).await;
		}
		response_handle.quit().await;
		match Arc::try_unwrap(router) {
			Ok(router) => router.shutdown().await,
			Err(_) => warn!("a connection task outlived shutdown; worker pool left running"),
		}
		Ok(())
	}
}

async fn handle_ingress_connection(
	stream: tokio::net::TcpStream,
	router: Arc<Router>,
	response_messagebus: MessageBus<Dispatch>,
	egress_sink: Arc<Mutex<Option<Arc<EgressConnection>>>>,
) {
	let (read_half, _write_half) = stream.into_split();
	let mut frames = ingress_frames(read_half);
	loop {
		let request = match read_job_request(&mut frames).await {
			Ok(Some(request)) => request,
			Ok(None) => break,
			Err(err) => {
				warn!(error = %err, "malformed job request, dropping frame");
				continue;
			},
		};
		let Some(conn) = egress_sink.lock().await.clone() else {
			warn!(id = request.id, "job arrived before an egress connection was established, dropping");
			continue;
		};
		let result = router.route(crate::demo_job::make_job(&request.payload));
		let sink: Arc<dyn EgressSink> = Arc::new(TaggedEgressSink { id: request.id, conn });
		if response_messagebus.send(Dispatch::pending(sink, result)).is_err() {
			error!("response actor is gone, dropping job outcome");
			break;
		}
	}
}

#[cfg(test)]
mod tests {
	use bytes::Bytes;
	use futures::{SinkExt, StreamExt};
	use tokio::net::TcpStream;

	use super::*;
	use crate::wire::{egress_frames, ingress_frames, JobRequest, JobResponse};

	/// A bare client speaking the same length-delimited + bincode framing the
	/// server does, writing `JobRequest`s on the ingress socket and reading
	/// `JobResponse`s off the egress socket.
	async fn submit_job(ingress_addr: SocketAddr, egress_addr: SocketAddr, request: JobRequest) -> JobResponse {
		let egress_stream = TcpStream::connect(egress_addr).await.unwrap();
		let mut responses = ingress_frames(egress_stream.into_split().0);
		// Establishing the egress connection races the server's accept loop.
		tokio::time::sleep(std::time::Duration::from_millis(20)).await;

		let ingress_stream = TcpStream::connect(ingress_addr).await.unwrap();
		let mut requests = egress_frames(ingress_stream.into_split().1);
		requests.send(Bytes::from(bincode::serialize(&request).unwrap())).await.unwrap();

		let frame = responses.next().await.unwrap().unwrap();
		bincode::deserialize(&frame).unwrap()
	}

	#[tokio::test]
	async fn echo_job_round_trips_over_the_wire() {
		let bound = Master::new("127.0.0.1", 0, 0, 2, RoutingPolicy::RoundRobin).bind().await.unwrap();
		let (ingress_addr, egress_addr) = (bound.ingress_addr(), bound.egress_addr());

		let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
		let serve = tokio::spawn(bound.serve_until(async {
			let _ = shutdown_rx.await;
		}));

		let request = JobRequest { id: 1, payload: b"echo:hello".to_vec() };
		let response = submit_job(ingress_addr, egress_addr, request).await;
		assert_eq!(response.id, 1);
		assert!(matches!(response.outcome, tasq_actors::JobOutcome::Ok(bytes) if bytes == b"hello"));

		let _ = shutdown_tx.send(());
		serve.await.unwrap().unwrap();
	}

	#[tokio::test]
	async fn a_failing_job_does_not_break_the_pool() {
		let bound = Master::new("127.0.0.1", 0, 0, 2, RoutingPolicy::RoundRobin).bind().await.unwrap();
		let (ingress_addr, egress_addr) = (bound.ingress_addr(), bound.egress_addr());

		let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
		let serve = tokio::spawn(bound.serve_until(async {
			let _ = shutdown_rx.await;
		}));

		let failing = submit_job(ingress_addr, egress_addr, JobRequest { id: 1, payload: b"fail:boom".to_vec() }).await;
		assert!(matches!(failing.outcome, tasq_actors::JobOutcome::Err(_)));

		let _ = shutdown_tx.send(());
		serve.await.unwrap().unwrap();
	}

	/// A master's worker pool is discoverable through the process-wide
	/// registry without `Master` exposing any of its internals for it —
	/// useful for out-of-band introspection (e.g. a debug endpoint) that
	/// doesn't have a reference to the `Master` itself.
	#[tokio::test]
	async fn worker_pool_is_visible_through_the_actor_registry() {
		let bound = Master::new("127.0.0.1", 0, 0, 3, RoutingPolicy::RoundRobin).bind().await.unwrap();
		assert!(tasq_actors::ActorRegistry::get::<tasq_actors::Job>().len() >= 3);

		let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
		let serve = tokio::spawn(bound.serve_until(async {
			let _ = shutdown_rx.await;
		}));
		let _ = shutdown_tx.send(());
		serve.await.unwrap().unwrap();
	}
}
