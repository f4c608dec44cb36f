// Copyright (c) tasq contributors
// SPDX-License-Identifier: MIT

use clap::Parser;
use tasq_node::{cli::Cli, logging::setup_logging_and_tracing, Master};
use tracing::error;

/// Runs one `Master` per configured bind triple, each on its own `tokio`
/// task within this single process, rather than one OS process per master.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	setup_logging_and_tracing(cli.debug);

	let mut bind_triples = vec![(cli.host.clone(), cli.ingress_port, cli.egress_port)];
	bind_triples.extend(cli.extra_masters.iter().map(|t| (t.host.clone(), t.ingress_port, t.egress_port)));

	let routing = cli.routing.into();
	let workers = cli.workers;

	let handles: Vec<_> = bind_triples
		.into_iter()
		.map(|(host, ingress_port, egress_port)| {
			tokio::spawn(async move {
				let master = Master::new(host, ingress_port, egress_port, workers, routing);
				let result = match master.bind().await {
					Ok(bound) => bound.serve_forever().await,
					Err(err) => Err(err),
				};
				if let Err(err) = result {
					error!(error = %err, "master exited with an error");
				}
			})
		})
		.collect();

	for handle in handles {
		let _ = handle.await;
	}
	Ok(())
}
