// Copyright (c) tasq contributors
// SPDX-License-Identifier: MIT

use clap::Parser;
use tasq_actors::RoutingPolicy;

/// Command-line configuration for a `tasqd` process.
///
/// Every flag can also be set through its `env` variable, letting the same
/// binary be configured uniformly whether it's launched by hand or by an
/// orchestrator that prefers environment variables.
#[derive(Debug, Clone, Parser)]
#[command(name = "tasqd", about = "Fans jobs out over TCP to a pool of worker actors")]
pub struct Cli {
	/// Address the ingress and egress sockets bind to.
	#[arg(long, env = "TASQ_HOST", default_value = "127.0.0.1")]
	pub host: String,

	/// Port jobs are submitted on.
	#[arg(long, env = "TASQ_INGRESS_PORT", default_value_t = 5555)]
	pub ingress_port: u16,

	/// Port job outcomes are written back on.
	#[arg(long, env = "TASQ_EGRESS_PORT", default_value_t = 5556)]
	pub egress_port: u16,

	/// Number of worker actors in the pool.
	#[arg(long, env = "TASQ_WORKERS", default_value_t = 5)]
	pub workers: usize,

	/// Policy used to assign an incoming job to a worker.
	#[arg(long, value_enum, env = "TASQ_ROUTING", default_value_t = RoutingArg::RoundRobin)]
	pub routing: RoutingArg,

	/// Extra `host:ingress_port:egress_port` triples, each run as its own
	/// master task within this same process.
	#[arg(long = "extra-master", value_parser = parse_bind_triple)]
	pub extra_masters: Vec<BindTriple>,

	/// Raises the default log level to `debug` when `RUST_LOG` is unset.
	#[arg(long, env = "TASQ_DEBUG", action = clap::ArgAction::SetTrue)]
	pub debug: bool,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, clap::ValueEnum)]
pub enum RoutingArg {
	RoundRobin,
	Random,
	SmallestMailbox,
}

impl From<RoutingArg> for RoutingPolicy {
	fn from(arg: RoutingArg) -> Self {
		match arg {
			RoutingArg::RoundRobin => RoutingPolicy::RoundRobin,
			RoutingArg::Random => RoutingPolicy::Random,
			RoutingArg::SmallestMailbox => RoutingPolicy::SmallestMailbox,
		}
	}
}

#[derive(Debug, Clone)]
pub struct BindTriple {
	pub host: String,
	pub ingress_port: u16,
	pub egress_port: u16,
}

fn parse_bind_triple(raw: &str) -> Result<BindTriple, String> {
	let mut parts = raw.splitn(3, ':');
	let (Some(host), Some(ingress_port), Some(egress_port)) = (parts.next(), parts.next(), parts.next()) else {
		return Err(format!("expected host:ingress_port:egress_port, got `{raw}`"));
	};
	Ok(BindTriple {
		host: host.to_string(),
		ingress_port: ingress_port.parse().map_err(|_| format!("invalid ingress port in `{raw}`"))?,
		egress_port: egress_port.parse().map_err(|_| format!("invalid egress port in `{raw}`"))?,
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_a_bind_triple() {
		let triple = parse_bind_triple("0.0.0.0:6000:6001").unwrap();
		assert_eq!(triple.host, "0.0.0.0");
		assert_eq!(triple.ingress_port, 6000);
		assert_eq!(triple.egress_port, 6001);
	}

	#[test]
	fn rejects_a_malformed_triple() {
		assert!(parse_bind_triple("just-a-host").is_err());
	}
}
