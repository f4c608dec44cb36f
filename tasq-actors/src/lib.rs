// Copyright (c) tasq contributors
// SPDX-License-Identifier: MIT

//! A simplified actor framework: isolated mailbox-driven tasks, lifecycle
//! management, a one-shot result cell, and a worker pool behind a router.

mod actor;
mod actor_context;
mod actor_state;
mod command;
mod errors;
mod job_result;
mod mailbox;
mod registry;
mod response;
mod router;
mod terminate_signal;
mod worker;

pub use actor::{Actor, ActorExitStatus};
pub use actor_context::{spawn, ActorContext, ActorHandle};
pub use actor_state::ActorState;
pub use command::Command;
pub use errors::SendError;
pub use job_result::{JobResult, Outcome};
pub use mailbox::MessageBus;
pub use registry::ActorRegistry;
pub use response::{Dispatch, EgressSink, Payload, ResponseActor, ResponseStats};
pub use router::{Router, RoutingPolicy};
pub use terminate_signal::TerminateSignal;
pub use worker::{Job, JobOutcome, WorkerActor, WorkerStats};
