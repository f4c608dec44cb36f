// Copyright (c) tasq contributors
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Failure modes of enqueuing a message. The core never exercises bounded
/// mailboxes (backpressure is explicitly out of scope), so the only possible
/// cause is the receiving actor having already exited.
#[derive(Error, Debug, Clone, Copy, Eq, PartialEq)]
pub enum SendError {
	#[error("message could not be delivered: actor has exited")]
	Disconnected,
}
