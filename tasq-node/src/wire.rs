// Copyright (c) tasq contributors
// SPDX-License-Identifier: MIT

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tasq_actors::JobOutcome;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio_util::codec::{FramedRead, FramedWrite, LengthDelimitedCodec};

/// A job as it arrives on the ingress socket: an opaque payload the demo job
/// interpreter decodes, tagged with a client-chosen id so the matching
/// `JobResponse` can be correlated back to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRequest {
	pub id: u64,
	pub payload: Vec<u8>,
}

/// The outcome written back out on the egress socket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResponse {
	pub id: u64,
	pub outcome: JobOutcome,
}

pub type IngressFrames = FramedRead<OwnedReadHalf, LengthDelimitedCodec>;
pub type EgressFrames = FramedWrite<OwnedWriteHalf, LengthDelimitedCodec>;

pub fn ingress_frames(read_half: OwnedReadHalf) -> IngressFrames {
	FramedRead::new(read_half, LengthDelimitedCodec::new())
}

pub fn egress_frames(write_half: OwnedWriteHalf) -> EgressFrames {
	FramedWrite::new(write_half, LengthDelimitedCodec::new())
}

/// Reads the next request off the wire. `Ok(None)` means the peer closed the
/// connection cleanly.
pub async fn read_job_request(frames: &mut IngressFrames) -> anyhow::Result<Option<JobRequest>> {
	match frames.next().await {
		Some(frame) => Ok(Some(bincode::deserialize(&frame?)?)),
		None => Ok(None),
	}
}

pub async fn write_job_response(frames: &mut EgressFrames, response: &JobResponse) -> anyhow::Result<()> {
	let bytes = bincode::serialize(response)?;
	frames.send(Bytes::from(bytes)).await?;
	Ok(())
}
