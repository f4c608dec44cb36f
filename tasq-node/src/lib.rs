// Copyright (c) tasq contributors
// SPDX-License-Identifier: MIT

pub mod cli;
pub mod demo_job;
pub mod logging;
pub mod master;
pub mod wire;

pub use master::Master;
