// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! wg-engine: staging, process supervision, and the job orchestrator

pub mod config;
pub mod job_logger;
pub mod log_paths;
pub mod orchestrator;
pub mod runner;
pub mod stager;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::{ConfigError, GenerationConfig, OrchestratorConfig, CONFIG_FILE};
pub use job_logger::JobLogger;
pub use orchestrator::{Orchestrator, OrchestratorError};
pub use runner::{GeneratorCommand, JobHandle, LogSink, ProcessRunner, RunnerError, RunnerLimits};
pub use stager::{FsStager, Promotion, StageError, Stager};
