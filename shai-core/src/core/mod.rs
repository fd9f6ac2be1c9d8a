//! # Request orchestration
//!
//! [`pipeline::CommandPipeline`] drives one request through generation,
//! risk classification, confirmation and execution. [`pipeline::CommandRunner`]
//! covers the last three steps on their own, for commands that do not come
//! from the model (the config editor command).

pub mod pipeline;

pub use pipeline::{CommandPipeline, CommandRunner, RequestOutcome};
