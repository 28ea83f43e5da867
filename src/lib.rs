//! Handoff: bounded blocking FIFO queue and a producer/consumer worker pool built on it.
//!
//! Items flow source [`Container`] → producers → [`BoundedQueue`] → consumers → destination
//! [`Container`]. [`Orchestrator`] wires one such pipeline and runs it once.
//!
//! ```no_run
//! use handoff::{PipelineOpts, WorkItem};
//!
//! let items: Vec<_> = (0..10).map(|i| WorkItem::new(i, format!("payload-{i}"))).collect();
//! let out = handoff::run_pipeline(items, &PipelineOpts::without_delays())?;
//! assert_eq!(out.len(), 10);
//! # Ok::<(), handoff::Error>(())
//! ```

pub mod engine;
pub mod pipeline;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

pub use engine::{BoundedQueue, Container, Full};
pub use pipeline::{Orchestrator, PipelineEvent, PipelineState, RunControl, run_pipeline};

/// Result alias used by public handoff API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;
