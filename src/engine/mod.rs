//! Engine module: the queue and container primitives plus the CLI layer on top of them.

pub mod arg_parser;
pub mod cli;
pub mod container;
pub mod progress;
pub mod queue;

// Re-export commonly used items
pub use arg_parser::Cli;
pub use cli::{RunSettings, handle_run};
pub use container::Container;
pub use queue::{BoundedQueue, Full};
