pub mod config;
pub mod handoff_toml;
pub mod logger;

pub use config::*;
pub use handoff_toml::{apply_file_to_settings, config_path, load_handoff_toml};
pub use logger::setup_logging;
