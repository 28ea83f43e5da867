//! Application configuration constants.
//! Defaults and limits in one place.

use std::sync::OnceLock;
use std::time::Duration;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    pkg_name: &'static str,
    config_filename: String,
    config_env_var: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                pkg_name: pkg,
                config_filename: format!(".{pkg}.toml"),
                config_env_var: format!("{}_CONFIG", pkg.to_uppercase()),
            }
        })
    }

    pub fn pkg_name(&self) -> &str {
        self.pkg_name
    }

    /// Config file looked up in the working directory (e.g. `.handoff.toml`).
    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }

    /// Env var that overrides the config file location (e.g. `HANDOFF_CONFIG`).
    pub fn config_env_var(&self) -> &str {
        &self.config_env_var
    }
}

// ---- Queue / worker defaults ----

/// Defaults for [`PipelineOpts`](crate::PipelineOpts).
pub struct QueueDefaults;

impl QueueDefaults {
    pub const CAPACITY: usize = 5;
    pub const PRODUCERS: usize = 1;
    pub const CONSUMERS: usize = 1;
    pub const PRODUCTION_DELAY: Duration = Duration::from_millis(50);
    pub const CONSUMPTION_DELAY: Duration = Duration::from_millis(80);
    /// Producer gives up (and restores its item) after the queue stays full this long.
    pub const PUT_TIMEOUT: Duration = Duration::from_secs(1);
    /// Consumer treats this much idle time on the queue as end of input.
    pub const GET_TIMEOUT: Duration = Duration::from_secs(1);
}

// ---- Demo ----

/// CLI demo settings.
pub struct DemoDefaults;

impl DemoDefaults {
    /// Number of generated `payload-<i>` items.
    pub const ITEMS: usize = 10;
    /// Demo runs with a tighter queue than the library default.
    pub const CAPACITY: usize = 3;
}

// ---- Worker threads ----

/// Per-role worker caps for the CLI. Library callers are never clamped.
/// Use [`WorkerLimits::current()`] to fill `all_threads` from rayon.
#[derive(Clone, Copy, Debug)]
pub struct WorkerLimits {
    /// Available threads (from rayon); set by [`WorkerLimits::current()`].
    pub all_threads: usize,
    /// Workers mostly sleep or wait on the queue, so allow this many per available thread.
    pub per_thread: usize,
}

impl Default for WorkerLimits {
    fn default() -> Self {
        Self {
            all_threads: 1,
            per_thread: Self::WORKERS_PER_THREAD,
        }
    }
}

impl WorkerLimits {
    pub const WORKERS_PER_THREAD: usize = 8;

    pub fn current() -> Self {
        Self {
            all_threads: rayon::current_num_threads(),
            ..Self::default()
        }
    }

    /// Max producers (or consumers) per run.
    pub fn max_per_role(&self) -> usize {
        (self.all_threads * self.per_thread).max(1)
    }

    /// Lower `requested` to `max_per_role()`. Zero is left alone so construction rejects it.
    pub fn clamp(&self, requested: usize) -> usize {
        requested.min(self.max_per_role())
    }
}
