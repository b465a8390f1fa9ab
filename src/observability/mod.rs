//! Observability for a rewrite run.
//!
//! - **Phases**: every run moves through the [`RunPhase`] sequence; errors
//!   and crash reports name the phase they happened in.
//! - **Context tracking**: thread-local phase and file, restored by RAII
//!   guards, so a panic inside a rayon worker still reports its file.
//! - **Logging**: `log` records rendered by `env_logger`; phases also open
//!   `tracing` spans.
//!
//! ## Usage
//!
//! ```ignore
//! use noop_lifecycle::observability::{init_logging, install_panic_hook};
//!
//! fn main() {
//!     init_logging(0);
//!     install_panic_hook();
//! }
//! ```

pub mod context;
pub mod panic_hook;

pub use context::{
    get_current_context, set_current_file, set_phase, ContextGuard, RunContext, RunPhase,
};
pub use panic_hook::install_panic_hook;

/// Initialise the global logger.
///
/// `RUST_LOG` takes precedence; otherwise `verbosity` picks the level
/// (0 = info, 1 = debug, 2+ = trace). Repeated calls are ignored.
pub fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_level),
    )
    .format_timestamp(None)
    .try_init();
}
