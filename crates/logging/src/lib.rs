#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_docs)]

//! # Overview
//!
//! `logging` centralises the translation from a small integer verbosity count
//! (the familiar `-v`/`-vv`/`-vvv` CLI convention) into a [`tracing_subscriber`]
//! `EnvFilter`. It has no knowledge of the memcached client and is meant to be
//! reused by any binary or embedding crate that wants a consistent verbosity
//! story without re-deriving the filter directives by hand.
//!
//! # Design
//!
//! - [`Verbosity`] is a thin wrapper around a verbosity count with the mapping
//!   to a default filter level baked in.
//! - [`Verbosity::into_env_filter`] builds an [`tracing_subscriber::EnvFilter`]
//!   that still honours `RUST_LOG` overrides: an explicit `RUST_LOG` always
//!   wins over the verbosity count, matching the convention that environment
//!   configuration is more specific than a CLI flag default.
//! - [`install`] wires the filter into a global [`tracing_subscriber`]
//!   subscriber. It is idempotent: calling it more than once (for example once
//!   from a test harness and once from `main`) is a no-op after the first
//!   call.
//!
//! # Invariants
//!
//! - A verbosity count of `0` maps to `warn` level, matching quiet-by-default
//!   production behaviour.
//! - Each additional `-v` lowers the floor by one level, saturating at
//!   `trace`.
//! - `RUST_LOG`, when set, always takes precedence over the verbosity count.
//!
//! # Examples
//!
//! ```
//! use logging::Verbosity;
//!
//! let filter = Verbosity::new(2).into_env_filter();
//! assert!(filter.to_string().contains("debug"));
//! ```

use tracing_subscriber::EnvFilter;

/// A verbosity count, as accumulated from repeated `-v` flags.
///
/// `Verbosity::new(0)` is the quiet default; each additional level lowers the
/// effective log level floor by one step.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Verbosity(u8);

impl Verbosity {
    /// Construct a verbosity from a raw `-v` count.
    #[must_use]
    pub const fn new(count: u8) -> Self {
        Self(count)
    }

    /// The raw verbosity count this value was constructed from.
    #[must_use]
    pub const fn count(self) -> u8 {
        self.0
    }

    /// The default tracing level implied by this verbosity, ignoring any
    /// `RUST_LOG` override.
    #[must_use]
    pub const fn default_level(self) -> &'static str {
        match self.0 {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// Build an [`EnvFilter`] for this verbosity, honouring `RUST_LOG` when
    /// present.
    #[must_use]
    pub fn into_env_filter(self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.default_level()))
    }
}

/// Install a global [`tracing`] subscriber at the given verbosity.
///
/// Safe to call more than once; only the first call takes effect, matching
/// the expectation that `main` and test harnesses may both want to ensure
/// logging is initialised without coordinating with each other.
pub fn install(verbosity: Verbosity) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(verbosity.into_env_filter())
        .try_init();
}
