//! # barpyrus-core
//!
//! Core types, errors, and utilities shared by the barpyrus crates.
//!
//! This crate provides:
//! - [`BarError`] - Error taxonomy for channels, configuration and the window manager
//! - [`logging`] - Tracing setup and log location helpers
//! - [`context`] - The per-loop context carrying the shutdown flag
//! - [`types`] - Mouse buttons and widget identities
//!
//! ## Example
//!
//! ```no_run
//! use barpyrus_core::{BarError, LoopContext, logging};
//!
//! fn main() -> barpyrus_core::Result<()> {
//!     let _guard = logging::init_logging(None, false)?;
//!
//!     let mut cx = LoopContext::new();
//!     cx.request_shutdown();
//!     assert!(cx.shutdown_requested());
//!
//!     Err(BarError::internal("nothing to do"))
//! }
//! ```

pub mod context;
pub mod error;
pub mod logging;
pub mod types;

// Re-export main types for convenience
pub use context::LoopContext;
pub use error::{BarError, Result};
pub use logging::{LogGuard, init_logging};
pub use types::{MouseButton, WidgetId};
