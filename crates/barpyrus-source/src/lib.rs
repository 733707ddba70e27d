//! # barpyrus-source
//!
//! External processes as line-oriented event sources.
//!
//! - [`Channel`] owns a child process and turns its stdout into complete lines
//! - [`Readiness`] waits for descriptors; [`PollReadiness`] uses `poll(2)`
//! - [`SignalPipe`] turns termination signals into a wakeup the poll sees
//! - [`EventInput`] is the seam the scheduler multiplexes
//! - [`herbstluft`], [`conky`], [`playerctl`] and [`lemonbar`] wrap the
//!   programs the stock panel talks to
//!
//! With the `testing` feature, [`testing`] provides scripted replacements for
//! all of the above.

pub mod channel;
pub mod conky;
pub mod herbstluft;
pub mod input;
pub mod lemonbar;
pub mod playerctl;
pub mod poll;
pub mod signals;
pub mod spawn;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use channel::Channel;
pub use herbstluft::{HerbstClient, HerbstInput, Rect, TagStatus, WmClient};
pub use input::{Duplex, EventInput, LineInput, LineSink, LineSource};
pub use poll::{PollReadiness, Readiness};
pub use signals::SignalPipe;
pub use spawn::{ProcessSpawner, Spawner};
