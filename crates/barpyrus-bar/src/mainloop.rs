//! The main loop.
//!
//! One thread multiplexes the bar, the top-level inputs and every input
//! owned by the widget tree. A rendered frame is only flushed when no input
//! is pending at that instant; otherwise the pending input is drained first
//! and the frame is rendered again.

use std::fmt;
use std::os::fd::RawFd;
use std::time::{Duration, Instant};

use barpyrus_config::TimingSettings;
use barpyrus_core::{BarError, LoopContext, Result};
use barpyrus_source::{EventInput, Readiness};
use tracing::{debug, error, info, instrument, trace, warn};

use crate::bar::Bar;
use crate::widget::Widget;

/// Shortest blocking wait.
pub const DEFAULT_MIN_WAIT: Duration = Duration::from_millis(100);
/// Longest blocking wait when no timer is due earlier.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(360);

/// Why [`Scheduler::run`] returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownReason {
    /// A hook or click handler asked for shutdown.
    Requested,
    /// A termination signal arrived.
    Signal,
    /// The bar or a critical input went away.
    InputLost { name: String },
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requested => f.write_str("shutdown requested"),
            Self::Signal => f.write_str("terminated by signal"),
            Self::InputLost { name } => write!(f, "lost input {name}"),
        }
    }
}

fn shutdown_reason(cx: &LoopContext) -> Option<ShutdownReason> {
    if cx.interrupted() {
        Some(ShutdownReason::Signal)
    } else if cx.shutdown_requested() {
        Some(ShutdownReason::Requested)
    } else {
        None
    }
}

/// Time left until `deadline`, but never less than `min_wait`.
fn clamp_wait(deadline: Instant, now: Instant, min_wait: Duration) -> Duration {
    deadline.saturating_duration_since(now).max(min_wait)
}

/// `now + max_wait`, falling back to [`DEFAULT_MAX_WAIT`] when that is
/// not representable.
fn ceiling(now: Instant, max_wait: Duration) -> Instant {
    now.checked_add(max_wait)
        .or_else(|| now.checked_add(DEFAULT_MAX_WAIT))
        .unwrap_or(now)
}

/// Apply the loss policy to the result of processing `input`.
fn settle(input: &mut dyn EventInput, result: Result<()>) -> Result<Option<ShutdownReason>> {
    let err = match result {
        Ok(()) => return Ok(None),
        Err(e) if e.is_fatal() => return Err(e),
        Err(e) => e,
    };
    let name = input.name().to_string();
    if input.is_critical() {
        error!(input = %name, error = %err, "lost critical input");
        return Ok(Some(ShutdownReason::InputLost { name }));
    }
    if err.is_end_of_stream() {
        warn!(input = %name, "input closed");
    } else {
        warn!(input = %name, error = %err, "input failed, closing it");
    }
    input.terminate();
    Ok(None)
}

/// Drives the widget tree: timers, input, redraws and clicks.
pub struct Scheduler<R: Readiness> {
    bar: Bar,
    inputs: Vec<Box<dyn EventInput>>,
    root: Box<dyn Widget>,
    readiness: R,
    min_wait: Duration,
    max_wait: Duration,
}

impl<R: Readiness> Scheduler<R> {
    pub fn new(bar: Bar, root: Box<dyn Widget>, readiness: R) -> Self {
        Self {
            bar,
            inputs: Vec::new(),
            root,
            readiness,
            min_wait: DEFAULT_MIN_WAIT,
            max_wait: DEFAULT_MAX_WAIT,
        }
    }

    /// Multiplex an input not owned by any widget, such as the window
    /// manager's event stream.
    pub fn with_input(mut self, input: impl EventInput + 'static) -> Self {
        self.inputs.push(Box::new(input));
        self
    }

    pub fn with_timing(mut self, timing: &TimingSettings) -> Self {
        self.min_wait = timing.min_wait();
        self.max_wait = timing.max_wait();
        self
    }

    pub fn bar(&self) -> &Bar {
        &self.bar
    }

    pub fn root(&self) -> &dyn Widget {
        self.root.as_ref()
    }

    /// Run until shutdown, then terminate the bar and every input.
    #[instrument(level = "info", skip_all, fields(bar = %self.bar.name()))]
    pub fn run(&mut self, cx: &mut LoopContext) -> Result<ShutdownReason> {
        info!(inputs = self.inputs.len(), "main loop started");
        let outcome = self.run_loop(cx);
        self.shutdown();
        match &outcome {
            Ok(reason) => info!(%reason, "main loop finished"),
            Err(e) => error!(error = %e, "main loop failed"),
        }
        outcome
    }

    fn run_loop(&mut self, cx: &mut LoopContext) -> Result<ShutdownReason> {
        let mut redraw = true;
        loop {
            if let Some(reason) = shutdown_reason(cx) {
                return Ok(reason);
            }
            let now = Instant::now();
            if self.root.maybe_timeout(now) {
                redraw = true;
            }

            let mut ready = Vec::new();
            if redraw {
                let mut painter = self.bar.painter();
                painter.widget(self.root.as_ref());
                let fds = self.watched_fds();
                ready = self.readiness.wait(&fds, Duration::ZERO)?;
                if ready.is_empty() {
                    if let Err(e) = painter.flush(&mut self.bar) {
                        return self.bar_lost(e);
                    }
                    redraw = false;
                } else {
                    debug!(frame = self.bar.frame(), ready = ready.len(), "input pending, discarding frame");
                }
            }

            if ready.is_empty() {
                let timeout = self.wait_timeout(now);
                trace!(?timeout, "waiting for input");
                let fds = self.watched_fds();
                ready = self.readiness.wait(&fds, timeout)?;
                if let Some(reason) = shutdown_reason(cx) {
                    return Ok(reason);
                }
            }

            if ready.is_empty() {
                continue;
            }
            if let Some(reason) = self.dispatch(&ready, cx)? {
                return Ok(reason);
            }
            redraw = true;
        }
    }

    /// How long to block: until the earliest widget timer, at most
    /// `max_wait` after `now`, at least `min_wait`.
    fn wait_timeout(&self, now: Instant) -> Duration {
        let mut deadline = ceiling(now, self.max_wait);
        if let Some(next) = self.root.next_timeout() {
            deadline = deadline.min(next);
        }
        clamp_wait(deadline, Instant::now(), self.min_wait)
    }

    fn watched_fds(&mut self) -> Vec<RawFd> {
        let mut fds = vec![self.bar.raw_fd()];
        fds.extend(self.inputs.iter().filter_map(|i| i.raw_fd()));
        self.root.event_inputs(&mut |input| fds.extend(input.raw_fd()));
        fds
    }

    /// Process every ready descriptor, in order.
    fn dispatch(&mut self, ready: &[RawFd], cx: &mut LoopContext) -> Result<Option<ShutdownReason>> {
        for &fd in ready {
            if fd == self.bar.raw_fd() {
                if let Some(reason) = self.process_bar(cx)? {
                    return Ok(Some(reason));
                }
                continue;
            }

            if let Some(input) = self.inputs.iter_mut().find(|i| i.raw_fd() == Some(fd)) {
                let result = input.process(cx);
                if let Some(reason) = settle(input.as_mut(), result)? {
                    return Ok(Some(reason));
                }
                continue;
            }

            let mut found = false;
            let mut outcome = Ok(None);
            self.root.event_inputs(&mut |input| {
                if found || input.raw_fd() != Some(fd) {
                    return;
                }
                found = true;
                let result = input.process(cx);
                outcome = settle(input, result);
            });
            if let Some(reason) = outcome? {
                return Ok(Some(reason));
            }
            if !found {
                debug!(fd, "no input for ready descriptor");
            }
        }
        Ok(None)
    }

    fn process_bar(&mut self, cx: &mut LoopContext) -> Result<Option<ShutdownReason>> {
        let lines = match self.bar.pull_lines() {
            Ok(lines) => lines,
            Err(e) => return self.bar_lost(e).map(Some),
        };
        for line in lines {
            let token = line.trim();
            if !token.is_empty() {
                self.bar.route_click(token, self.root.as_mut(), cx);
            }
        }
        Ok(None)
    }

    fn bar_lost(&self, err: BarError) -> Result<ShutdownReason> {
        if err.is_fatal() {
            return Err(err);
        }
        let name = self.bar.name().to_string();
        if err.is_end_of_stream() {
            error!(bar = %name, "bar exited");
        } else {
            error!(bar = %name, error = %err, "bar failed");
        }
        Ok(ShutdownReason::InputLost { name })
    }

    fn shutdown(&mut self) {
        debug!("terminating bar and inputs");
        self.bar.terminate();
        for input in &mut self.inputs {
            input.terminate();
        }
        self.root.event_inputs(&mut |input| input.terminate());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_wait() {
        let now = Instant::now();
        let min = Duration::from_millis(100);
        assert_eq!(clamp_wait(now + Duration::from_secs(5), now, min), Duration::from_secs(5));
        assert_eq!(clamp_wait(now, now, min), min);
        assert_eq!(clamp_wait(now, now + Duration::from_secs(1), min), min);
    }

    #[test]
    fn test_ceiling_never_overflows() {
        let now = Instant::now();
        assert_eq!(ceiling(now, Duration::from_secs(5)), now + Duration::from_secs(5));
        assert_eq!(ceiling(now, Duration::MAX), now + DEFAULT_MAX_WAIT);
        assert_eq!(ceiling(now, Duration::from_secs(u64::MAX)), now + DEFAULT_MAX_WAIT);
    }

    #[test]
    fn test_shutdown_reason_prefers_signal() {
        let mut cx = LoopContext::new();
        assert_eq!(shutdown_reason(&cx), None);
        cx.request_shutdown();
        assert_eq!(shutdown_reason(&cx), Some(ShutdownReason::Requested));
        cx.signal_flag().store(true, std::sync::atomic::Ordering::Relaxed);
        assert_eq!(shutdown_reason(&cx), Some(ShutdownReason::Signal));
    }

    #[test]
    fn test_reason_display() {
        let lost = ShutdownReason::InputLost {
            name: "lemonbar".into(),
        };
        assert_eq!(lost.to_string(), "lost input lemonbar");
    }
}
