//! The seams between channels and the scheduler.
//!
//! [`LineSource`] and [`LineSink`] describe a raw line pipe; [`EventInput`]
//! is what the scheduler multiplexes: something with a readable descriptor
//! that knows how to consume its own lines.

use std::os::fd::RawFd;

use barpyrus_core::{LoopContext, Result};
use tracing::debug;

/// A readable stream of complete lines.
pub trait LineSource {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Descriptor that becomes readable when [`LineSource::pull_lines`] will
    /// not block.
    fn raw_fd(&self) -> RawFd;

    /// Perform one read and return the complete lines it finished.
    ///
    /// Fails with [`barpyrus_core::BarError::EndOfStream`] once the peer has
    /// closed its output.
    fn pull_lines(&mut self) -> Result<Vec<String>>;

    /// Kill and reap the underlying process. Calling it twice is a no-op.
    fn terminate(&mut self);
}

/// A writable stream of lines.
pub trait LineSink {
    /// Write one line (a trailing newline is appended) and flush it.
    fn write_line(&mut self, line: &str) -> Result<()>;
}

/// A channel that is both read and written, like the bar process.
pub trait Duplex: LineSource + LineSink {}

impl<T: LineSource + LineSink> Duplex for T {}

/// An input multiplexed by the scheduler.
pub trait EventInput {
    fn name(&self) -> &str;

    /// Descriptor to wait on, or `None` once the input has been closed.
    fn raw_fd(&self) -> Option<RawFd>;

    /// Pull the available lines and dispatch each of them.
    fn process(&mut self, cx: &mut LoopContext) -> Result<()>;

    /// Losing a critical input ends the main loop.
    fn is_critical(&self) -> bool {
        false
    }

    /// Terminate the underlying process and stop reporting a descriptor.
    fn terminate(&mut self);
}

/// Callback invoked for every line of a [`LineInput`].
pub type LineHandler = Box<dyn FnMut(&str, &mut LoopContext)>;

/// A line source paired with the handler that interprets its lines.
pub struct LineInput {
    source: Box<dyn LineSource>,
    handler: LineHandler,
    critical: bool,
    open: bool,
}

impl LineInput {
    pub fn new(
        source: impl LineSource + 'static,
        handler: impl FnMut(&str, &mut LoopContext) + 'static,
    ) -> Self {
        Self {
            source: Box::new(source),
            handler: Box::new(handler),
            critical: false,
            open: true,
        }
    }

    /// Mark this input as load-bearing for the panel.
    pub fn critical(mut self) -> Self {
        self.critical = true;
        self
    }
}

impl EventInput for LineInput {
    fn name(&self) -> &str {
        self.source.name()
    }

    fn raw_fd(&self) -> Option<RawFd> {
        self.open.then(|| self.source.raw_fd())
    }

    fn process(&mut self, cx: &mut LoopContext) -> Result<()> {
        if !self.open {
            return Ok(());
        }
        for line in self.source.pull_lines()? {
            debug!(channel = %self.source.name(), %line, "dispatching line");
            (self.handler)(line.as_str(), cx);
        }
        Ok(())
    }

    fn is_critical(&self) -> bool {
        self.critical
    }

    fn terminate(&mut self) {
        if self.open {
            self.source.terminate();
            self.open = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Item, Script};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_line_input_dispatches_in_order() {
        let script = Script::new();
        let source = script.source("conky");
        let fd = source.fd();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut input = LineInput::new(source, move |line, _cx| sink.borrow_mut().push(line.to_string()));

        script.step(vec![(fd, Item::line("a")), (fd, Item::line("b"))]);
        script.deliver_all();

        let mut cx = LoopContext::new();
        input.process(&mut cx).unwrap();
        assert_eq!(*seen.borrow(), vec!["a", "b"]);
        assert_eq!(input.raw_fd(), Some(fd));
        assert!(!input.is_critical());
    }

    #[test]
    fn test_line_input_terminate_closes_once() {
        let script = Script::new();
        let mut input = LineInput::new(script.source("playerctl"), |_, _| {}).critical();
        assert!(input.is_critical());

        input.terminate();
        input.terminate();
        assert_eq!(input.raw_fd(), None);
        assert_eq!(script.terminated(), vec!["playerctl"]);

        let mut cx = LoopContext::new();
        assert!(input.process(&mut cx).is_ok());
    }
}
