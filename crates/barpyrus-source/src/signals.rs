//! Termination signals as a pollable input.
//!
//! A handler that only sets a flag can fire between the scheduler's last
//! flag check and the start of a blocking wait, leaving the signal
//! unnoticed until the wait times out. [`SignalPipe`] also writes a byte
//! to a socket the scheduler polls, so the wait returns at once.

use std::io::{ErrorKind, Read};
use std::os::fd::{AsRawFd, RawFd};
use std::os::unix::net::UnixStream;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use barpyrus_core::{BarError, LoopContext, Result};
use signal_hook::SigId;
use tracing::{debug, trace};

use crate::input::EventInput;

/// Sets the shutdown flag and wakes the scheduler on each registered
/// signal.
#[derive(Debug)]
pub struct SignalPipe {
    read: Option<UnixStream>,
    wakeups: Vec<SigId>,
}

impl SignalPipe {
    /// Route `signals` to `flag` and to a fresh wakeup socket.
    pub fn register(signals: &[libc::c_int], flag: &Arc<AtomicBool>) -> Result<Self> {
        let (read, write) =
            UnixStream::pair().map_err(|e| BarError::io("creating signal pipe", "socketpair", e))?;
        read.set_nonblocking(true)
            .map_err(|e| BarError::io("configuring signal pipe", "socketpair", e))?;
        write
            .set_nonblocking(true)
            .map_err(|e| BarError::io("configuring signal pipe", "socketpair", e))?;

        let mut wakeups = Vec::with_capacity(signals.len());
        for &signal in signals {
            // flag first: it is set by the time the wakeup is seen
            signal_hook::flag::register(signal, Arc::clone(flag))
                .map_err(|e| BarError::signal(signal, e))?;
            let write = write
                .try_clone()
                .map_err(|e| BarError::io("cloning signal pipe", "socketpair", e))?;
            let id = signal_hook::low_level::pipe::register(signal, write)
                .map_err(|e| BarError::signal(signal, e))?;
            wakeups.push(id);
        }
        debug!(?signals, "signal handlers installed");
        Ok(Self {
            read: Some(read),
            wakeups,
        })
    }

    /// Discard pending wakeup bytes. Returns how many were read.
    fn drain(&mut self) -> Result<usize> {
        let Some(read) = self.read.as_mut() else {
            return Ok(0);
        };
        let mut buf = [0u8; 32];
        let mut total = 0;
        loop {
            match read.read(&mut buf) {
                Ok(0) => return Err(BarError::end_of_stream("signals")),
                Ok(n) => total += n,
                Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(total),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(BarError::channel_read("signals", e)),
            }
        }
    }
}

impl EventInput for SignalPipe {
    fn name(&self) -> &str {
        "signals"
    }

    fn raw_fd(&self) -> Option<RawFd> {
        self.read.as_ref().map(AsRawFd::as_raw_fd)
    }

    /// The flag already carries the shutdown request; this only consumes
    /// the wakeup.
    fn process(&mut self, _cx: &mut LoopContext) -> Result<()> {
        let woken = self.drain()?;
        trace!(woken, "signal wakeup");
        Ok(())
    }

    /// Stop writing wakeups and close the socket. The flag handlers stay
    /// installed until exit.
    fn terminate(&mut self) {
        for id in self.wakeups.drain(..) {
            signal_hook::low_level::unregister(id);
        }
        self.read = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poll::{PollReadiness, Readiness};
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    #[test]
    fn test_signal_wakes_poll_and_sets_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        let mut pipe = SignalPipe::register(&[libc::SIGUSR2], &flag).unwrap();
        let fd = pipe.raw_fd().unwrap();
        assert!(PollReadiness.wait(&[fd], Duration::ZERO).unwrap().is_empty());

        signal_hook::low_level::raise(libc::SIGUSR2).unwrap();
        assert!(flag.load(Ordering::Relaxed));
        let ready = PollReadiness.wait(&[fd], Duration::from_secs(5)).unwrap();
        assert_eq!(ready, vec![fd]);

        let mut cx = LoopContext::with_signal_flag(Arc::clone(&flag));
        pipe.process(&mut cx).unwrap();
        assert!(cx.interrupted());
        assert!(PollReadiness.wait(&[fd], Duration::ZERO).unwrap().is_empty());
        pipe.terminate();
    }

    #[test]
    fn test_terminate_closes_pipe() {
        let flag = Arc::new(AtomicBool::new(false));
        let mut pipe = SignalPipe::register(&[libc::SIGUSR1], &flag).unwrap();
        assert!(!pipe.is_critical());
        pipe.terminate();
        assert_eq!(pipe.raw_fd(), None);
        pipe.terminate();
        assert!(pipe.process(&mut LoopContext::new()).is_ok());

        // the flag still works once the wakeup is gone
        signal_hook::low_level::raise(libc::SIGUSR1).unwrap();
        assert!(flag.load(Ordering::Relaxed));
    }
}
