//! Readiness multiplexing over raw descriptors.

use std::os::fd::RawFd;
use std::time::Duration;

use barpyrus_core::{BarError, Result};
use tracing::trace;

/// Waits until some of the given descriptors become readable.
pub trait Readiness {
    /// Return the subset of `fds` that is readable, waiting at most
    /// `timeout`. A zero timeout only checks.
    ///
    /// An empty result means the timeout elapsed or the wait was interrupted
    /// by a signal.
    fn wait(&mut self, fds: &[RawFd], timeout: Duration) -> Result<Vec<RawFd>>;
}

/// [`Readiness`] backed by `poll(2)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PollReadiness;

impl Readiness for PollReadiness {
    fn wait(&mut self, fds: &[RawFd], timeout: Duration) -> Result<Vec<RawFd>> {
        let mut pollfds: Vec<libc::pollfd> = fds
            .iter()
            .map(|&fd| libc::pollfd {
                fd,
                events: libc::POLLIN,
                revents: 0,
            })
            .collect();

        // Round up so sub-millisecond waits do not degrade into busy polling
        let millis = timeout.as_micros().div_ceil(1000).min(i32::MAX as u128) as libc::c_int;

        // SAFETY: pollfds is a live, exclusively borrowed buffer of len entries
        let rc = unsafe { libc::poll(pollfds.as_mut_ptr(), pollfds.len() as libc::nfds_t, millis) };
        if rc < 0 {
            let err = std::io::Error::last_os_error();
            if err.kind() == std::io::ErrorKind::Interrupted {
                trace!("poll interrupted by signal");
                return Ok(Vec::new());
            }
            return Err(BarError::Poll { source: err });
        }

        // HUP and ERR count as readable: the following read reports the
        // condition to the owner of the descriptor.
        let mask = libc::POLLIN | libc::POLLHUP | libc::POLLERR | libc::POLLNVAL;
        Ok(pollfds
            .iter()
            .filter(|p| p.revents & mask != 0)
            .map(|p| p.fd)
            .collect())
    }
}
