// Readiness polling over raw socket descriptors.
//
// Both the relay and the client are single-threaded: one `poll_readable`
// call per loop iteration is their only suspension point. The relay polls
// its listener plus every occupied session socket; the client polls its one
// connection with a caller-supplied timeout. Keeping the primitive here, in
// the shared protocol crate, means both ends agree on what "ready" means.
//
// Built directly on `libc::poll` over `AsRawFd` descriptors, so the sockets
// themselves stay in blocking mode — once the poll reports a socket ready,
// the framing layer reads a whole frame with ordinary blocking reads.

use std::io;
use std::os::fd::AsRawFd;
use std::time::Duration;

/// Wait up to `timeout` for any of `sources` to become readable.
///
/// Returns one flag per source, in input order. A closed or errored socket
/// reports ready, so the following read observes the EOF or error instead of
/// blocking. `None` waits indefinitely; `Some(Duration::ZERO)` is a pure
/// non-blocking check. Interrupted polls are retried.
pub fn poll_readable(
    sources: &[&dyn AsRawFd],
    timeout: Option<Duration>,
) -> io::Result<Vec<bool>> {
    let mut fds: Vec<libc::pollfd> = sources
        .iter()
        .map(|source| libc::pollfd {
            fd: source.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        })
        .collect();

    let timeout_ms: libc::c_int = match timeout {
        None => -1,
        // Sub-millisecond remainders round down; a zero timeout polls once.
        Some(d) => libc::c_int::try_from(d.as_millis()).unwrap_or(libc::c_int::MAX),
    };

    loop {
        let rc = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, timeout_ms) };
        if rc >= 0 {
            break;
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }

    Ok(fds
        .iter()
        .map(|fd| fd.revents & (libc::POLLIN | libc::POLLHUP | libc::POLLERR) != 0)
        .collect())
}
