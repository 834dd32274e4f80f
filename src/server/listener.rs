//! # Listening Socket
//!
//! Opens the TCP listener step by step so each failure (socket, bind,
//! listen) is reported separately, and applies the latency options shared
//! by the listener and every accepted connection.

use std::io;
use std::net::SocketAddr;
use std::os::unix::io::{AsRawFd, RawFd};
use tokio::net::{TcpListener, TcpSocket};
use tracing::{debug, warn};

use crate::error::{NetpadError, Result};

/// Open, configure, bind and listen on `addr`
///
/// # Errors
///
/// - `SocketOpen`: the socket could not be created or configured
/// - `Bind`: the address is unavailable
/// - `Listen`: the socket could not enter listening state
pub fn open(addr: SocketAddr, backlog: u32) -> Result<TcpListener> {
    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()
    } else {
        TcpSocket::new_v6()
    }
    .map_err(NetpadError::SocketOpen)?;

    socket.set_reuseaddr(true).map_err(NetpadError::SocketOpen)?;
    tune_latency(&socket);

    socket
        .bind(addr)
        .map_err(|source| NetpadError::Bind { addr, source })?;

    socket
        .listen(backlog)
        .map_err(|source| NetpadError::Listen { addr, source })
}

/// Disable Nagle's algorithm and delayed ACKs on a socket
///
/// Failures are logged and otherwise ignored: the connection still works,
/// only with more latency.
pub fn tune_latency<S: AsRawFd>(socket: &S) {
    let fd = socket.as_raw_fd();
    for (name, option) in [("TCP_NODELAY", libc::TCP_NODELAY), ("TCP_QUICKACK", libc::TCP_QUICKACK)] {
        if let Err(e) = enable_tcp_option(fd, option) {
            warn!("Failed to set {} on fd {}: {}", name, fd, e);
        }
    }
    debug!("Latency options applied to fd {}", fd);
}

fn enable_tcp_option(fd: RawFd, option: libc::c_int) -> io::Result<()> {
    let enable: libc::c_int = 1;
    // SAFETY: `fd` is a live socket borrowed from the caller and the option
    // value points to a c_int that outlives the call.
    let rc = unsafe {
        libc::setsockopt(
            fd,
            libc::IPPROTO_TCP,
            option,
            &enable as *const libc::c_int as *const libc::c_void,
            std::mem::size_of::<libc::c_int>() as libc::socklen_t,
        )
    };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}
