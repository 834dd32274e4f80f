//! # Server Module
//!
//! The single-threaded event loop that owns every socket and device.
//!
//! ## Loop
//!
//! Each iteration waits, without timeout, until the listener or any session
//! connection is readable:
//!
//! 1. A pending connection takes priority: exactly one is accepted and the
//!    iteration ends. It becomes a session if a slot is free, otherwise it
//!    is closed straight away.
//! 2. Otherwise every readable session is read in slot order. Received bytes
//!    are decoded and submitted to that session's device. A closed or failed
//!    connection removes its session and ends the iteration, since removal
//!    shifts slot indices.
//!
//! A shutdown request is checked before readiness on every iteration so
//! teardown always happens on the thread that owns the resources.

pub mod listener;
pub mod registry;
pub mod session;

use std::future::{poll_fn, Future};
use std::io;
use std::net::SocketAddr;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::device::DeviceBackend;
use crate::error::{NetpadError, Result};
use crate::protocol::TranslationTable;

pub use registry::{SessionRegistry, SESSION_CAPACITY};
pub use session::Session;

/// Pause before accepting again after running out of descriptors or memory
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// What woke the loop up
enum Readiness {
    /// The listener produced a connection (or an accept error)
    Incoming(io::Result<(TcpStream, SocketAddr)>),
    /// Slots of sessions whose connections are readable, ascending
    Sessions(Vec<usize>),
}

/// Outcome of servicing one session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionStatus {
    Open,
    Closed,
}

/// Multi-client gamepad server
pub struct Server<B: DeviceBackend> {
    listener: TcpListener,
    local_addr: SocketAddr,
    backend: B,
    table: TranslationTable,
    registry: SessionRegistry<Session<B::Sink>>,
    read_buffer: Vec<u8>,
}

impl<B: DeviceBackend> std::fmt::Debug for Server<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("local_addr", &self.local_addr)
            .field("sessions", &self.registry.len())
            .finish_non_exhaustive()
    }
}

impl<B: DeviceBackend> Server<B> {
    /// Check the device facility, then open the listener
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// - `Device`: the injection facility is unavailable
    /// - `SocketOpen`, `Bind`, `Listen`: the listener could not be set up
    pub fn bind(config: &Config, backend: B, table: TranslationTable) -> Result<Self> {
        backend.probe()?;

        let addr = config.listen_addr()?;
        let listener = listener::open(addr, config.server.listen_backlog)?;
        let local_addr = listener.local_addr()?;

        info!("Server listening on {}", local_addr);

        Ok(Self {
            listener,
            local_addr,
            backend,
            table,
            registry: SessionRegistry::new(),
            read_buffer: vec![0; config.server.read_buffer_size],
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Number of live sessions
    pub fn session_count(&self) -> usize {
        self.registry.len()
    }

    /// Serve clients until `shutdown` completes or a fatal error occurs
    ///
    /// Returns `Ok(())` on a requested shutdown. Sessions are left in place
    /// either way; call [`Server::shutdown`] to tear them down.
    ///
    /// # Errors
    ///
    /// - `Device`: a device could not be created for a new connection. This
    ///   is treated as an environment fault and stops the whole server
    ///   rather than only refusing that client.
    /// - `Wait`: the listener failed with a non-transient error
    pub async fn run<F: Future>(&mut self, shutdown: F) -> Result<()> {
        tokio::pin!(shutdown);

        loop {
            let readiness = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown requested with {} active sessions", self.registry.len());
                    return Ok(());
                }
                readiness = poll_fn(|cx| self.poll_readiness(cx)) => readiness,
            };

            match readiness {
                Readiness::Incoming(Ok((stream, peer))) => self.admit(stream, peer)?,
                Readiness::Incoming(Err(e)) => match classify_accept_error(&e) {
                    AcceptFailure::Connection => {
                        warn!("Failed to accept a connection: {}", e);
                    }
                    AcceptFailure::Resources => {
                        // The connection stays queued, so retrying at once would spin
                        warn!("Cannot accept connections right now: {}", e);
                        tokio::select! {
                            biased;
                            _ = &mut shutdown => {
                                info!("Shutdown requested with {} active sessions", self.registry.len());
                                return Ok(());
                            }
                            _ = sleep(ACCEPT_BACKOFF) => {}
                        }
                    }
                    AcceptFailure::Listener => {
                        error!("Listener failed: {}", e);
                        return Err(NetpadError::Wait(e));
                    }
                },
                Readiness::Sessions(ready) => self.service(&ready),
            }
        }
    }

    /// Destroy every device, close every connection and the listener
    pub fn shutdown(mut self) {
        self.close_all();
        info!("Server on {} stopped", self.local_addr);
    }

    fn close_all(&mut self) {
        let count = self.registry.len();
        for session in self.registry.drain() {
            session.close();
        }
        if count > 0 {
            info!("Closed {} sessions", count);
        }
    }

    fn poll_readiness(&self, cx: &mut Context<'_>) -> Poll<Readiness> {
        if let Poll::Ready(accepted) = self.listener.poll_accept(cx) {
            return Poll::Ready(Readiness::Incoming(accepted));
        }

        // Errors count as ready; the read that follows reports them
        let ready: Vec<usize> = self
            .registry
            .iter()
            .enumerate()
            .filter(|(_, session)| session.poll_read_ready(cx).is_ready())
            .map(|(index, _)| index)
            .collect();

        if ready.is_empty() {
            Poll::Pending
        } else {
            Poll::Ready(Readiness::Sessions(ready))
        }
    }

    fn admit(&mut self, stream: TcpStream, peer: SocketAddr) -> Result<()> {
        if self.registry.is_full() {
            debug!("Rejecting {}: all {} slots in use", peer, SESSION_CAPACITY);
            return Ok(());
        }

        info!("New connection from {}", peer);

        let session = Session::open(stream, peer, &mut self.backend).map_err(|e| {
            error!("Failed to create a virtual gamepad for {}: {}", peer, e);
            NetpadError::Device(e)
        })?;

        if let Err(session) = self.registry.try_add(session) {
            session.close();
        }
        Ok(())
    }

    fn service(&mut self, ready: &[usize]) {
        for &index in ready {
            if self.read_session(index) == SessionStatus::Closed {
                if let Some(session) = self.registry.remove(index) {
                    session.close();
                }
                break;
            }
        }
    }

    fn read_session(&mut self, index: usize) -> SessionStatus {
        let Some(session) = self.registry.get_mut(index) else {
            return SessionStatus::Open;
        };

        match session.try_read(&mut self.read_buffer) {
            Ok(0) => {
                info!("Client {} left", session.peer());
                SessionStatus::Closed
            }
            Ok(len) => {
                debug!("Read {} bytes from {}", len, session.peer());
                session.dispatch(&self.table, &self.read_buffer[..len]);
                SessionStatus::Open
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => SessionStatus::Open,
            Err(e) => {
                warn!("Client {} dropped: {}", session.peer(), e);
                SessionStatus::Closed
            }
        }
    }
}

impl<B: DeviceBackend> Drop for Server<B> {
    fn drop(&mut self) {
        self.close_all();
    }
}

/// Why an accept failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AcceptFailure {
    /// Only the pending connection is affected
    Connection,
    /// The process or kernel is short on descriptors or memory
    Resources,
    /// The listening socket itself is broken
    Listener,
}

fn classify_accept_error(e: &io::Error) -> AcceptFailure {
    match e.raw_os_error() {
        // accept(2) passes these through from the pending connection
        Some(
            libc::EPROTO
            | libc::ENETDOWN
            | libc::EHOSTDOWN
            | libc::EHOSTUNREACH
            | libc::ENETUNREACH
            | libc::ENONET
            | libc::ENOPROTOOPT
            | libc::EOPNOTSUPP
            | libc::ETIMEDOUT,
        ) => return AcceptFailure::Connection,
        Some(libc::EMFILE | libc::ENFILE | libc::ENOBUFS | libc::ENOMEM) => {
            return AcceptFailure::Resources
        }
        _ => {}
    }

    match e.kind() {
        io::ErrorKind::ConnectionAborted
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::Interrupted
        | io::ErrorKind::WouldBlock => AcceptFailure::Connection,
        _ => AcceptFailure::Listener,
    }
}
