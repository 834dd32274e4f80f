//! # Client Session
//!
//! Pairs one client connection with the virtual gamepad it drives.

use std::io;
use std::net::SocketAddr;
use std::task::{Context, Poll};
use tokio::net::TcpStream;
use tracing::{debug, warn};

use super::listener;
use crate::device::{DeviceBackend, InputSink, VirtualGamepad};
use crate::error::DeviceError;
use crate::protocol::{decode, TranslationTable};

/// One connected client and its device
pub struct Session<S: InputSink> {
    stream: TcpStream,
    peer: SocketAddr,
    device: VirtualGamepad<S>,
    events_received: u64,
}

impl<S: InputSink> std::fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("peer", &self.peer)
            .field("device", &self.device)
            .field("events_received", &self.events_received)
            .finish()
    }
}

impl<S: InputSink> Session<S> {
    /// Create the device for a freshly accepted connection
    ///
    /// # Errors
    ///
    /// Returns the device error if creation fails; the connection is closed
    /// before returning.
    pub fn open<B>(stream: TcpStream, peer: SocketAddr, backend: &mut B) -> Result<Self, DeviceError>
    where
        B: DeviceBackend<Sink = S>,
    {
        let device = VirtualGamepad::create(backend)?;
        listener::tune_latency(&stream);

        Ok(Self { stream, peer, device, events_received: 0 })
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn events_received(&self) -> u64 {
        self.events_received
    }

    /// Register interest in the connection becoming readable
    pub fn poll_read_ready(&self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.stream.poll_read_ready(cx)
    }

    /// Read whatever is available without blocking
    ///
    /// `Ok(0)` means the peer closed the connection.
    pub fn try_read(&self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.try_read(buf)
    }

    /// Decode `bytes` and submit each event to this session's device, in order
    ///
    /// A rejected event is logged and skipped; the rest are still submitted.
    pub fn dispatch(&mut self, table: &TranslationTable, bytes: &[u8]) {
        for event in decode(bytes) {
            self.events_received += 1;
            if let Err(e) = self.device.submit(table, event) {
                warn!("Dropped {:?} from {}: {}", event, self.peer, e);
            }
        }
        debug!("Dispatched {} events from {}", bytes.len(), self.peer);
    }

    /// Destroy the device, then close the connection
    pub fn close(mut self) {
        self.device.destroy();
        debug!("Closed session for {} after {} events", self.peer, self.events_received);
    }
}
