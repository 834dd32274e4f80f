//! # Lifecycle Module
//!
//! Turns process termination signals into a cooperative shutdown request.
//!
//! The signals are only observed here; the event loop selects on
//! [`ShutdownSignals::recv`] and performs teardown itself, on the thread that
//! owns every socket and device.

use std::io;
use tokio::signal::unix::{signal, Signal, SignalKind};
use tracing::{info, warn};

/// Listeners for SIGINT, SIGTERM and SIGABRT
#[derive(Debug)]
pub struct ShutdownSignals {
    interrupt: Signal,
    terminate: Signal,
    abort: Option<Signal>,
}

impl ShutdownSignals {
    /// Install the handlers
    ///
    /// # Errors
    ///
    /// Returns an error if SIGINT or SIGTERM cannot be registered. SIGABRT is
    /// best effort and only logged when unavailable.
    pub fn register() -> io::Result<Self> {
        let interrupt = signal(SignalKind::interrupt())?;
        let terminate = signal(SignalKind::terminate())?;
        let abort = match signal(SignalKind::from_raw(libc::SIGABRT)) {
            Ok(abort) => Some(abort),
            Err(e) => {
                warn!("Cannot watch SIGABRT: {}", e);
                None
            }
        };

        Ok(Self { interrupt, terminate, abort })
    }

    /// Wait for the first termination signal and return its name
    pub async fn recv(&mut self) -> &'static str {
        let name = tokio::select! {
            _ = self.interrupt.recv() => "SIGINT",
            _ = self.terminate.recv() => "SIGTERM",
            _ = recv_optional(&mut self.abort) => "SIGABRT",
        };
        info!("Received {}, shutting down...", name);
        name
    }
}

async fn recv_optional(signal: &mut Option<Signal>) {
    match signal {
        Some(signal) => {
            signal.recv().await;
        }
        None => std::future::pending().await,
    }
}
