//! # Virtual Device Module
//!
//! One emulated gamepad per client session.
//!
//! This module handles:
//! - The seam between the server and the host input facility ([`DeviceBackend`])
//! - Translating control events into device events ([`VirtualGamepad::submit`])
//! - Destroying each device exactly once

pub mod uinput;

use evdev::InputEvent;
use std::io;
use tracing::debug;

use crate::error::DeviceError;
use crate::protocol::{ControlEvent, TranslationTable};

pub use uinput::UinputBackend;

/// A live emulated device that accepts input events
///
/// Dropping the sink releases the device in the host.
pub trait InputSink {
    /// Forward one event to the host input subsystem
    fn emit(&mut self, event: InputEvent) -> io::Result<()>;
}

/// Factory for emulated devices
pub trait DeviceBackend {
    type Sink: InputSink;

    /// Check that the injection facility can be opened at all
    fn probe(&self) -> Result<(), DeviceError>;

    /// Create one device with the full button and axis capability set
    fn create(&mut self) -> Result<Self::Sink, DeviceError>;
}

/// Emulated gamepad owned by exactly one session
pub struct VirtualGamepad<S: InputSink> {
    sink: Option<S>,
}

impl<S: InputSink> std::fmt::Debug for VirtualGamepad<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualGamepad")
            .field("live", &self.is_live())
            .finish()
    }
}

impl<S: InputSink> VirtualGamepad<S> {
    /// Create a device through the backend
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::Unavailable` if the facility cannot be opened or
    /// rejects the device.
    pub fn create<B>(backend: &mut B) -> Result<Self, DeviceError>
    where
        B: DeviceBackend<Sink = S>,
    {
        let sink = backend.create()?;
        Ok(Self { sink: Some(sink) })
    }

    /// Submit a press or release of one control
    ///
    /// Unmapped codes succeed without emitting anything. Buttons report 1 or
    /// 0; axes report their signed extreme on press and zero on release.
    ///
    /// # Errors
    ///
    /// - `Destroyed`: the device was already destroyed
    /// - `Submit`: the host rejected the event
    pub fn submit(&mut self, table: &TranslationTable, event: ControlEvent) -> Result<(), DeviceError> {
        let sink = self.sink.as_mut().ok_or(DeviceError::Destroyed)?;

        let Some(entry) = table.lookup(event.code) else {
            debug!("Ignoring unmapped control code {}", event.code);
            return Ok(());
        };

        sink.emit(entry.input_event(event.pressed))
            .map_err(DeviceError::Submit)
    }

    /// Release the device; later calls do nothing
    pub fn destroy(&mut self) {
        if self.sink.take().is_some() {
            debug!("Virtual gamepad destroyed");
        }
    }

    /// Whether the device has not been destroyed yet
    pub fn is_live(&self) -> bool {
        self.sink.is_some()
    }
}

impl<S: InputSink> Drop for VirtualGamepad<S> {
    fn drop(&mut self) {
        self.destroy();
    }
}
