//! # Netpad Library
//!
//! Drive virtual gamepads on a Linux host from remote keyboards over TCP.
//!
//! A capture side sends one byte per key press or release; this library
//! accepts many such clients at once, gives each its own uinput gamepad and
//! replays the received events on it.

pub mod config;
pub mod device;
pub mod error;
pub mod lifecycle;
pub mod protocol;
pub mod server;
