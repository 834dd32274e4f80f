//! # Gamepad Wire Protocol
//!
//! The byte stream spoken between the capture side and this server.
//!
//! This module handles:
//! - Decoding one-byte press/release events
//! - Translating 7-bit control codes to Linux buttons and axes

pub mod decoder;
pub mod translation;

pub use decoder::{decode, ControlEvent};
pub use translation::{TranslationEntry, TranslationTable};
