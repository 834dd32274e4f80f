//! # Event Decoder
//!
//! Turns bytes read from a client connection into control events.
//!
//! ## Wire Format
//!
//! Every byte is one complete event, there is no other framing:
//!
//! ```text
//!  bit  7    6 5 4 3 2 1 0
//!     +---+---------------+
//!     | P | control code  |
//!     +---+---------------+
//! ```
//!
//! `P` is 1 for pressed and 0 for released. Because events never span
//! bytes, a read of N bytes decodes to exactly N events and no state is kept
//! between reads.

/// Bit set when the control is pressed
pub const PRESSED_BIT: u8 = 0x80;

/// Mask selecting the 7-bit control code
pub const CODE_MASK: u8 = 0x7F;

/// One decoded press or release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlEvent {
    /// Control code (0-127)
    pub code: u8,
    pub pressed: bool,
}

impl ControlEvent {
    /// Create an event; the code is truncated to 7 bits
    pub fn new(code: u8, pressed: bool) -> Self {
        Self { code: code & CODE_MASK, pressed }
    }

    /// Decode a single wire byte
    ///
    /// # Examples
    ///
    /// ```
    /// use netpad::protocol::decoder::ControlEvent;
    ///
    /// let event = ControlEvent::from_byte(0xE7);
    /// assert_eq!(event.code, 103);
    /// assert!(event.pressed);
    /// ```
    pub fn from_byte(byte: u8) -> Self {
        Self { code: byte & CODE_MASK, pressed: byte & PRESSED_BIT != 0 }
    }

    /// Encode as a wire byte, as the capture side sends it
    pub fn to_byte(self) -> u8 {
        if self.pressed {
            self.code | PRESSED_BIT
        } else {
            self.code
        }
    }
}

/// Decode a received buffer into events, lazily and in receipt order
///
/// Unmapped codes are passed through; dropping them is the device's job.
pub fn decode(buf: &[u8]) -> impl Iterator<Item = ControlEvent> + '_ {
    buf.iter().copied().map(ControlEvent::from_byte)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pressed_bit() {
        let event = ControlEvent::from_byte(0x80);
        assert_eq!(event, ControlEvent { code: 0, pressed: true });
    }

    #[test]
    fn test_axis_press_byte() {
        // 1110_0111: pressed, code 103
        let event = ControlEvent::from_byte(0xE7);
        assert_eq!(event, ControlEvent { code: 103, pressed: true });
    }

    #[test]
    fn test_axis_release_byte() {
        let event = ControlEvent::from_byte(0x67);
        assert_eq!(event, ControlEvent { code: 103, pressed: false });
    }

    #[test]
    fn test_reserved_codes_still_decode() {
        let event = ControlEvent::from_byte(0xFF);
        assert_eq!(event, ControlEvent { code: 127, pressed: true });
    }

    #[test]
    fn test_every_byte_is_one_event() {
        let bytes: Vec<u8> = (0..=255u8).collect();
        assert_eq!(decode(&bytes).count(), 256);
    }

    #[test]
    fn test_decode_preserves_order() {
        let bytes = [0x85, 0x05, 0xE8, 0x68, 0x00];
        let events: Vec<ControlEvent> = decode(&bytes).collect();
        assert_eq!(
            events,
            vec![
                ControlEvent::new(5, true),
                ControlEvent::new(5, false),
                ControlEvent::new(104, true),
                ControlEvent::new(104, false),
                ControlEvent::new(0, false),
            ]
        );
    }

    #[test]
    fn test_decode_empty_buffer() {
        assert_eq!(decode(&[]).count(), 0);
    }

    #[test]
    fn test_to_byte_matches_wire_format() {
        assert_eq!(ControlEvent::new(103, true).to_byte(), 0xE7);
        assert_eq!(ControlEvent::new(103, false).to_byte(), 0x67);
        assert_eq!(ControlEvent::new(0, true).to_byte(), 0x80);
    }

    #[test]
    fn test_new_truncates_code() {
        assert_eq!(ControlEvent::new(0x85, false).code, 0x05);
    }
}
