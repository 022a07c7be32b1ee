//! Handshake and frame obfuscation
//!
//! Handshake layout (sent once, immediately after transport open):
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ Bytes 0-6:    padding (content irrelevant)               │
//! │ Bytes 7-10:   UNIX time in seconds, truncated to u32,    │
//! │               little-endian                              │
//! │ Bytes 11-127: padding (content irrelevant)               │
//! └──────────────────────────────────────────────────────────┘
//! ```
//! The server rejects the session unless the timestamp is within 300
//! seconds of its own clock, so the value must be taken at send time.
//!
//! Every payload after the handshake is wrapped in a one-byte XOR stream:
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ Byte 0:   magic ^ 0xE5                                   │
//! │ Byte 1+i: payload[i] ^ magic                             │
//! └──────────────────────────────────────────────────────────┘
//! ```
//! The magic byte is self-describing, so encode and decode are inverses
//! for every magic value. This is obfuscation, not cryptography.

use crate::error::{Error, Result};
use crate::{HANDSHAKE_LEN, MAGIC_MASK};
use bytes::{Bytes, BytesMut};
use std::time::{SystemTime, UNIX_EPOCH};

/// Offset of the little-endian timestamp within the handshake buffer.
pub const HANDSHAKE_TS_OFFSET: usize = 7;

/// Width of the truncated timestamp field.
pub const HANDSHAKE_TS_LEN: usize = 4;

/// The fixed 128-byte clock-authentication payload.
#[derive(Debug, Clone)]
pub struct Handshake([u8; HANDSHAKE_LEN]);

impl Handshake {
    /// Build a handshake for a specific UNIX timestamp (seconds).
    ///
    /// Padding bytes are zero; the server ignores their content.
    pub fn at(unix_seconds: u64) -> Self {
        let mut buf = [0u8; HANDSHAKE_LEN];
        let ts = (unix_seconds as u32).to_le_bytes();
        buf[HANDSHAKE_TS_OFFSET..HANDSHAKE_TS_OFFSET + HANDSHAKE_TS_LEN].copy_from_slice(&ts);
        Self(buf)
    }

    /// Build a handshake stamped with the current wall-clock time.
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self::at(secs)
    }

    pub fn as_bytes(&self) -> &[u8; HANDSHAKE_LEN] {
        &self.0
    }

    pub fn into_bytes(self) -> Bytes {
        Bytes::copy_from_slice(&self.0)
    }
}

/// Wrap a raw payload in the XOR stream under the given magic byte.
pub fn obfuscate(payload: &[u8], magic: u8) -> Bytes {
    let mut buf = BytesMut::with_capacity(payload.len() + 1);
    buf.extend_from_slice(&[magic ^ MAGIC_MASK]);
    buf.extend(payload.iter().map(|&b| b ^ magic));
    buf.freeze()
}

/// Recover the raw payload from an obfuscated frame.
///
/// The magic is read back from the first byte; any value decodes, so the
/// only failure here is an empty frame.
pub fn deobfuscate(frame: &[u8]) -> Result<Bytes> {
    let (&key, rest) = frame.split_first().ok_or(Error::EmptyFrame)?;
    let magic = key ^ MAGIC_MASK;
    Ok(rest.iter().map(|&b| b ^ magic).collect::<Vec<u8>>().into())
}

/// Pick a magic byte for an outbound frame.
///
/// Any value is valid on the wire; deriving it from the clock just avoids
/// sending a constant key.
pub fn pick_magic() -> u8 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as u8)
        .unwrap_or(0x5A)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handshake_timestamp_layout() {
        let hs = Handshake::at(0x1234_5678);
        let bytes = hs.as_bytes();

        assert_eq!(bytes.len(), HANDSHAKE_LEN);
        // Little-endian truncation at bytes 7..=10
        assert_eq!(&bytes[7..11], &[0x78, 0x56, 0x34, 0x12]);
    }

    #[test]
    fn handshake_truncates_to_four_bytes() {
        let hs = Handshake::at(0x01_0000_0001);
        assert_eq!(&hs.as_bytes()[7..11], &[0x01, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn obfuscate_known_bytes() {
        // Payload [0x01, 0x02] under magic 20
        let frame = obfuscate(&[0x01, 0x02], 20);
        assert_eq!(frame.as_ref(), &[20 ^ 0xE5, 0x01 ^ 20, 0x02 ^ 20]);
    }

    #[test]
    fn roundtrip_any_magic() {
        let payload = b"fieldset notice payload";
        for magic in [0u8, 1, 20, 0x7F, 0xE5, 0xFF] {
            let frame = obfuscate(payload, magic);
            let back = deobfuscate(&frame).unwrap();
            assert_eq!(back.as_ref(), payload);
        }
    }

    #[test]
    fn empty_frame_rejected() {
        assert!(matches!(deobfuscate(&[]), Err(Error::EmptyFrame)));
    }

    #[test]
    fn empty_payload_roundtrip() {
        let frame = obfuscate(&[], 0x42);
        assert_eq!(frame.len(), 1);
        assert!(deobfuscate(&frame).unwrap().is_empty());
    }
}
