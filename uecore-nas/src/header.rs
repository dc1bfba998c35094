//! Plain 5GMM message header (3GPP TS 24.501 Section 9.1)
//!
//! Layout (3 bytes):
//!
//! ```text
//! +------------------+--------------------+------------------+
//! |       EPD        | Spare (4) | SHT (4)|   Message Type   |
//! +------------------+--------------------+------------------+
//! ```
//!
//! The authentication message family travels in plain headers; security
//! protection of NAS messages is applied by an outer layer.

use bytes::{Buf, BufMut};
use thiserror::Error;

use crate::enums::{ExtendedProtocolDiscriminator, MmMessageType, SecurityHeaderType};

/// NAS header decoding errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    #[error("buffer too short: expected at least {expected} bytes, got {actual}")]
    BufferTooShort { expected: usize, actual: usize },

    #[error("invalid extended protocol discriminator: 0x{0:02X}")]
    InvalidEpd(u8),

    #[error("invalid security header type: 0x{0:02X}")]
    InvalidSecurityHeaderType(u8),

    #[error("invalid message type: 0x{0:02X}")]
    InvalidMessageType(u8),
}

/// Plain 5GMM NAS message header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlainMmHeader {
    /// Extended Protocol Discriminator (always MobilityManagement)
    pub epd: ExtendedProtocolDiscriminator,
    /// Security header type (NotProtected for plain messages)
    pub security_header_type: SecurityHeaderType,
    /// Message type
    pub message_type: MmMessageType,
}

impl PlainMmHeader {
    /// Header size in bytes
    pub const SIZE: usize = 3;

    /// Creates a plain header for the given message type.
    pub fn new(message_type: MmMessageType) -> Self {
        Self {
            epd: ExtendedProtocolDiscriminator::MobilityManagement,
            security_header_type: SecurityHeaderType::NotProtected,
            message_type,
        }
    }

    /// Decodes a plain 5GMM header.
    pub fn decode<B: Buf>(buf: &mut B) -> Result<Self, HeaderError> {
        if buf.remaining() < Self::SIZE {
            return Err(HeaderError::BufferTooShort {
                expected: Self::SIZE,
                actual: buf.remaining(),
            });
        }

        let epd_byte = buf.get_u8();
        let epd = ExtendedProtocolDiscriminator::try_from(epd_byte)
            .map_err(|_| HeaderError::InvalidEpd(epd_byte))?;

        let sht_byte = buf.get_u8();
        let security_header_type = SecurityHeaderType::try_from(sht_byte & 0x0F)
            .map_err(|_| HeaderError::InvalidSecurityHeaderType(sht_byte))?;

        let mt_byte = buf.get_u8();
        let message_type = MmMessageType::try_from(mt_byte)
            .map_err(|_| HeaderError::InvalidMessageType(mt_byte))?;

        Ok(Self {
            epd,
            security_header_type,
            message_type,
        })
    }

    /// Encodes the header.
    pub fn encode<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.epd.into());
        buf.put_u8(u8::from(self.security_header_type) & 0x0F);
        buf.put_u8(self.message_type.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_roundtrip() {
        let header = PlainMmHeader::new(MmMessageType::AuthenticationRequest);
        let mut buf = Vec::new();
        header.encode(&mut buf);
        assert_eq!(buf, vec![0x7E, 0x00, 0x56]);

        let decoded = PlainMmHeader::decode(&mut buf.as_slice()).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn test_header_rejects_bad_epd() {
        let buf: &[u8] = &[0x00, 0x00, 0x56];
        assert!(matches!(
            PlainMmHeader::decode(&mut &buf[..]),
            Err(HeaderError::InvalidEpd(0x00))
        ));
    }

    #[test]
    fn test_header_too_short() {
        let buf: &[u8] = &[0x7E, 0x00];
        assert!(matches!(
            PlainMmHeader::decode(&mut &buf[..]),
            Err(HeaderError::BufferTooShort { .. })
        ));
    }
}
