//! EAP message encoding and decoding
//!
//! Implements the EAP envelope carried inside NAS authentication messages:
//! the base format of RFC 3748, the EAP-AKA' method of RFC 4187 / RFC 5448,
//! and the EAP-TLS method of RFC 5216.
//!
//! # Message structure
//!
//! ```text
//! Code (1) | Identifier (1) | Length (2) | Type (1) | Type-Data (...)
//! ```
//!
//! EAP-AKA' type-data is a subtype octet, two reserved octets and a list of
//! TLV attributes whose lengths are expressed in 4-octet units. EAP-TLS
//! type-data is a flags octet, an optional 4-octet message length, and the
//! raw TLS record bytes.

use bytes::{Buf, BufMut};
use std::collections::BTreeMap;
use thiserror::Error;

/// Error type for EAP encoding/decoding
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EapError {
    /// Buffer too short for decoding
    #[error("buffer too short: expected at least {expected} bytes, got {actual}")]
    BufferTooShort {
        /// Expected minimum bytes
        expected: usize,
        /// Actual bytes available
        actual: usize,
    },
    /// Invalid EAP code
    #[error("invalid EAP code: {0}")]
    InvalidCode(u8),
    /// Unsupported EAP type
    #[error("unsupported EAP type: {0}")]
    UnsupportedType(u8),
    /// Invalid EAP-AKA' subtype
    #[error("invalid EAP-AKA' subtype: {0}")]
    InvalidSubType(u8),
    /// Invalid attribute type
    #[error("invalid attribute type: {0}")]
    InvalidAttributeType(u8),
    /// Invalid attribute length
    #[error("invalid attribute length: {0}")]
    InvalidAttributeLength(u8),
    /// Read bytes exceeds message length
    #[error("read bytes ({read}) exceeds message length ({length})")]
    LengthMismatch {
        /// Bytes read
        read: usize,
        /// Expected length
        length: usize,
    },
}

/// EAP Code values (RFC 3748 Section 4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EapCode {
    /// Request (1)
    Request = 1,
    /// Response (2)
    Response = 2,
    /// Success (3)
    Success = 3,
    /// Failure (4)
    Failure = 4,
}

impl TryFrom<u8> for EapCode {
    type Error = EapError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(EapCode::Request),
            2 => Ok(EapCode::Response),
            3 => Ok(EapCode::Success),
            4 => Ok(EapCode::Failure),
            _ => Err(EapError::InvalidCode(value)),
        }
    }
}

/// EAP method type values (RFC 3748 Section 5)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EapType {
    /// No type (Success/Failure)
    NoType = 0,
    /// Identity
    Identity = 1,
    /// EAP-TLS (RFC 5216)
    Tls = 13,
    /// EAP-AKA (RFC 4187)
    EapAka = 23,
    /// EAP-AKA' (RFC 5448)
    EapAkaPrime = 50,
}

/// EAP-AKA' subtype values (RFC 4187 Section 11)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EapAkaSubType {
    /// AKA-Challenge
    AkaChallenge = 1,
    /// AKA-Authentication-Reject
    AkaAuthenticationReject = 2,
    /// AKA-Synchronization-Failure
    AkaSynchronizationFailure = 4,
    /// AKA-Identity
    AkaIdentity = 5,
    /// AKA-Notification
    AkaNotification = 12,
    /// AKA-Reauthentication
    AkaReauthentication = 13,
    /// AKA-Client-Error
    AkaClientError = 14,
}

impl TryFrom<u8> for EapAkaSubType {
    type Error = EapError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(EapAkaSubType::AkaChallenge),
            2 => Ok(EapAkaSubType::AkaAuthenticationReject),
            4 => Ok(EapAkaSubType::AkaSynchronizationFailure),
            5 => Ok(EapAkaSubType::AkaIdentity),
            12 => Ok(EapAkaSubType::AkaNotification),
            13 => Ok(EapAkaSubType::AkaReauthentication),
            14 => Ok(EapAkaSubType::AkaClientError),
            _ => Err(EapError::InvalidSubType(value)),
        }
    }
}

/// EAP-AKA' attribute type values (RFC 4187 Section 11, RFC 5448)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum EapAttributeType {
    /// AT_RAND - random challenge
    AtRand = 1,
    /// AT_AUTN - authentication token
    AtAutn = 2,
    /// AT_RES - authentication response
    AtRes = 3,
    /// AT_AUTS - resynchronisation parameter
    AtAuts = 4,
    /// AT_PADDING
    AtPadding = 6,
    /// AT_MAC - message authentication code
    AtMac = 11,
    /// AT_NOTIFICATION
    AtNotification = 12,
    /// AT_CLIENT_ERROR_CODE
    AtClientErrorCode = 22,
    /// AT_KDF_INPUT - network name
    AtKdfInput = 23,
    /// AT_KDF - key derivation function selector
    AtKdf = 24,
}

impl TryFrom<u8> for EapAttributeType {
    type Error = EapError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(EapAttributeType::AtRand),
            2 => Ok(EapAttributeType::AtAutn),
            3 => Ok(EapAttributeType::AtRes),
            4 => Ok(EapAttributeType::AtAuts),
            6 => Ok(EapAttributeType::AtPadding),
            11 => Ok(EapAttributeType::AtMac),
            12 => Ok(EapAttributeType::AtNotification),
            22 => Ok(EapAttributeType::AtClientErrorCode),
            23 => Ok(EapAttributeType::AtKdfInput),
            24 => Ok(EapAttributeType::AtKdf),
            _ => Err(EapError::InvalidAttributeType(value)),
        }
    }
}

/// Container for EAP-AKA' attributes, preserving insertion order.
///
/// Order matters: AT_MAC is computed over the encoded packet, so a response
/// must encode its attributes in the same order they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EapAttributes {
    attributes: BTreeMap<EapAttributeType, Vec<u8>>,
    order: Vec<EapAttributeType>,
}

impl EapAttributes {
    /// Creates an empty attribute container.
    pub fn new() -> Self {
        Self::default()
    }

    /// AT_RAND value (the 2-byte reserved prefix stripped).
    pub fn get_rand(&self) -> Option<Vec<u8>> {
        self.get_skipping_reserved(EapAttributeType::AtRand)
    }

    /// AT_AUTN value (the 2-byte reserved prefix stripped).
    pub fn get_autn(&self) -> Option<Vec<u8>> {
        self.get_skipping_reserved(EapAttributeType::AtAutn)
    }

    /// AT_MAC value (the 2-byte reserved prefix stripped).
    pub fn get_mac(&self) -> Option<Vec<u8>> {
        self.get_skipping_reserved(EapAttributeType::AtMac)
    }

    fn get_skipping_reserved(&self, key: EapAttributeType) -> Option<Vec<u8>> {
        self.attributes
            .get(&key)
            .filter(|v| v.len() >= 2)
            .map(|v| v[2..].to_vec())
    }

    /// AT_RES value (the 2-byte bit-length prefix stripped).
    pub fn get_res(&self) -> Option<Vec<u8>> {
        self.attributes.get(&EapAttributeType::AtRes).and_then(|v| {
            if v.len() < 2 {
                return None;
            }
            let bits = u16::from_be_bytes([v[0], v[1]]) as usize;
            let bytes = bits / 8;
            (v.len() >= 2 + bytes).then(|| v[2..2 + bytes].to_vec())
        })
    }

    /// AT_KDF value.
    pub fn get_kdf(&self) -> Option<u16> {
        self.attributes
            .get(&EapAttributeType::AtKdf)
            .filter(|v| v.len() == 2)
            .map(|v| u16::from_be_bytes([v[0], v[1]]))
    }

    /// AT_KDF_INPUT value (the inner 2-byte actual length honoured).
    pub fn get_kdf_input(&self) -> Option<Vec<u8>> {
        self.attributes
            .get(&EapAttributeType::AtKdfInput)
            .and_then(|v| {
                if v.len() < 2 {
                    return None;
                }
                let len = u16::from_be_bytes([v[0], v[1]]) as usize;
                (v.len() >= 2 + len).then(|| v[2..2 + len].to_vec())
            })
    }

    /// AT_CLIENT_ERROR_CODE value.
    pub fn get_client_error_code(&self) -> Option<u16> {
        self.attributes
            .get(&EapAttributeType::AtClientErrorCode)
            .filter(|v| v.len() == 2)
            .map(|v| u16::from_be_bytes([v[0], v[1]]))
    }

    /// AT_AUTS value.
    pub fn get_auts(&self) -> Option<Vec<u8>> {
        self.attributes.get(&EapAttributeType::AtAuts).cloned()
    }

    /// Adds AT_RES with its bit-length prefix.
    pub fn put_res(&mut self, value: &[u8]) {
        let bits = (value.len() * 8) as u16;
        let mut data = Vec::with_capacity(2 + value.len());
        data.extend_from_slice(&bits.to_be_bytes());
        data.extend_from_slice(value);
        self.put_raw_attribute(EapAttributeType::AtRes, data);
    }

    /// Adds AT_MAC with its 2-byte reserved prefix.
    pub fn put_mac(&mut self, value: &[u8]) {
        let mut data = Vec::with_capacity(2 + value.len());
        data.extend_from_slice(&[0, 0]);
        data.extend_from_slice(value);
        self.put_raw_attribute(EapAttributeType::AtMac, data);
    }

    /// Replaces the AT_MAC value, keeping its position in the order.
    pub fn replace_mac(&mut self, value: &[u8]) {
        let mut data = Vec::with_capacity(2 + value.len());
        data.extend_from_slice(&[0, 0]);
        data.extend_from_slice(value);
        self.attributes.insert(EapAttributeType::AtMac, data);
    }

    /// Adds AT_KDF.
    pub fn put_kdf(&mut self, value: u16) {
        self.put_raw_attribute(EapAttributeType::AtKdf, value.to_be_bytes().to_vec());
    }

    /// Adds AT_KDF_INPUT with its actual-length prefix.
    pub fn put_kdf_input(&mut self, name: &[u8]) {
        let mut data = Vec::with_capacity(2 + name.len());
        data.extend_from_slice(&(name.len() as u16).to_be_bytes());
        data.extend_from_slice(name);
        self.put_raw_attribute(EapAttributeType::AtKdfInput, data);
    }

    /// Adds AT_CLIENT_ERROR_CODE.
    pub fn put_client_error_code(&mut self, code: u16) {
        self.put_raw_attribute(
            EapAttributeType::AtClientErrorCode,
            code.to_be_bytes().to_vec(),
        );
    }

    /// Adds AT_AUTS.
    pub fn put_auts(&mut self, auts: Vec<u8>) {
        self.put_raw_attribute(EapAttributeType::AtAuts, auts);
    }

    /// Adds a raw attribute value.
    pub fn put_raw_attribute(&mut self, key: EapAttributeType, value: Vec<u8>) {
        if !self.attributes.contains_key(&key) {
            self.order.push(key);
        }
        self.attributes.insert(key, value);
    }

    /// Iterates over attributes in insertion order.
    pub fn iter_ordered(&self) -> impl Iterator<Item = (EapAttributeType, &Vec<u8>)> {
        self.order
            .iter()
            .filter_map(|k| self.attributes.get(k).map(|v| (*k, v)))
    }

    /// Returns true if no attributes are present.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// EAP-AKA' message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EapAkaPrime {
    /// EAP code
    pub code: EapCode,
    /// Identifier, echoed into the response
    pub id: u8,
    /// EAP-AKA' subtype
    pub sub_type: EapAkaSubType,
    /// Attributes
    pub attributes: EapAttributes,
}

impl EapAkaPrime {
    /// Creates a new EAP-AKA' message.
    pub fn new(code: EapCode, id: u8, sub_type: EapAkaSubType) -> Self {
        Self {
            code,
            id,
            sub_type,
            attributes: EapAttributes::new(),
        }
    }

    /// Creates an AKA-Authentication-Reject response.
    pub fn authentication_reject(id: u8) -> Self {
        Self::new(EapCode::Response, id, EapAkaSubType::AkaAuthenticationReject)
    }

    /// Creates an AKA-Client-Error response with the given error code.
    pub fn client_error(id: u8, error_code: u16) -> Self {
        let mut msg = Self::new(EapCode::Response, id, EapAkaSubType::AkaClientError);
        msg.attributes.put_client_error_code(error_code);
        msg
    }

    /// Creates an AKA-Synchronization-Failure response carrying AT_AUTS.
    pub fn synchronization_failure(id: u8, auts: Vec<u8>) -> Self {
        let mut msg = Self::new(
            EapCode::Response,
            id,
            EapAkaSubType::AkaSynchronizationFailure,
        );
        msg.attributes.put_auts(auts);
        msg
    }
}

/// EAP-TLS message (RFC 5216 Section 3.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EapTls {
    /// EAP code
    pub code: EapCode,
    /// Identifier
    pub id: u8,
    /// Flags octet (L = 0x80, M = 0x40, S = 0x20)
    pub flags: u8,
    /// TLS message length carried when the L bit is set. Responses emit the
    /// fixed value 128 regardless of payload size.
    pub message_length: u32,
    /// Raw TLS record bytes
    pub tls_data: Vec<u8>,
}

impl EapTls {
    /// Flags bit: TLS message length included
    pub const FLAG_LENGTH_INCLUDED: u8 = 0x80;
    /// Flags bit: more fragments follow
    pub const FLAG_MORE_FRAGMENTS: u8 = 0x40;
    /// Flags bit: EAP-TLS start
    pub const FLAG_START: u8 = 0x20;
    /// TLS message length value placed in emitted responses
    pub const RESPONSE_MESSAGE_LENGTH: u32 = 128;

    /// Creates a new EAP-TLS message with the response message length.
    pub fn new(code: EapCode, id: u8, flags: u8, tls_data: Vec<u8>) -> Self {
        Self {
            code,
            id,
            flags,
            message_length: Self::RESPONSE_MESSAGE_LENGTH,
            tls_data,
        }
    }

    /// Returns true if the Start bit is set.
    pub fn is_start(&self) -> bool {
        self.flags & Self::FLAG_START != 0
    }
}

/// Decoded EAP message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eap {
    /// Success/Failure without a method type
    Simple {
        /// EAP code
        code: EapCode,
        /// Identifier
        id: u8,
    },
    /// EAP-AKA' method message
    AkaPrime(EapAkaPrime),
    /// EAP-TLS method message
    Tls(EapTls),
}

impl Eap {
    /// The EAP code of the message.
    pub fn code(&self) -> EapCode {
        match self {
            Eap::Simple { code, .. } => *code,
            Eap::AkaPrime(e) => e.code,
            Eap::Tls(e) => e.code,
        }
    }

    /// The identifier of the message.
    pub fn id(&self) -> u8 {
        match self {
            Eap::Simple { id, .. } => *id,
            Eap::AkaPrime(e) => e.id,
            Eap::Tls(e) => e.id,
        }
    }
}

// Attribute lengths travel in 4-octet units including the 2-byte TLV header.
fn attr_padded_len(value_len: usize) -> usize {
    (value_len + 2).div_ceil(4) * 4 - 2
}

/// Encodes an EAP message.
pub fn encode_eap<B: BufMut>(buf: &mut B, eap: &Eap) {
    buf.put_u8(eap.code() as u8);
    buf.put_u8(eap.id());

    match eap {
        Eap::Simple { .. } => {
            buf.put_u16(4);
        }
        Eap::AkaPrime(aka) => {
            let attr_len: usize = aka
                .attributes
                .iter_ordered()
                .map(|(_, v)| 2 + attr_padded_len(v.len()))
                .sum();
            // header (4) + type (1) + subtype (1) + reserved (2) + attributes
            let total = 4 + 1 + 1 + 2 + attr_len;

            buf.put_u16(total as u16);
            buf.put_u8(EapType::EapAkaPrime as u8);
            buf.put_u8(aka.sub_type as u8);
            buf.put_u16(0); // reserved

            for (attr_type, value) in aka.attributes.iter_ordered() {
                let padded = attr_padded_len(value.len());
                buf.put_u8(attr_type as u8);
                buf.put_u8(((padded + 2) / 4) as u8);
                buf.put_slice(value);
                for _ in value.len()..padded {
                    buf.put_u8(0);
                }
            }
        }
        Eap::Tls(tls) => {
            let length_field = if tls.flags & EapTls::FLAG_LENGTH_INCLUDED != 0 {
                4
            } else {
                0
            };
            // header (4) + type (1) + flags (1) + optional length + data
            let total = 4 + 1 + 1 + length_field + tls.tls_data.len();

            buf.put_u16(total as u16);
            buf.put_u8(EapType::Tls as u8);
            buf.put_u8(tls.flags);
            if length_field != 0 {
                buf.put_u32(tls.message_length);
            }
            buf.put_slice(&tls.tls_data);
        }
    }
}

/// Encodes an EAP message into a new vector.
pub fn encode_eap_to_vec(eap: &Eap) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_eap(&mut buf, eap);
    buf
}

/// Decodes an EAP message.
pub fn decode_eap<B: Buf>(buf: &mut B) -> Result<Eap, EapError> {
    if buf.remaining() < 4 {
        return Err(EapError::BufferTooShort {
            expected: 4,
            actual: buf.remaining(),
        });
    }

    let code = EapCode::try_from(buf.get_u8())?;
    let id = buf.get_u8();
    let length = buf.get_u16() as usize;

    if length < 4 {
        return Err(EapError::BufferTooShort {
            expected: 4,
            actual: length,
        });
    }
    if length == 4 {
        return Ok(Eap::Simple { code, id });
    }

    if buf.remaining() < 1 {
        return Err(EapError::BufferTooShort {
            expected: 1,
            actual: 0,
        });
    }
    let type_byte = buf.get_u8();
    let inner_length = length - 5;

    if buf.remaining() < inner_length {
        return Err(EapError::BufferTooShort {
            expected: inner_length,
            actual: buf.remaining(),
        });
    }

    match type_byte {
        t if t == EapType::EapAkaPrime as u8 => decode_eap_aka_prime(buf, code, id, inner_length),
        t if t == EapType::Tls as u8 => decode_eap_tls(buf, code, id, inner_length),
        other => {
            buf.advance(inner_length);
            Err(EapError::UnsupportedType(other))
        }
    }
}

fn decode_eap_aka_prime<B: Buf>(
    buf: &mut B,
    code: EapCode,
    id: u8,
    inner_length: usize,
) -> Result<Eap, EapError> {
    if inner_length < 3 {
        return Err(EapError::BufferTooShort {
            expected: 3,
            actual: inner_length,
        });
    }

    let sub_type = EapAkaSubType::try_from(buf.get_u8())?;
    let _ = buf.get_u16(); // reserved
    let mut read = 3;

    let mut msg = EapAkaPrime::new(code, id, sub_type);

    while read < inner_length {
        if buf.remaining() < 2 {
            return Err(EapError::BufferTooShort {
                expected: 2,
                actual: buf.remaining(),
            });
        }

        let attr_type = EapAttributeType::try_from(buf.get_u8())?;
        let units = buf.get_u8();
        read += 2;

        if units < 1 {
            return Err(EapError::InvalidAttributeLength(units));
        }

        let value_len = units as usize * 4 - 2;
        if buf.remaining() < value_len {
            return Err(EapError::BufferTooShort {
                expected: value_len,
                actual: buf.remaining(),
            });
        }

        let mut value = vec![0u8; value_len];
        buf.copy_to_slice(&mut value);
        read += value_len;

        msg.attributes.put_raw_attribute(attr_type, value);
    }

    if read != inner_length {
        return Err(EapError::LengthMismatch {
            read,
            length: inner_length,
        });
    }

    Ok(Eap::AkaPrime(msg))
}

fn decode_eap_tls<B: Buf>(
    buf: &mut B,
    code: EapCode,
    id: u8,
    inner_length: usize,
) -> Result<Eap, EapError> {
    if inner_length < 1 {
        return Err(EapError::BufferTooShort {
            expected: 1,
            actual: inner_length,
        });
    }

    let flags = buf.get_u8();
    let mut remaining = inner_length - 1;

    let mut message_length = EapTls::RESPONSE_MESSAGE_LENGTH;
    if flags & EapTls::FLAG_LENGTH_INCLUDED != 0 {
        if remaining < 4 {
            return Err(EapError::BufferTooShort {
                expected: 4,
                actual: remaining,
            });
        }
        message_length = buf.get_u32();
        remaining -= 4;
    }

    let mut tls_data = vec![0u8; remaining];
    buf.copy_to_slice(&mut tls_data);

    let mut msg = EapTls::new(code, id, flags, tls_data);
    msg.message_length = message_length;
    Ok(Eap::Tls(msg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_conversion() {
        assert_eq!(EapCode::try_from(2).unwrap(), EapCode::Response);
        assert!(EapCode::try_from(0).is_err());
        assert!(EapCode::try_from(7).is_err());
    }

    #[test]
    fn test_simple_roundtrip() {
        let eap = Eap::Simple {
            code: EapCode::Failure,
            id: 9,
        };
        let encoded = encode_eap_to_vec(&eap);
        assert_eq!(encoded, vec![0x04, 0x09, 0x00, 0x04]);
        assert_eq!(decode_eap(&mut encoded.as_slice()).unwrap(), eap);
    }

    #[test]
    fn test_aka_prime_challenge_roundtrip() {
        let mut msg = EapAkaPrime::new(EapCode::Request, 1, EapAkaSubType::AkaChallenge);
        msg.attributes
            .put_raw_attribute(EapAttributeType::AtRand, {
                let mut v = vec![0, 0];
                v.extend_from_slice(&[0xAA; 16]);
                v
            });
        msg.attributes
            .put_raw_attribute(EapAttributeType::AtAutn, {
                let mut v = vec![0, 0];
                v.extend_from_slice(&[0xBB; 16]);
                v
            });
        msg.attributes.put_kdf_input(b"5G:mnc001.mcc001.3gppnetwork.org");
        msg.attributes.put_kdf(1);
        msg.attributes.put_mac(&[0xCC; 16]);

        let encoded = encode_eap_to_vec(&Eap::AkaPrime(msg.clone()));
        // total length is in the header
        assert_eq!(
            u16::from_be_bytes([encoded[2], encoded[3]]) as usize,
            encoded.len()
        );

        let decoded = decode_eap(&mut encoded.as_slice()).unwrap();
        let Eap::AkaPrime(dec) = decoded else {
            panic!("expected EAP-AKA' message");
        };
        assert_eq!(dec.sub_type, EapAkaSubType::AkaChallenge);
        assert_eq!(dec.attributes.get_rand().unwrap(), vec![0xAA; 16]);
        assert_eq!(dec.attributes.get_autn().unwrap(), vec![0xBB; 16]);
        assert_eq!(dec.attributes.get_mac().unwrap(), vec![0xCC; 16]);
        assert_eq!(dec.attributes.get_kdf(), Some(1));
        assert_eq!(
            dec.attributes.get_kdf_input().unwrap(),
            b"5G:mnc001.mcc001.3gppnetwork.org".to_vec()
        );
    }

    #[test]
    fn test_aka_prime_response_with_res() {
        let mut msg = EapAkaPrime::new(EapCode::Response, 2, EapAkaSubType::AkaChallenge);
        msg.attributes.put_res(&[0x11; 8]);
        msg.attributes.put_mac(&[0u8; 16]);
        msg.attributes.put_kdf(1);

        let encoded = encode_eap_to_vec(&Eap::AkaPrime(msg));
        let Eap::AkaPrime(dec) = decode_eap(&mut encoded.as_slice()).unwrap() else {
            panic!("expected EAP-AKA' message");
        };
        assert_eq!(dec.attributes.get_res().unwrap(), vec![0x11; 8]);
    }

    #[test]
    fn test_replace_mac_preserves_order() {
        let mut msg = EapAkaPrime::new(EapCode::Response, 3, EapAkaSubType::AkaChallenge);
        msg.attributes.put_res(&[0x22; 8]);
        msg.attributes.put_mac(&[0u8; 16]);
        msg.attributes.put_kdf(1);

        let zeroed = encode_eap_to_vec(&Eap::AkaPrime(msg.clone()));
        msg.attributes.replace_mac(&[0x5A; 16]);
        let filled = encode_eap_to_vec(&Eap::AkaPrime(msg));

        // Same layout, only the MAC bytes differ
        assert_eq!(zeroed.len(), filled.len());
        let diff: Vec<usize> = zeroed
            .iter()
            .zip(filled.iter())
            .enumerate()
            .filter(|(_, (a, b))| a != b)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(diff.len(), 16);
        assert_eq!(diff[15] - diff[0], 15);
    }

    #[test]
    fn test_client_error() {
        let msg = EapAkaPrime::client_error(5, 0);
        let encoded = encode_eap_to_vec(&Eap::AkaPrime(msg));
        let Eap::AkaPrime(dec) = decode_eap(&mut encoded.as_slice()).unwrap() else {
            panic!("expected EAP-AKA' message");
        };
        assert_eq!(dec.sub_type, EapAkaSubType::AkaClientError);
        assert_eq!(dec.attributes.get_client_error_code(), Some(0));
    }

    #[test]
    fn test_synchronization_failure_auts() {
        let msg = EapAkaPrime::synchronization_failure(6, vec![0x77; 14]);
        let encoded = encode_eap_to_vec(&Eap::AkaPrime(msg));
        let Eap::AkaPrime(dec) = decode_eap(&mut encoded.as_slice()).unwrap() else {
            panic!("expected EAP-AKA' message");
        };
        assert_eq!(dec.attributes.get_auts().unwrap(), vec![0x77; 14]);
    }

    #[test]
    fn test_eap_tls_roundtrip_with_length() {
        let tls = EapTls::new(
            EapCode::Response,
            7,
            EapTls::FLAG_LENGTH_INCLUDED,
            vec![0x16, 0x03, 0x03, 0x00, 0x01, 0x01],
        );
        let encoded = encode_eap_to_vec(&Eap::Tls(tls.clone()));
        assert_eq!(
            u16::from_be_bytes([encoded[2], encoded[3]]) as usize,
            encoded.len()
        );
        // TLS message length field holds the fixed response value 128,
        // not the fragment size
        assert_eq!(
            u32::from_be_bytes([encoded[6], encoded[7], encoded[8], encoded[9]]),
            EapTls::RESPONSE_MESSAGE_LENGTH
        );

        let decoded = decode_eap(&mut encoded.as_slice()).unwrap();
        assert_eq!(decoded, Eap::Tls(tls));
    }

    #[test]
    fn test_eap_tls_start_bit() {
        let tls = EapTls::new(EapCode::Request, 1, EapTls::FLAG_START, Vec::new());
        assert!(tls.is_start());

        let encoded = encode_eap_to_vec(&Eap::Tls(tls.clone()));
        let Eap::Tls(dec) = decode_eap(&mut encoded.as_slice()).unwrap() else {
            panic!("expected EAP-TLS message");
        };
        assert!(dec.is_start());
        assert!(dec.tls_data.is_empty());
    }

    #[test]
    fn test_eap_tls_empty_with_length_flag() {
        // Completion response: length flag set, empty payload, message
        // length still 128
        let tls = EapTls::new(EapCode::Response, 8, EapTls::FLAG_LENGTH_INCLUDED, Vec::new());
        let encoded = encode_eap_to_vec(&Eap::Tls(tls.clone()));
        assert_eq!(
            u32::from_be_bytes([encoded[6], encoded[7], encoded[8], encoded[9]]),
            EapTls::RESPONSE_MESSAGE_LENGTH
        );
        assert_eq!(decode_eap(&mut encoded.as_slice()).unwrap(), Eap::Tls(tls));
    }

    #[test]
    fn test_decode_unsupported_type() {
        // Identity request
        let buf: &[u8] = &[0x01, 0x01, 0x00, 0x06, 0x01, 0x61];
        assert!(matches!(
            decode_eap(&mut &buf[..]),
            Err(EapError::UnsupportedType(1))
        ));
    }

    #[test]
    fn test_decode_truncated() {
        let buf: &[u8] = &[0x01, 0x02];
        assert!(matches!(
            decode_eap(&mut &buf[..]),
            Err(EapError::BufferTooShort { .. })
        ));
    }

    #[test]
    fn test_attr_padding() {
        // AT_AUTS: 14-byte value + 2-byte header = 16, exactly 4 units
        assert_eq!(attr_padded_len(14), 14);
        // 3-byte value pads to 6 (total 8, 2 units)
        assert_eq!(attr_padded_len(3), 6);
    }
}
