//! Information elements of the authentication message family
//!
//! IE formats per 3GPP TS 24.501 Section 9.11: RAND is a Type 3 IE of fixed
//! 16 bytes; AUTN, the response/failure parameters and ABBA are Type 4 IEs
//! with a 1-byte length; the EAP message IE is Type 6 with a 2-byte length.

use bytes::{Buf, BufMut};
use thiserror::Error;

/// Error type for IE decoding
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IeError {
    /// Buffer too short for decoding
    #[error("buffer too short: expected at least {expected} bytes, got {actual}")]
    BufferTooShort {
        /// Expected minimum bytes
        expected: usize,
        /// Actual bytes available
        actual: usize,
    },
}

fn take_lv<B: Buf>(buf: &mut B) -> Result<Vec<u8>, IeError> {
    if buf.remaining() < 1 {
        return Err(IeError::BufferTooShort {
            expected: 1,
            actual: buf.remaining(),
        });
    }
    let len = buf.get_u8() as usize;
    if buf.remaining() < len {
        return Err(IeError::BufferTooShort {
            expected: len,
            actual: buf.remaining(),
        });
    }
    let mut value = vec![0u8; len];
    buf.copy_to_slice(&mut value);
    Ok(value)
}

fn put_lv<B: BufMut>(buf: &mut B, value: &[u8]) {
    buf.put_u8(value.len() as u8);
    buf.put_slice(value);
}

/// Authentication Parameter RAND IE (Type 3, 16 bytes; TS 24.501 9.11.3.16)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AuthParamRand {
    /// 128-bit random challenge
    pub value: [u8; 16],
}

impl AuthParamRand {
    /// Creates a new RAND IE.
    pub fn new(value: [u8; 16]) -> Self {
        Self { value }
    }

    /// Decodes the fixed 16-byte value.
    pub fn decode<B: Buf>(buf: &mut B) -> Result<Self, IeError> {
        if buf.remaining() < 16 {
            return Err(IeError::BufferTooShort {
                expected: 16,
                actual: buf.remaining(),
            });
        }
        let mut value = [0u8; 16];
        buf.copy_to_slice(&mut value);
        Ok(Self { value })
    }

    /// Encodes the fixed 16-byte value.
    pub fn encode<B: BufMut>(&self, buf: &mut B) {
        buf.put_slice(&self.value);
    }
}

/// Authentication Parameter AUTN IE (Type 4; TS 24.501 9.11.3.15)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthParamAutn {
    /// AUTN value, 16 bytes when well-formed
    pub value: Vec<u8>,
}

impl AuthParamAutn {
    /// Creates a new AUTN IE.
    pub fn new(value: Vec<u8>) -> Self {
        Self { value }
    }

    /// Decodes the length-prefixed value.
    pub fn decode<B: Buf>(buf: &mut B) -> Result<Self, IeError> {
        Ok(Self { value: take_lv(buf)? })
    }

    /// Encodes the length-prefixed value.
    pub fn encode<B: BufMut>(&self, buf: &mut B) {
        put_lv(buf, &self.value);
    }
}

/// Authentication Response Parameter IE carrying RES* (TS 24.501 9.11.3.17)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthResponseParameter {
    /// RES* value
    pub value: Vec<u8>,
}

impl AuthResponseParameter {
    /// Creates a new response parameter IE.
    pub fn new(value: Vec<u8>) -> Self {
        Self { value }
    }

    /// Decodes the length-prefixed value.
    pub fn decode<B: Buf>(buf: &mut B) -> Result<Self, IeError> {
        Ok(Self { value: take_lv(buf)? })
    }

    /// Encodes the length-prefixed value.
    pub fn encode<B: BufMut>(&self, buf: &mut B) {
        put_lv(buf, &self.value);
    }
}

/// Authentication Failure Parameter IE carrying AUTS (TS 24.501 9.11.3.14)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthFailureParameter {
    /// AUTS value (14 bytes)
    pub value: Vec<u8>,
}

impl AuthFailureParameter {
    /// Creates a new failure parameter IE.
    pub fn new(value: Vec<u8>) -> Self {
        Self { value }
    }

    /// Decodes the length-prefixed value.
    pub fn decode<B: Buf>(buf: &mut B) -> Result<Self, IeError> {
        Ok(Self { value: take_lv(buf)? })
    }

    /// Encodes the length-prefixed value.
    pub fn encode<B: BufMut>(&self, buf: &mut B) {
        put_lv(buf, &self.value);
    }
}

/// ABBA IE (Type 4; TS 24.501 9.11.3.10)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Abba {
    /// Raw ABBA bytes
    pub value: Vec<u8>,
}

impl Default for Abba {
    fn default() -> Self {
        Self {
            value: vec![0x00, 0x00],
        }
    }
}

impl Abba {
    /// Creates a new ABBA IE.
    pub fn new(value: Vec<u8>) -> Self {
        Self { value }
    }

    /// Decodes the length-prefixed value.
    pub fn decode<B: Buf>(buf: &mut B) -> Result<Self, IeError> {
        Ok(Self { value: take_lv(buf)? })
    }

    /// Encodes the length-prefixed value.
    pub fn encode<B: BufMut>(&self, buf: &mut B) {
        put_lv(buf, &self.value);
    }
}

/// EAP message IE (Type 6, 2-byte length; TS 24.501 9.11.2.2)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EapMessageIe {
    /// Encoded EAP packet
    pub data: Vec<u8>,
}

impl EapMessageIe {
    /// Creates a new EAP message IE.
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Decodes the 2-byte-length-prefixed value.
    pub fn decode<B: Buf>(buf: &mut B) -> Result<Self, IeError> {
        if buf.remaining() < 2 {
            return Err(IeError::BufferTooShort {
                expected: 2,
                actual: buf.remaining(),
            });
        }
        let len = buf.get_u16() as usize;
        if buf.remaining() < len {
            return Err(IeError::BufferTooShort {
                expected: len,
                actual: buf.remaining(),
            });
        }
        let mut data = vec![0u8; len];
        buf.copy_to_slice(&mut data);
        Ok(Self { data })
    }

    /// Encodes the 2-byte-length-prefixed value.
    pub fn encode<B: BufMut>(&self, buf: &mut B) {
        buf.put_u16(self.data.len() as u16);
        buf.put_slice(&self.data);
    }
}
