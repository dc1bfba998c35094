//! Authentication message family (3GPP TS 24.501 Sections 8.2.1-8.2.5)
//!
//! - Authentication Request (network to UE)
//! - Authentication Response (UE to network)
//! - Authentication Reject (network to UE)
//! - Authentication Failure (UE to network)
//! - Authentication Result (network to UE)
//!
//! Unknown optional IEs are skipped on decode using the TLV length octet.

use bytes::{Buf, BufMut};
use thiserror::Error;

use crate::cause::{Ie5gMmCause, MmCause};
use crate::enums::MmMessageType;
use crate::header::PlainMmHeader;
use crate::ies::{
    Abba, AuthFailureParameter, AuthParamAutn, AuthParamRand, AuthResponseParameter, EapMessageIe,
    IeError,
};
use crate::security::NasKeySetIdentifier;

// Optional IE identifiers
const IEI_RAND: u8 = 0x21;
const IEI_AUTN: u8 = 0x20;
const IEI_AUTH_RESPONSE_PARAMETER: u8 = 0x2D;
const IEI_AUTH_FAILURE_PARAMETER: u8 = 0x30;
const IEI_ABBA: u8 = 0x38;
const IEI_EAP_MESSAGE: u8 = 0x78;

/// Error type for authentication message decoding
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthenticationError {
    /// Buffer too short for decoding
    #[error("buffer too short: expected at least {expected} bytes, got {actual}")]
    BufferTooShort {
        /// Expected minimum bytes
        expected: usize,
        /// Actual bytes available
        actual: usize,
    },
    /// Invalid IE value
    #[error("invalid IE value: {0}")]
    InvalidIeValue(String),
    /// IE decoding error
    #[error("IE error: {0}")]
    Ie(#[from] IeError),
}

impl From<crate::cause::CauseError> for AuthenticationError {
    fn from(e: crate::cause::CauseError) -> Self {
        AuthenticationError::InvalidIeValue(e.to_string())
    }
}

fn skip_unknown_ie<B: Buf>(buf: &mut B) {
    buf.advance(1);
    if buf.remaining() > 0 {
        let len = buf.chunk()[0] as usize;
        buf.advance(1);
        if buf.remaining() >= len {
            buf.advance(len);
        } else {
            let rest = buf.remaining();
            buf.advance(rest);
        }
    }
}

/// Authentication Request (network to UE; TS 24.501 Section 8.2.1)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticationRequest {
    /// ngKSI (mandatory, Type 1)
    pub ng_ksi: NasKeySetIdentifier,
    /// ABBA (mandatory, Type 4)
    pub abba: Abba,
    /// Authentication parameter RAND (optional, IEI 0x21)
    pub rand: Option<AuthParamRand>,
    /// Authentication parameter AUTN (optional, IEI 0x20)
    pub autn: Option<AuthParamAutn>,
    /// EAP message (optional, IEI 0x78)
    pub eap_message: Option<EapMessageIe>,
}

impl Default for AuthenticationRequest {
    fn default() -> Self {
        Self {
            ng_ksi: NasKeySetIdentifier::no_key(),
            abba: Abba::default(),
            rand: None,
            autn: None,
            eap_message: None,
        }
    }
}

impl AuthenticationRequest {
    /// Creates a request with the mandatory fields.
    pub fn new(ng_ksi: NasKeySetIdentifier, abba: Abba) -> Self {
        Self {
            ng_ksi,
            abba,
            ..Default::default()
        }
    }

    /// Creates a 5G-AKA request carrying RAND and AUTN.
    pub fn for_5g_aka(
        ng_ksi: NasKeySetIdentifier,
        abba: Abba,
        rand: [u8; 16],
        autn: Vec<u8>,
    ) -> Self {
        Self {
            ng_ksi,
            abba,
            rand: Some(AuthParamRand::new(rand)),
            autn: Some(AuthParamAutn::new(autn)),
            eap_message: None,
        }
    }

    /// Creates an EAP-based request carrying an encoded EAP packet.
    pub fn for_eap(ng_ksi: NasKeySetIdentifier, abba: Abba, eap: Vec<u8>) -> Self {
        Self {
            ng_ksi,
            abba,
            rand: None,
            autn: None,
            eap_message: Some(EapMessageIe::new(eap)),
        }
    }

    /// Decodes the body (after the header has been parsed).
    pub fn decode<B: Buf>(buf: &mut B) -> Result<Self, AuthenticationError> {
        if buf.remaining() < 1 {
            return Err(AuthenticationError::BufferTooShort {
                expected: 1,
                actual: buf.remaining(),
            });
        }

        // spare half octet + ngKSI
        let first = buf.get_u8();
        let ng_ksi = NasKeySetIdentifier::decode(first & 0x0F)
            .map_err(|e| AuthenticationError::InvalidIeValue(e.to_string()))?;

        let abba = Abba::decode(buf)?;
        let mut msg = Self::new(ng_ksi, abba);

        while buf.remaining() > 0 {
            match buf.chunk()[0] {
                IEI_RAND => {
                    buf.advance(1);
                    msg.rand = Some(AuthParamRand::decode(buf)?);
                }
                IEI_AUTN => {
                    buf.advance(1);
                    msg.autn = Some(AuthParamAutn::decode(buf)?);
                }
                IEI_EAP_MESSAGE => {
                    buf.advance(1);
                    msg.eap_message = Some(EapMessageIe::decode(buf)?);
                }
                _ => skip_unknown_ie(buf),
            }
        }

        Ok(msg)
    }

    /// Encodes the message including its header.
    pub fn encode<B: BufMut>(&self, buf: &mut B) {
        PlainMmHeader::new(MmMessageType::AuthenticationRequest).encode(buf);

        buf.put_u8(self.ng_ksi.encode() & 0x0F);
        self.abba.encode(buf);

        if let Some(ref rand) = self.rand {
            buf.put_u8(IEI_RAND);
            rand.encode(buf);
        }
        if let Some(ref autn) = self.autn {
            buf.put_u8(IEI_AUTN);
            autn.encode(buf);
        }
        if let Some(ref eap) = self.eap_message {
            buf.put_u8(IEI_EAP_MESSAGE);
            eap.encode(buf);
        }
    }
}

/// Authentication Response (UE to network; TS 24.501 Section 8.2.2)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthenticationResponse {
    /// Authentication response parameter (optional, IEI 0x2D)
    pub auth_response_parameter: Option<AuthResponseParameter>,
    /// EAP message (optional, IEI 0x78)
    pub eap_message: Option<EapMessageIe>,
}

impl AuthenticationResponse {
    /// Creates a 5G-AKA response carrying RES*.
    pub fn with_res_star(res_star: Vec<u8>) -> Self {
        Self {
            auth_response_parameter: Some(AuthResponseParameter::new(res_star)),
            eap_message: None,
        }
    }

    /// Creates an EAP response carrying an encoded EAP packet.
    pub fn with_eap(eap: Vec<u8>) -> Self {
        Self {
            auth_response_parameter: None,
            eap_message: Some(EapMessageIe::new(eap)),
        }
    }

    /// Decodes the body (after the header has been parsed).
    pub fn decode<B: Buf>(buf: &mut B) -> Result<Self, AuthenticationError> {
        let mut msg = Self::default();

        while buf.remaining() > 0 {
            match buf.chunk()[0] {
                IEI_AUTH_RESPONSE_PARAMETER => {
                    buf.advance(1);
                    msg.auth_response_parameter = Some(AuthResponseParameter::decode(buf)?);
                }
                IEI_EAP_MESSAGE => {
                    buf.advance(1);
                    msg.eap_message = Some(EapMessageIe::decode(buf)?);
                }
                _ => skip_unknown_ie(buf),
            }
        }

        Ok(msg)
    }

    /// Encodes the message including its header.
    pub fn encode<B: BufMut>(&self, buf: &mut B) {
        PlainMmHeader::new(MmMessageType::AuthenticationResponse).encode(buf);

        if let Some(ref param) = self.auth_response_parameter {
            buf.put_u8(IEI_AUTH_RESPONSE_PARAMETER);
            param.encode(buf);
        }
        if let Some(ref eap) = self.eap_message {
            buf.put_u8(IEI_EAP_MESSAGE);
            eap.encode(buf);
        }
    }
}

/// Authentication Reject (network to UE; TS 24.501 Section 8.2.3)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthenticationReject {
    /// EAP message (optional, IEI 0x78)
    pub eap_message: Option<EapMessageIe>,
}

impl AuthenticationReject {
    /// Creates a reject carrying an encoded EAP packet.
    pub fn with_eap(eap: Vec<u8>) -> Self {
        Self {
            eap_message: Some(EapMessageIe::new(eap)),
        }
    }

    /// Decodes the body (after the header has been parsed).
    pub fn decode<B: Buf>(buf: &mut B) -> Result<Self, AuthenticationError> {
        let mut msg = Self::default();

        while buf.remaining() > 0 {
            match buf.chunk()[0] {
                IEI_EAP_MESSAGE => {
                    buf.advance(1);
                    msg.eap_message = Some(EapMessageIe::decode(buf)?);
                }
                _ => skip_unknown_ie(buf),
            }
        }

        Ok(msg)
    }

    /// Encodes the message including its header.
    pub fn encode<B: BufMut>(&self, buf: &mut B) {
        PlainMmHeader::new(MmMessageType::AuthenticationReject).encode(buf);

        if let Some(ref eap) = self.eap_message {
            buf.put_u8(IEI_EAP_MESSAGE);
            eap.encode(buf);
        }
    }
}

/// Authentication Failure (UE to network; TS 24.501 Section 8.2.4)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthenticationFailure {
    /// 5GMM cause (mandatory, Type 3)
    pub mm_cause: Ie5gMmCause,
    /// Authentication failure parameter (optional, IEI 0x30)
    pub auth_failure_parameter: Option<AuthFailureParameter>,
}

impl AuthenticationFailure {
    /// Creates a failure with the given cause.
    pub fn with_cause(cause: MmCause) -> Self {
        Self {
            mm_cause: Ie5gMmCause::new(cause),
            auth_failure_parameter: None,
        }
    }

    /// Creates a synch-failure message carrying AUTS.
    pub fn synch_failure(auts: Vec<u8>) -> Self {
        Self {
            mm_cause: Ie5gMmCause::new(MmCause::SynchFailure),
            auth_failure_parameter: Some(AuthFailureParameter::new(auts)),
        }
    }

    /// Decodes the body (after the header has been parsed).
    pub fn decode<B: Buf>(buf: &mut B) -> Result<Self, AuthenticationError> {
        let mm_cause = Ie5gMmCause::decode(buf)?;
        let mut msg = Self {
            mm_cause,
            auth_failure_parameter: None,
        };

        while buf.remaining() > 0 {
            match buf.chunk()[0] {
                IEI_AUTH_FAILURE_PARAMETER => {
                    buf.advance(1);
                    msg.auth_failure_parameter = Some(AuthFailureParameter::decode(buf)?);
                }
                _ => skip_unknown_ie(buf),
            }
        }

        Ok(msg)
    }

    /// Encodes the message including its header.
    pub fn encode<B: BufMut>(&self, buf: &mut B) {
        PlainMmHeader::new(MmMessageType::AuthenticationFailure).encode(buf);

        self.mm_cause.encode(buf);
        if let Some(ref param) = self.auth_failure_parameter {
            buf.put_u8(IEI_AUTH_FAILURE_PARAMETER);
            param.encode(buf);
        }
    }
}

/// Authentication Result (network to UE; TS 24.501 Section 8.2.5)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticationResult {
    /// ngKSI (mandatory, Type 1)
    pub ng_ksi: NasKeySetIdentifier,
    /// EAP message (mandatory, Type 6)
    pub eap_message: EapMessageIe,
    /// ABBA (optional, IEI 0x38)
    pub abba: Option<Abba>,
}

impl AuthenticationResult {
    /// Creates a result with the mandatory fields.
    pub fn new(ng_ksi: NasKeySetIdentifier, eap: Vec<u8>) -> Self {
        Self {
            ng_ksi,
            eap_message: EapMessageIe::new(eap),
            abba: None,
        }
    }

    /// Decodes the body (after the header has been parsed).
    pub fn decode<B: Buf>(buf: &mut B) -> Result<Self, AuthenticationError> {
        if buf.remaining() < 1 {
            return Err(AuthenticationError::BufferTooShort {
                expected: 1,
                actual: buf.remaining(),
            });
        }

        let first = buf.get_u8();
        let ng_ksi = NasKeySetIdentifier::decode(first & 0x0F)
            .map_err(|e| AuthenticationError::InvalidIeValue(e.to_string()))?;
        let eap_message = EapMessageIe::decode(buf)?;

        let mut msg = Self {
            ng_ksi,
            eap_message,
            abba: None,
        };

        while buf.remaining() > 0 {
            match buf.chunk()[0] {
                IEI_ABBA => {
                    buf.advance(1);
                    msg.abba = Some(Abba::decode(buf)?);
                }
                _ => skip_unknown_ie(buf),
            }
        }

        Ok(msg)
    }

    /// Encodes the message including its header.
    pub fn encode<B: BufMut>(&self, buf: &mut B) {
        PlainMmHeader::new(MmMessageType::AuthenticationResult).encode(buf);

        buf.put_u8(self.ng_ksi.encode() & 0x0F);
        self.eap_message.encode(buf);

        if let Some(ref abba) = self.abba {
            buf.put_u8(IEI_ABBA);
            abba.encode(buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::SecurityContextType;

    #[test]
    fn test_request_5g_aka_roundtrip() {
        let ng_ksi = NasKeySetIdentifier::new(SecurityContextType::Native, 2);
        let msg = AuthenticationRequest::for_5g_aka(
            ng_ksi,
            Abba::new(vec![0x00, 0x00]),
            [0xAA; 16],
            vec![0xBB; 16],
        );

        let mut buf = Vec::new();
        msg.encode(&mut buf);
        assert_eq!(&buf[..3], &[0x7E, 0x00, 0x56]);

        let decoded = AuthenticationRequest::decode(&mut buf[3..].as_ref()).unwrap();
        assert_eq!(decoded.ng_ksi.ksi, 2);
        assert_eq!(decoded.rand.unwrap().value, [0xAA; 16]);
        assert_eq!(decoded.autn.unwrap().value, vec![0xBB; 16]);
        assert!(decoded.eap_message.is_none());
    }

    #[test]
    fn test_request_eap_roundtrip() {
        let ng_ksi = NasKeySetIdentifier::new(SecurityContextType::Native, 3);
        let eap_data = vec![0x01, 0x01, 0x00, 0x04];
        let msg = AuthenticationRequest::for_eap(ng_ksi, Abba::default(), eap_data.clone());

        let mut buf = Vec::new();
        msg.encode(&mut buf);

        let decoded = AuthenticationRequest::decode(&mut buf[3..].as_ref()).unwrap();
        assert!(decoded.rand.is_none());
        assert_eq!(decoded.eap_message.unwrap().data, eap_data);
    }

    #[test]
    fn test_request_skips_unknown_ie() {
        let ng_ksi = NasKeySetIdentifier::new(SecurityContextType::Native, 1);
        let msg = AuthenticationRequest::new(ng_ksi, Abba::default());

        let mut buf = Vec::new();
        msg.encode(&mut buf);
        // append an unknown TLV IE
        buf.extend_from_slice(&[0x55, 0x02, 0xDE, 0xAD]);

        let decoded = AuthenticationRequest::decode(&mut buf[3..].as_ref()).unwrap();
        assert_eq!(decoded.ng_ksi.ksi, 1);
    }

    #[test]
    fn test_response_res_star_roundtrip() {
        let msg = AuthenticationResponse::with_res_star(vec![0x11; 16]);
        let mut buf = Vec::new();
        msg.encode(&mut buf);
        assert_eq!(&buf[..3], &[0x7E, 0x00, 0x57]);

        let decoded = AuthenticationResponse::decode(&mut buf[3..].as_ref()).unwrap();
        assert_eq!(
            decoded.auth_response_parameter.unwrap().value,
            vec![0x11; 16]
        );
    }

    #[test]
    fn test_reject_roundtrip() {
        let msg = AuthenticationReject::default();
        let mut buf = Vec::new();
        msg.encode(&mut buf);
        assert_eq!(buf, vec![0x7E, 0x00, 0x58]);

        let with_eap = AuthenticationReject::with_eap(vec![0x04, 0x01, 0x00, 0x04]);
        let mut buf = Vec::new();
        with_eap.encode(&mut buf);
        let decoded = AuthenticationReject::decode(&mut buf[3..].as_ref()).unwrap();
        assert_eq!(decoded.eap_message.unwrap().data, vec![0x04, 0x01, 0x00, 0x04]);
    }

    #[test]
    fn test_failure_mac_failure() {
        let msg = AuthenticationFailure::with_cause(MmCause::MacFailure);
        let mut buf = Vec::new();
        msg.encode(&mut buf);
        assert_eq!(buf, vec![0x7E, 0x00, 0x59, 20]);

        let decoded = AuthenticationFailure::decode(&mut buf[3..].as_ref()).unwrap();
        assert_eq!(decoded.mm_cause.value, MmCause::MacFailure);
        assert!(decoded.auth_failure_parameter.is_none());
    }

    #[test]
    fn test_failure_synch_with_auts() {
        let msg = AuthenticationFailure::synch_failure(vec![0x44; 14]);
        let mut buf = Vec::new();
        msg.encode(&mut buf);

        let decoded = AuthenticationFailure::decode(&mut buf[3..].as_ref()).unwrap();
        assert_eq!(decoded.mm_cause.value, MmCause::SynchFailure);
        assert_eq!(decoded.auth_failure_parameter.unwrap().value, vec![0x44; 14]);
    }

    #[test]
    fn test_result_with_abba_roundtrip() {
        let ng_ksi = NasKeySetIdentifier::new(SecurityContextType::Native, 5);
        let mut msg = AuthenticationResult::new(ng_ksi, vec![0x03, 0x01, 0x00, 0x04]);
        msg.abba = Some(Abba::new(vec![0x00, 0x01]));

        let mut buf = Vec::new();
        msg.encode(&mut buf);
        assert_eq!(&buf[..3], &[0x7E, 0x00, 0x5A]);

        let decoded = AuthenticationResult::decode(&mut buf[3..].as_ref()).unwrap();
        assert_eq!(decoded.ng_ksi.ksi, 5);
        assert_eq!(decoded.eap_message.data, vec![0x03, 0x01, 0x00, 0x04]);
        assert_eq!(decoded.abba.unwrap().value, vec![0x00, 0x01]);
    }
}
