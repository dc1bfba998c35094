//! 5GMM cause values (3GPP TS 24.501 Section 9.11.3.2)

use bytes::{Buf, BufMut};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use thiserror::Error;

/// Error type for 5GMM cause decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CauseError {
    /// Buffer too short for decoding
    #[error("buffer too short decoding 5GMM cause")]
    BufferTooShort,
    /// Unknown cause value
    #[error("unknown 5GMM cause value: {0}")]
    UnknownCause(u8),
}

/// 5GMM cause values used by the mobility management procedures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive, Default)]
#[repr(u8)]
pub enum MmCause {
    /// Illegal UE
    IllegalUe = 3,
    /// Illegal ME
    IllegalMe = 6,
    /// 5GS services not allowed
    FiveGsServicesNotAllowed = 7,
    /// UE identity cannot be derived by the network
    UeIdentityCannotBeDerived = 9,
    /// Implicitly de-registered
    ImplicitlyDeregistered = 10,
    /// PLMN not allowed
    PlmnNotAllowed = 11,
    /// MAC failure
    MacFailure = 20,
    /// Synch failure
    SynchFailure = 21,
    /// Congestion
    Congestion = 22,
    /// Non-5G authentication unacceptable
    Non5gAuthenticationUnacceptable = 26,
    /// ngKSI already in use
    NgKsiAlreadyInUse = 71,
    /// Semantically incorrect message
    SemanticallyIncorrectMessage = 95,
    /// Invalid mandatory information
    InvalidMandatoryInformation = 96,
    /// Message type non-existent or not implemented
    MessageTypeNonExistent = 97,
    /// Information element non-existent or not implemented
    IeNonExistent = 99,
    /// Message not compatible with the protocol state
    MessageNotCompatible = 101,
    /// Protocol error, unspecified
    #[default]
    ProtocolErrorUnspecified = 111,
}

/// 5GMM Cause IE (Type 3 - 1 byte)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ie5gMmCause {
    /// The cause value
    pub value: MmCause,
}

impl Ie5gMmCause {
    /// Creates a new cause IE.
    pub fn new(value: MmCause) -> Self {
        Self { value }
    }

    /// Decodes the cause from a single octet.
    pub fn decode<B: Buf>(buf: &mut B) -> Result<Self, CauseError> {
        if buf.remaining() < 1 {
            return Err(CauseError::BufferTooShort);
        }
        let raw = buf.get_u8();
        let value = MmCause::try_from(raw).map_err(|_| CauseError::UnknownCause(raw))?;
        Ok(Self { value })
    }

    /// Encodes the cause as a single octet.
    pub fn encode<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(self.value.into());
    }
}
