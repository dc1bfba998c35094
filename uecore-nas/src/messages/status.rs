//! 5GMM Status message (3GPP TS 24.501 Section 8.2.29)

use bytes::{Buf, BufMut};

use crate::cause::{CauseError, Ie5gMmCause, MmCause};
use crate::enums::MmMessageType;
use crate::header::PlainMmHeader;

/// 5GMM Status message.
///
/// Sent to report error conditions in the 5GMM sublayer; the authentication
/// core uses it for malformed EAP envelopes that are not method-specific
/// failures.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MmStatus {
    /// 5GMM cause (mandatory, Type 3)
    pub mm_cause: Ie5gMmCause,
}

impl MmStatus {
    /// Creates a status message with the given cause.
    pub fn new(cause: MmCause) -> Self {
        Self {
            mm_cause: Ie5gMmCause::new(cause),
        }
    }

    /// Decodes the body (after the header has been parsed).
    pub fn decode<B: Buf>(buf: &mut B) -> Result<Self, CauseError> {
        Ok(Self {
            mm_cause: Ie5gMmCause::decode(buf)?,
        })
    }

    /// Encodes the message including its header.
    pub fn encode<B: BufMut>(&self, buf: &mut B) {
        PlainMmHeader::new(MmMessageType::MmStatus).encode(buf);
        self.mm_cause.encode(buf);
    }

    /// The cause value.
    pub fn cause(&self) -> MmCause {
        self.mm_cause.value
    }
}
