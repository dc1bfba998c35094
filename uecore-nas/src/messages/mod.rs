//! 5GMM message definitions used by the authentication procedure

mod authentication;
mod status;

pub use authentication::{
    AuthenticationError, AuthenticationFailure, AuthenticationReject, AuthenticationRequest,
    AuthenticationResponse, AuthenticationResult,
};
pub use status::MmStatus;

use bytes::BufMut;

/// An uplink 5GMM message the authentication core can emit.
///
/// Each processed downlink message produces at most one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UplinkMmMessage {
    /// Authentication Response
    AuthenticationResponse(AuthenticationResponse),
    /// Authentication Failure
    AuthenticationFailure(AuthenticationFailure),
    /// 5GMM Status
    Status(MmStatus),
}

impl UplinkMmMessage {
    /// Encodes the message including its plain 5GMM header.
    pub fn encode<B: BufMut>(&self, buf: &mut B) {
        match self {
            UplinkMmMessage::AuthenticationResponse(msg) => msg.encode(buf),
            UplinkMmMessage::AuthenticationFailure(msg) => msg.encode(buf),
            UplinkMmMessage::Status(msg) => msg.encode(buf),
        }
    }

    /// Encodes the message into a new vector.
    pub fn encode_to_vec(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.encode(&mut buf);
        buf
    }
}
