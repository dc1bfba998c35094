//! NAS (Non-Access Stratum) protocol support for uecore
//!
//! Provides the 5GMM message family used by the authentication procedure
//! (3GPP TS 24.501 Sections 8.2.1-8.2.5 and 8.2.29), the EAP envelope
//! (RFC 3748 / 4187 / 5448 / 5216) carried inside those messages, and the
//! ngKSI / NAS security-context types shared with the UE core.
//!
//! Messages consist of a plain 5GMM header followed by information
//! elements; encoding and decoding run over `bytes` buffers.

pub mod cause;
pub mod eap;
pub mod enums;
pub mod header;
pub mod ies;
pub mod messages;
pub mod security;

pub use cause::{Ie5gMmCause, MmCause};
pub use enums::{ExtendedProtocolDiscriminator, MmMessageType, SecurityHeaderType};
pub use header::{HeaderError, PlainMmHeader};
pub use messages::{
    AuthenticationFailure, AuthenticationReject, AuthenticationRequest, AuthenticationResponse,
    AuthenticationResult, MmStatus, UplinkMmMessage,
};
pub use security::{NasKeySetIdentifier, NasSecurityContext, SecurityContextType, UeKeys};
