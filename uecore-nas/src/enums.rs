//! NAS protocol enumerations (3GPP TS 24.501 Section 9)

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Extended Protocol Discriminator (TS 24.007 Section 11.2.3.1A)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum ExtendedProtocolDiscriminator {
    /// 5GS Session Management
    SessionManagement = 0x2E,
    /// 5GS Mobility Management
    MobilityManagement = 0x7E,
}

/// Security header type (TS 24.501 Section 9.3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive, Default)]
#[repr(u8)]
pub enum SecurityHeaderType {
    /// Plain NAS message, not security protected
    #[default]
    NotProtected = 0x00,
    /// Integrity protected
    IntegrityProtected = 0x01,
    /// Integrity protected and ciphered
    IntegrityProtectedAndCiphered = 0x02,
    /// Integrity protected with new 5G NAS security context
    IntegrityProtectedWithNewContext = 0x03,
    /// Integrity protected and ciphered with new 5G NAS security context
    IntegrityProtectedAndCipheredWithNewContext = 0x04,
}

/// 5GMM message types handled by this crate (TS 24.501 Section 9.7)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum MmMessageType {
    /// Authentication Request (network to UE)
    AuthenticationRequest = 0x56,
    /// Authentication Response (UE to network)
    AuthenticationResponse = 0x57,
    /// Authentication Reject (network to UE)
    AuthenticationReject = 0x58,
    /// Authentication Failure (UE to network)
    AuthenticationFailure = 0x59,
    /// Authentication Result (network to UE)
    AuthenticationResult = 0x5A,
    /// 5GMM Status
    MmStatus = 0x64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epd_values() {
        assert_eq!(u8::from(ExtendedProtocolDiscriminator::MobilityManagement), 0x7E);
        assert!(ExtendedProtocolDiscriminator::try_from(0x7Eu8).is_ok());
        assert!(ExtendedProtocolDiscriminator::try_from(0x00u8).is_err());
    }

    #[test]
    fn test_message_type_values() {
        assert_eq!(u8::from(MmMessageType::AuthenticationRequest), 0x56);
        assert_eq!(u8::from(MmMessageType::MmStatus), 0x64);
        assert!(MmMessageType::try_from(0x41u8).is_err());
    }
}
