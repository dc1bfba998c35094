//! ngKSI and NAS security-context types (3GPP TS 24.501 Section 9.11.3.32)
//!
//! Authentication produces a *partial native* security context: the ngKSI
//! assigned by the network, KAUSF, the ABBA parameter, and the keys derived
//! below KAUSF. The Security Mode Control procedure later promotes the
//! partial context to the current one; promotion is outside this crate.

use thiserror::Error;

/// Security-related decoding errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SecurityError {
    /// Invalid security context type value
    #[error("invalid security context type: {0}")]
    InvalidSecurityContextType(u8),
}

/// Type of security context (native or mapped from EPS).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum SecurityContextType {
    /// Native 5G security context
    #[default]
    Native = 0,
    /// Mapped security context
    Mapped = 1,
}

impl TryFrom<u8> for SecurityContextType {
    type Error = SecurityError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SecurityContextType::Native),
            1 => Ok(SecurityContextType::Mapped),
            _ => Err(SecurityError::InvalidSecurityContextType(value)),
        }
    }
}

/// NAS Key Set Identifier (ngKSI).
///
/// A half-octet pairing {TSC, KSI}; KSI value 7 means "no key available".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NasKeySetIdentifier {
    /// Type of security context
    pub tsc: SecurityContextType,
    /// Key set identifier (0-6, 7 = no key available)
    pub ksi: u8,
}

impl NasKeySetIdentifier {
    /// KSI value indicating no key is available
    pub const NO_KEY_AVAILABLE: u8 = 0x07;

    /// Creates a new ngKSI; the KSI is masked to 3 bits.
    pub fn new(tsc: SecurityContextType, ksi: u8) -> Self {
        Self {
            tsc,
            ksi: ksi & 0x07,
        }
    }

    /// Creates a "no key available" identifier.
    pub fn no_key() -> Self {
        Self {
            tsc: SecurityContextType::Native,
            ksi: Self::NO_KEY_AVAILABLE,
        }
    }

    /// Returns true if no key is available.
    pub fn is_no_key(&self) -> bool {
        self.ksi == Self::NO_KEY_AVAILABLE
    }

    /// Encodes to a half octet.
    pub fn encode(&self) -> u8 {
        ((self.tsc as u8) << 3) | (self.ksi & 0x07)
    }

    /// Decodes from a half octet.
    pub fn decode(value: u8) -> Result<Self, SecurityError> {
        let tsc = SecurityContextType::try_from((value >> 3) & 0x01)?;
        Ok(Self {
            tsc,
            ksi: value & 0x07,
        })
    }
}

/// Keys held by a NAS security context.
///
/// Hierarchy (TS 33.501):
///
/// ```text
/// CK, IK / EMSK / TLS EKM
///    └── KAUSF
///           └── KSEAF
///                  └── KAMF
///                         ├── KNASint
///                         └── KNASenc
/// ```
#[derive(Debug, Clone, Default)]
pub struct UeKeys {
    /// ABBA parameter, raw bytes as received from the network
    pub abba: Vec<u8>,
    /// KAUSF (256-bit)
    pub kausf: Option<[u8; 32]>,
    /// KSEAF (256-bit)
    pub kseaf: Option<[u8; 32]>,
    /// KAMF (256-bit)
    pub kamf: Option<[u8; 32]>,
    /// KNASint (128-bit)
    pub knas_int: Option<[u8; 16]>,
    /// KNASenc (128-bit)
    pub knas_enc: Option<[u8; 16]>,
}

impl UeKeys {
    /// Clears all keys, overwriting key material with zeros first.
    pub fn clear(&mut self) {
        for key in [&mut self.kausf, &mut self.kseaf, &mut self.kamf] {
            if let Some(k) = key {
                k.fill(0);
            }
            *key = None;
        }
        for key in [&mut self.knas_int, &mut self.knas_enc] {
            if let Some(k) = key {
                k.fill(0);
            }
            *key = None;
        }
        self.abba.clear();
    }
}

/// A NAS security context as staged by authentication.
#[derive(Debug, Clone, Default)]
pub struct NasSecurityContext {
    /// Type of the context
    pub tsc: SecurityContextType,
    /// Key set identifier assigned by the network
    pub ng_ksi: u8,
    /// Security keys
    pub keys: UeKeys,
}

impl NasSecurityContext {
    /// Creates a fresh context for the given ngKSI.
    pub fn new(tsc: SecurityContextType, ng_ksi: u8) -> Self {
        Self {
            tsc,
            ng_ksi: ng_ksi & 0x07,
            keys: UeKeys::default(),
        }
    }

    /// Derives KNASenc and KNASint from KAMF for the selected algorithm
    /// identifiers (TS 33.501 A.8).
    ///
    /// Called by the Security Mode Control procedure once the network has
    /// chosen the NAS algorithms; authentication itself stops at KAMF.
    /// Returns false when KAMF is not populated yet.
    pub fn derive_nas_keys(&mut self, ciphering_id: u8, integrity_id: u8) -> bool {
        let Some(kamf) = self.keys.kamf else {
            return false;
        };
        self.keys.knas_enc = Some(uecore_crypto::kdf::derive_knas_enc(&kamf, ciphering_id));
        self.keys.knas_int = Some(uecore_crypto::kdf::derive_knas_int(&kamf, integrity_id));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ksi_encode_decode() {
        let ksi = NasKeySetIdentifier::new(SecurityContextType::Native, 3);
        assert_eq!(ksi.encode(), 0x03);
        assert!(!ksi.is_no_key());

        let decoded = NasKeySetIdentifier::decode(0x0B).unwrap();
        assert_eq!(decoded.tsc, SecurityContextType::Mapped);
        assert_eq!(decoded.ksi, 3);
    }

    #[test]
    fn test_ksi_no_key() {
        let ksi = NasKeySetIdentifier::no_key();
        assert!(ksi.is_no_key());
        assert_eq!(ksi.encode(), 0x07);
    }

    #[test]
    fn test_ksi_masks_to_3_bits() {
        let ksi = NasKeySetIdentifier::new(SecurityContextType::Native, 0xFF);
        assert_eq!(ksi.ksi, 7);
    }

    #[test]
    fn test_keys_clear() {
        let mut keys = UeKeys {
            abba: vec![0x00, 0x00],
            kausf: Some([0xAA; 32]),
            kseaf: Some([0xBB; 32]),
            kamf: Some([0xCC; 32]),
            knas_int: Some([0xDD; 16]),
            knas_enc: Some([0xEE; 16]),
        };
        keys.clear();
        assert!(keys.kausf.is_none());
        assert!(keys.kamf.is_none());
        assert!(keys.knas_enc.is_none());
        assert!(keys.abba.is_empty());
    }

    #[test]
    fn test_context_new_masks_ksi() {
        let ctx = NasSecurityContext::new(SecurityContextType::Native, 9);
        assert_eq!(ctx.ng_ksi, 1);
    }

    #[test]
    fn test_derive_nas_keys_requires_kamf() {
        let mut ctx = NasSecurityContext::new(SecurityContextType::Native, 1);
        assert!(!ctx.derive_nas_keys(2, 2));

        ctx.keys.kamf = Some([0x55; 32]);
        assert!(ctx.derive_nas_keys(2, 2));
        assert!(ctx.keys.knas_enc.is_some());
        assert!(ctx.keys.knas_int.is_some());
        assert_ne!(ctx.keys.knas_enc, ctx.keys.knas_int);
    }
}
