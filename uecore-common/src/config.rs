//! UE configuration
//!
//! Configuration is read from YAML. The recognised options cover the USIM
//! credentials (K, OP/OPc, AMF, SUPI) and the EAP-TLS client material.
//! Binary keys are written as hex strings in the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Plmn, Supi};

/// Errors raised while loading or validating a UE configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O error
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),
    /// YAML parsing error
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
    /// Semantic validation error
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

/// Type of the configured operator key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum OpType {
    /// Operator variant key, OPc must be derived with K first
    Op,
    /// Pre-computed OPc
    #[default]
    Opc,
}

/// UE configuration.
///
/// Read-only during an authentication procedure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UeConfig {
    /// Subscription Permanent Identifier
    pub supi: Option<Supi>,
    /// Home PLMN
    pub hplmn: Plmn,
    /// Subscriber key K (128-bit)
    #[serde(with = "hex_array")]
    pub key: [u8; 16],
    /// Operator key OP or OPc (128-bit)
    #[serde(with = "hex_array")]
    pub op: [u8; 16],
    /// Discriminator for the operator key
    #[serde(default)]
    pub op_type: OpType,
    /// Authentication Management Field (16-bit)
    #[serde(with = "hex_array")]
    pub amf: [u8; 2],
    /// CA certificate bundle for EAP-TLS peer verification
    #[serde(default)]
    pub ca_certificate: Option<PathBuf>,
    /// Client certificate chain for EAP-TLS
    #[serde(default)]
    pub client_certificate: Option<PathBuf>,
    /// Client private key for EAP-TLS (PKCS#8, optionally encrypted)
    #[serde(default)]
    pub client_private_key: Option<PathBuf>,
    /// Passphrase for an encrypted client private key
    #[serde(default)]
    pub client_password: Option<String>,
}

impl UeConfig {
    /// Loads a UE configuration from a YAML file and validates it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parses a UE configuration from a YAML string and validates it.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: UeConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hplmn.mcc == 0 || self.hplmn.mcc > 999 {
            return Err(ConfigError::Validation(format!(
                "invalid HPLMN MCC: {}",
                self.hplmn.mcc
            )));
        }
        if self.hplmn.mnc > 999 {
            return Err(ConfigError::Validation(format!(
                "invalid HPLMN MNC: {}",
                self.hplmn.mnc
            )));
        }
        if self.key.iter().all(|&b| b == 0) {
            return Err(ConfigError::Validation(
                "subscriber key K must not be all zeros".into(),
            ));
        }
        Ok(())
    }
}

/// Serde adapter encoding fixed-size byte arrays as hex strings.
mod hex_array {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer, const N: usize>(
        value: &[u8; N],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut s = String::with_capacity(N * 2);
        for b in value {
            s.push_str(&format!("{b:02x}"));
        }
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>, const N: usize>(
        deserializer: D,
    ) -> Result<[u8; N], D::Error> {
        let s = String::deserialize(deserializer)?;
        let s: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        if !s.is_ascii() {
            return Err(D::Error::custom("expected a hex string"));
        }
        if s.len() != N * 2 {
            return Err(D::Error::custom(format!(
                "expected {} hex digits, got {}",
                N * 2,
                s.len()
            )));
        }
        let mut out = [0u8; N];
        for (i, chunk) in out.iter_mut().enumerate() {
            *chunk = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16)
                .map_err(|e| D::Error::custom(format!("invalid hex: {e}")))?;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
supi: imsi-001010000000001
hplmn:
  mcc: 1
  mnc: 1
  long_mnc: false
key: 465b5ce8b199b49faa5f0a2ee238a6bc
op: cd63cb71954a9f4e48a5994e37a02baf
op_type: OPC
amf: "8000"
"#;

    #[test]
    fn test_load_from_yaml() {
        let config = UeConfig::from_yaml(SAMPLE).unwrap();
        assert_eq!(config.supi.as_ref().unwrap().value, "001010000000001");
        assert_eq!(config.hplmn, Plmn::new(1, 1, false));
        assert_eq!(config.key[0], 0x46);
        assert_eq!(config.key[15], 0xbc);
        assert_eq!(config.op_type, OpType::Opc);
        assert_eq!(config.amf, [0x80, 0x00]);
        assert!(config.ca_certificate.is_none());
    }

    #[test]
    fn test_rejects_zero_key() {
        let yaml = SAMPLE.replace(
            "465b5ce8b199b49faa5f0a2ee238a6bc",
            "00000000000000000000000000000000",
        );
        assert!(matches!(
            UeConfig::from_yaml(&yaml),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_rejects_short_hex() {
        let yaml = SAMPLE.replace("465b5ce8b199b49faa5f0a2ee238a6bc", "465b");
        assert!(matches!(UeConfig::from_yaml(&yaml), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_hex_roundtrip() {
        let config = UeConfig::from_yaml(SAMPLE).unwrap();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let reparsed = UeConfig::from_yaml(&yaml).unwrap();
        assert_eq!(reparsed.key, config.key);
        assert_eq!(reparsed.amf, config.amf);
    }
}
