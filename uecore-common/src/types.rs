//! Core 5G identifiers: PLMN, SUPI, TAI, 5G-GUTI.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Public Land Mobile Network identifier.
///
/// A PLMN consists of a 3-digit MCC and a 2- or 3-digit MNC. The `long_mnc`
/// flag records whether the MNC uses 3 digits, which matters both for the
/// wire encoding and for the serving network name construction.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Plmn {
    /// Mobile Country Code (3 digits, 001-999)
    pub mcc: u16,
    /// Mobile Network Code (2-3 digits)
    pub mnc: u16,
    /// True if the MNC is 3 digits
    pub long_mnc: bool,
}

impl Plmn {
    /// Creates a new PLMN.
    pub const fn new(mcc: u16, mnc: u16, long_mnc: bool) -> Self {
        Self { mcc, mnc, long_mnc }
    }

    /// Returns true if this PLMN carries a usable value.
    pub fn has_value(&self) -> bool {
        self.mcc > 0 || self.mnc > 0
    }
}

impl fmt::Debug for Plmn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.long_mnc {
            write!(f, "Plmn({:03}-{:03})", self.mcc, self.mnc)
        } else {
            write!(f, "Plmn({:03}-{:02})", self.mcc, self.mnc)
        }
    }
}

impl fmt::Display for Plmn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.long_mnc {
            write!(f, "{:03}{:03}", self.mcc, self.mnc)
        } else {
            write!(f, "{:03}{:02}", self.mcc, self.mnc)
        }
    }
}

/// SUPI type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SupiType {
    /// IMSI-based SUPI
    Imsi,
}

/// Subscription Permanent Identifier.
///
/// Textual form is `imsi-<digits>`. The full textual form is what gets bound
/// into the KAMF derivation and the EAP-AKA' master key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Supi {
    /// Type of the identifier
    pub supi_type: SupiType,
    /// Identifier digits (without the scheme prefix)
    pub value: String,
}

impl Supi {
    /// Creates an IMSI-based SUPI from its digits.
    pub fn imsi(digits: impl Into<String>) -> Self {
        Self {
            supi_type: SupiType::Imsi,
            value: digits.into(),
        }
    }
}

impl fmt::Display for Supi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.supi_type {
            SupiType::Imsi => write!(f, "imsi-{}", self.value),
        }
    }
}

impl TryFrom<String> for Supi {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.strip_prefix("imsi-") {
            Some(digits) if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
                Ok(Supi::imsi(digits))
            }
            _ => Err(format!("invalid SUPI: {s}")),
        }
    }
}

impl From<Supi> for String {
    fn from(supi: Supi) -> String {
        supi.to_string()
    }
}

/// Tracking Area Identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tai {
    /// PLMN of the tracking area
    pub plmn: Plmn,
    /// Tracking Area Code (24-bit)
    pub tac: [u8; 3],
}

impl Tai {
    /// Creates a new TAI.
    pub const fn new(plmn: Plmn, tac: [u8; 3]) -> Self {
        Self { plmn, tac }
    }
}

/// 5G Globally Unique Temporary Identifier.
///
/// The authentication core never derives or encodes a GUTI; it only clears
/// the stored one on Authentication Reject, so the representation stays
/// minimal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Guti5g {
    /// PLMN of the assigning AMF
    pub plmn: Plmn,
    /// AMF Region ID
    pub amf_region_id: u8,
    /// AMF Set ID (10-bit)
    pub amf_set_id: u16,
    /// AMF Pointer (6-bit)
    pub amf_pointer: u8,
    /// 5G-TMSI
    pub tmsi: u32,
}
