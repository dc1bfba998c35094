//! USIM model and sequence number management
//!
//! The [`Usim`] aggregate holds the state the authentication procedures read
//! and write: the volatile RAND/RES* pair, the two NAS security-context
//! slots, the validity flag and the SQN manager. The core is the sole
//! writer of these fields while it processes a message.
//!
//! SQN freshness policy (3GPP TS 33.102 Annex C) lives behind the
//! [`SequenceNumberManager`] trait so the procedures stay unaware of the
//! Δ-window details.

use uecore_nas::security::NasSecurityContext;

/// SQN freshness oracle of the USIM.
///
/// `check_sqn` both answers whether a received SQN is acceptable and updates
/// the stored SQN according to the resynchronisation policy.
pub trait SequenceNumberManager {
    /// The current SQN_MS value.
    fn sqn(&self) -> [u8; 6];

    /// Verifies that `received` is in the correct range, advancing the
    /// stored SQN when it is.
    fn check_sqn(&mut self, received: &[u8; 6]) -> bool;
}

/// Default SQN manager with a Δ-window acceptance policy.
///
/// A received SQN is accepted when it is strictly greater than SQN_MS and
/// no more than Δ ahead (TS 33.102 C.2 with the array mechanism collapsed
/// to a single counter). On acceptance the stored SQN advances to the
/// received value.
#[derive(Debug, Clone)]
pub struct UsimSqnManager {
    sqn: u64,
}

impl UsimSqnManager {
    /// Δ window: maximum jump accepted ahead of SQN_MS (2^28).
    pub const DELTA: u64 = 1 << 28;

    /// Creates a manager with the given starting SQN.
    pub fn new(sqn: [u8; 6]) -> Self {
        Self {
            sqn: sqn_to_u64(&sqn),
        }
    }
}

fn sqn_to_u64(sqn: &[u8; 6]) -> u64 {
    let mut value = 0u64;
    for &b in sqn {
        value = (value << 8) | b as u64;
    }
    value
}

fn sqn_from_u64(value: u64) -> [u8; 6] {
    let mut sqn = [0u8; 6];
    for i in 0..6 {
        sqn[5 - i] = ((value >> (8 * i)) & 0xFF) as u8;
    }
    sqn
}

impl SequenceNumberManager for UsimSqnManager {
    fn sqn(&self) -> [u8; 6] {
        sqn_from_u64(self.sqn)
    }

    fn check_sqn(&mut self, received: &[u8; 6]) -> bool {
        let received = sqn_to_u64(received);
        if received <= self.sqn || received - self.sqn > Self::DELTA {
            return false;
        }
        self.sqn = received;
        true
    }
}

/// USIM state owned by the UE.
pub struct Usim {
    valid: bool,
    /// SQN manager (freshness policy)
    pub sqn_mng: Box<dyn SequenceNumberManager + Send>,
    /// Last accepted RAND challenge
    pub rand: Option<[u8; 16]>,
    /// Last computed 5G-AKA RES*
    pub res_star: Option<Vec<u8>>,
    /// Current (promoted) NAS security context
    pub current_ns_ctx: Option<NasSecurityContext>,
    /// Partial native context staged by authentication
    pub non_current_ns_ctx: Option<NasSecurityContext>,
}

impl Usim {
    /// Creates a valid USIM around the given SQN manager.
    pub fn new(sqn_mng: Box<dyn SequenceNumberManager + Send>) -> Self {
        Self {
            valid: true,
            sqn_mng,
            rand: None,
            res_star: None,
            current_ns_ctx: None,
            non_current_ns_ctx: None,
        }
    }

    /// Whether the USIM is usable.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Marks the USIM invalid until power-off or UICC removal.
    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    /// Clears the volatile RAND/RES* pair.
    pub fn clear_volatile(&mut self) {
        self.rand = None;
        self.res_star = None;
    }
}

impl std::fmt::Debug for Usim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Usim")
            .field("valid", &self.valid)
            .field("rand", &self.rand.map(|_| "<set>"))
            .field("res_star", &self.res_star.as_ref().map(|_| "<set>"))
            .field("current_ns_ctx", &self.current_ns_ctx.is_some())
            .field("non_current_ns_ctx", &self.non_current_ns_ctx.is_some())
            .finish()
    }
}
