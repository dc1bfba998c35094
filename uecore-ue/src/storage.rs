//! Mobility management storage
//!
//! Holds the identifiers the authentication-reject handling clears: the
//! stored 5G-GUTI, the TAI list and the last visited registered TAI.
//! Population of these fields belongs to the registration procedures, which
//! are outside this crate.

use uecore_common::types::{Guti5g, Tai};

/// Persisted MM identifiers touched by the authentication core.
#[derive(Debug, Default)]
pub struct MmStorage {
    /// Stored 5G-GUTI
    pub stored_guti: Option<Guti5g>,
    /// TAI list assigned by the network
    pub tai_list: Vec<Tai>,
    /// Last visited registered TAI
    pub last_visited_registered_tai: Option<Tai>,
}

impl MmStorage {
    /// Creates empty storage.
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uecore_common::types::Plmn;

    #[test]
    fn test_storage_default_empty() {
        let storage = MmStorage::new();
        assert!(storage.stored_guti.is_none());
        assert!(storage.tai_list.is_empty());
        assert!(storage.last_visited_registered_tai.is_none());
    }

    #[test]
    fn test_storage_holds_tai() {
        let mut storage = MmStorage::new();
        let tai = Tai::new(Plmn::new(1, 1, false), [0x00, 0x00, 0x01]);
        storage.tai_list.push(tai);
        storage.last_visited_registered_tai = Some(tai);
        assert_eq!(storage.tai_list.len(), 1);
    }
}
