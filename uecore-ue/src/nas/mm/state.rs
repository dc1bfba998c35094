//! MM state machine (3GPP TS 24.501 Section 5.1.3)
//!
//! Tracks the RM, CM and MM states plus the 5GS update status (U-state).
//! The authentication core drives only a corner of this machine: on
//! Authentication Reject the UE enters `5GMM-DEREGISTERED.PLMN-SEARCH` with
//! update status `U3 ROAMING NOT ALLOWED`.

use std::fmt;

/// Registration Management state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RmState {
    /// RM-DEREGISTERED
    #[default]
    Deregistered,
    /// RM-REGISTERED
    Registered,
}

impl fmt::Display for RmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RmState::Deregistered => write!(f, "RM-DEREGISTERED"),
            RmState::Registered => write!(f, "RM-REGISTERED"),
        }
    }
}

/// Connection Management state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CmState {
    /// CM-IDLE: no NAS signalling connection
    #[default]
    Idle,
    /// CM-CONNECTED: NAS signalling connection established
    Connected,
}

impl fmt::Display for CmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CmState::Idle => write!(f, "CM-IDLE"),
            CmState::Connected => write!(f, "CM-CONNECTED"),
        }
    }
}

/// Main MM state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MmState {
    /// 5GMM-NULL
    Null,
    /// 5GMM-DEREGISTERED
    #[default]
    Deregistered,
    /// 5GMM-REGISTERED-INITIATED
    RegisteredInitiated,
    /// 5GMM-REGISTERED
    Registered,
    /// 5GMM-DEREGISTERED-INITIATED
    DeregisteredInitiated,
    /// 5GMM-SERVICE-REQUEST-INITIATED
    ServiceRequestInitiated,
}

/// MM sub-state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MmSubState {
    /// 5GMM-NULL
    Null,
    /// 5GMM-DEREGISTERED (primary substate)
    #[default]
    Deregistered,
    /// 5GMM-DEREGISTERED.NORMAL-SERVICE
    DeregisteredNormalService,
    /// 5GMM-DEREGISTERED.LIMITED-SERVICE
    DeregisteredLimitedService,
    /// 5GMM-DEREGISTERED.ATTEMPTING-REGISTRATION
    DeregisteredAttemptingRegistration,
    /// 5GMM-DEREGISTERED.PLMN-SEARCH
    DeregisteredPlmnSearch,
    /// 5GMM-DEREGISTERED.NO-SUPI
    DeregisteredNoSupi,
    /// 5GMM-REGISTERED-INITIATED
    RegisteredInitiated,
    /// 5GMM-REGISTERED (primary substate)
    Registered,
    /// 5GMM-REGISTERED.NORMAL-SERVICE
    RegisteredNormalService,
    /// 5GMM-REGISTERED.LIMITED-SERVICE
    RegisteredLimitedService,
    /// 5GMM-REGISTERED.PLMN-SEARCH
    RegisteredPlmnSearch,
    /// 5GMM-DEREGISTERED-INITIATED
    DeregisteredInitiated,
    /// 5GMM-SERVICE-REQUEST-INITIATED
    ServiceRequestInitiated,
}

impl MmSubState {
    /// The main MM state this sub-state belongs to.
    pub fn main_state(&self) -> MmState {
        match self {
            MmSubState::Null => MmState::Null,
            MmSubState::Deregistered
            | MmSubState::DeregisteredNormalService
            | MmSubState::DeregisteredLimitedService
            | MmSubState::DeregisteredAttemptingRegistration
            | MmSubState::DeregisteredPlmnSearch
            | MmSubState::DeregisteredNoSupi => MmState::Deregistered,
            MmSubState::RegisteredInitiated => MmState::RegisteredInitiated,
            MmSubState::Registered
            | MmSubState::RegisteredNormalService
            | MmSubState::RegisteredLimitedService
            | MmSubState::RegisteredPlmnSearch => MmState::Registered,
            MmSubState::DeregisteredInitiated => MmState::DeregisteredInitiated,
            MmSubState::ServiceRequestInitiated => MmState::ServiceRequestInitiated,
        }
    }
}

/// 5GS update status (U-state).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateStatus {
    /// U1 UPDATED
    #[default]
    Updated,
    /// U2 NOT UPDATED
    NotUpdated,
    /// U3 ROAMING NOT ALLOWED
    RoamingNotAllowed,
}

impl fmt::Display for UpdateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateStatus::Updated => write!(f, "U1-UPDATED"),
            UpdateStatus::NotUpdated => write!(f, "U2-NOT-UPDATED"),
            UpdateStatus::RoamingNotAllowed => write!(f, "U3-ROAMING-NOT-ALLOWED"),
        }
    }
}

/// MM state machine manager.
#[derive(Debug, Clone, Default)]
pub struct MmStateMachine {
    rm_state: RmState,
    cm_state: CmState,
    mm_state: MmState,
    mm_substate: MmSubState,
    update_status: UpdateStatus,
}

impl MmStateMachine {
    /// Creates the machine in its initial states: RM-DEREGISTERED, CM-IDLE,
    /// 5GMM-DEREGISTERED, U1-UPDATED.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current RM state.
    pub fn rm_state(&self) -> RmState {
        self.rm_state
    }

    /// Current CM state.
    pub fn cm_state(&self) -> CmState {
        self.cm_state
    }

    /// Current MM state.
    pub fn mm_state(&self) -> MmState {
        self.mm_state
    }

    /// Current MM sub-state.
    pub fn mm_substate(&self) -> MmSubState {
        self.mm_substate
    }

    /// Current update status.
    pub fn update_status(&self) -> UpdateStatus {
        self.update_status
    }

    /// True when a NAS signalling connection is up.
    pub fn is_connected(&self) -> bool {
        self.cm_state == CmState::Connected
    }

    /// Switches the MM sub-state; the main state and RM state follow.
    pub fn switch_mm_state(&mut self, substate: MmSubState) {
        let new_state = substate.main_state();
        self.rm_state = match new_state {
            MmState::Null | MmState::Deregistered | MmState::RegisteredInitiated => {
                RmState::Deregistered
            }
            MmState::Registered
            | MmState::ServiceRequestInitiated
            | MmState::DeregisteredInitiated => RmState::Registered,
        };
        self.mm_state = new_state;
        self.mm_substate = substate;
    }

    /// Switches the CM state.
    pub fn switch_cm_state(&mut self, state: CmState) {
        self.cm_state = state;
    }

    /// Switches the update status.
    pub fn switch_update_status(&mut self, status: UpdateStatus) {
        self.update_status = status;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let sm = MmStateMachine::new();
        assert_eq!(sm.rm_state(), RmState::Deregistered);
        assert_eq!(sm.cm_state(), CmState::Idle);
        assert_eq!(sm.mm_substate(), MmSubState::Deregistered);
        assert_eq!(sm.update_status(), UpdateStatus::Updated);
    }

    #[test]
    fn test_substate_main_state() {
        assert_eq!(
            MmSubState::DeregisteredPlmnSearch.main_state(),
            MmState::Deregistered
        );
        assert_eq!(
            MmSubState::RegisteredNormalService.main_state(),
            MmState::Registered
        );
    }

    #[test]
    fn test_rm_follows_mm() {
        let mut sm = MmStateMachine::new();

        sm.switch_mm_state(MmSubState::RegisteredNormalService);
        assert_eq!(sm.rm_state(), RmState::Registered);

        sm.switch_mm_state(MmSubState::DeregisteredPlmnSearch);
        assert_eq!(sm.rm_state(), RmState::Deregistered);
        assert_eq!(sm.mm_state(), MmState::Deregistered);
    }

    #[test]
    fn test_cm_and_update_status() {
        let mut sm = MmStateMachine::new();
        sm.switch_cm_state(CmState::Connected);
        assert!(sm.is_connected());

        sm.switch_update_status(UpdateStatus::RoamingNotAllowed);
        assert_eq!(sm.update_status(), UpdateStatus::RoamingNotAllowed);
    }
}
