//! 5GMM (5G Mobility Management) procedures
//!
//! This module carries the authentication procedure (5G-AKA, EAP-AKA' and
//! the experimental EAP-TLS) and the MM state machine it drives. The wider
//! MM procedures (registration, service request, deregistration) live in
//! the host UE and interact with this module only through the state
//! machine, storage and timer types.

mod auth;
mod state;
pub mod tls;

pub use auth::{
    validate_autn, AuthReaction, AuthenticationProcedure, AutnValidationResult, MmContext,
    NW_CONSECUTIVE_AUTH_FAILURE_LIMIT,
};
pub use state::{CmState, MmState, MmStateMachine, MmSubState, RmState, UpdateStatus};
