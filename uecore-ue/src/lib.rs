//! uecore UE authentication core
//!
//! UE-side 5G NAS mobility management authentication: consumes
//! authentication-related NAS messages from the serving network, validates
//! them against USIM credentials, drives 5G-AKA, EAP-AKA' and the
//! experimental EAP-TLS procedures, derives the NAS key hierarchy and emits
//! the corresponding NAS responses.
//!
//! The core is single-threaded and event-driven: the host NAS task delivers
//! decoded messages serially, and every handler runs to completion before
//! the next event is processed.

pub mod nas;
pub mod storage;
pub mod timer;
pub mod usim;

pub use nas::mm::{
    AuthReaction, AuthenticationProcedure, AutnValidationResult, CmState, MmContext, MmState,
    MmStateMachine, MmSubState, RmState, UpdateStatus,
};
pub use storage::MmStorage;
pub use timer::{NasTimerManager, UeTimer};
pub use usim::{SequenceNumberManager, Usim, UsimSqnManager};
