//! Authentication procedure (3GPP TS 24.501 Section 5.4.1)
//!
//! UE-side handling of the network-initiated authentication procedure:
//!
//! - 5G-AKA: RAND/AUTN validation against the USIM, RES* computation
//! - EAP-AKA': AT_* attribute checks, AT_MAC verification, EAP response
//! - EAP-TLS: handshake over EAP fragments (experimental)
//!
//! The procedure stages a partial native NAS security context in the USIM's
//! non-current slot; the Security Mode Control procedure promotes it later.
//! A misbehaving network is bounded by the consecutive-failure counter: once
//! it trips, failure responses are suppressed and the local NAS connection
//! is released.

use tracing::{debug, error, warn};

use uecore_common::config::{OpType, UeConfig};
use uecore_common::logging::format_hex_compact;
use uecore_common::octets::{sub_array, xor_n};
use uecore_common::types::Plmn;
use uecore_crypto::kdf;
use uecore_crypto::milenage::{Milenage, MilenageVector};
use uecore_nas::cause::MmCause;
use uecore_nas::eap::{self, Eap, EapAkaPrime, EapAkaSubType, EapCode, EapTls};
use uecore_nas::messages::{
    AuthenticationFailure, AuthenticationReject, AuthenticationRequest, AuthenticationResponse,
    AuthenticationResult, MmStatus, UplinkMmMessage,
};
use uecore_nas::security::{NasKeySetIdentifier, NasSecurityContext, SecurityContextType};

use super::state::{CmState, MmStateMachine, MmSubState, UpdateStatus};
use super::tls::{EapTlsSession, TlsState, TlsStepOutcome};
use crate::storage::MmStorage;
use crate::timer::NasTimerManager;
use crate::usim::{SequenceNumberManager, Usim};

/// Trip limit for the consecutive authentication failure counter.
pub const NW_CONSECUTIVE_AUTH_FAILURE_LIMIT: u32 = 3;

/// Result of AUTN validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutnValidationResult {
    /// AUTN accepted
    Ok,
    /// MAC mismatch; takes precedence over an out-of-range SQN
    MacFailure,
    /// MAC valid but SQN outside the acceptable range
    SynchronisationFailure,
    /// AMF separation bit is not set
    AmfSeparationBitFailure,
}

/// Borrowed UE state an authentication handler operates on.
///
/// The core is the sole writer of these fields for the duration of one
/// message; the host task observes them again after the handler returns.
pub struct MmContext<'a> {
    /// UE configuration (read-only during a procedure)
    pub config: &'a UeConfig,
    /// USIM state
    pub usim: &'a mut Usim,
    /// NAS timers
    pub timers: &'a mut NasTimerManager,
    /// Persisted MM identifiers
    pub storage: &'a mut MmStorage,
    /// MM state machine
    pub state: &'a mut MmStateMachine,
    /// Serving PLMN, if one is selected
    pub current_plmn: Option<Plmn>,
}

/// Observable outcome of handling one downlink message.
///
/// At most one NAS message is emitted per input message.
#[derive(Debug, Default)]
pub struct AuthReaction {
    /// NAS message to send, if any
    pub message: Option<UplinkMmMessage>,
    /// Request local release of the NAS connection (failed network
    /// authentication check while CM-CONNECTED)
    pub release_connection: bool,
}

impl AuthReaction {
    fn none() -> Self {
        Self::default()
    }

    fn send(message: UplinkMmMessage) -> Self {
        Self {
            message: Some(message),
            release_connection: false,
        }
    }
}

/// The UE-side authentication procedure handler.
#[derive(Debug, Default)]
pub struct AuthenticationProcedure {
    /// Consecutive network authentication failures (0..3 before trip)
    nw_consecutive_auth_failure: u32,
    /// RAND-retransmission bypass: skip AUTN validation when the received
    /// RAND equals the stored one. Kept from the reference behaviour, but
    /// of uncertain conformance, hence the toggle.
    rand_bypass_enabled: bool,
    /// EAP-TLS session, present between TLS start and teardown
    tls_session: Option<EapTlsSession>,
}

impl AuthenticationProcedure {
    /// Creates the handler with default settings.
    pub fn new() -> Self {
        Self {
            nw_consecutive_auth_failure: 0,
            rand_bypass_enabled: true,
            tls_session: None,
        }
    }

    /// Enables or disables the RAND-retransmission bypass.
    pub fn set_rand_bypass(&mut self, enabled: bool) {
        self.rand_bypass_enabled = enabled;
    }

    /// Current consecutive-failure count.
    pub fn consecutive_failures(&self) -> u32 {
        self.nw_consecutive_auth_failure
    }

    // ========================================================================
    // Entry points
    // ========================================================================

    /// Handles a received Authentication Request.
    pub fn receive_authentication_request(
        &mut self,
        ctx: &mut MmContext<'_>,
        msg: &AuthenticationRequest,
    ) -> AuthReaction {
        debug!("Authentication Request received");

        if !ctx.usim.is_valid() {
            warn!("Authentication request is ignored, USIM is invalid");
            return AuthReaction::none();
        }

        ctx.timers.t3520.start();

        if msg.eap_message.is_some() {
            self.receive_request_eap(ctx, msg)
        } else {
            self.receive_request_5g_aka(ctx, msg)
        }
    }

    /// Handles a received Authentication Result.
    pub fn receive_authentication_result(
        &mut self,
        ctx: &mut MmContext<'_>,
        msg: &AuthenticationResult,
    ) {
        if let Some(abba) = &msg.abba {
            if let Some(ns_ctx) = ctx.usim.non_current_ns_ctx.as_mut() {
                ns_ctx.keys.abba = abba.value.clone();
            }
        }

        match eap::decode_eap(&mut msg.eap_message.data.as_slice()) {
            Ok(received) => match received.code() {
                EapCode::Success => self.receive_eap_success(ctx, &received),
                EapCode::Failure => self.receive_eap_failure(ctx, &received),
                _ => warn!(
                    "Network sent EAP with an inconvenient type in Authentication Result, \
                     ignoring EAP IE"
                ),
            },
            Err(e) => warn!("Malformed EAP in Authentication Result, ignoring EAP IE ({e})"),
        }
    }

    /// Handles a received Authentication Reject.
    ///
    /// Terminal: tears down the authentication state, invalidates the USIM
    /// and moves MM to `5GMM-DEREGISTERED.PLMN-SEARCH`. Never answered.
    pub fn receive_authentication_reject(
        &mut self,
        ctx: &mut MmContext<'_>,
        msg: &AuthenticationReject,
    ) {
        error!("Authentication Reject received");

        // RAND and RES* are deleted and T3516 stopped
        ctx.usim.clear_volatile();
        ctx.timers.t3516.stop();

        if let Some(eap_ie) = &msg.eap_message {
            match eap::decode_eap(&mut eap_ie.data.as_slice()) {
                Ok(received) if received.code() == EapCode::Failure => {
                    self.receive_eap_failure(ctx, &received);
                }
                Ok(_) => warn!(
                    "Network sent EAP with an inconvenient type in Authentication Reject, \
                     ignoring EAP IE"
                ),
                Err(e) => warn!("Malformed EAP in Authentication Reject, ignoring EAP IE ({e})"),
            }
        }

        // Update status becomes 5U3 ROAMING NOT ALLOWED; stored 5G-GUTI,
        // TAI list, last visited registered TAI and both security contexts
        // are deleted; the USIM is invalid until power-off or UICC removal.
        ctx.state.switch_update_status(UpdateStatus::RoamingNotAllowed);
        ctx.storage.stored_guti = None;
        ctx.storage.last_visited_registered_tai = None;
        ctx.storage.tai_list.clear();
        ctx.usim.current_ns_ctx = None;
        ctx.usim.non_current_ns_ctx = None;
        ctx.usim.invalidate();

        ctx.timers.t3510.stop();
        ctx.timers.t3516.stop();
        ctx.timers.t3517.stop();
        ctx.timers.t3519.stop();
        ctx.timers.t3521.stop();

        ctx.state.switch_mm_state(MmSubState::DeregisteredPlmnSearch);
    }

    /// Accounts a network authentication failure.
    ///
    /// While `has_chance` holds and the counter is below the limit, the
    /// counter advances and the caller continues with its normal failure
    /// emission (`None`). Otherwise the failure response is suppressed:
    /// T3520 stops and, when CM-CONNECTED, a local connection release is
    /// requested through the returned reaction.
    pub fn network_failing_the_auth_check(
        &mut self,
        ctx: &mut MmContext<'_>,
        has_chance: bool,
    ) -> Option<AuthReaction> {
        if has_chance && self.nw_consecutive_auth_failure < NW_CONSECUTIVE_AUTH_FAILURE_LIMIT {
            self.nw_consecutive_auth_failure += 1;
            return None;
        }

        error!("Network failing the authentication check");

        let release_connection = ctx.state.cm_state() == CmState::Connected;
        ctx.timers.t3520.stop();

        Some(AuthReaction {
            message: None,
            release_connection,
        })
    }

    // ========================================================================
    // 5G-AKA
    // ========================================================================

    fn receive_request_5g_aka(
        &mut self,
        ctx: &mut MmContext<'_>,
        msg: &AuthenticationRequest,
    ) -> AuthReaction {
        let Some(plmn) = ctx.current_plmn.filter(Plmn::has_value) else {
            return AuthReaction::none();
        };

        // Parameter syntax: RAND and AUTN present, each 16 bytes
        let (Some(rand_ie), Some(autn_ie)) = (&msg.rand, &msg.autn) else {
            return Self::auth_failure(ctx, MmCause::SemanticallyIncorrectMessage, None);
        };
        let Ok(autn) = <[u8; 16]>::try_from(autn_ie.value.as_slice()) else {
            return Self::auth_failure(ctx, MmCause::SemanticallyIncorrectMessage, None);
        };
        let rand = rand_ie.value;

        if let Some(reaction) = self.validate_ng_ksi(ctx, &msg.ng_ksi) {
            return reaction;
        }

        // If the received RAND equals the stored one the network is
        // retransmitting: skip AUTN validation, RES* is still recomputed.
        let mut autn_check = AutnValidationResult::Ok;
        if !(self.rand_bypass_enabled && ctx.usim.rand == Some(rand)) {
            autn_check = validate_autn(ctx, &rand, &autn);
            ctx.timers.t3516.start();
        }

        match autn_check {
            AutnValidationResult::Ok => {
                let sqn = ctx.usim.sqn_mng.sqn();
                let milenage = calculate_milenage(ctx.config, &sqn, &rand, false);

                let mut ck_ik = [0u8; 32];
                ck_ik[..16].copy_from_slice(&milenage.ck);
                ck_ik[16..].copy_from_slice(&milenage.ik);
                let sqn_xor_ak = xor_n(&sqn, &milenage.ak);
                let snn = kdf::serving_network_name(&plmn);

                let res_star = kdf::derive_res_star(&ck_ik, &snn, &rand, &milenage.res);
                ctx.usim.rand = Some(rand);
                ctx.usim.res_star = Some(res_star.to_vec());

                let mut ns_ctx = NasSecurityContext::new(msg.ng_ksi.tsc, msg.ng_ksi.ksi);
                ns_ctx.keys.kausf = Some(kdf::derive_kausf_5g_aka(
                    &milenage.ck,
                    &milenage.ik,
                    &snn,
                    &sqn_xor_ak,
                ));
                ns_ctx.keys.abba = msg.abba.value.clone();
                derive_keys_seaf_amf(ctx.config, &plmn, &mut ns_ctx);
                ctx.usim.non_current_ns_ctx = Some(ns_ctx);

                self.nw_consecutive_auth_failure = 0;
                ctx.timers.t3520.stop();

                AuthReaction::send(UplinkMmMessage::AuthenticationResponse(
                    AuthenticationResponse::with_res_star(res_star.to_vec()),
                ))
            }
            AutnValidationResult::MacFailure => {
                if let Some(reaction) = self.network_failing_the_auth_check(ctx, true) {
                    return reaction;
                }
                ctx.timers.t3520.start();
                Self::auth_failure(ctx, MmCause::MacFailure, None)
            }
            AutnValidationResult::SynchronisationFailure => {
                if let Some(reaction) = self.network_failing_the_auth_check(ctx, true) {
                    return reaction;
                }
                ctx.timers.t3520.start();

                let sqn = ctx.usim.sqn_mng.sqn();
                let milenage = calculate_milenage(ctx.config, &sqn, &rand, true);
                let auts = kdf::calculate_auts(&sqn, &milenage.ak_r, &milenage.mac_s);
                Self::auth_failure(ctx, MmCause::SynchFailure, Some(auts))
            }
            AutnValidationResult::AmfSeparationBitFailure => {
                if let Some(reaction) = self.network_failing_the_auth_check(ctx, true) {
                    return reaction;
                }
                ctx.timers.t3520.start();
                Self::auth_failure(ctx, MmCause::Non5gAuthenticationUnacceptable, None)
            }
        }
    }

    // ========================================================================
    // EAP routing
    // ========================================================================

    fn receive_request_eap(
        &mut self,
        ctx: &mut MmContext<'_>,
        msg: &AuthenticationRequest,
    ) -> AuthReaction {
        let Some(plmn) = ctx.current_plmn.filter(Plmn::has_value) else {
            return AuthReaction::none();
        };

        let Some(eap_ie) = &msg.eap_message else {
            return Self::semantically_incorrect();
        };

        let received = match eap::decode_eap(&mut eap_ie.data.as_slice()) {
            Ok(received) => received,
            Err(e) => {
                warn!("Malformed EAP in Authentication Request ({e})");
                return Self::semantically_incorrect();
            }
        };

        match received {
            Eap::AkaPrime(received) => self.receive_request_eap_aka_prime(ctx, msg, &plmn, received),
            Eap::Tls(received) => self.receive_request_eap_tls(ctx, msg, &plmn, received),
            Eap::Simple { .. } => Self::semantically_incorrect(),
        }
    }

    // ========================================================================
    // EAP-AKA'
    // ========================================================================

    fn receive_request_eap_aka_prime(
        &mut self,
        ctx: &mut MmContext<'_>,
        msg: &AuthenticationRequest,
        plmn: &Plmn,
        received: EapAkaPrime,
    ) -> AuthReaction {
        if received.sub_type != EapAkaSubType::AkaChallenge {
            return Self::semantically_incorrect();
        }

        // Parameter syntax: AT_RAND, AT_AUTN, AT_MAC present, each 16 bytes
        let rand = received
            .attributes
            .get_rand()
            .and_then(|v| <[u8; 16]>::try_from(v).ok());
        let autn = received
            .attributes
            .get_autn()
            .and_then(|v| <[u8; 16]>::try_from(v).ok());
        let mac = received
            .attributes
            .get_mac()
            .and_then(|v| <[u8; 16]>::try_from(v).ok());
        let (Some(rand), Some(autn), Some(received_mac)) = (rand, autn, mac) else {
            return Self::semantically_incorrect();
        };

        // AT_KDF and AT_KDF_INPUT binding
        if received.attributes.get_kdf() != Some(1) {
            error!("EAP AKA' Authentication Reject, received AT_KDF is not valid");
            if let Some(reaction) = self.network_failing_the_auth_check(ctx, true) {
                return reaction;
            }
            ctx.timers.t3520.start();
            return Self::eap_failure(ctx, EapAkaPrime::authentication_reject(received.id));
        }

        let snn = kdf::serving_network_name(plmn);
        if received.attributes.get_kdf_input().as_deref() != Some(snn.as_bytes()) {
            error!("EAP AKA' Authentication Reject, received AT_KDF_INPUT is not valid");
            return Self::eap_failure(ctx, EapAkaPrime::authentication_reject(received.id));
        }

        if let Some(reaction) = self.validate_ng_ksi(ctx, &msg.ng_ksi) {
            return reaction;
        }

        let autn_check = validate_autn(ctx, &rand, &autn);
        ctx.timers.t3516.start();

        match autn_check {
            AutnValidationResult::Ok => {
                let sqn = ctx.usim.sqn_mng.sqn();
                let milenage = calculate_milenage(ctx.config, &sqn, &rand, false);
                let sqn_xor_ak = xor_n(&sqn, &milenage.ak);

                let (ck_prime, ik_prime) =
                    kdf::derive_ck_prime_ik_prime(&milenage.ck, &milenage.ik, &snn, &sqn_xor_ak);
                let supi = ctx
                    .config
                    .supi
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_default();
                let mk = kdf::derive_mk(&ck_prime, &ik_prime, &supi);
                let kaut = kdf::kaut_from_mk(&mk);

                // AT_MAC covers the whole packet with its MAC value zeroed
                let mut for_mac = received.clone();
                for_mac.attributes.replace_mac(&[0u8; 16]);
                let expected_mac = kdf::eap_aka_prime_mac(
                    &kaut,
                    &eap::encode_eap_to_vec(&Eap::AkaPrime(for_mac)),
                );

                if expected_mac != received_mac {
                    error!(
                        "AT_MAC failure in EAP AKA'. expected: {} received: {}",
                        format_hex_compact(&expected_mac),
                        format_hex_compact(&received_mac)
                    );
                    if let Some(reaction) = self.network_failing_the_auth_check(ctx, true) {
                        return reaction;
                    }
                    ctx.timers.t3520.start();
                    return Self::eap_failure(ctx, EapAkaPrime::client_error(received.id, 0));
                }

                ctx.usim.rand = Some(rand);
                ctx.usim.res_star = None;

                let mut ns_ctx = NasSecurityContext::new(msg.ng_ksi.tsc, msg.ng_ksi.ksi);
                ns_ctx.keys.kausf = Some(kdf::kausf_from_mk(&mk));
                ns_ctx.keys.abba = msg.abba.value.clone();
                derive_keys_seaf_amf(ctx.config, plmn, &mut ns_ctx);
                ctx.usim.non_current_ns_ctx = Some(ns_ctx);

                self.nw_consecutive_auth_failure = 0;
                ctx.timers.t3520.stop();

                // Response: AT_RES, placeholder AT_MAC, AT_KDF, then the MAC
                // computed over the encoded response replaces the placeholder
                let mut response =
                    EapAkaPrime::new(EapCode::Response, received.id, EapAkaSubType::AkaChallenge);
                response.attributes.put_res(&milenage.res);
                response.attributes.put_mac(&[0u8; 16]);
                response.attributes.put_kdf(1);

                let sending_mac = kdf::eap_aka_prime_mac(
                    &kaut,
                    &eap::encode_eap_to_vec(&Eap::AkaPrime(response.clone())),
                );
                response.attributes.replace_mac(&sending_mac);

                AuthReaction::send(UplinkMmMessage::AuthenticationResponse(
                    AuthenticationResponse::with_eap(eap::encode_eap_to_vec(&Eap::AkaPrime(
                        response,
                    ))),
                ))
            }
            AutnValidationResult::MacFailure => {
                if let Some(reaction) = self.network_failing_the_auth_check(ctx, true) {
                    return reaction;
                }
                ctx.timers.t3520.start();
                Self::eap_failure(ctx, EapAkaPrime::authentication_reject(received.id))
            }
            AutnValidationResult::SynchronisationFailure => {
                if let Some(reaction) = self.network_failing_the_auth_check(ctx, true) {
                    return reaction;
                }
                ctx.timers.t3520.start();

                let sqn = ctx.usim.sqn_mng.sqn();
                let milenage = calculate_milenage(ctx.config, &sqn, &rand, true);
                let auts = kdf::calculate_auts(&sqn, &milenage.ak_r, &milenage.mac_s);
                Self::eap_failure(
                    ctx,
                    EapAkaPrime::synchronization_failure(received.id, auts.to_vec()),
                )
            }
            AutnValidationResult::AmfSeparationBitFailure => {
                if let Some(reaction) = self.network_failing_the_auth_check(ctx, true) {
                    return reaction;
                }
                ctx.timers.t3520.start();
                Self::eap_failure(ctx, EapAkaPrime::client_error(received.id, 0))
            }
        }
    }

    // ========================================================================
    // EAP-TLS (experimental)
    // ========================================================================

    fn receive_request_eap_tls(
        &mut self,
        ctx: &mut MmContext<'_>,
        msg: &AuthenticationRequest,
        plmn: &Plmn,
        received: EapTls,
    ) -> AuthReaction {
        if msg.ng_ksi.tsc == SecurityContextType::Mapped {
            error!("Mapped security context not supported");
            return Self::auth_failure(ctx, MmCause::ProtocolErrorUnspecified, None);
        }
        if msg.ng_ksi.ksi == NasKeySetIdentifier::NO_KEY_AVAILABLE {
            error!("Invalid ngKSI value received");
            return Self::auth_failure(ctx, MmCause::ProtocolErrorUnspecified, None);
        }

        if self.tls_session.is_none() {
            if !received.is_start() {
                return Self::semantically_incorrect();
            }
            match EapTlsSession::establish(ctx.config) {
                Ok(session) => self.tls_session = Some(session),
                Err(e) => {
                    error!("EAP-TLS session setup failed: {e}");
                    return Self::semantically_incorrect();
                }
            }
        }

        let Some(session) = self.tls_session.as_mut() else {
            return AuthReaction::none();
        };

        match session.state() {
            TlsState::TlsHandshake => match session.step(&received.tls_data) {
                Ok(TlsStepOutcome::Completed { key_material }) => {
                    ctx.timers.t3520.stop();

                    // KAUSF from the exported keying material; the slice is
                    // an implementation choice, not normative behaviour.
                    let mut kausf = [0u8; 32];
                    kausf.copy_from_slice(&key_material[64..96]);

                    let mut ns_ctx = NasSecurityContext::new(msg.ng_ksi.tsc, msg.ng_ksi.ksi);
                    ns_ctx.keys.kausf = Some(kausf);
                    ns_ctx.keys.abba = msg.abba.value.clone();
                    derive_keys_seaf_amf(ctx.config, plmn, &mut ns_ctx);
                    ctx.usim.non_current_ns_ctx = Some(ns_ctx);

                    let response =
                        EapTls::new(EapCode::Response, received.id, EapTls::FLAG_LENGTH_INCLUDED, Vec::new());
                    AuthReaction::send(UplinkMmMessage::AuthenticationResponse(
                        AuthenticationResponse::with_eap(eap::encode_eap_to_vec(&Eap::Tls(
                            response,
                        ))),
                    ))
                }
                Ok(TlsStepOutcome::InProgress { outgoing }) => {
                    let response = EapTls::new(
                        EapCode::Response,
                        received.id,
                        EapTls::FLAG_LENGTH_INCLUDED,
                        outgoing,
                    );
                    AuthReaction::send(UplinkMmMessage::AuthenticationResponse(
                        AuthenticationResponse::with_eap(eap::encode_eap_to_vec(&Eap::Tls(
                            response,
                        ))),
                    ))
                }
                Err(e) => {
                    error!("EAP-TLS handshake error: {e}");
                    self.tls_session = None;
                    Self::semantically_incorrect()
                }
            },
            TlsState::TlsDone => {
                // Dropping the session releases the TLS resources; a new
                // procedure re-enters at the start state.
                self.tls_session = None;
                AuthReaction::none()
            }
        }
    }

    // ========================================================================
    // EAP result hooks
    // ========================================================================

    fn receive_eap_success(&mut self, _ctx: &mut MmContext<'_>, _eap: &Eap) {
        // reserved hook
    }

    fn receive_eap_failure(&mut self, ctx: &mut MmContext<'_>, _eap: &Eap) {
        debug!("Handling EAP-failure");

        // Delete the partial native security context, if any was created
        ctx.usim.non_current_ns_ctx = None;
    }

    // ========================================================================
    // Shared checks and failure emission
    // ========================================================================

    /// ngKSI preconditions: native TSC, KSI available, no collision with an
    /// existing context. Returns the failure reaction when a check fails.
    fn validate_ng_ksi(
        &mut self,
        ctx: &mut MmContext<'_>,
        ng_ksi: &NasKeySetIdentifier,
    ) -> Option<AuthReaction> {
        if ng_ksi.tsc == SecurityContextType::Mapped {
            error!("Mapped security context not supported");
            return Some(Self::auth_failure(
                ctx,
                MmCause::ProtocolErrorUnspecified,
                None,
            ));
        }

        if ng_ksi.ksi == NasKeySetIdentifier::NO_KEY_AVAILABLE {
            error!("Invalid ngKSI value received");
            return Some(Self::auth_failure(
                ctx,
                MmCause::ProtocolErrorUnspecified,
                None,
            ));
        }

        let in_use = |slot: &Option<NasSecurityContext>| {
            slot.as_ref().is_some_and(|c| c.ng_ksi == ng_ksi.ksi)
        };
        if in_use(&ctx.usim.current_ns_ctx) || in_use(&ctx.usim.non_current_ns_ctx) {
            if let Some(reaction) = self.network_failing_the_auth_check(ctx, true) {
                return Some(reaction);
            }
            ctx.timers.t3520.start();
            return Some(Self::auth_failure(ctx, MmCause::NgKsiAlreadyInUse, None));
        }

        None
    }

    /// Emits an Authentication Failure, clearing RAND/RES* and stopping
    /// T3516 first.
    fn auth_failure(
        ctx: &mut MmContext<'_>,
        cause: MmCause,
        auts: Option<[u8; kdf::AUTS_SIZE]>,
    ) -> AuthReaction {
        if cause == MmCause::SynchFailure {
            debug!("Sending Authentication Failure due to SQN out of range");
        } else {
            error!("Sending Authentication Failure with cause [{cause:?}]");
        }

        ctx.usim.clear_volatile();
        ctx.timers.t3516.stop();

        let message = match auts {
            Some(auts) => AuthenticationFailure::synch_failure(auts.to_vec()),
            None => AuthenticationFailure::with_cause(cause),
        };
        AuthReaction::send(UplinkMmMessage::AuthenticationFailure(message))
    }

    /// Emits an EAP failure response inside an Authentication Response,
    /// clearing RAND/RES* and stopping T3516 first.
    fn eap_failure(ctx: &mut MmContext<'_>, response: EapAkaPrime) -> AuthReaction {
        ctx.usim.clear_volatile();
        ctx.timers.t3516.stop();

        let data = eap::encode_eap_to_vec(&Eap::AkaPrime(response));
        AuthReaction::send(UplinkMmMessage::AuthenticationResponse(
            AuthenticationResponse::with_eap(data),
        ))
    }

    /// Emits an MM Status for EAP envelope violations.
    fn semantically_incorrect() -> AuthReaction {
        AuthReaction::send(UplinkMmMessage::Status(MmStatus::new(
            MmCause::SemanticallyIncorrectMessage,
        )))
    }
}

/// Validates a received AUTN against the USIM (TS 33.102 Section 6.3.2).
///
/// AUTN = (SQN ⊕ AK) ‖ AMF ‖ MAC. Checks in order: separation bit, SQN
/// recovery and freshness, MAC comparison. A MAC mismatch takes precedence
/// over an unacceptable SQN. `check_sqn` advances the stored SQN when the
/// received one is fresh.
pub fn validate_autn(
    ctx: &mut MmContext<'_>,
    rand: &[u8; 16],
    autn: &[u8; 16],
) -> AutnValidationResult {
    let sqn_xor_ak = sub_array::<6>(autn, 0);
    let amf = &autn[6..8];
    let mac = &autn[8..16];

    // Separation bit: bit 7 of AMF octet 0 must be 1 for 5G AKA
    if amf[0] & 0x80 == 0 {
        error!("AUTN validation SEP-BIT failure. expected: 1, received: 0");
        return AutnValidationResult::AmfSeparationBitFailure;
    }

    // Derive AK with the current SQN and unmask the received SQN
    let milenage = calculate_milenage(ctx.config, &ctx.usim.sqn_mng.sqn(), rand, false);
    let received_sqn = xor_n(&sqn_xor_ak, &milenage.ak);

    debug!("Received SQN [{}]", format_hex_compact(&received_sqn));
    debug!("SQN-MS [{}]", format_hex_compact(&ctx.usim.sqn_mng.sqn()));

    let sqn_ok = ctx.usim.sqn_mng.check_sqn(&received_sqn);

    // Re-run milenage with the received SQN before the MAC comparison
    let milenage = calculate_milenage(ctx.config, &received_sqn, rand, false);

    if mac != milenage.mac_a {
        error!(
            "AUTN validation MAC mismatch. expected [{}] received [{}]",
            format_hex_compact(&milenage.mac_a),
            format_hex_compact(mac)
        );
        return AutnValidationResult::MacFailure;
    }

    if !sqn_ok {
        return AutnValidationResult::SynchronisationFailure;
    }

    AutnValidationResult::Ok
}

/// Runs Milenage with the configured credentials.
///
/// `dummy_amf` substitutes a zero AMF and is used only when producing AUTS
/// during resynchronisation.
fn calculate_milenage(
    config: &UeConfig,
    sqn: &[u8; 6],
    rand: &[u8; 16],
    dummy_amf: bool,
) -> MilenageVector {
    let amf = if dummy_amf { [0u8; 2] } else { config.amf };

    let milenage = match config.op_type {
        OpType::Opc => Milenage::new(&config.key, &config.op),
        OpType::Op => Milenage::new_with_op(&config.key, &config.op),
    };
    milenage.calculate(rand, sqn, &amf)
}

/// Populates KSEAF and KAMF below an already-set KAUSF (TS 33.501 A.6/A.7).
///
/// The subordinate NAS keys are derived later by the Security Mode Control
/// procedure once the algorithms are selected.
fn derive_keys_seaf_amf(config: &UeConfig, plmn: &Plmn, ns_ctx: &mut NasSecurityContext) {
    let Some(kausf) = ns_ctx.keys.kausf else {
        return;
    };

    let snn = kdf::serving_network_name(plmn);
    let kseaf = kdf::derive_kseaf(&kausf, &snn);
    ns_ctx.keys.kseaf = Some(kseaf);

    let supi = config
        .supi
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_default();
    ns_ctx.keys.kamf = Some(kdf::derive_kamf(&kseaf, &supi, &ns_ctx.keys.abba));
}
