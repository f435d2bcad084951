//! Implements the client side of the key-exchange state machine.
//! 实现密钥交换状态机的客户端。

use crate::crypto::engine::{EccKeyShare, KemGroupKeyShare};
use crate::crypto::keys::{SecretDerivationGate, Tls13Secrets, derive_handshake_secrets};
use crate::crypto::suite::{CipherSuite, cipher_suite_by_iana_id};
use crate::error::{ProtocolViolation, Result};
use crate::negotiation::{NegotiatedGroup, NegotiationState};
use crate::policy::SecurityPolicy;
use crate::policy::ecc::EccCurve;
use crate::policy::kem::KemGroup;
use crate::protocol::message::{ClientHelloPayload, HandshakeMessage, ServerHelloPayload};
use crate::protocol::state::{Negotiated, Retry};
use crate::protocol::transcript::Transcript;
use std::marker::PhantomData;
use tracing::{debug, warn};

mod builder;
mod state_awaiting_hrr_decision;
mod state_initial;
mod state_negotiated;
mod state_retry;

pub use builder::HandshakeClientBuilder;

/// The client-side key-exchange state machine.
///
/// Generic over the state `State` to enforce protocol flow at compile time. This
/// prevents out-of-order operations, such as answering a second HelloRetryRequest or
/// reading secrets before a group was negotiated.
///
/// 客户端密钥交换状态机。
///
/// 通过泛型状态 `State` 在编译时强制执行协议流程。
/// 这可以防止乱序操作，例如响应第二个 HelloRetryRequest，或在协商出组之前读取密钥。
pub struct HandshakeClient<'a, State> {
    /// Zero-sized marker to hold the current state.
    ///
    /// 零大小标记，用于持有当前状态。
    state: PhantomData<State>,
    /// The read-only preferences this connection negotiates with.
    ///
    /// 此连接进行协商所使用的只读偏好。
    policy: &'a SecurityPolicy<'a>,
    /// Offered candidates and, once known, the negotiated group or curve.
    ///
    /// 已提供的候选项，以及协商完成后的组或曲线。
    negotiation: NegotiationState,
    /// Every handshake message so far, hashed once the cipher suite is known.
    ///
    /// 目前为止的全部握手消息，在确定密码套件后计算哈希。
    transcript: Transcript,
    /// The ClientHello as first sent. A retried ClientHello differs only in its key shares.
    client_hello: Option<ClientHelloPayload>,
    /// Private half of the hybrid share in the latest ClientHello, if any.
    kem_share: Option<KemGroupKeyShare>,
    /// Private half of the classical share in the latest ClientHello, if any.
    ecc_share: Option<EccKeyShare>,
    /// Cipher suite fixed by a HelloRetryRequest or the ServerHello.
    cipher_suite: Option<&'static CipherSuite>,
    /// Group the server asked for in its HelloRetryRequest.
    retry_group: Option<u16>,
    /// Handshake secrets, only present in the `Negotiated` state.
    ///
    /// 握手密钥，仅在 `Negotiated` 状态下存在。
    secrets: Option<Tls13Secrets>,
}

/// What the client does after the server's first flight.
///
/// 客户端收到服务器第一轮消息后的去向。
pub enum ClientFlight<'a> {
    /// The server sent a HelloRetryRequest; send the retried ClientHello.
    Retry(HandshakeMessage, HandshakeClient<'a, Retry>),
    /// The server accepted an offered share.
    Negotiated(HandshakeClient<'a, Negotiated>),
}

impl<'a, State> HandshakeClient<'a, State> {
    /// Moves the connection data into the next state.
    fn transition<Next>(self) -> HandshakeClient<'a, Next> {
        HandshakeClient {
            state: PhantomData,
            policy: self.policy,
            negotiation: self.negotiation,
            transcript: self.transcript,
            client_hello: self.client_hello,
            kem_share: self.kem_share,
            ecc_share: self.ecc_share,
            cipher_suite: self.cipher_suite,
            retry_group: self.retry_group,
            secrets: self.secrets,
        }
    }

    /// Hybrid groups this client can advertise, in preference order.
    fn advertised_kem_groups(&self) -> Vec<&'static KemGroup> {
        let capabilities = self.negotiation.capabilities();
        self.policy
            .kem_preferences
            .tls13_kem_groups
            .iter()
            .copied()
            .filter(|group| capabilities.is_kem_group_available(group))
            .collect()
    }

    /// Curves this client can advertise, in preference order.
    fn advertised_curves(&self) -> Vec<&'static EccCurve> {
        let capabilities = self.negotiation.capabilities();
        self.policy
            .ecc_preferences
            .ecc_curves
            .iter()
            .copied()
            .filter(|curve| capabilities.is_curve_available(curve))
            .collect()
    }

    /// Resolves a cipher suite id chosen by the server against what was offered.
    fn offered_cipher_suite(&self, iana_id: u16) -> Result<&'static CipherSuite> {
        let offered = self
            .client_hello
            .as_ref()
            .is_some_and(|hello| hello.cipher_suites.contains(&iana_id));
        match cipher_suite_by_iana_id(iana_id) {
            Some(suite) if offered && suite.is_tls13() => Ok(suite),
            _ => {
                warn!(cipher_suite = iana_id, "server chose a cipher suite that was not offered");
                Err(ProtocolViolation::CipherSuiteMismatch(iana_id).into())
            }
        }
    }

    /// Completes the exchange with the server's share and derives the handshake secrets.
    fn finish_server_hello(
        mut self,
        message: &HandshakeMessage,
        server_hello: &ServerHelloPayload,
    ) -> Result<HandshakeClient<'a, Negotiated>> {
        let suite = self.offered_cipher_suite(server_hello.cipher_suite)?;
        let group = server_hello.key_share.group;

        let shared_secret = match (&self.kem_share, &self.ecc_share) {
            (Some(kem_share), _) if kem_share.group().iana_id == group => {
                let shared_secret = kem_share.finish(&server_hello.key_share.key_exchange)?;
                self.negotiation.record_kem_group(kem_share.group())?;
                shared_secret
            }
            (_, Some(ecc_share)) if ecc_share.curve().iana_id == group => {
                let shared_secret = ecc_share.agree(&server_hello.key_share.key_exchange)?;
                self.negotiation.record_curve(ecc_share.curve())?;
                shared_secret
            }
            _ => {
                warn!(group, "ServerHello selects a group without a client key share");
                return Err(ProtocolViolation::UnofferedGroup(group).into());
            }
        };

        self.transcript.update(message)?;
        let transcript_hash = self.transcript.current_hash(suite.hash);
        let secrets = derive_handshake_secrets(suite, &shared_secret, &transcript_hash)?;
        SecretDerivationGate::check(&secrets, suite)?;

        self.cipher_suite = Some(suite);
        self.secrets = Some(secrets);
        // Ephemeral private keys are not needed past this point.
        self.kem_share = None;
        self.ecc_share = None;

        debug!(
            group = self.negotiation.negotiated().name(),
            hrr = self.retry_group.is_some(),
            len_prefixed = self.negotiation.len_prefixed(),
            cipher_suite = suite.name,
            "client negotiated key exchange"
        );
        Ok(self.transition())
    }

    /// Name of the negotiated hybrid group, `None` if a classical curve was negotiated.
    ///
    /// Fails with [`NegotiationIncomplete`](crate::error::HandshakeError::NegotiationIncomplete)
    /// before negotiation completes.
    pub fn kem_group_name(&self) -> Result<Option<&'static str>> {
        self.negotiation.kem_group_name()
    }

    /// Name of the negotiated classical curve, `None` if a hybrid group was negotiated.
    pub fn curve_name(&self) -> Result<Option<&'static str>> {
        self.negotiation.curve_name()
    }

    /// Name of whichever group or curve was negotiated.
    pub fn key_exchange_group(&self) -> Result<&'static str> {
        self.negotiation.key_exchange_group()
    }

    pub fn negotiated(&self) -> NegotiatedGroup {
        self.negotiation.negotiated()
    }

    pub fn negotiation(&self) -> &NegotiationState {
        &self.negotiation
    }

    pub fn policy(&self) -> &'a SecurityPolicy<'a> {
        self.policy
    }
}
