//! Implements the server side of the key-exchange state machine.
//! 实现密钥交换状态机的服务器端。

use crate::crypto::engine::{EccKeyShare, KemGroupKeyShare};
use crate::crypto::keys::{SecretDerivationGate, Tls13Secrets, derive_handshake_secrets};
use crate::crypto::suite::CipherSuite;
use crate::error::{HandshakeError, ProtocolViolation, Result};
use crate::negotiation::{NegotiatedGroup, NegotiationState};
use crate::policy::SecurityPolicy;
use crate::policy::ecc::{EccCurve, ecc_curve_by_iana_id};
use crate::policy::kem::{KemGroup, kem_group_by_iana_id};
use crate::protocol::key_share::KeyShareEntry;
use crate::protocol::message::{
    ClientHelloPayload, HandshakeMessage, ServerHelloPayload, hello_random,
};
use crate::protocol::state::{AwaitingHrrDecision, Negotiated};
use crate::protocol::transcript::Transcript;
use std::marker::PhantomData;
use tracing::{debug, warn};

mod builder;
mod state_awaiting_hrr_decision;
mod state_initial;
mod state_negotiated;

pub use builder::{HandshakeServerBuilder, Missing};

/// The server-side key-exchange state machine.
///
/// Generic over the state `State` to enforce protocol flow at compile time.
/// This ensures that methods can only be called in the correct sequence,
/// preventing logical errors in the protocol's implementation.
///
/// 服务器端密钥交换状态机。
///
/// 通过泛型状态 `State` 在编译时强制执行协议流程。
/// 这确保了方法只能按正确的顺序调用，防止了协议实现中的逻辑错误。
pub struct HandshakeServer<'a, State> {
    /// Zero-sized marker to hold the current state.
    /// This doesn't take up space but allows the type system to track the machine's state.
    ///
    /// 零大小标记，用于持有当前状态。
    /// 它不占用空间，但允许类型系统跟踪机器的状态。
    state: PhantomData<State>,
    /// The read-only preferences whose ranking decides every fallback.
    ///
    /// 只读偏好，其排序决定所有回退选择。
    policy: &'a SecurityPolicy<'a>,
    negotiation: NegotiationState,
    /// A running record of the handshake, hashed with the selected suite's hash.
    ///
    /// 握手的运行记录，使用所选套件的哈希计算。
    transcript: Transcript,
    cipher_suite: Option<&'static CipherSuite>,
    /// Group named in the HelloRetryRequest, if one was sent.
    retry_group: Option<u16>,
    secrets: Option<Tls13Secrets>,
}

/// What the server sends in answer to the first `ClientHello`.
///
/// 服务器对第一个 `ClientHello` 的答复。
pub enum ServerFlight<'a> {
    /// No offered share is usable, but a mutual group exists: ask for it.
    HelloRetry(HandshakeMessage, HandshakeServer<'a, AwaitingHrrDecision>),
    /// An offered share was accepted.
    Hello(HandshakeMessage, HandshakeServer<'a, Negotiated>),
}

/// Groups, curves and key shares from one `ClientHello`, resolved against the catalog.
///
/// Ids the catalog does not know are ignored.
struct ParsedClientHello<'h> {
    kem_groups: Vec<&'static KemGroup>,
    curves: Vec<&'static EccCurve>,
    kem_share: Option<(&'static KemGroup, &'h [u8])>,
    ecc_share: Option<(&'static EccCurve, &'h [u8])>,
}

fn parse_client_hello(hello: &ClientHelloPayload) -> Result<ParsedClientHello<'_>> {
    let mut parsed = ParsedClientHello {
        kem_groups: hello
            .supported_groups
            .iter()
            .filter_map(|&id| kem_group_by_iana_id(id))
            .collect(),
        curves: hello
            .supported_groups
            .iter()
            .filter_map(|&id| ecc_curve_by_iana_id(id))
            .collect(),
        kem_share: None,
        ecc_share: None,
    };

    for (index, entry) in hello.key_shares.iter().enumerate() {
        if hello.key_shares[..index]
            .iter()
            .any(|earlier| earlier.group == entry.group)
        {
            warn!(group = entry.group, "ClientHello repeats a key share group");
            return Err(ProtocolViolation::DuplicateKeyShare(entry.group).into());
        }
        if !hello.supported_groups.contains(&entry.group) {
            warn!(group = entry.group, "ClientHello key share is not in supported_groups");
            return Err(ProtocolViolation::UnofferedGroup(entry.group).into());
        }

        // Only the first share of each kind is considered.
        if let Some(group) = kem_group_by_iana_id(entry.group) {
            parsed.kem_share.get_or_insert((group, entry.key_exchange.as_slice()));
        } else if let Some(curve) = ecc_curve_by_iana_id(entry.group) {
            parsed.ecc_share.get_or_insert((curve, entry.key_exchange.as_slice()));
        }
    }
    Ok(parsed)
}

impl<'a, State> HandshakeServer<'a, State> {
    fn transition<Next>(self) -> HandshakeServer<'a, Next> {
        HandshakeServer {
            state: PhantomData,
            policy: self.policy,
            negotiation: self.negotiation,
            transcript: self.transcript,
            cipher_suite: self.cipher_suite,
            retry_group: self.retry_group,
            secrets: self.secrets,
        }
    }

    /// The first TLS 1.3 suite of the server's preferences that the client offered.
    fn select_cipher_suite(&self, offered: &[u16]) -> Result<&'static CipherSuite> {
        self.policy
            .cipher_preferences
            .tls13_suites()
            .find(|suite| offered.contains(&suite.iana_id))
            .ok_or_else(|| {
                warn!(?offered, "no TLS 1.3 cipher suite in common");
                ProtocolViolation::NoSharedCipherSuite.into()
            })
    }

    /// Answers the client's share for `selected` with the ServerHello and derives
    /// the handshake secrets.
    ///
    /// The ClientHello being answered must already be in the transcript.
    fn accept(
        mut self,
        selected: NegotiatedGroup,
        client_share: &[u8],
    ) -> Result<(HandshakeMessage, HandshakeServer<'a, Negotiated>)> {
        let suite = self
            .cipher_suite
            .ok_or(HandshakeError::Safety("no cipher suite selected"))?;

        let (group_id, key_exchange, shared_secret) = match selected {
            NegotiatedGroup::KemGroup(group) => {
                let response = KemGroupKeyShare::respond(group, client_share)?;
                self.negotiation.record_kem_group(group)?;
                (group.iana_id, response.key_exchange, response.shared_secret)
            }
            NegotiatedGroup::Curve(curve) => {
                let (engine, shared_secret) = EccKeyShare::new_for_server(curve, client_share)?;
                self.negotiation.record_curve(curve)?;
                (curve.iana_id, engine.public_key().to_vec(), shared_secret)
            }
            NegotiatedGroup::Unresolved => {
                return Err(HandshakeError::Safety("no group or curve to accept"));
            }
        };

        let server_hello = HandshakeMessage::ServerHello(ServerHelloPayload {
            random: hello_random(),
            cipher_suite: suite.iana_id,
            key_share: KeyShareEntry::new(group_id, key_exchange),
        });
        self.transcript.update(&server_hello)?;
        let transcript_hash = self.transcript.current_hash(suite.hash);
        let secrets = derive_handshake_secrets(suite, &shared_secret, &transcript_hash)?;
        SecretDerivationGate::check(&secrets, suite)?;
        self.secrets = Some(secrets);

        debug!(
            group = selected.name(),
            hrr = self.retry_group.is_some(),
            len_prefixed = self.negotiation.len_prefixed(),
            cipher_suite = suite.name,
            "server negotiated key exchange"
        );
        Ok((server_hello, self.transition()))
    }

    /// Name of the negotiated hybrid group, `None` if a classical curve was negotiated.
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
