use super::{HandshakeClient, HandshakeClientBuilder};
use crate::crypto::engine::{EccKeyShare, KemGroupKeyShare};
use crate::error::{HandshakeError, Result};
use crate::policy::kem::tls13_client_must_use_hybrid_kem_length_prefix;
use crate::protocol::key_share::KeyShareEntry;
use crate::protocol::message::{ClientHelloPayload, HandshakeMessage, hello_random};
use crate::protocol::state::{AwaitingHrrDecision, Initial};
use tracing::debug;

impl<'a> HandshakeClient<'a, Initial> {
    /// Creates a new `HandshakeClientBuilder` to construct a `HandshakeClient`.
    ///
    /// 创建一个用于构造 `HandshakeClient` 的构建器。
    pub fn builder() -> HandshakeClientBuilder<'a> {
        HandshakeClientBuilder::new()
    }

    /// Starts the handshake by creating the first `ClientHello`.
    ///
    /// The hello advertises every hybrid group and curve of the policy that the backend
    /// can serve. It carries one hybrid key share for the most preferred of those groups
    /// and, when the policy sends classical shares eagerly, one share for the most
    /// preferred curve. The client then waits for the server to accept a share or ask
    /// for another one.
    ///
    /// 通过创建第一个 `ClientHello` 来启动握手。
    ///
    /// 该消息列出策略中后端能够提供的全部混合组和曲线，为其中最优先的混合组携带一个密钥共享；
    /// 若策略要求立即发送经典密钥共享，还会为最优先的曲线携带一个。
    pub fn start_handshake(
        mut self,
    ) -> Result<(HandshakeMessage, HandshakeClient<'a, AwaitingHrrDecision>)> {
        let kem_groups = self.advertised_kem_groups();
        let curves = self.advertised_curves();
        if kem_groups.is_empty() && curves.is_empty() {
            return Err(HandshakeError::Safety(
                "policy names no group or curve the backend can serve",
            ));
        }

        let mut key_shares = Vec::with_capacity(2);
        if let Some(&group) = kem_groups.first() {
            let len_prefixed =
                tls13_client_must_use_hybrid_kem_length_prefix(self.policy.kem_preferences);
            let share = KemGroupKeyShare::new_for_client(group, len_prefixed)?;
            key_shares.push(KeyShareEntry::new(group.iana_id, share.key_exchange()));
            self.negotiation.set_client_kem_group(group, len_prefixed);
            self.kem_share = Some(share);
        }
        if self.policy.eager_ecc_share {
            if let Some(&curve) = curves.first() {
                let share = EccKeyShare::new_for_client(curve)?;
                key_shares.push(KeyShareEntry::new(curve.iana_id, share.public_key().to_vec()));
                self.negotiation.set_client_curve(curve);
                self.ecc_share = Some(share);
            }
        }

        let client_hello = ClientHelloPayload {
            random: hello_random(),
            cipher_suites: self
                .policy
                .cipher_preferences
                .tls13_suites()
                .map(|suite| suite.iana_id)
                .collect(),
            supported_groups: kem_groups
                .iter()
                .map(|group| group.iana_id)
                .chain(curves.iter().map(|curve| curve.iana_id))
                .collect(),
            key_shares,
        };
        let message = HandshakeMessage::ClientHello(client_hello.clone());
        self.transcript.update(&message)?;
        self.client_hello = Some(client_hello);

        debug!(
            group = self.negotiation.client_kem_group().map(|group| group.name),
            curve = self.negotiation.client_curve().map(|curve| curve.name),
            len_prefixed = self.negotiation.len_prefixed(),
            "client sent ClientHello"
        );
        Ok((message, self.transition()))
    }
}
