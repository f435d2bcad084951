use super::{ClientFlight, HandshakeClient};
use crate::crypto::engine::{EccKeyShare, KemGroupKeyShare};
use crate::error::{HandshakeError, ProtocolViolation, Result};
use crate::handshake::unexpected;
use crate::policy::kem::tls13_client_must_use_hybrid_kem_length_prefix;
use crate::protocol::key_share::KeyShareEntry;
use crate::protocol::message::{HandshakeMessage, HelloRetryRequestPayload};
use crate::protocol::state::{AwaitingHrrDecision, Retry};
use tracing::{debug, warn};

impl<'a> HandshakeClient<'a, AwaitingHrrDecision> {
    /// Processes the server's answer to the first `ClientHello`.
    ///
    /// A `ServerHello` completes the exchange with one of the shares already sent. A
    /// `HelloRetryRequest` makes every offered share obsolete: the client drops them,
    /// generates exactly one share for the group the server named and returns the
    /// retried `ClientHello` to send.
    ///
    /// 处理服务器对第一个 `ClientHello` 的答复。
    ///
    /// `ServerHello` 使用已发送的某个密钥共享完成交换。`HelloRetryRequest` 会使所有已提供的
    /// 密钥共享作废：客户端丢弃它们，只为服务器指定的组生成一个新的密钥共享，并返回需要发送的
    /// 重试 `ClientHello`。
    pub fn process_server_flight(self, message: HandshakeMessage) -> Result<ClientFlight<'a>> {
        match &message {
            HandshakeMessage::ServerHello(server_hello) => {
                let client = self.finish_server_hello(&message, server_hello)?;
                Ok(ClientFlight::Negotiated(client))
            }
            HandshakeMessage::HelloRetryRequest(retry) => {
                let (client_hello, client) = self.answer_retry(&message, retry)?;
                Ok(ClientFlight::Retry(client_hello, client))
            }
            HandshakeMessage::ClientHello(_) => Err(unexpected("ServerHello", &message)),
        }
    }

    fn answer_retry(
        mut self,
        message: &HandshakeMessage,
        retry: &HelloRetryRequestPayload,
    ) -> Result<(HandshakeMessage, HandshakeClient<'a, Retry>)> {
        let suite = self.offered_cipher_suite(retry.cipher_suite)?;
        let requested = retry.selected_group;

        let already_offered = self
            .negotiation
            .client_kem_group()
            .is_some_and(|group| group.iana_id == requested)
            || self
                .negotiation
                .client_curve()
                .is_some_and(|curve| curve.iana_id == requested);
        if already_offered {
            warn!(group = requested, "HelloRetryRequest names a group that already has a share");
            return Err(ProtocolViolation::RedundantRetry(requested).into());
        }

        let kem_group = self
            .advertised_kem_groups()
            .into_iter()
            .find(|group| group.iana_id == requested);
        let curve = self
            .advertised_curves()
            .into_iter()
            .find(|curve| curve.iana_id == requested);

        // Shares of the first ClientHello are obsolete from here on.
        self.negotiation.clear_candidates();
        self.kem_share = None;
        self.ecc_share = None;

        let key_share = match (kem_group, curve) {
            (Some(group), _) => {
                let len_prefixed =
                    tls13_client_must_use_hybrid_kem_length_prefix(self.policy.kem_preferences);
                let share = KemGroupKeyShare::new_for_client(group, len_prefixed)?;
                let entry = KeyShareEntry::new(group.iana_id, share.key_exchange());
                self.negotiation.set_client_kem_group(group, len_prefixed);
                self.kem_share = Some(share);
                entry
            }
            (None, Some(curve)) => {
                let share = EccKeyShare::new_for_client(curve)?;
                let entry = KeyShareEntry::new(curve.iana_id, share.public_key().to_vec());
                self.negotiation.set_client_curve(curve);
                self.ecc_share = Some(share);
                entry
            }
            (None, None) => {
                warn!(group = requested, "HelloRetryRequest names an unsupported group");
                return Err(ProtocolViolation::UnsupportedRetryGroup(requested).into());
            }
        };

        let mut client_hello = self
            .client_hello
            .clone()
            .ok_or(HandshakeError::Safety("retry without a first ClientHello"))?;
        client_hello.key_shares = vec![key_share];
        let retried = HandshakeMessage::ClientHello(client_hello);

        self.transcript.replace_with_message_hash(suite.hash)?;
        self.transcript.update(message)?;
        self.transcript.update(&retried)?;
        self.cipher_suite = Some(suite);
        self.retry_group = Some(requested);

        debug!(
            group = requested,
            hrr = true,
            len_prefixed = self.negotiation.len_prefixed(),
            cipher_suite = suite.name,
            "client answered HelloRetryRequest"
        );
        Ok((retried, self.transition()))
    }
}
