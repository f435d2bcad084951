use super::{HandshakeServer, HandshakeServerBuilder, Missing, ServerFlight, parse_client_hello};
use crate::error::{HandshakeError, Result};
use crate::handshake::unexpected;
use crate::negotiation::{ClientOffer, NegotiatedGroup, ServerDecision, select_for_server};
use crate::protocol::key_share::parse_client_hybrid_share;
use crate::protocol::message::{HandshakeMessage, HelloRetryRequestPayload};
use crate::protocol::state::{AwaitingHrrDecision, Initial};
use tracing::{debug, warn};

impl<'a> HandshakeServer<'a, Initial> {
    /// Creates a new `HandshakeServerBuilder` to construct a `HandshakeServer`.
    ///
    /// 创建一个用于构造 `HandshakeServer` 的构建器。
    pub fn builder() -> HandshakeServerBuilder<'a, Missing> {
        HandshakeServerBuilder::new()
    }

    /// Processes the first `ClientHello`.
    ///
    /// The server accepts the client's hybrid share if it can, then asks for a hybrid
    /// group through a HelloRetryRequest, then accepts the classical share, then asks
    /// for a curve. Within each step its own preference order decides. Fails with
    /// [`HandshakeError::NoMutualGroup`] when nothing is mutual.
    ///
    /// 处理第一个 `ClientHello`。
    ///
    /// 服务器依次尝试：接受客户端的混合密钥共享、通过 HelloRetryRequest 请求某个混合组、
    /// 接受经典密钥共享、请求某条曲线。每一步中都由服务器自身的偏好顺序决定。
    pub fn process_client_hello(mut self, message: HandshakeMessage) -> Result<ServerFlight<'a>> {
        let HandshakeMessage::ClientHello(hello) = &message else {
            return Err(unexpected("ClientHello", &message));
        };

        let suite = self.select_cipher_suite(&hello.cipher_suites)?;
        let parsed = parse_client_hello(hello)?;

        if let Some((group, share)) = parsed.kem_share {
            let (_, len_prefixed) = parse_client_hybrid_share(group, share)?;
            self.negotiation.set_client_kem_group(group, len_prefixed);
        }
        if let Some((curve, _)) = parsed.ecc_share {
            self.negotiation.set_client_curve(curve);
        }

        let offer = ClientOffer {
            kem_groups: &parsed.kem_groups,
            curves: &parsed.curves,
            offered_kem_group: parsed.kem_share.map(|(group, _)| group),
            offered_curve: parsed.ecc_share.map(|(curve, _)| curve),
        };
        let decision = select_for_server(self.negotiation.capabilities(), self.policy, &offer)
            .inspect_err(|_| {
                warn!(
                    supported_groups = ?hello.supported_groups,
                    "no mutually supported group or curve"
                )
            })?;

        self.cipher_suite = Some(suite);
        self.transcript.update(&message)?;
        debug!(?decision, cipher_suite = suite.name, "server selected key exchange");

        let missing_share = || HandshakeError::Safety("selected share was not offered");
        match decision {
            ServerDecision::AcceptKemGroup(group) => {
                let (_, share) = parsed.kem_share.ok_or_else(missing_share)?;
                let (server_hello, server) = self.accept(NegotiatedGroup::KemGroup(group), share)?;
                Ok(ServerFlight::Hello(server_hello, server))
            }
            ServerDecision::AcceptCurve(curve) => {
                let (_, share) = parsed.ecc_share.ok_or_else(missing_share)?;
                let (server_hello, server) = self.accept(NegotiatedGroup::Curve(curve), share)?;
                Ok(ServerFlight::Hello(server_hello, server))
            }
            ServerDecision::RetryKemGroup(group) => {
                let (retry, server) = self.request_retry(group.iana_id)?;
                Ok(ServerFlight::HelloRetry(retry, server))
            }
            ServerDecision::RetryCurve(curve) => {
                let (retry, server) = self.request_retry(curve.iana_id)?;
                Ok(ServerFlight::HelloRetry(retry, server))
            }
        }
    }

    /// Sends a HelloRetryRequest for `group_id` and waits for the retried `ClientHello`.
    ///
    /// The first `ClientHello` must already be in the transcript.
    fn request_retry(
        mut self,
        group_id: u16,
    ) -> Result<(HandshakeMessage, HandshakeServer<'a, AwaitingHrrDecision>)> {
        let suite = self
            .cipher_suite
            .ok_or(HandshakeError::Safety("no cipher suite selected"))?;
        let retry = HandshakeMessage::HelloRetryRequest(HelloRetryRequestPayload {
            cipher_suite: suite.iana_id,
            selected_group: group_id,
        });

        self.transcript.replace_with_message_hash(suite.hash)?;
        self.transcript.update(&retry)?;
        self.negotiation.clear_candidates();
        self.retry_group = Some(group_id);

        debug!(
            group = group_id,
            hrr = true,
            cipher_suite = suite.name,
            "server sent HelloRetryRequest"
        );
        Ok((retry, self.transition()))
    }
}
