use super::{HandshakeServer, parse_client_hello};
use crate::error::{HandshakeError, ProtocolViolation, Result};
use crate::handshake::unexpected;
use crate::negotiation::NegotiatedGroup;
use crate::protocol::key_share::parse_client_hybrid_share;
use crate::protocol::message::HandshakeMessage;
use crate::protocol::state::{AwaitingHrrDecision, Negotiated};
use tracing::warn;

impl<'a> HandshakeServer<'a, AwaitingHrrDecision> {
    /// Processes the `ClientHello` sent in answer to the HelloRetryRequest.
    ///
    /// It must still offer the selected cipher suite and carry exactly one key share,
    /// for the requested group. Anything else is a fatal protocol violation.
    ///
    /// 处理客户端为响应 HelloRetryRequest 而发送的 `ClientHello`。
    /// 它必须仍然提供所选的密码套件，并且只携带一个针对所请求组的密钥共享，否则为致命的协议错误。
    pub fn process_retried_client_hello(
        mut self,
        message: HandshakeMessage,
    ) -> Result<(HandshakeMessage, HandshakeServer<'a, Negotiated>)> {
        let HandshakeMessage::ClientHello(hello) = &message else {
            return Err(unexpected("ClientHello", &message));
        };
        let suite = self
            .cipher_suite
            .ok_or(HandshakeError::Safety("no cipher suite selected"))?;
        let requested = self
            .retry_group
            .ok_or(HandshakeError::Safety("no HelloRetryRequest was sent"))?;

        if !hello.cipher_suites.contains(&suite.iana_id) {
            warn!(cipher_suite = suite.iana_id, "retried ClientHello drops the selected cipher suite");
            return Err(ProtocolViolation::CipherSuiteMismatch(suite.iana_id).into());
        }

        let parsed = parse_client_hello(hello)?;
        let mismatch = || {
            warn!(
                requested,
                offered = ?hello.key_shares.iter().map(|entry| entry.group).collect::<Vec<_>>(),
                "retried ClientHello does not answer the HelloRetryRequest"
            );
            HandshakeError::from(ProtocolViolation::RetryMismatch { requested })
        };
        let [entry] = hello.key_shares.as_slice() else {
            return Err(mismatch());
        };

        let selected = match (parsed.kem_share, parsed.ecc_share) {
            (Some((group, share)), _) if group.iana_id == requested => {
                let (_, len_prefixed) = parse_client_hybrid_share(group, share)?;
                self.negotiation.set_client_kem_group(group, len_prefixed);
                NegotiatedGroup::KemGroup(group)
            }
            (_, Some((curve, _))) if curve.iana_id == requested => {
                self.negotiation.set_client_curve(curve);
                NegotiatedGroup::Curve(curve)
            }
            _ => return Err(mismatch()),
        };

        self.transcript.update(&message)?;
        self.accept(selected, &entry.key_exchange)
    }
}
