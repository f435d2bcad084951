use super::HandshakeClient;
use crate::error::{ProtocolViolation, Result};
use crate::handshake::unexpected;
use crate::protocol::message::HandshakeMessage;
use crate::protocol::state::{Negotiated, Retry};
use tracing::warn;

impl<'a> HandshakeClient<'a, Retry> {
    /// Processes the `ServerHello` that answers the retried `ClientHello`.
    ///
    /// It must keep the cipher suite and select the group named by the
    /// HelloRetryRequest. A second HelloRetryRequest is fatal.
    ///
    /// 处理对重试 `ClientHello` 的 `ServerHello` 答复。
    /// 它必须保持密码套件不变，并选择 HelloRetryRequest 中指定的组。第二个 HelloRetryRequest 是致命错误。
    pub fn process_server_hello(
        self,
        message: HandshakeMessage,
    ) -> Result<HandshakeClient<'a, Negotiated>> {
        let server_hello = match &message {
            HandshakeMessage::ServerHello(server_hello) => server_hello,
            HandshakeMessage::HelloRetryRequest(_) => {
                warn!("server sent a second HelloRetryRequest");
                return Err(ProtocolViolation::SecondRetry.into());
            }
            HandshakeMessage::ClientHello(_) => return Err(unexpected("ServerHello", &message)),
        };

        if self.cipher_suite.map(|suite| suite.iana_id) != Some(server_hello.cipher_suite) {
            warn!(
                cipher_suite = server_hello.cipher_suite,
                "ServerHello changes the cipher suite chosen by HelloRetryRequest"
            );
            return Err(ProtocolViolation::CipherSuiteMismatch(server_hello.cipher_suite).into());
        }
        if let Some(requested) = self.retry_group {
            if server_hello.key_share.group != requested {
                warn!(
                    requested,
                    group = server_hello.key_share.group,
                    "ServerHello ignores the group requested by HelloRetryRequest"
                );
                return Err(ProtocolViolation::RetryMismatch { requested }.into());
            }
        }

        self.finish_server_hello(&message, server_hello)
    }
}
