use super::HandshakeServer;
use crate::crypto::keys::Tls13Secrets;
use crate::crypto::suite::CipherSuite;
use crate::error::{HandshakeError, Result};
use crate::protocol::state::Negotiated;

impl HandshakeServer<'_, Negotiated> {
    /// Returns the handshake secrets that passed the derivation gate.
    ///
    /// 返回通过派生检查的握手密钥。
    pub fn secrets(&self) -> Result<&Tls13Secrets> {
        self.secrets
            .as_ref()
            .ok_or(HandshakeError::NegotiationIncomplete)
    }

    pub fn cipher_suite(&self) -> Result<&'static CipherSuite> {
        self.cipher_suite
            .ok_or(HandshakeError::NegotiationIncomplete)
    }

    /// The hybrid share encoding the client used and the server echoed.
    pub fn len_prefixed(&self) -> bool {
        self.negotiation.len_prefixed()
    }

    pub fn hello_retry_requested(&self) -> bool {
        self.retry_group.is_some()
    }
}
