use super::HandshakeClient;
use crate::crypto::keys::Tls13Secrets;
use crate::crypto::suite::CipherSuite;
use crate::error::{HandshakeError, Result};
use crate::protocol::state::Negotiated;

impl HandshakeClient<'_, Negotiated> {
    /// Returns the handshake secrets that passed the derivation gate.
    ///
    /// 返回通过派生检查的握手密钥。
    pub fn secrets(&self) -> Result<&Tls13Secrets> {
        self.secrets
            .as_ref()
            .ok_or(HandshakeError::NegotiationIncomplete)
    }

    /// Returns the negotiated TLS 1.3 cipher suite.
    pub fn cipher_suite(&self) -> Result<&'static CipherSuite> {
        self.cipher_suite
            .ok_or(HandshakeError::NegotiationIncomplete)
    }

    /// Whether the hybrid share carried per-component length prefixes.
    ///
    /// Only meaningful when a hybrid group was negotiated.
    pub fn len_prefixed(&self) -> bool {
        self.negotiation.len_prefixed()
    }

    /// Whether the server asked for another key share before agreeing.
    pub fn hello_retry_requested(&self) -> bool {
        self.retry_group.is_some()
    }
}
