//! The key-exchange state machines of both peers.
//!
//! 双方的密钥交换状态机。

pub mod client;
pub mod server;

use crate::error::{HandshakeError, ProtocolViolation};
use crate::protocol::message::HandshakeMessage;

/// Rejects a message that is not the one the current state expects.
pub(crate) fn unexpected(expected: &'static str, received: &HandshakeMessage) -> HandshakeError {
    tracing::warn!(expected, received = received.name(), "unexpected handshake message");
    ProtocolViolation::UnexpectedMessage {
        expected,
        received: received.name(),
    }
    .into()
}
