use crate::error::{ProtocolViolation, Result};
use crate::protocol::key_share::KeyShareEntry;
use bincode::config::{Configuration, standard};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

fn codec() -> Configuration {
    standard()
}

/// Contents of a ClientHello that matter to key exchange.
#[derive(Serialize, Deserialize, bincode::Encode, bincode::Decode, Debug, Clone, PartialEq, Eq)]
pub struct ClientHelloPayload {
    pub random: [u8; 32],
    /// TLS 1.3 cipher suite ids, most preferred first.
    pub cipher_suites: Vec<u16>,
    /// `supported_groups`: hybrid group ids first, then curve ids, each in preference order.
    pub supported_groups: Vec<u16>,
    pub key_shares: Vec<KeyShareEntry>,
}

/// A HelloRetryRequest asking for a share of `selected_group`.
#[derive(Serialize, Deserialize, bincode::Encode, bincode::Decode, Debug, Clone, PartialEq, Eq)]
pub struct HelloRetryRequestPayload {
    pub cipher_suite: u16,
    pub selected_group: u16,
}

#[derive(Serialize, Deserialize, bincode::Encode, bincode::Decode, Debug, Clone, PartialEq, Eq)]
pub struct ServerHelloPayload {
    pub random: [u8; 32],
    pub cipher_suite: u16,
    pub key_share: KeyShareEntry,
}

/// Defines the messages exchanged during the key-exchange part of the handshake.
///
/// 定义握手中密钥交换部分所交换的消息。
#[derive(Serialize, Deserialize, bincode::Encode, bincode::Decode, Debug, Clone, PartialEq, Eq)]
pub enum HandshakeMessage {
    /// Client -> Server: offers cipher suites, groups and up to one hybrid and one classical share.
    ClientHello(ClientHelloPayload),

    /// Server -> Client: asks the client to retry with a share for another group.
    HelloRetryRequest(HelloRetryRequestPayload),

    /// Server -> Client: the server's key share for the negotiated group.
    ServerHello(ServerHelloPayload),
}

impl HandshakeMessage {
    pub fn name(&self) -> &'static str {
        match self {
            HandshakeMessage::ClientHello(_) => "ClientHello",
            HandshakeMessage::HelloRetryRequest(_) => "HelloRetryRequest",
            HandshakeMessage::ServerHello(_) => "ServerHello",
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::encode_to_vec(self, codec())?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (message, read) = bincode::decode_from_slice(bytes, codec())?;
        if read != bytes.len() {
            let trailing = bytes.len() - read;
            tracing::warn!(trailing, "handshake message has trailing bytes");
            return Err(ProtocolViolation::TrailingBytes(trailing).into());
        }
        Ok(message)
    }
}

/// A fresh 32-byte hello random.
pub fn hello_random() -> [u8; 32] {
    let mut random = [0u8; 32];
    OsRng.fill_bytes(&mut random);
    random
}
