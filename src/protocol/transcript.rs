//! Manages the handshake transcript.
//!
//! The hash function is only known once a cipher suite is chosen, which can be after
//! the first ClientHello went out. The transcript therefore keeps the encoded messages
//! and hashes them on demand with whichever hash the negotiated suite names.
//!
//! 管理握手记录。
//!
//! 哈希函数只有在选定密码套件后才确定，而这可能发生在第一个 ClientHello 发出之后。
//! 因此握手记录保存编码后的消息，并按需使用协商出的套件所指定的哈希函数计算哈希。
use crate::crypto::suite::HashAlgorithm;
use crate::error::{HandshakeError, Result};
use crate::protocol::message::HandshakeMessage;

/// Handshake type of the synthetic `message_hash` message (RFC 8446 §4.4.1).
const MESSAGE_HASH_TYPE: u8 = 254;

#[derive(Debug, Clone, Default)]
pub struct Transcript {
    bytes: Vec<u8>,
}

impl Transcript {
    /// Creates a new, empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handshake message in its encoded form.
    ///
    /// 以编码形式追加一条握手消息。
    pub fn update(&mut self, message: &HandshakeMessage) -> Result<()> {
        self.bytes.extend_from_slice(&message.to_bytes()?);
        Ok(())
    }

    /// Replaces everything recorded so far (the first ClientHello) with the
    /// synthetic `message_hash` message, as required before a HelloRetryRequest is
    /// added to the transcript.
    ///
    /// 在将 HelloRetryRequest 加入握手记录之前，用合成的 `message_hash` 消息
    /// 替换目前记录的全部内容（即第一个 ClientHello）。
    pub fn replace_with_message_hash(&mut self, hash: HashAlgorithm) -> Result<()> {
        let digest = hash.digest(&self.bytes);
        let digest_len = u8::try_from(digest.len())
            .map_err(|_| HandshakeError::Safety("transcript digest is too long"))?;

        self.bytes.clear();
        self.bytes
            .extend_from_slice(&[MESSAGE_HASH_TYPE, 0, 0, digest_len]);
        self.bytes.extend_from_slice(&digest);
        Ok(())
    }

    /// Returns the hash of everything recorded so far without consuming the transcript.
    ///
    /// 返回目前记录内容的哈希，而不会消耗握手记录。
    pub fn current_hash(&self, hash: HashAlgorithm) -> Vec<u8> {
        hash.digest(&self.bytes)
    }
}
