use thiserror::Error;

/// An error related to `bincode` serialization or deserialization.
///
/// This is a wrapper around `bincode`'s own error types to provide a more
/// consistent error handling experience within this crate.
///
/// 与 `bincode` 序列化或反序列化相关的错误。
///
/// 这是对 `bincode` 自身错误类型的包装，以便在此 crate 中提供更一致的错误处理体验。
#[derive(Error, Debug)]
pub enum BincodeError {
    /// An error occurred during serialization (encoding).
    ///
    /// 在序列化（编码）过程中发生错误。
    #[error("Encode error: {0}")]
    Enc(#[source] Box<bincode::error::EncodeError>),
    /// An error occurred during deserialization (decoding).
    ///
    /// 在反序列化（解码）过程中发生错误。
    #[error("Decode error: {0}")]
    Dec(#[source] Box<bincode::error::DecodeError>),
}

impl From<bincode::error::EncodeError> for BincodeError {
    fn from(err: bincode::error::EncodeError) -> Self {
        BincodeError::Enc(Box::from(err))
    }
}

impl From<bincode::error::DecodeError> for BincodeError {
    fn from(err: bincode::error::DecodeError) -> Self {
        BincodeError::Dec(Box::from(err))
    }
}

/// Errors raised by the record/transport collaborator. Propagated unchanged.
///
/// 由记录层/传输层协作者产生的错误，原样向上传播。
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// No complete handshake message is buffered yet.
    #[error("no handshake message is buffered")]
    WouldBlock,

    /// The peer end of the transport has gone away.
    #[error("transport closed by peer")]
    Closed,

    #[error("transport I/O failed: {0}")]
    Io(String),
}

/// Ways in which a peer can break the key-exchange protocol.
///
/// Every variant is fatal to the connection.
///
/// 对端违反密钥交换协议的各种方式。每一种都会导致连接终止。
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolViolation {
    #[error("unexpected handshake message: expected {expected}, got {received}")]
    UnexpectedMessage {
        expected: &'static str,
        received: &'static str,
    },

    #[error("retried ClientHello does not carry a key share for the requested group {requested:#06x}")]
    RetryMismatch { requested: u16 },

    #[error("key share for group {group:#06x} is malformed")]
    MalformedKeyShare { group: u16 },

    #[error("key share names group {0:#06x} which was never offered")]
    UnofferedGroup(u16),

    #[error("HelloRetryRequest names group {0:#06x} which the client does not support")]
    UnsupportedRetryGroup(u16),

    #[error("HelloRetryRequest would not change the ClientHello (group {0:#06x} already offered)")]
    RedundantRetry(u16),

    #[error("a second HelloRetryRequest was received")]
    SecondRetry,

    #[error("cipher suite {0:#06x} was not offered or changed after HelloRetryRequest")]
    CipherSuiteMismatch(u16),

    #[error("no TLS 1.3 cipher suite in common")]
    NoSharedCipherSuite,

    #[error("peer sent more than one key share for group {0:#06x}")]
    DuplicateKeyShare(u16),

    #[error("{0} trailing bytes after handshake message")]
    TrailingBytes(usize),
}

#[derive(Debug, Error)]
pub enum HandshakeError {
    /// A configuration or internal invariant was broken. Never recovered.
    ///
    /// 配置或内部不变量被破坏，永不恢复。
    #[error("safety check failed: {0}")]
    Safety(&'static str),

    #[error("protocol violation: {0}")]
    Protocol(#[from] ProtocolViolation),

    #[error("no mutually supported key exchange group or curve")]
    NoMutualGroup,

    #[error("key exchange negotiation has not completed")]
    NegotiationIncomplete,

    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("serialization or deserialization failed: {0}")]
    Serialization(#[from] BincodeError),

    #[error("cryptographic operation failed: {0}")]
    Crypto(String),

    #[error("builder is missing required field `{0}`")]
    BuilderMissingField(&'static str),
}

impl From<bincode::error::EncodeError> for HandshakeError {
    fn from(err: bincode::error::EncodeError) -> Self {
        HandshakeError::Serialization(err.into())
    }
}

impl From<bincode::error::DecodeError> for HandshakeError {
    fn from(err: bincode::error::DecodeError) -> Self {
        HandshakeError::Serialization(err.into())
    }
}

pub type Result<T> = std::result::Result<T, HandshakeError>;
