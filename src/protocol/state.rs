//! Defines the states of the key-exchange state machine.
//!
//! These are zero-sized marker structs used to enforce the protocol flow at compile
//! time. Each state represents a specific point in the handshake, and only valid
//! transitions are exposed in the API.
//!
//! 定义密钥交换状态机的各个状态。这些零大小的标记结构体用于在编译时强制执行协议流程。

/// Nothing has been sent or received yet, client or server.
#[derive(Debug)]
pub struct Initial;

/// Client: the first ClientHello is out and the server's answer decides whether a
/// retry is needed. Server: a HelloRetryRequest is out and the retried ClientHello
/// is awaited.
#[derive(Debug)]
pub struct AwaitingHrrDecision;

/// A client that answered a HelloRetryRequest and awaits the ServerHello.
#[derive(Debug)]
pub struct Retry;

/// A group or curve is recorded and the handshake secrets passed the derivation gate.
#[derive(Debug)]
pub struct Negotiated;
