//! The seam between the key-exchange state machine and the record layer.
//!
//! The state machine never performs I/O itself. It consumes already-buffered
//! handshake messages and hands back the ones to send; moving bytes is the job of a
//! [`HandshakeIo`] implementation. [`MemoryTransport`] connects two peers in the same
//! process and is what the tests drive handshakes over.
//!
//! 密钥交换状态机与记录层之间的接口。状态机本身从不执行 I/O。

use crate::error::{Result, TransportError};
use crate::protocol::message::HandshakeMessage;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Moves whole, opaque handshake messages to and from the peer.
pub trait HandshakeIo {
    fn write_handshake_message(&mut self, message: &[u8]) -> std::result::Result<(), TransportError>;

    /// Returns the next complete message, or [`TransportError::WouldBlock`] when none
    /// is buffered yet.
    fn read_handshake_message(&mut self) -> std::result::Result<Vec<u8>, TransportError>;
}

type Queue = Rc<RefCell<VecDeque<Vec<u8>>>>;

/// One end of an in-process, message-preserving pipe.
///
/// Both ends belong to the thread that drives the two handshakes.
#[derive(Debug)]
pub struct MemoryTransport {
    inbound: Queue,
    outbound: Queue,
}

impl MemoryTransport {
    /// Creates two connected ends; whatever one writes, the other reads.
    pub fn pair() -> (Self, Self) {
        let a_to_b: Queue = Rc::default();
        let b_to_a: Queue = Rc::default();
        (
            Self {
                inbound: Rc::clone(&b_to_a),
                outbound: Rc::clone(&a_to_b),
            },
            Self {
                inbound: a_to_b,
                outbound: b_to_a,
            },
        )
    }

    /// Number of messages waiting to be read on this end.
    pub fn pending(&self) -> usize {
        self.inbound.borrow().len()
    }

    fn peer_gone(&self) -> bool {
        Rc::strong_count(&self.outbound) == 1
    }
}

impl HandshakeIo for MemoryTransport {
    fn write_handshake_message(&mut self, message: &[u8]) -> std::result::Result<(), TransportError> {
        if self.peer_gone() {
            return Err(TransportError::Closed);
        }
        self.outbound.borrow_mut().push_back(message.to_vec());
        Ok(())
    }

    fn read_handshake_message(&mut self) -> std::result::Result<Vec<u8>, TransportError> {
        if let Some(message) = self.inbound.borrow_mut().pop_front() {
            return Ok(message);
        }
        if Rc::strong_count(&self.inbound) == 1 {
            Err(TransportError::Closed)
        } else {
            Err(TransportError::WouldBlock)
        }
    }
}

/// Encodes `message` and writes it to `io`.
///
/// 编码 `message` 并写入 `io`。
pub fn send_message<T: HandshakeIo + ?Sized>(io: &mut T, message: &HandshakeMessage) -> Result<()> {
    let bytes = message.to_bytes()?;
    io.write_handshake_message(&bytes)?;
    tracing::trace!(message = message.name(), len = bytes.len(), "handshake message written");
    Ok(())
}

/// Reads and decodes the next message from `io`.
///
/// 从 `io` 读取并解码下一条消息。
pub fn recv_message<T: HandshakeIo + ?Sized>(io: &mut T) -> Result<HandshakeMessage> {
    let bytes = io.read_handshake_message()?;
    let message = HandshakeMessage::from_bytes(&bytes)?;
    tracing::trace!(message = message.name(), len = bytes.len(), "handshake message read");
    Ok(message)
}
