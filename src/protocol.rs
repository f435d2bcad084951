//! Handshake messages, their key-share payloads, and the transcript they form.

pub mod key_share;
pub mod message;
pub mod state;
pub mod transcript;
