//! Hybrid post-quantum key-exchange negotiation for TLS 1.3.
//!
//! A [`policy::SecurityPolicy`] names the hybrid groups and classical curves one side
//! is willing to use. [`negotiation`] predicts and performs the selection between two
//! such policies, and [`handshake`] drives the ClientHello / HelloRetryRequest /
//! ServerHello exchange up to verified handshake secrets.
//!
//! TLS 1.3 的混合后量子密钥交换协商。

pub mod crypto;
pub mod error;
pub mod handshake;
pub mod negotiation;
pub mod policy;
pub mod protocol;
pub mod transport;

pub use crypto::capabilities::{Capabilities, kem_group_is_available};
pub use error::{HandshakeError, Result};
pub use handshake::client::{ClientFlight, HandshakeClient};
pub use handshake::server::{HandshakeServer, ServerFlight};
pub use negotiation::{NegotiatedGroup, predict_ecc_curve, predict_kem_group};
