//! Ephemeral key-share engines.
//!
//! An engine owns the private half of one key share for the lifetime of a
//! handshake. The client creates engines when it builds a ClientHello and drops
//! them when a HelloRetryRequest makes them obsolete; the server creates one only
//! for the group it commits to and finishes it immediately.
//!
//! 临时密钥共享引擎。引擎在整个握手期间持有某个密钥共享的私钥部分。

use crate::crypto::backend::{EcdhKeyPair, KemKeyPair, ecdh_provider, kem_provider};
use crate::error::Result;
use crate::policy::ecc::EccCurve;
use crate::policy::kem::KemGroup;
use crate::protocol::key_share::{
    HybridShare, check_ecc_share, encode_hybrid_share, parse_client_hybrid_share,
    parse_server_hybrid_share,
};
use zeroize::Zeroizing;

/// A classical (EC)DHE key share.
pub struct EccKeyShare {
    curve: &'static EccCurve,
    key_pair: EcdhKeyPair,
}

impl EccKeyShare {
    /// Creates a new engine for the client, generating an ephemeral key pair.
    ///
    /// 为客户端创建一个新的引擎，生成一个临时的密钥对。
    pub fn new_for_client(curve: &'static EccCurve) -> Result<Self> {
        let key_pair = ecdh_provider(curve)?.generate_keypair()?;
        Ok(Self { curve, key_pair })
    }

    /// Creates a new engine for the server, generating an ephemeral key pair,
    /// and computes the shared secret with the client's share.
    ///
    /// 为服务器创建一个新的引擎，生成一个临时的密钥对，并与客户端的公钥计算共享密钥。
    pub fn new_for_server(
        curve: &'static EccCurve,
        client_share: &[u8],
    ) -> Result<(Self, Zeroizing<Vec<u8>>)> {
        let engine = Self::new_for_client(curve)?;
        let shared_secret = engine.agree(client_share)?;
        Ok((engine, shared_secret))
    }

    /// Computes the shared secret with the peer's public share.
    ///
    /// 使用此引擎的私钥和对方的公钥计算共享密钥。
    pub fn agree(&self, peer_share: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        check_ecc_share(self.curve, peer_share)?;
        ecdh_provider(self.curve)?.agree(&self.key_pair.private_key, peer_share)
    }

    pub fn public_key(&self) -> &[u8] {
        &self.key_pair.public_key
    }

    pub fn curve(&self) -> &'static EccCurve {
        self.curve
    }
}

/// The client half of a hybrid key share.
pub struct KemGroupKeyShare {
    group: &'static KemGroup,
    ecc: EccKeyShare,
    kem_key_pair: KemKeyPair,
    len_prefixed: bool,
}

/// What the server sends back for a hybrid group, plus its view of the secret.
pub struct HybridServerShare {
    pub key_exchange: Vec<u8>,
    pub shared_secret: Zeroizing<Vec<u8>>,
    /// The encoding the client used, echoed in `key_exchange`.
    pub len_prefixed: bool,
}

impl KemGroupKeyShare {
    pub fn new_for_client(group: &'static KemGroup, len_prefixed: bool) -> Result<Self> {
        let ecc = EccKeyShare::new_for_client(group.curve)?;
        let kem_key_pair = kem_provider(group.kem)?.generate_keypair()?;
        Ok(Self {
            group,
            ecc,
            kem_key_pair,
            len_prefixed,
        })
    }

    /// The encoded `key_exchange` bytes of the client's share.
    pub fn key_exchange(&self) -> Vec<u8> {
        encode_hybrid_share(
            self.group,
            HybridShare {
                ecc: self.ecc.public_key(),
                kem: &self.kem_key_pair.public_key,
            },
            self.len_prefixed,
        )
    }

    /// Server side: answers a client's hybrid share in whichever encoding it used.
    pub fn respond(group: &'static KemGroup, client_share: &[u8]) -> Result<HybridServerShare> {
        let (share, len_prefixed) = parse_client_hybrid_share(group, client_share)?;

        let (ecc, ecdhe_secret) = EccKeyShare::new_for_server(group.curve, share.ecc)?;
        let (ciphertext, kem_secret) = kem_provider(group.kem)?.encapsulate(share.kem)?;

        let key_exchange = encode_hybrid_share(
            group,
            HybridShare {
                ecc: ecc.public_key(),
                kem: &ciphertext,
            },
            len_prefixed,
        );
        Ok(HybridServerShare {
            key_exchange,
            shared_secret: combine_hybrid_secret(group, &ecdhe_secret, &kem_secret),
            len_prefixed,
        })
    }

    /// Client side: completes the exchange with the server's hybrid share.
    pub fn finish(&self, server_share: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let share = parse_server_hybrid_share(self.group, server_share, self.len_prefixed)?;
        let ecdhe_secret = self.ecc.agree(share.ecc)?;
        let kem_secret =
            kem_provider(self.group.kem)?.decapsulate(&self.kem_key_pair.private_key, share.kem)?;
        Ok(combine_hybrid_secret(self.group, &ecdhe_secret, &kem_secret))
    }

    pub fn group(&self) -> &'static KemGroup {
        self.group
    }

    pub fn len_prefixed(&self) -> bool {
        self.len_prefixed
    }
}

/// Concatenates the component secrets in the order the group mandates.
pub fn combine_hybrid_secret(
    group: &KemGroup,
    ecdhe_secret: &[u8],
    kem_secret: &[u8],
) -> Zeroizing<Vec<u8>> {
    let mut combined = Zeroizing::new(Vec::with_capacity(ecdhe_secret.len() + kem_secret.len()));
    if group.send_kem_first {
        combined.extend_from_slice(kem_secret);
        combined.extend_from_slice(ecdhe_secret);
    } else {
        combined.extend_from_slice(ecdhe_secret);
        combined.extend_from_slice(kem_secret);
    }
    combined
}
