//! Derivation of the TLS 1.3 handshake secrets and the checks that gate them.
//!
//! Both peers run [`derive_handshake_secrets`] once negotiation has produced a shared
//! key-exchange output. The result is only trusted after it passes
//! [`SecretDerivationGate::check`].
//!
//! 派生 TLS 1.3 握手密钥，以及在使用这些密钥之前必须通过的检查。
//!
//! 协商得到共享的密钥交换输出后，双方都会调用 [`derive_handshake_secrets`]。
//! 结果只有在通过 [`SecretDerivationGate::check`] 之后才会被信任。

use crate::crypto::suite::{CipherSuite, HashAlgorithm};
use crate::error::{HandshakeError, Result};
use subtle::{Choice, ConstantTimeEq};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Which secret currently occupies the extract slot of the key schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractSecretType {
    None,
    Early,
    Handshake,
    Master,
}

/// The secrets a TLS 1.3 connection holds once the ServerHello is processed.
///
/// 处理完 ServerHello 后 TLS 1.3 连接所持有的密钥。
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Tls13Secrets {
    #[zeroize(skip)]
    pub extract_secret_type: ExtractSecretType,
    pub extract_secret: Vec<u8>,
    pub client_handshake_secret: Vec<u8>,
    pub server_handshake_secret: Vec<u8>,
}

impl std::fmt::Debug for Tls13Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tls13Secrets")
            .field("extract_secret_type", &self.extract_secret_type)
            .field("len", &self.extract_secret.len())
            .finish_non_exhaustive()
    }
}

impl Tls13Secrets {
    /// Constant-time comparison of every secret with `other`'s.
    pub fn matches(&self, other: &Self) -> bool {
        let same = self.extract_secret.ct_eq(&other.extract_secret)
            & self
                .client_handshake_secret
                .ct_eq(&other.client_handshake_secret)
            & self
                .server_handshake_secret
                .ct_eq(&other.server_handshake_secret);
        self.extract_secret_type == other.extract_secret_type && bool::from(same)
    }

    pub fn len(&self) -> usize {
        self.extract_secret.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extract_secret.is_empty()
    }
}

/// HKDF-Expand-Label from RFC 8446 §7.1.
pub fn hkdf_expand_label(
    hash: HashAlgorithm,
    secret: &[u8],
    label: &[u8],
    context: &[u8],
    out: &mut [u8],
) -> Result<()> {
    const TLS13_PREFIX: &[u8] = b"tls13 ";
    let full_label_len = TLS13_PREFIX.len() + label.len();
    let out_len = u16::try_from(out.len())
        .map_err(|_| HandshakeError::Safety("HKDF output is too long"))?;
    let full_label_len = u8::try_from(full_label_len)
        .map_err(|_| HandshakeError::Safety("HKDF label is too long"))?;
    let context_len =
        u8::try_from(context.len()).map_err(|_| HandshakeError::Safety("HKDF context is too long"))?;

    let mut info = Vec::with_capacity(2 + 1 + full_label_len as usize + 1 + context.len());
    info.extend_from_slice(&out_len.to_be_bytes());
    info.push(full_label_len);
    info.extend_from_slice(TLS13_PREFIX);
    info.extend_from_slice(label);
    info.push(context_len);
    info.extend_from_slice(context);

    hash.hkdf_expand(secret, &info, out)
}

/// Derive-Secret(secret, label, transcript_hash).
pub fn derive_secret(
    hash: HashAlgorithm,
    secret: &[u8],
    label: &[u8],
    transcript_hash: &[u8],
) -> Result<Vec<u8>> {
    let mut out = vec![0u8; hash.output_len()];
    hkdf_expand_label(hash, secret, label, transcript_hash, &mut out)?;
    Ok(out)
}

/// Runs the key schedule from the early secret up to the handshake traffic secrets.
///
/// `transcript_hash` is Hash(ClientHello..ServerHello) under `suite`'s hash.
///
/// 从早期密钥一直运行到握手流量密钥的密钥调度。
pub fn derive_handshake_secrets(
    suite: &CipherSuite,
    shared_secret: &[u8],
    transcript_hash: &[u8],
) -> Result<Tls13Secrets> {
    let hash = suite.hash;
    let zeros = vec![0u8; hash.output_len()];

    let mut early_secret = hash.hkdf_extract(&zeros, &zeros);
    let mut salt = derive_secret(hash, &early_secret, b"derived", &hash.digest(&[]))?;
    early_secret.zeroize();

    let handshake_secret = hash.hkdf_extract(&salt, shared_secret);
    salt.zeroize();

    let client_handshake_secret =
        derive_secret(hash, &handshake_secret, b"c hs traffic", transcript_hash)?;
    let server_handshake_secret =
        derive_secret(hash, &handshake_secret, b"s hs traffic", transcript_hash)?;

    Ok(Tls13Secrets {
        extract_secret_type: ExtractSecretType::Handshake,
        extract_secret: handshake_secret,
        client_handshake_secret,
        server_handshake_secret,
    })
}

/// Acceptance checks applied to freshly derived secrets before they are trusted.
///
/// 新派生的密钥在被信任之前必须通过的验收检查。
pub struct SecretDerivationGate;

impl SecretDerivationGate {
    pub fn check(secrets: &Tls13Secrets, suite: &CipherSuite) -> Result<()> {
        if secrets.extract_secret_type != ExtractSecretType::Handshake {
            return Err(HandshakeError::Safety("extract secret is not the handshake secret"));
        }

        let expected_len = suite.hash.output_len();
        let all = [
            &secrets.extract_secret,
            &secrets.client_handshake_secret,
            &secrets.server_handshake_secret,
        ];
        if all.iter().any(|secret| secret.len() != expected_len) {
            return Err(HandshakeError::Safety("derived secret has the wrong length"));
        }

        let zeros = vec![0u8; expected_len];
        let any_zero = all
            .iter()
            .fold(Choice::from(0), |acc, secret| acc | secret.ct_eq(&zeros));
        if bool::from(any_zero) {
            return Err(HandshakeError::Safety("derived secret is all zeros"));
        }
        Ok(())
    }
}
