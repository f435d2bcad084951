//! Cipher suites and the hash functions that drive the key schedule.
//!
//! Record protection itself lives outside this crate; the only property of a
//! suite consumed here is its hash, which fixes the length of every derived secret.
//!
//! 密码套件以及驱动密钥调度的哈希函数。
//!
//! 记录层保护不在本 crate 范围内；这里只使用套件的哈希算法，它决定了所有派生密钥的长度。

use crate::error::{HandshakeError, Result};
use hkdf::Hkdf;
use sha2::{Digest, Sha256, Sha384};

/// Hash function of a TLS 1.3 cipher suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha256,
    Sha384,
}

impl HashAlgorithm {
    /// Digest size in bytes; also the size of every TLS 1.3 secret.
    pub fn output_len(self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
        }
    }

    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            HashAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
            HashAlgorithm::Sha384 => Sha384::digest(data).to_vec(),
        }
    }

    /// HKDF-Extract(salt, ikm).
    pub fn hkdf_extract(self, salt: &[u8], ikm: &[u8]) -> Vec<u8> {
        match self {
            HashAlgorithm::Sha256 => Hkdf::<Sha256>::extract(Some(salt), ikm).0.to_vec(),
            HashAlgorithm::Sha384 => Hkdf::<Sha384>::extract(Some(salt), ikm).0.to_vec(),
        }
    }

    /// HKDF-Expand(prk, info) into `okm`.
    pub fn hkdf_expand(self, prk: &[u8], info: &[u8], okm: &mut [u8]) -> Result<()> {
        let invalid = |_| HandshakeError::Crypto("HKDF expansion failed".into());
        match self {
            HashAlgorithm::Sha256 => Hkdf::<Sha256>::from_prk(prk)
                .map_err(|_| HandshakeError::Crypto("HKDF PRK has the wrong length".into()))?
                .expand(info, okm)
                .map_err(invalid),
            HashAlgorithm::Sha384 => Hkdf::<Sha384>::from_prk(prk)
                .map_err(|_| HandshakeError::Crypto("HKDF PRK has the wrong length".into()))?
                .expand(info, okm)
                .map_err(invalid),
        }
    }
}

/// Protocol versions a policy may allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProtocolVersion {
    Tls10,
    Tls11,
    Tls12,
    Tls13,
}

/// A cipher suite as far as key exchange is concerned.
#[derive(Debug)]
pub struct CipherSuite {
    pub name: &'static str,
    pub iana_id: u16,
    pub hash: HashAlgorithm,
    pub minimum_version: ProtocolVersion,
}

impl PartialEq for CipherSuite {
    fn eq(&self, other: &Self) -> bool {
        self.iana_id == other.iana_id
    }
}

impl Eq for CipherSuite {}

impl CipherSuite {
    pub fn is_tls13(&self) -> bool {
        self.minimum_version == ProtocolVersion::Tls13
    }
}

pub static TLS13_AES_128_GCM_SHA256: CipherSuite = CipherSuite {
    name: "TLS_AES_128_GCM_SHA256",
    iana_id: 0x1301,
    hash: HashAlgorithm::Sha256,
    minimum_version: ProtocolVersion::Tls13,
};

pub static TLS13_AES_256_GCM_SHA384: CipherSuite = CipherSuite {
    name: "TLS_AES_256_GCM_SHA384",
    iana_id: 0x1302,
    hash: HashAlgorithm::Sha384,
    minimum_version: ProtocolVersion::Tls13,
};

pub static TLS13_CHACHA20_POLY1305_SHA256: CipherSuite = CipherSuite {
    name: "TLS_CHACHA20_POLY1305_SHA256",
    iana_id: 0x1303,
    hash: HashAlgorithm::Sha256,
    minimum_version: ProtocolVersion::Tls13,
};

pub static ECDHE_RSA_WITH_AES_128_GCM_SHA256: CipherSuite = CipherSuite {
    name: "ECDHE-RSA-AES128-GCM-SHA256",
    iana_id: 0xC02F,
    hash: HashAlgorithm::Sha256,
    minimum_version: ProtocolVersion::Tls12,
};

static ALL_CIPHER_SUITES: [&CipherSuite; 4] = [
    &TLS13_AES_128_GCM_SHA256,
    &TLS13_AES_256_GCM_SHA384,
    &TLS13_CHACHA20_POLY1305_SHA256,
    &ECDHE_RSA_WITH_AES_128_GCM_SHA256,
];

pub fn cipher_suite_by_iana_id(iana_id: u16) -> Option<&'static CipherSuite> {
    ALL_CIPHER_SUITES
        .iter()
        .copied()
        .find(|suite| suite.iana_id == iana_id)
}
