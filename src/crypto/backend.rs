//! The bundled cryptographic backend.
//!
//! Primitives are consumed through two small byte-oriented traits so the
//! negotiation core never depends on a particular library's key types.
//! Curves come from `x25519-dalek` and the RustCrypto NIST crates; KEMs come from
//! the `pqcrypto` bindings.
//!
//! 内置的密码学后端。
//!
//! 原语通过两个面向字节的小 trait 使用，因此协商核心不依赖任何特定库的密钥类型。

use crate::error::{HandshakeError, Result};
use crate::policy::ecc::{
    EccCurve, TLS_EC_CURVE_ECDH_X25519, TLS_EC_CURVE_SECP_256_R1, TLS_EC_CURVE_SECP_384_R1,
    TLS_EC_CURVE_SECP_521_R1,
};
use crate::policy::kem::Kem;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use pqcrypto_traits::kem::{Ciphertext as _, PublicKey as _, SecretKey as _, SharedSecret as _};
use rand::rngs::OsRng;
use zeroize::Zeroizing;

fn crypto_error(message: &str) -> HandshakeError {
    HandshakeError::Crypto(message.to_owned())
}

/// An ephemeral (EC)DH key pair in wire encoding.
pub struct EcdhKeyPair {
    pub public_key: Vec<u8>,
    pub private_key: Zeroizing<Vec<u8>>,
}

/// An ephemeral KEM key pair.
pub struct KemKeyPair {
    pub public_key: Vec<u8>,
    pub private_key: Zeroizing<Vec<u8>>,
}

pub trait EcdhProvider: Send + Sync {
    fn generate_keypair(&self) -> Result<EcdhKeyPair>;
    fn agree(&self, private_key: &[u8], peer_public_key: &[u8]) -> Result<Zeroizing<Vec<u8>>>;
}

/// Trait abstracting over the PQ KEM implementation.
pub trait KemProvider: Send + Sync {
    fn generate_keypair(&self) -> Result<KemKeyPair>;
    /// Returns `(ciphertext, shared_secret)`.
    fn encapsulate(&self, public_key: &[u8]) -> Result<(Vec<u8>, Zeroizing<Vec<u8>>)>;
    fn decapsulate(&self, private_key: &[u8], ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct X25519;

impl EcdhProvider for X25519 {
    fn generate_keypair(&self) -> Result<EcdhKeyPair> {
        let secret = x25519_dalek::StaticSecret::random_from_rng(OsRng);
        let public = x25519_dalek::PublicKey::from(&secret);
        Ok(EcdhKeyPair {
            public_key: public.as_bytes().to_vec(),
            private_key: Zeroizing::new(secret.to_bytes().to_vec()),
        })
    }

    fn agree(&self, private_key: &[u8], peer_public_key: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let private_key: [u8; 32] = private_key
            .try_into()
            .map_err(|_| crypto_error("x25519 private key must be 32 bytes"))?;
        let peer_public_key: [u8; 32] = peer_public_key
            .try_into()
            .map_err(|_| crypto_error("x25519 public key must be 32 bytes"))?;

        let secret = x25519_dalek::StaticSecret::from(private_key);
        let shared = secret.diffie_hellman(&x25519_dalek::PublicKey::from(peer_public_key));
        if !shared.was_contributory() {
            return Err(crypto_error("x25519 shared secret is not contributory"));
        }
        Ok(Zeroizing::new(shared.as_bytes().to_vec()))
    }
}

macro_rules! nist_ecdh_provider {
    ($name:ident, $krate:ident) => {
        #[derive(Debug, Default, Clone, Copy)]
        pub struct $name;

        impl EcdhProvider for $name {
            fn generate_keypair(&self) -> Result<EcdhKeyPair> {
                let secret = $krate::SecretKey::random(&mut OsRng);
                let public = secret.public_key().to_encoded_point(false);
                Ok(EcdhKeyPair {
                    public_key: public.as_bytes().to_vec(),
                    private_key: Zeroizing::new(secret.to_bytes().to_vec()),
                })
            }

            fn agree(
                &self,
                private_key: &[u8],
                peer_public_key: &[u8],
            ) -> Result<Zeroizing<Vec<u8>>> {
                let secret = $krate::SecretKey::from_slice(private_key)
                    .map_err(|_| crypto_error(concat!(stringify!($krate), " private key is invalid")))?;
                let peer = $krate::PublicKey::from_sec1_bytes(peer_public_key)
                    .map_err(|_| crypto_error(concat!(stringify!($krate), " public key is invalid")))?;
                let shared =
                    $krate::ecdh::diffie_hellman(secret.to_nonzero_scalar(), peer.as_affine());
                Ok(Zeroizing::new(shared.raw_secret_bytes().to_vec()))
            }
        }
    };
}

nist_ecdh_provider!(Secp256r1, p256);
nist_ecdh_provider!(Secp384r1, p384);
nist_ecdh_provider!(Secp521r1, p521);

macro_rules! pqcrypto_kem_provider {
    ($name:ident, $krate:ident, $module:ident) => {
        #[derive(Debug, Default, Clone, Copy)]
        pub struct $name;

        impl KemProvider for $name {
            fn generate_keypair(&self) -> Result<KemKeyPair> {
                let (public, secret) = $krate::$module::keypair();
                Ok(KemKeyPair {
                    public_key: public.as_bytes().to_vec(),
                    private_key: Zeroizing::new(secret.as_bytes().to_vec()),
                })
            }

            fn encapsulate(&self, public_key: &[u8]) -> Result<(Vec<u8>, Zeroizing<Vec<u8>>)> {
                let public_key = $krate::$module::PublicKey::from_bytes(public_key)
                    .map_err(|_| crypto_error("invalid KEM public key"))?;
                let (shared, ciphertext) = $krate::$module::encapsulate(&public_key);
                Ok((
                    ciphertext.as_bytes().to_vec(),
                    Zeroizing::new(shared.as_bytes().to_vec()),
                ))
            }

            fn decapsulate(
                &self,
                private_key: &[u8],
                ciphertext: &[u8],
            ) -> Result<Zeroizing<Vec<u8>>> {
                let private_key = $krate::$module::SecretKey::from_bytes(private_key)
                    .map_err(|_| crypto_error("invalid KEM private key"))?;
                let ciphertext = $krate::$module::Ciphertext::from_bytes(ciphertext)
                    .map_err(|_| crypto_error("invalid KEM ciphertext"))?;
                let shared = $krate::$module::decapsulate(&ciphertext, &private_key);
                Ok(Zeroizing::new(shared.as_bytes().to_vec()))
            }
        }
    };
}

pqcrypto_kem_provider!(Kyber512R3, pqcrypto_kyber, kyber512);
pqcrypto_kem_provider!(Kyber768R3, pqcrypto_kyber, kyber768);
pqcrypto_kem_provider!(Kyber1024R3, pqcrypto_kyber, kyber1024);
pqcrypto_kem_provider!(MlKem768, pqcrypto_mlkem, mlkem768);
pqcrypto_kem_provider!(MlKem1024, pqcrypto_mlkem, mlkem1024);

/// Resolves the backend implementation of `curve`.
pub fn ecdh_provider(curve: &EccCurve) -> Result<&'static dyn EcdhProvider> {
    match curve.iana_id {
        TLS_EC_CURVE_SECP_256_R1 => Ok(&Secp256r1),
        TLS_EC_CURVE_SECP_384_R1 => Ok(&Secp384r1),
        TLS_EC_CURVE_SECP_521_R1 => Ok(&Secp521r1),
        TLS_EC_CURVE_ECDH_X25519 => Ok(&X25519),
        _ => Err(HandshakeError::Safety("curve has no backend implementation")),
    }
}

/// Resolves the backend implementation of `kem`.
pub fn kem_provider(kem: &Kem) -> Result<&'static dyn KemProvider> {
    match kem.name {
        "kyber512r3" => Ok(&Kyber512R3),
        "kyber768r3" => Ok(&Kyber768R3),
        "kyber1024r3" => Ok(&Kyber1024R3),
        "mlkem768" => Ok(&MlKem768),
        "mlkem1024" => Ok(&MlKem1024),
        _ => Err(HandshakeError::Safety("KEM has no backend implementation")),
    }
}
