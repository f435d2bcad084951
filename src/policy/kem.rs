//! Post-quantum KEMs, hybrid KEM groups and KEM preference lists.
//!
//! A [`KemGroup`] pairs one KEM with one classical curve under a single IANA id.
//! Groups are static and immutable; whether a group can actually be used is
//! decided at query time by [`crate::crypto::capabilities`].
//!
//! 后量子 KEM、混合 KEM 组以及 KEM 偏好列表。
//!
//! [`KemGroup`] 将一个 KEM 与一条经典曲线配对，并使用同一个 IANA 标识。
//! 组是静态且不可变的；某个组是否真正可用由 [`crate::crypto::capabilities`] 在查询时决定。

use super::NamedGroup;
use super::ecc::{ECC_CURVE_SECP256R1, ECC_CURVE_SECP384R1, ECC_CURVE_SECP521R1, ECC_CURVE_X25519, EccCurve};

/// The algorithm family a KEM belongs to. Availability is gated per family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KemFamily {
    /// Kyber, NIST round 3 submission.
    KyberR3,
    /// ML-KEM as standardized in FIPS 203.
    MlKem,
}

/// Static description of a KEM algorithm.
#[derive(Debug)]
pub struct Kem {
    pub name: &'static str,
    /// Identifier used by the legacy (non-hybrid) TLS 1.2 KEM extension.
    pub kem_extension_id: u16,
    pub family: KemFamily,
    pub public_key_length: usize,
    pub private_key_length: usize,
    pub shared_secret_key_length: usize,
    pub ciphertext_length: usize,
}

impl PartialEq for Kem {
    fn eq(&self, other: &Self) -> bool {
        self.kem_extension_id == other.kem_extension_id
    }
}

impl Eq for Kem {}

pub static KYBER_512_R3: Kem = Kem {
    name: "kyber512r3",
    kem_extension_id: 0x0017,
    family: KemFamily::KyberR3,
    public_key_length: 800,
    private_key_length: 1632,
    shared_secret_key_length: 32,
    ciphertext_length: 768,
};

pub static KYBER_768_R3: Kem = Kem {
    name: "kyber768r3",
    kem_extension_id: 0x0018,
    family: KemFamily::KyberR3,
    public_key_length: 1184,
    private_key_length: 2400,
    shared_secret_key_length: 32,
    ciphertext_length: 1088,
};

pub static KYBER_1024_R3: Kem = Kem {
    name: "kyber1024r3",
    kem_extension_id: 0x0019,
    family: KemFamily::KyberR3,
    public_key_length: 1568,
    private_key_length: 3168,
    shared_secret_key_length: 32,
    ciphertext_length: 1568,
};

pub static MLKEM_768: Kem = Kem {
    name: "mlkem768",
    kem_extension_id: 0x0201,
    family: KemFamily::MlKem,
    public_key_length: 1184,
    private_key_length: 2400,
    shared_secret_key_length: 32,
    ciphertext_length: 1088,
};

pub static MLKEM_1024: Kem = Kem {
    name: "mlkem1024",
    kem_extension_id: 0x0202,
    family: KemFamily::MlKem,
    public_key_length: 1568,
    private_key_length: 3168,
    shared_secret_key_length: 32,
    ciphertext_length: 1568,
};

/// A hybrid key-exchange group: one PQ KEM plus one classical curve.
///
/// 混合密钥交换组：一个后量子 KEM 加一条经典曲线。
#[derive(Debug)]
pub struct KemGroup {
    pub name: &'static str,
    pub iana_id: u16,
    pub curve: &'static EccCurve,
    pub kem: &'static Kem,
    /// Standardized ML-KEM hybrids with X25519 put the KEM component first,
    /// both in the key share and in the combined shared secret.
    pub send_kem_first: bool,
}

impl PartialEq for KemGroup {
    fn eq(&self, other: &Self) -> bool {
        self.iana_id == other.iana_id
    }
}

impl Eq for KemGroup {}

impl NamedGroup for KemGroup {
    fn iana_id(&self) -> u16 {
        self.iana_id
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

impl KemGroup {
    /// Size of the client's hybrid share without any length prefixes.
    pub fn client_share_size(&self) -> usize {
        self.curve.share_size + self.kem.public_key_length
    }

    /// Size of the server's hybrid share without any length prefixes.
    pub fn server_share_size(&self) -> usize {
        self.curve.share_size + self.kem.ciphertext_length
    }
}

pub const TLS_PQ_KEM_GROUP_ID_X25519_KYBER_512_R3: u16 = 0x2F39;
pub const TLS_PQ_KEM_GROUP_ID_SECP256R1_KYBER_512_R3: u16 = 0x2F3A;
pub const TLS_PQ_KEM_GROUP_ID_SECP384R1_KYBER_768_R3: u16 = 0x2F3C;
pub const TLS_PQ_KEM_GROUP_ID_SECP521R1_KYBER_1024_R3: u16 = 0x2F3D;
pub const TLS_PQ_KEM_GROUP_ID_X25519_KYBER_768_R3: u16 = 0x6399;
pub const TLS_PQ_KEM_GROUP_ID_SECP256R1_KYBER_768_R3: u16 = 0x639A;
pub const TLS_PQ_KEM_GROUP_ID_SECP256R1_MLKEM_768: u16 = 0x11EB;
pub const TLS_PQ_KEM_GROUP_ID_X25519_MLKEM_768: u16 = 0x11EC;
pub const TLS_PQ_KEM_GROUP_ID_SECP384R1_MLKEM_1024: u16 = 0x11ED;

pub static SECP256R1_KYBER_512_R3: KemGroup = KemGroup {
    name: "secp256r1_kyber-512-r3",
    iana_id: TLS_PQ_KEM_GROUP_ID_SECP256R1_KYBER_512_R3,
    curve: &ECC_CURVE_SECP256R1,
    kem: &KYBER_512_R3,
    send_kem_first: false,
};

pub static X25519_KYBER_512_R3: KemGroup = KemGroup {
    name: "x25519_kyber-512-r3",
    iana_id: TLS_PQ_KEM_GROUP_ID_X25519_KYBER_512_R3,
    curve: &ECC_CURVE_X25519,
    kem: &KYBER_512_R3,
    send_kem_first: false,
};

pub static SECP256R1_KYBER_768_R3: KemGroup = KemGroup {
    name: "secp256r1_kyber-768-r3",
    iana_id: TLS_PQ_KEM_GROUP_ID_SECP256R1_KYBER_768_R3,
    curve: &ECC_CURVE_SECP256R1,
    kem: &KYBER_768_R3,
    send_kem_first: false,
};

pub static SECP384R1_KYBER_768_R3: KemGroup = KemGroup {
    name: "secp384r1_kyber-768-r3",
    iana_id: TLS_PQ_KEM_GROUP_ID_SECP384R1_KYBER_768_R3,
    curve: &ECC_CURVE_SECP384R1,
    kem: &KYBER_768_R3,
    send_kem_first: false,
};

pub static SECP521R1_KYBER_1024_R3: KemGroup = KemGroup {
    name: "secp521r1_kyber-1024-r3",
    iana_id: TLS_PQ_KEM_GROUP_ID_SECP521R1_KYBER_1024_R3,
    curve: &ECC_CURVE_SECP521R1,
    kem: &KYBER_1024_R3,
    send_kem_first: false,
};

pub static X25519_KYBER_768_R3: KemGroup = KemGroup {
    name: "x25519_kyber-768-r3",
    iana_id: TLS_PQ_KEM_GROUP_ID_X25519_KYBER_768_R3,
    curve: &ECC_CURVE_X25519,
    kem: &KYBER_768_R3,
    send_kem_first: false,
};

pub static SECP256R1_MLKEM_768: KemGroup = KemGroup {
    name: "SecP256r1MLKEM768",
    iana_id: TLS_PQ_KEM_GROUP_ID_SECP256R1_MLKEM_768,
    curve: &ECC_CURVE_SECP256R1,
    kem: &MLKEM_768,
    send_kem_first: false,
};

pub static X25519_MLKEM_768: KemGroup = KemGroup {
    name: "X25519MLKEM768",
    iana_id: TLS_PQ_KEM_GROUP_ID_X25519_MLKEM_768,
    curve: &ECC_CURVE_X25519,
    kem: &MLKEM_768,
    send_kem_first: true,
};

pub static SECP384R1_MLKEM_1024: KemGroup = KemGroup {
    name: "SecP384r1MLKEM1024",
    iana_id: TLS_PQ_KEM_GROUP_ID_SECP384R1_MLKEM_1024,
    curve: &ECC_CURVE_SECP384R1,
    kem: &MLKEM_1024,
    send_kem_first: false,
};

pub const KEM_GROUPS_COUNT: usize = 9;

/// Every hybrid group this crate knows about, most preferred first.
pub static ALL_SUPPORTED_KEM_GROUPS: [&KemGroup; KEM_GROUPS_COUNT] = [
    &X25519_MLKEM_768,
    &SECP256R1_MLKEM_768,
    &SECP384R1_MLKEM_1024,
    &SECP256R1_KYBER_512_R3,
    &X25519_KYBER_512_R3,
    &SECP256R1_KYBER_768_R3,
    &SECP384R1_KYBER_768_R3,
    &SECP521R1_KYBER_1024_R3,
    &X25519_KYBER_768_R3,
];

/// Looks up a hybrid group in the full catalog by its IANA id.
pub fn kem_group_by_iana_id(iana_id: u16) -> Option<&'static KemGroup> {
    ALL_SUPPORTED_KEM_GROUPS
        .iter()
        .copied()
        .find(|group| group.iana_id == iana_id)
}

/// Ordered KEM preferences for one security policy.
///
/// `tls13_kem_groups` is the hybrid list used in TLS 1.3 (index 0 most preferred).
/// `kems` is the separate, lower-priority list of legacy non-hybrid KEMs; it never
/// takes part in TLS 1.3 group selection.
/// `tls13_pq_hybrid_draft_revision` selects the wire format of hybrid shares.
///
/// 一个安全策略的有序 KEM 偏好。
#[derive(Debug, Clone, Copy)]
pub struct KemPreferences<'a> {
    pub kems: &'a [&'static Kem],
    pub tls13_kem_groups: &'a [&'static KemGroup],
    pub tls13_pq_hybrid_draft_revision: u8,
}

impl KemPreferences<'_> {
    /// True iff a group with `iana_id` appears in the TLS 1.3 list, regardless of
    /// order or backend availability.
    pub fn includes_tls13_kem_group(&self, iana_id: u16) -> bool {
        self.tls13_kem_groups
            .iter()
            .any(|group| group.iana_id == iana_id)
    }

    /// True iff the legacy KEM list contains `kem_extension_id`.
    pub fn includes_kem(&self, kem_extension_id: u16) -> bool {
        self.kems
            .iter()
            .any(|kem| kem.kem_extension_id == kem_extension_id)
    }

    pub fn tls13_kem_group_count(&self) -> usize {
        self.tls13_kem_groups.len()
    }
}

/// Draft revision 0 of the hybrid design framed each share component with a
/// `u16` length; later revisions concatenate fixed-size components.
pub fn tls13_client_must_use_hybrid_kem_length_prefix(kem_preferences: &KemPreferences<'_>) -> bool {
    kem_preferences.tls13_pq_hybrid_draft_revision == 0
}

static PQ_KEMS_R3: [&Kem; 1] = [&KYBER_512_R3];

static PQ_KEM_GROUPS_R3_2021_05: [&KemGroup; 2] = [&X25519_KYBER_512_R3, &SECP256R1_KYBER_512_R3];

static PQ_KEM_GROUPS_R3_2023_06: [&KemGroup; 6] = [
    &SECP256R1_KYBER_768_R3,
    &X25519_KYBER_768_R3,
    &SECP384R1_KYBER_768_R3,
    &SECP521R1_KYBER_1024_R3,
    &SECP256R1_KYBER_512_R3,
    &X25519_KYBER_512_R3,
];

pub static KEM_PREFERENCES_NULL: KemPreferences<'static> = KemPreferences {
    kems: &[],
    tls13_kem_groups: &[],
    tls13_pq_hybrid_draft_revision: 0,
};

pub static KEM_PREFERENCES_PQ_TLS_1_0_2020_12: KemPreferences<'static> = KemPreferences {
    kems: &PQ_KEMS_R3,
    tls13_kem_groups: &PQ_KEM_GROUPS_R3_2021_05,
    tls13_pq_hybrid_draft_revision: 0,
};

pub static KEM_PREFERENCES_PQ_TLS_1_0_2021_05: KemPreferences<'static> = KemPreferences {
    kems: &PQ_KEMS_R3,
    tls13_kem_groups: &PQ_KEM_GROUPS_R3_2021_05,
    tls13_pq_hybrid_draft_revision: 0,
};

pub static KEM_PREFERENCES_PQ_TLS_1_0_2023_01: KemPreferences<'static> = KemPreferences {
    kems: &PQ_KEMS_R3,
    tls13_kem_groups: &PQ_KEM_GROUPS_R3_2021_05,
    tls13_pq_hybrid_draft_revision: 5,
};

pub static KEM_PREFERENCES_PQ_TLS_1_3_2023_06: KemPreferences<'static> = KemPreferences {
    kems: &[],
    tls13_kem_groups: &PQ_KEM_GROUPS_R3_2023_06,
    tls13_pq_hybrid_draft_revision: 5,
};

pub static KEM_PREFERENCES_ALL: KemPreferences<'static> = KemPreferences {
    kems: &PQ_KEMS_R3,
    tls13_kem_groups: &ALL_SUPPORTED_KEM_GROUPS,
    tls13_pq_hybrid_draft_revision: 5,
};
