//! Security policies and the static preference catalog they are built from.
//!
//! Everything in here is read-only configuration: it is defined once, shared by
//! reference between any number of connections and never mutated.
//!
//! 安全策略以及构成它们的静态偏好目录。
//!
//! 这里的一切都是只读配置：定义一次，通过引用在任意多个连接之间共享，且永不修改。

pub mod cipher;
pub mod ecc;
pub mod kem;

use crate::crypto::suite::ProtocolVersion;
use cipher::{CIPHER_PREFERENCES_20190801, CIPHER_PREFERENCES_TLS13_SHA384_FIRST, CipherPreferences};
use ecc::{
    ECC_PREFERENCES_20200310, ECC_PREFERENCES_20240603, ECC_PREFERENCES_TEST_ALL, EccPreferences,
};
use kem::{
    KEM_PREFERENCES_NULL, KEM_PREFERENCES_PQ_TLS_1_0_2020_12, KEM_PREFERENCES_PQ_TLS_1_0_2021_05,
    KEM_PREFERENCES_PQ_TLS_1_0_2023_01, KEM_PREFERENCES_PQ_TLS_1_3_2023_06, KemPreferences,
};

/// Anything identified on the wire by a TLS `NamedGroup` id.
///
/// Equality across preference lists is always decided by `iana_id`, never by
/// object identity.
pub trait NamedGroup {
    fn iana_id(&self) -> u16;
    fn name(&self) -> &'static str;
}

/// The full set of preferences one side negotiates with.
///
/// 一方进行协商时使用的完整偏好集合。
#[derive(Debug, Clone, Copy)]
pub struct SecurityPolicy<'a> {
    /// Lowest protocol version the policy admits. Carried with the policy for the
    /// version negotiation that happens outside this crate; key-exchange negotiation
    /// here is always TLS 1.3 and only needs [`supports_tls13`](Self::supports_tls13).
    pub minimum_protocol_version: ProtocolVersion,
    pub cipher_preferences: &'a CipherPreferences<'a>,
    pub kem_preferences: &'a KemPreferences<'a>,
    pub ecc_preferences: &'a EccPreferences<'a>,
    /// Whether the first ClientHello carries a classical key share at all.
    /// Without one, any classical outcome costs a HelloRetryRequest.
    pub eager_ecc_share: bool,
}

impl SecurityPolicy<'_> {
    pub fn supports_tls13(&self) -> bool {
        self.cipher_preferences.has_tls13_suite()
    }
}

pub static SECURITY_POLICY_PQ_TLS_1_0_2020_12: SecurityPolicy<'static> = SecurityPolicy {
    minimum_protocol_version: ProtocolVersion::Tls10,
    cipher_preferences: &CIPHER_PREFERENCES_20190801,
    kem_preferences: &KEM_PREFERENCES_PQ_TLS_1_0_2020_12,
    ecc_preferences: &ECC_PREFERENCES_20200310,
    eager_ecc_share: true,
};

pub static SECURITY_POLICY_PQ_TLS_1_1_2021_05_21: SecurityPolicy<'static> = SecurityPolicy {
    minimum_protocol_version: ProtocolVersion::Tls11,
    cipher_preferences: &CIPHER_PREFERENCES_20190801,
    kem_preferences: &KEM_PREFERENCES_PQ_TLS_1_0_2021_05,
    ecc_preferences: &ECC_PREFERENCES_20200310,
    eager_ecc_share: true,
};

pub static SECURITY_POLICY_PQ_TLS_1_0_2021_05_22: SecurityPolicy<'static> = SecurityPolicy {
    minimum_protocol_version: ProtocolVersion::Tls10,
    cipher_preferences: &CIPHER_PREFERENCES_20190801,
    kem_preferences: &KEM_PREFERENCES_PQ_TLS_1_0_2021_05,
    ecc_preferences: &ECC_PREFERENCES_20200310,
    eager_ecc_share: true,
};

pub static SECURITY_POLICY_PQ_TLS_1_0_2021_05_23: SecurityPolicy<'static> = SecurityPolicy {
    minimum_protocol_version: ProtocolVersion::Tls10,
    cipher_preferences: &CIPHER_PREFERENCES_20190801,
    kem_preferences: &KEM_PREFERENCES_PQ_TLS_1_0_2021_05,
    ecc_preferences: &ECC_PREFERENCES_20200310,
    eager_ecc_share: true,
};

pub static SECURITY_POLICY_PQ_TLS_1_0_2021_05_24: SecurityPolicy<'static> = SecurityPolicy {
    minimum_protocol_version: ProtocolVersion::Tls10,
    cipher_preferences: &CIPHER_PREFERENCES_20190801,
    kem_preferences: &KEM_PREFERENCES_PQ_TLS_1_0_2021_05,
    ecc_preferences: &ECC_PREFERENCES_20200310,
    eager_ecc_share: true,
};

pub static SECURITY_POLICY_PQ_TLS_1_0_2021_05_26: SecurityPolicy<'static> = SecurityPolicy {
    minimum_protocol_version: ProtocolVersion::Tls10,
    cipher_preferences: &CIPHER_PREFERENCES_20190801,
    kem_preferences: &KEM_PREFERENCES_PQ_TLS_1_0_2021_05,
    ecc_preferences: &ECC_PREFERENCES_20200310,
    eager_ecc_share: true,
};

pub static SECURITY_POLICY_PQ_TLS_1_0_2023_01_24: SecurityPolicy<'static> = SecurityPolicy {
    minimum_protocol_version: ProtocolVersion::Tls10,
    cipher_preferences: &CIPHER_PREFERENCES_20190801,
    kem_preferences: &KEM_PREFERENCES_PQ_TLS_1_0_2023_01,
    ecc_preferences: &ECC_PREFERENCES_20200310,
    eager_ecc_share: true,
};

pub static SECURITY_POLICY_PQ_TLS_1_3_2023_06_01: SecurityPolicy<'static> = SecurityPolicy {
    minimum_protocol_version: ProtocolVersion::Tls13,
    cipher_preferences: &CIPHER_PREFERENCES_TLS13_SHA384_FIRST,
    kem_preferences: &KEM_PREFERENCES_PQ_TLS_1_3_2023_06,
    ecc_preferences: &ECC_PREFERENCES_20240603,
    eager_ecc_share: true,
};

pub static SECURITY_POLICY_TEST_ALL_TLS13: SecurityPolicy<'static> = SecurityPolicy {
    minimum_protocol_version: ProtocolVersion::Tls10,
    cipher_preferences: &CIPHER_PREFERENCES_20190801,
    kem_preferences: &KEM_PREFERENCES_NULL,
    ecc_preferences: &ECC_PREFERENCES_TEST_ALL,
    eager_ecc_share: true,
};

/// Same curves as `test_all_tls13`, but the client holds back its classical share
/// so the server has to ask for one.
pub static SECURITY_POLICY_TEST_TLS13_RETRY: SecurityPolicy<'static> = SecurityPolicy {
    minimum_protocol_version: ProtocolVersion::Tls10,
    cipher_preferences: &CIPHER_PREFERENCES_20190801,
    kem_preferences: &KEM_PREFERENCES_NULL,
    ecc_preferences: &ECC_PREFERENCES_TEST_ALL,
    eager_ecc_share: false,
};

static SECURITY_POLICY_SELECTION: [(&str, &SecurityPolicy<'static>); 10] = [
    ("PQ-TLS-1-0-2020-12", &SECURITY_POLICY_PQ_TLS_1_0_2020_12),
    ("PQ-TLS-1-1-2021-05-21", &SECURITY_POLICY_PQ_TLS_1_1_2021_05_21),
    ("PQ-TLS-1-0-2021-05-22", &SECURITY_POLICY_PQ_TLS_1_0_2021_05_22),
    ("PQ-TLS-1-0-2021-05-23", &SECURITY_POLICY_PQ_TLS_1_0_2021_05_23),
    ("PQ-TLS-1-0-2021-05-24", &SECURITY_POLICY_PQ_TLS_1_0_2021_05_24),
    ("PQ-TLS-1-0-2021-05-26", &SECURITY_POLICY_PQ_TLS_1_0_2021_05_26),
    ("PQ-TLS-1-0-2023-01-24", &SECURITY_POLICY_PQ_TLS_1_0_2023_01_24),
    ("PQ-TLS-1-3-2023-06-01", &SECURITY_POLICY_PQ_TLS_1_3_2023_06_01),
    ("test_all_tls13", &SECURITY_POLICY_TEST_ALL_TLS13),
    ("test_tls13_retry", &SECURITY_POLICY_TEST_TLS13_RETRY),
];

/// Looks up a named security policy.
///
/// 按名称查找安全策略。
pub fn security_policy(name: &str) -> Option<&'static SecurityPolicy<'static>> {
    SECURITY_POLICY_SELECTION
        .iter()
        .find(|(policy_name, _)| *policy_name == name)
        .map(|(_, policy)| *policy)
}

/// Names of every policy reachable through [`security_policy`].
pub fn security_policy_names() -> impl Iterator<Item = &'static str> {
    SECURITY_POLICY_SELECTION.iter().map(|(name, _)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::cipher::CIPHER_PREFERENCES_TLS12_ONLY;

    #[test]
    fn lookup_by_name() {
        let policy = security_policy("PQ-TLS-1-0-2023-01-24").unwrap();
        assert_eq!(policy.kem_preferences.tls13_pq_hybrid_draft_revision, 5);
        assert!(security_policy("no-such-policy").is_none());
        assert_eq!(security_policy_names().count(), 10);
    }

    #[test]
    fn named_policies_carry_their_minimum_version() {
        let minimum = |name| security_policy(name).map(|policy| policy.minimum_protocol_version);
        assert_eq!(minimum("PQ-TLS-1-0-2021-05-24"), Some(ProtocolVersion::Tls10));
        assert_eq!(minimum("PQ-TLS-1-1-2021-05-21"), Some(ProtocolVersion::Tls11));
        assert_eq!(minimum("PQ-TLS-1-3-2023-06-01"), Some(ProtocolVersion::Tls13));
    }

    #[test]
    fn tls13_support_follows_cipher_preferences() {
        assert!(SECURITY_POLICY_TEST_ALL_TLS13.supports_tls13());
        let legacy = SecurityPolicy {
            cipher_preferences: &CIPHER_PREFERENCES_TLS12_ONLY,
            ..SECURITY_POLICY_TEST_ALL_TLS13
        };
        assert!(!legacy.supports_tls13());
    }
}
