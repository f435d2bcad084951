//! Classical elliptic curves and their preference lists.
//!
//! 经典椭圆曲线及其偏好列表。

use super::NamedGroup;

/// A named classical curve usable for (EC)DHE key shares.
#[derive(Debug)]
pub struct EccCurve {
    pub name: &'static str,
    pub iana_id: u16,
    /// Size in bytes of a public key share on the wire.
    pub share_size: usize,
    /// Whether the curve is only reachable through the backend's combined EC API surface.
    pub requires_evp_apis: bool,
}

impl PartialEq for EccCurve {
    fn eq(&self, other: &Self) -> bool {
        self.iana_id == other.iana_id
    }
}

impl Eq for EccCurve {}

impl NamedGroup for EccCurve {
    fn iana_id(&self) -> u16 {
        self.iana_id
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

pub const TLS_EC_CURVE_SECP_256_R1: u16 = 23;
pub const TLS_EC_CURVE_SECP_384_R1: u16 = 24;
pub const TLS_EC_CURVE_SECP_521_R1: u16 = 25;
pub const TLS_EC_CURVE_ECDH_X25519: u16 = 29;

pub static ECC_CURVE_SECP256R1: EccCurve = EccCurve {
    name: "secp256r1",
    iana_id: TLS_EC_CURVE_SECP_256_R1,
    share_size: 65,
    requires_evp_apis: false,
};

pub static ECC_CURVE_SECP384R1: EccCurve = EccCurve {
    name: "secp384r1",
    iana_id: TLS_EC_CURVE_SECP_384_R1,
    share_size: 97,
    requires_evp_apis: false,
};

pub static ECC_CURVE_SECP521R1: EccCurve = EccCurve {
    name: "secp521r1",
    iana_id: TLS_EC_CURVE_SECP_521_R1,
    share_size: 133,
    requires_evp_apis: false,
};

pub static ECC_CURVE_X25519: EccCurve = EccCurve {
    name: "x25519",
    iana_id: TLS_EC_CURVE_ECDH_X25519,
    share_size: 32,
    requires_evp_apis: true,
};

/// Every curve this crate can negotiate.
pub static ALL_SUPPORTED_CURVES: [&EccCurve; 4] = [
    &ECC_CURVE_SECP256R1,
    &ECC_CURVE_SECP384R1,
    &ECC_CURVE_SECP521R1,
    &ECC_CURVE_X25519,
];

/// Looks up a curve in the full catalog by its IANA id.
pub fn ecc_curve_by_iana_id(iana_id: u16) -> Option<&'static EccCurve> {
    ALL_SUPPORTED_CURVES
        .iter()
        .copied()
        .find(|curve| curve.iana_id == iana_id)
}

/// An ordered curve preference list. Index 0 is the most preferred.
///
/// 有序的曲线偏好列表，索引 0 为最优先。
#[derive(Debug, Clone, Copy)]
pub struct EccPreferences<'a> {
    pub ecc_curves: &'a [&'static EccCurve],
}

impl EccPreferences<'_> {
    /// Returns true if a curve with `iana_id` appears anywhere in the list.
    pub fn includes_curve(&self, iana_id: u16) -> bool {
        self.ecc_curves.iter().any(|curve| curve.iana_id == iana_id)
    }

    pub fn count(&self) -> usize {
        self.ecc_curves.len()
    }
}

static ECC_PREF_LIST_20200310: [&EccCurve; 3] = [
    &ECC_CURVE_X25519,
    &ECC_CURVE_SECP256R1,
    &ECC_CURVE_SECP384R1,
];

static ECC_PREF_LIST_20201021: [&EccCurve; 3] = [
    &ECC_CURVE_SECP256R1,
    &ECC_CURVE_SECP384R1,
    &ECC_CURVE_SECP521R1,
];

static ECC_PREF_LIST_20240603: [&EccCurve; 4] = [
    &ECC_CURVE_SECP256R1,
    &ECC_CURVE_X25519,
    &ECC_CURVE_SECP384R1,
    &ECC_CURVE_SECP521R1,
];

static ECC_PREF_LIST_TEST_ALL: [&EccCurve; 4] = [
    &ECC_CURVE_X25519,
    &ECC_CURVE_SECP256R1,
    &ECC_CURVE_SECP384R1,
    &ECC_CURVE_SECP521R1,
];

pub static ECC_PREFERENCES_20200310: EccPreferences<'static> = EccPreferences {
    ecc_curves: &ECC_PREF_LIST_20200310,
};

pub static ECC_PREFERENCES_20201021: EccPreferences<'static> = EccPreferences {
    ecc_curves: &ECC_PREF_LIST_20201021,
};

pub static ECC_PREFERENCES_20240603: EccPreferences<'static> = EccPreferences {
    ecc_curves: &ECC_PREF_LIST_20240603,
};

pub static ECC_PREFERENCES_TEST_ALL: EccPreferences<'static> = EccPreferences {
    ecc_curves: &ECC_PREF_LIST_TEST_ALL,
};
