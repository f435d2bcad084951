use crate::crypto::suite::{
    CipherSuite, ECDHE_RSA_WITH_AES_128_GCM_SHA256, TLS13_AES_128_GCM_SHA256,
    TLS13_AES_256_GCM_SHA384, TLS13_CHACHA20_POLY1305_SHA256,
};

/// Ordered cipher suite preferences. Index 0 is the most preferred.
#[derive(Debug, Clone, Copy)]
pub struct CipherPreferences<'a> {
    pub suites: &'a [&'static CipherSuite],
}

impl CipherPreferences<'_> {
    pub fn has_tls13_suite(&self) -> bool {
        self.suites.iter().any(|suite| suite.is_tls13())
    }

    /// TLS 1.3 suites only, in preference order.
    pub fn tls13_suites(&self) -> impl Iterator<Item = &'static CipherSuite> + '_ {
        self.suites.iter().copied().filter(|suite| suite.is_tls13())
    }
}

static CIPHER_SUITES_20190801: [&CipherSuite; 4] = [
    &TLS13_AES_128_GCM_SHA256,
    &TLS13_CHACHA20_POLY1305_SHA256,
    &TLS13_AES_256_GCM_SHA384,
    &ECDHE_RSA_WITH_AES_128_GCM_SHA256,
];

static CIPHER_SUITES_TLS13_SHA384_FIRST: [&CipherSuite; 3] = [
    &TLS13_AES_256_GCM_SHA384,
    &TLS13_AES_128_GCM_SHA256,
    &TLS13_CHACHA20_POLY1305_SHA256,
];

static CIPHER_SUITES_TLS12_ONLY: [&CipherSuite; 1] = [&ECDHE_RSA_WITH_AES_128_GCM_SHA256];

pub static CIPHER_PREFERENCES_20190801: CipherPreferences<'static> = CipherPreferences {
    suites: &CIPHER_SUITES_20190801,
};

pub static CIPHER_PREFERENCES_TLS13_SHA384_FIRST: CipherPreferences<'static> = CipherPreferences {
    suites: &CIPHER_SUITES_TLS13_SHA384_FIRST,
};

pub static CIPHER_PREFERENCES_TLS12_ONLY: CipherPreferences<'static> = CipherPreferences {
    suites: &CIPHER_SUITES_TLS12_ONLY,
};
