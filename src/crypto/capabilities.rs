//! Which catalog entries the linked cryptographic backend can actually serve.
//!
//! The flags are computed once for the whole process. [`install`] is the startup
//! barrier: it must run before the first connection negotiates, and it can only run
//! once. When nothing was installed, [`current`] falls back to [`Capabilities::detect`].
//!
//! 链接的密码学后端实际能提供哪些目录条目。
//!
//! 这些标志在整个进程中只计算一次。[`install`] 是启动屏障：必须在第一个连接开始协商之前执行，
//! 且只能执行一次。若未安装，[`current`] 会回退到 [`Capabilities::detect`]。

use crate::error::{HandshakeError, Result};
use crate::policy::ecc::EccCurve;
use crate::policy::kem::{KemFamily, KemGroup};
use once_cell::sync::OnceCell;

static CAPABILITIES: OnceCell<Capabilities> = OnceCell::new();

/// Capability flags of a cryptographic backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// The backend exposes a KEM API at all.
    pub evp_kem: bool,
    /// The backend exposes the combined EC API needed for X25519.
    pub evp_apis: bool,
    /// The backend implements ML-KEM (FIPS 203).
    pub mlkem: bool,
}

impl Capabilities {
    /// Everything the bundled backend implements.
    pub const fn detect() -> Self {
        Self {
            evp_kem: true,
            evp_apis: true,
            mlkem: true,
        }
    }

    /// A backend with no KEM support; only classical curves remain.
    pub const fn classical_only() -> Self {
        Self {
            evp_kem: false,
            evp_apis: true,
            mlkem: false,
        }
    }

    /// Whether `group` can be used with this backend.
    ///
    /// Each tier narrows the previous one: no KEM API rules out every group,
    /// a missing combined EC API rules out groups on such curves, and a missing
    /// ML-KEM implementation rules out the ML-KEM family.
    pub fn is_kem_group_available(&self, group: &KemGroup) -> bool {
        if !self.evp_kem {
            return false;
        }
        if group.curve.requires_evp_apis && !self.evp_apis {
            return false;
        }
        if group.kem.family == KemFamily::MlKem && !self.mlkem {
            return false;
        }
        true
    }

    pub fn is_curve_available(&self, curve: &EccCurve) -> bool {
        !curve.requires_evp_apis || self.evp_apis
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::detect()
    }
}

/// Installs the process-wide capability flags. Fails if they were already set,
/// either by an earlier `install` or by a lookup through [`current`].
pub fn install(capabilities: Capabilities) -> Result<()> {
    CAPABILITIES
        .set(capabilities)
        .map_err(|_| HandshakeError::Safety("capability flags are already initialized"))?;
    tracing::debug!(?capabilities, "installed backend capability flags");
    Ok(())
}

/// The process-wide capability flags.
pub fn current() -> &'static Capabilities {
    CAPABILITIES.get_or_init(Capabilities::detect)
}

/// Availability of `group` under the process-wide flags.
pub fn kem_group_is_available(group: &KemGroup) -> bool {
    current().is_kem_group_available(group)
}

/// Availability of `curve` under the process-wide flags.
pub fn ecc_curve_is_available(curve: &EccCurve) -> bool {
    current().is_curve_available(curve)
}
