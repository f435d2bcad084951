use super::HandshakeServer;
use crate::crypto::capabilities::{self, Capabilities};
use crate::error::{HandshakeError, Result};
use crate::negotiation::NegotiationState;
use crate::policy::SecurityPolicy;
use crate::protocol::state::Initial;
use crate::protocol::transcript::Transcript;
use std::marker::PhantomData;

/// Marker type for a missing field in the builder.
///
/// 用于在构建器中标记缺失字段的类型。
pub struct Missing;

/// A builder for creating a `HandshakeServer`.
///
/// `build` only exists once a policy has been provided.
///
/// 用于创建 `HandshakeServer` 的构建器。
///
/// 只有在提供策略之后才能调用 `build`。
pub struct HandshakeServerBuilder<'a, Policy> {
    policy: Policy,
    capabilities: Option<Capabilities>,
    _lifetime: PhantomData<&'a ()>,
}

impl HandshakeServerBuilder<'_, Missing> {
    /// Creates a new `HandshakeServerBuilder`.
    pub fn new() -> Self {
        Self {
            policy: Missing,
            capabilities: None,
            _lifetime: PhantomData,
        }
    }
}

impl Default for HandshakeServerBuilder<'_, Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, P> HandshakeServerBuilder<'a, P> {
    /// Sets the security policy whose preferences rank every selection.
    ///
    /// 设置其偏好决定所有选择顺序的安全策略。
    pub fn policy(
        self,
        policy: &'a SecurityPolicy<'a>,
    ) -> HandshakeServerBuilder<'a, &'a SecurityPolicy<'a>> {
        HandshakeServerBuilder {
            policy,
            capabilities: self.capabilities,
            _lifetime: PhantomData,
        }
    }

    /// Overrides the process-wide backend capabilities for this connection only.
    ///
    /// 仅为此连接覆盖进程级的后端能力。
    pub fn capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = Some(capabilities);
        self
    }
}

impl<'a> HandshakeServerBuilder<'a, &'a SecurityPolicy<'a>> {
    /// Builds the `HandshakeServer`.
    ///
    /// This method is only available when all required fields have been provided.
    /// It still fails for a policy that cannot negotiate TLS 1.3.
    ///
    /// 构建 `HandshakeServer`。
    ///
    /// 此方法仅在提供了所有必需字段时可用；若策略无法协商 TLS 1.3 仍会失败。
    pub fn build(self) -> Result<HandshakeServer<'a, Initial>> {
        if !self.policy.supports_tls13() {
            return Err(HandshakeError::Safety("policy has no TLS 1.3 cipher suite"));
        }
        let capabilities = self.capabilities.unwrap_or(*capabilities::current());

        Ok(HandshakeServer {
            state: PhantomData,
            policy: self.policy,
            negotiation: NegotiationState::new(capabilities),
            transcript: Transcript::new(),
            cipher_suite: None,
            retry_group: None,
            secrets: None,
        })
    }
}
