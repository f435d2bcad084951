use super::HandshakeClient;
use crate::crypto::capabilities::{self, Capabilities};
use crate::error::{HandshakeError, Result};
use crate::negotiation::NegotiationState;
use crate::policy::SecurityPolicy;
use crate::protocol::state::Initial;
use crate::protocol::transcript::Transcript;
use std::marker::PhantomData;

/// A builder for creating a `HandshakeClient`.
///
/// This builder ensures that all required fields are provided before constructing the client.
///
/// 用于创建 `HandshakeClient` 的构建器。
///
/// 此构建器确保在构造客户端之前提供了所有必需的字段。
#[derive(Default)]
pub struct HandshakeClientBuilder<'a> {
    policy: Option<&'a SecurityPolicy<'a>>,
    capabilities: Option<Capabilities>,
}

impl<'a> HandshakeClientBuilder<'a> {
    /// Creates a new `HandshakeClientBuilder`.
    pub fn new() -> Self {
        Self {
            policy: None,
            capabilities: None,
        }
    }

    /// Sets the security policy the client negotiates with.
    ///
    /// 设置客户端进行协商所使用的安全策略。
    pub fn policy(mut self, policy: &'a SecurityPolicy<'a>) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Overrides the process-wide backend capabilities for this connection only.
    ///
    /// 仅为此连接覆盖进程级的后端能力。
    pub fn capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = Some(capabilities);
        self
    }

    /// Builds the `HandshakeClient`.
    ///
    /// Returns an error if the policy is missing or cannot negotiate TLS 1.3.
    ///
    /// 构建 `HandshakeClient`。
    ///
    /// 如果缺少策略或策略无法协商 TLS 1.3，则返回错误。
    pub fn build(self) -> Result<HandshakeClient<'a, Initial>> {
        let policy = self
            .policy
            .ok_or(HandshakeError::BuilderMissingField("policy"))?;
        if !policy.supports_tls13() {
            return Err(HandshakeError::Safety("policy has no TLS 1.3 cipher suite"));
        }
        let capabilities = self.capabilities.unwrap_or(*capabilities::current());

        Ok(HandshakeClient {
            state: PhantomData,
            policy,
            negotiation: NegotiationState::new(capabilities),
            transcript: Transcript::new(),
            client_hello: None,
            kem_share: None,
            ecc_share: None,
            cipher_suite: None,
            retry_group: None,
            secrets: None,
        })
    }
}
