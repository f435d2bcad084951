//! Group selection between a client's and a server's preferences.
//!
//! Selection always runs in two explicit passes. The first pass looks only at the
//! share the client already sent: accepting it costs no extra round trip, so it wins
//! whenever the server supports it at all. The second pass scans the server's list in
//! order against the rest of the client's list; anything found there needs a
//! HelloRetryRequest, so the server's ranking decides.
//!
//! 客户端与服务器偏好之间的组选择。
//!
//! 选择总是分两个显式阶段进行。第一阶段只考虑客户端已发送的密钥共享：接受它不需要额外的往返，
//! 因此只要服务器支持就会胜出。第二阶段按服务器列表的顺序扫描客户端列表的其余部分；
//! 在这里找到的结果需要 HelloRetryRequest，因此由服务器的排序决定。

use crate::crypto::capabilities::{self, Capabilities};
use crate::error::{HandshakeError, Result};
use crate::policy::NamedGroup;
use crate::policy::SecurityPolicy;
use crate::policy::ecc::{EccCurve, EccPreferences};
use crate::policy::kem::{KemGroup, KemPreferences};

/// Outcome of one selection run.
#[derive(Debug, PartialEq, Eq)]
pub enum Selection<G: 'static> {
    /// The share the client already sent is usable.
    Accept(&'static G),
    /// A mutually supported entry exists but the client has to send a share for it.
    Retry(&'static G),
}

impl<G: 'static> Clone for Selection<G> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<G: 'static> Copy for Selection<G> {}

impl<G: 'static> Selection<G> {
    pub fn group(self) -> &'static G {
        match self {
            Selection::Accept(group) | Selection::Retry(group) => group,
        }
    }

    pub fn requires_retry(self) -> bool {
        matches!(self, Selection::Retry(_))
    }
}

/// The two-pass selection shared by the predictor and the server.
///
/// `offered` is the entry the client sent a share for. `client_supported` is the rest
/// of the client's list; an entry with the same id as `offered` is never reconsidered.
/// Entries are compared by IANA id only, and `available` filters both sides.
pub fn select<G: NamedGroup + 'static>(
    offered: Option<&'static G>,
    client_supported: &[&'static G],
    server: &[&'static G],
    available: impl Fn(&G) -> bool,
) -> Option<Selection<G>> {
    if let Some(offered) = offered.filter(|offered| available(offered)) {
        let accepted = server
            .iter()
            .copied()
            .find(|candidate| available(candidate) && candidate.iana_id() == offered.iana_id());
        if let Some(accepted) = accepted {
            return Some(Selection::Accept(accepted));
        }
    }

    let offered_id = offered.map(|offered| offered.iana_id());
    for candidate in server.iter().copied().filter(|candidate| available(candidate)) {
        let mutual = client_supported.iter().any(|client| {
            Some(client.iana_id()) != offered_id
                && available(client)
                && client.iana_id() == candidate.iana_id()
        });
        if mutual {
            return Some(Selection::Retry(candidate));
        }
    }
    None
}

/// Predicts the hybrid group two peers with these preferences will negotiate,
/// using the process-wide backend capabilities.
///
/// 使用进程级后端能力，预测具有这些偏好的两个对端将协商出的混合组。
pub fn predict_kem_group(
    client: &KemPreferences<'_>,
    server: &KemPreferences<'_>,
) -> Option<&'static KemGroup> {
    predict_kem_group_with(capabilities::current(), client, server)
}

pub fn predict_kem_group_with(
    capabilities: &Capabilities,
    client: &KemPreferences<'_>,
    server: &KemPreferences<'_>,
) -> Option<&'static KemGroup> {
    let (client_default, rest) = client.tls13_kem_groups.split_first()?;
    select(Some(*client_default), rest, server.tls13_kem_groups, |group| {
        capabilities.is_kem_group_available(group)
    })
    .map(Selection::group)
}

/// Predicts the curve two peers will negotiate when no hybrid group is mutual.
pub fn predict_ecc_curve(
    client: &EccPreferences<'_>,
    server: &EccPreferences<'_>,
) -> Option<&'static EccCurve> {
    predict_ecc_curve_with(capabilities::current(), client, server)
}

pub fn predict_ecc_curve_with(
    capabilities: &Capabilities,
    client: &EccPreferences<'_>,
    server: &EccPreferences<'_>,
) -> Option<&'static EccCurve> {
    let (client_default, rest) = client.ecc_curves.split_first()?;
    select(Some(*client_default), rest, server.ecc_curves, |curve| {
        capabilities.is_curve_available(curve)
    })
    .map(Selection::group)
}

/// What the server does with a ClientHello.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerDecision {
    AcceptKemGroup(&'static KemGroup),
    AcceptCurve(&'static EccCurve),
    RetryKemGroup(&'static KemGroup),
    RetryCurve(&'static EccCurve),
}

/// What the server learned from one ClientHello.
#[derive(Debug, Clone, Copy)]
pub struct ClientOffer<'a> {
    pub kem_groups: &'a [&'static KemGroup],
    pub curves: &'a [&'static EccCurve],
    pub offered_kem_group: Option<&'static KemGroup>,
    pub offered_curve: Option<&'static EccCurve>,
}

/// Server-side selection: hybrid groups first, then classical curves.
///
/// A hybrid group that is only reachable through a retry still outranks a classical
/// share the client already sent.
pub fn select_for_server(
    capabilities: &Capabilities,
    policy: &SecurityPolicy<'_>,
    offer: &ClientOffer<'_>,
) -> Result<ServerDecision> {
    let kem_group = select(
        offer.offered_kem_group,
        offer.kem_groups,
        policy.kem_preferences.tls13_kem_groups,
        |group| capabilities.is_kem_group_available(group),
    );
    match kem_group {
        Some(Selection::Accept(group)) => return Ok(ServerDecision::AcceptKemGroup(group)),
        Some(Selection::Retry(group)) => return Ok(ServerDecision::RetryKemGroup(group)),
        None => {}
    }

    let curve = select(
        offer.offered_curve,
        offer.curves,
        policy.ecc_preferences.ecc_curves,
        |curve| capabilities.is_curve_available(curve),
    );
    match curve {
        Some(Selection::Accept(curve)) => Ok(ServerDecision::AcceptCurve(curve)),
        Some(Selection::Retry(curve)) => Ok(ServerDecision::RetryCurve(curve)),
        None => Err(HandshakeError::NoMutualGroup),
    }
}

/// The key-exchange parameters a connection settled on.
///
/// A connection negotiates either one hybrid group or one classical curve, never both.
///
/// 连接最终确定的密钥交换参数：要么是一个混合组，要么是一条经典曲线，绝不会同时存在。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NegotiatedGroup {
    #[default]
    Unresolved,
    KemGroup(&'static KemGroup),
    Curve(&'static EccCurve),
}

impl NegotiatedGroup {
    pub fn name(&self) -> Option<&'static str> {
        match self {
            NegotiatedGroup::Unresolved => None,
            NegotiatedGroup::KemGroup(group) => Some(group.name),
            NegotiatedGroup::Curve(curve) => Some(curve.name),
        }
    }

    pub fn iana_id(&self) -> Option<u16> {
        match self {
            NegotiatedGroup::Unresolved => None,
            NegotiatedGroup::KemGroup(group) => Some(group.iana_id),
            NegotiatedGroup::Curve(curve) => Some(curve.iana_id),
        }
    }
}

/// Per-connection negotiation state, owned by whoever drives the handshake.
#[derive(Debug, Clone)]
pub struct NegotiationState {
    capabilities: Capabilities,
    client_kem_group: Option<&'static KemGroup>,
    client_curve: Option<&'static EccCurve>,
    len_prefixed: bool,
    negotiated: NegotiatedGroup,
}

impl NegotiationState {
    pub fn new(capabilities: Capabilities) -> Self {
        Self {
            capabilities,
            client_kem_group: None,
            client_curve: None,
            len_prefixed: false,
            negotiated: NegotiatedGroup::Unresolved,
        }
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Records the hybrid group the client sent a share for.
    pub fn set_client_kem_group(&mut self, group: &'static KemGroup, len_prefixed: bool) {
        self.client_kem_group = Some(group);
        self.len_prefixed = len_prefixed;
    }

    /// Records the curve the client sent a share for.
    pub fn set_client_curve(&mut self, curve: &'static EccCurve) {
        self.client_curve = Some(curve);
    }

    /// Forgets every offered candidate, as after a HelloRetryRequest.
    pub fn clear_candidates(&mut self) {
        self.client_kem_group = None;
        self.client_curve = None;
        self.len_prefixed = false;
    }

    pub fn client_kem_group(&self) -> Option<&'static KemGroup> {
        self.client_kem_group
    }

    pub fn client_curve(&self) -> Option<&'static EccCurve> {
        self.client_curve
    }

    /// Whether the hybrid share used the length-prefixed encoding.
    pub fn len_prefixed(&self) -> bool {
        self.len_prefixed
    }

    pub fn record_kem_group(&mut self, group: &'static KemGroup) -> Result<()> {
        if self.negotiated != NegotiatedGroup::Unresolved {
            return Err(HandshakeError::Safety("key exchange group is already negotiated"));
        }
        if !self.capabilities.is_kem_group_available(group) {
            return Err(HandshakeError::Safety("negotiated KEM group is not available"));
        }
        self.negotiated = NegotiatedGroup::KemGroup(group);
        Ok(())
    }

    pub fn record_curve(&mut self, curve: &'static EccCurve) -> Result<()> {
        if self.negotiated != NegotiatedGroup::Unresolved {
            return Err(HandshakeError::Safety("key exchange group is already negotiated"));
        }
        if !self.capabilities.is_curve_available(curve) {
            return Err(HandshakeError::Safety("negotiated curve is not available"));
        }
        self.negotiated = NegotiatedGroup::Curve(curve);
        Ok(())
    }

    pub fn negotiated(&self) -> NegotiatedGroup {
        self.negotiated
    }

    pub fn is_resolved(&self) -> bool {
        self.negotiated != NegotiatedGroup::Unresolved
    }

    /// Name of the negotiated hybrid group, `None` if a plain curve was negotiated.
    pub fn kem_group_name(&self) -> Result<Option<&'static str>> {
        match self.negotiated {
            NegotiatedGroup::Unresolved => Err(HandshakeError::NegotiationIncomplete),
            NegotiatedGroup::KemGroup(group) => Ok(Some(group.name)),
            NegotiatedGroup::Curve(_) => Ok(None),
        }
    }

    /// Name of the negotiated classical curve, `None` if a hybrid group was negotiated.
    pub fn curve_name(&self) -> Result<Option<&'static str>> {
        match self.negotiated {
            NegotiatedGroup::Unresolved => Err(HandshakeError::NegotiationIncomplete),
            NegotiatedGroup::KemGroup(_) => Ok(None),
            NegotiatedGroup::Curve(curve) => Ok(Some(curve.name)),
        }
    }

    /// Name of whichever group or curve was negotiated.
    pub fn key_exchange_group(&self) -> Result<&'static str> {
        self.negotiated
            .name()
            .ok_or(HandshakeError::NegotiationIncomplete)
    }
}
