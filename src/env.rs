//! The single upcall surface (C8) both [`crate::Conn`] and [`crate::Chan`]
//! invoke on the embedder.
//!
//! The embedder implements [`Environment`] and hands `Chan` a
//! `std::sync::Weak<dyn Environment>` rather than an owning reference (see
//! Design Notes in SPEC_FULL.md): every upcall site calls `Weak::upgrade()`
//! immediately beforehand, and silently skips the call if the embedder has
//! already been dropped.

use crate::{AuxId, Chan, Msg, Version, XId};

/// Capabilities the embedder exposes to the codec/state-machine layer.
/// Object-safe and `Send + Sync` so a single implementation can be shared
/// (via `Arc`) across the per-`Conn` threads described in §5.
pub trait Environment: Send + Sync {
    /// The channel's primary connection reached `Established` at `version`.
    fn handle_established(&self, chan: &Chan, version: Version);

    /// The connection identified by `auxid` was closed (for any reason).
    /// Exactly one call per `Conn` that ever existed.
    fn handle_closed(&self, chan: &Chan, auxid: AuxId);

    /// The transport refused the connection attempt for `auxid`.
    fn handle_connect_refused(&self, chan: &Chan, auxid: AuxId);

    /// The transport failed while connecting `auxid`.
    fn handle_connect_failed(&self, chan: &Chan, auxid: AuxId);

    /// Accepting an incoming connection for `auxid` failed.
    fn handle_accept_failed(&self, chan: &Chan, auxid: AuxId);

    /// Version negotiation failed for `auxid` (empty bitmap intersection).
    fn handle_negotiation_failed(&self, chan: &Chan, auxid: AuxId);

    /// The outbound tail queue for `auxid` has fully drained.
    fn handle_send(&self, chan: &Chan, auxid: AuxId);

    /// A message was fully decoded off `auxid`. Ownership of `msg` passes to
    /// the environment.
    fn handle_recv(&self, chan: &Chan, auxid: AuxId, msg: Msg);

    /// `auxid`'s outbound tail queue just filled up; further sends on it
    /// will fail with `Error::Congested` until it drains.
    fn congestion_indication(&self, chan: &Chan, auxid: AuxId);

    /// Allocate an id for a library-originated, spontaneous message on
    /// `auxid` (e.g. an Echo-Request).
    fn get_async_xid(&self, chan: &Chan, auxid: AuxId) -> XId;

    /// Allocate an id for an embedder-issued request of kind
    /// `(msg_type, msg_sub)` on `auxid`. The registry treats the kind
    /// opaquely; see DESIGN.md.
    fn get_sync_xid(&self, chan: &Chan, auxid: AuxId, msg_type: u8, msg_sub: u8) -> XId;

    /// Release a previously allocated sync xid once its reply has arrived
    /// (or is no longer expected).
    fn release_sync_xid(&self, chan: &Chan, xid: XId);
}
