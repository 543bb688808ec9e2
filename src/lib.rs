//! `ofchan` speaks the OpenFlow switch-control protocol as both controller
//! and datapath endpoint: version negotiation, a primary-plus-auxiliary
//! channel multiplexer, and a bit-exact wire codec for OpenFlow 1.0, 1.2 and
//! 1.3.
//!
//! The crate is organized bottom-up, the way the wire format itself nests:
//!
//! - [`wire`] — endian conversion and bounded-buffer cursors (C1).
//! - [`oxm`] — OXM match-field TLVs and the `Match` they compose into (C2).
//! - [`actions`] — actions, instructions, and group buckets (C3).
//! - [`packets`] — the typed [`Msg`] enum and its versioned codec (C4).
//! - [`xid`] — the transaction-id registry (C5).
//! - [`conn`] — the per-connection state machine (C6).
//! - [`chan`] — the channel multiplexer (C7).
//! - [`env`] — the embedder upcall surface (C8).
//! - [`transport`] — the byte-stream abstraction the core consumes.

mod error;
mod field {
    use core::ops;
    pub type Field = ops::Range<usize>;
    pub type Rest = ops::RangeFrom<usize>;
}
#[macro_use]
mod macros;
mod port;
mod version;
mod wire;

pub mod actions;
pub mod chan;
pub mod conn;
pub mod env;
pub mod oxm;
pub mod packets;
pub mod transport;
pub mod xid;

pub use crate::chan::{Chan, ChanConfig};
pub use crate::conn::{Conn, ConnConfig, ConnState};
pub use crate::env::Environment;
pub use crate::error::{Error, Result};
pub use crate::oxm::FlowMatch;
pub use crate::packets::Msg;
pub use crate::port::PortNumber;
pub use crate::version::Version;
pub use crate::xid::XId;

/// A connection identifier within a [`Chan`]: `0` is the primary, `1..=255`
/// are auxiliaries (§3 of the design spec).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AuxId(pub u8);

impl AuxId {
    /// The primary connection of a channel always has auxid 0.
    pub const PRIMARY: AuxId = AuxId(0);

    pub fn is_primary(self) -> bool {
        self.0 == 0
    }
}

impl From<u8> for AuxId {
    fn from(v: u8) -> Self {
        AuxId(v)
    }
}

impl From<AuxId> for u8 {
    fn from(v: AuxId) -> Self {
        v.0
    }
}

impl core::fmt::Display for AuxId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A self-contained, version-independent sub-structure of the OpenFlow wire
/// format: an OXM field, an action, an instruction, a bucket, a Hello
/// element. Kept from `ofpkt`'s own `Repr` trait, unchanged, since these
/// leaf shapes don't vary across the versions this crate speaks.
pub trait Repr
where
    Self: Sized,
{
    /// Parse a packet and return a high-level representation.
    fn parse(buffer: &[u8]) -> Result<Self>;

    /// Return the length of a packet that will be emitted from this
    /// high-level representation.
    fn buffer_len(&self) -> usize;

    /// Emit a high-level representation into a buffer.
    fn emit(&self, buffer: &mut [u8]) -> Result<()>;
}

/// A sub-structure whose wire shape genuinely differs across the versions
/// this crate speaks (most of [`Msg`]'s payloads, e.g. Packet-In, Features
/// Reply).
pub trait VersionedRepr
where
    Self: Sized,
{
    fn parse(version: Version, buffer: &[u8]) -> Result<Self>;
    fn buffer_len(&self, version: Version) -> usize;
    fn emit(&self, version: Version, buffer: &mut [u8]) -> Result<()>;
}
