//! OpenFlow protocol versions this crate negotiates and speaks.
//!
//! Unlike `ofpkt`'s `openflow::Version`, which enumerates every wire byte the
//! OpenFlow specifications have ever defined (1.0 through 1.6) for display
//! purposes, this crate only negotiates and codes the three versions named in
//! scope: 1.0, 1.2, and 1.3.

use crate::error::Error;

/// A negotiated (or negotiable) OpenFlow protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Version {
    /// OpenFlow 1.0, wire byte `0x01`.
    V1_0,
    /// OpenFlow 1.2, wire byte `0x03`.
    V1_2,
    /// OpenFlow 1.3, wire byte `0x04`.
    V1_3,
}

impl Version {
    /// All versions this crate is able to negotiate, lowest first.
    pub const ALL: [Version; 3] = [Version::V1_0, Version::V1_2, Version::V1_3];

    /// The wire byte used in the OpenFlow header's `version` field.
    pub fn wire_byte(self) -> u8 {
        match self {
            Version::V1_0 => 0x01,
            Version::V1_2 => 0x03,
            Version::V1_3 => 0x04,
        }
    }

    /// The bit this version occupies in a Hello version-bitmap element.
    pub fn bitmap_bit(self) -> u32 {
        1 << (self.wire_byte() as u32)
    }

    /// Parse a wire byte into a `Version`, or `Error::BadVersion` if it is
    /// not one of the three this crate negotiates.
    pub fn from_wire_byte(byte: u8) -> Result<Version, Error> {
        match byte {
            0x01 => Ok(Version::V1_0),
            0x03 => Ok(Version::V1_2),
            0x04 => Ok(Version::V1_3),
            other => Err(Error::BadVersion(other)),
        }
    }

    /// Decode a full version bitmap (as carried in a Hello element) into the
    /// set of versions it names, ignoring bits that don't correspond to a
    /// version this crate knows about.
    pub fn set_from_bitmap(bitmap: u32) -> Vec<Version> {
        Version::ALL
            .iter()
            .copied()
            .filter(|v| bitmap & v.bitmap_bit() != 0)
            .collect()
    }

    /// Encode a set of versions into a bitmap suitable for a Hello element.
    pub fn bitmap_from_set(versions: &[Version]) -> u32 {
        versions.iter().fold(0u32, |acc, v| acc | v.bitmap_bit())
    }

    /// OpenFlow version negotiation (§4.6, testable property 5): given the
    /// local and peer version bitmaps, the negotiated version is the highest
    /// version present in both. Returns `None` if the intersection is empty.
    pub fn negotiate(local_bitmap: u32, peer_bitmap: u32) -> Option<Version> {
        let intersection = local_bitmap & peer_bitmap;
        Version::set_from_bitmap(intersection).into_iter().max()
    }
}
