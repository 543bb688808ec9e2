//! # Packet in
//!
//! The wire shape of this message differs by version. OpenFlow 1.0 carries
//! the legacy `in_port`-only header; 1.2 and 1.3 carry `table_id`/`cookie`
//! and the full OXM flow match:
//!
//! ```no_rust
//! // 1.0
//!  0      7        15       23       31
//! +--------+--------+--------+--------+
//! |           buffer id               |
//! +--------+--------+--------+--------+
//! |   total length  |     in_port     |
//! +--------+--------+--------+--------+
//! | reason |  pad   |      data       |
//! +--------+--------+--------+--------+
//!
//! // 1.2 / 1.3
//!  0      7        15       23       31
//! +--------+--------+--------+--------+
//! |           buffer id               |
//! +--------+--------+--------+--------+
//! |  frame length   | reason |table_id|
//! +--------+--------+--------+--------+
//! |               cookie              |
//! |                                   |
//! +--------+--------+--------+--------+
//! |       Flow match fields           |
//! | (variable length, 8 bytes aligned)|
//! |                                   |
//! +--------+--------+--------+--------+
//! |     padding     |      frame      |
//! +--------+--------+                 +
//! |       (variable length)           |
//! +--------+--------+--------+--------+
//! ```
use crate::error::{Error, Result};
use crate::oxm::FlowMatch;
use crate::port::PortNumber;
use crate::version::Version;
use crate::{Repr, VersionedRepr};
use byteorder::{ByteOrder, NetworkEndian};

enum_with_unknown! {
    pub doc enum Reason(u8) {
        /// No matching flow (table-miss flow entry).
        TableMiss = 0,
        /// Output to controller in apply-actions.
        ApplyAction = 1,
        /// Packet has invalid TTL
        InvalidTtl = 2,
        /// Output to controller in action set.
        ActionSet = 3,
        /// Output to controller in group bucket.
        Group = 4,
        /// Output to controller in packet-out.
        PacketOut = 5
    }
}

/// The 1.2/1.3 wire wrapper, carrying `table_id`, `cookie`, and an OXM
/// flow match of variable length.
#[derive(Debug, PartialEq, Eq, Clone)]
struct Packet<T: AsRef<[u8]>> {
    buffer: T,
}

mod field {
    #![allow(non_snake_case)]
    use crate::field::*;
    pub const BUFFER_ID: Field = 0..4;
    pub const FRAME_LENGTH: Field = 4..6;
    pub const REASON: usize = 6;
    pub const TABLE_ID: usize = 7;
    pub const COOKIE: Field = 8..16;

    // We have no way to know how long the flow_match field is, so we can't know where the padding
    // and the frame are. We have to parse the flow_match field first, and then parse the rest of
    // the message.
    pub const FLOW_MATCH_AND_AFTER: Rest = 16..;

    pub fn FLOW_MATCH(flow_match_len: usize) -> Field {
        COOKIE.end..(COOKIE.end + flow_match_len)
    }

    pub fn PADDING(flow_match_len: usize) -> Field {
        FLOW_MATCH(flow_match_len).end..(FLOW_MATCH(flow_match_len).end + 2)
    }

    pub fn FRAME(flow_match_len: usize) -> Rest {
        PADDING(flow_match_len).end..
    }
}

impl<T: AsRef<[u8]>> Packet<T> {
    fn new(buffer: T) -> Packet<T> {
        Packet { buffer }
    }

    fn check_len(&self, flow_match_len: usize) -> Result<()> {
        let len = self.buffer.as_ref().len();
        let needed = field::FRAME(flow_match_len).start;
        if len < needed {
            return Err(Error::TooShort {
                needed,
                available: len,
            });
        }
        Ok(())
    }

    fn buffer_id(&self) -> u32 {
        let data = self.buffer.as_ref();
        NetworkEndian::read_u32(&data[field::BUFFER_ID])
    }

    fn frame_length(&self) -> u16 {
        let data = self.buffer.as_ref();
        NetworkEndian::read_u16(&data[field::FRAME_LENGTH])
    }

    fn reason(&self) -> Reason {
        let data = self.buffer.as_ref();
        Reason::from(data[field::REASON])
    }

    fn table_id(&self) -> u8 {
        let data = self.buffer.as_ref();
        data[field::TABLE_ID]
    }

    fn cookie(&self) -> u64 {
        let data = self.buffer.as_ref();
        NetworkEndian::read_u64(&data[field::COOKIE])
    }

    /// Return the whole buffer after the `cookie` field: `flow_match` +
    /// `padding` + `frame`, whose individual boundaries aren't known until
    /// `flow_match` itself has been parsed.
    fn flow_match_and_after(&self) -> &[u8]
    where
        T: AsRef<[u8]>,
    {
        &self.buffer.as_ref()[field::FLOW_MATCH_AND_AFTER]
    }

    fn frame(&self, flow_match_len: usize) -> &[u8] {
        &self.buffer.as_ref()[field::FRAME(flow_match_len)]
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> Packet<T> {
    fn set_buffer_id(&mut self, value: u32) {
        let data = self.buffer.as_mut();
        NetworkEndian::write_u32(&mut data[field::BUFFER_ID], value)
    }

    fn set_frame_length(&mut self, value: u16) {
        let data = self.buffer.as_mut();
        NetworkEndian::write_u16(&mut data[field::FRAME_LENGTH], value)
    }

    fn set_reason(&mut self, value: Reason) {
        self.buffer.as_mut()[field::REASON] = value.into();
    }

    fn set_table_id(&mut self, value: u8) {
        self.buffer.as_mut()[field::TABLE_ID] = value;
    }

    fn set_cookie(&mut self, value: u64) {
        let data = self.buffer.as_mut();
        NetworkEndian::write_u64(&mut data[field::COOKIE], value)
    }

    fn set_padding(&mut self, flow_match_len: usize) {
        let data = self.buffer.as_mut();
        NetworkEndian::write_u16(&mut data[field::PADDING(flow_match_len)], 0)
    }

    fn set_frame(&mut self, flow_match_len: usize, value: &[u8]) {
        self.buffer.as_mut()[field::FRAME(flow_match_len)].copy_from_slice(value);
    }
}

/// The 1.0 wire layout: `in_port` in place of `table_id`/`cookie`/`match`.
mod field_v1_0 {
    use crate::field::*;
    pub const BUFFER_ID: Field = 0..4;
    pub const TOTAL_LEN: Field = 4..6;
    pub const IN_PORT: Field = 6..8;
    pub const REASON: usize = 8;
    pub const PAD: usize = 9;
    pub const DATA: Rest = 10..;
}

/// A Packet-In message. `in_port` is only meaningful (and only emitted) for
/// [`Version::V1_0`]; `table_id`/`cookie`/`flow_match` are only meaningful
/// (and only emitted) for [`Version::V1_2`]/[`Version::V1_3`].
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PacketRepr<E> {
    /// Opaque identifier of a packet buffered on the datapath, or
    /// `OFP_NO_BUFFER` (`0xffff_ffff`) if the packet wasn't buffered.
    pub buffer_id: u32,
    /// Full length of the packet that triggered this message, which may
    /// exceed the length of `frame` if the packet was truncated.
    pub frame_length: u16,
    /// What triggered the packet being sent to the controller.
    pub reason: Reason,
    /// 1.2/1.3 only: the table that produced this packet-in.
    pub table_id: u8,
    /// 1.2/1.3 only: the cookie of the flow entry that matched, or all-ones
    /// if none did.
    pub cookie: u64,
    /// 1.0 only: the ingress port.
    pub in_port: PortNumber,
    /// 1.2/1.3 only: the pipeline fields associated with the packet.
    pub flow_match: FlowMatch<E>,
    /// The (possibly truncated) packet data.
    pub frame: Vec<u8>,
}

impl<E: Repr> VersionedRepr for PacketRepr<E> {
    fn parse(version: Version, buffer: &[u8]) -> Result<Self> {
        match version {
            Version::V1_0 => {
                let len = buffer.len();
                if len < field_v1_0::DATA.start {
                    return Err(Error::TooShort {
                        needed: field_v1_0::DATA.start,
                        available: len,
                    });
                }
                let buffer_id = NetworkEndian::read_u32(&buffer[field_v1_0::BUFFER_ID]);
                let frame_length = NetworkEndian::read_u16(&buffer[field_v1_0::TOTAL_LEN]);
                let in_port = PortNumber::from(
                    NetworkEndian::read_u16(&buffer[field_v1_0::IN_PORT]) as u32,
                );
                let reason = Reason::from(buffer[field_v1_0::REASON]);
                Ok(PacketRepr {
                    buffer_id,
                    frame_length,
                    reason,
                    table_id: 0,
                    cookie: 0,
                    in_port,
                    flow_match: FlowMatch(Vec::new()),
                    frame: buffer[field_v1_0::DATA].to_vec(),
                })
            }
            Version::V1_2 | Version::V1_3 => {
                let len = buffer.len();
                let min_len = field::PADDING(0).end;
                if len < min_len {
                    return Err(Error::TooShort {
                        needed: min_len,
                        available: len,
                    });
                }
                let packet = Packet::new(buffer);
                let flow_match = FlowMatch::parse(packet.flow_match_and_after())?;
                let flow_match_len = flow_match.buffer_len();
                packet.check_len(flow_match_len)?;
                Ok(PacketRepr {
                    buffer_id: packet.buffer_id(),
                    frame_length: packet.frame_length(),
                    table_id: packet.table_id(),
                    cookie: packet.cookie(),
                    reason: packet.reason(),
                    in_port: PortNumber::Any,
                    flow_match,
                    frame: packet.frame(flow_match_len).to_vec(),
                })
            }
        }
    }

    fn buffer_len(&self, version: Version) -> usize {
        match version {
            Version::V1_0 => field_v1_0::DATA.start + self.frame.len(),
            Version::V1_2 | Version::V1_3 => {
                field::COOKIE.end + self.flow_match.buffer_len() + 2 + self.frame.len()
            }
        }
    }

    fn emit(&self, version: Version, buffer: &mut [u8]) -> Result<()> {
        let needed = self.buffer_len(version);
        if buffer.len() < needed {
            return Err(Error::BufferFull {
                needed,
                available: buffer.len(),
            });
        }
        match version {
            Version::V1_0 => {
                NetworkEndian::write_u32(&mut buffer[field_v1_0::BUFFER_ID], self.buffer_id);
                NetworkEndian::write_u16(&mut buffer[field_v1_0::TOTAL_LEN], self.frame_length);
                let in_port: u32 = self.in_port.into();
                NetworkEndian::write_u16(&mut buffer[field_v1_0::IN_PORT], in_port as u16);
                buffer[field_v1_0::REASON] = self.reason.into();
                buffer[field_v1_0::PAD] = 0;
                buffer[field_v1_0::DATA].copy_from_slice(&self.frame);
                Ok(())
            }
            Version::V1_2 | Version::V1_3 => {
                let mut packet = Packet::new(buffer);
                packet.set_buffer_id(self.buffer_id);
                packet.set_frame_length(self.frame_length);
                packet.set_reason(self.reason);
                packet.set_table_id(self.table_id);
                packet.set_cookie(self.cookie);
                let flow_match_len = self.flow_match.buffer_len();
                self.flow_match
                    .emit(&mut packet.buffer.as_mut()[field::FLOW_MATCH(flow_match_len)])?;
                packet.set_padding(flow_match_len);
                packet.set_frame(flow_match_len, &self.frame);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::oxm::{FlowMatchField, InPort, Oxm};

    #[derive(Debug, PartialEq, Eq, Clone)]
    struct OxmExperimenter;

    impl Repr for OxmExperimenter {
        fn parse(_buffer: &[u8]) -> Result<Self> {
            unreachable!()
        }
        fn buffer_len(&self) -> usize {
            unreachable!()
        }
        fn emit(&self, _buffer: &mut [u8]) -> Result<()> {
            unreachable!()
        }
    }

    #[test]
    fn test_v1_0_round_trip() {
        let repr = PacketRepr::<OxmExperimenter> {
            buffer_id: 0xffff_ffff,
            frame_length: 4,
            reason: Reason::ApplyAction,
            table_id: 0,
            cookie: 0,
            in_port: PortNumber::Regular(1),
            flow_match: FlowMatch(Vec::new()),
            frame: vec![0xde, 0xad, 0xbe, 0xef],
        };
        let mut bytes = vec![0; repr.buffer_len(Version::V1_0)];
        repr.emit(Version::V1_0, &mut bytes).unwrap();
        let parsed = PacketRepr::<OxmExperimenter>::parse(Version::V1_0, &bytes).unwrap();
        assert_eq!(parsed.buffer_id, repr.buffer_id);
        assert_eq!(parsed.in_port, repr.in_port);
        assert_eq!(parsed.frame, repr.frame);
    }

    #[test]
    fn test_v1_3_round_trip() {
        let repr = PacketRepr::<OxmExperimenter> {
            buffer_id: 0xffff_ffff,
            frame_length: 4,
            reason: Reason::TableMiss,
            table_id: 3,
            cookie: 42,
            in_port: PortNumber::Any,
            flow_match: FlowMatch(vec![Oxm::FlowMatchField(FlowMatchField::InPort(
                InPort::new(1),
            ))]),
            frame: vec![0xde, 0xad, 0xbe, 0xef],
        };
        let mut bytes = vec![0; repr.buffer_len(Version::V1_3)];
        repr.emit(Version::V1_3, &mut bytes).unwrap();
        let parsed = PacketRepr::<OxmExperimenter>::parse(Version::V1_3, &bytes).unwrap();
        assert_eq!(parsed, repr);
    }
}
