//! # Asynchronous message configuration
//!
//! `ofp_async_config`: per-role masks controlling which `PacketIn`,
//! `PortStatus` and `FlowRemoved` reasons a controller receives
//! unsolicited. Shared by `GetAsyncReply` and `SetAsync`; `GetAsyncRequest`
//! carries no body.
use crate::error::{Error, Result};
use crate::Repr;
use byteorder::{ByteOrder, NetworkEndian};

mod field {
    #![allow(non_snake_case)]
    use crate::field::*;
    pub const PACKET_IN_MASK: Field = 0..8;
    pub const PORT_STATUS_MASK: Field = 8..16;
    pub const FLOW_REMOVED_MASK: Field = 16..24;
    pub const LEN: usize = 24;
}

/// One `(master/equal, slave)` mask pair for a given reason's bitmap.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct RoleMask {
    pub master: u32,
    pub slave: u32,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct PacketRepr {
    pub packet_in_mask: RoleMask,
    pub port_status_mask: RoleMask,
    pub flow_removed_mask: RoleMask,
}

impl Repr for PacketRepr {
    fn parse(buffer: &[u8]) -> Result<Self> {
        let len = buffer.len();
        if len < field::LEN {
            return Err(Error::TooShort {
                needed: field::LEN,
                available: len,
            });
        }
        let read_mask = |range: std::ops::Range<usize>| RoleMask {
            master: NetworkEndian::read_u32(&buffer[range.start..range.start + 4]),
            slave: NetworkEndian::read_u32(&buffer[range.start + 4..range.end]),
        };
        Ok(PacketRepr {
            packet_in_mask: read_mask(field::PACKET_IN_MASK),
            port_status_mask: read_mask(field::PORT_STATUS_MASK),
            flow_removed_mask: read_mask(field::FLOW_REMOVED_MASK),
        })
    }

    fn buffer_len(&self) -> usize {
        field::LEN
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        let needed = self.buffer_len();
        if buffer.len() < needed {
            return Err(Error::BufferFull {
                needed,
                available: buffer.len(),
            });
        }
        let mut write_mask = |range: std::ops::Range<usize>, mask: RoleMask| {
            NetworkEndian::write_u32(&mut buffer[range.start..range.start + 4], mask.master);
            NetworkEndian::write_u32(&mut buffer[range.start + 4..range.end], mask.slave);
        };
        write_mask(field::PACKET_IN_MASK, self.packet_in_mask);
        write_mask(field::PORT_STATUS_MASK, self.port_status_mask);
        write_mask(field::FLOW_REMOVED_MASK, self.flow_removed_mask);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_round_trip() {
        let repr = PacketRepr {
            packet_in_mask: RoleMask { master: 1, slave: 0 },
            port_status_mask: RoleMask { master: 7, slave: 7 },
            flow_removed_mask: RoleMask { master: 0, slave: 0 },
        };
        let mut bytes = vec![0; repr.buffer_len()];
        repr.emit(&mut bytes).unwrap();
        assert_eq!(PacketRepr::parse(&bytes).unwrap(), repr);
    }
}
