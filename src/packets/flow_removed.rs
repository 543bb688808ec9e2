//! # Flow removed
//!
//! Sent when a flow entry is removed from a flow table, either because it
//! expired or was explicitly deleted.
use crate::error::{Error, Result};
use crate::oxm::FlowMatch;
use crate::Repr;
use byteorder::{ByteOrder, NetworkEndian};

enum_with_unknown! {
    pub doc enum Reason(u8) {
        /// Flow idle time exceeded `idle_timeout`.
        IdleTimeout  = 0,
        /// Time exceeded `hard_timeout`.
        HardTimeout  = 1,
        /// Evicted by a `FlowMod` delete.
        Delete       = 2,
        /// Group was removed, taking the flow with it.
        GroupDelete  = 3
    }
}

mod field {
    #![allow(non_snake_case)]
    use crate::field::*;
    pub const COOKIE: Field = 0..8;
    pub const PRIORITY: Field = 8..10;
    pub const REASON: usize = 10;
    pub const TABLE_ID: usize = 11;
    pub const DURATION_SEC: Field = 12..16;
    pub const DURATION_NSEC: Field = 16..20;
    pub const IDLE_TIMEOUT: Field = 20..22;
    pub const HARD_TIMEOUT: Field = 22..24;
    pub const PACKET_COUNT: Field = 24..32;
    pub const BYTE_COUNT: Field = 32..40;
    pub const MATCH_AND_AFTER: Rest = 40..;
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PacketRepr<E> {
    pub cookie: u64,
    pub priority: u16,
    pub reason: Reason,
    pub table_id: u8,
    pub duration_sec: u32,
    pub duration_nsec: u32,
    pub idle_timeout: u16,
    pub hard_timeout: u16,
    pub packet_count: u64,
    pub byte_count: u64,
    pub flow_match: FlowMatch<E>,
}

impl<E: Repr> Repr for PacketRepr<E> {
    fn parse(buffer: &[u8]) -> Result<Self> {
        let len = buffer.len();
        if len < field::MATCH_AND_AFTER.start {
            return Err(Error::TooShort {
                needed: field::MATCH_AND_AFTER.start,
                available: len,
            });
        }
        let flow_match = FlowMatch::parse(&buffer[field::MATCH_AND_AFTER])?;
        Ok(PacketRepr {
            cookie: NetworkEndian::read_u64(&buffer[field::COOKIE]),
            priority: NetworkEndian::read_u16(&buffer[field::PRIORITY]),
            reason: Reason::from(buffer[field::REASON]),
            table_id: buffer[field::TABLE_ID],
            duration_sec: NetworkEndian::read_u32(&buffer[field::DURATION_SEC]),
            duration_nsec: NetworkEndian::read_u32(&buffer[field::DURATION_NSEC]),
            idle_timeout: NetworkEndian::read_u16(&buffer[field::IDLE_TIMEOUT]),
            hard_timeout: NetworkEndian::read_u16(&buffer[field::HARD_TIMEOUT]),
            packet_count: NetworkEndian::read_u64(&buffer[field::PACKET_COUNT]),
            byte_count: NetworkEndian::read_u64(&buffer[field::BYTE_COUNT]),
            flow_match,
        })
    }

    fn buffer_len(&self) -> usize {
        field::MATCH_AND_AFTER.start + self.flow_match.buffer_len()
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        let needed = self.buffer_len();
        if buffer.len() < needed {
            return Err(Error::BufferFull {
                needed,
                available: buffer.len(),
            });
        }
        NetworkEndian::write_u64(&mut buffer[field::COOKIE], self.cookie);
        NetworkEndian::write_u16(&mut buffer[field::PRIORITY], self.priority);
        buffer[field::REASON] = self.reason.into();
        buffer[field::TABLE_ID] = self.table_id;
        NetworkEndian::write_u32(&mut buffer[field::DURATION_SEC], self.duration_sec);
        NetworkEndian::write_u32(&mut buffer[field::DURATION_NSEC], self.duration_nsec);
        NetworkEndian::write_u16(&mut buffer[field::IDLE_TIMEOUT], self.idle_timeout);
        NetworkEndian::write_u16(&mut buffer[field::HARD_TIMEOUT], self.hard_timeout);
        NetworkEndian::write_u64(&mut buffer[field::PACKET_COUNT], self.packet_count);
        NetworkEndian::write_u64(&mut buffer[field::BYTE_COUNT], self.byte_count);
        self.flow_match.emit(&mut buffer[field::MATCH_AND_AFTER])
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::oxm::{FlowMatchField, InPort, Oxm};

    #[derive(Debug, PartialEq, Eq, Clone)]
    struct NoExperimenter;

    impl Repr for NoExperimenter {
        fn parse(_buffer: &[u8]) -> Result<Self> {
            unreachable!()
        }
        fn buffer_len(&self) -> usize {
            0
        }
        fn emit(&self, _buffer: &mut [u8]) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_round_trip() {
        let repr = PacketRepr::<NoExperimenter> {
            cookie: 0xCAFEBABE,
            priority: 10,
            reason: Reason::IdleTimeout,
            table_id: 0,
            duration_sec: 42,
            duration_nsec: 0,
            idle_timeout: 30,
            hard_timeout: 0,
            packet_count: 1,
            byte_count: 64,
            flow_match: FlowMatch(vec![Oxm::FlowMatchField(FlowMatchField::InPort(
                InPort::new(3),
            ))]),
        };
        let mut bytes = vec![0; repr.buffer_len()];
        repr.emit(&mut bytes).unwrap();
        assert_eq!(PacketRepr::parse(&bytes).unwrap(), repr);
    }
}
