//! # Flow modification
//!
//! Installs, modifies, or deletes a flow entry in a flow table.
use crate::actions::Instruction;
use crate::error::{Error, Result};
use crate::oxm::FlowMatch;
use crate::Repr;
use byteorder::{ByteOrder, NetworkEndian};

enum_with_unknown! {
    pub doc enum Command(u8) {
        /// New flow.
        Add            = 0,
        /// Modify all matching flows.
        Modify         = 1,
        /// Modify entry strictly matching `match` and `priority`.
        ModifyStrict   = 2,
        /// Delete all matching flows.
        Delete         = 3,
        /// Delete entry strictly matching `match` and `priority`.
        DeleteStrict   = 4
    }
}

/// Send a `FlowRemoved` when this flow expires or is deleted.
const FLAG_SEND_FLOW_REM: u16 = 1;
/// Check for overlapping entries first (`Add` only).
const FLAG_CHECK_OVERLAP: u16 = 1 << 1;
/// Reset flow packet/byte counts.
const FLAG_RESET_COUNTS: u16 = 1 << 2;
/// Don't keep track of packet count.
const FLAG_NO_PKT_COUNTS: u16 = 1 << 3;
/// Don't keep track of byte count.
const FLAG_NO_BYT_COUNTS: u16 = 1 << 4;

/// `ofp_flow_mod_flags`.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Flags(u16);

impl Flags {
    pub const NONE: Flags = Flags(0);
    pub const SEND_FLOW_REM: Flags = Flags(FLAG_SEND_FLOW_REM);

    pub fn new(bitmap: u16) -> Self {
        Flags(bitmap)
    }

    pub fn bits(&self) -> u16 {
        self.0
    }

    pub fn send_flow_rem(&self) -> bool {
        self.0 & FLAG_SEND_FLOW_REM != 0
    }

    pub fn check_overlap(&self) -> bool {
        self.0 & FLAG_CHECK_OVERLAP != 0
    }

    pub fn reset_counts(&self) -> bool {
        self.0 & FLAG_RESET_COUNTS != 0
    }

    pub fn no_pkt_counts(&self) -> bool {
        self.0 & FLAG_NO_PKT_COUNTS != 0
    }

    pub fn no_byt_counts(&self) -> bool {
        self.0 & FLAG_NO_BYT_COUNTS != 0
    }
}

mod field {
    #![allow(non_snake_case)]
    use crate::field::*;
    pub const COOKIE: Field = 0..8;
    pub const COOKIE_MASK: Field = 8..16;
    pub const TABLE_ID: usize = 16;
    pub const COMMAND: usize = 17;
    pub const IDLE_TIMEOUT: Field = 18..20;
    pub const HARD_TIMEOUT: Field = 20..22;
    pub const PRIORITY: Field = 22..24;
    pub const BUFFER_ID: Field = 24..28;
    pub const OUT_PORT: Field = 28..32;
    pub const OUT_GROUP: Field = 32..36;
    pub const FLAGS: Field = 36..38;
    pub const MATCH_AND_AFTER: Rest = 40..;
}

/// An `ofp_flow_mod`: the match, priority and cookie identifying one or more
/// flow entries, the command to apply, and (for `Add`/`Modify`) the
/// instruction pipeline to install.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PacketRepr<E> {
    pub cookie: u64,
    /// For `Modify*`/`Delete*`, only entries whose cookie matches under this
    /// mask are affected; a mask of zero matches any cookie.
    pub cookie_mask: u64,
    pub table_id: u8,
    pub command: Command,
    pub idle_timeout: u16,
    pub hard_timeout: u16,
    pub priority: u16,
    pub buffer_id: u32,
    pub out_port: u32,
    pub out_group: u32,
    pub flags: Flags,
    pub flow_match: FlowMatch<E>,
    pub instructions: Vec<Instruction<E>>,
}

impl<E: Repr> PacketRepr<E> {
    /// Validate the embedded match's field prerequisites. `Repr::parse`
    /// already runs this (via `FlowMatch::parse`); encoders call it again
    /// explicitly before `emit`, since a `PacketRepr` can be constructed by
    /// hand without going through `parse`.
    pub fn validate(&self) -> Result<()> {
        self.flow_match.validate_prereqs()
    }
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
        let flow_match_len = flow_match.buffer_len();
        let instructions_start = field::MATCH_AND_AFTER.start + flow_match_len;
        if len < instructions_start {
            return Err(Error::TooShort {
                needed: instructions_start,
                available: len,
            });
        }
        let mut instructions = Vec::new();
        let mut offset = instructions_start;
        while offset < len {
            let instruction = Instruction::parse(&buffer[offset..])?;
            offset += instruction.buffer_len();
            instructions.push(instruction);
        }
        Ok(PacketRepr {
            cookie: NetworkEndian::read_u64(&buffer[field::COOKIE]),
            cookie_mask: NetworkEndian::read_u64(&buffer[field::COOKIE_MASK]),
            table_id: buffer[field::TABLE_ID],
            command: Command::from(buffer[field::COMMAND]),
            idle_timeout: NetworkEndian::read_u16(&buffer[field::IDLE_TIMEOUT]),
            hard_timeout: NetworkEndian::read_u16(&buffer[field::HARD_TIMEOUT]),
            priority: NetworkEndian::read_u16(&buffer[field::PRIORITY]),
            buffer_id: NetworkEndian::read_u32(&buffer[field::BUFFER_ID]),
            out_port: NetworkEndian::read_u32(&buffer[field::OUT_PORT]),
            out_group: NetworkEndian::read_u32(&buffer[field::OUT_GROUP]),
            flags: Flags::new(NetworkEndian::read_u16(&buffer[field::FLAGS])),
            flow_match,
            instructions,
        })
    }

    fn buffer_len(&self) -> usize {
        field::MATCH_AND_AFTER.start
            + self.flow_match.buffer_len()
            + self
                .instructions
                .iter()
                .fold(0, |acc, i| acc + i.buffer_len())
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        self.validate()?;
        let needed = self.buffer_len();
        if buffer.len() < needed {
            return Err(Error::BufferFull {
                needed,
                available: buffer.len(),
            });
        }
        NetworkEndian::write_u64(&mut buffer[field::COOKIE], self.cookie);
        NetworkEndian::write_u64(&mut buffer[field::COOKIE_MASK], self.cookie_mask);
        buffer[field::TABLE_ID] = self.table_id;
        buffer[field::COMMAND] = self.command.into();
        NetworkEndian::write_u16(&mut buffer[field::IDLE_TIMEOUT], self.idle_timeout);
        NetworkEndian::write_u16(&mut buffer[field::HARD_TIMEOUT], self.hard_timeout);
        NetworkEndian::write_u16(&mut buffer[field::PRIORITY], self.priority);
        NetworkEndian::write_u32(&mut buffer[field::BUFFER_ID], self.buffer_id);
        NetworkEndian::write_u32(&mut buffer[field::OUT_PORT], self.out_port);
        NetworkEndian::write_u32(&mut buffer[field::OUT_GROUP], self.out_group);
        NetworkEndian::write_u16(&mut buffer[field::FLAGS], self.flags.bits());
        for byte in &mut buffer[38..40] {
            *byte = 0;
        }
        let flow_match_len = self.flow_match.buffer_len();
        self.flow_match
            .emit(&mut buffer[field::MATCH_AND_AFTER.start..field::MATCH_AND_AFTER.start + flow_match_len])?;
        let mut offset = field::MATCH_AND_AFTER.start + flow_match_len;
        for instruction in &self.instructions {
            let length = instruction.buffer_len();
            instruction.emit(&mut buffer[offset..offset + length])?;
            offset += length;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::actions::Action;
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

    fn sample() -> PacketRepr<NoExperimenter> {
        PacketRepr {
            cookie: 1,
            cookie_mask: 0,
            table_id: 0,
            command: Command::Add,
            idle_timeout: 0,
            hard_timeout: 0,
            priority: 0x8000,
            buffer_id: 0xffff_ffff,
            out_port: 0,
            out_group: 0,
            flags: Flags::SEND_FLOW_REM,
            flow_match: FlowMatch(vec![Oxm::FlowMatchField(FlowMatchField::InPort(
                InPort::new(1),
            ))]),
            instructions: vec![Instruction::ApplyActions(vec![Action::Output {
                port: 2,
                max_len: 0,
            }])],
        }
    }

    #[test]
    fn test_round_trip() {
        let repr = sample();
        let mut bytes = vec![0; repr.buffer_len()];
        repr.emit(&mut bytes).unwrap();
        assert_eq!(PacketRepr::parse(&bytes).unwrap(), repr);
    }

    #[test]
    fn test_emit_rejects_prereq_violation() {
        let mut repr = sample();
        repr.flow_match = FlowMatch(vec![Oxm::FlowMatchField(FlowMatchField::TcpSource(
            crate::oxm::TcpSource::new(80),
        ))]);
        let mut bytes = vec![0; repr.buffer_len()];
        assert!(repr.emit(&mut bytes).is_err());
    }
}
