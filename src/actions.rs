//! Action and instruction codec (C3).
//!
//! Actions and instructions share a polymorphic wire shape: a 2-byte `type`,
//! a 2-byte `length` (a multiple of 8, covering the whole element), and a
//! type-specific payload. This module follows the same TLV-list parsing
//! idiom as [`crate::oxm::flow_match`]: an element is read, its `length`
//! consumed, and the next element starts right after — there is no
//! separately-framed list header.
use crate::error::{Error, Result};
use crate::oxm::{FlowMatchField, Oxm};
use crate::Repr;
use byteorder::{ByteOrder, NetworkEndian};

enum_with_unknown! {
    /// Action type, carried in an action element's `type` field.
    pub doc enum ActionKind(u16) {
        /// Output to a switch port.
        Output        = 0,
        /// Copy TTL "outwards" -- from next-to-outermost to outermost.
        CopyTtlOut    = 11,
        /// Copy TTL "inwards" -- from outermost to next-to-outermost.
        CopyTtlIn     = 12,
        /// Set the MPLS TTL.
        SetMplsTtl    = 15,
        /// Decrement the MPLS TTL.
        DecMplsTtl    = 16,
        /// Push a new VLAN tag.
        PushVlan      = 17,
        /// Pop the outer VLAN tag.
        PopVlan       = 18,
        /// Push a new MPLS tag.
        PushMpls      = 19,
        /// Pop the outer MPLS tag.
        PopMpls       = 20,
        /// Set the queue id used to map a flow to an output queue.
        SetQueue      = 21,
        /// Apply a group.
        Group         = 22,
        /// Set the IP TTL.
        SetNwTtl      = 23,
        /// Decrement the IP TTL.
        DecNwTtl      = 24,
        /// Set a single OXM field, as used for pipeline fields, headers.
        SetField      = 25,
        /// Push a new PBB service tag.
        PushPbb       = 26,
        /// Pop the outer PBB service tag.
        PopPbb        = 27,
        /// Vendor extension.
        Experimenter  = 0xffff
    }
}

mod field {
    #![allow(non_snake_case)]
    use crate::field::*;
    pub const KIND: Field = 0..2;
    pub const LENGTH: Field = 2..4;
    pub const HEADER_LEN: usize = 8;
    pub fn BODY(length: usize) -> Rest {
        HEADER_LEN..length
    }
}

/// A single action, as carried in an apply-actions/write-actions
/// instruction, or in a Packet-Out message.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Action<E> {
    /// Output to `port`, buffering at most `max_len` bytes for the
    /// controller if `port == Controller`.
    Output { port: u32, max_len: u16 },
    CopyTtlOut,
    CopyTtlIn,
    SetMplsTtl(u8),
    DecMplsTtl,
    PushVlan(u16),
    PopVlan,
    PushMpls(u16),
    PopMpls(u16),
    SetQueue(u32),
    Group(u32),
    SetNwTtl(u8),
    DecNwTtl,
    SetField(FlowMatchField),
    PushPbb(u16),
    PopPbb,
    Experimenter(u32, E),
}

impl<E: Repr> Action<E> {
    fn kind(&self) -> ActionKind {
        match *self {
            Action::Output { .. } => ActionKind::Output,
            Action::CopyTtlOut => ActionKind::CopyTtlOut,
            Action::CopyTtlIn => ActionKind::CopyTtlIn,
            Action::SetMplsTtl(_) => ActionKind::SetMplsTtl,
            Action::DecMplsTtl => ActionKind::DecMplsTtl,
            Action::PushVlan(_) => ActionKind::PushVlan,
            Action::PopVlan => ActionKind::PopVlan,
            Action::PushMpls(_) => ActionKind::PushMpls,
            Action::PopMpls(_) => ActionKind::PopMpls,
            Action::SetQueue(_) => ActionKind::SetQueue,
            Action::Group(_) => ActionKind::Group,
            Action::SetNwTtl(_) => ActionKind::SetNwTtl,
            Action::DecNwTtl => ActionKind::DecNwTtl,
            Action::SetField(_) => ActionKind::SetField,
            Action::PushPbb(_) => ActionKind::PushPbb,
            Action::PopPbb => ActionKind::PopPbb,
            Action::Experimenter(..) => ActionKind::Experimenter,
        }
    }
}

/// Round up to the next multiple of 8, the alignment every action and
/// instruction element is padded to.
fn pad8(len: usize) -> usize {
    (len + 7) / 8 * 8
}

impl<E: Repr> Repr for Action<E> {
    fn parse(buffer: &[u8]) -> Result<Self> {
        let len = buffer.len();
        if len < field::HEADER_LEN {
            return Err(Error::TooShort {
                needed: field::HEADER_LEN,
                available: len,
            });
        }
        let kind = ActionKind::from(NetworkEndian::read_u16(&buffer[field::KIND]));
        let length = NetworkEndian::read_u16(&buffer[field::LENGTH]) as usize;
        if length < field::HEADER_LEN || length % 8 != 0 {
            return Err(Error::InvalList);
        }
        if len < length {
            return Err(Error::TooShort {
                needed: length,
                available: len,
            });
        }
        let body = &buffer[field::BODY(length)];
        Ok(match kind {
            ActionKind::Output => Action::Output {
                port: NetworkEndian::read_u32(&body[0..4]),
                max_len: NetworkEndian::read_u16(&body[4..6]),
            },
            ActionKind::CopyTtlOut => Action::CopyTtlOut,
            ActionKind::CopyTtlIn => Action::CopyTtlIn,
            ActionKind::SetMplsTtl => Action::SetMplsTtl(body[0]),
            ActionKind::DecMplsTtl => Action::DecMplsTtl,
            ActionKind::PushVlan => Action::PushVlan(NetworkEndian::read_u16(&body[0..2])),
            ActionKind::PopVlan => Action::PopVlan,
            ActionKind::PushMpls => Action::PushMpls(NetworkEndian::read_u16(&body[0..2])),
            ActionKind::PopMpls => Action::PopMpls(NetworkEndian::read_u16(&body[0..2])),
            ActionKind::SetQueue => Action::SetQueue(NetworkEndian::read_u32(&body[0..4])),
            ActionKind::Group => Action::Group(NetworkEndian::read_u32(&body[0..4])),
            ActionKind::SetNwTtl => Action::SetNwTtl(body[0]),
            ActionKind::DecNwTtl => Action::DecNwTtl,
            ActionKind::SetField => match Oxm::<E>::parse(body)? {
                Oxm::FlowMatchField(field) => Action::SetField(field),
                _ => return Err(Error::BadOxmClass(0)),
            },
            ActionKind::PushPbb => Action::PushPbb(NetworkEndian::read_u16(&body[0..2])),
            ActionKind::PopPbb => Action::PopPbb,
            ActionKind::Experimenter => {
                let experimenter = NetworkEndian::read_u32(&body[0..4]);
                Action::Experimenter(experimenter, E::parse(&body[4..])?)
            }
            ActionKind::Unknown(raw) => return Err(Error::BadKind(raw as u8)),
        })
    }

    fn buffer_len(&self) -> usize {
        let body_len = match *self {
            Action::Output { .. } => 8,
            Action::CopyTtlOut | Action::CopyTtlIn | Action::DecMplsTtl | Action::DecNwTtl
            | Action::PopVlan | Action::PopPbb => 4,
            Action::SetMplsTtl(_) | Action::SetNwTtl(_) => 4,
            Action::PushVlan(_) | Action::PushMpls(_) | Action::PopMpls(_) | Action::PushPbb(_) => 4,
            Action::SetQueue(_) | Action::Group(_) => 4,
            Action::SetField(ref field) => field.buffer_len(),
            Action::Experimenter(_, ref repr) => 4 + repr.buffer_len(),
        };
        pad8(field::HEADER_LEN + body_len)
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        let needed = self.buffer_len();
        if buffer.len() < needed {
            return Err(Error::BufferFull {
                needed,
                available: buffer.len(),
            });
        }
        NetworkEndian::write_u16(&mut buffer[field::KIND], self.kind().into());
        NetworkEndian::write_u16(&mut buffer[field::LENGTH], needed as u16);
        for byte in &mut buffer[field::HEADER_LEN..needed] {
            *byte = 0;
        }
        let body = &mut buffer[field::BODY(needed)];
        match *self {
            Action::Output { port, max_len } => {
                NetworkEndian::write_u32(&mut body[0..4], port);
                NetworkEndian::write_u16(&mut body[4..6], max_len);
            }
            Action::CopyTtlOut | Action::CopyTtlIn | Action::DecMplsTtl | Action::DecNwTtl
            | Action::PopVlan | Action::PopPbb => {}
            Action::SetMplsTtl(ttl) | Action::SetNwTtl(ttl) => body[0] = ttl,
            Action::PushVlan(ethertype)
            | Action::PushMpls(ethertype)
            | Action::PopMpls(ethertype)
            | Action::PushPbb(ethertype) => {
                NetworkEndian::write_u16(&mut body[0..2], ethertype);
            }
            Action::SetQueue(id) | Action::Group(id) => {
                NetworkEndian::write_u32(&mut body[0..4], id);
            }
            Action::SetField(ref field) => {
                Oxm::FlowMatchField(field.clone()).emit(body)?;
            }
            Action::Experimenter(experimenter, ref repr) => {
                NetworkEndian::write_u32(&mut body[0..4], experimenter);
                repr.emit(&mut body[4..])?;
            }
        }
        Ok(())
    }
}

/// Parse a contiguous run of actions, as embedded in apply-actions,
/// write-actions, group buckets and Packet-Out messages. The list has no
/// separate length prefix: it simply occupies the rest of the enclosing
/// structure.
pub fn parse_action_list<E: Repr>(buffer: &[u8]) -> Result<Vec<Action<E>>> {
    let mut actions = Vec::new();
    let mut offset = 0;
    while offset < buffer.len() {
        let action = Action::parse(&buffer[offset..])?;
        offset += action.buffer_len();
        actions.push(action);
    }
    Ok(actions)
}

/// The total packed length of an action list, including per-element padding.
pub fn action_list_len<E: Repr>(actions: &[Action<E>]) -> usize {
    actions.iter().fold(0, |acc, a| acc + a.buffer_len())
}

/// Emit a contiguous run of actions into `buffer`, which must be exactly
/// [`action_list_len`] bytes.
pub fn emit_action_list<E: Repr>(actions: &[Action<E>], buffer: &mut [u8]) -> Result<()> {
    let mut offset = 0;
    for action in actions {
        let length = action.buffer_len();
        action.emit(&mut buffer[offset..offset + length])?;
        offset += length;
    }
    Ok(())
}

enum_with_unknown! {
    /// Instruction type, carried in an instruction element's `type` field.
    pub doc enum InstructionKind(u16) {
        /// Setup the next table in the pipeline.
        GotoTable      = 1,
        /// Set metadata fields, with a mask.
        WriteMetadata  = 2,
        /// Write the action(s) onto the datapath action set.
        WriteActions   = 3,
        /// Apply the action(s) immediately.
        ApplyActions   = 4,
        /// Clear all actions from the datapath action set.
        ClearActions   = 5,
        /// Apply a meter.
        Meter          = 6,
        /// Vendor extension.
        Experimenter   = 0xffff
    }
}

mod instruction_field {
    #![allow(non_snake_case)]
    use crate::field::*;
    pub const KIND: Field = 0..2;
    pub const LENGTH: Field = 2..4;
    pub const HEADER_LEN: usize = 8;
    pub fn BODY(length: usize) -> Rest {
        HEADER_LEN..length
    }
}

/// A single flow table instruction.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Instruction<E> {
    GotoTable(u8),
    WriteMetadata { metadata: u64, mask: u64 },
    WriteActions(Vec<Action<E>>),
    ApplyActions(Vec<Action<E>>),
    ClearActions,
    Meter(u32),
    Experimenter(u32, E),
}

impl<E: Repr> Instruction<E> {
    fn kind(&self) -> InstructionKind {
        match *self {
            Instruction::GotoTable(_) => InstructionKind::GotoTable,
            Instruction::WriteMetadata { .. } => InstructionKind::WriteMetadata,
            Instruction::WriteActions(_) => InstructionKind::WriteActions,
            Instruction::ApplyActions(_) => InstructionKind::ApplyActions,
            Instruction::ClearActions => InstructionKind::ClearActions,
            Instruction::Meter(_) => InstructionKind::Meter,
            Instruction::Experimenter(..) => InstructionKind::Experimenter,
        }
    }
}

impl<E: Repr> Repr for Instruction<E> {
    fn parse(buffer: &[u8]) -> Result<Self> {
        use self::instruction_field as field;
        let len = buffer.len();
        if len < field::HEADER_LEN {
            return Err(Error::TooShort {
                needed: field::HEADER_LEN,
                available: len,
            });
        }
        let kind = InstructionKind::from(NetworkEndian::read_u16(&buffer[field::KIND]));
        let length = NetworkEndian::read_u16(&buffer[field::LENGTH]) as usize;
        if length < field::HEADER_LEN {
            return Err(Error::InvalList);
        }
        if len < length {
            return Err(Error::TooShort {
                needed: length,
                available: len,
            });
        }
        let body = &buffer[field::BODY(length)];
        Ok(match kind {
            InstructionKind::GotoTable => Instruction::GotoTable(body[0]),
            InstructionKind::WriteMetadata => Instruction::WriteMetadata {
                metadata: NetworkEndian::read_u64(&body[0..8]),
                mask: NetworkEndian::read_u64(&body[8..16]),
            },
            InstructionKind::WriteActions => Instruction::WriteActions(parse_action_list(body)?),
            InstructionKind::ApplyActions => Instruction::ApplyActions(parse_action_list(body)?),
            InstructionKind::ClearActions => Instruction::ClearActions,
            InstructionKind::Meter => Instruction::Meter(NetworkEndian::read_u32(&body[0..4])),
            InstructionKind::Experimenter => {
                let experimenter = NetworkEndian::read_u32(&body[0..4]);
                Instruction::Experimenter(experimenter, E::parse(&body[4..])?)
            }
            InstructionKind::Unknown(raw) => return Err(Error::BadKind(raw as u8)),
        })
    }

    fn buffer_len(&self) -> usize {
        use self::instruction_field as field;
        let body_len = match *self {
            Instruction::GotoTable(_) => 4,
            Instruction::WriteMetadata { .. } => 20,
            Instruction::WriteActions(ref actions) | Instruction::ApplyActions(ref actions) => {
                4 + action_list_len(actions)
            }
            Instruction::ClearActions => 4,
            Instruction::Meter(_) => 4,
            Instruction::Experimenter(_, ref repr) => 4 + repr.buffer_len(),
        };
        field::HEADER_LEN + body_len
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        use self::instruction_field as field;
        let needed = self.buffer_len();
        if buffer.len() < needed {
            return Err(Error::BufferFull {
                needed,
                available: buffer.len(),
            });
        }
        NetworkEndian::write_u16(&mut buffer[field::KIND], self.kind().into());
        NetworkEndian::write_u16(&mut buffer[field::LENGTH], needed as u16);
        for byte in &mut buffer[field::HEADER_LEN..needed] {
            *byte = 0;
        }
        let body = &mut buffer[field::BODY(needed)];
        match *self {
            Instruction::GotoTable(table_id) => body[0] = table_id,
            Instruction::WriteMetadata { metadata, mask } => {
                NetworkEndian::write_u64(&mut body[0..8], metadata);
                NetworkEndian::write_u64(&mut body[8..16], mask);
            }
            Instruction::WriteActions(ref actions) | Instruction::ApplyActions(ref actions) => {
                emit_action_list(actions, &mut body[4..])?;
            }
            Instruction::ClearActions => {}
            Instruction::Meter(id) => NetworkEndian::write_u32(&mut body[0..4], id),
            Instruction::Experimenter(experimenter, ref repr) => {
                NetworkEndian::write_u32(&mut body[0..4], experimenter);
                repr.emit(&mut body[4..])?;
            }
        }
        Ok(())
    }
}

/// A group bucket: a weighted list of actions executed together, as used by
/// `GroupMod` and reported by group statistics.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Bucket<E> {
    pub weight: u16,
    pub watch_port: u32,
    pub watch_group: u32,
    pub actions: Vec<Action<E>>,
}

mod bucket_field {
    #![allow(non_snake_case)]
    use crate::field::*;
    pub const LENGTH: Field = 0..2;
    pub const WEIGHT: Field = 2..4;
    pub const WATCH_PORT: Field = 4..8;
    pub const WATCH_GROUP: Field = 8..12;
    pub const HEADER_LEN: usize = 16;
    pub fn ACTIONS(length: usize) -> Rest {
        HEADER_LEN..length
    }
}

impl<E: Repr> Repr for Bucket<E> {
    fn parse(buffer: &[u8]) -> Result<Self> {
        use self::bucket_field as field;
        let len = buffer.len();
        if len < field::HEADER_LEN {
            return Err(Error::TooShort {
                needed: field::HEADER_LEN,
                available: len,
            });
        }
        let length = NetworkEndian::read_u16(&buffer[field::LENGTH]) as usize;
        if length < field::HEADER_LEN {
            return Err(Error::InvalList);
        }
        if len < length {
            return Err(Error::TooShort {
                needed: length,
                available: len,
            });
        }
        Ok(Bucket {
            weight: NetworkEndian::read_u16(&buffer[field::WEIGHT]),
            watch_port: NetworkEndian::read_u32(&buffer[field::WATCH_PORT]),
            watch_group: NetworkEndian::read_u32(&buffer[field::WATCH_GROUP]),
            actions: parse_action_list(&buffer[field::ACTIONS(length)])?,
        })
    }

    fn buffer_len(&self) -> usize {
        bucket_field::HEADER_LEN + action_list_len(&self.actions)
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        use self::bucket_field as field;
        let needed = self.buffer_len();
        if buffer.len() < needed {
            return Err(Error::BufferFull {
                needed,
                available: buffer.len(),
            });
        }
        NetworkEndian::write_u16(&mut buffer[field::LENGTH], needed as u16);
        NetworkEndian::write_u16(&mut buffer[field::WEIGHT], self.weight);
        NetworkEndian::write_u32(&mut buffer[field::WATCH_PORT], self.watch_port);
        NetworkEndian::write_u32(&mut buffer[field::WATCH_GROUP], self.watch_group);
        for byte in &mut buffer[12..field::HEADER_LEN] {
            *byte = 0;
        }
        emit_action_list(&self.actions, &mut buffer[field::ACTIONS(needed)])
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::oxm::{InPort, Oxm};

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
    fn test_output_round_trip() {
        let action = Action::<NoExperimenter>::Output {
            port: 3,
            max_len: 0xffff,
        };
        let mut bytes = vec![0; action.buffer_len()];
        action.emit(&mut bytes).unwrap();
        assert_eq!(Action::parse(&bytes).unwrap(), action);
    }

    #[test]
    fn test_set_field_round_trip() {
        let action = Action::<NoExperimenter>::SetField(FlowMatchField::InPort(InPort::new(7)));
        let mut bytes = vec![0; action.buffer_len()];
        action.emit(&mut bytes).unwrap();
        assert_eq!(Action::parse(&bytes).unwrap(), action);
    }

    #[test]
    fn test_apply_actions_round_trip() {
        let instruction = Instruction::<NoExperimenter>::ApplyActions(vec![
            Action::Output {
                port: 3,
                max_len: 0,
            },
            Action::DecNwTtl,
        ]);
        let mut bytes = vec![0; instruction.buffer_len()];
        instruction.emit(&mut bytes).unwrap();
        assert_eq!(Instruction::parse(&bytes).unwrap(), instruction);
    }

    #[test]
    fn test_bucket_round_trip() {
        let bucket = Bucket::<NoExperimenter> {
            weight: 1,
            watch_port: 0xffff_ffff,
            watch_group: 0xffff_ffff,
            actions: vec![Action::Output {
                port: 4,
                max_len: 0,
            }],
        };
        let mut bytes = vec![0; bucket.buffer_len()];
        bucket.emit(&mut bytes).unwrap();
        assert_eq!(Bucket::parse(&bytes).unwrap(), bucket);
    }

    #[test]
    fn test_unsupported_action_kind() {
        let mut bytes = vec![0u8; 8];
        NetworkEndian::write_u16(&mut bytes[0..2], 200);
        NetworkEndian::write_u16(&mut bytes[2..4], 8);
        assert!(Action::<NoExperimenter>::parse(&bytes).is_err());
    }
}
