//! # Packet out
//!
//! A controller-injected packet, either carrying its own data or referring
//! to one buffered on the datapath.
//!
//! ```no_rust
//! +--------+--------+--------+--------+
//! |            buffer_id              |
//! +--------+--------+--------+--------+
//! |              in_port              |
//! +--------+--------+--------+--------+
//! |   actions_len   |      pad        |
//! +--------+--------+--------+--------+
//! |               pad                 |
//! +--------+--------+--------+--------+
//! |              actions              |
//! |           (variable length)       |
//! +--------+--------+--------+--------+
//! |               data                |
//! |           (variable length)       |
//! +--------+--------+--------+--------+
//! ```
use crate::actions::{action_list_len, emit_action_list, parse_action_list, Action};
use crate::error::{Error, Result};
use crate::port::PortNumber;
use crate::Repr;
use byteorder::{ByteOrder, NetworkEndian};

mod field {
    #![allow(non_snake_case)]
    use crate::field::*;
    pub const BUFFER_ID: Field = 0..4;
    pub const IN_PORT: Field = 4..8;
    pub const ACTIONS_LEN: Field = 8..10;
    pub const HEADER_LEN: usize = 16;
    pub fn ACTIONS(actions_len: usize) -> Field {
        HEADER_LEN..(HEADER_LEN + actions_len)
    }
    pub fn DATA(actions_len: usize) -> Rest {
        ACTIONS(actions_len).end..
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PacketRepr<E> {
    /// The buffered packet to inject, or `OFP_NO_BUFFER` if `data` carries
    /// the packet itself.
    pub buffer_id: u32,
    /// The port the packet should be considered to have arrived on (used for
    /// e.g. `InPort` actions).
    pub in_port: PortNumber,
    pub actions: Vec<Action<E>>,
    /// The packet to send, empty if `buffer_id` refers to a buffered packet.
    pub data: Vec<u8>,
}

impl<E: Repr> Repr for PacketRepr<E> {
    fn parse(buffer: &[u8]) -> Result<Self> {
        let len = buffer.len();
        if len < field::HEADER_LEN {
            return Err(Error::TooShort {
                needed: field::HEADER_LEN,
                available: len,
            });
        }
        let buffer_id = NetworkEndian::read_u32(&buffer[field::BUFFER_ID]);
        let in_port = PortNumber::from(NetworkEndian::read_u32(&buffer[field::IN_PORT]));
        let actions_len = NetworkEndian::read_u16(&buffer[field::ACTIONS_LEN]) as usize;
        if len < field::DATA(actions_len).start {
            return Err(Error::TooShort {
                needed: field::DATA(actions_len).start,
                available: len,
            });
        }
        let actions = parse_action_list(&buffer[field::ACTIONS(actions_len)])?;
        let data = buffer[field::DATA(actions_len)].to_vec();
        Ok(PacketRepr {
            buffer_id,
            in_port,
            actions,
            data,
        })
    }

    fn buffer_len(&self) -> usize {
        field::HEADER_LEN + action_list_len(&self.actions) + self.data.len()
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        let needed = self.buffer_len();
        if buffer.len() < needed {
            return Err(Error::BufferFull {
                needed,
                available: buffer.len(),
            });
        }
        let actions_len = action_list_len(&self.actions);
        NetworkEndian::write_u32(&mut buffer[field::BUFFER_ID], self.buffer_id);
        NetworkEndian::write_u32(&mut buffer[field::IN_PORT], self.in_port.into());
        NetworkEndian::write_u16(&mut buffer[field::ACTIONS_LEN], actions_len as u16);
        for byte in &mut buffer[10..field::HEADER_LEN] {
            *byte = 0;
        }
        emit_action_list(&self.actions, &mut buffer[field::ACTIONS(actions_len)])?;
        buffer[field::DATA(actions_len)].copy_from_slice(&self.data);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

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
            buffer_id: 0xffff_ffff,
            in_port: PortNumber::Controller,
            actions: vec![Action::Output {
                port: 3,
                max_len: 0,
            }],
            data: vec![0xde, 0xad, 0xbe, 0xef],
        };
        let mut bytes = vec![0; repr.buffer_len()];
        repr.emit(&mut bytes).unwrap();
        assert_eq!(PacketRepr::parse(&bytes).unwrap(), repr);
    }
}
