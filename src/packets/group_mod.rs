//! # Group modification
//!
//! Installs, modifies, or deletes a group table entry: a named set of
//! weighted action buckets used for multicast, fast failover, and
//! load-balancing.
use crate::actions::Bucket;
use crate::error::{Error, Result};
use crate::Repr;
use byteorder::{ByteOrder, NetworkEndian};

enum_with_unknown! {
    pub doc enum Command(u16) {
        Add     = 0,
        Modify  = 1,
        Delete  = 2
    }
}

enum_with_unknown! {
    pub doc enum GroupKind(u8) {
        /// Execute one bucket (the first one that's alive).
        All       = 0,
        /// Execute one bucket, chosen by the switch (e.g. a hash).
        Select    = 1,
        /// Execute one live bucket, in the listed priority order.
        Indirect  = 2,
        /// Execute all buckets.
        FastFailover = 3
    }
}

mod field {
    #![allow(non_snake_case)]
    use crate::field::*;
    pub const COMMAND: Field = 0..2;
    pub const KIND: usize = 2;
    pub const GROUP_ID: Field = 4..8;
    pub const HEADER_LEN: usize = 8;
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PacketRepr<E> {
    pub command: Command,
    pub kind: GroupKind,
    pub group_id: u32,
    pub buckets: Vec<Bucket<E>>,
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
        let mut buckets = Vec::new();
        let mut offset = field::HEADER_LEN;
        while offset < len {
            let bucket = Bucket::parse(&buffer[offset..])?;
            offset += bucket.buffer_len();
            buckets.push(bucket);
        }
        Ok(PacketRepr {
            command: Command::from(NetworkEndian::read_u16(&buffer[field::COMMAND])),
            kind: GroupKind::from(buffer[field::KIND]),
            group_id: NetworkEndian::read_u32(&buffer[field::GROUP_ID]),
            buckets,
        })
    }

    fn buffer_len(&self) -> usize {
        field::HEADER_LEN + self.buckets.iter().fold(0, |acc, b| acc + b.buffer_len())
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        let needed = self.buffer_len();
        if buffer.len() < needed {
            return Err(Error::BufferFull {
                needed,
                available: buffer.len(),
            });
        }
        NetworkEndian::write_u16(&mut buffer[field::COMMAND], self.command.into());
        buffer[field::KIND] = self.kind.into();
        buffer[3] = 0;
        NetworkEndian::write_u32(&mut buffer[field::GROUP_ID], self.group_id);
        let mut offset = field::HEADER_LEN;
        for bucket in &self.buckets {
            let length = bucket.buffer_len();
            bucket.emit(&mut buffer[offset..offset + length])?;
            offset += length;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::actions::Action;

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
            command: Command::Add,
            kind: GroupKind::All,
            group_id: 1,
            buckets: vec![Bucket {
                weight: 0,
                watch_port: 0xffff_ffff,
                watch_group: 0xffff_ffff,
                actions: vec![Action::Output {
                    port: 1,
                    max_len: 0,
                }],
            }],
        };
        let mut bytes = vec![0; repr.buffer_len()];
        repr.emit(&mut bytes).unwrap();
        assert_eq!(PacketRepr::parse(&bytes).unwrap(), repr);
    }
}
