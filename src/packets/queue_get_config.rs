//! # Queue get-config request/reply
//!
//! Lets a controller discover the queues configured on a port and their
//! rate-limiting properties.
use crate::error::{Error, Result};
use crate::port::PortNumber;
use crate::Repr;
use byteorder::{ByteOrder, NetworkEndian};

enum_with_unknown! {
    pub doc enum PropertyKind(u16) {
        MinRate      = 1,
        MaxRate      = 2,
        Experimenter = 0xffff
    }
}

mod request_field {
    #![allow(non_snake_case)]
    use crate::field::*;
    pub const PORT: Field = 0..4;
    pub const LEN: usize = 8;
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct RequestRepr {
    pub port: PortNumber,
}

impl Repr for RequestRepr {
    fn parse(buffer: &[u8]) -> Result<Self> {
        use self::request_field as field;
        let len = buffer.len();
        if len < field::LEN {
            return Err(Error::TooShort {
                needed: field::LEN,
                available: len,
            });
        }
        Ok(RequestRepr {
            port: PortNumber::from(NetworkEndian::read_u32(&buffer[field::PORT])),
        })
    }

    fn buffer_len(&self) -> usize {
        request_field::LEN
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        use self::request_field as field;
        let needed = self.buffer_len();
        if buffer.len() < needed {
            return Err(Error::BufferFull {
                needed,
                available: buffer.len(),
            });
        }
        NetworkEndian::write_u32(&mut buffer[field::PORT], self.port.into());
        for byte in &mut buffer[4..8] {
            *byte = 0;
        }
        Ok(())
    }
}

mod property_field {
    #![allow(non_snake_case)]
    use crate::field::*;
    pub const KIND: Field = 0..2;
    pub const LENGTH: Field = 2..4;
    pub const HEADER_LEN: usize = 8;
}

/// One `ofp_queue_prop_header` and its type-specific tail. Rates are in
/// tenths of a percent (`0..1000`); `0xffff` means unconfigured.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Property {
    MinRate(u16),
    MaxRate(u16),
    Experimenter { experimenter: u32, data: Vec<u8> },
}

impl Property {
    fn kind(&self) -> PropertyKind {
        match *self {
            Property::MinRate(_) => PropertyKind::MinRate,
            Property::MaxRate(_) => PropertyKind::MaxRate,
            Property::Experimenter { .. } => PropertyKind::Experimenter,
        }
    }
}

impl Repr for Property {
    fn parse(buffer: &[u8]) -> Result<Self> {
        use self::property_field as field;
        let len = buffer.len();
        if len < field::HEADER_LEN {
            return Err(Error::TooShort {
                needed: field::HEADER_LEN,
                available: len,
            });
        }
        let kind = PropertyKind::from(NetworkEndian::read_u16(&buffer[field::KIND]));
        let length = NetworkEndian::read_u16(&buffer[field::LENGTH]) as usize;
        if length < field::HEADER_LEN || len < length {
            return Err(Error::TooShort {
                needed: length.max(field::HEADER_LEN),
                available: len,
            });
        }
        let body = &buffer[field::HEADER_LEN..length];
        Ok(match kind {
            PropertyKind::MinRate => Property::MinRate(NetworkEndian::read_u16(&body[0..2])),
            PropertyKind::MaxRate => Property::MaxRate(NetworkEndian::read_u16(&body[0..2])),
            PropertyKind::Experimenter => Property::Experimenter {
                experimenter: NetworkEndian::read_u32(&body[0..4]),
                data: body[4..].to_vec(),
            },
            PropertyKind::Unknown(raw) => return Err(Error::BadKind(raw as u8)),
        })
    }

    fn buffer_len(&self) -> usize {
        property_field::HEADER_LEN
            + match *self {
                Property::MinRate(_) | Property::MaxRate(_) => 6,
                Property::Experimenter { ref data, .. } => 4 + data.len(),
            }
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        use self::property_field as field;
        let needed = self.buffer_len();
        if buffer.len() < needed {
            return Err(Error::BufferFull {
                needed,
                available: buffer.len(),
            });
        }
        for byte in buffer.iter_mut() {
            *byte = 0;
        }
        NetworkEndian::write_u16(&mut buffer[field::KIND], self.kind().into());
        NetworkEndian::write_u16(&mut buffer[field::LENGTH], needed as u16);
        let body = &mut buffer[field::HEADER_LEN..needed];
        match *self {
            Property::MinRate(rate) | Property::MaxRate(rate) => {
                NetworkEndian::write_u16(&mut body[0..2], rate);
            }
            Property::Experimenter {
                experimenter,
                ref data,
            } => {
                NetworkEndian::write_u32(&mut body[0..4], experimenter);
                body[4..].copy_from_slice(data);
            }
        }
        Ok(())
    }
}

mod queue_field {
    #![allow(non_snake_case)]
    use crate::field::*;
    pub const QUEUE_ID: Field = 0..4;
    pub const PORT: Field = 4..8;
    pub const LENGTH: Field = 8..10;
    pub const HEADER_LEN: usize = 16;
}

/// One `ofp_packet_queue`.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Queue {
    pub queue_id: u32,
    pub port: PortNumber,
    pub properties: Vec<Property>,
}

impl Repr for Queue {
    fn parse(buffer: &[u8]) -> Result<Self> {
        use self::queue_field as field;
        let len = buffer.len();
        if len < field::HEADER_LEN {
            return Err(Error::TooShort {
                needed: field::HEADER_LEN,
                available: len,
            });
        }
        let length = NetworkEndian::read_u16(&buffer[field::LENGTH]) as usize;
        if length < field::HEADER_LEN || len < length {
            return Err(Error::TooShort {
                needed: length.max(field::HEADER_LEN),
                available: len,
            });
        }
        let mut properties = Vec::new();
        let mut offset = field::HEADER_LEN;
        while offset < length {
            let property = Property::parse(&buffer[offset..length])?;
            offset += property.buffer_len();
            properties.push(property);
        }
        Ok(Queue {
            queue_id: NetworkEndian::read_u32(&buffer[field::QUEUE_ID]),
            port: PortNumber::from(NetworkEndian::read_u32(&buffer[field::PORT])),
            properties,
        })
    }

    fn buffer_len(&self) -> usize {
        queue_field::HEADER_LEN
            + self
                .properties
                .iter()
                .fold(0, |acc, p| acc + p.buffer_len())
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        use self::queue_field as field;
        let needed = self.buffer_len();
        if buffer.len() < needed {
            return Err(Error::BufferFull {
                needed,
                available: buffer.len(),
            });
        }
        NetworkEndian::write_u32(&mut buffer[field::QUEUE_ID], self.queue_id);
        NetworkEndian::write_u32(&mut buffer[field::PORT], self.port.into());
        NetworkEndian::write_u16(&mut buffer[field::LENGTH], needed as u16);
        for byte in &mut buffer[10..field::HEADER_LEN] {
            *byte = 0;
        }
        let mut offset = field::HEADER_LEN;
        for property in &self.properties {
            let length = property.buffer_len();
            property.emit(&mut buffer[offset..offset + length])?;
            offset += length;
        }
        Ok(())
    }
}

mod reply_field {
    #![allow(non_snake_case)]
    use crate::field::*;
    pub const PORT: Field = 0..4;
    pub const QUEUES_AND_AFTER: Rest = 8..;
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ReplyRepr {
    pub port: PortNumber,
    pub queues: Vec<Queue>,
}

impl Repr for ReplyRepr {
    fn parse(buffer: &[u8]) -> Result<Self> {
        use self::reply_field as field;
        let len = buffer.len();
        if len < field::QUEUES_AND_AFTER.start {
            return Err(Error::TooShort {
                needed: field::QUEUES_AND_AFTER.start,
                available: len,
            });
        }
        let mut queues = Vec::new();
        let mut offset = field::QUEUES_AND_AFTER.start;
        while offset < len {
            let queue = Queue::parse(&buffer[offset..])?;
            offset += queue.buffer_len();
            queues.push(queue);
        }
        Ok(ReplyRepr {
            port: PortNumber::from(NetworkEndian::read_u32(&buffer[field::PORT])),
            queues,
        })
    }

    fn buffer_len(&self) -> usize {
        reply_field::QUEUES_AND_AFTER.start
            + self.queues.iter().fold(0, |acc, q| acc + q.buffer_len())
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        use self::reply_field as field;
        let needed = self.buffer_len();
        if buffer.len() < needed {
            return Err(Error::BufferFull {
                needed,
                available: buffer.len(),
            });
        }
        NetworkEndian::write_u32(&mut buffer[field::PORT], self.port.into());
        for byte in &mut buffer[4..8] {
            *byte = 0;
        }
        let mut offset = field::QUEUES_AND_AFTER.start;
        for queue in &self.queues {
            let length = queue.buffer_len();
            queue.emit(&mut buffer[offset..offset + length])?;
            offset += length;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_request_round_trip() {
        let repr = RequestRepr {
            port: PortNumber::Regular(1),
        };
        let mut bytes = vec![0; repr.buffer_len()];
        repr.emit(&mut bytes).unwrap();
        assert_eq!(RequestRepr::parse(&bytes).unwrap(), repr);
    }

    #[test]
    fn test_reply_round_trip() {
        let repr = ReplyRepr {
            port: PortNumber::Regular(1),
            queues: vec![Queue {
                queue_id: 0,
                port: PortNumber::Regular(1),
                properties: vec![Property::MinRate(100), Property::MaxRate(1000)],
            }],
        };
        let mut bytes = vec![0; repr.buffer_len()];
        repr.emit(&mut bytes).unwrap();
        assert_eq!(ReplyRepr::parse(&bytes).unwrap(), repr);
    }
}
