//! # Multipart (statistics) request/reply
//!
//! A single envelope kind, `{stat_type, flags, body}`, whose body shape is
//! dispatched by `stat_type`. List-typed bodies (flow/table/port/queue/group
//! stats) are a contiguous run of elements with no outer length prefix,
//! following the same TLV-list idiom as [`crate::actions`].
use crate::actions::{Bucket, Instruction};
use crate::error::{Error, Result};
use crate::oxm::FlowMatch;
use crate::port::PortNumber;
use crate::Repr;
use byteorder::{ByteOrder, NetworkEndian};

enum_with_unknown! {
    pub doc enum StatKind(u16) {
        Desc           = 0,
        Flow           = 1,
        Aggregate      = 2,
        Table          = 3,
        PortStats      = 4,
        Queue          = 5,
        Group          = 6,
        GroupDesc      = 7,
        GroupFeatures  = 8,
        Experimenter   = 0xffff
    }
}

/// The request is still awaiting a reply with more data (`OFPMPF_REQ_MORE`,
/// reused for replies too, matching the single wire field both directions
/// share).
pub const FLAG_MORE: u16 = 1;

mod field {
    #![allow(non_snake_case)]
    use crate::field::*;
    pub const STAT_KIND: Field = 0..2;
    pub const FLAGS: Field = 2..4;
    pub const BODY_AND_AFTER: Rest = 8..;
}

fn read_nul_padded(buffer: &[u8]) -> String {
    let nul = buffer.iter().position(|&b| b == 0).unwrap_or(buffer.len());
    String::from_utf8_lossy(&buffer[..nul]).into_owned()
}

fn write_nul_padded(buffer: &mut [u8], s: &str) {
    for byte in buffer.iter_mut() {
        *byte = 0;
    }
    let bytes = s.as_bytes();
    let copy_len = bytes.len().min(buffer.len().saturating_sub(1));
    buffer[..copy_len].copy_from_slice(&bytes[..copy_len]);
}

/// `ofp_desc`: free-form strings identifying the datapath implementation.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Desc {
    pub mfr_desc: String,
    pub hw_desc: String,
    pub sw_desc: String,
    pub serial_num: String,
    pub dp_desc: String,
}

mod desc_field {
    #![allow(non_snake_case)]
    use crate::field::*;
    pub const MFR_DESC: Field = 0..256;
    pub const HW_DESC: Field = 256..512;
    pub const SW_DESC: Field = 512..768;
    pub const SERIAL_NUM: Field = 768..800;
    pub const DP_DESC: Field = 800..1056;
    pub const LEN: usize = 1056;
}

impl Repr for Desc {
    fn parse(buffer: &[u8]) -> Result<Self> {
        use self::desc_field as field;
        let len = buffer.len();
        if len < field::LEN {
            return Err(Error::TooShort {
                needed: field::LEN,
                available: len,
            });
        }
        Ok(Desc {
            mfr_desc: read_nul_padded(&buffer[field::MFR_DESC]),
            hw_desc: read_nul_padded(&buffer[field::HW_DESC]),
            sw_desc: read_nul_padded(&buffer[field::SW_DESC]),
            serial_num: read_nul_padded(&buffer[field::SERIAL_NUM]),
            dp_desc: read_nul_padded(&buffer[field::DP_DESC]),
        })
    }

    fn buffer_len(&self) -> usize {
        desc_field::LEN
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        use self::desc_field as field;
        let needed = self.buffer_len();
        if buffer.len() < needed {
            return Err(Error::BufferFull {
                needed,
                available: buffer.len(),
            });
        }
        write_nul_padded(&mut buffer[field::MFR_DESC], &self.mfr_desc);
        write_nul_padded(&mut buffer[field::HW_DESC], &self.hw_desc);
        write_nul_padded(&mut buffer[field::SW_DESC], &self.sw_desc);
        write_nul_padded(&mut buffer[field::SERIAL_NUM], &self.serial_num);
        write_nul_padded(&mut buffer[field::DP_DESC], &self.dp_desc);
        Ok(())
    }
}

/// `ofp_flow_stats_request`.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct FlowStatsRequest<E> {
    pub table_id: u8,
    pub out_port: u32,
    pub out_group: u32,
    pub cookie: u64,
    pub cookie_mask: u64,
    pub flow_match: FlowMatch<E>,
}

mod flow_req_field {
    #![allow(non_snake_case)]
    use crate::field::*;
    pub const TABLE_ID: usize = 0;
    pub const OUT_PORT: Field = 4..8;
    pub const OUT_GROUP: Field = 8..12;
    pub const COOKIE: Field = 16..24;
    pub const COOKIE_MASK: Field = 24..32;
    pub const MATCH_AND_AFTER: Rest = 32..;
}

impl<E: Repr> Repr for FlowStatsRequest<E> {
    fn parse(buffer: &[u8]) -> Result<Self> {
        use self::flow_req_field as field;
        let len = buffer.len();
        if len < field::MATCH_AND_AFTER.start {
            return Err(Error::TooShort {
                needed: field::MATCH_AND_AFTER.start,
                available: len,
            });
        }
        Ok(FlowStatsRequest {
            table_id: buffer[field::TABLE_ID],
            out_port: NetworkEndian::read_u32(&buffer[field::OUT_PORT]),
            out_group: NetworkEndian::read_u32(&buffer[field::OUT_GROUP]),
            cookie: NetworkEndian::read_u64(&buffer[field::COOKIE]),
            cookie_mask: NetworkEndian::read_u64(&buffer[field::COOKIE_MASK]),
            flow_match: FlowMatch::parse(&buffer[field::MATCH_AND_AFTER])?,
        })
    }

    fn buffer_len(&self) -> usize {
        flow_req_field::MATCH_AND_AFTER.start + self.flow_match.buffer_len()
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        use self::flow_req_field as field;
        let needed = self.buffer_len();
        if buffer.len() < needed {
            return Err(Error::BufferFull {
                needed,
                available: buffer.len(),
            });
        }
        for byte in &mut buffer[1..4] {
            *byte = 0;
        }
        buffer[field::TABLE_ID] = self.table_id;
        NetworkEndian::write_u32(&mut buffer[field::OUT_PORT], self.out_port);
        NetworkEndian::write_u32(&mut buffer[field::OUT_GROUP], self.out_group);
        for byte in &mut buffer[12..16] {
            *byte = 0;
        }
        NetworkEndian::write_u64(&mut buffer[field::COOKIE], self.cookie);
        NetworkEndian::write_u64(&mut buffer[field::COOKIE_MASK], self.cookie_mask);
        self.flow_match.emit(&mut buffer[field::MATCH_AND_AFTER])
    }
}

/// One `ofp_flow_stats` entry.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct FlowStats<E> {
    pub table_id: u8,
    pub duration_sec: u32,
    pub duration_nsec: u32,
    pub priority: u16,
    pub idle_timeout: u16,
    pub hard_timeout: u16,
    pub flags: u16,
    pub cookie: u64,
    pub packet_count: u64,
    pub byte_count: u64,
    pub flow_match: FlowMatch<E>,
    pub instructions: Vec<Instruction<E>>,
}

mod flow_stats_field {
    #![allow(non_snake_case)]
    use crate::field::*;
    pub const LENGTH: Field = 0..2;
    pub const TABLE_ID: usize = 2;
    pub const DURATION_SEC: Field = 4..8;
    pub const DURATION_NSEC: Field = 8..12;
    pub const PRIORITY: Field = 12..14;
    pub const IDLE_TIMEOUT: Field = 14..16;
    pub const HARD_TIMEOUT: Field = 16..18;
    pub const FLAGS: Field = 18..20;
    pub const COOKIE: Field = 24..32;
    pub const PACKET_COUNT: Field = 32..40;
    pub const BYTE_COUNT: Field = 40..48;
    pub const MATCH_AND_AFTER: Rest = 48..;
}

impl<E: Repr> Repr for FlowStats<E> {
    fn parse(buffer: &[u8]) -> Result<Self> {
        use self::flow_stats_field as field;
        let len = buffer.len();
        if len < field::MATCH_AND_AFTER.start {
            return Err(Error::TooShort {
                needed: field::MATCH_AND_AFTER.start,
                available: len,
            });
        }
        let length = NetworkEndian::read_u16(&buffer[field::LENGTH]) as usize;
        if length < field::MATCH_AND_AFTER.start || len < length {
            return Err(Error::LengthMismatch {
                declared: length,
                actual: len,
            });
        }
        let flow_match = FlowMatch::parse(&buffer[field::MATCH_AND_AFTER.start..length])?;
        let flow_match_len = flow_match.buffer_len();
        let mut instructions = Vec::new();
        let mut offset = field::MATCH_AND_AFTER.start + flow_match_len;
        while offset < length {
            let instruction = Instruction::parse(&buffer[offset..length])?;
            offset += instruction.buffer_len();
            instructions.push(instruction);
        }
        Ok(FlowStats {
            table_id: buffer[field::TABLE_ID],
            duration_sec: NetworkEndian::read_u32(&buffer[field::DURATION_SEC]),
            duration_nsec: NetworkEndian::read_u32(&buffer[field::DURATION_NSEC]),
            priority: NetworkEndian::read_u16(&buffer[field::PRIORITY]),
            idle_timeout: NetworkEndian::read_u16(&buffer[field::IDLE_TIMEOUT]),
            hard_timeout: NetworkEndian::read_u16(&buffer[field::HARD_TIMEOUT]),
            flags: NetworkEndian::read_u16(&buffer[field::FLAGS]),
            cookie: NetworkEndian::read_u64(&buffer[field::COOKIE]),
            packet_count: NetworkEndian::read_u64(&buffer[field::PACKET_COUNT]),
            byte_count: NetworkEndian::read_u64(&buffer[field::BYTE_COUNT]),
            flow_match,
            instructions,
        })
    }

    fn buffer_len(&self) -> usize {
        flow_stats_field::MATCH_AND_AFTER.start
            + self.flow_match.buffer_len()
            + self
                .instructions
                .iter()
                .fold(0, |acc, i| acc + i.buffer_len())
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        use self::flow_stats_field as field;
        let needed = self.buffer_len();
        if buffer.len() < needed {
            return Err(Error::BufferFull {
                needed,
                available: buffer.len(),
            });
        }
        NetworkEndian::write_u16(&mut buffer[field::LENGTH], needed as u16);
        buffer[field::TABLE_ID] = self.table_id;
        buffer[3] = 0;
        NetworkEndian::write_u32(&mut buffer[field::DURATION_SEC], self.duration_sec);
        NetworkEndian::write_u32(&mut buffer[field::DURATION_NSEC], self.duration_nsec);
        NetworkEndian::write_u16(&mut buffer[field::PRIORITY], self.priority);
        NetworkEndian::write_u16(&mut buffer[field::IDLE_TIMEOUT], self.idle_timeout);
        NetworkEndian::write_u16(&mut buffer[field::HARD_TIMEOUT], self.hard_timeout);
        NetworkEndian::write_u16(&mut buffer[field::FLAGS], self.flags);
        for byte in &mut buffer[20..24] {
            *byte = 0;
        }
        NetworkEndian::write_u64(&mut buffer[field::COOKIE], self.cookie);
        NetworkEndian::write_u64(&mut buffer[field::PACKET_COUNT], self.packet_count);
        NetworkEndian::write_u64(&mut buffer[field::BYTE_COUNT], self.byte_count);
        let flow_match_len = self.flow_match.buffer_len();
        self.flow_match.emit(
            &mut buffer[field::MATCH_AND_AFTER.start..field::MATCH_AND_AFTER.start + flow_match_len],
        )?;
        let mut offset = field::MATCH_AND_AFTER.start + flow_match_len;
        for instruction in &self.instructions {
            let length = instruction.buffer_len();
            instruction.emit(&mut buffer[offset..offset + length])?;
            offset += length;
        }
        Ok(())
    }
}

/// `ofp_aggregate_stats_reply`.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct AggregateStats {
    pub packet_count: u64,
    pub byte_count: u64,
    pub flow_count: u32,
}

impl Repr for AggregateStats {
    fn parse(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < 24 {
            return Err(Error::TooShort {
                needed: 24,
                available: buffer.len(),
            });
        }
        Ok(AggregateStats {
            packet_count: NetworkEndian::read_u64(&buffer[0..8]),
            byte_count: NetworkEndian::read_u64(&buffer[8..16]),
            flow_count: NetworkEndian::read_u32(&buffer[16..20]),
        })
    }

    fn buffer_len(&self) -> usize {
        24
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        if buffer.len() < 24 {
            return Err(Error::BufferFull {
                needed: 24,
                available: buffer.len(),
            });
        }
        NetworkEndian::write_u64(&mut buffer[0..8], self.packet_count);
        NetworkEndian::write_u64(&mut buffer[8..16], self.byte_count);
        NetworkEndian::write_u32(&mut buffer[16..20], self.flow_count);
        for byte in &mut buffer[20..24] {
            *byte = 0;
        }
        Ok(())
    }
}

/// One `ofp_table_stats` entry.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct TableStats {
    pub table_id: u8,
    pub active_count: u32,
    pub lookup_count: u64,
    pub matched_count: u64,
}

impl Repr for TableStats {
    fn parse(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < 24 {
            return Err(Error::TooShort {
                needed: 24,
                available: buffer.len(),
            });
        }
        Ok(TableStats {
            table_id: buffer[0],
            active_count: NetworkEndian::read_u32(&buffer[4..8]),
            lookup_count: NetworkEndian::read_u64(&buffer[8..16]),
            matched_count: NetworkEndian::read_u64(&buffer[16..24]),
        })
    }

    fn buffer_len(&self) -> usize {
        24
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        if buffer.len() < 24 {
            return Err(Error::BufferFull {
                needed: 24,
                available: buffer.len(),
            });
        }
        buffer[0] = self.table_id;
        for byte in &mut buffer[1..4] {
            *byte = 0;
        }
        NetworkEndian::write_u32(&mut buffer[4..8], self.active_count);
        NetworkEndian::write_u64(&mut buffer[8..16], self.lookup_count);
        NetworkEndian::write_u64(&mut buffer[16..24], self.matched_count);
        Ok(())
    }
}

/// One `ofp_port_stats` entry.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct PortStats {
    pub port_no: PortNumber,
    pub rx_packets: u64,
    pub tx_packets: u64,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub rx_dropped: u64,
    pub tx_dropped: u64,
    pub rx_errors: u64,
    pub tx_errors: u64,
    pub rx_frame_err: u64,
    pub rx_over_err: u64,
    pub rx_crc_err: u64,
    pub collisions: u64,
    pub duration_sec: u32,
    pub duration_nsec: u32,
}

impl Repr for PortStats {
    fn parse(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < 112 {
            return Err(Error::TooShort {
                needed: 112,
                available: buffer.len(),
            });
        }
        let u64_at = |off: usize| NetworkEndian::read_u64(&buffer[off..off + 8]);
        Ok(PortStats {
            port_no: PortNumber::from(NetworkEndian::read_u32(&buffer[0..4])),
            rx_packets: u64_at(8),
            tx_packets: u64_at(16),
            rx_bytes: u64_at(24),
            tx_bytes: u64_at(32),
            rx_dropped: u64_at(40),
            tx_dropped: u64_at(48),
            rx_errors: u64_at(56),
            tx_errors: u64_at(64),
            rx_frame_err: u64_at(72),
            rx_over_err: u64_at(80),
            rx_crc_err: u64_at(88),
            collisions: u64_at(96),
            duration_sec: NetworkEndian::read_u32(&buffer[104..108]),
            duration_nsec: NetworkEndian::read_u32(&buffer[108..112]),
        })
    }

    fn buffer_len(&self) -> usize {
        112
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        if buffer.len() < 112 {
            return Err(Error::BufferFull {
                needed: 112,
                available: buffer.len(),
            });
        }
        NetworkEndian::write_u32(&mut buffer[0..4], self.port_no.into());
        for byte in &mut buffer[4..8] {
            *byte = 0;
        }
        let mut write_u64_at = |off: usize, value: u64| {
            NetworkEndian::write_u64(&mut buffer[off..off + 8], value);
        };
        write_u64_at(8, self.rx_packets);
        write_u64_at(16, self.tx_packets);
        write_u64_at(24, self.rx_bytes);
        write_u64_at(32, self.tx_bytes);
        write_u64_at(40, self.rx_dropped);
        write_u64_at(48, self.tx_dropped);
        write_u64_at(56, self.rx_errors);
        write_u64_at(64, self.tx_errors);
        write_u64_at(72, self.rx_frame_err);
        write_u64_at(80, self.rx_over_err);
        write_u64_at(88, self.rx_crc_err);
        write_u64_at(96, self.collisions);
        NetworkEndian::write_u32(&mut buffer[104..108], self.duration_sec);
        NetworkEndian::write_u32(&mut buffer[108..112], self.duration_nsec);
        Ok(())
    }
}

/// One `ofp_queue_stats` entry.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct QueueStats {
    pub port_no: PortNumber,
    pub queue_id: u32,
    pub tx_bytes: u64,
    pub tx_packets: u64,
    pub tx_errors: u64,
    pub duration_sec: u32,
    pub duration_nsec: u32,
}

impl Repr for QueueStats {
    fn parse(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < 32 {
            return Err(Error::TooShort {
                needed: 32,
                available: buffer.len(),
            });
        }
        Ok(QueueStats {
            port_no: PortNumber::from(NetworkEndian::read_u32(&buffer[0..4])),
            queue_id: NetworkEndian::read_u32(&buffer[4..8]),
            tx_bytes: NetworkEndian::read_u64(&buffer[8..16]),
            tx_packets: NetworkEndian::read_u64(&buffer[16..24]),
            tx_errors: NetworkEndian::read_u64(&buffer[24..32]),
            duration_sec: 0,
            duration_nsec: 0,
        })
    }

    fn buffer_len(&self) -> usize {
        32
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        if buffer.len() < 32 {
            return Err(Error::BufferFull {
                needed: 32,
                available: buffer.len(),
            });
        }
        NetworkEndian::write_u32(&mut buffer[0..4], self.port_no.into());
        NetworkEndian::write_u32(&mut buffer[4..8], self.queue_id);
        NetworkEndian::write_u64(&mut buffer[8..16], self.tx_bytes);
        NetworkEndian::write_u64(&mut buffer[16..24], self.tx_packets);
        NetworkEndian::write_u64(&mut buffer[24..32], self.tx_errors);
        Ok(())
    }
}

/// One `ofp_group_stats` entry, with its per-bucket counters.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct GroupStats {
    pub group_id: u32,
    pub ref_count: u32,
    pub packet_count: u64,
    pub byte_count: u64,
    pub duration_sec: u32,
    pub duration_nsec: u32,
    pub bucket_stats: Vec<(u64, u64)>,
}

mod group_stats_field {
    #![allow(non_snake_case)]
    use crate::field::*;
    pub const LENGTH: Field = 0..2;
    pub const GROUP_ID: Field = 4..8;
    pub const REF_COUNT: Field = 8..12;
    pub const PACKET_COUNT: Field = 16..24;
    pub const BYTE_COUNT: Field = 24..32;
    pub const DURATION_SEC: Field = 32..36;
    pub const DURATION_NSEC: Field = 36..40;
    pub const HEADER_LEN: usize = 40;
}

impl Repr for GroupStats {
    fn parse(buffer: &[u8]) -> Result<Self> {
        use self::group_stats_field as field;
        let len = buffer.len();
        if len < field::HEADER_LEN {
            return Err(Error::TooShort {
                needed: field::HEADER_LEN,
                available: len,
            });
        }
        let length = NetworkEndian::read_u16(&buffer[field::LENGTH]) as usize;
        if length < field::HEADER_LEN || len < length {
            return Err(Error::LengthMismatch {
                declared: length,
                actual: len,
            });
        }
        let mut bucket_stats = Vec::new();
        let mut offset = field::HEADER_LEN;
        while offset + 16 <= length {
            bucket_stats.push((
                NetworkEndian::read_u64(&buffer[offset..offset + 8]),
                NetworkEndian::read_u64(&buffer[offset + 8..offset + 16]),
            ));
            offset += 16;
        }
        Ok(GroupStats {
            group_id: NetworkEndian::read_u32(&buffer[field::GROUP_ID]),
            ref_count: NetworkEndian::read_u32(&buffer[field::REF_COUNT]),
            packet_count: NetworkEndian::read_u64(&buffer[field::PACKET_COUNT]),
            byte_count: NetworkEndian::read_u64(&buffer[field::BYTE_COUNT]),
            duration_sec: NetworkEndian::read_u32(&buffer[field::DURATION_SEC]),
            duration_nsec: NetworkEndian::read_u32(&buffer[field::DURATION_NSEC]),
            bucket_stats,
        })
    }

    fn buffer_len(&self) -> usize {
        group_stats_field::HEADER_LEN + self.bucket_stats.len() * 16
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        use self::group_stats_field as field;
        let needed = self.buffer_len();
        if buffer.len() < needed {
            return Err(Error::BufferFull {
                needed,
                available: buffer.len(),
            });
        }
        NetworkEndian::write_u16(&mut buffer[field::LENGTH], needed as u16);
        for byte in &mut buffer[2..4] {
            *byte = 0;
        }
        NetworkEndian::write_u32(&mut buffer[field::GROUP_ID], self.group_id);
        NetworkEndian::write_u32(&mut buffer[field::REF_COUNT], self.ref_count);
        for byte in &mut buffer[12..16] {
            *byte = 0;
        }
        NetworkEndian::write_u64(&mut buffer[field::PACKET_COUNT], self.packet_count);
        NetworkEndian::write_u64(&mut buffer[field::BYTE_COUNT], self.byte_count);
        NetworkEndian::write_u32(&mut buffer[field::DURATION_SEC], self.duration_sec);
        NetworkEndian::write_u32(&mut buffer[field::DURATION_NSEC], self.duration_nsec);
        let mut offset = field::HEADER_LEN;
        for (packets, bytes) in &self.bucket_stats {
            NetworkEndian::write_u64(&mut buffer[offset..offset + 8], *packets);
            NetworkEndian::write_u64(&mut buffer[offset + 8..offset + 16], *bytes);
            offset += 16;
        }
        Ok(())
    }
}

/// One `ofp_group_desc` entry.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct GroupDesc<E> {
    pub kind: crate::packets::group_mod::GroupKind,
    pub group_id: u32,
    pub buckets: Vec<Bucket<E>>,
}

mod group_desc_field {
    #![allow(non_snake_case)]
    use crate::field::*;
    pub const LENGTH: Field = 0..2;
    pub const KIND: usize = 2;
    pub const GROUP_ID: Field = 4..8;
    pub const HEADER_LEN: usize = 8;
}

impl<E: Repr> Repr for GroupDesc<E> {
    fn parse(buffer: &[u8]) -> Result<Self> {
        use self::group_desc_field as field;
        let len = buffer.len();
        if len < field::HEADER_LEN {
            return Err(Error::TooShort {
                needed: field::HEADER_LEN,
                available: len,
            });
        }
        let length = NetworkEndian::read_u16(&buffer[field::LENGTH]) as usize;
        if length < field::HEADER_LEN || len < length {
            return Err(Error::LengthMismatch {
                declared: length,
                actual: len,
            });
        }
        let mut buckets = Vec::new();
        let mut offset = field::HEADER_LEN;
        while offset < length {
            let bucket = Bucket::parse(&buffer[offset..length])?;
            offset += bucket.buffer_len();
            buckets.push(bucket);
        }
        Ok(GroupDesc {
            kind: crate::packets::group_mod::GroupKind::from(buffer[field::KIND]),
            group_id: NetworkEndian::read_u32(&buffer[field::GROUP_ID]),
            buckets,
        })
    }

    fn buffer_len(&self) -> usize {
        group_desc_field::HEADER_LEN + self.buckets.iter().fold(0, |acc, b| acc + b.buffer_len())
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        use self::group_desc_field as field;
        let needed = self.buffer_len();
        if buffer.len() < needed {
            return Err(Error::BufferFull {
                needed,
                available: buffer.len(),
            });
        }
        NetworkEndian::write_u16(&mut buffer[field::LENGTH], needed as u16);
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

/// `ofp_group_features`.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct GroupFeatures {
    pub types: u32,
    pub capabilities: u32,
    pub max_groups: [u32; 4],
    pub actions: [u32; 4],
}

impl Repr for GroupFeatures {
    fn parse(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < 40 {
            return Err(Error::TooShort {
                needed: 40,
                available: buffer.len(),
            });
        }
        let mut max_groups = [0u32; 4];
        let mut actions = [0u32; 4];
        for i in 0..4 {
            max_groups[i] = NetworkEndian::read_u32(&buffer[8 + i * 4..12 + i * 4]);
            actions[i] = NetworkEndian::read_u32(&buffer[24 + i * 4..28 + i * 4]);
        }
        Ok(GroupFeatures {
            types: NetworkEndian::read_u32(&buffer[0..4]),
            capabilities: NetworkEndian::read_u32(&buffer[4..8]),
            max_groups,
            actions,
        })
    }

    fn buffer_len(&self) -> usize {
        40
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        if buffer.len() < 40 {
            return Err(Error::BufferFull {
                needed: 40,
                available: buffer.len(),
            });
        }
        NetworkEndian::write_u32(&mut buffer[0..4], self.types);
        NetworkEndian::write_u32(&mut buffer[4..8], self.capabilities);
        for i in 0..4 {
            NetworkEndian::write_u32(&mut buffer[8 + i * 4..12 + i * 4], self.max_groups[i]);
            NetworkEndian::write_u32(&mut buffer[24 + i * 4..28 + i * 4], self.actions[i]);
        }
        Ok(())
    }
}

fn parse_list<T: Repr>(buffer: &[u8]) -> Result<Vec<T>> {
    let mut out = Vec::new();
    let mut offset = 0;
    while offset < buffer.len() {
        let item = T::parse(&buffer[offset..])?;
        offset += item.buffer_len();
        out.push(item);
    }
    Ok(out)
}

fn emit_list<T: Repr>(items: &[T], buffer: &mut [u8]) -> Result<()> {
    let mut offset = 0;
    for item in items {
        let length = item.buffer_len();
        item.emit(&mut buffer[offset..offset + length])?;
        offset += length;
    }
    Ok(())
}

fn list_len<T: Repr>(items: &[T]) -> usize {
    items.iter().fold(0, |acc, i| acc + i.buffer_len())
}

/// The body of a Multipart request, dispatched by `stat_type`.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum RequestBody<E> {
    Desc,
    Flow(FlowStatsRequest<E>),
    Aggregate(FlowStatsRequest<E>),
    Table,
    PortStats { port_no: PortNumber },
    Queue { port_no: PortNumber, queue_id: u32 },
    Group { group_id: u32 },
    GroupDesc,
    GroupFeatures,
    Experimenter { experimenter: u32, data: Vec<u8> },
}

/// The body of a Multipart reply, dispatched by `stat_type`.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ReplyBody<E> {
    Desc(Desc),
    Flow(Vec<FlowStats<E>>),
    Aggregate(AggregateStats),
    Table(Vec<TableStats>),
    PortStats(Vec<PortStats>),
    Queue(Vec<QueueStats>),
    Group(Vec<GroupStats>),
    GroupDesc(Vec<GroupDesc<E>>),
    GroupFeatures(GroupFeatures),
    Experimenter { experimenter: u32, data: Vec<u8> },
}

impl<E: Repr> RequestBody<E> {
    fn stat_kind(&self) -> StatKind {
        match *self {
            RequestBody::Desc => StatKind::Desc,
            RequestBody::Flow(_) => StatKind::Flow,
            RequestBody::Aggregate(_) => StatKind::Aggregate,
            RequestBody::Table => StatKind::Table,
            RequestBody::PortStats { .. } => StatKind::PortStats,
            RequestBody::Queue { .. } => StatKind::Queue,
            RequestBody::Group { .. } => StatKind::Group,
            RequestBody::GroupDesc => StatKind::GroupDesc,
            RequestBody::GroupFeatures => StatKind::GroupFeatures,
            RequestBody::Experimenter { .. } => StatKind::Experimenter,
        }
    }

    fn buffer_len(&self) -> usize {
        match *self {
            RequestBody::Desc | RequestBody::Table | RequestBody::GroupDesc
            | RequestBody::GroupFeatures => 0,
            RequestBody::Flow(ref req) | RequestBody::Aggregate(ref req) => req.buffer_len(),
            RequestBody::PortStats { .. } => 8,
            RequestBody::Queue { .. } => 8,
            RequestBody::Group { .. } => 8,
            RequestBody::Experimenter { ref data, .. } => 4 + data.len(),
        }
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        match *self {
            RequestBody::Desc | RequestBody::Table | RequestBody::GroupDesc
            | RequestBody::GroupFeatures => Ok(()),
            RequestBody::Flow(ref req) | RequestBody::Aggregate(ref req) => req.emit(buffer),
            RequestBody::PortStats { port_no } => {
                NetworkEndian::write_u32(&mut buffer[0..4], port_no.into());
                for byte in &mut buffer[4..8] {
                    *byte = 0;
                }
                Ok(())
            }
            RequestBody::Queue { port_no, queue_id } => {
                NetworkEndian::write_u32(&mut buffer[0..4], port_no.into());
                NetworkEndian::write_u32(&mut buffer[4..8], queue_id);
                Ok(())
            }
            RequestBody::Group { group_id } => {
                NetworkEndian::write_u32(&mut buffer[0..4], group_id);
                for byte in &mut buffer[4..8] {
                    *byte = 0;
                }
                Ok(())
            }
            RequestBody::Experimenter {
                experimenter,
                ref data,
            } => {
                NetworkEndian::write_u32(&mut buffer[0..4], experimenter);
                buffer[4..].copy_from_slice(data);
                Ok(())
            }
        }
    }

    fn parse(kind: StatKind, buffer: &[u8]) -> Result<Self> {
        Ok(match kind {
            StatKind::Desc => RequestBody::Desc,
            StatKind::Flow => RequestBody::Flow(FlowStatsRequest::parse(buffer)?),
            StatKind::Aggregate => RequestBody::Aggregate(FlowStatsRequest::parse(buffer)?),
            StatKind::Table => RequestBody::Table,
            StatKind::PortStats => {
                if buffer.len() < 8 {
                    return Err(Error::TooShort {
                        needed: 8,
                        available: buffer.len(),
                    });
                }
                RequestBody::PortStats {
                    port_no: PortNumber::from(NetworkEndian::read_u32(&buffer[0..4])),
                }
            }
            StatKind::Queue => {
                if buffer.len() < 8 {
                    return Err(Error::TooShort {
                        needed: 8,
                        available: buffer.len(),
                    });
                }
                RequestBody::Queue {
                    port_no: PortNumber::from(NetworkEndian::read_u32(&buffer[0..4])),
                    queue_id: NetworkEndian::read_u32(&buffer[4..8]),
                }
            }
            StatKind::Group => {
                if buffer.len() < 8 {
                    return Err(Error::TooShort {
                        needed: 8,
                        available: buffer.len(),
                    });
                }
                RequestBody::Group {
                    group_id: NetworkEndian::read_u32(&buffer[0..4]),
                }
            }
            StatKind::GroupDesc => RequestBody::GroupDesc,
            StatKind::GroupFeatures => RequestBody::GroupFeatures,
            StatKind::Experimenter => {
                if buffer.len() < 4 {
                    return Err(Error::TooShort {
                        needed: 4,
                        available: buffer.len(),
                    });
                }
                RequestBody::Experimenter {
                    experimenter: NetworkEndian::read_u32(&buffer[0..4]),
                    data: buffer[4..].to_vec(),
                }
            }
            StatKind::Unknown(raw) => return Err(Error::BadKind(raw as u8)),
        })
    }
}

impl<E: Repr> ReplyBody<E> {
    fn stat_kind(&self) -> StatKind {
        match *self {
            ReplyBody::Desc(_) => StatKind::Desc,
            ReplyBody::Flow(_) => StatKind::Flow,
            ReplyBody::Aggregate(_) => StatKind::Aggregate,
            ReplyBody::Table(_) => StatKind::Table,
            ReplyBody::PortStats(_) => StatKind::PortStats,
            ReplyBody::Queue(_) => StatKind::Queue,
            ReplyBody::Group(_) => StatKind::Group,
            ReplyBody::GroupDesc(_) => StatKind::GroupDesc,
            ReplyBody::GroupFeatures(_) => StatKind::GroupFeatures,
            ReplyBody::Experimenter { .. } => StatKind::Experimenter,
        }
    }

    fn buffer_len(&self) -> usize {
        match *self {
            ReplyBody::Desc(ref desc) => desc.buffer_len(),
            ReplyBody::Flow(ref items) => list_len(items),
            ReplyBody::Aggregate(ref stats) => stats.buffer_len(),
            ReplyBody::Table(ref items) => list_len(items),
            ReplyBody::PortStats(ref items) => list_len(items),
            ReplyBody::Queue(ref items) => list_len(items),
            ReplyBody::Group(ref items) => list_len(items),
            ReplyBody::GroupDesc(ref items) => list_len(items),
            ReplyBody::GroupFeatures(ref features) => features.buffer_len(),
            ReplyBody::Experimenter { ref data, .. } => 4 + data.len(),
        }
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        match *self {
            ReplyBody::Desc(ref desc) => desc.emit(buffer),
            ReplyBody::Flow(ref items) => emit_list(items, buffer),
            ReplyBody::Aggregate(ref stats) => stats.emit(buffer),
            ReplyBody::Table(ref items) => emit_list(items, buffer),
            ReplyBody::PortStats(ref items) => emit_list(items, buffer),
            ReplyBody::Queue(ref items) => emit_list(items, buffer),
            ReplyBody::Group(ref items) => emit_list(items, buffer),
            ReplyBody::GroupDesc(ref items) => emit_list(items, buffer),
            ReplyBody::GroupFeatures(ref features) => features.emit(buffer),
            ReplyBody::Experimenter {
                experimenter,
                ref data,
            } => {
                NetworkEndian::write_u32(&mut buffer[0..4], experimenter);
                buffer[4..].copy_from_slice(data);
                Ok(())
            }
        }
    }

    fn parse(kind: StatKind, buffer: &[u8]) -> Result<Self> {
        Ok(match kind {
            StatKind::Desc => ReplyBody::Desc(Desc::parse(buffer)?),
            StatKind::Flow => ReplyBody::Flow(parse_list(buffer)?),
            StatKind::Aggregate => ReplyBody::Aggregate(AggregateStats::parse(buffer)?),
            StatKind::Table => ReplyBody::Table(parse_list(buffer)?),
            StatKind::PortStats => ReplyBody::PortStats(parse_list(buffer)?),
            StatKind::Queue => ReplyBody::Queue(parse_list(buffer)?),
            StatKind::Group => ReplyBody::Group(parse_list(buffer)?),
            StatKind::GroupDesc => ReplyBody::GroupDesc(parse_list(buffer)?),
            StatKind::GroupFeatures => ReplyBody::GroupFeatures(GroupFeatures::parse(buffer)?),
            StatKind::Experimenter => {
                if buffer.len() < 4 {
                    return Err(Error::TooShort {
                        needed: 4,
                        available: buffer.len(),
                    });
                }
                ReplyBody::Experimenter {
                    experimenter: NetworkEndian::read_u32(&buffer[0..4]),
                    data: buffer[4..].to_vec(),
                }
            }
            StatKind::Unknown(raw) => return Err(Error::BadKind(raw as u8)),
        })
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct RequestRepr<E> {
    pub flags: u16,
    pub body: RequestBody<E>,
}

impl<E: Repr> Repr for RequestRepr<E> {
    fn parse(buffer: &[u8]) -> Result<Self> {
        let len = buffer.len();
        if len < field::BODY_AND_AFTER.start {
            return Err(Error::TooShort {
                needed: field::BODY_AND_AFTER.start,
                available: len,
            });
        }
        let stat_kind = StatKind::from(NetworkEndian::read_u16(&buffer[field::STAT_KIND]));
        let flags = NetworkEndian::read_u16(&buffer[field::FLAGS]);
        let body = RequestBody::parse(stat_kind, &buffer[field::BODY_AND_AFTER])?;
        Ok(RequestRepr { flags, body })
    }

    fn buffer_len(&self) -> usize {
        field::BODY_AND_AFTER.start + self.body.buffer_len()
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        let needed = self.buffer_len();
        if buffer.len() < needed {
            return Err(Error::BufferFull {
                needed,
                available: buffer.len(),
            });
        }
        NetworkEndian::write_u16(&mut buffer[field::STAT_KIND], self.body.stat_kind().into());
        NetworkEndian::write_u16(&mut buffer[field::FLAGS], self.flags);
        for byte in &mut buffer[4..8] {
            *byte = 0;
        }
        self.body.emit(&mut buffer[field::BODY_AND_AFTER.start..needed])
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ReplyRepr<E> {
    pub flags: u16,
    pub body: ReplyBody<E>,
}

impl<E: Repr> Repr for ReplyRepr<E> {
    fn parse(buffer: &[u8]) -> Result<Self> {
        let len = buffer.len();
        if len < field::BODY_AND_AFTER.start {
            return Err(Error::TooShort {
                needed: field::BODY_AND_AFTER.start,
                available: len,
            });
        }
        let stat_kind = StatKind::from(NetworkEndian::read_u16(&buffer[field::STAT_KIND]));
        let flags = NetworkEndian::read_u16(&buffer[field::FLAGS]);
        let body = ReplyBody::parse(stat_kind, &buffer[field::BODY_AND_AFTER])?;
        Ok(ReplyRepr { flags, body })
    }

    fn buffer_len(&self) -> usize {
        field::BODY_AND_AFTER.start + self.body.buffer_len()
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        let needed = self.buffer_len();
        if buffer.len() < needed {
            return Err(Error::BufferFull {
                needed,
                available: buffer.len(),
            });
        }
        NetworkEndian::write_u16(&mut buffer[field::STAT_KIND], self.body.stat_kind().into());
        NetworkEndian::write_u16(&mut buffer[field::FLAGS], self.flags);
        for byte in &mut buffer[4..8] {
            *byte = 0;
        }
        self.body.emit(&mut buffer[field::BODY_AND_AFTER.start..needed])
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
    fn test_desc_reply_round_trip() {
        let repr = ReplyRepr::<NoExperimenter> {
            flags: 0,
            body: ReplyBody::Desc(Desc {
                mfr_desc: "acme".into(),
                hw_desc: "switch-1".into(),
                sw_desc: "ofchan".into(),
                serial_num: "0001".into(),
                dp_desc: "top-of-rack".into(),
            }),
        };
        let mut bytes = vec![0; repr.buffer_len()];
        repr.emit(&mut bytes).unwrap();
        assert_eq!(ReplyRepr::parse(&bytes).unwrap(), repr);
    }

    #[test]
    fn test_aggregate_reply_round_trip() {
        let repr = ReplyRepr::<NoExperimenter> {
            flags: 0,
            body: ReplyBody::Aggregate(AggregateStats {
                packet_count: 10,
                byte_count: 1000,
                flow_count: 2,
            }),
        };
        let mut bytes = vec![0; repr.buffer_len()];
        repr.emit(&mut bytes).unwrap();
        assert_eq!(ReplyRepr::parse(&bytes).unwrap(), repr);
    }

    #[test]
    fn test_port_stats_reply_round_trip() {
        let repr = ReplyRepr::<NoExperimenter> {
            flags: 0,
            body: ReplyBody::PortStats(vec![PortStats {
                port_no: PortNumber::Regular(1),
                rx_packets: 1,
                tx_packets: 2,
                rx_bytes: 3,
                tx_bytes: 4,
                rx_dropped: 0,
                tx_dropped: 0,
                rx_errors: 0,
                tx_errors: 0,
                rx_frame_err: 0,
                rx_over_err: 0,
                rx_crc_err: 0,
                collisions: 0,
                duration_sec: 5,
                duration_nsec: 0,
            }]),
        };
        let mut bytes = vec![0; repr.buffer_len()];
        repr.emit(&mut bytes).unwrap();
        assert_eq!(ReplyRepr::parse(&bytes).unwrap(), repr);
    }

    #[test]
    fn test_group_features_reply_round_trip() {
        let repr = ReplyRepr::<NoExperimenter> {
            flags: 0,
            body: ReplyBody::GroupFeatures(GroupFeatures {
                types: 0b1111,
                capabilities: 0,
                max_groups: [100, 100, 100, 100],
                actions: [0, 0, 0, 0],
            }),
        };
        let mut bytes = vec![0; repr.buffer_len()];
        repr.emit(&mut bytes).unwrap();
        assert_eq!(ReplyRepr::parse(&bytes).unwrap(), repr);
    }

    #[test]
    fn test_request_round_trip() {
        let repr = RequestRepr::<NoExperimenter> {
            flags: 0,
            body: RequestBody::PortStats {
                port_no: PortNumber::Any,
            },
        };
        let mut bytes = vec![0; repr.buffer_len()];
        repr.emit(&mut bytes).unwrap();
        assert_eq!(RequestRepr::parse(&bytes).unwrap(), repr);
    }
}
