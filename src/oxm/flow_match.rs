use crate::error::{Error, Result};
use crate::Repr;
use byteorder::{ByteOrder, NetworkEndian};
use super::Oxm;
use super::FlowMatchField;
use smoltcp::wire::EthernetProtocol;

mod field {
    #![allow(non_snake_case)]

    use crate::field::*;

    pub const MATCH_TYPE: Field = 0..2;
    pub const LENGTH: Field = 2..4;

    pub fn OXM_FIELDS(length: usize) -> Field {
        LENGTH.end..length
    }

    pub fn PADDING(length: usize) -> Field {
        length..(((length + 7) / 8) * 8)
    }
}

enum_with_unknown! {
    /// OpenFlow version
    pub doc enum MatchType(u16) {
        /// Deprecated
        STANDARD = 0,
        /// OpenFlow eXtensible Match
        OXM = 1
    }
}


/// A wrapper to read and write a buffer representing an flow match packet.
#[derive(Debug, PartialEq, Eq, Clone)]
struct Packet<T> {
    inner: T,
}

impl<T: AsRef<[u8]>> Packet<T> {
    /// Return a new flow match packet parser/encoder for the given buffer
    fn new(buf: T) -> Self {
        Packet { inner: buf }
    }

    /// Return a new flow match packet parse/encoder for the given buffer, and make sure not getter or
    /// setter will panic.
    fn new_checked(buf: T) -> Result<Self> {
        let packet = Packet { inner: buf };
        packet.check_len()?;
        Ok(packet)
    }

    fn check_len(&self) -> Result<()> {
        let len = self.inner.as_ref().len();
        if len < field::LENGTH.end {
            return Err(Error::TooShort {
                needed: field::LENGTH.end,
                available: len,
            });
        }
        let needed = field::PADDING(self.length() as usize).end;
        if len < needed {
            return Err(Error::TooShort {
                needed,
                available: len,
            });
        }
        Ok(())
    }

    /// Return the `match_type` field
    fn match_type(&self) -> MatchType {
        NetworkEndian::read_u16(&self.inner.as_ref()[field::MATCH_TYPE]).into()
    }

    /// Return the `length` field
    fn length(&self) -> u16 {
        NetworkEndian::read_u16(&self.inner.as_ref()[field::LENGTH])
    }

    /// Parse and return the OXM fields
    fn oxm_fields<E: Repr>(&self) -> Result<Vec<Oxm<E>>> {
        let length = self.length() as usize;
        let bytes = &self.inner.as_ref()[field::OXM_FIELDS(length)];
        let mut oxm_fields = Vec::new();
        let mut offset = 0;
        while offset < bytes.len() {
            let repr = Oxm::parse(&bytes[offset..])?;
            offset += repr.buffer_len();
            oxm_fields.push(repr);
        }
        Ok(oxm_fields)
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> Packet<T> {
    /// Setter for the `match_type` field
    fn set_match_type(&mut self, value: MatchType) {
        NetworkEndian::write_u16(&mut self.inner.as_mut()[field::MATCH_TYPE], value.into());
    }

    /// Setter for the `length` field.
    fn set_length(&mut self, value: u16) {
        NetworkEndian::write_u16(&mut self.inner.as_mut()[field::LENGTH], value);
    }

    /// Set the `oxm_fields` field. Note that the length field must be set already, otherwise, this
    /// will panic.
    fn set_oxm_fields<E: Repr>(&mut self, value: &[Oxm<E>]) -> Result<()> {
        let oxm_fields_len = self.length() as usize;
        let buf = &mut self.inner.as_mut()[field::OXM_FIELDS(oxm_fields_len)];
        let mut offset = 0;
        for field in value {
            field.emit(&mut buf[offset..offset + field.buffer_len()])?;
            offset += field.buffer_len();
        }
        Ok(())
    }

    /// Add necessary padding to enusre 8 bytes alignment. Note that the length field must be set
    /// already when setting the padding.
    fn set_padding(&mut self) {
        let len = self.length() as usize;
        let buf = &mut self.inner.as_mut()[field::PADDING(len)];
        for byte in buf {
            *byte = 0;
        }
    }
}

/// Represent a "flow match packet" that is used in messages such as "packet in".
///
/// ```no_rust
/// +---------------+---------------+
/// |   match type  |     length    |
/// +---------------+---------------+
/// |          oxm fields           |
/// |   (variable       +-----------+
/// |     length)       |  padding  |
/// +-------------------+-----------+
/// ```
///
/// - The `match type` field can only take one valid value `0x0002`
/// - The `length` is the length of the oxm fields only
/// - The `padding` field is for 8 bytes alignment
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PacketRepr<E>(pub Vec<Oxm<E>>);

impl<E: Repr> PacketRepr<E> {
    fn fields_len(&self) -> usize {
        self.0.iter().fold(0, |acc, field| acc + field.buffer_len())
    }

    /// The Ethernet type carried by this match, if it constrains one. Most
    /// of this match's prerequisites are chained off this value.
    fn ethernet_type(&self) -> Option<EthernetProtocol> {
        self.0.iter().find_map(|oxm| match oxm {
            Oxm::FlowMatchField(FlowMatchField::EthernetType(eth_type)) => {
                Some(eth_type.value())
            }
            _ => None,
        })
    }

    /// The IP protocol number carried by this match, if it constrains one.
    fn ip_protocol(&self) -> Option<u8> {
        self.0.iter().find_map(|oxm| match oxm {
            Oxm::FlowMatchField(FlowMatchField::IpProtocol(proto)) => Some(proto.value()),
            _ => None,
        })
    }

    fn has_field(&self, is_match: impl Fn(&FlowMatchField) -> bool) -> bool {
        self.0.iter().any(|oxm| match oxm {
            Oxm::FlowMatchField(field) => is_match(field),
            _ => false,
        })
    }

    /// Check that every field with a prerequisite has the field(s) it
    /// depends on also present in this match, with a compatible value.
    ///
    /// Only the handful of prerequisite chains anchored on `eth_type` and
    /// `ip_proto` are enforced; fields with no prerequisite (the vast
    /// majority) are always accepted.
    pub fn validate_prereqs(&self) -> Result<()> {
        const IPV4: EthernetProtocol = EthernetProtocol::Ipv4;
        const IPV6: EthernetProtocol = EthernetProtocol::Ipv6;
        const ARP: EthernetProtocol = EthernetProtocol::Arp;
        const TCP: u8 = 6;
        const UDP: u8 = 17;
        const SCTP: u8 = 132;
        const ICMP: u8 = 1;
        const ICMPV6: u8 = 58;

        let eth_type = self.ethernet_type();

        let needs_ip = self.has_field(|f| {
            matches!(
                f,
                FlowMatchField::IpDscp(_)
                    | FlowMatchField::IpEcn(_)
                    | FlowMatchField::IpProtocol(_)
            )
        });
        if needs_ip && !matches!(eth_type, Some(IPV4) | Some(IPV6)) {
            return Err(Error::MatchPrereqViolated(
                "ip_dscp/ip_ecn/ip_proto require eth_type = IPv4 or IPv6",
            ));
        }

        let needs_ipv4 = self.has_field(|f| {
            matches!(
                f,
                FlowMatchField::Ipv4Source(_) | FlowMatchField::Ipv4Destination(_)
            )
        });
        if needs_ipv4 && eth_type != Some(IPV4) {
            return Err(Error::MatchPrereqViolated(
                "ipv4_src/ipv4_dst require eth_type = IPv4",
            ));
        }

        let needs_ipv6 = self.has_field(|f| {
            matches!(
                f,
                FlowMatchField::Ipv6Source(_)
                    | FlowMatchField::Ipv6Destination(_)
                    | FlowMatchField::Ipv6FlowLabel(_)
                    | FlowMatchField::Ipv6NdTarget(_)
                    | FlowMatchField::Ipv6NdSll(_)
                    | FlowMatchField::Ipv6NdTll(_)
                    | FlowMatchField::Ipv6ExtensionHeader(_)
            )
        });
        if needs_ipv6 && eth_type != Some(IPV6) {
            return Err(Error::MatchPrereqViolated(
                "ipv6_src/ipv6_dst/... require eth_type = IPv6",
            ));
        }

        let needs_arp = self.has_field(|f| {
            matches!(
                f,
                FlowMatchField::ArpOpCode(_)
                    | FlowMatchField::ArpSpa(_)
                    | FlowMatchField::ArpTpa(_)
                    | FlowMatchField::ArpSha(_)
                    | FlowMatchField::ArpTha(_)
            )
        });
        if needs_arp && eth_type != Some(ARP) {
            return Err(Error::MatchPrereqViolated(
                "arp_op/arp_spa/... require eth_type = ARP",
            ));
        }

        let ip_proto = self.ip_protocol();

        let needs_tcp = self.has_field(|f| {
            matches!(
                f,
                FlowMatchField::TcpSource(_) | FlowMatchField::TcpDestination(_)
                    | FlowMatchField::TcpFlags(_)
            )
        });
        if needs_tcp && ip_proto != Some(TCP) {
            return Err(Error::MatchPrereqViolated(
                "tcp_src/tcp_dst/tcp_flags require ip_proto = TCP",
            ));
        }

        let needs_udp = self.has_field(|f| {
            matches!(
                f,
                FlowMatchField::UdpSource(_) | FlowMatchField::UdpDestination(_)
            )
        });
        if needs_udp && ip_proto != Some(UDP) {
            return Err(Error::MatchPrereqViolated(
                "udp_src/udp_dst require ip_proto = UDP",
            ));
        }

        let needs_sctp = self.has_field(|f| {
            matches!(
                f,
                FlowMatchField::SctpSource(_) | FlowMatchField::SctpDestination(_)
            )
        });
        if needs_sctp && ip_proto != Some(SCTP) {
            return Err(Error::MatchPrereqViolated(
                "sctp_src/sctp_dst require ip_proto = SCTP",
            ));
        }

        let needs_icmpv4 = self.has_field(|f| {
            matches!(f, FlowMatchField::IcmpType(_) | FlowMatchField::IcmpCode(_))
        });
        if needs_icmpv4 && !(eth_type == Some(IPV4) && ip_proto == Some(ICMP)) {
            return Err(Error::MatchPrereqViolated(
                "icmpv4_type/icmpv4_code require eth_type = IPv4, ip_proto = ICMP",
            ));
        }

        let needs_icmpv6 = self.has_field(|f| {
            matches!(
                f,
                FlowMatchField::Icmpv6Type(_) | FlowMatchField::Icmpv6Code(_)
            )
        });
        if needs_icmpv6 && !(eth_type == Some(IPV6) && ip_proto == Some(ICMPV6)) {
            return Err(Error::MatchPrereqViolated(
                "icmpv6_type/icmpv6_code require eth_type = IPv6, ip_proto = ICMPv6",
            ));
        }

        Ok(())
    }

    /// `(class, field, value, mask)` for every OXM entry, decoded off the
    /// wire encoding rather than matched variant-by-variant, so this works
    /// uniformly across every `FlowMatchField`/`Experimenter` shape.
    fn oxm_entries(&self) -> Result<Vec<(u16, u8, Vec<u8>, Option<Vec<u8>>)>> {
        let mut entries = Vec::with_capacity(self.0.len());
        for oxm in &self.0 {
            let mut buf = vec![0u8; oxm.buffer_len()];
            oxm.emit(&mut buf)?;
            let packet = super::packet::Packet::new(&buf[..]);
            let value = packet.value();
            let (value, mask) = if packet.has_mask() {
                let half = value.len() / 2;
                (value[..half].to_vec(), Some(value[half..].to_vec()))
            } else {
                (value.to_vec(), None)
            };
            entries.push((packet.class(), packet.field(), value, mask));
        }
        Ok(entries)
    }

    /// Two matches overlap iff, for every field present in both, the sets of
    /// concrete values the `(value, mask)` pair matches intersect. A field
    /// present in only one match imposes no constraint (the other match
    /// wildcards it).
    pub fn overlaps(&self, other: &Self) -> Result<bool> {
        let mine = self.oxm_entries()?;
        let theirs = other.oxm_entries()?;
        for (class, field, value, mask) in &mine {
            let found = theirs
                .iter()
                .find(|(c, f, _, _)| c == class && f == field);
            if let Some((_, _, other_value, other_mask)) = found {
                let care_bits = match (mask, other_mask) {
                    (Some(m1), Some(m2)) => and_bytes(m1, m2),
                    (Some(m1), None) => m1.clone(),
                    (None, Some(m2)) => m2.clone(),
                    (None, None) => vec![0xff; value.len()],
                };
                if !agree_under_mask(value, other_value, &care_bits) {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    /// Strict overlap: both matches constrain exactly the same fields, each
    /// with identical values and masks.
    pub fn overlaps_strict(&self, other: &Self) -> Result<bool> {
        let mine = self.oxm_entries()?;
        let theirs = other.oxm_entries()?;
        if mine.len() != theirs.len() {
            return Ok(false);
        }
        for (class, field, value, mask) in &mine {
            match theirs.iter().find(|(c, f, _, _)| c == class && f == field) {
                Some((_, _, other_value, other_mask)) => {
                    if value != other_value || mask != other_mask {
                        return Ok(false);
                    }
                }
                None => return Ok(false),
            }
        }
        Ok(true)
    }
}

fn and_bytes(a: &[u8], b: &[u8]) -> Vec<u8> {
    a.iter().zip(b).map(|(x, y)| x & y).collect()
}

fn agree_under_mask(a: &[u8], b: &[u8], care_bits: &[u8]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .zip(care_bits)
            .all(|((x, y), m)| (x ^ y) & m == 0)
}

impl<E: Repr> Repr for PacketRepr<E> {
    fn parse(buffer: &[u8]) -> Result<Self> {
        let packet = Packet::new_checked(buffer)?;
        match packet.match_type() {
            MatchType::OXM => {
                let repr = PacketRepr(packet.oxm_fields()?);
                repr.validate_prereqs()?;
                Ok(repr)
            }
            other => Err(Error::BadMatchType(other.into())),
        }
    }

    fn buffer_len(&self) -> usize {
        field::PADDING(4 + self.fields_len()).end
    }

    fn emit(&self, buffer: &mut [u8]) -> Result<()> {
        let mut packet = Packet::new(buffer);
        packet.set_match_type(MatchType::OXM);
        packet.set_length(4 + self.fields_len() as u16);
        packet.set_oxm_fields(&self.0)?;
        packet.set_padding();
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::oxm::{FlowMatchField, InPort, Oxm, TunnelId, VlanId};

    // a dummy Oxm Experimenter type.
    // needed because openflow::PacketRepr is generic of it.
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

    #[cfg_attr(rustfmt, rustfmt_skip)]
    static BYTES: [u8; 32] = [
        // header
        0x00, 0x01,             // match type (1 = oxm)
        0x00, 0x1e,             // length = 30

        // first oxm tlv (len = 8)
        0x80, 0x00,             // class = 0x8000 = openflow basic
        0x00,                   // field (0=in_port), no mask
        0x04,                   // value length = 4
        0x00, 0x00, 0xab, 0xcd, // value = 43981

        // second oxm tlv (len = 12)
        0x80, 0x00,             // class = 0x8000 = openflow basic
        38 << 1,                // field = 38 = tunnel id no mask
        0x08,                   // value length = 8
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xc3, 0x50, // value = 500000

        // third oxm tlv (len = 6)
        0x80, 0x00,             // class = 0x8000 = openflow basic
        6 << 1,                 // field = 6 = vlan id, no mask
        0x02,                   // length = 2
        0x07, 0x77,             // value length = 0x0777

        // padding (flow match packets have padding for 8 bytes alignment)
        0x00, 0x00
    ];

    #[test]
    fn test_deconstruct() {
        let packet = Packet::new(&BYTES[..]);
        assert_eq!(packet.match_type(), MatchType::OXM);
        assert_eq!(packet.length(), 30);

        assert_eq!(field::OXM_FIELDS(30), 4..30);
        assert_eq!(field::PADDING(30), 30..32);
    }

    #[test]
    fn test_padding_field() {
        assert_eq!(field::PADDING(4), 4..8);
        assert_eq!(field::PADDING(4), 4..8);
        assert_eq!(field::PADDING(8), 8..8);
        assert_eq!(field::PADDING(15), 15..16);
        assert_eq!(field::PADDING(24), 24..24);
        assert_eq!(field::PADDING(25), 25..32);
    }

    #[test]
    fn test_parse() {
        let parsed = PacketRepr::<OxmExperimenter>::parse(&BYTES).unwrap();
        let expected = PacketRepr::<OxmExperimenter>(vec![
            Oxm::FlowMatchField(FlowMatchField::InPort(InPort::new(0xabcd))),
            Oxm::FlowMatchField(FlowMatchField::TunnelId(TunnelId::new(50_000, None))),
            Oxm::FlowMatchField(FlowMatchField::VlanId(VlanId::new(0x0777, None))),
        ]);
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_emit() {
        let repr = PacketRepr::<OxmExperimenter>(vec![
            Oxm::FlowMatchField(FlowMatchField::InPort(InPort::new(0xabcd))),
            Oxm::FlowMatchField(FlowMatchField::TunnelId(TunnelId::new(50_000, None))),
            Oxm::FlowMatchField(FlowMatchField::VlanId(VlanId::new(0x0777, None))),
        ]);
        assert_eq!(repr.buffer_len(), 32);

        let mut bytes = [0xff; 32];
        repr.emit(&mut bytes).unwrap();
        assert_eq!(&bytes[..], &BYTES[..]);
    }

    #[test]
    fn test_overlaps_wildcarded_field_always_intersects() {
        let a = PacketRepr::<OxmExperimenter>(vec![Oxm::FlowMatchField(FlowMatchField::InPort(
            InPort::new(1),
        ))]);
        let b = PacketRepr::<OxmExperimenter>(vec![Oxm::FlowMatchField(FlowMatchField::VlanId(
            VlanId::new(7, None),
        ))]);
        assert!(a.overlaps(&b).unwrap());
    }

    #[test]
    fn test_overlaps_disjoint_values_do_not_overlap() {
        let a = PacketRepr::<OxmExperimenter>(vec![Oxm::FlowMatchField(FlowMatchField::InPort(
            InPort::new(1),
        ))]);
        let b = PacketRepr::<OxmExperimenter>(vec![Oxm::FlowMatchField(FlowMatchField::InPort(
            InPort::new(2),
        ))]);
        assert!(!a.overlaps(&b).unwrap());
    }

    #[test]
    fn test_overlaps_strict_requires_same_field_set() {
        let a = PacketRepr::<OxmExperimenter>(vec![Oxm::FlowMatchField(FlowMatchField::InPort(
            InPort::new(1),
        ))]);
        let b = PacketRepr::<OxmExperimenter>(vec![
            Oxm::FlowMatchField(FlowMatchField::InPort(InPort::new(1))),
            Oxm::FlowMatchField(FlowMatchField::VlanId(VlanId::new(7, None))),
        ]);
        assert!(a.overlaps(&b).unwrap());
        assert!(!a.overlaps_strict(&b).unwrap());

        let c = PacketRepr::<OxmExperimenter>(vec![Oxm::FlowMatchField(FlowMatchField::InPort(
            InPort::new(1),
        ))]);
        assert!(a.overlaps_strict(&c).unwrap());
    }
}
