//! Message-codec level integration tests: round-tripping [`ofchan::Msg`]
//! across the wire, OXM prerequisite enforcement, and the envelope
//! properties from SPEC_FULL.md's testable-properties section.

use ofchan::oxm::{Experimenter, FlowMatch, FlowMatchField, InPort, Oxm};
use ofchan::packets::packet_in;
use ofchan::packets::packet_out;
use ofchan::{Error, Msg, PortNumber, Repr, Version};

/// S3: encode a v1.3 Packet-In, check the version byte, decode it back.
#[test]
fn packet_in_v1_3_round_trip() {
    let frame: Vec<u8> = (0u8..0x3b).collect();
    let payload = packet_in::PacketRepr::<Experimenter> {
        buffer_id: 0xffff_ffff,
        frame_length: 60,
        reason: packet_in::Reason::ApplyAction,
        table_id: 0,
        cookie: 0xcafe_babe,
        in_port: PortNumber::Any,
        flow_match: FlowMatch(vec![Oxm::FlowMatchField(FlowMatchField::InPort(
            InPort::new(3),
        ))]),
        frame,
    };
    let msg = Msg::PacketIn {
        xid: 0x11,
        payload,
    };

    let mut bytes = vec![0u8; msg.buffer_len(Version::V1_3)];
    msg.emit(Version::V1_3, &mut bytes).unwrap();
    assert_eq!(bytes[0], 0x04);

    let decoded = Msg::parse(Version::V1_3, &bytes).unwrap();
    assert_eq!(decoded, msg);
}

/// S4: a match constraining `tcp_src` without an `eth_type` prerequisite
/// must be rejected before it's ever put on the wire.
#[test]
fn oxm_prereq_reject_tcp_without_eth_type() {
    use ofchan::oxm::{IpProtocol, TcpSource};

    let flow_match: FlowMatch<Experimenter> = FlowMatch(vec![
        Oxm::FlowMatchField(FlowMatchField::IpProtocol(IpProtocol::new(6))),
        Oxm::FlowMatchField(FlowMatchField::TcpSource(TcpSource::new(80))),
    ]);

    let err = flow_match.validate_prereqs().unwrap_err();
    assert!(matches!(err, Error::MatchPrereqViolated(_)));
}

/// Property 1 (round-trip) and property 2 (length self-description) for a
/// message whose payload is plain bytes rather than a TLV structure.
#[test]
fn echo_request_round_trips_and_declares_its_length() {
    let msg = Msg::EchoRequest {
        xid: 7,
        data: vec![1, 2, 3, 4, 5],
    };
    let len = msg.buffer_len(Version::V1_0);
    let mut bytes = vec![0u8; len];
    msg.emit(Version::V1_0, &mut bytes).unwrap();

    // The envelope's declared length (bytes 2..4, big-endian) must equal the
    // buffer this message actually occupies.
    let declared = u16::from_be_bytes([bytes[2], bytes[3]]) as usize;
    assert_eq!(declared, len);
    assert_eq!(bytes.len(), len);

    let decoded = Msg::parse(Version::V1_0, &bytes).unwrap();
    assert_eq!(decoded, msg);
}

/// Property 3 (padding invariance): a `PacketOut` whose OXM-free body
/// doesn't land on an 8-byte boundary on its own still round-trips once the
/// envelope's declared length accounts for any padding the codec adds.
#[test]
fn packet_out_round_trip_with_odd_sized_payload() {
    let payload = packet_out::PacketRepr::<Experimenter> {
        buffer_id: 0xffff_ffff,
        in_port: PortNumber::Controller,
        actions: Vec::new(),
        data: vec![0xaa, 0xbb, 0xcc],
    };
    let msg = Msg::PacketOut { xid: 99, payload };
    let mut bytes = vec![0u8; msg.buffer_len(Version::V1_3)];
    msg.emit(Version::V1_3, &mut bytes).unwrap();
    let decoded = Msg::parse(Version::V1_3, &bytes).unwrap();
    assert_eq!(decoded, msg);
}

/// Property 4 (OXM uniqueness): a match built from distinct field kinds
/// round-trips without the codec collapsing or duplicating any of them.
#[test]
fn flow_match_preserves_distinct_fields_without_duplication() {
    use ofchan::oxm::EthernetType;
    use smoltcp::wire::EthernetProtocol;

    let flow_match: FlowMatch<Experimenter> = FlowMatch(vec![
        Oxm::FlowMatchField(FlowMatchField::InPort(InPort::new(3))),
        Oxm::FlowMatchField(FlowMatchField::EthernetType(EthernetType::new(
            EthernetProtocol::Ipv4,
        ))),
    ]);
    let mut bytes = vec![0u8; flow_match.buffer_len()];
    flow_match.emit(&mut bytes).unwrap();
    let decoded = FlowMatch::<Experimenter>::parse(&bytes).unwrap();
    assert_eq!(decoded.0.len(), 2);

    let mut kinds: Vec<&'static str> = decoded
        .0
        .iter()
        .map(|oxm| match oxm {
            Oxm::FlowMatchField(FlowMatchField::InPort(_)) => "in_port",
            Oxm::FlowMatchField(FlowMatchField::EthernetType(_)) => "eth_type",
            _ => "other",
        })
        .collect();
    kinds.sort_unstable();
    kinds.dedup();
    assert_eq!(kinds.len(), 2, "decoded match lost or duplicated a field");
}

/// Disjoint matches (same field, non-intersecting values) never overlap;
/// a wildcarded field always does.
#[test]
fn flow_match_overlap_rules() {
    let has_port_3: FlowMatch<Experimenter> = FlowMatch(vec![Oxm::FlowMatchField(
        FlowMatchField::InPort(InPort::new(3)),
    )]);
    let has_port_4: FlowMatch<Experimenter> = FlowMatch(vec![Oxm::FlowMatchField(
        FlowMatchField::InPort(InPort::new(4)),
    )]);
    let wildcard: FlowMatch<Experimenter> = FlowMatch(Vec::new());

    assert!(!has_port_3.overlaps(&has_port_4).unwrap());
    assert!(has_port_3.overlaps(&wildcard).unwrap());
    assert!(wildcard.overlaps(&has_port_4).unwrap());
}
