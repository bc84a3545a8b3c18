use vac_capture_rust_lib::packet_buffer::{PacketBuffer, PacketKind};
use vac_capture_rust_lib::{DATA_PACKET_SIZE, SLOT_SIZE};

mod common;

#[test]
fn new_buffer_is_zeroed() {
    let buffer = PacketBuffer::new(3);
    assert_eq!(buffer.len(), 3);
    assert_eq!(buffer.as_bytes().len(), 3 * SLOT_SIZE);
    assert!(buffer.as_bytes().iter().all(|byte| *byte == 0));
}

#[test]
fn slots_are_bounds_checked() {
    let mut buffer = PacketBuffer::new(2);
    assert!(buffer.slot(1).is_some());
    assert!(buffer.slot(2).is_none());
    assert!(!buffer.store(2, PacketKind::Data, &common::data_packet(1, 0)));
    assert!(!buffer.store(0, PacketKind::Data, &vec![0u8; DATA_PACKET_SIZE + 1]));
}

#[test]
fn store_keeps_wire_layout() {
    let mut buffer = PacketBuffer::new(2);
    let data = common::data_packet(4, 1468);
    assert!(buffer.store(1, PacketKind::Data, &data));

    let bytes = buffer.as_bytes();
    assert_eq!(bytes[SLOT_SIZE], 0);
    assert_eq!(&bytes[SLOT_SIZE + 1..], &data[..]);

    let header = buffer.slot(1).unwrap().data_header().unwrap();
    assert_eq!(header.frame_number, 4);
    assert_eq!(header.pixel_offset.value(), 1468);
}

#[test]
fn config_store_clears_the_rest_of_the_slot() {
    let mut buffer = PacketBuffer::new(1);
    assert!(buffer.store(0, PacketKind::Data, &common::data_packet(1, 0)));
    assert!(buffer.store(0, PacketKind::Config, &common::config_packet()));

    let slot = buffer.slot(0).unwrap();
    assert_eq!(slot.kind(), Some(PacketKind::Config));
    assert_eq!(&slot.payload()[..48], &common::config_packet()[..]);
    assert!(slot.payload()[48..].iter().all(|byte| *byte == 0));
}

#[test]
fn reset_markers_only_touches_markers() {
    let mut buffer = PacketBuffer::new(2);
    assert!(buffer.store(0, PacketKind::Config, &common::config_packet()));
    buffer.reset_markers();

    let slot = buffer.slot(0).unwrap();
    assert_eq!(slot.kind(), Some(PacketKind::Data));
    assert_eq!(&slot.payload()[..48], &common::config_packet()[..]);
}

#[test]
fn dump_reloads() {
    let mut buffer = PacketBuffer::new(3);
    assert!(buffer.store(0, PacketKind::Data, &common::data_packet(1, 0)));
    assert!(buffer.store(1, PacketKind::Config, &common::config_packet()));

    let reloaded = PacketBuffer::from_bytes(buffer.as_bytes()).unwrap();
    assert_eq!(reloaded, buffer);
    assert_eq!(reloaded.filled(2).count(), 2);
    assert_eq!(PacketBuffer::from_bytes(&buffer.as_bytes()[1..]), None);
}

#[test]
fn unknown_marker_has_no_kind() {
    let mut bytes = vec![0u8; SLOT_SIZE];
    bytes[0] = 9;
    let buffer = PacketBuffer::from_bytes(&bytes).unwrap();
    let slot = buffer.slot(0).unwrap();
    assert_eq!(slot.kind(), None);
    assert_eq!(slot.data_header(), None);
}
