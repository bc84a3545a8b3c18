use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use proptest::prelude::*;
use vac_capture_rust_lib::command::{send_command, Command, COMMAND_SIZE};

#[test]
fn stop_bytes() {
    assert_eq!(Command::STOP.to_bytes(), [0x5A, 0x00, 0, 0, 0, 0, 0, 0x5A]);
}

#[test]
fn start_sets_stream_flag() {
    assert_eq!(Command::start(1).to_bytes(), [0x5A, 0x81, 0, 0, 0, 0, 0, 0xDB]);
    assert_eq!(Command::start(3).payload, 0x83);
}

#[test]
fn exposure_checksum_wraps() {
    assert_eq!(
        Command::set_exposure(0xBE).to_bytes(),
        [0xC0, 0xBE, 0, 0, 0, 0, 0, 0x7E]
    );
}

#[test]
fn from_bytes_rejects_damaged_commands() {
    let mut bytes = Command::set_exposure(5).to_bytes();
    assert_eq!(Command::from_bytes(&bytes), Some(Command::set_exposure(5)));

    bytes[7] = bytes[7].wrapping_add(1);
    assert_eq!(Command::from_bytes(&bytes), None);

    let mut padded = Command::STOP.to_bytes();
    padded[4] = 1;
    assert_eq!(Command::from_bytes(&padded), None);

    assert_eq!(Command::from_bytes(&Command::STOP.to_bytes()[..7]), None);
}

#[test]
fn send_command_reaches_camera() {
    let camera = UdpSocket::bind("127.0.0.1:0").unwrap();
    camera.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    let camera_addr = match camera.local_addr().unwrap() {
        SocketAddr::V4(addr) => addr,
        SocketAddr::V6(addr) => panic!("camera bound to {addr}"),
    };
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();

    send_command(&socket, camera_addr, Command::start(0), Duration::from_millis(1)).unwrap();

    let mut buf = [0u8; 32];
    let (len, _) = camera.recv_from(&mut buf).unwrap();
    assert_eq!(len, COMMAND_SIZE);
    assert_eq!(Command::from_bytes(&buf[..len]), Some(Command::start(0)));
}

proptest! {
    #[test]
    fn checksum_is_sum_of_first_two_bytes(opcode: u8, payload: u8) {
        let bytes = Command { opcode, payload }.to_bytes();
        prop_assert_eq!(bytes[7], ((bytes[0] as u16 + bytes[1] as u16) % 256) as u8);
        prop_assert_eq!(&bytes[2..7], &[0u8; 5][..]);
        prop_assert_eq!(Command::from_bytes(&bytes), Some(Command { opcode, payload }));
    }
}
