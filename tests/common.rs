use std::net::{SocketAddr, SocketAddrV4, UdpSocket};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use vac_capture_rust_lib::command::Command;
use vac_capture_rust_lib::config::{CaptureConfig, VideoFormat};
use vac_capture_rust_lib::{CONFIG_PACKET_SIZE, DATA_PACKET_SIZE};

pub fn data_packet(frame_number: u8, pixel_offset: u32) -> Vec<u8> {
    let mut packet = vec![0xAB; DATA_PACKET_SIZE];
    packet[0] = frame_number;
    packet[1..4].copy_from_slice(&pixel_offset.to_be_bytes()[1..4]);
    return packet;
}

pub fn config_packet() -> Vec<u8> {
    return vec![0x42; CONFIG_PACKET_SIZE];
}

pub fn engine_socket() -> UdpSocket {
    return UdpSocket::bind("127.0.0.1:0").unwrap();
}

/// A config with delays short enough for tests.
pub fn fast_config(camera: SocketAddrV4) -> CaptureConfig {
    let mut config = CaptureConfig::new(camera, VideoFormat::Format960x600);
    config.command_delay = Duration::from_millis(1);
    config.stop_settle_delay = Duration::from_millis(1);
    config.drain_settle_delay = Duration::from_millis(5);
    config.read_timeout = Duration::from_millis(300);
    return config;
}

/// Who a scripted datagram comes from.
pub enum Datagram {
    Camera(Vec<u8>),
    /// Sent from 127.0.0.2, so it never matches the camera's address.
    Stranger(Vec<u8>),
}

/// A camera on 127.0.0.1 that plays `script` at `engine` as soon as the
/// exposure is set, then waits for the closing stop command.
///
/// The handle yields every command the camera received.
pub fn spawn_camera(engine: SocketAddr, script: Vec<Datagram>) -> (SocketAddrV4, JoinHandle<Vec<Command>>) {
    let camera = UdpSocket::bind("127.0.0.1:0").unwrap();
    let stranger = UdpSocket::bind("127.0.0.2:0").unwrap();
    camera.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    let camera_addr = match camera.local_addr().unwrap() {
        SocketAddr::V4(addr) => addr,
        SocketAddr::V6(addr) => panic!("camera bound to {addr}"),
    };

    let handle = thread::spawn(move || {
        let mut commands = Vec::new();
        let mut script = Some(script);
        let mut buf = [0u8; 64];
        while let Ok((len, _)) = camera.recv_from(&mut buf) {
            let command = Command::from_bytes(&buf[..len]).expect("camera got a bad command");
            commands.push(command);
            if command == Command::STOP && commands.len() > 1 {
                break;
            }
            if command.opcode != 0xC0 {
                continue;
            }
            for datagram in script.take().unwrap_or_default() {
                match datagram {
                    Datagram::Camera(bytes) => camera.send_to(&bytes, engine).unwrap(),
                    Datagram::Stranger(bytes) => stranger.send_to(&bytes, engine).unwrap(),
                };
            }
        }
        return commands;
    });

    return (camera_addr, handle);
}
