// Copyright 2024 Dalton Durst and the drc-sim-rust contributors
// SPDX-License-Identifier: MPL-2.0

use crate::incoming_packet_parser::{parse_data_header, DataHeader};
use crate::{DATA_PACKET_SIZE, SLOT_SIZE};

/// The marker byte at the start of every slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketKind {
    Data = 0,
    Config = 1,
}

impl PacketKind {
    pub fn from_marker(marker: u8) -> Option<PacketKind> {
        return match marker {
            0 => Some(PacketKind::Data),
            1 => Some(PacketKind::Config),
            _ => None,
        };
    }
}

/// A read-only view of one slot.
#[derive(Debug, Clone, Copy)]
pub struct Slot<'a> {
    bytes: &'a [u8; SLOT_SIZE],
}

impl<'a> Slot<'a> {
    pub fn marker(&self) -> u8 {
        return self.bytes[0];
    }

    pub fn kind(&self) -> Option<PacketKind> {
        return PacketKind::from_marker(self.marker());
    }

    /// The stored datagram, always the full data packet width. Config
    /// packets only use the first 48 bytes.
    pub fn payload(&self) -> &'a [u8] {
        return &self.bytes[1..];
    }

    /// The frame number and pixel offset, for data slots only.
    pub fn data_header(&self) -> Option<DataHeader> {
        if self.kind() != Some(PacketKind::Data) {
            return None;
        }
        return parse_data_header(self.payload());
    }
}

/// Caller-allocated output of a capture: a fixed number of slots, each a
/// marker byte followed by one datagram.
///
/// Slot `i` holds the `i`-th accepted packet in arrival order. Nothing
/// about frame or pixel position is implied by the index. The in-memory
/// layout is the same as the on-wire dump, so `as_bytes` can be handed
/// straight to existing consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketBuffer {
    slots: Vec<[u8; SLOT_SIZE]>,
}

impl PacketBuffer {
    pub fn new(slot_count: usize) -> PacketBuffer {
        return PacketBuffer {
            slots: vec![[0u8; SLOT_SIZE]; slot_count],
        };
    }

    /// Rebuilds a buffer from a dump written by `as_bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Option<PacketBuffer> {
        if bytes.len() % SLOT_SIZE != 0 {
            return None;
        }
        let mut slots = Vec::with_capacity(bytes.len() / SLOT_SIZE);
        for chunk in bytes.chunks_exact(SLOT_SIZE) {
            let mut slot = [0u8; SLOT_SIZE];
            slot.copy_from_slice(chunk);
            slots.push(slot);
        }
        return Some(PacketBuffer { slots });
    }

    pub fn len(&self) -> usize {
        return self.slots.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.slots.is_empty();
    }

    pub fn slot(&self, index: usize) -> Option<Slot<'_>> {
        return self.slots.get(index).map(|bytes| Slot { bytes });
    }

    /// Iterates over the first `count` slots, or all of them if there
    /// are fewer.
    pub fn filled(&self, count: usize) -> impl Iterator<Item = Slot<'_>> {
        return self.slots.iter().take(count).map(|bytes| Slot { bytes });
    }

    /// Marks every slot as a data slot again. Payload bytes are left as
    /// they are.
    pub fn reset_markers(&mut self) {
        for slot in self.slots.iter_mut() {
            slot[0] = PacketKind::Data as u8;
        }
    }

    /// Stores `datagram` in slot `index`. Bytes past the end of the
    /// datagram are zeroed. Returns false if the slot doesn't exist or
    /// the datagram is wider than a slot.
    pub fn store(&mut self, index: usize, kind: PacketKind, datagram: &[u8]) -> bool {
        if datagram.len() > DATA_PACKET_SIZE {
            return false;
        }
        let slot = match self.slots.get_mut(index) {
            Some(slot) => slot,
            None => return false,
        };
        slot[0] = kind as u8;
        let (used, unused) = slot[1..].split_at_mut(datagram.len());
        used.copy_from_slice(datagram);
        unused.fill(0);
        return true;
    }

    pub fn as_bytes(&self) -> &[u8] {
        return self.slots.as_flattened();
    }
}
