//! Wire framing for Blackstar ID amplifiers.
//!
//! The amp speaks fixed-size 64-byte USB interrupt packets:
//! - Control write: `0x03, <control id>, 0x00, <payload length>, <value...>`
//! - Delay time carries a two-byte little-endian value; every other control
//!   is a single byte
//! - Preset recall: `0x02, 0x4D, <preset number>, 0x00`

use crate::controls::DELAY_TIME_ID;

/// Every packet on the interrupt endpoint is this size, zero-padded.
pub(crate) const PACKET_SIZE: usize = 64;

const OP_PRESET: u8 = 0x02;
const OP_CONTROL: u8 = 0x03;
const PRESET_SELECT: u8 = 0x4D;

/// Packet setting one control to a value within its limits.
pub(crate) fn control_packet(id: u8, value: i32) -> [u8; PACKET_SIZE] {
    let mut packet = [0u8; PACKET_SIZE];
    packet[0] = OP_CONTROL;
    packet[1] = id;
    if id == DELAY_TIME_ID {
        packet[3] = 0x02;
        packet[4] = (value & 0xFF) as u8;
        packet[5] = ((value >> 8) & 0xFF) as u8;
    } else {
        packet[3] = 0x01;
        packet[4] = value as u8;
    }
    packet
}

/// Packet recalling a stored preset (1-128).
pub(crate) fn preset_packet(preset: u8) -> [u8; PACKET_SIZE] {
    let mut packet = [0u8; PACKET_SIZE];
    packet[0] = OP_PRESET;
    packet[1] = PRESET_SELECT;
    packet[2] = preset;
    packet
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_packet_layout() {
        let packet = control_packet(0x03, 100);
        assert_eq!(&packet[..5], &[0x03, 0x03, 0x00, 0x01, 100]);
        assert!(packet[5..].iter().all(|&b| b == 0));
    }

    #[test]
    fn delay_time_is_two_bytes_little_endian() {
        let packet = control_packet(DELAY_TIME_ID, 2000);
        assert_eq!(
            &packet[..6],
            &[0x03, DELAY_TIME_ID, 0x00, 0x02, 0xD0, 0x07]
        );
    }

    #[test]
    fn preset_packet_layout() {
        let packet = preset_packet(42);
        assert_eq!(&packet[..4], &[0x02, 0x4D, 42, 0x00]);
        assert!(packet[4..].iter().all(|&b| b == 0));
    }

    #[test]
    fn packets_are_padded_to_full_size() {
        assert_eq!(control_packet(0x01, 1).len(), PACKET_SIZE);
        assert_eq!(preset_packet(1).len(), PACKET_SIZE);
    }
}
