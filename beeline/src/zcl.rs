//! The slice of the ZCL frame format the adapter needs: enough of the header
//! to correlate responses by transaction sequence number. Encoding commands
//! and interpreting payloads stays with the caller's cluster library.

use conbee::ClusterId;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FrameType {
    Global,
    ClusterSpecific,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Direction {
    ClientToServer,
    ServerToClient,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ZclHeader {
    pub frame_type: FrameType,
    pub manufacturer_code: Option<u16>,
    pub direction: Direction,
    pub disable_default_response: bool,
    pub transaction_sequence_number: u8,
    pub command_id: u8,
}

impl ZclHeader {
    /// Parses the header off the front of an ASDU. Returns `None` when the
    /// buffer is too short or the frame type bits are reserved.
    pub fn parse(data: &[u8]) -> Option<ZclHeader> {
        let control = *data.get(0)?;

        let frame_type = match control & 0b11 {
            0b00 => FrameType::Global,
            0b01 => FrameType::ClusterSpecific,
            _ => return None,
        };
        let manufacturer_specific = control & 0b100 != 0;
        let direction = if control & 0b1000 != 0 {
            Direction::ServerToClient
        } else {
            Direction::ClientToServer
        };
        let disable_default_response = control & 0b1_0000 != 0;

        let mut pos = 1;
        let manufacturer_code = if manufacturer_specific {
            let low = *data.get(pos)?;
            let high = *data.get(pos + 1)?;
            pos += 2;
            Some(u16::from_le_bytes([low, high]))
        } else {
            None
        };

        let transaction_sequence_number = *data.get(pos)?;
        let command_id = *data.get(pos + 1)?;

        Some(ZclHeader {
            frame_type,
            manufacturer_code,
            direction,
            disable_default_response,
            transaction_sequence_number,
            command_id,
        })
    }

    /// Header length in bytes; the command payload starts here.
    pub fn len(&self) -> usize {
        if self.manufacturer_code.is_some() {
            5
        } else {
            3
        }
    }
}

/// A caller-encoded ZCL frame, ready for the wire. The caller's command
/// table supplies `command_has_response`, which decides whether a unicast
/// send awaits the command's specific response.
#[derive(Clone, Debug)]
pub struct ZclFrame {
    pub header: ZclHeader,
    pub cluster_id: ClusterId,
    pub data: Vec<u8>,
    pub command_has_response: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_header() {
        let header = ZclHeader::parse(&[0x01, 0x2A, 0x07, 0xFF]).unwrap();
        assert_eq!(header.frame_type, FrameType::ClusterSpecific);
        assert_eq!(header.manufacturer_code, None);
        assert_eq!(header.direction, Direction::ClientToServer);
        assert!(!header.disable_default_response);
        assert_eq!(header.transaction_sequence_number, 0x2A);
        assert_eq!(header.command_id, 0x07);
        assert_eq!(header.len(), 3);
    }

    #[test]
    fn parses_manufacturer_specific_header() {
        let header = ZclHeader::parse(&[0b0001_1100, 0x5E, 0x11, 0x33, 0x01]).unwrap();
        assert_eq!(header.frame_type, FrameType::Global);
        assert_eq!(header.manufacturer_code, Some(0x115E));
        assert_eq!(header.direction, Direction::ServerToClient);
        assert!(header.disable_default_response);
        assert_eq!(header.transaction_sequence_number, 0x33);
        assert_eq!(header.command_id, 0x01);
        assert_eq!(header.len(), 5);
    }

    #[test]
    fn rejects_short_or_reserved_frames() {
        assert!(ZclHeader::parse(&[]).is_none());
        assert!(ZclHeader::parse(&[0x00, 0x01]).is_none());
        assert!(ZclHeader::parse(&[0b10, 0x01, 0x02]).is_none());
        // Manufacturer-specific header cut short.
        assert!(ZclHeader::parse(&[0b100, 0x01, 0x02, 0x03]).is_none());
    }
}
