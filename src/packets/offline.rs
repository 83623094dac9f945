// Offline handshake messages. These predate the game protocol framing: one
// raw id byte, big-endian longs.

use serde::Serialize;

use crate::codec::{PacketReader, PacketWriter};
use crate::error::{CodecError, Result};
use crate::packet::{Framing, Packet};

pub const OFFLINE_MESSAGE_ID: [u8; 16] = [
    0x00, 0xff, 0xff, 0x00, 0xfe, 0xfe, 0xfe, 0xfe, 0xfd, 0xfd, 0xfd, 0xfd, 0x12, 0x34, 0x56, 0x78,
];

fn read_magic(r: &mut PacketReader<'_>) -> Result<()> {
    let magic = r.take(OFFLINE_MESSAGE_ID.len())?;
    if magic != OFFLINE_MESSAGE_ID {
        return Err(CodecError::invalid(
            "offline message id",
            format!("unexpected magic {:02x?}", magic),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UnconnectedPing {
    pub ping_time: i64,
    pub client_guid: i64,
}

impl Packet for UnconnectedPing {
    const ID: u32 = 0x01;
    const NAME: &'static str = "UnconnectedPing";
    const FRAMING: Framing = Framing::Legacy;

    fn encode_body(&self, w: &mut PacketWriter<'_>) -> Result<()> {
        w.write_i64_be(self.ping_time);
        w.write_bytes(&OFFLINE_MESSAGE_ID);
        w.write_i64_be(self.client_guid);
        Ok(())
    }

    fn decode_body(&mut self, r: &mut PacketReader<'_>) -> Result<()> {
        self.ping_time = r.read_i64_be()?;
        read_magic(r)?;
        self.client_guid = r.read_i64_be()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UnconnectedPong {
    pub ping_time: i64,
    pub server_guid: i64,
    /// MOTD string, `;`-separated (`MCPE;name;protocol;version;...`).
    pub server_name: String,
}

impl Packet for UnconnectedPong {
    const ID: u32 = 0x1c;
    const NAME: &'static str = "UnconnectedPong";
    const FRAMING: Framing = Framing::Legacy;

    fn encode_body(&self, w: &mut PacketWriter<'_>) -> Result<()> {
        w.write_i64_be(self.ping_time);
        w.write_i64_be(self.server_guid);
        w.write_bytes(&OFFLINE_MESSAGE_ID);
        w.write_fixed_string(&self.server_name)
    }

    fn decode_body(&mut self, r: &mut PacketReader<'_>) -> Result<()> {
        self.ping_time = r.read_i64_be()?;
        self.server_guid = r.read_i64_be()?;
        read_magic(r)?;
        self.server_name = r.read_fixed_string()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CodecContext;
    use crate::packet::{decode_packet, encode_packet};

    #[test]
    fn test_ping_layout() {
        let ctx = CodecContext::default();
        let packet = UnconnectedPing {
            ping_time: 0x0102,
            client_guid: -1,
        };
        let bytes = encode_packet(&packet, &ctx).unwrap();
        assert_eq!(bytes.len(), 1 + 8 + 16 + 8);
        assert_eq!(bytes[0], 0x01);
        assert_eq!(&bytes[1..9], &[0, 0, 0, 0, 0, 0, 1, 2]);
        assert_eq!(&bytes[9..25], &OFFLINE_MESSAGE_ID);

        let (decoded, report) = decode_packet::<UnconnectedPing>(&bytes, &ctx).unwrap();
        assert_eq!(decoded, packet);
        assert!(report.is_clean());
    }

    #[test]
    fn test_pong_server_name() {
        let ctx = CodecContext::default();
        let packet = UnconnectedPong {
            ping_time: 5,
            server_guid: 123456789,
            server_name: "MCPE;Relay;712;1.21.20;0;10;123456789;world;Survival;1;19132;19133;"
                .to_string(),
        };
        let bytes = encode_packet(&packet, &ctx).unwrap();
        assert_eq!(bytes[0], 0x1c);
        let name_len = packet.server_name.len() as u16;
        assert_eq!(&bytes[33..35], &name_len.to_be_bytes());
        let (decoded, _) = decode_packet::<UnconnectedPong>(&bytes, &ctx).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_bad_magic_rejected() {
        let ctx = CodecContext::default();
        let mut bytes = encode_packet(&UnconnectedPing::default(), &ctx).unwrap().to_vec();
        bytes[10] = 0;
        assert!(matches!(
            decode_packet::<UnconnectedPing>(&bytes, &ctx),
            Err(CodecError::InvalidValue { .. })
        ));
    }
}
