use rosc::{OscMessage, OscPacket, decoder, encoder};

/// Serialization seam between the transport and the OSC wire format.
pub trait WireCodec: Send + Sync {
    fn encode(&self, message: &OscMessage) -> Result<Vec<u8>, String>;
    fn decode(&self, buf: &[u8]) -> Result<OscPacket, String>;
}

/// OSC 1.0 framing via `rosc`.
#[derive(Clone, Copy, Debug, Default)]
pub struct RoscCodec;

impl WireCodec for RoscCodec {
    fn encode(&self, message: &OscMessage) -> Result<Vec<u8>, String> {
        encoder::encode(&OscPacket::Message(message.clone())).map_err(|e| format!("{e:?}"))
    }

    fn decode(&self, buf: &[u8]) -> Result<OscPacket, String> {
        decoder::decode_udp(buf)
            .map(|(_, packet)| packet)
            .map_err(|e| format!("{e:?}"))
    }
}
