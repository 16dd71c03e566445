use serde::Serialize;

use crate::models::{
    CastCommand, ChannelMessage, Header, Opcode, SessionGrantedMessage, SessionRequestMessage,
    SessionUpdateMessage,
};
use crate::ProtocolError;

#[derive(Debug, Clone)]
pub enum Packet {
    None,
    SessionRequest(SessionRequestMessage),
    SessionGranted(SessionGrantedMessage),
    SessionUpdate(SessionUpdateMessage),
    Channel(ChannelMessage),
    Ping,
    Pong,
}

fn encode_with_body(opcode: Opcode, body: &impl Serialize) -> Vec<u8> {
    // Serialization of our own message types cannot fail
    let body = serde_json::to_string(body).unwrap_or_default();
    let header = Header::new(opcode, body.len() as u32);
    let mut bytes = Vec::with_capacity(crate::HEADER_BUFFER_SIZE + body.len());
    bytes.extend_from_slice(&header.encode());
    bytes.extend_from_slice(body.as_bytes());
    bytes
}

impl Packet {
    pub fn opcode(&self) -> Opcode {
        match self {
            Packet::None => Opcode::None,
            Packet::SessionRequest(_) => Opcode::SessionRequest,
            Packet::SessionGranted(_) => Opcode::SessionGranted,
            Packet::SessionUpdate(_) => Opcode::SessionUpdate,
            Packet::Channel(_) => Opcode::ChannelMessage,
            Packet::Ping => Opcode::Ping,
            Packet::Pong => Opcode::Pong,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        match self {
            Packet::SessionRequest(msg) => encode_with_body(Opcode::SessionRequest, msg),
            Packet::SessionGranted(msg) => encode_with_body(Opcode::SessionGranted, msg),
            Packet::SessionUpdate(msg) => encode_with_body(Opcode::SessionUpdate, msg),
            Packet::Channel(msg) => encode_with_body(Opcode::ChannelMessage, msg),
            _ => Header::new(self.opcode(), 0).encode().to_vec(),
        }
    }

    pub fn decode(header: Header, body: &str) -> Result<Self, ProtocolError> {
        Ok(match header.opcode {
            Opcode::None => Self::None,
            Opcode::SessionRequest => Self::SessionRequest(serde_json::from_str(body)?),
            Opcode::SessionGranted => Self::SessionGranted(serde_json::from_str(body)?),
            Opcode::SessionUpdate => Self::SessionUpdate(serde_json::from_str(body)?),
            Opcode::ChannelMessage => Self::Channel(serde_json::from_str(body)?),
            Opcode::Ping => Self::Ping,
            Opcode::Pong => Self::Pong,
        })
    }
}

impl From<CastCommand> for Packet {
    fn from(payload: CastCommand) -> Self {
        Self::Channel(ChannelMessage {
            namespace: crate::CHANNEL_NAMESPACE.to_owned(),
            payload,
        })
    }
}
