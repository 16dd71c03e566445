use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Eq)]
pub enum Opcode {
    None = 0,
    SessionRequest,
    SessionGranted,
    SessionUpdate,
    ChannelMessage,
    Ping,
    Pong,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Header {
    pub size: u32,
    pub opcode: Opcode,
}

/// Command sent to the receiver application on the preview channel.
///
/// Serializes to `{"type":"load","url":...}`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CastCommand {
    Load { url: String },
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SessionRequestMessage {
    pub app_id: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SessionGrantedMessage {
    pub session_id: String,
    pub namespace: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SessionUpdateMessage {
    pub session_id: String,
    pub is_alive: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ChannelMessage {
    pub namespace: String,
    #[serde(flatten)]
    pub payload: CastCommand,
}

impl From<u8> for Opcode {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::SessionRequest,
            2 => Self::SessionGranted,
            3 => Self::SessionUpdate,
            4 => Self::ChannelMessage,
            5 => Self::Ping,
            6 => Self::Pong,
            _ => Self::None,
        }
    }
}

impl From<&Opcode> for u8 {
    fn from(value: &Opcode) -> Self {
        match value {
            Opcode::SessionRequest => 1,
            Opcode::SessionGranted => 2,
            Opcode::SessionUpdate => 3,
            Opcode::ChannelMessage => 4,
            Opcode::Ping => 5,
            Opcode::Pong => 6,
            _ => 0,
        }
    }
}

impl Header {
    pub fn new(opcode: Opcode, size: u32) -> Self {
        Self {
            size: size + 1,
            opcode,
        }
    }

    pub fn decode(buf: [u8; 5]) -> Self {
        Self {
            size: u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) - 1,
            opcode: Opcode::from(buf[4]),
        }
    }

    pub fn encode(&self) -> [u8; 5] {
        let size_slice = u32::to_le_bytes(self.size);
        [
            size_slice[0],
            size_slice[1],
            size_slice[2],
            size_slice[3],
            (&self.opcode).into(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use crate::models::{CastCommand, Header, Opcode};

    #[test]
    fn test_header_encode() {
        assert_eq!(Header::new(Opcode::Ping, 0).encode(), [1, 0, 0, 0, 5]);
        assert_eq!(
            Header::new(Opcode::ChannelMessage, 200).encode(),
            [201, 0, 0, 0, 4],
        );
        assert_eq!(Header::new(Opcode::None, 0).encode(), [1, 0, 0, 0, 0]);
    }

    #[test]
    fn test_header_decode() {
        assert_eq!(
            Header::decode([201, 0, 0, 0, 4]),
            Header {
                size: 200,
                opcode: Opcode::ChannelMessage,
            },
        );
        assert_eq!(Header::decode([1, 0, 0, 0, 255]).opcode, Opcode::None);
    }

    #[test]
    fn test_load_command_wire_shape() {
        let command = CastCommand::Load {
            url: "http://example.com/preview/1".to_owned(),
        };
        assert_eq!(
            serde_json::to_value(&command).unwrap(),
            serde_json::json!({
                "type": "load",
                "url": "http://example.com/preview/1",
            }),
        );
    }
}
