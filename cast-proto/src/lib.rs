pub mod models;
pub mod packet;

use models::Header;
use packet::Packet;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Identity of the receiver application every session is opened against.
pub const APP_ID: &str = "81585E3E";

/// The one message channel used for application payloads.
pub const CHANNEL_NAMESPACE: &str = "urn:x-cast:com.castpanel.preview";

pub const HEADER_BUFFER_SIZE: usize = 5;
pub const MAX_BODY_SIZE: u32 = 32000 - 1;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed packet body: {0}")]
    MalformedBody(#[from] serde_json::Error),
    #[error("packet body is not valid UTF-8: {0}")]
    NotUtf8(#[from] std::string::FromUtf8Error),
    #[error("packet body too large ({0} bytes)")]
    BodyTooLarge(u32),
}

/// Attempt to read and decode one packet from `stream`.
pub async fn read_packet<R>(stream: &mut R) -> Result<Packet, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let mut header_buf: [u8; HEADER_BUFFER_SIZE] = [0; HEADER_BUFFER_SIZE];

    stream.read_exact(&mut header_buf).await?;

    let header = Header::decode(header_buf);

    if header.size > MAX_BODY_SIZE {
        return Err(ProtocolError::BodyTooLarge(header.size));
    }

    let mut body_string = String::new();

    if header.size > 0 {
        let mut body_buf = vec![0; header.size as usize];
        stream.read_exact(&mut body_buf).await?;
        body_string = String::from_utf8(body_buf)?;
    }

    Packet::decode(header, &body_string)
}

pub async fn write_packet<W>(stream: &mut W, packet: Packet) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    let bytes = packet.encode();
    stream.write_all(&bytes).await?;
    Ok(())
}
