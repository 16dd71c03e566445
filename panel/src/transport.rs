// Copyright (C) 2026 Castpanel contributors
//
// This file is part of Castpanel.
//
// Castpanel is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// Castpanel is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with Castpanel.  If not, see <https://www.gnu.org/licenses/>.

use std::net::SocketAddr;
use std::sync::Arc;

use cast_proto::models::{CastCommand, ChannelMessage, SessionRequestMessage};
use cast_proto::packet::Packet;
use cast_proto::{read_packet, write_packet, APP_ID};
use log::{debug, trace, warn};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};

use crate::session::{SendError, SessionError, SessionEvent, SessionHandle, SessionTransport};

/// [SessionTransport] over one TCP connection to the receiver.
pub struct TcpTransport {
    addr: SocketAddr,
    writer: Option<Arc<Mutex<OwnedWriteHalf>>>,
}

impl TcpTransport {
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr, writer: None }
    }
}

#[async_trait::async_trait]
impl SessionTransport for TcpTransport {
    async fn request_session(
        &mut self,
    ) -> Result<(SessionHandle, mpsc::Receiver<SessionEvent>), SessionError> {
        let stream = TcpStream::connect(self.addr).await?;
        let (mut read_half, mut write_half) = stream.into_split();

        write_packet(
            &mut write_half,
            Packet::SessionRequest(SessionRequestMessage {
                app_id: APP_ID.to_owned(),
            }),
        )
        .await?;

        let granted = match read_packet(&mut read_half).await? {
            Packet::SessionGranted(granted) => granted,
            other => return Err(SessionError::UnexpectedPacket(format!("{other:?}"))),
        };

        debug!(
            "Receiver granted session {} on {}",
            granted.session_id, granted.namespace
        );

        let handle = SessionHandle {
            session_id: granted.session_id,
            namespace: granted.namespace,
            is_alive: true,
        };

        let (event_tx, event_rx) = mpsc::channel(4);
        let writer = Arc::new(Mutex::new(write_half));
        tokio::spawn(run_reader(
            read_half,
            Arc::clone(&writer),
            event_tx,
            handle.session_id.clone(),
        ));
        self.writer = Some(writer);

        Ok((handle, event_rx))
    }

    async fn send(
        &mut self,
        handle: &SessionHandle,
        command: &CastCommand,
    ) -> Result<(), SendError> {
        let writer = self.writer.as_ref().ok_or(SendError::NotConnected)?;
        let mut writer = writer.lock().await;

        write_packet(
            &mut *writer,
            Packet::Channel(ChannelMessage {
                namespace: handle.namespace.clone(),
                payload: command.clone(),
            }),
        )
        .await?;

        Ok(())
    }
}

/// Watch the session for termination and answer keep-alives.
///
/// One reader exists per established session; it owns the read half for
/// the connection's whole lifetime.
async fn run_reader(
    mut read_half: OwnedReadHalf,
    writer: Arc<Mutex<OwnedWriteHalf>>,
    event_tx: mpsc::Sender<SessionEvent>,
    session_id: String,
) {
    loop {
        let packet = match read_packet(&mut read_half).await {
            Ok(packet) => packet,
            Err(err) => {
                debug!("Session {session_id} connection closed: {err}");
                break;
            }
        };

        match packet {
            Packet::Ping => {
                let mut writer = writer.lock().await;
                if let Err(err) = write_packet(&mut *writer, Packet::Pong).await {
                    warn!("Failed to answer ping: {err}");
                    break;
                }
            }
            Packet::SessionUpdate(update) if !update.is_alive => {
                debug!("Session removed: {}", update.session_id);
                break;
            }
            Packet::SessionUpdate(update) => debug!("Session updated: {}", update.session_id),
            other => trace!("Unhandled packet: {other:?}"),
        }
    }

    if event_tx.send(SessionEvent::Terminated).await.is_err() {
        debug!("Session {session_id} terminated after its handle was dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cast_proto::models::{SessionGrantedMessage, SessionUpdateMessage};
    use cast_proto::CHANNEL_NAMESPACE;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn read_one_packet(stream: &mut TcpStream) -> Packet {
        let mut header_buf = [0u8; cast_proto::HEADER_BUFFER_SIZE];
        stream.read_exact(&mut header_buf).await.unwrap();
        let header = cast_proto::models::Header::decode(header_buf);
        let mut body = vec![0u8; header.size as usize];
        stream.read_exact(&mut body).await.unwrap();
        Packet::decode(header, std::str::from_utf8(&body).unwrap()).unwrap()
    }

    async fn grant_session(stream: &mut TcpStream, session_id: &str) {
        match read_one_packet(stream).await {
            Packet::SessionRequest(req) => assert_eq!(req.app_id, APP_ID),
            other => panic!("expected session request, got {other:?}"),
        }
        stream
            .write_all(
                &Packet::SessionGranted(SessionGrantedMessage {
                    session_id: session_id.to_owned(),
                    namespace: CHANNEL_NAMESPACE.to_owned(),
                })
                .encode(),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_session_request_and_send() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let receiver = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            grant_session(&mut stream, "s-1").await;
            read_one_packet(&mut stream).await
        });

        let mut transport = TcpTransport::new(addr);
        let (handle, _events) = transport.request_session().await.unwrap();
        assert_eq!(handle.session_id, "s-1");
        assert!(handle.is_alive);

        transport
            .send(
                &handle,
                &CastCommand::Load {
                    url: "http://localhost/preview".to_owned(),
                },
            )
            .await
            .unwrap();

        match receiver.await.unwrap() {
            Packet::Channel(msg) => {
                assert_eq!(msg.namespace, CHANNEL_NAMESPACE);
                assert_eq!(
                    msg.payload,
                    CastCommand::Load {
                        url: "http://localhost/preview".to_owned(),
                    },
                );
            }
            other => panic!("expected channel message, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_session_update_reports_termination() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            grant_session(&mut stream, "s-2").await;
            stream
                .write_all(
                    &Packet::SessionUpdate(SessionUpdateMessage {
                        session_id: "s-2".to_owned(),
                        is_alive: false,
                    })
                    .encode(),
                )
                .await
                .unwrap();
        });

        let mut transport = TcpTransport::new(addr);
        let (_handle, mut events) = transport.request_session().await.unwrap();

        assert_eq!(events.recv().await, Some(SessionEvent::Terminated));
    }
}
