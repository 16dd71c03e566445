use cast_proto::models::CastCommand;
use log::{debug, warn};
use thiserror::Error;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, oneshot};

/// Established connection to one receiver application instance.
///
/// Lifecycle: none -> pending -> established -> invalidated. Owned
/// exclusively by the broker; at most one handle is live at a time.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    pub session_id: String,
    pub namespace: String,
    pub is_alive: bool,
}

#[derive(Debug, PartialEq, Eq)]
pub enum SessionEvent {
    Terminated,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to reach receiver: {0}")]
    Io(#[from] std::io::Error),
    #[error("protocol error during session setup: {0}")]
    Protocol(#[from] cast_proto::ProtocolError),
    #[error("receiver answered session request with {0}")]
    UnexpectedPacket(String),
}

#[derive(Debug, Error)]
pub enum SendError {
    #[error("no session to send on")]
    NotConnected,
    #[error("failed to deliver message: {0}")]
    Protocol(#[from] cast_proto::ProtocolError),
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("could not establish session: {0}")]
    Session(#[from] SessionError),
    #[error("could not deliver command: {0}")]
    Send(#[from] SendError),
    #[error("session broker is gone")]
    BrokerUnavailable,
}

#[async_trait::async_trait]
pub trait SessionTransport {
    /// Establish a new session with the receiver application.
    ///
    /// The returned channel reports termination of exactly this session;
    /// it is created once per handle and discarded with it.
    async fn request_session(
        &mut self,
    ) -> Result<(SessionHandle, mpsc::Receiver<SessionEvent>), SessionError>;

    async fn send(
        &mut self,
        handle: &SessionHandle,
        command: &CastCommand,
    ) -> Result<(), SendError>;
}

#[derive(Debug)]
pub enum BrokerMessage {
    Dispatch {
        command: CastCommand,
        reply: oneshot::Sender<Result<(), DispatchError>>,
    },
    Quit,
}

/// Run the session broker until [BrokerMessage::Quit] or channel close.
pub async fn broker<T>(mut transport: T, mut msg_rx: mpsc::Receiver<BrokerMessage>)
where
    T: SessionTransport + Send,
{
    let mut session: Option<(SessionHandle, mpsc::Receiver<SessionEvent>)> = None;

    while let Some(msg) = msg_rx.recv().await {
        match msg {
            BrokerMessage::Dispatch { command, reply } => {
                let result = dispatch(&mut transport, &mut session, command).await;
                if reply.send(result).is_err() {
                    warn!("Dispatch reply receiver dropped");
                }
            }
            BrokerMessage::Quit => break,
        }
    }

    debug!("Session broker terminated");
}

/// Reuse the live session or establish one, then send the command.
///
/// Termination notices are drained right before the reuse check, so the
/// validity check and the send act as one step: a command is never sent on
/// a handle the broker already knows is dead.
async fn dispatch<T>(
    transport: &mut T,
    session: &mut Option<(SessionHandle, mpsc::Receiver<SessionEvent>)>,
    command: CastCommand,
) -> Result<(), DispatchError>
where
    T: SessionTransport + Send,
{
    if let Some((handle, events)) = session.as_mut() {
        loop {
            match events.try_recv() {
                Ok(SessionEvent::Terminated) | Err(TryRecvError::Disconnected) => {
                    handle.is_alive = false;
                    break;
                }
                Err(TryRecvError::Empty) => break,
            }
        }

        if !handle.is_alive {
            debug!("Session {} is gone, discarding handle", handle.session_id);
            *session = None;
        }
    }

    if session.is_none() {
        let (handle, events) = transport.request_session().await?;
        debug!("Session established: {}", handle.session_id);
        *session = Some((handle, events));
    }

    let (handle, _) = session.as_ref().ok_or(DispatchError::BrokerUnavailable)?;

    transport.send(handle, &command).await?;

    Ok(())
}
