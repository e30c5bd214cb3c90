/**
 * WebSocket Session Endpoint
 *
 * One WebSocket per connected user: the control channel that carries the
 * line-oriented wire protocol. Each connection gets a `Session` in the
 * document's broker, plus a sender task that drains the session's queue
 * onto the socket.
 *
 * # Tasks
 *
 * The connection splits into two halves:
 * - the reader half parses inbound control frames under the document
 *   lock (`useractive`, `userinactive`, `dummymsg`, `status`,
 *   `disconnect`),
 * - the sender task loops on dequeue/wait and owns the write half, so
 *   slow sockets back up only their own queue.
 *
 * # Teardown
 *
 * When the reader ends (close frame or transport error) the queue is
 * stopped, the session removed from its broker, and the document dropped
 * from the registry if this was its last session.
 */
use std::ops::ControlFlow;
use std::sync::Arc;

use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::backend::doc::{DocumentAccessor, DocumentBroker, DocumentRegistry};
use crate::backend::error::BackendError;
use crate::backend::session::queue::SenderQueue;
use crate::shared::protocol::tokenize;
use crate::shared::{Command, Frame, OutboundMessage};

/// Upgrade handler for `GET /ws/{doc_id}`.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(doc_id): Path<String>,
    State(documents): State<DocumentRegistry>,
) -> Result<Response, BackendError> {
    if doc_id.is_empty() || doc_id.len() > 200 || doc_id.contains('/') {
        return Err(BackendError::handler(
            StatusCode::BAD_REQUEST,
            "invalid document id",
        ));
    }

    Ok(ws.on_upgrade(move |socket| handle_session(socket, doc_id, documents)))
}

/// Run one connection's session until the peer goes away.
async fn handle_session(socket: WebSocket, doc_id: String, documents: DocumentRegistry) {
    let broker = documents.get_or_create(&doc_id).await;
    let queue = Arc::new(SenderQueue::new());
    let (session_id, view_id) = broker.lock().await.add_session(queue.clone());

    let (mut ws_tx, mut ws_rx) = socket.split();

    // Sender task: drain the queue onto the socket until stopped.
    let sender_queue = queue.clone();
    let sender = tokio::spawn(async move {
        loop {
            while let Some(message) = sender_queue.dequeue() {
                let result = match message.into_frame() {
                    Frame::Text(line) => ws_tx.send(WsMessage::Text(line.into())).await,
                    Frame::Binary(bytes) => ws_tx.send(WsMessage::Binary(bytes)).await,
                };
                if result.is_err() {
                    tracing::debug!(session = %session_id, "peer gone, sender exiting");
                    return;
                }
            }
            if sender_queue.is_stopping() {
                return;
            }
            sender_queue.wait().await;
        }
    });

    // Reader loop.
    while let Some(received) = ws_rx.next().await {
        let message = match received {
            Ok(message) => message,
            Err(err) => {
                tracing::debug!(session = %session_id, %err, "websocket read error");
                break;
            }
        };
        match message {
            WsMessage::Text(text) => {
                if handle_client_frame(&broker, session_id, text.as_str())
                    .await
                    .is_break()
                {
                    break;
                }
            }
            WsMessage::Close(_) => {
                broker.lock().await.mark_closing(session_id);
                break;
            }
            // Binary input and pings carry no session commands.
            _ => {}
        }
    }

    queue.stop();
    broker.lock().await.remove_session(session_id);
    documents.remove_if_empty(&doc_id).await;
    let _ = sender.await;
    tracing::info!(doc = %doc_id, session = %session_id, view_id, "connection closed");
}

/// Process one inbound control frame under the document lock.
async fn handle_client_frame(
    broker: &Arc<Mutex<DocumentBroker>>,
    session_id: Uuid,
    line: &str,
) -> ControlFlow<()> {
    let tokens = tokenize(line);
    let Some(&command) = tokens.first() else {
        return ControlFlow::Continue(());
    };

    let mut broker = broker.lock().await;
    let idle_ms = broker.touch(session_id);

    match command {
        "useractive" => {
            if let Some(idle_ms) = idle_ms {
                tracing::debug!(session = %session_id, idle_ms, "user active again");
            }
            broker.set_session_active(session_id, true);
        }
        "userinactive" => {
            broker.set_session_active(session_id, false);
        }
        // Activity keep-alive from view-only clients; touching above is
        // the whole effect.
        "dummymsg" => {}
        "disconnect" => {
            broker.mark_closing(session_id);
            return ControlFlow::Break(());
        }
        "status" => {
            if let Some(session) = broker.session(session_id) {
                let info = broker.info();
                let payload = format!(
                    "type={} parts={} current={} viewid={}",
                    info.kind.as_str(),
                    info.part_count(),
                    info.current_part(),
                    session.view_id().unwrap_or(-1),
                );
                session
                    .queue()
                    .enqueue(OutboundMessage::text(Command::Status, payload));
            }
        }
        unknown => {
            tracing::debug!(session = %session_id, command = unknown, "unknown command");
            if let Some(session) = broker.session(session_id) {
                session.queue().enqueue(OutboundMessage::text(
                    Command::Error,
                    format!("cmd={} kind=unknowncommand", unknown),
                ));
            }
        }
    }

    ControlFlow::Continue(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::doc::DocumentKind;

    async fn broker_with_session() -> (Arc<Mutex<DocumentBroker>>, Uuid, Arc<SenderQueue>) {
        let broker = Arc::new(Mutex::new(DocumentBroker::new(
            "budget.ods",
            DocumentKind::Spreadsheet,
        )));
        let queue = Arc::new(SenderQueue::new());
        let (session_id, _) = broker.lock().await.add_session(queue.clone());
        (broker, session_id, queue)
    }

    #[tokio::test]
    async fn test_unknown_command_produces_error_frame() {
        let (broker, session_id, queue) = broker_with_session().await;
        let flow = handle_client_frame(&broker, session_id, "fly to=the moon").await;
        assert!(flow.is_continue());

        let msg = queue.dequeue().unwrap();
        assert_eq!(msg.first_line(), "error: cmd=fly kind=unknowncommand");
    }

    #[tokio::test]
    async fn test_status_frame_describes_document() {
        let (broker, session_id, queue) = broker_with_session().await;
        broker.lock().await.set_part_count(3);
        let _ = handle_client_frame(&broker, session_id, "status").await;

        let msg = queue.dequeue().unwrap();
        assert_eq!(
            msg.first_line(),
            "status: type=spreadsheet parts=3 current=0 viewid=0"
        );
    }

    #[tokio::test]
    async fn test_user_inactive_then_active_round_trip() {
        let (broker, session_id, queue) = broker_with_session().await;
        let _ = handle_client_frame(&broker, session_id, "userinactive").await;

        broker.lock().await.broadcast_event(crate::shared::EngineEvent::new(
            crate::shared::EventType::InvalidateTiles,
            "0,0,10,10,0",
        ));
        assert_eq!(queue.size(), 0);

        let _ = handle_client_frame(&broker, session_id, "useractive").await;
        // curpart + setpart + replayed invalidation for the spreadsheet.
        assert_eq!(queue.size(), 3);
    }

    #[tokio::test]
    async fn test_dummymsg_only_touches() {
        let (broker, session_id, queue) = broker_with_session().await;
        let _ = handle_client_frame(&broker, session_id, "dummymsg").await;
        assert_eq!(queue.size(), 0);
    }

    #[tokio::test]
    async fn test_disconnect_breaks_and_suppresses_callbacks() {
        let (broker, session_id, queue) = broker_with_session().await;
        let flow = handle_client_frame(&broker, session_id, "disconnect").await;
        assert!(flow.is_break());

        broker.lock().await.broadcast_event(crate::shared::EngineEvent::new(
            crate::shared::EventType::TextSelection,
            "1,2,3,4",
        ));
        assert_eq!(queue.size(), 0);
    }

    #[tokio::test]
    async fn test_empty_frame_is_ignored() {
        let (broker, session_id, queue) = broker_with_session().await;
        let _ = handle_client_frame(&broker, session_id, "   ").await;
        assert_eq!(queue.size(), 0);
    }
}
