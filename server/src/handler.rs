//! Session handler: one connection, one read loop
//!
//! The handler reads one line, decodes it, hands it to the [`Dispatcher`]
//! and writes the response before reading the next line. Requests on one
//! connection are therefore answered strictly in arrival order.
//!
//! A malformed line closes the connection without a reply; the stream is no
//! longer trusted to be in sync.

use crate::client_manager::ClientManager;
use crate::dispatcher::Dispatcher;
use crate::error::ServerError;
use crate::session::Session;
use futures_util::{SinkExt, StreamExt};
use log::{debug, warn};
use shared::{Request, Response};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tokio::sync::{watch, RwLock};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};

pub struct SessionHandler<S> {
    session: Session,
    reader: FramedRead<ReadHalf<S>, LinesCodec>,
    writer: FramedWrite<WriteHalf<S>, LinesCodec>,
    dispatcher: Arc<Dispatcher>,
    clients: Arc<RwLock<ClientManager>>,
    stop_rx: watch::Receiver<bool>,
}

impl<S> SessionHandler<S>
where
    S: AsyncRead + AsyncWrite,
{
    pub fn new(
        stream: S,
        session: Session,
        dispatcher: Arc<Dispatcher>,
        clients: Arc<RwLock<ClientManager>>,
        stop_rx: watch::Receiver<bool>,
        max_line_bytes: usize,
    ) -> Self {
        let (r, w) = tokio::io::split(stream);
        Self {
            session,
            reader: FramedRead::new(r, LinesCodec::new_with_max_length(max_line_bytes)),
            writer: FramedWrite::new(w, LinesCodec::new_with_max_length(max_line_bytes)),
            dispatcher,
            clients,
            stop_rx,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Writes one response line to the connection
    ///
    /// Returns `false` without finishing the write if the stop signal fires
    /// first; a peer that never reads can otherwise stall the write forever.
    pub async fn send(&mut self, response: &Response) -> Result<bool, ServerError> {
        tokio::select! {
            sent = self.writer.send(response.encode()) => {
                sent?;
                Ok(true)
            }
            _ = self.stop_rx.changed() => Ok(false),
        }
    }

    /// Runs the read loop until the peer closes, a read fails, a line cannot be
    /// decoded, or the stop signal fires
    ///
    /// The stop signal is honored both while waiting for a request and while
    /// a response is being written.
    ///
    /// Deregistration is left to the caller so it happens on every exit path.
    pub async fn run(mut self) -> Result<(), ServerError> {
        let client_id = self.session.client_id();

        loop {
            if *self.stop_rx.borrow() {
                debug!("Client {}: stop requested", client_id);
                break;
            }

            tokio::select! {
                changed = self.stop_rx.changed() => {
                    if changed.is_err() {
                        debug!("Client {}: stop handle dropped", client_id);
                        break;
                    }
                }
                line = self.reader.next() => {
                    let Some(line) = line else {
                        debug!("Client {}: peer closed connection", client_id);
                        break;
                    };
                    let line = line?;
                    let request = match Request::decode(&line) {
                        Ok(request) => request,
                        Err(e) => {
                            warn!("Client {}: closing after malformed request: {}", client_id, e);
                            return Err(e.into());
                        }
                    };

                    let response = self.handle(request).await;
                    if !self.send(&response).await? {
                        debug!("Client {}: stopped while writing", client_id);
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    async fn handle(&mut self, request: Request) -> Response {
        let before = self.session.username().map(str::to_string);
        let response = self.dispatcher.dispatch(request, &mut self.session).await;

        let after = self.session.username();
        if before.as_deref() != after {
            let username = after.map(str::to_string);
            self.clients
                .write()
                .await
                .set_username(self.session.client_id(), username);
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use tokio::io::AsyncWriteExt;
    use tokio_test::io::Builder;

    fn test_addr() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    fn registered() -> (Arc<RwLock<ClientManager>>, Session, watch::Receiver<bool>) {
        let mut manager = ClientManager::new(4);
        let (id, stop_rx) = manager.add_client(test_addr()).unwrap();
        (Arc::new(RwLock::new(manager)), Session::new(id), stop_rx)
    }

    #[tokio::test]
    async fn test_requests_answered_in_order() {
        let stream = Builder::new()
            .read(b"PING\n")
            .write(b"RESULT|true\n")
            .read(b"CREATE_ACCOUNT|alice|Secret1\n")
            .write(b"RESULT|true\n")
            .read(b"CREATE_ACCOUNT|alice|Secret1\n")
            .write(b"RESULT|false\n")
            .build();

        let (clients, session, stop_rx) = registered();
        let dispatcher = Arc::new(Dispatcher::default());
        let handler = SessionHandler::new(
            stream,
            session,
            Arc::clone(&dispatcher),
            clients,
            stop_rx,
            1024,
        );

        handler.run().await.unwrap();
        assert!(dispatcher.store().find_account("alice").await.is_some());
    }

    #[tokio::test]
    async fn test_malformed_line_closes_without_reply() {
        let stream = Builder::new()
            .read(b"PING\n")
            .write(b"RESULT|true\n")
            .read(b"GET_TODO|tok|not-a-number\n")
            .build();

        let (clients, session, stop_rx) = registered();
        let handler = SessionHandler::new(
            stream,
            session,
            Arc::new(Dispatcher::default()),
            clients,
            stop_rx,
            1024,
        );

        let result = handler.run().await;
        assert!(matches!(result, Err(ServerError::Protocol(_))));
    }

    #[tokio::test]
    async fn test_overlong_line_rejected() {
        let mut line = "PING|".to_string();
        line.push_str(&"x".repeat(64));
        line.push('\n');

        let stream = Builder::new().read(line.as_bytes()).build();

        let (clients, session, stop_rx) = registered();
        let handler = SessionHandler::new(
            stream,
            session,
            Arc::new(Dispatcher::default()),
            clients,
            stop_rx,
            16,
        );

        let result = handler.run().await;
        assert!(matches!(result, Err(ServerError::Line(_))));
    }

    #[tokio::test]
    async fn test_login_recorded_in_registry() {
        let dispatcher = Arc::new(Dispatcher::default());
        dispatcher
            .create_account("alice", "Secret1", &Session::new(0))
            .await;

        // Tokens are random, so drive the dispatch step directly
        let (clients, session, stop_rx) = registered();
        let client_id = session.client_id();
        let stream = Builder::new().build();
        let mut handler = SessionHandler::new(
            stream,
            session,
            dispatcher,
            Arc::clone(&clients),
            stop_rx,
            1024,
        );

        let response = handler
            .handle(Request::decode("LOGIN|alice|Secret1").unwrap())
            .await;
        assert!(response.success);
        assert!(handler.session().is_authenticated());

        let snapshot = clients.read().await.snapshot();
        assert_eq!(snapshot[0].id, client_id);
        assert_eq!(snapshot[0].username.as_deref(), Some("alice"));

        let token = response.data.unwrap();
        handler
            .handle(Request::Logout { token: Some(token) })
            .await;
        let snapshot = clients.read().await.snapshot();
        assert_eq!(snapshot[0].username, None);
    }

    #[tokio::test]
    async fn test_stop_signal_ends_loop() {
        let (clients, session, stop_rx) = registered();
        let client_id = session.client_id();

        // A peer that never sends anything
        let (server_side, _peer) = tokio::io::duplex(64);
        let handler = SessionHandler::new(
            server_side,
            session,
            Arc::new(Dispatcher::default()),
            Arc::clone(&clients),
            stop_rx,
            1024,
        );

        let task = tokio::spawn(handler.run());
        assert!(clients.read().await.stop_client(client_id));

        let result = tokio::time::timeout(std::time::Duration::from_secs(2), task)
            .await
            .expect("handler did not stop")
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_stop_signal_ends_blocked_write() {
        let (clients, session, stop_rx) = registered();
        let client_id = session.client_id();

        // A peer that floods requests and never reads the replies
        let (server_side, mut peer) = tokio::io::duplex(64);
        let handler = SessionHandler::new(
            server_side,
            session,
            Arc::new(Dispatcher::default()),
            Arc::clone(&clients),
            stop_rx,
            1024,
        );
        let task = tokio::spawn(handler.run());

        let flood = tokio::spawn(async move {
            for _ in 0..50 {
                if peer.write_all(b"PING\n").await.is_err() {
                    break;
                }
            }
            peer
        });
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(!task.is_finished());

        assert!(clients.read().await.stop_client(client_id));
        let result = tokio::time::timeout(std::time::Duration::from_secs(2), task)
            .await
            .expect("handler blocked in a write ignored the stop signal")
            .unwrap();
        assert!(result.is_ok());
        // Deregistration is the caller's job
        assert!(clients.read().await.contains(&client_id));

        drop(flood);
    }
}
