//! Client side of the line protocol

use futures_util::{SinkExt, StreamExt};
use log::debug;
use shared::{Priority, ProtocolError, Request, Response, ToDoId};
use std::io;
use thiserror::Error;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec, LinesCodecError};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to connect: {0}")]
    Connect(#[source] io::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("line framing error: {0}")]
    Line(#[from] LinesCodecError),
    #[error("malformed response: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("server closed the connection")]
    Closed,
}

/// One connection to the to-do server
///
/// Requests are answered in order, so each call sends one line and waits for
/// the matching response line.
pub struct Connection {
    reader: FramedRead<OwnedReadHalf, LinesCodec>,
    writer: FramedWrite<OwnedWriteHalf, LinesCodec>,
}

impl Connection {
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr).await.map_err(ClientError::Connect)?;
        let (r, w) = stream.into_split();
        Ok(Self {
            reader: FramedRead::new(r, LinesCodec::new()),
            writer: FramedWrite::new(w, LinesCodec::new()),
        })
    }

    /// Sends a raw line and returns the raw reply line
    pub async fn send_line(&mut self, line: &str) -> Result<String, ClientError> {
        self.writer.send(line).await?;
        match self.reader.next().await {
            Some(reply) => Ok(reply?),
            None => Err(ClientError::Closed),
        }
    }

    /// Sends a request and decodes the reply
    pub async fn request(&mut self, request: &Request) -> Result<Response, ClientError> {
        debug!("Sending {}", request.kind());
        let reply = self.send_line(&request.encode()).await?;
        Ok(Response::decode(&reply)?)
    }

    pub async fn create_account(
        &mut self,
        username: &str,
        password: &str,
    ) -> Result<Response, ClientError> {
        self.request(&Request::CreateAccount {
            username: username.to_string(),
            password: password.to_string(),
        })
        .await
    }

    /// Logs in and returns the session token, or None if the server refused
    pub async fn login(
        &mut self,
        username: &str,
        password: &str,
    ) -> Result<Option<String>, ClientError> {
        let response = self
            .request(&Request::Login {
                username: username.to_string(),
                password: password.to_string(),
            })
            .await?;
        Ok(response.success.then_some(response.data).flatten())
    }

    pub async fn logout(&mut self, token: &str) -> Result<Response, ClientError> {
        self.request(&Request::Logout {
            token: Some(token.to_string()),
        })
        .await
    }

    pub async fn change_password(
        &mut self,
        token: &str,
        new_password: &str,
    ) -> Result<Response, ClientError> {
        self.request(&Request::ChangePassword {
            token: token.to_string(),
            new_password: new_password.to_string(),
        })
        .await
    }

    /// Creates an item and returns its id, or None if the server refused
    pub async fn create_todo(
        &mut self,
        token: &str,
        title: &str,
        priority: Priority,
        description: &str,
        due_date: Option<chrono::NaiveDate>,
    ) -> Result<Option<ToDoId>, ClientError> {
        let response = self
            .request(&Request::CreateToDo {
                token: token.to_string(),
                title: title.to_string(),
                priority,
                description: description.to_string(),
                due_date,
            })
            .await?;
        Ok(response
            .success
            .then_some(response.data)
            .flatten()
            .and_then(|id| id.parse().ok()))
    }

    pub async fn get_todo(&mut self, token: &str, id: ToDoId) -> Result<Response, ClientError> {
        self.request(&Request::GetToDo {
            token: token.to_string(),
            id,
        })
        .await
    }

    pub async fn delete_todo(&mut self, token: &str, id: ToDoId) -> Result<Response, ClientError> {
        self.request(&Request::DeleteToDo {
            token: token.to_string(),
            id,
        })
        .await
    }

    pub async fn list_todos(&mut self, token: &str) -> Result<Response, ClientError> {
        self.request(&Request::ListToDos {
            token: token.to_string(),
        })
        .await
    }

    pub async fn ping(&mut self, token: Option<&str>) -> Result<Response, ClientError> {
        self.request(&Request::Ping {
            token: token.map(str::to_string),
        })
        .await
    }
}
