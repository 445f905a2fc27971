//! Request and response records of the line protocol
//!
//! Every record is one line: the first field names the message kind, the
//! remaining fields are kind-specific. Clients send [`Request`]s, the server
//! answers each one with exactly one [`Response`].

use crate::fields::{join_fields, split_fields};
use crate::model::{format_due_date, parse_due_date, Priority, ToDoId};
use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Reasons a line could not be decoded into a record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("empty record")]
    Empty,
    #[error("unknown message kind: {0}")]
    UnknownKind(String),
    #[error("wrong number of fields for {kind}: expected {expected}, found {found}")]
    FieldCount {
        kind: &'static str,
        expected: &'static str,
        found: usize,
    },
    #[error("invalid priority: {0}")]
    InvalidPriority(String),
    #[error("invalid date: {0}")]
    InvalidDate(String),
    #[error("invalid id: {0}")]
    InvalidId(String),
    #[error("invalid result flag: {0}")]
    InvalidFlag(String),
    #[error("record ends with a lone escape character")]
    DanglingEscape,
    #[error("unknown escape sequence: \\{0}")]
    InvalidEscape(char),
}

/// A client request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Login {
        username: String,
        password: String,
    },
    Logout {
        token: Option<String>,
    },
    CreateAccount {
        username: String,
        password: String,
    },
    ChangePassword {
        token: String,
        new_password: String,
    },
    CreateToDo {
        token: String,
        title: String,
        priority: Priority,
        description: String,
        due_date: Option<NaiveDate>,
    },
    GetToDo {
        token: String,
        id: ToDoId,
    },
    DeleteToDo {
        token: String,
        id: ToDoId,
    },
    ListToDos {
        token: String,
    },
    Ping {
        token: Option<String>,
    },
}

impl Request {
    /// All request kinds in wire spelling
    pub const KINDS: [&'static str; 9] = [
        "LOGIN",
        "LOGOUT",
        "CREATE_ACCOUNT",
        "CHANGE_PASSWORD",
        "CREATE_TODO",
        "GET_TODO",
        "DELETE_TODO",
        "LIST_TODOS",
        "PING",
    ];

    /// Wire name of this request's kind
    pub fn kind(&self) -> &'static str {
        match self {
            Request::Login { .. } => "LOGIN",
            Request::Logout { .. } => "LOGOUT",
            Request::CreateAccount { .. } => "CREATE_ACCOUNT",
            Request::ChangePassword { .. } => "CHANGE_PASSWORD",
            Request::CreateToDo { .. } => "CREATE_TODO",
            Request::GetToDo { .. } => "GET_TODO",
            Request::DeleteToDo { .. } => "DELETE_TODO",
            Request::ListToDos { .. } => "LIST_TODOS",
            Request::Ping { .. } => "PING",
        }
    }

    /// Encodes the request as a single line without terminator
    pub fn encode(&self) -> String {
        let mut fields = vec![self.kind().to_string()];
        match self {
            Request::Login { username, password }
            | Request::CreateAccount { username, password } => {
                fields.push(username.clone());
                fields.push(password.clone());
            }
            Request::Logout { token } | Request::Ping { token } => {
                fields.extend(token.iter().cloned());
            }
            Request::ChangePassword {
                token,
                new_password,
            } => {
                fields.push(token.clone());
                fields.push(new_password.clone());
            }
            Request::CreateToDo {
                token,
                title,
                priority,
                description,
                due_date,
            } => {
                fields.push(token.clone());
                fields.push(title.clone());
                fields.push(priority.to_string());
                fields.push(description.clone());
                fields.push(format_due_date(*due_date));
            }
            Request::GetToDo { token, id } | Request::DeleteToDo { token, id } => {
                fields.push(token.clone());
                fields.push(id.to_string());
            }
            Request::ListToDos { token } => fields.push(token.clone()),
        }
        join_fields(fields)
    }

    /// Number of fields after the kind that `kind` accepts
    fn expected_fields(kind: &str) -> &'static str {
        match kind {
            "LOGOUT" | "PING" => "0 or 1",
            "LIST_TODOS" => "1",
            "CREATE_TODO" => "4 or 5",
            _ => "2",
        }
    }

    /// Decodes one line into a request
    pub fn decode(line: &str) -> Result<Self, ProtocolError> {
        let fields = split_fields(line)?;
        let (kind, args) = fields.split_first().ok_or(ProtocolError::Empty)?;

        match (kind.as_str(), args) {
            ("LOGIN", [username, password]) => Ok(Request::Login {
                username: username.clone(),
                password: password.clone(),
            }),
            ("LOGOUT", []) => Ok(Request::Logout { token: None }),
            ("LOGOUT", [token]) => Ok(Request::Logout {
                token: optional(token),
            }),
            ("CREATE_ACCOUNT", [username, password]) => Ok(Request::CreateAccount {
                username: username.clone(),
                password: password.clone(),
            }),
            ("CHANGE_PASSWORD", [token, new_password]) => Ok(Request::ChangePassword {
                token: token.clone(),
                new_password: new_password.clone(),
            }),
            ("CREATE_TODO", [token, title, priority, description]) => Ok(Request::CreateToDo {
                token: token.clone(),
                title: title.clone(),
                priority: priority.parse()?,
                description: description.clone(),
                due_date: None,
            }),
            ("CREATE_TODO", [token, title, priority, description, due_date]) => {
                Ok(Request::CreateToDo {
                    token: token.clone(),
                    title: title.clone(),
                    priority: priority.parse()?,
                    description: description.clone(),
                    due_date: parse_due_date(due_date)?,
                })
            }
            ("GET_TODO", [token, id]) => Ok(Request::GetToDo {
                token: token.clone(),
                id: parse_id(id)?,
            }),
            ("DELETE_TODO", [token, id]) => Ok(Request::DeleteToDo {
                token: token.clone(),
                id: parse_id(id)?,
            }),
            ("LIST_TODOS", [token]) => Ok(Request::ListToDos {
                token: token.clone(),
            }),
            ("PING", []) => Ok(Request::Ping { token: None }),
            ("PING", [token]) => Ok(Request::Ping {
                token: optional(token),
            }),
            (kind, args) => match Self::KINDS.iter().find(|known| **known == kind) {
                Some(known) => Err(ProtocolError::FieldCount {
                    kind: *known,
                    expected: Self::expected_fields(known),
                    found: args.len(),
                }),
                None => Err(ProtocolError::UnknownKind(kind.to_string())),
            },
        }
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for Request {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

fn optional(token: &str) -> Option<String> {
    (!token.is_empty()).then(|| token.to_string())
}

fn parse_id(field: &str) -> Result<ToDoId, ProtocolError> {
    field
        .parse()
        .map_err(|_| ProtocolError::InvalidId(field.to_string()))
}

/// The single response kind: a success flag and an optional data payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub success: bool,
    pub data: Option<String>,
}

impl Response {
    pub const KIND: &'static str = "RESULT";

    /// Successful reply without data
    pub fn valid() -> Self {
        Self {
            success: true,
            data: None,
        }
    }

    /// Successful reply carrying a serialized value
    pub fn valid_with(data: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data.into()),
        }
    }

    /// The uniform failure reply. Carries no detail on purpose.
    pub fn invalid() -> Self {
        Self {
            success: false,
            data: None,
        }
    }

    /// Encodes the response as a single line without terminator
    pub fn encode(&self) -> String {
        let mut fields = vec![Self::KIND.to_string(), self.success.to_string()];
        fields.extend(self.data.iter().cloned());
        join_fields(fields)
    }

    /// Decodes one line into a response
    pub fn decode(line: &str) -> Result<Self, ProtocolError> {
        let fields = split_fields(line)?;
        let (kind, args) = fields.split_first().ok_or(ProtocolError::Empty)?;
        if kind != Self::KIND {
            return Err(ProtocolError::UnknownKind(kind.clone()));
        }

        match args {
            [flag] => Ok(Self {
                success: parse_flag(flag)?,
                data: None,
            }),
            [flag, data] => Ok(Self {
                success: parse_flag(flag)?,
                data: Some(data.clone()),
            }),
            _ => Err(ProtocolError::FieldCount {
                kind: Self::KIND,
                expected: "1 or 2",
                found: args.len(),
            }),
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for Response {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

fn parse_flag(field: &str) -> Result<bool, ProtocolError> {
    match field {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(ProtocolError::InvalidFlag(other.to_string())),
    }
}
