//! Request dispatcher: authentication, authorization and to-do operations
//!
//! Every request a session handler decodes ends up here. The dispatcher
//! checks the session's token, consults the validator, performs the store
//! operation and produces exactly one [`Response`]. Store locks are released
//! before the response is returned, so writing it to the socket never
//! happens inside a critical section.
//!
//! All failures (wrong token, unknown account, duplicate username, failed
//! validation, missing item) produce the same `RESULT|false` so a client
//! cannot learn which accounts exist.

use crate::session::Session;
use crate::store::{Account, AccountStore, ToDoDraft};
use crate::validation::{DefaultValidator, Validator};
use chrono::NaiveDate;
use log::{debug, info};
use shared::{format_listing, Priority, Request, Response, ToDoId};
use std::sync::Arc;

pub struct Dispatcher {
    store: AccountStore,
    validator: Arc<dyn Validator>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(Arc::new(DefaultValidator))
    }
}

impl Dispatcher {
    pub fn new(validator: Arc<dyn Validator>) -> Self {
        Self {
            store: AccountStore::new(),
            validator,
        }
    }

    pub fn store(&self) -> &AccountStore {
        &self.store
    }

    /// Routes a decoded request to its operation
    pub async fn dispatch(&self, request: Request, session: &mut Session) -> Response {
        match request {
            Request::CreateAccount { username, password } => {
                self.create_account(&username, &password, session).await
            }
            Request::Login { username, password } => {
                self.login(&username, &password, session).await
            }
            Request::ChangePassword {
                token,
                new_password,
            } => self.change_password(&new_password, &token, session).await,
            Request::Logout { token } => self.logout(token.as_deref(), session),
            Request::CreateToDo {
                token,
                title,
                priority,
                description,
                due_date,
            } => {
                self.create_todo(&title, priority, &description, due_date, &token, session)
                    .await
            }
            Request::GetToDo { token, id } => self.get_todo(id, &token, session).await,
            Request::DeleteToDo { token, id } => self.delete_todo(id, &token, session).await,
            Request::ListToDos { token } => self.list_todos(&token, session).await,
            Request::Ping { token } => self.ping(token.as_deref(), session),
        }
    }

    pub async fn create_account(
        &self,
        username: &str,
        password: &str,
        session: &Session,
    ) -> Response {
        if !self.validator.validate_credentials(username, password) {
            return answer_invalid(session);
        }

        match self.store.add_account(Account::new(username, password)).await {
            Ok(()) => {
                info!("Client {}: created account {}", session.client_id(), username);
                answer_valid(session)
            }
            Err(e) => {
                debug!("Client {}: {}", session.client_id(), e);
                answer_invalid(session)
            }
        }
    }

    /// A session may not log in twice without logging out first
    pub async fn login(&self, username: &str, password: &str, session: &mut Session) -> Response {
        if session.is_authenticated() {
            return answer_invalid(session);
        }
        if !self.store.verify_credentials(username, password).await {
            return answer_invalid(session);
        }

        info!("Client {}: login {}", session.client_id(), username);
        let token = session.authenticate(username).to_string();
        answer_valid_with(session, token)
    }

    pub async fn change_password(
        &self,
        new_password: &str,
        token: &str,
        session: &Session,
    ) -> Response {
        let Some(username) = session.authorize(token) else {
            return answer_invalid(session);
        };
        if !self.validator.validate_password(new_password) {
            return answer_invalid(session);
        }

        match self.store.set_password(username, new_password).await {
            Ok(()) => {
                info!("Client {}: changed password of {}", session.client_id(), username);
                answer_valid(session)
            }
            Err(e) => {
                debug!("Client {}: {}", session.client_id(), e);
                answer_invalid(session)
            }
        }
    }

    /// Clears the session's token. A presented token must match the session's.
    pub fn logout(&self, token: Option<&str>, session: &mut Session) -> Response {
        let authorized = match token {
            Some(token) => session.authorize(token).is_some(),
            None => session.is_authenticated(),
        };
        if !authorized {
            return answer_invalid(session);
        }

        info!(
            "Client {}: logout {}",
            session.client_id(),
            session.username().unwrap_or_default()
        );
        session.clear();
        answer_valid(session)
    }

    pub async fn create_todo(
        &self,
        title: &str,
        priority: Priority,
        description: &str,
        due_date: Option<NaiveDate>,
        token: &str,
        session: &Session,
    ) -> Response {
        let Some(username) = session.authorize(token) else {
            return answer_invalid(session);
        };
        if !self
            .validator
            .validate_todo_fields(title, description, due_date)
        {
            return answer_invalid(session);
        }

        let draft = ToDoDraft {
            title: title.to_string(),
            priority,
            description: description.to_string(),
            due_date,
        };
        match self.store.add_todo(username, draft).await {
            Ok(todo) => {
                info!("Client {}: stored todo {}", session.client_id(), todo.id);
                answer_valid_with(session, todo.id.to_string())
            }
            Err(e) => {
                debug!("Client {}: {}", session.client_id(), e);
                answer_invalid(session)
            }
        }
    }

    pub async fn get_todo(&self, id: ToDoId, token: &str, session: &Session) -> Response {
        let Some(username) = session.authorize(token) else {
            return answer_invalid(session);
        };

        match self.store.get_todo(username, id).await {
            Some(todo) => {
                info!("Client {}: sending todo {}", session.client_id(), id);
                answer_valid_with(session, todo.to_string())
            }
            None => answer_invalid(session),
        }
    }

    pub async fn delete_todo(&self, id: ToDoId, token: &str, session: &Session) -> Response {
        let Some(username) = session.authorize(token) else {
            return answer_invalid(session);
        };

        if self.store.remove_todo(username, id).await {
            info!("Client {}: deleted todo {}", session.client_id(), id);
            answer_valid_with(session, id.to_string())
        } else {
            answer_invalid(session)
        }
    }

    /// An empty listing is a valid result
    pub async fn list_todos(&self, token: &str, session: &Session) -> Response {
        let Some(username) = session.authorize(token) else {
            return answer_invalid(session);
        };

        match self.store.list_todos(username).await {
            Some(todos) => {
                info!("Client {}: listing {} todos", session.client_id(), todos.len());
                answer_valid_with(session, format_listing(&todos))
            }
            None => answer_invalid(session),
        }
    }

    /// Liveness and identity check; never changes state
    ///
    /// Without a token it succeeds only for an unauthenticated session, with a
    /// token only if the token is the session's.
    pub fn ping(&self, token: Option<&str>, session: &Session) -> Response {
        let ok = match token {
            None => !session.is_authenticated(),
            Some(token) => session.authorize(token).is_some(),
        };
        info!("Client {}: ping", session.client_id());
        if ok {
            answer_valid(session)
        } else {
            answer_invalid(session)
        }
    }
}

fn answer_valid(session: &Session) -> Response {
    debug!("Client {}: valid request", session.client_id());
    Response::valid()
}

fn answer_valid_with(session: &Session, data: String) -> Response {
    debug!("Client {}: valid request with data", session.client_id());
    Response::valid_with(data)
}

fn answer_invalid(session: &Session) -> Response {
    debug!("Client {}: invalid request", session.client_id());
    Response::invalid()
}
