//! In-memory account and to-do repository
//!
//! [`AccountStore`] is the only holder of account data. Every public method
//! takes the lock once, does its whole read-modify-write inside it, and
//! returns owned values, so callers never see a collection half-updated and
//! never iterate one outside the lock.

use chrono::NaiveDate;
use shared::{Priority, ToDo, ToDoId};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("username already taken: {0}")]
    UsernameTaken(String),
    #[error("no such account: {0}")]
    UnknownAccount(String),
}

/// A user account and its to-do items
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    username: String,
    password: String,
    todos: BTreeMap<ToDoId, ToDo>,
    next_id: ToDoId,
}

impl Account {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            todos: BTreeMap::new(),
            next_id: 1,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password_matches(&self, password: &str) -> bool {
        self.password == password
    }

    /// Items in ascending id order, which is also creation order
    pub fn todos(&self) -> impl Iterator<Item = &ToDo> {
        self.todos.values()
    }

    /// Hands out the next id; ids are never handed out twice
    fn generate_id(&mut self) -> ToDoId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// Fields of a to-do item before it has an id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToDoDraft {
    pub title: String,
    pub priority: Priority,
    pub description: String,
    pub due_date: Option<NaiveDate>,
}

impl ToDoDraft {
    fn into_todo(self, id: ToDoId) -> ToDo {
        ToDo::new(id, self.title, self.priority, self.description, self.due_date)
    }
}

/// Shared repository of all accounts, guarded by one coarse lock
#[derive(Debug, Default)]
pub struct AccountStore {
    accounts: RwLock<HashMap<String, Account>>,
}

impl AccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the account, if it exists
    pub async fn find_account(&self, username: &str) -> Option<Account> {
        self.accounts.read().await.get(username).cloned()
    }

    /// Inserts a new account unless the username is already taken
    ///
    /// The uniqueness check and the insert happen under one write lock, so
    /// of two concurrent calls for the same name at most one succeeds.
    pub async fn add_account(&self, account: Account) -> Result<(), StoreError> {
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&account.username) {
            return Err(StoreError::UsernameTaken(account.username));
        }
        accounts.insert(account.username.clone(), account);
        Ok(())
    }

    /// True if an account exists with exactly this username and password
    pub async fn verify_credentials(&self, username: &str, password: &str) -> bool {
        self.accounts
            .read()
            .await
            .get(username)
            .is_some_and(|account| account.password_matches(password))
    }

    pub async fn set_password(&self, username: &str, new_password: &str) -> Result<(), StoreError> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(username)
            .ok_or_else(|| StoreError::UnknownAccount(username.to_string()))?;
        account.password = new_password.to_string();
        Ok(())
    }

    /// Assigns the next id of the owning account and stores the item
    pub async fn add_todo(&self, username: &str, draft: ToDoDraft) -> Result<ToDo, StoreError> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .get_mut(username)
            .ok_or_else(|| StoreError::UnknownAccount(username.to_string()))?;
        let todo = draft.into_todo(account.generate_id());
        account.todos.insert(todo.id, todo.clone());
        Ok(todo)
    }

    pub async fn get_todo(&self, username: &str, id: ToDoId) -> Option<ToDo> {
        self.accounts
            .read()
            .await
            .get(username)
            .and_then(|account| account.todos.get(&id))
            .cloned()
    }

    /// Removes an item; returns false if the account or item does not exist
    pub async fn remove_todo(&self, username: &str, id: ToDoId) -> bool {
        self.accounts
            .write()
            .await
            .get_mut(username)
            .is_some_and(|account| account.todos.remove(&id).is_some())
    }

    /// Snapshot of an account's items in id order, or None for an unknown account
    pub async fn list_todos(&self, username: &str) -> Option<Vec<ToDo>> {
        self.accounts
            .read()
            .await
            .get(username)
            .map(|account| account.todos().cloned().collect())
    }

    /// Number of accounts
    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.accounts.read().await.is_empty()
    }
}
