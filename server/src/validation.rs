//! Field validation rules for accounts and to-do items
//!
//! The dispatcher only sees the [`Validator`] trait; [`DefaultValidator`] is
//! the rule set the server binary ships with.

use chrono::{Local, NaiveDate};

/// Validation collaborator consulted before any account or item is stored
pub trait Validator: Send + Sync {
    fn validate_credentials(&self, username: &str, password: &str) -> bool;
    fn validate_password(&self, password: &str) -> bool;
    fn validate_todo_fields(
        &self,
        title: &str,
        description: &str,
        due_date: Option<NaiveDate>,
    ) -> bool;
}

const USERNAME_LEN: std::ops::RangeInclusive<usize> = 3..=20;
const PASSWORD_LEN: std::ops::RangeInclusive<usize> = 6..=20;
const TITLE_LEN: std::ops::RangeInclusive<usize> = 3..=20;
const DESCRIPTION_MAX: usize = 255;

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultValidator;

impl DefaultValidator {
    pub fn validate_username(&self, username: &str) -> bool {
        USERNAME_LEN.contains(&username.chars().count())
            && username
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    }

    /// Checks to-do fields against a given calendar day
    pub fn validate_todo_fields_on(
        &self,
        title: &str,
        description: &str,
        due_date: Option<NaiveDate>,
        today: NaiveDate,
    ) -> bool {
        TITLE_LEN.contains(&title.trim().chars().count())
            && description.chars().count() <= DESCRIPTION_MAX
            && due_date.map_or(true, |due| due >= today)
    }
}

impl Validator for DefaultValidator {
    fn validate_credentials(&self, username: &str, password: &str) -> bool {
        self.validate_username(username) && self.validate_password(password)
    }

    fn validate_password(&self, password: &str) -> bool {
        PASSWORD_LEN.contains(&password.chars().count())
            && password.chars().any(|c| c.is_alphabetic())
            && password.chars().any(|c| c.is_ascii_digit())
            && !password.chars().any(char::is_whitespace)
    }

    fn validate_todo_fields(
        &self,
        title: &str,
        description: &str,
        due_date: Option<NaiveDate>,
    ) -> bool {
        self.validate_todo_fields_on(title, description, due_date, Local::now().date_naive())
    }
}
