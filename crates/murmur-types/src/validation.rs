//! Field-level validation rules.
//!
//! Each entity has an ordered list of pure rule functions. A rule inspects
//! the candidate and yields at most one [`FieldError`]; [`check`] runs the
//! whole list and aggregates every failure before anything is persisted.
//! Rules needing storage (email uniqueness) live in murmur-db and push into
//! the same [`ValidationErrors`].

use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

pub const NAME_MIN: usize = 3;
pub const NAME_MAX: usize = 50;
pub const PASSWORD_MIN: usize = 6;
pub const PASSWORD_MAX: usize = 40;
pub const MICROPOST_MAX: usize = 140;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\A[a-z0-9_+\-.]+@[a-z0-9\-.]+\.[a-z]+\z").expect("email pattern compiles")
});

/// A single failed rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// All failures for one create/update, keyed by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(FieldError::new(field, message));
        errors
    }

    pub fn push(&mut self, error: FieldError) {
        self.errors
            .entry(error.field.to_string())
            .or_default()
            .push(error.message);
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, messages) in other.errors {
            self.errors.entry(field).or_default().extend(messages);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `Ok(())` when nothing failed.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation failed")?;
        let mut sep = ": ";
        for (field, messages) in &self.errors {
            for message in messages {
                write!(f, "{sep}{field} {message}")?;
                sep = ", ";
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl FromIterator<FieldError> for ValidationErrors {
    fn from_iter<I: IntoIterator<Item = FieldError>>(iter: I) -> Self {
        let mut errors = Self::new();
        for e in iter {
            errors.push(e);
        }
        errors
    }
}

pub type Rule<T> = fn(&T) -> Option<FieldError>;

/// Run every rule in order and collect the failures.
pub fn check<T>(candidate: &T, rules: &[Rule<T>]) -> ValidationErrors {
    rules.iter().filter_map(|rule| rule(candidate)).collect()
}

fn presence(field: &'static str, value: &str) -> Option<FieldError> {
    value
        .trim()
        .is_empty()
        .then(|| FieldError::new(field, "can't be blank"))
}

fn length(field: &'static str, value: &str, min: usize, max: usize) -> Option<FieldError> {
    let len = value.chars().count();
    if len < min {
        Some(FieldError::new(
            field,
            format!("is too short (minimum is {min} characters)"),
        ))
    } else if len > max {
        Some(FieldError::new(
            field,
            format!("is too long (maximum is {max} characters)"),
        ))
    } else {
        None
    }
}

// -- Users --

/// Identity attributes checked on every create and update.
#[derive(Debug, Clone, Copy)]
pub struct UserAttrs<'a> {
    pub name: &'a str,
    pub email: &'a str,
}

fn name_present(u: &UserAttrs<'_>) -> Option<FieldError> {
    presence("name", u.name)
}

fn name_length(u: &UserAttrs<'_>) -> Option<FieldError> {
    length("name", u.name, NAME_MIN, NAME_MAX)
}

fn email_present(u: &UserAttrs<'_>) -> Option<FieldError> {
    presence("email", u.email)
}

fn email_format(u: &UserAttrs<'_>) -> Option<FieldError> {
    (!is_valid_email(u.email)).then(|| FieldError::new("email", "is invalid"))
}

pub fn validate_user(attrs: UserAttrs<'_>) -> ValidationErrors {
    let rules: [Rule<UserAttrs<'_>>; 4] = [
        name_present as Rule<_>,
        name_length as Rule<_>,
        email_present as Rule<_>,
        email_format as Rule<_>,
    ];
    check(&attrs, &rules)
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

// -- Passwords --

/// Plaintext password plus its confirmation; only checked when a password is being set.
#[derive(Debug, Clone, Copy)]
pub struct PasswordAttrs<'a> {
    pub password: &'a str,
    pub confirmation: &'a str,
}

fn password_present(p: &PasswordAttrs<'_>) -> Option<FieldError> {
    presence("password", p.password)
}

fn password_length(p: &PasswordAttrs<'_>) -> Option<FieldError> {
    length("password", p.password, PASSWORD_MIN, PASSWORD_MAX)
}

fn password_confirmed(p: &PasswordAttrs<'_>) -> Option<FieldError> {
    (p.password != p.confirmation)
        .then(|| FieldError::new("password", "doesn't match confirmation"))
}

pub fn validate_password(attrs: PasswordAttrs<'_>) -> ValidationErrors {
    let rules: [Rule<PasswordAttrs<'_>>; 3] = [
        password_present as Rule<_>,
        password_length as Rule<_>,
        password_confirmed as Rule<_>,
    ];
    check(&attrs, &rules)
}

// -- Microposts --

fn content_present(content: &&str) -> Option<FieldError> {
    presence("content", content)
}

fn content_length(content: &&str) -> Option<FieldError> {
    (content.chars().count() > MICROPOST_MAX).then(|| {
        FieldError::new(
            "content",
            format!("is too long (maximum is {MICROPOST_MAX} characters)"),
        )
    })
}

pub fn validate_micropost(content: &str) -> ValidationErrors {
    let rules: [Rule<&str>; 2] = [content_present as Rule<_>, content_length as Rule<_>];
    check(&content, &rules)
}
