//! Caller identity.
//!
//! The identity provider is external; core only consumes the resolved,
//! stable subject string. Operations take `Option<&Identity>` where `None`
//! means the caller is unauthenticated.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Authenticated caller, identified by the provider's stable subject.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    subject: String,
}

/// Identity construction error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// Subject is empty or whitespace only.
    BlankSubject,
}

impl Display for IdentityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankSubject => write!(f, "identity subject must not be blank"),
        }
    }
}

impl Error for IdentityError {}

impl Identity {
    /// Wraps a provider subject, kept byte for byte.
    pub fn new(subject: impl Into<String>) -> Result<Self, IdentityError> {
        let subject = subject.into();
        if subject.trim().is_empty() {
            return Err(IdentityError::BlankSubject);
        }
        Ok(Self { subject })
    }

    /// Stable subject string; used as the document owner id.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Whether this caller owns a record with the given owner id.
    pub fn owns(&self, owner_id: &str) -> bool {
        self.subject == owner_id
    }
}

impl Display for Identity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.subject)
    }
}

#[cfg(test)]
mod tests {
    use super::{Identity, IdentityError};

    #[test]
    fn new_keeps_subject_verbatim() {
        let identity = Identity::new("user_1").unwrap();
        assert!(identity.owns("user_1"));
        assert!(!identity.owns("user_2"));

        let padded = Identity::new("user_1 ").unwrap();
        assert_eq!(padded.subject(), "user_1 ");
        assert!(!padded.owns("user_1"));
        assert_ne!(padded, identity);
    }

    #[test]
    fn new_rejects_blank_subject() {
        assert_eq!(Identity::new(" \t").unwrap_err(), IdentityError::BlankSubject);
    }
}
