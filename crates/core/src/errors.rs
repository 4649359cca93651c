use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid value for `{field}`: {reason}")]
    InvalidParameter { field: &'static str, reason: String },
    #[error("missing required parameters: {}", .0.join(", "))]
    MissingParameters(Vec<&'static str>),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("inventory is corrupt: {0}")]
    Corrupt(String),
}

impl ApplicationError {
    /// Operational failures that may succeed on a later attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{ApplicationError, DomainError};

    #[test]
    fn only_operational_failures_are_transient() {
        assert!(ApplicationError::Persistence("io".to_owned()).is_transient());
        assert!(!ApplicationError::Corrupt("bad document".to_owned()).is_transient());
        assert!(!ApplicationError::from(DomainError::MissingParameters(vec!["seats"]))
            .is_transient());
    }

    #[test]
    fn missing_parameters_are_listed_in_order() {
        let error = DomainError::MissingParameters(vec!["show_id", "seats"]);
        assert_eq!(error.to_string(), "missing required parameters: show_id, seats");
    }
}
