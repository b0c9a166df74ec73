/// Errors from encoding or decoding a tagged stream.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("stream truncated: needed {needed} bytes at offset {offset}, only {available} available")]
    TruncatedStream {
        offset: usize,
        needed: usize,
        available: usize,
    },
    #[error("format violation at offset {offset}: {reason}")]
    FormatViolation { offset: usize, reason: String },
    #[error("unknown type identity: {0}")]
    UnknownType(String),
    #[error("enum {type_name} has no variant with representation {repr}")]
    UnknownVariant { type_name: String, repr: i32 },
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },
    #[error("identity mismatch: expected {expected}, found {found}")]
    IdentityMismatch { expected: String, found: String },
    #[error("nothing to serialize for {0}: no field produced output")]
    NothingToSerialize(String),
    #[error("nesting depth exceeds limit of {limit}")]
    NestingTooDeep { limit: usize },
    #[error("{what} of {actual} exceeds the limit of {limit}")]
    LimitExceeded {
        what: &'static str,
        actual: usize,
        limit: usize,
    },
    #[error("type identity {0} registered twice")]
    DuplicateType(String),
    #[error("category {0} registered twice")]
    DuplicateCategory(u8),
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

impl PersistError {
    pub(crate) fn format(offset: usize, reason: impl Into<String>) -> Self {
        Self::FormatViolation {
            offset,
            reason: reason.into(),
        }
    }

    /// Whether a decode may skip the offending record and carry on.
    ///
    /// Only resolution failures qualify: the record was structurally sound
    /// and the scanner already knows its extent.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::UnknownType(_) | Self::UnknownVariant { .. } | Self::IdentityMismatch { .. }
        )
    }

    /// A root object of the wrong identity cannot be skipped.
    pub(crate) fn at_root(self) -> Self {
        match self {
            Self::IdentityMismatch { expected, found } => Self::TypeMismatch { expected, found },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_resolution_failures_are_recoverable() {
        assert!(PersistError::UnknownType("x".into()).is_recoverable());
        assert!(
            PersistError::UnknownVariant {
                type_name: "e".into(),
                repr: 9
            }
            .is_recoverable()
        );
        assert!(
            PersistError::IdentityMismatch {
                expected: "a".into(),
                found: "b".into()
            }
            .is_recoverable()
        );
        assert!(!PersistError::format(0, "bad").is_recoverable());
        assert!(!PersistError::NothingToSerialize("t".into()).is_recoverable());
    }

    #[test]
    fn identity_mismatch_is_fatal_at_root() {
        let err = PersistError::IdentityMismatch {
            expected: "a".into(),
            found: "b".into(),
        }
        .at_root();
        assert!(matches!(err, PersistError::TypeMismatch { .. }));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn truncated_message_names_offset() {
        let err = PersistError::TruncatedStream {
            offset: 12,
            needed: 4,
            available: 1,
        };
        assert!(err.to_string().contains("offset 12"));
    }
}
