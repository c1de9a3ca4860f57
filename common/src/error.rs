use std::fmt;

/// Error kinds surfaced by the runtime core. Syntax/parse errors are the
/// parser collaborator's own type and are not modelled here; the driver
/// only propagates those.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalErrorKind {
    /// A name lookup reached the root scope without finding a binding.
    UnresolvedIdentifier,
    /// Dispatch chain exhausted without finding the requested method.
    NoSuchMethod,
    /// Ivar access on a primitive, or a native clause receiving an
    /// unexpected receiver/argument variant.
    TypeMisuse,
    /// Map/list index or scope lookup without a documented fallback.
    IndexError,
    /// Call arguments could not bind to any clause of the selected Functor.
    ArityMismatch,
    /// An invariant violation; always a host bug, never a user error.
    InterpreterBug,
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EvalErrorKind::UnresolvedIdentifier => "unresolved identifier",
            EvalErrorKind::NoSuchMethod => "no such method",
            EvalErrorKind::TypeMisuse => "type misuse",
            EvalErrorKind::IndexError => "index error",
            EvalErrorKind::ArityMismatch => "arity mismatch",
            EvalErrorKind::InterpreterBug => "interpreter bug",
        };
        write!(f, "{}", label)
    }
}

/// Non-local failure raised by the core. Shaped like
/// `std::io::Error::new(ErrorKind, message)`, generalised to the kinds
/// this interpreter needs instead of `std::io::ErrorKind`.
#[derive(Debug, Clone)]
pub struct EvalError {
    kind: EvalErrorKind,
    message: String,
}

impl EvalError {
    pub fn new(kind: EvalErrorKind, message: impl Into<String>) -> Self {
        EvalError {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> EvalErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn unresolved_identifier(name: &str) -> Self {
        Self::new(
            EvalErrorKind::UnresolvedIdentifier,
            format!("unresolved identifier '{}'", name),
        )
    }

    pub fn no_such_method(type_name: &str, method: &str) -> Self {
        Self::new(
            EvalErrorKind::NoSuchMethod,
            format!("no method '{}' on {}", method, type_name),
        )
    }

    pub fn type_misuse(message: impl Into<String>) -> Self {
        Self::new(EvalErrorKind::TypeMisuse, message)
    }

    pub fn index_error(message: impl Into<String>) -> Self {
        Self::new(EvalErrorKind::IndexError, message)
    }

    pub fn arity_mismatch(method: &str, expected: &str, got: usize) -> Self {
        Self::new(
            EvalErrorKind::ArityMismatch,
            format!(
                "'{}' expected {} argument(s), got {}",
                method, expected, got
            ),
        )
    }

    pub fn interpreter_bug(message: impl Into<String>) -> Self {
        Self::new(EvalErrorKind::InterpreterBug, message)
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for EvalError {}

pub type EvalResult<T> = Result<T, EvalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_message() {
        let err = EvalError::unresolved_identifier("frobnicate");
        let rendered = format!("{}", err);
        assert!(rendered.contains("unresolved identifier"));
        assert!(rendered.contains("frobnicate"));
    }

    #[test]
    fn kind_is_queryable() {
        let err = EvalError::no_such_method("Map", "frobnicate");
        assert_eq!(err.kind(), EvalErrorKind::NoSuchMethod);
    }
}
