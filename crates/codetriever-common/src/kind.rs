//! Portable error-kind taxonomy shared by every crate boundary.
//!
//! Individual crates keep their own `thiserror` enums for the errors they can
//! actually produce; each of those converts into an [`ErrorKind`] at the
//! point where it crosses into a worker loop or the HTTP shell, so the
//! response-mapping and logging policy in one place matches the design in
//! the root error-handling section.

/// Coarse classification of an error, independent of which crate raised it.
///
/// `BadRequest`/`NotFound`/`Timeout` are caller mistakes or absent data and
/// are safe to describe to a client; `Dependency` wraps a failure in an
/// external collaborator (provider, vector index); `Internal` is a bug and
/// must never leak details past a generic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    NotFound,
    Timeout,
    Dependency,
    Internal,
}

impl ErrorKind {
    /// The HTTP status code this kind maps to at the API boundary.
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::NotFound => 404,
            Self::Timeout => 408,
            Self::Dependency => 502,
            Self::Internal => 500,
        }
    }

    /// Whether this error kind is safe to echo to a client as-is.
    #[must_use]
    pub const fn is_client_facing(self) -> bool {
        !matches!(self, Self::Internal)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::BadRequest => "bad_request",
            Self::NotFound => "not_found",
            Self::Timeout => "timeout",
            Self::Dependency => "dependency",
            Self::Internal => "internal",
        };
        write!(f, "{s}")
    }
}

/// Trait implemented by every crate's error enum so the HTTP shell and the
/// worker-loop error logging can classify an error without matching on its
/// concrete variants.
pub trait HasErrorKind {
    fn kind(&self) -> ErrorKind;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_mapping_matches_error_handling_design() {
        assert_eq!(ErrorKind::BadRequest.http_status(), 400);
        assert_eq!(ErrorKind::NotFound.http_status(), 404);
        assert_eq!(ErrorKind::Timeout.http_status(), 408);
        assert_eq!(ErrorKind::Dependency.http_status(), 502);
        assert_eq!(ErrorKind::Internal.http_status(), 500);
    }

    #[test]
    fn internal_is_not_client_facing() {
        assert!(!ErrorKind::Internal.is_client_facing());
        assert!(ErrorKind::BadRequest.is_client_facing());
    }
}
