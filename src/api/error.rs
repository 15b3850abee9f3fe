use std::fmt;

use thiserror::Error;

use crate::api::tokens::StoreError;

/// Closed set of failure kinds carried by every client error.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    Forbidden,
    Unauthorized,
    CredExchange,
    Unknown,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Forbidden => "E_STATUS_FORBIDDEN",
            ErrorKind::Unauthorized => "E_STATUS_UNAUTHORIZED",
            ErrorKind::CredExchange => "E_CRED_EXCHANGE",
            ErrorKind::Unknown => "E_UKN",
        }
    }

    pub fn from_status(status: u16) -> Self {
        match status {
            401 => ErrorKind::Unauthorized,
            403 => ErrorKind::Forbidden,
            _ => ErrorKind::Unknown,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{method} {path} answered with status {status}")]
    Status {
        method: &'static str,
        path: String,
        status: u16,
    },
    #[error("{method} {path} could not be sent")]
    Transport {
        method: &'static str,
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("malformed response body from {path}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("credential exchange failed")]
    CredExchange(#[source] Box<ClientError>),
    #[error("token storage failed")]
    Store(#[from] StoreError),
    #[error("unable to build HTTP client")]
    Setup(#[source] reqwest::Error),
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Status { status, .. } => ErrorKind::from_status(*status),
            ClientError::CredExchange(_) => ErrorKind::CredExchange,
            _ => ErrorKind::Unknown,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}
