use std::{collections::BTreeMap, fmt};

use shared::error::ApiError;
use thiserror::Error;

pub const NO_RESPONSE_MESSAGE: &str = "No response received from the server.";
pub const CLIENT_FAILURE_MESSAGE: &str = "Unexpected error occurred";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiFailure {
    #[error("Error {status}: {message}")]
    ServerRejection { status: u16, message: String },
    #[error("No response received from the server.")]
    NoResponse { detail: String },
    #[error("Unexpected error occurred")]
    ClientFailure { detail: String },
}

impl ApiFailure {
    pub fn rejection(status: u16, body: &ApiError) -> Self {
        Self::ServerRejection {
            status,
            message: body.rejection_message(),
        }
    }

    pub fn client(detail: impl Into<String>) -> Self {
        Self::ClientFailure {
            detail: detail.into(),
        }
    }

    pub fn from_transport(err: reqwest::Error) -> Self {
        let detail = err.to_string();
        if let Some(status) = err.status() {
            return Self::rejection(status.as_u16(), &ApiError::default());
        }
        if err.is_builder() || err.is_decode() {
            Self::ClientFailure { detail }
        } else if err.is_connect() || err.is_timeout() || err.is_request() || err.is_body() {
            Self::NoResponse { detail }
        } else {
            Self::ClientFailure { detail }
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ServerRejection { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Internal detail for logs; never shown to users.
    pub fn detail(&self) -> &str {
        match self {
            Self::ServerRejection { message, .. } => message,
            Self::NoResponse { detail } | Self::ClientFailure { detail } => detail,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormField {
    Name,
    Description,
    ImageUrl,
    CarType,
}

impl FormField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Description => "description",
            Self::ImageUrl => "imageUrl",
            Self::CarType => "carType",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{} field(s) failed validation", .fields.len())]
pub struct FormErrors {
    fields: BTreeMap<FormField, String>,
}

impl FormErrors {
    pub fn insert(&mut self, field: FormField, message: impl Into<String>) {
        self.fields.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: FormField) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FormField, &str)> {
        self.fields
            .iter()
            .map(|(field, message)| (*field, message.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] FormErrors),
    #[error(transparent)]
    Api(#[from] ApiFailure),
}
