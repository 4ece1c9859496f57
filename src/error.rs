use std::fmt;
use std::io::Cursor;

use rocket::http::{ContentType, Status};
use rocket::response::{self, Responder, Response};
use rocket::Request;
use serde_json::json;

pub type Result<T> = std::result::Result<T, CmsError>;

/// Error type shared by the store, the services and the JSON API.
#[derive(Debug, Clone, PartialEq)]
pub enum CmsError {
    /// Bad input. `fields` names the offending form fields, if any.
    Validation {
        message: String,
        fields: Vec<String>,
    },
    NotFound(String),
    Conflict(String),
    Unauthorized(String),
    Forbidden(String),
    Storage(String),
    Serialization(String),
}

impl CmsError {
    pub fn validation(msg: impl Into<String>) -> Self {
        CmsError::Validation {
            message: msg.into(),
            fields: Vec::new(),
        }
    }

    pub fn invalid_fields(msg: impl Into<String>, fields: Vec<String>) -> Self {
        CmsError::Validation {
            message: msg.into(),
            fields,
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        CmsError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        CmsError::Conflict(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        CmsError::Storage(msg.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            CmsError::Validation { .. } => "E_VALIDATION",
            CmsError::NotFound(_) => "E_NOT_FOUND",
            CmsError::Conflict(_) => "E_CONFLICT",
            CmsError::Unauthorized(_) => "E_UNAUTHORIZED",
            CmsError::Forbidden(_) => "E_FORBIDDEN",
            CmsError::Storage(_) => "E_STORAGE",
            CmsError::Serialization(_) => "E_SERIALIZATION",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            CmsError::Validation { message, .. } => message,
            CmsError::NotFound(msg)
            | CmsError::Conflict(msg)
            | CmsError::Unauthorized(msg)
            | CmsError::Forbidden(msg)
            | CmsError::Storage(msg)
            | CmsError::Serialization(msg) => msg,
        }
    }

    pub fn status(&self) -> Status {
        match self {
            CmsError::Validation { .. } => Status::BadRequest,
            CmsError::NotFound(_) => Status::NotFound,
            CmsError::Conflict(_) => Status::Conflict,
            CmsError::Unauthorized(_) => Status::Unauthorized,
            CmsError::Forbidden(_) => Status::Forbidden,
            CmsError::Storage(_) | CmsError::Serialization(_) => Status::InternalServerError,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut body = json!({
            "ok": false,
            "error": self.message(),
            "code": self.code(),
        });
        if let CmsError::Validation { fields, .. } = self {
            if !fields.is_empty() {
                body["fields"] = json!(fields);
            }
        }
        body
    }
}

impl fmt::Display for CmsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message())
    }
}

impl std::error::Error for CmsError {}

impl From<std::io::Error> for CmsError {
    fn from(err: std::io::Error) -> Self {
        CmsError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for CmsError {
    fn from(err: serde_json::Error) -> Self {
        CmsError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for CmsError {
    fn from(err: csv::Error) -> Self {
        CmsError::Serialization(err.to_string())
    }
}

impl<'r> Responder<'r, 'static> for CmsError {
    fn respond_to(self, _req: &'r Request<'_>) -> response::Result<'static> {
        if self.status().code >= 500 {
            log::error!("{}", self);
        }
        let body = self.to_json().to_string();
        Response::build()
            .status(self.status())
            .header(ContentType::JSON)
            .sized_body(body.len(), Cursor::new(body))
            .ok()
    }
}
