use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::Record;
use crate::error::{CmsError, Result};

pub const ROLES: &[&str] = &["admin", "editor"];

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub display_name: String,
    pub password_hash: String,
    pub role: String,   // admin, editor
    pub status: String, // active, locked
    #[serde(default)]
    pub last_login_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

impl Record for User {
    fn id(&self) -> i64 {
        self.id
    }
}

impl User {
    pub fn is_active(&self) -> bool {
        self.status == "active"
    }

    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }

    pub fn is_editor_or_above(&self) -> bool {
        self.role == "admin" || self.role == "editor"
    }

    pub fn name(&self) -> &str {
        if self.display_name.is_empty() {
            &self.username
        } else {
            &self.display_name
        }
    }

    /// JSON without the password hash.
    pub fn safe_json(&self) -> serde_json::Value {
        json!({
            "id": self.id,
            "username": self.username,
            "email": self.email,
            "display_name": self.display_name,
            "role": self.role,
            "status": self.status,
            "last_login_at": self.last_login_at,
            "created_at": self.created_at,
        })
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct UserForm {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default = "default_status")]
    pub status: String,
    /// Required on create, ignored on update.
    #[serde(default)]
    pub password: Option<String>,
}

fn default_role() -> String {
    "editor".to_string()
}

fn default_status() -> String {
    "active".to_string()
}

pub const MIN_PASSWORD_LEN: usize = 8;

impl UserForm {
    pub fn validate(&self, creating: bool) -> Result<()> {
        let mut fields = Vec::new();
        let username = self.username.trim();
        if username.is_empty()
            || !username
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
        {
            fields.push("username".to_string());
        }
        if !self.email.contains('@') {
            fields.push("email".to_string());
        }
        if !ROLES.contains(&self.role.as_str()) {
            fields.push("role".to_string());
        }
        if self.status != "active" && self.status != "locked" {
            fields.push("status".to_string());
        }
        if creating {
            let ok = self
                .password
                .as_deref()
                .map(|p| p.len() >= MIN_PASSWORD_LEN)
                .unwrap_or(false);
            if !ok {
                fields.push("password".to_string());
            }
        }
        if fields.is_empty() {
            Ok(())
        } else {
            Err(CmsError::invalid_fields("Invalid user data", fields))
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Session {
    pub id: String,
    pub user_id: i64,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    pub created_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}
