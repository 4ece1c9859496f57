use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use chrono::NaiveDateTime;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::Record;
use crate::error::{CmsError, Result};

/// Hidden field that humans leave empty.
pub const HONEYPOT_FIELD: &str = "_hp";

pub const FIELD_KINDS: &[&str] = &["text", "email", "textarea", "select", "checkbox", "number", "tel"];

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FormDefinition {
    pub id: i64,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub fields: Vec<FormField>,
    #[serde(default = "default_submit_label")]
    pub submit_label: String,
    #[serde(default = "default_success")]
    pub success_message: String,
    #[serde(default)]
    pub notify_email: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

fn default_submit_label() -> String {
    "Send".to_string()
}

fn default_success() -> String {
    "Thank you! Your message has been sent.".to_string()
}

impl Record for FormDefinition {
    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FormField {
    pub name: String,
    pub label: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
}

fn default_kind() -> String {
    "text".to_string()
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct FormDefinitionForm {
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub fields: Vec<FormField>,
    #[serde(default)]
    pub submit_label: Option<String>,
    #[serde(default)]
    pub success_message: Option<String>,
    #[serde(default)]
    pub notify_email: Option<String>,
}

impl FormDefinitionForm {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CmsError::invalid_fields(
                "Form name is required",
                vec!["name".to_string()],
            ));
        }
        let mut seen: Vec<&str> = Vec::new();
        for field in &self.fields {
            let name = field.name.trim();
            if name.is_empty() || name.starts_with('_') {
                return Err(CmsError::validation(format!(
                    "Invalid field name '{}'",
                    field.name
                )));
            }
            if seen.contains(&name) {
                return Err(CmsError::validation(format!("Duplicate field '{}'", name)));
            }
            if !FIELD_KINDS.contains(&field.kind.as_str()) {
                return Err(CmsError::validation(format!(
                    "Unknown field type '{}'",
                    field.kind
                )));
            }
            if field.kind == "select" && field.options.is_empty() {
                return Err(CmsError::validation(format!(
                    "Select field '{}' needs options",
                    name
                )));
            }
            seen.push(name);
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FormSubmission {
    pub id: i64,
    pub form_id: i64,
    pub data: BTreeMap<String, String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub read: bool,
    pub created_at: NaiveDateTime,
}

impl Record for FormSubmission {
    fn id(&self) -> i64 {
        self.id
    }
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex is valid")
    })
}

/// What to do with an incoming submission.
#[derive(Debug, PartialEq)]
pub enum Screened {
    /// Store these values (known fields only).
    Accept(BTreeMap<String, String>),
    /// Honeypot tripped: report success, store nothing.
    Discard,
}

/// Check raw posted values against the form definition.
pub fn screen_submission(
    form: &FormDefinition,
    raw: &HashMap<String, String>,
) -> Result<Screened> {
    if raw
        .get(HONEYPOT_FIELD)
        .map(|v| !v.trim().is_empty())
        .unwrap_or(false)
    {
        return Ok(Screened::Discard);
    }

    let mut data = BTreeMap::new();
    let mut bad = Vec::new();

    for field in &form.fields {
        let value = raw
            .get(&field.name)
            .map(|v| v.trim().to_string())
            .unwrap_or_default();

        if value.is_empty() {
            if field.required {
                bad.push(field.name.clone());
            }
            continue;
        }

        let ok = match field.kind.as_str() {
            "email" => email_re().is_match(&value),
            "number" => value.parse::<f64>().is_ok(),
            "select" => field.options.iter().any(|o| o == &value),
            _ => true,
        };
        if !ok {
            bad.push(field.name.clone());
            continue;
        }
        data.insert(field.name.clone(), value);
    }

    if !bad.is_empty() {
        return Err(CmsError::invalid_fields(
            "Please check the highlighted fields",
            bad,
        ));
    }
    Ok(Screened::Accept(data))
}

/// CSV export: `id, submitted_at, ip`, the form's fields in definition order,
/// then any other keys found on submissions, sorted.
pub fn submissions_to_csv(form: &FormDefinition, subs: &[FormSubmission]) -> Result<String> {
    let mut columns: Vec<String> = form.fields.iter().map(|f| f.name.clone()).collect();
    let mut extra: Vec<String> = subs
        .iter()
        .flat_map(|s| s.data.keys())
        .filter(|k| !columns.contains(k))
        .cloned()
        .collect();
    extra.sort();
    extra.dedup();
    columns.extend(extra);

    let mut wtr = csv::Writer::from_writer(Vec::new());
    let mut header = vec!["id".to_string(), "submitted_at".to_string(), "ip".to_string()];
    header.extend(columns.iter().cloned());
    wtr.write_record(&header)?;

    for sub in subs {
        let mut row = vec![
            sub.id.to_string(),
            sub.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            sub.ip.clone().unwrap_or_default(),
        ];
        for col in &columns {
            row.push(sub.data.get(col).cloned().unwrap_or_default());
        }
        wtr.write_record(&row)?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| CmsError::Serialization(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| CmsError::Serialization(e.to_string()))
}
