use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use unicode_normalization::UnicodeNormalization;

pub const USER_NAME_MIN_LEN: usize = 3;
pub const USER_NAME_MAX_LEN: usize = 50;
pub const PASSWORD_MIN_LEN: usize = 8;
/// bcrypt only looks at the first 72 bytes.
pub const PASSWORD_MAX_LEN: usize = 72;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OperatorRole {
    #[default]
    Standard,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operator {
    pub id: i64,
    pub user_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: OperatorRole,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Operator {
    pub fn has_admin_role(&self) -> bool {
        matches!(self.role, OperatorRole::Admin)
    }
}

/// Registration form submitted to `/operator/save`.
///
/// Missing fields deserialize as empty strings so they surface as
/// validation errors on the form instead of a rejected request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateOperator {
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub password: String,
}

impl CreateOperator {
    pub fn normalized(mut self) -> Self {
        self.user_name = normalize_user_name(&self.user_name);
        self
    }

    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::default();
        validate_user_name(&self.user_name, &mut errors);
        if self.password.is_empty() {
            errors.add("password", "Password is required");
        } else {
            validate_password(&self.password, &mut errors);
        }
        errors
    }
}

/// Edit form submitted to `/operator/update`. A blank password keeps the
/// stored one.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateOperator {
    pub id: i64,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub password: String,
}

impl UpdateOperator {
    pub fn normalized(mut self) -> Self {
        self.user_name = normalize_user_name(&self.user_name);
        self
    }

    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::default();
        validate_user_name(&self.user_name, &mut errors);
        if !self.password.is_empty() {
            validate_password(&self.password, &mut errors);
        }
        errors
    }

    pub fn new_password(&self) -> Option<&str> {
        (!self.password.is_empty()).then_some(self.password.as_str())
    }
}

/// What the register and edit templates bind to. Never carries a password.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OperatorForm {
    pub id: Option<i64>,
    pub user_name: String,
    pub role: Option<OperatorRole>,
}

impl From<&Operator> for OperatorForm {
    fn from(operator: &Operator) -> Self {
        Self {
            id: Some(operator.id),
            user_name: operator.user_name.clone(),
            role: Some(operator.role),
        }
    }
}

impl From<&CreateOperator> for OperatorForm {
    fn from(input: &CreateOperator) -> Self {
        Self {
            id: None,
            user_name: input.user_name.clone(),
            role: None,
        }
    }
}

impl From<&UpdateOperator> for OperatorForm {
    fn from(input: &UpdateOperator) -> Self {
        Self {
            id: Some(input.id),
            user_name: input.user_name.clone(),
            role: None,
        }
    }
}

/// Field name -> message, rendered next to the offending input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<&'static str, String>);

impl ValidationErrors {
    /// Keeps the first message per field.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }
}

/// Trim and NFKC-normalize so visually identical names collide on the
/// unique index.
pub fn normalize_user_name(raw: &str) -> String {
    raw.trim().nfkc().collect()
}

fn validate_user_name(user_name: &str, errors: &mut ValidationErrors) {
    let len = user_name.chars().count();
    if len == 0 {
        errors.add("user_name", "User name is required");
    } else if !(USER_NAME_MIN_LEN..=USER_NAME_MAX_LEN).contains(&len) {
        errors.add(
            "user_name",
            format!(
                "User name must be between {} and {} characters",
                USER_NAME_MIN_LEN, USER_NAME_MAX_LEN
            ),
        );
    } else if !user_name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        errors.add(
            "user_name",
            "User name may only contain letters, digits, '.', '_' and '-'",
        );
    }
}

fn validate_password(password: &str, errors: &mut ValidationErrors) {
    if !(PASSWORD_MIN_LEN..=PASSWORD_MAX_LEN).contains(&password.len()) {
        errors.add(
            "password",
            format!(
                "Password must be between {} and {} bytes",
                PASSWORD_MIN_LEN, PASSWORD_MAX_LEN
            ),
        );
    }
}
