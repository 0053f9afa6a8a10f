//! Staff accounts.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::domain::{NewPassword, Role, StaffId};

/// Validation errors raised while building staff drafts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaffValidationError {
    EmptyEmail,
    EmptyName,
    EmptyPassword,
    InvalidRole { value: String },
}

impl fmt::Display for StaffValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::EmptyName => write!(f, "name must not be empty"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::InvalidRole { value } => {
                write!(f, "invalid role '{value}': expected staff or manager")
            }
        }
    }
}

impl std::error::Error for StaffValidationError {}

impl StaffValidationError {
    /// Request field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyEmail => "email",
            Self::EmptyName => "name",
            Self::EmptyPassword => "password",
            Self::InvalidRole { .. } => "role",
        }
    }
}

/// A staff account as exposed to callers. Never carries the credential hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffMember {
    pub id: StaffId,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Validated input for creating a staff account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffDraft {
    email: String,
    name: String,
    role: Role,
    password: NewPassword,
}

fn parse_name(name: &str) -> Result<String, StaffValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(StaffValidationError::EmptyName);
    }
    Ok(trimmed.to_owned())
}

fn parse_role(role: &str) -> Result<Role, StaffValidationError> {
    role.parse().map_err(|_| StaffValidationError::InvalidRole {
        value: role.to_owned(),
    })
}

impl StaffDraft {
    /// Validate raw request fields.
    ///
    /// # Examples
    /// ```
    /// use punchcard::domain::{Role, StaffDraft};
    ///
    /// let draft = StaffDraft::try_from_parts("Sam@Cafe.test", "s3cret", "Sam", "staff").unwrap();
    /// assert_eq!(draft.email(), "sam@cafe.test");
    /// assert_eq!(draft.role(), Role::Staff);
    /// ```
    pub fn try_from_parts(
        email: &str,
        password: &str,
        name: &str,
        role: &str,
    ) -> Result<Self, StaffValidationError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(StaffValidationError::EmptyEmail);
        }
        let password =
            NewPassword::new(password).map_err(|_| StaffValidationError::EmptyPassword)?;
        Ok(Self {
            email: email.to_lowercase(),
            name: parse_name(name)?,
            role: parse_role(role)?,
            password,
        })
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn password(&self) -> &NewPassword {
        &self.password
    }
}

/// Validated name/role edit applied by a manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffUpdate {
    pub name: String,
    pub role: Role,
}

impl StaffUpdate {
    pub fn try_from_parts(name: &str, role: &str) -> Result<Self, StaffValidationError> {
        Ok(Self {
            name: parse_name(name)?,
            role: parse_role(role)?,
        })
    }
}
