//! Authentication and authorization primitives.
//!
//! Roles are stored on staff accounts; capabilities are what a route asks
//! for. The inbound gate resolves a [`Principal`] from the session and calls
//! [`Principal::authorize`] so role checks live in exactly one place.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::domain::{Error, StaffId};

/// Domain error returned when login payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginValidationError {
    /// Email was missing or blank once trimmed.
    EmptyEmail,
    /// Password was blank.
    EmptyPassword,
}

impl fmt::Display for LoginValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
        }
    }
}

impl std::error::Error for LoginValidationError {}

/// Validated login credentials used by authentication services.
///
/// ## Invariants
/// - `email` is trimmed, lower-cased, and non-empty.
/// - `password` is non-empty but keeps caller-provided whitespace.
///
/// # Examples
/// ```
/// use punchcard::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" Admin@Example.com ", "admin123").unwrap();
/// assert_eq!(creds.email(), "admin@example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, LoginValidationError> {
        let normalized = email.trim();
        if normalized.is_empty() {
            return Err(LoginValidationError::EmptyEmail);
        }
        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }
        Ok(Self {
            email: normalized.to_lowercase(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Normalised email suitable for staff lookups.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Staff account role. The only authorization axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Staff,
    Manager,
}

/// Returned when a role string is not one of `staff` or `manager`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleParseError(String);

impl fmt::Display for RoleParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid role '{}': expected staff or manager", self.0)
    }
}

impl std::error::Error for RoleParseError {}

impl Role {
    /// Stable lowercase name stored in the database and sessions.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Staff => "staff",
            Self::Manager => "manager",
        }
    }

    /// Whether this role carries `capability`. Managers hold every
    /// capability staff hold.
    pub const fn grants(self, capability: Capability) -> bool {
        match (self, capability) {
            (_, Capability::Staff) => true,
            (Self::Manager, Capability::Manager) => true,
            (Self::Staff, Capability::Manager) => false,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "staff" => Ok(Self::Staff),
            "manager" => Ok(Self::Manager),
            other => Err(RoleParseError(other.to_owned())),
        }
    }
}

/// Capability a route requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Customer, punchcard, redemption, and sync operations.
    Staff,
    /// Staff-account management.
    Manager,
}

/// Authenticated caller resolved from the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    staff_id: StaffId,
    role: Role,
}

impl Principal {
    pub const fn new(staff_id: StaffId, role: Role) -> Self {
        Self { staff_id, role }
    }

    pub const fn staff_id(&self) -> StaffId {
        self.staff_id
    }

    pub const fn role(&self) -> Role {
        self.role
    }

    /// Reject the call with `403 Forbidden` when the role lacks `capability`.
    ///
    /// # Examples
    /// ```
    /// use punchcard::domain::{Capability, ErrorCode, Principal, Role, StaffId};
    ///
    /// let principal = Principal::new(StaffId::random(), Role::Staff);
    /// assert!(principal.authorize(Capability::Staff).is_ok());
    /// let err = principal.authorize(Capability::Manager).unwrap_err();
    /// assert_eq!(err.code(), ErrorCode::Forbidden);
    /// ```
    pub fn authorize(&self, capability: Capability) -> Result<(), Error> {
        if self.role.grants(capability) {
            Ok(())
        } else {
            Err(Error::forbidden("manager access required"))
        }
    }
}

/// Validated password replacement request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPassword(Zeroizing<String>);

impl NewPassword {
    pub fn new(password: &str) -> Result<Self, LoginValidationError> {
        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }
        Ok(Self(Zeroizing::new(password.to_owned())))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    #[rstest]
    #[case("", "pw", LoginValidationError::EmptyEmail)]
    #[case("   ", "pw", LoginValidationError::EmptyEmail)]
    #[case("a@b.test", "", LoginValidationError::EmptyPassword)]
    fn invalid_credentials(
        #[case] email: &str,
        #[case] password: &str,
        #[case] expected: LoginValidationError,
    ) {
        let err = LoginCredentials::try_from_parts(email, password)
            .expect_err("invalid inputs must fail");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn password_whitespace_is_preserved() {
        let creds = LoginCredentials::try_from_parts("a@b.test", " pw ").expect("valid");
        assert_eq!(creds.password(), " pw ");
    }

    #[rstest]
    #[case(Role::Staff, Capability::Staff, true)]
    #[case(Role::Staff, Capability::Manager, false)]
    #[case(Role::Manager, Capability::Staff, true)]
    #[case(Role::Manager, Capability::Manager, true)]
    fn role_grants(#[case] role: Role, #[case] capability: Capability, #[case] expected: bool) {
        assert_eq!(role.grants(capability), expected);
    }

    #[rstest]
    fn insufficient_role_is_forbidden_not_unauthorized() {
        let principal = Principal::new(StaffId::random(), Role::Staff);
        let err = principal
            .authorize(Capability::Manager)
            .expect_err("staff cannot manage staff");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[rstest]
    #[case("staff", Ok(Role::Staff))]
    #[case("manager", Ok(Role::Manager))]
    #[case("owner", Err(RoleParseError("owner".to_owned())))]
    fn parses_roles(#[case] raw: &str, #[case] expected: Result<Role, RoleParseError>) {
        assert_eq!(raw.parse::<Role>(), expected);
    }
}
