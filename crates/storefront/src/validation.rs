//! Client-side form validation.
//!
//! Forms are checked before any request is made; a valid form converts into
//! the matching API request type. Every violated rule is reported, not just
//! the first.

use std::fmt;

use driphub_core::Email;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::api::{LoginRequest, ResetPasswordRequest, SignupRequest};

/// Characters that satisfy the special-character rule.
const SPECIAL_CHARS: &str = "!@#$%^&*(),.?\":{}|<>";

/// A single failed rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Form field the rule applies to
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// One or more form rules failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", format_violations(.violations))]
pub struct ValidationError {
    violations: Vec<Violation>,
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    /// Every failed rule, in check order.
    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Messages for one field.
    pub fn messages_for(&self, field: &str) -> impl Iterator<Item = &str> {
        self.violations
            .iter()
            .filter(move |v| v.field == field)
            .map(|v| v.message.as_str())
    }
}

/// Collects violations while a form is checked.
#[derive(Default)]
struct Checker {
    violations: Vec<Violation>,
}

impl Checker {
    fn fail(&mut self, field: &'static str, message: impl Into<String>) {
        self.violations.push(Violation {
            field,
            message: message.into(),
        });
    }

    fn finish(self) -> Result<(), ValidationError> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                violations: self.violations,
            })
        }
    }
}

/// Password strength requirements. All rules are on by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordRules {
    pub min_length: usize,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_digit: bool,
    pub require_special: bool,
}

impl Default for PasswordRules {
    fn default() -> Self {
        Self {
            min_length: 8,
            require_uppercase: true,
            require_lowercase: true,
            require_digit: true,
            require_special: true,
        }
    }
}

impl PasswordRules {
    fn check(&self, password: &str, checker: &mut Checker) {
        if password.chars().count() < self.min_length {
            checker.fail(
                "password",
                format!(
                    "Password must be at least {} characters long",
                    self.min_length
                ),
            );
        }
        if self.require_uppercase && !password.chars().any(char::is_uppercase) {
            checker.fail(
                "password",
                "Password must contain at least one uppercase letter",
            );
        }
        if self.require_lowercase && !password.chars().any(char::is_lowercase) {
            checker.fail(
                "password",
                "Password must contain at least one lowercase letter",
            );
        }
        if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            checker.fail("password", "Password must contain at least one number");
        }
        if self.require_special && !password.chars().any(|c| SPECIAL_CHARS.contains(c)) {
            checker.fail(
                "password",
                "Password must contain at least one special character",
            );
        }
    }
}

/// Check an email address.
///
/// # Errors
///
/// Returns a violation on the `email` field if the address is malformed.
pub fn validate_email(email: &str) -> Result<Email, ValidationError> {
    let mut checker = Checker::default();
    check_email(email, &mut checker).ok_or_else(|| ValidationError {
        violations: checker.violations,
    })
}

/// Check a password against `rules`.
///
/// # Errors
///
/// Returns every rule the password breaks.
pub fn validate_password(password: &str, rules: &PasswordRules) -> Result<(), ValidationError> {
    let mut checker = Checker::default();
    rules.check(password, &mut checker);
    checker.finish()
}

fn check_email(email: &str, checker: &mut Checker) -> Option<Email> {
    if email.trim().is_empty() {
        checker.fail("email", "Email is required");
        return None;
    }
    match Email::parse(email) {
        Ok(email) => Some(email),
        Err(_) => {
            checker.fail("email", "Please enter a valid email address");
            None
        }
    }
}

/// Registration form.
#[derive(Debug, Clone)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: SecretString,
    pub confirm_password: SecretString,
}

impl SignupForm {
    /// Validate and convert into a signup request.
    ///
    /// # Errors
    ///
    /// Returns every failed rule across all fields.
    pub fn validate(&self, rules: &PasswordRules) -> Result<SignupRequest, ValidationError> {
        let mut checker = Checker::default();
        if self.name.trim().is_empty() {
            checker.fail("name", "Name is required");
        }
        let email = check_email(&self.email, &mut checker);
        rules.check(self.password.expose_secret(), &mut checker);
        if self.password.expose_secret() != self.confirm_password.expose_secret() {
            checker.fail("confirm_password", "Passwords do not match");
        }
        checker.finish()?;

        Ok(SignupRequest {
            name: self.name.trim().to_string(),
            email: email.map_or_else(|| self.email.trim().to_string(), String::from),
            password: self.password.clone(),
        })
    }
}

/// Login form.
#[derive(Debug, Clone)]
pub struct LoginForm {
    pub email: String,
    pub password: SecretString,
}

impl LoginForm {
    /// Validate and convert into a login request.
    ///
    /// Strength rules are not applied at login; only presence is checked.
    ///
    /// # Errors
    ///
    /// Returns every failed rule.
    pub fn validate(&self) -> Result<LoginRequest, ValidationError> {
        let mut checker = Checker::default();
        let email = check_email(&self.email, &mut checker);
        if self.password.expose_secret().is_empty() {
            checker.fail("password", "Password is required");
        }
        checker.finish()?;

        Ok(LoginRequest {
            email: email.map_or_else(|| self.email.trim().to_string(), String::from),
            password: self.password.clone(),
        })
    }
}

/// Password reset form.
#[derive(Debug, Clone)]
pub struct ResetPasswordForm {
    pub token: SecretString,
    pub password: SecretString,
    pub confirm_password: SecretString,
}

impl ResetPasswordForm {
    /// Validate and convert into a reset request.
    ///
    /// # Errors
    ///
    /// Returns every failed rule.
    pub fn validate(&self, rules: &PasswordRules) -> Result<ResetPasswordRequest, ValidationError> {
        let mut checker = Checker::default();
        if self.token.expose_secret().trim().is_empty() {
            checker.fail("token", "Reset token is required");
        }
        rules.check(self.password.expose_secret(), &mut checker);
        if self.password.expose_secret() != self.confirm_password.expose_secret() {
            checker.fail("confirm_password", "Passwords do not match");
        }
        checker.finish()?;

        Ok(ResetPasswordRequest {
            token: self.token.clone(),
            password: self.password.clone(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    #[test]
    fn test_validate_email() {
        assert_eq!(
            validate_email(" ada@example.com ").unwrap().as_str(),
            "ada@example.com"
        );
        let err = validate_email("ada@localhost").unwrap_err();
        assert_eq!(
            err.messages_for("email").collect::<Vec<_>>(),
            vec!["Please enter a valid email address"]
        );
        assert!(validate_email("").is_err());
    }

    #[test]
    fn test_password_rules_report_every_failure() {
        let rules = PasswordRules::default();
        validate_password("Sturdy#Pass1", &rules).unwrap();

        let err = validate_password("abc", &rules).unwrap_err();
        let messages: Vec<_> = err.messages_for("password").collect();
        assert_eq!(
            messages,
            vec![
                "Password must be at least 8 characters long",
                "Password must contain at least one uppercase letter",
                "Password must contain at least one number",
                "Password must contain at least one special character",
            ]
        );
    }

    #[test]
    fn test_relaxed_rules() {
        let rules = PasswordRules {
            min_length: 6,
            require_uppercase: false,
            require_lowercase: false,
            require_digit: false,
            require_special: false,
        };
        validate_password("simple", &rules).unwrap();
        assert!(validate_password("short", &rules).is_err());
    }

    #[test]
    fn test_signup_form() {
        let form = SignupForm {
            name: "  Ada Lovelace ".to_string(),
            email: "ada@example.com".to_string(),
            password: secret("Engine#1843"),
            confirm_password: secret("Engine#1843"),
        };
        let request = form.validate(&PasswordRules::default()).unwrap();
        assert_eq!(request.name, "Ada Lovelace");
        assert_eq!(request.email, "ada@example.com");

        let mismatched = SignupForm {
            confirm_password: secret("Engine#1844"),
            name: String::new(),
            ..form
        };
        let err = mismatched.validate(&PasswordRules::default()).unwrap_err();
        assert_eq!(err.messages_for("name").count(), 1);
        assert_eq!(
            err.messages_for("confirm_password").collect::<Vec<_>>(),
            vec!["Passwords do not match"]
        );
    }

    #[test]
    fn test_login_form() {
        let form = LoginForm {
            email: "ada@example.com".to_string(),
            password: secret("x"),
        };
        assert_eq!(form.validate().unwrap().email, "ada@example.com");

        let empty = LoginForm {
            email: "nope".to_string(),
            password: secret(""),
        };
        let err = empty.validate().unwrap_err();
        assert_eq!(err.violations().len(), 2);
        assert!(err.to_string().contains("password: Password is required"));
    }

    #[test]
    fn test_reset_form() {
        let form = ResetPasswordForm {
            token: secret("reset-token"),
            password: secret("New#Pass99"),
            confirm_password: secret("New#Pass99"),
        };
        form.validate(&PasswordRules::default()).unwrap();

        let bad = ResetPasswordForm {
            token: secret(" "),
            ..form
        };
        let err = bad.validate(&PasswordRules::default()).unwrap_err();
        assert_eq!(err.messages_for("token").count(), 1);
    }
}
