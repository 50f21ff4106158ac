use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::usermodel::{User, UserRole};

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct RegisterUserDto {
    #[validate(custom = "validate_name")]
    pub name: String,

    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Invalid email format")
    )]
    pub email: String,

    #[validate(custom = "validate_password_strength")]
    pub password: String,
}

/// Role given to every self-registered account. Agents come from
/// `CreateAgentDto` only.
pub const SELF_REGISTERED_ROLE: UserRole = UserRole::Customer;

/// Admin-only agent creation; the role is fixed.
#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct CreateAgentDto {
    #[validate(custom = "validate_name")]
    pub name: String,

    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Invalid email format")
    )]
    pub email: String,

    #[validate(custom = "validate_password_strength")]
    pub password: String,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct LoginUserDto {
    #[validate(length(min = 1, message = "Email is required"), email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenDto {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetActiveDto {
    pub is_active: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FilterUserDto {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub is_active: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl FilterUserDto {
    pub fn filter_user(user: &User) -> Self {
        FilterUserDto {
            id: user.id.to_string(),
            name: user.name.to_owned(),
            email: user.email.to_owned(),
            role: user.role.to_str().to_string(),
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }

    pub fn filter_users(users: &[User]) -> Vec<FilterUserDto> {
        users.iter().map(FilterUserDto::filter_user).collect()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserData {
    pub user: FilterUserDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponseDto {
    pub status: String,
    pub data: UserData,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserListResponseDto {
    pub status: String,
    pub users: Vec<FilterUserDto>,
    pub results: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserLoginResponseDto {
    pub status: String,
    pub token: String,
    pub user: FilterUserDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenValidationDto {
    pub valid: bool,
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
}

#[derive(Serialize, Deserialize)]
pub struct Response {
    pub status: &'static str,
    pub message: String,
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().chars().count() < 2 {
        return Err(with_message("name_too_short", "Name must be at least 2 characters"));
    }
    if name.chars().count() > 100 {
        return Err(with_message("name_too_long", "Name must not exceed 100 characters"));
    }
    Ok(())
}

fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    static UPPER: OnceLock<Regex> = OnceLock::new();
    static LOWER: OnceLock<Regex> = OnceLock::new();
    static DIGIT: OnceLock<Regex> = OnceLock::new();

    if password.chars().count() < 8 {
        return Err(with_message("password_too_short", "Password must be at least 8 characters"));
    }
    if !UPPER.get_or_init(|| Regex::new("[A-Z]").expect("valid regex")).is_match(password) {
        return Err(with_message("password_no_upper", "Password must contain uppercase letter"));
    }
    if !LOWER.get_or_init(|| Regex::new("[a-z]").expect("valid regex")).is_match(password) {
        return Err(with_message("password_no_lower", "Password must contain lowercase letter"));
    }
    if !DIGIT.get_or_init(|| Regex::new("[0-9]").expect("valid regex")).is_match(password) {
        return Err(with_message("password_no_digit", "Password must contain digit"));
    }
    Ok(())
}

fn with_message(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(name: &str, email: &str, password: &str) -> RegisterUserDto {
        RegisterUserDto {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn accepts_valid_registration() {
        assert!(register("Ada", "ada@example.com", "Secret123").validate().is_ok());
    }

    #[test]
    fn rejects_weak_passwords() {
        for password in ["Short1", "alllower123", "ALLUPPER123", "NoDigitsHere"] {
            assert!(
                register("Ada", "ada@example.com", password).validate().is_err(),
                "{password} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_bad_names_and_emails() {
        assert!(register(" A ", "ada@example.com", "Secret123").validate().is_err());
        assert!(register(&"x".repeat(101), "ada@example.com", "Secret123").validate().is_err());
        assert!(register("Ada", "not-an-email", "Secret123").validate().is_err());
    }

    #[test]
    fn requested_role_is_ignored_on_registration() {
        let dto: RegisterUserDto = serde_json::from_str(
            r#"{"name":"Ada","email":"ada@example.com","password":"Secret123","role":"admin"}"#,
        )
        .unwrap();

        assert!(dto.validate().is_ok());
        assert!(serde_json::to_value(&dto).unwrap().get("role").is_none());
        assert_eq!(SELF_REGISTERED_ROLE, UserRole::Customer);
    }
}
