use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::ticketmodel::{TicketPriority, TicketStatus};

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct CreateTicketDto {
    #[validate(custom = "validate_title")]
    pub title: String,

    #[validate(custom = "validate_description")]
    pub description: String,

    /// Omitted means "use the predicted priority".
    pub priority: Option<TicketPriority>,

    #[validate(length(max = 100, message = "Category must not exceed 100 characters"))]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTicketStatusDto {
    pub status: TicketStatus,
}

/// An absent `agent_id` hands the choice to the assignment engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssignTicketDto {
    pub agent_id: Option<Uuid>,
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct CreateCommentDto {
    #[validate(length(min = 1, max = 5000, message = "Comment must be 1-5000 characters"))]
    pub content: String,

    #[serde(default)]
    pub is_internal: bool,
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCommentDto {
    #[validate(length(min = 1, max = 5000, message = "Comment must be 1-5000 characters"))]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct CapacityQueryDto {
    pub priority: Option<TicketPriority>,
}

fn validate_title(title: &str) -> Result<(), ValidationError> {
    bounded_text(title, 5, 200, "Title")
}

fn validate_description(description: &str) -> Result<(), ValidationError> {
    bounded_text(description, 10, 5000, "Description")
}

/// Minimum applies to the trimmed text, maximum to the raw text.
fn bounded_text(
    value: &str,
    min: usize,
    max: usize,
    field: &'static str,
) -> Result<(), ValidationError> {
    if value.trim().chars().count() < min {
        let mut error = ValidationError::new("too_short");
        error.message = Some(format!("{field} must be at least {min} characters").into());
        return Err(error);
    }
    if value.chars().count() > max {
        let mut error = ValidationError::new("too_long");
        error.message = Some(format!("{field} must not exceed {max} characters").into());
        return Err(error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(title: &str, description: &str) -> CreateTicketDto {
        CreateTicketDto {
            title: title.to_string(),
            description: description.to_string(),
            priority: None,
            category: None,
        }
    }

    #[test]
    fn title_and_description_bounds() {
        assert!(ticket("Login fails", "I cannot log in since this morning").validate().is_ok());
        assert!(ticket("   Hi   ", "I cannot log in since this morning").validate().is_err());
        assert!(ticket(&"t".repeat(201), "I cannot log in since this morning").validate().is_err());
        assert!(ticket("Login fails", "too short").validate().is_err());
        assert!(ticket("Login fails", &"d".repeat(5001)).validate().is_err());
    }

    #[test]
    fn assign_body_may_be_empty() {
        let dto: AssignTicketDto = serde_json::from_str("{}").unwrap();
        assert!(dto.agent_id.is_none());
    }

    #[test]
    fn priority_parses_from_wire_form() {
        let dto: CreateTicketDto = serde_json::from_str(
            r#"{"title":"Login fails","description":"I cannot log in since this morning","priority":"urgent"}"#,
        )
        .unwrap();
        assert_eq!(dto.priority, Some(TicketPriority::Urgent));
    }
}
