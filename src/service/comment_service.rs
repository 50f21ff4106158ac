// service/comment_service.rs
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    db::{commentdb::CommentExt, ticketdb::TicketExt, DBClient},
    models::{
        commentmodel::Comment,
        usermodel::{User, UserRole},
    },
    service::{error::ServiceError, ticket_service::can_view_ticket},
};

#[derive(Debug, Clone)]
pub struct CommentService {
    db_client: Arc<DBClient>,
}

impl CommentService {
    pub fn new(db_client: Arc<DBClient>) -> Self {
        Self { db_client }
    }

    pub async fn create_comment(
        &self,
        author: &User,
        ticket_id: Uuid,
        content: &str,
        is_internal: bool,
    ) -> Result<Comment, ServiceError> {
        self.ensure_ticket_visible(author, ticket_id).await?;

        if is_internal && author.role == UserRole::Customer {
            return Err(ServiceError::Forbidden(author.id));
        }

        let content = sanitize_content(content)?;
        let comment = self
            .db_client
            .create_comment(ticket_id, author.id, &content, is_internal)
            .await?;

        tracing::info!("Comment {} added to ticket {} by {}", comment.id, ticket_id, author.id);
        Ok(comment)
    }

    /// Oldest first; internal notes are hidden from customers.
    pub async fn list_comments(
        &self,
        user: &User,
        ticket_id: Uuid,
    ) -> Result<Vec<Comment>, ServiceError> {
        self.ensure_ticket_visible(user, ticket_id).await?;

        let include_internal = user.role != UserRole::Customer;
        Ok(self
            .db_client
            .get_ticket_comments(ticket_id, include_internal)
            .await?)
    }

    pub async fn update_comment(
        &self,
        user: &User,
        comment_id: Uuid,
        content: &str,
    ) -> Result<Comment, ServiceError> {
        self.ensure_can_modify(user, comment_id).await?;

        let content = sanitize_content(content)?;
        self.db_client
            .update_comment(comment_id, &content)
            .await?
            .ok_or(ServiceError::CommentNotFound(comment_id))
    }

    pub async fn delete_comment(&self, user: &User, comment_id: Uuid) -> Result<(), ServiceError> {
        self.ensure_can_modify(user, comment_id).await?;

        if !self.db_client.delete_comment(comment_id).await? {
            return Err(ServiceError::CommentNotFound(comment_id));
        }

        tracing::info!("Comment {} deleted by {}", comment_id, user.id);
        Ok(())
    }

    async fn ensure_ticket_visible(&self, user: &User, ticket_id: Uuid) -> Result<(), ServiceError> {
        let ticket = self
            .db_client
            .get_ticket(ticket_id)
            .await?
            .ok_or(ServiceError::TicketNotFound(ticket_id))?;

        if !can_view_ticket(user, &ticket) {
            return Err(ServiceError::Forbidden(user.id));
        }
        Ok(())
    }

    async fn ensure_can_modify(&self, user: &User, comment_id: Uuid) -> Result<Comment, ServiceError> {
        let comment = self
            .db_client
            .get_comment(comment_id)
            .await?
            .ok_or(ServiceError::CommentNotFound(comment_id))?;

        if !can_modify_comment(user, &comment) {
            return Err(ServiceError::Forbidden(user.id));
        }
        Ok(comment)
    }
}

pub fn can_modify_comment(user: &User, comment: &Comment) -> bool {
    user.role == UserRole::Admin || comment.author_id == user.id
}

pub const MAX_COMMENT_CHARS: usize = 5000;

/// Strips HTML tags and stores the remaining text as plain text. Content
/// that is empty once cleaned, or too long, is rejected.
pub fn sanitize_content(content: &str) -> Result<String, ServiceError> {
    let cleaned = ammonia::Builder::default()
        .tags(HashSet::new())
        .clean(content)
        .to_string();
    let cleaned = decode_entities(&cleaned);
    let cleaned = cleaned.trim();

    if cleaned.is_empty() {
        return Err(ServiceError::Validation("Comment content is required".to_string()));
    }
    if cleaned.chars().count() > MAX_COMMENT_CHARS {
        return Err(ServiceError::Validation(format!(
            "Comment must not exceed {} characters",
            MAX_COMMENT_CHARS
        )));
    }

    Ok(cleaned.to_string())
}

// `&amp;` goes last so escaped entity text is not decoded twice.
fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace('\u{a0}', " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ticket_service::tests::user;
    use chrono::Utc;

    fn comment_by(author_id: Uuid) -> Comment {
        Comment {
            id: Uuid::new_v4(),
            ticket_id: Uuid::new_v4(),
            author_id,
            content: "Looking into it".to_string(),
            is_internal: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn strips_markup_from_content() {
        let cleaned = sanitize_content("<b>Still</b> broken <script>alert(1)</script>").unwrap();
        assert_eq!(cleaned, "Still broken");
    }

    #[test]
    fn plain_text_is_stored_unescaped() {
        let text = r#"Total is < 5 & price > 3, see "docs""#;
        assert_eq!(sanitize_content(text).unwrap(), text);
    }

    #[test]
    fn escaped_entities_in_text_survive_once() {
        assert_eq!(sanitize_content("write &amp;lt; for <").unwrap(), "write &lt; for <");
    }

    #[test]
    fn rejects_content_over_limit_after_cleaning() {
        let long = "a".repeat(MAX_COMMENT_CHARS + 1);
        assert!(matches!(sanitize_content(&long), Err(ServiceError::Validation(_))));

        let tagged = format!("<b>{}</b>", "a".repeat(MAX_COMMENT_CHARS));
        assert_eq!(sanitize_content(&tagged).unwrap().len(), MAX_COMMENT_CHARS);
    }

    #[test]
    fn rejects_blank_content() {
        assert!(matches!(
            sanitize_content("   <p></p> "),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn only_author_or_admin_can_modify() {
        let author = user(UserRole::Agent);
        let comment = comment_by(author.id);

        assert!(can_modify_comment(&author, &comment));
        assert!(can_modify_comment(&user(UserRole::Admin), &comment));
        assert!(!can_modify_comment(&user(UserRole::Agent), &comment));
        assert!(!can_modify_comment(&user(UserRole::Customer), &comment));
    }
}
