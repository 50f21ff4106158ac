// service/ticket_service.rs
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::{
        ticketdb::{NewTicket, TicketExt},
        userdb::UserExt,
        DBClient,
    },
    models::{
        auditmodel::RequestContext,
        ticketmodel::{Ticket, TicketPriority, TicketStatus},
        usermodel::{User, UserRole},
    },
    service::{
        assignment_engine::AssignmentEngine, audit_service::AuditService,
        error::ServiceError, notification_service::NotificationService,
    },
    services::{
        preprocessor::{extract_keywords, DEFAULT_KEYWORD_COUNT},
        priority::PriorityPredictor,
        sentiment::{SentimentResult, SentimentScorer},
    },
};

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 100;

/// What the text heuristics derived from a ticket description.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TicketInsights {
    pub sentiment_score: f64,
    pub sentiment_label: String,
    pub predicted_priority: TicketPriority,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedTicket {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub sentiment_label: String,
    pub predicted_priority: TicketPriority,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CreateTicketInput {
    pub title: String,
    pub description: String,
    pub priority: Option<TicketPriority>,
    pub category: Option<String>,
}

/// Who gets a ticket and how they were chosen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assignee {
    pub agent_id: Uuid,
    pub automatic: bool,
    /// `None` when the capacity check itself failed.
    pub within_capacity: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct TicketService {
    db_client: Arc<DBClient>,
    scorer: Arc<dyn SentimentScorer>,
    priority_predictor: Arc<PriorityPredictor>,
    engine: AssignmentEngine,
    notification_service: Arc<NotificationService>,
    audit_service: Arc<AuditService>,
}

impl TicketService {
    pub fn new(
        db_client: Arc<DBClient>,
        scorer: Arc<dyn SentimentScorer>,
        priority_predictor: Arc<PriorityPredictor>,
        engine: AssignmentEngine,
        notification_service: Arc<NotificationService>,
        audit_service: Arc<AuditService>,
    ) -> Self {
        Self {
            db_client,
            scorer,
            priority_predictor,
            engine,
            notification_service,
            audit_service,
        }
    }

    pub fn analyze(&self, description: &str) -> TicketInsights {
        analyze_ticket_text(self.scorer.as_ref(), &self.priority_predictor, description)
    }

    /// Stores a new ticket enriched with sentiment, keywords and, when the
    /// requester gave none, a predicted priority.
    pub async fn create_ticket(
        &self,
        customer: &User,
        input: CreateTicketInput,
        context: &RequestContext,
    ) -> Result<CreatedTicket, ServiceError> {
        let insights = self.analyze(&input.description);
        let priority = input.priority.unwrap_or(insights.predicted_priority);

        let ticket = self
            .db_client
            .create_ticket(NewTicket {
                customer_id: customer.id,
                title: input.title,
                description: input.description,
                priority,
                sentiment_score: Some(insights.sentiment_score),
                category: input.category,
                tags: insights.keywords.clone(),
            })
            .await?;

        tracing::info!(
            "Ticket {} created by {} (priority {}, sentiment {} via {})",
            ticket.id,
            customer.id,
            ticket.priority.to_str(),
            insights.sentiment_score,
            self.scorer.name()
        );

        if let Err(e) = self
            .audit_service
            .log_ticket_creation(customer.id, &ticket, context)
            .await
        {
            tracing::warn!("Failed to audit ticket creation {}: {}", ticket.id, e);
        }

        Ok(CreatedTicket {
            ticket,
            sentiment_label: insights.sentiment_label,
            predicted_priority: insights.predicted_priority,
            keywords: insights.keywords,
        })
    }

    /// Customers see their own tickets, agents the ones assigned to them,
    /// admins everything.
    pub async fn list_tickets(
        &self,
        user: &User,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Ticket>, ServiceError> {
        let (limit, offset) = page_bounds(limit, offset);

        let tickets = match user.role {
            UserRole::Customer => {
                self.db_client
                    .get_customer_tickets(user.id, limit, offset)
                    .await?
            }
            UserRole::Agent => self.db_client.get_agent_tickets(user.id, limit, offset).await?,
            UserRole::Admin => self.db_client.get_all_tickets(limit, offset).await?,
        };

        Ok(tickets)
    }

    pub async fn get_ticket(&self, user: &User, ticket_id: Uuid) -> Result<Ticket, ServiceError> {
        let ticket = self
            .db_client
            .get_ticket(ticket_id)
            .await?
            .ok_or(ServiceError::TicketNotFound(ticket_id))?;

        if !can_view_ticket(user, &ticket) {
            return Err(ServiceError::Forbidden(user.id));
        }

        Ok(ticket)
    }

    pub async fn update_status(
        &self,
        user: &User,
        ticket_id: Uuid,
        status: TicketStatus,
        context: &RequestContext,
    ) -> Result<Ticket, ServiceError> {
        let previous = self
            .db_client
            .get_ticket(ticket_id)
            .await?
            .ok_or(ServiceError::TicketNotFound(ticket_id))?;

        let ticket = self
            .db_client
            .update_ticket_status(ticket_id, status)
            .await?
            .ok_or(ServiceError::TicketNotFound(ticket_id))?;

        tracing::info!(
            "Ticket {} status {} -> {} by {}",
            ticket.id,
            previous.status.to_str(),
            ticket.status.to_str(),
            user.id
        );

        if let Err(e) = self
            .audit_service
            .log_status_change(user.id, &ticket, previous.status, context)
            .await
        {
            tracing::warn!("Failed to audit status change on {}: {}", ticket.id, e);
        }

        Ok(ticket)
    }

    /// Assigns to `agent_id` when given, otherwise asks the assignment engine.
    pub async fn assign_ticket(
        &self,
        user: &User,
        ticket_id: Uuid,
        agent_id: Option<Uuid>,
        context: &RequestContext,
    ) -> Result<Ticket, ServiceError> {
        let ticket = self
            .db_client
            .get_ticket(ticket_id)
            .await?
            .ok_or(ServiceError::TicketNotFound(ticket_id))?;

        if let Some(agent_id) = agent_id {
            self.ensure_active_agent(agent_id).await?;
        }

        let Assignee {
            agent_id,
            automatic,
            within_capacity,
        } = choose_assignee(&self.engine, &ticket, agent_id).await?;

        let ticket = self
            .db_client
            .assign_ticket(ticket_id, agent_id)
            .await?
            .ok_or(ServiceError::TicketNotFound(ticket_id))?;

        tracing::info!(
            "Ticket {} assigned to {} ({}, within capacity: {:?})",
            ticket.id,
            agent_id,
            if automatic { "engine" } else { "manual" },
            within_capacity
        );

        if let Err(e) = self
            .notification_service
            .notify_ticket_assigned(agent_id, &ticket)
            .await
        {
            tracing::warn!("Failed to notify agent {}: {}", agent_id, e);
        }

        if let Err(e) = self
            .audit_service
            .log_assignment(user.id, &ticket, agent_id, automatic, context)
            .await
        {
            tracing::warn!("Failed to audit assignment of {}: {}", ticket.id, e);
        }

        Ok(ticket)
    }

    pub async fn agent_can_handle(
        &self,
        agent_id: Uuid,
        priority: TicketPriority,
    ) -> Result<bool, ServiceError> {
        self.ensure_active_agent(agent_id).await?;
        Ok(self.engine.can_handle(agent_id, priority).await?)
    }

    async fn ensure_active_agent(&self, agent_id: Uuid) -> Result<User, ServiceError> {
        let user = self.db_client.get_user(Some(agent_id), None).await?;
        check_active_agent(agent_id, user)
    }
}

/// `requested` must already be a verified agent; without one the engine
/// picks. Capacity is advisory and only logged.
pub async fn choose_assignee(
    engine: &AssignmentEngine,
    ticket: &Ticket,
    requested: Option<Uuid>,
) -> Result<Assignee, ServiceError> {
    let (agent_id, automatic) = match requested {
        Some(agent_id) => (agent_id, false),
        None => (
            engine
                .select_agent(ticket)
                .await?
                .ok_or(ServiceError::NoAgentsAvailable)?,
            true,
        ),
    };

    let within_capacity = match engine.can_handle(agent_id, ticket.priority).await {
        Ok(true) => Some(true),
        Ok(false) => {
            tracing::warn!(
                "Agent {} is at capacity but was assigned ticket {}",
                agent_id,
                ticket.id
            );
            Some(false)
        }
        Err(e) => {
            tracing::warn!("Capacity check for agent {} failed: {}", agent_id, e);
            None
        }
    };

    Ok(Assignee {
        agent_id,
        automatic,
        within_capacity,
    })
}

pub fn check_active_agent(agent_id: Uuid, user: Option<User>) -> Result<User, ServiceError> {
    let agent = user.ok_or(ServiceError::UserNotFound(agent_id))?;

    if agent.role != UserRole::Agent || !agent.is_active {
        return Err(ServiceError::NotAnAgent(agent_id));
    }

    Ok(agent)
}

pub fn analyze_ticket_text(
    scorer: &dyn SentimentScorer,
    priority_predictor: &PriorityPredictor,
    description: &str,
) -> TicketInsights {
    let SentimentResult { score, label } = scorer.analyze(description);

    TicketInsights {
        sentiment_score: score,
        sentiment_label: label.to_str().to_string(),
        predicted_priority: priority_predictor.predict(description, score),
        keywords: extract_keywords(description, DEFAULT_KEYWORD_COUNT),
    }
}

pub fn can_view_ticket(user: &User, ticket: &Ticket) -> bool {
    match user.role {
        UserRole::Customer => ticket.customer_id == user.id,
        UserRole::Agent | UserRole::Admin => true,
    }
}

fn page_bounds(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = offset.unwrap_or(0).max(0);
    (limit, offset)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::service::assignment_engine::tests::{engine, record, InMemoryPerformance};
    use crate::services::sentiment::HeuristicScorer;
    use chrono::Utc;

    pub(crate) fn user(role: UserRole) -> User {
        User {
            id: Uuid::new_v4(),
            email: "someone@example.com".to_string(),
            name: "Someone".to_string(),
            password: "hash".to_string(),
            role,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub(crate) fn ticket_for(customer_id: Uuid) -> Ticket {
        Ticket {
            id: Uuid::new_v4(),
            customer_id,
            title: "Cannot log in".to_string(),
            description: "The login page shows an error".to_string(),
            priority: TicketPriority::Medium,
            status: TicketStatus::Open,
            assigned_agent_id: None,
            sentiment_score: None,
            category: None,
            tags: vec![],
            attachment_ids: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn urgent_description_is_enriched() {
        let insights = analyze_ticket_text(
            &HeuristicScorer,
            &PriorityPredictor::heuristic(),
            "URGENT: production server is down, customers cannot checkout!",
        );

        assert_eq!(insights.predicted_priority, TicketPriority::Urgent);
        assert!((0.0..=1.0).contains(&insights.sentiment_score));
        assert!(insights.keywords.len() <= DEFAULT_KEYWORD_COUNT);
        assert_eq!(insights.keywords[0], "urgent");
    }

    #[test]
    fn empty_description_gets_defaults() {
        let insights =
            analyze_ticket_text(&HeuristicScorer, &PriorityPredictor::heuristic(), "");

        assert_eq!(insights.sentiment_score, 0.5);
        assert_eq!(insights.sentiment_label, "neutral");
        assert_eq!(insights.predicted_priority, TicketPriority::Medium);
        assert!(insights.keywords.is_empty());
    }

    #[test]
    fn customers_only_see_their_own_tickets() {
        let customer = user(UserRole::Customer);
        let other = user(UserRole::Customer);
        let ticket = ticket_for(customer.id);

        assert!(can_view_ticket(&customer, &ticket));
        assert!(!can_view_ticket(&other, &ticket));
        assert!(can_view_ticket(&user(UserRole::Agent), &ticket));
        assert!(can_view_ticket(&user(UserRole::Admin), &ticket));
    }

    #[test]
    fn manual_assignment_requires_an_active_agent() {
        let agent = user(UserRole::Agent);
        assert!(check_active_agent(agent.id, Some(agent.clone())).is_ok());

        let customer = user(UserRole::Customer);
        assert!(matches!(
            check_active_agent(customer.id, Some(customer.clone())),
            Err(ServiceError::NotAnAgent(id)) if id == customer.id
        ));

        let mut inactive = user(UserRole::Agent);
        inactive.is_active = false;
        assert!(matches!(
            check_active_agent(inactive.id, Some(inactive.clone())),
            Err(ServiceError::NotAnAgent(_))
        ));

        let missing = Uuid::new_v4();
        assert!(matches!(
            check_active_agent(missing, None),
            Err(ServiceError::UserNotFound(id)) if id == missing
        ));
    }

    #[tokio::test]
    async fn empty_directory_means_no_agents_available() {
        let engine = engine(vec![], InMemoryPerformance::default());
        let ticket = ticket_for(Uuid::new_v4());

        let err = choose_assignee(&engine, &ticket, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::NoAgentsAvailable));
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn engine_choice_is_marked_automatic() {
        let idle = Uuid::new_v4();
        let busy = Uuid::new_v4();
        let mut performance = InMemoryPerformance::default();
        performance.records.insert(idle, record(idle, 1, 4.0));
        performance.records.insert(busy, record(busy, 7, 4.0));
        let engine = engine(vec![busy, idle], performance);

        let assignee = choose_assignee(&engine, &ticket_for(Uuid::new_v4()), None)
            .await
            .unwrap();
        assert_eq!(
            assignee,
            Assignee {
                agent_id: idle,
                automatic: true,
                within_capacity: Some(true),
            }
        );
    }

    #[tokio::test]
    async fn agent_at_capacity_is_still_assigned() {
        let full = Uuid::new_v4();
        let mut performance = InMemoryPerformance::default();
        performance.records.insert(full, record(full, 10, 5.0));
        let engine = engine(vec![], performance);

        let assignee = choose_assignee(&engine, &ticket_for(Uuid::new_v4()), Some(full))
            .await
            .unwrap();
        assert_eq!(assignee.agent_id, full);
        assert!(!assignee.automatic);
        assert_eq!(assignee.within_capacity, Some(false));
    }

    #[tokio::test]
    async fn failed_capacity_check_does_not_block_assignment() {
        let agent = Uuid::new_v4();
        let mut performance = InMemoryPerformance::default();
        performance.failing = true;
        let engine = engine(vec![agent], performance);

        // metrics failure also sends the engine to the first listed agent
        let assignee = choose_assignee(&engine, &ticket_for(Uuid::new_v4()), None)
            .await
            .unwrap();
        assert_eq!(assignee.agent_id, agent);
        assert_eq!(assignee.within_capacity, None);
    }

    #[test]
    fn page_bounds_are_clamped() {
        assert_eq!(page_bounds(None, None), (DEFAULT_PAGE_SIZE, 0));
        assert_eq!(page_bounds(Some(1000), Some(-5)), (MAX_PAGE_SIZE, 0));
        assert_eq!(page_bounds(Some(0), Some(20)), (1, 20));
    }
}
