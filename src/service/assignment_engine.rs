// service/assignment_engine.rs
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::try_join_all;
use uuid::Uuid;

use crate::{
    db::{performancedb::PerformanceExt, userdb::UserExt, DBClient},
    models::{
        performancemodel::AgentPerformance,
        ticketmodel::{Ticket, TicketPriority},
    },
    service::error::ProviderError,
};

/// Agents at or above this many assigned tickets are over capacity.
pub const MAX_AGENT_WORKLOAD: i32 = 10;

const BASE_SCORE: f64 = 100.0;
const WORKLOAD_WEIGHT: f64 = 2.0;
const SATISFACTION_WEIGHT: f64 = 10.0;

/// Source of agents eligible for assignment, in a stable order.
#[async_trait]
pub trait AgentDirectory: Send + Sync {
    async fn list_agents(&self) -> Result<Vec<Uuid>, ProviderError>;
}

/// Per-agent aggregates. `Ok(None)` means the agent has no record yet.
#[async_trait]
pub trait PerformanceProvider: Send + Sync {
    async fn get(&self, agent_id: Uuid) -> Result<Option<AgentPerformance>, ProviderError>;
}

#[async_trait]
impl AgentDirectory for DBClient {
    async fn list_agents(&self) -> Result<Vec<Uuid>, ProviderError> {
        let agents = self.get_agents(true).await?;
        Ok(agents.into_iter().map(|agent| agent.id).collect())
    }
}

#[async_trait]
impl PerformanceProvider for DBClient {
    async fn get(&self, agent_id: Uuid) -> Result<Option<AgentPerformance>, ProviderError> {
        Ok(self.get_agent_performance(agent_id).await?)
    }
}

fn priority_bonus(priority: TicketPriority) -> f64 {
    match priority {
        TicketPriority::Urgent => 20.0,
        TicketPriority::High => 10.0,
        TicketPriority::Medium | TicketPriority::Low => 0.0,
    }
}

/// Score for one agent. A missing record scores as an idle agent with no
/// satisfaction data. The floor at zero applies to the full sum.
pub fn score_agent(performance: Option<&AgentPerformance>, priority: TicketPriority) -> f64 {
    let (workload, satisfaction) = performance
        .map(|p| (p.total_assigned_tickets as f64, p.customer_satisfaction_score))
        .unwrap_or((0.0, 0.0));

    let score = BASE_SCORE - workload * WORKLOAD_WEIGHT
        + satisfaction * SATISFACTION_WEIGHT
        + priority_bonus(priority);

    score.max(0.0)
}

#[derive(Clone)]
pub struct AssignmentEngine {
    directory: Arc<dyn AgentDirectory>,
    performance: Arc<dyn PerformanceProvider>,
    provider_timeout: Duration,
}

impl std::fmt::Debug for AssignmentEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssignmentEngine")
            .field("provider_timeout", &self.provider_timeout)
            .finish()
    }
}

impl AssignmentEngine {
    pub fn new(
        directory: Arc<dyn AgentDirectory>,
        performance: Arc<dyn PerformanceProvider>,
        provider_timeout: Duration,
    ) -> Self {
        Self {
            directory,
            performance,
            provider_timeout,
        }
    }

    pub async fn select_agent(&self, ticket: &Ticket) -> Result<Option<Uuid>, ProviderError> {
        self.select_agent_for_priority(ticket.priority).await
    }

    /// Picks the best-scoring agent. Ties go to the agent listed first.
    /// When metrics cannot be fetched the first listed agent is returned.
    pub async fn select_agent_for_priority(
        &self,
        priority: TicketPriority,
    ) -> Result<Option<Uuid>, ProviderError> {
        let agents = self.bounded(self.directory.list_agents()).await?;

        let Some(&first) = agents.first() else {
            tracing::info!("No agents available for assignment");
            return Ok(None);
        };

        let metrics = match try_join_all(
            agents
                .iter()
                .map(|&agent_id| self.bounded(self.performance.get(agent_id))),
        )
        .await
        {
            Ok(metrics) => metrics,
            Err(e) => {
                tracing::warn!(
                    "Agent metrics unavailable ({}); falling back to first agent {}",
                    e,
                    first
                );
                return Ok(Some(first));
            }
        };

        let mut best: Option<(Uuid, f64)> = None;
        for (&agent_id, performance) in agents.iter().zip(metrics.iter()) {
            let score = score_agent(performance.as_ref(), priority);
            tracing::debug!("Agent {} scored {} for {} ticket", agent_id, score, priority.to_str());

            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((agent_id, score)),
            }
        }

        Ok(best.map(|(agent_id, _)| agent_id))
    }

    /// Capacity advisory: true while the agent holds fewer than
    /// `MAX_AGENT_WORKLOAD` tickets. Priority does not change the answer.
    pub async fn can_handle(
        &self,
        agent_id: Uuid,
        _priority: TicketPriority,
    ) -> Result<bool, ProviderError> {
        let performance = self.bounded(self.performance.get(agent_id)).await?;
        let workload = performance.map(|p| p.total_assigned_tickets).unwrap_or(0);

        Ok(workload < MAX_AGENT_WORKLOAD)
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, ProviderError>
    where
        F: Future<Output = Result<T, ProviderError>>,
    {
        match tokio::time::timeout(self.provider_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(self.provider_timeout)),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;

    pub(crate) struct FixedDirectory(pub(crate) Result<Vec<Uuid>, ProviderError>);

    #[async_trait]
    impl AgentDirectory for FixedDirectory {
        async fn list_agents(&self) -> Result<Vec<Uuid>, ProviderError> {
            self.0.clone()
        }
    }

    #[derive(Default)]
    pub(crate) struct InMemoryPerformance {
        pub(crate) records: HashMap<Uuid, AgentPerformance>,
        pub(crate) failing: bool,
        pub(crate) delay: Option<Duration>,
    }

    #[async_trait]
    impl PerformanceProvider for InMemoryPerformance {
        async fn get(&self, agent_id: Uuid) -> Result<Option<AgentPerformance>, ProviderError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.failing {
                return Err(ProviderError::Transport("connection reset".into()));
            }
            Ok(self.records.get(&agent_id).cloned())
        }
    }

    pub(crate) fn record(agent_id: Uuid, assigned: i32, satisfaction: f64) -> AgentPerformance {
        AgentPerformance {
            agent_id,
            tickets_resolved: 0,
            average_response_time: 0.0,
            average_resolution_time: 0.0,
            customer_satisfaction_score: satisfaction,
            total_assigned_tickets: assigned,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub(crate) fn engine(agents: Vec<Uuid>, performance: InMemoryPerformance) -> AssignmentEngine {
        AssignmentEngine::new(
            Arc::new(FixedDirectory(Ok(agents))),
            Arc::new(performance),
            Duration::from_millis(100),
        )
    }

    fn two_agents() -> (Uuid, Uuid, InMemoryPerformance) {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut performance = InMemoryPerformance::default();
        performance.records.insert(a, record(a, 0, 5.0));
        performance.records.insert(b, record(b, 8, 5.0));
        (a, b, performance)
    }

    #[test]
    fn scores_medium_ticket() {
        let a = record(Uuid::new_v4(), 0, 5.0);
        let b = record(Uuid::new_v4(), 8, 5.0);
        assert_eq!(score_agent(Some(&a), TicketPriority::Medium), 150.0);
        assert_eq!(score_agent(Some(&b), TicketPriority::Medium), 134.0);
    }

    #[test]
    fn urgent_and_high_add_bonus() {
        let a = record(Uuid::new_v4(), 0, 5.0);
        let b = record(Uuid::new_v4(), 8, 5.0);
        assert_eq!(score_agent(Some(&a), TicketPriority::Urgent), 170.0);
        assert_eq!(score_agent(Some(&b), TicketPriority::Urgent), 154.0);
        assert_eq!(score_agent(Some(&a), TicketPriority::High), 160.0);
        assert_eq!(score_agent(Some(&a), TicketPriority::Low), 150.0);
    }

    #[test]
    fn missing_record_scores_as_idle_agent() {
        assert_eq!(score_agent(None, TicketPriority::Medium), 100.0);
    }

    #[test]
    fn score_is_floored_after_full_sum() {
        let overloaded = record(Uuid::new_v4(), 100, 0.0);
        assert_eq!(score_agent(Some(&overloaded), TicketPriority::Urgent), 0.0);

        // 100 - 110 + 20: clamping before the bonus would give 20
        let busy = record(Uuid::new_v4(), 55, 0.0);
        assert_eq!(score_agent(Some(&busy), TicketPriority::Urgent), 10.0);
    }

    #[tokio::test]
    async fn selects_least_loaded_agent() {
        let (a, b, performance) = two_agents();
        let engine = engine(vec![b, a], performance);

        let selected = engine
            .select_agent_for_priority(TicketPriority::Medium)
            .await
            .unwrap();
        assert_eq!(selected, Some(a));
    }

    #[tokio::test]
    async fn urgent_bonus_keeps_ordering() {
        let (a, b, performance) = two_agents();
        let engine = engine(vec![a, b], performance);

        let selected = engine
            .select_agent_for_priority(TicketPriority::Urgent)
            .await
            .unwrap();
        assert_eq!(selected, Some(a));
    }

    #[tokio::test]
    async fn ties_go_to_first_listed_agent() {
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let mut performance = InMemoryPerformance::default();
        performance.records.insert(first, record(first, 3, 4.0));
        performance.records.insert(second, record(second, 3, 4.0));
        let engine = engine(vec![first, second], performance);

        let selected = engine
            .select_agent_for_priority(TicketPriority::High)
            .await
            .unwrap();
        assert_eq!(selected, Some(first));
    }

    #[tokio::test]
    async fn empty_directory_selects_nobody() {
        let engine = engine(vec![], InMemoryPerformance::default());

        let selected = engine
            .select_agent_for_priority(TicketPriority::Urgent)
            .await
            .unwrap();
        assert_eq!(selected, None);
    }

    #[tokio::test]
    async fn metrics_failure_falls_back_to_first_agent() {
        let (a, b, mut performance) = two_agents();
        performance.failing = true;
        let engine = engine(vec![b, a], performance);

        let selected = engine
            .select_agent_for_priority(TicketPriority::Medium)
            .await
            .unwrap();
        assert_eq!(selected, Some(b));
    }

    #[tokio::test]
    async fn metrics_timeout_falls_back_to_first_agent() {
        let (a, b, mut performance) = two_agents();
        performance.delay = Some(Duration::from_millis(500));
        let engine = engine(vec![b, a], performance);

        let selected = engine
            .select_agent_for_priority(TicketPriority::Medium)
            .await
            .unwrap();
        assert_eq!(selected, Some(b));
    }

    #[tokio::test]
    async fn directory_failure_propagates() {
        let engine = AssignmentEngine::new(
            Arc::new(FixedDirectory(Err(ProviderError::Transport("down".into())))),
            Arc::new(InMemoryPerformance::default()),
            Duration::from_millis(100),
        );

        let err = engine
            .select_agent_for_priority(TicketPriority::Low)
            .await
            .unwrap_err();
        assert_eq!(err, ProviderError::Transport("down".into()));
    }

    #[tokio::test]
    async fn can_handle_below_capacity_only() {
        let nine = Uuid::new_v4();
        let ten = Uuid::new_v4();
        let unknown = Uuid::new_v4();
        let mut performance = InMemoryPerformance::default();
        performance.records.insert(nine, record(nine, 9, 1.0));
        performance.records.insert(ten, record(ten, 10, 5.0));
        let engine = engine(vec![nine, ten], performance);

        for priority in [TicketPriority::Low, TicketPriority::Urgent] {
            assert!(engine.can_handle(nine, priority).await.unwrap());
            assert!(!engine.can_handle(ten, priority).await.unwrap());
            assert!(engine.can_handle(unknown, priority).await.unwrap());
        }
    }

    #[tokio::test]
    async fn can_handle_reports_provider_errors() {
        let mut performance = InMemoryPerformance::default();
        performance.failing = true;
        let engine = engine(vec![], performance);

        assert!(engine
            .can_handle(Uuid::new_v4(), TicketPriority::Medium)
            .await
            .is_err());
    }
}
