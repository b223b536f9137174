//! In-memory implementation of PlanRepository.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::billing::Plan;
use crate::domain::foundation::{DomainError, PlanId};
use crate::ports::PlanRepository;

/// In-memory plan catalogue for testing and development.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPlanRepository {
    plans: Arc<RwLock<HashMap<PlanId, Plan>>>,
}

impl InMemoryPlanRepository {
    /// Creates an empty catalogue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalogue pre-seeded with the given plans.
    pub fn with_plans(plans: impl IntoIterator<Item = Plan>) -> Self {
        let map = plans.into_iter().map(|p| (p.id, p)).collect();
        Self {
            plans: Arc::new(RwLock::new(map)),
        }
    }
}

#[async_trait]
impl PlanRepository for InMemoryPlanRepository {
    async fn save(&self, plan: &Plan) -> Result<(), DomainError> {
        self.plans.write().await.insert(plan.id, plan.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &PlanId) -> Result<Option<Plan>, DomainError> {
        Ok(self.plans.read().await.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Plan>, DomainError> {
        let mut plans: Vec<Plan> = self.plans.read().await.values().cloned().collect();
        plans.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(plans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::Periodicity;
    use crate::domain::foundation::Money;

    fn plan(name: &str) -> Plan {
        Plan::new(
            PlanId::new(),
            name,
            format!("{} description", name),
            Periodicity::Monthly,
            Money::from_major_units(10),
            false,
        )
    }

    #[tokio::test]
    async fn list_is_ordered_by_name() {
        let repo = InMemoryPlanRepository::with_plans([plan("pro"), plan("basic")]);
        let names: Vec<String> = repo.list().await.unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["basic", "pro"]);
    }

    #[tokio::test]
    async fn save_overwrites_existing_plan() {
        let repo = InMemoryPlanRepository::new();
        let mut plan = plan("basic");
        repo.save(&plan).await.unwrap();

        plan.amount = Money::from_major_units(20);
        repo.save(&plan).await.unwrap();

        let found = repo.find_by_id(&plan.id).await.unwrap().unwrap();
        assert_eq!(found.amount, Money::from_major_units(20));
    }
}
