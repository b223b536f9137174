//! PostgreSQL implementation of PlanRepository.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::billing::{Periodicity, Plan};
use crate::domain::foundation::{DomainError, ErrorCode, Money, PlanId};
use crate::ports::PlanRepository;

/// PostgreSQL implementation of the PlanRepository port.
pub struct PostgresPlanRepository {
    pool: PgPool,
}

impl PostgresPlanRepository {
    /// Creates a new PostgresPlanRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a plan.
#[derive(Debug, sqlx::FromRow)]
struct PlanRow {
    id: Uuid,
    name: String,
    description: String,
    periodicity: String,
    period_days: Option<i32>,
    amount: i64,
    payable_upfront: bool,
}

impl TryFrom<PlanRow> for Plan {
    type Error = DomainError;

    fn try_from(row: PlanRow) -> Result<Self, Self::Error> {
        let periodicity = match (row.periodicity.as_str(), row.period_days) {
            ("weekly", _) => Periodicity::Weekly,
            ("monthly", _) => Periodicity::Monthly,
            ("yearly", _) => Periodicity::Yearly,
            ("days", Some(days)) if days > 0 => Periodicity::Days(days as u32),
            (other, _) => {
                return Err(DomainError::new(
                    ErrorCode::DatabaseError,
                    format!("Invalid periodicity value: {}", other),
                ))
            }
        };
        Ok(Plan {
            id: PlanId::from_uuid(row.id),
            name: row.name,
            description: row.description,
            periodicity,
            amount: Money::from_minor_units(row.amount),
            payable_upfront: row.payable_upfront,
        })
    }
}

fn periodicity_columns(p: &Periodicity) -> (&'static str, Option<i32>) {
    match p {
        Periodicity::Weekly => ("weekly", None),
        Periodicity::Monthly => ("monthly", None),
        Periodicity::Yearly => ("yearly", None),
        Periodicity::Days(days) => ("days", Some(*days as i32)),
    }
}

#[async_trait]
impl PlanRepository for PostgresPlanRepository {
    async fn save(&self, plan: &Plan) -> Result<(), DomainError> {
        let (periodicity, period_days) = periodicity_columns(&plan.periodicity);

        sqlx::query(
            r#"
            INSERT INTO plans (id, name, description, periodicity, period_days, amount, payable_upfront)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                periodicity = EXCLUDED.periodicity,
                period_days = EXCLUDED.period_days,
                amount = EXCLUDED.amount,
                payable_upfront = EXCLUDED.payable_upfront
            "#,
        )
        .bind(plan.id.as_uuid())
        .bind(&plan.name)
        .bind(&plan.description)
        .bind(periodicity)
        .bind(period_days)
        .bind(plan.amount.minor_units())
        .bind(plan.payable_upfront)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to save plan: {}", e))
        })?;

        Ok(())
    }

    async fn find_by_id(&self, id: &PlanId) -> Result<Option<Plan>, DomainError> {
        let row: Option<PlanRow> = sqlx::query_as(
            r#"
            SELECT id, name, description, periodicity, period_days, amount, payable_upfront
            FROM plans
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to find plan: {}", e))
        })?;

        row.map(Plan::try_from).transpose()
    }

    async fn list(&self) -> Result<Vec<Plan>, DomainError> {
        let rows: Vec<PlanRow> = sqlx::query_as(
            r#"
            SELECT id, name, description, periodicity, period_days, amount, payable_upfront
            FROM plans
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to list plans: {}", e))
        })?;

        rows.into_iter().map(Plan::try_from).collect()
    }
}
