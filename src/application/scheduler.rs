//! BillingScheduler - Background service for periodic billing work.
//!
//! Each tick runs two passes over the whole customer base:
//! 1. **Invoice generation** - every open subscription gets invoices for
//!    all elapsed periods (idempotent per subscription and period).
//! 2. **Debtor sweep** - active customers with overdue unsettled invoices
//!    are deactivated with reason `debtor`.
//!
//! One customer failing never aborts the tick: the failure is logged at
//! `warn` and the batch continues. Ticks take an explicit `now` so tests
//! can drive billing time without waiting.
//!
//! ## Graceful Shutdown
//!
//! The service listens for a shutdown signal and completes the current
//! tick before stopping.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;

use crate::domain::billing::{BillingError, DeactivationReason};
use crate::domain::foundation::{CustomerId, Timestamp};
use crate::ports::CustomerRepository;

use super::customer_locks::CustomerLocks;

/// Configuration for the BillingScheduler service.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// How often to run a billing tick.
    pub tick_interval: Duration,

    /// How many customer ids to load per repository page.
    pub page_size: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(3600),
            page_size: 100,
        }
    }
}

impl SchedulerConfig {
    /// Create config with a custom tick interval.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Create config with a custom page size.
    pub fn with_page_size(mut self, size: u32) -> Self {
        self.page_size = size;
        self
    }
}

/// What one tick accomplished.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Customers visited.
    pub customers_processed: usize,
    /// Invoices generated across all customers.
    pub invoices_generated: usize,
    /// Customers deactivated by the debtor sweep.
    pub debtors_deactivated: usize,
    /// Customers skipped because their processing failed.
    pub failures: usize,
}

/// Background service driving invoice generation and the debtor sweep.
pub struct BillingScheduler {
    customers: Arc<dyn CustomerRepository>,
    locks: CustomerLocks,
    config: SchedulerConfig,
}

impl BillingScheduler {
    /// Create a new BillingScheduler with default configuration.
    pub fn new(customers: Arc<dyn CustomerRepository>, locks: CustomerLocks) -> Self {
        Self {
            customers,
            locks,
            config: SchedulerConfig::default(),
        }
    }

    /// Create a new BillingScheduler with custom configuration.
    pub fn with_config(
        customers: Arc<dyn CustomerRepository>,
        locks: CustomerLocks,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            customers,
            locks,
            config,
        }
    }

    /// Run the scheduler loop until shutdown signal is received.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), BillingError> {
        let mut interval = time::interval(self.config.tick_interval);

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        tracing::info!("billing scheduler shutting down");
                        return Ok(());
                    }
                }

                _ = interval.tick() => {
                    let summary = self.tick(Timestamp::now()).await?;
                    tracing::info!(
                        customers = summary.customers_processed,
                        invoices = summary.invoices_generated,
                        debtors = summary.debtors_deactivated,
                        failures = summary.failures,
                        "billing tick complete"
                    );
                }
            }
        }
    }

    /// Run one full billing pass at the given instant.
    ///
    /// Pages through every customer id; a failure on one customer is
    /// counted and logged, never propagated. Only paging errors are fatal.
    pub async fn tick(&self, now: Timestamp) -> Result<TickSummary, BillingError> {
        let mut summary = TickSummary::default();
        let mut cursor: Option<CustomerId> = None;

        loop {
            let page = self
                .customers
                .list_ids(cursor, self.config.page_size)
                .await?;
            let Some(last) = page.last().copied() else {
                break;
            };
            cursor = Some(last);

            for customer_id in page {
                summary.customers_processed += 1;
                match self.process_customer(customer_id, now).await {
                    Ok((generated, deactivated)) => {
                        summary.invoices_generated += generated;
                        if deactivated {
                            summary.debtors_deactivated += 1;
                        }
                    }
                    Err(e) => {
                        summary.failures += 1;
                        tracing::warn!(
                            customer_id = %customer_id,
                            error = %e,
                            "billing tick failed for customer"
                        );
                    }
                }
            }
        }

        Ok(summary)
    }

    /// Invoice generation plus debtor sweep for one customer.
    async fn process_customer(
        &self,
        customer_id: CustomerId,
        now: Timestamp,
    ) -> Result<(usize, bool), BillingError> {
        let _guard = self.locks.acquire(customer_id).await;

        let Some(mut customer) = self.customers.find_by_id(&customer_id).await? else {
            // deleted between paging and processing
            return Ok((0, false));
        };

        let generated = customer.generate_due_invoices(now)?;

        let mut deactivated = false;
        if !customer.is_deactivated() && customer.is_debtor(now) {
            customer.deactivate(DeactivationReason::Debtor, now);
            deactivated = true;
        }

        if !generated.is_empty() || deactivated {
            self.customers.update(&customer).await?;
        }
        Ok((generated.len(), deactivated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::in_memory::InMemoryCustomerRepository;
    use crate::domain::billing::{Customer, Periodicity, Plan};
    use crate::domain::foundation::{EmailAddress, Money, PlanId};

    fn day(n: i64) -> Timestamp {
        Timestamp::from_unix_secs(1_735_689_600).add_days(n)
    }

    fn monthly_plan() -> Plan {
        Plan::new(
            PlanId::new(),
            "pro",
            "pro plan",
            Periodicity::Monthly,
            Money::from_major_units(50),
            false,
        )
    }

    async fn seed_customer(
        repo: &InMemoryCustomerRepository,
        email: &str,
        subscribed_on: Timestamp,
    ) -> CustomerId {
        let mut customer =
            Customer::register(CustomerId::new(), EmailAddress::new(email).unwrap());
        customer.subscribe_to_plan(&monthly_plan(), subscribed_on).unwrap();
        repo.save(&customer).await.unwrap();
        customer.id
    }

    fn scheduler(repo: Arc<InMemoryCustomerRepository>) -> BillingScheduler {
        BillingScheduler::with_config(
            repo,
            CustomerLocks::new(),
            SchedulerConfig::default().with_page_size(2),
        )
    }

    #[tokio::test]
    async fn tick_generates_elapsed_invoices_for_everyone() {
        let repo = Arc::new(InMemoryCustomerRepository::new());
        let a = seed_customer(&repo, "a@example.com", day(0)).await;
        let b = seed_customer(&repo, "b@example.com", day(0)).await;
        let scheduler = scheduler(repo.clone());

        // January elapsed: one catch-up invoice each
        let summary = scheduler.tick(day(32)).await.unwrap();

        assert_eq!(summary.customers_processed, 2);
        assert_eq!(summary.invoices_generated, 2);
        for id in [a, b] {
            let customer = repo.find_by_id(&id).await.unwrap().unwrap();
            assert_eq!(customer.invoices().len(), 2);
        }
    }

    #[tokio::test]
    async fn tick_is_idempotent_within_a_period() {
        let repo = Arc::new(InMemoryCustomerRepository::new());
        seed_customer(&repo, "a@example.com", day(0)).await;
        let scheduler = scheduler(repo.clone());

        scheduler.tick(day(32)).await.unwrap();
        let second = scheduler.tick(day(32)).await.unwrap();

        assert_eq!(second.invoices_generated, 0);
        // second tick also re-sweeps without error
        assert_eq!(second.failures, 0);
    }

    #[tokio::test]
    async fn sweep_deactivates_overdue_customers() {
        let repo = Arc::new(InMemoryCustomerRepository::new());
        let debtor = seed_customer(&repo, "debtor@example.com", day(0)).await;
        let fresh = seed_customer(&repo, "fresh@example.com", day(31)).await;
        let scheduler = scheduler(repo.clone());

        // first invoice due day 31; overdue at day 32
        let summary = scheduler.tick(day(32)).await.unwrap();
        assert_eq!(summary.debtors_deactivated, 1);

        let stored = repo.find_by_id(&debtor).await.unwrap().unwrap();
        assert!(stored.is_deactivated());
        assert_eq!(stored.deactivation_reason, Some(DeactivationReason::Debtor));

        let stored = repo.find_by_id(&fresh).await.unwrap().unwrap();
        assert!(!stored.is_deactivated());
    }

    #[tokio::test]
    async fn sweep_ignores_customers_who_paid() {
        let repo = Arc::new(InMemoryCustomerRepository::new());
        let id = seed_customer(&repo, "a@example.com", day(0)).await;
        {
            let mut customer = repo.find_by_id(&id).await.unwrap().unwrap();
            customer.credit_payment(Money::from_major_units(50), day(10)).unwrap();
            repo.update(&customer).await.unwrap();
        }
        let scheduler = scheduler(repo.clone());

        let summary = scheduler.tick(day(32)).await.unwrap();
        assert_eq!(summary.debtors_deactivated, 0);

        let stored = repo.find_by_id(&id).await.unwrap().unwrap();
        assert!(!stored.is_deactivated());
        // February invoice was still generated
        assert_eq!(stored.invoices().len(), 2);
    }

    #[tokio::test]
    async fn pages_through_more_customers_than_one_page() {
        let repo = Arc::new(InMemoryCustomerRepository::new());
        for i in 0..5 {
            seed_customer(&repo, &format!("u{}@example.com", i), day(0)).await;
        }
        let scheduler = scheduler(repo.clone());

        let summary = scheduler.tick(day(1)).await.unwrap();
        assert_eq!(summary.customers_processed, 5);
    }

    #[tokio::test]
    async fn run_stops_on_shutdown_signal() {
        let repo = Arc::new(InMemoryCustomerRepository::new());
        let scheduler = BillingScheduler::with_config(
            repo,
            CustomerLocks::new(),
            SchedulerConfig::default().with_tick_interval(Duration::from_millis(5)),
        );
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(async move { scheduler.run(rx).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send(true).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }
}
