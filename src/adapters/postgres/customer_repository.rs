//! PostgreSQL implementation of CustomerRepository.
//!
//! Persists the Customer aggregate across six tables: `customers`,
//! `subscriptions`, `invoices`, `payments`, `receipts`, and
//! `ledger_entries`. All writes for one aggregate happen inside a single
//! transaction, and the `customers.version` column detects concurrent
//! updates.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::domain::billing::{
    Account, Customer, DeactivationReason, Invoice, Ledger, LedgerEntry, Payment, Periodicity,
    PlanSnapshot, Receipt, Subscription,
};
use crate::domain::foundation::{
    CustomerId, DomainError, EmailAddress, ErrorCode, InvoiceId, LedgerEntryId, Money, PaymentId,
    ReceiptId, SubscriptionId, Timestamp,
};
use crate::ports::CustomerRepository;

/// PostgreSQL implementation of the CustomerRepository port.
///
/// Child records are append-only except for the few invoice columns that
/// change after generation (receipt, void, notification marks) and the
/// subscription end date; those are upserted on update.
pub struct PostgresCustomerRepository {
    pool: PgPool,
}

impl PostgresCustomerRepository {
    /// Creates a new PostgresCustomerRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_aggregate(
        &self,
        row: CustomerRow,
    ) -> Result<Customer, DomainError> {
        let customer_id = row.id;

        let subscription_rows: Vec<SubscriptionRow> = sqlx::query_as(
            r#"
            SELECT id, customer_id, description, periodicity, period_days, amount,
                   payable_upfront, subscribed_on, unsubscribed_on
            FROM subscriptions
            WHERE customer_id = $1
            ORDER BY subscribed_on ASC, id ASC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("load subscriptions", e))?;

        let invoice_rows: Vec<InvoiceRow> = sqlx::query_as(
            r#"
            SELECT id, customer_id, subscription_id, amount, period_start, period_end,
                   due_on, receipt_id, deleted_on, notified_pending_on,
                   notified_overdue_on, notified_paid_on
            FROM invoices
            WHERE customer_id = $1
            ORDER BY period_start ASC, id ASC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("load invoices", e))?;

        let payment_rows: Vec<PaymentRow> = sqlx::query_as(
            r#"
            SELECT id, customer_id, amount, received_on
            FROM payments
            WHERE customer_id = $1
            ORDER BY received_on ASC, id ASC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("load payments", e))?;

        let receipt_rows: Vec<ReceiptRow> = sqlx::query_as(
            r#"
            SELECT id, customer_id, paid_on
            FROM receipts
            WHERE customer_id = $1
            ORDER BY paid_on ASC, id ASC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("load receipts", e))?;

        let entry_rows: Vec<LedgerEntryRow> = sqlx::query_as(
            r#"
            SELECT id, customer_id, account, amount, subscription_id, invoice_id,
                   payment_id, receipt_id, entered_on
            FROM ledger_entries
            WHERE customer_id = $1
            ORDER BY entered_on ASC, id ASC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("load ledger entries", e))?;

        let subscriptions = subscription_rows
            .into_iter()
            .map(Subscription::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let invoices = invoice_rows
            .into_iter()
            .map(Invoice::from)
            .collect::<Vec<_>>();
        let payments = payment_rows
            .into_iter()
            .map(Payment::from)
            .collect::<Vec<_>>();
        let receipts = receipt_rows
            .into_iter()
            .map(Receipt::from)
            .collect::<Vec<_>>();
        let entries = entry_rows
            .into_iter()
            .map(LedgerEntry::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let email = EmailAddress::new(row.email)
            .map_err(|e| DomainError::new(ErrorCode::DatabaseError, format!("Invalid stored email: {}", e)))?;
        let reason = row
            .deactivation_reason
            .as_deref()
            .map(parse_deactivation_reason)
            .transpose()?;

        Ok(Customer::from_parts(
            CustomerId::from_uuid(row.id),
            email,
            row.deactivated_since.map(Timestamp::from_datetime),
            reason,
            row.version,
            subscriptions,
            invoices,
            payments,
            receipts,
            Ledger::from_entries(entries),
        ))
    }
}

/// Database row representation of a customer.
#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: Uuid,
    email: String,
    deactivated_since: Option<DateTime<Utc>>,
    deactivation_reason: Option<String>,
    version: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    customer_id: Uuid,
    description: String,
    periodicity: String,
    period_days: Option<i32>,
    amount: i64,
    payable_upfront: bool,
    subscribed_on: DateTime<Utc>,
    unsubscribed_on: Option<DateTime<Utc>>,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(Subscription {
            id: SubscriptionId::from_uuid(row.id),
            customer_id: CustomerId::from_uuid(row.customer_id),
            snapshot: PlanSnapshot {
                description: row.description,
                periodicity: parse_periodicity(&row.periodicity, row.period_days)?,
                amount: Money::from_minor_units(row.amount),
                payable_upfront: row.payable_upfront,
            },
            subscribed_on: Timestamp::from_datetime(row.subscribed_on),
            unsubscribed_on: row.unsubscribed_on.map(Timestamp::from_datetime),
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct InvoiceRow {
    id: Uuid,
    customer_id: Uuid,
    subscription_id: Uuid,
    amount: i64,
    period_start: DateTime<Utc>,
    period_end: DateTime<Utc>,
    due_on: DateTime<Utc>,
    receipt_id: Option<Uuid>,
    deleted_on: Option<DateTime<Utc>>,
    notified_pending_on: Option<DateTime<Utc>>,
    notified_overdue_on: Option<DateTime<Utc>>,
    notified_paid_on: Option<DateTime<Utc>>,
}

impl From<InvoiceRow> for Invoice {
    fn from(row: InvoiceRow) -> Self {
        Invoice {
            id: InvoiceId::from_uuid(row.id),
            customer_id: CustomerId::from_uuid(row.customer_id),
            subscription_id: SubscriptionId::from_uuid(row.subscription_id),
            amount: Money::from_minor_units(row.amount),
            period_start: Timestamp::from_datetime(row.period_start),
            period_end: Timestamp::from_datetime(row.period_end),
            due_on: Timestamp::from_datetime(row.due_on),
            receipt_id: row.receipt_id.map(ReceiptId::from_uuid),
            deleted_on: row.deleted_on.map(Timestamp::from_datetime),
            notified_pending_on: row.notified_pending_on.map(Timestamp::from_datetime),
            notified_overdue_on: row.notified_overdue_on.map(Timestamp::from_datetime),
            notified_paid_on: row.notified_paid_on.map(Timestamp::from_datetime),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    customer_id: Uuid,
    amount: i64,
    received_on: DateTime<Utc>,
}

impl From<PaymentRow> for Payment {
    fn from(row: PaymentRow) -> Self {
        Payment {
            id: PaymentId::from_uuid(row.id),
            customer_id: CustomerId::from_uuid(row.customer_id),
            amount: Money::from_minor_units(row.amount),
            received_on: Timestamp::from_datetime(row.received_on),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ReceiptRow {
    id: Uuid,
    customer_id: Uuid,
    paid_on: DateTime<Utc>,
}

impl From<ReceiptRow> for Receipt {
    fn from(row: ReceiptRow) -> Self {
        Receipt {
            id: ReceiptId::from_uuid(row.id),
            customer_id: CustomerId::from_uuid(row.customer_id),
            paid_on: Timestamp::from_datetime(row.paid_on),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LedgerEntryRow {
    id: Uuid,
    customer_id: Uuid,
    account: String,
    amount: i64,
    subscription_id: Option<Uuid>,
    invoice_id: Option<Uuid>,
    payment_id: Option<Uuid>,
    receipt_id: Option<Uuid>,
    entered_on: DateTime<Utc>,
}

impl TryFrom<LedgerEntryRow> for LedgerEntry {
    type Error = DomainError;

    fn try_from(row: LedgerEntryRow) -> Result<Self, Self::Error> {
        Ok(LedgerEntry {
            id: LedgerEntryId::from_uuid(row.id),
            customer_id: CustomerId::from_uuid(row.customer_id),
            account: parse_account(&row.account)?,
            amount: Money::from_minor_units(row.amount),
            subscription_id: row.subscription_id.map(SubscriptionId::from_uuid),
            invoice_id: row.invoice_id.map(InvoiceId::from_uuid),
            payment_id: row.payment_id.map(PaymentId::from_uuid),
            receipt_id: row.receipt_id.map(ReceiptId::from_uuid),
            entered_on: Timestamp::from_datetime(row.entered_on),
        })
    }
}

fn parse_periodicity(s: &str, days: Option<i32>) -> Result<Periodicity, DomainError> {
    match s {
        "weekly" => Ok(Periodicity::Weekly),
        "monthly" => Ok(Periodicity::Monthly),
        "yearly" => Ok(Periodicity::Yearly),
        "days" => {
            let days = days.filter(|d| *d > 0).ok_or_else(|| {
                DomainError::new(
                    ErrorCode::DatabaseError,
                    "Periodicity 'days' requires a positive period_days",
                )
            })?;
            Ok(Periodicity::Days(days as u32))
        }
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid periodicity value: {}", s),
        )),
    }
}

fn periodicity_to_columns(p: &Periodicity) -> (&'static str, Option<i32>) {
    match p {
        Periodicity::Weekly => ("weekly", None),
        Periodicity::Monthly => ("monthly", None),
        Periodicity::Yearly => ("yearly", None),
        Periodicity::Days(days) => ("days", Some(*days as i32)),
    }
}

fn parse_account(s: &str) -> Result<Account, DomainError> {
    match s {
        "cash" => Ok(Account::Cash),
        "receivable" => Ok(Account::Receivable),
        "revenue" => Ok(Account::Revenue),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid account value: {}", s),
        )),
    }
}

fn parse_deactivation_reason(s: &str) -> Result<DeactivationReason, DomainError> {
    match s {
        "left_voluntarily" => Ok(DeactivationReason::LeftVoluntarily),
        "debtor" => Ok(DeactivationReason::Debtor),
        _ => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid deactivation_reason value: {}", s),
        )),
    }
}

fn deactivation_reason_to_string(reason: &DeactivationReason) -> &'static str {
    match reason {
        DeactivationReason::LeftVoluntarily => "left_voluntarily",
        DeactivationReason::Debtor => "debtor",
    }
}

fn db_error(context: &str, e: sqlx::Error) -> DomainError {
    DomainError::new(
        ErrorCode::DatabaseError,
        format!("Failed to {}: {}", context, e),
    )
}

/// Writes the aggregate's child records inside an open transaction.
async fn persist_children(
    conn: &mut PgConnection,
    customer: &Customer,
) -> Result<(), DomainError> {
    for subscription in customer.subscriptions() {
        let (periodicity, period_days) = periodicity_to_columns(&subscription.snapshot.periodicity);
        sqlx::query(
            r#"
            INSERT INTO subscriptions (
                id, customer_id, description, periodicity, period_days, amount,
                payable_upfront, subscribed_on, unsubscribed_on
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET unsubscribed_on = EXCLUDED.unsubscribed_on
            "#,
        )
        .bind(subscription.id.as_uuid())
        .bind(subscription.customer_id.as_uuid())
        .bind(&subscription.snapshot.description)
        .bind(periodicity)
        .bind(period_days)
        .bind(subscription.snapshot.amount.minor_units())
        .bind(subscription.snapshot.payable_upfront)
        .bind(subscription.subscribed_on.as_datetime())
        .bind(subscription.unsubscribed_on.map(|t| *t.as_datetime()))
        .execute(&mut *conn)
        .await
        .map_err(|e| db_error("save subscription", e))?;
    }

    for receipt in customer.receipts() {
        sqlx::query(
            r#"
            INSERT INTO receipts (id, customer_id, paid_on)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(receipt.id.as_uuid())
        .bind(receipt.customer_id.as_uuid())
        .bind(receipt.paid_on.as_datetime())
        .execute(&mut *conn)
        .await
        .map_err(|e| db_error("save receipt", e))?;
    }

    for invoice in customer.invoices() {
        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, customer_id, subscription_id, amount, period_start, period_end,
                due_on, receipt_id, deleted_on, notified_pending_on,
                notified_overdue_on, notified_paid_on
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (id) DO UPDATE SET
                receipt_id = EXCLUDED.receipt_id,
                deleted_on = EXCLUDED.deleted_on,
                notified_pending_on = EXCLUDED.notified_pending_on,
                notified_overdue_on = EXCLUDED.notified_overdue_on,
                notified_paid_on = EXCLUDED.notified_paid_on
            "#,
        )
        .bind(invoice.id.as_uuid())
        .bind(invoice.customer_id.as_uuid())
        .bind(invoice.subscription_id.as_uuid())
        .bind(invoice.amount.minor_units())
        .bind(invoice.period_start.as_datetime())
        .bind(invoice.period_end.as_datetime())
        .bind(invoice.due_on.as_datetime())
        .bind(invoice.receipt_id.map(|id| *id.as_uuid()))
        .bind(invoice.deleted_on.map(|t| *t.as_datetime()))
        .bind(invoice.notified_pending_on.map(|t| *t.as_datetime()))
        .bind(invoice.notified_overdue_on.map(|t| *t.as_datetime()))
        .bind(invoice.notified_paid_on.map(|t| *t.as_datetime()))
        .execute(&mut *conn)
        .await
        .map_err(|e| db_error("save invoice", e))?;
    }

    for payment in customer.payments() {
        sqlx::query(
            r#"
            INSERT INTO payments (id, customer_id, amount, received_on)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.customer_id.as_uuid())
        .bind(payment.amount.minor_units())
        .bind(payment.received_on.as_datetime())
        .execute(&mut *conn)
        .await
        .map_err(|e| db_error("save payment", e))?;
    }

    for entry in customer.ledger().entries() {
        sqlx::query(
            r#"
            INSERT INTO ledger_entries (
                id, customer_id, account, amount, subscription_id, invoice_id,
                payment_id, receipt_id, entered_on
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(entry.customer_id.as_uuid())
        .bind(entry.account.as_str())
        .bind(entry.amount.minor_units())
        .bind(entry.subscription_id.map(|id| *id.as_uuid()))
        .bind(entry.invoice_id.map(|id| *id.as_uuid()))
        .bind(entry.payment_id.map(|id| *id.as_uuid()))
        .bind(entry.receipt_id.map(|id| *id.as_uuid()))
        .bind(entry.entered_on.as_datetime())
        .execute(&mut *conn)
        .await
        .map_err(|e| db_error("save ledger entry", e))?;
    }

    Ok(())
}

#[async_trait]
impl CustomerRepository for PostgresCustomerRepository {
    async fn save(&self, customer: &Customer) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("begin transaction", e))?;

        sqlx::query(
            r#"
            INSERT INTO customers (id, email, deactivated_since, deactivation_reason, version)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(customer.id.as_uuid())
        .bind(customer.email.as_str())
        .bind(customer.deactivated_since.map(|t| *t.as_datetime()))
        .bind(customer.deactivation_reason.as_ref().map(deactivation_reason_to_string))
        .bind(customer.version)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("customers_email_key") {
                    return DomainError::new(
                        ErrorCode::ValidationFailed,
                        "Email is already registered",
                    );
                }
            }
            db_error("save customer", e)
        })?;

        persist_children(&mut tx, customer).await?;

        tx.commit().await.map_err(|e| db_error("commit", e))
    }

    async fn update(&self, customer: &Customer) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("begin transaction", e))?;

        let result = sqlx::query(
            r#"
            UPDATE customers SET
                deactivated_since = $2,
                deactivation_reason = $3,
                version = version + 1
            WHERE id = $1 AND version = $4
            "#,
        )
        .bind(customer.id.as_uuid())
        .bind(customer.deactivated_since.map(|t| *t.as_datetime()))
        .bind(customer.deactivation_reason.as_ref().map(deactivation_reason_to_string))
        .bind(customer.version)
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("update customer", e))?;

        if result.rows_affected() == 0 {
            let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM customers WHERE id = $1")
                .bind(customer.id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| db_error("check customer existence", e))?;
            return Err(if exists.is_some() {
                DomainError::new(
                    ErrorCode::Conflict,
                    format!("Concurrent update on customer {}", customer.id),
                )
            } else {
                DomainError::new(
                    ErrorCode::CustomerNotFound,
                    format!("Customer not found: {}", customer.id),
                )
            });
        }

        persist_children(&mut tx, customer).await?;

        tx.commit().await.map_err(|e| db_error("commit", e))
    }

    async fn find_by_id(&self, id: &CustomerId) -> Result<Option<Customer>, DomainError> {
        let row: Option<CustomerRow> = sqlx::query_as(
            r#"
            SELECT id, email, deactivated_since, deactivation_reason, version
            FROM customers
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("find customer", e))?;

        match row {
            Some(row) => Ok(Some(self.load_aggregate(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Customer>, DomainError> {
        let row: Option<CustomerRow> = sqlx::query_as(
            r#"
            SELECT id, email, deactivated_since, deactivation_reason, version
            FROM customers
            WHERE email = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("find customer by email", e))?;

        match row {
            Some(row) => Ok(Some(self.load_aggregate(row).await?)),
            None => Ok(None),
        }
    }

    async fn list_ids(
        &self,
        after: Option<CustomerId>,
        limit: u32,
    ) -> Result<Vec<CustomerId>, DomainError> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT id FROM customers
            WHERE $1::uuid IS NULL OR id > $1
            ORDER BY id ASC
            LIMIT $2
            "#,
        )
        .bind(after.map(|id| *id.as_uuid()))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("list customer ids", e))?;

        Ok(rows.into_iter().map(|(id,)| CustomerId::from_uuid(id)).collect())
    }
}
