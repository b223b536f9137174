//! RegisterCustomerHandler - Command handler for registering new customers.

use std::sync::Arc;

use crate::domain::billing::{BillingError, Customer};
use crate::domain::foundation::{CustomerId, EmailAddress};
use crate::ports::CustomerRepository;

/// Command to register a customer.
#[derive(Debug, Clone)]
pub struct RegisterCustomerCommand {
    pub email: String,
}

/// Result of a successful registration.
#[derive(Debug, Clone)]
pub struct RegisterCustomerResult {
    pub customer_id: CustomerId,
}

/// Handler for registering customers.
pub struct RegisterCustomerHandler {
    customers: Arc<dyn CustomerRepository>,
}

impl RegisterCustomerHandler {
    pub fn new(customers: Arc<dyn CustomerRepository>) -> Self {
        Self { customers }
    }

    pub async fn handle(
        &self,
        cmd: RegisterCustomerCommand,
    ) -> Result<RegisterCustomerResult, BillingError> {
        // 1. Validate the email
        let email = EmailAddress::new(&cmd.email)
            .map_err(|e| BillingError::validation("email", e.to_string()))?;

        // 2. Enforce unique email
        if self.customers.find_by_email(&email).await?.is_some() {
            return Err(BillingError::validation(
                "email",
                "Email is already registered",
            ));
        }

        // 3. Persist an empty aggregate
        let customer = Customer::register(CustomerId::new(), email);
        self.customers.save(&customer).await?;

        tracing::info!(customer_id = %customer.id, "customer registered");

        Ok(RegisterCustomerResult {
            customer_id: customer.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::in_memory::InMemoryCustomerRepository;

    #[tokio::test]
    async fn registers_a_customer_with_a_valid_email() {
        let customers = Arc::new(InMemoryCustomerRepository::new());
        let handler = RegisterCustomerHandler::new(customers.clone());

        let result = handler
            .handle(RegisterCustomerCommand {
                email: "ada@example.com".to_string(),
            })
            .await
            .unwrap();

        let stored = customers.find_by_id(&result.customer_id).await.unwrap().unwrap();
        assert_eq!(stored.email.as_str(), "ada@example.com");
        assert!(stored.subscriptions().is_empty());
    }

    #[tokio::test]
    async fn rejects_invalid_emails() {
        let handler = RegisterCustomerHandler::new(Arc::new(InMemoryCustomerRepository::new()));

        let err = handler
            .handle(RegisterCustomerCommand {
                email: "not-an-email".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::ValidationFailed { .. }));
    }

    #[tokio::test]
    async fn rejects_duplicate_emails() {
        let handler = RegisterCustomerHandler::new(Arc::new(InMemoryCustomerRepository::new()));
        let cmd = RegisterCustomerCommand {
            email: "ada@example.com".to_string(),
        };

        handler.handle(cmd.clone()).await.unwrap();
        let err = handler.handle(cmd).await.unwrap_err();
        assert!(matches!(err, BillingError::ValidationFailed { .. }));
    }
}
