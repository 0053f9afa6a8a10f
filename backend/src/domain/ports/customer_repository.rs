//! Port abstraction for the customer registry.
use async_trait::async_trait;

use crate::domain::{
    Capacity, Customer, CustomerId, CustomerProfile, CustomerSummary, ExternalCustomerId,
    NewCustomer, Punchcard, PurchaseStats,
};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by customer repository adapters.
    pub enum CustomerRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "customer repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "customer repository query failed: {message}",
        /// Another customer already uses this email.
        DuplicateEmail { email: String } => "a customer with email {email} already exists",
        /// Another customer is already linked to this external id.
        DuplicateExternalId { external_id: String } =>
            "a customer linked to external id {external_id} already exists",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// All customers, newest first, with card and redemption counts.
    async fn list_summaries(&self) -> Result<Vec<CustomerSummary>, CustomerRepositoryError>;

    /// Case-insensitive substring match on name, email, or phone.
    async fn search(&self, query: &str) -> Result<Vec<Customer>, CustomerRepositoryError>;

    async fn find(&self, id: &CustomerId) -> Result<Option<Customer>, CustomerRepositoryError>;

    async fn find_by_email(&self, email: &str)
    -> Result<Option<Customer>, CustomerRepositoryError>;

    async fn find_by_external_id(
        &self,
        external_id: &ExternalCustomerId,
    ) -> Result<Option<Customer>, CustomerRepositoryError>;

    /// Insert the customer and its first active card (zero punches) in one
    /// transaction, pointing the customer's active card at it.
    async fn create_with_punchcard(
        &self,
        customer: &NewCustomer,
        capacity: Capacity,
    ) -> Result<(Customer, Punchcard), CustomerRepositoryError>;

    /// Overwrite staff-editable fields. `Ok(None)` when the customer is gone.
    async fn update_profile(
        &self,
        id: &CustomerId,
        profile: &CustomerProfile,
    ) -> Result<Option<Customer>, CustomerRepositoryError>;

    /// Overwrite profile and purchase statistics from the commerce system.
    /// Never touches punchcards.
    async fn apply_external(
        &self,
        id: &CustomerId,
        profile: &CustomerProfile,
        stats: &PurchaseStats,
    ) -> Result<Option<Customer>, CustomerRepositoryError>;

    /// Delete the customer, cascading to punchcards and redemptions.
    async fn delete(&self, id: &CustomerId) -> Result<bool, CustomerRepositoryError>;
}
