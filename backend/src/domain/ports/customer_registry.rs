//! Driving port for customer registry use-cases.

use async_trait::async_trait;

use crate::domain::{
    Customer, CustomerDetail, CustomerId, CustomerProfile, CustomerSummary, Error,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CustomerRegistry: Send + Sync {
    async fn list(&self) -> Result<Vec<CustomerSummary>, Error>;

    async fn search(&self, query: &str) -> Result<Vec<Customer>, Error>;

    /// Customer with every card they have held.
    async fn get(&self, id: &CustomerId) -> Result<CustomerDetail, Error>;

    /// Register a customer and issue their first card.
    async fn create(&self, profile: &CustomerProfile) -> Result<CustomerDetail, Error>;

    async fn update(&self, id: &CustomerId, profile: &CustomerProfile) -> Result<Customer, Error>;

    async fn delete(&self, id: &CustomerId) -> Result<(), Error>;
}
