//! Customer registry service implementing the [`CustomerRegistry`] driving port.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::domain::ports::{
    CustomerRegistry, CustomerRepository, CustomerRepositoryError, PunchcardRepository,
    PunchcardRepositoryError,
};
use crate::domain::{
    Capacity, Customer, CustomerDetail, CustomerId, CustomerProfile, CustomerSummary, Error,
    NewCustomer, PurchaseStats,
};

pub(crate) fn map_customer_error(error: CustomerRepositoryError) -> Error {
    match error {
        CustomerRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("customer repository unavailable: {message}"))
        }
        CustomerRepositoryError::Query { message } => {
            Error::internal(format!("customer repository error: {message}"))
        }
        CustomerRepositoryError::DuplicateEmail { email } => {
            Error::conflict("a customer with this email already exists")
                .with_details(json!({ "field": "email", "value": email }))
        }
        CustomerRepositoryError::DuplicateExternalId { external_id } => {
            Error::conflict("a customer is already linked to this external id")
                .with_details(json!({ "field": "externalId", "value": external_id }))
        }
    }
}

pub(crate) fn map_punchcard_error(error: PunchcardRepositoryError) -> Error {
    match error {
        PunchcardRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("punchcard repository unavailable: {message}"))
        }
        PunchcardRepositoryError::Query { message } => {
            Error::internal(format!("punchcard repository error: {message}"))
        }
        PunchcardRepositoryError::StaleCard { punchcard_id } => {
            Error::conflict("punchcard changed concurrently, retry the request")
                .with_details(json!({ "punchcardId": punchcard_id, "code": "stale_punchcard" }))
        }
    }
}

pub(crate) fn customer_not_found(id: &CustomerId) -> Error {
    Error::not_found(format!("customer {id} not found"))
}

/// Customer registry service.
#[derive(Clone)]
pub struct CustomerService<C, P> {
    customer_repo: Arc<C>,
    punchcard_repo: Arc<P>,
    capacity: Capacity,
}

impl<C, P> CustomerService<C, P> {
    pub fn new(customer_repo: Arc<C>, punchcard_repo: Arc<P>) -> Self {
        Self {
            customer_repo,
            punchcard_repo,
            capacity: Capacity::DEFAULT,
        }
    }
}

#[async_trait]
impl<C, P> CustomerRegistry for CustomerService<C, P>
where
    C: CustomerRepository,
    P: PunchcardRepository,
{
    async fn list(&self) -> Result<Vec<CustomerSummary>, Error> {
        self.customer_repo
            .list_summaries()
            .await
            .map_err(map_customer_error)
    }

    async fn search(&self, query: &str) -> Result<Vec<Customer>, Error> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::invalid_request("search query must not be empty")
                .with_details(json!({ "field": "q", "code": "missing_field" })));
        }
        self.customer_repo
            .search(query)
            .await
            .map_err(map_customer_error)
    }

    async fn get(&self, id: &CustomerId) -> Result<CustomerDetail, Error> {
        let customer = self
            .customer_repo
            .find(id)
            .await
            .map_err(map_customer_error)?
            .ok_or_else(|| customer_not_found(id))?;
        let punchcards = self
            .punchcard_repo
            .list_for_customer(id)
            .await
            .map_err(map_punchcard_error)?;
        Ok(CustomerDetail {
            customer,
            punchcards,
        })
    }

    async fn create(&self, profile: &CustomerProfile) -> Result<CustomerDetail, Error> {
        let (customer, punchcard) = self
            .customer_repo
            .create_with_punchcard(
                &NewCustomer {
                    profile: profile.clone(),
                    external_id: None,
                    stats: PurchaseStats::default(),
                },
                self.capacity,
            )
            .await
            .map_err(map_customer_error)?;
        info!(customer_id = %customer.id, punchcard_id = %punchcard.id, "customer registered");
        Ok(CustomerDetail {
            customer,
            punchcards: vec![punchcard],
        })
    }

    async fn update(&self, id: &CustomerId, profile: &CustomerProfile) -> Result<Customer, Error> {
        self.customer_repo
            .update_profile(id, profile)
            .await
            .map_err(map_customer_error)?
            .ok_or_else(|| customer_not_found(id))
    }

    async fn delete(&self, id: &CustomerId) -> Result<(), Error> {
        let deleted = self
            .customer_repo
            .delete(id)
            .await
            .map_err(map_customer_error)?;
        if deleted {
            info!(customer_id = %id, "customer deleted");
            Ok(())
        } else {
            Err(customer_not_found(id))
        }
    }
}
