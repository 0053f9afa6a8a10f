//! DTOs for decoding Shopify Admin API customer payloads.
//!
//! Shopify sends ids as JSON numbers and money as decimal strings; both are
//! normalised here before the domain sees them.

use serde::Deserialize;
use serde_json::Value;

use crate::domain::{ExternalCustomer, ExternalCustomerId, ExternalPage, SyncFailure};

const UNKNOWN_ID: &str = "unknown";

#[derive(Debug, Deserialize)]
pub(super) struct CustomerEnvelopeDto {
    pub(super) customer: CustomerDto,
}

/// Records stay raw until decoded one by one.
#[derive(Debug, Deserialize)]
pub(super) struct CustomerListDto {
    #[serde(default)]
    pub(super) customers: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum ShopifyIdDto {
    Number(u64),
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum MoneyDto {
    Text(String),
    Number(f64),
}

#[derive(Debug, Deserialize)]
pub(super) struct CustomerDto {
    pub(super) id: ShopifyIdDto,
    pub(super) first_name: Option<String>,
    pub(super) last_name: Option<String>,
    pub(super) email: Option<String>,
    pub(super) phone: Option<String>,
    pub(super) orders_count: Option<i64>,
    pub(super) total_spent: Option<MoneyDto>,
}

impl MoneyDto {
    fn amount(&self) -> Result<f64, String> {
        let value = match self {
            Self::Number(value) => *value,
            Self::Text(raw) => raw
                .trim()
                .parse::<f64>()
                .map_err(|err| format!("invalid total_spent '{raw}': {err}"))?,
        };
        if value.is_finite() {
            Ok(value)
        } else {
            Err(format!("non-finite total_spent {value}"))
        }
    }
}

impl CustomerDto {
    pub(super) fn into_domain(self) -> Result<ExternalCustomer, String> {
        let raw_id = match self.id {
            ShopifyIdDto::Number(id) => id.to_string(),
            ShopifyIdDto::Text(id) => id,
        };
        let id = ExternalCustomerId::new(&raw_id).map_err(|err| err.to_string())?;
        let total_spent = self
            .total_spent
            .as_ref()
            .map(MoneyDto::amount)
            .transpose()?
            .unwrap_or(0.0);
        let orders_count = self
            .orders_count
            .unwrap_or(0)
            .clamp(0, i64::from(i32::MAX));
        Ok(ExternalCustomer {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            orders_count: i32::try_from(orders_count).unwrap_or(i32::MAX),
            total_spent,
        })
    }
}

impl CustomerListDto {
    pub(super) fn into_page(self) -> ExternalPage {
        let mut page = ExternalPage::default();
        for raw in self.customers {
            let external_id = raw_id(&raw);
            let decoded = serde_json::from_value::<CustomerDto>(raw)
                .map_err(|err| err.to_string())
                .and_then(CustomerDto::into_domain);
            match decoded {
                Ok(customer) => page.customers.push(customer),
                Err(reason) => page.rejected.push(SyncFailure {
                    external_id,
                    reason,
                }),
            }
        }
        page
    }
}

fn raw_id(record: &Value) -> String {
    match record.get("id") {
        Some(Value::Number(id)) => id.to_string(),
        Some(Value::String(id)) if !id.trim().is_empty() => id.trim().to_owned(),
        _ => UNKNOWN_ID.to_owned(),
    }
}
