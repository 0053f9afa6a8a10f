//! Builders for the outbound adapters and the HTTP state that wires them into
//! domain services.

use std::sync::Arc;

use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use tracing::{info, warn};

use punchcard::domain::{
    CustomerService, CustomerSyncService, EngagementService, PunchcardService, StaffService,
};
use punchcard::inbound::http::state::{HttpState, HttpStatePorts};
use punchcard::outbound::credentials::Argon2Hasher;
use punchcard::outbound::email::{SesSender, SesTransport};
use punchcard::outbound::persistence::{
    DbPool, DieselCustomerRepository, DieselEngagementRepository, DieselPunchcardRepository,
    DieselStaffRepository,
};
use punchcard::outbound::shopify::{ShopifyEndpoint, ShopifyHttpSource, ShopifySetupError};

use super::settings::{EmailSettings, Settings, ShopifySettings};

/// Staff service backed by Diesel and Argon2; also used for the bootstrap
/// manager at startup.
pub type StaffAccountsService = StaffService<DieselStaffRepository, Argon2Hasher>;

pub fn build_staff_service(pool: &DbPool) -> Arc<StaffAccountsService> {
    Arc::new(StaffService::new(
        Arc::new(DieselStaffRepository::new(pool.clone())),
        Arc::new(Argon2Hasher::new()),
    ))
}

/// Build the commerce-system adapter. Missing credentials yield an adapter
/// that reports "not configured" on every call.
///
/// # Errors
///
/// Returns [`ShopifySetupError`] when credentials are present but the store
/// address or HTTP client is invalid.
pub fn build_shopify_source(
    settings: &ShopifySettings,
) -> Result<ShopifyHttpSource, ShopifySetupError> {
    let Some(credentials) = settings.credentials() else {
        warn!("Shopify credentials not set; sync and search are disabled");
        return Ok(ShopifyHttpSource::unconfigured());
    };
    ShopifyHttpSource::new(
        ShopifyEndpoint {
            store_domain: credentials.store_url,
            access_token: credentials.access_token.as_str().to_owned(),
            api_version: settings.api_version(),
        },
        settings.timeout(),
    )
}

/// Apply the delivery policy to the resolved AWS configuration: one attempt
/// per email, bounded by the configured timeout, and an optional region
/// override.
fn ses_config(base: SdkConfig, settings: &EmailSettings) -> SdkConfig {
    let mut builder = base
        .to_builder()
        .retry_config(RetryConfig::disabled())
        .timeout_config(
            TimeoutConfig::builder()
                .operation_timeout(settings.timeout())
                .build(),
        );
    if let Some(region) = settings.region() {
        builder = builder.region(Region::new(region));
    }
    builder.build()
}

/// Build the SES transport. AWS credentials and region come from the default
/// provider chain; `region` overrides the resolved region.
pub async fn build_email_transport(settings: &EmailSettings) -> SesTransport {
    let Some(from_address) = settings.from_address() else {
        warn!("email sender not set; thank-you emails are disabled");
        return SesTransport::unconfigured();
    };
    let base = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let config = ses_config(base, settings);
    info!(%from_address, timeout = ?settings.timeout(), "SES email transport configured");
    SesTransport::new(SesSender {
        client: aws_sdk_sesv2::Client::new(&config),
        from_address,
    })
}

/// Adapters that need I/O or fallible setup, built before the HTTP state.
pub struct Adapters {
    pub pool: DbPool,
    pub staff: Arc<StaffAccountsService>,
    pub shopify: ShopifyHttpSource,
    pub email: SesTransport,
}

/// Wire domain services over the adapters.
pub fn build_http_state(adapters: Adapters, settings: &Settings) -> HttpState {
    let Adapters {
        pool,
        staff,
        shopify,
        email,
    } = adapters;
    let customer_repo = Arc::new(DieselCustomerRepository::new(pool.clone()));
    let punchcard_repo = Arc::new(DieselPunchcardRepository::new(pool.clone()));
    let engagement_repo = Arc::new(DieselEngagementRepository::new(pool));

    let ports = HttpStatePorts {
        staff,
        customers: Arc::new(CustomerService::new(
            customer_repo.clone(),
            punchcard_repo.clone(),
        )),
        punchcards: Arc::new(PunchcardService::new(
            customer_repo.clone(),
            punchcard_repo,
            Arc::new(mockable::DefaultClock),
        )),
        sync: Arc::new(CustomerSyncService::new(
            customer_repo.clone(),
            Arc::new(shopify),
            settings.shopify.page_size(),
        )),
        engagements: Arc::new(EngagementService::new(
            customer_repo,
            engagement_repo,
            Arc::new(email),
            settings.email.business_name(),
        )),
    };
    HttpState::new(ports).with_webhook_secret(settings.webhook.secret())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::time::Duration;

    fn shopify_settings(store_url: Option<&str>, access_token: Option<&str>) -> ShopifySettings {
        ShopifySettings {
            store_url: store_url.map(str::to_owned),
            access_token: access_token.map(str::to_owned),
            api_version: None,
            page_size: None,
            timeout_secs: None,
        }
    }

    #[rstest]
    #[case(None, None, false)]
    #[case(Some("corner-cafe.myshopify.com"), None, false)]
    #[case(None, Some("shpat_x"), false)]
    #[case(Some("corner-cafe.myshopify.com"), Some("shpat_x"), true)]
    fn shopify_requires_store_and_token(
        #[case] store_url: Option<&str>,
        #[case] access_token: Option<&str>,
        #[case] configured: bool,
    ) {
        let source = build_shopify_source(&shopify_settings(store_url, access_token))
            .expect("adapter should build");
        assert_eq!(source.is_configured(), configured);
    }

    #[test]
    fn malformed_store_address_is_rejected() {
        let result = build_shopify_source(&shopify_settings(Some("bad host/"), Some("shpat_x")));
        assert!(matches!(result, Err(ShopifySetupError::InvalidStore(_))));
    }

    fn email_settings(region: Option<&str>, timeout_secs: Option<u64>) -> EmailSettings {
        EmailSettings {
            from_address: Some("hello@cafe.test".to_owned()),
            region: region.map(str::to_owned),
            business_name: None,
            timeout_secs,
        }
    }

    #[tokio::test]
    async fn email_without_sender_is_disabled() {
        let transport = build_email_transport(&EmailSettings {
            from_address: Some("  ".to_owned()),
            ..email_settings(None, None)
        })
        .await;
        assert!(!transport.is_configured());
    }

    #[rstest]
    #[case(None, Duration::from_secs(10))]
    #[case(Some(4), Duration::from_secs(4))]
    fn ses_sends_once_within_the_timeout(
        #[case] timeout_secs: Option<u64>,
        #[case] expected: Duration,
    ) {
        let base = SdkConfig::builder()
            .retry_config(RetryConfig::standard().with_max_attempts(3))
            .build();
        let config = ses_config(base, &email_settings(None, timeout_secs));

        let retry = config.retry_config().expect("retry config set");
        assert_eq!(retry.max_attempts(), 1);
        let timeouts = config.timeout_config().expect("timeout config set");
        assert_eq!(timeouts.operation_timeout(), Some(expected));
    }

    #[test]
    fn ses_region_override_wins() {
        let base = SdkConfig::builder()
            .region(Region::new("us-east-1"))
            .build();
        let config = ses_config(base, &email_settings(Some("eu-west-2"), None));
        assert_eq!(
            config.region().map(ToString::to_string).as_deref(),
            Some("eu-west-2")
        );
    }
}
