//! # pay-bundle
//!
//! Wires Stripe gateways and plugins together from a declarative
//! configuration.
//!
//! Every configured instance gets a gateway service and a plugin service;
//! the plugins are registered with the workflow registry under the instance
//! name and selected by the payment method name they process.
//!
//! ```rust,ignore
//! use pay_bundle::{BundleConfig, PaymentContainer};
//!
//! let config = BundleConfig::from_file("config/stripe.toml")?;
//! let container = PaymentContainer::load(&config, &|stripe: &StripeConfig| {
//!     Ok(Arc::new(MyStripeClient::new(&stripe.api_key)) as BoxedStripeGateway)
//! })?;
//!
//! container
//!     .controller()
//!     .approve_and_deposit("stripe_checkout", &mut transaction, false)
//!     .await?;
//! ```

pub mod config;
pub mod container;

pub use config::{
    gateway_service_id, plugin_service_id, BundleConfig, InstanceConfig, Registration,
    DEFAULT_INSTANCE, SUPPORTED_METHODS,
};
pub use container::{GatewayFactory, PaymentContainer};

use pay_core::PaymentResult;
use tracing::{info, warn};

/// Config file locations tried, in order, when none is given
pub const CONFIG_PATHS: &[&str] = &[
    "config/stripe.toml",
    "../config/stripe.toml",
    "../../config/stripe.toml",
];

/// Load the bundle configuration from the first config file found, falling
/// back to `STRIPE_*` environment variables.
pub fn load_config() -> PaymentResult<BundleConfig> {
    for path in CONFIG_PATHS {
        if std::path::Path::new(path).exists() {
            let config = BundleConfig::from_file(path)?;
            info!("Loaded Stripe bundle config from {}", path);
            return Ok(config);
        }
    }

    warn!("No Stripe bundle config file found, reading STRIPE_* environment variables");
    BundleConfig::from_env()
}
