//! Tax authority web services
//!
//! - [`gateway`]: the [`ValidationGateway`] contract and reply models
//! - [`codec`]: SOAP envelopes and reply parsing
//! - [`soap`]: the reqwest transport

pub mod codec;
pub mod gateway;
pub mod soap;

pub use gateway::{
    AuthorizationEntry, AuthorizationReply, ReceiptReply, ReceiptStatus, ValidationGateway,
    STATUS_AUTHORIZED,
};
pub use soap::SoapGateway;

use crate::config::{CompanySettings, RetryConfig};
use crate::domain::{Environment, Result};
use std::sync::Arc;

/// Builds a gateway from a company's current settings
///
/// Called once per pass so that endpoint or timeout changes take effect
/// without a restart.
pub trait GatewayFactory: Send + Sync {
    fn create(
        &self,
        settings: &CompanySettings,
        environment: Environment,
    ) -> Result<Arc<dyn ValidationGateway>>;
}

/// Factory producing [`SoapGateway`]s
#[derive(Debug, Clone, Default)]
pub struct SoapGatewayFactory {
    retry: RetryConfig,
}

impl SoapGatewayFactory {
    pub fn new(retry: RetryConfig) -> Self {
        Self { retry }
    }
}

impl GatewayFactory for SoapGatewayFactory {
    fn create(
        &self,
        settings: &CompanySettings,
        environment: Environment,
    ) -> Result<Arc<dyn ValidationGateway>> {
        let gateway = SoapGateway::from_settings(settings, environment, self.retry.clone())?;
        Ok(Arc::new(gateway))
    }
}
