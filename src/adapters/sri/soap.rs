//! SOAP transport for the offline web services
//!
//! `SoapGateway` posts the envelopes built by [`super::codec`] with reqwest
//! and maps every transport problem onto a [`GatewayError`]. Authorization
//! queries are idempotent and are retried with exponential backoff;
//! submissions are sent once, the lifecycle decides about resubmission.

use super::codec;
use super::gateway::{AuthorizationReply, ReceiptReply, ValidationGateway};
use crate::config::{CompanySettings, RetryConfig};
use crate::domain::{AccessKey, EdiError, Environment, GatewayError, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;

const SOAP_CONTENT_TYPE: &str = "text/xml; charset=utf-8";

/// Longest response excerpt kept in a server error
const MAX_ERROR_BODY: usize = 512;

/// Gateway bound to one pair of endpoints
pub struct SoapGateway {
    client: Client,
    reception_url: String,
    authorization_url: String,
    retry: RetryConfig,
}

impl SoapGateway {
    /// Creates a gateway; WSDL URLs are accepted and `?wsdl` is dropped
    pub fn new(
        reception_url: &str,
        authorization_url: &str,
        timeout: Duration,
        retry: RetryConfig,
    ) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| EdiError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            reception_url: service_url(reception_url),
            authorization_url: service_url(authorization_url),
            retry,
        })
    }

    /// Gateway for a company's endpoints in the given environment
    pub fn from_settings(
        settings: &CompanySettings,
        environment: Environment,
        retry: RetryConfig,
    ) -> Result<Self> {
        let reception = settings.endpoints.reception(environment).ok_or_else(|| {
            EdiError::Configuration(format!(
                "Company '{}' has no {} reception endpoint",
                settings.id, environment
            ))
        })?;
        let authorization = settings.endpoints.authorization(environment).ok_or_else(|| {
            EdiError::Configuration(format!(
                "Company '{}' has no {} authorization endpoint",
                settings.id, environment
            ))
        })?;

        Self::new(
            reception,
            authorization,
            Duration::from_secs(settings.timeout_seconds),
            retry,
        )
    }

    pub fn reception_url(&self) -> &str {
        &self.reception_url
    }

    pub fn authorization_url(&self) -> &str {
        &self.authorization_url
    }

    async fn post(&self, url: &str, envelope: String) -> std::result::Result<String, GatewayError> {
        let resp = self
            .client
            .post(url)
            .header(CONTENT_TYPE, SOAP_CONTENT_TYPE)
            .header("SOAPAction", "")
            .body(envelope)
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        let body = resp.text().await.map_err(transport_error)?;

        if !status.is_success() {
            let message: String = body.chars().take(MAX_ERROR_BODY).collect();
            return Err(GatewayError::ServerError {
                status: status.as_u16(),
                message,
            });
        }

        Ok(body)
    }

    /// Retry an idempotent request with exponential backoff
    async fn retry_request<F, T, Fut>(&self, operation: F) -> std::result::Result<T, GatewayError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<T, GatewayError>>,
    {
        let max_retries = self.retry.max_retries.max(1);
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    attempt += 1;
                    if attempt >= max_retries {
                        return Err(e);
                    }

                    let delay_ms = (self.retry.initial_delay_ms as f64
                        * self.retry.backoff_multiplier.powf((attempt - 1) as f64))
                        as u64;
                    let delay_ms = delay_ms.min(self.retry.max_delay_ms);

                    crate::log_retry_attempt!(attempt, max_retries, delay_ms, e);

                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
            }
        }
    }
}

#[async_trait]
impl ValidationGateway for SoapGateway {
    async fn submit_for_validation(
        &self,
        signed_xml: &[u8],
    ) -> std::result::Result<ReceiptReply, GatewayError> {
        let envelope = codec::receipt_envelope(signed_xml)
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        tracing::debug!(url = %self.reception_url, bytes = signed_xml.len(), "Submitting document");
        let body = self.post(&self.reception_url, envelope).await?;
        codec::parse_receipt(&body)
    }

    async fn query_authorization(
        &self,
        access_key: &AccessKey,
    ) -> std::result::Result<AuthorizationReply, GatewayError> {
        let envelope = codec::authorization_envelope(access_key)
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        tracing::debug!(url = %self.authorization_url, access_key = %access_key, "Querying authorization");
        self.retry_request(|| async {
            let body = self.post(&self.authorization_url, envelope.clone()).await?;
            codec::parse_authorization(&body)
        })
        .await
    }
}

fn service_url(url: &str) -> String {
    let url = url.trim();
    let lower = url.to_ascii_lowercase();
    match lower.rfind("?wsdl") {
        Some(index) if index + 5 == lower.len() => url[..index].to_string(),
        _ => url.to_string(),
    }
}

fn transport_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout(err.to_string())
    } else if err.is_decode() || err.is_body() {
        GatewayError::InvalidResponse(err.to_string())
    } else {
        GatewayError::ConnectionFailed(err.to_string())
    }
}
