//! Row mapping for the `electronic_documents` table

use crate::domain::{
    AccessKey, CompanyId, DocumentId, EdiError, ElectronicDocument, Result, SourceRef,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use tokio_postgres::Row;
use uuid::Uuid;

/// Column list shared by every SELECT
pub const COLUMNS: &str = "id, company_id, source_kind, source_id, document_number, issue_date, \
    access_key, state, environment, connection_mode, authorization_number, authorization_date, \
    notification_sent, notification_active, cancellation_authorization, cancel_date, xml, \
    signed_xml, signed_at, authorized_xml, send_attempts, messages, last_error_code, created_at, updated_at";

/// One row of `electronic_documents`
#[derive(Debug, Clone)]
pub struct DocumentRow {
    pub id: Uuid,
    pub company_id: String,
    pub source_kind: String,
    pub source_id: String,
    pub document_number: String,
    pub issue_date: NaiveDate,
    pub access_key: Option<String>,
    pub state: String,
    pub environment: String,
    pub connection_mode: String,
    pub authorization_number: Option<String>,
    pub authorization_date: Option<DateTime<Utc>>,
    pub notification_sent: bool,
    pub notification_active: bool,
    pub cancellation_authorization: Option<String>,
    pub cancel_date: Option<DateTime<Utc>>,
    pub xml: Option<String>,
    pub signed_xml: Option<String>,
    pub signed_at: Option<DateTime<Utc>>,
    pub authorized_xml: Option<String>,
    /// JSONB array of attempts
    pub send_attempts: Value,
    /// JSONB array of message lines
    pub messages: Value,
    pub last_error_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentRow {
    pub fn from_domain(document: &ElectronicDocument) -> Result<Self> {
        Ok(Self {
            id: *document.id.as_uuid(),
            company_id: document.company_id.to_string(),
            source_kind: document.source.kind.to_string(),
            source_id: document.source.source_id.clone(),
            document_number: document.document_number.clone(),
            issue_date: document.issue_date,
            access_key: document.access_key.as_ref().map(|key| key.to_string()),
            state: document.state.as_str().to_string(),
            environment: document.environment.as_str().to_string(),
            connection_mode: document.connection_mode.as_str().to_string(),
            authorization_number: document.authorization_number.clone(),
            authorization_date: document.authorization_date,
            notification_sent: document.notification_sent,
            notification_active: document.notification_active,
            cancellation_authorization: document.cancellation_authorization.clone(),
            cancel_date: document.cancel_date,
            xml: document.xml.clone(),
            signed_xml: document.signed_xml.clone(),
            signed_at: document.signed_at,
            authorized_xml: document.authorized_xml.clone(),
            send_attempts: serde_json::to_value(&document.send_attempts)?,
            messages: serde_json::to_value(&document.messages)?,
            last_error_code: document.last_error_code.clone(),
            created_at: document.created_at,
            updated_at: document.updated_at,
        })
    }

    pub fn from_row(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            company_id: row.get("company_id"),
            source_kind: row.get("source_kind"),
            source_id: row.get("source_id"),
            document_number: row.get("document_number"),
            issue_date: row.get("issue_date"),
            access_key: row.get("access_key"),
            state: row.get("state"),
            environment: row.get("environment"),
            connection_mode: row.get("connection_mode"),
            authorization_number: row.get("authorization_number"),
            authorization_date: row.get("authorization_date"),
            notification_sent: row.get("notification_sent"),
            notification_active: row.get("notification_active"),
            cancellation_authorization: row.get("cancellation_authorization"),
            cancel_date: row.get("cancel_date"),
            xml: row.get("xml"),
            signed_xml: row.get("signed_xml"),
            signed_at: row.get("signed_at"),
            authorized_xml: row.get("authorized_xml"),
            send_attempts: row.get("send_attempts"),
            messages: row.get("messages"),
            last_error_code: row.get("last_error_code"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }

    pub fn to_domain(self) -> Result<ElectronicDocument> {
        let corrupt = |field: &str, e: String| {
            EdiError::Database(format!("Row {} has invalid {}: {}", self.id, field, e))
        };

        let company_id = CompanyId::new(self.company_id.clone()).map_err(|e| corrupt("company_id", e))?;
        let kind = self.source_kind.parse().map_err(|e| corrupt("source_kind", e))?;
        let access_key = self
            .access_key
            .as_deref()
            .map(|key| AccessKey::new(key.trim()))
            .transpose()
            .map_err(|e| corrupt("access_key", e))?;
        let state = self.state.parse().map_err(|e| corrupt("state", e))?;
        let environment = self.environment.parse().map_err(|e| corrupt("environment", e))?;
        let connection_mode = self
            .connection_mode
            .parse()
            .map_err(|e| corrupt("connection_mode", e))?;
        let send_attempts = serde_json::from_value(self.send_attempts.clone())
            .map_err(|e| corrupt("send_attempts", e.to_string()))?;
        let messages = serde_json::from_value(self.messages.clone())
            .map_err(|e| corrupt("messages", e.to_string()))?;

        Ok(ElectronicDocument {
            id: DocumentId::from(self.id),
            company_id,
            source: SourceRef::new(kind, self.source_id),
            document_number: self.document_number,
            issue_date: self.issue_date,
            access_key,
            state,
            environment,
            connection_mode,
            authorization_number: self.authorization_number,
            authorization_date: self.authorization_date,
            notification_sent: self.notification_sent,
            notification_active: self.notification_active,
            cancellation_authorization: self.cancellation_authorization,
            cancel_date: self.cancel_date,
            xml: self.xml,
            signed_xml: self.signed_xml,
            signed_at: self.signed_at,
            authorized_xml: self.authorized_xml,
            send_attempts,
            messages,
            last_error_code: self.last_error_code,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
