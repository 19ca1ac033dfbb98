//! Document source capability
//!
//! The business documents (invoices, notes, withholdings, liquidations)
//! live in the issuing system. The engine only needs the identifying data
//! and the kind-specific body XML, exposed through [`DocumentSource`].

use super::document::{DocumentKind, SourceRef};
use super::ids::EmissionPoint;
use super::{EdiError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Schema version descriptor of a document kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentVersion {
    /// Root element name, e.g. `factura`
    pub root_element: String,
    /// Value of the root `version` attribute, e.g. `1.1.0`
    pub version: String,
    /// XSD for validators that evaluate the authority's schemas
    ///
    /// The built-in `StructuralValidator` never reads it.
    #[serde(default)]
    pub schema_path: Option<PathBuf>,
}

impl DocumentVersion {
    /// Default descriptor used by the authority for each kind
    pub fn default_for(kind: DocumentKind) -> Self {
        let (root_element, version) = match kind {
            DocumentKind::Invoice => ("factura", "1.1.0"),
            DocumentKind::Liquidation => ("liquidacionCompra", "1.1.0"),
            DocumentKind::CreditNote => ("notaCredito", "1.1.0"),
            DocumentKind::DebitNote => ("notaDebito", "1.0.0"),
            DocumentKind::Withholding => ("comprobanteRetencion", "2.0.0"),
        };
        Self {
            root_element: root_element.to_string(),
            version: version.to_string(),
            schema_path: None,
        }
    }
}

/// A business document that can be declared to the tax authority
pub trait DocumentSource: Send + Sync {
    fn kind(&self) -> DocumentKind;

    /// Identifier in the issuing system
    fn source_id(&self) -> &str;

    /// Number as `estab-ptoEmi-secuencial`, e.g. `001-001-000000123`
    fn document_number(&self) -> &str;

    fn issue_date(&self) -> NaiveDate;

    fn version(&self) -> DocumentVersion;

    /// Kind-specific body placed after `infoTributaria`
    fn body_xml(&self) -> Result<String>;

    fn source_ref(&self) -> SourceRef {
        SourceRef::new(self.kind(), self.source_id())
    }

    /// Point of emission parsed from the document number
    fn emission_point(&self) -> Result<EmissionPoint> {
        let mut parts = self.document_number().split('-');
        match (parts.next(), parts.next()) {
            (Some(estab), Some(point)) => {
                EmissionPoint::new(estab, point).map_err(EdiError::Validation)
            }
            _ => Err(EdiError::Validation(format!(
                "Document number '{}' has no point of emission",
                self.document_number()
            ))),
        }
    }

    /// Sequential number parsed from the document number
    fn sequential(&self) -> Result<u64> {
        self.document_number()
            .rsplit('-')
            .next()
            .and_then(|seq| seq.trim().parse().ok())
            .ok_or_else(|| {
                EdiError::Validation(format!(
                    "Document number '{}' has no numeric sequential",
                    self.document_number()
                ))
            })
    }

    /// Number as stored on the electronic document
    fn display_number(&self) -> String {
        format!("{} {}", self.kind().prefix(), self.document_number())
    }
}

/// Source document delivered by the issuing system as a JSON file
///
/// The body has already been rendered by the issuing system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreparedSource {
    pub kind: DocumentKind,
    pub source_id: String,
    pub document_number: String,
    pub issue_date: NaiveDate,
    #[serde(default)]
    pub version: Option<DocumentVersion>,
    pub body_xml: String,
}

impl DocumentSource for PreparedSource {
    fn kind(&self) -> DocumentKind {
        self.kind
    }

    fn source_id(&self) -> &str {
        &self.source_id
    }

    fn document_number(&self) -> &str {
        &self.document_number
    }

    fn issue_date(&self) -> NaiveDate {
        self.issue_date
    }

    fn version(&self) -> DocumentVersion {
        self.version
            .clone()
            .unwrap_or_else(|| DocumentVersion::default_for(self.kind))
    }

    fn body_xml(&self) -> Result<String> {
        if self.body_xml.trim().is_empty() {
            return Err(EdiError::Validation(format!(
                "Source {} has an empty body",
                self.source_id
            )));
        }
        Ok(self.body_xml.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(number: &str) -> PreparedSource {
        PreparedSource {
            kind: DocumentKind::Invoice,
            source_id: "INV-1".to_string(),
            document_number: number.to_string(),
            issue_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            version: None,
            body_xml: "<infoFactura/>".to_string(),
        }
    }

    #[test]
    fn test_number_parsing() {
        let src = source("001-002-000000123");
        assert_eq!(src.emission_point().unwrap().serial(), "001002");
        assert_eq!(src.sequential().unwrap(), 123);
        assert_eq!(src.display_number(), "FV 001-002-000000123");
        assert_eq!(src.version().root_element, "factura");
    }

    #[test]
    fn test_invalid_number() {
        assert!(source("123").emission_point().is_err());
        assert!(source("001-001-abc").sequential().is_err());
    }

    #[test]
    fn test_empty_body_rejected() {
        let mut src = source("001-001-000000001");
        src.body_xml = "  ".to_string();
        assert!(src.body_xml().is_err());
    }
}
