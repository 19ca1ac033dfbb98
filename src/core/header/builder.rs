//! `infoTributaria` assembly
//!
//! Writes the tax header common to every document kind and wraps it,
//! together with the body supplied by the [`DocumentSource`], in the root
//! element named by the source's version descriptor.

use crate::domain::{AccessKey, DocumentSource, EdiError, EmissionPoint, Environment, Result, TaxId};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::{Cursor, Write};

/// Issuer name mandated by the authority for the test environment
pub const TEST_ISSUER_NAME: &str = "PRUEBAS SERVICIO DE RENTAS INTERNAS";

/// Text of the `regimenMicroempresas` indicator
pub const MICROENTERPRISE_TEXT: &str = "CONTRIBUYENTE RÉGIMEN MICROEMPRESAS";

/// Issuer data written in the header
#[derive(Debug, Clone)]
pub struct IssuerProfile {
    pub tax_id: TaxId,
    pub legal_name: String,
    pub commercial_name: Option<String>,
    pub microenterprise: bool,
    /// Resolution number when the company is a withholding agent
    pub withholding_agent_resolution: Option<String>,
}

/// Resolves `dirMatriz` for a point of emission
pub trait AddressLookup: Send + Sync {
    fn matrix_address(&self, emission_point: &EmissionPoint) -> Option<String>;
}

/// Builds complete unsigned document XML
pub struct HeaderBuilder<'a> {
    issuer: &'a IssuerProfile,
    addresses: &'a dyn AddressLookup,
}

impl<'a> HeaderBuilder<'a> {
    pub fn new(issuer: &'a IssuerProfile, addresses: &'a dyn AddressLookup) -> Self {
        Self { issuer, addresses }
    }

    /// Builds the whole document: declaration, root, header and body
    pub fn build_document(
        &self,
        access_key: &AccessKey,
        environment: Environment,
        source: &dyn DocumentSource,
    ) -> Result<String> {
        let version = source.version();
        let body = source.body_xml()?;

        let mut writer = Writer::new(Cursor::new(Vec::new()));
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(EdiError::xml)?;

        let mut root = BytesStart::new(version.root_element.as_str());
        root.push_attribute(("id", "comprobante"));
        root.push_attribute(("version", version.version.as_str()));
        writer.write_event(Event::Start(root)).map_err(EdiError::xml)?;

        self.write_info_tributaria(&mut writer, access_key, environment, source)?;
        writer.get_mut().write_all(body.trim().as_bytes())?;

        writer
            .write_event(Event::End(BytesEnd::new(version.root_element.as_str())))
            .map_err(EdiError::xml)?;

        String::from_utf8(writer.into_inner().into_inner())
            .map_err(|e| EdiError::Xml(format!("Generated XML is not UTF-8: {e}")))
    }

    /// Builds the `infoTributaria` element alone
    pub fn build_info_tributaria(
        &self,
        access_key: &AccessKey,
        environment: Environment,
        source: &dyn DocumentSource,
    ) -> Result<String> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        self.write_info_tributaria(&mut writer, access_key, environment, source)?;
        String::from_utf8(writer.into_inner().into_inner())
            .map_err(|e| EdiError::Xml(format!("Generated XML is not UTF-8: {e}")))
    }

    fn write_info_tributaria<W: Write>(
        &self,
        writer: &mut Writer<W>,
        access_key: &AccessKey,
        environment: Environment,
        source: &dyn DocumentSource,
    ) -> Result<()> {
        let emission_point = source.emission_point()?;
        let sequential = source.sequential()?;
        let matrix_address = self
            .addresses
            .matrix_address(&emission_point)
            .map(|address| clean_text(&address))
            .filter(|address| !address.is_empty())
            .ok_or_else(|| {
                EdiError::Validation(format!(
                    "No matrix address configured for point of emission {emission_point}"
                ))
            })?;

        let (legal_name, commercial_name) = match environment {
            Environment::Test => (TEST_ISSUER_NAME.to_string(), TEST_ISSUER_NAME.to_string()),
            Environment::Production => {
                let legal = clean_text(&self.issuer.legal_name);
                let commercial = self
                    .issuer
                    .commercial_name
                    .as_deref()
                    .map(clean_text)
                    .filter(|name| !name.is_empty())
                    .unwrap_or_else(|| legal.clone());
                (legal, commercial)
            }
        };

        writer
            .write_event(Event::Start(BytesStart::new("infoTributaria")))
            .map_err(EdiError::xml)?;
        write_text(writer, "ambiente", &environment.digit().to_string())?;
        write_text(writer, "tipoEmision", "1")?;
        write_text(writer, "razonSocial", &legal_name)?;
        write_text(writer, "nombreComercial", &commercial_name)?;
        write_text(writer, "ruc", self.issuer.tax_id.as_str())?;
        write_text(writer, "claveAcceso", access_key.as_str())?;
        write_text(writer, "codDoc", source.kind().code())?;
        write_text(writer, "estab", emission_point.establishment())?;
        write_text(writer, "ptoEmi", emission_point.point())?;
        write_text(writer, "secuencial", &format!("{sequential:09}"))?;
        write_text(writer, "dirMatriz", &matrix_address)?;
        if self.issuer.microenterprise {
            write_text(writer, "regimenMicroempresas", MICROENTERPRISE_TEXT)?;
        }
        if let Some(resolution) = self
            .issuer
            .withholding_agent_resolution
            .as_deref()
            .filter(|value| !value.trim().is_empty())
        {
            write_text(writer, "agenteRetencion", resolution.trim())?;
        }
        writer
            .write_event(Event::End(BytesEnd::new("infoTributaria")))
            .map_err(EdiError::xml)?;
        Ok(())
    }
}

/// Writes `<name>text</name>` with the text escaped
pub(crate) fn write_text<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(EdiError::xml)?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(EdiError::xml)?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(EdiError::xml)?;
    Ok(())
}

/// Strips control characters and collapses whitespace
pub fn clean_text(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
