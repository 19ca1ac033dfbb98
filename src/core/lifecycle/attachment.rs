//! Authorized document artifact
//!
//! Once authorized, the signed document is wrapped in a
//! `RespuestaAutorizacion` envelope. That envelope is the file delivered to
//! the document holder and stored as the canonical artifact.

use crate::core::header::builder::write_text;
use crate::domain::{ecuador_offset, EdiError, ElectronicDocument, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use std::io::Cursor;

/// Format of `fechaAutorizacion` in the envelope, in Ecuador local time
pub const AUTHORIZATION_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The authorized envelope and its file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedArtifact {
    /// `{id}_{prefix}_{number}.xml`
    pub file_name: String,
    pub content: String,
}

impl AuthorizedArtifact {
    /// Builds the envelope for an authorized, signed document
    pub fn build(document: &ElectronicDocument) -> Result<Self> {
        let (Some(number), Some(date)) =
            (&document.authorization_number, &document.authorization_date)
        else {
            return Err(EdiError::Validation(format!(
                "Document {} is not authorized",
                document.id
            )));
        };
        let signed = document.signed_xml.as_deref().ok_or_else(|| {
            EdiError::Validation(format!("Document {} has no signed XML", document.id))
        })?;

        let local_date = date.with_timezone(&ecuador_offset()?);

        let mut writer = Writer::new(Cursor::new(Vec::new()));
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(EdiError::xml)?;
        writer
            .write_event(Event::Start(BytesStart::new("RespuestaAutorizacion")))
            .map_err(EdiError::xml)?;
        write_text(&mut writer, "estado", "AUTORIZADO")?;
        write_text(&mut writer, "numeroAutorizacion", number)?;
        write_text(
            &mut writer,
            "fechaAutorizacion",
            &local_date.format(AUTHORIZATION_DATE_FORMAT).to_string(),
        )?;
        write_text(&mut writer, "ambiente", document.environment.label())?;
        write_text(&mut writer, "comprobante", signed)?;
        writer
            .write_event(Event::End(BytesEnd::new("RespuestaAutorizacion")))
            .map_err(EdiError::xml)?;

        let content = String::from_utf8(writer.into_inner().into_inner())
            .map_err(|e| EdiError::Xml(format!("Envelope is not UTF-8: {e}")))?;

        Ok(Self {
            file_name: document.file_name(),
            content,
        })
    }
}
