//! SOAP envelopes and reply parsing for the offline web services
//!
//! Requests are written with quick-xml; replies are read with roxmltree,
//! matching on local names so that whatever namespace prefixes the service
//! chooses are ignored.

use super::gateway::{AuthorizationEntry, AuthorizationReply, ReceiptReply, ReceiptStatus};
use crate::domain::{AccessKey, EdiError, GatewayError, MessageType, RemoteMessage, Result};
use base64::{engine::general_purpose, Engine as _};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use roxmltree::{Document, Node};
use std::io::Cursor;

const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
const RECEPTION_NS: &str = "http://ec.gob.sri.ws.recepcion";
const AUTHORIZATION_NS: &str = "http://ec.gob.sri.ws.autorizacion";

/// `validarComprobante` request carrying the base64 of the signed document
pub fn receipt_envelope(signed_xml: &[u8]) -> Result<String> {
    let encoded = general_purpose::STANDARD.encode(signed_xml);
    envelope(RECEPTION_NS, "ec:validarComprobante", "xml", &encoded)
}

/// `autorizacionComprobante` request for one access key
pub fn authorization_envelope(access_key: &AccessKey) -> Result<String> {
    envelope(
        AUTHORIZATION_NS,
        "ec:autorizacionComprobante",
        "claveAccesoComprobante",
        access_key.as_str(),
    )
}

fn envelope(namespace: &str, operation: &str, field: &str, value: &str) -> Result<String> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    let mut root = BytesStart::new("soapenv:Envelope");
    root.push_attribute(("xmlns:soapenv", SOAP_ENV_NS));
    root.push_attribute(("xmlns:ec", namespace));
    writer.write_event(Event::Start(root)).map_err(EdiError::xml)?;
    writer
        .write_event(Event::Empty(BytesStart::new("soapenv:Header")))
        .map_err(EdiError::xml)?;
    writer
        .write_event(Event::Start(BytesStart::new("soapenv:Body")))
        .map_err(EdiError::xml)?;
    writer
        .write_event(Event::Start(BytesStart::new(operation)))
        .map_err(EdiError::xml)?;
    writer
        .write_event(Event::Start(BytesStart::new(field)))
        .map_err(EdiError::xml)?;
    writer
        .write_event(Event::Text(BytesText::new(value)))
        .map_err(EdiError::xml)?;
    for name in [field, operation, "soapenv:Body", "soapenv:Envelope"] {
        writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(EdiError::xml)?;
    }

    String::from_utf8(writer.into_inner().into_inner())
        .map_err(|e| EdiError::Xml(format!("Envelope is not UTF-8: {e}")))
}

/// Parses a `RespuestaRecepcionComprobante`
pub fn parse_receipt(body: &str) -> std::result::Result<ReceiptReply, GatewayError> {
    let doc = parse(body)?;
    let reply = find(doc.root_element(), "RespuestaRecepcionComprobante").ok_or_else(|| {
        GatewayError::InvalidResponse("RespuestaRecepcionComprobante not found".to_string())
    })?;

    let status = child_text(reply, "estado").ok_or_else(|| {
        GatewayError::InvalidResponse("reception reply without estado".to_string())
    })?;

    Ok(ReceiptReply {
        status: ReceiptStatus::parse(&status),
        messages: messages(reply),
    })
}

/// Parses a `RespuestaAutorizacionComprobante`
pub fn parse_authorization(body: &str) -> std::result::Result<AuthorizationReply, GatewayError> {
    let doc = parse(body)?;
    let reply = find(doc.root_element(), "RespuestaAutorizacionComprobante").ok_or_else(|| {
        GatewayError::InvalidResponse("RespuestaAutorizacionComprobante not found".to_string())
    })?;

    let entries = reply
        .descendants()
        .filter(|node| is_named(*node, "autorizacion"))
        .map(|node| AuthorizationEntry {
            status: child_text(node, "estado").unwrap_or_default(),
            number: child_text(node, "numeroAutorizacion"),
            date: child_text(node, "fechaAutorizacion"),
            environment: child_text(node, "ambiente"),
            messages: messages(node),
        })
        .collect();

    Ok(AuthorizationReply {
        access_key: child_text(reply, "claveAccesoConsultada"),
        entries,
    })
}

fn parse(body: &str) -> std::result::Result<Document<'_>, GatewayError> {
    let doc = Document::parse(body)
        .map_err(|e| GatewayError::InvalidResponse(format!("malformed XML: {e}")))?;
    if let Some(fault) = find(doc.root_element(), "Fault") {
        let text = child_text(fault, "faultstring").unwrap_or_else(|| "SOAP fault".to_string());
        return Err(GatewayError::InvalidResponse(text));
    }
    Ok(doc)
}

/// Every `mensaje` element that carries an `identificador`
///
/// The text of a message is itself an element named `mensaje`, so only the
/// outer elements are kept.
fn messages(node: Node<'_, '_>) -> Vec<RemoteMessage> {
    node.descendants()
        .filter(|n| is_named(*n, "mensaje") && child(*n, "identificador").is_some())
        .map(|n| RemoteMessage {
            identifier: child_text(n, "identificador").unwrap_or_default(),
            message: child_text(n, "mensaje").unwrap_or_default(),
            additional_info: child_text(n, "informacionAdicional").filter(|s| !s.is_empty()),
            message_type: MessageType::parse(&child_text(n, "tipo").unwrap_or_default()),
        })
        .collect()
}

fn is_named(node: Node<'_, '_>, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name
}

fn find<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.descendants().find(|n| is_named(*n, name))
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| is_named(*n, name))
}

fn child_text(node: Node<'_, '_>, name: &str) -> Option<String> {
    child(node, name).map(|n| {
        n.children()
            .filter(|c| c.is_text())
            .filter_map(|c| c.text())
            .collect::<String>()
            .trim()
            .to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECEIPT_RETURNED: &str = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    <ns2:validarComprobanteResponse xmlns:ns2="http://ec.gob.sri.ws.recepcion">
      <RespuestaRecepcionComprobante>
        <estado>DEVUELTA</estado>
        <comprobantes>
          <comprobante>
            <claveAcceso>0101202401179001234500120010010000001231234567810</claveAcceso>
            <mensajes>
              <mensaje>
                <identificador>35</identificador>
                <mensaje>ARCHIVO NO CUMPLE ESTRUCTURA XML</mensaje>
                <informacionAdicional>Se encontr&#243; el siguiente error &amp; detalle</informacionAdicional>
                <tipo>ERROR</tipo>
              </mensaje>
            </mensajes>
          </comprobante>
        </comprobantes>
      </RespuestaRecepcionComprobante>
    </ns2:validarComprobanteResponse>
  </soap:Body>
</soap:Envelope>"#;

    const AUTHORIZATION_REPLY: &str = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    <ns2:autorizacionComprobanteResponse xmlns:ns2="http://ec.gob.sri.ws.autorizacion">
      <RespuestaAutorizacionComprobante>
        <claveAccesoConsultada>0101202401179001234500120010010000001231234567810</claveAccesoConsultada>
        <numeroComprobantes>2</numeroComprobantes>
        <autorizaciones>
          <autorizacion>
            <estado>NO AUTORIZADO</estado>
            <fechaAutorizacion>2024-01-01T10:00:00-05:00</fechaAutorizacion>
            <ambiente>PRODUCCIÓN</ambiente>
            <comprobante><![CDATA[<factura/>]]></comprobante>
            <mensajes>
              <mensaje>
                <identificador>45</identificador>
                <mensaje>SECUENCIAL REGISTRADO</mensaje>
                <tipo>ERROR</tipo>
              </mensaje>
            </mensajes>
          </autorizacion>
          <autorizacion>
            <estado>AUTORIZADO</estado>
            <numeroAutorizacion>0101202401179001234500120010010000001231234567810</numeroAutorizacion>
            <fechaAutorizacion>2024-01-01T10:05:00-05:00</fechaAutorizacion>
            <ambiente>PRODUCCIÓN</ambiente>
            <mensajes/>
          </autorizacion>
        </autorizaciones>
      </RespuestaAutorizacionComprobante>
    </ns2:autorizacionComprobanteResponse>
  </soap:Body>
</soap:Envelope>"#;

    #[test]
    fn test_receipt_envelope() {
        let envelope = receipt_envelope(b"<factura/>").unwrap();
        assert!(envelope.starts_with("<soapenv:Envelope"));
        assert!(envelope.contains("xmlns:ec=\"http://ec.gob.sri.ws.recepcion\""));
        assert!(envelope.contains("<ec:validarComprobante><xml>PGZhY3R1cmEvPg==</xml></ec:validarComprobante>"));
    }

    #[test]
    fn test_authorization_envelope() {
        let key = AccessKey::new("0101202401179001234500120010010000001231234567810").unwrap();
        let envelope = authorization_envelope(&key).unwrap();
        assert!(envelope.contains("xmlns:ec=\"http://ec.gob.sri.ws.autorizacion\""));
        assert!(envelope.contains(
            "<claveAccesoComprobante>0101202401179001234500120010010000001231234567810</claveAccesoComprobante>"
        ));
    }

    #[test]
    fn test_parse_receipt_returned() {
        let reply = parse_receipt(RECEIPT_RETURNED).unwrap();
        assert_eq!(reply.status, ReceiptStatus::Returned);
        assert_eq!(reply.messages.len(), 1);
        let message = &reply.messages[0];
        assert_eq!(message.identifier, "35");
        assert_eq!(message.message, "ARCHIVO NO CUMPLE ESTRUCTURA XML");
        assert_eq!(
            message.additional_info.as_deref(),
            Some("Se encontró el siguiente error & detalle")
        );
        assert_eq!(message.message_type, MessageType::Error);
    }

    #[test]
    fn test_parse_receipt_received() {
        let body = "<a><RespuestaRecepcionComprobante><estado>RECIBIDA</estado><comprobantes/></RespuestaRecepcionComprobante></a>";
        let reply = parse_receipt(body).unwrap();
        assert_eq!(reply.status, ReceiptStatus::Received);
        assert!(reply.messages.is_empty());
    }

    #[test]
    fn test_parse_authorization_entries() {
        let reply = parse_authorization(AUTHORIZATION_REPLY).unwrap();
        assert_eq!(reply.entries.len(), 2);
        assert_eq!(reply.entries[0].status, "NO AUTORIZADO");
        assert_eq!(reply.entries[0].messages[0].identifier, "45");
        let authorized = reply.authorized_entry().unwrap();
        assert_eq!(
            authorized.date.as_deref(),
            Some("2024-01-01T10:05:00-05:00")
        );
        assert!(authorized.messages.is_empty());
    }

    #[test]
    fn test_parse_empty_authorization() {
        let body = "<RespuestaAutorizacionComprobante><claveAccesoConsultada>1</claveAccesoConsultada><numeroComprobantes>0</numeroComprobantes><autorizaciones/></RespuestaAutorizacionComprobante>";
        let reply = parse_authorization(body).unwrap();
        assert!(reply.entries.is_empty());
    }

    #[test]
    fn test_parse_fault_and_garbage() {
        let fault = "<s:Envelope xmlns:s=\"x\"><s:Body><s:Fault><faultcode>s:Server</faultcode><faultstring>boom</faultstring></s:Fault></s:Body></s:Envelope>";
        assert!(matches!(parse_receipt(fault), Err(GatewayError::InvalidResponse(m)) if m == "boom"));
        assert!(parse_authorization("not xml").is_err());
        assert!(parse_receipt("<other/>").is_err());
    }
}
