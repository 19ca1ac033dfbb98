//! Integration tests for the SOAP transport against a mock web service

use mockito::{Matcher, Server};
use sri_edi::adapters::sri::{ReceiptStatus, SoapGateway, ValidationGateway};
use sri_edi::config::RetryConfig;
use sri_edi::domain::{AccessKey, GatewayError};
use std::time::Duration;

const KEY: &str = "0101202401179001234500120010010000001231234567810";

const RECEIVED: &str = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    <ns2:validarComprobanteResponse xmlns:ns2="http://ec.gob.sri.ws.recepcion">
      <RespuestaRecepcionComprobante>
        <estado>RECIBIDA</estado>
        <comprobantes/>
      </RespuestaRecepcionComprobante>
    </ns2:validarComprobanteResponse>
  </soap:Body>
</soap:Envelope>"#;

const AUTHORIZED: &str = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    <ns2:autorizacionComprobanteResponse xmlns:ns2="http://ec.gob.sri.ws.autorizacion">
      <RespuestaAutorizacionComprobante>
        <claveAccesoConsultada>0101202401179001234500120010010000001231234567810</claveAccesoConsultada>
        <numeroComprobantes>1</numeroComprobantes>
        <autorizaciones>
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

fn fast_retry(max_retries: usize) -> RetryConfig {
    RetryConfig {
        max_retries,
        initial_delay_ms: 1,
        max_delay_ms: 5,
        backoff_multiplier: 1.0,
    }
}

fn gateway(server: &Server, max_retries: usize) -> SoapGateway {
    SoapGateway::new(
        &format!("{}/reception?wsdl", server.url()),
        &format!("{}/authorization?wsdl", server.url()),
        Duration::from_secs(5),
        fast_retry(max_retries),
    )
    .unwrap()
}

#[tokio::test]
async fn test_submit_posts_base64_document() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/reception")
        .match_header("content-type", "text/xml; charset=utf-8")
        .match_body(Matcher::Regex("<xml>PGZhY3R1cmEvPg==</xml>".to_string()))
        .with_status(200)
        .with_body(RECEIVED)
        .create_async()
        .await;

    let reply = gateway(&server, 1)
        .submit_for_validation(b"<factura/>")
        .await
        .unwrap();

    assert_eq!(reply.status, ReceiptStatus::Received);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_query_returns_entries() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/authorization")
        .match_body(Matcher::Regex(format!(
            "<claveAccesoComprobante>{KEY}</claveAccesoComprobante>"
        )))
        .with_status(200)
        .with_body(AUTHORIZED)
        .create_async()
        .await;

    let reply = gateway(&server, 1)
        .query_authorization(&AccessKey::new(KEY).unwrap())
        .await
        .unwrap();

    let entry = reply.authorized_entry().unwrap();
    assert_eq!(entry.number.as_deref(), Some(KEY));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_query_is_retried_on_server_error() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/authorization")
        .with_status(500)
        .with_body("unavailable")
        .expect(3)
        .create_async()
        .await;

    let err = gateway(&server, 3)
        .query_authorization(&AccessKey::new(KEY).unwrap())
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::ServerError { status: 500, .. }));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_submit_is_never_retried() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/reception")
        .with_status(503)
        .expect(1)
        .create_async()
        .await;

    let err = gateway(&server, 3)
        .submit_for_validation(b"<factura/>")
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::ServerError { status: 503, .. }));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_soap_fault_is_invalid_response() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/reception")
        .with_status(200)
        .with_body("<s:Envelope xmlns:s=\"http://schemas.xmlsoap.org/soap/envelope/\"><s:Body><s:Fault><faultcode>s:Client</faultcode><faultstring>bad request</faultstring></s:Fault></s:Body></s:Envelope>")
        .create_async()
        .await;

    let err = gateway(&server, 1)
        .submit_for_validation(b"<factura/>")
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::InvalidResponse(message) if message == "bad request"));
}

#[tokio::test]
async fn test_unreachable_host_is_connection_failure() {
    let gateway = SoapGateway::new(
        "http://127.0.0.1:9/reception",
        "http://127.0.0.1:9/authorization",
        Duration::from_secs(2),
        fast_retry(1),
    )
    .unwrap();

    let err = gateway.submit_for_validation(b"<factura/>").await.unwrap_err();
    assert!(matches!(
        err,
        GatewayError::ConnectionFailed(_) | GatewayError::Timeout(_)
    ));
}
