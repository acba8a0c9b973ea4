// MIT License - Copyright (c) 2026 Peter Wright
// Lares4 WebSocket client

//! TLS WebSocket connection to the panel.

use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, SignatureScheme};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async_tls_with_config, Connector};
use tracing::{debug, error, info, warn};

use super::FrameLink;
use crate::config::ClientConfig;
use crate::error::{Lares4Error, Result};

/// Open the WebSocket and start the reader and writer tasks.
pub async fn connect(config: &ClientConfig) -> Result<FrameLink> {
    // another component may already have installed a provider
    let _ = rustls::crypto::ring::default_provider().install_default();

    let url = config.url();
    let mut request = url.as_str().into_client_request()?;
    let protocol = HeaderValue::from_str(&config.subprotocol).map_err(|e| {
        Lares4Error::InvalidConfig {
            details: format!("subprotocol {:?}: {}", config.subprotocol, e),
        }
    })?;
    request.headers_mut().insert(SEC_WEBSOCKET_PROTOCOL, protocol);

    let connector = if config.accept_invalid_certs {
        warn!("TLS certificate validation is disabled for {}", config.host);
        Some(Connector::Rustls(Arc::new(insecure_tls_config()?)))
    } else {
        None
    };

    info!("Connecting to {}", url);
    let (ws_stream, _) = connect_async_tls_with_config(request, None, false, connector).await?;
    info!("WebSocket connection established");

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let (incoming_tx, incoming_rx) = mpsc::channel(config.outgoing_capacity);
    let (outgoing_tx, mut outgoing_rx) = mpsc::channel::<String>(config.outgoing_capacity);

    tokio::spawn(async move {
        loop {
            match ws_receiver.next().await {
                Some(Ok(Message::Text(text))) => {
                    if incoming_tx.send(text).await.is_err() {
                        debug!("Frame receiver dropped, stopping reader");
                        break;
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    info!("Panel closed connection: {:?}", frame);
                    break;
                }
                Some(Ok(_)) => {
                    // binary, ping and pong frames carry nothing for us
                }
                Some(Err(e)) => {
                    error!("WebSocket error: {}", e);
                    break;
                }
                None => {
                    info!("Connection closed");
                    break;
                }
            }
        }
    });

    tokio::spawn(async move {
        while let Some(text) = outgoing_rx.recv().await {
            if let Err(e) = ws_sender.send(Message::Text(text)).await {
                error!("Failed to send frame: {}", e);
                return;
            }
        }
        debug!("Outgoing queue closed, closing socket");
        let _ = ws_sender.send(Message::Close(None)).await;
        let _ = ws_sender.close().await;
    });

    Ok(FrameLink {
        outgoing: outgoing_tx,
        incoming: incoming_rx,
    })
}

/// rustls client configuration that accepts any server certificate while
/// still checking handshake signatures.
fn insecure_tls_config() -> Result<rustls::ClientConfig> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = rustls::ClientConfig::builder_with_provider(Arc::clone(&provider))
        .with_safe_default_protocol_versions()?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate(provider)))
        .with_no_client_auth();
    Ok(config)
}

#[derive(Debug)]
struct AcceptAnyCertificate(Arc<CryptoProvider>);

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insecure_config_builds() {
        let config = insecure_tls_config().unwrap();
        assert!(config.alpn_protocols.is_empty());
    }

    #[test]
    fn test_verifier_accepts_any_certificate() {
        let verifier = AcceptAnyCertificate(Arc::new(rustls::crypto::ring::default_provider()));
        let cert = CertificateDer::from(vec![0u8; 8]);
        let name = ServerName::try_from("panel.local").unwrap();
        assert!(
            verifier
                .verify_server_cert(&cert, &[], &name, &[], UnixTime::now())
                .is_ok()
        );
        assert!(!verifier.supported_verify_schemes().is_empty());
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // nothing listens on port 1 locally
        let config = ClientConfig::builder()
            .host("127.0.0.1:1")
            .pin("0000")
            .build();
        let err = connect(&config).await.unwrap_err();
        assert!(err.is_transport_failure());
    }

    #[tokio::test]
    async fn test_connect_refused_with_certificate_validation() {
        let config = ClientConfig::builder()
            .host("127.0.0.1:1")
            .pin("0000")
            .accept_invalid_certs(false)
            .build();
        let err = connect(&config).await.unwrap_err();
        assert!(err.is_transport_failure(), "{err}");
    }
}
