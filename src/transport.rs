//! Framed IRC transport over TCP and TLS.
//!
//! The transport is split at connect time into a read half and a write
//! half so the reader task can own the inbound stream while any number of
//! tasks send through the (mutex-guarded) writer.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{split, ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use tokio_rustls::rustls::{self, ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::warn;

use crate::error::{ClientError, ProtocolError};
use crate::irc::IrcCodec;
use crate::line::LineCodec;
use crate::message::Message;

/// Read half of an established transport, yielding parsed messages.
pub enum TransportReader {
    /// Plain TCP read half.
    Tcp(FramedRead<ReadHalf<TcpStream>, IrcCodec>),
    /// Client-side TLS read half.
    Tls(FramedRead<ReadHalf<TlsStream<TcpStream>>, IrcCodec>),
}

/// Write half of an established transport, accepting serialized lines.
pub enum TransportWriter {
    /// Plain TCP write half.
    Tcp(FramedWrite<WriteHalf<TcpStream>, LineCodec>),
    /// Client-side TLS write half.
    Tls(FramedWrite<WriteHalf<TlsStream<TcpStream>>, LineCodec>),
}

impl TransportReader {
    /// Read the next message from the transport.
    ///
    /// Returns `Ok(None)` when the connection is closed.
    pub async fn next_message(&mut self) -> Result<Option<Message>, ProtocolError> {
        macro_rules! read_framed {
            ($framed:expr) => {
                match $framed.next().await {
                    Some(Ok(msg)) => Ok(Some(msg)),
                    Some(Err(e)) => Err(e),
                    None => Ok(None),
                }
            };
        }

        match self {
            TransportReader::Tcp(framed) => read_framed!(framed),
            TransportReader::Tls(framed) => read_framed!(framed),
        }
    }
}

impl TransportWriter {
    /// Write one line to the transport as a single framed send.
    pub async fn send_line(&mut self, line: &str) -> Result<(), ProtocolError> {
        match self {
            TransportWriter::Tcp(framed) => framed.send(line.to_owned()).await,
            TransportWriter::Tls(framed) => framed.send(line.to_owned()).await,
        }
    }

    /// Flush and shut down the write half.
    pub async fn close(&mut self) -> Result<(), ProtocolError> {
        match self {
            TransportWriter::Tcp(framed) => framed.close().await,
            TransportWriter::Tls(framed) => framed.close().await,
        }
    }
}

/// Establish a connection to `host:port`, plain or TLS.
///
/// `accept_invalid_certs` disables certificate validation for the TLS
/// path. It exists for servers with self-signed certificates and is off
/// by default; with it off, the platform trust store is used.
pub async fn connect(
    host: &str,
    port: u16,
    tls: bool,
    accept_invalid_certs: bool,
) -> Result<(TransportReader, TransportWriter), ClientError> {
    let stream = TcpStream::connect((host, port)).await?;
    if let Err(e) = enable_keepalive(&stream) {
        warn!("failed to enable TCP keepalive: {}", e);
    }

    if tls {
        let stream = tls_handshake(host, stream, accept_invalid_certs).await?;
        let (read, write) = split(stream);
        Ok((
            TransportReader::Tls(FramedRead::new(read, IrcCodec::new())),
            TransportWriter::Tls(FramedWrite::new(write, LineCodec::new())),
        ))
    } else {
        let (read, write) = split(stream);
        Ok((
            TransportReader::Tcp(FramedRead::new(read, IrcCodec::new())),
            TransportWriter::Tcp(FramedWrite::new(write, LineCodec::new())),
        ))
    }
}

fn enable_keepalive(stream: &TcpStream) -> std::io::Result<()> {
    use socket2::{SockRef, TcpKeepalive};
    use std::time::Duration;

    let sock = SockRef::from(stream);
    let keepalive = TcpKeepalive::new()
        .with_time(Duration::from_secs(120))
        .with_interval(Duration::from_secs(30));

    sock.set_tcp_keepalive(&keepalive)
}

async fn tls_handshake(
    host: &str,
    stream: TcpStream,
    accept_invalid_certs: bool,
) -> Result<TlsStream<TcpStream>, ClientError> {
    let config = if accept_invalid_certs {
        ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert))
            .with_no_client_auth()
    } else {
        let mut roots = RootCertStore::empty();
        let native = rustls_native_certs::load_native_certs();
        for error in native.errors {
            warn!("failed to load a native root certificate: {}", error);
        }
        for cert in native.certs {
            if let Err(e) = roots.add(cert) {
                warn!("rejected native root certificate: {}", e);
            }
        }
        ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth()
    };

    let connector = TlsConnector::from(Arc::new(config));
    let server_name = ServerName::try_from(host.to_owned())
        .map_err(|_| ClientError::InvalidServerName(host.to_owned()))?;
    Ok(connector.connect(server_name, stream).await?)
}

/// Certificate verifier that accepts any server certificate.
///
/// Only reachable through `accept_invalid_certs`; connections made with it
/// are encrypted but not authenticated.
#[derive(Debug)]
struct AcceptAnyServerCert;

impl rustls::client::danger::ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        use rustls::SignatureScheme::*;
        vec![
            RSA_PKCS1_SHA1,
            ECDSA_SHA1_Legacy,
            RSA_PKCS1_SHA256,
            ECDSA_NISTP256_SHA256,
            RSA_PKCS1_SHA384,
            ECDSA_NISTP384_SHA384,
            RSA_PKCS1_SHA512,
            ECDSA_NISTP521_SHA512,
            RSA_PSS_SHA256,
            RSA_PSS_SHA384,
            RSA_PSS_SHA512,
            ED25519,
            ED448,
        ]
    }
}
