// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-request identity resolution for HTTP services.
//!
//! A TLS acceptor that terminates mutual TLS itself attaches the peer chain
//! to each request as a [`PeerCertificates`] extension. Behind a terminating
//! proxy the chain arrives base64-encoded in a header instead. An
//! [`IdentityResolver`] looks in the configured places, in order, and
//! produces an [`X509Identity`], which [`IdentityResolver::authenticate`]
//! stores back in the request extensions for handlers to pick up.

use std::sync::Arc;

use http::header::HeaderName;
use http::Request;
use pki_types::CertificateDer;
use tracing::{debug, warn};

use crate::chain::{self, CertificateChain};
use crate::common_name::StructuredIdentity;
use crate::config::{ChainSourceKind, ConfigError, IdentityConfig, DEFAULT_ANONYMOUS_COMMON_NAME};
use crate::error::{IdentityError, SubjectReason};
use crate::subject::{self, SubjectName};

/// Peer certificate chain as presented during the TLS handshake, leaf first.
#[derive(Debug, Clone, Default)]
pub struct PeerCertificates(pub Vec<CertificateDer<'static>>);

/// Identity of the client behind a request, derived from its subject DN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct X509Identity {
    subject: SubjectName,
    anonymous_common_name: String,
}

impl X509Identity {
    pub fn new(subject: impl Into<SubjectName>) -> Self {
        Self {
            subject: subject.into(),
            anonymous_common_name: DEFAULT_ANONYMOUS_COMMON_NAME.to_string(),
        }
    }

    /// Override the common name that [`has_cert`](Self::has_cert) treats as anonymous.
    pub fn with_anonymous_marker(mut self, marker: impl Into<String>) -> Self {
        self.anonymous_common_name = marker.into();
        self
    }

    pub fn subject_dn(&self) -> &str {
        self.subject.as_str()
    }

    pub fn common_name(&self) -> Option<&str> {
        self.subject.common_name()
    }

    /// True when the subject carries a real (non-anonymous) common name.
    pub fn has_cert(&self) -> bool {
        self.common_name()
            .is_some_and(|cn| cn != self.anonymous_common_name)
    }

    pub fn structured_identity(&self) -> Result<StructuredIdentity, IdentityError> {
        let cn = self
            .common_name()
            .ok_or_else(|| SubjectReason::MissingCommonName {
                subject: self.subject.to_string(),
            })?;
        StructuredIdentity::parse(cn)
    }
}

/// Build the identity for an already obtained chain.
pub fn produce_identity(chain: Option<&CertificateChain>) -> Result<X509Identity, IdentityError> {
    let cert = chain::primary(chain)?;
    Ok(X509Identity::new(subject::subject_name(cert)?))
}

/// Resolves client identities from HTTP requests.
///
/// Cheap to clone; the configuration is shared.
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    config: Arc<IdentityConfig>,
    header_name: HeaderName,
}

impl IdentityResolver {
    pub fn new(config: IdentityConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let header_name = config.header_name()?;
        Ok(Self {
            config: Arc::new(config),
            header_name,
        })
    }

    pub fn config(&self) -> &IdentityConfig {
        &self.config
    }

    /// Find and decode the client chain of a request.
    ///
    /// Sources are consulted in configured order and the first one present
    /// is used, even if it fails to decode. `Ok(None)` means no source was
    /// present at all.
    pub fn chain_from_request<B>(
        &self,
        request: &Request<B>,
    ) -> Result<Option<CertificateChain>, IdentityError> {
        for source in &self.config.sources {
            match source {
                ChainSourceKind::Transport => {
                    if let Some(peer) = request.extensions().get::<PeerCertificates>() {
                        return CertificateChain::from_peer_certificates(&peer.0).map(Some);
                    }
                }
                ChainSourceKind::Header => {
                    if let Some(value) = request.headers().get(&self.header_name) {
                        let encoded = String::from_utf8_lossy(value.as_bytes());
                        return chain::decode(encoded.trim()).map(Some);
                    }
                }
            }
        }
        Ok(None)
    }

    pub fn resolve<B>(&self, request: &Request<B>) -> Result<X509Identity, IdentityError> {
        let chain = match self.chain_from_request(request) {
            Ok(chain) => chain,
            Err(e) => {
                warn!(error = %e, uri = %request.uri(), "malformed client certificate chain");
                return Err(e);
            }
        };
        if chain.is_none() {
            debug!(uri = %request.uri(), "no client certificate chain on request");
        }

        let identity = produce_identity(chain.as_ref()).map_err(|e| {
            debug!(error = %e, uri = %request.uri(), "client identity unavailable");
            e
        })?;
        Ok(identity.with_anonymous_marker(self.config.anonymous_common_name.clone()))
    }

    /// Resolve the identity and attach it to the request extensions.
    pub fn authenticate<B>(&self, request: &mut Request<B>) -> Result<(), IdentityError> {
        let identity = self.resolve(request)?;
        request.extensions_mut().insert(identity);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChainReason;
    use crate::test_support::{
        chain_b64, leaf_with_email, leaf_with_email_der, leaf_without_san_der, with_empty_subject,
    };

    const FULL_CN: &str = "TARGARYEN.DAENERYS.MIDDLE.1234567890";

    fn resolver(sources: Vec<ChainSourceKind>) -> IdentityResolver {
        IdentityResolver::new(IdentityConfig {
            sources,
            ..IdentityConfig::default()
        })
        .unwrap()
    }

    fn request_with_header(value: &str) -> Request<()> {
        Request::builder()
            .uri("/resource")
            .header("x-ssl-client-cert", value)
            .body(())
            .unwrap()
    }

    fn request_with_peer(ders: Vec<Vec<u8>>) -> Request<()> {
        let mut request = Request::builder().uri("/resource").body(()).unwrap();
        request
            .extensions_mut()
            .insert(PeerCertificates(ders.into_iter().map(CertificateDer::from).collect()));
        request
    }

    #[test]
    fn test_has_cert() {
        assert!(X509Identity::new("CN=STARK.ARYA.42,C=WS").has_cert());
        assert!(!X509Identity::new("CN=anonymous,C=WS").has_cert());
        assert!(!X509Identity::new("O=Winterfell,C=WS").has_cert());
        assert!(!X509Identity::new("CN=,C=WS").has_cert());
        assert!(X509Identity::new("CN=anonymous").with_anonymous_marker("nobody").has_cert());
        assert!(!X509Identity::new("CN=nobody").with_anonymous_marker("nobody").has_cert());
    }

    #[test]
    fn test_structured_identity_missing_common_name() {
        let identity = X509Identity::new("O=Winterfell,C=WS");
        match identity.structured_identity() {
            Err(IdentityError::Subject(SubjectReason::MissingCommonName { subject })) => {
                assert_eq!(subject, "O=Winterfell,C=WS");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_produce_identity() {
        let chain = chain::decode(&chain_b64(&[leaf_with_email_der()])).unwrap();
        let identity = produce_identity(Some(&chain)).unwrap();
        assert_eq!(identity.common_name(), Some(FULL_CN));
        assert!(identity.has_cert());
        assert_eq!(identity.structured_identity().unwrap().numeric_id, 1234567890);
    }

    #[test]
    fn test_produce_identity_failures() {
        assert!(matches!(
            produce_identity(None),
            Err(IdentityError::Chain(ChainReason::NotAvailable))
        ));
        assert!(matches!(
            produce_identity(Some(&CertificateChain::default())),
            Err(IdentityError::Chain(ChainReason::Empty))
        ));
        let chain = CertificateChain::from(vec![with_empty_subject(leaf_with_email())]);
        assert!(matches!(
            produce_identity(Some(&chain)),
            Err(IdentityError::Subject(SubjectReason::NullSubject))
        ));
    }

    #[test]
    fn test_resolve_from_peer_certificates() {
        let request = request_with_peer(vec![leaf_with_email_der()]);
        let identity = resolver(vec![ChainSourceKind::Transport]).resolve(&request).unwrap();
        assert_eq!(identity.common_name(), Some(FULL_CN));
    }

    #[test]
    fn test_resolve_from_header() {
        let request = request_with_header(&format!(" {} ", chain_b64(&[leaf_with_email_der()])));
        let identity = resolver(vec![ChainSourceKind::Header]).resolve(&request).unwrap();
        assert_eq!(identity.common_name(), Some(FULL_CN));
    }

    #[test]
    fn test_sources_consulted_in_order() {
        let mut request = request_with_header(&chain_b64(&[leaf_without_san_der()]));
        request
            .extensions_mut()
            .insert(PeerCertificates(vec![CertificateDer::from(leaf_with_email_der())]));

        let transport_first = resolver(vec![ChainSourceKind::Transport, ChainSourceKind::Header]);
        let chain = transport_first.chain_from_request(&request).unwrap().unwrap();
        assert_eq!(chain.primary().unwrap().tbs_certificate.serial_number.as_bytes(), &[0x10, 0x0E]);

        let header_first = resolver(vec![ChainSourceKind::Header, ChainSourceKind::Transport]);
        let chain = header_first.chain_from_request(&request).unwrap().unwrap();
        assert_eq!(chain.primary().unwrap().tbs_certificate.serial_number.as_bytes(), &[0x10, 0x07]);
    }

    #[test]
    fn test_unconfigured_source_ignored() {
        let request = request_with_peer(vec![leaf_with_email_der()]);
        let header_only = resolver(vec![ChainSourceKind::Header]);
        assert!(header_only.chain_from_request(&request).unwrap().is_none());
        assert!(matches!(
            header_only.resolve(&request),
            Err(IdentityError::Chain(ChainReason::NotAvailable))
        ));
    }

    #[test]
    fn test_present_but_malformed_source_fails() {
        let mut request = request_with_header("not base64!");
        request
            .extensions_mut()
            .insert(PeerCertificates(vec![CertificateDer::from(leaf_with_email_der())]));
        let header_first = resolver(vec![ChainSourceKind::Header, ChainSourceKind::Transport]);
        assert!(matches!(
            header_first.resolve(&request),
            Err(IdentityError::Decode(_))
        ));
    }

    #[test]
    fn test_empty_peer_list_is_empty_chain() {
        let request = request_with_peer(vec![]);
        assert!(matches!(
            resolver(vec![ChainSourceKind::Transport]).resolve(&request),
            Err(IdentityError::Chain(ChainReason::Empty))
        ));
    }

    #[test]
    fn test_resolver_applies_anonymous_marker() {
        let config = IdentityConfig {
            anonymous_common_name: FULL_CN.to_string(),
            ..IdentityConfig::default()
        };
        let request = request_with_peer(vec![leaf_with_email_der()]);
        let identity = IdentityResolver::new(config).unwrap().resolve(&request).unwrap();
        assert!(!identity.has_cert());
    }

    #[test]
    fn test_authenticate_inserts_identity() {
        let mut request = request_with_peer(vec![leaf_with_email_der()]);
        resolver(vec![ChainSourceKind::Transport])
            .authenticate(&mut request)
            .unwrap();
        let identity = request.extensions().get::<X509Identity>().unwrap();
        assert_eq!(identity.common_name(), Some(FULL_CN));
    }

    #[test]
    fn test_resolver_rejects_invalid_config() {
        let config = IdentityConfig {
            sources: vec![],
            ..IdentityConfig::default()
        };
        assert!(matches!(IdentityResolver::new(config), Err(ConfigError::NoSources)));
    }
}
