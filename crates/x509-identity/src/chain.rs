// SPDX-License-Identifier: MIT OR Apache-2.0

//! Certificate chain decoding and primary certificate selection

use base64::{engine::general_purpose::STANDARD, Engine as _};
use der::{Decode, Reader, SliceReader};
use pki_types::CertificateDer;
use x509_cert::Certificate;

use crate::error::{ChainReason, DecodeReason, IdentityError};

/// Ordered client certificate chain.
///
/// Element 0 is the primary (leaf) certificate; the rest keep the order in
/// which they appeared in the encoded stream. Nothing here checks signatures
/// or trust; the TLS terminator is expected to have validated the chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificateChain(Vec<Certificate>);

impl CertificateChain {
    /// Parse back-to-back DER certificates, front to back, until the buffer is exhausted.
    ///
    /// Any malformed record fails the whole chain.
    pub fn from_concatenated_der(bytes: &[u8]) -> Result<Self, IdentityError> {
        let invalid = |index: usize, source: der::Error| DecodeReason::InvalidCertificate {
            index,
            source,
        };

        let mut reader = SliceReader::new(bytes).map_err(|e| invalid(0, e))?;
        let mut certs = Vec::new();
        while !reader.is_finished() {
            let cert = Certificate::decode(&mut reader).map_err(|e| invalid(certs.len(), e))?;
            certs.push(cert);
        }

        Ok(Self(certs))
    }

    /// Build a chain from certificates the transport layer already split apart.
    ///
    /// Each element must hold exactly one DER certificate.
    pub fn from_der_certs<'a, I>(certs: I) -> Result<Self, IdentityError>
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let certs = certs
            .into_iter()
            .enumerate()
            .map(|(index, der)| {
                Certificate::from_der(der)
                    .map_err(|source| DecodeReason::InvalidCertificate { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self(certs))
    }

    /// Build a chain from a rustls peer certificate list.
    pub fn from_peer_certificates(certs: &[CertificateDer<'_>]) -> Result<Self, IdentityError> {
        Self::from_der_certs(certs.iter().map(|cert| &cert[..]))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn certificates(&self) -> &[Certificate] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Certificate> {
        self.0.iter()
    }

    /// The leaf certificate, or `ChainReason::Empty`.
    pub fn primary(&self) -> Result<&Certificate, IdentityError> {
        Ok(self.0.first().ok_or(ChainReason::Empty)?)
    }
}

impl From<Vec<Certificate>> for CertificateChain {
    fn from(certs: Vec<Certificate>) -> Self {
        Self(certs)
    }
}

impl<'a> IntoIterator for &'a CertificateChain {
    type Item = &'a Certificate;
    type IntoIter = std::slice::Iter<'a, Certificate>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Decode a base64 (standard alphabet, padded) certificate chain.
///
/// An empty input yields an empty chain, which `primary` rejects as
/// "cert chain empty".
pub fn decode(encoded: &str) -> Result<CertificateChain, IdentityError> {
    let bytes = STANDARD.decode(encoded).map_err(DecodeReason::from)?;
    CertificateChain::from_concatenated_der(&bytes)
}

/// Select the primary (leaf) certificate.
///
/// A chain that was never obtained (`None`) and a chain that was obtained but
/// holds nothing are reported as different errors.
pub fn primary(chain: Option<&CertificateChain>) -> Result<&Certificate, IdentityError> {
    let chain = chain.ok_or(ChainReason::NotAvailable)?;
    chain.primary()
}
