// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client identity extraction from mutual-TLS X.509 certificate chains
//!
//! Takes the client chain a TLS terminator has already validated, selects
//! the primary (leaf) certificate, and extracts:
//!
//! - the structured identity encoded in the subject common name
//!   (`LAST.FIRST[.MIDDLE].EDIPI`), see [`StructuredIdentity`]
//! - the first rfc822Name from the subject alternative names, see [`EmailAddress`]
//!
//! No signature, validity or revocation checks are performed here.
//!
//! ```no_run
//! # fn main() -> Result<(), x509_identity::IdentityError> {
//! let encoded = std::fs::read_to_string("client-chain.b64").unwrap();
//! let identity = x509_identity::identity_from_base64(encoded.trim())?;
//! println!("{} {} ({})", identity.first_name, identity.last_name, identity.numeric_id);
//! # Ok(())
//! # }
//! ```
//!
//! HTTP services use [`IdentityResolver`] to find the chain on each request.

pub mod chain;
pub mod common_name;
pub mod config;
pub mod context;
pub mod email;
pub mod error;
pub mod subject;

#[cfg(test)]
mod test_support;

pub use chain::{decode, primary, CertificateChain};
pub use common_name::StructuredIdentity;
pub use config::{ChainSourceKind, ConfigError, IdentityConfig};
pub use context::{produce_identity, IdentityResolver, PeerCertificates, X509Identity};
pub use email::{
    alternative_names, primary_email, AddressSyntaxError, AlternativeNameEntry,
    AlternativeNameValue, EmailAddress,
};
pub use error::{ChainReason, DecodeReason, EmailReason, FormatReason, IdentityError, SubjectReason};
pub use subject::{common_name_token, subject_name, SubjectName};

// Re-export so callers need not depend on matching crate versions
pub use pki_types::CertificateDer;
pub use x509_cert::Certificate;

/// Structured identity of the primary certificate's subject common name.
///
/// A subject without a CN attribute fails with
/// [`SubjectReason::MissingCommonName`].
pub fn identity_from_chain(
    chain: Option<&CertificateChain>,
) -> Result<StructuredIdentity, IdentityError> {
    let cert = primary(chain)?;
    let subject = subject_name(cert)?;
    let cn = subject
        .common_name()
        .ok_or_else(|| SubjectReason::MissingCommonName {
            subject: subject.to_string(),
        })?;
    StructuredIdentity::parse(cn)
}

/// First rfc822Name in the primary certificate's subject alternative names.
pub fn email_from_chain(chain: Option<&CertificateChain>) -> Result<EmailAddress, IdentityError> {
    primary_email(primary(chain)?)
}

/// [`identity_from_chain`] on a base64-encoded chain.
pub fn identity_from_base64(encoded: &str) -> Result<StructuredIdentity, IdentityError> {
    identity_from_chain(Some(&decode(encoded)?))
}

/// [`email_from_chain`] on a base64-encoded chain.
pub fn email_from_base64(encoded: &str) -> Result<EmailAddress, IdentityError> {
    email_from_chain(Some(&decode(encoded)?))
}
