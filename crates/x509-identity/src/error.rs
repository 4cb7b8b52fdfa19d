// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity extraction error types

use thiserror::Error;

use crate::email::AddressSyntaxError;

/// Errors that can occur while turning a certificate chain into an identity
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Certificate chain decoding failed: {0}")]
    Decode(#[from] DecodeReason),

    #[error("Certificate chain unusable: {0}")]
    Chain(#[from] ChainReason),

    #[error("Subject extraction failed: {0}")]
    Subject(#[from] SubjectReason),

    #[error("Malformed common name: {0}")]
    Format(#[from] FormatReason),

    #[error("Email extraction failed: {0}")]
    Email(#[from] EmailReason),
}

// =============================================================================
// DecodeReason
// =============================================================================

#[derive(Debug, Error)]
pub enum DecodeReason {
    #[error("Invalid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Certificate {index} is not a well-formed X.509 structure: {source}")]
    InvalidCertificate {
        index: usize,
        #[source]
        source: der::Error,
    },
}

// =============================================================================
// ChainReason
// =============================================================================

#[derive(Debug, Error)]
pub enum ChainReason {
    #[error("cert chain not available")]
    NotAvailable,

    #[error("cert chain empty")]
    Empty,
}

// =============================================================================
// SubjectReason
// =============================================================================

#[derive(Debug, Error)]
pub enum SubjectReason {
    #[error("null subject in certificate")]
    NullSubject,

    #[error("no CN attribute in subject {subject:?}")]
    MissingCommonName { subject: String },
}

// =============================================================================
// FormatReason
// =============================================================================

#[derive(Debug, Error)]
pub enum FormatReason {
    #[error("unexpected parts in cn {common_name:?}, expected 3-4, but parsed {actual}")]
    UnexpectedSegmentCount { common_name: String, actual: usize },

    #[error("failed to parse numeric id from {segment:?} in cn {common_name:?}")]
    InvalidNumericId {
        segment: String,
        common_name: String,
    },
}

// =============================================================================
// EmailReason
// =============================================================================

#[derive(Debug, Error)]
pub enum EmailReason {
    #[error("failed to parse Subject Alternative Names from cert: {0}")]
    AlternativeNamesMalformed(#[source] der::Error),

    #[error("Subject Alternative Name list is empty")]
    AlternativeNamesEmpty,

    #[error("no email entry in Subject Alternative Names")]
    NoEmailEntry,

    #[error("email type found in Subject Alternative Names, but value was empty")]
    EmptyEmailValue,

    #[error("failed to parse email address string {address:?}: {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: AddressSyntaxError,
    },
}
