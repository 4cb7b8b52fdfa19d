// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subject DN rendering and common name extraction

use std::fmt;

use x509_cert::Certificate;

use crate::error::{IdentityError, SubjectReason};

/// Attribute key matched (case-insensitively) by [`common_name_token`].
const COMMON_NAME_KEY: &str = "CN";

/// Subject distinguished name rendered as an RFC 4514 string,
/// e.g. `CN=TARGARYEN.DAENERYS.MIDDLE.1234567890,OU=DoD,O=U.S. Government,C=US`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubjectName(String);

impl SubjectName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shorthand for [`common_name_token`] on this subject.
    pub fn common_name(&self) -> Option<&str> {
        common_name_token(&self.0)
    }
}

impl From<String> for SubjectName {
    fn from(subject: String) -> Self {
        Self(subject)
    }
}

impl From<&str> for SubjectName {
    fn from(subject: &str) -> Self {
        Self(subject.to_string())
    }
}

impl AsRef<str> for SubjectName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Render the subject DN of a certificate.
///
/// A certificate with an empty RDN sequence carries no subject principal and
/// is rejected as a null subject.
pub fn subject_name(cert: &Certificate) -> Result<SubjectName, IdentityError> {
    let subject = &cert.tbs_certificate.subject;
    if subject.0.is_empty() {
        return Err(SubjectReason::NullSubject.into());
    }
    Ok(SubjectName(subject.to_string()))
}

/// Pull the CN value out of a formatted subject DN.
///
/// Splits on `,`, then each pair on its first `=`, trims both halves and
/// returns the first value whose key is `CN` (any case). Returns `None` when
/// no pair has a CN key or the CN value is empty.
///
/// This is a plain tokenizer, not an RFC 4514 parser: escaped or quoted
/// commas and equals signs inside attribute values are not recognised.
pub fn common_name_token(subject: &str) -> Option<&str> {
    subject.split(',').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case(COMMON_NAME_KEY) {
            return None;
        }
        let value = value.trim();
        (!value.is_empty()).then_some(value)
    })
}
