// SPDX-License-Identifier: MIT OR Apache-2.0

//! Email extraction from the subject alternative name extension (OID 2.5.29.17)

use std::fmt;
use std::str::FromStr;

use der::Encode;
use serde::{Serialize, Serializer};
use thiserror::Error;
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::pkix::SubjectAltName;
use x509_cert::Certificate;

use crate::error::{EmailReason, IdentityError};

// GeneralName CHOICE tags (RFC 5280 section 4.2.1.6)
pub const TAG_OTHER_NAME: u8 = 0;
pub const TAG_RFC822_NAME: u8 = 1;
pub const TAG_DNS_NAME: u8 = 2;
pub const TAG_DIRECTORY_NAME: u8 = 4;
pub const TAG_EDI_PARTY_NAME: u8 = 5;
pub const TAG_URI: u8 = 6;
pub const TAG_IP_ADDRESS: u8 = 7;
pub const TAG_REGISTERED_ID: u8 = 8;

const MAX_LOCAL_PART_LEN: usize = 64;
const MAX_DOMAIN_LEN: usize = 255;
const MAX_LABEL_LEN: usize = 63;

/// Value of a subject alternative name entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlternativeNameValue {
    Text(String),
    /// DER encoding for structured names, raw octets for IP addresses
    Bytes(Vec<u8>),
}

/// One subject alternative name, tagged with its GeneralName CHOICE number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlternativeNameEntry {
    pub tag: u8,
    pub value: AlternativeNameValue,
}

impl AlternativeNameEntry {
    fn from_general_name(name: &GeneralName) -> der::Result<Self> {
        use AlternativeNameValue::{Bytes, Text};

        let (tag, value) = match name {
            GeneralName::OtherName(other) => (TAG_OTHER_NAME, Bytes(other.to_der()?)),
            GeneralName::Rfc822Name(email) => (TAG_RFC822_NAME, Text(email.to_string())),
            GeneralName::DnsName(dns) => (TAG_DNS_NAME, Text(dns.to_string())),
            GeneralName::DirectoryName(dn) => (TAG_DIRECTORY_NAME, Text(dn.to_string())),
            GeneralName::EdiPartyName(edi) => (TAG_EDI_PARTY_NAME, Bytes(edi.to_der()?)),
            GeneralName::UniformResourceIdentifier(uri) => (TAG_URI, Text(uri.to_string())),
            GeneralName::IpAddress(ip) => (TAG_IP_ADDRESS, Bytes(ip.as_bytes().to_vec())),
            GeneralName::RegisteredId(oid) => (TAG_REGISTERED_ID, Text(oid.to_string())),
        };
        Ok(Self { tag, value })
    }

    /// The value as text, when it is textual.
    pub fn as_text(&self) -> Option<&str> {
        match &self.value {
            AlternativeNameValue::Text(s) => Some(s),
            AlternativeNameValue::Bytes(_) => None,
        }
    }
}

/// Read the subject alternative names of a certificate, in encoded order.
///
/// Returns `Ok(None)` if the certificate has no SAN extension.
pub fn alternative_names(
    cert: &Certificate,
) -> Result<Option<Vec<AlternativeNameEntry>>, IdentityError> {
    let san = cert
        .tbs_certificate
        .get::<SubjectAltName>()
        .map_err(EmailReason::AlternativeNamesMalformed)?;

    let Some((_critical, san)) = san else {
        return Ok(None);
    };

    let entries = san
        .0
        .iter()
        .map(AlternativeNameEntry::from_general_name)
        .collect::<Result<Vec<_>, _>>()
        .map_err(EmailReason::AlternativeNamesMalformed)?;
    Ok(Some(entries))
}

/// Extract the first rfc822Name from the subject alternative names.
///
/// Later email entries are ignored.
pub fn primary_email(cert: &Certificate) -> Result<EmailAddress, IdentityError> {
    let entries = alternative_names(cert)?.unwrap_or_default();
    if entries.is_empty() {
        return Err(EmailReason::AlternativeNamesEmpty.into());
    }

    let candidate = entries
        .iter()
        .find(|entry| entry.tag == TAG_RFC822_NAME)
        .ok_or(EmailReason::NoEmailEntry)?;

    let address = match &candidate.value {
        AlternativeNameValue::Text(s) => s.clone(),
        AlternativeNameValue::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
    };
    if address.is_empty() {
        return Err(EmailReason::EmptyEmailValue.into());
    }

    match EmailAddress::parse(&address) {
        Ok(email) => Ok(email),
        Err(source) => Err(EmailReason::InvalidAddress { address, source }.into()),
    }
}

/// Reasons an address string is rejected by [`EmailAddress::parse`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressSyntaxError {
    #[error("illegal character {ch:?}")]
    IllegalCharacter { ch: char },

    #[error("missing '@'")]
    MissingAt,

    #[error("empty local part")]
    EmptyLocalPart,

    #[error("local part is {len} characters (max {})", MAX_LOCAL_PART_LEN)]
    LocalPartTooLong { len: usize },

    #[error("local part is not a dot-atom")]
    InvalidLocalPart,

    #[error("empty domain")]
    EmptyDomain,

    #[error("domain is {len} characters (max {})", MAX_DOMAIN_LEN)]
    DomainTooLong { len: usize },

    #[error("invalid domain")]
    InvalidDomain,
}

/// A syntactically valid `local-part@domain` address.
///
/// The local part must be an unquoted dot-atom; the domain is either a
/// hostname (a single label is allowed) or a bracketed domain literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress {
    address: String,
    at: usize,
}

impl EmailAddress {
    pub fn parse(input: &str) -> Result<Self, AddressSyntaxError> {
        if let Some(ch) = input.chars().find(|c| c.is_whitespace() || c.is_control()) {
            return Err(AddressSyntaxError::IllegalCharacter { ch });
        }

        let at = input.rfind('@').ok_or(AddressSyntaxError::MissingAt)?;
        validate_local_part(&input[..at])?;
        validate_domain(&input[at + 1..])?;

        Ok(Self {
            address: input.to_string(),
            at,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.address
    }

    pub fn local_part(&self) -> &str {
        &self.address[..self.at]
    }

    pub fn domain(&self) -> &str {
        &self.address[self.at + 1..]
    }
}

impl FromStr for EmailAddress {
    type Err = AddressSyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}

impl Serialize for EmailAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.address)
    }
}

/// RFC 5322 `atext`
fn is_atext(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-/=?^_`{|}~".contains(c)
}

fn validate_local_part(local: &str) -> Result<(), AddressSyntaxError> {
    if local.is_empty() {
        return Err(AddressSyntaxError::EmptyLocalPart);
    }
    if local.len() > MAX_LOCAL_PART_LEN {
        return Err(AddressSyntaxError::LocalPartTooLong { len: local.len() });
    }
    let dot_atom = local
        .split('.')
        .all(|atom| !atom.is_empty() && atom.chars().all(is_atext));
    if !dot_atom {
        return Err(AddressSyntaxError::InvalidLocalPart);
    }
    Ok(())
}

fn validate_domain(domain: &str) -> Result<(), AddressSyntaxError> {
    if domain.is_empty() {
        return Err(AddressSyntaxError::EmptyDomain);
    }
    if domain.len() > MAX_DOMAIN_LEN {
        return Err(AddressSyntaxError::DomainTooLong { len: domain.len() });
    }

    // [192.0.2.1], [IPv6:2001:db8::1]
    if let Some(literal) = domain.strip_prefix('[').and_then(|d| d.strip_suffix(']')) {
        let valid = !literal.is_empty()
            && literal
                .chars()
                .all(|c| c.is_ascii_graphic() && !matches!(c, '[' | ']' | '\\'));
        return if valid {
            Ok(())
        } else {
            Err(AddressSyntaxError::InvalidDomain)
        };
    }

    if domain.split('.').all(is_valid_label) {
        Ok(())
    } else {
        Err(AddressSyntaxError::InvalidDomain)
    }
}

fn is_valid_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= MAX_LABEL_LEN
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}
