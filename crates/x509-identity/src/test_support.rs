// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test support: certificate fixtures and helpers that rewrite their contents.
//!
//! Nothing in this crate verifies signatures, so tests derive new
//! certificates by editing the parsed fixtures instead of re-signing them.

use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use der::asn1::{Ia5String, OctetString};
use der::oid::AssociatedOid;
use der::{Decode, Encode};
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::pkix::SubjectAltName;
use x509_cert::ext::Extension;
use x509_cert::name::{Name, RdnSequence};
use x509_cert::Certificate;

/// Leaf with subject CN `TARGARYEN.DAENERYS.MIDDLE.1234567890` and a SAN
/// holding the rfc822Name `daenerys.targeryen@dragonstone.got`.
pub const LEAF_WITH_EMAIL_B64: &str = include_str!("../testdata/leaf-with-email.b64");

/// Same subject CN plus an emailAddress attribute, but no extensions besides
/// basic constraints and key usage.
pub const LEAF_WITHOUT_SAN_B64: &str = include_str!("../testdata/leaf-without-san.b64");

pub fn leaf_with_email_der() -> Vec<u8> {
    STANDARD.decode(LEAF_WITH_EMAIL_B64.trim()).unwrap()
}

pub fn leaf_without_san_der() -> Vec<u8> {
    STANDARD.decode(LEAF_WITHOUT_SAN_B64.trim()).unwrap()
}

pub fn leaf_with_email() -> Certificate {
    Certificate::from_der(&leaf_with_email_der()).unwrap()
}

pub fn leaf_without_san() -> Certificate {
    Certificate::from_der(&leaf_without_san_der()).unwrap()
}

/// Base64-encode DER records back to back.
pub fn chain_b64(ders: &[Vec<u8>]) -> String {
    STANDARD.encode(ders.concat())
}

/// Replace (or add) the subject alternative name extension.
pub fn with_alternative_names(cert: Certificate, names: Vec<GeneralName>) -> Certificate {
    let value = SubjectAltName(names).to_der().unwrap();
    with_raw_alternative_names(cert, value)
}

/// Replace (or add) the subject alternative name extension with arbitrary bytes.
pub fn with_raw_alternative_names(mut cert: Certificate, value: Vec<u8>) -> Certificate {
    let extensions = cert.tbs_certificate.extensions.get_or_insert_with(Vec::new);
    extensions.retain(|ext| ext.extn_id != SubjectAltName::OID);
    extensions.push(Extension {
        extn_id: SubjectAltName::OID,
        critical: false,
        extn_value: OctetString::new(value).unwrap(),
    });
    cert
}

pub fn with_subject(mut cert: Certificate, subject: &str) -> Certificate {
    cert.tbs_certificate.subject = Name::from_str(subject).unwrap();
    cert
}

pub fn with_empty_subject(mut cert: Certificate) -> Certificate {
    cert.tbs_certificate.subject = RdnSequence(Vec::new());
    cert
}

pub fn email_name(address: &str) -> GeneralName {
    GeneralName::Rfc822Name(Ia5String::new(address).unwrap())
}

pub fn dns_name(name: &str) -> GeneralName {
    GeneralName::DnsName(Ia5String::new(name).unwrap())
}

pub fn uri_name(uri: &str) -> GeneralName {
    GeneralName::UniformResourceIdentifier(Ia5String::new(uri).unwrap())
}
