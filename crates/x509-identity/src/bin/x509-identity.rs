// SPDX-License-Identifier: MIT OR Apache-2.0

//! Extract the client identity from a certificate chain
//!
//! Reads a base64 chain from a file or stdin and prints the primary
//! certificate's identity as JSON.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use x509_identity::{
    decode, primary, primary_email, subject_name, EmailAddress, IdentityConfig,
    StructuredIdentity, X509Identity,
};

#[derive(Parser, Debug)]
#[command(name = "x509-identity")]
#[command(version, about, long_about = None)]
struct Args {
    /// Base64 certificate chain, or `-` for stdin
    #[arg(default_value = "-")]
    input: String,

    /// Also extract the email from the subject alternative names
    #[arg(long)]
    email: bool,

    /// Resolver configuration (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Serialize)]
struct IdentityReport {
    chain_length: usize,
    /// Primary certificate serial number, hex
    serial: String,
    subject: String,
    common_name: Option<String>,
    has_cert: bool,
    identity: StructuredIdentity,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<EmailAddress>,
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut content = String::new();
        io::stdin()
            .read_to_string(&mut content)
            .context("failed to read stdin")?;
        return Ok(content);
    }
    fs::read_to_string(input).with_context(|| format!("failed to read {}", input))
}

fn run(args: &Args) -> Result<IdentityReport> {
    let config = match &args.config {
        Some(path) => IdentityConfig::load(path)?,
        None => IdentityConfig::default(),
    };

    let encoded = read_input(&args.input)?;
    let chain = decode(encoded.trim())?;
    debug!(certificates = chain.len(), "decoded chain");

    let cert = primary(Some(&chain))?;
    let subject = subject_name(cert)?;
    let identity = X509Identity::new(subject.clone())
        .with_anonymous_marker(config.anonymous_common_name.as_str());
    let structured = identity.structured_identity()?;
    let email = if args.email {
        Some(primary_email(cert)?)
    } else {
        None
    };

    Ok(IdentityReport {
        chain_length: chain.len(),
        serial: hex::encode(cert.tbs_certificate.serial_number.as_bytes()),
        subject: subject.to_string(),
        common_name: identity.common_name().map(str::to_string),
        has_cert: identity.has_cert(),
        identity: structured,
        email,
    })
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();
    let report = match run(&args) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    match serde_json::to_string_pretty(&report) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: failed to serialize report: {}", e);
            ExitCode::FAILURE
        }
    }
}
