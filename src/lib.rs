//! # CsrKit - Profile Driven Certificate Signing Requests
//!
//! CsrKit builds PKCS#10 certificate signing requests from a small set of
//! high-level choices: what the certificate is for, which key algorithm backs
//! it, and who the subject is. It derives the Key Usage bits, Extended Key
//! Usage identifiers and subject name a CA expects for that kind of
//! certificate, generates the key through a pluggable provider, and returns
//! the request as PEM text ready for submission.
//!
//! ## Certificate Profiles
//!
//! | Type          | Key Usage            | Extended Key Usage              | SAN |
//! |---------------|----------------------|---------------------------------|-----|
//! | `Server`      | `0xF0`, critical     | serverAuth                      | yes |
//! | `Client`      | `0xB0`               | clientAuth                      | no  |
//! | `Smime`       | `0xB0`               | clientAuth, emailProtection     | no  |
//! | `CodeSigning` | `0x80`               | codeSigning                     | no  |
//!
//! ## Supported Key Types
//!
//! - **RSA**: 2048, 4096, 8192 and 16384-bit keys (default 2048)
//! - **ECDSA**: P-256, P-384 and P-521 curves (default P-256)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use csrkit::{
//!     orchestrator::{CsrRequest, build_request},
//!     profile::{CertificateType, KeyAlgorithm},
//!     provider::SoftwareKeyProvider,
//!     request::params::SubjectAttributes,
//! };
//!
//! # fn main() -> Result<(), csrkit::error::CsrKitError> {
//! let subject = SubjectAttributes::builder()
//!     .common_name("server.example.com".to_string())
//!     .organization("Example Corp".to_string())
//!     .country("US".to_string())
//!     .build();
//!
//! let request = CsrRequest::builder()
//!     .certificate_type(CertificateType::Server)
//!     .key_algorithm(KeyAlgorithm::Ecc)
//!     .subject(subject)
//!     .alternate_names(vec!["www.example.com".to_string()])
//!     .build();
//!
//! let csr = build_request(&request, &SoftwareKeyProvider::new())?;
//! println!("{csr}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Inspecting a Profile
//!
//! The resolver and assembler are pure functions and can be used on their own:
//!
//! ```rust
//! use csrkit::profile::{CertificateType, KeyAlgorithm, resolve};
//! use csrkit::request::{assemble, params::SubjectAttributes};
//!
//! let profile = resolve(CertificateType::Smime, KeyAlgorithm::Ecc, Some(256)).unwrap();
//! assert_eq!(profile.key_usage().bits(), 0xB0);
//!
//! let subject = SubjectAttributes::builder()
//!     .common_name("Joe User".to_string())
//!     .email_address("joe@example.com".to_string())
//!     .build();
//! let assembled = assemble(&profile, &subject, &[], None, None).unwrap();
//! assert_eq!(assembled.distinguished_name, "E=joe@example.com,CN=Joe User");
//! ```
//!
//! ## Error Handling
//!
//! ```rust
//! use csrkit::{error::CsrKitError, profile::{CertificateType, KeyAlgorithm, resolve}};
//!
//! match resolve(CertificateType::Server, KeyAlgorithm::Ecc, Some(300)) {
//!     Ok(_) => unreachable!(),
//!     Err(CsrKitError::InvalidKeyLength { allowed, .. }) => println!("use one of {allowed:?}"),
//!     Err(e) => println!("Other error: {e}"),
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`profile`]: Certificate type and key algorithm resolution
//! - [`request`]: Subject and extension assembly, DN parsing, extension encoding
//! - [`orchestrator`]: End-to-end request building and key lifecycle
//! - [`provider`]: The key provider trait and the software implementation
//! - [`key`]: Key generation, signing and export
//! - [`certification_request`]: Low-level PKCS#10 structure building
//! - [`config`]: Configuration file support
//! - [`error`]: Error types

pub mod certification_request;
pub mod config;
pub mod error;
pub mod key;
pub mod orchestrator;
pub mod pem_utils;
pub mod profile;
pub mod provider;
pub mod request;
