//! Error types for request building and key providers.

use thiserror::Error;

use crate::profile::{CertificateType, KeyAlgorithm};

/// Represents errors that can occur while building a certificate signing request.
///
/// Every variant is terminal for the request being processed; no partial CSR
/// is ever returned alongside one of these.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CsrKitError {
    /// The requested key length is not valid for the chosen algorithm.
    #[error("Invalid key length {requested} for {algorithm}: allowed values are {allowed:?}")]
    InvalidKeyLength {
        algorithm: KeyAlgorithm,
        requested: u32,
        allowed: &'static [u32],
    },

    /// Neither a subject override nor a common name was supplied.
    #[error("A common name is required when no subject name is given")]
    MissingCommonName,

    /// An S/MIME request was made without an email address.
    #[error("An email address is required for S/MIME requests")]
    MissingEmailAddress,

    /// The country code is not exactly two characters long.
    #[error("Invalid country code {0:?}: expected exactly 2 characters")]
    InvalidCountryCode(String),

    /// Subject alternative names were supplied for a profile that does not carry them.
    #[error("Subject alternative names are not supported for {0} requests")]
    SanNotSupportedForProfile(CertificateType),

    /// The subject name cannot be encoded as an X.501 name.
    #[error("Invalid subject name: {0}")]
    InvalidSubjectName(String),

    /// A subject alternative name is not a valid DNS name.
    #[error("Invalid subject alternative name: {0}")]
    InvalidAlternateName(String),

    /// The friendly name or description cannot be encoded as a request attribute.
    #[error("Invalid request attribute: {0}")]
    InvalidRequestAttribute(String),

    /// The storage context could not be recognized.
    #[error("Invalid storage context: {0:?}")]
    InvalidStorageContext(String),

    /// The key provider could not create the key pair.
    #[error("Key generation failed: {0}")]
    KeyGenerationFailed(String),

    /// The key provider could not encode the request.
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),

    /// The configuration file could not be read or written.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

/// Failure reported by a [`crate::provider::KeyProvider`].
///
/// The text is the provider's own diagnostic; the orchestrator wraps it into
/// [`CsrKitError::KeyGenerationFailed`] or [`CsrKitError::EncodingFailed`]
/// depending on which step failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ProviderError(pub String);

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<der::Error> for ProviderError {
    /// Converts a `der::Error` into a `ProviderError`.
    fn from(err: der::Error) -> Self {
        ProviderError(format!("DER error: {err}"))
    }
}

impl From<rsa::Error> for ProviderError {
    fn from(err: rsa::Error) -> Self {
        ProviderError(format!("RSA error: {err}"))
    }
}

impl From<pkcs8::Error> for ProviderError {
    fn from(err: pkcs8::Error) -> Self {
        ProviderError(format!("PKCS#8 error: {err}"))
    }
}

impl From<pkcs8::spki::Error> for ProviderError {
    fn from(err: pkcs8::spki::Error) -> Self {
        ProviderError(format!("SPKI error: {err}"))
    }
}

impl From<ecdsa::Error> for ProviderError {
    fn from(err: ecdsa::Error) -> Self {
        ProviderError(format!("ECDSA error: {err}"))
    }
}

impl From<std::io::Error> for ProviderError {
    fn from(err: std::io::Error) -> Self {
        ProviderError(format!("I/O error: {err}"))
    }
}
