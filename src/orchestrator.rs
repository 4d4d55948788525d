//! End-to-end request building.
//!
//! [`build_request`] resolves the profile and assembles the subject before
//! any key exists, so a request that is invalid never costs a key. Once a key
//! has been generated it is held by a guard that hands it back to the
//! provider on every exit path.

use std::fmt;

use bon::Builder;

use crate::error::CsrKitError;
use crate::pem_utils::{CSR_PEM_LABEL, der_to_pem, pem_to_der};
use crate::profile::{self, CertificateType, KeyAlgorithm};
use crate::provider::{KeyProvider, StorageContext};
use crate::request::{self, params::SubjectAttributes};

pub type Result<T> = std::result::Result<T, CsrKitError>;

/// Everything the caller decides about one request.
///
/// # Fields
/// * `certificate_type` - What the certificate will be used for.
/// * `key_algorithm` - RSA or ECC.
/// * `key_length` - Key length, or the algorithm default when unset.
/// * `subject` - Subject fields or a full subject override.
/// * `alternate_names` - DNS subject alternative names (server only).
/// * `friendly_name` - Optional display name.
/// * `description` - Optional description.
/// * `storage_context` - Overrides the profile's key storage context.
#[derive(Clone, Debug, Builder)]
pub struct CsrRequest {
    pub certificate_type: CertificateType,
    pub key_algorithm: KeyAlgorithm,
    pub key_length: Option<u32>,
    #[builder(default)]
    pub subject: SubjectAttributes,
    #[builder(default)]
    pub alternate_names: Vec<String>,
    pub friendly_name: Option<String>,
    pub description: Option<String>,
    pub storage_context: Option<StorageContext>,
}

/// Progress of a single request through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Start,
    Resolved,
    Assembled,
    KeyGenerated,
    Encoded,
    Done,
    Failed,
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A PEM encoded PKCS#10 request, framed as `NEW CERTIFICATE REQUEST`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateSigningRequest(String);

impl CertificateSigningRequest {
    fn from_der(der: &[u8]) -> Self {
        Self(der_to_pem(der, CSR_PEM_LABEL))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Decodes the PEM body back to the DER request.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        pem_to_der(&self.0).map_err(|e| CsrKitError::EncodingFailed(e.to_string()))
    }
}

impl fmt::Display for CertificateSigningRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Releases the held key when dropped.
struct KeyGuard<'p, P: KeyProvider> {
    provider: &'p P,
    key: Option<P::Key>,
}

impl<'p, P: KeyProvider> KeyGuard<'p, P> {
    fn new(provider: &'p P, key: P::Key) -> Self {
        Self {
            provider,
            key: Some(key),
        }
    }

    fn key(&self) -> &P::Key {
        // Only `Drop` takes the key out.
        self.key.as_ref().unwrap_or_else(|| unreachable!())
    }
}

impl<P: KeyProvider> Drop for KeyGuard<'_, P> {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.provider.release_key(key);
        }
    }
}

/// Tracks and logs state transitions of one request.
struct Progress {
    state: RequestState,
}

impl Progress {
    fn new() -> Self {
        Self {
            state: RequestState::Start,
        }
    }

    fn advance(&mut self, next: RequestState) {
        log::debug!("CSR request: {} -> {}", self.state, next);
        self.state = next;
    }

    fn fail(&mut self, error: CsrKitError) -> CsrKitError {
        log::debug!("CSR request: {} -> {} ({error})", self.state, RequestState::Failed);
        self.state = RequestState::Failed;
        error
    }
}

/// Builds a signed certificate signing request.
///
/// # Arguments
/// * `request` - The caller's choices.
/// * `provider` - Creates and releases the key and encodes the request.
///
/// # Errors
/// Validation errors from the resolver and assembler are returned unchanged.
/// Provider failures become [`CsrKitError::KeyGenerationFailed`] (generation
/// or commit) or [`CsrKitError::EncodingFailed`].
pub fn build_request<P: KeyProvider>(
    request: &CsrRequest,
    provider: &P,
) -> Result<CertificateSigningRequest> {
    let mut progress = Progress::new();

    let profile = profile::resolve(
        request.certificate_type,
        request.key_algorithm,
        request.key_length,
    )
    .map_err(|e| progress.fail(e))?;
    progress.advance(RequestState::Resolved);

    let assembled = request::assemble(
        &profile,
        &request.subject,
        &request.alternate_names,
        request.friendly_name.as_deref(),
        request.description.as_deref(),
    )
    .map_err(|e| progress.fail(e))?;
    progress.advance(RequestState::Assembled);

    let storage = request
        .storage_context
        .unwrap_or_else(|| profile.storage_context());
    let key = provider
        .generate_key_pair(profile.key_algorithm(), profile.key_length(), storage)
        .map_err(|e| progress.fail(CsrKitError::KeyGenerationFailed(e.to_string())))?;
    let guard = KeyGuard::new(provider, key);
    progress.advance(RequestState::KeyGenerated);

    let der = provider
        .encode_request(&assembled, guard.key())
        .map_err(|e| progress.fail(CsrKitError::EncodingFailed(e.to_string())))?;
    progress.advance(RequestState::Encoded);

    provider
        .commit_key(guard.key(), storage)
        .map_err(|e| progress.fail(CsrKitError::KeyGenerationFailed(e.to_string())))?;
    drop(guard);
    progress.advance(RequestState::Done);

    log::info!(
        "Created {} request for {:?} ({} {})",
        profile.certificate_type(),
        assembled.distinguished_name,
        profile.key_algorithm_name(),
        profile.key_length()
    );
    Ok(CertificateSigningRequest::from_der(&der))
}
