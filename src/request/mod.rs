//! Subject and extension assembly.
//!
//! Combines a resolved [`RequestProfile`] with the caller's subject fields and
//! alternate names into an [`AssembledRequest`]: the distinguished name string
//! plus the extension data, not yet DER encoded.

pub mod extensions;
pub mod params;

use const_oid::ObjectIdentifier;

use der::asn1::PrintableStringRef;

use crate::error::CsrKitError;
use crate::profile::{CertificateType, KeyUsageFlags, RequestProfile};
use extensions::{EnrollmentNameValuePair, dns_name};
use params::{SubjectAttributes, non_empty, parse_distinguished_name};

pub type Result<T> = std::result::Result<T, CsrKitError>;

/// Everything the provider needs to encode a request, apart from the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledRequest {
    pub distinguished_name: String,
    pub key_usage: KeyUsageFlags,
    pub key_usage_critical: bool,
    pub extended_key_usage: Vec<ObjectIdentifier>,
    /// DNS names, in caller order. Empty when the request carries no SAN.
    pub alternate_names: Vec<String>,
    pub friendly_name: Option<String>,
    pub description: Option<String>,
}

/// Builds the [`AssembledRequest`] for `profile`.
///
/// A non-empty subject override is used verbatim and the component fields
/// are neither validated nor used. Otherwise the components are checked in
/// this order: common name, S/MIME email address, country code. The SAN
/// check applies in both cases.
///
/// Finally the subject, every alternate name and the optional attributes are
/// checked for encodability, so a request that passes here never fails in
/// the provider for its content.
///
/// # Errors
/// * [`CsrKitError::MissingCommonName`]
/// * [`CsrKitError::MissingEmailAddress`]
/// * [`CsrKitError::InvalidCountryCode`]
/// * [`CsrKitError::SanNotSupportedForProfile`]
/// * [`CsrKitError::InvalidSubjectName`]
/// * [`CsrKitError::InvalidAlternateName`]
/// * [`CsrKitError::InvalidRequestAttribute`]
pub fn assemble(
    profile: &RequestProfile,
    subject: &SubjectAttributes,
    alternate_names: &[String],
    friendly_name: Option<&str>,
    description: Option<&str>,
) -> Result<AssembledRequest> {
    let distinguished_name = match subject.subject_name_override() {
        Some(dn) => {
            if subject.has_components() {
                log::warn!("Subject name override given; ignoring individual subject fields");
            }
            dn.to_string()
        }
        None => component_distinguished_name(profile, subject)?,
    };

    if !alternate_names.is_empty() && !profile.allows_subject_alternate_names() {
        return Err(CsrKitError::SanNotSupportedForProfile(
            profile.certificate_type(),
        ));
    }

    parse_distinguished_name(&distinguished_name)
        .map_err(|e| CsrKitError::InvalidSubjectName(e.to_string()))?;
    for name in alternate_names {
        dns_name(name).map_err(|e| CsrKitError::InvalidAlternateName(e.to_string()))?;
    }

    let friendly_name = friendly_name.filter(|v| !v.is_empty());
    let description = description.filter(|v| !v.is_empty());
    for (name, value) in [("FriendlyName", friendly_name), ("Description", description)] {
        if let Some(value) = value {
            EnrollmentNameValuePair::new(name, value).map_err(|e| {
                CsrKitError::InvalidRequestAttribute(format!("{name}: {e}"))
            })?;
        }
    }

    Ok(AssembledRequest {
        distinguished_name,
        key_usage: profile.key_usage(),
        key_usage_critical: profile.key_usage_critical(),
        extended_key_usage: profile.extended_key_usage().to_vec(),
        alternate_names: alternate_names.to_vec(),
        friendly_name: friendly_name.map(str::to_string),
        description: description.map(str::to_string),
    })
}

fn component_distinguished_name(
    profile: &RequestProfile,
    subject: &SubjectAttributes,
) -> Result<String> {
    if non_empty(&subject.common_name).is_none() {
        return Err(CsrKitError::MissingCommonName);
    }

    if profile.certificate_type() == CertificateType::Smime
        && non_empty(&subject.email_address).is_none()
    {
        return Err(CsrKitError::MissingEmailAddress);
    }

    if let Some(country) = non_empty(&subject.country) {
        if country.chars().count() != 2 || PrintableStringRef::new(country).is_err() {
            return Err(CsrKitError::InvalidCountryCode(country.to_string()));
        }
    }

    Ok(subject.to_dn_string())
}
