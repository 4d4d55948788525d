#![allow(dead_code)]

use const_oid::{AssociatedOid, ObjectIdentifier};
use der::{Decode, Encode};
use x509_cert::ext::Extension;
use x509_cert::request::{CertReq, ExtensionReq};

use csrkit::orchestrator::{CertificateSigningRequest, CsrRequest, build_request};
use csrkit::profile::{CertificateType, KeyAlgorithm};
use csrkit::provider::SoftwareKeyProvider;
use csrkit::request::params::SubjectAttributes;

pub fn server_subject() -> SubjectAttributes {
    SubjectAttributes::builder()
        .common_name("server.example.com".to_string())
        .organization("Example Corp".to_string())
        .country("US".to_string())
        .build()
}

pub fn server_request(algorithm: KeyAlgorithm, key_length: Option<u32>) -> CsrRequest {
    CsrRequest::builder()
        .certificate_type(CertificateType::Server)
        .key_algorithm(algorithm)
        .maybe_key_length(key_length)
        .subject(server_subject())
        .alternate_names(vec![
            "server.example.com".to_string(),
            "www.example.com".to_string(),
        ])
        .build()
}

/// Builds a request with an in-memory software provider.
pub fn build(request: &CsrRequest) -> CertificateSigningRequest {
    build_request(request, &SoftwareKeyProvider::new()).expect("Failed to build request")
}

/// Returns the extensions carried in the request's `extensionRequest` attribute.
pub fn requested_extensions(csr: &CertificateSigningRequest) -> Vec<Extension> {
    let der = csr.to_der().expect("Failed to decode PEM");
    let req = CertReq::from_der(&der).expect("Failed to parse request");
    let attribute = req
        .info
        .attributes
        .iter()
        .find(|attr| attr.oid == ExtensionReq::OID)
        .expect("No extensionRequest attribute");
    let value = attribute.values.iter().next().expect("Empty attribute");
    ExtensionReq::from_der(&value.to_der().unwrap()).unwrap().0
}

pub fn find_extension<'a>(extensions: &'a [Extension], oid: ObjectIdentifier) -> Option<&'a Extension> {
    extensions.iter().find(|ext| ext.extn_id == oid)
}
