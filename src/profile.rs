//! Request profile resolution.
//!
//! Maps the high level intent of a request (what the certificate is for and
//! which key algorithm backs it) onto the exact Key Usage bits, Extended Key
//! Usage identifiers and key length that end up in the CSR. Everything in
//! here is pure: the same inputs always resolve to the same [`RequestProfile`].

use std::fmt;

use const_oid::ObjectIdentifier;
use const_oid::db::rfc5912::{
    ID_KP_CLIENT_AUTH, ID_KP_CODE_SIGNING, ID_KP_EMAIL_PROTECTION, ID_KP_SERVER_AUTH,
};
use der::flagset::FlagSet;
use x509_cert::ext::pkix::KeyUsages;

use crate::error::CsrKitError;
use crate::provider::StorageContext;

pub type Result<T> = std::result::Result<T, CsrKitError>;

/// RSA modulus sizes accepted for a request.
pub const RSA_KEY_LENGTHS: &[u32] = &[2048, 4096, 8192, 16384];

/// ECC curve sizes accepted for a request (P-256, P-384, P-521).
pub const ECC_KEY_LENGTHS: &[u32] = &[256, 384, 521];

pub const DEFAULT_RSA_KEY_LENGTH: u32 = 2048;
pub const DEFAULT_ECC_KEY_LENGTH: u32 = 256;

/// The intended use of the requested certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CertificateType {
    /// TLS server authentication.
    Server,
    /// TLS client authentication.
    Client,
    /// Secure email (client authentication plus email protection).
    Smime,
    /// Code signing.
    CodeSigning,
}

impl fmt::Display for CertificateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CertificateType::Server => "Server",
            CertificateType::Client => "Client",
            CertificateType::Smime => "SMIME",
            CertificateType::CodeSigning => "CodeSigning",
        };
        f.write_str(name)
    }
}

/// The public key algorithm of the requested key pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAlgorithm {
    Rsa,
    Ecc,
}

impl KeyAlgorithm {
    /// Key lengths the algorithm accepts, in ascending order.
    pub fn allowed_lengths(self) -> &'static [u32] {
        match self {
            KeyAlgorithm::Rsa => RSA_KEY_LENGTHS,
            KeyAlgorithm::Ecc => ECC_KEY_LENGTHS,
        }
    }

    /// Key length used when the caller does not ask for one.
    pub fn default_length(self) -> u32 {
        match self {
            KeyAlgorithm::Rsa => DEFAULT_RSA_KEY_LENGTH,
            KeyAlgorithm::Ecc => DEFAULT_ECC_KEY_LENGTH,
        }
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyAlgorithm::Rsa => f.write_str("RSA"),
            KeyAlgorithm::Ecc => f.write_str("ECC"),
        }
    }
}

/// Key Usage bits in the legacy single-byte numbering used by enrollment
/// tooling (`0x80` = digitalSignature, down to `0x01` = encipherOnly).
///
/// The numeric values are a compatibility contract; use [`KeyUsageFlags::to_key_usages`]
/// to obtain the RFC 5280 bit string representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KeyUsageFlags(pub u8);

impl KeyUsageFlags {
    pub const DIGITAL_SIGNATURE: KeyUsageFlags = KeyUsageFlags(0x80);
    pub const NON_REPUDIATION: KeyUsageFlags = KeyUsageFlags(0x40);
    pub const KEY_ENCIPHERMENT: KeyUsageFlags = KeyUsageFlags(0x20);
    pub const DATA_ENCIPHERMENT: KeyUsageFlags = KeyUsageFlags(0x10);
    pub const KEY_AGREEMENT: KeyUsageFlags = KeyUsageFlags(0x08);
    pub const KEY_CERT_SIGN: KeyUsageFlags = KeyUsageFlags(0x04);
    pub const CRL_SIGN: KeyUsageFlags = KeyUsageFlags(0x02);
    pub const ENCIPHER_ONLY: KeyUsageFlags = KeyUsageFlags(0x01);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: KeyUsageFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: KeyUsageFlags) -> KeyUsageFlags {
        KeyUsageFlags(self.0 | other.0)
    }

    /// Converts the legacy bitmask into the RFC 5280 `KeyUsage` flag set.
    pub fn to_key_usages(self) -> FlagSet<KeyUsages> {
        const MAPPING: [(KeyUsageFlags, KeyUsages); 8] = [
            (KeyUsageFlags::DIGITAL_SIGNATURE, KeyUsages::DigitalSignature),
            (KeyUsageFlags::NON_REPUDIATION, KeyUsages::NonRepudiation),
            (KeyUsageFlags::KEY_ENCIPHERMENT, KeyUsages::KeyEncipherment),
            (KeyUsageFlags::DATA_ENCIPHERMENT, KeyUsages::DataEncipherment),
            (KeyUsageFlags::KEY_AGREEMENT, KeyUsages::KeyAgreement),
            (KeyUsageFlags::KEY_CERT_SIGN, KeyUsages::KeyCertSign),
            (KeyUsageFlags::CRL_SIGN, KeyUsages::CRLSign),
            (KeyUsageFlags::ENCIPHER_ONLY, KeyUsages::EncipherOnly),
        ];

        MAPPING
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .fold(FlagSet::default(), |acc, (_, usage)| acc | *usage)
    }
}

impl std::ops::BitOr for KeyUsageFlags {
    type Output = KeyUsageFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl fmt::Display for KeyUsageFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04X}", self.0)
    }
}

const SERVER_KEY_USAGE: KeyUsageFlags = KeyUsageFlags::DIGITAL_SIGNATURE
    .union(KeyUsageFlags::NON_REPUDIATION)
    .union(KeyUsageFlags::KEY_ENCIPHERMENT)
    .union(KeyUsageFlags::DATA_ENCIPHERMENT);

const CLIENT_KEY_USAGE: KeyUsageFlags = KeyUsageFlags::DIGITAL_SIGNATURE
    .union(KeyUsageFlags::NON_REPUDIATION)
    .union(KeyUsageFlags::KEY_ENCIPHERMENT);

const CODE_SIGNING_KEY_USAGE: KeyUsageFlags = KeyUsageFlags::DIGITAL_SIGNATURE;

const SERVER_EKU: &[ObjectIdentifier] = &[ID_KP_SERVER_AUTH];
const CLIENT_EKU: &[ObjectIdentifier] = &[ID_KP_CLIENT_AUTH];
// clientAuth must stay ahead of emailProtection.
const SMIME_EKU: &[ObjectIdentifier] = &[ID_KP_CLIENT_AUTH, ID_KP_EMAIL_PROTECTION];
const CODE_SIGNING_EKU: &[ObjectIdentifier] = &[ID_KP_CODE_SIGNING];

/// Fully resolved shape of a request, derived once from the caller's choices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestProfile {
    certificate_type: CertificateType,
    key_algorithm: KeyAlgorithm,
    key_length: u32,
    key_usage: KeyUsageFlags,
    key_usage_critical: bool,
    extended_key_usage: Vec<ObjectIdentifier>,
    allows_subject_alternate_names: bool,
}

impl RequestProfile {
    pub fn certificate_type(&self) -> CertificateType {
        self.certificate_type
    }

    pub fn key_algorithm(&self) -> KeyAlgorithm {
        self.key_algorithm
    }

    pub fn key_length(&self) -> u32 {
        self.key_length
    }

    pub fn key_usage(&self) -> KeyUsageFlags {
        self.key_usage
    }

    pub fn key_usage_critical(&self) -> bool {
        self.key_usage_critical
    }

    pub fn extended_key_usage(&self) -> &[ObjectIdentifier] {
        &self.extended_key_usage
    }

    pub fn allows_subject_alternate_names(&self) -> bool {
        self.allows_subject_alternate_names
    }

    /// Server keys live in the machine store, everything else with the user.
    pub fn storage_context(&self) -> StorageContext {
        match self.certificate_type {
            CertificateType::Server => StorageContext::Machine,
            _ => StorageContext::User,
        }
    }

    /// Algorithm name in the form key storage providers expect.
    pub fn key_algorithm_name(&self) -> &'static str {
        match (self.key_algorithm, self.key_length) {
            (KeyAlgorithm::Rsa, _) => "RSA",
            (KeyAlgorithm::Ecc, 384) => "ECDSA_P384",
            (KeyAlgorithm::Ecc, 521) => "ECDSA_P521",
            (KeyAlgorithm::Ecc, _) => "ECDSA_P256",
        }
    }
}

/// Resolves the caller's choices into a [`RequestProfile`].
///
/// # Arguments
/// * `certificate_type` - What the certificate will be used for.
/// * `key_algorithm` - RSA or ECC.
/// * `requested_length` - Key length, or `None` for the algorithm default.
///
/// # Errors
/// [`CsrKitError::InvalidKeyLength`] when the length is outside the
/// algorithm's allowed set.
pub fn resolve(
    certificate_type: CertificateType,
    key_algorithm: KeyAlgorithm,
    requested_length: Option<u32>,
) -> Result<RequestProfile> {
    let key_length = requested_length.unwrap_or_else(|| key_algorithm.default_length());

    let allowed = key_algorithm.allowed_lengths();
    if !allowed.contains(&key_length) {
        return Err(CsrKitError::InvalidKeyLength {
            algorithm: key_algorithm,
            requested: key_length,
            allowed,
        });
    }

    let (key_usage, key_usage_critical, extended_key_usage) = match certificate_type {
        CertificateType::Server => (SERVER_KEY_USAGE, true, SERVER_EKU),
        CertificateType::Client => (CLIENT_KEY_USAGE, false, CLIENT_EKU),
        CertificateType::Smime => (CLIENT_KEY_USAGE, false, SMIME_EKU),
        CertificateType::CodeSigning => (CODE_SIGNING_KEY_USAGE, false, CODE_SIGNING_EKU),
    };

    Ok(RequestProfile {
        certificate_type,
        key_algorithm,
        key_length,
        key_usage,
        key_usage_critical,
        extended_key_usage: extended_key_usage.to_vec(),
        allows_subject_alternate_names: certificate_type == CertificateType::Server,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_TYPES: [CertificateType; 4] = [
        CertificateType::Server,
        CertificateType::Client,
        CertificateType::Smime,
        CertificateType::CodeSigning,
    ];

    #[test]
    fn test_server_rsa_defaults() {
        let profile = resolve(CertificateType::Server, KeyAlgorithm::Rsa, None).unwrap();
        assert_eq!(profile.key_length(), 2048);
        assert_eq!(profile.key_usage().bits(), 0xF0);
        assert!(profile.key_usage_critical());
        assert_eq!(profile.extended_key_usage(), &[ID_KP_SERVER_AUTH]);
        assert!(profile.allows_subject_alternate_names());
        assert_eq!(profile.storage_context(), StorageContext::Machine);
        assert_eq!(profile.key_algorithm_name(), "RSA");
    }

    #[test]
    fn test_smime_ecc() {
        let profile = resolve(CertificateType::Smime, KeyAlgorithm::Ecc, Some(256)).unwrap();
        assert_eq!(profile.key_usage().bits(), 0xB0);
        assert!(!profile.key_usage_critical());
        assert_eq!(
            profile
                .extended_key_usage()
                .iter()
                .map(|oid| oid.to_string())
                .collect::<Vec<_>>(),
            vec!["1.3.6.1.5.5.7.3.2", "1.3.6.1.5.5.7.3.4"]
        );
        assert!(!profile.allows_subject_alternate_names());
        assert_eq!(profile.storage_context(), StorageContext::User);
        assert_eq!(profile.key_algorithm_name(), "ECDSA_P256");
    }

    #[test]
    fn test_usage_table() {
        let expected = [
            (CertificateType::Server, 0xF0, true, vec!["1.3.6.1.5.5.7.3.1"]),
            (CertificateType::Client, 0xB0, false, vec!["1.3.6.1.5.5.7.3.2"]),
            (
                CertificateType::Smime,
                0xB0,
                false,
                vec!["1.3.6.1.5.5.7.3.2", "1.3.6.1.5.5.7.3.4"],
            ),
            (CertificateType::CodeSigning, 0x80, false, vec!["1.3.6.1.5.5.7.3.3"]),
        ];

        for (certificate_type, bits, critical, ekus) in expected {
            for algorithm in [KeyAlgorithm::Rsa, KeyAlgorithm::Ecc] {
                let profile = resolve(certificate_type, algorithm, None).unwrap();
                assert_eq!(profile.key_usage().bits(), bits, "{certificate_type}");
                assert_eq!(profile.key_usage_critical(), critical, "{certificate_type}");
                let oids: Vec<String> = profile
                    .extended_key_usage()
                    .iter()
                    .map(|oid| oid.to_string())
                    .collect();
                assert_eq!(oids, ekus, "{certificate_type}");
            }
        }
    }

    #[test]
    fn test_key_length_domain() {
        for length in [0, 256, 1024, 2047, 2048, 3072, 4096, 8192, 16384, 32768] {
            let result = resolve(CertificateType::Client, KeyAlgorithm::Rsa, Some(length));
            assert_eq!(result.is_ok(), RSA_KEY_LENGTHS.contains(&length), "{length}");
        }
        for length in [0, 192, 224, 256, 300, 384, 512, 521, 2048] {
            let result = resolve(CertificateType::Client, KeyAlgorithm::Ecc, Some(length));
            assert_eq!(result.is_ok(), ECC_KEY_LENGTHS.contains(&length), "{length}");
        }
    }

    #[test]
    fn test_invalid_ecc_length_names_allowed_values() {
        let err = resolve(CertificateType::Server, KeyAlgorithm::Ecc, Some(300)).unwrap_err();
        assert_eq!(
            err,
            CsrKitError::InvalidKeyLength {
                algorithm: KeyAlgorithm::Ecc,
                requested: 300,
                allowed: ECC_KEY_LENGTHS,
            }
        );
        assert!(err.to_string().contains("[256, 384, 521]"));
    }

    #[test]
    fn test_resolve_is_deterministic() {
        for certificate_type in ALL_TYPES {
            let first = resolve(certificate_type, KeyAlgorithm::Ecc, Some(384)).unwrap();
            let second = resolve(certificate_type, KeyAlgorithm::Ecc, Some(384)).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_key_usage_flag_conversion() {
        let usages = KeyUsageFlags(0xF0).to_key_usages();
        assert!(usages.contains(KeyUsages::DigitalSignature));
        assert!(usages.contains(KeyUsages::NonRepudiation));
        assert!(usages.contains(KeyUsages::KeyEncipherment));
        assert!(usages.contains(KeyUsages::DataEncipherment));
        assert!(!usages.contains(KeyUsages::KeyAgreement));

        let code_signing = KeyUsageFlags(0x80).to_key_usages();
        assert_eq!(code_signing, FlagSet::from(KeyUsages::DigitalSignature));
    }
}
