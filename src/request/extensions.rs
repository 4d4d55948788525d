use const_oid::AssociatedOid;
use der::{
    Decode, Encode, Sequence,
    asn1::{BmpString, Ia5String, OctetString},
    oid::ObjectIdentifier,
};
use x509_cert::ext::Extension;
use x509_cert::ext::pkix::KeyUsage as X509KeyUsage;
use x509_cert::ext::pkix::name::GeneralName;

use crate::error::ProviderError;
use crate::profile::KeyUsageFlags;

/// Trait for converting to and from X.509 extensions.
///
/// This trait provides methods to encode and decode X.509 extension values.
///
/// # Example
/// ```
/// use csrkit::request::extensions::{SubjectAltName, ToAndFromX509Extension};
/// let san = SubjectAltName { names: vec!["example.com".to_string()] };
/// let encoded = san.to_x509_extension_value().unwrap();
/// let decoded = SubjectAltName::from_x509_extension_value(&encoded).unwrap();
/// assert_eq!(san.names, decoded.names);
/// ```
pub trait ToAndFromX509Extension {
    /// The Object Identifier (OID) for the extension.
    const OID: ObjectIdentifier;

    /// Encodes the extension into a DER-encoded byte vector.
    fn to_x509_extension_value(&self) -> Result<Vec<u8>, ProviderError>;

    /// Decodes the extension from a DER-encoded byte slice.
    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, ProviderError>
    where
        Self: Sized;

    /// Wraps the encoded value into an `Extension` with the given criticality.
    fn to_extension(&self, critical: bool) -> Result<Extension, ProviderError> {
        Ok(Extension {
            extn_id: Self::OID,
            critical,
            extn_value: OctetString::new(self.to_x509_extension_value()?)?,
        })
    }
}

/// Represents the Subject Alternative Name (SAN) extension.
///
/// This extension specifies additional identities for the subject of the certificate.
///
/// # Fields
/// * `names` - A list of DNS names, kept in caller order.
#[derive(Debug, Clone)]
pub struct SubjectAltName {
    pub names: Vec<String>,
}

/// Converts a host name into a `dNSName` entry.
///
/// Names must be non-empty IA5 (ASCII) strings without surrounding whitespace.
pub fn dns_name(name: &str) -> Result<GeneralName, ProviderError> {
    if name.trim().is_empty() || name.trim() != name {
        return Err(ProviderError(format!("invalid DNS name {name:?}")));
    }
    Ia5String::try_from(name.to_string())
        .map(GeneralName::DnsName)
        .map_err(|e| ProviderError(format!("invalid DNS name {name:?}: {e}")))
}

impl ToAndFromX509Extension for SubjectAltName {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::SubjectAltName::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, ProviderError> {
        let san = x509_cert::ext::pkix::SubjectAltName(
            self.names
                .iter()
                .map(|name| dns_name(name))
                .collect::<Result<Vec<_>, _>>()?,
        );

        Ok(san.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, ProviderError> {
        let san = x509_cert::ext::pkix::SubjectAltName::from_der(extension)?;
        let names = san
            .0
            .iter()
            .map(|name| match name {
                GeneralName::DnsName(dns) => Ok(dns.to_string()),
                _ => Err(ProviderError::new("Unsupported general name type")),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { names })
    }
}

/// Represents the Key Usage extension.
///
/// Carries the legacy single-byte mask; encoding goes through the RFC 5280
/// bit string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyUsage(pub KeyUsageFlags);

impl ToAndFromX509Extension for KeyUsage {
    const OID: ObjectIdentifier = <X509KeyUsage as AssociatedOid>::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, ProviderError> {
        let ku = X509KeyUsage(self.0.to_key_usages());
        Ok(ku.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, ProviderError> {
        use x509_cert::ext::pkix::KeyUsages;

        let ku = X509KeyUsage::from_der(extension)?;
        let flags = [
            (KeyUsages::DigitalSignature, KeyUsageFlags::DIGITAL_SIGNATURE),
            (KeyUsages::NonRepudiation, KeyUsageFlags::NON_REPUDIATION),
            (KeyUsages::KeyEncipherment, KeyUsageFlags::KEY_ENCIPHERMENT),
            (KeyUsages::DataEncipherment, KeyUsageFlags::DATA_ENCIPHERMENT),
            (KeyUsages::KeyAgreement, KeyUsageFlags::KEY_AGREEMENT),
            (KeyUsages::KeyCertSign, KeyUsageFlags::KEY_CERT_SIGN),
            (KeyUsages::CRLSign, KeyUsageFlags::CRL_SIGN),
            (KeyUsages::EncipherOnly, KeyUsageFlags::ENCIPHER_ONLY),
        ]
        .into_iter()
        .filter(|(usage, _)| ku.0.contains(*usage))
        .fold(KeyUsageFlags::default(), |acc, (_, flag)| acc | flag);
        Ok(Self(flags))
    }
}

/// Represents the Extended Key Usage extension.
///
/// This extension indicates purposes for which the public key may be used.
/// The identifiers are encoded in the order given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtendedKeyUsage {
    pub usage: Vec<ObjectIdentifier>,
}

impl ToAndFromX509Extension for ExtendedKeyUsage {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::ExtendedKeyUsage::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, ProviderError> {
        let eku = x509_cert::ext::pkix::ExtendedKeyUsage(self.usage.clone());
        Ok(eku.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, ProviderError> {
        let eku = x509_cert::ext::pkix::ExtendedKeyUsage::from_der(extension)?;
        Ok(Self { usage: eku.0 })
    }
}

/// `szOID_ENROLLMENT_NAME_VALUE_PAIR`, used by enrollment clients to attach
/// display properties to a request.
pub const ENROLLMENT_NAME_VALUE_PAIR: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.311.13.2.1");

/// A name/value pair request attribute.
///
/// ```text
/// EnrollmentNameValuePair ::= SEQUENCE {
///     name   BMPString,
///     value  BMPString }
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct EnrollmentNameValuePair {
    pub name: BmpString,
    pub value: BmpString,
}

impl EnrollmentNameValuePair {
    pub fn new(name: &str, value: &str) -> Result<Self, ProviderError> {
        Ok(Self {
            name: BmpString::from_utf8(name)?,
            value: BmpString::from_utf8(value)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use const_oid::db::rfc5912::{ID_KP_CLIENT_AUTH, ID_KP_EMAIL_PROTECTION};

    #[test]
    fn test_key_usage_encoding_decoding() {
        let original = KeyUsage(KeyUsageFlags(0xF0));
        let encoded = original.to_x509_extension_value().unwrap();
        let decoded = KeyUsage::from_x509_extension_value(&encoded).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn test_code_signing_key_usage_bits() {
        // BIT STRING, 7 unused bits, digitalSignature only
        let encoded = KeyUsage(KeyUsageFlags(0x80)).to_x509_extension_value().unwrap();
        assert_eq!(encoded, vec![0x03, 0x02, 0x07, 0x80]);
    }

    #[test]
    fn test_extended_key_usage_keeps_order() {
        let original = ExtendedKeyUsage {
            usage: vec![ID_KP_CLIENT_AUTH, ID_KP_EMAIL_PROTECTION],
        };
        let encoded = original.to_x509_extension_value().unwrap();
        let decoded = ExtendedKeyUsage::from_x509_extension_value(&encoded).unwrap();
        assert_eq!(decoded.usage, vec![ID_KP_CLIENT_AUTH, ID_KP_EMAIL_PROTECTION]);
    }

    #[test]
    fn test_subject_alt_name_keeps_duplicates() {
        let original = SubjectAltName {
            names: vec![
                "b.example.com".to_string(),
                "a.example.com".to_string(),
                "b.example.com".to_string(),
            ],
        };
        let encoded = original.to_x509_extension_value().unwrap();
        let decoded = SubjectAltName::from_x509_extension_value(&encoded).unwrap();
        assert_eq!(original.names, decoded.names);
    }

    #[test]
    fn test_subject_alt_name_rejects_non_ascii() {
        let san = SubjectAltName {
            names: vec!["bücher.example".to_string()],
        };
        assert!(san.to_x509_extension_value().is_err());
    }

    #[test]
    fn test_dns_name_rejects_blank_entries() {
        assert!(dns_name("").is_err());
        assert!(dns_name("   ").is_err());
        assert!(dns_name(" padded.example.com").is_err());
        assert!(matches!(
            dns_name("host.example.com").unwrap(),
            GeneralName::DnsName(_)
        ));
    }

    #[test]
    fn test_to_extension_sets_criticality() {
        let ext = KeyUsage(KeyUsageFlags(0xB0)).to_extension(true).unwrap();
        assert!(ext.critical);
        assert_eq!(ext.extn_id, const_oid::db::rfc5280::ID_CE_KEY_USAGE);
    }

    #[test]
    fn test_name_value_pair_encoding() {
        let pair = EnrollmentNameValuePair::new("FriendlyName", "web").unwrap();
        let der = pair.to_der().unwrap();
        let decoded = EnrollmentNameValuePair::from_der(&der).unwrap();
        assert_eq!(pair, decoded);
        // SEQUENCE { BMPString "FriendlyName", BMPString "web" }
        assert_eq!(der[0], 0x30);
        assert_eq!(der[2], 0x1E);
    }
}
