use der::asn1::{BitString, SetOfVec};
use der::{Any, Decode, Encode};
use x509_cert::attr::Attribute;
use x509_cert::ext::Extension;
use x509_cert::name::RdnSequence;
use x509_cert::request::{CertReq, CertReqInfo, ExtensionReq, Version};
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::error::ProviderError;
use crate::key::KeyPair;
use crate::request::AssembledRequest;
use crate::request::extensions::{
    ENROLLMENT_NAME_VALUE_PAIR, EnrollmentNameValuePair, ExtendedKeyUsage, KeyUsage,
    SubjectAltName, ToAndFromX509Extension,
};
use crate::request::params::parse_distinguished_name;

pub type Result<T> = std::result::Result<T, ProviderError>;

/// The signable content of a PKCS#10 request, before a key is attached.
///
/// # Fields
/// * `subject` - The parsed subject name.
/// * `extensions` - Extensions placed in the `extensionRequest` attribute.
/// * `name_value_pairs` - Enrollment properties such as the friendly name.
#[derive(Debug, Clone)]
pub struct CertificationRequest {
    pub subject: RdnSequence,
    pub extensions: Vec<Extension>,
    pub name_value_pairs: Vec<EnrollmentNameValuePair>,
}

impl CertificationRequest {
    /// Converts an assembled request into its ASN.1 building blocks.
    ///
    /// Key Usage keeps the profile's criticality; Extended Key Usage and the
    /// Subject Alternative Name are never critical. The SAN extension is
    /// omitted when there are no alternate names.
    pub fn from_assembled(request: &AssembledRequest) -> Result<Self> {
        let subject = parse_distinguished_name(&request.distinguished_name)?;

        let mut extensions = vec![
            KeyUsage(request.key_usage).to_extension(request.key_usage_critical)?,
            ExtendedKeyUsage {
                usage: request.extended_key_usage.clone(),
            }
            .to_extension(false)?,
        ];

        if !request.alternate_names.is_empty() {
            let san = SubjectAltName {
                names: request.alternate_names.clone(),
            };
            extensions.push(san.to_extension(false)?);
        }

        let mut name_value_pairs = Vec::new();
        if let Some(friendly_name) = &request.friendly_name {
            name_value_pairs.push(EnrollmentNameValuePair::new("FriendlyName", friendly_name)?);
        }
        if let Some(description) = &request.description {
            name_value_pairs.push(EnrollmentNameValuePair::new("Description", description)?);
        }

        Ok(Self {
            subject,
            extensions,
            name_value_pairs,
        })
    }

    fn attributes(&self) -> Result<SetOfVec<Attribute>> {
        let mut attributes = Vec::with_capacity(1 + self.name_value_pairs.len());

        let extension_request = ExtensionReq(self.extensions.clone()).to_der()?;
        attributes.push(Attribute {
            oid: <ExtensionReq as const_oid::AssociatedOid>::OID,
            values: SetOfVec::try_from(vec![Any::from_der(&extension_request)?])?,
        });

        for pair in &self.name_value_pairs {
            attributes.push(Attribute {
                oid: ENROLLMENT_NAME_VALUE_PAIR,
                values: SetOfVec::try_from(vec![Any::from_der(&pair.to_der()?)?])?,
            });
        }

        Ok(SetOfVec::try_from(attributes)?)
    }

    /// Builds the `CertificationRequestInfo` for the given public key.
    pub fn to_cert_req_info(&self, public_key: SubjectPublicKeyInfoOwned) -> Result<CertReqInfo> {
        Ok(CertReqInfo {
            version: Version::V1,
            subject: self.subject.clone(),
            public_key,
            attributes: self.attributes()?,
        })
    }

    /// Signs the request info with `key` and returns the complete request.
    pub fn sign(&self, key: &KeyPair) -> Result<CertReq> {
        let info = self.to_cert_req_info(key.subject_public_key_info()?)?;
        let signature = key.sign_data(&info.to_der()?)?;

        Ok(CertReq {
            info,
            algorithm: key.signature_algorithm(),
            signature: BitString::from_bytes(&signature)?,
        })
    }

    /// Signs the request and encodes it as DER.
    pub fn sign_to_der(&self, key: &KeyPair) -> Result<Vec<u8>> {
        Ok(self.sign(key)?.to_der()?)
    }
}
