use std::fmt;

use const_oid::db::rfc5912::{
    ECDSA_WITH_SHA_256, ECDSA_WITH_SHA_384, ECDSA_WITH_SHA_512, SHA_256_WITH_RSA_ENCRYPTION,
};
use der::Any;
use pkcs8::EncodePrivateKey;
use rsa::pkcs1v15::SigningKey as RsaSigningKey;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha1::{Digest, Sha1};
use sha2::Sha256;
use x509_cert::spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};

use crate::error::ProviderError;
use crate::pem_utils::der_to_pem;
use crate::profile::KeyAlgorithm;

pub type Result<T> = std::result::Result<T, ProviderError>;

/// A freshly generated private key together with its public half.
///
/// Private key material is zeroized when the value is dropped.
pub enum KeyPair {
    Rsa {
        signing_key: Box<RsaSigningKey<Sha256>>,
        public: RsaPublicKey,
    },
    EcdsaP256(p256::SecretKey),
    EcdsaP384(p384::SecretKey),
    EcdsaP521(p521::SecretKey),
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("KeyPair").field(&self.algorithm_name()).finish()
    }
}

impl KeyPair {
    /// Generate a key pair for the given algorithm and length.
    ///
    /// The length must already have been validated by the profile resolver;
    /// an ECC length that does not name a supported curve is an error here too.
    pub fn generate(algorithm: KeyAlgorithm, length: u32) -> Result<Self> {
        match (algorithm, length) {
            (KeyAlgorithm::Rsa, bits) => Self::generate_rsa(bits as usize),
            (KeyAlgorithm::Ecc, 256) => Ok(Self::generate_ecdsa_p256()),
            (KeyAlgorithm::Ecc, 384) => Ok(Self::generate_ecdsa_p384()),
            (KeyAlgorithm::Ecc, 521) => Ok(Self::generate_ecdsa_p521()),
            (KeyAlgorithm::Ecc, other) => Err(ProviderError(format!(
                "no supported elliptic curve has a {other}-bit key"
            ))),
        }
    }

    /// Generate an RSA key pair with the specified number of bits.
    pub fn generate_rsa(bits: usize) -> Result<Self> {
        let mut rng = rand_core::OsRng;
        let private = RsaPrivateKey::new(&mut rng, bits)?;
        let public = RsaPublicKey::from(&private);
        Ok(KeyPair::Rsa {
            signing_key: Box::new(RsaSigningKey::new(private)),
            public,
        })
    }

    /// Generate an ECDSA P-256 key pair.
    pub fn generate_ecdsa_p256() -> Self {
        KeyPair::EcdsaP256(p256::SecretKey::random(&mut rand_core::OsRng))
    }

    /// Generate an ECDSA P-384 key pair.
    pub fn generate_ecdsa_p384() -> Self {
        KeyPair::EcdsaP384(p384::SecretKey::random(&mut rand_core::OsRng))
    }

    /// Generate an ECDSA P-521 key pair.
    pub fn generate_ecdsa_p521() -> Self {
        KeyPair::EcdsaP521(p521::SecretKey::random(&mut rand_core::OsRng))
    }

    pub fn algorithm_name(&self) -> &'static str {
        match self {
            KeyPair::Rsa { .. } => "RSA",
            KeyPair::EcdsaP256(_) => "ECDSA_P256",
            KeyPair::EcdsaP384(_) => "ECDSA_P384",
            KeyPair::EcdsaP521(_) => "ECDSA_P521",
        }
    }

    /// The SubjectPublicKeyInfo for the public half of the key.
    pub fn subject_public_key_info(&self) -> Result<SubjectPublicKeyInfoOwned> {
        let spki = match self {
            KeyPair::Rsa { public, .. } => SubjectPublicKeyInfoOwned::from_key(public.clone())?,
            KeyPair::EcdsaP256(secret) => SubjectPublicKeyInfoOwned::from_key(secret.public_key())?,
            KeyPair::EcdsaP384(secret) => SubjectPublicKeyInfoOwned::from_key(secret.public_key())?,
            KeyPair::EcdsaP521(secret) => SubjectPublicKeyInfoOwned::from_key(secret.public_key())?,
        };
        Ok(spki)
    }

    /// The signature algorithm this key signs requests with.
    pub fn signature_algorithm(&self) -> AlgorithmIdentifierOwned {
        match self {
            // RFC 4055 requires explicit NULL parameters for PKCS#1 v1.5.
            KeyPair::Rsa { .. } => AlgorithmIdentifierOwned {
                oid: SHA_256_WITH_RSA_ENCRYPTION,
                parameters: Some(Any::null()),
            },
            KeyPair::EcdsaP256(_) => AlgorithmIdentifierOwned {
                oid: ECDSA_WITH_SHA_256,
                parameters: None,
            },
            KeyPair::EcdsaP384(_) => AlgorithmIdentifierOwned {
                oid: ECDSA_WITH_SHA_384,
                parameters: None,
            },
            KeyPair::EcdsaP521(_) => AlgorithmIdentifierOwned {
                oid: ECDSA_WITH_SHA_512,
                parameters: None,
            },
        }
    }

    /// Signs `data` with the hash matching the key: SHA-256 for RSA and P-256,
    /// SHA-384 for P-384, SHA-512 for P-521. ECDSA signatures are DER encoded.
    pub fn sign_data(&self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            KeyPair::Rsa { signing_key, .. } => {
                let signature = signing_key.try_sign(data)?;
                Ok(signature.to_vec())
            }
            KeyPair::EcdsaP256(secret) => {
                let signing_key = p256::ecdsa::SigningKey::from(secret);
                let signature: p256::ecdsa::Signature = signing_key.try_sign(data)?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
            KeyPair::EcdsaP384(secret) => {
                let signing_key = p384::ecdsa::SigningKey::from(secret);
                let signature: p384::ecdsa::Signature = signing_key.try_sign(data)?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
            KeyPair::EcdsaP521(secret) => {
                let signing_key = p521::ecdsa::SigningKey::from_slice(&secret.to_bytes())?;
                let signature: p521::ecdsa::Signature = signing_key.try_sign(data)?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
        }
    }

    /// Hex encoded SHA-1 of the subject public key bits, as used for
    /// subject key identifiers.
    pub fn key_id(&self) -> Result<String> {
        let spki = self.subject_public_key_info()?;
        let digest = Sha1::digest(spki.subject_public_key.raw_bytes());
        Ok(digest.iter().map(|byte| format!("{byte:02x}")).collect())
    }

    /// Exports the private key as an unencrypted PKCS#8 PEM document.
    pub fn to_pkcs8_pem(&self) -> Result<String> {
        let document = match self {
            KeyPair::Rsa { signing_key, .. } => {
                let private: &RsaPrivateKey = (**signing_key).as_ref();
                private.to_pkcs8_der()?
            }
            KeyPair::EcdsaP256(secret) => secret.to_pkcs8_der()?,
            KeyPair::EcdsaP384(secret) => secret.to_pkcs8_der()?,
            KeyPair::EcdsaP521(secret) => secret.to_pkcs8_der()?,
        };
        Ok(der_to_pem(document.as_bytes(), "PRIVATE KEY"))
    }
}
