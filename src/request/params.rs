use bon::Builder;
use const_oid::ObjectIdentifier;
use const_oid::db::rfc4519;
use der::asn1::{Ia5StringRef, PrintableStringRef, SetOfVec, Utf8StringRef};
use der::{Any, Tag};
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::name::{RdnSequence, RelativeDistinguishedName};

use crate::error::ProviderError;

/// Subject information supplied by the caller.
///
/// Either `subject_name_override` carries a complete distinguished name, in
/// which case every other field is ignored, or the individual attributes are
/// combined into one.
///
/// # Fields
/// * `subject_name_override` - A full DN string used verbatim.
/// * `common_name` - The common name (CN).
/// * `email_address` - The PKCS#9 email address (E).
/// * `organizational_unit` - The organizational unit (OU).
/// * `organization` - The organization (O).
/// * `locality` - The locality or city (L).
/// * `state` - The state or province (S).
/// * `country` - The two letter country code (C).
#[derive(Clone, Debug, Builder, Default, PartialEq, Eq)]
pub struct SubjectAttributes {
    pub subject_name_override: Option<String>,
    pub common_name: Option<String>,
    pub email_address: Option<String>,
    pub organizational_unit: Option<String>,
    pub organization: Option<String>,
    pub locality: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

/// Returns the value when it is present and not empty.
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl SubjectAttributes {
    /// The override DN, when one was given and is not empty.
    pub fn subject_name_override(&self) -> Option<&str> {
        non_empty(&self.subject_name_override)
    }

    /// True when any of the component attributes carries a value.
    pub fn has_components(&self) -> bool {
        [
            &self.common_name,
            &self.email_address,
            &self.organizational_unit,
            &self.organization,
            &self.locality,
            &self.state,
            &self.country,
        ]
        .into_iter()
        .any(|value| non_empty(value).is_some())
    }

    /// Joins the present attributes in the fixed order
    /// `E, CN, OU, O, L, S, C` with `,` and no padding.
    ///
    /// Values are escaped RFC 4514 style, so each field always yields
    /// exactly one RDN when the string is parsed back.
    pub fn to_dn_string(&self) -> String {
        [
            ("E", &self.email_address),
            ("CN", &self.common_name),
            ("OU", &self.organizational_unit),
            ("O", &self.organization),
            ("L", &self.locality),
            ("S", &self.state),
            ("C", &self.country),
        ]
        .into_iter()
        .filter_map(|(key, value)| {
            non_empty(value).map(|v| format!("{key}={}", escape_value(v)))
        })
        .collect::<Vec<_>>()
        .join(",")
    }
}

/// Backslash-escapes the characters that are special in a DN string, plus
/// leading and trailing spaces.
fn escape_value(value: &str) -> String {
    let last = value.chars().count().saturating_sub(1);
    let mut escaped = String::with_capacity(value.len());
    for (i, c) in value.chars().enumerate() {
        let edge_space = c == ' ' && (i == 0 || i == last);
        if edge_space || matches!(c, '\\' | ',' | ';' | '+' | '"' | '=' | '<' | '>' | '#') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// PKCS#9 emailAddress.
const EMAIL_ADDRESS: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.1");

/// How an attribute value is encoded on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ValueKind {
    Utf8,
    Printable,
    Ia5,
}

/// Maps a DN key to its attribute type.
fn attribute_type(key: &str) -> Option<(ObjectIdentifier, ValueKind)> {
    let entry = match key.to_ascii_uppercase().as_str() {
        "CN" => (rfc4519::CN, ValueKind::Utf8),
        "OU" => (rfc4519::OU, ValueKind::Utf8),
        "O" => (rfc4519::O, ValueKind::Utf8),
        "L" => (rfc4519::L, ValueKind::Utf8),
        "S" | "ST" => (rfc4519::ST, ValueKind::Utf8),
        "C" => (rfc4519::C, ValueKind::Printable),
        "E" | "EMAIL" | "EMAILADDRESS" => (EMAIL_ADDRESS, ValueKind::Ia5),
        "STREET" => (rfc4519::STREET, ValueKind::Utf8),
        "T" | "TITLE" => (rfc4519::TITLE, ValueKind::Utf8),
        "G" | "GN" | "GIVENNAME" => (rfc4519::GIVEN_NAME, ValueKind::Utf8),
        "SN" => (rfc4519::SN, ValueKind::Utf8),
        "SERIALNUMBER" => (rfc4519::SERIAL_NUMBER, ValueKind::Printable),
        "DC" => (rfc4519::DC, ValueKind::Ia5),
        "UID" => (rfc4519::UID, ValueKind::Utf8),
        _ => {
            let oid = ObjectIdentifier::new(key.strip_prefix("OID.").unwrap_or(key)).ok()?;
            (oid, ValueKind::Utf8)
        }
    };
    Some(entry)
}

fn encode_value(value: &str, kind: ValueKind) -> Result<Any, ProviderError> {
    let tag = match kind {
        ValueKind::Utf8 => {
            Utf8StringRef::new(value)?;
            Tag::Utf8String
        }
        ValueKind::Printable => {
            PrintableStringRef::new(value)?;
            Tag::PrintableString
        }
        ValueKind::Ia5 => {
            Ia5StringRef::new(value)?;
            Tag::Ia5String
        }
    };
    Ok(Any::new(tag, value.as_bytes())?)
}

/// Splits `input` on unescaped, unquoted separators. Escapes and quotes are
/// left in place for [`unescape_value`].
fn split_unescaped(input: &str, separators: &[char]) -> Result<Vec<String>, ProviderError> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped) => {
                    current.push('\\');
                    current.push(escaped);
                }
                None => {
                    return Err(ProviderError::new(format!(
                        "dangling escape at end of distinguished name {input:?}"
                    )));
                }
            },
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            c if !in_quotes && separators.contains(&c) => {
                parts.push(std::mem::take(&mut current));
            }
            c => current.push(c),
        }
    }

    if in_quotes {
        return Err(ProviderError::new(format!(
            "unterminated quote in distinguished name {input:?}"
        )));
    }
    parts.push(current);
    Ok(parts)
}

/// Removes quoting and escapes from an attribute value. Unescaped
/// whitespace at either end is dropped; escaped or quoted spaces are kept.
fn unescape_value(raw: &str) -> String {
    let mut value = String::with_capacity(raw.len());
    let mut significant = 0;
    let mut in_quotes = false;
    let mut chars = raw.trim_start().chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                value.extend(chars.next());
                significant = value.len();
            }
            '"' => in_quotes = !in_quotes,
            c => {
                value.push(c);
                if in_quotes || !c.is_whitespace() {
                    significant = value.len();
                }
            }
        }
    }

    value.truncate(significant);
    value
}

/// Parses a distinguished name string such as
/// `E=joe@example.com,CN=Joe User,O=Example,C=US` into an X.501 name.
///
/// RDNs are separated by `,` or `;`. The string lists the most specific RDN
/// first, so the encoded sequence is reversed.
pub fn parse_distinguished_name(dn: &str) -> Result<RdnSequence, ProviderError> {
    let mut rdns = Vec::new();

    for component in split_unescaped(dn, &[',', ';'])? {
        let Some((key, raw_value)) = component.split_once('=') else {
            return Err(ProviderError::new(format!(
                "malformed component {:?} in distinguished name {dn:?}",
                component.trim()
            )));
        };

        let key = key.trim();
        let (oid, kind) = attribute_type(key).ok_or_else(|| {
            ProviderError::new(format!("unknown distinguished name attribute {key:?}"))
        })?;

        let attribute = AttributeTypeAndValue {
            oid,
            value: encode_value(&unescape_value(raw_value), kind)?,
        };
        rdns.push(RelativeDistinguishedName(SetOfVec::try_from(vec![attribute])?));
    }

    rdns.reverse();
    Ok(RdnSequence(rdns))
}
