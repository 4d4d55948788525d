/// PEM label used for certificate signing requests handed to CA intake tooling.
pub const CSR_PEM_LABEL: &str = "NEW CERTIFICATE REQUEST";

/// Convert DER‑encoded data into a PEM‑encoded string with the provided label.
///
/// The body is wrapped at 64 columns and every line ends with `\n`.
pub fn der_to_pem(der: &[u8], label: &str) -> String {
    let pem = pem::Pem::new(label, der);
    pem::encode_config(
        &pem,
        pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF),
    )
}

/// Convert a PEM‑encoded string to DER‑encoded bytes.
pub fn pem_to_der(pem_str: &str) -> Result<Vec<u8>, pem::PemError> {
    let pem = pem::parse(pem_str)?;
    Ok(pem.contents().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csr_framing() {
        let pem = der_to_pem(&[0x30, 0x03, 0x02, 0x01, 0x01], CSR_PEM_LABEL);
        assert!(pem.starts_with("-----BEGIN NEW CERTIFICATE REQUEST-----\n"));
        assert!(pem.ends_with("-----END NEW CERTIFICATE REQUEST-----\n"));
        assert!(!pem.contains('\r'));
        assert_eq!(pem_to_der(&pem).unwrap(), vec![0x30, 0x03, 0x02, 0x01, 0x01]);
    }
}
