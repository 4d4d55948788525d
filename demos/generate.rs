use csrkit::orchestrator::{CsrRequest, build_request};
use csrkit::profile::{CertificateType, KeyAlgorithm};
use csrkit::provider::SoftwareKeyProvider;
use csrkit::request::params::SubjectAttributes;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    // Keys are written to keys/<context>/<key id>.pem
    let provider = SoftwareKeyProvider::new()
        .with_machine_key_directory("keys/machine")
        .with_user_key_directory("keys/user");

    // A TLS server request with two DNS names
    let server = CsrRequest::builder()
        .certificate_type(CertificateType::Server)
        .key_algorithm(KeyAlgorithm::Rsa)
        .key_length(4096)
        .subject(
            SubjectAttributes::builder()
                .common_name("server.example.com".to_string())
                .organization("Example Corp".to_string())
                .locality("Springfield".to_string())
                .country("US".to_string())
                .build(),
        )
        .alternate_names(vec![
            "server.example.com".to_string(),
            "www.example.com".to_string(),
        ])
        .friendly_name("Example web server".to_string())
        .build();
    println!("Server request:\n{}", build_request(&server, &provider)?);

    // An S/MIME request on P-384
    let smime = CsrRequest::builder()
        .certificate_type(CertificateType::Smime)
        .key_algorithm(KeyAlgorithm::Ecc)
        .key_length(384)
        .subject(
            SubjectAttributes::builder()
                .common_name("Joe User".to_string())
                .email_address("joe@example.com".to_string())
                .build(),
        )
        .build();
    println!("S/MIME request:\n{}", build_request(&smime, &provider)?);

    Ok(())
}
