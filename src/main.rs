use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};

use csrkit::config::CsrKitConfig;
use csrkit::orchestrator::{CsrRequest, build_request};
use csrkit::profile::{CertificateType, KeyAlgorithm};
use csrkit::provider::StorageContext;
use csrkit::request::params::SubjectAttributes;

fn cli() -> Command {
    Command::new("csrkit")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Builds PKCS#10 certificate signing requests from certificate profiles")
        .arg(
            Arg::new("type")
                .short('t')
                .long("type")
                .value_name("TYPE")
                .help("Certificate type")
                .value_parser(["server", "client", "smime", "codesigning"])
                .default_value("server"),
        )
        .arg(
            Arg::new("algorithm")
                .short('a')
                .long("algorithm")
                .value_name("ALGORITHM")
                .help("Key algorithm (defaults to the configured algorithm)")
                .value_parser(["rsa", "ecc"]),
        )
        .arg(
            Arg::new("key-length")
                .short('l')
                .long("key-length")
                .value_name("BITS")
                .help("Key length: 2048/4096/8192/16384 for RSA, 256/384/521 for ECC")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("subject-name")
                .long("subject-name")
                .value_name("DN")
                .help("Full subject DN; overrides the individual subject fields"),
        )
        .arg(
            Arg::new("common-name")
                .long("common-name")
                .value_name("CN")
                .help("Subject common name"),
        )
        .arg(
            Arg::new("email")
                .long("email")
                .value_name("ADDRESS")
                .help("Subject email address (required for smime)"),
        )
        .arg(
            Arg::new("organizational-unit")
                .long("organizational-unit")
                .value_name("OU")
                .help("Subject organizational unit"),
        )
        .arg(
            Arg::new("organization")
                .long("organization")
                .value_name("O")
                .help("Subject organization"),
        )
        .arg(
            Arg::new("locality")
                .long("locality")
                .value_name("L")
                .help("Subject locality"),
        )
        .arg(
            Arg::new("state")
                .long("state")
                .value_name("S")
                .help("Subject state or province"),
        )
        .arg(
            Arg::new("country")
                .long("country")
                .value_name("C")
                .help("Two letter subject country code"),
        )
        .arg(
            Arg::new("san")
                .long("san")
                .value_name("DNS")
                .help("DNS subject alternative name (server only, repeatable)")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("friendly-name")
                .long("friendly-name")
                .value_name("NAME")
                .help("Friendly name attached to the request"),
        )
        .arg(
            Arg::new("description")
                .long("description")
                .value_name("TEXT")
                .help("Description attached to the request"),
        )
        .arg(
            Arg::new("context")
                .long("context")
                .value_name("CONTEXT")
                .help("Key storage context: machine or user (default depends on type)"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Write the request to FILE instead of standard output")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable debug logging")
                .action(ArgAction::SetTrue),
        )
}

fn string_arg(matches: &ArgMatches, id: &str) -> Option<String> {
    matches.get_one::<String>(id).cloned()
}

fn certificate_type(name: &str) -> CertificateType {
    match name {
        "client" => CertificateType::Client,
        "smime" => CertificateType::Smime,
        "codesigning" => CertificateType::CodeSigning,
        _ => CertificateType::Server,
    }
}

fn request_from_matches(matches: &ArgMatches, config: &CsrKitConfig) -> Result<CsrRequest> {
    let certificate_type = certificate_type(
        matches
            .get_one::<String>("type")
            .map(String::as_str)
            .unwrap_or("server"),
    );

    let key_algorithm = match matches.get_one::<String>("algorithm").map(String::as_str) {
        Some("ecc") => KeyAlgorithm::Ecc,
        Some(_) => KeyAlgorithm::Rsa,
        None => config.default_algorithm.into(),
    };

    let key_length = matches
        .get_one::<u32>("key-length")
        .copied()
        .or_else(|| config.default_key_length(key_algorithm));

    let storage_context = matches
        .get_one::<String>("context")
        .map(|context| context.parse::<StorageContext>())
        .transpose()?;

    let subject = SubjectAttributes {
        subject_name_override: string_arg(matches, "subject-name"),
        common_name: string_arg(matches, "common-name"),
        email_address: string_arg(matches, "email"),
        organizational_unit: string_arg(matches, "organizational-unit"),
        organization: string_arg(matches, "organization"),
        locality: string_arg(matches, "locality"),
        state: string_arg(matches, "state"),
        country: string_arg(matches, "country"),
    };

    let alternate_names = matches
        .get_many::<String>("san")
        .map(|names| names.cloned().collect())
        .unwrap_or_default();

    Ok(CsrRequest {
        certificate_type,
        key_algorithm,
        key_length,
        subject,
        alternate_names,
        friendly_name: string_arg(matches, "friendly-name"),
        description: string_arg(matches, "description"),
        storage_context,
    })
}

fn main() -> Result<()> {
    let matches = cli().get_matches();

    let default_level = if matches.get_flag("verbose") {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config_path = matches.get_one::<PathBuf>("config");
    let config = CsrKitConfig::load_or_default(config_path.map(PathBuf::as_path))
        .context("Failed to load configuration")?;

    let request = request_from_matches(&matches, &config)?;
    let csr = build_request(&request, &config.key_provider())
        .context("Failed to build certificate signing request")?;

    match matches.get_one::<PathBuf>("output") {
        Some(path) => {
            fs::write(path, csr.as_str())
                .with_context(|| format!("Failed to write {}", path.display()))?;
            log::info!("Wrote request to {}", path.display());
        }
        None => print!("{csr}"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CsrRequest> {
        let matches = cli().try_get_matches_from(args)?;
        request_from_matches(&matches, &CsrKitConfig::default())
    }

    #[test]
    fn test_cli_definition_is_valid() {
        cli().debug_assert();
    }

    #[test]
    fn test_parse_smime_request() {
        let request = parse(&[
            "csrkit",
            "--type",
            "smime",
            "--algorithm",
            "ecc",
            "--key-length",
            "384",
            "--common-name",
            "Joe User",
            "--email",
            "joe@example.com",
        ])
        .unwrap();
        assert_eq!(request.certificate_type, CertificateType::Smime);
        assert_eq!(request.key_algorithm, KeyAlgorithm::Ecc);
        assert_eq!(request.key_length, Some(384));
        assert_eq!(request.subject.email_address.as_deref(), Some("joe@example.com"));
        assert_eq!(request.storage_context, None);
    }

    #[test]
    fn test_parse_repeated_san() {
        let request = parse(&[
            "csrkit",
            "--common-name",
            "a.example.com",
            "--san",
            "a.example.com",
            "--san",
            "b.example.com",
        ])
        .unwrap();
        assert_eq!(request.certificate_type, CertificateType::Server);
        assert_eq!(request.alternate_names, vec!["a.example.com", "b.example.com"]);
    }

    #[test]
    fn test_unknown_context_is_rejected() {
        let err = parse(&["csrkit", "--common-name", "x", "--context", "LocalMachine"]).unwrap_err();
        assert!(err.to_string().contains("Invalid storage context"));
    }

    #[test]
    fn test_config_supplies_algorithm_and_length() {
        let config = CsrKitConfig {
            default_algorithm: csrkit::config::ConfiguredAlgorithm::Ecc,
            default_ecc_key_length: Some(521),
            ..Default::default()
        };
        let matches = cli()
            .try_get_matches_from(["csrkit", "--common-name", "x"])
            .unwrap();
        let request = request_from_matches(&matches, &config).unwrap();
        assert_eq!(request.key_algorithm, KeyAlgorithm::Ecc);
        assert_eq!(request.key_length, Some(521));
    }
}
