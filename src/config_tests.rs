// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Tests for record spec parsing.

#[cfg(test)]
mod tests {
    use crate::config::*;
    use crate::errors::ConfigError;
    use crate::record::{RecordData, RecordType};
    use crate::store::{Zone, ZoneStore};
    use std::io::Write;

    // ========== Parsing ==========

    #[test]
    fn test_minimal_spec_defaults() {
        let spec = RecordSpec::parse("name: www.example.com\ntype: A\nvalue: 192.0.2.1\n").unwrap();

        assert_eq!(spec.ttl, 3600);
        assert!(spec.overwrite);
        assert!(!spec.mock);
        assert_eq!(spec.value, Some(OneOrMany::One("192.0.2.1".to_string())));

        let desired = spec.desired_record().unwrap();
        assert_eq!(desired.name, "www.example.com.");
        assert_eq!(desired.record_type, RecordType::A);
        assert_eq!(
            desired.data,
            RecordData::Values {
                values: vec!["192.0.2.1".to_string()],
                ttl: 3600,
            }
        );
        assert!(desired.overwrite);
        assert_eq!(desired.zone_id, None);
    }

    #[test]
    fn test_unquoted_scalar_values_kept_as_text() {
        let spec = RecordSpec::parse("name: example.com\ntype: TXT\nvalue: 10\n").unwrap();
        assert_eq!(spec.value, Some(OneOrMany::One("10".to_string())));

        let spec = RecordSpec::parse(
            "name: example.com\ntype: TXT\nvalue:\n  - 42\n  - true\n  - v=spf1 -all\n",
        )
        .unwrap();
        assert_eq!(
            spec.desired_record().unwrap().data.values(),
            ["42", "true", "v=spf1 -all"]
        );
    }

    #[test]
    fn test_mapping_value_rejected_with_clear_message() {
        let err = RecordSpec::parse("name: example.com\ntype: A\nvalue:\n  ip: 192.0.2.1\n")
            .unwrap_err();

        assert!(matches!(err, ConfigError::Parse(_)), "{err:?}");
        assert!(
            err.to_string().contains("must be strings or numbers"),
            "{err}"
        );
    }

    #[test]
    fn test_value_list() {
        let spec = RecordSpec::parse(
            r"
name: example.com
type: MX
value:
  - 10 mail1.example.com.
  - 20 mail2.example.com.
ttl: 300
overwrite: false
zone_id: Z1
",
        )
        .unwrap();

        let desired = spec.desired_record().unwrap();
        assert_eq!(
            desired.data.values(),
            ["10 mail1.example.com.", "20 mail2.example.com."]
        );
        assert_eq!(desired.data.ttl(), Some(300));
        assert!(!desired.overwrite);
        assert_eq!(desired.zone_id.as_deref(), Some("Z1"));
    }

    #[test]
    fn test_json_spec() {
        let spec = RecordSpec::parse(
            r#"{"name": "txt.example.com", "type": "TXT", "value": ["\"hello\""], "ttl": 60}"#,
        )
        .unwrap();
        assert_eq!(spec.record_type, RecordType::TXT);
        assert_eq!(spec.desired_record().unwrap().data.values(), ["\"hello\""]);
    }

    #[test]
    fn test_unknown_type_rejected() {
        let err = RecordSpec::parse("name: www.example.com\ntype: CAA\nvalue: x\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "{err:?}");
    }

    #[test]
    fn test_missing_name_rejected() {
        assert!(matches!(
            RecordSpec::parse("type: A\nvalue: 192.0.2.1\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_alias_spec() {
        let spec = RecordSpec::parse(
            r"
name: www.example.com
type: A
ttl: 60
alias_target:
  dns_name: lb-1.us-east-1.elb.amazonaws.com
  evaluate_target_health: true
  hosted_zone_id: Z35SXDOTRQ7X7K
",
        )
        .unwrap();

        let desired = spec.desired_record().unwrap();
        let target = desired.data.alias_target().unwrap();
        assert_eq!(target.dns_name, "lb-1.us-east-1.elb.amazonaws.com");
        assert!(target.evaluate_health);
        assert_eq!(desired.data.ttl(), None);
    }

    #[test]
    fn test_alias_wins_over_value() {
        let spec = RecordSpec::parse(
            r"
name: www.example.com
type: A
value: 192.0.2.1
alias_target:
  dns_name: lb.example.net
  hosted_zone_id: Z35SXDOTRQ7X7K
",
        )
        .unwrap();
        assert!(spec.desired_record().unwrap().data.is_alias());
    }

    #[test]
    fn test_record_without_data_rejected() {
        let spec = RecordSpec::parse("name: www.example.com\ntype: A\nvalue: []\n").unwrap();
        let err = spec.desired_record().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }), "{err:?}");
    }

    #[test]
    fn test_empty_name_rejected() {
        let spec = RecordSpec::parse("name: '.'\ntype: A\nvalue: 192.0.2.1\n").unwrap();
        assert!(matches!(
            spec.desired_record(),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name: www.example.com\ntype: AAAA\nvalue: 2001:db8::1").unwrap();

        let spec = RecordSpec::from_file(file.path()).unwrap();
        assert_eq!(spec.record_type, RecordType::AAAA);
    }

    #[test]
    fn test_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = RecordSpec::from_file(&dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    // ========== Credentials ==========

    #[test]
    fn test_explicit_credentials_need_both_keys() {
        let mut spec = RecordSpec::parse("name: a.example.com\ntype: A\nvalue: 192.0.2.1\n").unwrap();
        assert_eq!(spec.explicit_credentials(), None);

        spec.aws_access_key_id = Some("AKIAEXAMPLE".to_string());
        assert_eq!(spec.explicit_credentials(), None);

        spec.aws_secret_access_key = Some("secret".to_string());
        let creds = spec.explicit_credentials().unwrap();
        assert_eq!(creds.access_key_id, "AKIAEXAMPLE");
        assert_eq!(creds.session_token, None);
    }

    // ========== Mock provider ==========

    #[test]
    fn test_default_mock_zone_is_parent_domain() {
        let spec = RecordSpec::parse("name: www.example.com\ntype: A\nvalue: 192.0.2.1\nmock: true\n")
            .unwrap();
        assert_eq!(spec.mock_zone_list(), vec![Zone::new("MOCKZONE", "example.com.")]);
    }

    #[test]
    fn test_default_mock_zone_uses_zone_id() {
        let spec =
            RecordSpec::parse("name: www.example.com\ntype: A\nvalue: 192.0.2.1\nzone_id: Z9\n")
                .unwrap();
        assert_eq!(spec.mock_zone_list(), vec![Zone::new("Z9", "example.com.")]);
    }

    #[test]
    fn test_configured_mock_zones() {
        let spec = RecordSpec::parse(
            r"
name: x.a.b.com
type: A
value: 192.0.2.1
mock: true
mock_zones:
  - domain: b.com
  - domain: a.b.com
    id: ZAB
",
        )
        .unwrap();

        let settings = ProviderSettings::for_spec(&spec);
        assert!(settings.mock);
        assert_eq!(
            settings.mock_zones,
            vec![Zone::new("MOCKZONE1", "b.com."), Zone::new("ZAB", "a.b.com.")]
        );
        assert_eq!(settings.mock_store().list_zones().unwrap(), settings.mock_zones);
    }

    #[test]
    fn test_provider_defaults() {
        let settings = ProviderSettings::default();
        assert_eq!(settings.endpoint, "https://route53.amazonaws.com");
        assert_eq!(settings.region, "us-east-1");
        assert_eq!(settings.nameserver, None);
    }
}
