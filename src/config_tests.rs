// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `config.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["certificate-controller"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).expect("arguments should parse")
    }

    #[test]
    fn test_identity_requires_certificate_arn() {
        let result = ControllerIdentity::from_settings(None, Some("certificate-controller"));

        assert_eq!(
            result,
            Err(ConfigError::MissingCertificateArn {
                env: "CERTIFICATE_ARN"
            })
        );
    }

    #[test]
    fn test_identity_rejects_blank_certificate_arn() {
        let result = ControllerIdentity::from_settings(Some("   "), None);

        assert!(result.is_err(), "A blank ARN is as good as a missing one");
    }

    #[test]
    fn test_identity_defaults_controller_class() {
        let identity = ControllerIdentity::from_settings(Some("arn:aws:acm:example"), None)
            .expect("identity should build");

        assert_eq!(identity.controller_class(), "certificate-controller");
        assert_eq!(identity.target_value(), "arn:aws:acm:example");
    }

    #[test]
    fn test_identity_blank_class_falls_back_to_default() {
        let identity = ControllerIdentity::from_settings(Some("arn:aws:acm:example"), Some(""))
            .expect("identity should build");

        assert_eq!(identity.controller_class(), "certificate-controller");
    }

    #[test]
    fn test_identity_keeps_custom_class() {
        let identity =
            ControllerIdentity::from_settings(Some("arn:aws:acm:example"), Some("edge-lb"))
                .expect("identity should build");

        assert_eq!(identity.controller_class(), "edge-lb");
    }

    #[test]
    fn test_cli_defaults() {
        let cli = parse(&["--certificate-arn", "arn:aws:acm:example"]);

        assert_eq!(cli.resync_interval().unwrap(), Duration::from_secs(2));
        assert_eq!(cli.write_retry_budget(), Duration::from_secs(10));
        assert_eq!(cli.metrics_address(), "0.0.0.0:8080");
        assert!(cli.lease_settings().is_none());
        assert_eq!(
            cli.identity().unwrap(),
            ControllerIdentity::new("certificate-controller", "arn:aws:acm:example")
        );
    }

    #[test]
    fn test_cli_rejects_zero_resync_interval() {
        let cli = parse(&[
            "--certificate-arn",
            "arn:aws:acm:example",
            "--resync-interval-secs",
            "0",
        ]);

        assert_eq!(
            cli.resync_interval(),
            Err(ConfigError::ZeroInterval {
                setting: "resync interval"
            })
        );
    }

    #[test]
    fn test_cli_lease_settings_when_enabled() {
        let cli = parse(&[
            "--certificate-arn",
            "arn:aws:acm:example",
            "--leader-election",
            "--lease-namespace",
            "kube-system",
            "--lease-identity",
            "controller-0",
        ]);

        assert_eq!(
            cli.lease_settings(),
            Some(LeaseSettings {
                name: "certificate-controller-leader".to_string(),
                namespace: "kube-system".to_string(),
                identity: "controller-0".to_string(),
            })
        );
    }

    #[test]
    fn test_cli_custom_metrics_address() {
        let cli = parse(&[
            "--certificate-arn",
            "arn:aws:acm:example",
            "--metrics-bind-address",
            "127.0.0.1",
            "--metrics-port",
            "9100",
        ]);

        assert_eq!(cli.metrics_address(), "127.0.0.1:9100");
    }
}
