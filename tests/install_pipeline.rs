//! Install pipeline: ordering, guards and error policy

mod helpers;

use helpers::*;
use nginx_deployer::core::config::{
    ENV_NAME_VAR, EXT_KEY_VAR, GATEWAY_CONFIG_VAR, SITES_CONFIG_VAR, SSL_CONFIG_VAR,
};
use nginx_deployer::services::{Outcome, UpstreamRequest};
use nginx_deployer::{DeployError, PipelineError, StepState};

#[tokio::test]
async fn test_ssl_domains_file_without_gateway() {
    let dir = tempfile::tempdir().unwrap();
    let options = temp_options(dir.path());
    let cert = options.paths.nginx.cert.clone();
    let mocks = MockServices::new();

    let (_, ctx) = run_install(
        options,
        env(&[(SSL_CONFIG_VAR, r#"{"domains":["a.com","b.com"]}"#)]),
        &mocks,
    )
    .await
    .unwrap();

    assert_eq!(std::fs::read_to_string(cert.join("domains")).unwrap(), "a.com,b.com");
    assert_eq!(ctx.ssl_domain, vec!["a.com", "b.com"]);
}

#[tokio::test]
async fn test_gateway_domain_appended_after_domains_file_written() {
    let dir = tempfile::tempdir().unwrap();
    let options = temp_options(dir.path());
    let cert = options.paths.nginx.cert.clone();
    let mocks = MockServices::with_gateway(gateway(Some("gw.io")));

    let (_, ctx) = run_install(
        options,
        env(&[
            (SSL_CONFIG_VAR, r#"{"domains":["a.com"]}"#),
            (GATEWAY_CONFIG_VAR, "/etc/gateway.json"),
        ]),
        &mocks,
    )
    .await
    .unwrap();

    assert_eq!(ctx.ssl_domain, vec!["a.com", "gw.io"]);
    assert_eq!(std::fs::read_to_string(cert.join("domains")).unwrap(), "a.com");

    let api = mocks.gateway.api_requests.lock().unwrap();
    assert_eq!(api[0].ssl_domains, vec!["a.com", "gw.io"]);
    assert_eq!(api[0].domain.as_deref(), Some("gw.io"));
    assert!(api[0].ssl.is_some());
    assert_eq!(*mocks.gateway.locators.lock().unwrap(), vec!["/etc/gateway.json"]);
}

#[tokio::test]
async fn test_duplicate_domains_are_kept() {
    let dir = tempfile::tempdir().unwrap();
    let mocks = MockServices::with_gateway(gateway(Some("a.com")));

    let (_, ctx) = run_install(
        temp_options(dir.path()),
        env(&[
            (SSL_CONFIG_VAR, r#"{"domains":["a.com"]}"#),
            (GATEWAY_CONFIG_VAR, "locator"),
        ]),
        &mocks,
    )
    .await
    .unwrap();

    assert_eq!(ctx.ssl_domain, vec!["a.com", "a.com"]);
}

#[tokio::test]
async fn test_no_gateway_locator_skips_gateway_steps() {
    let dir = tempfile::tempdir().unwrap();
    let mocks = MockServices::with_gateway(gateway(Some("gw.io")));

    let (pipeline, ctx) = run_install(
        temp_options(dir.path()),
        env(&[(ENV_NAME_VAR, "dashboard")]),
        &mocks,
    )
    .await
    .unwrap();

    assert!(ctx.gateway_conf.is_none());
    for call in ["gateway.fetch", "gateway.upstream", "gateway.api", "console.update"] {
        assert!(!mocks.log.contains(call), "{} should not have been called", call);
    }
    for step in ["fetch-gateway-conf", "generate-upstream", "generate-api-conf", "update-console-ui"] {
        assert!(matches!(pipeline.step_state(step), Some(StepState::Skipped { .. })));
    }
    assert!(mocks.log.contains("sites.custom_install"));
}

#[tokio::test]
async fn test_unresolved_gateway_skips_dependent_steps() {
    let dir = tempfile::tempdir().unwrap();
    let mocks = MockServices::new();

    let (_, ctx) = run_install(
        temp_options(dir.path()),
        env(&[(GATEWAY_CONFIG_VAR, "locator"), (ENV_NAME_VAR, "dashboard")]),
        &mocks,
    )
    .await
    .unwrap();

    assert!(ctx.gateway_conf.is_none());
    assert!(mocks.log.contains("gateway.fetch"));
    assert!(!mocks.log.contains("gateway.upstream"));
    assert!(!mocks.log.contains("console.update"));
}

#[tokio::test]
async fn test_console_update_only_in_console_environment() {
    let cases = [
        (Some("dashboard"), true),
        (Some("DASHBOARD"), true),
        (Some("Dashboard"), true),
        (Some("dev"), false),
        (Some("dashboard-prod"), false),
        (None, false),
    ];

    for (env_name, expected) in cases {
        let dir = tempfile::tempdir().unwrap();
        let mocks = MockServices::with_gateway(gateway(Some("gw.io")));
        let mut pairs = vec![(GATEWAY_CONFIG_VAR, "locator"), (EXT_KEY_VAR, "ext-123")];
        if let Some(name) = env_name {
            pairs.push((ENV_NAME_VAR, name));
        }

        run_install(temp_options(dir.path()), env(&pairs), &mocks)
            .await
            .unwrap();

        assert_eq!(
            mocks.log.contains("console.update"),
            expected,
            "environment {:?}",
            env_name
        );
        if expected {
            let requests = mocks.console.requests.lock().unwrap();
            assert_eq!(requests[0].ext_key.as_deref(), Some("ext-123"));
            assert_eq!(requests[0].domain_prefix.as_deref(), Some("api"));
            assert!(requests[0].location.ends_with("soajs.dashboard.ui"));
        }
    }
}

#[tokio::test]
async fn test_boolean_failures_do_not_abort() {
    let dir = tempfile::tempdir().unwrap();
    let mocks = MockServices::build(Some(gateway(Some("gw.io"))), Outcome::Failure, true, vec![], false);

    let (pipeline, _) = run_install(
        temp_options(dir.path()),
        env(&[(GATEWAY_CONFIG_VAR, "locator"), (ENV_NAME_VAR, "dashboard")]),
        &mocks,
    )
    .await
    .unwrap();

    assert!(mocks.log.contains("gateway.upstream"));
    assert!(mocks.log.contains("gateway.api"));
    assert!(mocks.log.contains("console.update"));
    assert!(pipeline.records().iter().all(|r| r.state.is_terminal()));
}

#[tokio::test]
async fn test_gateway_steps_run_before_template_imports() {
    let dir = tempfile::tempdir().unwrap();
    let mocks = MockServices::with_gateway(gateway(Some("gw.io")));

    run_install(
        temp_options(dir.path()),
        env(&[
            (GATEWAY_CONFIG_VAR, "locator"),
            (ENV_NAME_VAR, "dashboard"),
            (SITES_CONFIG_VAR, r#"{"sites":[]}"#),
        ]),
        &mocks,
    )
    .await
    .unwrap();

    assert_eq!(
        mocks.log.calls(),
        vec![
            "gateway.fetch",
            "gateway.upstream",
            "gateway.api",
            "console.update",
            "templates.sites-enabled",
            "templates.nginx.conf",
            "sites.install",
            "sites.custom_install",
        ]
    );
}

#[tokio::test]
async fn test_template_failure_aborts_before_custom_sites() {
    let dir = tempfile::tempdir().unwrap();
    let mocks = MockServices::build(None, Outcome::Success, false, vec!["nginx.conf"], false);

    let err = run_install(temp_options(dir.path()), env(&[]), &mocks)
        .await
        .unwrap_err();

    let PipelineError::Aborted { pipeline, step, source } = err;
    assert_eq!(pipeline, "install");
    assert_eq!(step, "import-nginx-conf");
    assert!(matches!(source, DeployError::MissingTemplate { .. }));
    assert!(!mocks.log.contains("sites.install"));
    assert!(!mocks.log.contains("sites.custom_install"));
}

#[tokio::test]
async fn test_sites_enabled_failure_aborts_before_nginx_conf() {
    let dir = tempfile::tempdir().unwrap();
    let mocks = MockServices::build(None, Outcome::Success, false, vec!["sites-enabled"], false);

    let err = run_install(temp_options(dir.path()), env(&[]), &mocks)
        .await
        .unwrap_err();

    assert_eq!(err.step(), "import-sites-enabled");
    assert!(!mocks.log.contains("templates.nginx.conf"));
}

#[tokio::test]
async fn test_malformed_blobs_are_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let options = temp_options(dir.path());
    let cert = options.paths.nginx.cert.clone();
    let mocks = MockServices::new();

    let (pipeline, ctx) = run_install(
        options,
        env(&[(SSL_CONFIG_VAR, "{\"domains\": ["), (SITES_CONFIG_VAR, "not json")]),
        &mocks,
    )
    .await
    .unwrap();

    assert!(ctx.ssl_domain.is_empty());
    assert!(ctx.ssl_configuration.is_none());
    assert!(!cert.join("domains").exists());
    assert!(!mocks.log.contains("sites.install"));
    assert!(mocks.log.contains("sites.custom_install"));
    assert!(matches!(pipeline.step_state("install-env-sites"), Some(StepState::Skipped { .. })));
}

#[tokio::test]
async fn test_sites_install_error_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mocks = MockServices::build(None, Outcome::Success, false, vec![], true);

    let err = run_install(
        temp_options(dir.path()),
        env(&[(SITES_CONFIG_VAR, r#"{"sites":[{"name":"blog"}]}"#)]),
        &mocks,
    )
    .await
    .unwrap_err();

    assert_eq!(err.step(), "install-env-sites");
    assert!(!mocks.log.contains("sites.custom_install"));
}

#[tokio::test]
async fn test_domains_write_failure_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut options = temp_options(dir.path());
    options.paths.nginx.cert = dir.path().join("no-such-dir");
    let mocks = MockServices::new();

    let err = run_install(options, env(&[(SSL_CONFIG_VAR, r#"{"domains":["a.com"]}"#)]), &mocks)
        .await
        .unwrap_err();

    assert_eq!(err.step(), "write-ssl-domains");
    assert!(mocks.log.calls().is_empty());
}

#[tokio::test]
async fn test_empty_gateway_domain_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let mocks = MockServices::with_gateway(gateway(Some("")));

    let (_, ctx) = run_install(
        temp_options(dir.path()),
        env(&[(GATEWAY_CONFIG_VAR, "locator")]),
        &mocks,
    )
    .await
    .unwrap();

    assert!(ctx.has_gateway());
    assert!(ctx.ssl_domain.is_empty());
    let api = mocks.gateway.api_requests.lock().unwrap();
    assert_eq!(api[0].domain, None);
}

#[tokio::test]
async fn test_gateway_requests_carry_context_paths_and_label() {
    let dir = tempfile::tempdir().unwrap();
    let mut options = temp_options(dir.path());
    options.nginx.label = "edge".to_string();
    let conf = options.paths.nginx.conf.clone();
    let mocks = MockServices::with_gateway(gateway(Some("gw.io")));

    run_install(options, env(&[(GATEWAY_CONFIG_VAR, "locator")]), &mocks)
        .await
        .unwrap();

    let upstream = mocks.gateway.upstream_requests.lock().unwrap();
    assert_eq!(
        upstream[0],
        UpstreamRequest {
            location: conf.join("conf.d"),
            ip: "10.0.0.5".to_string(),
            port: "4000".to_string(),
            label: "edge".to_string(),
        }
    );

    let api = mocks.gateway.api_requests.lock().unwrap();
    assert_eq!(api[0].location, conf.join("sites-enabled"));
    assert_eq!(api[0].label, "edge");
    assert_eq!(api[0].cert_dir, dir.path().join("cert"));
}
