use crate::Cli;
use crate::config::{
    AppConfig, ConfigError, DEFAULT_AGENT_NAME, DEFAULT_INSTRUCTIONS, FileConfig,
    PartialHttpConfig, load_project_config,
};
use clap::Parser;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn cli(args: &[&str]) -> Cli {
    let mut argv = vec!["support-agent"];
    argv.extend_from_slice(args);
    Cli::parse_from(argv)
}

fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |k| map.get(k).cloned()
}

const BASE_ENV: &[(&str, &str)] = &[
    ("PROJECT_ENDPOINT", "https://example.services.ai.azure.com/api/projects/demo"),
    ("MODEL_DEPLOYMENT_NAME", "gpt-4o"),
    ("SUPPORT_AGENT_TICKET_DIR", "/tmp/tickets"),
];

#[test]
fn resolves_required_values_from_env() {
    let cfg = AppConfig::resolve(
        &cli(&[]),
        env_of(BASE_ENV),
        FileConfig::default(),
        FileConfig::default(),
    )
    .unwrap();
    assert_eq!(
        cfg.endpoint,
        "https://example.services.ai.azure.com/api/projects/demo"
    );
    assert_eq!(cfg.model, "gpt-4o");
    assert_eq!(cfg.agent_name, DEFAULT_AGENT_NAME);
    assert_eq!(cfg.instructions, DEFAULT_INSTRUCTIONS);
    assert_eq!(cfg.ticket_dir, PathBuf::from("/tmp/tickets"));
    assert!(cfg.clear_screen);
}

#[test]
fn missing_endpoint_fails_fast() {
    let err = AppConfig::resolve(
        &cli(&[]),
        env_of(&[("MODEL_DEPLOYMENT_NAME", "gpt-4o")]),
        FileConfig::default(),
        FileConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::Missing("PROJECT_ENDPOINT")));
}

#[test]
fn blank_model_counts_as_missing() {
    let err = AppConfig::resolve(
        &cli(&[]),
        env_of(&[
            ("PROJECT_ENDPOINT", "https://example.com/api/projects/p"),
            ("MODEL_DEPLOYMENT_NAME", "  "),
        ]),
        FileConfig::default(),
        FileConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::Missing("MODEL_DEPLOYMENT_NAME")));
    assert!(err.to_string().contains("MODEL_DEPLOYMENT_NAME"));
}

#[test]
fn non_http_endpoint_is_rejected() {
    let err = AppConfig::resolve(
        &cli(&["--endpoint", "ftp://example.com"]),
        env_of(BASE_ENV),
        FileConfig::default(),
        FileConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEndpoint { .. }));

    let err = AppConfig::resolve(
        &cli(&["--endpoint", "not a url"]),
        env_of(BASE_ENV),
        FileConfig::default(),
        FileConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEndpoint { .. }));
}

#[test]
fn agent_name_must_be_a_single_path_segment() {
    for bad in ["team/agent", "agent?x=1", "agent#frag", "my agent", "..", ""] {
        let err = AppConfig::resolve(
            &cli(&["--agent-name", bad]),
            env_of(BASE_ENV),
            FileConfig::default(),
            FileConfig::default(),
        )
        .unwrap_err();
        assert!(
            matches!(&err, ConfigError::InvalidAgentName(name) if name == bad),
            "{bad:?} gave {err}"
        );
    }

    let cfg = AppConfig::resolve(
        &cli(&["--agent-name", "support-agent_v2.1"]),
        env_of(BASE_ENV),
        FileConfig::default(),
        FileConfig::default(),
    )
    .unwrap();
    assert_eq!(cfg.agent_name, "support-agent_v2.1");
}

#[test]
fn cli_overrides_env_and_files() {
    let project = FileConfig {
        model: Some("from-project".into()),
        agent_name: Some("project-agent".into()),
        ..FileConfig::default()
    };
    let cfg = AppConfig::resolve(
        &cli(&["--model", "from-cli", "--no-clear"]),
        env_of(BASE_ENV),
        project,
        FileConfig::default(),
    )
    .unwrap();
    assert_eq!(cfg.model, "from-cli");
    assert_eq!(cfg.agent_name, "project-agent");
    assert!(!cfg.clear_screen);
}

#[test]
fn project_config_beats_global_config() {
    let project = FileConfig {
        http: Some(PartialHttpConfig {
            connect_timeout_ms: Some(1_000),
            request_timeout_ms: None,
        }),
        instructions: Some("be brief".into()),
        ..FileConfig::default()
    };
    let global = FileConfig {
        http: Some(PartialHttpConfig {
            connect_timeout_ms: Some(9_000),
            request_timeout_ms: Some(30_000),
        }),
        instructions: Some("be verbose".into()),
        api_version: Some("2099-01-01".into()),
        ..FileConfig::default()
    };
    let cfg = AppConfig::resolve(&cli(&[]), env_of(BASE_ENV), project, global).unwrap();
    assert_eq!(cfg.http.connect_timeout_ms, 1_000);
    assert_eq!(cfg.http.request_timeout_ms, 30_000);
    assert_eq!(cfg.instructions, "be brief");
    assert_eq!(cfg.api_version, "2099-01-01");
}

#[test]
fn ticket_dir_defaults_to_executable_directory() {
    let cfg = AppConfig::resolve(
        &cli(&[]),
        env_of(&BASE_ENV[..2]),
        FileConfig::default(),
        FileConfig::default(),
    )
    .unwrap();
    let exe = std::env::current_exe().unwrap();
    assert_eq!(Some(cfg.ticket_dir.as_path()), exe.parent());
}

#[test]
fn test_load_project_config() {
    let temp_dir = TempDir::new().unwrap();
    let project_root = temp_dir.path();

    let dir = project_root.join(".support-agent");
    fs::create_dir_all(&dir).unwrap();
    let config_content = r#"
model = "gpt-4.1-mini"
agent_name = "helpdesk"
ticket_dir = "/var/tickets"

[http]
request_timeout_ms = 45000
"#;
    fs::write(dir.join("config.toml"), config_content).unwrap();

    let project_cfg = load_project_config(project_root);
    assert_eq!(project_cfg.model, Some("gpt-4.1-mini".to_string()));
    assert_eq!(project_cfg.agent_name, Some("helpdesk".to_string()));
    assert_eq!(project_cfg.ticket_dir, Some(PathBuf::from("/var/tickets")));
    assert_eq!(
        project_cfg.http.unwrap().request_timeout_ms,
        Some(45_000)
    );
}

#[test]
fn test_load_project_config_not_exists() {
    let temp_dir = TempDir::new().unwrap();
    let project_cfg = load_project_config(temp_dir.path());
    assert_eq!(project_cfg, FileConfig::default());
}

#[test]
fn test_load_project_config_invalid_toml_is_ignored() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join(".support-agent");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("config.toml"), "model = [unterminated").unwrap();
    assert_eq!(load_project_config(temp_dir.path()), FileConfig::default());
}
