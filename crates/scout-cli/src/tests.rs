#[cfg(test)]
mod tests {
    use crate::cli::{Cli, apply_env, load_config_file, GOOGLE_CSE_VAR, GOOGLE_KEY_VAR, OPENAI_KEY_VAR};
    use crate::app::ScoutApp;
    use crate::commands::{parse, Command};
    use clap::Parser;
    use scout_types::config::{ScoutConfig, StorageBackendType};
    use scout_types::search::ExclusionMode;
    use std::collections::HashMap;

    // ─── Command Parsing Tests ───────────────────────────────

    #[test]
    fn test_plain_text_is_chat() {
        assert_eq!(
            parse("  What about gold?  "),
            Some(Command::Chat("What about gold?".to_string()))
        );
        assert_eq!(parse("   "), None);
    }

    #[test]
    fn test_slash_commands() {
        assert_eq!(parse("/new"), Some(Command::New(None)));
        assert_eq!(parse("/new  Housing  "), Some(Command::New(Some("Housing".to_string()))));
        assert_eq!(parse("/rename Austin condos"), Some(Command::Rename("Austin condos".to_string())));
        assert_eq!(parse("/switch 2"), Some(Command::Switch("2".to_string())));
        assert_eq!(parse("/ls"), Some(Command::List));
        assert_eq!(parse("/delete"), Some(Command::Delete(None)));
        assert_eq!(parse("/model gpt-4o"), Some(Command::Model(Some("gpt-4o".to_string()))));
        assert_eq!(parse("/retry"), Some(Command::Retry));
        assert_eq!(parse("/exit"), Some(Command::Quit));
    }

    #[test]
    fn test_missing_argument_is_unknown() {
        assert_eq!(parse("/rename"), Some(Command::Unknown("/rename".to_string())));
        assert_eq!(parse("/clear now"), Some(Command::Unknown("/clear now".to_string())));
        assert_eq!(parse("/frobnicate"), Some(Command::Unknown("/frobnicate".to_string())));
    }

    // ─── Session Opening Tests ───────────────────────────────

    fn memory_config() -> ScoutConfig {
        let mut config = ScoutConfig::default();
        config.store.backend = StorageBackendType::Memory;
        config
    }

    #[tokio::test]
    async fn test_open_session_trims_name() {
        let mut app = ScoutApp::new(memory_config()).await.unwrap();
        app.open_session(Some("Housing")).await.unwrap();
        assert_eq!(app.active(), Some("Housing"));

        app.open_session(Some("  Housing  ")).await.unwrap();
        assert_eq!(app.active(), Some("Housing"));
    }

    #[tokio::test]
    async fn test_open_session_without_name_on_empty_store() {
        let mut app = ScoutApp::new(memory_config()).await.unwrap();
        app.open_session(None).await.unwrap();
        assert_eq!(app.active(), None);
    }

    // ─── Configuration Tests ─────────────────────────────────

    #[test]
    fn test_env_overlays_credentials() {
        let env: HashMap<&str, &str> = HashMap::from([
            (OPENAI_KEY_VAR, "sk-test"),
            (GOOGLE_KEY_VAR, "  "),
            (GOOGLE_CSE_VAR, "cse-123"),
        ]);
        let mut config = ScoutConfig::default();
        config.search.api_key = "from-file".to_string();
        apply_env(&mut config, |name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.llm.api_key, "sk-test");
        assert_eq!(config.search.api_key, "from-file");
        assert_eq!(config.search.engine_id, "cse-123");
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "scout",
            "--model",
            "gpt-4o",
            "--data-dir",
            "/tmp/scout-data",
            "--no-stream",
            "--session",
            "Housing",
        ]);
        let mut config = ScoutConfig::default();
        cli.apply_flags(&mut config);

        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.store.data_dir, "/tmp/scout-data");
        assert!(!config.llm.stream);
        assert_eq!(cli.session.as_deref(), Some("Housing"));
        assert!(!cli.validate);
    }

    #[test]
    fn test_partial_config_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scout.json");
        std::fs::write(
            &path,
            r#"{
                "search": {"excluded_domains": ["reddit.com", "quora.com"], "exclusion_mode": "host_suffix"},
                "store": {"backend": "Memory"},
                "compaction": {"enabled": true}
            }"#,
        )
        .unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.search.excluded_domains, vec!["reddit.com", "quora.com"]);
        assert_eq!(config.search.exclusion_mode, ExclusionMode::HostSuffix);
        assert_eq!(config.store.backend, StorageBackendType::Memory);
        assert!(config.compaction.enabled);
        assert_eq!(config.compaction.threshold, 5);
        assert_eq!(config.llm.model, "gpt-4o-mini");
    }

    #[test]
    fn test_bad_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scout.json");
        std::fs::write(&path, "{ nope").unwrap();
        assert!(load_config_file(&path).is_err());
        assert!(load_config_file(&dir.path().join("missing.json")).is_err());
    }
}
