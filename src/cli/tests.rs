#[cfg(test)]
mod tests {
    use crate::cli::Args;
    use crate::config::LLMProvider;
    use clap::Parser;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_args_default_values() {
        let args = Args::try_parse_from(["storm-gateway"]).unwrap();

        assert!(args.config.is_none());
        assert!(args.host.is_none());
        assert!(args.port.is_none());
        assert!(args.workspace_root.is_none());
        assert!(!args.retain_artifacts);
        assert!(!args.verbose);
    }

    #[test]
    fn test_args_short_options() {
        let args = Args::try_parse_from(["storm-gateway", "-p", "9000", "-v"]).unwrap();

        assert_eq!(args.port, Some(9000));
        assert!(args.verbose);
    }

    #[test]
    fn test_args_llm_options() {
        let args = Args::try_parse_from([
            "storm-gateway",
            "--llm-provider",
            "anthropic",
            "--llm-api-key",
            "test-key",
            "--llm-api-base-url",
            "https://api.anthropic.com",
            "--model-efficient",
            "claude-haiku",
            "--model-powerful",
            "claude-sonnet",
            "--temperature",
            "0.7",
        ])
        .unwrap();

        assert_eq!(args.llm_provider, Some("anthropic".to_string()));
        assert_eq!(args.llm_api_key, Some("test-key".to_string()));
        assert_eq!(
            args.llm_api_base_url,
            Some("https://api.anthropic.com".to_string())
        );
        assert_eq!(args.model_efficient, Some("claude-haiku".to_string()));
        assert_eq!(args.model_powerful, Some("claude-sonnet".to_string()));
        assert_eq!(args.temperature, Some(0.7));
    }

    #[test]
    fn test_args_invalid_port() {
        let result = Args::try_parse_from(["storm-gateway", "--port", "not-a-port"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_into_config_overrides() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("custom.toml");
        std::fs::write(
            &config_path,
            "[server]\nport = 7000\n\n[llm]\napi_key = \"from-file\"\nmodel_efficient = \"file-fast\"\n",
        )
        .unwrap();

        let args = Args::try_parse_from([
            "storm-gateway",
            "--config",
            config_path.to_str().unwrap(),
            "--host",
            "127.0.0.1",
            "--llm-provider",
            "ollama",
            "--llm-api-key",
            "from-cli",
            "--search-api-key",
            "ydc-cli",
            "--workspace-root",
            "/srv/storm",
            "--retain-artifacts",
            "--verbose",
        ])
        .unwrap();

        let config = args.into_config().unwrap();

        assert_eq!(config.server.port, 7000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.llm.provider, LLMProvider::Ollama);
        assert_eq!(config.llm.api_key, "from-cli");
        assert_eq!(config.llm.model_efficient, "file-fast");
        assert_eq!(config.llm.model_powerful, "gpt-4");
        assert_eq!(config.search.api_key, "ydc-cli");
        assert_eq!(config.workspace.root, Some(PathBuf::from("/srv/storm")));
        assert!(config.workspace.retain_artifacts);
        assert!(config.verbose);
    }

    #[test]
    fn test_into_config_unknown_provider_fails() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("empty.toml");
        std::fs::write(&config_path, "").unwrap();

        let args = Args::try_parse_from([
            "storm-gateway",
            "--config",
            config_path.to_str().unwrap(),
            "--llm-provider",
            "nonexistent",
        ])
        .unwrap();

        assert!(args.into_config().is_err());
    }

    #[test]
    fn test_into_config_missing_explicit_file_fails() {
        let args =
            Args::try_parse_from(["storm-gateway", "--config", "/nonexistent/storm.toml"]).unwrap();

        assert!(args.into_config().is_err());
    }
}
