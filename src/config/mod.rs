mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    if let Some(ref program) = config.resolver.yt_dlp_path {
        let expanded = shellexpand::tilde(&program.to_string_lossy()).into_owned();
        config.resolver.yt_dlp_path = Some(expanded.into());
    }

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./tubeforge.toml",
        "~/.config/tubeforge/config.toml",
        "/etc/tubeforge/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    // Return default config if no file found
    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.youtube.api_key.trim().is_empty() {
        anyhow::bail!("youtube.api_key is not set");
    }

    if config.youtube.timeout_secs == 0 {
        anyhow::bail!("youtube.timeout_secs cannot be 0");
    }

    let catalog = &config.catalog;
    if catalog.max_workers == 0 {
        anyhow::bail!("catalog.max_workers cannot be 0");
    }
    if catalog.cache_capacity == 0 {
        anyhow::bail!("catalog.cache_capacity cannot be 0");
    }
    if catalog.max_members == 0 {
        anyhow::bail!("catalog.max_members cannot be 0");
    }
    if catalog.search_results == 0 {
        anyhow::bail!("catalog.search_results cannot be 0");
    }

    if config.resolver.timeout_secs == 0 {
        anyhow::bail!("resolver.timeout_secs cannot be 0");
    }

    if let Some(ref program) = config.resolver.yt_dlp_path {
        if !program.exists() {
            tracing::warn!("yt-dlp path does not exist: {:?}", program);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_apply_to_missing_sections() {
        let file = write_config(
            r#"
            [youtube]
            api_key = "secret"
            "#,
        );

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.youtube.api_key, "secret");
        assert_eq!(
            config.youtube.endpoint,
            "https://www.googleapis.com/youtube/v3/"
        );
        assert_eq!(config.youtube.timeout_secs, 30);
        assert_eq!(config.catalog.max_members, 60);
        assert_eq!(config.catalog.search_results, 15);
        assert_eq!(config.catalog.max_workers, 15);
        assert_eq!(config.catalog.cache_capacity, 400);
        assert_eq!(config.resolver.preferred_container, "m4a");
        assert!(config.resolver.yt_dlp_path.is_none());
    }

    #[test]
    fn test_settings_conversion() {
        let file = write_config(
            r#"
            [youtube]
            api_key = "secret"

            [catalog]
            max_members = 25
            max_workers = 4

            [resolver]
            preferred_container = "webm"
            "#,
        );

        let settings = load_config(file.path()).unwrap().settings();
        assert_eq!(settings.max_members, 25);
        assert_eq!(settings.max_workers, 4);
        assert_eq!(settings.search_results, 15);
        assert_eq!(settings.preferred_container, "webm");
    }

    #[test]
    fn test_missing_api_key_rejected() {
        let file = write_config("[catalog]\nmax_workers = 2\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("api_key"));
    }

    #[test]
    fn test_zero_limits_rejected() {
        for section in [
            "max_workers = 0",
            "cache_capacity = 0",
            "max_members = 0",
            "search_results = 0",
        ] {
            let file = write_config(&format!(
                "[youtube]\napi_key = \"k\"\n\n[catalog]\n{section}\n"
            ));
            assert!(load_config(file.path()).is_err(), "{section} accepted");
        }
    }

    #[test]
    fn test_parse_error_has_context() {
        let file = write_config("[youtube\napi_key = ");
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_explicit_missing_path_fails() {
        let result = load_config_or_default(Some(Path::new("/nonexistent/tubeforge.toml")));
        assert!(result.is_err());
    }
}
