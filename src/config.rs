use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(name = "inkpost", about = "A small server-rendered blog")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Path to data directory
    #[arg(long, env = "INKPOST_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Secret used to sign session cookies
    #[arg(long, env = "COOKIE_SECRET", hide_env_values = true)]
    pub cookie_secret: Option<String>,

    /// CDN cloud name
    #[arg(long, env = "CLOUDINARY_CLOUD_NAME")]
    pub cloud_name: Option<String>,

    /// CDN API key
    #[arg(long, env = "CLOUDINARY_API_KEY", hide_env_values = true)]
    pub cdn_api_key: Option<String>,

    /// CDN API secret
    #[arg(long, env = "CLOUDINARY_API_SECRET", hide_env_values = true)]
    pub cdn_api_secret: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub cdn: CdnConfig,
    pub blog: BlogConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    pub content_path: Option<PathBuf>,
    pub credentials_path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub secret: Option<String>,
    /// Lifetime of a fresh session.
    pub duration_minutes: i64,
    /// Sessions with less than this left are pushed out by the same amount.
    pub active_minutes: i64,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct CdnConfig {
    pub upload_base: String,
    pub cloud_name: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub folder: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct BlogConfig {
    pub page_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "session".to_string(),
            secret: None,
            duration_minutes: 60,
            active_minutes: 15,
        }
    }
}

impl Default for CdnConfig {
    fn default() -> Self {
        Self {
            upload_base: "https://api.cloudinary.com/v1_1".to_string(),
            cloud_name: None,
            api_key: None,
            api_secret: None,
            folder: None,
            timeout_secs: 30,
        }
    }
}

impl Default for BlogConfig {
    fn default() -> Self {
        Self { page_size: 5 }
    }
}

impl CdnConfig {
    /// Credentials are only usable when all three parts are present.
    pub fn credentials(&self) -> Option<(&str, &str, &str)> {
        match (&self.cloud_name, &self.api_key, &self.api_secret) {
            (Some(cloud), Some(key), Some(secret))
                if !cloud.is_empty() && !key.is_empty() && !secret.is_empty() =>
            {
                Some((cloud.as_str(), key.as_str(), secret.as_str()))
            }
            _ => None,
        }
    }
}

impl Config {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let data_dir = Self::data_dir(cli);
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| data_dir.join("config.toml"));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        // CLI and environment overrides
        if let Some(ref host) = cli.host {
            config.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            config.server.port = port;
        }
        if let Some(ref secret) = cli.cookie_secret {
            config.session.secret = Some(secret.clone());
        }
        if let Some(ref cloud) = cli.cloud_name {
            config.cdn.cloud_name = Some(cloud.clone());
        }
        if let Some(ref key) = cli.cdn_api_key {
            config.cdn.api_key = Some(key.clone());
        }
        if let Some(ref secret) = cli.cdn_api_secret {
            config.cdn.api_secret = Some(secret.clone());
        }

        if config.blog.page_size == 0 {
            anyhow::bail!("blog.page_size must be at least 1");
        }
        if config.session.duration_minutes <= 0 || config.session.active_minutes < 0 {
            anyhow::bail!("session durations must be positive");
        }

        // Resolve paths relative to data dir
        if config.database.content_path.is_none() {
            config.database.content_path = Some(data_dir.join("content.db"));
        }
        if config.database.credentials_path.is_none() {
            config.database.credentials_path = Some(data_dir.join("credentials.db"));
        }

        Ok(config)
    }

    pub fn data_dir(cli: &Cli) -> PathBuf {
        cli.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".inkpost")
        })
    }

    pub fn content_db_path(&self) -> PathBuf {
        self.database
            .content_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("content.db"))
    }

    pub fn credentials_db_path(&self) -> PathBuf {
        self.database
            .credentials_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("credentials.db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli_in(dir: &std::path::Path) -> Cli {
        Cli {
            data_dir: Some(dir.to_path_buf()),
            ..Default::default()
        }
    }

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.session.cookie_name, "session");
        assert_eq!(config.session.duration_minutes, 60);
        assert_eq!(config.session.active_minutes, 15);
        assert_eq!(config.blog.page_size, 5);
        assert!(config.session.secret.is_none());
        assert!(config.cdn.credentials().is_none());
    }

    #[test]
    fn data_dir_uses_cli_override() {
        let cli = cli_in(std::path::Path::new("/tmp/test-inkpost"));
        assert_eq!(Config::data_dir(&cli), PathBuf::from("/tmp/test-inkpost"));
    }

    #[test]
    fn data_dir_defaults_to_dot_inkpost() {
        let dir = Config::data_dir(&Cli::default());
        assert!(dir.ends_with(".inkpost"));
    }

    #[test]
    fn load_with_no_config_file_resolves_store_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::load(&cli_in(tmp.path())).unwrap();
        assert_eq!(config.content_db_path(), tmp.path().join("content.db"));
        assert_eq!(
            config.credentials_db_path(),
            tmp.path().join("credentials.db")
        );
    }

    #[test]
    fn load_reads_toml_file() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(
            &config_path,
            r#"
[server]
host = "127.0.0.1"
port = 9000

[session]
cookie_name = "blog_session"
duration_minutes = 30

[cdn]
cloud_name = "demo"
api_key = "key"
api_secret = "shh"

[blog]
page_size = 10
"#,
        )
        .unwrap();

        let cli = Cli {
            config: Some(config_path),
            ..cli_in(tmp.path())
        };
        let config = Config::load(&cli).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.session.cookie_name, "blog_session");
        assert_eq!(config.session.duration_minutes, 30);
        assert_eq!(config.session.active_minutes, 15);
        assert_eq!(config.blog.page_size, 10);
        assert_eq!(config.cdn.credentials(), Some(("demo", "key", "shh")));
    }

    #[test]
    fn cli_overrides_beat_toml_values() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(
            &config_path,
            r#"
[server]
port = 9000

[session]
secret = "from-file"
"#,
        )
        .unwrap();

        let cli = Cli {
            config: Some(config_path),
            port: Some(4000),
            cookie_secret: Some("from-env".to_string()),
            ..cli_in(tmp.path())
        };
        let config = Config::load(&cli).unwrap();
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.session.secret.as_deref(), Some("from-env"));
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(&config_path, "[blog]\npage_size = 0\n").unwrap();
        let cli = Cli {
            config: Some(config_path),
            ..cli_in(tmp.path())
        };
        assert!(Config::load(&cli).is_err());
    }

    #[test]
    fn partial_cdn_credentials_are_unusable() {
        let cdn = CdnConfig {
            cloud_name: Some("demo".into()),
            api_key: Some("key".into()),
            ..Default::default()
        };
        assert!(cdn.credentials().is_none());
    }
}
