use clap::{Parser, ValueEnum};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(name = "beerlog", about = "A social beer-logging API server")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to data directory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Which backend serves identity, beers and images
    #[arg(long, value_enum)]
    pub backend: Option<BackendKind>,

    /// Supabase project URL
    #[arg(long, env = "SUPABASE_URL")]
    pub supabase_url: Option<String>,

    /// Supabase API key sent as `apikey`
    #[arg(long, env = "SUPABASE_ANON_KEY", hide_env_values = true)]
    pub supabase_key: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// SQLite + local disk, for development
    #[default]
    Local,
    /// Hosted Supabase project
    Supabase,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Local => "local",
            BackendKind::Supabase => "supabase",
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub backend: BackendConfig,
    pub supabase: SupabaseConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Base URL clients use to reach this server. Local image URLs hang off it.
    pub public_url: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub path: Option<PathBuf>,
    pub placeholder_url: String,
    pub max_upload_mb: usize,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub session_hours: u64,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct BackendConfig {
    pub kind: BackendKind,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SupabaseConfig {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub bucket: String,
    pub timeout_secs: u64,
}

pub const DEFAULT_PLACEHOLDER_URL: &str =
    "https://via.placeholder.com/300x200/0ea5e9/ffffff?text=Beer";

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            public_url: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            placeholder_url: DEFAULT_PLACEHOLDER_URL.to_string(),
            max_upload_mb: 10,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { session_hours: 720 }
    }
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            bucket: "beer-images".to_string(),
            timeout_secs: 10,
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

        // CLI overrides
        if let Some(ref host) = cli.host {
            config.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            config.server.port = port;
        }
        if let Some(kind) = cli.backend {
            config.backend.kind = kind;
        }
        if let Some(ref url) = cli.supabase_url {
            config.supabase.url = Some(url.clone());
        }
        if let Some(ref key) = cli.supabase_key {
            config.supabase.api_key = Some(key.clone());
        }

        // Resolve paths relative to data dir
        if config.database.path.is_none() {
            config.database.path = Some(data_dir.join("beerlog.db"));
        }
        if config.storage.path.is_none() {
            config.storage.path = Some(data_dir.join("uploads"));
        }
        if config.server.public_url.is_none() {
            config.server.public_url = Some(format!("http://localhost:{}", config.server.port));
        }

        if config.backend.kind == BackendKind::Supabase
            && (config.supabase.url.is_none() || config.supabase.api_key.is_none())
        {
            anyhow::bail!("supabase backend needs both SUPABASE_URL and SUPABASE_ANON_KEY");
        }

        Ok(config)
    }

    pub fn data_dir(cli: &Cli) -> PathBuf {
        cli.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".beerlog")
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from("beerlog.db"))
    }

    pub fn uploads_path(&self) -> PathBuf {
        self.storage
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from("uploads"))
    }

    pub fn public_url(&self) -> String {
        self.server
            .public_url
            .clone()
            .unwrap_or_else(|| format!("http://localhost:{}", self.server.port))
            .trim_end_matches('/')
            .to_string()
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.storage.max_upload_mb * 1024 * 1024
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
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.auth.session_hours, 720);
        assert_eq!(config.backend.kind, BackendKind::Local);
        assert_eq!(config.supabase.bucket, "beer-images");
        assert_eq!(config.storage.placeholder_url, DEFAULT_PLACEHOLDER_URL);
        assert!(config.database.path.is_none());
        assert!(config.storage.path.is_none());
    }

    #[test]
    fn data_dir_uses_cli_override() {
        let cli = Cli {
            data_dir: Some(PathBuf::from("/tmp/test-beerlog")),
            ..Default::default()
        };
        assert_eq!(Config::data_dir(&cli), PathBuf::from("/tmp/test-beerlog"));
    }

    #[test]
    fn data_dir_defaults_to_home_dot_beerlog() {
        let dir = Config::data_dir(&Cli::default());
        assert!(dir.ends_with(".beerlog"));
    }

    #[test]
    fn load_with_no_config_file_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::load(&cli_in(tmp.path())).unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.db_path(), tmp.path().join("beerlog.db"));
        assert_eq!(config.uploads_path(), tmp.path().join("uploads"));
        assert_eq!(config.public_url(), "http://localhost:8000");
    }

    #[test]
    fn load_reads_toml_file() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(
            &config_path,
            r#"
[server]
port = 9000
public_url = "https://beers.example.com/"

[auth]
session_hours = 24

[storage]
max_upload_mb = 2
"#,
        )
        .unwrap();

        let cli = Cli {
            config: Some(config_path),
            ..cli_in(tmp.path())
        };
        let config = Config::load(&cli).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.auth.session_hours, 24);
        assert_eq!(config.public_url(), "https://beers.example.com");
        assert_eq!(config.max_upload_bytes(), 2 * 1024 * 1024);
    }

    #[test]
    fn cli_overrides_beat_toml_values() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("config.toml"),
            "[server]\nhost = \"192.168.1.1\"\nport = 9000\n",
        )
        .unwrap();

        let cli = Cli {
            host: Some("10.0.0.1".to_string()),
            port: Some(4000),
            ..cli_in(tmp.path())
        };
        let config = Config::load(&cli).unwrap();
        assert_eq!(config.server.host, "10.0.0.1");
        assert_eq!(config.server.port, 4000);
    }

    #[test]
    fn supabase_backend_requires_credentials() {
        let tmp = tempfile::tempdir().unwrap();
        let cli = Cli {
            backend: Some(BackendKind::Supabase),
            supabase_url: Some("https://xyz.supabase.co".to_string()),
            ..cli_in(tmp.path())
        };
        assert!(Config::load(&cli).is_err());

        let cli = Cli {
            supabase_key: Some("anon".to_string()),
            ..cli
        };
        let config = Config::load(&cli).unwrap();
        assert_eq!(config.backend.kind, BackendKind::Supabase);
        assert_eq!(config.supabase.api_key.as_deref(), Some("anon"));
    }

    #[test]
    fn backend_kind_parses_from_toml() {
        let config: Config = toml::from_str("[backend]\nkind = \"supabase\"\n").unwrap();
        assert_eq!(config.backend.kind, BackendKind::Supabase);
    }
}
