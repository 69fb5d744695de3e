//! Command-line interface for lesionscan.

use crate::config::LesionConfig;
use clap::{Args, Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

/// lesionscan - Authenticated skin lesion image classification service.
#[derive(Parser)]
#[command(name = "lesionscan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path (JSON)
    #[arg(short, long, env = "LESIONSCAN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "LESIONSCAN_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Server overrides when no subcommand is given
    #[command(flatten)]
    pub serve: ServeArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve(ServeArgs),

    /// Print the hex SHA-256 digest of a password for `admin_password_hash`
    HashPassword {
        /// Password to hash
        password: String,
    },
}

/// Overrides for the `serve` command. Each one wins over the config file.
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Interface to bind
    #[arg(long)]
    pub host: Option<IpAddr>,

    /// Path to the ONNX model
    #[arg(long, env = "LESIONSCAN_MODEL_PATH")]
    pub model_path: Option<PathBuf>,

    /// Directory holding the prebuilt frontend
    #[arg(long, env = "LESIONSCAN_FRONTEND_DIR")]
    pub frontend_dir: Option<PathBuf>,

    /// HMAC key for signing access tokens
    #[arg(long, env = "LESIONSCAN_SIGNING_KEY", hide_env_values = true)]
    pub signing_key: Option<String>,

    /// Admin account username
    #[arg(long, env = "LESIONSCAN_ADMIN_USERNAME")]
    pub admin_username: Option<String>,

    /// Hex SHA-256 of the admin password (see `hash-password`)
    #[arg(long, env = "LESIONSCAN_ADMIN_PASSWORD_HASH", hide_env_values = true)]
    pub admin_password_hash: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,
}

impl ServeArgs {
    /// Fill unset options from `outer`, the copy given before `serve`.
    pub fn or(self, outer: ServeArgs) -> Self {
        Self {
            port: self.port.or(outer.port),
            host: self.host.or(outer.host),
            model_path: self.model_path.or(outer.model_path),
            frontend_dir: self.frontend_dir.or(outer.frontend_dir),
            signing_key: self.signing_key.or(outer.signing_key),
            admin_username: self.admin_username.or(outer.admin_username),
            admin_password_hash: self.admin_password_hash.or(outer.admin_password_hash),
            json_logs: self.json_logs || outer.json_logs,
        }
    }

    /// Apply the overrides to `config`.
    pub fn apply(self, config: &mut LesionConfig) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(path) = self.model_path {
            config.model.path = path;
        }
        if let Some(dir) = self.frontend_dir {
            config.frontend.dir = dir;
        }
        if let Some(key) = self.signing_key {
            config.auth.signing_key = key;
        }
        if let Some(username) = self.admin_username {
            config.auth.admin_username = username;
        }
        if let Some(hash) = self.admin_password_hash {
            config.auth.admin_password_hash = hash;
        }
        if self.json_logs {
            config.observability.json_logs = true;
        }
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The command to run; `serve` when none was given.
    ///
    /// Server options may sit on either side of `serve`; the ones after it
    /// win.
    pub fn into_command(self) -> Commands {
        match self.command {
            Some(Commands::Serve(args)) => Commands::Serve(args.or(self.serve)),
            Some(command) => command,
            None => Commands::Serve(self.serve),
        }
    }

    /// Load the config file if one was given, then apply global overrides.
    pub fn load_config(&self) -> crate::Result<LesionConfig> {
        let mut config = match &self.config {
            Some(path) => LesionConfig::from_file(path)?,
            None => LesionConfig::default(),
        };

        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::try_parse_from([
            "lesionscan",
            "--log-level",
            "debug",
            "serve",
            "--port",
            "9100",
            "--host",
            "127.0.0.1",
            "--model-path",
            "/models/resnet18.onnx",
            "--signing-key",
            "k",
            "--admin-username",
            "medicalSociety",
            "--json-logs",
        ])
        .unwrap();

        let mut config = cli.load_config().unwrap();
        assert_eq!(config.observability.log_level, "debug");

        let Commands::Serve(args) = cli.into_command() else {
            panic!("expected serve");
        };
        args.apply(&mut config);

        assert_eq!(config.server.bind_addr().to_string(), "127.0.0.1:9100");
        assert_eq!(config.model.path, PathBuf::from("/models/resnet18.onnx"));
        assert_eq!(config.auth.signing_key, "k");
        assert_eq!(config.auth.admin_username, "medicalSociety");
        assert!(config.observability.json_logs);
    }

    #[test]
    fn test_parse_hash_password() {
        let cli = Cli::try_parse_from(["lesionscan", "hash-password", "secret"]).unwrap();
        match cli.into_command() {
            Commands::HashPassword { password } => assert_eq!(password, "secret"),
            _ => panic!("expected hash-password"),
        }
    }

    #[test]
    fn test_config_file_then_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lesionscan.json");
        std::fs::write(&path, r#"{"server": {"port": 8500}, "frontend": {"dir": "web"}}"#).unwrap();

        let cli = Cli::try_parse_from([
            "lesionscan",
            "--config",
            path.to_str().unwrap(),
            "serve",
            "--frontend-dir",
            "/srv/dist",
        ])
        .unwrap();

        let mut config = cli.load_config().unwrap();
        assert_eq!(config.frontend.dir, PathBuf::from("web"));

        let Commands::Serve(args) = cli.into_command() else {
            panic!("expected serve");
        };
        args.apply(&mut config);
        assert_eq!(config.frontend.dir, PathBuf::from("/srv/dist"));
    }

    #[test]
    fn test_options_before_serve_are_kept() {
        let cli = Cli::try_parse_from([
            "lesionscan",
            "--port",
            "9000",
            "--json-logs",
            "serve",
            "--host",
            "127.0.0.1",
        ])
        .unwrap();

        let Commands::Serve(args) = cli.into_command() else {
            panic!("expected serve");
        };
        assert_eq!(args.port, Some(9000));
        assert_eq!(args.host, Some("127.0.0.1".parse().unwrap()));
        assert!(args.json_logs);
    }

    #[test]
    fn test_options_after_serve_win() {
        let cli =
            Cli::try_parse_from(["lesionscan", "--port", "9000", "serve", "--port", "9100"]).unwrap();

        let Commands::Serve(args) = cli.into_command() else {
            panic!("expected serve");
        };
        assert_eq!(args.port, Some(9100));
    }

    #[test]
    fn test_serve_is_default() {
        let cli = Cli::try_parse_from(["lesionscan", "--host", "127.0.0.1"]).unwrap();
        match cli.into_command() {
            Commands::Serve(args) => {
                assert_eq!(args.host, Some("127.0.0.1".parse().unwrap()));
            }
            _ => panic!("expected serve"),
        }
    }
}
