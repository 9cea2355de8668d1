//! Server configuration and CLI argument parsing
//!
//! Settings come from command-line arguments, then environment variables
//! with the `QUOTASLICE_` prefix, then defaults. Quota rules themselves live
//! in a separate rules file, see [`crate::rules`].
//!
//! # Example Usage
//!
//! ```bash
//! # Using CLI arguments
//! quotaslice --http --http-port 9090 --rules rules.toml
//!
//! # Using environment variables
//! export QUOTASLICE_HTTP=true
//! export QUOTASLICE_RULES=/etc/quotaslice/rules.yaml
//! quotaslice
//! ```

use anyhow::{Result, anyhow};
use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure for the server
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Transport layer configuration
    pub transports: TransportConfig,
    /// Where quota rules are read from
    pub rules: RulesConfig,
    /// Channel buffer size for actor communication
    pub buffer_size: usize,
    /// Logging level (error, warn, info, debug, trace)
    pub log_level: String,
}

/// Transport layer configuration
///
/// At least one transport must be enabled for the server to function.
#[derive(Debug, Clone, Deserialize)]
pub struct TransportConfig {
    /// HTTP/JSON transport configuration
    pub http: Option<HttpConfig>,
}

/// HTTP transport configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Host address to bind to (e.g., "0.0.0.0")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

/// Rules file configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RulesConfig {
    /// Path to a TOML, YAML or JSON rules file
    pub path: PathBuf,
    /// Refuse to start when any rule is invalid
    pub strict: bool,
}

/// Command-line arguments for the server
///
/// All arguments can also be set via environment variables with the
/// QUOTASLICE_ prefix. CLI arguments take precedence over environment variables.
#[derive(Parser, Debug)]
#[command(
    name = "quotaslice",
    about = "Quota enforcement server",
    long_about = "Tracks per-subject API usage windows and decides whether each request is admitted.\n\nAt least one transport and a rules file must be specified.\n\nEnvironment variables with QUOTASLICE_ prefix are supported. CLI arguments take precedence over environment variables."
)]
pub struct Args {
    // HTTP Transport
    #[arg(long, help = "Enable HTTP transport", env = "QUOTASLICE_HTTP")]
    pub http: bool,
    #[arg(
        long,
        value_name = "HOST",
        help = "HTTP host",
        default_value = "127.0.0.1",
        env = "QUOTASLICE_HTTP_HOST"
    )]
    pub http_host: String,
    #[arg(
        long,
        value_name = "PORT",
        help = "HTTP port",
        default_value_t = 8080,
        env = "QUOTASLICE_HTTP_PORT"
    )]
    pub http_port: u16,

    // Rules
    #[arg(
        long,
        value_name = "FILE",
        help = "Quota rules file (toml, yaml or json)",
        env = "QUOTASLICE_RULES"
    )]
    pub rules: Option<PathBuf>,
    #[arg(
        long,
        value_name = "BOOL",
        help = "Refuse to start if any rule is invalid",
        default_value_t = true,
        action = clap::ArgAction::Set,
        env = "QUOTASLICE_STRICT"
    )]
    pub strict: bool,

    // General options
    #[arg(
        long,
        value_name = "SIZE",
        help = "Channel buffer size",
        default_value_t = 100_000,
        env = "QUOTASLICE_BUFFER_SIZE"
    )]
    pub buffer_size: usize,
    #[arg(
        long,
        value_name = "LEVEL",
        help = "Log level: error, warn, info, debug, trace",
        default_value = "info",
        env = "QUOTASLICE_LOG_LEVEL"
    )]
    pub log_level: String,

    // Utility options
    #[arg(
        long,
        help = "List all environment variables and exit",
        action = clap::ArgAction::SetTrue
    )]
    pub list_env_vars: bool,
}

impl Config {
    /// Build configuration from environment variables and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if no transport or no rules file is specified.
    pub fn from_env_and_args() -> Result<Self> {
        let args = Args::parse();

        if args.list_env_vars {
            Self::print_env_vars();
            std::process::exit(0);
        }

        Self::from_args(args)
    }

    /// Build and validate configuration from already parsed arguments
    pub fn from_args(args: Args) -> Result<Self> {
        let rules_path = args.rules.ok_or_else(|| {
            anyhow!("A rules file must be specified with --rules or QUOTASLICE_RULES")
        })?;

        let mut config = Config {
            transports: TransportConfig { http: None },
            rules: RulesConfig {
                path: rules_path,
                strict: args.strict,
            },
            buffer_size: args.buffer_size,
            log_level: args.log_level,
        };

        if args.http {
            config.transports.http = Some(HttpConfig {
                host: args.http_host,
                port: args.http_port,
            });
        }

        config.validate()?;

        Ok(config)
    }

    /// Check if at least one transport is configured
    pub fn has_any_transport(&self) -> bool {
        self.transports.http.is_some()
    }

    fn validate(&self) -> Result<()> {
        if !self.has_any_transport() {
            return Err(anyhow!(
                "At least one transport must be specified.\n\n\
                Available transports:\n  \
                --http       Enable HTTP transport\n\n\
                Example:\n  \
                quotaslice --http --http-port 7070 --rules rules.toml\n\n\
                For more information, try '--help'"
            ));
        }

        if self.buffer_size == 0 {
            return Err(anyhow!("Channel buffer size must be greater than zero"));
        }

        Ok(())
    }

    fn print_env_vars() {
        println!("quotaslice Environment Variables");
        println!("================================");
        println!();
        println!("All environment variables use the QUOTASLICE_ prefix.");
        println!("CLI arguments take precedence over environment variables.");
        println!();

        println!("Transport Configuration:");
        println!("  QUOTASLICE_HTTP=true|false            Enable HTTP transport");
        println!("  QUOTASLICE_HTTP_HOST=<host>           HTTP host [default: 127.0.0.1]");
        println!("  QUOTASLICE_HTTP_PORT=<port>           HTTP port [default: 8080]");
        println!();

        println!("Rules Configuration:");
        println!("  QUOTASLICE_RULES=<file>               Quota rules file (toml, yaml or json)");
        println!(
            "  QUOTASLICE_STRICT=true|false          Refuse to start on invalid rules [default: true]"
        );
        println!();

        println!("General Configuration:");
        println!("  QUOTASLICE_BUFFER_SIZE=<size>         Channel buffer size [default: 100000]");
        println!(
            "  QUOTASLICE_LOG_LEVEL=<level>          Log level: error, warn, info, debug, trace [default: info]"
        );
        println!();

        println!("Examples:");
        println!("  export QUOTASLICE_HTTP=true");
        println!("  export QUOTASLICE_RULES=/etc/quotaslice/rules.toml");
        println!("  quotaslice --http-port 9090  # CLI args override env vars");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("quotaslice").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_config_validation_no_transport() {
        let result = Config::from_args(parse(&["--rules", "rules.toml"]));
        assert!(result.is_err());
    }

    #[test]
    fn test_config_requires_rules() {
        let result = Config::from_args(parse(&["--http"]));
        let message = result.unwrap_err().to_string();
        assert!(message.contains("rules"));
    }

    #[test]
    fn test_config_with_transport() {
        let config = Config::from_args(parse(&[
            "--http",
            "--http-port",
            "9191",
            "--rules",
            "rules.toml",
        ]))
        .unwrap();

        assert!(config.has_any_transport());
        let http = config.transports.http.unwrap();
        assert_eq!(http.host, "127.0.0.1");
        assert_eq!(http.port, 9191);
        assert_eq!(config.rules.path, PathBuf::from("rules.toml"));
        assert!(config.rules.strict);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_strict_can_be_disabled() {
        let config = Config::from_args(parse(&[
            "--http",
            "--rules",
            "rules.toml",
            "--strict",
            "false",
        ]))
        .unwrap();

        assert!(!config.rules.strict);
    }

    #[test]
    fn test_zero_buffer_rejected() {
        let result = Config::from_args(parse(&[
            "--http",
            "--rules",
            "rules.toml",
            "--buffer-size",
            "0",
        ]));
        assert!(result.is_err());
    }
}
