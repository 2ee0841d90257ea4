//! # CLI
//!
//! This module defines the command-line interface of `qrlink` using `clap`.
//!
//! Every command maps to one logical operation of the client facade; the protocol is a
//! global flag so the same command line can be replayed over REST and RPC.
use clap::{Parser, Subcommand};
use qrlink_core::client::{ErrorCorrection, QrFormat};
use qrlink_core::config::Protocol;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "qrlink", version, about = "qrlink REST vs RPC client")]
pub struct Cli {
    /// Protocol used to reach the services (rest or rpc)
    #[arg(short, long, global = true, default_value = "rest")]
    pub protocol: Protocol,

    /// Path to a JSON client config (endpoints, timeout, RPC wire)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Talk native gRPC instead of the JSON transcoding gateway under RPC
    #[arg(long, global = true)]
    pub native: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// URL shortener operations
    Url {
        #[command(subcommand)]
        sub: UrlCommands,
    },

    /// QR generator operations
    Qr {
        #[command(subcommand)]
        sub: QrCommands,
    },

    /// Check `/health` on every configured service
    Health,

    /// Run the same workload over both protocols and compare them
    ///
    /// ## Examples:
    ///
    /// ```bash
    /// qrlink compare --iterations 20 --url https://example.com
    /// ```
    Compare {
        /// URL shortened and encoded on each iteration
        #[arg(long, default_value = "https://example.com", value_parser = parse_url)]
        url: String,
        #[arg(short = 'n', long, default_value_t = 5)]
        iterations: u32,
    },
}

#[derive(Subcommand)]
pub enum UrlCommands {
    /// Shorten a URL
    Shorten {
        #[arg(value_parser = parse_url)]
        url: String,
        #[arg(long)]
        custom_code: Option<String>,
        #[arg(long)]
        user_id: Option<String>,
    },
    /// Resolve a short code to its original URL
    Resolve { code: String },
    /// Show the access statistics of a short code
    Stats { code: String },
    /// Shorten several URLs at once
    Bulk {
        #[arg(required = true, value_parser = parse_url)]
        urls: Vec<String>,
        #[arg(long)]
        user_id: Option<String>,
    },
    /// List shortened URLs, newest first
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        size: u32,
        #[arg(long)]
        user_id: Option<String>,
    },
    /// Delete a short code
    Delete { code: String },
}

#[derive(Subcommand)]
pub enum QrCommands {
    /// Generate a QR code
    Generate {
        data: String,
        #[command(flatten)]
        options: QrOptions,
    },
    /// Decode a QR code generated by the service
    Decode {
        /// Base64 PNG or SVG markup, as returned by `generate`
        qr_code: String,
    },
    /// Generate one QR code per data argument
    Batch {
        #[arg(required = true)]
        data: Vec<String>,
        #[command(flatten)]
        options: QrOptions,
    },
    /// Fetch a generated QR code by id
    Get { id: String },
    /// List generated QR codes, newest first
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        size: u32,
    },
    /// Delete a generated QR code
    Delete { id: String },
}

#[derive(clap::Args)]
pub struct QrOptions {
    /// PNG or SVG
    #[arg(long, default_value = "PNG")]
    pub format: QrFormat,
    /// Side length in pixels (64..=2048)
    #[arg(long, default_value_t = 256)]
    pub size: u32,
    /// LOW, MEDIUM, QUARTILE or HIGH
    #[arg(long, default_value = "MEDIUM")]
    pub error_correction: ErrorCorrection,
}

fn parse_url(value: &str) -> Result<String, String> {
    qrlink_core::client::validate::http_url(value)?;
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_and_config_are_global() {
        let args = ["qrlink", "url", "resolve", "abc123", "--protocol", "rpc"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.protocol, Protocol::Rpc);
        assert!(matches!(
            cli.command,
            Commands::Url {
                sub: UrlCommands::Resolve { ref code }
            } if code == "abc123"
        ));
    }

    #[test]
    fn qr_options_parse_case_insensitively() {
        let cli = Cli::try_parse_from([
            "qrlink",
            "qr",
            "generate",
            "hello",
            "--format",
            "svg",
            "--error-correction",
            "h",
        ])
        .unwrap();

        let Commands::Qr {
            sub: QrCommands::Generate { data, options },
        } = cli.command
        else {
            panic!("expected qr generate");
        };
        assert_eq!(data, "hello");
        assert_eq!(options.format, QrFormat::Svg);
        assert_eq!(options.error_correction, ErrorCorrection::High);
        assert_eq!(options.size, 256);
    }

    #[test]
    fn urls_are_checked_while_parsing() {
        assert!(Cli::try_parse_from(["qrlink", "url", "shorten", "ftp://example.com"]).is_err());
        assert!(Cli::try_parse_from(["qrlink", "url", "shorten", "https://example.com"]).is_ok());
    }
}
