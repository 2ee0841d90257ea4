//! # qrlink CLI Entry Point
//!
//! The main executable for the qrlink client. This file drives the application lifecycle:
//!
//! 1. **Initialization**: Parses command-line arguments using [`cli::Cli`] and loads the config.
//! 2. **Construction**: Builds the protocol-bound clients through `qrlink_core`'s `ClientFactory`.
//! 3. **Execution**: Runs one logical operation, or the comparison workload over both protocols.
//! 4. **Presentation**: Formats and prints the payload, metrics or error to standard output/error.

mod cli;
mod formatter;

use clap::Parser;
use cli::{Cli, Commands, QrCommands, QrOptions, UrlCommands};
use formatter::{FormattedString, GenericError, HealthReport};
use qrlink_core::client::{
    BulkShorten, ClientFactory, ClientSet, DecodeQr, GenerateQr, OperationResult, PageRequest,
    QrBatch, QrId, ShortCode, ShortenUrl,
};
use qrlink_core::config::{ClientConfig, Protocol, RpcWire};
use qrlink_core::error::CallError;
use qrlink_core::metrics::{MetricsLog, ProtocolComparison};
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();
    let config = load_config_or_exit(&args);
    let log = Arc::new(MetricsLog::new());

    match args.command {
        Commands::Url { sub } => {
            let clients = clients_or_exit(args.protocol, &config, &log);
            print_result(run_url(&clients, sub).await);
        }
        Commands::Qr { sub } => {
            let clients = clients_or_exit(args.protocol, &config, &log);
            print_result(run_qr(&clients, sub).await);
        }
        Commands::Health => {
            let clients = clients_or_exit(args.protocol, &config, &log);
            let health = clients.analytics.service_health().await;
            println!("{}", FormattedString::from(HealthReport(health)));
        }
        Commands::Compare { url, iterations } => {
            for protocol in Protocol::ALL {
                let clients = clients_or_exit(protocol, &config, &log);
                run_workload(&clients, &url, iterations).await;
            }
            let comparison = ProtocolComparison::from_records(&log.records());
            println!("{}", FormattedString::from(comparison));
        }
    }
}

fn load_config_or_exit(args: &Cli) -> ClientConfig {
    let config = match &args.config {
        Some(path) => match ClientConfig::load(path) {
            Ok(config) => config,
            Err(err) => {
                let message = FormattedString::from(GenericError("Invalid Config", err));
                eprintln!("{}", message);
                process::exit(1);
            }
        },
        None => ClientConfig::default(),
    };

    if args.native {
        config.with_rpc_wire(RpcWire::Native)
    } else {
        config
    }
}

fn clients_or_exit(protocol: Protocol, config: &ClientConfig, log: &Arc<MetricsLog>) -> ClientSet {
    match ClientFactory::create(protocol, config, log.clone()) {
        Ok(clients) => clients,
        Err(err) => {
            let message = FormattedString::from(GenericError("Client Setup Failed", err));
            eprintln!("{}", message);
            process::exit(1);
        }
    }
}

fn print_result(result: Result<OperationResult, CallError>) {
    match result {
        Ok(result) => println!("{}", FormattedString::from(result)),
        Err(err) => {
            eprintln!("{}", FormattedString::from(err));
            process::exit(1);
        }
    }
}

async fn run_url(clients: &ClientSet, command: UrlCommands) -> Result<OperationResult, CallError> {
    let urls = &clients.url_shortener;

    match command {
        UrlCommands::Shorten {
            url,
            custom_code,
            user_id,
        } => {
            urls.shorten_url(&ShortenUrl {
                url,
                custom_code,
                user_id,
            })
            .await
        }
        UrlCommands::Resolve { code } => urls.resolve_url(&ShortCode(code)).await,
        UrlCommands::Stats { code } => urls.get_url_stats(&ShortCode(code)).await,
        UrlCommands::Bulk {
            urls: list,
            user_id,
        } => {
            urls.bulk_shorten_urls(&BulkShorten {
                urls: list,
                user_id,
            })
            .await
        }
        UrlCommands::List {
            page,
            size,
            user_id,
        } => {
            urls.list_urls(&PageRequest {
                page,
                size,
                user_id,
            })
            .await
        }
        UrlCommands::Delete { code } => urls.delete_url(&ShortCode(code)).await,
    }
}

async fn run_qr(clients: &ClientSet, command: QrCommands) -> Result<OperationResult, CallError> {
    let qr = &clients.qr_generator;

    match command {
        QrCommands::Generate { data, options } => qr.generate_qr(&generate(data, &options)).await,
        QrCommands::Decode { qr_code } => qr.decode_qr(&DecodeQr { qr_code }).await,
        QrCommands::Batch { data, options } => {
            let requests = data
                .into_iter()
                .map(|data| generate(data, &options))
                .collect();
            qr.generate_qr_batch(&QrBatch { requests }).await
        }
        QrCommands::Get { id } => qr.get_qr(&QrId(id)).await,
        QrCommands::List { page, size } => {
            qr.list_qrs(&PageRequest {
                page,
                size,
                user_id: None,
            })
            .await
        }
        QrCommands::Delete { id } => qr.delete_qr(&QrId(id)).await,
    }
}

fn generate(data: String, options: &QrOptions) -> GenerateQr {
    GenerateQr {
        data,
        format: options.format,
        size: options.size,
        error_correction: options.error_correction,
    }
}

/// Shortens, resolves and encodes `url` `iterations` times. Failures are only reported:
/// they are part of the comparison.
async fn run_workload(clients: &ClientSet, url: &str, iterations: u32) {
    let protocol = clients.protocol;
    let (urls, qr) = (&clients.url_shortener, &clients.qr_generator);
    eprintln!("Running {iterations} iterations over {protocol}...");

    for _ in 0..iterations {
        match urls.shorten_url(&ShortenUrl::new(url)).await {
            Ok(created) => {
                if let Some(code) = created.payload.get("shortCode").and_then(|c| c.as_str()) {
                    let resolved = urls.resolve_url(&ShortCode(code.to_string())).await;
                    report(protocol, resolved);
                }
            }
            Err(err) => report::<OperationResult>(protocol, Err(err)),
        }
        report(protocol, qr.generate_qr(&GenerateQr::new(url)).await);
    }
}

fn report<T>(protocol: Protocol, result: Result<T, CallError>) {
    if let Err(err) = result {
        tracing::warn!(%protocol, error = %err, "comparison call failed");
    }
}
