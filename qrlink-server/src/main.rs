//! # qrlink-server
//!
//! Runs one service, or all of them, in a single process. Each service listens on its own
//! ports; the REST and RPC apps of a service share its store.
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use qrlink_core::config::ClientConfig;
use qrlink_server::links::LinkService;
use qrlink_server::qr::QrService;
use qrlink_server::server;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "qrlink-server", version, about = "qrlink backend services")]
struct Cli {
    /// Address every service binds to
    #[arg(long, global = true, default_value = "127.0.0.1")]
    host: IpAddr,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every service with its default ports
    All {
        /// Config used by the analytics health checks
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// URL shortener (REST and RPC)
    LinkShortener(LinkShortenerArgs),
    /// QR code generator (REST and RPC)
    QrGenerator(QrGeneratorArgs),
    /// User management placeholder
    UserManagement {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Aggregated service health
    Analytics {
        #[arg(long, default_value_t = 8081)]
        port: u16,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args)]
struct LinkShortenerArgs {
    #[arg(long, default_value_t = 8083)]
    rest_port: u16,
    #[arg(long, default_value_t = 5001)]
    rpc_port: u16,
    /// Base of the short URLs returned by the REST API
    #[arg(long, default_value = "http://localhost:8083")]
    public_base: String,
}

impl Default for LinkShortenerArgs {
    fn default() -> Self {
        Self {
            rest_port: 8083,
            rpc_port: 5001,
            public_base: "http://localhost:8083".to_string(),
        }
    }
}

#[derive(Args)]
struct QrGeneratorArgs {
    #[arg(long, default_value_t = 8082)]
    rest_port: u16,
    #[arg(long, default_value_t = 5003)]
    rpc_port: u16,
}

impl Default for QrGeneratorArgs {
    fn default() -> Self {
        Self {
            rest_port: 8082,
            rpc_port: 5003,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let host = cli.host;

    match cli.command {
        Commands::All { config } => {
            let config = load_config(config)?;
            tokio::try_join!(
                link_shortener(host, LinkShortenerArgs::default()),
                qr_generator(host, QrGeneratorArgs::default()),
                user_management(host, 8080),
                analytics(host, 8081, config),
            )?;
        }
        Commands::LinkShortener(args) => link_shortener(host, args).await?,
        Commands::QrGenerator(args) => qr_generator(host, args).await?,
        Commands::UserManagement { port } => user_management(host, port).await?,
        Commands::Analytics { port, config } => analytics(host, port, load_config(config)?).await?,
    }

    Ok(())
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<ClientConfig> {
    match path {
        Some(path) => {
            ClientConfig::load(&path).with_context(|| format!("loading {}", path.display()))
        }
        None => Ok(ClientConfig::default()),
    }
}

async fn link_shortener(host: IpAddr, args: LinkShortenerArgs) -> anyhow::Result<()> {
    let service = Arc::new(LinkService::new(args.public_base));
    let rest = server::link_shortener_rest(service.clone());
    let rpc = server::link_shortener_rpc(service)?;

    let rest_addr = SocketAddr::new(host, args.rest_port);
    let rpc_addr = SocketAddr::new(host, args.rpc_port);
    tokio::try_join!(
        server::serve("link-shortener-rest", rest_addr, rest),
        server::serve("link-shortener-rpc", rpc_addr, rpc),
    )?;
    Ok(())
}

async fn qr_generator(host: IpAddr, args: QrGeneratorArgs) -> anyhow::Result<()> {
    let service = Arc::new(QrService::new());
    let rest = server::qr_generator_rest(service.clone());
    let rpc = server::qr_generator_rpc(service)?;

    let rest_addr = SocketAddr::new(host, args.rest_port);
    let rpc_addr = SocketAddr::new(host, args.rpc_port);
    tokio::try_join!(
        server::serve("qr-generator-rest", rest_addr, rest),
        server::serve("qr-generator-rpc", rpc_addr, rpc),
    )?;
    Ok(())
}

async fn user_management(host: IpAddr, port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::new(host, port);
    server::serve("user-management", addr, server::user_management()).await?;
    Ok(())
}

async fn analytics(host: IpAddr, port: u16, config: ClientConfig) -> anyhow::Result<()> {
    let addr = SocketAddr::new(host, port);
    server::serve("analytics", addr, server::analytics(config)).await?;
    Ok(())
}
