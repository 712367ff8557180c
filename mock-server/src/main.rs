use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

/// In-memory stand-in for the remote todo service.
#[derive(Parser, Debug)]
#[command(name = "mock-server", version, about)]
struct Args {
    /// Address to bind
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let args = Args::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("mock_server=info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();

    let addr = format!("{}:{}", args.host, args.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "listening");
    mock_server::run(listener).await
}
