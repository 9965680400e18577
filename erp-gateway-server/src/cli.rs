use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "erp-gateway",
    about = "ERP Gateway - session-aware proxy in front of Etendo Classic",
    version = env!("CARGO_PKG_VERSION"),
    author
)]
pub struct Cli {
    #[arg(short, long, env = "ERP_GATEWAY_PORT", default_value = "3000")]
    pub port: u16,

    #[arg(long, env = "ERP_GATEWAY_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(short, long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Overrides ETENDO_CLASSIC_URL
    #[arg(long)]
    pub erp_url: Option<String>,
}
