use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| format!("/etc/{}.toml", env!("CARGO_PKG_NAME")));

    postmark_inbound::real_main(config_path, signal::ctrl_c()).await
}
