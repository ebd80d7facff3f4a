use std::net::{IpAddr, SocketAddr};

use qrserve::{api::routes, config::Config};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::init()?;
    let render = config.render();
    info!(
        server_addr = %config.server_addr(),
        port = config.port(),
        ec_level = %render.ec_level,
        default_size = render.default_size,
        max_size = render.max_size,
        "Configuration loaded"
    );

    let app = routes(render.clone());
    let addr = SocketAddr::from((config.server_addr().parse::<IpAddr>()?, config.port()));

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,qrserve=debug,tower_http=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
