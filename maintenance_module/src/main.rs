use maintenance_module::service::{run_server, ServiceConfig};
use tracing::error;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().init();

    let config = match ServiceConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("invalid configuration: {}", err);
            std::process::exit(1);
        }
    };

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    if let Err(err) = run_server(config, shutdown).await {
        error!("maintenance service failed: {}", err);
        std::process::exit(1);
    }
}
