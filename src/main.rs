use docquality::{api, config, logging, quality::EngineHolder, quality::QualityAssessment};
use std::net::Ipv4Addr;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    config::init_config();
    logging::init_tracing(&config::get_config().log_file);

    let holder = Arc::new(EngineHolder::new(|| {
        QualityAssessment::from_config(config::get_config())
    }));
    if let Err(error) = holder.get_or_init().await {
        tracing::error!(%error, "Quality engine failed to start; retrying on first request");
    }

    let config = config::get_config();
    let app = api::create_router(holder, &config.api_root_path, &config.api_prefix);

    let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, config.server_port))
        .await
        .expect("Failed to bind listener");
    tracing::info!(
        "Listening on http://0.0.0.0:{}{}{}",
        config.server_port,
        config.api_root_path,
        config.api_prefix
    );
    axum::serve(listener, app).await.unwrap();
}
