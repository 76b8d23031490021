use std::sync::Arc;

use note_ninja::{
    config::config,
    create_app,
    db::init_db,
    errors::{self, Error},
    identity::GoTrueClient,
    shared, AppParams,
};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> errors::Result<()> {
    let config = config();

    shared::tracing::setup_tracing(config.json_logs);

    let conn = init_db().await?;
    let identity = GoTrueClient::from_config(config)?;

    let app = create_app(AppParams {
        db: conn,
        identity: Arc::new(identity),
    })
    .await?;

    let app = shared::tracing::add_tracing_layer(app);

    let port = config.port;
    let listener = TcpListener::bind(format!("127.0.0.1:{port}"))
        .await
        .map_err(|e| Error::Unexpected(e.to_string()))?;

    tracing::info!(
        "listening on http://{}",
        listener.local_addr().map_err(|e| Error::Unexpected(e.to_string()))?
    );

    axum::serve(listener, app)
        .await
        .map_err(|e| Error::Unexpected(e.to_string()))?;

    Ok(())
}
