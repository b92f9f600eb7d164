use crate::app;
use crate::config::AppConfig;

pub async fn handle(mut config: AppConfig, port: Option<u16>) -> anyhow::Result<()> {
    if let Some(port) = port {
        config.server.port = port;
    }
    app::serve(&config).await
}
