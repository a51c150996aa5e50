use certforge_core::handlers::RecordSetGroupHandler;
use certforge_core::services::ProviderConfig;
use certforge_core::utils::logging::init_tracing;
use lambda_runtime::{Error, LambdaEvent, run, service_fn};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    info!(
        version = certforge_core::VERSION,
        "Starting DnsCertificateRecordSetGroup Lambda function"
    );

    let config = ProviderConfig::from_env()?;
    let aws_config = aws_config::load_from_env().await;
    let handler = Arc::new(RecordSetGroupHandler::from_aws(&aws_config, &config)?);

    run(service_fn(move |event: LambdaEvent<Value>| {
        let handler = handler.clone();
        async move { handler.handle(event.payload).await.map_err(Error::from) }
    }))
    .await
}
