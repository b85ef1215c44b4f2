use std::sync::Arc;

use aciprov::run_scenarios;
use aciprov_azure::{
    ConfigurationProvider, ContainerService, EnvConfiguration, LogWriter, Logger,
    StaticConfiguration,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = EnvConfiguration.configuration();
    if let Err(e) = settings.validate() {
        error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    }
    info!(region = %settings.region, resource_group = %settings.resource_group, "aciprov starting");

    let logger: Arc<dyn Logger> = Arc::new(LogWriter);
    let service = ContainerService::new(logger.clone(), &StaticConfiguration(settings));

    let report = run_scenarios(&service, logger.as_ref()).await;
    info!(
        failure_case = report.failure_case.is_finished(),
        successful_case = report.successful_case.is_finished(),
        "aciprov finished"
    );
}
