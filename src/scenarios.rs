//! The two fixed provisioning scenarios run by the binary.
//!
//! Each scenario creates a deployment and tags it by its resource id. A
//! failure is written to the log sink and never stops the next scenario.

use aciprov_azure::{ContainerDeployments, Logger, ServiceError};

const CPU: f64 = 2.0;
const MEMORY_IN_GB: f64 = 2.0;
const TAG_NAME: &str = "Test";

#[derive(Debug, Clone, PartialEq)]
pub enum ScenarioOutcome {
    Finished,
    Failed(ServiceError),
}

impl ScenarioOutcome {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioReport {
    /// Begin-and-return create followed by a tag update.
    pub failure_case: ScenarioOutcome,
    /// Wait-to-completion create followed by a tag update.
    pub successful_case: ScenarioOutcome,
}

pub async fn run_scenarios(service: &dyn ContainerDeployments, logger: &dyn Logger) -> ScenarioReport {
    logger.write("Starting FAILURE case...");
    let failure_case = match failure_case(service).await {
        Ok(()) => {
            logger.write("FAILURE case finished.");
            ScenarioOutcome::Finished
        }
        Err(e) => {
            logger.write(&format!("ERROR: {}", e.to_json()));
            ScenarioOutcome::Failed(e)
        }
    };

    logger.write("Starting SUCCESSFUL case...");
    let successful_case = match successful_case(service).await {
        Ok(()) => {
            logger.write("SUCCESSFUL case finished.");
            ScenarioOutcome::Finished
        }
        Err(e) => {
            logger.write(&format!("ERROR: {}", e.to_json()));
            ScenarioOutcome::Failed(e)
        }
    };

    ScenarioReport {
        failure_case,
        successful_case,
    }
}

async fn failure_case(service: &dyn ContainerDeployments) -> Result<(), ServiceError> {
    let deployment = service.create_new_deployment(CPU, MEMORY_IN_GB, None).await?;
    service
        .update_deployment_tag(&deployment.id, TAG_NAME, "Failure")
        .await
}

async fn successful_case(service: &dyn ContainerDeployments) -> Result<(), ServiceError> {
    let deployment = service
        .create_new_deployment_sync(CPU, MEMORY_IN_GB, None)
        .await?;
    service
        .update_deployment_tag(&deployment.id, TAG_NAME, "Success")
        .await
}
