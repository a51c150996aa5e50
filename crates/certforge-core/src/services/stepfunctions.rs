/// Hand-off of pending certificates to the waiting state machine
use crate::error::CertforgeError;
use crate::models::CheckState;
use async_trait::async_trait;
use tracing::{info, warn};

#[async_trait]
pub trait CompletionWaiter: Send + Sync {
    /// Starts the wait loop for a pending certificate
    ///
    /// Starting twice under the same name is not an error.
    async fn start_wait(
        &self,
        execution_name: &str,
        state: &CheckState,
    ) -> Result<(), CertforgeError>;
}

pub struct StepFunctionsWaiter {
    client: aws_sdk_sfn::Client,
    state_machine_arn: String,
}

impl StepFunctionsWaiter {
    pub fn new(client: aws_sdk_sfn::Client, state_machine_arn: String) -> Self {
        Self {
            client,
            state_machine_arn,
        }
    }
}

#[async_trait]
impl CompletionWaiter for StepFunctionsWaiter {
    async fn start_wait(
        &self,
        execution_name: &str,
        state: &CheckState,
    ) -> Result<(), CertforgeError> {
        let input = serde_json::to_string(state)?;

        match self
            .client
            .start_execution()
            .state_machine_arn(&self.state_machine_arn)
            .name(execution_name)
            .input(input)
            .send()
            .await
        {
            Ok(output) => {
                info!(
                    execution_name = execution_name,
                    execution_arn = output.execution_arn(),
                    "Started completion wait"
                );
                Ok(())
            }
            Err(e)
                if e.as_service_error()
                    .is_some_and(|se| se.is_execution_already_exists()) =>
            {
                warn!(
                    execution_name = execution_name,
                    "Completion wait already started"
                );
                Ok(())
            }
            Err(e) => Err(CertforgeError::provider(
                format!("could not start the execution {}", execution_name),
                e,
            )),
        }
    }
}
