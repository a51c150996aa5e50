/// Stack introspection used to tell a replaced certificate from a deleted one
use crate::error::CertforgeError;
use async_trait::async_trait;
use aws_smithy_types::error::display::DisplayErrorContext;
use tracing::debug;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StackIntrospection: Send + Sync {
    /// The physical id CloudFormation currently holds for a logical resource
    ///
    /// Fails with `NotFound` when the stack or the resource no longer exists.
    async fn physical_resource_id(
        &self,
        stack_id: &str,
        logical_resource_id: &str,
    ) -> Result<Option<String>, CertforgeError>;
}

pub struct CloudFormationStacks {
    client: aws_sdk_cloudformation::Client,
}

impl CloudFormationStacks {
    pub fn new(client: aws_sdk_cloudformation::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StackIntrospection for CloudFormationStacks {
    async fn physical_resource_id(
        &self,
        stack_id: &str,
        logical_resource_id: &str,
    ) -> Result<Option<String>, CertforgeError> {
        let output = self
            .client
            .describe_stack_resource()
            .stack_name(stack_id)
            .logical_resource_id(logical_resource_id)
            .send()
            .await
            .map_err(|e| {
                // CloudFormation reports missing stacks and resources as a
                // generic ValidationError
                let rendered = DisplayErrorContext(&e).to_string();
                if rendered.contains("does not exist") {
                    CertforgeError::NotFound(format!(
                        "resource {} in stack {}",
                        logical_resource_id, stack_id
                    ))
                } else {
                    CertforgeError::Provider(format!(
                        "could not describe resource {} in stack {}: {}",
                        logical_resource_id, stack_id, rendered
                    ))
                }
            })?;

        let physical_id = output
            .stack_resource_detail()
            .and_then(|detail| detail.physical_resource_id())
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        debug!(
            stack_id = stack_id,
            logical_resource_id = logical_resource_id,
            physical_resource_id = ?physical_id,
            "Described stack resource"
        );
        Ok(physical_id)
    }
}
