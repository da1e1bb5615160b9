//! Amazon Bedrock runtime transport.

use async_trait::async_trait;
use aws_config::{sts::AssumeRoleProvider, BehaviorVersion, Region};
use aws_sdk_bedrockruntime::{
    config::{self, retry::RetryConfig},
    error::DisplayErrorContext,
    primitives::Blob,
    Client,
};
use serde_json::Value;
use tracing::info;

use super::provider::{ModelRuntime, RuntimeError};

/// Default region for Bedrock calls
pub const DEFAULT_BEDROCK_REGION: &str = "us-west-2";

/// Session name used when assuming a role for Bedrock access
const ASSUME_ROLE_SESSION: &str = "EksUpgradePlannerSession";

/// [`ModelRuntime`] backed by the Bedrock `InvokeModel` API.
///
/// SDK-level retries are disabled; the invoker decides when to retry.
#[derive(Clone, Debug)]
pub struct BedrockRuntime {
    client: Client,
}

impl BedrockRuntime {
    /// Build a client for `region`, optionally assuming `role_arn`.
    pub async fn connect(region: &str, role_arn: Option<&str>) -> Self {
        let base = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;

        let mut builder = config::Builder::from(&base).retry_config(RetryConfig::disabled());
        if let Some(arn) = role_arn {
            info!(role_arn = arn, "Assuming role for Bedrock access");
            let provider = AssumeRoleProvider::builder(arn)
                .session_name(ASSUME_ROLE_SESSION)
                .configure(&base)
                .build()
                .await;
            builder = builder.credentials_provider(provider);
        }

        Self {
            client: Client::from_conf(builder.build()),
        }
    }
}

#[async_trait]
impl ModelRuntime for BedrockRuntime {
    async fn invoke_model(&self, model_id: &str, body: &Value) -> Result<Value, RuntimeError> {
        let payload = serde_json::to_vec(body).map_err(|e| RuntimeError::from_error(&e))?;

        let output = self
            .client
            .invoke_model()
            .model_id(model_id)
            .content_type("application/json")
            .accept("application/json")
            .body(Blob::new(payload))
            .send()
            .await
            .map_err(|e| RuntimeError::new(DisplayErrorContext(&e).to_string()))?;

        serde_json::from_slice(output.body().as_ref()).map_err(|e| RuntimeError::from_error(&e))
    }
}
