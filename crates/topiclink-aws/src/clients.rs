//! AWS SDK client construction.

use aws_config::BehaviorVersion;
use aws_config::Region;

/// The service clients one reconciliation run operates with.
///
/// All three share a single loaded SDK configuration so credentials,
/// region, and any endpoint override stay consistent across services.
#[derive(Debug, Clone)]
pub struct AwsClients {
    pub lambda: aws_sdk_lambda::Client,
    pub sns: aws_sdk_sns::Client,
    pub s3: aws_sdk_s3::Client,
}

impl AwsClients {
    /// Loads clients from the environment, pinning the given region and
    /// optionally overriding the endpoint (e.g. LocalStack).
    pub async fn load(region: &str, endpoint: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()));
        if let Some(endpoint) = endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let config = loader.load().await;
        Self {
            lambda: aws_sdk_lambda::Client::new(&config),
            sns: aws_sdk_sns::Client::new(&config),
            s3: aws_sdk_s3::Client::new(&config),
        }
    }
}
