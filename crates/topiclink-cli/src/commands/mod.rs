pub mod deploy;
pub mod remove;
pub mod teardown;

use std::sync::Arc;

use topiclink_aws::{AwsBackend, AwsClients};
use topiclink_engine::Reconciler;

use crate::manifest::Manifest;

pub(crate) async fn make_reconciler(manifest: &Manifest, endpoint: Option<&str>) -> Reconciler {
    let clients = AwsClients::load(&manifest.region, endpoint).await;
    let backend = Arc::new(AwsBackend::new(clients));
    Reconciler::new(backend, manifest.reconciler_config())
}
