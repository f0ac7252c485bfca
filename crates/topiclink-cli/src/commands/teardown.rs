use anyhow::Result;

use crate::manifest::Manifest;
use crate::output;

pub async fn run(manifest: &Manifest, endpoint: Option<&str>) -> Result<()> {
    let reconciler = super::make_reconciler(manifest, endpoint).await;
    let removed = reconciler.teardown().await?;
    output::print_success(&format!(
        "teardown complete, {removed} subscription(s) removed"
    ));
    Ok(())
}
