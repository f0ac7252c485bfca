use anyhow::Result;

use crate::manifest::Manifest;
use crate::output;

pub async fn run(manifest: &Manifest, endpoint: Option<&str>) -> Result<()> {
    let reconciler = super::make_reconciler(manifest, endpoint).await;
    reconciler.remove(&manifest.bindings).await?;
    output::print_success(&format!(
        "{} declared binding(s) removed",
        manifest.bindings.len()
    ));
    Ok(())
}
