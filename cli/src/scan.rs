//! `larder scan`: read a receipt photo through the generation service.

use anyhow::{bail, Context, Result};
use larder_core::ai::ExtractionGateway;
use larder_core::{HttpGateway, NoopStorage, ReceiptExtractor, ReceiptScanner, ScanState};
use std::fs;
use std::path::Path;
use std::sync::Arc;

pub async fn scan(image: &Path, refrigerated: bool) -> Result<()> {
    let bytes = fs::read(image).with_context(|| format!("Failed to read {}", image.display()))?;

    let gateway = HttpGateway::from_env()?;
    let model = gateway.config().model.clone();
    let gateway: Arc<dyn ExtractionGateway> = Arc::new(gateway);

    let extractor = ReceiptExtractor::new(gateway)
        .with_model(model)
        .with_refrigerated(refrigerated);
    let scanner = ReceiptScanner::new(Arc::new(extractor), Arc::new(NoopStorage));

    tracing::info!(path = %image.display(), bytes = bytes.len(), "Scanning receipt");

    match scanner.scan(&bytes).await {
        ScanState::Success(items) => {
            eprintln!("Found {} item(s)", items.len());
            crate::print_json(&items)
        }
        ScanState::Error(message) => bail!(message),
        state => bail!("Scan did not finish: {:?}", state),
    }
}
