use crate::core::Pipeline;
use crate::utils::error::Result;
use std::time::Instant;

pub struct ConnectorEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> ConnectorEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<String> {
        let started = Instant::now();
        tracing::info!("Starting IBM i connector run");

        // Extract
        let items = self.pipeline.extract().await?;
        tracing::info!("Read {} input item(s)", items.len());

        // Execute
        let results = self.pipeline.transform(items).await?;
        tracing::info!("Produced {} output item(s)", results.len());

        // Load
        let output_path = self.pipeline.load(results).await?;
        tracing::info!(
            "Output saved to: {} ({:?})",
            output_path,
            started.elapsed()
        );

        Ok(output_path)
    }
}
