use std::sync::Arc;

use serde_json::Value;
use tickload_core::ReqwestHttpClient;
use tickload_warehouse::Warehouse;

use crate::cli::RunArgs;
use crate::config::{resolve_api_key, PipelineConfig};
use crate::error::CliError;
use crate::pipeline::run_pipeline;

pub async fn run(args: &RunArgs, warehouse: Warehouse) -> Result<Value, CliError> {
    let config = PipelineConfig::from_args(args, &resolve_api_key())?;
    let report = run_pipeline(&config, Arc::new(ReqwestHttpClient::new()), &warehouse).await?;
    Ok(serde_json::to_value(report)?)
}
