use thiserror::Error;
use tickload_warehouse::WarehouseError;

use crate::pipeline::PipelineError;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] tickload_core::ValidationError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Warehouse(#[from] WarehouseError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Config(_) => 2,
            Self::Pipeline(PipelineError::Fetch { .. }) => 3,
            Self::Pipeline(PipelineError::Normalize(_)) => 4,
            Self::Pipeline(PipelineError::Load(error)) | Self::Warehouse(error) => {
                warehouse_exit_code(error)
            }
            Self::Serialization(_) => 10,
            Self::Io(_) => 10,
        }
    }
}

const fn warehouse_exit_code(error: &WarehouseError) -> u8 {
    match error {
        WarehouseError::InvalidTableName { .. } => 2,
        WarehouseError::Io(_) => 10,
        _ => 5,
    }
}
