pub mod pipeline;

pub use pipeline::{
    DimensionConfig, FactConfig, PipelineConfig, QualityConfig, RetryConfig, StagingConfig,
    WarehouseConfig, load_pipeline_config, parse_pipeline_config,
};
