pub mod sweep_pipeline;
