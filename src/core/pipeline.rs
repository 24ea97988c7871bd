pub use crate::app::pipelines::sweep_pipeline::{describe_plan, SweepPipeline};
