// Reference tables and configuration loading

pub mod counties;
pub mod pipeline;
pub mod regions;

pub use counties::{tag_counties, CountyTable, UNKNOWN_COUNTY};
pub use pipeline::{config_dir, default_pipeline_path, load_pipeline_config, ConfigError, ConfigSource};
pub use regions::{tag_regions, RegionTable, OTHER_REGION};
