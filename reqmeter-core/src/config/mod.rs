pub mod loader;
pub mod model;
pub mod option;
pub mod settings;


pub use model::{MetricsConfig, MetricsConfigBuilder};
pub use option::MetricsOption;
pub use settings::{MetricsSettings, ServerSettings, Settings};
