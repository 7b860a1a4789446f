mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    AuthSettings, CacheSettings, DatabaseSettings, LlmSettings, LoggingSettings, ServerSettings,
    Settings,
};
