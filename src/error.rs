use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("File not found or could not be read: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse JSON document: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("Failed to read sizing table: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Invalid configuration: {0}")]
    ConfigurationError(String),

    #[error("Observation '{observation}' requests {demand} arrays, but the telescope only offers {max_telescope_usage}")]
    CapacityError { observation: String, demand: u32, max_telescope_usage: u32 },

    #[error("No sizing data for '{item}' (hpso={hpso}, baseline={baseline}, channels={channels}, demand={demand}): {reason}")]
    LookupError { hpso: String, baseline: f64, channels: u32, demand: u32, item: String, reason: String },

    #[error("Graph unroller failed for template '{template}' with parallelism {parallelism}: {reason}")]
    ExternalToolError { template: String, parallelism: u32, reason: String },

    #[error("Invalid task graph: {0}")]
    GraphError(String),
}

impl Error {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::ConfigurationError(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
