use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Core(#[from] walkreach_core::Error),
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("WKT error: {0}")]
    Wkt(String),
    #[error("GeoJSON error: {0}")]
    GeoJson(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
