use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Street graph has no nodes or edges to locate against")]
    EmptyGraph,
    #[error("Negative {metric} weight {value} on street segment {segment}")]
    NegativeWeight {
        metric: &'static str,
        value: f64,
        segment: usize,
    },
    #[error("Non-finite {metric} weight on street segment {segment}")]
    InvalidWeight { metric: &'static str, segment: usize },
    #[error("Non-finite coordinate ({x}, {y})")]
    InvalidCoordinate { x: f64, y: f64 },
    #[error("Unknown cost metric '{0}', expected 'length' or 'time'")]
    UnknownMetric(String),
    #[error("Unknown snap mode '{0}', expected 'node' or 'edge'")]
    UnknownSnapMode(String),
    #[error("Unknown reach strategy '{0}', expected 'isochron' or 'absolute'")]
    UnknownStrategy(String),
    #[error("Invalid node index")]
    InvalidNodeIndex,
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Snapshot error: {0}")]
    SnapshotError(String),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
