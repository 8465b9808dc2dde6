// Engine error taxonomy. Client errors map to 404, everything else to 500.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::Granularity;

pub type Result<T> = std::result::Result<T, MonitorError>;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Invalid Timezone: {0}")]
    InvalidTimezone(String),

    #[error("No Data ({0} series)")]
    NoData(Granularity),

    /// Unparseable series file. Recovered by the store (series read as empty).
    #[error("series file {path:?} is corrupt: {source}")]
    StorageCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl MonitorError {
    /// True for errors caused by the request rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            MonitorError::InvalidTimezone(_) | MonitorError::NoData(_)
        )
    }
}
