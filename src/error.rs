use thiserror::Error;

/// Failure of a single exchange with the M2M service.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("401 Unauthorized")]
    Unauthorized,
    #[error("404 Not Found")]
    NotFound,
    #[error("400 Bad Request")]
    BadRequest,
    #[error("HTTP error status {0}")]
    Status(u16),
    #[error("{code} - {message}")]
    Service { code: String, message: String },
    #[error("No output from service")]
    EmptyResponse,
    #[error("Unable to decode service response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Invalid endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

impl ApiError {
    pub(crate) fn from_status(status: u16) -> Self {
        match status {
            400 => Self::BadRequest,
            401 => Self::Unauthorized,
            404 => Self::NotFound,
            other => Self::Status(other),
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PollError {
    #[error(
        "Gave up after {attempts} retrieve attempts with {resolved} of {expected} downloads resolved"
    )]
    Exhausted {
        resolved: usize,
        expected: usize,
        attempts: u32,
    },
}

#[derive(Error, Debug, PartialEq)]
pub enum SelectionError {
    #[error("Dataset name must not be empty")]
    EmptyDataset,
    #[error("Download label must not be empty")]
    EmptyLabel,
    #[error("Latitude {0} is outside [-90, 90]")]
    Latitude(f64),
    #[error("Longitude {0} is outside [-180, 180]")]
    Longitude(f64),
    #[error("Lower-left corner must be south-west of the upper-right corner")]
    InvertedBoundingBox,
    #[error("Cloud cover range {min}..={max} is invalid")]
    CloudCover { min: u8, max: u8 },
    #[error("Acquisition start {start} is after end {end}")]
    InvertedDateRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },
}
