use thiserror::Error;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to decode payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("unexpected status code: {status}")]
    UnexpectedStatus { status: reqwest::StatusCode },

    #[error("missing configuration value: {field}")]
    MissingConfig { field: String },

    #[error("invalid configuration value for {field}: {value:?} ({reason})")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("operation cancelled")]
    Cancelled,

    #[error("all {} delivery attempts failed: [{}]", .causes.len(), summarize(.causes))]
    RetriesExhausted { causes: Vec<DispatchError> },
}

impl DispatchError {
    /// True for the cancellation-flavored error that must abort a whole pass
    /// rather than being tolerated as one item's failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DispatchError::Cancelled)
    }
}

fn summarize(causes: &[DispatchError]) -> String {
    causes
        .iter()
        .enumerate()
        .map(|(i, cause)| format!("attempt {}: {}", i + 1, cause))
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, DispatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_error_lists_causes_in_attempt_order() {
        let err = DispatchError::RetriesExhausted {
            causes: vec![
                DispatchError::UnexpectedStatus {
                    status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                },
                DispatchError::UnexpectedStatus {
                    status: reqwest::StatusCode::BAD_GATEWAY,
                },
            ],
        };

        let rendered = err.to_string();
        assert!(rendered.contains("all 2 delivery attempts failed"));
        let first = rendered.find("attempt 1: unexpected status code: 500").unwrap();
        let second = rendered.find("attempt 2: unexpected status code: 502").unwrap();
        assert!(first < second);
    }

    #[test]
    fn cancellation_is_distinguishable() {
        assert!(DispatchError::Cancelled.is_cancelled());
        assert!(!DispatchError::RetriesExhausted { causes: vec![] }.is_cancelled());
    }
}
