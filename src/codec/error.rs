use thiserror::Error;

/// Malformed wire data, on either side of the storage boundary.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("element at unit {offset} needs {needed} units but only {remaining} remain")]
    Truncated {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    #[error("odd length marker {marker} at unit {offset}")]
    OddMarker { offset: usize, marker: u16 },

    #[error("element is not valid UTF-16: {0}")]
    InvalidUtf16(#[from] std::string::FromUtf16Error),

    #[error("invalid hex value for {field}: {value:?}")]
    InvalidHex { field: &'static str, value: String },

    #[error("element of {units} units exceeds the {max} unit limit")]
    ElementTooLong { units: usize, max: usize },

    #[error("wire byte length {0} is odd")]
    OddByteLength(usize),

    #[error("action map entry has no locale")]
    EmptyActionMap,
}

pub type Result<T> = std::result::Result<T, CodecError>;
