use thiserror::Error;

/// Validation errors for caller-supplied domain values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("instrument id cannot be empty")]
    EmptyInstrument,
    #[error("instrument id length {len} exceeds max {max}")]
    InstrumentTooLong { len: usize, max: usize },
    #[error("instrument id contains a control character at index {index}")]
    InstrumentControlChar { index: usize },
}

/// Raw observation field names, used to point at the offending value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl Field {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::High => "high",
            Self::Low => "low",
            Self::Close => "close",
            Self::Volume => "volume",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while turning raw provider series into records.
///
/// Any of these fails the whole batch; no partial batch reaches the loader.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("both series are tagged with the same instrument '{instrument}'")]
    DuplicateInstrument { instrument: String },

    #[error("{instrument} {date}: field '{field}' is missing")]
    MissingField {
        instrument: String,
        date: String,
        field: Field,
    },

    #[error("{instrument} {date}: field '{field}' is not a valid number: '{value}'")]
    InvalidNumber {
        instrument: String,
        date: String,
        field: Field,
        value: String,
    },

    #[error("{instrument} {date}: field '{field}' must be finite")]
    NonFinite {
        instrument: String,
        date: String,
        field: Field,
    },

    #[error("{instrument}: date key '{value}' is not a YYYY-MM-DD date")]
    InvalidDate { instrument: String, value: String },

    #[error("provider document has no 'Time Series (Daily)' section")]
    MissingTimeSeries,
}
