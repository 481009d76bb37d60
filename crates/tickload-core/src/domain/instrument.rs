use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

const MAX_INSTRUMENT_LEN: usize = 64;

/// Opaque instrument label (usually a ticker symbol).
///
/// Only surrounding whitespace is trimmed; the label is otherwise stored
/// verbatim, so quotes and punctuation survive into the warehouse unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InstrumentId(String);

impl InstrumentId {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyInstrument);
        }

        let len = trimmed.chars().count();
        if len > MAX_INSTRUMENT_LEN {
            return Err(ValidationError::InstrumentTooLong {
                len,
                max: MAX_INSTRUMENT_LEN,
            });
        }

        if let Some(index) = trimmed.chars().position(char::is_control) {
            return Err(ValidationError::InstrumentControlChar { index });
        }

        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for InstrumentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for InstrumentId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for InstrumentId {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<InstrumentId> for String {
    fn from(value: InstrumentId) -> Self {
        value.0
    }
}
