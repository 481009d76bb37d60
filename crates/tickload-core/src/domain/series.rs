use std::fmt::{self, Formatter};

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

/// One day of provider data with the ordinal labels decoded into named fields.
///
/// Values stay in their provider-native string form; numeric coercion is the
/// normalizer's job. A label absent from the payload decodes to `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawObservation {
    #[serde(rename = "1. open", default, deserialize_with = "native_value")]
    pub open: Option<String>,
    #[serde(rename = "2. high", default, deserialize_with = "native_value")]
    pub high: Option<String>,
    #[serde(rename = "3. low", default, deserialize_with = "native_value")]
    pub low: Option<String>,
    #[serde(rename = "4. close", default, deserialize_with = "native_value")]
    pub close: Option<String>,
    #[serde(rename = "5. volume", default, deserialize_with = "native_value")]
    pub volume: Option<String>,
}

impl RawObservation {
    pub fn new(
        open: impl Into<String>,
        high: impl Into<String>,
        low: impl Into<String>,
        close: impl Into<String>,
        volume: impl Into<String>,
    ) -> Self {
        Self {
            open: Some(open.into()),
            high: Some(high.into()),
            low: Some(low.into()),
            close: Some(close.into()),
            volume: Some(volume.into()),
        }
    }
}

/// Per-date observations for one instrument, in provider document order.
///
/// Alpha Vantage lists the newest date first; that order is kept as-is so
/// the window cap selects the most recent entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSeries {
    entries: Vec<(String, RawObservation)>,
}

impl RawSeries {
    pub fn new(entries: Vec<(String, RawObservation)>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dates(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(date, _)| date.as_str())
    }
}

impl FromIterator<(String, RawObservation)> for RawSeries {
    fn from_iter<I: IntoIterator<Item = (String, RawObservation)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for RawSeries {
    type Item = (String, RawObservation);
    type IntoIter = std::vec::IntoIter<(String, RawObservation)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

// A JSON object visited entry by entry keeps document order, which a
// BTreeMap-backed `serde_json::Map` would lose.
impl<'de> Deserialize<'de> for RawSeries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SeriesVisitor;

        impl<'de> Visitor<'de> for SeriesVisitor {
            type Value = RawSeries;

            fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
                f.write_str("an object keyed by date")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((date, observation)) =
                    map.next_entry::<String, RawObservation>()?
                {
                    entries.push((date, observation));
                }
                Ok(RawSeries { entries })
            }
        }

        deserializer.deserialize_map(SeriesVisitor)
    }
}

/// Accept a provider value given either as a JSON string or a bare number.
fn native_value<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct NativeVisitor;

    impl<'de> Visitor<'de> for NativeVisitor {
        type Value = Option<String>;

        fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
            f.write_str("a string or number")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            Ok(Some(value.to_owned()))
        }

        fn visit_string<E: de::Error>(self, value: String) -> Result<Self::Value, E> {
            Ok(Some(value))
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
            Ok(Some(value.to_string()))
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
            Ok(Some(value.to_string()))
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
            Ok(Some(value.to_string()))
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }
    }

    deserializer.deserialize_any(NativeVisitor)
}
