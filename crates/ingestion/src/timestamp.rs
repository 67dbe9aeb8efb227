//! Timestamp normalizer
//!
//! Combines `date` (`YYYY-MM-DD`) and `time` (`HH:MM:SS`) into the canonical
//! timestamp field. A numeric `tz` offset (`+0200`, `-05:30`) wins over the
//! configured default zone. Source fields are left in place.

use chrono::{DateTime, FixedOffset, LocalResult, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use contracts::{Record, DEFAULT_TIMESTAMP_FIELD};

use crate::error::{IngestionError, RecordError};

const DATE_FIELD: &str = "date";
const TIME_FIELD: &str = "time";
const TZ_FIELD: &str = "tz";

/// Derives the canonical timestamp of each record
#[derive(Debug, Clone)]
pub struct TimestampNormalizer {
    field: String,
    default_zone: Tz,
}

impl TimestampNormalizer {
    /// Create a normalizer writing `@timestamp`
    pub fn new(default_zone: Tz) -> Self {
        Self {
            field: DEFAULT_TIMESTAMP_FIELD.to_string(),
            default_zone,
        }
    }

    /// Create from an IANA zone name
    pub fn from_zone_name(name: &str) -> Result<Self, IngestionError> {
        let zone = name
            .parse::<Tz>()
            .map_err(|_| IngestionError::UnknownTimezone {
                name: name.to_string(),
            })?;
        Ok(Self::new(zone))
    }

    /// Write the canonical timestamp under a different field name
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    /// Canonical field name
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn default_zone(&self) -> Tz {
        self.default_zone
    }

    /// Set the canonical timestamp field on `record`
    ///
    /// # Errors
    /// - `MissingField` when `date` or `time` is absent
    /// - `InvalidTimestamp` when they (or `tz`) do not parse
    pub fn normalize(&self, mut record: Record) -> Result<Record, RecordError> {
        let timestamp = self.timestamp_of(&record)?;
        record.insert(self.field.clone(), timestamp);
        Ok(record)
    }

    fn timestamp_of(&self, record: &Record) -> Result<DateTime<FixedOffset>, RecordError> {
        let date = record
            .get_text(DATE_FIELD)
            .ok_or_else(|| RecordError::missing_field(DATE_FIELD))?;
        let time = record
            .get_text(TIME_FIELD)
            .ok_or_else(|| RecordError::missing_field(TIME_FIELD))?;

        let stamp = format!("{date} {time}");
        let naive = NaiveDateTime::parse_from_str(&stamp, "%Y-%m-%d %H:%M:%S")
            .map_err(|e| RecordError::invalid_timestamp(&stamp, e.to_string()))?;

        match record.get_text(TZ_FIELD) {
            Some(tz) => attach_offset(naive, tz),
            None => self.localize(naive),
        }
    }

    /// Ambiguous local times resolve to the later (standard time) instant;
    /// times inside a DST gap are rejected.
    fn localize(&self, naive: NaiveDateTime) -> Result<DateTime<FixedOffset>, RecordError> {
        match self.default_zone.from_local_datetime(&naive) {
            LocalResult::Single(dt) => Ok(dt.fixed_offset()),
            LocalResult::Ambiguous(_, latest) => Ok(latest.fixed_offset()),
            LocalResult::None => Err(RecordError::invalid_timestamp(
                naive.to_string(),
                format!("local time does not exist in {}", self.default_zone),
            )),
        }
    }
}

fn attach_offset(naive: NaiveDateTime, tz: &str) -> Result<DateTime<FixedOffset>, RecordError> {
    let stamp = format!("{} {}", naive.format("%Y-%m-%d %H:%M:%S"), tz.trim());
    DateTime::parse_from_str(&stamp, "%Y-%m-%d %H:%M:%S %z")
        .map_err(|e| RecordError::invalid_timestamp(tz, format!("invalid utc offset: {e}")))
}
