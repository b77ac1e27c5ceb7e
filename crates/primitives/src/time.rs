//! Block timestamps.

use crate::ValidationError;
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// The timestamp of a Klaytn block.
///
/// Klaytn headers split the block time into whole seconds (`timestamp`) and a
/// fraction-of-second field in milliseconds (`timestampFoS`); the two combine
/// as `seconds + 0.001 * fos`. Stored as an absolute UTC instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
pub struct BlockTime(DateTime<Utc>);

impl BlockTime {
    /// Combines the header's second and fraction-of-second fields.
    pub fn from_secs_fos(secs: u64, fos: u64) -> Result<Self, ValidationError> {
        let nanos = u32::try_from(fos)
            .ok()
            .and_then(|fos| fos.checked_mul(1_000_000))
            .ok_or(ValidationError::TimestampOutOfRange { secs, fos })?;
        Utc.timestamp_opt(
            i64::try_from(secs).map_err(|_| ValidationError::TimestampOutOfRange { secs, fos })?,
            nanos,
        )
        .single()
        .map(Self)
        .ok_or(ValidationError::TimestampOutOfRange { secs, fos })
    }

    /// Seconds since the unix epoch, with millisecond precision.
    pub fn unix(&self) -> f64 {
        self.0.timestamp() as f64 + f64::from(self.0.timestamp_subsec_millis()) * 0.001
    }

    /// ISO-8601 rendering with microsecond precision and a `+00:00` offset.
    pub fn iso8601(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Micros, false)
    }
}

impl Serialize for BlockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.iso8601())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combines_seconds_and_fos() {
        let time = BlockTime::from_secs_fos(1_574_770_789, 19).unwrap();
        assert!((time.unix() - 1_574_770_789.019).abs() < 1e-6);
        assert_eq!(time.iso8601(), "2019-11-26T12:19:49.019000+00:00");
    }

    #[test]
    fn zero_fos_is_whole_second() {
        let time = BlockTime::from_secs_fos(1_574_770_789, 0).unwrap();
        assert_eq!(time.unix(), 1_574_770_789.0);
    }
}
