//! Human-readable sizes and durations for configuration values

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Invalid number: {0}")]
    InvalidNumber(#[from] std::num::ParseIntError),

    #[error("Invalid unit: {0}")]
    InvalidUnit(String),

    #[error("Value overflows: {0}")]
    Overflow(String),
}

/// Splits `"10MB"` into `(10, "MB")`. A bare number yields an empty unit.
fn split_number(s: &str) -> Result<(u64, &str), ParseError> {
    let s = s.trim();
    let pos = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    if pos == 0 {
        return Err(ParseError::InvalidFormat(s.to_string()));
    }
    let num = s[..pos].parse::<u64>()?;
    Ok((num, s[pos..].trim()))
}

/// Byte size with human-readable parsing ("10MB", "512KB", 1024)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ByteSize(pub u64);

impl ByteSize {
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Size as `usize`, saturating on 32-bit targets
    pub fn as_usize(&self) -> usize {
        usize::try_from(self.0).unwrap_or(usize::MAX)
    }
}

impl FromStr for ByteSize {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (num, unit) = split_number(s)?;

        let multiplier: u64 = match unit.to_uppercase().as_str() {
            "" | "B" => 1,
            "K" | "KB" | "KIB" => 1 << 10,
            "M" | "MB" | "MIB" => 1 << 20,
            "G" | "GB" | "GIB" => 1 << 30,
            "T" | "TB" | "TIB" => 1 << 40,
            other => return Err(ParseError::InvalidUnit(other.to_string())),
        };

        num.checked_mul(multiplier)
            .map(ByteSize)
            .ok_or_else(|| ParseError::Overflow(s.to_string()))
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const UNITS: &[(&str, u64)] = &[("TB", 1 << 40), ("GB", 1 << 30), ("MB", 1 << 20), ("KB", 1 << 10)];

        for &(unit, divisor) in UNITS {
            if self.0 >= divisor && self.0 % divisor == 0 {
                return write!(f, "{}{}", self.0 / divisor, unit);
            }
        }
        write!(f, "{}B", self.0)
    }
}

impl Serialize for ByteSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ByteSize {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_any(HumanVisitor::<ByteSize>::new("a byte size such as \"10MB\" or an integer"))
    }
}

/// Duration with human-readable parsing ("120s", "500ms", "2m", 30)
///
/// Bare integers are seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct HumanDuration(pub Duration);

impl HumanDuration {
    pub fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl FromStr for HumanDuration {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (num, unit) = split_number(s)?;

        let duration = match unit.to_lowercase().as_str() {
            "ms" => Duration::from_millis(num),
            "" | "s" | "sec" | "secs" => Duration::from_secs(num),
            "m" | "min" | "mins" => num
                .checked_mul(60)
                .map(Duration::from_secs)
                .ok_or_else(|| ParseError::Overflow(s.to_string()))?,
            "h" => num
                .checked_mul(3600)
                .map(Duration::from_secs)
                .ok_or_else(|| ParseError::Overflow(s.to_string()))?,
            other => return Err(ParseError::InvalidUnit(other.to_string())),
        };

        Ok(HumanDuration(duration))
    }
}

impl fmt::Display for HumanDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let millis = self.0.as_millis();
        if millis % 1000 != 0 {
            write!(f, "{}ms", millis)
        } else {
            write!(f, "{}s", self.0.as_secs())
        }
    }
}

impl Serialize for HumanDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for HumanDuration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_any(HumanVisitor::<HumanDuration>::new("a duration such as \"120s\" or an integer"))
    }
}

/// Accepts either a string parsed with `FromStr` or a bare unsigned integer
struct HumanVisitor<T> {
    expecting: &'static str,
    _marker: std::marker::PhantomData<T>,
}

impl<T> HumanVisitor<T> {
    fn new(expecting: &'static str) -> Self {
        Self {
            expecting,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<'de, T> serde::de::Visitor<'de> for HumanVisitor<T>
where
    T: FromStr<Err = ParseError>,
{
    type Value = T;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str(self.expecting)
    }

    fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Self::Value, E> {
        v.to_string().parse::<T>().map_err(E::custom)
    }

    fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Self::Value, E> {
        let v = u64::try_from(v).map_err(|_| E::custom("value must not be negative"))?;
        self.visit_u64(v)
    }

    fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
        v.parse::<T>().map_err(E::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sizes() {
        assert_eq!("1024".parse::<ByteSize>().unwrap().as_u64(), 1024);
        assert_eq!("1KB".parse::<ByteSize>().unwrap().as_u64(), 1024);
        assert_eq!("10MB".parse::<ByteSize>().unwrap().as_u64(), 10 * 1024 * 1024);
        assert_eq!("5mib".parse::<ByteSize>().unwrap().as_u64(), 5 * 1024 * 1024);
        assert_eq!("2G".parse::<ByteSize>().unwrap().as_u64(), 2 * 1024 * 1024 * 1024);
    }

    #[test]
    fn test_parse_size_errors() {
        assert!(matches!("MB".parse::<ByteSize>(), Err(ParseError::InvalidFormat(_))));
        assert!(matches!("5PB".parse::<ByteSize>(), Err(ParseError::InvalidUnit(_))));
        assert!(matches!(
            "99999999999999TB".parse::<ByteSize>(),
            Err(ParseError::Overflow(_))
        ));
    }

    #[test]
    fn test_size_display() {
        assert_eq!(ByteSize(1024).to_string(), "1KB");
        assert_eq!(ByteSize(10 * 1024 * 1024).to_string(), "10MB");
        assert_eq!(ByteSize(1500).to_string(), "1500B");
    }

    #[test]
    fn test_parse_durations() {
        assert_eq!("120s".parse::<HumanDuration>().unwrap().as_duration(), Duration::from_secs(120));
        assert_eq!("500ms".parse::<HumanDuration>().unwrap().as_duration(), Duration::from_millis(500));
        assert_eq!("2m".parse::<HumanDuration>().unwrap().as_duration(), Duration::from_secs(120));
        assert_eq!("1h".parse::<HumanDuration>().unwrap().as_duration(), Duration::from_secs(3600));
        assert_eq!("30".parse::<HumanDuration>().unwrap().as_duration(), Duration::from_secs(30));
        assert!(matches!("3d".parse::<HumanDuration>(), Err(ParseError::InvalidUnit(_))));
    }

    #[test]
    fn test_duration_display() {
        assert_eq!(HumanDuration::from_secs(120).to_string(), "120s");
        assert_eq!(HumanDuration(Duration::from_millis(1500)).to_string(), "1500ms");
    }

    #[test]
    fn test_deserialize_string_and_number() {
        #[derive(Deserialize)]
        struct Limits {
            size: ByteSize,
            lease: HumanDuration,
        }

        let parsed: Limits = serde_json::from_str(r#"{"size": "10MB", "lease": "120s"}"#).unwrap();
        assert_eq!(parsed.size.as_u64(), 10 * 1024 * 1024);
        assert_eq!(parsed.lease.as_duration(), Duration::from_secs(120));

        let parsed: Limits = serde_json::from_str(r#"{"size": 2048, "lease": 2}"#).unwrap();
        assert_eq!(parsed.size.as_u64(), 2048);
        assert_eq!(parsed.lease.as_duration(), Duration::from_secs(2));
    }
}
