use std::{fmt::Display, str::FromStr};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

const UNIT: &str = "mins";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
    #[error("invalid runtime format, expected \"<minutes> mins\"")]
    InvalidFormat,
}

/// Running time in whole minutes.
///
/// On the wire it is text like `"102 mins"`, in the database a plain integer,
/// so that sorting by runtime stays numeric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Runtime(i32);

impl Runtime {
    pub const fn from_minutes(minutes: i32) -> Self {
        Runtime(minutes)
    }

    pub const fn minutes(self) -> i32 {
        self.0
    }
}

impl Display for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.0, UNIT)
    }
}

impl FromStr for Runtime {
    type Err = RuntimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (minutes, unit) = s
            .trim()
            .split_once(' ')
            .ok_or(RuntimeError::InvalidFormat)?;
        if unit != UNIT {
            return Err(RuntimeError::InvalidFormat);
        }
        minutes
            .parse::<i32>()
            .map(Runtime)
            .map_err(|_| RuntimeError::InvalidFormat)
    }
}

impl Serialize for Runtime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Runtime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use quickcheck_macros::quickcheck;

    use super::*;

    #[test]
    fn test_parse_runtime() {
        let runtime: Runtime = "102 mins".parse().unwrap();
        assert_eq!(102, runtime.minutes());
        assert_eq!("102 mins", runtime.to_string());

        let runtime: Runtime = " 7 mins ".parse().unwrap();
        assert_eq!(7, runtime.minutes());
    }

    #[test]
    fn test_invalid_runtime() {
        for text in ["102", "102mins", "102 minutes", "abc mins", "", "1.5 mins"] {
            assert_eq!(
                Err(RuntimeError::InvalidFormat),
                text.parse::<Runtime>(),
                "{text} should not parse"
            );
        }
    }

    #[test]
    fn test_runtime_json() {
        let json = serde_json::to_string(&Runtime::from_minutes(95)).unwrap();
        assert_eq!(r#""95 mins""#, json);

        let runtime: Runtime = serde_json::from_str(r#""120 mins""#).unwrap();
        assert_eq!(Runtime::from_minutes(120), runtime);

        assert!(serde_json::from_str::<Runtime>("120").is_err());
        assert!(serde_json::from_str::<Runtime>(r#""two hours""#).is_err());
    }

    // text form always reads back to the same minutes
    #[quickcheck]
    fn test_runtime_text_is_stable(minutes: i32) -> bool {
        let runtime = Runtime::from_minutes(minutes);
        runtime.to_string().parse::<Runtime>() == Ok(runtime)
    }
}
