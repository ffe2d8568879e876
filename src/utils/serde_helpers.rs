use serde::{ Deserializer, Serializer };
use serde::de::{ self, Visitor };
use std::fmt;
use tracing::Level;

/// Serialize `tracing::Level` to a string
pub fn serialize_level<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where S: Serializer
{
    let level_str = match *level {
        Level::TRACE => "trace",
        Level::DEBUG => "debug",
        Level::INFO => "info",
        Level::WARN => "warn",
        Level::ERROR => "error",
    };

    serializer.serialize_str(level_str)
}

/// Deserialize `tracing::Level` from a string
pub fn deserialize_level<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where D: Deserializer<'de>
{
    struct LevelVisitor;

    impl<'de> Visitor<'de> for LevelVisitor {
        type Value = Level;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str(
                "a string representing a log level (trace, debug, info, warn, error)"
            )
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E> where E: de::Error {
            match value.to_lowercase().as_str() {
                "trace" => Ok(Level::TRACE),
                "debug" => Ok(Level::DEBUG),
                "info" => Ok(Level::INFO),
                "warn" => Ok(Level::WARN),
                "error" => Ok(Level::ERROR),
                _ => Err(E::custom(format!("unknown log level: {}", value))),
            }
        }
    }

    deserializer.deserialize_str(LevelVisitor)
}

/// Keeps the first four characters of a credential so it can still be told apart in logs
pub fn mask_secret<S>(secret: &str, serializer: S) -> Result<S::Ok, S::Error>
    where S: Serializer
{
    let visible: String = secret.chars().take(4).collect();
    let masked = if secret.chars().count() > 8 {
        format!("{}****", visible)
    } else {
        "****".to_string()
    };

    serializer.serialize_str(&masked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{ Deserialize, Serialize };

    #[derive(Serialize, Deserialize)]
    struct Levelled {
        #[serde(serialize_with = "serialize_level", deserialize_with = "deserialize_level")]
        level: Level,
    }

    #[test]
    fn level_is_written_lowercase_and_read_back() {
        let json = serde_json::to_string(&(Levelled { level: Level::WARN })).unwrap();
        assert_eq!(json, r#"{"level":"warn"}"#);

        let parsed: Levelled = serde_json::from_str(r#"{"level":"TRACE"}"#).unwrap();
        assert_eq!(parsed.level, Level::TRACE);

        assert!(serde_json::from_str::<Levelled>(r#"{"level":"loud"}"#).is_err());
    }

    #[derive(Serialize)]
    struct Credential<'a> {
        #[serde(serialize_with = "mask_secret")]
        key: &'a str,
    }

    #[test]
    fn short_secrets_are_fully_hidden() {
        let long = serde_json::to_string(&(Credential { key: "abcdefghij" })).unwrap();
        assert_eq!(long, r#"{"key":"abcd****"}"#);

        let short = serde_json::to_string(&(Credential { key: "abc" })).unwrap();
        assert_eq!(short, r#"{"key":"****"}"#);
    }
}
