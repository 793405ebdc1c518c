/// Identifier of the event whose comments are loaded.
///
/// Hosts pass either a numeric id or a slug; the engine only uses it to label
/// snapshots and never interprets it.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct EventId(String);

impl EventId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EventId({})", self.0)
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for EventId {
    fn from(raw: u64) -> Self {
        Self(raw.to_string())
    }
}

impl From<&str> for EventId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for EventId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for EventId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EventIdVisitor;

        impl serde::de::Visitor<'_> for EventIdVisitor {
            type Value = EventId;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("an event id as a string or an unsigned integer")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<EventId, E> {
                Ok(EventId::new(v))
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<EventId, E> {
                Ok(EventId::from(v))
            }
        }

        deserializer.deserialize_any(EventIdVisitor)
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_numeric_and_string_ids() {
        let numeric: EventId = serde_json::from_str("17").unwrap();
        assert_eq!(numeric, EventId::new("17"));
        let slug: EventId = serde_json::from_str("\"spring-summit\"").unwrap();
        assert_eq!(slug.as_str(), "spring-summit");
        assert_eq!(serde_json::to_string(&numeric).unwrap(), "\"17\"");
    }
}
