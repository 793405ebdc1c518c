use std::num::ParseIntError;
use std::str::FromStr;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
        pub struct $name(u64);

        impl $name {
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<u64>().map(Self)
            }
        }

        #[cfg(feature = "serde")]
        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_u64(self.0)
            }
        }

        #[cfg(feature = "serde")]
        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                u64::deserialize(deserializer).map(Self)
            }
        }
    };
}

numeric_id!(
    /// Identifier of a top-level comment. Unique among the comments of one event.
    CommentId
);

numeric_id!(
    /// Identifier of a reply. Unique across the whole reply tree of its comment,
    /// not only among siblings.
    ReplyId
);

numeric_id!(
    /// Stable identity of a user. Authorship checks compare this, never display names.
    UserId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let id: CommentId = " 42 ".parse().unwrap();
        assert_eq!(id, CommentId::new(42));
        assert_eq!(id.to_string(), "42");
        assert_eq!(format!("{:?}", ReplyId::new(7)), "ReplyId(7)");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("abc".parse::<UserId>().is_err());
        assert!("-1".parse::<ReplyId>().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_as_plain_number() {
        let json = serde_json::to_string(&ReplyId::new(101)).unwrap();
        assert_eq!(json, "101");
        let back: ReplyId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ReplyId::new(101));
    }
}
