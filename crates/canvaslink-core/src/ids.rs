use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn from_raw(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::convert::Infallible;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.to_owned()))
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}

string_id!(SessionId);
string_id!(NodeId);
string_id!(EdgeId);

impl SessionId {
    pub fn new() -> Self {
        Self(format!("sess_{}", Uuid::now_v7()))
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeId {
    /// Id of the node at 1-based insertion position `ordinal`.
    pub fn nth(ordinal: usize) -> Self {
        Self(format!("node-{ordinal}"))
    }
}

impl EdgeId {
    /// Id derived from the endpoint pair. `occurrence` is 1 for the first
    /// edge between the pair; later parallel edges get a numeric suffix.
    pub fn derive(from: &NodeId, to: &NodeId, occurrence: usize) -> Self {
        if occurrence <= 1 {
            Self(format!("{from}-{to}"))
        } else {
            Self(format!("{from}-{to}-{occurrence}"))
        }
    }
}
