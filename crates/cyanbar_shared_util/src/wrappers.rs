use derive_more::{AsRef, Display, From, FromStr};
use serde::{Deserialize, Serialize};

/// The name of a bar slot, as used in the registry and on the control channel.
#[repr(transparent)]
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, AsRef, From, FromStr, Display)]
pub struct SlotName(pub String);

impl SlotName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for SlotName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SlotName {
    fn from(s: &str) -> Self {
        SlotName(s.to_owned())
    }
}

impl PartialEq<str> for SlotName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for SlotName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
