use std::fmt;

use serde::{Deserialize, Serialize};

/// A learner's account id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The account fields other services need to act on a learner's behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub full_name: String,
}

impl User {
    pub fn new(id: u64, username: &str, email: &str) -> Self {
        Self {
            id: UserId(id),
            username: username.to_string(),
            email: email.to_string(),
            full_name: String::new(),
        }
    }
}
