//! Demo User Roster
//!
//! The predefined users a surface can pick from. Each user's email owns one
//! conversation on the backend.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Subscription tier of a demo user
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProgramType {
    /// Capped number of user messages per conversation
    Free,
    /// Unlimited
    Accelerate,
}

impl ProgramType {
    /// Message cap for this tier, given the configured Free-tier limit
    #[must_use]
    pub fn message_limit(self, free_limit: usize) -> Option<usize> {
        match self {
            ProgramType::Free => Some(free_limit),
            ProgramType::Accelerate => None,
        }
    }
}

impl fmt::Display for ProgramType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgramType::Free => f.write_str("Free"),
            ProgramType::Accelerate => f.write_str("Accelerate"),
        }
    }
}

/// A selectable demo user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Display name
    pub name: String,
    /// Unique email, keys the cached conversation
    pub email: String,
    /// Tier
    pub program_type: ProgramType,
}

impl User {
    /// Create a user
    pub fn new(name: impl Into<String>, email: impl Into<String>, program_type: ProgramType) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            program_type,
        }
    }
}

/// The built-in roster
#[must_use]
pub fn demo_users() -> Vec<User> {
    vec![
        User::new("Deepak", "deepak02@iotasol.com", ProgramType::Accelerate),
        User::new("Avtar", "avtar@iotasol.com", ProgramType::Free),
        User::new("Regina", "regina@iotasol.com", ProgramType::Free),
    ]
}

/// Find a roster entry by case-insensitive name
#[must_use]
pub fn find_by_name(users: &[User], name: &str) -> Option<usize> {
    users.iter().position(|u| u.name.eq_ignore_ascii_case(name))
}
