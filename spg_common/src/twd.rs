use std::fmt::Display;

use serde::{Deserialize, Serialize};
use sqlx::Type;

//--------------------------------------        Twd        ------------------------------------------------------------
/// An amount of New Taiwan dollars. The gateway only accepts whole-dollar amounts, so there is no minor unit.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Twd(i64);

impl From<i64> for Twd {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for Twd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NT${}", self.0)
    }
}

impl Twd {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }
}
