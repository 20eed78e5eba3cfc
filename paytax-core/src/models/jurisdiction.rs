use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Jurisdiction {
    Singapore,
    UnitedStates,
    China,
}

impl Jurisdiction {
    /// Every supported jurisdiction, in listing order.
    pub const ALL: [Jurisdiction; 3] = [Self::Singapore, Self::UnitedStates, Self::China];

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Singapore => "Singapore",
            Self::UnitedStates => "United States",
            Self::China => "China",
        }
    }

    /// Matches the display name exactly, as the web form sends it.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|j| j.display_name() == s)
    }
}

impl fmt::Display for Jurisdiction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
