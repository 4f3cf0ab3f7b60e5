//! Experimental domains.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The experimental domain a measurement comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Cosmology,
    Neuroscience,
    FundamentalPhysics,
}

impl Domain {
    /// Every domain, in reporting order.
    pub const ALL: [Domain; 3] = [
        Domain::Cosmology,
        Domain::Neuroscience,
        Domain::FundamentalPhysics,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Cosmology => "cosmology",
            Self::Neuroscience => "neuroscience",
            Self::FundamentalPhysics => "fundamental_physics",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cosmology" => Ok(Self::Cosmology),
            "neuroscience" => Ok(Self::Neuroscience),
            "fundamental_physics" => Ok(Self::FundamentalPhysics),
            other => Err(format!("unknown domain: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_name_round_trips_through_from_str() {
        for domain in Domain::ALL {
            assert_eq!(domain.name().parse::<Domain>(), Ok(domain));
        }
        assert!("astrology".parse::<Domain>().is_err());
    }
}
