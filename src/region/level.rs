use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Geographic nesting level. Sub-county units keep the domain's UAT naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionLevel {
    Country,
    County,
    SubCounty,
}

impl RegionLevel {
    /// Path segment used by the data pack layout.
    pub fn as_str(self) -> &'static str {
        match self {
            RegionLevel::Country => "country",
            RegionLevel::County => "county",
            RegionLevel::SubCounty => "uat",
        }
    }

    /// Level of the regions drawn when viewing at this level: the national and
    /// single-county views both draw county shapes; sub-county views draw UATs.
    pub fn display_level(self) -> RegionLevel {
        match self {
            RegionLevel::Country | RegionLevel::County => RegionLevel::County,
            RegionLevel::SubCounty => RegionLevel::SubCounty,
        }
    }
}

impl fmt::Display for RegionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegionLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "country" => Ok(RegionLevel::Country),
            "county" => Ok(RegionLevel::County),
            "uat" | "subcounty" => Ok(RegionLevel::SubCounty),
            other => Err(format!("unknown region level: {other}")),
        }
    }
}
