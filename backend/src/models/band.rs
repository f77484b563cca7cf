//! Photometric filter bands and their display metadata.
//!
//! The set of bands is closed: every survey filter the stacker understands is a
//! [`FilterBand`] variant, and per-band plotting metadata lives in a table
//! rather than in branches scattered through the code.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A survey filter band.
///
/// Bands order by survey and wavelength grouping, which is also the order in
/// which combined points for the same window are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FilterBand {
    #[serde(rename = "ZTF_g")]
    ZtfG,
    #[serde(rename = "ZTF_r")]
    ZtfR,
    #[serde(rename = "ZTF_i")]
    ZtfI,
    #[serde(rename = "UVW2.uvot")]
    UvotUvw2,
    #[serde(rename = "UVW1.uvot")]
    UvotUvw1,
    #[serde(rename = "U.uvot")]
    UvotU,
    #[serde(rename = "B.uvot")]
    UvotB,
    #[serde(rename = "V.uvot")]
    UvotV,
    #[serde(rename = "o.atlas")]
    AtlasO,
    #[serde(rename = "c.atlas")]
    AtlasC,
}

/// Display metadata carried by each band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandInfo {
    /// Canonical name, as written by the ZTF forced-photometry service
    /// or the multi-survey compilations.
    pub name: &'static str,
    /// Legend label for plots.
    pub label: &'static str,
    /// Matplotlib-compatible color name.
    pub color: &'static str,
    /// Lower-case spellings accepted on input besides the canonical name.
    pub aliases: &'static [&'static str],
}

const BAND_TABLE: [(FilterBand, BandInfo); 10] = [
    (
        FilterBand::ZtfG,
        BandInfo {
            name: "ZTF_g",
            label: "ZTF_g",
            color: "blue",
            aliases: &["g.ztf", "ztfg", "g"],
        },
    ),
    (
        FilterBand::ZtfR,
        BandInfo {
            name: "ZTF_r",
            label: "ZTF_r",
            color: "red",
            aliases: &["r.ztf", "ztfr", "r"],
        },
    ),
    (
        FilterBand::ZtfI,
        BandInfo {
            name: "ZTF_i",
            label: "ZTF_i",
            color: "goldenrod",
            aliases: &["i.ztf", "ztfi", "i"],
        },
    ),
    (
        FilterBand::UvotUvw2,
        BandInfo {
            name: "UVW2.uvot",
            label: "UVW2.uvot",
            color: "green",
            aliases: &["uvw2"],
        },
    ),
    (
        FilterBand::UvotUvw1,
        BandInfo {
            name: "UVW1.uvot",
            label: "UVW1.uvot",
            color: "gold",
            aliases: &["uvw1"],
        },
    ),
    (
        FilterBand::UvotU,
        BandInfo {
            name: "U.uvot",
            label: "U.uvot",
            color: "skyblue",
            aliases: &[],
        },
    ),
    (
        FilterBand::UvotB,
        BandInfo {
            name: "B.uvot",
            label: "B.uvot",
            color: "purple",
            aliases: &[],
        },
    ),
    (
        FilterBand::UvotV,
        BandInfo {
            name: "V.uvot",
            label: "V.uvot",
            color: "darkolivegreen",
            aliases: &[],
        },
    ),
    (
        FilterBand::AtlasO,
        BandInfo {
            name: "o.atlas",
            label: "o.atlas",
            color: "chocolate",
            aliases: &["o"],
        },
    ),
    (
        FilterBand::AtlasC,
        BandInfo {
            name: "c.atlas",
            label: "c.atlas",
            color: "tan",
            aliases: &["c"],
        },
    ),
];

impl FilterBand {
    /// Every band, in emission order.
    pub const ALL: [FilterBand; 10] = [
        FilterBand::ZtfG,
        FilterBand::ZtfR,
        FilterBand::ZtfI,
        FilterBand::UvotUvw2,
        FilterBand::UvotUvw1,
        FilterBand::UvotU,
        FilterBand::UvotB,
        FilterBand::UvotV,
        FilterBand::AtlasO,
        FilterBand::AtlasC,
    ];

    /// Display metadata for this band.
    pub fn info(&self) -> &'static BandInfo {
        // BAND_TABLE is laid out in the same order as ALL
        &BAND_TABLE[*self as usize].1
    }

    pub fn name(&self) -> &'static str {
        self.info().name
    }

    pub fn label(&self) -> &'static str {
        self.info().label
    }

    pub fn color(&self) -> &'static str {
        self.info().color
    }
}

impl fmt::Display for FilterBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilterBand {
    type Err = String;

    /// Parse a band from its canonical name or one of its aliases.
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace and
    /// trailing commas left over from comma-and-space separated files.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().trim_end_matches(',').to_lowercase();
        BAND_TABLE
            .iter()
            .find(|(_, info)| {
                info.name.to_lowercase() == needle || info.aliases.contains(&needle.as_str())
            })
            .map(|(band, _)| *band)
            .ok_or_else(|| format!("Unknown filter band: {}", s.trim()))
    }
}
