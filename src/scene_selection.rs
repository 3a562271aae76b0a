use crate::error::SelectionError;
use crate::model::{AcquisitionFilter, CloudCoverFilter, Coordinates, SceneFilter, SpatialFilter};
use crate::poll::PollPolicy;
use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const DEFAULT_LABEL: &str = "download-sample";

/// What to search for and under which label to request the downloads.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct SceneSelection {
    pub dataset: String,
    #[serde(default = "default_label")]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
    pub bounding_box: BoundingBox,
    pub acquisition: DateRange,
    pub cloud_cover: CloudCover,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polling: Option<PollPolicy>,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub lower_left: Coordinates,
    pub upper_right: Coordinates,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
pub struct CloudCover {
    pub min: u8,
    pub max: u8,
    #[serde(default)]
    pub include_unknown: bool,
}

fn default_label() -> String {
    DEFAULT_LABEL.to_string()
}

/// Landsat ARD tiles over the New York area with at most 3% cloud cover.
const SELECTION_TEMPLATE: &str = r#"
dataset = "landsat_ard_tile_c2"
label = "download-sample"

[bounding_box.lower_left]
latitude = 39.92817
longitude = -74.66431

[bounding_box.upper_right]
latitude = 41.54334
longitude = -72.50449

[acquisition]
start = "2018-01-10"
end = "2023-01-01"

[cloud_cover]
min = 0
max = 3
include_unknown = false
"#;

pub fn selection_template_toml() -> toml::Table {
    toml::from_str(SELECTION_TEMPLATE).expect("Selection template should always parse")
}

impl SceneSelection {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let selection: Self = toml::from_str(&content)?;
        selection.validate()?;
        Ok(selection)
    }

    pub fn write<P: AsRef<Path>>(self: &Self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn from_template(table: &toml::Table) -> Result<Self> {
        let selection: Self = toml::from_str(&table.to_string())?;
        Ok(selection)
    }

    pub fn validate(self: &Self) -> Result<(), SelectionError> {
        if self.dataset.trim().is_empty() {
            return Err(SelectionError::EmptyDataset);
        }
        if self.label.trim().is_empty() {
            return Err(SelectionError::EmptyLabel);
        }

        let BoundingBox {
            lower_left,
            upper_right,
        } = self.bounding_box;
        for corner in [lower_left, upper_right] {
            if !(-90.0..=90.0).contains(&corner.latitude) {
                return Err(SelectionError::Latitude(corner.latitude));
            }
            if !(-180.0..=180.0).contains(&corner.longitude) {
                return Err(SelectionError::Longitude(corner.longitude));
            }
        }
        if lower_left.latitude >= upper_right.latitude
            || lower_left.longitude >= upper_right.longitude
        {
            return Err(SelectionError::InvertedBoundingBox);
        }

        let CloudCover { min, max, .. } = self.cloud_cover;
        if min > max || max > 100 {
            return Err(SelectionError::CloudCover { min, max });
        }

        let DateRange { start, end } = self.acquisition;
        if start > end {
            return Err(SelectionError::InvertedDateRange { start, end });
        }
        Ok(())
    }

    pub fn scene_filter(self: &Self) -> SceneFilter {
        SceneFilter {
            spatial_filter: SpatialFilter::Mbr {
                lower_left: self.bounding_box.lower_left,
                upper_right: self.bounding_box.upper_right,
            },
            acquisition_filter: AcquisitionFilter {
                start: self.acquisition.start,
                end: self.acquisition.end,
            },
            cloud_cover_filter: CloudCoverFilter {
                min: self.cloud_cover.min,
                max: self.cloud_cover.max,
                include_unknown: self.cloud_cover.include_unknown,
            },
        }
    }
}
