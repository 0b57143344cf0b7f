use serde::{Deserialize, Serialize};

use crate::domain::{SortBy, SortOptions, SortOrder};

pub const CARS_PATH: &str = "api/cars";
pub const CAR_TYPES_PATH: &str = "api/cars/types";
pub const CAR_TAGS_PATH: &str = "api/cars/tags";
pub const RESET_PATH: &str = "api/cars/reset";

/// Filter half of the list query. Empty values mean "unfiltered".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub search: String,
    pub car_type: Option<String>,
    pub tags: Vec<String>,
}

/// Query string for `GET /api/cars`.
///
/// Absent or empty filters are omitted from the encoded form rather than sent
/// as empty values; `tags` travels as one comma-joined parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarListQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub car_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<SortBy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
}

impl CarListQuery {
    pub fn new(filters: &FilterOptions, sort: SortOptions) -> Self {
        Self {
            search: non_empty(&filters.search),
            car_type: filters.car_type.as_deref().and_then(non_empty),
            tags: (!filters.tags.is_empty()).then(|| filters.tags.join(",")),
            sort_by: Some(sort.sort_by),
            sort_order: Some(sort.sort_order),
        }
    }

    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .as_deref()
            .map(|tags| {
                tags.split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Parameters in wire order, for logging and for transports that do not
    /// go through serde.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(car_type) = &self.car_type {
            pairs.push(("carType", car_type.clone()));
        }
        if let Some(tags) = &self.tags {
            pairs.push(("tags", tags.clone()));
        }
        if let Some(sort_by) = self.sort_by {
            pairs.push(("sortBy", sort_by.as_param().to_string()));
        }
        if let Some(sort_order) = self.sort_order {
            pairs.push(("sortOrder", sort_order.as_param().to_string()));
        }
        pairs
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}
