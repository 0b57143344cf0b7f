use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(CarId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortBy {
    #[default]
    #[serde(rename = "name")]
    Name,
    #[serde(rename = "createdAt")]
    CreatedAt,
}

impl SortBy {
    pub fn as_param(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::CreatedAt => "createdAt",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    #[serde(rename = "ASC")]
    Ascending,
    #[serde(rename = "DESC")]
    Descending,
}

impl SortOrder {
    pub fn as_param(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortOptions {
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
}

/// The sort choices offered in the sort dropdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortPreset {
    NameAscending,
    NameDescending,
    NewestFirst,
    OldestFirst,
}

impl SortPreset {
    pub const ALL: [SortPreset; 4] = [
        SortPreset::NameAscending,
        SortPreset::NameDescending,
        SortPreset::NewestFirst,
        SortPreset::OldestFirst,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::NameAscending => "Sort by Name (A-Z)",
            Self::NameDescending => "Sort by Name (Z-A)",
            Self::NewestFirst => "Newest First",
            Self::OldestFirst => "Oldest First",
        }
    }

    pub fn options(self) -> SortOptions {
        let (sort_by, sort_order) = match self {
            Self::NameAscending => (SortBy::Name, SortOrder::Ascending),
            Self::NameDescending => (SortBy::Name, SortOrder::Descending),
            Self::NewestFirst => (SortBy::CreatedAt, SortOrder::Descending),
            Self::OldestFirst => (SortBy::CreatedAt, SortOrder::Ascending),
        };
        SortOptions {
            sort_by,
            sort_order,
        }
    }

    pub fn from_options(options: SortOptions) -> Self {
        match (options.sort_by, options.sort_order) {
            (SortBy::Name, SortOrder::Ascending) => Self::NameAscending,
            (SortBy::Name, SortOrder::Descending) => Self::NameDescending,
            (SortBy::CreatedAt, SortOrder::Descending) => Self::NewestFirst,
            (SortBy::CreatedAt, SortOrder::Ascending) => Self::OldestFirst,
        }
    }
}

/// Full car record as returned by `GET /api/cars/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    pub id: CarId,
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub car_type: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specifications: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
}

/// Abbreviated record shown in the list view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarListItem {
    pub id: CarId,
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub car_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl From<&Car> for CarListItem {
    fn from(car: &Car) -> Self {
        Self {
            id: car.id,
            name: car.name.clone(),
            description: car.description.clone(),
            image_url: car.image_url.clone(),
            car_type: car.car_type.clone(),
            created_at: Some(car.created_at),
            tags: Some(car.tags.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCar {
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub car_type: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub car_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}
