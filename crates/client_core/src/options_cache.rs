use std::{collections::BTreeSet, sync::Arc};

use anyhow::{Context, Result};
use storage::KeyValueStore;
use tracing::warn;

pub const CAR_TYPES_KEY: &str = "carTypes";
pub const CAR_TAGS_KEY: &str = "carTags";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    pub car_types: BTreeSet<String>,
    pub tags: BTreeSet<String>,
}

impl Vocabulary {
    pub fn new<T, G>(car_types: T, tags: G) -> Self
    where
        T: IntoIterator<Item = String>,
        G: IntoIterator<Item = String>,
    {
        Self {
            car_types: car_types.into_iter().collect(),
            tags: tags.into_iter().collect(),
        }
    }
}

#[derive(Clone)]
pub struct OptionsCache {
    store: Arc<dyn KeyValueStore>,
}

impl OptionsCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Cached vocabulary, or `None` when neither key holds a readable set.
    pub async fn load(&self) -> Option<Vocabulary> {
        let car_types = self.read_set(CAR_TYPES_KEY).await;
        let tags = self.read_set(CAR_TAGS_KEY).await;
        if car_types.is_none() && tags.is_none() {
            return None;
        }
        Some(Vocabulary {
            car_types: car_types.unwrap_or_default(),
            tags: tags.unwrap_or_default(),
        })
    }

    pub async fn save(&self, vocabulary: &Vocabulary) -> Result<()> {
        self.write_set(CAR_TYPES_KEY, &vocabulary.car_types).await?;
        self.write_set(CAR_TAGS_KEY, &vocabulary.tags).await
    }

    async fn read_set(&self, key: &str) -> Option<BTreeSet<String>> {
        let raw = match self.store.read(key).await {
            Ok(raw) => raw?,
            Err(err) => {
                warn!(key, "options cache: read failed: {err:#}");
                return None;
            }
        };
        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(values) => Some(values.into_iter().collect()),
            Err(err) => {
                warn!(key, "options cache: ignoring unreadable entry: {err}");
                None
            }
        }
    }

    async fn write_set(&self, key: &str, values: &BTreeSet<String>) -> Result<()> {
        let raw = serde_json::to_string(values)
            .with_context(|| format!("failed to encode cache entry '{key}'"))?;
        self.store.write(key, &raw).await
    }
}
