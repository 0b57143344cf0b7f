use shared::{
    domain::{Car, CarId, CarListItem, SortBy, SortOptions, SortOrder, SortPreset},
    protocol::{CarListQuery, FilterOptions},
};

use crate::{error::ApiFailure, options_cache::Vocabulary};

/// Combined search, filter and sort parameters driving the list fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryState {
    pub search: String,
    pub car_type: Option<String>,
    pub tags: Vec<String>,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
}

impl QueryState {
    pub fn with_search(&self, search: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            ..self.clone()
        }
    }

    pub fn with_type_and_tags(&self, car_type: Option<String>, tags: Vec<String>) -> Self {
        Self {
            car_type: car_type.filter(|value| !value.is_empty()),
            tags,
            ..self.clone()
        }
    }

    pub fn with_sort(&self, sort_by: SortBy, sort_order: SortOrder) -> Self {
        Self {
            sort_by,
            sort_order,
            ..self.clone()
        }
    }

    pub fn sort(&self) -> SortOptions {
        SortOptions {
            sort_by: self.sort_by,
            sort_order: self.sort_order,
        }
    }

    pub fn sort_preset(&self) -> SortPreset {
        SortPreset::from_options(self.sort())
    }

    pub fn filters(&self) -> FilterOptions {
        FilterOptions {
            search: self.search.clone(),
            car_type: self.car_type.clone(),
            tags: self.tags.clone(),
        }
    }

    pub fn has_active_filters(&self) -> bool {
        !self.search.is_empty() || self.car_type.is_some() || !self.tags.is_empty()
    }

    pub fn to_list_query(&self) -> CarListQuery {
        CarListQuery::new(&self.filters(), self.sort())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchStatus {
    #[default]
    Loading,
    Ready,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultState {
    pub items: Vec<CarListItem>,
    pub status: FetchStatus,
    pub error_message: Option<String>,
}

impl ResultState {
    pub(crate) fn begin_loading(&mut self) {
        self.status = FetchStatus::Loading;
    }

    pub(crate) fn commit_items(&mut self, items: Vec<CarListItem>) {
        self.items = items;
        self.status = FetchStatus::Ready;
        self.error_message = None;
    }

    pub(crate) fn commit_failure(&mut self, failure: &ApiFailure) {
        self.status = FetchStatus::Error;
        self.error_message = Some(failure.to_string());
    }

    pub fn is_empty_result(&self) -> bool {
        self.status == FetchStatus::Ready && self.items.is_empty()
    }

    /// "1 Car Found" / "3 Cars Found".
    pub fn count_label(&self) -> String {
        let noun = if self.items.len() == 1 { "Car" } else { "Cars" };
        format!("{} {noun} Found", self.items.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    List,
    AddCar,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDelete {
    pub id: CarId,
    pub name: String,
}

impl PendingDelete {
    pub fn prompt(&self) -> String {
        format!("Delete {} ?", self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub query: QueryState,
    pub results: ResultState,
    pub vocabulary: Vocabulary,
    pub view: View,
    pub details: Option<Car>,
    pub pending_delete: Option<PendingDelete>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_query_is_unfiltered_name_ascending() {
        let query = QueryState::default();
        assert_eq!(query.search, "");
        assert_eq!(query.car_type, None);
        assert!(query.tags.is_empty());
        assert_eq!(query.sort_preset(), SortPreset::NameAscending);
        assert!(!query.has_active_filters());
    }

    #[test]
    fn transitions_touch_one_field_group() {
        let base = QueryState::default()
            .with_search("vw")
            .with_sort(SortBy::CreatedAt, SortOrder::Descending);

        let filtered = base.with_type_and_tags(Some("manual".into()), vec!["sport".into()]);
        assert_eq!(filtered.search, "vw");
        assert_eq!(filtered.sort_preset(), SortPreset::NewestFirst);
        assert_eq!(filtered.car_type.as_deref(), Some("manual"));

        let cleared = filtered.with_type_and_tags(Some(String::new()), Vec::new());
        assert_eq!(cleared.car_type, None);
        assert_eq!(cleared.search, "vw");
    }

    #[test]
    fn failure_keeps_previous_items() {
        let mut results = ResultState::default();
        results.commit_items(Vec::new());
        assert!(results.is_empty_result());

        results.begin_loading();
        results.commit_failure(&ApiFailure::NoResponse {
            detail: "connection refused".into(),
        });
        assert_eq!(results.status, FetchStatus::Error);
        assert_eq!(
            results.error_message.as_deref(),
            Some("No response received from the server.")
        );
        assert!(!results.is_empty_result());
    }
}
