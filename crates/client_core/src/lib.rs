pub mod api;
pub mod debounce;
pub mod error;
pub mod form;
pub mod options_cache;
mod session;
pub mod state;

use shared::domain::Car;

pub use api::{CarApi, HttpCarApi};
pub use error::{ApiFailure, FormErrors, FormField, SubmitError};
pub use form::CarForm;
pub use options_cache::{OptionsCache, Vocabulary};
pub use session::{CatalogSession, FetchTicket, MountHandle, SessionOptions};
pub use state::{FetchStatus, PendingDelete, QueryState, ResultState, SessionSnapshot, View};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeSource {
    ListFetch,
    Vocabulary,
    Details,
    Create,
    Update,
    Delete,
}

impl NoticeSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ListFetch => "list_fetch",
            Self::Vocabulary => "vocabulary",
            Self::Details => "details",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// One non-blocking notification per network failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub source: NoticeSource,
    pub message: String,
    pub failure: ApiFailure,
}

impl Notice {
    pub fn from_failure(source: NoticeSource, failure: &ApiFailure) -> Self {
        Self {
            source,
            message: failure.to_string(),
            failure: failure.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    QueryChanged(QueryState),
    ResultsChanged(ResultState),
    VocabularyChanged(Vocabulary),
    ViewChanged(View),
    DetailsChanged(Option<Car>),
    DeletePromptChanged(Option<PendingDelete>),
    Notice(Notice),
}
