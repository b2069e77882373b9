//! Paginated, filtered artifact listing
//!
//! The search endpoint returns results in pages chained by a continuation
//! token. [`search`] turns that into a single forward stream of
//! [`ArtifactRecord`]s, fetching each page only when the previous one has
//! been consumed.

use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};

use crate::error::{Error, Result};
use crate::path::{ComponentPath, REMOTE_SEPARATOR};
use crate::traits::{ArtifactRecord, NexusApi, SearchPage};

/// Repository plus the path filter applied to every listed artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub repository: String,
    pub path_filter: String,
    /// Prefix match when true, exact match otherwise
    pub partial_match: bool,
}

impl SearchQuery {
    /// Match everything in `repository`
    pub fn repository(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            path_filter: String::new(),
            partial_match: true,
        }
    }

    /// Derive the filter from a parsed component path
    ///
    /// A directory becomes a prefix filter ending with the separator; a
    /// filename turns the filter into an exact match on the full path.
    pub fn from_component_path(path: &ComponentPath) -> Self {
        let mut query = Self::repository(path.repository.clone());

        if let Some(directory) = &path.directory {
            query.path_filter.push_str(directory);
            if !(query.path_filter.is_empty() || query.path_filter.ends_with(REMOTE_SEPARATOR)) {
                query.path_filter.push(REMOTE_SEPARATOR);
            }
        }

        if let Some(filename) = &path.filename {
            query.partial_match = false;
            query.path_filter.push_str(filename);
        }

        query
    }

    /// Search keyword sent to the service, if any
    ///
    /// The service's keyword search is fuzzy; [`SearchQuery::matches`] is
    /// still applied to every returned item.
    pub fn keyword(&self) -> Option<String> {
        (!self.path_filter.is_empty()).then(|| self.path_filter.clone())
    }

    pub fn matches(&self, artifact_path: &str) -> bool {
        if self.path_filter.is_empty() {
            return true;
        }
        if self.partial_match {
            artifact_path.starts_with(&self.path_filter)
        } else {
            artifact_path == self.path_filter
        }
    }
}

enum PageCursor {
    /// A page already fetched but not yet yielded
    Ready(SearchPage),
    Next(String),
    Done,
}

impl PageCursor {
    fn after(page: &SearchPage) -> Self {
        match &page.continuation_token {
            Some(token) => PageCursor::Next(token.clone()),
            None => PageCursor::Done,
        }
    }
}

/// List the artifacts selected by `query`
///
/// The first page is requested before returning, so a missing repository
/// or bad credentials fail here rather than on the first poll. Following
/// pages are requested lazily. Items without a string `path` are dropped.
/// The stream is single-pass; calling `search` again starts over.
pub async fn search<'a>(
    api: &'a dyn NexusApi,
    query: &SearchQuery,
) -> Result<BoxStream<'a, Result<ArtifactRecord>>> {
    let repository = query.repository.clone();
    let keyword = query.keyword();

    tracing::debug!(repository = %repository, filter = %query.path_filter, "Searching assets");
    let first = api
        .search_assets(&repository, keyword.clone(), None)
        .await?;

    let pages = stream::try_unfold(PageCursor::Ready(first), move |cursor| {
        let repository = repository.clone();
        let keyword = keyword.clone();
        async move {
            let page = match cursor {
                PageCursor::Ready(page) => page,
                PageCursor::Next(token) => {
                    tracing::debug!(repository = %repository, "Fetching next search page");
                    api.search_assets(&repository, keyword, Some(token)).await?
                }
                PageCursor::Done => return Ok(None),
            };
            let next = PageCursor::after(&page);
            Ok::<_, Error>(Some((page.items, next)))
        }
    });

    let query = query.clone();
    let records = pages
        .map_ok(|items| stream::iter(items.into_iter().map(Ok::<_, Error>)))
        .try_flatten()
        .try_filter_map(move |item| {
            let record = ArtifactRecord::from_item(&item).filter(|record| query.matches(&record.path));
            futures::future::ready(Ok(record))
        });

    Ok(records.boxed())
}
