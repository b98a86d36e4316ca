//! Paged search results and a lazy stream over them.
//!
//! Search endpoints (user search, activity logs, sessions, queries) answer
//! with one page at a time. [`SearchPage`] is a single page;
//! [`PaginatedStream`] walks every page, fetching the next one only when the
//! current one is exhausted.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::Stream;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ClientInner;
use crate::{Error, Result};

/// Default number of rows per page.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// One page of search results. Pages are numbered from 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage<T> {
    /// Rows matching the search across all pages
    #[serde(default)]
    pub total_rows: u64,
    /// This page's number
    #[serde(default = "first_page")]
    pub page: u32,
    /// Page size used by the server
    #[serde(default)]
    pub per_page: u32,
    /// Rows on this page
    #[serde(default = "Vec::new")]
    pub rows: Vec<T>,
}

fn first_page() -> u32 {
    1
}

impl<T> SearchPage<T> {
    /// Number of pages needed for all rows.
    ///
    /// ```
    /// use adminpanel_rs::SearchPage;
    ///
    /// let page: SearchPage<u32> = SearchPage { total_rows: 101, page: 1, per_page: 50, rows: vec![] };
    /// assert_eq!(page.total_pages(), 3);
    /// assert_eq!(page.next_page(), Some(2));
    /// ```
    pub fn total_pages(&self) -> u32 {
        if self.per_page == 0 {
            return 1;
        }
        let pages = self.total_rows.div_ceil(u64::from(self.per_page));
        u32::try_from(pages).unwrap_or(u32::MAX).max(1)
    }

    /// Check if there are more pages after this one.
    pub fn has_more(&self) -> bool {
        self.page < self.total_pages()
    }

    /// Number of the next page, if any.
    pub fn next_page(&self) -> Option<u32> {
        self.has_more().then(|| self.page + 1)
    }
}

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
type FetchPage<T> = Box<dyn Fn(u32) -> BoxFuture<'static, Result<SearchPage<T>>> + Send + Sync>;

/// A stream yielding every row of a paged search.
///
/// # Example
///
/// ```no_run
/// use futures_util::StreamExt;
/// use adminpanel_rs::api::UserSearchQuery;
///
/// # async fn example(client: adminpanel_rs::AdminClient) -> adminpanel_rs::Result<()> {
/// let mut users = client.users().search_stream(UserSearchQuery::default());
/// while let Some(user) = users.next().await {
///     println!("{}", user?.username);
/// }
/// # Ok(())
/// # }
/// ```
pub struct PaginatedStream<T> {
    fetch_page: FetchPage<T>,
    buffered: VecDeque<T>,
    next_page: Option<u32>,
    requested_page: u32,
    pending_fetch: Option<BoxFuture<'static, Result<SearchPage<T>>>>,
}

impl<T> PaginatedStream<T>
where
    T: DeserializeOwned + Send + 'static,
{
    /// Create a stream from a page fetcher, starting at page 1.
    pub fn new<F>(fetch_page: F) -> Self
    where
        F: Fn(u32) -> BoxFuture<'static, Result<SearchPage<T>>> + Send + Sync + 'static,
    {
        Self {
            fetch_page: Box::new(fetch_page),
            buffered: VecDeque::new(),
            next_page: Some(1),
            requested_page: 0,
            pending_fetch: None,
        }
    }

    /// A stream that yields `error` once and ends.
    pub(crate) fn failed(error: Error) -> Self {
        let mut stream = Self::new(|page| {
            Box::pin(async move {
                Ok(SearchPage {
                    total_rows: 0,
                    page,
                    per_page: 0,
                    rows: Vec::new(),
                })
            })
        });
        stream.next_page = None;
        stream.pending_fetch = Some(Box::pin(async move { Err(error) }));
        stream
    }
}

impl<T> Stream for PaginatedStream<T> {
    type Item = Result<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;

        loop {
            if let Some(row) = this.buffered.pop_front() {
                return Poll::Ready(Some(Ok(row)));
            }

            if let Some(fut) = this.pending_fetch.as_mut() {
                match fut.as_mut().poll(cx) {
                    Poll::Ready(Ok(page)) => {
                        this.pending_fetch = None;
                        // The page echoed by the server is not trusted for paging.
                        let requested = this.requested_page;
                        this.next_page =
                            (requested < page.total_pages()).then(|| requested + 1);
                        if page.rows.is_empty() {
                            return Poll::Ready(None);
                        }
                        this.buffered = page.rows.into();
                        continue;
                    }
                    Poll::Ready(Err(e)) => {
                        this.pending_fetch = None;
                        this.next_page = None;
                        return Poll::Ready(Some(Err(e)));
                    }
                    Poll::Pending => return Poll::Pending,
                }
            }

            match this.next_page.take() {
                Some(page) => {
                    this.requested_page = page;
                    this.pending_fetch = Some((this.fetch_page)(page));
                }
                None => return Poll::Ready(None),
            }
        }
    }
}

impl<T> Unpin for PaginatedStream<T> {}

/// Builds a [`PaginatedStream`] over a search endpoint.
pub(crate) struct PaginatedStreamBuilder<T> {
    inner: Arc<ClientInner>,
    path: String,
    result_key: String,
    per_page: u32,
    _marker: std::marker::PhantomData<T>,
}

impl<T: DeserializeOwned + Send + 'static> PaginatedStreamBuilder<T> {
    pub(crate) fn new(
        inner: Arc<ClientInner>,
        path: impl Into<String>,
        result_key: impl Into<String>,
    ) -> Self {
        Self {
            inner,
            path: path.into(),
            result_key: result_key.into(),
            per_page: DEFAULT_PAGE_SIZE,
            _marker: std::marker::PhantomData,
        }
    }

    pub(crate) fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.max(1);
        self
    }

    /// Build the stream; `page` and `perPage` are merged into `query`.
    pub(crate) fn build_with_query<Q: Serialize>(self, query: &Q) -> PaginatedStream<T> {
        let Self {
            inner,
            path,
            result_key,
            per_page,
            ..
        } = self;
        let base = serde_json::to_value(query).map_err(Error::from);

        PaginatedStream::new(move |page: u32| {
            let inner = inner.clone();
            let path = path.clone();
            let result_key = result_key.clone();
            let payload = match &base {
                Ok(Value::Object(map)) => {
                    let mut map = map.clone();
                    map.insert("page".to_string(), Value::from(page));
                    map.insert("perPage".to_string(), Value::from(per_page));
                    Ok(Value::Object(map))
                }
                Ok(_) => Err(Error::InvalidInput(
                    "Search query must serialize to an object".to_string(),
                )),
                Err(e) => Err(Error::InvalidInput(e.to_string())),
            };

            Box::pin(async move {
                inner
                    .get_field::<SearchPage<T>, _>(&path, &payload?, &result_key)
                    .await
            })
        })
    }
}
