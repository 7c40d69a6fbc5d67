//! Continuation-token pagination
//!
//! Walks a paged list endpoint into a single collection. The aggregator is
//! runtime-agnostic: it only awaits the futures handed back by a
//! [`PageFetcher`], one page at a time, so results arrive in page order.

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One page of a list response.
///
/// Mirrors the `{ "ContinuationToken": ..., "Items": [...] }` envelope every
/// Service Fabric list endpoint returns.
///
/// Missing fields deserialize to `None` without any `T: Default` bound.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Page<T> {
    #[serde(rename = "Items")]
    pub items: Option<Vec<T>>,
    #[serde(rename = "ContinuationToken")]
    pub continuation_token: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, continuation_token: Option<&str>) -> Self {
        Page {
            items: Some(items),
            continuation_token: continuation_token.map(str::to_string),
        }
    }

    /// Final page with the given items.
    pub fn last(items: Vec<T>) -> Self {
        Page::new(items, None)
    }

    /// Token for the following page, `None` when this is the last one.
    ///
    /// An empty token is the same as a missing one.
    pub fn next_token(&self) -> Option<&str> {
        self.continuation_token
            .as_deref()
            .filter(|token| !token.is_empty())
    }
}

/// Error raised when a page fetch fails. `page` is 1-based.
#[derive(Debug, Error)]
#[error("failed to fetch page {page}: {source}")]
pub struct PaginationError<E> {
    pub page: usize,
    #[source]
    pub source: E,
}

/// Source of pages for [`aggregate`].
///
/// Any `FnMut(Option<String>) -> impl Future<Output = Result<Page<T>, E>>`
/// closure is a fetcher, which is how the CLI wires its HTTP client in.
pub trait PageFetcher<T> {
    type Error;

    fn fetch_page(
        &mut self,
        token: Option<String>,
    ) -> impl Future<Output = Result<Page<T>, Self::Error>>;
}

impl<T, E, F, Fut> PageFetcher<T> for F
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, E>>,
{
    type Error = E;

    fn fetch_page(
        &mut self,
        token: Option<String>,
    ) -> impl Future<Output = Result<Page<T>, Self::Error>> {
        self(token)
    }
}

/// Fetch every page and concatenate the items in arrival order.
///
/// The first failing fetch aborts the walk; items gathered from earlier pages
/// are dropped, never returned as a partial result. There is no iteration
/// cap: a fetcher that keeps handing out tokens keeps the loop alive.
pub async fn aggregate<T, P>(mut fetcher: P) -> Result<Vec<T>, PaginationError<P::Error>>
where
    P: PageFetcher<T>,
{
    let mut token: Option<String> = None;
    let mut page = 0;
    let mut result = Vec::new();

    loop {
        page += 1;

        let fetched = fetcher
            .fetch_page(token.take())
            .await
            .map_err(|source| PaginationError { page, source })?;

        token = fetched.next_token().map(str::to_string);

        match fetched.items {
            Some(items) if !items.is_empty() => {
                log::debug!("fetched page {}: {} items", page, items.len());
                result.extend(items);
            }
            _ => log::trace!("page {} contained no items", page),
        }

        if token.is_none() {
            break;
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    #[derive(Debug, Error, PartialEq)]
    #[error("boom")]
    struct Boom;

    /// Replays canned pages and records the token passed to every call.
    struct Scripted<T> {
        pages: VecDeque<Result<Page<T>, Boom>>,
        calls: Calls,
    }

    type Calls = Rc<RefCell<Vec<Option<String>>>>;

    fn scripted<T>(pages: Vec<Result<Page<T>, Boom>>) -> (Scripted<T>, Calls) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let fetcher = Scripted {
            pages: pages.into(),
            calls: Rc::clone(&calls),
        };
        (fetcher, calls)
    }

    impl<T> PageFetcher<T> for Scripted<T> {
        type Error = Boom;

        async fn fetch_page(&mut self, token: Option<String>) -> Result<Page<T>, Boom> {
            self.calls.borrow_mut().push(token);
            self.pages.pop_front().unwrap_or(Ok(Page {
                items: None,
                continuation_token: None,
            }))
        }
    }

    #[test]
    fn test_aggregate_concatenates_pages_in_order() {
        let (fetcher, calls) = scripted(vec![
            Ok(Page::new(vec![1], Some("a"))),
            Ok(Page::new(vec![2], Some("b"))),
            Ok(Page::last(vec![3])),
        ]);

        let result = block_on(aggregate(fetcher)).unwrap();

        assert_eq!(result, vec![1, 2, 3]);
        assert_eq!(
            *calls.borrow(),
            vec![None, Some("a".to_string()), Some("b".to_string())]
        );
    }

    #[test]
    fn test_aggregate_preserves_order_within_page() {
        let (fetcher, _calls) = scripted(vec![
            Ok(Page::new(vec!["c", "a"], Some("t"))),
            Ok(Page::last(vec!["b", "a"])),
        ]);

        let result = block_on(aggregate(fetcher)).unwrap();

        // No deduplication either.
        assert_eq!(result, vec!["c", "a", "b", "a"]);
    }

    #[test]
    fn test_aggregate_empty_first_page() {
        let (fetcher, calls) = scripted::<u32>(vec![Ok(Page::last(vec![]))]);

        let result = block_on(aggregate(fetcher)).unwrap();

        assert!(result.is_empty());
        assert_eq!(calls.borrow().len(), 1);
    }

    #[test]
    fn test_aggregate_absent_items_treated_as_empty() {
        let (fetcher, calls) = scripted(vec![
            Ok(Page {
                items: None,
                continuation_token: Some("next".to_string()),
            }),
            Ok(Page::last(vec![7])),
        ]);

        let result = block_on(aggregate(fetcher)).unwrap();

        assert_eq!(result, vec![7]);
        assert_eq!(calls.borrow().len(), 2);
    }

    #[test]
    fn test_aggregate_empty_token_terminates() {
        let (fetcher, calls) = scripted(vec![
            Ok(Page::new(vec![1], Some(""))),
            Ok(Page::last(vec![2])),
        ]);

        let result = block_on(aggregate(fetcher)).unwrap();

        assert_eq!(result, vec![1]);
        assert_eq!(calls.borrow().len(), 1);
    }

    #[test]
    fn test_aggregate_fails_fast_with_page_index() {
        let (fetcher, calls) = scripted(vec![
            Ok(Page::new(vec![1, 2], Some("a"))),
            Err(Boom),
            Ok(Page::last(vec![3])),
        ]);

        let err = block_on(aggregate(fetcher)).unwrap_err();

        assert_eq!(err.page, 2);
        assert_eq!(err.source, Boom);
        assert!(err.to_string().contains("page 2"));
        assert_eq!(calls.borrow().len(), 2);
    }

    #[test]
    fn test_aggregate_failure_on_first_page() {
        let (fetcher, _calls) = scripted::<u32>(vec![Err(Boom)]);

        let err = block_on(aggregate(fetcher)).unwrap_err();

        assert_eq!(err.page, 1);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_aggregate_accepts_async_closure() {
        let calls = RefCell::new(0usize);

        let fetch = |token: Option<String>| {
            *calls.borrow_mut() += 1;
            async move {
                Ok::<_, Boom>(match token.as_deref() {
                    None => Page::new(vec!["first"], Some("2")),
                    Some(_) => Page::last(vec!["second"]),
                })
            }
        };

        let result = block_on(aggregate(fetch)).unwrap();

        assert_eq!(result, vec!["first", "second"]);
        assert_eq!(*calls.borrow(), 2);
    }

    #[test]
    fn test_page_deserializes_service_fabric_envelope() {
        let json = r#"{"ContinuationToken": "", "Items": [{"Name": "n1"}]}"#;
        let page: Page<serde_json::Value> = serde_json::from_str(json).unwrap();

        assert_eq!(page.items.as_ref().map(Vec::len), Some(1));
        assert_eq!(page.next_token(), None);
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Entry {
        #[serde(rename = "Name")]
        name: String,
    }

    #[test]
    fn test_page_deserializes_items_without_default() {
        // `Entry` has no `Default` impl, like the REST descriptors.
        let json = r#"{"ContinuationToken": "n1", "Items": [{"Name": "_Node_0"}]}"#;
        let page: Page<Entry> = serde_json::from_str(json).unwrap();

        assert_eq!(
            page.items,
            Some(vec![Entry {
                name: "_Node_0".to_string()
            }])
        );
        assert_eq!(page.next_token(), Some("n1"));

        let bare: Page<Entry> = serde_json::from_str("{}").unwrap();
        assert!(bare.items.is_none());
    }

    #[test]
    fn test_page_deserializes_missing_fields() {
        let page: Page<serde_json::Value> = serde_json::from_str("{}").unwrap();

        assert!(page.items.is_none());
        assert!(page.continuation_token.is_none());
    }
}
