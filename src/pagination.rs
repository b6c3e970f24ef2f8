//! Linked-page pagination
//!
//! List endpoints return a batch of items plus an optional `next` link.
//! [`Pager`] follows those links until the service runs out of results.
//!
//! A page counts as empty when the service answered `204 No Content` or the
//! page carries no items. An empty page ends the walk even if it still has a
//! `next` link.

use crate::cancel::CancelToken;
use crate::error::{BoxError, Error, Result};
use crate::mistral::client::{RequestOpts, ServiceClient};
use crate::mistral::http::HttpResponse;
use futures::Stream;
use reqwest::Method;
use std::marker::PhantomData;
use url::Url;

/// One page of a list response, implemented per entity type
pub trait Page: Sized {
    type Item;

    fn from_response(response: HttpResponse) -> std::result::Result<Self, BoxError>;

    fn is_empty(&self) -> bool;

    /// Link to the following page, if the service sent one
    fn next_page_url(&self) -> Option<&str>;

    fn into_items(self) -> Vec<Self::Item>;
}

/// Walks linked pages starting from a URL.
///
/// Consumed by the walking methods; start over with a new `Pager`.
pub struct Pager<P> {
    client: ServiceClient,
    operation: &'static str,
    next: Option<Url>,
    pages_fetched: usize,
    _page: PhantomData<fn() -> P>,
}

impl<P> std::fmt::Debug for Pager<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pager")
            .field("operation", &self.operation)
            .field("next", &self.next.as_ref().map(Url::as_str))
            .field("pages_fetched", &self.pages_fetched)
            .finish()
    }
}

impl<P: Page> Pager<P> {
    pub fn new(client: ServiceClient, operation: &'static str, url: Url) -> Self {
        Self {
            client,
            operation,
            next: Some(url),
            pages_fetched: 0,
            _page: PhantomData,
        }
    }

    /// URL of the next request, `None` once exhausted
    pub fn url(&self) -> Option<&Url> {
        self.next.as_ref()
    }

    /// Number of HTTP requests issued so far, empty pages included
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Fetch the next non-empty page
    pub async fn next_page(&mut self, cancel: &CancelToken) -> Result<Option<P>> {
        let Some(url) = self.next.take() else {
            return Ok(None);
        };

        let response = self
            .client
            .request(cancel, self.operation, Method::GET, url.clone(), RequestOpts::json())
            .await?;
        self.pages_fetched += 1;

        let page = P::from_response(response).map_err(|e| Error::decode(self.operation, e))?;

        if page.is_empty() {
            tracing::trace!("{}: empty page at {}, stopping", self.operation, url);
            return Ok(None);
        }

        if let Some(link) = page.next_page_url().filter(|link| !link.is_empty()) {
            let next = self
                .client
                .resolve(link)
                .map_err(|e| Error::decode(self.operation, e))?;
            if next == url {
                tracing::trace!("{}: next link points back at {}, stopping", self.operation, url);
            } else {
                self.next = Some(next);
            }
        }

        tracing::debug!(
            "{}: fetched page {} (more: {})",
            self.operation,
            self.pages_fetched,
            self.next.is_some()
        );

        Ok(Some(page))
    }

    /// Hand every page to `callback` until it returns `Ok(false)`, fails, or
    /// the pages run out. Pages already delivered stay delivered on error.
    pub async fn each_page<F>(mut self, cancel: &CancelToken, mut callback: F) -> Result<()>
    where
        F: FnMut(P) -> Result<bool>,
    {
        while let Some(page) = self.next_page(cancel).await? {
            if !callback(page)? {
                tracing::trace!("{}: stopped by caller", self.operation);
                break;
            }
        }
        Ok(())
    }

    /// Collect every item of every page, in server order
    pub async fn all_pages(self, cancel: &CancelToken) -> Result<Vec<P::Item>> {
        let mut items = Vec::new();
        self.each_page(cancel, |page| {
            items.extend(page.into_items());
            Ok(true)
        })
        .await?;
        Ok(items)
    }

    /// Lazy stream of item batches, one per non-empty page
    pub fn into_stream(self, cancel: CancelToken) -> impl Stream<Item = Result<Vec<P::Item>>> {
        futures::stream::try_unfold((self, cancel), |(mut pager, cancel)| async move {
            let page = pager.next_page(&cancel).await?;
            Ok::<_, Error>(page.map(|page| (page.into_items(), (pager, cancel))))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mistral::auth::StaticToken;
    use crate::mistral::http::{HttpRequest, Transport};
    use async_trait::async_trait;
    use futures::TryStreamExt;
    use reqwest::header::HeaderMap;
    use reqwest::StatusCode;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// Numbers page used to exercise the walker without a real entity type
    struct NumberPage {
        numbers: Vec<u32>,
        next: Option<String>,
    }

    impl Page for NumberPage {
        type Item = u32;

        fn from_response(response: HttpResponse) -> std::result::Result<Self, BoxError> {
            if response.status == StatusCode::NO_CONTENT {
                return Ok(Self {
                    numbers: Vec::new(),
                    next: None,
                });
            }
            let value: serde_json::Value = serde_json::from_slice(&response.body)?;
            let numbers = serde_json::from_value(value["numbers"].clone())?;
            let next = value["next"].as_str().map(str::to_string);
            Ok(Self { numbers, next })
        }

        fn is_empty(&self) -> bool {
            self.numbers.is_empty()
        }

        fn next_page_url(&self) -> Option<&str> {
            self.next.as_deref()
        }

        fn into_items(self) -> Vec<u32> {
            self.numbers
        }
    }

    /// Serves canned responses keyed by URL and records what was asked
    #[derive(Default)]
    struct CannedTransport {
        responses: HashMap<String, (StatusCode, String)>,
        requested: Mutex<Vec<String>>,
    }

    impl CannedTransport {
        fn with(mut self, url: &str, status: StatusCode, body: &str) -> Self {
            self.responses
                .insert(url.to_string(), (status, body.to_string()));
            self
        }
    }

    #[async_trait]
    impl Transport for CannedTransport {
        async fn send(&self, request: HttpRequest) -> std::result::Result<HttpResponse, BoxError> {
            let url = request.url.to_string();
            self.requested.lock().unwrap().push(url.clone());
            let (status, body) = self
                .responses
                .get(&url)
                .cloned()
                .unwrap_or((StatusCode::NOT_FOUND, String::new()));
            Ok(HttpResponse {
                status,
                headers: HeaderMap::new(),
                body: body.into_bytes(),
            })
        }
    }

    const BASE: &str = "http://mistral.test/v2/";

    fn pager(transport: Arc<CannedTransport>) -> Pager<NumberPage> {
        let client =
            ServiceClient::new(BASE, Arc::new(StaticToken::new("token")), transport).unwrap();
        let url = client.service_url(&["numbers"]).unwrap();
        Pager::new(client, "list numbers", url)
    }

    fn three_pages() -> CannedTransport {
        CannedTransport::default()
            .with(
                "http://mistral.test/v2/numbers",
                StatusCode::OK,
                r#"{"numbers": [1, 2], "next": "numbers?marker=2"}"#,
            )
            .with(
                "http://mistral.test/v2/numbers?marker=2",
                StatusCode::OK,
                r#"{"numbers": [3], "next": "http://mistral.test/v2/numbers?marker=3"}"#,
            )
            .with(
                "http://mistral.test/v2/numbers?marker=3",
                StatusCode::OK,
                r#"{"numbers": []}"#,
            )
    }

    #[tokio::test]
    async fn test_all_pages_preserves_order() {
        let transport = Arc::new(three_pages());
        let items = pager(transport.clone())
            .all_pages(&CancelToken::new())
            .await
            .unwrap();

        assert_eq!(items, vec![1, 2, 3]);
        assert_eq!(transport.requested.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_empty_page_stops_despite_next_link() {
        let transport = Arc::new(
            CannedTransport::default()
                .with(
                    "http://mistral.test/v2/numbers",
                    StatusCode::OK,
                    r#"{"numbers": [], "next": "numbers?marker=9"}"#,
                ),
        );
        let mut pager = pager(transport.clone());
        assert!(pager.next_page(&CancelToken::new()).await.unwrap().is_none());
        assert_eq!(pager.pages_fetched(), 1);
        assert!(pager.url().is_none());
    }

    #[tokio::test]
    async fn test_no_content_is_empty() {
        let transport = Arc::new(CannedTransport::default().with(
            "http://mistral.test/v2/numbers",
            StatusCode::NO_CONTENT,
            "",
        ));
        let items = pager(transport).all_pages(&CancelToken::new()).await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_callback_can_stop_early() {
        let transport = Arc::new(three_pages());
        let mut seen = Vec::new();
        pager(transport.clone())
            .each_page(&CancelToken::new(), |page| {
                seen.extend(page.into_items());
                Ok(false)
            })
            .await
            .unwrap();

        assert_eq!(seen, vec![1, 2]);
        assert_eq!(transport.requested.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_callback_error_propagates_after_delivery() {
        let transport = Arc::new(three_pages());
        let mut delivered = 0;
        let err = pager(transport)
            .each_page(&CancelToken::new(), |_| {
                delivered += 1;
                if delivered == 2 {
                    return Err(Error::encoding("test", "stop here"));
                }
                Ok(true)
            })
            .await
            .unwrap_err();

        assert_eq!(delivered, 2);
        assert!(matches!(err, Error::Encoding { field: "test", .. }));
    }

    #[tokio::test]
    async fn test_api_error_mid_walk() {
        // Second page is missing from the canned set and answers 404
        let transport = Arc::new(CannedTransport::default().with(
            "http://mistral.test/v2/numbers",
            StatusCode::OK,
            r#"{"numbers": [1], "next": "numbers?marker=1"}"#,
        ));
        let mut pages = 0;
        let err = pager(transport)
            .each_page(&CancelToken::new(), |_| {
                pages += 1;
                Ok(true)
            })
            .await
            .unwrap_err();

        assert_eq!(pages, 1);
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    }

    #[tokio::test]
    async fn test_self_referencing_next_link_stops() {
        let transport = Arc::new(CannedTransport::default().with(
            "http://mistral.test/v2/numbers",
            StatusCode::OK,
            r#"{"numbers": [7], "next": "numbers"}"#,
        ));
        let items = pager(transport.clone())
            .all_pages(&CancelToken::new())
            .await
            .unwrap();
        assert_eq!(items, vec![7]);
        assert_eq!(transport.requested.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_page_is_decode_error() {
        let transport = Arc::new(CannedTransport::default().with(
            "http://mistral.test/v2/numbers",
            StatusCode::OK,
            "not json",
        ));
        let err = pager(transport)
            .all_pages(&CancelToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Decode { operation: "list numbers", .. }));
    }

    #[tokio::test]
    async fn test_stream_yields_batches() {
        let transport = Arc::new(three_pages());
        let batches: Vec<Vec<u32>> = pager(transport)
            .into_stream(CancelToken::new())
            .try_collect()
            .await
            .unwrap();
        assert_eq!(batches, vec![vec![1, 2], vec![3]]);
    }

    #[tokio::test]
    async fn test_cancelled_walk_sends_nothing() {
        let transport = Arc::new(three_pages());
        let cancel = CancelToken::new();
        cancel.cancel();

        let err = pager(transport.clone()).all_pages(&cancel).await.unwrap_err();
        assert!(err.is_cancelled());
        assert!(transport.requested.lock().unwrap().is_empty());
    }
}
