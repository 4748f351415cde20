use std::future::Future;
use std::pin::Pin;

use super::direction::FetchDirection;
use super::page::Page;

/// Future returned by [`PageSource::fetch_page`]. Runs on the UI thread, so it need not be `Send`.
pub type PageFuture<T, C, E> = Pin<Box<dyn Future<Output = Result<Page<T, C>, E>> + 'static>>;

/// The data source a controller pages through.
///
/// `cursor` is `None` only for the initial fetch when no initial cursor is
/// configured. Retries and timeouts are the source's business.
pub trait PageSource: 'static {
    type Item: 'static;
    type Cursor: Clone + PartialEq + std::fmt::Debug + 'static;
    type Error: std::error::Error + 'static;

    fn fetch_page(
        &self,
        direction: FetchDirection,
        cursor: Option<&Self::Cursor>,
    ) -> PageFuture<Self::Item, Self::Cursor, Self::Error>;
}
