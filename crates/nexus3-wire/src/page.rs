//! Cursor-paginated listing pages.

use serde::{Deserialize, Serialize};

/// One page of a paginated REST collection.
///
/// `continuation_token` being absent is the only end-of-collection signal;
/// a page can be empty and still have a successor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingPage<T> {
    /// Items in server order.
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,

    /// Cursor for the next page.
    #[serde(
        rename = "continuationToken",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub continuation_token: Option<String>,
}

impl<T> ListingPage<T> {
    pub fn new(items: Vec<T>, continuation_token: Option<String>) -> Self {
        Self {
            items,
            continuation_token,
        }
    }

    /// True when the server issued no cursor for a following page.
    pub fn is_last(&self) -> bool {
        self.continuation_token.is_none()
    }
}
