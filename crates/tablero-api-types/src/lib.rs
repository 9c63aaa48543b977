//! Wire types shared between the Tablero server and its API clients.

use serde::{Deserialize, Serialize};

/// Offset pagination metadata attached to every listing response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub current_page: u32,
    pub per_page: u32,
    pub total: u64,
    pub last_page: u32,
    /// 1-based index of the first item on this page, `None` when the page is empty.
    pub from: Option<u64>,
    /// 1-based index of the last item on this page, `None` when the page is empty.
    pub to: Option<u64>,
}

/// A single page of a resource listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

/// Body returned by `DELETE /api/{resource}/cache`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheClearResponse {
    pub resource: String,
    /// `tags` when only the resource's entries were evicted, `all` when the
    /// whole store was flushed.
    pub scope: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}
