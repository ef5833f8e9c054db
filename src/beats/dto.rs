use serde::Deserialize;

pub const PAGE_SIZE: i64 = 10;
const MAX_TRENDING: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct TrendingQuery {
    #[serde(default = "default_trending_limit")]
    pub limit: i64,
}
fn default_trending_limit() -> i64 {
    6
}

impl TrendingQuery {
    pub fn clamped_limit(&self) -> i64 {
        self.limit.clamp(1, MAX_TRENDING)
    }
}

/// Feed filters. List parameters come from repeated query keys
/// (`?moods=sad&moods=happy`).
#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    pub bpm: Option<i32>,
    pub lowest_price: Option<i32>,
    pub highest_price: Option<i32>,
    #[serde(default)]
    pub moods: Vec<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}
fn default_page() -> i64 {
    1
}

impl FeedQuery {
    /// Row offset of the requested page; `None` below page 1 or past `i64`.
    pub fn offset(&self) -> Option<i64> {
        if self.page < 1 {
            return None;
        }
        (self.page - 1).checked_mul(PAGE_SIZE)
    }
}
