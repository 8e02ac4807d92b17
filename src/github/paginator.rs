use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::github::client::check_status;
use crate::github::rate_limiter::RateLimiter;

pub struct Paginator<'a> {
    client: &'a Client,
    rate_limiter: &'a RateLimiter,
}

impl<'a> Paginator<'a> {
    pub fn new(client: &'a Client, rate_limiter: &'a RateLimiter) -> Self {
        Self {
            client,
            rate_limiter,
        }
    }

    /// Fetches one page. The boolean is true when the Link header announces
    /// a next page; callers decide whether to keep going, so that filtering
    /// can happen between pages.
    pub async fn fetch_page<T: DeserializeOwned>(
        &self,
        base_url: &str,
        per_page: u32,
        page: u32,
    ) -> Result<(Vec<T>, bool)> {
        self.rate_limiter.wait().await;

        let separator = if base_url.contains('?') { "&" } else { "?" };
        let url = format!("{}{}per_page={}&page={}", base_url, separator, per_page, page);

        tracing::debug!("Fetching: {}", url);
        let response = self.client.get(&url).send().await?;
        self.rate_limiter.update_from_response(&response);

        let has_next = response
            .headers()
            .get("link")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("rel=\"next\""))
            .unwrap_or(false);

        let response = check_status(response)?;
        let items: Vec<T> = response.json().await?;

        // A short page also means the listing is exhausted.
        let has_next = has_next && items.len() >= per_page as usize;
        Ok((items, has_next))
    }

    /// Fetches pages until `max_items` items are collected or the listing
    /// is exhausted.
    pub async fn fetch_limited<T: DeserializeOwned>(
        &self,
        base_url: &str,
        per_page: u32,
        max_items: u32,
    ) -> Result<Vec<T>> {
        let mut all_items = Vec::new();
        let mut page = 1;

        loop {
            let (items, has_next) = self.fetch_page(base_url, per_page, page).await?;
            all_items.extend(items);

            if all_items.len() >= max_items as usize || !has_next {
                break;
            }
            page += 1;
        }

        all_items.truncate(max_items as usize);
        Ok(all_items)
    }
}
