pub mod observatory;
pub mod survey;

use std::time::Duration;

/// Shared HTTP client for both adapters. `None` keeps reqwest's default (no timeout).
pub fn build_client(timeout: Option<Duration>) -> reqwest::Result<reqwest::Client> {
    let mut builder =
        reqwest::Client::builder().user_agent(concat!("quake-feed/", env!("CARGO_PKG_VERSION")));
    if let Some(t) = timeout {
        builder = builder.timeout(t);
    }
    builder.build()
}
