use std::time::Duration;

use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{error, info};

use crate::error::{EtlError, Result};

const USER_AGENT: &str = concat!("bank_etl/", env!("CARGO_PKG_VERSION"));

/// Outer HTML of the located `<table>` element.
#[derive(Debug, Clone)]
pub struct TableFragment(pub String);

impl TableFragment {
    pub fn html(&self) -> &str {
        &self.0
    }
}

pub fn http_client(timeout: Duration) -> Result<Client> {
    let client = Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Single GET; anything but a 2xx status is a transport fault. No retries.
pub async fn fetch_document(client: &Client, url: &str) -> Result<String> {
    info!("Fetching {}", url);
    let response = match client.get(url).send().await {
        Ok(r) => r,
        Err(e) => {
            error!(url, error = %e, "Failed to fetch the webpage");
            return Err(e.into());
        }
    };

    let status = response.status();
    if !status.is_success() {
        error!(url, status = status.as_u16(), "Failed to fetch the webpage");
        return Err(EtlError::Transport {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.text().await.inspect_err(|e| {
        error!(url, error = %e, "Failed to read response body");
    })?;
    info!(bytes = body.len(), "Successfully fetched the webpage");
    Ok(body)
}

/// Return the first element matching `selector`.
pub fn find_table(document: &str, selector: &str) -> Result<TableFragment> {
    let sel = Selector::parse(selector).map_err(|e| EtlError::InvalidSelector {
        selector: selector.to_string(),
        reason: format!("{e:?}"),
    })?;
    let html = Html::parse_document(document);
    let table = html
        .select(&sel)
        .next()
        .ok_or_else(|| EtlError::MissingTable {
            selector: selector.to_string(),
        })?;
    Ok(TableFragment(table.html()))
}

// ── Tests ──
