use anyhow::{Context, Result, anyhow};
use url::Url;

/// One completed scene listed in a user's order status feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderEntry {
    pub link: String,
    pub description: String,
}

/// Build the per-user status feed URL on the ordering service.
pub fn feed_url(host: &str, email: &str) -> Result<String> {
    let base = Url::parse(host).with_context(|| format!("invalid service host: {host}"))?;
    let base = base.as_str().trim_end_matches('/');
    Ok(format!("{base}/ordering/status/{email}/rss/"))
}

/// Parse an RSS document into order entries.
pub fn parse_entries(content: &str) -> Result<Vec<OrderEntry>> {
    let channel = content
        .parse::<rss::Channel>()
        .map_err(|e| anyhow!("RSS parse error: {e}"))?;

    let entries = channel
        .items()
        .iter()
        .filter_map(|item| {
            let Some(link) = item.link() else {
                tracing::warn!(
                    "skipping feed item without link: {}",
                    item.title().unwrap_or("<untitled>")
                );
                return None;
            };

            Some(OrderEntry {
                link: link.to_string(),
                description: item.description().unwrap_or_default().to_string(),
            })
        })
        .collect();

    Ok(entries)
}

async fn try_fetch(client: &reqwest::Client, url: &str) -> Result<Vec<OrderEntry>> {
    let body = client
        .get(url)
        .send()
        .await
        .context("failed to fetch order feed")?
        .error_for_status()
        .context("order feed returned an error status")?
        .text()
        .await
        .context("failed to read order feed body")?;

    parse_entries(&body)
}

/// Fetch the status feed and return its entries.
///
/// A feed that cannot be fetched or parsed yields no entries; the cause is
/// logged so it can be told apart from an order with nothing to download.
pub async fn fetch_entries(client: &reqwest::Client, url: &str) -> Vec<OrderEntry> {
    tracing::info!("fetching order feed from {url}");

    match try_fetch(client, url).await {
        Ok(entries) => {
            tracing::info!("loaded {} entries from order feed", entries.len());
            entries
        }
        Err(e) => {
            tracing::warn!("order feed unavailable, treating as empty: {e:#}");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SAMPLE_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
    <channel>
        <title>ESPA Status Feed</title>
        <link>http://espa.cr.usgs.gov/</link>
        <description>Completed scenes</description>
        <item>
            <title>LT50290302011223PAC01</title>
            <link>http://espa.cr.usgs.gov/orders/user-0101/LT50290302011223PAC01-SC.tar.gz</link>
            <description>Order: user-0101 Status: complete</description>
        </item>
        <item>
            <title>LE70290302011215EDC00</title>
            <link>http://espa.cr.usgs.gov/orders/user-0202/LE70290302011215EDC00-SC.tar.gz</link>
        </item>
        <item>
            <title>no link here</title>
            <description>Order: user-0303</description>
        </item>
    </channel>
</rss>"#;

    #[test]
    fn builds_feed_url_from_host_and_email() {
        assert_eq!(
            feed_url("http://espa.cr.usgs.gov", "someone@usgs.gov").unwrap(),
            "http://espa.cr.usgs.gov/ordering/status/someone@usgs.gov/rss/"
        );
        assert_eq!(
            feed_url("http://localhost:8080/", "x@y.z").unwrap(),
            "http://localhost:8080/ordering/status/x@y.z/rss/"
        );
    }

    #[test]
    fn rejects_unparsable_host() {
        assert!(feed_url("not a url", "x@y.z").is_err());
    }

    #[test]
    fn parses_items_with_links() {
        let entries = parse_entries(SAMPLE_FEED).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0].link,
            "http://espa.cr.usgs.gov/orders/user-0101/LT50290302011223PAC01-SC.tar.gz"
        );
        assert_eq!(entries[0].description, "Order: user-0101 Status: complete");
        assert_eq!(entries[1].description, "");
    }

    #[test]
    fn malformed_feed_is_an_error() {
        assert!(parse_entries("<html><body>oops</body></html>").is_err());
        assert!(parse_entries("").is_err());
    }

    #[tokio::test]
    async fn fetch_returns_entries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ordering/status/user@example.com/rss/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SAMPLE_FEED))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = feed_url(&server.uri(), "user@example.com").unwrap();
        let entries = fetch_entries(&client, &url).await;

        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn fetch_degrades_to_empty_on_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = feed_url(&server.uri(), "user@example.com").unwrap();

        assert!(fetch_entries(&client, &url).await.is_empty());
    }

    #[tokio::test]
    async fn fetch_degrades_to_empty_on_garbage_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not a feed"))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = feed_url(&server.uri(), "user@example.com").unwrap();

        assert!(fetch_entries(&client, &url).await.is_empty());
    }
}
