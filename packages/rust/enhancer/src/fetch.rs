//! Timeout-bounded page fetching with SSRF protection.

use std::net::IpAddr;
use std::time::Duration;

use reqwest::Client;
use url::Url;

use campaignscope_shared::{CampaignScopeError, Result};

/// User-Agent string for enrichment requests.
const USER_AGENT: &str = concat!("CampaignScope/", env!("CARGO_PKG_VERSION"));

/// Build the shared HTTP client used for competitor fetches.
///
/// Timeouts are applied per request, not on the client, so each competitor
/// fetch is bounded independently.
pub(crate) fn build_client() -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| CampaignScopeError::Network(format!("failed to build HTTP client: {e}")))
}

/// Fetch a page body with a fixed timeout. An expired timeout cancels the
/// in-flight request and surfaces as a network error for this fetch only.
pub(crate) async fn fetch_html(client: &Client, url: &Url, timeout: Duration) -> Result<String> {
    let response = client
        .get(url.as_str())
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| CampaignScopeError::Network(format!("{url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(CampaignScopeError::Network(format!("{url}: HTTP {status}")));
    }

    response
        .text()
        .await
        .map_err(|e| CampaignScopeError::Network(format!("{url}: body read failed: {e}")))
}

// ---------------------------------------------------------------------------
// SSRF protection
// ---------------------------------------------------------------------------

/// Check if a URL targets a potentially dangerous resource.
pub(crate) fn is_ssrf_target(url: &Url) -> bool {
    // Block non-HTTP schemes
    match url.scheme() {
        "http" | "https" => {}
        _ => return true,
    }

    // Block private/loopback IPs
    if let Some(host) = url.host_str() {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return is_private_ip(&ip);
        }
        // Block known local hostnames
        if host == "localhost"
            || host == "[::1]"
            || host.ends_with(".local")
            || host.ends_with(".internal")
        {
            return true;
        }
    }

    false
}

/// Check if an IP is in a private/reserved range.
fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_unspecified()
                // 100.64.0.0/10 (Carrier-grade NAT)
                || (v4.octets()[0] == 100 && (v4.octets()[1] & 0xC0) == 64)
                // 192.0.0.0/24
                || (v4.octets()[0] == 192 && v4.octets()[1] == 0 && v4.octets()[2] == 0)
        }
        IpAddr::V6(v6) => v6.is_loopback() || v6.is_unspecified(),
    }
}
