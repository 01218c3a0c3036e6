//! Remote ledger API client.
//!
//! All persistence lives behind the remote REST API; this client wraps
//! the endpoints the app uses: order range queries, entry create/edit,
//! the two-step OTP delete, the customer list, the product catalog, and
//! invoice PDF fetches. The client holds no state beyond the base URL
//! and a configured `reqwest` client.

use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use tracing::{info, warn};

use crate::dates;

/// Default timeout for API requests (30 seconds).
const DEFAULT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

// ---------------------------------------------------------------------------
// URL normalisation
// ---------------------------------------------------------------------------

/// Normalise the ledger API base URL:
/// - ensure a scheme is present (https, or http for localhost)
/// - strip trailing slashes
pub fn normalize_base_url(url: &str) -> String {
    let mut url = url.trim().to_string();

    if !url.starts_with("http://") && !url.starts_with("https://") {
        if url.starts_with("localhost") || url.starts_with("127.0.0.1") {
            url = format!("http://{url}");
        } else {
            url = format!("https://{url}");
        }
    }

    while url.ends_with('/') {
        url.pop();
    }

    url
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// Convert a `reqwest::Error` into a user-friendly message.
fn friendly_error(url: &str, err: &reqwest::Error) -> String {
    if err.is_connect() {
        return format!("Cannot reach ledger API at {url}");
    }
    if err.is_timeout() {
        return format!("Connection to {url} timed out");
    }
    if err.is_builder() {
        return format!("Invalid ledger API URL: {url}");
    }
    format!("Network error communicating with {url}: {err}")
}

/// Convert an HTTP status code into a user-friendly message.
fn status_error(status: StatusCode) -> String {
    match status.as_u16() {
        404 => "Ledger API endpoint not found".to_string(),
        s if s >= 500 => format!("Ledger API server error (HTTP {s})"),
        s => format!("Unexpected response from ledger API (HTTP {s})"),
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct ApiClient {
    base_url: String,
    client: Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, String> {
        let base_url = normalize_base_url(base_url);
        if base_url == "https://" || base_url == "http://" {
            return Err("Ledger API URL cannot be empty".to_string());
        }
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| format!("HTTP client error: {e}"))?;
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a URL from path segments (each segment percent-encoded) and
    /// query pairs.
    fn url(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url, String> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| format!("Invalid ledger API URL: {e}"))?;
        {
            let mut parts = url
                .path_segments_mut()
                .map_err(|_| "Ledger API URL cannot be a base".to_string())?;
            for segment in segments {
                parts.push(segment);
            }
        }
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    async fn get_json(&self, url: Url) -> Result<Value, String> {
        let display = url.to_string();
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| friendly_error(&display, &e))?;
        if !resp.status().is_success() {
            return Err(status_error(resp.status()));
        }
        resp.json::<Value>()
            .await
            .map_err(|e| format!("Ledger API JSON parse error: {e}"))
    }

    async fn post_json(&self, url: Url, body: &Value) -> Result<Value, String> {
        let display = url.to_string();
        let resp = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| friendly_error(&display, &e))?;
        if !resp.status().is_success() {
            return Err(status_error(resp.status()));
        }
        resp.json::<Value>()
            .await
            .or_else(|_| Ok(serde_json::json!({ "success": true })))
    }

    // -----------------------------------------------------------------------
    // Orders
    // -----------------------------------------------------------------------

    /// Fetch orders within an inclusive date range. The range is expanded
    /// to start-of-day / end-of-day bounds before the request.
    pub async fn get_orders(&self, start: &str, end: &str) -> Result<Vec<Value>, String> {
        if start.trim().is_empty() || end.trim().is_empty() {
            return Err("No date range selected".to_string());
        }
        let (start_iso, end_iso) =
            dates::day_bounds(start, end).ok_or("Invalid date range".to_string())?;

        let url = self.url(
            &["orders"],
            &[("start", start_iso.as_str()), ("end", end_iso.as_str())],
        )?;
        info!(start = %start_iso, end = %end_iso, "Fetching orders");
        let data = self.get_json(url).await?;
        Ok(data.as_array().cloned().unwrap_or_default())
    }

    pub async fn get_order(&self, id: &str) -> Result<Value, String> {
        let id = id.trim();
        if id.is_empty() {
            return Err("Order ID is required".to_string());
        }
        self.get_json(self.url(&["order", id], &[])?).await
    }

    pub async fn create_entry(
        &self,
        name: &str,
        date: &str,
        products: &[Value],
    ) -> Result<Value, String> {
        let date_ms = dates::parse_str_ms(date).ok_or("Invalid entry date".to_string())?;
        let body = serde_json::json!({
            "name": name,
            "date": chrono::DateTime::from_timestamp_millis(date_ms)
                .ok_or("Invalid entry date".to_string())?
                .to_rfc3339(),
            "products": products,
        });
        self.post_json(self.url(&["order", "new"], &[])?, &body)
            .await
    }

    /// Update an existing entry. The document must carry its `_id`.
    pub async fn edit_entry(&self, entry: &Value) -> Result<Value, String> {
        if entry.get("_id").and_then(Value::as_str).is_none() {
            return Err("Missing entry _id".to_string());
        }
        self.post_json(self.url(&["order", "edit"], &[])?, entry)
            .await
    }

    /// First half of the delete flow: ask the API to issue an OTP for
    /// this order.
    pub async fn request_delete_otp(&self, id: &str) -> Result<(), String> {
        let id = id.trim();
        if id.is_empty() {
            return Err("Order ID is required".to_string());
        }
        let url = self.url(&["delete", "get-otp", id], &[])?;
        self.get_json(url).await.map(|_| ())
    }

    /// Second half: validate the OTP and perform the delete.
    pub async fn confirm_delete(&self, id: &str, otp: &str) -> Result<Value, String> {
        let id = id.trim();
        let otp = otp.trim();
        if id.is_empty() || otp.is_empty() {
            return Err("Order ID and OTP are required".to_string());
        }
        let url = self.url(&["delete", "validate-otp", otp], &[("id", id)])?;
        let data = self.get_json(url).await?;
        if data.get("success").and_then(Value::as_bool) != Some(true) {
            return Err("Delete failed".to_string());
        }
        info!(order_id = %id, "Order deleted");
        Ok(data)
    }

    // -----------------------------------------------------------------------
    // Customers
    // -----------------------------------------------------------------------

    pub async fn get_customers(&self) -> Result<Vec<Value>, String> {
        let data = self.get_json(self.url(&["customers"], &[])?).await?;
        Ok(data.as_array().cloned().unwrap_or_default())
    }

    pub async fn create_customer(&self, full_name: &str, city: &str) -> Result<Value, String> {
        let body = serde_json::json!({ "fullName": full_name, "city": city });
        self.post_json(self.url(&["customer", "new"], &[])?, &body)
            .await
    }

    pub async fn delete_customer(&self, id: &str) -> Result<Value, String> {
        let id = id.trim();
        if id.is_empty() {
            return Err("Customer ID is required".to_string());
        }
        let url = self.url(&["customer", id], &[])?;
        let display = url.to_string();
        let resp = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(|e| friendly_error(&display, &e))?;
        if !resp.status().is_success() {
            return Err(status_error(resp.status()));
        }
        Ok(serde_json::json!({ "success": true }))
    }

    // -----------------------------------------------------------------------
    // Product catalog
    // -----------------------------------------------------------------------

    /// Fetch the product catalog for the entry form. Degrades to empty
    /// category lists when the API is unreachable, so the form still
    /// opens offline.
    pub async fn get_product_catalog(&self) -> Value {
        let empty = serde_json::json!({
            "iphones": [],
            "ipods": [],
            "iwatches": [],
        });
        let url = match self.url(&["get-products"], &[]) {
            Ok(url) => url,
            Err(err) => {
                warn!(error = %err, "Product catalog URL error");
                return empty;
            }
        };
        match self.get_json(url).await {
            Ok(data) => data,
            Err(err) => {
                warn!(error = %err, "Product catalog fetch failed");
                empty
            }
        }
    }

    // -----------------------------------------------------------------------
    // Invoice PDFs (generated remotely; fetched as opaque bytes)
    // -----------------------------------------------------------------------

    /// Fetch the per-entry invoice PDF covering every product.
    pub async fn fetch_invoice_pdf(&self, order_id: &str) -> Result<Vec<u8>, String> {
        let order_id = order_id.trim();
        if order_id.is_empty() {
            return Err("Order ID is required".to_string());
        }
        let url = self.url(&["pdf", order_id], &[])?;
        let display = url.to_string();
        let resp = self
            .client
            .get(url)
            .header("Accept", "application/pdf")
            .send()
            .await
            .map_err(|e| friendly_error(&display, &e))?;
        if !resp.status().is_success() {
            return Err(status_error(resp.status()));
        }

        let is_pdf = resp
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("application/pdf"))
            .unwrap_or(false);
        if !is_pdf {
            return Err("Invalid response format".to_string());
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| format!("Invoice download failed: {e}"))?;
        if bytes.is_empty() {
            return Err("Empty file received".to_string());
        }
        Ok(bytes.to_vec())
    }

    /// Fetch the single-unit invoice PDF for one scanned code.
    pub async fn fetch_unit_invoice_pdf(
        &self,
        order_id: &str,
        imei: &str,
    ) -> Result<Vec<u8>, String> {
        let order_id = order_id.trim();
        let imei = imei.trim();
        if order_id.is_empty() || imei.is_empty() {
            return Err("Order ID and IMEI are required".to_string());
        }
        let url = self.url(&["pdf-single", order_id, imei], &[])?;
        let display = url.to_string();
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| friendly_error(&display, &e))?;
        if !resp.status().is_success() {
            return Err(status_error(resp.status()));
        }
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| format!("Invoice download failed: {e}"))?;
        if bytes.is_empty() {
            return Err("Empty file received".to_string());
        }
        Ok(bytes.to_vec())
    }
}

// ===========================================================================
// Tests
// ===========================================================================
