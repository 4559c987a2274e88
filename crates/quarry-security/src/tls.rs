// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! TLS policy for outbound provider endpoints.
//!
//! Remote endpoints (vendor APIs, OAuth token endpoints, gateway URLs) must
//! use HTTPS. Loopback hosts are exempt so local proxies and test servers work.

use quarry_core::QuarryError;
use tracing::error;

/// Validate an endpoint URL before any request is sent to it.
///
/// Violations are configuration errors: the offending URL comes from
/// environment or config, never from a caller.
pub fn validate_url(url: &str) -> Result<url::Url, QuarryError> {
    let parsed = url::Url::parse(url).map_err(|e| QuarryError::Configuration {
        message: format!("invalid endpoint URL: {e}"),
        missing: vec![],
    })?;

    let host = parsed.host_str().unwrap_or("");
    if is_localhost(host) {
        return Ok(parsed);
    }

    if parsed.scheme() != "https" {
        error!(host = %host, scheme = parsed.scheme(), "refusing non-TLS provider endpoint");
        return Err(QuarryError::Configuration {
            message: format!("endpoint for host `{host}` must use https"),
            missing: vec![],
        });
    }

    Ok(parsed)
}

/// Check if a host refers to the loopback interface.
pub fn is_localhost(host: &str) -> bool {
    matches!(host, "localhost" | "::1" | "[::1]") || host.starts_with("127.")
}
