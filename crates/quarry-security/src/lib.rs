// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Security utilities for the Quarry pipeline.
//!
//! - [`redact`] / [`redact_value`]: mask credential-shaped substrings before
//!   text leaves the process through logs or audit sinks.
//! - [`RedactingWriter`]: `io::Write` wrapper applying the same pass to log output.
//! - [`validate_url`]: HTTPS requirement for remote provider endpoints.

pub mod redact;
pub mod tls;

pub use redact::{contains_secret, redact, redact_value, RedactingWriter, SecretRegistry};
pub use tls::{is_localhost, validate_url};
