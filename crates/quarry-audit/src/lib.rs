// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Audit trail for question resolution.
//!
//! Every resolution attempt produces exactly one [`AuditLogEntry`]. Entries
//! are redacted on record, held in a bounded ring buffer, mirrored to the
//! console through `tracing`, and periodically flushed to an [`AuditSink`].
//! Audit failures are logged and never reach request callers.

pub mod entry;
pub mod logger;
pub mod sink;

pub use entry::{AuditContext, AuditLogEntry};
pub use logger::{AuditLogger, AuditStats};
pub use sink::{AuditError, AuditSink, JsonlFileSink};
