// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Role-based authorization for resolved queries.
//!
//! [`RbacFilter`] consults a [`PermissionOracle`](quarry_core::PermissionOracle)
//! once per decision and either passes a query through, narrows it to the
//! caller's accessible resources, or refuses it. The narrowing itself lives in
//! [`rewrite`] and is pure.

pub mod filter;
pub mod mapping;
pub mod rewrite;

pub use filter::{Denial, FilterResult, RbacFilter};
pub use mapping::{normalize_model, resource_type_for, role_restrictions, scope_path};
pub use rewrite::{add_id_filter, id_constraint};
