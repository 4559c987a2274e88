// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic question-to-query resolution.
//!
//! The [`TemplateLibrary`] is an ordered, immutable table of templates, each
//! holding regex patterns, parameter extractors, and a pure query builder.
//! The [`TemplateMatcher`] scans every template/pattern pair, scores each
//! hit, and accepts the best one when it clears the confidence threshold.

pub mod library;
pub mod matcher;
pub mod params;

pub use library::{Category, Template, TemplateLibrary};
pub use matcher::{MatchOutcome, TemplateMatch, TemplateMatcher};
pub use params::{ParamType, ParamValue, ParameterDefinition, Params};
