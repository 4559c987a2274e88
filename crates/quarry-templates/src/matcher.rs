// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Confidence-scored template matching.
//!
//! The scan is exhaustive: every pattern of every template is tried, and
//! only the highest confidence decides the winner. Matching is pure and
//! synchronous; no I/O happens here.

use quarry_config::model::MatcherConfig;
use tracing::{debug, info};

use crate::library::{Template, TemplateLibrary};
use crate::params::Params;

/// Words that earn the action-verb bonus.
const ACTION_VERBS: &[&str] = &["show", "list", "find"];

/// An accepted match, ready for query building.
#[derive(Debug, Clone)]
pub struct TemplateMatch<'a> {
    pub template: &'a Template,
    pub params: Params,
    pub confidence: f64,
}

/// Full outcome of a scan, distinguishing the two ways of not matching.
#[derive(Debug, Clone)]
pub enum MatchOutcome<'a> {
    Matched(TemplateMatch<'a>),
    /// At least one pattern hit, but the best confidence was under the threshold.
    BelowThreshold {
        template_id: &'static str,
        confidence: f64,
    },
    /// No pattern in the library matched.
    NoPattern,
}

impl<'a> MatchOutcome<'a> {
    pub fn into_match(self) -> Option<TemplateMatch<'a>> {
        match self {
            MatchOutcome::Matched(m) => Some(m),
            _ => None,
        }
    }
}

/// Scores questions against a [`TemplateLibrary`].
#[derive(Debug, Clone)]
pub struct TemplateMatcher<'a> {
    library: &'a TemplateLibrary,
    settings: MatcherConfig,
}

impl TemplateMatcher<'static> {
    /// Matcher over the built-in library with default heuristics.
    pub fn standard() -> Self {
        Self::new(TemplateLibrary::standard(), MatcherConfig::default())
    }
}

impl<'a> TemplateMatcher<'a> {
    pub fn new(library: &'a TemplateLibrary, settings: MatcherConfig) -> Self {
        Self { library, settings }
    }

    pub fn library(&self) -> &'a TemplateLibrary {
        self.library
    }

    pub fn threshold(&self) -> f64 {
        self.settings.confidence_threshold
    }

    /// The best match at or above the threshold, if any.
    pub fn find_best_match(&self, question: &str) -> Option<TemplateMatch<'a>> {
        self.evaluate(question).into_match()
    }

    /// Scan the library and report what happened.
    pub fn evaluate(&self, question: &str) -> MatchOutcome<'a> {
        let normalized = question.trim().to_lowercase();
        let total_chars = normalized.chars().count();
        if total_chars == 0 {
            debug!("empty question, nothing to match");
            return MatchOutcome::NoPattern;
        }

        let mut best: Option<(&'a Template, f64)> = None;
        for template in self.library.templates() {
            for pattern in &template.patterns {
                let Some(m) = pattern.find(&normalized) else {
                    continue;
                };
                let span_chars = m.as_str().chars().count();
                let confidence = self.confidence(span_chars, total_chars, &normalized);
                debug!(
                    template = template.id,
                    confidence,
                    pattern = %truncate(pattern.as_str(), 60),
                    "pattern matched"
                );
                // Strictly greater: ties keep the earlier pair.
                if best.is_none_or(|(_, c)| confidence > c) {
                    best = Some((template, confidence));
                }
            }
        }

        let Some((template, confidence)) = best else {
            info!(question_len = total_chars, "no template pattern matched");
            return MatchOutcome::NoPattern;
        };

        if confidence < self.settings.confidence_threshold {
            info!(
                template = template.id,
                confidence,
                threshold = self.settings.confidence_threshold,
                "best template match below threshold"
            );
            return MatchOutcome::BelowThreshold {
                template_id: template.id,
                confidence,
            };
        }

        // Extraction runs on the trimmed original so names keep their casing.
        let params = template.extract_params(question.trim());
        debug!(template = template.id, confidence, ?params, "template match accepted");
        MatchOutcome::Matched(TemplateMatch {
            template,
            params,
            confidence,
        })
    }

    /// `min(1, coverage + bonus)` where coverage is the matched share of the
    /// normalized question.
    pub fn confidence(&self, matched_chars: usize, total_chars: usize, normalized: &str) -> f64 {
        if total_chars == 0 {
            return 0.0;
        }
        let coverage = matched_chars as f64 / total_chars as f64;
        (coverage + self.bonus(normalized)).min(1.0)
    }

    fn bonus(&self, normalized: &str) -> f64 {
        let mut bonus = 0.0;
        if ACTION_VERBS.iter().any(|v| normalized.contains(v)) {
            bonus += self.settings.action_verb_bonus;
        }
        if normalized.contains("all") {
            bonus += self.settings.all_keyword_bonus;
        }
        bonus
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
