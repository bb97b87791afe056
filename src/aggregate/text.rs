//! Numeric-literal scanning and splicing for free-text results.
//!
//! A text is split once into alternating literal segments and numeric
//! tokens; the merged output is rebuilt by joining the segments with the
//! averaged values, so surrounding prose is reproduced byte-for-byte.

use super::format::{mean, render_literal};
use crate::error::{AggregateError, Result};
use crate::models::BenchmarkKey;
use once_cell::sync::Lazy;
use regex::Regex;

/// Unsigned or `+`-prefixed integers and decimals.
static NUMERIC_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\+?[0-9]*\.[0-9]+|[0-9]+").expect("numeric literal pattern is valid")
});

// Every match of the pattern is a valid float literal.
fn parse_literal(literal: &str) -> f64 {
    literal.parse().unwrap_or_default()
}

/// A text split into literal segments around its numeric tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct TextTemplate {
    /// Always one more segment than values.
    segments: Vec<String>,
    values: Vec<f64>,
}

impl TextTemplate {
    pub fn parse(text: &str) -> Self {
        let mut segments = Vec::new();
        let mut values = Vec::new();
        let mut last = 0;

        for m in NUMERIC_LITERAL.find_iter(text) {
            segments.push(text[last..m.start()].to_string());
            values.push(parse_literal(m.as_str()));
            last = m.end();
        }
        segments.push(text[last..].to_string());

        Self { segments, values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of numeric tokens.
    pub fn slots(&self) -> usize {
        self.values.len()
    }

    /// Rebuild the text with `replacements` in place of the numeric tokens.
    ///
    /// `replacements` must hold exactly [`slots`](Self::slots) entries.
    pub fn render<S: AsRef<str>>(&self, replacements: &[S]) -> Option<String> {
        if replacements.len() != self.slots() {
            return None;
        }

        let mut out = String::with_capacity(self.segments.iter().map(String::len).sum::<usize>());
        for (segment, value) in self.segments.iter().zip(replacements) {
            out.push_str(segment);
            out.push_str(value.as_ref());
        }
        if let Some(tail) = self.segments.last() {
            out.push_str(tail);
        }
        Some(out)
    }
}

/// Element-wise sums of the numeric tokens of one benchmark's repeats.
#[derive(Debug, Clone)]
pub struct TokenSums {
    key: BenchmarkKey,
    template: TextTemplate,
    sums: Vec<f64>,
    observed: usize,
}

impl TokenSums {
    /// Seed from repeat #1, which also fixes the surrounding text.
    pub fn seed(key: BenchmarkKey, template: TextTemplate) -> Self {
        Self {
            key,
            sums: template.values.clone(),
            template,
            observed: 1,
        }
    }

    /// Add one more repeat.
    ///
    /// Its token count and every text segment between tokens must match the seed.
    pub fn add(&mut self, repeat: usize, text: &TextTemplate) -> Result<()> {
        if text.slots() != self.sums.len() {
            return Err(AggregateError::StructuralMismatch {
                key: self.key.clone(),
                repeat,
                expected: self.sums.len(),
                found: text.slots(),
                unit: "numeric literals",
            });
        }

        let differing = self
            .template
            .segments
            .iter()
            .zip(&text.segments)
            .position(|(expected, found)| expected != found);
        if let Some(segment) = differing {
            return Err(AggregateError::TextMismatch {
                key: self.key.clone(),
                repeat,
                segment,
                expected: self.template.segments[segment].clone(),
                found: text.segments[segment].clone(),
            });
        }

        for (sum, value) in self.sums.iter_mut().zip(&text.values) {
            *sum += value;
        }
        self.observed += 1;
        Ok(())
    }

    pub fn observed(&self) -> usize {
        self.observed
    }

    /// Rendered means, one per token.
    pub fn means(&self) -> Vec<String> {
        self.sums
            .iter()
            .map(|sum| render_literal(mean(*sum, self.observed)))
            .collect()
    }

    /// The seed text with each token replaced by its mean.
    pub fn finish(&self) -> Result<String> {
        self.template
            .render(&self.means())
            .ok_or_else(|| AggregateError::StructuralMismatch {
                key: self.key.clone(),
                repeat: 1,
                expected: self.sums.len(),
                found: self.template.slots(),
                unit: "numeric literals",
            })
    }
}
