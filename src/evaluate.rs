//! ROUGE evaluation of candidate summaries.
//!
//! [`RougeScorer`] computes ROUGE-1 and ROUGE-2 (n-gram overlap) and
//! ROUGE-L (longest common subsequence). [`evaluate_csv`] scores a
//! predictor against the reference summaries of a CSV file.

use crate::encoding::TextEncoding;
use crate::error::{Error, Result};
use crate::table::Table;
use crate::tokenize::Lemmatizer;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Column holding the article text.
pub const CONTENT_COLUMN: &str = "full_content";

/// Column holding the reference summary.
pub const TARGET_COLUMN: &str = "target_summary";

/// Optional column identifying each row.
pub const INDEX_COLUMN: &str = "index";

/// Tokens of at least this many chars are stemmed.
const MIN_STEM_CHARS: usize = 4;

/// Precision, recall and F1 of one ROUGE variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Score {
    /// Share of candidate units found in the reference.
    pub precision: f64,
    /// Share of reference units found in the candidate.
    pub recall: f64,
    /// Harmonic mean of precision and recall.
    pub fmeasure: f64,
}

impl Score {
    fn from_counts(overlap: usize, candidate: usize, reference: usize) -> Self {
        let precision = ratio(overlap, candidate);
        let recall = ratio(overlap, reference);
        let fmeasure = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        Self {
            precision,
            recall,
            fmeasure,
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Scores of one candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RougeScores {
    /// Unigram overlap.
    pub rouge1: Score,
    /// Bigram overlap.
    pub rouge2: Score,
    /// Longest common subsequence.
    #[serde(rename = "rougeL")]
    pub rouge_l: Score,
}

/// ROUGE scorer.
#[derive(Clone, Default)]
pub struct RougeScorer {
    stemmer: Option<Arc<dyn Lemmatizer>>,
}

impl std::fmt::Debug for RougeScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RougeScorer")
            .field("stemmer", &self.stemmer.is_some())
            .finish()
    }
}

impl RougeScorer {
    /// Creates a scorer without stemming.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scorer that stems tokens longer than three chars.
    pub fn with_stemmer(stemmer: Arc<dyn Lemmatizer>) -> Self {
        Self {
            stemmer: Some(stemmer),
        }
    }

    /// Lowercases, replaces everything but letters and digits with spaces,
    /// and splits.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        let spaced: String = lower
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { ' ' })
            .collect();

        spaced
            .split_whitespace()
            .map(|token| self.stem(token))
            .collect()
    }

    fn stem(&self, token: &str) -> String {
        match &self.stemmer {
            Some(stemmer) if token.chars().count() >= MIN_STEM_CHARS => stemmer
                .lemmatize(token)
                .unwrap_or_else(|e| {
                    debug!(target: "newsprep::evaluate", "stemmer failed on '{}': {}", token, e);
                    token.to_string()
                }),
            _ => token.to_string(),
        }
    }

    /// Scores `candidate` against `reference`.
    pub fn score(&self, reference: &str, candidate: &str) -> RougeScores {
        let reference = self.tokenize(reference);
        let candidate = self.tokenize(candidate);

        RougeScores {
            rouge1: ngram_score(&reference, &candidate, 1),
            rouge2: ngram_score(&reference, &candidate, 2),
            rouge_l: lcs_score(&reference, &candidate),
        }
    }
}

fn ngram_counts(tokens: &[String], n: usize) -> HashMap<&[String], usize> {
    let mut counts = HashMap::new();
    if tokens.len() >= n {
        for gram in tokens.windows(n) {
            *counts.entry(gram).or_insert(0) += 1;
        }
    }
    counts
}

fn ngram_score(reference: &[String], candidate: &[String], n: usize) -> Score {
    let reference_counts = ngram_counts(reference, n);
    let candidate_counts = ngram_counts(candidate, n);

    let overlap: usize = candidate_counts
        .iter()
        .map(|(gram, &count)| count.min(reference_counts.get(gram).copied().unwrap_or(0)))
        .sum();

    Score::from_counts(
        overlap,
        candidate_counts.values().sum(),
        reference_counts.values().sum(),
    )
}

fn lcs_len(a: &[String], b: &[String]) -> usize {
    let mut previous = vec![0; b.len() + 1];
    let mut current = vec![0; b.len() + 1];
    for x in a {
        for (j, y) in b.iter().enumerate() {
            current[j + 1] = if x == y {
                previous[j] + 1
            } else {
                previous[j + 1].max(current[j])
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

fn lcs_score(reference: &[String], candidate: &[String]) -> Score {
    let lcs = lcs_len(reference, candidate);
    Score::from_counts(lcs, candidate.len(), reference.len())
}

/// Baseline predictor: the first `max_chars` chars followed by `...`.
pub fn lead_summary(text: &str, max_chars: usize) -> String {
    let mut summary: String = text.chars().take(max_chars).collect();
    summary.push_str("...");
    summary
}

/// Averages of an evaluation run.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    /// File written.
    pub output: PathBuf,
    /// Rows scored.
    pub rows: usize,
    /// Mean ROUGE-1 F1.
    pub rouge1_fmeasure: f64,
    /// Mean ROUGE-2 F1.
    pub rouge2_fmeasure: f64,
    /// Mean ROUGE-L F1.
    #[serde(rename = "rougeL_fmeasure")]
    pub rouge_l_fmeasure: f64,
}

/// Scores `predictor` on every row of `input` and writes per-row F1 scores
/// to `output`.
///
/// # Errors
///
/// Returns [`Error::MissingColumns`] when `full_content` or
/// `target_summary` is absent; no output is written in that case.
pub fn evaluate_csv(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    scorer: &RougeScorer,
    predictor: &dyn Fn(&str) -> String,
) -> Result<EvaluationReport> {
    let input = input.as_ref();
    let output = output.as_ref();
    let table = Table::read_with_ladder(input, &TextEncoding::LADDER, |_| {})?.table;

    let missing = table.missing_columns(&[CONTENT_COLUMN, TARGET_COLUMN]);
    if !missing.is_empty() {
        return Err(Error::MissingColumns(missing));
    }
    let content_col = table.column_index(CONTENT_COLUMN).unwrap_or_default();
    let target_col = table.column_index(TARGET_COLUMN).unwrap_or_default();
    let index_col = table.column_index(INDEX_COLUMN);

    let mut rows = Vec::with_capacity(table.len());
    let mut sums = [0.0f64; 3];

    for (row_idx, row) in table.rows().iter().enumerate() {
        let index = match index_col {
            Some(col) => row[col].clone(),
            None => row_idx.to_string(),
        };
        let prediction = predictor(&row[content_col]);
        let scores = scorer.score(&row[target_col], &prediction);
        info!(
            target: "newsprep::evaluate",
            "index {}: ROUGE-L = {:.4}",
            index,
            scores.rouge_l.fmeasure
        );

        sums[0] += scores.rouge1.fmeasure;
        sums[1] += scores.rouge2.fmeasure;
        sums[2] += scores.rouge_l.fmeasure;
        rows.push(vec![
            index,
            scores.rouge1.fmeasure.to_string(),
            scores.rouge2.fmeasure.to_string(),
            scores.rouge_l.fmeasure.to_string(),
        ]);
    }

    let count = rows.len();
    let mean = |sum: f64| if count == 0 { 0.0 } else { sum / count as f64 };
    let report = EvaluationReport {
        output: output.to_path_buf(),
        rows: count,
        rouge1_fmeasure: mean(sums[0]),
        rouge2_fmeasure: mean(sums[1]),
        rouge_l_fmeasure: mean(sums[2]),
    };

    let results = Table::new(
        [INDEX_COLUMN, "rouge1_fmeasure", "rouge2_fmeasure", "rougeL_fmeasure"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        rows,
    );
    results.write(output)?;

    info!(
        target: "newsprep::evaluate",
        "average ROUGE: rouge1_fmeasure {:.4}, rouge2_fmeasure {:.4}, rougeL_fmeasure {:.4}",
        report.rouge1_fmeasure,
        report.rouge2_fmeasure,
        report.rouge_l_fmeasure
    );
    info!(target: "newsprep::evaluate", "evaluation results saved to {}", output.display());

    Ok(report)
}
