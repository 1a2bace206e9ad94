//! Folds the five dimension scores into the headline numbers: composite
//! score, letter grade, percentile estimate and hire recommendation.

use crate::cli::config::{GradeThresholds, PercentileCurve};
use crate::scoring::types::{DimensionSet, LetterGrade, Recommendation};

/// Weighted sum of the dimension scores, rounded once at the end
pub fn composite_score(dimensions: &DimensionSet) -> u32 {
    let sum: f64 = dimensions
        .ordered()
        .iter()
        .map(|(_, dim)| dim.score as f64 * dim.weight)
        .sum();
    sum.round().clamp(0.0, 100.0) as u32
}

/// Letter grade from inclusive lower bounds
pub fn letter_grade(score: u32, thresholds: &GradeThresholds) -> LetterGrade {
    if score >= thresholds.s {
        LetterGrade::S
    } else if score >= thresholds.a {
        LetterGrade::A
    } else if score >= thresholds.b {
        LetterGrade::B
    } else if score >= thresholds.c {
        LetterGrade::C
    } else if score >= thresholds.d {
        LetterGrade::D
    } else {
        LetterGrade::F
    }
}

/// Percentile estimate from a logistic curve over the composite score.
/// The curve shape is part of the product contract; the output range is
/// pinned to [1, 99] so no one reads "better than everyone" into a result.
pub fn percentile(score: u32, curve: &PercentileCurve) -> u32 {
    let x = (score as f64 - curve.center) / curve.spread;
    let sigmoid = 1.0 / (1.0 + (-x).exp());
    (sigmoid * 96.0 + 2.0).round().clamp(1.0, 99.0) as u32
}

/// Hire recommendation bands over the composite score
pub fn recommendation(score: u32) -> Recommendation {
    if score >= 80 {
        Recommendation::StrongHire
    } else if score >= 65 {
        Recommendation::Hire
    } else if score >= 50 {
        Recommendation::ConsiderWithTraining
    } else {
        Recommendation::NotRecommended
    }
}
