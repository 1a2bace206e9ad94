//! Aggregated feedback for the whole session. Pulls the per-dimension
//! notes into one summary plus capped strength, weakness and next-step
//! lists, ordered so the reader sees the most load-bearing items first.

use crate::scoring::types::{DimensionScore, DimensionSet, Feedback, LetterGrade};

const MAX_ITEMS: usize = 4;

/// Same bands as the per-dimension notes: high scores get praise only,
/// low scores get direction only, the middle gets both
const HIGH_BAND: u32 = 80;
const LOW_BAND: u32 = 40;

pub fn generate(dimensions: &DimensionSet, score: u32, grade: LetterGrade) -> Feedback {
    // Stable sorts keep reporting order between equal scores, which makes
    // the output reproducible for identical inputs
    let mut best_first: Vec<(&str, &DimensionScore)> = dimensions.ordered().to_vec();
    best_first.sort_by(|a, b| b.1.score.cmp(&a.1.score));

    let mut worst_first: Vec<(&str, &DimensionScore)> = dimensions.ordered().to_vec();
    worst_first.sort_by(|a, b| a.1.score.cmp(&b.1.score));

    let strongest = best_first[0].0;
    let weakest = worst_first[0].0;

    let summary = if score >= HIGH_BAND {
        format!(
            "Excellent work. You scored {} (grade {}), with {} leading the way.",
            score, grade, strongest
        )
    } else if score < LOW_BAND {
        format!(
            "You scored {} (grade {}). Start with {}; the notes below lay out \
             concrete next steps.",
            score, grade, weakest
        )
    } else {
        format!(
            "Solid session at {} points (grade {}). {} was your strongest area; \
             {} has the most room to grow.",
            score, grade, strongest, weakest
        )
    };

    let top_strengths = collect(&best_first, |dim| &dim.strengths);
    let top_weaknesses = collect(&worst_first, |dim| &dim.weaknesses);
    let improvement_plan = collect(&worst_first, |dim| &dim.suggestions);

    if score >= HIGH_BAND {
        Feedback {
            summary,
            top_strengths,
            top_weaknesses: Vec::new(),
            improvement_plan: Vec::new(),
        }
    } else if score < LOW_BAND {
        Feedback {
            summary,
            top_strengths: Vec::new(),
            top_weaknesses,
            improvement_plan,
        }
    } else {
        Feedback {
            summary,
            top_strengths,
            top_weaknesses,
            improvement_plan,
        }
    }
}

fn collect<'a, F>(ordered: &[(&str, &'a DimensionScore)], pick: F) -> Vec<String>
where
    F: Fn(&'a DimensionScore) -> &'a Vec<String>,
{
    ordered
        .iter()
        .flat_map(|&(_, dim)| pick(dim).iter().cloned())
        .take(MAX_ITEMS)
        .collect()
}
