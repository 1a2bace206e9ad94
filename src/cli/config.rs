use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::scoring::ScoreError;

/// Weights may drift from 1.0 by at most this much before scoring refuses
/// to run
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Process-wide scoring configuration. Loaded once at startup and treated
/// as immutable for the rest of the run so results stay reproducible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Relative weight of each dimension in the composite score
    #[serde(default)]
    pub dimension_weights: DimensionWeights,

    /// Inclusive lower score bound for each letter grade
    #[serde(default)]
    pub grade_thresholds: GradeThresholds,

    /// Logistic curve mapping the composite score to a percentile
    #[serde(default)]
    pub percentile: PercentileCurve,

    /// Maximum sessions scored concurrently in batch mode
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,

    /// Output directory for result files
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            dimension_weights: DimensionWeights::default(),
            grade_thresholds: GradeThresholds::default(),
            percentile: PercentileCurve::default(),
            parallelism: default_parallelism(),
            output_dir: default_output_dir(),
        }
    }
}

/// Dimension weights; must sum to 1.0
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DimensionWeights {
    #[serde(default = "default_prompt_quality_weight")]
    pub prompt_quality: f64,

    #[serde(default = "default_response_quality_weight")]
    pub response_quality: f64,

    #[serde(default = "default_efficiency_weight")]
    pub efficiency: f64,

    #[serde(default = "default_speed_weight")]
    pub speed: f64,

    #[serde(default = "default_iteration_iq_weight")]
    pub iteration_iq: f64,
}

impl Default for DimensionWeights {
    fn default() -> Self {
        Self {
            prompt_quality: default_prompt_quality_weight(),
            response_quality: default_response_quality_weight(),
            efficiency: default_efficiency_weight(),
            speed: default_speed_weight(),
            iteration_iq: default_iteration_iq_weight(),
        }
    }
}

impl DimensionWeights {
    pub fn sum(&self) -> f64 {
        self.prompt_quality + self.response_quality + self.efficiency + self.speed
            + self.iteration_iq
    }

    /// Weights with their names, for validation messages
    pub fn named(&self) -> [(&'static str, f64); 5] {
        [
            ("prompt_quality", self.prompt_quality),
            ("response_quality", self.response_quality),
            ("efficiency", self.efficiency),
            ("speed", self.speed),
            ("iteration_iq", self.iteration_iq),
        ]
    }
}

fn default_prompt_quality_weight() -> f64 {
    0.30
}

fn default_response_quality_weight() -> f64 {
    0.25
}

fn default_efficiency_weight() -> f64 {
    0.15
}

fn default_speed_weight() -> f64 {
    0.15
}

fn default_iteration_iq_weight() -> f64 {
    0.15
}

/// Inclusive lower bounds for the letter grades; anything below `d` is an F
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GradeThresholds {
    #[serde(default = "default_s_threshold")]
    pub s: u32,

    #[serde(default = "default_a_threshold")]
    pub a: u32,

    #[serde(default = "default_b_threshold")]
    pub b: u32,

    #[serde(default = "default_c_threshold")]
    pub c: u32,

    #[serde(default = "default_d_threshold")]
    pub d: u32,
}

impl Default for GradeThresholds {
    fn default() -> Self {
        Self {
            s: default_s_threshold(),
            a: default_a_threshold(),
            b: default_b_threshold(),
            c: default_c_threshold(),
            d: default_d_threshold(),
        }
    }
}

fn default_s_threshold() -> u32 {
    95
}

fn default_a_threshold() -> u32 {
    80
}

fn default_b_threshold() -> u32 {
    65
}

fn default_c_threshold() -> u32 {
    50
}

fn default_d_threshold() -> u32 {
    35
}

/// Logistic percentile curve. The constants are part of the product
/// contract shared with downstream consumers; change them and previously
/// issued percentiles stop lining up.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PercentileCurve {
    /// Composite score mapped to the 50th percentile
    #[serde(default = "default_percentile_center")]
    pub center: f64,

    /// How many score points one logistic unit spans
    #[serde(default = "default_percentile_spread")]
    pub spread: f64,
}

impl Default for PercentileCurve {
    fn default() -> Self {
        Self {
            center: default_percentile_center(),
            spread: default_percentile_spread(),
        }
    }
}

fn default_percentile_center() -> f64 {
    58.0
}

fn default_percentile_spread() -> f64 {
    15.0
}

fn default_parallelism() -> usize {
    4
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./score-results")
}

impl ScoringConfig {
    /// Load configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .context(format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: ScoringConfig =
            serde_yaml::from_str(&content).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;
        std::fs::write(path.as_ref(), content)
            .context(format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Reject configurations that would make scores meaningless
    pub fn validate(&self) -> Result<(), ScoreError> {
        for (name, value) in self.dimension_weights.named() {
            if !(0.0..=1.0).contains(&value) {
                return Err(ScoreError::WeightRange { name, value });
            }
        }

        let sum = self.dimension_weights.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ScoreError::WeightSum { sum });
        }

        let t = &self.grade_thresholds;
        let descending = t.s > t.a && t.a > t.b && t.b > t.c && t.c > t.d;
        if !descending || t.s > 100 {
            return Err(ScoreError::GradeOrder);
        }

        if self.percentile.spread <= 0.0 {
            return Err(ScoreError::PercentileSpread {
                spread: self.percentile.spread,
            });
        }

        if self.parallelism == 0 {
            return Err(ScoreError::Parallelism);
        }

        Ok(())
    }
}
