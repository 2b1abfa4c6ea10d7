use bazaar_core::types::{MarketAnalysis, PricePoint, TrendDirection};
use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;

/// Slope magnitude below which the trend is considered flat.
const TREND_THRESHOLD: f64 = 0.001;

/// Sample count needed before confidence is derived from the data rather
/// than pinned to a fixed low value.
const MIN_CONFIDENT_SAMPLES: usize = 10;

const LOW_SAMPLE_CONFIDENCE: f64 = 0.5;
const CONFIDENCE_FLOOR: f64 = 0.1;
const CONFIDENCE_CEILING: f64 = 0.95;

/// Computes trend direction, trend strength, and volatility from a
/// time-ordered price series for one category.
///
/// Never fails: degenerate inputs produce a low-confidence stable report.
pub struct MarketAnalyzer;

impl MarketAnalyzer {
    /// Analyzes a category's price history.
    ///
    /// The trend slope comes from an ordinary-least-squares regression of
    /// price against time. Strength and volatility are normalized by the
    /// mean price so categories with different price levels compare fairly.
    #[must_use]
    pub fn analyze(category: &str, history: &[PricePoint]) -> MarketAnalysis {
        if history.len() < 2 {
            return MarketAnalysis {
                category: category.to_string(),
                trend_direction: TrendDirection::Stable,
                trend_strength: 0.0,
                volatility_index: 0.0,
                confidence: CONFIDENCE_FLOOR,
                generated_at: Utc::now(),
            };
        }

        let prices: Vec<f64> = history
            .iter()
            .map(|p| p.price.to_f64().unwrap_or_default())
            .collect();
        let times: Vec<f64> = {
            let origin = history[0].timestamp;
            history
                .iter()
                .map(|p| (p.timestamp - origin).num_seconds() as f64)
                .collect()
        };

        let slope = ols_slope(&times, &prices);
        let mean = prices.iter().sum::<f64>() / prices.len() as f64;
        let std_dev = {
            let variance =
                prices.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / prices.len() as f64;
            variance.sqrt()
        };

        let trend_direction = if slope > TREND_THRESHOLD {
            TrendDirection::Up
        } else if slope < -TREND_THRESHOLD {
            TrendDirection::Down
        } else {
            TrendDirection::Stable
        };

        let trend_strength = if mean.abs() > f64::EPSILON {
            slope.abs() / mean
        } else {
            0.0
        };
        let volatility_index = if mean.abs() > f64::EPSILON {
            std_dev / mean
        } else {
            0.0
        };

        let confidence = if history.len() < MIN_CONFIDENT_SAMPLES {
            LOW_SAMPLE_CONFIDENCE
        } else {
            let sample_factor = (history.len() as f64 / 100.0).min(1.0);
            let stability_factor = 1.0 - volatility_index.min(1.0);
            (sample_factor * stability_factor).clamp(CONFIDENCE_FLOOR, CONFIDENCE_CEILING)
        };

        MarketAnalysis {
            category: category.to_string(),
            trend_direction,
            trend_strength,
            volatility_index,
            confidence,
            generated_at: Utc::now(),
        }
    }
}

/// Ordinary least squares slope of y over x. Returns 0 for a degenerate
/// (constant-x) series.
fn ols_slope(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        numerator += (xi - mean_x) * (yi - mean_y);
        denominator += (xi - mean_x).powi(2);
    }
    if denominator.abs() < f64::EPSILON {
        0.0
    } else {
        numerator / denominator
    }
}
