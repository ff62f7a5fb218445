//! Offline generator for labelled prep-time data.
//!
//! Label model, minutes:
//! `8 + 1.8·items + peak·U(2,6) + 0.7·delay + weekend·2.5 + N(0,3)`, floored at 3.

use std::collections::BTreeSet;
use std::path::Path;

use rand::distributions::WeightedIndex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp, Normal};
use tracing::info;

use crate::common::error::{PrepError, PrepResult};
use crate::inference::domain::is_peak;

use super::domain::{hour_probabilities, SynthConfig, SynthSummary, SyntheticOrderRecord};
use super::repo_fs;

const BASE_PREP_MINUTES: f64 = 8.0;
const PER_ITEM_MINUTES: f64 = 1.8;
const DELAY_WEIGHT: f64 = 0.7;
const WEEKEND_SURGE_MINUTES: f64 = 2.5;
const LABEL_NOISE_STD: f64 = 3.0;
const MIN_PREP_MINUTES: f64 = 3.0;
const MAX_ITEMS: u32 = 11;

/// Generate records in memory. Identical configs yield identical output.
pub fn generate(cfg: &SynthConfig) -> PrepResult<Vec<SyntheticOrderRecord>> {
    cfg.validate()?;
    let mut rng = StdRng::seed_from_u64(cfg.seed);

    let base_delay = Exp::new(1.0 / cfg.mean_vendor_delay).map_err(distribution)?;
    let hours = WeightedIndex::new(hour_probabilities()).map_err(distribution)?;
    let delay_noise = Normal::new(0.0, 1.0).map_err(distribution)?;
    let label_noise = Normal::new(0.0, LABEL_NOISE_STD).map_err(distribution)?;

    // Drawn before any order so vendor traits do not depend on order volume.
    let vendor_delay: Vec<f64> = (0..cfg.n_vendors)
        .map(|_| round2(base_delay.sample(&mut rng)))
        .collect();

    let mut records = Vec::with_capacity(cfg.n_orders);
    for _ in 0..cfg.n_orders {
        let vendor_id = rng.gen_range(1..=cfg.n_vendors);
        let order_hour = hours.sample(&mut rng) as u32;
        let day_of_week = rng.gen_range(0..7u32);
        let item_count = rng.gen_range(1..=MAX_ITEMS);
        let is_peak_hour = is_peak(order_hour);
        let rush_penalty = rng.gen_range(2.0..6.0);

        let vendor_base = vendor_delay[(vendor_id - 1) as usize];
        let historical_delay_avg = (vendor_base + delay_noise.sample(&mut rng)).max(0.0);
        let weekend = day_of_week >= 5;

        let prep_time = BASE_PREP_MINUTES
            + PER_ITEM_MINUTES * f64::from(item_count)
            + if is_peak_hour { rush_penalty } else { 0.0 }
            + DELAY_WEIGHT * historical_delay_avg
            + if weekend { WEEKEND_SURGE_MINUTES } else { 0.0 }
            + label_noise.sample(&mut rng);

        records.push(SyntheticOrderRecord {
            vendor_id,
            order_hour,
            day_of_week,
            item_count,
            is_peak_hour,
            historical_delay_avg: round2(historical_delay_avg),
            prep_time_minutes: round2(prep_time.max(MIN_PREP_MINUTES)),
        });
    }
    Ok(records)
}

/// Generate and write the flat file, returning run statistics.
pub fn synthesize(cfg: &SynthConfig, out: &Path) -> PrepResult<SynthSummary> {
    let records = generate(cfg)?;
    repo_fs::write_csv(out, &records)?;
    let summary = summarize(&records);
    info!(
        rows = summary.rows,
        vendors = summary.vendors_seen,
        mean_prep_time = summary.mean_prep_time,
        path = %out.display(),
        "synthetic dataset written"
    );
    Ok(summary)
}

pub fn summarize(records: &[SyntheticOrderRecord]) -> SynthSummary {
    let vendors: BTreeSet<u64> = records.iter().map(|r| r.vendor_id).collect();
    let mean_prep_time = if records.is_empty() {
        0.0
    } else {
        records.iter().map(|r| r.prep_time_minutes).sum::<f64>() / records.len() as f64
    };
    SynthSummary {
        rows: records.len(),
        vendors_seen: vendors.len(),
        mean_prep_time,
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn distribution(err: impl std::fmt::Display) -> PrepError {
    PrepError::config(format!("invalid distribution parameters: {err}"))
}
