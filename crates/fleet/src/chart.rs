//! Hourly hashrate chart across all pools of a fetch round.
//!
//! Pools are sampled independently, so any hour may hold values for only
//! some of them. Each [`ChartPoint`] carries one slot per pool, aligned with
//! the pool's position in the stats response, and `None` marks "no data".

use chrono::{DateTime, Utc};
use poolwatch_storage::models::HourlySample;
use serde::Serialize;
use std::collections::HashMap;

/// Position of each pool in the response, in emission order.
#[derive(Debug, Clone, Default)]
pub struct PoolIndex {
    positions: HashMap<i64, usize>,
    len: usize,
}

impl PoolIndex {
    /// Assign the next position to `pool_id` and return it.
    pub fn push(&mut self, pool_id: i64) -> usize {
        let position = self.len;
        self.positions.insert(pool_id, position);
        self.len += 1;
        position
    }

    pub fn position(&self, pool_id: i64) -> Option<usize> {
        self.positions.get(&pool_id).copied()
    }

    /// Number of pools in the response, which is the width of every chart point.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl FromIterator<i64> for PoolIndex {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        let mut index = Self::default();
        for pool_id in iter {
            index.push(pool_id);
        }
        index
    }
}

/// Per-pool hashrates for one hour, in kH/s.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    #[serde(with = "chrono::serde::ts_seconds")]
    pub hour: DateTime<Utc>,
    pub kh: Vec<Option<f64>>,
}

impl ChartPoint {
    fn empty(hour: DateTime<Utc>, width: usize) -> Self {
        Self {
            hour,
            kh: vec![None; width],
        }
    }
}

/// Merge hourly samples (ascending by hour) into one point per hour.
///
/// Samples of pools missing from `index` are dropped without opening a point.
pub fn build_chart(index: &PoolIndex, samples: &[HourlySample]) -> Vec<ChartPoint> {
    if index.is_empty() {
        return Vec::new();
    }

    let mut chart: Vec<ChartPoint> = Vec::new();

    for sample in samples {
        let Some(position) = index.position(sample.pool) else {
            continue;
        };

        if chart.last().map(|point| point.hour) != Some(sample.hour) {
            chart.push(ChartPoint::empty(sample.hour, index.len()));
        }
        if let Some(point) = chart.last_mut() {
            point.kh[position] = sample.hashrate.map(round_kh);
        }
    }

    chart
}

/// Convert a hashrate in H/s to kH/s, keeping roughly three significant
/// digits: 0 decimals from 100 kH/s, 1 from 10, 2 from 1, 3 below.
pub fn round_kh(hashrate: f64) -> f64 {
    let kh = hashrate / 1000.0;
    let places = if kh >= 100.0 {
        0
    } else if kh >= 10.0 {
        1
    } else if kh >= 1.0 {
        2
    } else {
        3
    };
    round_half_up(kh, places)
}

/// Round half away from zero on the shortest decimal form of `value`, so
/// that 9.995 becomes 10.00 even though its binary value sits just below.
fn round_half_up(value: f64, places: usize) -> f64 {
    if !value.is_finite() {
        return value;
    }

    let repr = value.abs().to_string();
    let (int_part, frac_part) = repr.split_once('.').unwrap_or((repr.as_str(), ""));
    if frac_part.len() <= places {
        return value;
    }

    let mut digits: Vec<u8> = int_part
        .bytes()
        .chain(frac_part.bytes().take(places))
        .map(|b| b - b'0')
        .collect();

    if frac_part.as_bytes()[places] >= b'5' {
        let mut carry = true;
        for digit in digits.iter_mut().rev() {
            if *digit == 9 {
                *digit = 0;
            } else {
                *digit += 1;
                carry = false;
                break;
            }
        }
        if carry {
            digits.insert(0, 1);
        }
    }

    let split = digits.len() - places;
    let mut text: String = digits[..split].iter().map(|d| char::from(b'0' + d)).collect();
    if places > 0 {
        text.push('.');
        text.extend(digits[split..].iter().map(|d| char::from(b'0' + d)));
    }

    text.parse::<f64>().map_or(value, |rounded| rounded.copysign(value))
}
