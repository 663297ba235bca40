use super::types::{Histogram, HistogramBin, HistogramStats};

pub const DEFAULT_HISTOGRAM_BINS: u32 = 20;

/// Equal-width histogram over the strictly positive, finite values of one
/// year bucket.
pub fn histogram(values: &[f64], bins: u32) -> Histogram {
    let positive = values
        .iter()
        .copied()
        .filter(|v| *v > 0.0 && v.is_finite())
        .collect::<Vec<_>>();
    if positive.is_empty() || bins == 0 {
        return Histogram {
            bins: Vec::new(),
            stats: HistogramStats {
                min: 0.0,
                max: 0.0,
                mean: 0.0,
                count: 0,
            },
        };
    }

    let min = positive.iter().copied().fold(f64::INFINITY, f64::min);
    let max = positive.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let len = positive.len() as f64;
    let mean = positive.iter().map(|v| v / len).sum::<f64>();
    let range = max - min;
    let width = if range > 0.0 { range / bins as f64 } else { 1.0 };

    let mut counts = vec![0_u32; bins as usize];
    for value in &positive {
        let idx = (((value - min) / width).floor() as usize).min(bins as usize - 1);
        counts[idx] += 1;
    }

    let bins = counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            start: min + i as f64 * width,
            end: min + (i + 1) as f64 * width,
            count,
        })
        .collect();

    Histogram {
        bins,
        stats: HistogramStats {
            min,
            max,
            mean,
            count: positive.len() as u32,
        },
    }
}
