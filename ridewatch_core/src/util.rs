//! Small numeric and I/O helpers shared across ridewatch_core.

use std::io::Write;
use std::path::Path;
use std::time::Duration;

/// Arithmetic mean accumulated in f64. Empty input yields 0.
#[inline]
pub fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let sum: f64 = values.iter().map(|&v| f64::from(v)).sum();
    (sum / values.len() as f64) as f32
}

/// Mean squared deviation of `values` around `center`. Empty input yields 0.
#[inline]
pub fn mean_sq_dev(values: &[f32], center: f32) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let c = f64::from(center);
    let acc: f64 = values
        .iter()
        .map(|&v| {
            let d = f64::from(v) - c;
            d * d
        })
        .sum();
    (acc / values.len() as f64) as f32
}

/// Population variance (divides by n, not n - 1).
#[inline]
pub fn variance(values: &[f32]) -> f32 {
    mean_sq_dev(values, mean(values))
}

/// Whole milliseconds in `d`, saturating at `u64::MAX`.
#[inline]
pub fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Replace `path` with `bytes` so readers never observe a partial file:
/// write a sibling temp file, fsync it, then rename over the target.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = Path::new(&tmp_name);
    let mut f = std::fs::File::create(tmp)?;
    f.write_all(bytes)?;
    f.sync_all()?;
    drop(f);
    std::fs::rename(tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_and_variance_of_known_series() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((mean(&v) - 5.0).abs() < 1e-6);
        assert!((variance(&v) - 4.0).abs() < 1e-6);
    }

    #[test]
    fn empty_inputs_are_zero() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(variance(&[]), 0.0);
        assert_eq!(mean_sq_dev(&[], 3.0), 0.0);
    }

    #[test]
    fn mean_sq_dev_around_offset_center() {
        // deviations 1 and 1 around 2 → 1
        assert!((mean_sq_dev(&[1.0, 3.0], 2.0) - 1.0).abs() < 1e-6);
        // deviations 2 and 0 around 3 → 2
        assert!((mean_sq_dev(&[1.0, 3.0], 3.0) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn duration_ms_truncates() {
        assert_eq!(duration_ms(Duration::from_micros(2_999)), 2);
    }
}
