//! Statistics Accumulator

use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::{Mutex, OnceLock};

/// Return the global statistics accumulator.
pub fn stats_accumulator() -> &'static Mutex<StatsAccumulator> {
    static DATA: OnceLock<Mutex<StatsAccumulator>> = OnceLock::new();
    DATA.get_or_init(|| Mutex::new(StatsAccumulator::default()))
}

/// Integer distribution statistic.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct StatsDistribution {
    sum: i64,
    count: u64,
    min: Option<i64>,
    max: Option<i64>,
}

impl StatsDistribution {
    /// Report a sample value.
    ///
    /// * `val` - Sample value.
    pub fn report(&mut self, val: i64) {
        self.sum += val;
        self.count += 1;
        self.min = Some(self.min.map_or(val, |m| m.min(val)));
        self.max = Some(self.max.map_or(val, |m| m.max(val)));
    }

    /// Merge another distribution into this one.
    ///
    /// * `other` - The other distribution.
    pub fn accumulate(&mut self, other: &Self) {
        self.sum += other.sum;
        self.count += other.count;
        self.min = match (self.min, other.min) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.max = match (self.max, other.max) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }

    /// Returns the mean sample value.
    pub fn average(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum as f64 / self.count as f64)
    }

    /// Clear stats.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// A single accumulated statistic.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum StatValue {
    /// Event count.
    Counter(i64),

    /// Memory in bytes.
    Memory(u64),

    /// Integer distribution.
    Distribution(StatsDistribution),

    /// Numerator and denominator printed as a percentage.
    Percent(i64, i64),

    /// Numerator and denominator printed as a ratio.
    Ratio(i64, i64),
}

impl StatValue {
    /// Merge another value of the same kind.
    fn merge(&mut self, other: &StatValue) {
        match (self, other) {
            (StatValue::Counter(a), StatValue::Counter(b)) => *a += b,
            (StatValue::Memory(a), StatValue::Memory(b)) => *a += b,
            (StatValue::Distribution(a), StatValue::Distribution(b)) => a.accumulate(b),
            (StatValue::Percent(a, b), StatValue::Percent(c, d))
            | (StatValue::Ratio(a, b), StatValue::Ratio(c, d)) => {
                *a += c;
                *b += d;
            }
            (a, b) => panic!("statistic kind mismatch {:?} vs {:?}", a, b),
        }
    }

    /// Returns the value formatted for the report or `None` if there is
    /// nothing to show.
    fn format(&self) -> Option<String> {
        match *self {
            StatValue::Counter(0) | StatValue::Memory(0) => None,
            StatValue::Counter(v) => Some(format!("{v:>12}")),
            StatValue::Memory(v) => {
                let kb = v as f64 / 1024.0;
                Some(if kb < 1024.0 {
                    format!("{kb:>12.2} kB")
                } else if kb < 1024.0 * 1024.0 {
                    format!("{:>12.2} MiB", kb / 1024.0)
                } else {
                    format!("{:>12.2} GiB", kb / (1024.0 * 1024.0))
                })
            }
            StatValue::Distribution(d) => d.average().map(|avg| {
                format!(
                    "{avg:>12.3} avg [range {} - {}]",
                    d.min.unwrap_or_default(),
                    d.max.unwrap_or_default()
                )
            }),
            StatValue::Percent(_, 0) | StatValue::Ratio(_, 0) => None,
            StatValue::Percent(n, d) => {
                Some(format!("{n:>12} / {d:>12} ({:.2}%)", 100.0 * n as f64 / d as f64))
            }
            StatValue::Ratio(n, d) => {
                Some(format!("{n:>12} / {d:>12} ({:.2}x)", n as f64 / d as f64))
            }
        }
    }
}

/// Aggregates statistics reported by worker threads. Names use `/` to
/// separate a category from the title, e.g. `"TriTree/Leaf nodes"`.
#[derive(Default)]
pub struct StatsAccumulator {
    stats: BTreeMap<String, StatValue>,
}

impl StatsAccumulator {
    /// Accumulates a value.
    ///
    /// * `name` - Statistic name.
    /// * `val`  - Value to merge.
    pub fn report(&mut self, name: &str, val: StatValue) {
        match self.stats.get_mut(name) {
            Some(v) => v.merge(&val),
            None => {
                self.stats.insert(name.to_string(), val);
            }
        }
    }

    /// Accumulates a counter value.
    pub fn report_counter(&mut self, name: &str, val: i64) {
        self.report(name, StatValue::Counter(val));
    }

    /// Accumulates a memory counter value in bytes.
    pub fn report_memory_counter(&mut self, name: &str, val: u64) {
        self.report(name, StatValue::Memory(val));
    }

    /// Accumulates integer distribution samples.
    pub fn report_int_distribution(&mut self, name: &str, distrib: StatsDistribution) {
        self.report(name, StatValue::Distribution(distrib));
    }

    /// Accumulates a percentage.
    pub fn report_percentage(&mut self, name: &str, num: i64, denom: i64) {
        self.report(name, StatValue::Percent(num, denom));
    }

    /// Accumulates a ratio.
    pub fn report_ratio(&mut self, name: &str, num: i64, denom: i64) {
        self.report(name, StatValue::Ratio(num, denom));
    }

    /// Returns an accumulated value.
    ///
    /// * `name` - Statistic name.
    pub fn get(&self, name: &str) -> Option<&StatValue> {
        self.stats.get(name)
    }

    /// Returns the report grouped by category.
    pub fn report_string(&self) -> String {
        let mut out = String::from("Statistics:\n");
        let mut current_category = None;
        for (name, value) in self.stats.iter() {
            let Some(v) = value.format() else {
                continue;
            };
            let (category, title) = name.split_once('/').unwrap_or(("", name.as_str()));
            if current_category != Some(category) {
                let _ = writeln!(out, "  {category}");
                current_category = Some(category);
            }
            let _ = writeln!(out, "    {title:<42}{v}");
        }
        out
    }

    /// Prints the report.
    pub fn print(&self) {
        print!("{}", self.report_string());
    }

    /// Clear the accumulated statistics.
    pub fn clear(&mut self) {
        self.stats.clear();
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_merge() {
        let mut accum = StatsAccumulator::default();
        accum.report_counter("A/x", 2);
        accum.report_counter("A/x", 3);
        accum.report_ratio("A/y", 1, 4);
        accum.report_ratio("A/y", 1, 0);
        assert_eq!(accum.get("A/x"), Some(&StatValue::Counter(5)));
        assert_eq!(accum.get("A/y"), Some(&StatValue::Ratio(2, 4)));
    }

    #[test]
    fn distribution_tracks_range() {
        let mut d = StatsDistribution::default();
        assert_eq!(d.average(), None);
        [4, 1, 7].into_iter().for_each(|v| d.report(v));
        let mut e = StatsDistribution::default();
        e.report(10);
        d.accumulate(&e);
        assert_eq!(d.average(), Some(5.5));
        assert_eq!(d.min, Some(1));
        assert_eq!(d.max, Some(10));
    }

    #[test]
    fn report_skips_empty_values() {
        let mut accum = StatsAccumulator::default();
        accum.report_counter("Cat/zero", 0);
        accum.report_percentage("Cat/hits", 1, 2);
        let s = accum.report_string();
        assert!(!s.contains("zero"));
        assert!(s.contains("(50.00%)"));
    }

    #[test]
    #[should_panic]
    fn mismatched_kinds_panic() {
        let mut accum = StatsAccumulator::default();
        accum.report_counter("A/x", 1);
        accum.report_memory_counter("A/x", 1);
    }
}
