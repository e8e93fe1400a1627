//! Simulation statistics collection and reporting.
//!
//! This module tracks cache performance metrics for the simulator. It provides:
//! 1. **Counters:** Access and hit counts for the instruction and data streams,
//!    with the data stream further split into reads and writes.
//! 2. **Eviction Accounting:** Eviction and write-back counts for observability.
//! 3. **Rates:** Percentage hit rates per category; empty categories yield NaN.
//! 4. **Reporting:** The two-row policy comparison table printed to stdout.

use crate::common::data::AccessType;

/// Cache statistics structure tracking one run's access counters.
///
/// All counters start at zero and only ever increase. The four mandatory
/// counters (`instr_access`, `instr_hit`, `data_access`, `data_hit`) feed the
/// comparison table; the remaining counters exist for diagnostics and tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct CacheStats {
    /// Instruction fetches routed through the cache.
    pub instr_access: u64,
    /// Instruction fetches that hit a resident line.
    pub instr_hit: u64,
    /// Data accesses (loads and stores combined).
    pub data_access: u64,
    /// Data accesses that hit a resident line.
    pub data_hit: u64,

    /// Data loads routed through the cache.
    pub data_read_access: u64,
    /// Data loads that hit.
    pub data_read_hit: u64,
    /// Data stores routed through the cache.
    pub data_write_access: u64,
    /// Data stores that hit.
    pub data_write_hit: u64,

    /// Valid lines replaced by a miss.
    pub evictions: u64,
    /// Dirty lines copied back to memory (evictions and flushes).
    pub writebacks: u64,
}

impl CacheStats {
    /// Counts one access against its category. Called on every access,
    /// hit or miss.
    pub(crate) fn record_access(&mut self, access: AccessType) {
        match access {
            AccessType::Fetch => self.instr_access += 1,
            AccessType::Read => {
                self.data_access += 1;
                self.data_read_access += 1;
            }
            AccessType::Write => {
                self.data_access += 1;
                self.data_write_access += 1;
            }
        }
    }

    /// Counts one hit against its category.
    pub(crate) fn record_hit(&mut self, access: AccessType) {
        match access {
            AccessType::Fetch => self.instr_hit += 1,
            AccessType::Read => {
                self.data_hit += 1;
                self.data_read_hit += 1;
            }
            AccessType::Write => {
                self.data_hit += 1;
                self.data_write_hit += 1;
            }
        }
    }

    /// Total accesses across both streams.
    pub fn total_access(&self) -> u64 {
        self.instr_access + self.data_access
    }

    /// Total hits across both streams.
    pub fn total_hit(&self) -> u64 {
        self.instr_hit + self.data_hit
    }

    /// Combined hit rate in percent; NaN when no accesses were made.
    pub fn hit_rate(&self) -> f64 {
        percentage(self.total_hit(), self.total_access())
    }

    /// Instruction-stream hit rate in percent; NaN when no fetches were made.
    pub fn instr_hit_rate(&self) -> f64 {
        percentage(self.instr_hit, self.instr_access)
    }

    /// Data-stream hit rate in percent; NaN when no data accesses were made.
    pub fn data_hit_rate(&self) -> f64 {
        percentage(self.data_hit, self.data_access)
    }
}

/// Hit percentage for one category. An empty category divides zero by zero
/// and deliberately produces NaN, which the table renders as `nan%`.
fn percentage(hits: u64, accesses: u64) -> f64 {
    hits as f64 / accesses as f64 * 100.0
}

/// Formats a rate cell: four decimals, or the literal `nan%` for an empty
/// category.
fn format_rate(rate: f64) -> String {
    if rate.is_nan() {
        "nan%".to_string()
    } else {
        format!("{:3.4}%", rate)
    }
}

/// Formats one table row for a policy run.
fn table_row(label: &str, stats: &CacheStats) -> String {
    format!(
        "| {} | {} | {} | {} | {:12} | {:12} | {:12} | {:12} |",
        label,
        format_rate(stats.hit_rate()),
        format_rate(stats.instr_hit_rate()),
        format_rate(stats.data_hit_rate()),
        stats.instr_access,
        stats.instr_hit,
        stats.data_access,
        stats.data_hit,
    )
}

/// Renders the two-row markdown comparison table for both policy runs.
///
/// Columns: replacement, hit_rate, instr_hit_rate, data_hit_rate,
/// instr_access, instr_hit, data_access, data_hit. Rows: `LRU`, `bpLRU`.
pub fn comparison_table(lru: &CacheStats, plru: &CacheStats) -> String {
    let mut out = String::new();
    out.push_str(
        "| replacement | hit_rate | instr_hit_rate | data_hit_rate | instr_access | instr_hit | data_access | data_hit |\n",
    );
    out.push_str(
        "| :---------- | :-----: | -------------: | ------------: | -----------: | ---------: | ----------: | --------: |\n",
    );
    out.push_str(&table_row("LRU", lru));
    out.push('\n');
    out.push_str(&table_row("bpLRU", plru));
    out.push('\n');
    out
}

/// Prints the comparison table to stdout.
pub fn print_comparison(lru: &CacheStats, plru: &CacheStats) {
    print!("{}", comparison_table(lru, plru));
}
