//! Statistics Unit Tests.
//!
//! Verifies rate arithmetic (including the NaN convention for empty
//! categories) and the exact shape of the policy comparison table.

use rvcache_core::stats::{comparison_table, CacheStats};

/// Rates divide hits by accesses in percent.
#[test]
fn rates_are_percentages() {
    let stats = CacheStats {
        instr_access: 16,
        instr_hit: 15,
        data_access: 8,
        data_hit: 2,
        ..CacheStats::default()
    };

    assert_eq!(stats.total_access(), 24);
    assert_eq!(stats.total_hit(), 17);
    assert!((stats.instr_hit_rate() - 93.75).abs() < 1e-9);
    assert!((stats.data_hit_rate() - 25.0).abs() < 1e-9);
    assert!((stats.hit_rate() - 17.0 / 24.0 * 100.0).abs() < 1e-9);
}

/// Empty categories yield NaN, independently per category.
#[test]
fn empty_categories_are_nan() {
    let stats = CacheStats {
        instr_access: 4,
        instr_hit: 3,
        ..CacheStats::default()
    };

    assert!(!stats.instr_hit_rate().is_nan());
    assert!(stats.data_hit_rate().is_nan());
    assert!(!stats.hit_rate().is_nan(), "the overall stream is non-empty");

    let empty = CacheStats::default();
    assert!(empty.hit_rate().is_nan());
    assert!(empty.instr_hit_rate().is_nan());
    assert!(empty.data_hit_rate().is_nan());
}

/// The table carries the fixed header and one row per policy.
#[test]
fn table_shape() {
    let lru = CacheStats {
        instr_access: 16,
        instr_hit: 15,
        ..CacheStats::default()
    };
    let plru = CacheStats::default();
    let table = comparison_table(&lru, &plru);
    let lines: Vec<&str> = table.lines().collect();

    assert_eq!(lines.len(), 4);
    assert_eq!(
        lines[0],
        "| replacement | hit_rate | instr_hit_rate | data_hit_rate | instr_access | instr_hit | data_access | data_hit |"
    );
    assert_eq!(
        lines[1],
        "| :---------- | :-----: | -------------: | ------------: | -----------: | ---------: | ----------: | --------: |"
    );
    assert!(lines[2].starts_with("| LRU |"));
    assert!(lines[3].starts_with("| bpLRU |"));
}

/// Rates print with four decimals; empty categories read literally `nan%`.
#[test]
fn table_rate_formatting() {
    let lru = CacheStats {
        instr_access: 16,
        instr_hit: 15,
        ..CacheStats::default()
    };
    let plru = CacheStats::default();
    let table = comparison_table(&lru, &plru);
    let lines: Vec<&str> = table.lines().collect();

    assert_eq!(
        lines[2],
        "| LRU | 93.7500% | 93.7500% | nan% |           16 |           15 |            0 |            0 |"
    );
    assert_eq!(
        lines[3],
        "| bpLRU | nan% | nan% | nan% |            0 |            0 |            0 |            0 |"
    );
}

/// Counters render right-aligned in twelve columns.
#[test]
fn table_counter_alignment() {
    let stats = CacheStats {
        instr_access: 123_456_789,
        instr_hit: 1,
        data_access: 2,
        data_hit: 2,
        ..CacheStats::default()
    };
    let table = comparison_table(&stats, &stats);
    assert!(table.contains("|    123456789 |"));
}
