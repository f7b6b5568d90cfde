//! FILENAME: tests/common/mod.rs
//! Fixtures for pivot-engine integration tests.

#![allow(dead_code)]

use engine::{AggregationKind, DimensionValue, QueryResult, ResultColumn};
use pivot_engine::{DisplayKind, DisplayRow};

/// Orders counted by user source and product category.
pub struct OrdersFixture;

impl OrdersFixture {
    pub const SOURCES: [&'static str; 5] = ["Affiliate", "Facebook", "Google", "Organic", "Twitter"];
    pub const CATEGORIES: [&'static str; 4] = ["Doohickey", "Gadget", "Gizmo", "Widget"];

    /// Counts indexed as [source][category].
    pub const COUNTS: [[i64; 4]; 5] = [
        [899, 961, 849, 811],
        [781, 877, 880, 1011],
        [838, 1040, 895, 1029],
        [835, 999, 911, 1069],
        [960, 1133, 1019, 963],
    ];

    pub const GRAND_TOTAL: f64 = 18760.0;
    pub const DOOHICKEY_TOTAL: f64 = 4313.0;
    pub const AFFILIATE_TOTAL: f64 = 3520.0;

    pub fn columns() -> Vec<ResultColumn> {
        vec![
            ResultColumn::dimension("SOURCE", "User → Source"),
            ResultColumn::dimension("CATEGORY", "Product → Category"),
            ResultColumn::measure("count", "Count", AggregationKind::Count),
        ]
    }

    /// Leaf rows only.
    pub fn result() -> QueryResult {
        let mut result = QueryResult::new(Self::columns());
        for (s, source) in Self::SOURCES.iter().enumerate() {
            for (c, category) in Self::CATEGORIES.iter().enumerate() {
                result.push_row(vec![
                    (*source).into(),
                    (*category).into(),
                    Self::COUNTS[s][c].into(),
                ]);
            }
        }
        result
    }

    /// Leaf rows plus the rolled-up rows a pivot query returns.
    pub fn result_with_subtotals() -> QueryResult {
        let mut columns = Self::columns();
        columns.push(ResultColumn::pivot_grouping());
        let mut result = QueryResult::new(columns);
        for (s, source) in Self::SOURCES.iter().enumerate() {
            for (c, category) in Self::CATEGORIES.iter().enumerate() {
                result.push_row(vec![
                    (*source).into(),
                    (*category).into(),
                    Self::COUNTS[s][c].into(),
                    0i64.into(),
                ]);
            }
        }
        for (s, source) in Self::SOURCES.iter().enumerate() {
            let total: i64 = Self::COUNTS[s].iter().sum();
            result.push_row(vec![(*source).into(), DimensionValue::Null, total.into(), 2i64.into()]);
        }
        for (c, category) in Self::CATEGORIES.iter().enumerate() {
            let total: i64 = Self::COUNTS.iter().map(|row| row[c]).sum();
            result.push_row(vec![DimensionValue::Null, (*category).into(), total.into(), 1i64.into()]);
        }
        result.push_row(vec![
            DimensionValue::Null,
            DimensionValue::Null,
            (Self::GRAND_TOTAL as i64).into(),
            3i64.into(),
        ]);
        result
    }

    pub fn count(source: &str, category: &str) -> f64 {
        let s = Self::SOURCES.iter().position(|x| *x == source).unwrap_or(0);
        let c = Self::CATEGORIES.iter().position(|x| *x == category).unwrap_or(0);
        Self::COUNTS[s][c] as f64
    }
}

/// Orders counted by category, source and year; used for three-level nesting.
pub struct YearlyFixture;

impl YearlyFixture {
    pub fn result() -> QueryResult {
        let mut result = QueryResult::new(vec![
            ResultColumn::dimension("CATEGORY", "Product → Category"),
            ResultColumn::dimension("SOURCE", "User → Source"),
            ResultColumn::dimension("CREATED_AT", "Created At: Year"),
            ResultColumn::measure("count", "Count", AggregationKind::Count),
        ]);
        let rows: [(&str, &str, i64, i64); 8] = [
            ("Doohickey", "Affiliate", 2023, 215),
            ("Doohickey", "Affiliate", 2024, 301),
            ("Doohickey", "Google", 2023, 188),
            ("Doohickey", "Google", 2024, 240),
            ("Gadget", "Affiliate", 2023, 294),
            ("Gadget", "Affiliate", 2024, 310),
            ("Gadget", "Organic", 2023, 121),
            ("Gizmo", "Twitter", 2024, 77),
        ];
        for (category, source, year, count) in rows {
            result.push_row(vec![category.into(), source.into(), year.into(), count.into()]);
        }
        result
    }
}

/// Orders counted by category, source and year, with every source present
/// in both years.
pub struct CategoryYearFixture;

impl CategoryYearFixture {
    pub const SOURCES: [&'static str; 5] = OrdersFixture::SOURCES;
    pub const YEARS: [i64; 2] = [2023, 2024];

    /// Counts indexed as [year][source].
    pub const DOOHICKEY: [[i64; 5]; 2] = [[210, 198, 233, 187, 244], [300, 251, 280, 262, 259]];
    pub const GADGET: [[i64; 5]; 2] = [[281, 266, 302, 270, 295], [320, 290, 355, 301, 334]];

    pub const DOOHICKEY_2024: f64 = 1352.0;

    pub fn result() -> QueryResult {
        let mut result = QueryResult::new(vec![
            ResultColumn::dimension("CATEGORY", "Product → Category"),
            ResultColumn::dimension("SOURCE", "User → Source"),
            ResultColumn::dimension("CREATED_AT", "Created At: Year"),
            ResultColumn::measure("count", "Count", AggregationKind::Count),
        ]);
        for (category, counts) in [("Doohickey", &Self::DOOHICKEY), ("Gadget", &Self::GADGET)] {
            for (s, source) in Self::SOURCES.iter().enumerate() {
                for (y, year) in Self::YEARS.iter().enumerate() {
                    result.push_row(vec![
                        category.into(),
                        (*source).into(),
                        (*year).into(),
                        counts[y][s].into(),
                    ]);
                }
            }
        }
        result
    }
}

pub fn keys(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn labels(rows: &[DisplayRow]) -> Vec<String> {
    rows.iter().map(|r| r.label.clone()).collect()
}

pub fn count_kind(rows: &[DisplayRow], kind: DisplayKind) -> usize {
    rows.iter().filter(|r| r.kind == kind).count()
}
