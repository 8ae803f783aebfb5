use super::record::{Element, Record};
use std::collections::{HashMap, HashSet};

/// A single year's value for one country
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct YearValue {
    pub year: i32,
    pub value: f64,
}

/// Result of looking up a year in a `CountryStat`
#[derive(Clone, Debug, PartialEq)]
pub enum YearLookup {
    /// No row for that year
    Missing,
    Single(f64),
    /// More than one row for the same year; values in table order
    Conflicting(Vec<f64>),
}

impl YearLookup {
    /// The value, if exactly one row exists for the year
    pub fn single(&self) -> Option<f64> {
        match self {
            YearLookup::Single(v) => Some(*v),
            _ => None,
        }
    }
}

/// All rows for one country and one indicator
#[derive(Clone, Debug, PartialEq)]
pub struct CountryStat {
    pub name: String,
    pub element: String,
    pub unit: String,
    /// Never empty. Ordered as the input rows were (descending year after `select`)
    pub years: Vec<YearValue>,
}

impl CountryStat {
    fn from_record(record: &Record) -> Self {
        Self {
            name: record.area.clone(),
            element: record.element.clone(),
            unit: record.unit.clone(),
            years: vec![YearValue {
                year: record.year,
                value: record.value,
            }],
        }
    }

    /// Look up a year by key rather than by position
    pub fn value_for(&self, year: i32) -> YearLookup {
        let mut hits = self.years.iter().filter(|yv| yv.year == year).map(|yv| yv.value);
        match (hits.next(), hits.next()) {
            (None, _) => YearLookup::Missing,
            (Some(v), None) => YearLookup::Single(v),
            (Some(a), Some(b)) => {
                let mut values = vec![a, b];
                values.extend(hits);
                YearLookup::Conflicting(values)
            }
        }
    }

    /// Smallest finite value across all years
    pub fn min_value(&self) -> Option<f64> {
        self.finite_values().reduce(f64::min)
    }

    /// Largest finite value across all years
    pub fn max_value(&self) -> Option<f64> {
        self.finite_values().reduce(f64::max)
    }

    fn finite_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.years.iter().map(|yv| yv.value).filter(|v| v.is_finite())
    }
}

/// Filter rows to one indicator and the years of interest, newest first.
///
/// When `known_names` is given, rows for countries that have no geometry
/// are dropped as well.
pub fn select(
    records: &[Record],
    element: Element,
    years: &[i32],
    known_names: Option<&HashSet<String>>,
) -> Vec<Record> {
    let mut selected: Vec<Record> = records
        .iter()
        .filter(|r| r.is(element) && years.contains(&r.year))
        .filter(|r| known_names.map_or(true, |names| names.contains(&r.area)))
        .cloned()
        .collect();

    // Stable: equal years keep table order
    selected.sort_by(|a, b| b.year.cmp(&a.year));
    selected
}

/// Group rows per country, keeping first-seen country order.
///
/// Every row becomes one `YearValue`; duplicates for the same year are kept.
pub fn normalize(records: &[Record]) -> Vec<CountryStat> {
    let mut stats: Vec<CountryStat> = Vec::new();
    let mut position: HashMap<&str, usize> = HashMap::new();

    for record in records {
        match position.get(record.area.as_str()) {
            Some(&idx) => stats[idx].years.push(YearValue {
                year: record.year,
                value: record.value,
            }),
            None => {
                position.insert(record.area.as_str(), stats.len());
                stats.push(CountryStat::from_record(record));
            }
        }
    }

    stats
}

/// `select` followed by `normalize`
pub fn prepare(
    records: &[Record],
    element: Element,
    years: &[i32],
    known_names: Option<&HashSet<String>>,
) -> Vec<CountryStat> {
    let stats = normalize(&select(records, element, years, known_names));

    let duplicated = stats
        .iter()
        .filter(|s| years.iter().any(|&y| matches!(s.value_for(y), YearLookup::Conflicting(_))))
        .count();
    if duplicated > 0 {
        tracing::warn!(element = element.label(), countries = duplicated, "duplicate rows for the same year");
    }
    tracing::debug!(element = element.label(), countries = stats.len(), "normalized statistics");

    stats
}
