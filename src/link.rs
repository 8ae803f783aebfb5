use crate::data::GeoFeature;
use crate::stats::CountryStat;
use std::collections::HashMap;

/// Result of joining a feature name to the statistics
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Lookup<'a> {
    Found(&'a CountryStat),
    NoData,
}

impl<'a> Lookup<'a> {
    pub fn stat(self) -> Option<&'a CountryStat> {
        match self {
            Lookup::Found(stat) => Some(stat),
            Lookup::NoData => None,
        }
    }
}

/// Normalized stats keyed by country name, built once after load
#[derive(Clone, Debug, Default)]
pub struct StatIndex {
    stats: Vec<CountryStat>,
    by_name: HashMap<String, usize>,
}

impl StatIndex {
    pub fn new(stats: Vec<CountryStat>) -> Self {
        let by_name = stats.iter().enumerate().map(|(i, s)| (s.name.clone(), i)).collect();
        Self { stats, by_name }
    }

    pub fn lookup(&self, name: &str) -> Lookup<'_> {
        match self.by_name.get(name) {
            Some(&idx) => Lookup::Found(&self.stats[idx]),
            None => Lookup::NoData,
        }
    }

    /// Stats in normalization order
    pub fn stats(&self) -> &[CountryStat] {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }
}

/// How well the statistics and the geometry line up
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LinkReport {
    /// (feature index, stat index) for every feature that has stats
    pub matched: Vec<(usize, usize)>,
    pub features_without_stats: Vec<String>,
    pub stats_without_features: Vec<String>,
}

impl LinkReport {
    pub fn build(features: &[GeoFeature], index: &StatIndex) -> Self {
        let mut report = Self::default();
        let mut seen = vec![false; index.len()];

        for (fi, feature) in features.iter().enumerate() {
            match index.by_name.get(&feature.name) {
                Some(&si) => {
                    report.matched.push((fi, si));
                    seen[si] = true;
                }
                None => report.features_without_stats.push(feature.name.clone()),
            }
        }

        report.stats_without_features = index
            .stats
            .iter()
            .zip(&seen)
            .filter(|(_, seen)| !**seen)
            .map(|(stat, _)| stat.name.clone())
            .collect();

        report
    }

    /// Glyph anchor per stat: the centroid of the first feature carrying its name
    pub fn anchors(&self, features: &[GeoFeature], index: &StatIndex) -> Vec<Option<(f64, f64)>> {
        let mut anchors = vec![None; index.len()];
        for &(fi, si) in &self.matched {
            if anchors[si].is_none() {
                anchors[si] = Some(features[fi].centroid);
            }
        }
        anchors
    }
}
