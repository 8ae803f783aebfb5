use super::normalize::CountryStat;

/// Shape of a value-to-length mapping
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScaleKind {
    /// Length proportional to value (bars)
    Linear,
    /// Length proportional to the square root, so that area tracks value (circles)
    Sqrt,
}

/// Monotonic mapping from a value domain to a pixel range
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scale {
    pub kind: ScaleKind,
    pub domain: (f64, f64),
    pub range: (f64, f64),
}

impl Scale {
    pub fn linear(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self {
            kind: ScaleKind::Linear,
            domain,
            range,
        }
    }

    pub fn sqrt(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self {
            kind: ScaleKind::Sqrt,
            domain,
            range,
        }
    }

    /// Domain spans the smallest to largest finite value across all stats
    pub fn fit(kind: ScaleKind, stats: &[CountryStat], range: (f64, f64)) -> Self {
        let min = stats.iter().filter_map(CountryStat::min_value).reduce(f64::min);
        let max = stats.iter().filter_map(CountryStat::max_value).reduce(f64::max);
        let domain = (min.unwrap_or(0.0), max.unwrap_or(0.0));
        Self { kind, domain, range }
    }

    #[inline(always)]
    fn transform(&self, x: f64) -> f64 {
        match self.kind {
            ScaleKind::Linear => x,
            ScaleKind::Sqrt => x.signum() * x.abs().sqrt(),
        }
    }

    /// Map a value to a length. Values outside the domain are clamped.
    pub fn map(&self, value: f64) -> Option<f64> {
        if !value.is_finite() {
            return None;
        }
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let clamped = value.clamp(d0.min(d1), d0.max(d1));

        let (t0, t1) = (self.transform(d0), self.transform(d1));
        let span = t1 - t0;
        let t = if span == 0.0 {
            0.5
        } else {
            (self.transform(clamped) - t0) / span
        };
        Some(r0 + t * (r1 - r0))
    }
}
