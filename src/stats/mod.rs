mod normalize;
mod record;
mod scale;

pub use normalize::{normalize, prepare, select, CountryStat, YearLookup, YearValue};
pub use record::{load_records, read_records, Element, Record};
pub use scale::{Scale, ScaleKind};
