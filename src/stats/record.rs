use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Statistical indicator reported per country and year
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Element {
    AreaHarvested,
    Production,
    Yield,
}

impl Element {
    /// Spelling used in the `Element` column of the source table
    pub fn label(self) -> &'static str {
        match self {
            Element::AreaHarvested => "Area harvested",
            Element::Production => "Production",
            Element::Yield => "Yield",
        }
    }
}

/// One row of the source table: a single country/indicator/year value
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Record {
    #[serde(rename = "Area")]
    pub area: String,
    #[serde(rename = "Element")]
    pub element: String,
    #[serde(rename = "Year", deserialize_with = "lenient_year")]
    pub year: i32,
    #[serde(rename = "Value", deserialize_with = "lenient_value")]
    pub value: f64,
    #[serde(rename = "Unit", default)]
    pub unit: String,
}

impl Record {
    pub fn new(area: &str, element: Element, year: i32, value: f64, unit: &str) -> Self {
        Self {
            area: area.to_string(),
            element: element.label().to_string(),
            year,
            value,
            unit: unit.to_string(),
        }
    }

    pub fn is(&self, element: Element) -> bool {
        self.element == element.label()
    }
}

/// Unparsable years become 0, which never matches a year of interest
fn lenient_year<'de, D: Deserializer<'de>>(de: D) -> Result<i32, D::Error> {
    let raw = String::deserialize(de)?;
    Ok(raw.trim().parse().unwrap_or(0))
}

/// Empty values read as 0, anything else unparsable as NaN
fn lenient_value<'de, D: Deserializer<'de>>(de: D) -> Result<f64, D::Error> {
    let raw = String::deserialize(de)?;
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0.0);
    }
    Ok(raw.parse().unwrap_or(f64::NAN))
}

/// Parse records from any CSV source with a header row
pub fn read_records<R: Read>(reader: R) -> Result<Vec<Record>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut records = Vec::new();
    for (line, row) in rdr.deserialize::<Record>().enumerate() {
        // +2: header row and 1-based numbering
        let record = row.with_context(|| format!("Malformed table row {}", line + 2))?;
        records.push(record);
    }
    Ok(records)
}

/// Load the statistics table from disk
pub fn load_records(path: &Path) -> Result<Vec<Record>> {
    let file = File::open(path).with_context(|| format!("Failed to open table: {:?}", path))?;
    let records = read_records(file).with_context(|| format!("Failed to parse table: {:?}", path))?;
    tracing::info!(rows = records.len(), path = %path.display(), "loaded statistics table");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "\
Domain,Area,Element,Item,Year,Unit,Value,Flag
QC,Kenya,Area harvested,Cereals,2016,ha,2412345,A
QC,Kenya,Production,Cereals,1980,tonnes,2500000,A
QC,Chad,Yield,Cereals,2016,hg/ha,7012,Fc
";

    #[test]
    fn test_reads_named_columns_and_ignores_extras() {
        let records = read_records(TABLE.as_bytes()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0], Record::new("Kenya", Element::AreaHarvested, 2016, 2_412_345.0, "ha"));
        assert!(records[2].is(Element::Yield));
        assert_eq!(records[2].unit, "hg/ha");
    }

    #[test]
    fn test_malformed_numbers_are_coerced() {
        let table = "Area,Element,Year,Value,Unit\n\
                     Mali,Production,20x6,,tonnes\n\
                     Mali,Production,1980,n/a,tonnes\n";
        let records = read_records(table.as_bytes()).unwrap();
        assert_eq!(records[0].year, 0);
        assert_eq!(records[0].value, 0.0);
        assert_eq!(records[1].year, 1980);
        assert!(records[1].value.is_nan());
    }

    #[test]
    fn test_fields_are_trimmed() {
        let table = "Area,Element,Year,Value,Unit\n Niger , Yield , 2016 , 4500 , hg/ha \n";
        let records = read_records(table.as_bytes()).unwrap();
        assert_eq!(records[0].area, "Niger");
        assert!(records[0].is(Element::Yield));
        assert_eq!(records[0].value, 4500.0);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = load_records(Path::new("does/not/exist.csv")).unwrap_err();
        assert!(err.to_string().contains("Failed to open table"));
    }
}
