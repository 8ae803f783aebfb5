mod feature;

pub use feature::{BBox, GeoFeature, Polygon, Ring};

use crate::config::InputConfig;
use crate::stats::{load_records, Record};
use anyhow::{anyhow, Context, Result};
use geojson::{Feature, GeoJson, Geometry, PolygonType, Value};
use rayon::prelude::*;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use topojson::TopoJson;

/// Property names tried after the configured one
const NAME_FALLBACKS: [&str; 3] = ["name", "admin", "NAME"];

/// Everything the map needs from disk
pub struct Inputs {
    pub records: Vec<Record>,
    pub features: Vec<GeoFeature>,
}

/// Load the statistics table and the geometry concurrently.
///
/// Both loads run to completion; the first error aborts the whole load.
pub fn load_inputs(input: &InputConfig) -> Result<Inputs> {
    let (records, features) = rayon::join(
        || load_records(&input.table),
        || load_features(&input.geometry, &input.name_property, &input.object),
    );
    Ok(Inputs {
        records: records?,
        features: features?,
    })
}

/// Load named country outlines from a GeoJSON or TopoJSON file
pub fn load_features(path: &Path, name_property: &str, object: &str) -> Result<Vec<GeoFeature>> {
    let mut content = fs::read(path).with_context(|| format!("Failed to read geometry: {:?}", path))?;
    let features = read_features(&mut content, name_property, object)
        .with_context(|| format!("Failed to parse geometry: {:?}", path))?;
    tracing::info!(features = features.len(), path = %path.display(), "loaded geometry");
    Ok(features)
}

/// Top-level `type` member, the only field needed to pick a decoder
#[derive(Deserialize)]
struct DocumentType {
    #[serde(rename = "type")]
    kind: String,
}

/// Parse geometry bytes. GeoJSON goes through the SIMD parser, which
/// modifies `bytes` in place; a TopoJSON topology is converted by extracting `object`.
pub fn read_features(bytes: &mut [u8], name_property: &str, object: &str) -> Result<Vec<GeoFeature>> {
    let document: DocumentType = serde_json::from_slice(bytes).context("Geometry is not a JSON object")?;

    let geojson = if document.kind == "Topology" {
        topology_to_geojson(bytes, object)?
    } else {
        simd_json::serde::from_slice::<GeoJson>(bytes)?
    };
    features_from_geojson(geojson, name_property)
}

fn topology_to_geojson(bytes: &[u8], object: &str) -> Result<GeoJson> {
    let text = std::str::from_utf8(bytes)?;
    let topology = match text.parse::<TopoJson>() {
        Ok(TopoJson::Topology(topology)) => topology,
        Ok(_) => return Err(anyhow!("Expected a TopoJSON topology")),
        Err(e) => return Err(anyhow!("Invalid TopoJSON: {}", e)),
    };
    let collection = topojson::to_geojson(&topology, &object.to_string())
        .map_err(|e| anyhow!("Failed to extract topology object {:?}: {}", object, e))?;
    tracing::debug!(object, features = collection.features.len(), "converted topology");
    Ok(GeoJson::FeatureCollection(collection))
}

/// Convert a parsed GeoJSON document into named features, keeping document order
pub fn features_from_geojson(geojson: GeoJson, name_property: &str) -> Result<Vec<GeoFeature>> {
    let raw = match geojson {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(f) => vec![f],
        GeoJson::Geometry(_) => return Err(anyhow!("Geometry must be a Feature or FeatureCollection")),
    };

    let total = raw.len();
    let features: Vec<GeoFeature> = raw
        .into_par_iter()
        .filter_map(|feature| convert_feature(feature, name_property))
        .collect();

    if features.len() < total {
        tracing::warn!(skipped = total - features.len(), "features without a name or polygon geometry");
    }
    Ok(features)
}

fn convert_feature(feature: Feature, name_property: &str) -> Option<GeoFeature> {
    let props = feature.properties.as_ref()?;
    let name = std::iter::once(name_property)
        .chain(NAME_FALLBACKS)
        .find_map(|key| props.get(key).and_then(|v| v.as_str()))?
        .to_string();

    let mut polygons = Vec::new();
    collect_polygons(feature.geometry.as_ref()?, &mut polygons);
    if polygons.is_empty() {
        return None;
    }
    Some(GeoFeature::new(name, polygons))
}

fn collect_polygons(geometry: &Geometry, out: &mut Vec<Polygon>) {
    match &geometry.value {
        Value::Polygon(rings) => out.extend(to_polygon(rings)),
        Value::MultiPolygon(polygons) => out.extend(polygons.iter().filter_map(|rings| to_polygon(rings))),
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                collect_polygons(g, out);
            }
        }
        _ => {}
    }
}

fn to_polygon(rings: &PolygonType) -> Option<Polygon> {
    let mut rings = rings
        .iter()
        .map(|ring| ring.iter().filter(|c| c.len() >= 2).map(|c| (c[0], c[1])).collect::<Ring>());
    let exterior = rings.next()?;
    Some(Polygon {
        exterior,
        holes: rings.collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const OBJECT: &str = "continent_Africa_subunits";

    const AFRICA: &str = r#"{
      "type": "FeatureCollection",
      "features": [
        {"type": "Feature", "properties": {"geounit": "Kenya", "name": "Republic of Kenya"},
         "geometry": {"type": "Polygon", "coordinates": [[[34,-4],[41,-4],[41,4],[34,4],[34,-4]]]}},
        {"type": "Feature", "properties": {"name": "Chad"},
         "geometry": {"type": "MultiPolygon", "coordinates": [[[[14,8],[24,8],[24,23],[14,23],[14,8]]]]}},
        {"type": "Feature", "properties": {"geounit": "Nowhere"},
         "geometry": {"type": "Point", "coordinates": [0, 0]}},
        {"type": "Feature", "properties": {},
         "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]}}
      ]
    }"#;

    #[test]
    fn test_reads_named_polygons_in_order() {
        let mut bytes = AFRICA.as_bytes().to_vec();
        let features = read_features(&mut bytes, "geounit", OBJECT).unwrap();

        let names: Vec<&str> = features.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["Kenya", "Chad"]);
        let (lon, lat) = features[0].centroid;
        assert!((lon - 37.5).abs() < 1e-9 && lat.abs() < 1e-9);
        assert!(features[1].contains(20.0, 15.0));
    }

    #[test]
    fn test_configured_property_wins() {
        let mut bytes = AFRICA.as_bytes().to_vec();
        let features = read_features(&mut bytes, "name", OBJECT).unwrap();
        assert_eq!(features[0].name, "Republic of Kenya");
    }

    #[test]
    fn test_bare_geometry_is_rejected() {
        let mut bytes = br#"{"type": "Point", "coordinates": [1, 2]}"#.to_vec();
        assert!(read_features(&mut bytes, "geounit", OBJECT).is_err());
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let mut bytes = b"{ not json".to_vec();
        assert!(read_features(&mut bytes, "geounit", OBJECT).is_err());
    }

    /// Two unit squares sharing the edge x = 1; the second walks the shared arc reversed
    const TOPOLOGY: &str = r#"{
      "type": "Topology",
      "arcs": [
        [[1,0],[1,1]],
        [[1,1],[0,1],[0,0],[1,0]],
        [[1,0],[2,0],[2,1],[1,1]]
      ],
      "objects": {
        "continent_Africa_subunits": {
          "type": "GeometryCollection",
          "geometries": [
            {"type": "Polygon", "arcs": [[0, 1]], "properties": {"geounit": "Gambia"}},
            {"type": "Polygon", "arcs": [[2, -1]], "properties": {"geounit": "Senegal"}}
          ]
        }
      }
    }"#;

    #[test]
    fn test_reads_topology_with_shared_arc() {
        let mut bytes = TOPOLOGY.as_bytes().to_vec();
        let features = read_features(&mut bytes, "geounit", OBJECT).unwrap();

        let names: Vec<&str> = features.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["Gambia", "Senegal"]);
        assert_eq!(features[0].bbox, (0.0, 0.0, 1.0, 1.0));
        assert_eq!(features[1].bbox, (1.0, 0.0, 2.0, 1.0));
        assert!(features[0].contains(0.5, 0.5) && !features[0].contains(1.5, 0.5));
        assert!(features[1].contains(1.5, 0.5));
        let (lon, lat) = features[1].centroid;
        assert!((lon - 1.5).abs() < 1e-9 && (lat - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_topology_object_is_an_error() {
        let mut bytes = TOPOLOGY.as_bytes().to_vec();
        assert!(read_features(&mut bytes, "geounit", "countries").is_err());
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("cereal-map-{}-{}", std::process::id(), name))
    }

    fn input(table: PathBuf, geometry: PathBuf) -> InputConfig {
        InputConfig {
            table,
            geometry,
            ..InputConfig::default()
        }
    }

    #[test]
    fn test_missing_table_aborts_load() {
        let geometry = temp_path("missing-table.geojson");
        fs::write(&geometry, AFRICA).unwrap();
        let table = temp_path("no-such-table.csv");

        let result = load_inputs(&input(table, geometry.clone()));
        fs::remove_file(&geometry).unwrap();

        let err = result.err().unwrap();
        assert!(format!("{:#}", err).contains("Failed to open table"));
    }

    #[test]
    fn test_load_inputs_joins_both() {
        let geometry = temp_path("both.geojson");
        let table = temp_path("both.csv");
        fs::write(&geometry, AFRICA).unwrap();
        fs::write(
            &table,
            "Area,Element,Year,Value,Unit\nKenya,Production,2016,3000,tonnes\nChad,Yield,1980,7000,hg/ha\n",
        )
        .unwrap();

        let result = load_inputs(&input(table.clone(), geometry.clone()));
        fs::remove_file(&geometry).unwrap();
        fs::remove_file(&table).unwrap();

        let inputs = result.unwrap();
        assert_eq!(inputs.records.len(), 2);
        assert_eq!(inputs.records[0].area, "Kenya");
        assert_eq!(inputs.features.len(), 2);
    }
}
