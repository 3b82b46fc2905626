//! GeoJSON location source.
//!
//! Accepts a `FeatureCollection` (or a single `Feature`) whose Point features
//! carry person/year/place/info properties. Coordinates follow GeoJSON
//! `[lon, lat]` order.

use crate::store::rows::{Field, RawRow};
use crate::store::{LoadError, LoadResult};
use geojson::{Feature, GeoJson, Value};
use serde_json::Value as JsonValue;

/// Parses GeoJSON text into raw rows.
///
/// Features without Point geometry still produce a row (without
/// coordinates) so they are counted as dropped during store load.
pub fn rows_from_geojson(text: &str) -> LoadResult<Vec<RawRow>> {
    let geojson = text
        .parse::<GeoJson>()
        .map_err(|err| LoadError::GeoJson(err.to_string()))?;

    let features = match geojson {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(_) => {
            return Err(LoadError::GeoJson(
                "expected a Feature or FeatureCollection, got a bare Geometry".to_string(),
            ))
        }
    };

    Ok(features.iter().map(row_from_feature).collect())
}

fn row_from_feature(feature: &Feature) -> RawRow {
    let mut row = RawRow::new();

    if let Some(properties) = &feature.properties {
        for (key, value) in properties {
            let Some(field) = Field::from_header(key) else {
                continue;
            };
            if matches!(field, Field::Lat | Field::Lon) {
                continue;
            }
            if let Some(text) = property_text(field, value) {
                row.set(field, text);
            }
        }
    }

    if let Some(geometry) = &feature.geometry {
        if let Value::Point(coords) = &geometry.value {
            if let [lon, lat, ..] = coords.as_slice() {
                row.set(Field::Lat, lat.to_string());
                row.set(Field::Lon, lon.to_string());
            }
        }
    }

    row
}

fn property_text(field: Field, value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(text) => Some(text.clone()),
        JsonValue::Number(number) if field == Field::Year => {
            Some(integral_year(number).unwrap_or_else(|| number.to_string()))
        }
        JsonValue::Number(number) => Some(number.to_string()),
        JsonValue::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Years exported as floats (`1920.0`) count when they are whole numbers.
fn integral_year(number: &serde_json::Number) -> Option<String> {
    if let Some(year) = number.as_i64() {
        return Some(year.to_string());
    }
    let value = number.as_f64()?;
    let in_range = value >= f64::from(i32::MIN) && value <= f64::from(i32::MAX);
    (value.fract() == 0.0 && in_range).then(|| (value as i32).to_string())
}

#[cfg(test)]
mod tests {
    use super::rows_from_geojson;
    use crate::store::rows::{entry_from_row, DropReason, Field};
    use crate::store::LoadError;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "name": "Victor Fromentin", "year": 1920, "lieu": "Nantes" },
                "geometry": { "type": "Point", "coordinates": [-1.5536, 47.2184] }
            },
            {
                "type": "Feature",
                "properties": { "name": "Marc Dupont", "year": "1930" },
                "geometry": { "type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]] }
            }
        ]
    }"#;

    #[test]
    fn point_features_become_rows_in_lat_lon_order() {
        let rows = rows_from_geojson(SAMPLE).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get(Field::Person), Some("Victor Fromentin"));
        assert_eq!(rows[0].get(Field::Place), Some("Nantes"));

        let entry = entry_from_row(&rows[0], 0).unwrap();
        assert_eq!(entry.year, 1920);
        assert_eq!(entry.lat, 47.2184);
        assert_eq!(entry.lon, -1.5536);
    }

    #[test]
    fn non_point_feature_drops_on_conversion() {
        let rows = rows_from_geojson(SAMPLE).unwrap();
        assert_eq!(
            entry_from_row(&rows[1], 1).unwrap_err(),
            DropReason::InvalidLatitude
        );
    }

    #[test]
    fn whole_float_year_is_accepted_and_fractional_year_drops() {
        let text = r#"{
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": { "name": "Jeanne", "year": 1920.0 },
                    "geometry": { "type": "Point", "coordinates": [2.3522, 48.8566] }
                },
                {
                    "type": "Feature",
                    "properties": { "name": "Jeanne", "year": 1920.5 },
                    "geometry": { "type": "Point", "coordinates": [2.3522, 48.8566] }
                },
                {
                    "type": "Feature",
                    "properties": { "name": "Jeanne", "year": 1e12 },
                    "geometry": { "type": "Point", "coordinates": [2.3522, 48.8566] }
                }
            ]
        }"#;
        let rows = rows_from_geojson(text).unwrap();
        assert_eq!(rows[0].get(Field::Year), Some("1920"));
        assert_eq!(entry_from_row(&rows[0], 0).unwrap().year, 1920);
        assert_eq!(
            entry_from_row(&rows[1], 1).unwrap_err(),
            DropReason::InvalidYear
        );
        assert_eq!(
            entry_from_row(&rows[2], 2).unwrap_err(),
            DropReason::InvalidYear
        );
    }

    #[test]
    fn bare_geometry_is_rejected() {
        let err = rows_from_geojson(r#"{"type": "Point", "coordinates": [2.5, 46.8]}"#)
            .unwrap_err();
        assert!(matches!(err, LoadError::GeoJson(_)));
    }
}
