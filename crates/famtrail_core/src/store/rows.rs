//! Header-driven raw rows and delimited text parsing.
//!
//! # Responsibility
//! - Turn delimited text into header→value rows, independent of column order.
//! - Map localized header aliases onto canonical field names.
//! - Convert raw rows into `LocationEntry` values, reporting why a row drops.
//!
//! # Invariants
//! - Parsing a row never fails the whole load; bad rows yield `DropReason`.
//! - Header matching is case-insensitive and accent-insensitive.

use crate::model::entry::LocationEntry;
use crate::store::{LoadError, LoadResult};
use std::collections::BTreeMap;

const DELIMITER_CANDIDATES: [u8; 3] = [b',', b';', b'\t'];

/// Canonical location columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Field {
    Person,
    Year,
    Lat,
    Lon,
    Place,
    Info,
    Photo,
    Group,
    Members,
}

impl Field {
    /// Header aliases in folded form (lowercase, accents stripped).
    fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Person => &["name", "nom", "person", "personne", "individu", "prenom nom"],
            Self::Year => &["year", "annee", "date"],
            Self::Lat => &["lat", "latitude"],
            Self::Lon => &["lon", "lng", "long", "longitude"],
            Self::Place => &["place", "lieu", "ville", "city", "location", "commune"],
            Self::Info => &["info", "infos", "note", "notes", "event", "evenement"],
            Self::Photo => &["photo", "image", "picture", "url", "photo url"],
            Self::Group => &["group", "groupe", "group name", "famille", "branche"],
            Self::Members => &["members", "membres", "persons", "personnes"],
        }
    }

    /// Resolves a header cell to a canonical field.
    pub fn from_header(header: &str) -> Option<Self> {
        let folded = fold_header(header);
        [
            Self::Person,
            Self::Year,
            Self::Lat,
            Self::Lon,
            Self::Place,
            Self::Info,
            Self::Photo,
            Self::Group,
            Self::Members,
        ]
        .into_iter()
        .find(|field| field.aliases().contains(&folded.as_str()))
    }
}

/// One source row keyed by canonical field.
///
/// Unknown columns are ignored; the first occurrence of a duplicated column
/// wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    values: BTreeMap<Field, String>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field unless it is already present.
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        self.values.entry(field).or_insert_with(|| value.into());
    }

    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    /// Returns the trimmed value, or `None` when absent or blank.
    pub fn get(&self, field: Field) -> Option<&str> {
        self.values
            .get(&field)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }
}

/// Reason a raw row did not become a `LocationEntry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    MissingPerson,
    InvalidYear,
    InvalidLatitude,
    InvalidLongitude,
}

impl DropReason {
    pub fn code(self) -> &'static str {
        match self {
            Self::MissingPerson => "missing_person",
            Self::InvalidYear => "invalid_year",
            Self::InvalidLatitude => "invalid_lat",
            Self::InvalidLongitude => "invalid_lon",
        }
    }
}

/// Converts one raw row into an entry positioned at `input_index`.
pub fn entry_from_row(row: &RawRow, input_index: usize) -> Result<LocationEntry, DropReason> {
    let person = row.get(Field::Person).ok_or(DropReason::MissingPerson)?;
    let year = row
        .get(Field::Year)
        .and_then(parse_year)
        .ok_or(DropReason::InvalidYear)?;
    let lat = row
        .get(Field::Lat)
        .and_then(parse_coordinate)
        .filter(|lat| (-90.0..=90.0).contains(lat))
        .ok_or(DropReason::InvalidLatitude)?;
    let lon = row
        .get(Field::Lon)
        .and_then(parse_coordinate)
        .filter(|lon| (-180.0..=180.0).contains(lon))
        .ok_or(DropReason::InvalidLongitude)?;

    Ok(LocationEntry {
        person: person.to_string(),
        year,
        lat,
        lon,
        place: row.get(Field::Place).unwrap_or_default().to_string(),
        info: row.get(Field::Info).unwrap_or_default().to_string(),
        input_index,
    })
}

/// Parses delimited text with a header row into raw rows.
///
/// The delimiter is detected from the header line.
pub fn parse_delimited(text: &str) -> LoadResult<Vec<RawRow>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let delimiter = detect_delimiter(text);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers().map_err(LoadError::Csv)?.clone();
    let columns = headers
        .iter()
        .map(Field::from_header)
        .collect::<Vec<_>>();
    if columns.iter().all(Option::is_none) {
        return Err(LoadError::MissingColumns(
            headers.iter().map(str::to_string).collect(),
        ));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(LoadError::Csv)?;
        let mut row = RawRow::new();
        for (field, value) in columns.iter().zip(record.iter()) {
            if let Some(field) = field {
                row.set(*field, value);
            }
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Picks the most frequent candidate delimiter in the header line.
///
/// Defaults to `,` when no candidate occurs.
pub fn detect_delimiter(text: &str) -> u8 {
    let header = text.lines().next().unwrap_or_default();
    let mut best = b',';
    let mut best_count = 0;
    for candidate in DELIMITER_CANDIDATES {
        let count = header.bytes().filter(|byte| *byte == candidate).count();
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }
    best
}

fn parse_year(raw: &str) -> Option<i32> {
    raw.trim().parse::<i32>().ok()
}

fn parse_coordinate(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let normalized = if trimmed.contains('.') {
        trimmed.to_string()
    } else {
        trimmed.replacen(',', ".", 1)
    };
    normalized.parse::<f64>().ok().filter(|value| value.is_finite())
}

fn fold_header(header: &str) -> String {
    header
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'à' | 'â' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'î' | 'ï' => 'i',
            'ô' | 'ö' => 'o',
            'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            '_' | '-' => ' ',
            other => other,
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::{detect_delimiter, fold_header, parse_coordinate, parse_year, Field};

    #[test]
    fn fold_header_normalizes_case_accents_and_separators() {
        assert_eq!(fold_header("  Année "), "annee");
        assert_eq!(fold_header("Photo_URL"), "photo url");
        assert_eq!(fold_header("Événement"), "evenement");
    }

    #[test]
    fn from_header_maps_localized_aliases() {
        assert_eq!(Field::from_header("Nom"), Some(Field::Person));
        assert_eq!(Field::from_header("ANNÉE"), Some(Field::Year));
        assert_eq!(Field::from_header("lng"), Some(Field::Lon));
        assert_eq!(Field::from_header("Lieu"), Some(Field::Place));
        assert_eq!(Field::from_header("comment"), None);
    }

    #[test]
    fn detect_delimiter_prefers_most_frequent() {
        assert_eq!(detect_delimiter("nom;annee;lat;lon\n"), b';');
        assert_eq!(detect_delimiter("name\tyear\tlat\n"), b'\t');
        assert_eq!(detect_delimiter("name,year,lat,lon"), b',');
        assert_eq!(detect_delimiter("name"), b',');
    }

    #[test]
    fn parse_coordinate_accepts_decimal_comma() {
        assert_eq!(parse_coordinate("48,8566"), Some(48.8566));
        assert_eq!(parse_coordinate(" 2.3522 "), Some(2.3522));
        assert_eq!(parse_coordinate("abc"), None);
        assert_eq!(parse_coordinate("NaN"), None);
    }

    #[test]
    fn parse_year_requires_integer() {
        assert_eq!(parse_year(" 1990 "), Some(1990));
        assert_eq!(parse_year("1990.5"), None);
        assert_eq!(parse_year("vers 1990"), None);
    }
}
