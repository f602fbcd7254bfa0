use std::{collections::HashSet, io::Cursor, sync::Arc};

use ahash::AHashMap;
use anyhow::Result;
use log::warn;
use polars::{
    frame::DataFrame,
    io::SerReader,
    prelude::{Column, CsvReadOptions, CsvReader, StringChunked},
};

use crate::error::FetchError;

/// Column positions used when header matching fails, matching the layout the
/// feed has shipped historically: region, station, registered voters, then
/// the four voter-category counts.
const FIXED_LAYOUT: ColumnMap = ColumnMap {
    region: 0,
    registered: 2,
    station: Some(1),
    permanent: Some(3),
    supplementary: Some(4),
    special: Some(5),
    mobile: Some(6),
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnMap {
    region: usize,
    registered: usize,
    station: Option<usize>,
    permanent: Option<usize>,
    supplementary: Option<usize>,
    special: Option<usize>,
    mobile: Option<usize>,
}

/// Per-region accumulation over raw polling-station rows, before the summary
/// merge and turnout derivation.
#[derive(Debug, Default)]
pub(crate) struct RawCounts {
    pub registered: u64,
    pub stations: HashSet<String>,
    pub permanent: u64,
    pub supplementary: u64,
    pub special: u64,
    pub mobile: u64,
}

/// Parse tab-separated polling-station rows and group them by region code.
///
/// Columns are resolved by header name; when the required region and
/// registered-voters headers cannot be found the parser degrades to the fixed
/// layout above instead of failing.
pub(crate) fn aggregate_tabular(bytes: &[u8]) -> Result<AHashMap<Arc<str>, RawCounts>, FetchError> {
    let with_header =
        read_frame(bytes, true).map_err(|err| FetchError::parse(format!("{err:#}")))?;

    let names: Vec<String> = with_header
        .get_column_names()
        .iter()
        .map(|name| name.as_str().to_string())
        .collect();

    let (frame, columns) = match resolve_columns(&names) {
        Some(columns) => (with_header, columns),
        None => {
            warn!("[tabular] required headers not found, falling back to fixed column layout");
            let headerless =
                read_frame(bytes, false).map_err(|err| FetchError::parse(format!("{err:#}")))?;
            (headerless, FIXED_LAYOUT)
        }
    };

    fold_rows(&frame, &columns)
}

fn read_frame(bytes: &[u8], has_header: bool) -> Result<DataFrame> {
    // Everything is read as text; codes keep leading zeros and malformed
    // numeric cells degrade to zero instead of poisoning the whole column.
    let options = CsvReadOptions::default()
        .with_has_header(has_header)
        .with_infer_schema_length(Some(0))
        .map_parse_options(|parse| parse.with_separator(b'\t'));

    let df = CsvReader::new(Cursor::new(bytes)).with_options(options).finish()?;
    Ok(df)
}

/// Header-name column resolution: exact matches first, then substrings, never
/// claiming the same column twice. Returns None when the required region and
/// registered-voters headers are both missing a match.
fn resolve_columns(names: &[String]) -> Option<ColumnMap> {
    let lower: Vec<String> = names.iter().map(|n| n.trim().to_ascii_lowercase()).collect();
    let mut claimed = vec![false; lower.len()];

    let mut find = |aliases: &[&str]| -> Option<usize> {
        for alias in aliases {
            for (i, name) in lower.iter().enumerate() {
                if !claimed[i] && name == alias {
                    claimed[i] = true;
                    return Some(i);
                }
            }
        }
        for alias in aliases {
            for (i, name) in lower.iter().enumerate() {
                if !claimed[i] && name.contains(alias) {
                    claimed[i] = true;
                    return Some(i);
                }
            }
        }
        None
    };

    let region = find(&["region", "judet", "county"]);
    let station = find(&["stationno", "station", "sectie", "precinct"]);
    let registered = find(&["registered", "inscrisi"]);
    let permanent = find(&["lp", "permanent"]);
    // Resolve the special list before the supplementary one: "lsc" contains
    // "ls" and must not be claimed by the wrong logical column.
    let special = find(&["lsc", "special"]);
    let supplementary = find(&["ls", "supplementary", "suplimentar"]);
    let mobile = find(&["um", "mobile", "urn"]);

    Some(ColumnMap {
        region: region?,
        registered: registered?,
        station,
        permanent,
        supplementary,
        special,
        mobile,
    })
}

fn required_column<'a>(all: &'a [Column], idx: usize) -> Result<&'a StringChunked, FetchError> {
    all.get(idx)
        .ok_or_else(|| FetchError::parse(format!("column {idx} out of bounds")))?
        .str()
        .map_err(|err| FetchError::parse(err))
}

fn optional_column<'a>(all: &'a [Column], idx: Option<usize>) -> Option<&'a StringChunked> {
    idx.and_then(|i| all.get(i)).and_then(|col| col.str().ok())
}

fn fold_rows(
    frame: &DataFrame,
    columns: &ColumnMap,
) -> Result<AHashMap<Arc<str>, RawCounts>, FetchError> {
    let all = frame.get_columns();

    let region_col = required_column(all, columns.region)?;
    let registered_col = required_column(all, columns.registered)?;
    let station_col = optional_column(all, columns.station);
    let permanent_col = optional_column(all, columns.permanent);
    let supplementary_col = optional_column(all, columns.supplementary);
    let special_col = optional_column(all, columns.special);
    let mobile_col = optional_column(all, columns.mobile);

    let mut out: AHashMap<Arc<str>, RawCounts> = AHashMap::new();
    for row in 0..frame.height() {
        let Some(code) = region_col.get(row).map(str::trim).filter(|c| !c.is_empty()) else {
            continue;
        };

        let entry = out.entry(Arc::from(code)).or_default();
        entry.registered += parse_count(registered_col.get(row));
        entry.permanent += parse_count(permanent_col.and_then(|c| c.get(row)));
        entry.supplementary += parse_count(supplementary_col.and_then(|c| c.get(row)));
        entry.special += parse_count(special_col.and_then(|c| c.get(row)));
        entry.mobile += parse_count(mobile_col.and_then(|c| c.get(row)));

        // Station counts are distinct identifiers; without an identifier
        // column every row counts as its own station.
        match station_col.and_then(|c| c.get(row)).map(str::trim).filter(|s| !s.is_empty()) {
            Some(id) => entry.stations.insert(id.to_string()),
            None => entry.stations.insert(format!("row-{row}")),
        };
    }

    Ok(out)
}

fn parse_count(cell: Option<&str>) -> u64 {
    cell.and_then(|v| v.trim().parse::<u64>().ok()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tsv(lines: &[&str]) -> Vec<u8> {
        lines.join("\n").into_bytes()
    }

    #[test]
    fn aggregates_rows_by_region() {
        let data = tsv(&[
            "Region\tStationNo\tRegistered\tLP\tLS\tLSC\tUM",
            "AB\t1\t1000\t400\t50\t10\t5",
            "AB\t2\t800\t300\t20\t0\t0",
            "CJ\t9\t2000\t900\t100\t5\t1",
        ]);

        let raw = aggregate_tabular(&data).unwrap();
        let ab = &raw[&Arc::<str>::from("AB")];
        assert_eq!(ab.registered, 1800);
        assert_eq!(ab.stations.len(), 2);
        assert_eq!(ab.permanent, 700);
        assert_eq!(ab.supplementary, 70);
        assert_eq!(raw[&Arc::<str>::from("CJ")].stations.len(), 1);
    }

    #[test]
    fn tolerates_reordered_columns() {
        let data = tsv(&[
            "LP\tRegion\tUM\tRegistered\tLS\tStationNo\tLSC",
            "400\tAB\t5\t1000\t50\t1\t10",
        ]);

        let raw = aggregate_tabular(&data).unwrap();
        let ab = &raw[&Arc::<str>::from("AB")];
        assert_eq!(ab.registered, 1000);
        assert_eq!(ab.stations.len(), 1);
        assert_eq!(ab.permanent, 400);
        assert_eq!(ab.supplementary, 50);
        assert_eq!(ab.special, 10);
        assert_eq!(ab.mobile, 5);
    }

    #[test]
    fn falls_back_to_fixed_layout_without_headers() {
        let data = tsv(&["AB\t1\t1000\t400\t50\t10\t5", "AB\t2\t500\t100\t0\t0\t0"]);

        let raw = aggregate_tabular(&data).unwrap();
        let ab = &raw[&Arc::<str>::from("AB")];
        assert_eq!(ab.registered, 1500);
        assert_eq!(ab.stations.len(), 2);
        assert_eq!(ab.permanent, 500);
    }

    #[test]
    fn malformed_numbers_degrade_to_zero() {
        let data = tsv(&[
            "Region\tStationNo\tRegistered\tLP\tLS\tLSC\tUM",
            "AB\t1\tn/a\t400\t\t10\t5",
        ]);

        let raw = aggregate_tabular(&data).unwrap();
        let ab = &raw[&Arc::<str>::from("AB")];
        assert_eq!(ab.registered, 0);
        assert_eq!(ab.permanent, 400);
        assert_eq!(ab.supplementary, 0);
    }

    #[test]
    fn supplementary_and_special_headers_do_not_collide() {
        let data = tsv(&[
            "Region\tStationNo\tRegistered\tLSC\tLS\tLP\tUM",
            "AB\t1\t1000\t10\t50\t400\t5",
        ]);

        let raw = aggregate_tabular(&data).unwrap();
        let ab = &raw[&Arc::<str>::from("AB")];
        assert_eq!(ab.special, 10);
        assert_eq!(ab.supplementary, 50);
        assert_eq!(ab.permanent, 400);
    }
}
