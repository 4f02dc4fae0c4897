// src/series.rs
use log::debug;

use crate::data_types::{CoercionPolicy, NumericSeries, RawSheetData, SeriesKey};
use crate::error::{Error, Result};

/// Builds one numeric series per (worksheet, x-index, y-index) combination.
///
/// The index lists are crossed, not paired: every x index is combined with
/// every y index. Indices are 0-based positions into the columns retrieved
/// for the worksheet; combinations that point past the retrieved columns
/// are skipped. Points are paired row by row (the shorter column wins) and
/// sorted ascending by x, ties keeping their y order.
pub fn build_series(
    raw: &RawSheetData,
    x_indices: &[usize],
    y_indices: &[usize],
    policy: CoercionPolicy,
    label: &str,
) -> Result<Vec<NumericSeries>> {
    let mut series = Vec::new();
    for (worksheet, columns) in raw {
        for &x_index in x_indices {
            for &y_index in y_indices {
                if x_index >= columns.len() || y_index >= columns.len() {
                    debug!(
                        "Skipping (x{x_index}, y{y_index}) for worksheet '{worksheet}': \
                         only {} column(s) retrieved",
                        columns.len()
                    );
                    continue;
                }
                let xs = coerce_column(worksheet, x_index, &columns[x_index], policy)?;
                let ys = coerce_column(worksheet, y_index, &columns[y_index], policy)?;
                let mut points: Vec<(f64, f64)> = xs.into_iter().zip(ys).collect();
                points.sort_by(|a, b| a.0.total_cmp(&b.0));
                series.push(NumericSeries {
                    key: SeriesKey {
                        worksheet: worksheet.clone(),
                        x_index,
                        y_index,
                    },
                    label: series_label(worksheet, label, x_index, y_index),
                    points,
                });
            }
        }
    }
    Ok(series)
}

fn series_label(worksheet: &str, label: &str, x_index: usize, y_index: usize) -> String {
    if label.is_empty() {
        format!("{worksheet} (x{x_index}, y{y_index})")
    } else {
        format!("{worksheet} {label} (x{x_index}, y{y_index})")
    }
}

/// Parses the data cells of one column, skipping the header cell.
///
/// Reported rows are 1-based sheet rows, so the first data cell is row 2.
fn coerce_column(
    worksheet: &str,
    column: usize,
    cells: &[String],
    policy: CoercionPolicy,
) -> Result<Vec<f64>> {
    let mut values = Vec::with_capacity(cells.len().saturating_sub(1));
    for (offset, cell) in cells.iter().enumerate().skip(1) {
        let text = cell.trim();
        if text.is_empty() && policy == CoercionPolicy::SkipBlanks {
            continue;
        }
        match text.parse::<f64>() {
            Ok(value) => values.push(value),
            Err(_) => {
                return Err(Error::NumericConversion {
                    worksheet: worksheet.to_string(),
                    column,
                    row: offset + 1,
                    cell: cell.clone(),
                })
            }
        }
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|cell| cell.to_string()).collect()
    }

    fn sheet(name: &str, columns: &[&[&str]]) -> RawSheetData {
        let mut raw = RawSheetData::new();
        raw.insert(
            name.to_string(),
            columns.iter().map(|cells| column(cells)).collect(),
        );
        raw
    }

    #[test]
    fn pairs_columns_row_by_row() {
        let raw = sheet("Sheet1", &[&["h", "1", "2", "3"], &["h", "5", "4", "1"]]);
        let series = build_series(&raw, &[0], &[1], CoercionPolicy::SkipBlanks, "").unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].points, vec![(1.0, 5.0), (2.0, 4.0), (3.0, 1.0)]);
        assert_eq!(series[0].key.worksheet, "Sheet1");
    }

    #[test]
    fn sorts_points_ascending_by_x() {
        let raw = sheet("Sheet1", &[&["h", "3", "1", "2"], &["h", "30", "10", "20"]]);
        let series = build_series(&raw, &[0], &[1], CoercionPolicy::SkipBlanks, "").unwrap();
        assert_eq!(series[0].points, vec![(1.0, 10.0), (2.0, 20.0), (3.0, 30.0)]);
    }

    #[test]
    fn tied_x_values_keep_their_row_order() {
        let raw = sheet("Sheet1", &[&["h", "1", "1", "0"], &["h", "5", "4", "9"]]);
        let series = build_series(&raw, &[0], &[1], CoercionPolicy::SkipBlanks, "").unwrap();
        assert_eq!(series[0].points, vec![(0.0, 9.0), (1.0, 5.0), (1.0, 4.0)]);
    }

    #[test]
    fn non_numeric_cell_is_located_precisely() {
        let raw = sheet("Scores", &[&["h", "3", "1", "2"], &["h", "9", "b", "7"]]);
        let err = build_series(&raw, &[0], &[1], CoercionPolicy::SkipBlanks, "").unwrap_err();
        match err {
            Error::NumericConversion {
                worksheet,
                column,
                row,
                cell,
            } => {
                assert_eq!(worksheet, "Scores");
                assert_eq!(column, 1);
                assert_eq!(row, 3);
                assert_eq!(cell, "b");
            }
            other => panic!("expected NumericConversion, got {other}"),
        }
    }

    #[test]
    fn out_of_range_combinations_are_skipped_silently() {
        let raw = sheet("Sheet1", &[&["h", "1"], &["h", "2"], &["h", "3"]]);
        let series = build_series(&raw, &[9], &[1], CoercionPolicy::SkipBlanks, "").unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn blank_cells_are_dropped_per_column_before_pairing() {
        let raw = sheet(
            "Sheet1",
            &[&["h", "1", "", "3"], &["h", "5", "6", "7"]],
        );
        let series = build_series(&raw, &[0], &[1], CoercionPolicy::SkipBlanks, "").unwrap();
        // each column is filtered independently, then zipped
        assert_eq!(series[0].points, vec![(1.0, 5.0), (3.0, 6.0)]);
    }

    #[test]
    fn strict_policy_rejects_blank_cells() {
        let raw = sheet("Sheet1", &[&["h", "1", ""], &["h", "5", "6"]]);
        let err = build_series(&raw, &[0], &[1], CoercionPolicy::Strict, "").unwrap_err();
        assert!(matches!(err, Error::NumericConversion { row: 3, .. }));
    }

    #[test]
    fn index_lists_are_crossed_not_paired() {
        let raw = sheet(
            "Sheet1",
            &[&["h", "1", "2"], &["h", "10", "20"], &["h", "7", "8"]],
        );
        let series =
            build_series(&raw, &[0], &[1, 2], CoercionPolicy::SkipBlanks, "runs").unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].label, "Sheet1 runs (x0, y1)");
        assert_eq!(series[1].label, "Sheet1 runs (x0, y2)");
        assert_eq!(series[1].points, vec![(1.0, 7.0), (2.0, 8.0)]);
    }

    #[test]
    fn shorter_column_bounds_the_pairing() {
        let raw = sheet("Sheet1", &[&["h", "1", "2", "3", "4"], &["h", "5", "6"]]);
        let series = build_series(&raw, &[0], &[1], CoercionPolicy::SkipBlanks, "").unwrap();
        assert_eq!(series[0].points, vec![(1.0, 5.0), (2.0, 6.0)]);
    }
}
