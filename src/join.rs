use std::collections::{HashMap, HashSet};

use anyhow::Result;
use log::debug;

use crate::{
    error::LoadError,
    frame::CsvTable,
};

const LEFT_SUFFIX: &str = "_x";
const RIGHT_SUFFIX: &str = "_y";

/// Left-joins `left` against `right` on column `key`, requiring at most one
/// right row per key.
///
/// Every left row appears exactly once in the output, in input order. Rows
/// without a match (including rows whose key is null) get null for every
/// right-hand column. Non-key columns present on both sides are suffixed with
/// `_x` and `_y`.
pub fn left_join_many_to_one(left: &CsvTable, right: &CsvTable, key: &str) -> Result<CsvTable> {
    let left_key = left.require_column(key)?;
    let right_key = right.require_column(key)?;

    let lookup = build_right_lookup(right, right_key)?;
    let (headers, right_columns) = build_output_headers(left.headers(), right.headers(), right_key);

    let mut rows = Vec::with_capacity(left.len());
    let mut matched_rows = 0usize;
    for record in left.rows() {
        let matched = record
            .get(left_key)
            .and_then(|cell| cell.as_deref())
            .and_then(|value| lookup.get(value))
            .map(|idx| &right.rows()[*idx]);
        let mut combined = record.clone();
        match matched {
            Some(right_row) => {
                matched_rows += 1;
                combined.extend(
                    right_columns
                        .iter()
                        .map(|idx| right_row.get(*idx).cloned().flatten()),
                );
            }
            None => combined.extend(right_columns.iter().map(|_| None::<String>)),
        }
        rows.push(combined);
    }

    debug!(
        "Joined {} row(s) of {} against {}: {} matched",
        rows.len(),
        left.name(),
        right.name(),
        matched_rows
    );
    Ok(CsvTable::new(
        format!("{} + {}", left.name(), right.name()),
        headers,
        rows,
    ))
}

fn build_right_lookup(right: &CsvTable, key_idx: usize) -> Result<HashMap<&str, usize>, LoadError> {
    let mut map = HashMap::with_capacity(right.len());
    for (row_idx, record) in right.rows().iter().enumerate() {
        let Some(key) = record.get(key_idx).and_then(|cell| cell.as_deref()) else {
            continue;
        };
        if map.insert(key, row_idx).is_some() {
            return Err(LoadError::DuplicateJoinKey {
                key: key.to_string(),
                source_name: right.name().to_string(),
            });
        }
    }
    Ok(map)
}

fn build_output_headers(
    left_headers: &[String],
    right_headers: &[String],
    right_key_idx: usize,
) -> (Vec<String>, Vec<usize>) {
    let right_key = &right_headers[right_key_idx];
    let right_names: HashSet<&str> = right_headers
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != right_key_idx)
        .map(|(_, name)| name.as_str())
        .collect();
    let left_names: HashSet<&str> = left_headers
        .iter()
        .filter(|name| *name != right_key)
        .map(|name| name.as_str())
        .collect();

    let mut headers = left_headers
        .iter()
        .map(|name| {
            if name != right_key && right_names.contains(name.as_str()) {
                format!("{name}{LEFT_SUFFIX}")
            } else {
                name.clone()
            }
        })
        .collect::<Vec<_>>();
    let mut right_columns = Vec::new();

    for (idx, name) in right_headers.iter().enumerate() {
        if idx == right_key_idx {
            continue;
        }
        if left_names.contains(name.as_str()) {
            headers.push(format!("{name}{RIGHT_SUFFIX}"));
        } else {
            headers.push(name.clone());
        }
        right_columns.push(idx);
    }

    (headers, right_columns)
}
