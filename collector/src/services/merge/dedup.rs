use std::collections::{HashMap, HashSet};

/// One spreadsheet row: column name to canonical cell text.
pub type Row = HashMap<String, String>;

/// Removes duplicate rows across the whole merge input.
///
/// The key for each row is built by reading `key_columns` in the given
/// order, joined by `separator`; a column absent from a row contributes an
/// empty string, so incomplete submissions collapse together only when they
/// agree on every other key column too. The first occurrence of a key wins
/// and surviving rows keep their insertion order.
///
/// An empty `key_columns` list disables deduplication entirely.
///
/// Returns the surviving rows and the number of rows dropped.
pub fn dedup_rows(rows: Vec<Row>, key_columns: &[String], separator: &str) -> (Vec<Row>, usize) {
    if key_columns.is_empty() {
        return (rows, 0);
    }
    let before = rows.len();
    let mut seen: HashSet<String> = HashSet::with_capacity(before);
    let mut survivors = Vec::with_capacity(before);
    for row in rows {
        let key = key_columns
            .iter()
            .map(|col| row.get(col).map(String::as_str).unwrap_or(""))
            .collect::<Vec<_>>()
            .join(separator);
        if seen.insert(key) {
            survivors.push(row);
        }
    }
    let removed = before - survivors.len();
    (survivors, removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn first_occurrence_wins_and_order_is_preserved() {
        let rows = vec![
            row(&[("name", "A"), ("phone", "1")]),
            row(&[("name", "A"), ("phone", "1")]),
            row(&[("name", "A"), ("phone", "2")]),
        ];
        let (kept, removed) = dedup_rows(rows, &keys(&["name", "phone"]), "|");
        assert_eq!(kept.len(), 2);
        assert_eq!(removed, 1);
        assert_eq!(kept[0]["phone"], "1");
        assert_eq!(kept[1]["phone"], "2");
    }

    #[test]
    fn missing_key_columns_read_as_empty() {
        let rows = vec![
            row(&[("name", "A")]),
            row(&[("name", "A"), ("phone", "")]),
            row(&[("name", "A"), ("phone", "7")]),
        ];
        // Absent phone and empty phone build the same key.
        let (kept, removed) = dedup_rows(rows, &keys(&["name", "phone"]), "|");
        assert_eq!(kept.len(), 2);
        assert_eq!(removed, 1);
    }

    #[test]
    fn empty_key_list_is_pass_through() {
        let rows = vec![row(&[("a", "1")]), row(&[("a", "1")])];
        let (kept, removed) = dedup_rows(rows, &[], "|");
        assert_eq!(kept.len(), 2);
        assert_eq!(removed, 0);
    }

    #[test]
    fn dedup_is_idempotent() {
        let rows = vec![
            row(&[("a", "1")]),
            row(&[("a", "1")]),
            row(&[("a", "2")]),
        ];
        let (once, _) = dedup_rows(rows, &keys(&["a"]), "|");
        let count = once.len();
        let (twice, removed) = dedup_rows(once, &keys(&["a"]), "|");
        assert_eq!(twice.len(), count);
        assert_eq!(removed, 0);
    }
}
