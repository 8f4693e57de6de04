use std::collections::BTreeSet;

use crate::config::Config;
use crate::data::model::{Column, Table};
use crate::error::Result;

use super::{Diagnostics, Stage};

/// Canonicalizes column names into stable lookup keys.
pub struct HeaderNormalizer;

impl HeaderNormalizer {
    pub const NAME: &'static str = "headers";
}

/// Trim, lowercase and join whitespace runs with `_`.
///
/// `"Conc. (mg/ml)"` becomes `"conc._(mg/ml)"`. Idempotent.
pub fn normalize_header(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

impl Stage for HeaderNormalizer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply(&self, table: Table, _config: &Config, diag: &mut Diagnostics) -> Result<Table> {
        let mut seen = BTreeSet::new();
        let mut columns = Vec::with_capacity(table.n_cols());

        for col in table.into_columns() {
            let base = normalize_header(&col.name);
            let mut name = base.clone();
            let mut count = 0;
            while seen.contains(&name) {
                count += 1;
                name = format!("{base}_{count}");
            }
            if name != base {
                diag.warn(
                    Self::NAME,
                    format!(
                        "header '{}' collides after normalization; renamed to '{name}'",
                        col.name
                    ),
                );
            }
            seen.insert(name.clone());
            columns.push(Column::new(name, col.cells));
        }

        Table::new(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_lab_headers() {
        assert_eq!(normalize_header("Conc. (mg/ml)"), "conc._(mg/ml)");
        assert_eq!(normalize_header("Independent Variable"), "independent_variable");
        assert_eq!(normalize_header("  Time \t (h)  "), "time_(h)");
        assert_eq!(normalize_header(""), "");
    }

    #[test]
    fn normalization_is_idempotent() {
        for h in ["Conc. (mg/ml)", "  A  B  ", "already_clean", "MiXeD\nCase"] {
            let once = normalize_header(h);
            assert_eq!(normalize_header(&once), once);
        }
    }

    #[test]
    fn colliding_headers_get_suffixes() {
        let table = Table::from_rows(&["Group", "group ", "GROUP"], vec![]).unwrap();
        let mut diag = Diagnostics::default();
        let out = HeaderNormalizer
            .apply(table, &Config::default(), &mut diag)
            .unwrap();
        assert_eq!(out.column_names(), vec!["group", "group_1", "group_2"]);
        assert_eq!(diag.warnings().count(), 2);
    }
}
