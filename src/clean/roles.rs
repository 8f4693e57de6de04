use crate::config::Config;
use crate::data::model::Table;
use crate::error::Result;

use super::headers::normalize_header;
use super::{Diagnostics, Stage};

pub const X_ROLE: &str = "x";
pub const Y_ROLE: &str = "y";

/// Renames the declared independent/dependent columns to `x` and `y`.
pub struct ColumnMapper;

impl ColumnMapper {
    pub const NAME: &'static str = "roles";
}

/// Find `target` by exact name, then by its normalized form.
pub fn find_column(table: &Table, target: &str) -> Option<String> {
    if table.has_column(target) {
        return Some(target.to_string());
    }
    let normalized = normalize_header(target);
    table.has_column(&normalized).then_some(normalized)
}

fn assign_role(
    table: &mut Table,
    target: Option<&str>,
    role: &'static str,
    diag: &mut Diagnostics,
) -> Result<()> {
    let Some(target) = target else {
        return Ok(());
    };
    let Some(found) = find_column(table, target) else {
        diag.warn(
            ColumnMapper::NAME,
            format!("column '{target}' not found; '{role}' left unassigned"),
        );
        return Ok(());
    };
    if found != role && table.has_column(role) {
        diag.warn(
            ColumnMapper::NAME,
            format!("cannot map '{found}' to '{role}': a '{role}' column already exists"),
        );
        return Ok(());
    }

    diag.info(
        ColumnMapper::NAME,
        format!("mapping column '{found}' (target: {target}) -> '{role}'"),
    );
    table.rename(&found, role)
}

impl Stage for ColumnMapper {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn apply(&self, mut table: Table, config: &Config, diag: &mut Diagnostics) -> Result<Table> {
        assign_role(&mut table, config.independent_target(), X_ROLE, diag)?;
        assign_role(&mut table, config.dependent_target(), Y_ROLE, diag)?;
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Cell;

    fn table() -> Table {
        Table::from_rows(
            &["conc._(mg/ml)", "Group"],
            vec![vec![Cell::Number(1.5), Cell::from("Control")]],
        )
        .unwrap()
    }

    #[test]
    fn exact_then_normalized_lookup() {
        let t = table();
        assert_eq!(find_column(&t, "Group").as_deref(), Some("Group"));
        assert_eq!(find_column(&t, "Conc. (mg/ml)").as_deref(), Some("conc._(mg/ml)"));
        assert_eq!(find_column(&t, "group"), None);
    }

    #[test]
    fn assigns_both_roles() {
        let cfg = Config::default()
            .with_independent("Group")
            .with_dependent("Conc. (mg/ml)");
        let mut diag = Diagnostics::default();
        let out = ColumnMapper.apply(table(), &cfg, &mut diag).unwrap();
        assert_eq!(out.column_names(), vec!["y", "x"]);
        assert_eq!(diag.warnings().count(), 0);
    }

    #[test]
    fn labels_are_fallbacks() {
        let cfg = Config {
            xlabel: Some("Group".into()),
            ..Config::default()
        };
        let mut diag = Diagnostics::default();
        let out = ColumnMapper.apply(table(), &cfg, &mut diag).unwrap();
        assert_eq!(out.column_names(), vec!["conc._(mg/ml)", "x"]);
    }

    #[test]
    fn unresolved_roles_only_warn() {
        let cfg = Config::default().with_dependent("Absorbance");
        let mut diag = Diagnostics::default();
        let out = ColumnMapper.apply(table(), &cfg, &mut diag).unwrap();
        assert_eq!(out, table());
        assert_eq!(diag.warnings().count(), 1);
    }

    #[test]
    fn existing_role_column_is_not_clobbered() {
        let t = Table::from_rows(&["x", "time"], vec![]).unwrap();
        let cfg = Config::default().with_independent("Time");
        let mut diag = Diagnostics::default();
        let out = ColumnMapper.apply(t, &cfg, &mut diag).unwrap();
        assert_eq!(out.column_names(), vec!["x", "time"]);
        assert_eq!(diag.warnings().count(), 1);
    }
}
