use crate::domain::model::{Table, Value};
use crate::domain::ports::FileOptions;
use crate::utils::error::{Result, SweepError};
use std::collections::HashSet;

/// Removes rows equal to an earlier row, keeping first occurrences in order.
/// Returns how many rows were dropped.
pub fn remove_duplicates(table: &mut Table) -> usize {
    let row_count = table.row_count();
    let mut seen: HashSet<Vec<&Value>> = HashSet::with_capacity(row_count);
    let mut keep = Vec::with_capacity(row_count);

    for index in 0..row_count {
        let row: Vec<&Value> = table.columns().iter().map(|c| &c.values[index]).collect();
        keep.push(seen.insert(row));
    }
    drop(seen);

    let removed = keep.iter().filter(|k| !**k).count();
    if removed > 0 {
        table.retain_rows(&keep);
    }

    tracing::debug!("Removed {} duplicate rows ({} remain)", removed, table.row_count());
    removed
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FillSummary {
    /// (column, mean, cells filled) for every numeric column that had gaps.
    pub filled: Vec<(String, f64, usize)>,
    /// Numeric columns with no present values; left untouched.
    pub skipped_all_missing: Vec<String>,
}

impl FillSummary {
    pub fn cells_filled(&self) -> usize {
        self.filled.iter().map(|(_, _, count)| count).sum()
    }
}

/// Replaces missing cells of numeric columns with the column mean.
///
/// Non-numeric columns are never touched. A numeric column with no present
/// values has no mean and keeps its missing cells.
pub fn fill_missing_with_mean(table: &mut Table) -> FillSummary {
    let mut summary = FillSummary::default();

    for column in table.columns_mut() {
        if !column.is_numeric() {
            continue;
        }

        let missing = column.missing_count();
        if missing == 0 {
            continue;
        }

        let Some(mean) = column.mean() else {
            tracing::warn!("Column '{}' has no numeric values; leaving it empty", column.name);
            summary.skipped_all_missing.push(column.name.clone());
            continue;
        };

        for value in column.values.iter_mut().filter(|v| v.is_missing()) {
            *value = Value::Numeric(mean);
        }

        tracing::debug!("Filled {} cells of '{}' with {}", missing, column.name, mean);
        summary.filled.push((column.name.clone(), mean, missing));
    }

    summary
}

/// Projects `table` onto `names`, in the order given. An empty selection yields
/// a table with no columns (and therefore no rows).
pub fn select_columns(table: &Table, names: &[String]) -> Result<Table> {
    let mut seen = HashSet::with_capacity(names.len());
    let mut columns = Vec::with_capacity(names.len());

    for name in names {
        if !seen.insert(name.as_str()) {
            return Err(SweepError::ValidationError {
                message: format!("column '{}' selected more than once", name),
            });
        }

        let column = table
            .column(name)
            .ok_or_else(|| SweepError::UnknownColumn {
                column: name.clone(),
                available: table.column_names().join(", "),
            })?;
        columns.push(column.clone());
    }

    Table::new(columns)
}

/// One user-triggered operation on a table.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformStep {
    RemoveDuplicates,
    FillMissing,
    SelectColumns(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    DuplicatesRemoved(usize),
    MissingFilled(FillSummary),
    ColumnsSelected(usize),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformPlan {
    steps: Vec<TransformStep>,
}

impl TransformPlan {
    /// Cleaning first, projection last so later stages see only the kept columns.
    pub fn from_options(options: &FileOptions) -> Self {
        let mut steps = Vec::new();
        if options.remove_duplicates {
            steps.push(TransformStep::RemoveDuplicates);
        }
        if options.fill_missing {
            steps.push(TransformStep::FillMissing);
        }
        if let Some(columns) = &options.columns {
            steps.push(TransformStep::SelectColumns(columns.clone()));
        }
        Self { steps }
    }

    pub fn steps(&self) -> &[TransformStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn apply(&self, table: Table) -> Result<(Table, Vec<StepOutcome>)> {
        apply_steps(table, &self.steps)
    }
}

pub fn apply_steps(mut table: Table, steps: &[TransformStep]) -> Result<(Table, Vec<StepOutcome>)> {
    let mut outcomes = Vec::with_capacity(steps.len());

    for step in steps {
        let outcome = match step {
            TransformStep::RemoveDuplicates => {
                StepOutcome::DuplicatesRemoved(remove_duplicates(&mut table))
            }
            TransformStep::FillMissing => StepOutcome::MissingFilled(fill_missing_with_mean(&mut table)),
            TransformStep::SelectColumns(names) => {
                table = select_columns(&table, names)?;
                StepOutcome::ColumnsSelected(table.column_count())
            }
        };
        outcomes.push(outcome);
    }

    Ok((table, outcomes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ingest::read_csv;
    use crate::domain::model::Column;
    use crate::domain::ports::IngestOptions;

    fn table(csv: &str) -> Table {
        read_csv("test.csv", csv.as_bytes(), &IngestOptions::default()).unwrap()
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_remove_duplicates_keeps_first_occurrence() {
        let mut t = table("x,y\n1,2\n1,2\n");
        assert_eq!(remove_duplicates(&mut t), 1);
        assert_eq!(t.row_count(), 1);
        assert_eq!(t.row(0).unwrap(), vec![&Value::Numeric(1.0), &Value::Numeric(2.0)]);
    }

    #[test]
    fn test_remove_duplicates_preserves_order() {
        let mut t = table("k\nb\na\nb\nc\na\n");
        remove_duplicates(&mut t);
        let values: Vec<String> = t.column("k").unwrap().values.iter().map(|v| v.to_string()).collect();
        assert_eq!(values, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_remove_duplicates_is_idempotent() {
        let mut once = table("a,b\n1,x\n1,x\n2,\n2,\n");
        remove_duplicates(&mut once);
        let mut twice = once.clone();
        assert_eq!(remove_duplicates(&mut twice), 0);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_missing_cells_compare_equal_for_duplicates() {
        let mut t = table("a,b\n1,\n1,\n");
        assert_eq!(remove_duplicates(&mut t), 1);
    }

    #[test]
    fn test_fill_missing_with_mean() {
        let mut t = table("a,b\n1,\n2,4\n");
        let summary = fill_missing_with_mean(&mut t);

        assert_eq!(t.column("b").unwrap().values[0], Value::Numeric(4.0));
        assert_eq!(summary.filled, vec![("b".to_string(), 4.0, 1)]);
        assert_eq!(summary.cells_filled(), 1);
    }

    #[test]
    fn test_fill_missing_ignores_text_columns() {
        let mut t = table("name,score\nAda,\n,3\nBob,5\n");
        fill_missing_with_mean(&mut t);

        assert_eq!(t.column("name").unwrap().values[1], Value::Missing);
        assert_eq!(t.column("score").unwrap().values[0], Value::Numeric(4.0));
    }

    #[test]
    fn test_fill_missing_leaves_all_missing_numeric_column() {
        let mut t = Table::new(vec![
            Column::new("empty", vec![Value::Missing, Value::Missing]),
            Column::new("n", vec![Value::Numeric(1.0), Value::Numeric(2.0)]),
        ])
        .unwrap();

        let summary = fill_missing_with_mean(&mut t);

        assert_eq!(summary.skipped_all_missing, vec!["empty".to_string()]);
        assert!(t.column("empty").unwrap().values.iter().all(Value::is_missing));
    }

    #[test]
    fn test_fill_near_float_max_writes_finite_mean() {
        let mut t = table("k,v\na,1e308\nb,1e308\nc,\n");
        let summary = fill_missing_with_mean(&mut t);

        assert_eq!(t.column("v").unwrap().values[2], Value::Numeric(1e308));
        assert_eq!(summary.cells_filled(), 1);

        let exported = crate::core::export::write_csv(&t).unwrap();
        let reread = read_csv("k.csv", &exported, &IngestOptions::default()).unwrap();
        assert_eq!(reread, t);
    }

    #[test]
    fn test_fill_missing_is_idempotent() {
        let mut t = table("a,b\n1,\n,4\n3,5\n");
        fill_missing_with_mean(&mut t);
        let snapshot = t.clone();

        let summary = fill_missing_with_mean(&mut t);
        assert!(summary.filled.is_empty());
        assert_eq!(t, snapshot);
    }

    #[test]
    fn test_select_columns_in_given_order() {
        let t = table("a,b,c\n1,2,3\n");
        let projected = select_columns(&t, &names(&["c", "a"])).unwrap();

        assert_eq!(projected.column_names(), vec!["c", "a"]);
        assert_eq!(projected.row(0).unwrap(), vec![&Value::Numeric(3.0), &Value::Numeric(1.0)]);
    }

    #[test]
    fn test_select_all_columns_is_noop() {
        let t = table("a,b\n1,x\n2,y\n");
        let all: Vec<String> = t.column_names().iter().map(|s| s.to_string()).collect();
        assert_eq!(select_columns(&t, &all).unwrap(), t);
    }

    #[test]
    fn test_select_no_columns_yields_empty_table() {
        let t = table("a,b\n1,2\n3,4\n");
        let projected = select_columns(&t, &[]).unwrap();

        assert_eq!(projected.column_count(), 0);
        assert_eq!(projected.row_count(), 0);
    }

    #[test]
    fn test_select_unknown_column_fails() {
        let t = table("a,b\n1,2\n");
        let result = select_columns(&t, &names(&["a", "z"]));

        match result {
            Err(SweepError::UnknownColumn { column, available }) => {
                assert_eq!(column, "z");
                assert_eq!(available, "a, b");
            }
            other => panic!("expected UnknownColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_select_repeated_column_fails() {
        let t = table("a,b\n1,2\n");
        assert!(select_columns(&t, &names(&["a", "a"])).is_err());
    }

    #[test]
    fn test_plan_from_options_projects_last() {
        let options = FileOptions {
            remove_duplicates: true,
            fill_missing: true,
            columns: Some(names(&["b"])),
            ..Default::default()
        };
        let plan = TransformPlan::from_options(&options);

        assert_eq!(
            plan.steps(),
            &[
                TransformStep::RemoveDuplicates,
                TransformStep::FillMissing,
                TransformStep::SelectColumns(names(&["b"])),
            ]
        );

        let (result, outcomes) = plan.apply(table("a,b\n1,\n1,\n2,6\n")).unwrap();
        assert_eq!(result.column_names(), vec!["b"]);
        assert_eq!(result.row_count(), 2);
        assert_eq!(result.column("b").unwrap().values[0], Value::Numeric(6.0));
        assert_eq!(outcomes[0], StepOutcome::DuplicatesRemoved(1));
    }

    #[test]
    fn test_empty_plan_leaves_table_alone() {
        let plan = TransformPlan::from_options(&FileOptions::default());
        assert!(plan.is_empty());

        let original = table("a\n1\n1\n");
        let (result, outcomes) = plan.apply(original.clone()).unwrap();
        assert_eq!(result, original);
        assert!(outcomes.is_empty());
    }
}
