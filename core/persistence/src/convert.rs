//! FILENAME: core/persistence/src/convert.rs
// PURPOSE: Turns persisted settings into a PivotDefinition for a given result, and back.
// CONTEXT: Settings may have been written against an older query. Anything
// that no longer fits the result is dropped or replaced by a default and
// reported as a warning; only an unaggregated result is a hard error.

use std::collections::BTreeMap;

use engine::QueryResult;
use pivot_engine::{
    log_info, log_warn, Axis, AxisCollapse, CollapseState, ColumnSplit, DimensionKey,
    DimensionPath, PivotDefinition, PivotError, PivotId, PivotLayout, ShowTotals, SortBy,
    SortDirective,
};
use thiserror::Error;

use crate::error::SettingsError;
use crate::settings::{CollapsedEntries, MeasureSort, VisualizationSettings};

// ============================================================================
// WARNINGS
// ============================================================================

/// Something in the persisted settings that could not be applied as written.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SettingsWarning {
    #[error("Column split replaced by the default: {0}")]
    DefaultSplit(PivotError),

    #[error("Ignored collapsed entry {entry:?} on the {axis:?} axis")]
    InvalidCollapsedEntry { axis: Axis, entry: String },

    #[error("Ignored sort on {dimension}")]
    DroppedSort { dimension: DimensionKey },
}

/// A definition ready for `calculate_pivot`, plus what had to be repaired.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSettings {
    pub definition: PivotDefinition,
    pub warnings: Vec<SettingsWarning>,
}

// ============================================================================
// SETTINGS -> DEFINITION
// ============================================================================

/// Resolves `settings` against the columns of `result`.
pub fn resolve_definition(
    id: PivotId,
    settings: &VisualizationSettings,
    result: &QueryResult,
) -> Result<ResolvedSettings, SettingsError> {
    if !result.is_aggregated() {
        return Err(PivotError::UnaggregatedQuery.into());
    }

    let dimensions = result.dimension_keys();
    let measures = result.measure_keys();
    let mut warnings = Vec::new();

    let split = match &settings.column_split {
        Some(split) => match split.validate(&dimensions, &measures) {
            Ok(()) => split.clone(),
            Err(e) => {
                log_warn!("SETTINGS", "pivot {}: stale column split ({}), using default", id, e);
                warnings.push(SettingsWarning::DefaultSplit(e));
                ColumnSplit::default_for(&dimensions, &measures)
            }
        },
        None => ColumnSplit::default_for(&dimensions, &measures),
    };

    let rows = axis_collapse(Axis::Row, settings.collapsed_rows.as_ref(), &split.rows, &mut warnings);
    let columns = axis_collapse(
        Axis::Column,
        settings.collapsed_columns.as_ref(),
        &split.columns,
        &mut warnings,
    );
    let collapse = CollapseState::from_parts(rows, columns)
        .reconcile(Axis::Row, &split.rows)
        .reconcile(Axis::Column, &split.columns);

    let show_totals = settings
        .column_show_totals
        .clone()
        .map(ShowTotals::from)
        .unwrap_or_default();

    let values = split.resolved_values(&measures);
    let sorts = resolve_sorts(settings, &split, &values, &mut warnings);

    let layout = PivotLayout {
        show_row_grand_totals: settings.show_column_totals.unwrap_or(true),
        show_column_grand_totals: settings.show_row_totals.unwrap_or(true),
    };

    let definition = PivotDefinition {
        id,
        version: 0,
        split,
        show_totals,
        collapse,
        layout,
        sorts,
        column_widths: settings.column_widths.clone().unwrap_or_default(),
        number_formats: BTreeMap::new(),
    };

    log_info!(
        "SETTINGS",
        "pivot {}: resolved settings ({} warnings)",
        id,
        warnings.len()
    );
    Ok(ResolvedSettings { definition, warnings })
}

/// Reads one axis worth of collapsed entries. The entries keep the
/// dimensions they were recorded against so reconciliation can tell which
/// paths still apply.
fn axis_collapse(
    axis: Axis,
    entries: Option<&CollapsedEntries>,
    current: &[DimensionKey],
    warnings: &mut Vec<SettingsWarning>,
) -> AxisCollapse {
    let Some(entries) = entries else {
        return AxisCollapse::new(current);
    };
    let recorded = if entries.rows.is_empty() {
        current
    } else {
        &entries.rows[..]
    };
    let mut state = AxisCollapse::new(recorded);

    for entry in &entries.value {
        match parse_entry(entry, recorded) {
            Some(Entry::Level(dimension)) => {
                state.levels.insert(dimension);
            }
            Some(Entry::Path(path)) => {
                state.paths.insert(path.to_key(), true);
            }
            None => warnings.push(SettingsWarning::InvalidCollapsedEntry {
                axis,
                entry: entry.clone(),
            }),
        }
    }
    for entry in &entries.expanded {
        match DimensionPath::parse_key(entry) {
            Ok(path) if !path.is_empty() => {
                state.paths.insert(path.to_key(), false);
            }
            _ => warnings.push(SettingsWarning::InvalidCollapsedEntry {
                axis,
                entry: entry.clone(),
            }),
        }
    }
    state
}

enum Entry {
    Level(DimensionKey),
    Path(DimensionPath),
}

fn parse_entry(entry: &str, dimensions: &[DimensionKey]) -> Option<Entry> {
    match serde_json::from_str::<serde_json::Value>(entry).ok()? {
        serde_json::Value::Number(n) => {
            let index = usize::try_from(n.as_u64()?).ok()?;
            dimensions.get(index).cloned().map(Entry::Level)
        }
        serde_json::Value::Array(_) => DimensionPath::parse_key(entry)
            .ok()
            .filter(|p| !p.is_empty())
            .map(Entry::Path),
        _ => None,
    }
}

/// Value sorts first, then measure sorts, so a measure sort on the same
/// dimension decides the primary order.
fn resolve_sorts(
    settings: &VisualizationSettings,
    split: &ColumnSplit,
    values: &[String],
    warnings: &mut Vec<SettingsWarning>,
) -> Vec<SortDirective> {
    let mut sorts = Vec::new();
    for (dimension, direction) in settings.column_sort_order.iter().flatten() {
        if split.axis_of(dimension).is_some() {
            sorts.push(SortDirective::by_value(dimension.clone(), *direction));
        } else {
            drop_sort(dimension, warnings);
        }
    }
    for sort in settings.measure_sort.iter().flatten() {
        if split.axis_of(&sort.dimension).is_some() && values.contains(&sort.measure) {
            sorts.push(SortDirective::by_measure(
                sort.dimension.clone(),
                sort.measure.clone(),
                sort.direction,
            ));
        } else {
            drop_sort(&sort.dimension, warnings);
        }
    }
    sorts
}

fn drop_sort(dimension: &DimensionKey, warnings: &mut Vec<SettingsWarning>) {
    log_warn!("SETTINGS", "dropping sort on {}", dimension);
    warnings.push(SettingsWarning::DroppedSort {
        dimension: dimension.clone(),
    });
}

// ============================================================================
// DEFINITION -> SETTINGS
// ============================================================================

/// Writes `definition` into a copy of `base`, keeping every key of `base`
/// that the definition does not cover.
pub fn settings_from_definition(
    definition: &PivotDefinition,
    base: &VisualizationSettings,
) -> VisualizationSettings {
    let mut settings = base.clone();
    settings.column_split = Some(definition.split.clone());
    settings.collapsed_rows = Some(collapsed_entries(&definition.collapse.rows));

    let columns = collapsed_entries(&definition.collapse.columns);
    if !columns.is_empty() || base.collapsed_columns.is_some() {
        settings.collapsed_columns = Some(columns);
    }

    if !definition.show_totals.entries().is_empty() || base.column_show_totals.is_some() {
        settings.column_show_totals = Some(definition.show_totals.entries().clone());
    }

    let mut sort_order = BTreeMap::new();
    let mut measure_sort = Vec::new();
    for sort in &definition.sorts {
        match &sort.by {
            SortBy::Value => {
                sort_order.insert(sort.dimension.clone(), sort.direction);
            }
            SortBy::Measure(measure) => measure_sort.push(MeasureSort {
                dimension: sort.dimension.clone(),
                measure: measure.clone(),
                direction: sort.direction,
            }),
        }
    }
    settings.column_sort_order =
        (!sort_order.is_empty() || base.column_sort_order.is_some()).then_some(sort_order);
    settings.measure_sort =
        (!measure_sort.is_empty() || base.measure_sort.is_some()).then_some(measure_sort);

    settings.show_row_totals = Some(definition.layout.show_column_grand_totals);
    settings.show_column_totals = Some(definition.layout.show_row_grand_totals);

    if definition.column_widths != Default::default() || base.column_widths.is_some() {
        settings.column_widths = Some(definition.column_widths.clone());
    }
    settings
}

fn collapsed_entries(state: &AxisCollapse) -> CollapsedEntries {
    let mut value: Vec<String> = state
        .levels
        .iter()
        .filter_map(|level| state.dimensions.iter().position(|d| d == level))
        .map(|index| index.to_string())
        .collect();
    let mut expanded = Vec::new();
    for (key, collapsed) in &state.paths {
        if *collapsed {
            value.push(key.clone());
        } else {
            expanded.push(key.clone());
        }
    }
    CollapsedEntries {
        value,
        rows: state.dimensions.clone(),
        expanded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::{AggregationKind, ResultColumn};
    use pivot_engine::SortDirection;

    fn keys(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn result() -> QueryResult {
        let mut result = QueryResult::new(vec![
            ResultColumn::dimension("SOURCE", "Source"),
            ResultColumn::dimension("CATEGORY", "Category"),
            ResultColumn::measure("count", "Count", AggregationKind::Count),
        ]);
        result.push_row(vec!["Affiliate".into(), "Gizmo".into(), 2i64.into()]);
        result
    }

    #[test]
    fn test_missing_split_uses_default_silently() {
        let resolved = resolve_definition(1, &VisualizationSettings::new(), &result()).unwrap();
        assert_eq!(resolved.definition.split.rows, keys(&["SOURCE"]));
        assert_eq!(resolved.definition.split.columns, keys(&["CATEGORY"]));
        assert!(resolved.warnings.is_empty());
    }

    #[test]
    fn test_level_index_entry() {
        let settings = VisualizationSettings::new()
            .with_column_split(ColumnSplit::new(["SOURCE", "CATEGORY"], Vec::<String>::new(), ["count"]))
            .with_collapsed_rows(CollapsedEntries {
                value: vec!["0".into(), "not json".into()],
                rows: keys(&["SOURCE", "CATEGORY"]),
                expanded: vec![],
            });
        let resolved = resolve_definition(1, &settings, &result()).unwrap();
        assert!(resolved.definition.collapse.is_level_collapsed(Axis::Row, "SOURCE"));
        assert_eq!(
            resolved.warnings,
            vec![SettingsWarning::InvalidCollapsedEntry {
                axis: Axis::Row,
                entry: "not json".into()
            }]
        );
    }

    #[test]
    fn test_sort_on_unplaced_dimension_is_dropped() {
        let mut settings = VisualizationSettings::new()
            .with_column_split(ColumnSplit::new(["SOURCE"], ["CATEGORY"], ["count"]));
        settings.measure_sort = Some(vec![MeasureSort {
            dimension: "USER_ID".into(),
            measure: "count".into(),
            direction: SortDirection::Descending,
        }]);
        let resolved = resolve_definition(1, &settings, &result()).unwrap();
        assert!(resolved.definition.sorts.is_empty());
        assert_eq!(
            resolved.warnings,
            vec![SettingsWarning::DroppedSort { dimension: "USER_ID".into() }]
        );
    }

    #[test]
    fn test_collapsed_entries_round_trip() {
        let def = PivotDefinition::new(1, ColumnSplit::new(["SOURCE", "CATEGORY"], Vec::<String>::new(), ["count"]));
        let def = PivotDefinition {
            collapse: def
                .collapse
                .toggle_level(Axis::Row, "SOURCE")
                .toggle(Axis::Row, &DimensionPath::from_values(["Google"])),
            ..def
        };
        let settings = settings_from_definition(&def, &VisualizationSettings::new());
        let rows = settings.collapsed_rows.clone().unwrap();
        assert_eq!(rows.value, vec!["0"]);
        assert_eq!(rows.expanded, vec!["[\"Google\"]"]);
        assert!(settings.collapsed_columns.is_none());

        let resolved = resolve_definition(1, &settings, &result()).unwrap();
        assert_eq!(resolved.definition.collapse, def.collapse);
    }
}
