//! Pane contents derived from the selected source. Kept free of terminal types so the
//! description/plot logic is testable on its own.

use arrow::array::{Array, Float64Array};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use datashed_catalog::pretty_describe;
use datashed_source::{DataSource, PlotDef, PlotKind, TableData};
use std::sync::Arc;

/// Label shown at the top of the description pane.
pub fn description_label(source: Option<&Arc<dyn DataSource>>) -> Option<String> {
    source.map(|source| format!("Entry: {}", source.name()))
}

/// Body of the description pane: the source's display content, plot metadata stripped. An empty
/// selection renders as empty rather than an error.
pub fn description_contents(source: Option<&Arc<dyn DataSource>>) -> String {
    match source {
        Some(source) => pretty_describe(&source.display_content()),
        None => String::new(),
    }
}

/// Instructions line for the plot pane.
pub fn plot_instructions(has_plots: bool) -> &'static str {
    if has_plots {
        "Select from the predefined plots:"
    } else {
        "No predefined plots found - declare these in the catalog"
    }
}

/// Selection state over a source's predefined plots.
#[derive(Debug, Default)]
pub struct PlotSelector {
    options: Vec<String>,
    selected: usize,
    show_spec: bool,
}

impl PlotSelector {
    pub fn from_source(source: Option<&Arc<dyn DataSource>>) -> Self {
        Self {
            options: source.map(|source| source.plots()).unwrap_or_default(),
            selected: 0,
            show_spec: false,
        }
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn has_plots(&self) -> bool {
        !self.options.is_empty()
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected_name(&self) -> Option<&str> {
        self.options.get(self.selected).map(String::as_str)
    }

    pub fn next(&mut self) {
        if !self.options.is_empty() {
            self.selected = (self.selected + 1) % self.options.len();
        }
    }

    pub fn previous(&mut self) {
        if !self.options.is_empty() {
            self.selected = (self.selected + self.options.len() - 1) % self.options.len();
        }
    }

    pub fn toggle_spec(&mut self) {
        self.show_spec = !self.show_spec;
    }

    pub fn show_spec(&self) -> bool {
        self.show_spec
    }

    /// The selected plot's definition as written in the catalog, pretty rendered.
    pub fn spec_contents(&self, source: Option<&Arc<dyn DataSource>>) -> Option<String> {
        let source = source?;
        let name = self.selected_name()?;
        source
            .metadata()
            .plot_value(name)
            .map(pretty_describe)
    }
}

/// One named series of a rendered plot.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub points: Vec<(f64, f64)>,
}

/// Data extracted from a table for one plot definition, ready to hand to a chart widget.
#[derive(Debug, Clone, PartialEq)]
pub enum PlotData {
    Xy {
        kind: PlotKind,
        title: String,
        x_label: String,
        series: Vec<Series>,
        x_bounds: [f64; 2],
        y_bounds: [f64; 2],
    },
    Bars {
        title: String,
        labels: Vec<String>,
        values: Vec<u64>,
    },
}

/// Pull the plot's columns out of the table. Numeric columns are cast to f64; a non-numeric x
/// column falls back to the row index so string-keyed tables still chart.
pub fn extract_plot_data(def: &PlotDef, table: &TableData) -> Result<PlotData, String> {
    let title = def
        .title
        .clone()
        .unwrap_or_else(|| format!("{} vs {}", def.y.join(", "), def.x));

    match def.kind {
        PlotKind::Bar => {
            let column = def
                .y
                .first()
                .ok_or_else(|| "plot declares no y columns".to_string())?;
            let values = numeric_column(table, column)?
                .into_iter()
                .map(|v| v.max(0.0).round() as u64)
                .collect();
            Ok(PlotData::Bars {
                title,
                labels: string_column(table, &def.x)?,
                values,
            })
        }
        kind => {
            let xs = numeric_column(table, &def.x)
                .unwrap_or_else(|_| (0..row_count(table)).map(|i| i as f64).collect());
            let mut series = Vec::with_capacity(def.y.len());
            for name in &def.y {
                let ys = numeric_column(table, name)?;
                let points = xs.iter().copied().zip(ys).collect();
                series.push(Series {
                    name: name.clone(),
                    points,
                });
            }
            let (x_bounds, y_bounds) = bounds(&series);
            Ok(PlotData::Xy {
                kind,
                title,
                x_label: def.x.clone(),
                series,
                x_bounds,
                y_bounds,
            })
        }
    }
}

fn row_count(table: &TableData) -> usize {
    table.batches.iter().map(|b| b.num_rows()).sum()
}

fn column_index(table: &TableData, name: &str) -> Result<usize, String> {
    table
        .schema
        .index_of(name)
        .map_err(|_| format!("column {name:?} not in table"))
}

fn numeric_column(table: &TableData, name: &str) -> Result<Vec<f64>, String> {
    let index = column_index(table, name)?;
    let mut values = Vec::new();
    for batch in &table.batches {
        let column = cast(batch.column(index), &DataType::Float64)
            .map_err(|_| format!("column {name:?} is not numeric"))?;
        let column = column
            .as_any()
            .downcast_ref::<Float64Array>()
            .expect("cast to f64 yields a float array");
        for i in 0..column.len() {
            if column.is_valid(i) {
                values.push(column.value(i));
            }
        }
    }
    Ok(values)
}

fn string_column(table: &TableData, name: &str) -> Result<Vec<String>, String> {
    let index = column_index(table, name)?;
    let options = FormatOptions::default();
    let mut values = Vec::new();
    for batch in &table.batches {
        let formatter = ArrayFormatter::try_new(batch.column(index).as_ref(), &options)
            .map_err(|e| e.to_string())?;
        for i in 0..batch.num_rows() {
            values.push(formatter.value(i).to_string());
        }
    }
    Ok(values)
}

fn bounds(series: &[Series]) -> ([f64; 2], [f64; 2]) {
    let mut x = [f64::MAX, f64::MIN];
    let mut y = [f64::MAX, f64::MIN];
    for point in series.iter().flat_map(|s| s.points.iter()) {
        x[0] = x[0].min(point.0);
        x[1] = x[1].max(point.0);
        y[0] = y[0].min(point.1);
        y[1] = y[1].max(point.1);
    }
    if x[0] > x[1] {
        x = [0.0, 1.0];
    }
    if y[0] > y[1] {
        y = [0.0, 1.0];
    }
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use pretty_assertions::assert_eq;

    fn table() -> TableData {
        let schema = Arc::new(Schema::new(vec![
            Field::new("city", DataType::Utf8, false),
            Field::new("population", DataType::Int64, false),
            Field::new("year", DataType::Int64, false),
        ]));
        let batch = RecordBatch::try_new(
            Arc::clone(&schema),
            vec![
                Arc::new(StringArray::from(vec!["berlin", "hamburg"])),
                Arc::new(Int64Array::from(vec![3_850_809, 1_853_935])),
                Arc::new(Int64Array::from(vec![2024, 2024])),
            ],
        )
        .unwrap();
        TableData {
            schema,
            batches: vec![batch],
        }
    }

    #[test]
    fn instructions_switch_on_plot_presence() {
        assert_eq!(
            plot_instructions(true),
            "Select from the predefined plots:"
        );
        assert_eq!(
            plot_instructions(false),
            "No predefined plots found - declare these in the catalog"
        );
    }

    #[test]
    fn empty_selection_renders_empty_panes() {
        assert_eq!(description_label(None), None);
        assert_eq!(description_contents(None), "");
        let selector = PlotSelector::from_source(None);
        assert!(!selector.has_plots());
        assert_eq!(selector.selected_name(), None);
    }

    #[test]
    fn selector_cycles_through_options() {
        let mut selector = PlotSelector {
            options: vec!["a".into(), "b".into(), "c".into()],
            selected: 0,
            show_spec: false,
        };
        selector.next();
        assert_eq!(selector.selected_name(), Some("b"));
        selector.previous();
        selector.previous();
        assert_eq!(selector.selected_name(), Some("c"));
        selector.next();
        assert_eq!(selector.selected_name(), Some("a"));
    }

    #[test]
    fn xy_extraction_with_numeric_columns() {
        let def = PlotDef {
            kind: PlotKind::Line,
            x: "year".to_string(),
            y: vec!["population".to_string()],
            title: None,
        };
        let PlotData::Xy {
            kind,
            series,
            x_bounds,
            ..
        } = extract_plot_data(&def, &table()).unwrap()
        else {
            panic!("line plots extract xy data");
        };
        assert_eq!(kind, PlotKind::Line);
        assert_eq!(series[0].points, vec![(2024.0, 3_850_809.0), (2024.0, 1_853_935.0)]);
        assert_eq!(x_bounds, [2024.0, 2024.0]);
    }

    #[test]
    fn non_numeric_x_falls_back_to_row_index() {
        let def = PlotDef {
            kind: PlotKind::Scatter,
            x: "city".to_string(),
            y: vec!["population".to_string()],
            title: None,
        };
        let PlotData::Xy { series, .. } = extract_plot_data(&def, &table()).unwrap() else {
            panic!("scatter plots extract xy data");
        };
        assert_eq!(series[0].points[0].0, 0.0);
        assert_eq!(series[0].points[1].0, 1.0);
    }

    #[test]
    fn bar_extraction_uses_string_labels() {
        let def = PlotDef {
            kind: PlotKind::Bar,
            x: "city".to_string(),
            y: vec!["population".to_string()],
            title: Some("Population".to_string()),
        };
        let PlotData::Bars {
            title,
            labels,
            values,
        } = extract_plot_data(&def, &table()).unwrap()
        else {
            panic!("bar plots extract bar data");
        };
        assert_eq!(title, "Population");
        assert_eq!(labels, vec!["berlin", "hamburg"]);
        assert_eq!(values, vec![3_850_809, 1_853_935]);
    }

    #[test]
    fn missing_column_is_an_error() {
        let def = PlotDef {
            kind: PlotKind::Line,
            x: "year".to_string(),
            y: vec!["fare".to_string()],
            title: None,
        };
        let err = extract_plot_data(&def, &table()).unwrap_err();
        assert!(err.contains("fare"));
    }
}
