//! Free-form entry metadata, including the predefined plot definitions the browser renders.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Key under which plot definitions live inside entry metadata.
pub const PLOTS_KEY: &str = "plots";

/// Free-form metadata attached to an entry. Arbitrary keys are carried through untouched; the
/// `plots` key is interpreted as a map of named [`PlotDef`]s.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, Value>);

impl Metadata {
    pub fn new(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Names of the plots declared under the `plots` key, sorted.
    pub fn plot_names(&self) -> Vec<String> {
        match self.0.get(PLOTS_KEY) {
            Some(Value::Object(plots)) => plots.keys().cloned().collect(),
            _ => vec![],
        }
    }

    /// The typed definition of a named plot, if one is declared and well formed.
    pub fn plot(&self, name: &str) -> Option<PlotDef> {
        let def = self.0.get(PLOTS_KEY)?.as_object()?.get(name)?;
        serde_json::from_value(def.clone()).ok()
    }

    /// The raw definition of a named plot, as written in the catalog.
    pub fn plot_value(&self, name: &str) -> Option<&Value> {
        self.0.get(PLOTS_KEY)?.as_object()?.get(name)
    }

    /// A copy with the `plots` key removed, for display surfaces that render plots separately.
    pub fn without_plots(&self) -> Self {
        let mut map = self.0.clone();
        map.remove(PLOTS_KEY);
        Self(map)
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}

/// A predefined plot declared on a catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotDef {
    pub kind: PlotKind,
    /// Column providing x values.
    pub x: String,
    /// Columns providing y series.
    pub y: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlotKind {
    Line,
    Scatter,
    Bar,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn metadata_with_plots() -> Metadata {
        serde_json::from_value(json!({
            "owner": "ops",
            "plots": {
                "fares": {"kind": "line", "x": "time", "y": ["fare", "tip"]},
                "distance": {"kind": "scatter", "x": "fare", "y": ["distance"], "title": "Fare vs distance"}
            }
        }))
        .unwrap()
    }

    #[test]
    fn plot_names_sorted() {
        let metadata = metadata_with_plots();
        assert_eq!(metadata.plot_names(), vec!["distance", "fares"]);
    }

    #[test]
    fn plot_names_empty_without_plots_key() {
        let metadata: Metadata = serde_json::from_value(json!({"owner": "ops"})).unwrap();
        assert!(metadata.plot_names().is_empty());
    }

    #[test]
    fn typed_plot_definition() {
        let metadata = metadata_with_plots();
        let plot = metadata.plot("distance").unwrap();
        assert_eq!(plot.kind, PlotKind::Scatter);
        assert_eq!(plot.x, "fare");
        assert_eq!(plot.y, vec!["distance"]);
        assert_eq!(plot.title.as_deref(), Some("Fare vs distance"));
        assert!(metadata.plot("nope").is_none());
    }

    #[test]
    fn without_plots_keeps_other_keys() {
        let metadata = metadata_with_plots();
        let stripped = metadata.without_plots();
        assert_eq!(stripped.get("owner"), Some(&json!("ops")));
        assert!(stripped.get(PLOTS_KEY).is_none());
        // The original is untouched.
        assert!(metadata.get(PLOTS_KEY).is_some());
    }
}
