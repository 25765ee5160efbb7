// Widget domain model and builder
use super::error::AllocationError;
use super::metric::MetricAssignment;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

const TITLE_KEY: &str = "title";
const WIDTH_KEY: &str = "width";
const HEIGHT_KEY: &str = "height";
const ENTRIES_KEY: &str = "entries";

/// A chart definition. `title`, `width`, `height` and `entries` are lifted out only when
/// they have the expected shape. Every other key, including malformed values of those
/// four, stays in `properties` and is written back untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Widget {
    pub title: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub entries: Option<Vec<Entry>>,
    pub properties: Map<String, Value>,
}

impl Widget {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }

    pub fn entries(&self) -> &[Entry] {
        self.entries.as_deref().unwrap_or(&[])
    }

    pub fn entries_mut(&mut self) -> &mut Vec<Entry> {
        self.entries.get_or_insert_with(Vec::new)
    }
}

impl From<Map<String, Value>> for Widget {
    fn from(mut properties: Map<String, Value>) -> Self {
        let title = match properties.remove(TITLE_KEY) {
            Some(Value::String(title)) => Some(title),
            Some(other) => {
                properties.insert(TITLE_KEY.to_string(), other);
                None
            }
            None => None,
        };
        let width = take_size(&mut properties, WIDTH_KEY);
        let height = take_size(&mut properties, HEIGHT_KEY);
        let entries = match properties.remove(ENTRIES_KEY) {
            Some(Value::Array(items)) => Some(items.into_iter().map(Entry::from_value).collect()),
            Some(other) => {
                properties.insert(ENTRIES_KEY.to_string(), other);
                None
            }
            None => None,
        };

        Self {
            title,
            width,
            height,
            entries,
            properties,
        }
    }
}

impl From<Widget> for Map<String, Value> {
    fn from(widget: Widget) -> Self {
        let mut map = widget.properties;
        if let Some(title) = widget.title {
            map.insert(TITLE_KEY.to_string(), Value::String(title));
        }
        if let Some(width) = widget.width {
            map.insert(WIDTH_KEY.to_string(), Value::from(width));
        }
        if let Some(height) = widget.height {
            map.insert(HEIGHT_KEY.to_string(), Value::from(height));
        }
        if let Some(entries) = widget.entries {
            let entries = entries.into_iter().map(Entry::into_value).collect();
            map.insert(ENTRIES_KEY.to_string(), Value::Array(entries));
        }
        map
    }
}

// Only non-negative integers that fit are taken; anything else stays a passthrough property
fn take_size(properties: &mut Map<String, Value>, key: &str) -> Option<u32> {
    let size = properties
        .get(key)
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())?;
    properties.remove(key);
    Some(size)
}

/// One line of a widget's series list
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Series(SeriesEntry),
    Derived(DerivedEntry),
    Foreign(Value),
}

const SERIES_KEYS: [&str; 6] = ["namespace", "metricName", "dimension", "resourceId", "id", "label"];
const DERIVED_KEYS: [&str; 3] = ["expression", "id", "label"];

/// Raw series reference, e.g. `m3`
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesEntry {
    pub namespace: String,
    pub metric_name: String,
    pub dimension: String,
    pub resource_id: String,
    pub id: String,
    pub label: String,
    /// Keys such as `color` or `yAxis`, kept as found
    pub extra: Map<String, Value>,
}

/// Aggregate expression over the series with the same number, e.g. `e3`
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedEntry {
    pub expression: String,
    pub id: String,
    pub label: String,
    pub extra: Map<String, Value>,
}

impl Entry {
    /// Classifies a JSON entry by shape. Never fails: unknown shapes become `Foreign`.
    pub fn from_value(value: Value) -> Entry {
        let Value::Object(map) = value else {
            return Entry::Foreign(value);
        };
        match SeriesEntry::from_map(map) {
            Ok(series) => Entry::Series(series),
            Err(map) => match DerivedEntry::from_map(map) {
                Ok(derived) => Entry::Derived(derived),
                Err(map) => Entry::Foreign(Value::Object(map)),
            },
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Entry::Series(s) => s.into_value(),
            Entry::Derived(d) => d.into_value(),
            Entry::Foreign(value) => value,
        }
    }

    fn series_id(&self) -> Option<&str> {
        match self {
            Entry::Series(s) => Some(&s.id),
            Entry::Derived(d) => Some(&d.id),
            Entry::Foreign(_) => None,
        }
    }
}

impl SeriesEntry {
    fn from_map(mut map: Map<String, Value>) -> Result<Self, Map<String, Value>> {
        let Some([namespace, metric_name, dimension, resource_id, id, label]) =
            take_strings(&mut map, SERIES_KEYS)
        else {
            return Err(map);
        };
        Ok(Self {
            namespace,
            metric_name,
            dimension,
            resource_id,
            id,
            label,
            extra: map,
        })
    }

    fn into_value(self) -> Value {
        let values = [
            self.namespace,
            self.metric_name,
            self.dimension,
            self.resource_id,
            self.id,
            self.label,
        ];
        Value::Object(put_strings(self.extra, SERIES_KEYS, values))
    }
}

impl DerivedEntry {
    fn from_map(mut map: Map<String, Value>) -> Result<Self, Map<String, Value>> {
        let Some([expression, id, label]) = take_strings(&mut map, DERIVED_KEYS) else {
            return Err(map);
        };
        Ok(Self {
            expression,
            id,
            label,
            extra: map,
        })
    }

    fn into_value(self) -> Value {
        Value::Object(put_strings(self.extra, DERIVED_KEYS, [self.expression, self.id, self.label]))
    }
}

/// Removes `keys` from the map if every one of them holds a string, otherwise leaves it alone
fn take_strings<const N: usize>(map: &mut Map<String, Value>, keys: [&str; N]) -> Option<[String; N]> {
    if !keys.iter().all(|key| map.get(*key).is_some_and(Value::is_string)) {
        return None;
    }
    Some(keys.map(|key| match map.remove(key) {
        Some(Value::String(s)) => s,
        _ => String::new(),
    }))
}

fn put_strings<const N: usize>(
    mut map: Map<String, Value>,
    keys: [&str; N],
    values: [String; N],
) -> Map<String, Value> {
    for (key, value) in keys.into_iter().zip(values) {
        map.insert(key.to_string(), Value::String(value));
    }
    map
}

#[derive(Debug, Deserialize, Clone)]
pub struct WidgetTemplate {
    #[serde(default = "default_size")]
    pub width: u32,
    #[serde(default = "default_size")]
    pub height: u32,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_period")]
    pub period: u32,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_view")]
    pub view: String,
    #[serde(default)]
    pub stacked: bool,
}

fn default_size() -> u32 {
    6
}

fn default_region() -> String {
    "ap-northeast-1".to_string()
}

fn default_period() -> u32 {
    300
}

fn default_namespace() -> String {
    "AWS/EBS".to_string()
}

fn default_view() -> String {
    "timeSeries".to_string()
}

impl Default for WidgetTemplate {
    fn default() -> Self {
        Self {
            width: default_size(),
            height: default_size(),
            region: default_region(),
            period: default_period(),
            namespace: default_namespace(),
            view: default_view(),
            stacked: false,
        }
    }
}

const DIMENSION_KEY: &str = "VolumeId";

/// Next series number for a widget: one past the id of the last id-bearing entry.
/// Ids may have gaps, so this never looks at the entry count.
pub fn next_series_id(widget: &Widget) -> Result<u64, AllocationError> {
    let last_id = widget.entries().iter().rev().find_map(Entry::series_id);
    match last_id {
        None => Ok(1),
        Some(id) => parse_series_number(id)
            .and_then(|n| n.checked_add(1))
            .ok_or_else(|| AllocationError::MalformedSeriesId {
                widget: widget.title().to_string(),
                id: id.to_string(),
            }),
    }
}

// "e12" -> 12
fn parse_series_number(id: &str) -> Option<u64> {
    let digits = id.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    if digits.is_empty() || digits.len() == id.len() {
        return None;
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[derive(Debug, Clone, Default)]
pub struct WidgetBuilder {
    template: WidgetTemplate,
}

impl WidgetBuilder {
    pub fn new(template: WidgetTemplate) -> Self {
        Self { template }
    }

    /// Fresh widget with one series/derived pair per metric, numbered from 1
    pub fn create_widget(&self, title: &str, metrics: &[MetricAssignment]) -> Widget {
        let mut properties = Map::new();
        properties.insert("type".to_string(), json!("metric"));
        properties.insert("x".to_string(), json!(0));
        properties.insert("y".to_string(), json!(0));
        properties.insert("region".to_string(), json!(self.template.region));
        properties.insert("period".to_string(), json!(self.template.period));
        properties.insert("view".to_string(), json!(self.template.view));
        properties.insert("stacked".to_string(), json!(self.template.stacked));

        let mut widget = Widget {
            title: Some(title.to_string()),
            width: Some(self.template.width),
            height: Some(self.template.height),
            entries: Some(Vec::with_capacity(metrics.len() * 2)),
            properties,
        };
        self.push_pairs(&mut widget, 1, metrics);
        widget
    }

    /// Appends one pair per metric, continuing after the widget's last series id
    pub fn extend_widget(
        &self,
        mut widget: Widget,
        metrics: &[MetricAssignment],
    ) -> Result<Widget, AllocationError> {
        let first = next_series_id(&widget)?;
        self.push_pairs(&mut widget, first, metrics);
        Ok(widget)
    }

    fn push_pairs(&self, widget: &mut Widget, first: u64, metrics: &[MetricAssignment]) {
        let entries = widget.entries_mut();
        for (n, metric) in (first..).zip(metrics) {
            entries.push(Entry::Series(SeriesEntry {
                namespace: self.template.namespace.clone(),
                metric_name: metric.kind.dimension_name().to_string(),
                dimension: DIMENSION_KEY.to_string(),
                resource_id: metric.resource_id.clone(),
                id: format!("m{}", n),
                label: metric.resource_id.clone(),
                extra: Map::new(),
            }));
            entries.push(Entry::Derived(DerivedEntry {
                expression: format!("SUM(METRICS('m{}'))/{}", n, self.template.period),
                id: format!("e{}", n),
                label: metric.resource_id.clone(),
                extra: Map::new(),
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metric::MetricKind;

    fn assignments(kind: MetricKind, ids: &[&str]) -> Vec<MetricAssignment> {
        ids.iter().map(|id| MetricAssignment::new(kind, *id)).collect()
    }

    fn derived_ids(widget: &Widget) -> Vec<String> {
        widget
            .entries()
            .iter()
            .filter_map(|e| match e {
                Entry::Derived(d) => Some(d.id.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_create_widget() {
        let builder = WidgetBuilder::default();
        let widget = builder.create_widget(
            "VolumeReadBytes",
            &assignments(MetricKind::ReadBytes, &["vol-a", "vol-b"]),
        );

        assert_eq!(widget.width, Some(6));
        assert_eq!(widget.height, Some(6));
        assert_eq!(widget.entries().len(), 4);
        assert_eq!(derived_ids(&widget), vec!["e1", "e2"]);

        match &widget.entries()[2] {
            Entry::Series(s) => {
                assert_eq!(s.id, "m2");
                assert_eq!(s.metric_name, "VolumeReadBytes");
                assert_eq!(s.resource_id, "vol-b");
                assert_eq!(s.label, "vol-b");
            }
            other => panic!("expected series entry, got {:?}", other),
        }
        match &widget.entries()[3] {
            Entry::Derived(d) => assert_eq!(d.expression, "SUM(METRICS('m2'))/300"),
            other => panic!("expected derived entry, got {:?}", other),
        }
    }

    #[test]
    fn test_next_series_id_empty_widget() {
        let builder = WidgetBuilder::default();
        let widget = builder.create_widget("VolumeReadOps", &[]);
        assert_eq!(next_series_id(&widget).unwrap(), 1);
    }

    #[test]
    fn test_next_series_id_ignores_entry_count() {
        let builder = WidgetBuilder::default();
        let mut widget =
            builder.create_widget("VolumeReadOps", &assignments(MetricKind::ReadOps, &["vol-a"]));
        if let Entry::Derived(d) = &mut widget.entries_mut()[1] {
            d.id = "e7".to_string();
        }
        assert_eq!(widget.entries().len(), 2);
        assert_eq!(next_series_id(&widget).unwrap(), 8);

        let widget = builder
            .extend_widget(widget, &assignments(MetricKind::ReadOps, &["vol-b"]))
            .unwrap();
        assert_eq!(derived_ids(&widget), vec!["e7", "e8"]);
    }

    #[test]
    fn test_next_series_id_skips_foreign_tail() {
        let builder = WidgetBuilder::default();
        let mut widget =
            builder.create_widget("VolumeReadOps", &assignments(MetricKind::ReadOps, &["a", "b"]));
        widget.entries_mut().push(Entry::Foreign(json!(["annotation"])));
        assert_eq!(next_series_id(&widget).unwrap(), 3);
    }

    #[test]
    fn test_next_series_id_malformed() {
        let builder = WidgetBuilder::default();
        let mut widget =
            builder.create_widget("VolumeReadOps", &assignments(MetricKind::ReadOps, &["a"]));
        if let Entry::Derived(d) = &mut widget.entries_mut()[1] {
            d.id = "total".to_string();
        }
        let err = next_series_id(&widget).unwrap_err();
        assert!(matches!(err, AllocationError::MalformedSeriesId { .. }));
    }

    #[test]
    fn test_extend_widget_grows_by_two_per_metric() {
        let builder = WidgetBuilder::default();
        let widget = builder.create_widget(
            "VolumeWriteOps",
            &assignments(MetricKind::WriteOps, &["a", "b", "c"]),
        );
        let widget = builder
            .extend_widget(widget, &assignments(MetricKind::WriteOps, &["d", "e"]))
            .unwrap();
        assert_eq!(widget.entries().len(), 10);
        assert_eq!(derived_ids(&widget), vec!["e1", "e2", "e3", "e4", "e5"]);
    }

    #[test]
    fn test_foreign_widget_round_trips() {
        let raw = json!({
            "type": "text",
            "x": 6,
            "y": 0,
            "width": 12,
            "height": 3,
            "properties": {"markdown": "# Storage"}
        });
        let widget: Widget = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(widget.title(), "");
        assert!(widget.entries().is_empty());

        assert_eq!(serde_json::to_value(&widget).unwrap(), raw);
    }

    #[test]
    fn test_entries_deserialize_by_shape() {
        let raw = json!({
            "title": "VolumeReadBytes",
            "entries": [
                {"namespace": "AWS/EBS", "metricName": "VolumeReadBytes", "dimension": "VolumeId",
                 "resourceId": "vol-1", "id": "m1", "label": "vol-1"},
                {"expression": "SUM(METRICS('m1'))/300", "id": "e1", "label": "vol-1"},
                ["AWS/EC2", "CPUUtilization"]
            ]
        });
        let widget: Widget = serde_json::from_value(raw).unwrap();
        assert!(matches!(widget.entries()[0], Entry::Series(_)));
        assert!(matches!(widget.entries()[1], Entry::Derived(_)));
        assert!(matches!(widget.entries()[2], Entry::Foreign(_)));
    }

    #[test]
    fn test_entry_extra_keys_survive_extend() {
        let raw = json!({
            "title": "VolumeReadBytes",
            "entries": [
                {"namespace": "AWS/EBS", "metricName": "VolumeReadBytes", "dimension": "VolumeId",
                 "resourceId": "vol-1", "id": "m1", "label": "vol-1", "visible": false},
                {"expression": "SUM(METRICS('m1'))/300", "id": "e1", "label": "vol-1",
                 "color": "#2ca02c"}
            ]
        });
        let widget: Widget = serde_json::from_value(raw.clone()).unwrap();
        match &widget.entries()[1] {
            Entry::Derived(d) => assert_eq!(d.extra.get("color"), Some(&json!("#2ca02c"))),
            other => panic!("expected derived entry, got {:?}", other),
        }
        assert_eq!(serde_json::to_value(&widget).unwrap(), raw);

        let builder = WidgetBuilder::default();
        let widget = builder
            .extend_widget(widget, &assignments(MetricKind::ReadBytes, &["vol-2"]))
            .unwrap();
        let value = serde_json::to_value(&widget).unwrap();
        assert_eq!(value["entries"][0]["visible"], json!(false));
        assert_eq!(value["entries"][1]["color"], json!("#2ca02c"));
        assert_eq!(value["entries"][2]["id"], json!("m2"));
    }

    #[test]
    fn test_empty_title_and_entries_are_kept() {
        let raw = json!({"type": "text", "title": "", "entries": []});
        let widget: Widget = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(widget.title.as_deref(), Some(""));
        assert_eq!(widget.entries, Some(Vec::new()));
        assert_eq!(serde_json::to_value(&widget).unwrap(), raw);
    }

    #[test]
    fn test_malformed_widget_fields_pass_through() {
        let raw = json!({
            "type": "text",
            "title": null,
            "width": 6.5,
            "height": "tall",
            "entries": {"note": "not a list"}
        });
        let widget: Widget = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(widget.title(), "");
        assert_eq!(widget.width, None);
        assert_eq!(widget.height, None);
        assert!(widget.entries().is_empty());
        assert_eq!(widget.properties.get("title"), Some(&Value::Null));

        assert_eq!(serde_json::to_value(&widget).unwrap(), raw);
    }

    #[test]
    fn test_oversized_width_stays_raw() {
        let raw = json!({"title": "CPU", "width": 5_000_000_000u64, "height": -1});
        let widget: Widget = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(widget.width, None);
        assert_eq!(widget.height, None);
        assert_eq!(serde_json::to_value(&widget).unwrap(), raw);
    }
}
