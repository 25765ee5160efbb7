// Widget classification by category title prefix
use super::metric::MetricKind;
use super::widget::Widget;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct Classification {
    /// Matched widgets per category, in encounter order
    pub buckets: BTreeMap<MetricKind, Vec<Widget>>,
    /// Everything else, in original order
    pub unmanaged: Vec<Widget>,
}

impl Classification {
    pub fn take_bucket(&mut self, kind: MetricKind) -> Vec<Widget> {
        self.buckets.remove(&kind).unwrap_or_default()
    }
}

pub fn classify(widgets: Vec<Widget>) -> Classification {
    let mut classification = Classification::default();
    for widget in widgets {
        match MetricKind::from_title(widget.title()) {
            Some(kind) => classification.buckets.entry(kind).or_default().push(widget),
            None => classification.unmanaged.push(widget),
        }
    }
    classification
}
