// Metric catalog - the four volume metrics every new volume gets

/// One of the fixed volume performance metrics. Each kind owns a widget category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetricKind {
    ReadBytes,
    WriteBytes,
    ReadOps,
    WriteOps,
}

impl MetricKind {
    /// Catalog order, which is also the order categories are processed in.
    pub const ALL: [MetricKind; 4] = [
        MetricKind::ReadBytes,
        MetricKind::WriteBytes,
        MetricKind::ReadOps,
        MetricKind::WriteOps,
    ];

    /// Metric name as published by the volume service
    pub fn dimension_name(&self) -> &'static str {
        match self {
            MetricKind::ReadBytes => "VolumeReadBytes",
            MetricKind::WriteBytes => "VolumeWriteBytes",
            MetricKind::ReadOps => "VolumeReadOps",
            MetricKind::WriteOps => "VolumeWriteOps",
        }
    }

    /// Prefix a widget title must start with to belong to this category
    pub fn title_prefix(&self) -> &'static str {
        self.dimension_name()
    }

    /// Title used for the first widget of a category
    pub fn default_title(&self) -> &'static str {
        self.title_prefix()
    }

    /// First category whose prefix starts the title
    pub fn from_title(title: &str) -> Option<MetricKind> {
        Self::ALL
            .into_iter()
            .find(|kind| title.starts_with(kind.title_prefix()))
    }
}

/// A metric bound to the resource it measures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricAssignment {
    pub kind: MetricKind,
    pub resource_id: String,
}

impl MetricAssignment {
    pub fn new(kind: MetricKind, resource_id: impl Into<String>) -> Self {
        Self {
            kind,
            resource_id: resource_id.into(),
        }
    }

    /// The four assignments a newly provisioned volume produces, in catalog order
    pub fn for_volume(volume_id: &str) -> Vec<MetricAssignment> {
        MetricKind::ALL
            .into_iter()
            .map(|kind| MetricAssignment::new(kind, volume_id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixes_do_not_overlap() {
        for a in MetricKind::ALL {
            for b in MetricKind::ALL {
                if a != b {
                    assert!(
                        !a.title_prefix().starts_with(b.title_prefix()),
                        "{:?} prefix overlaps {:?}",
                        a,
                        b
                    );
                }
            }
        }
    }

    #[test]
    fn test_from_title() {
        assert_eq!(MetricKind::from_title("VolumeReadOps 3"), Some(MetricKind::ReadOps));
        assert_eq!(MetricKind::from_title("VolumeWriteBytes"), Some(MetricKind::WriteBytes));
        assert_eq!(MetricKind::from_title("CPU Utilization"), None);
        // prefix match only
        assert_eq!(MetricKind::from_title("Total VolumeReadBytes"), None);
    }

    #[test]
    fn test_for_volume() {
        let assignments = MetricAssignment::for_volume("vol-1");
        assert_eq!(assignments.len(), 4);
        let kinds: Vec<MetricKind> = assignments.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, MetricKind::ALL.to_vec());
        assert!(assignments.iter().all(|a| a.resource_id == "vol-1"));
    }
}
