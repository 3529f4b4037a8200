use crate::{read_source_file, Source};
use std::path::PathBuf;
use zagent_common::error::{Result, SourceError};
use zagent_common::types::{MetricMap, MetricValue};

const NAME: &str = "memory";

/// `/proc/meminfo` fields reported, and the metric each one maps to.
const FIELDS: [(&str, &str); 6] = [
    ("MemTotal", "vm.memory.size[total]"),
    ("MemFree", "vm.memory.size[free]"),
    ("Buffers", "vm.memory.size[buffers]"),
    ("Cached", "vm.memory.size[cached]"),
    ("SwapTotal", "system.swap.size[,total]"),
    ("SwapFree", "system.swap.size[,free]"),
];

pub struct MemorySource {
    path: PathBuf,
}

impl MemorySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Source for MemorySource {
    fn name(&self) -> &'static str {
        NAME
    }

    fn collect(&self) -> Result<MetricMap> {
        parse_meminfo(&read_source_file(NAME, &self.path)?)
    }
}

/// Parses `name: value unit` lines. Fields other than the six in [`FIELDS`]
/// are ignored so newer kernels adding fields do not break collection.
pub fn parse_meminfo(content: &str) -> Result<MetricMap> {
    let mut metrics = MetricMap::new();
    for line in content.lines() {
        let mut parts = line.split_whitespace();
        let Some(field) = parts.next() else {
            continue;
        };
        let field = field.strip_suffix(':').unwrap_or(field);
        let Some((_, metric)) = FIELDS.iter().find(|(name, _)| *name == field) else {
            continue;
        };
        let value = parts
            .next()
            .ok_or_else(|| SourceError::format(NAME, format!("{field} has no value")))?;
        metrics.push((metric.to_string(), MetricValue::from(value)));
    }
    Ok(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
MemTotal:        8046784 kB
MemFree:          254440 kB
MemAvailable:    3112008 kB
Buffers:          187316 kB
Cached:          2628768 kB
SwapCached:         1024 kB
Active:          4522556 kB
SwapTotal:       2097148 kB
SwapFree:        2086908 kB
HugePages_Total:       0
";

    #[test]
    fn maps_exactly_the_known_fields() {
        let metrics = parse_meminfo(SAMPLE).unwrap();
        let pairs: Vec<_> = metrics.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        assert_eq!(
            pairs,
            vec![
                ("vm.memory.size[total]", "8046784"),
                ("vm.memory.size[free]", "254440"),
                ("vm.memory.size[buffers]", "187316"),
                ("vm.memory.size[cached]", "2628768"),
                ("system.swap.size[,total]", "2097148"),
                ("system.swap.size[,free]", "2086908"),
            ]
        );
    }

    #[test]
    fn unknown_fields_and_blank_lines_are_ignored() {
        let content = "\nMemTotal: 1000 kB\nMemFree: 200 kB\nShmem: 7 kB\n";
        let metrics = parse_meminfo(content).unwrap();
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics[0].0, "vm.memory.size[total]");
        assert_eq!(metrics[0].1, MetricValue::new("1000"));
        assert_eq!(metrics[1].0, "vm.memory.size[free]");
        assert_eq!(metrics[1].1, MetricValue::new("200"));
    }

    #[test]
    fn known_field_without_value_is_format_error() {
        assert!(matches!(parse_meminfo("MemTotal:\n"), Err(SourceError::Format { .. })));
    }
}
