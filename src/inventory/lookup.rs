use std::collections::{BTreeMap, HashMap};

/// The resolved result of one join target field: the index definition, the
/// source metric (recorded as provenance on hits) and the correlation data.
#[derive(Debug, Clone)]
pub struct LookupTable {
    /// Target field the resolved values feed.
    pub field: String,

    /// Ordered source labels forming the correlation key.
    pub index: Vec<String>,

    /// Query expression of the join metric.
    pub metric: String,

    /// Composite index key -> resolved value.
    pub data: HashMap<String, String>,
}

/// Joins the values of the index labels with `-`, in index order. Returns
/// None when any index label is missing from the row, in which case the row
/// cannot participate in the join.
pub fn index_key(labels: &BTreeMap<String, String>, index: &[String]) -> Option<String> {
    let mut values = Vec::with_capacity(index.len());
    for label in index {
        values.push(labels.get(label)?.as_str());
    }
    Some(values.join("-"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn key_preserves_index_order() {
        let row = labels(&[("idx", "1"), ("host", "sw1")]);
        let index = vec!["host".to_string(), "idx".to_string()];
        assert_eq!(index_key(&row, &index), Some("sw1-1".to_string()));
    }

    #[test]
    fn missing_index_label_yields_no_key() {
        let row = labels(&[("host", "sw1")]);
        let index = vec!["host".to_string(), "idx".to_string()];
        assert_eq!(index_key(&row, &index), None);
    }

    #[test]
    fn single_field_key_is_the_raw_value() {
        let row = labels(&[("host", "sw1")]);
        assert_eq!(index_key(&row, &["host".to_string()]), Some("sw1".to_string()));
    }
}
