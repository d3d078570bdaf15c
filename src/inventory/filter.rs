use crate::config::ConfigError;
use crate::inventory::record::{InventoryRecord, RECORD_FIELDS};

/// The final view's row predicate: ordered `field=value` pairs. A non-empty
/// inclusion set requires every pair to match; otherwise a non-empty
/// exclusion set drops rows matching any pair. Inclusion takes precedence
/// when both are configured.
#[derive(Debug, Clone, Default)]
pub struct ResultFilter {
    include: Vec<(String, String)>,
    exclude: Vec<(String, String)>,
}

impl ResultFilter {
    /// Parses comma-separated `field=value` lists from the CLI surface.
    pub fn parse(include: Option<&str>, exclude: Option<&str>) -> Result<Self, ConfigError> {
        Ok(Self {
            include: parse_pairs(include)?,
            exclude: parse_pairs(exclude)?,
        })
    }

    pub fn accepts(&self, record: &InventoryRecord) -> bool {
        if !self.include.is_empty() {
            self.include
                .iter()
                .all(|(field, value)| record.field(field) == Some(value.as_str()))
        } else if !self.exclude.is_empty() {
            !self
                .exclude
                .iter()
                .any(|(field, value)| record.field(field) == Some(value.as_str()))
        } else {
            true
        }
    }
}

fn parse_pairs(raw: Option<&str>) -> Result<Vec<(String, String)>, ConfigError> {
    let Some(raw) = raw.filter(|s| !s.is_empty()) else {
        return Ok(Vec::new());
    };

    let mut pairs = Vec::new();
    for part in raw.split(',') {
        let Some((field, value)) = part.split_once('=') else {
            return Err(ConfigError::MalformedFilterPair(part.to_string()));
        };
        if !RECORD_FIELDS.contains(&field) {
            return Err(ConfigError::UnknownFilterField(field.to_string()));
        }
        pairs.push((field.to_string(), value.to_string()));
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(kind: &str, location: &str) -> InventoryRecord {
        InventoryRecord {
            kind: kind.to_string(),
            location: location.to_string(),
            ..InventoryRecord::default()
        }
    }

    #[test]
    fn no_pairs_passes_everything() {
        let filter = ResultFilter::parse(None, None).unwrap();
        assert!(filter.accepts(&record("switch", "dc1")));
    }

    #[test]
    fn inclusion_requires_every_pair() {
        let filter = ResultFilter::parse(Some("type=switch,location=dc1"), None).unwrap();
        assert!(filter.accepts(&record("switch", "dc1")));
        assert!(!filter.accepts(&record("switch", "dc2")));
        assert!(!filter.accepts(&record("server", "dc1")));
    }

    #[test]
    fn exclusion_drops_on_any_pair() {
        let filter = ResultFilter::parse(None, Some("location=dc1,location=dc2")).unwrap();
        assert!(!filter.accepts(&record("switch", "dc1")));
        assert!(!filter.accepts(&record("switch", "dc2")));
        assert!(filter.accepts(&record("switch", "dc3")));
    }

    #[test]
    fn inclusion_wins_over_exclusion() {
        // Excluded by inclusion, retained by exclusion: inclusion decides
        let filter = ResultFilter::parse(Some("location=dc1"), Some("location=dc1")).unwrap();
        assert!(!filter.accepts(&record("switch", "dc2")));
        assert!(filter.accepts(&record("switch", "dc1")));
    }

    #[test]
    fn unknown_field_is_rejected() {
        assert!(matches!(
            ResultFilter::parse(Some("bogus=1"), None),
            Err(ConfigError::UnknownFilterField(_))
        ));
    }

    #[test]
    fn malformed_pair_is_rejected() {
        assert!(matches!(
            ResultFilter::parse(Some("typeswitch"), None),
            Err(ConfigError::MalformedFilterPair(_))
        ));
    }
}
