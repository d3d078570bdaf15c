use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::config::CollisionPolicy;
use crate::inventory::filter::ResultFilter;

/// Field names addressable by label mappings, regex captures, statics and
/// result filters.
pub const RECORD_FIELDS: [&str; 5] = ["type", "brand", "model", "serial", "location"];

/// One canonical inventory record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InventoryRecord {
    pub kind: String,
    pub brand: String,
    pub model: String,
    pub serial: String,
    pub location: String,

    /// Verbatim label values collected through `labels.extra`.
    pub extra: Vec<String>,

    /// Provenance: spec name (when present), own metric, then the metrics
    /// of the joins that contributed, in resolution order.
    pub sources: Vec<String>,

    pub collisions: CollisionPolicy,

    /// Set when an ignore rule matched but the row was kept.
    pub ignored: bool,
}

impl InventoryRecord {
    /// Read access to a string field by its configuration name.
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            "type" => Some(&self.kind),
            "brand" => Some(&self.brand),
            "model" => Some(&self.model),
            "serial" => Some(&self.serial),
            "location" => Some(&self.location),
            _ => None,
        }
    }

    /// Assigns a string field by its configuration name. Targets outside
    /// the record shape are dropped.
    pub fn set_field(&mut self, name: &str, value: &str) {
        match name {
            "type" => self.kind = value.to_string(),
            "brand" => self.brand = value.to_string(),
            "model" => self.model = value.to_string(),
            "serial" => self.serial = value.to_string(),
            "location" => self.location = value.to_string(),
            _ => trace!("Dropping assignment to unknown field '{}'", name),
        }
    }
}

/// A normalized record plus the side data join resolution needs: the raw
/// values of the index labels the resolution asked to preserve, and
/// assignments to target names outside the record shape (a join may declare
/// such a field purely to feed the parent's `extra` list). Neither reaches
/// the public record shape.
#[derive(Debug, Clone, Default)]
pub(crate) struct NormalizedRow {
    pub(crate) record: InventoryRecord,
    pub(crate) index_values: BTreeMap<String, String>,
    custom: BTreeMap<String, String>,
}

impl NormalizedRow {
    pub(crate) fn new(record: InventoryRecord) -> Self {
        Self {
            record,
            index_values: BTreeMap::new(),
            custom: BTreeMap::new(),
        }
    }

    /// Routes an assignment to the typed record field of that name, or to
    /// the internal side map when the name is outside the record shape.
    pub(crate) fn assign(&mut self, name: &str, value: &str) {
        if RECORD_FIELDS.contains(&name) {
            self.record.set_field(name, value);
        } else {
            self.custom.insert(name.to_string(), value.to_string());
        }
    }

    /// Reads a typed field or a side-map assignment by name.
    pub(crate) fn value_of(&self, name: &str) -> Option<&str> {
        self.record
            .field(name)
            .or_else(|| self.custom.get(name).map(String::as_str))
    }
}

/// The accumulating collection of normalized records. Insertion goes
/// through `push`, which merges colliding rows under the record's collision
/// policy; rows are never deleted, only completed in place or appended.
#[derive(Debug, Default)]
pub struct Inventory {
    rows: Vec<NormalizedRow>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &InventoryRecord> {
        self.rows.iter().map(|row| &row.record)
    }

    /// Lazy, restartable view over the records passing the filter.
    pub fn filtered<'a>(
        &'a self,
        filter: &'a ResultFilter,
    ) -> impl Iterator<Item = &'a InventoryRecord> + 'a {
        self.records().filter(|record| filter.accepts(record))
    }

    pub(crate) fn rows(&self) -> &[NormalizedRow] {
        &self.rows
    }

    /// Inserts a row, first trying to complete an existing record sharing
    /// `(type, model, location)`. Brand and serial are the only fields
    /// eligible for completion; the first existing row that takes a fill
    /// absorbs the new row, otherwise the row is appended.
    pub(crate) fn push(&mut self, row: NormalizedRow) {
        match row.record.collisions {
            CollisionPolicy::Override => {
                for existing in &mut self.rows {
                    let dr = &mut existing.record;
                    if dr.kind != row.record.kind
                        || dr.model != row.record.model
                        || dr.location != row.record.location
                    {
                        continue;
                    }
                    let mut merged = false;
                    if dr.brand.is_empty() && !row.record.brand.is_empty() {
                        debug!(
                            "Collision in brand for model '{}': taking '{}'",
                            dr.model, row.record.brand
                        );
                        dr.brand = row.record.brand.clone();
                        merge_sources(&mut dr.sources, &row.record.sources);
                        merged = true;
                    }
                    if dr.serial.is_empty() && !row.record.serial.is_empty() {
                        debug!(
                            "Collision in serial for model '{}': taking '{}'",
                            dr.model, row.record.serial
                        );
                        dr.serial = row.record.serial.clone();
                        merge_sources(&mut dr.sources, &row.record.sources);
                        merged = true;
                    }
                    if merged {
                        return;
                    }
                }
            }
        }
        self.rows.push(row);
    }
}

/// Appends the names from `incoming` that are not already present,
/// preserving existing order.
fn merge_sources(existing: &mut Vec<String>, incoming: &[String]) {
    for name in incoming {
        if !existing.iter().any(|s| s == name) {
            existing.push(name.clone());
        }
    }
}
