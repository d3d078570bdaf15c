use std::collections::HashMap;

use anyhow::{Result, Context};
use futures::future::{BoxFuture, FutureExt};
use regex::Regex;
use tracing::{debug, error, info};

use crate::config::{compile_anchored, Config, MetricSpec};
use crate::inventory::ignore::IgnoreMatcher;
use crate::inventory::lookup::{index_key, LookupTable};
use crate::inventory::record::{Inventory, InventoryRecord, NormalizedRow};
use crate::prom::{MetricSource, QueryResponse};

/// Boundary parameters the collector takes from its caller.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Drop rows matching an ignore rule instead of flagging them.
    pub hide_ignored: bool,

    /// When set, process only the spec with this name.
    pub only: Option<String>,

    /// When set, process every spec except the one with this name.
    pub except: Option<String>,
}

impl RunOptions {
    /// Spec selection: an inclusion name wins over an exclusion name; with
    /// neither set, every spec runs.
    fn selects(&self, name: Option<&str>) -> bool {
        if let Some(only) = &self.only {
            name == Some(only.as_str())
        } else if let Some(except) = &self.except {
            name != Some(except.as_str())
        } else {
            true
        }
    }
}

/// Per-run correlation context: the metric source, the query memo and the
/// most recent fetch error. One collector serves exactly one run; the memo
/// is never invalidated.
pub struct Collector<S> {
    source: S,
    opts: RunOptions,
    cache: HashMap<String, QueryResponse>,
    last_error: Option<String>,
}

impl<S: MetricSource> Collector<S> {
    pub fn new(source: S, opts: RunOptions) -> Self {
        Self {
            source,
            opts,
            cache: HashMap::new(),
            last_error: None,
        }
    }

    /// The most recent fetch error, when any spec was skipped.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Processes every selected spec and returns the accumulated inventory.
    pub async fn run(&mut self, config: &Config) -> Result<Inventory> {
        let mut inventory = Inventory::new();
        for spec in &config.map {
            if !self.opts.selects(spec.name.as_deref()) {
                debug!(
                    "Skipping '{}' per only/except selection",
                    spec.name.as_deref().unwrap_or(&spec.metric)
                );
                continue;
            }
            self.process(spec, &[], &mut inventory).await?;
        }
        info!("Collected {} inventory records", inventory.len());
        Ok(inventory)
    }

    fn record_error(&mut self, message: String) {
        error!("{}", message);
        self.last_error = Some(message);
    }

    /// Fetches a query result through the per-run memo: at most one fetch
    /// per distinct expression, however many specs and joins reference it.
    async fn fetch(&mut self, expr: &str) -> Result<QueryResponse> {
        if let Some(cached) = self.cache.get(expr) {
            debug!("Returning cached results for: {}", expr);
            return Ok(cached.clone());
        }
        debug!("Querying: {}", expr);
        let response = self.source.query(expr).await?;
        self.cache.insert(expr.to_string(), response.clone());
        Ok(response)
    }

    /// Resolves a spec's join declarations into lookup tables, one per
    /// target field the join declares, in declaration order. Each join
    /// inherits the parent's ignore rules and is materialized through the
    /// regular row pipeline with its index labels preserved.
    async fn build_lookups(&mut self, spec: &MetricSpec) -> Result<Vec<LookupTable>> {
        let mut tables = Vec::new();
        for join in &spec.join {
            debug!(
                "Building lookups for: {} using index: {:?}",
                join.spec.metric, join.index
            );
            let mut join_spec = join.spec.clone();
            // Push down the parent's ignore rules
            join_spec
                .ignore_regexp
                .extend(spec.ignore_regexp.iter().cloned());

            let mut rows = Inventory::new();
            self.process(&join_spec, &join.index, &mut rows).await?;
            debug!("Join on {} produced {} rows", join_spec.metric, rows.len());

            for field in join_spec.labels.fields.keys() {
                let mut data = HashMap::new();
                for row in rows.rows() {
                    let Some(key) = index_key(&row.index_values, &join.index) else {
                        continue;
                    };
                    let value = row.value_of(field).unwrap_or_default();
                    data.insert(key, value.to_string());
                }
                tables.push(LookupTable {
                    field: field.clone(),
                    index: join.index.clone(),
                    metric: join_spec.metric.clone(),
                    data,
                });
            }
        }
        Ok(tables)
    }

    /// Turns one spec's raw result rows into normalized records pushed into
    /// `inventory`. `preserve` lists the raw labels whose values must
    /// survive normalization (the enclosing join's index labels; empty at
    /// the top level). A failed fetch records the error and skips the spec.
    ///
    /// Boxed because join resolution recurses back into `process`.
    fn process<'a>(
        &'a mut self,
        spec: &'a MetricSpec,
        preserve: &'a [String],
        inventory: &'a mut Inventory,
    ) -> BoxFuture<'a, Result<()>> {
        async move {
            debug!(
                "Processing entry={}, targets={:?}",
                spec.metric,
                spec.labels.fields.keys().collect::<Vec<_>>()
            );

            let lookups = self.build_lookups(spec).await?;

            let response = match self.fetch(&spec.metric).await {
                Ok(response) => response,
                Err(e) => {
                    self.record_error(format!(
                        "Prometheus query failed for metric [{}]: {:#}",
                        spec.metric, e
                    ));
                    return Ok(());
                }
            };
            if !response.is_success() {
                let detail = response.error.as_deref().unwrap_or(&response.status);
                self.record_error(format!(
                    "Prometheus query failed for metric [{}]: {}",
                    spec.metric, detail
                ));
                return Ok(());
            }

            let ignore = IgnoreMatcher::new(&spec.ignore_regexp)?;
            let regexps = compile_regexps(spec)?;

            for sample in response.rows() {
                let mut labels = sample.metric.clone();
                let mut row = NormalizedRow::new(InventoryRecord {
                    kind: spec.kind.clone(),
                    sources: vec![spec.metric.clone()],
                    collisions: spec.collisions,
                    ..InventoryRecord::default()
                });

                // Resolve joined fields into the row's own labels so the
                // mapping below (and `extra`) can see them
                for table in &lookups {
                    let Some(key) = index_key(&labels, &table.index) else {
                        continue;
                    };
                    if let Some(value) = table.data.get(&key) {
                        labels.insert(table.field.clone(), value.clone());
                        row.record.sources.push(table.metric.clone());
                    }
                }

                // Label mapping: a later label overwrites an earlier
                // assignment to the same target field
                for (label, raw) in &labels {
                    for (target, sources) in &spec.labels.fields {
                        if sources.matches(label) {
                            row.assign(target, raw.trim());
                        }
                    }
                    if spec.labels.extra.iter().any(|extra| extra == label) {
                        row.record.extra.push(raw.clone());
                    }
                }

                // Regex extraction takes precedence over label mapping
                for (label, re) in &regexps {
                    let Some(value) = labels.get(label) else {
                        continue;
                    };
                    if let Some(caps) = re.captures(value) {
                        for name in re.capture_names().flatten() {
                            if let Some(capture) = caps.name(name) {
                                row.assign(name, capture.as_str());
                            }
                        }
                    }
                }

                // Static overrides win unconditionally
                for (field, value) in &spec.statics {
                    row.assign(field, value);
                }

                if ignore.matches(&labels) {
                    if self.opts.hide_ignored {
                        continue;
                    }
                    row.record.extra.push("ignored".to_string());
                    row.record.ignored = true;
                }

                if let Some(name) = &spec.name {
                    row.record.sources.insert(0, name.clone());
                }

                for label in preserve {
                    if let Some(value) = labels.get(label) {
                        row.index_values.insert(label.clone(), value.clone());
                    }
                }
                inventory.push(row);
            }
            Ok(())
        }
        .boxed()
    }
}

/// Compiles the spec's extraction patterns, keyed by source label.
fn compile_regexps(spec: &MetricSpec) -> Result<Vec<(String, Regex)>> {
    let mut compiled = Vec::with_capacity(spec.regexp.len());
    for (label, pattern) in &spec.regexp {
        let re = compile_anchored(pattern).with_context(|| {
            format!(
                "Invalid pattern '{}' for label '{}' in metric '{}'",
                pattern, label, spec.metric
            )
        })?;
        compiled.push((label.clone(), re));
    }
    Ok(compiled)
}
