//! Visibility build: flattens expanded rows, indexes heights, ids and connectors.

use rustc_hash::{FxBuildHasher, FxHashMap};

use crate::config::ControllerConfig;
use crate::height::HeightCache;
use crate::meta::ItemMeta;
use crate::model::{GanttModel, Traversal};
use crate::task::{ConnectorFields, ConnectorKind, ConnectorStyle};

/// A visible row addressed by id and row index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ItemRef<Id> {
    pub id: Id,
    pub row: usize,
}

/// A period of a visible resource row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PeriodRef<Id> {
    pub item: Id,
    pub row: usize,
    /// Position in the owner's `periods` list.
    pub period: usize,
}

/// Either end of a connector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConnectorEnd<Id> {
    Item(ItemRef<Id>),
    Period(PeriodRef<Id>),
}

impl<Id> ConnectorEnd<Id> {
    pub const fn row(&self) -> usize {
        match self {
            Self::Item(item) => item.row,
            Self::Period(period) => period.row,
        }
    }
}

/// Target of a connector after the visibility build.
///
/// Targets that are not in the visible set (collapsed away, missing or misspelled)
/// stay `Pending` with their raw id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectorTarget<Id> {
    Resolved(ConnectorEnd<Id>),
    Pending(String),
}

impl<Id> ConnectorTarget<Id> {
    pub const fn resolved(&self) -> Option<&ConnectorEnd<Id>> {
        match self {
            Self::Resolved(end) => Some(end),
            Self::Pending(_) => None,
        }
    }
}

/// A dependency line between two visible rows or periods.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Connector<Id> {
    pub from: ConnectorEnd<Id>,
    pub to: ConnectorTarget<Id>,
    pub kind: ConnectorKind,
    pub style: Option<ConnectorStyle>,
}

/// Output of a visibility build.
#[derive(Clone, Debug)]
pub struct VisibleRows<Id> {
    /// Visible rows in document order.
    pub items: Vec<Id>,
    pub heights: HeightCache,
    /// Task id to first visible row carrying it.
    pub items_map: FxHashMap<String, ItemRef<Id>>,
    /// Period id to first visible period carrying it (resource mode).
    pub periods_map: FxHashMap<String, PeriodRef<Id>>,
    pub connectors: Vec<Connector<Id>>,
}

impl<Id> Default for VisibleRows<Id> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            heights: HeightCache::new(),
            items_map: FxHashMap::default(),
            periods_map: FxHashMap::default(),
            connectors: Vec::new(),
        }
    }
}

impl<Id> VisibleRows<Id> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Flattens every row not hidden under a collapsed ancestor.
///
/// Row height is the task's own `row_height` when positive, else the configured
/// default, plus the stroke thickness. In both id maps the first occurrence wins.
pub fn build_visibility<T: GanttModel>(
    model: &T,
    metas: &FxHashMap<T::Id, ItemMeta>,
    config: &ControllerConfig,
) -> VisibleRows<T::Id> {
    let _span = tracing::debug_span!("build_visibility", mode = ?config.mode).entered();

    let capacity = metas.len();
    let mut rows = VisibleRows {
        items: Vec::with_capacity(capacity),
        heights: HeightCache::with_capacity(capacity),
        items_map: FxHashMap::with_capacity_and_hasher(capacity, FxBuildHasher),
        periods_map: FxHashMap::default(),
        connectors: Vec::new(),
    };

    let walk = Traversal::new(model)
        .descend_if(|_, id| !metas.get(&id).is_some_and(|meta| meta.collapsed));
    for (id, _) in walk {
        let task = model.task(id);
        let height = task.row_height().unwrap_or(config.default_row_height)
            + config.row_stroke_thickness;
        let row = rows.heights.push(height);
        rows.items.push(id);

        let item = ItemRef { id, row };
        if let Some(task_id) = &task.id {
            rows.items_map.entry(task_id.clone()).or_insert(item);
        }

        if config.mode.is_resources() {
            for (index, period) in task.periods.iter().enumerate() {
                let period_ref = PeriodRef {
                    item: id,
                    row,
                    period: index,
                };
                if let Some(period_id) = &period.id {
                    rows.periods_map
                        .entry(period_id.clone())
                        .or_insert(period_ref);
                }
                let from = ConnectorEnd::Period(period_ref);
                collect_connectors(&mut rows, from, &period.links, true);
            }
        } else {
            collect_connectors(&mut rows, ConnectorEnd::Item(item), &task.links, false);
        }
    }

    let forward = resolve_pending(&mut rows, config.mode.is_resources());
    tracing::debug!(
        rows = rows.items.len(),
        total_height = rows.heights.total(),
        connectors = rows.connectors.len(),
        forward,
        "visibility rebuilt"
    );
    rows
}

fn collect_connectors<Id: Copy>(
    rows: &mut VisibleRows<Id>,
    from: ConnectorEnd<Id>,
    fields: &ConnectorFields,
    to_periods: bool,
) {
    for link in fields.links() {
        let to = lookup(rows, link.connect_to, to_periods).map_or_else(
            || ConnectorTarget::Pending(link.connect_to.to_owned()),
            ConnectorTarget::Resolved,
        );
        rows.connectors.push(Connector {
            from,
            to,
            kind: link.kind.unwrap_or_default(),
            style: link.style.cloned(),
        });
    }
}

fn lookup<Id: Copy>(
    rows: &VisibleRows<Id>,
    target: &str,
    to_periods: bool,
) -> Option<ConnectorEnd<Id>> {
    if to_periods {
        rows.periods_map.get(target).copied().map(ConnectorEnd::Period)
    } else {
        rows.items_map.get(target).copied().map(ConnectorEnd::Item)
    }
}

// Resolves targets that were registered after their connector. Returns how many.
fn resolve_pending<Id: Copy>(rows: &mut VisibleRows<Id>, to_periods: bool) -> usize {
    let mut resolved = 0;
    for index in 0..rows.connectors.len() {
        let ConnectorTarget::Pending(target) = &rows.connectors[index].to else {
            continue;
        };
        if let Some(end) = lookup(rows, target, to_periods) {
            rows.connectors[index].to = ConnectorTarget::Resolved(end);
            resolved += 1;
        }
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linearize::linearize;
    use crate::model::tests::TestForest;
    use crate::task::{ConnectorFields, ConnectorStyle, Period, Task};

    fn build(forest: &TestForest, config: &ControllerConfig) -> VisibleRows<usize> {
        let metas = linearize(forest, config.mode, &FxHashMap::default()).metas;
        build_visibility(forest, &metas, config)
    }

    #[test]
    fn heights_include_stroke_and_fall_back_to_default() {
        let forest = TestForest::from_parents(vec![
            (None, Task::new("a").with_row_height(20.0)),
            (None, Task::new("b").with_row_height(30.0)),
            (None, Task::new("c").with_row_height(25.0)),
            (None, Task::new("d").with_row_height(-1.0)),
        ]);
        let rows = build(&forest, &ControllerConfig::default());
        assert_eq!(rows.heights.as_slice(), &[21.0, 52.0, 78.0, 99.0]);
        assert_eq!(rows.items, vec![0, 1, 2, 3]);
    }

    #[test]
    fn collapsed_subtrees_are_skipped() {
        let forest = TestForest::from_parents(vec![
            (None, Task::new("a").collapsed(true)),
            (Some(0), Task::new("a.1")),
            (Some(1), Task::new("a.1.1")),
            (None, Task::new("b")),
            (Some(3), Task::new("b.1").collapsed(true)),
            (Some(4), Task::new("b.1.1")),
        ]);
        let rows = build(&forest, &ControllerConfig::default());
        assert_eq!(rows.items, vec![0, 3, 4]);
    }

    #[test]
    fn first_duplicate_id_wins() {
        let forest = TestForest::from_parents(vec![
            (None, Task::new("first").with_id("x")),
            (None, Task::new("second").with_id("x")),
        ]);
        let rows = build(&forest, &ControllerConfig::default());
        assert_eq!(rows.items_map["x"], ItemRef { id: 0, row: 0 });
    }

    #[test]
    fn forward_references_are_resolved_after_the_pass() {
        let forest = TestForest::from_parents(vec![
            (None, Task::new("a").with_id("a").connect_to("b", None)),
            (
                None,
                Task::new("b")
                    .with_id("b")
                    .connect_to("a", Some(ConnectorKind::StartStart)),
            ),
            (None, Task::new("c").with_id("c").connect_to("ghost", None)),
        ]);
        let rows = build(&forest, &ControllerConfig::default());
        assert_eq!(rows.connectors.len(), 3);
        assert_eq!(
            rows.connectors[0].to,
            ConnectorTarget::Resolved(ConnectorEnd::Item(ItemRef { id: 1, row: 1 }))
        );
        assert_eq!(rows.connectors[1].kind, ConnectorKind::StartStart);
        assert_eq!(rows.connectors[1].to.resolved().map(ConnectorEnd::row), Some(0));
        assert_eq!(rows.connectors[2].to, ConnectorTarget::Pending("ghost".into()));
    }

    #[test]
    fn hidden_targets_stay_pending() {
        let forest = TestForest::from_parents(vec![
            (None, Task::new("a").with_id("a").connect_to("hidden", None)),
            (None, Task::new("group").collapsed(true)),
            (Some(1), Task::new("hidden").with_id("hidden")),
        ]);
        let rows = build(&forest, &ControllerConfig::default());
        assert_eq!(rows.connectors[0].to, ConnectorTarget::Pending("hidden".into()));
    }

    #[test]
    fn resource_mode_links_periods() {
        let forest = TestForest::from_parents(vec![
            (
                None,
                Task::new("alice")
                    .with_period(Period::new(0, 10).with_id("p1").connect_to("p2", None))
                    .with_period(Period::new(20, 30)),
            ),
            (
                None,
                Task::new("bob")
                    .connect_to("alice", None)
                    .with_period(Period::new(40, 50).with_id("p2")),
            ),
        ]);
        let rows = build(&forest, &ControllerConfig::resources());
        assert_eq!(rows.periods_map.len(), 2);
        assert_eq!(
            rows.periods_map["p2"],
            PeriodRef { item: 1, row: 1, period: 0 }
        );
        assert_eq!(rows.connectors.len(), 1);
        assert_eq!(
            rows.connectors[0].from,
            ConnectorEnd::Period(PeriodRef { item: 0, row: 0, period: 0 })
        );
        assert_eq!(rows.connectors[0].to.resolved().map(ConnectorEnd::row), Some(1));
    }

    #[test]
    fn first_duplicate_period_id_wins() {
        let forest = TestForest::from_parents(vec![
            (None, Task::new("alice").with_period(Period::new(0, 10).with_id("slot"))),
            (
                None,
                Task::new("bob")
                    .with_period(Period::new(20, 30))
                    .with_period(Period::new(40, 50).with_id("slot")),
            ),
        ]);
        let rows = build(&forest, &ControllerConfig::resources());
        assert_eq!(rows.periods_map.len(), 1);
        assert_eq!(
            rows.periods_map["slot"],
            PeriodRef { item: 0, row: 0, period: 0 }
        );
    }

    #[test]
    fn single_connector_fields_on_periods_keep_kind_and_style() {
        let style = ConnectorStyle {
            stroke: Some("red".into()),
            fill: None,
        };
        let legacy = Period {
            links: ConnectorFields {
                connect_to: Some("target".into()),
                connector_type: Some(ConnectorKind::FinishFinish),
                connector: Some(style.clone()),
                ..ConnectorFields::default()
            },
            ..Period::new(0, 10)
        };
        let forest = TestForest::from_parents(vec![
            (None, Task::new("alice").with_period(legacy)),
            (None, Task::new("bob").with_period(Period::new(20, 30).with_id("target"))),
        ]);
        let rows = build(&forest, &ControllerConfig::resources());
        assert_eq!(rows.connectors.len(), 1);
        let connector = &rows.connectors[0];
        assert_eq!(connector.kind, ConnectorKind::FinishFinish);
        assert_eq!(connector.style, Some(style));
        assert_eq!(
            connector.to,
            ConnectorTarget::Resolved(ConnectorEnd::Period(PeriodRef { item: 1, row: 1, period: 0 }))
        );
    }
}
