//! In-memory task tree implementing [`GanttModel`].

use std::fmt;

use rustc_hash::{FxBuildHasher, FxHashMap};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::TreeError;
use crate::model::{GanttModel, TreeChange};
use crate::task::{ConnectorFields, Task};

/// Handle of a node inside a [`GanttTree`].
///
/// Slots of removed nodes are reused; the generation keeps handles of removed nodes
/// from addressing the node that took their slot.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

impl NodeId {
    pub const fn index(self) -> usize {
        self.index
    }

    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index)?;
        if self.generation > 0 {
            write!(f, "v{}", self.generation)?;
        }
        Ok(())
    }
}

/// Nested form of a task and its subtree, used for bulk loading and serialization.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaskNode {
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub task: Task,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Vec::is_empty")
    )]
    pub children: Vec<TaskNode>,
}

impl TaskNode {
    pub const fn leaf(task: Task) -> Self {
        Self {
            task,
            children: Vec::new(),
        }
    }

    pub const fn new(task: Task, children: Vec<Self>) -> Self {
        Self { task, children }
    }
}

struct Slot {
    task: Task,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

struct Entry {
    generation: u32,
    slot: Option<Slot>,
}

// Returned for ids that are not in the tree.
static DETACHED_TASK: Task = Task {
    id: None,
    name: String::new(),
    row_height: None,
    collapsed: None,
    actual_start: None,
    actual_end: None,
    baseline_start: None,
    baseline_end: None,
    progress_value: None,
    periods: Vec::new(),
    markers: Vec::new(),
    links: ConnectorFields {
        connectors: None,
        connect_to: None,
        connector_type: None,
        connector: None,
    },
};

/// Arena-backed task forest with change tracking.
///
/// Mutations accumulate a pending [`TreeChange`] which the owner forwards to the
/// controller via [`GanttController::notify`](crate::GanttController::notify).
#[derive(Default)]
pub struct GanttTree {
    slots: Vec<Entry>,
    // Indices of vacant slots.
    free: Vec<usize>,
    roots: Vec<NodeId>,
    len: usize,
    // Occurrences of each task id, used to report duplicates.
    id_counts: FxHashMap<String, usize>,
    pending: Option<TreeChange>,
}

impl GanttTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            id_counts: FxHashMap::with_capacity_and_hasher(capacity, FxBuildHasher),
            ..Self::default()
        }
    }

    /// Builds a tree from its nested form.
    pub fn from_nodes(nodes: Vec<TaskNode>) -> Self {
        let mut tree = Self::new();
        for node in nodes {
            tree.insert_node(None, node);
        }
        tree
    }

    /// Converts the tree back into its nested form.
    pub fn to_nodes(&self) -> Vec<TaskNode> {
        self.roots.iter().map(|&id| self.node_at(id)).collect()
    }

    fn node_at(&self, id: NodeId) -> TaskNode {
        TaskNode {
            task: self.task(id).clone(),
            children: self
                .children(id)
                .iter()
                .map(|&child| self.node_at(child))
                .collect(),
        }
    }

    fn insert_node(&mut self, parent: Option<NodeId>, node: TaskNode) -> NodeId {
        let id = self.push_slot(parent, node.task);
        for child in node.children {
            self.insert_node(Some(id), child);
        }
        id
    }

    fn push_slot(&mut self, parent: Option<NodeId>, task: Task) -> NodeId {
        self.register_id(&task);
        let slot = Slot {
            task,
            parent,
            children: Vec::new(),
        };
        let id = match self.free.pop() {
            Some(index) => {
                let entry = &mut self.slots[index];
                entry.slot = Some(slot);
                NodeId {
                    index,
                    generation: entry.generation,
                }
            }
            None => {
                self.slots.push(Entry {
                    generation: 0,
                    slot: Some(slot),
                });
                NodeId {
                    index: self.slots.len() - 1,
                    generation: 0,
                }
            }
        };
        match parent.and_then(|parent| self.slot_mut(parent)) {
            Some(parent_slot) => parent_slot.children.push(id),
            None => self.roots.push(id),
        }
        self.len += 1;
        self.mark(TreeChange::Structure);
        id
    }

    /// Appends a top-level task.
    pub fn add_root(&mut self, task: Task) -> NodeId {
        self.push_slot(None, task)
    }

    /// Appends a task as the last child of `parent`.
    pub fn add_child(&mut self, parent: NodeId, task: Task) -> Result<NodeId, TreeError> {
        if !self.contains(parent) {
            return Err(TreeError::UnknownNode(parent));
        }
        Ok(self.push_slot(Some(parent), task))
    }

    /// Edits the source fields of a task.
    pub fn update<F>(&mut self, id: NodeId, edit: F) -> Result<(), TreeError>
    where
        F: FnOnce(&mut Task),
    {
        let slot = self.slot_mut(id).ok_or(TreeError::UnknownNode(id))?;
        let previous_id = slot.task.id.clone();
        edit(&mut slot.task);
        let current_id = slot.task.id.clone();
        if previous_id != current_id {
            if let Some(previous) = previous_id {
                self.unregister_id(&previous);
            }
            if let Some(current) = current_id {
                self.register_task_id(current);
            }
        }
        self.mark(TreeChange::Structure);
        Ok(())
    }

    /// Removes a task together with its subtree and returns the task.
    pub fn remove(&mut self, id: NodeId) -> Result<Task, TreeError> {
        let slot = self.vacate(id).ok_or(TreeError::UnknownNode(id))?;
        match slot.parent.and_then(|parent| self.slot_mut(parent)) {
            Some(parent_slot) => parent_slot.children.retain(|&child| child != id),
            None => self.roots.retain(|&root| root != id),
        }
        let mut stack = slot.children.clone();
        while let Some(child) = stack.pop() {
            if let Some(child_slot) = self.vacate(child) {
                stack.extend(child_slot.children.iter().copied());
                if let Some(task_id) = &child_slot.task.id {
                    self.unregister_id(task_id);
                }
                self.len -= 1;
            }
        }
        if let Some(task_id) = &slot.task.id {
            self.unregister_id(task_id);
        }
        self.len -= 1;
        self.mark(TreeChange::Structure);
        Ok(slot.task)
    }

    /// Returns the parent of a node (`None` for top-level or unknown nodes).
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).and_then(|slot| slot.parent)
    }

    /// Finds the first node (in document order) whose task id equals `task_id`.
    pub fn find(&self, task_id: &str) -> Option<NodeId> {
        crate::model::Traversal::new(self)
            .map(|(id, _)| id)
            .find(|&id| self.task(id).id.as_deref() == Some(task_id))
    }

    /// Takes the change accumulated since the previous call.
    pub fn take_changes(&mut self) -> Option<TreeChange> {
        self.pending.take()
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn slot(&self, id: NodeId) -> Option<&Slot> {
        self.slots
            .get(id.index)
            .filter(|entry| entry.generation == id.generation)
            .and_then(|entry| entry.slot.as_ref())
    }

    fn slot_mut(&mut self, id: NodeId) -> Option<&mut Slot> {
        self.slots
            .get_mut(id.index)
            .filter(|entry| entry.generation == id.generation)
            .and_then(|entry| entry.slot.as_mut())
    }

    // Empties the slot of `id` and puts it on the free list.
    fn vacate(&mut self, id: NodeId) -> Option<Slot> {
        let entry = self
            .slots
            .get_mut(id.index)
            .filter(|entry| entry.generation == id.generation)?;
        let slot = entry.slot.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(id.index);
        Some(slot)
    }

    fn mark(&mut self, change: TreeChange) {
        self.pending = Some(self.pending.map_or(change, |pending| pending.merge(change)));
    }

    fn register_id(&mut self, task: &Task) {
        if let Some(task_id) = &task.id {
            self.register_task_id(task_id.clone());
        }
    }

    fn register_task_id(&mut self, task_id: String) {
        let count = self.id_counts.entry(task_id).or_insert(0);
        *count += 1;
        if *count > 1 {
            tracing::warn!(count = *count, "duplicate task id in gantt tree");
        }
    }

    fn unregister_id(&mut self, task_id: &str) {
        if let Some(count) = self.id_counts.get_mut(task_id) {
            *count -= 1;
            if *count == 0 {
                self.id_counts.remove(task_id);
            }
        }
    }
}

impl GanttModel for GanttTree {
    type Id = NodeId;

    fn roots(&self) -> &[Self::Id] {
        &self.roots
    }

    fn children(&self, id: Self::Id) -> &[Self::Id] {
        self.slot(id).map_or(&[], |slot| slot.children.as_slice())
    }

    fn contains(&self, id: Self::Id) -> bool {
        self.slot(id).is_some()
    }

    fn task(&self, id: Self::Id) -> &Task {
        self.slot(id).map_or(&DETACHED_TASK, |slot| &slot.task)
    }

    fn size_hint(&self) -> usize {
        self.len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (GanttTree, NodeId, NodeId, NodeId) {
        let mut tree = GanttTree::new();
        let root = tree.add_root(Task::new("root").with_id("r"));
        let a = tree.add_child(root, Task::new("a").with_id("a")).unwrap();
        let b = tree.add_child(a, Task::new("b").with_id("b")).unwrap();
        (tree, root, a, b)
    }

    #[test]
    fn builds_structure_and_reports_changes() {
        let (mut tree, root, a, b) = sample();
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.roots(), &[root]);
        assert_eq!(tree.children(root), &[a]);
        assert_eq!(tree.parent(b), Some(a));
        assert_eq!(tree.take_changes(), Some(TreeChange::Structure));
        assert_eq!(tree.take_changes(), None);
    }

    #[test]
    fn add_child_rejects_unknown_parent() {
        let (mut tree, _, _, b) = sample();
        tree.remove(b).unwrap();
        assert_eq!(
            tree.add_child(b, Task::new("orphan")),
            Err(TreeError::UnknownNode(b))
        );
    }

    #[test]
    fn remove_drops_whole_subtree() {
        let (mut tree, root, a, b) = sample();
        let removed = tree.remove(a).unwrap();
        assert_eq!(removed.name, "a");
        assert_eq!(tree.len(), 1);
        assert!(tree.children(root).is_empty());
        assert!(!tree.contains(b));
        assert_eq!(tree.task(b).name, "");
        assert_eq!(tree.find("b"), None);
        assert_eq!(tree.remove(a), Err(TreeError::UnknownNode(a)));
    }

    #[test]
    fn removed_slots_are_reused_without_reviving_old_handles() {
        let (mut tree, root, a, b) = sample();
        tree.remove(a).unwrap();
        let c = tree.add_child(root, Task::new("c")).unwrap();
        let d = tree.add_root(Task::new("d"));
        let e = tree.add_root(Task::new("e"));
        assert_eq!(tree.slots.len(), 4);
        assert!([a.index(), b.index()].contains(&c.index()));
        assert_ne!(c, a);
        assert_ne!(c, b);
        assert!(!tree.contains(a));
        assert!(!tree.contains(b));
        assert_eq!(tree.task(c).name, "c");
        assert_eq!(tree.update(a, |task| task.name.clear()), Err(TreeError::UnknownNode(a)));
        assert_eq!(tree.task(c).name, "c");
        assert_eq!(tree.roots(), &[root, d, e]);
        assert_eq!(tree.len(), 4);

        for _ in 0..100 {
            let tmp = tree.add_root(Task::new("tmp"));
            tree.remove(tmp).unwrap();
        }
        assert_eq!(tree.slots.len(), 5);
    }

    #[test]
    fn update_edits_fields_and_tracks_ids() {
        let (mut tree, _, a, _) = sample();
        tree.take_changes();
        tree.update(a, |task| task.id = Some("renamed".into())).unwrap();
        assert_eq!(tree.find("renamed"), Some(a));
        assert_eq!(tree.find("a"), None);
        assert_eq!(tree.take_changes(), Some(TreeChange::Structure));
    }

    #[test]
    fn nested_form_round_trips() {
        let nodes = vec![
            TaskNode::new(
                Task::new("p"),
                vec![TaskNode::leaf(Task::new("c1")), TaskNode::leaf(Task::new("c2"))],
            ),
            TaskNode::leaf(Task::new("q")),
        ];
        let tree = GanttTree::from_nodes(nodes.clone());
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.to_nodes(), nodes);
    }
}
