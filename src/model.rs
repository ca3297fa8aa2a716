use std::hash::Hash;

use crate::task::Task;

/// Read-only tree contract consumed by the controller.
///
/// A proper forest is expected (not a DAG):
/// - no cycles (DFS traversal is used directly);
/// - each node has at most one parent;
/// - identifiers are stable between runs (collapse state is keyed by id).
pub trait GanttModel {
    /// Node identifier type.
    type Id: Copy + Eq + Hash;

    /// Returns the top-level nodes in document order.
    fn roots(&self) -> &[Self::Id];
    /// Returns the node's children in a deterministic order.
    fn children(&self, id: Self::Id) -> &[Self::Id];
    /// Returns `true` if the node exists in the model.
    fn contains(&self, id: Self::Id) -> bool;
    /// Returns the source fields of the node.
    fn task(&self, id: Self::Id) -> &Task;
    /// Returns an approximate size hint (not required to be exact).
    fn size_hint(&self) -> usize {
        0
    }

    #[inline]
    fn has_children(&self, id: Self::Id) -> bool {
        !self.children(id).is_empty()
    }
}

/// Kind of change reported by the data layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TreeChange {
    /// Only per-node metadata (e.g. collapse state) changed.
    Meta,
    /// Nodes were added, removed, reordered or their fields edited.
    Structure,
}

impl TreeChange {
    /// Combines two changes; a structural change wins.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        self.max(other)
    }
}

type Always<T> = fn(&T, <T as GanttModel>::Id) -> bool;

const fn always<T: GanttModel>(_: &T, _: T::Id) -> bool {
    true
}

/// Depth-first pre-order walk over a [`GanttModel`] yielding `(id, depth)`.
///
/// `descend_if` decides whether the children of a node are visited, `yield_if` whether
/// the node itself is produced. A node that is not yielded can still be descended into.
pub struct Traversal<'a, T, D = Always<T>, Y = Always<T>>
where
    T: GanttModel,
{
    model: &'a T,
    stack: Vec<(T::Id, usize)>,
    descend: D,
    yield_node: Y,
}

impl<'a, T: GanttModel> Traversal<'a, T> {
    /// Creates a full traversal over every node of the model.
    pub fn new(model: &'a T) -> Self {
        let roots = model.roots();
        let mut stack = Vec::with_capacity(model.size_hint().max(roots.len()));
        stack.extend(roots.iter().rev().map(|&id| (id, 0)));
        Self {
            model,
            stack,
            descend: always::<T>,
            yield_node: always::<T>,
        }
    }
}

impl<'a, T, D, Y> Traversal<'a, T, D, Y>
where
    T: GanttModel,
    D: FnMut(&T, T::Id) -> bool,
    Y: FnMut(&T, T::Id) -> bool,
{
    /// Replaces the "should descend into children" predicate.
    pub fn descend_if<D2>(self, descend: D2) -> Traversal<'a, T, D2, Y>
    where
        D2: FnMut(&T, T::Id) -> bool,
    {
        Traversal {
            model: self.model,
            stack: self.stack,
            descend,
            yield_node: self.yield_node,
        }
    }

    /// Replaces the "should yield this node" predicate.
    pub fn yield_if<Y2>(self, yield_node: Y2) -> Traversal<'a, T, D, Y2>
    where
        Y2: FnMut(&T, T::Id) -> bool,
    {
        Traversal {
            model: self.model,
            stack: self.stack,
            descend: self.descend,
            yield_node,
        }
    }
}

impl<T, D, Y> Iterator for Traversal<'_, T, D, Y>
where
    T: GanttModel,
    D: FnMut(&T, T::Id) -> bool,
    Y: FnMut(&T, T::Id) -> bool,
{
    type Item = (T::Id, usize);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((id, depth)) = self.stack.pop() {
            if (self.descend)(self.model, id) {
                let children = self.model.children(id);
                self.stack
                    .extend(children.iter().rev().map(|&child| (child, depth + 1)));
            }
            if (self.yield_node)(self.model, id) {
                return Some((id, depth));
            }
        }
        None
    }
}
