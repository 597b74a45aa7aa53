//! Per-sprint stack of active flow invocations.

use std::collections::HashSet;

use crate::types::{FlowUuid, NodeUuid};

#[derive(Debug, Clone)]
struct Frame {
    flow_uuid: FlowUuid,
    visited: HashSet<NodeUuid>,
}

/// One frame per active (sub)flow, tracking the nodes visited in it since
/// the sprint began. Never persisted; rebuilt at the start of each sprint.
#[derive(Debug, Clone, Default)]
pub struct FlowStack {
    frames: Vec<Frame>,
}

impl FlowStack {
    pub fn push(&mut self, flow_uuid: FlowUuid) {
        self.frames.push(Frame {
            flow_uuid,
            visited: HashSet::new(),
        });
    }

    pub fn pop(&mut self) -> Option<FlowUuid> {
        self.frames.pop().map(|f| f.flow_uuid)
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn current_flow(&self) -> Option<FlowUuid> {
        self.frames.last().map(|f| f.flow_uuid)
    }

    /// Mark a node visited in the top frame.
    pub fn visit(&mut self, node_uuid: NodeUuid) {
        if let Some(frame) = self.frames.last_mut() {
            frame.visited.insert(node_uuid);
        }
    }

    pub fn unvisit(&mut self, node_uuid: &NodeUuid) {
        if let Some(frame) = self.frames.last_mut() {
            frame.visited.remove(node_uuid);
        }
    }

    pub fn has_visited(&self, node_uuid: &NodeUuid) -> bool {
        self.frames
            .last()
            .is_some_and(|f| f.visited.contains(node_uuid))
    }

    /// Whether any frame for `flow_uuid` has visited a node this sprint.
    /// Entering such a flow again would loop without waiting for input.
    pub fn has_visited_flow_since_resume(&self, flow_uuid: &FlowUuid) -> bool {
        self.frames
            .iter()
            .any(|f| f.flow_uuid == *flow_uuid && !f.visited.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn flow(n: u128) -> FlowUuid {
        FlowUuid(Uuid::from_u128(n))
    }

    fn node(n: u128) -> NodeUuid {
        NodeUuid(Uuid::from_u128(n))
    }

    #[test]
    fn visits_are_scoped_to_the_top_frame() {
        let mut stack = FlowStack::default();
        stack.push(flow(1));
        stack.visit(node(10));
        stack.push(flow(2));
        assert!(!stack.has_visited(&node(10)));

        stack.visit(node(20));
        assert!(stack.has_visited(&node(20)));
        assert_eq!(stack.depth(), 2);

        assert_eq!(stack.pop(), Some(flow(2)));
        assert!(stack.has_visited(&node(10)));
        assert_eq!(stack.current_flow(), Some(flow(1)));
    }

    #[test]
    fn flow_counts_as_visited_only_with_visited_nodes() {
        let mut stack = FlowStack::default();
        stack.push(flow(1));
        assert!(!stack.has_visited_flow_since_resume(&flow(1)));

        stack.visit(node(10));
        assert!(stack.has_visited_flow_since_resume(&flow(1)));
        assert!(!stack.has_visited_flow_since_resume(&flow(2)));

        stack.unvisit(&node(10));
        assert!(!stack.has_visited_flow_since_resume(&flow(1)));
    }

    #[test]
    fn empty_stack_is_inert() {
        let mut stack = FlowStack::default();
        stack.visit(node(1));
        assert!(!stack.has_visited(&node(1)));
        assert_eq!(stack.pop(), None);
    }
}
