// src/dag/plan.rs

//! Eager materialization of the reachable task graph.
//!
//! The scheduler itself discovers the graph lazily while executing. For
//! dry-run output and early diagnostics we want the whole picture up front:
//! every reachable key, its dependencies, its target, and whether it is
//! already complete, in a dependency-first order.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::errors::{EngineError, Result};
use crate::task::{Task, TaskKey};

/// One node of a materialized plan.
#[derive(Debug, Clone)]
pub struct PlanNode {
    pub key: TaskKey,
    pub deps: Vec<TaskKey>,
    pub locator: PathBuf,
    /// Whether the target already existed when the plan was built.
    pub complete: bool,
}

/// The reachable graph in topological (dependency-first) order.
#[derive(Debug)]
pub struct TaskPlan {
    nodes: Vec<PlanNode>,
}

impl TaskPlan {
    /// Walk the graphs rooted at `roots`, interning nodes by key.
    ///
    /// Fails with [`EngineError::Cycle`] if the reachable graph is not
    /// acyclic, naming one task on the cycle.
    pub fn build(roots: &[Arc<dyn Task>]) -> Result<TaskPlan> {
        let mut index_of: HashMap<TaskKey, usize> = HashMap::new();
        let mut nodes: Vec<PlanNode> = Vec::new();
        let mut stack: Vec<Arc<dyn Task>> = roots.to_vec();

        while let Some(task) = stack.pop() {
            let key = task.key();
            if index_of.contains_key(&key) {
                continue;
            }

            let deps = task.dependencies();
            let dep_keys: Vec<TaskKey> = deps.iter().map(|d| d.key()).collect();
            let target = task.target();

            index_of.insert(key.clone(), nodes.len());
            nodes.push(PlanNode {
                key,
                deps: dep_keys,
                locator: target.locator().to_path_buf(),
                complete: target.exists(),
            });

            stack.extend(deps);
        }

        // Edge direction: dependency -> dependent, so a topological sort
        // yields dependencies first.
        let mut graph: DiGraphMap<usize, ()> = DiGraphMap::new();
        for idx in 0..nodes.len() {
            graph.add_node(idx);
        }
        for (idx, node) in nodes.iter().enumerate() {
            for dep in &node.deps {
                // Dependencies were pushed onto the stack above, so every
                // dep key is interned by now.
                if let Some(&dep_idx) = index_of.get(dep) {
                    graph.add_edge(dep_idx, idx, ());
                }
            }
        }

        let order = match toposort(&graph, None) {
            Ok(order) => order,
            Err(cycle) => {
                let key = &nodes[cycle.node_id()].key;
                return Err(EngineError::Cycle {
                    chain: format!("cycle involving task '{key}'"),
                });
            }
        };

        let mut ordered = Vec::with_capacity(nodes.len());
        let mut taken: Vec<Option<PlanNode>> = nodes.into_iter().map(Some).collect();
        for idx in order {
            if let Some(node) = taken[idx].take() {
                ordered.push(node);
            }
        }

        Ok(TaskPlan { nodes: ordered })
    }

    /// Nodes in dependency-first order.
    pub fn iter(&self) -> impl Iterator<Item = &PlanNode> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
