use rustc_hash::FxHashMap;

use super::GraphError;
use crate::task::TaskId;

#[derive(Debug, Clone)]
struct Node {
    id: TaskId,
    /// Indices of direct dependencies.
    deps: Vec<usize>,
    /// Indices of direct dependents.
    dependents: Vec<usize>,
}

/// Validated acyclic task graph.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    nodes: Vec<Node>,
}

impl TaskGraph {
    /// Build a graph from `(task, depends_on)` pairs.
    ///
    /// Rejects duplicate tasks, dependencies on tasks not in the list, and
    /// cycles.
    pub fn new(edges: &[(TaskId, &[TaskId])]) -> Result<Self, GraphError> {
        let mut index: FxHashMap<TaskId, usize> = FxHashMap::default();
        for (i, (id, _)) in edges.iter().enumerate() {
            if index.insert(*id, i).is_some() {
                return Err(GraphError::Duplicate(*id));
            }
        }

        let mut nodes: Vec<Node> = edges
            .iter()
            .map(|(id, _)| Node {
                id: *id,
                deps: Vec::new(),
                dependents: Vec::new(),
            })
            .collect();

        for (i, (id, deps)) in edges.iter().enumerate() {
            for dep in *deps {
                let Some(&d) = index.get(dep) else {
                    return Err(GraphError::UnknownDependency {
                        task: *id,
                        dependency: *dep,
                    });
                };
                nodes[i].deps.push(d);
                nodes[d].dependents.push(i);
            }
        }

        let graph = Self { nodes };
        graph.check_acyclic()?;
        Ok(graph)
    }

    /// `clean` → `copy-fonts` → every transform.
    pub fn standard() -> Result<Self, GraphError> {
        let after_clean = [TaskId::Clean];
        let after_copy = [TaskId::CopyFonts];
        let mut edges: Vec<(TaskId, &[TaskId])> = Vec::with_capacity(TaskId::ALL.len());
        edges.push((TaskId::Clean, &[]));
        edges.push((TaskId::CopyFonts, &after_clean));
        edges.extend(TaskId::TRANSFORMS.iter().map(|t| (*t, &after_copy[..])));
        Self::new(&edges)
    }

    /// Kahn's algorithm; whatever is left with incoming edges is on a cycle.
    fn check_acyclic(&self) -> Result<(), GraphError> {
        let order = self.topo_indices();
        if order.len() == self.nodes.len() {
            return Ok(());
        }
        let mut cyclic: Vec<TaskId> = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(i, _)| !order.contains(i))
            .map(|(_, n)| n.id)
            .collect();
        cyclic.sort();
        Err(GraphError::Cycle(cyclic))
    }

    fn topo_indices(&self) -> Vec<usize> {
        let mut in_degree: Vec<usize> = self.nodes.iter().map(|n| n.deps.len()).collect();
        let mut ready: Vec<usize> = (0..self.nodes.len())
            .filter(|&i| in_degree[i] == 0)
            .rev()
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(i) = ready.pop() {
            order.push(i);
            for &d in self.nodes[i].dependents.iter().rev() {
                in_degree[d] -= 1;
                if in_degree[d] == 0 {
                    ready.push(d);
                }
            }
        }
        order
    }

    /// Tasks in a dependency-respecting order.
    pub fn topo_order(&self) -> Vec<TaskId> {
        self.topo_indices()
            .into_iter()
            .map(|i| self.nodes[i].id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(super) fn id(&self, i: usize) -> TaskId {
        self.nodes[i].id
    }

    pub(super) fn deps(&self, i: usize) -> &[usize] {
        &self.nodes[i].deps
    }

    pub(super) fn dependents(&self, i: usize) -> &[usize] {
        &self.nodes[i].dependents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_graph_order() {
        let graph = TaskGraph::standard().unwrap();
        assert_eq!(graph.len(), TaskId::ALL.len());

        let order = graph.topo_order();
        assert_eq!(order[0], TaskId::Clean);
        assert_eq!(order[1], TaskId::CopyFonts);
        assert_eq!(&order[2..], &TaskId::TRANSFORMS);
    }

    #[test]
    fn test_cycle_rejected() {
        let err = TaskGraph::new(&[
            (TaskId::Clean, &[]),
            (TaskId::CopyFonts, &[TaskId::BuildSprite]),
            (TaskId::BuildSprite, &[TaskId::CopyFonts]),
            (TaskId::MinifyHtml, &[TaskId::BuildSprite]),
        ])
        .unwrap_err();
        // Downstream of the cycle is unreachable too
        assert_eq!(
            err,
            GraphError::Cycle(vec![
                TaskId::CopyFonts,
                TaskId::MinifyHtml,
                TaskId::BuildSprite
            ])
        );
        assert_eq!(
            err.to_string(),
            "dependency cycle involving copy-fonts, minify-html, build-sprite"
        );
    }

    #[test]
    fn test_self_cycle_rejected() {
        let err = TaskGraph::new(&[(TaskId::Clean, &[TaskId::Clean])]).unwrap_err();
        assert_eq!(err, GraphError::Cycle(vec![TaskId::Clean]));
        assert_eq!(err.to_string(), "dependency cycle involving clean");
    }

    #[test]
    fn test_unknown_dependency() {
        let err = TaskGraph::new(&[(TaskId::CopyFonts, &[TaskId::Clean])]).unwrap_err();
        assert_eq!(
            err,
            GraphError::UnknownDependency {
                task: TaskId::CopyFonts,
                dependency: TaskId::Clean
            }
        );
    }

    #[test]
    fn test_duplicate_task() {
        let err = TaskGraph::new(&[(TaskId::Clean, &[]), (TaskId::Clean, &[])]).unwrap_err();
        assert_eq!(err, GraphError::Duplicate(TaskId::Clean));
    }
}
