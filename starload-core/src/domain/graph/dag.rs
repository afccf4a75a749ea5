// starload-core/src/domain/graph/dag.rs

use crate::domain::error::ConfigurationError;
use std::collections::{HashMap, VecDeque};

/// Validated dependency structure of a pipeline run.
///
/// Nodes are addressed by index (declaration order). The graph is acyclic and
/// has exactly one start node (no upstream) and one end node (no downstream).
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    ids: Vec<String>,
    upstream: Vec<Vec<usize>>,
    downstream: Vec<Vec<usize>>,
    layers: Vec<Vec<usize>>,
}

impl DependencyGraph {
    pub fn build(ids: Vec<String>, edges: &[(String, String)]) -> Result<Self, ConfigurationError> {
        // 1. Index the declared nodes
        let mut index: HashMap<&str, usize> = HashMap::new();
        for (i, id) in ids.iter().enumerate() {
            if index.insert(id.as_str(), i).is_some() {
                return Err(ConfigurationError::DuplicateTask(id.clone()));
            }
        }
        if ids.is_empty() {
            return Err(ConfigurationError::Definition(
                "pipeline declares no tasks".into(),
            ));
        }

        // 2. Edges (from -> to means `to` waits on `from`)
        let mut upstream = vec![Vec::new(); ids.len()];
        let mut downstream = vec![Vec::new(); ids.len()];
        for (from, to) in edges {
            let f = *index
                .get(from.as_str())
                .ok_or_else(|| ConfigurationError::UnknownTask(from.clone()))?;
            let t = *index
                .get(to.as_str())
                .ok_or_else(|| ConfigurationError::UnknownTask(to.clone()))?;
            if !downstream[f].contains(&t) {
                downstream[f].push(t);
                upstream[t].push(f);
            }
        }

        // 3. Layered topological sort
        let layers = Self::layered_sort(&ids, &upstream, &downstream)?;

        let graph = Self {
            ids,
            upstream,
            downstream,
            layers,
        };

        // 4. Single start / single end sentinel.
        // In a DAG this also makes every node reachable from the start and
        // able to reach the end.
        let starts = graph.filter_ids(|i| graph.upstream[i].is_empty());
        if starts.len() != 1 {
            return Err(ConfigurationError::Sentinel {
                end: "start",
                found: starts.join(", "),
            });
        }
        let ends = graph.filter_ids(|i| graph.downstream[i].is_empty());
        if ends.len() != 1 {
            return Err(ConfigurationError::Sentinel {
                end: "end",
                found: ends.join(", "),
            });
        }

        Ok(graph)
    }

    /// Kahn's algorithm, one layer per wave of zero in-degree nodes.
    /// Layer N depends only on layers 0..N-1.
    fn layered_sort(
        ids: &[String],
        upstream: &[Vec<usize>],
        downstream: &[Vec<usize>],
    ) -> Result<Vec<Vec<usize>>, ConfigurationError> {
        let mut in_degree: Vec<usize> = upstream.iter().map(Vec::len).collect();
        let mut queue: VecDeque<usize> = (0..ids.len()).filter(|&i| in_degree[i] == 0).collect();

        let mut layers = Vec::new();
        let mut resolved = 0;

        while !queue.is_empty() {
            let layer_size = queue.len();
            let mut current_layer = Vec::with_capacity(layer_size);

            for _ in 0..layer_size {
                if let Some(current) = queue.pop_front() {
                    current_layer.push(current);
                    resolved += 1;
                    for &next in &downstream[current] {
                        in_degree[next] -= 1;
                        if in_degree[next] == 0 {
                            queue.push_back(next);
                        }
                    }
                }
            }
            layers.push(current_layer);
        }

        if resolved != ids.len() {
            let stuck: Vec<&str> = (0..ids.len())
                .filter(|&i| in_degree[i] > 0)
                .map(|i| ids[i].as_str())
                .collect();
            return Err(ConfigurationError::CircularDependency(format!(
                "resolved {}/{} tasks, stuck on [{}]",
                resolved,
                ids.len(),
                stuck.join(", ")
            )));
        }

        Ok(layers)
    }

    fn filter_ids(&self, keep: impl Fn(usize) -> bool) -> Vec<String> {
        (0..self.ids.len())
            .filter(|&i| keep(i))
            .map(|i| self.ids[i].clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn id(&self, node: usize) -> &str {
        &self.ids[node]
    }

    pub fn upstream(&self, node: usize) -> &[usize] {
        &self.upstream[node]
    }

    pub fn downstream(&self, node: usize) -> &[usize] {
        &self.downstream[node]
    }

    pub fn layers(&self) -> &[Vec<usize>] {
        &self.layers
    }

    /// Execution layers by task id.
    pub fn layer_ids(&self) -> Vec<Vec<String>> {
        self.layers
            .iter()
            .map(|layer| layer.iter().map(|&i| self.ids[i].clone()).collect())
            .collect()
    }

    pub fn edges(&self) -> Vec<(&str, &str)> {
        let mut out = Vec::new();
        for (from, targets) in self.downstream.iter().enumerate() {
            for &to in targets {
                out.push((self.ids[from].as_str(), self.ids[to].as_str()));
            }
        }
        out
    }

    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("graph LR");
        for (from, to) in self.edges() {
            out.push_str(&format!("\n    {} --> {}", from, to));
        }
        out
    }
}
