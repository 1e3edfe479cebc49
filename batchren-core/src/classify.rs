use crate::graph::CollisionGraph;
use serde::{Deserialize, Serialize};

/// A maximal group of renames that depend on each other's names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "requests", rename_all = "snake_case")]
pub enum Component {
    /// Request indices from head to tail. The tail's target is free in the batch.
    Chain(Vec<usize>),
    /// Request indices in edge order, starting at the lowest index.
    Cycle(Vec<usize>),
}

impl Component {
    pub fn requests(&self) -> &[usize] {
        match self {
            Self::Chain(requests) | Self::Cycle(requests) => requests,
        }
    }

    pub fn len(&self) -> usize {
        self.requests().len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests().is_empty()
    }

    pub fn is_cycle(&self) -> bool {
        matches!(self, Self::Cycle(_))
    }

    fn first_request(&self) -> usize {
        self.requests().iter().copied().min().unwrap_or(usize::MAX)
    }
}

/// Split the collision graph into independent chains and cycles.
///
/// Out-degree and in-degree are both at most one, so every request-bearing
/// node belongs to exactly one component: walking backwards from a node either
/// reaches a head (chain) or comes back around (cycle).
pub fn classify(graph: &CollisionGraph) -> Vec<Component> {
    let nodes = graph.nodes();
    let mut visited = vec![false; nodes.len()];
    let mut components = Vec::new();

    // Chains start at a node with an outgoing edge and nothing renamed onto it
    for (id, node) in nodes.iter().enumerate() {
        if node.next.is_none() || node.prev.is_some() {
            continue;
        }

        let mut requests = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            visited[current] = true;
            let node = graph.node(current);
            match node.request {
                Some(request) => requests.push(request),
                None => break,
            }
            cursor = node.next;
        }
        components.push(Component::Chain(requests));
    }

    // Whatever still carries an unvisited request sits on a cycle
    for (id, node) in nodes.iter().enumerate() {
        if visited[id] || node.request.is_none() {
            continue;
        }

        let mut members = Vec::new();
        let mut current = id;
        loop {
            visited[current] = true;
            let node = graph.node(current);
            if let Some(request) = node.request {
                members.push(request);
            }
            match node.next {
                Some(next) if next != id => current = next,
                _ => break,
            }
        }

        if let Some(start) = members
            .iter()
            .enumerate()
            .min_by_key(|(_, request)| **request)
            .map(|(pos, _)| pos)
        {
            members.rotate_left(start);
        }
        components.push(Component::Cycle(members));
    }

    components.sort_by_key(Component::first_request);
    components
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RenameRequest;
    use crate::validate::validate_batch;

    fn components(pairs: &[(&str, &str)]) -> Vec<Component> {
        let requests: Vec<_> = pairs
            .iter()
            .map(|(from, to)| RenameRequest::for_path(*from, *to).unwrap())
            .collect();
        let validated = validate_batch(&requests).unwrap();
        classify(&CollisionGraph::build(&requests, &validated))
    }

    #[test]
    fn test_swap_is_cycle_of_two() {
        let got = components(&[("/d/file_1", "file_2"), ("/d/file_2", "file_1")]);
        assert_eq!(got, vec![Component::Cycle(vec![0, 1])]);
    }

    #[test]
    fn test_rotation_is_one_cycle() {
        let pairs: Vec<(String, String)> = (1..=9)
            .map(|i| (format!("/d/file_{i}"), format!("file_{}", i % 9 + 1)))
            .collect();
        let borrowed: Vec<(&str, &str)> = pairs
            .iter()
            .map(|(a, b)| (a.as_str(), b.as_str()))
            .collect();
        let got = components(&borrowed);
        assert_eq!(got.len(), 1);
        assert!(got[0].is_cycle());
        assert_eq!(got[0].requests(), &[0, 1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_cycle_members_start_at_lowest_index() {
        // Inserted out of edge order: c->a, a->b, b->c
        let got = components(&[("/d/c", "a"), ("/d/a", "b"), ("/d/b", "c")]);
        assert_eq!(got, vec![Component::Cycle(vec![0, 1, 2])]);
    }

    #[test]
    fn test_chain_head_to_tail() {
        let got = components(&[("/d/b", "c"), ("/d/a", "b"), ("/d/c", "d")]);
        assert_eq!(got, vec![Component::Chain(vec![1, 0, 2])]);
    }

    #[test]
    fn test_independent_components() {
        let got = components(&[
            ("/d/file_2.jpeg", "file_2.jpg"),
            ("/d/x", "y"),
            ("/d/y", "x"),
            ("/d/file_8.jpeg", "file_8.jpg"),
        ]);
        assert_eq!(
            got,
            vec![
                Component::Chain(vec![0]),
                Component::Cycle(vec![1, 2]),
                Component::Chain(vec![3]),
            ]
        );
    }
}
