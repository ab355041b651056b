//! Louvain modularity optimisation
//!
//! Deterministic variant: nodes are visited in index order, candidate
//! communities in ascending index order, and a node only moves on a strictly
//! positive improvement. Communities are renumbered by first appearance before
//! each aggregation.

use std::collections::BTreeMap;

const EPSILON: f64 = 1e-12;
const MAX_LEVELS: usize = 32;
const MAX_PASSES: usize = 100;

/// Weighted undirected graph at one aggregation level
struct Level {
    adjacency: Vec<BTreeMap<usize, f64>>,
    self_loops: Vec<f64>,
}

impl Level {
    fn new(n: usize, edges: &[(usize, usize, f64)]) -> Self {
        let mut level = Self {
            adjacency: vec![BTreeMap::new(); n],
            self_loops: vec![0.0; n],
        };
        for &(a, b, w) in edges {
            if a >= n || b >= n || w <= 0.0 {
                continue;
            }
            level.add(a, b, w);
        }
        level
    }

    fn add(&mut self, a: usize, b: usize, w: f64) {
        if a == b {
            self.self_loops[a] += w;
        } else {
            *self.adjacency[a].entry(b).or_insert(0.0) += w;
            *self.adjacency[b].entry(a).or_insert(0.0) += w;
        }
    }

    fn len(&self) -> usize {
        self.self_loops.len()
    }

    /// Weighted degree, self-loops counted twice
    fn degree(&self, node: usize) -> f64 {
        self.adjacency[node].values().sum::<f64>() + 2.0 * self.self_loops[node]
    }

    /// One round of local moving; returns the community of each node and
    /// whether anything moved
    fn local_moving(&self, resolution: f64) -> (Vec<usize>, bool) {
        let n = self.len();
        let degrees: Vec<f64> = (0..n).map(|i| self.degree(i)).collect();
        let total: f64 = degrees.iter().sum();

        let mut community: Vec<usize> = (0..n).collect();
        if total <= 0.0 {
            return (community, false);
        }

        let mut tot = degrees.clone();
        let mut moved_any = false;

        for _ in 0..MAX_PASSES {
            let mut moved = false;

            for node in 0..n {
                let k = degrees[node];
                if k <= 0.0 {
                    continue;
                }
                let current = community[node];

                let mut links: BTreeMap<usize, f64> = BTreeMap::new();
                for (&neighbor, &w) in &self.adjacency[node] {
                    *links.entry(community[neighbor]).or_insert(0.0) += w;
                }

                tot[current] -= k;
                let gain = |c: usize, links_to_c: f64| links_to_c - resolution * tot[c] * k / total;

                let mut best = current;
                let mut best_gain = gain(current, links.get(&current).copied().unwrap_or(0.0));
                for (&candidate, &links_to_c) in &links {
                    if candidate == current {
                        continue;
                    }
                    let g = gain(candidate, links_to_c);
                    if g > best_gain + EPSILON {
                        best = candidate;
                        best_gain = g;
                    }
                }

                tot[best] += k;
                if best != current {
                    community[node] = best;
                    moved = true;
                    moved_any = true;
                }
            }

            if !moved {
                break;
            }
        }

        (community, moved_any)
    }

    /// Collapse communities into single nodes
    fn aggregate(&self, community: &[usize], count: usize) -> Self {
        let mut next = Self {
            adjacency: vec![BTreeMap::new(); count],
            self_loops: vec![0.0; count],
        };
        for node in 0..self.len() {
            let c = community[node];
            next.self_loops[c] += self.self_loops[node];
            for (&neighbor, &w) in &self.adjacency[node] {
                if neighbor > node {
                    next.add(c, community[neighbor], w);
                }
            }
        }
        next
    }
}

/// Renumber community labels by first appearance; returns the count
fn renumber(community: &mut [usize]) -> usize {
    let mut mapping: BTreeMap<usize, usize> = BTreeMap::new();
    let mut order = Vec::new();
    for c in community.iter() {
        if !mapping.contains_key(c) {
            mapping.insert(*c, order.len());
            order.push(*c);
        }
    }
    for c in community.iter_mut() {
        *c = mapping[&*c];
    }
    order.len()
}

/// Partition `n` nodes into communities
///
/// `edges` are `(a, b, weight)` with indices below `n`. Returns communities as
/// ascending node index lists, ordered by their smallest member. Every node
/// appears in exactly one community; isolated nodes are singletons.
pub(crate) fn communities(n: usize, edges: &[(usize, usize, f64)], resolution: f64) -> Vec<Vec<usize>> {
    let mut membership: Vec<usize> = (0..n).collect();
    let mut level = Level::new(n, edges);

    for _ in 0..MAX_LEVELS {
        let (mut community, moved) = level.local_moving(resolution);
        if !moved {
            break;
        }
        let count = renumber(&mut community);
        for m in membership.iter_mut() {
            *m = community[*m];
        }
        level = level.aggregate(&community, count);
    }

    let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (node, &c) in membership.iter().enumerate() {
        groups.entry(c).or_default().push(node);
    }
    let mut result: Vec<Vec<usize>> = groups.into_values().collect();
    result.sort_by_key(|members| members[0]);
    result
}

/// Newman modularity of a partition
#[cfg(test)]
fn modularity(n: usize, edges: &[(usize, usize, f64)], parts: &[Vec<usize>]) -> f64 {
    let level = Level::new(n, edges);
    let total: f64 = (0..n).map(|i| level.degree(i)).sum();
    let mut owner = vec![0; n];
    for (c, members) in parts.iter().enumerate() {
        for &m in members {
            owner[m] = c;
        }
    }
    let mut q = 0.0;
    for (c, members) in parts.iter().enumerate() {
        let tot: f64 = members.iter().map(|&m| level.degree(m)).sum();
        let mut inner = 0.0;
        for &m in members {
            for (&nb, &w) in &level.adjacency[m] {
                if owner[nb] == c {
                    inner += w;
                }
            }
        }
        q += inner / total - (tot / total).powi(2);
    }
    q
}
