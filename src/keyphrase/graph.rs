// Word co-occurrence graph and biased PageRank.
//
// Nodes are normalized words whose tag is in the allowed POS set. Two nodes
// are joined when they occur within a sliding window over the whole document
// (sentence boundaries do not break the window); the edge weight counts how
// often that happens. The graph is undirected.

use std::collections::HashMap;

use tracing::warn;

use super::tagger::PosTag;

pub const DAMPING: f64 = 0.85;
pub const TOLERANCE: f64 = 1e-4;
pub const MAX_ITERATIONS: usize = 100;

#[derive(Debug, Clone, Default)]
pub struct WordGraph {
    nodes: Vec<String>,
    index: HashMap<String, usize>,
    /// Adjacency: neighbour index -> co-occurrence weight, per node.
    edges: Vec<HashMap<usize, f64>>,
}

impl WordGraph {
    /// Build the graph from `(word, tag)` pairs in document order.
    ///
    /// A word at position `i` links to valid words at positions
    /// `i + 1 .. i + window`, so `window` counts the word itself.
    pub fn build<'a, I>(words: I, window: usize, pos: &[PosTag]) -> Self
    where
        I: IntoIterator<Item = (&'a str, PosTag)>,
    {
        let text: Vec<(&str, bool)> = words
            .into_iter()
            .map(|(word, tag)| (word, pos.contains(&tag)))
            .collect();

        let mut graph = WordGraph::default();
        for &(word, valid) in &text {
            if valid {
                graph.add_node(word);
            }
        }

        for (i, &(node1, valid1)) in text.iter().enumerate() {
            if !valid1 {
                continue;
            }
            let end = (i + window).min(text.len());
            for &(node2, valid2) in text.iter().take(end).skip(i + 1) {
                if valid2 && node1 != node2 {
                    graph.add_edge_weight(node1, node2, 1.0);
                }
            }
        }

        graph
    }

    fn add_node(&mut self, word: &str) -> usize {
        if let Some(&i) = self.index.get(word) {
            return i;
        }
        let i = self.nodes.len();
        self.nodes.push(word.to_string());
        self.index.insert(word.to_string(), i);
        self.edges.push(HashMap::new());
        i
    }

    fn add_edge_weight(&mut self, a: &str, b: &str, weight: f64) {
        let a = self.add_node(a);
        let b = self.add_node(b);
        *self.edges[a].entry(b).or_insert(0.0) += weight;
        *self.edges[b].entry(a).or_insert(0.0) += weight;
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(String::as_str)
    }

    pub fn edge_weight(&self, a: &str, b: &str) -> Option<f64> {
        let a = *self.index.get(a)?;
        let b = *self.index.get(b)?;
        self.edges[a].get(&b).copied()
    }

    /// Weighted PageRank with a personalization (teleport) vector.
    ///
    /// `personalization` maps node to a non-negative weight; missing nodes get
    /// zero and the vector is renormalized. When it sums to zero the walk
    /// teleports uniformly. Mass from nodes without edges is redistributed by
    /// the same vector. If the walk does not converge within MAX_ITERATIONS
    /// the last iterate is returned.
    pub fn pagerank(&self, personalization: &HashMap<String, f64>) -> HashMap<String, f64> {
        let n = self.nodes.len();
        if n == 0 {
            return HashMap::new();
        }

        let mut p: Vec<f64> = self
            .nodes
            .iter()
            .map(|w| personalization.get(w).copied().unwrap_or(0.0).max(0.0))
            .collect();
        let p_total: f64 = p.iter().sum();
        if p_total > 0.0 {
            p.iter_mut().for_each(|x| *x /= p_total);
        } else {
            p = vec![1.0 / n as f64; n];
        }

        let out_weight: Vec<f64> = self.edges.iter().map(|e| e.values().sum()).collect();
        let dangling: Vec<usize> = (0..n).filter(|&i| out_weight[i] == 0.0).collect();

        let mut x = vec![1.0 / n as f64; n];
        let mut converged = false;

        for _ in 0..MAX_ITERATIONS {
            let last = x;
            x = vec![0.0; n];

            let dangle_sum: f64 = DAMPING * dangling.iter().map(|&i| last[i]).sum::<f64>();
            for (i, neighbours) in self.edges.iter().enumerate() {
                if out_weight[i] == 0.0 {
                    continue;
                }
                for (&j, &w) in neighbours {
                    x[j] += DAMPING * last[i] * w / out_weight[i];
                }
            }
            for (xi, pi) in x.iter_mut().zip(&p) {
                *xi += (dangle_sum + 1.0 - DAMPING) * pi;
            }

            let err: f64 = x.iter().zip(&last).map(|(a, b)| (a - b).abs()).sum();
            if err < n as f64 * TOLERANCE {
                converged = true;
                break;
            }
        }

        if !converged {
            warn!(
                nodes = n,
                iterations = MAX_ITERATIONS,
                "PageRank did not converge, using last iterate"
            );
        }

        self.nodes.iter().cloned().zip(x).collect()
    }
}
