//! Union-Find data structure for grouping near-duplicate paragraphs.
//!
//! Disjoint-set with path compression and union-by-rank.

use std::collections::BTreeMap;

/// Union-Find (Disjoint Set Union) over `0..n`.
pub struct UnionFind {
    /// Parent pointers. parent[i] = j means i's parent is j.
    parent: Vec<usize>,
    /// Rank (approximate tree depth) for union-by-rank.
    rank: Vec<usize>,
}

impl UnionFind {
    /// Create a new Union-Find structure with n singleton sets.
    #[must_use]
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    /// Find the root (representative) of the set containing x.
    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }

        // Path compression
        let mut node = x;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }

        root
    }

    /// Union the sets containing x and y.
    ///
    /// Returns true if x and y were in different sets (and are now merged).
    pub fn union(&mut self, x: usize, y: usize) -> bool {
        let rx = self.find(x);
        let ry = self.find(y);

        if rx == ry {
            return false;
        }

        match self.rank[rx].cmp(&self.rank[ry]) {
            std::cmp::Ordering::Less => self.parent[rx] = ry,
            std::cmp::Ordering::Greater => self.parent[ry] = rx,
            std::cmp::Ordering::Equal => {
                self.parent[ry] = rx;
                self.rank[rx] += 1;
            }
        }

        true
    }

    /// Check if x and y are in the same set.
    pub fn connected(&mut self, x: usize, y: usize) -> bool {
        self.find(x) == self.find(y)
    }

    /// Sets with more than one member.
    ///
    /// Members are ascending and clusters are ordered by their lowest
    /// member, so `cluster[0]` is always the lowest index.
    #[must_use]
    pub fn duplicate_clusters(&mut self) -> Vec<Vec<usize>> {
        let mut by_root: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for i in 0..self.parent.len() {
            let root = self.find(i);
            by_root.entry(root).or_default().push(i);
        }

        let mut clusters: Vec<Vec<usize>> = by_root
            .into_values()
            .filter(|members| members.len() > 1)
            .collect();
        clusters.sort_unstable_by_key(|members| members[0]);
        clusters
    }

    /// Get the total number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    /// Check if the structure is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }
}
