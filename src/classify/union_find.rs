/// Disjoint-set forest over `0..n` with path compression and union by size.
#[derive(Clone, Debug)]
pub struct DisjointSet {
    parent: Vec<usize>,
    size: Vec<usize>,
    components: usize,
}

impl DisjointSet {
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
            components: n,
        }
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Number of disjoint groups currently in the forest.
    pub fn component_count(&self) -> usize {
        self.components
    }

    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut cur = x;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }

    /// Join the groups of `a` and `b`. Returns `false` when they already shared one.
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return false;
        }

        let (big, small) = if self.size[ra] < self.size[rb] {
            (rb, ra)
        } else {
            (ra, rb)
        };
        self.parent[small] = big;
        self.size[big] += self.size[small];
        self.components -= 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_as_singletons() {
        let mut ds = DisjointSet::new(3);
        assert_eq!(ds.component_count(), 3);
        assert_eq!((ds.find(0), ds.find(1), ds.find(2)), (0, 1, 2));
    }

    #[test]
    fn union_reduces_count_only_across_groups() {
        let mut ds = DisjointSet::new(4);
        assert!(ds.union(0, 1));
        assert!(ds.union(2, 3));
        assert_eq!(ds.component_count(), 2);
        assert!(!ds.union(1, 0));
        assert_eq!(ds.component_count(), 2);
        assert!(ds.union(1, 3));
        assert_eq!(ds.component_count(), 1);
        let root = ds.find(0);
        assert!((0..4).all(|i| ds.find(i) == root));
    }

    #[test]
    fn path_compression_points_at_root() {
        let mut ds = DisjointSet::new(5);
        for i in 0..4 {
            ds.union(i, i + 1);
        }
        let root = ds.find(4);
        for i in 0..5 {
            ds.find(i);
            assert_eq!(ds.parent[i], root);
        }
    }

    #[test]
    fn empty_forest() {
        let ds = DisjointSet::new(0);
        assert!(ds.is_empty());
        assert_eq!(ds.component_count(), 0);
    }
}
