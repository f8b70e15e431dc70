//! Decomposition tree: an arena of owned nodes.
//!
//! The root holds the input polygon; every split adds children. Leaves are
//! the final parcels. Road carved out while splitting a node (lane or street
//! box) is stored on that node so that `leaf area + road area == root area`
//! can be checked after the fact. Flag driveways are recorded separately:
//! they stay inside the flag parcel that owns them.

use geo::{MultiPolygon, Polygon};

use crate::geometry::area;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// Interior node that was cut into its children.
    Split,
    /// Leaf produced by the splitter.
    Parcel,
    /// Leaf that gained road access through a driveway over a neighbor.
    FlagParcel,
    /// Leaf with no road access and no viable driveway.
    Isolated,
}

#[derive(Clone, Debug)]
pub struct Node {
    pub polygon: Polygon<f64>,
    pub level: u32,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub kind: NodeKind,
    /// Road carved out of `polygon` while splitting it.
    pub road: Option<MultiPolygon<f64>>,
    /// Flag driveways created while splitting; they stay inside their flag parcels.
    pub driveways: Vec<MultiPolygon<f64>>,
}

#[derive(Clone, Debug)]
pub struct DecompositionTree {
    nodes: Vec<Node>,
}

impl DecompositionTree {
    pub fn new(root: Polygon<f64>, level: u32) -> Self {
        Self {
            nodes: vec![Node {
                polygon: root,
                level,
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Parcel,
                road: None,
                driveways: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append a child leaf under `parent` and mark `parent` as split.
    pub fn push_child(&mut self, parent: NodeId, polygon: Polygon<f64>, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        let level = self.nodes[parent.0].level + 1;
        self.nodes.push(Node {
            polygon,
            level,
            parent: Some(parent),
            children: Vec::new(),
            kind,
            road: None,
            driveways: Vec::new(),
        });
        let p = &mut self.nodes[parent.0];
        p.children.push(id);
        p.kind = NodeKind::Split;
        id
    }

    /// Attach road geometry to `id`; repeated calls accumulate.
    pub fn add_road(&mut self, id: NodeId, road: MultiPolygon<f64>) {
        if road.0.is_empty() {
            return;
        }
        let slot = &mut self.nodes[id.0].road;
        match slot {
            Some(existing) => existing.0.extend(road.0),
            None => *slot = Some(road),
        }
    }

    pub fn add_driveway(&mut self, id: NodeId, driveway: MultiPolygon<f64>) {
        self.nodes[id.0].driveways.push(driveway);
    }

    /// Leaves in depth-first, left-to-right order.
    pub fn leaves(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            let n = self.node(id);
            if n.children.is_empty() {
                out.push(id);
            } else {
                stack.extend(n.children.iter().rev().copied());
            }
        }
        out
    }

    pub fn leaf_polygons(&self) -> Vec<Polygon<f64>> {
        self.leaves()
            .into_iter()
            .map(|id| self.node(id).polygon.clone())
            .collect()
    }

    /// Distance from the root.
    pub fn depth(&self, id: NodeId) -> u32 {
        self.node(id).level - self.node(self.root()).level
    }

    pub fn max_depth(&self) -> u32 {
        self.leaves()
            .into_iter()
            .map(|id| self.depth(id))
            .max()
            .unwrap_or(0)
    }

    /// Median leaf depth (lower median for an even count).
    pub fn median_leaf_depth(&self) -> u32 {
        let mut d: Vec<u32> = self.leaves().into_iter().map(|id| self.depth(id)).collect();
        d.sort_unstable();
        match d.len() {
            0 => 0,
            n => d[(n - 1) / 2],
        }
    }

    /// All road geometry registered anywhere in the tree.
    pub fn road_polygons(&self) -> Vec<Polygon<f64>> {
        self.nodes
            .iter()
            .filter_map(|n| n.road.as_ref())
            .flat_map(|mp| mp.0.iter().cloned())
            .collect()
    }

    pub fn driveways(&self) -> Vec<MultiPolygon<f64>> {
        self.nodes.iter().flat_map(|n| n.driveways.iter().cloned()).collect()
    }

    /// Leaves of the given kind.
    pub fn leaves_of(&self, kind: NodeKind) -> Vec<NodeId> {
        self.leaves()
            .into_iter()
            .filter(|id| self.node(*id).kind == kind)
            .collect()
    }

    pub fn leaf_area(&self) -> f64 {
        self.leaves()
            .into_iter()
            .map(|id| area(&MultiPolygon(vec![self.node(id).polygon.clone()])))
            .sum()
    }

    pub fn road_area(&self) -> f64 {
        area(&MultiPolygon(self.road_polygons()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn sq(x: f64) -> Polygon<f64> {
        polygon![(x: x, y: 0.0), (x: x + 1.0, y: 0.0), (x: x + 1.0, y: 1.0), (x: x, y: 1.0)]
    }

    #[test]
    fn leaves_are_left_to_right() {
        let mut t = DecompositionTree::new(sq(0.0), 0);
        let a = t.push_child(t.root(), sq(1.0), NodeKind::Parcel);
        let b = t.push_child(t.root(), sq(2.0), NodeKind::Parcel);
        let a1 = t.push_child(a, sq(3.0), NodeKind::Parcel);
        let a2 = t.push_child(a, sq(4.0), NodeKind::FlagParcel);
        assert_eq!(t.leaves(), vec![a1, a2, b]);
        assert_eq!(t.node(t.root()).kind, NodeKind::Split);
        assert_eq!(t.node(a).kind, NodeKind::Split);
        assert_eq!(t.depth(a2), 2);
        assert_eq!(t.max_depth(), 2);
        assert_eq!(t.median_leaf_depth(), 2);
    }

    #[test]
    fn single_node_tree_is_its_own_leaf() {
        let t = DecompositionTree::new(sq(0.0), 3);
        assert_eq!(t.leaves(), vec![t.root()]);
        assert_eq!(t.depth(t.root()), 0);
        assert!((t.leaf_area() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn roads_accumulate() {
        let mut t = DecompositionTree::new(sq(0.0), 0);
        t.add_road(t.root(), MultiPolygon(vec![sq(5.0)]));
        t.add_road(t.root(), MultiPolygon(vec![sq(7.0)]));
        assert_eq!(t.road_polygons().len(), 2);
        assert!((t.road_area() - 2.0).abs() < 1e-12);
    }
}
