/*!
Heuristic detection of paths that would make a layout face wind around
itself.

The vertices directly left and right of a candidate path are marked. Then the
surface is flooded from the landmarks of the layout face on the left of the
path. If the flood first reaches the path from its right side, the face would
have to spiral around the path to reach it, and the path is likely to cause
a swirl.
*/

use std::{cmp::Ordering, collections::BinaryHeap};

use crate::{
    element::{EH, HH, VH},
    embedding::Embedding,
    mesh::PolyMesh,
    property::VProperty,
    virtual_vertex::{virtual_ring_cw, VirtualVertex},
};

const LEFT: i8 = -1;
const RIGHT: i8 = 1;

struct Candidate {
    distance: f64,
    v: VH,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.distance == other.distance
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .partial_cmp(&self.distance)
            .unwrap_or(Ordering::Equal)
    }
}

/// The halfedge of `e` whose face the path enters after crossing `e`, on its
/// way to `next`.
fn crossing_halfedge(mesh: &PolyMesh, e: EH, next: VirtualVertex) -> HH {
    let (h0, h1) = e.halfedges();
    [h0, h1]
        .into_iter()
        .filter(|h| h.face(mesh).is_some())
        .find(|h| match next {
            VirtualVertex::Vertex(v) => h.next(mesh).head(mesh) == v,
            VirtualVertex::Edge(e_next) => {
                let (n0, n1) = e_next.halfedges();
                let f = h.face(mesh);
                f == n0.face(mesh) || f == n1.face(mesh)
            }
        })
        .unwrap_or_else(|| panic!("Path leaves {} through a face it doesn't touch", e))
}

/// Mark the vertices on either side of `path`.
fn mark_sides(mesh: &PolyMesh, path: &[VirtualVertex]) -> VProperty<i8> {
    let mut indicator = VProperty::new(mesh.num_vertices(), 0i8);
    let n = path.len();
    for i in 1..n.saturating_sub(1) {
        let (prev, next) = (path[i - 1], path[i + 1]);
        match path[i] {
            VirtualVertex::Vertex(v) => {
                let ring = virtual_ring_cw(mesh, v);
                let position = |vv: VirtualVertex| -> usize {
                    ring.iter()
                        .position(|r| *r == vv)
                        .unwrap_or_else(|| panic!("{:?} is not adjacent to {}", vv, v))
                };
                let (i_prev, i_next) = (position(prev), position(next));
                let len = ring.len();
                // Clockwise from the incoming port to the outgoing port is the
                // left side, and from there back to the incoming port is the
                // right side. The ports themselves lie on the path.
                let mut j = (i_prev + 1) % len;
                while j != i_next {
                    if let VirtualVertex::Vertex(w) = ring[j] {
                        indicator[w] = LEFT;
                    }
                    j = (j + 1) % len;
                }
                j = (i_next + 1) % len;
                while j != i_prev {
                    if let VirtualVertex::Vertex(w) = ring[j] {
                        indicator[w] = RIGHT;
                    }
                    j = (j + 1) % len;
                }
            }
            VirtualVertex::Edge(e) => {
                let h = crossing_halfedge(mesh, e, next);
                indicator[h.tail(mesh)] = LEFT;
                indicator[h.head(mesh)] = RIGHT;
            }
        }
    }
    indicator
}

/// Check if embedding `l_he` along `path` is likely to create a swirl. The
/// search starts from the landmarks of the layout face on the left of `l_he`,
/// other than the end points of `l_he`.
pub fn swirl_detection(em: &Embedding, l_he: HH, path: &[VirtualVertex]) -> bool {
    assert!(
        path.first().is_some_and(|vv| vv.is_real_vertex())
            && path.last().is_some_and(|vv| vv.is_real_vertex()),
        "Path must start and end at real vertices"
    );
    let layout = em.layout_mesh();
    let mesh = em.target_mesh();
    let Some(l_f) = l_he.face(layout) else {
        return false;
    };
    let indicator = mark_sides(mesh, path);
    let (l_from, l_to) = (l_he.tail(layout), l_he.head(layout));
    let mut distance = VProperty::new(mesh.num_vertices(), f64::INFINITY);
    let mut queue = BinaryHeap::new();
    for l_v in layout.fv_ccw_iter(l_f) {
        if l_v == l_from || l_v == l_to {
            continue;
        }
        let t_v = em.matching_target_vertex(l_v);
        distance[t_v] = 0.0;
        queue.push(Candidate {
            distance: 0.0,
            v: t_v,
        });
    }
    while let Some(Candidate { distance: d, v }) = queue.pop() {
        if d > distance[v] {
            continue;
        }
        match indicator[v] {
            LEFT => return false,
            RIGHT => return true,
            _ => {}
        }
        for h in mesh.voh_ccw_iter(v) {
            let w = h.head(mesh);
            let dw = d + mesh.calc_halfedge_length(h);
            if dw < distance[w] {
                distance[w] = dw;
                queue.push(Candidate { distance: dw, v: w });
            }
        }
    }
    false
}

/// Swirl test on both sides of the path.
pub fn swirl_detection_bidirectional(em: &Embedding, l_he: HH, path: &[VirtualVertex]) -> bool {
    if swirl_detection(em, l_he, path) {
        return true;
    }
    let reversed: Vec<VirtualVertex> = path.iter().rev().copied().collect();
    swirl_detection(em, l_he.opposite(), &reversed)
}
