/*!
Embedding of coarse polygonal layouts onto fine triangle meshes.

A *layout* is a small polygon mesh whose vertices are pinned to vertices of a
much finer triangulated *target* surface. Embedding the layout means routing
every layout edge as a path over the target, such that no two paths cross or
touch away from their shared end points. The embedded layout partitions the
target surface into patches, one per layout face, and serves as the base
complex for quad meshing.

# Overview

+ [`PolyMesh`] is a halfedge based polygon mesh with `f64` vertex positions,
  with the circulators and the edge splits the embedding needs. It can be
  loaded from and written to OBJ files.

+ Paths are searched over [`VirtualVertex`]es, which are either vertices of
  the target mesh or the midpoints of its edges. Paths through edge midpoints
  are not restricted to the existing edges of the target mesh. Such edges are
  split when a path is embedded.

+ [`EmbeddingInput`] holds the layout, the target and the landmark matching
  between their vertices. It is shared by all copies of an [`Embedding`].
  A layout can also be generated from the target with
  [`make_layout_by_decimation`], and the landmarks can be jittered or
  randomized to make harder inputs.

+ [`Embedding`] keeps track of which target halfedges belong to which layout
  halfedges, answers the blocking queries, and finds the shortest legal path
  for a layout edge with an A* search.

+ [`embed_greedy`] embeds all layout edges one at a time, cheapest first,
  guided by [`GreedySettings`]. [`embed_greedy_brute_force`] tries every
  combination of the heuristics and keeps the shortest embedding.

```
use lembed::{Embedding, EmbeddingInput, GreedySettings, embed_greedy, primitive};
use glam::DVec3;

let target = primitive::grid(4, 4, 1.0).unwrap();
let layout = primitive::quad([
    DVec3::new(0.0, 0.0, 0.0),
    DVec3::new(4.0, 0.0, 0.0),
    DVec3::new(4.0, 4.0, 0.0),
    DVec3::new(0.0, 4.0, 0.0),
])
.unwrap();
let input = EmbeddingInput::with_proximity_matching(layout, target).unwrap();
let mut em = Embedding::new(input);
embed_greedy(&mut em, &GreedySettings::default()).unwrap();
assert!(em.is_complete());
assert!((em.total_embedded_path_length() - 16.0).abs() < 1e-12);
```
*/

mod check;
mod decimate;
mod edit;
mod element;
mod embedding;
mod error;
mod greedy;
mod input;
mod iterator;
mod macros;
mod mesh;
mod obj;
mod property;
mod topol;
mod union_find;
mod virtual_vertex;

pub mod primitive;

pub use decimate::make_layout_by_decimation;
pub use element::{EH, FH, HH, Handle, HasTopology, VH};
pub use embedding::{Embedding, ShortestPathMetric, VERTEX_REPULSION_FACTOR};
pub use error::Error;
pub use greedy::{
    GreedyResult, GreedySettings, InsertionOrder, embed_greedy, embed_greedy_brute_force,
    swirl_detection, swirl_detection_bidirectional,
};
pub use input::{EmbeddingInput, find_matching_vertices_by_proximity};
pub use mesh::PolyMesh;
pub use property::{EProperty, FProperty, HProperty, Property, VProperty};
pub use topol::Topology;
pub use union_find::UnionFind;
pub use virtual_vertex::{VirtualPath, VirtualVertex, VirtualVertexProperty};
