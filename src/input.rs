use std::{
    ffi::OsString,
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};

use crate::{
    decimate::make_layout_by_decimation,
    element::{Handle, VH},
    error::Error,
    mesh::PolyMesh,
    property::VProperty,
};

/// A layout mesh, a target mesh and the landmark matching between them: every
/// layout vertex is pinned to a distinct target vertex.
#[derive(Clone)]
pub struct EmbeddingInput {
    layout: PolyMesh,
    target: PolyMesh,
    l_matching_vertex: VProperty<VH>,
}

impl EmbeddingInput {
    /// `matching[i]` is the target vertex of the `i`-th layout vertex.
    pub fn new(layout: PolyMesh, target: PolyMesh, matching: Vec<VH>) -> Result<Self, Error> {
        if matching.len() != layout.num_vertices() {
            return Err(Error::InvalidMatching(format!(
                "{} landmarks for {} layout vertices",
                matching.len(),
                layout.num_vertices()
            )));
        }
        let mut taken = vec![false; target.num_vertices()];
        for (i, t_v) in matching.iter().enumerate() {
            if !t_v.is_valid(&target) {
                return Err(Error::InvalidMatching(format!(
                    "layout vertex {} is matched to {}, which is not in the target mesh",
                    i, t_v
                )));
            }
            if std::mem::replace(&mut taken[t_v.index() as usize], true) {
                return Err(Error::InvalidMatching(format!(
                    "{} is matched to more than one layout vertex",
                    t_v
                )));
            }
        }
        let mut l_matching_vertex = VProperty::new(layout.num_vertices(), VH::from(0u32));
        l_matching_vertex.copy_from_slice(&matching);
        Ok(EmbeddingInput {
            layout,
            target,
            l_matching_vertex,
        })
    }

    /// Match every layout vertex to the closest target vertex that is not
    /// already taken, in the order of the layout vertices.
    pub fn with_proximity_matching(layout: PolyMesh, target: PolyMesh) -> Result<Self, Error> {
        let matching = find_matching_vertices_by_proximity(&layout, &target)?;
        Self::new(layout, target, matching)
    }

    /// Generate a layout with `n_vertices` vertices by decimating `target`, and
    /// pin every layout vertex to the target vertex it was left at.
    pub fn from_decimation(target: PolyMesh, n_vertices: usize) -> Result<Self, Error> {
        let layout = make_layout_by_decimation(&target, n_vertices)?;
        log::info!(
            "Generated layout with {} vertices and {} faces",
            layout.num_vertices(),
            layout.num_faces()
        );
        Self::with_proximity_matching(layout, target)
    }

    /// Load the layout and the target from OBJ files, and match them by
    /// proximity.
    pub fn load(layout_obj: &Path, target_obj: &Path) -> Result<Self, Error> {
        let layout = PolyMesh::load_obj(layout_obj)?;
        let target = PolyMesh::load_obj(target_obj)?;
        log::info!(
            "Loaded layout with {} vertices and target with {} vertices",
            layout.num_vertices(),
            target.num_vertices()
        );
        Self::with_proximity_matching(layout, target)
    }

    pub fn layout(&self) -> &PolyMesh {
        &self.layout
    }

    pub fn target(&self) -> &PolyMesh {
        &self.target
    }

    pub fn matching_target_vertex(&self, l_v: VH) -> VH {
        self.l_matching_vertex[l_v]
    }

    pub fn matching_vertices(&self) -> &VProperty<VH> {
        &self.l_matching_vertex
    }

    /// Random walk of the landmarks over the target mesh. In each of the
    /// `steps`, every landmark moves to a random neighbour, unless that
    /// neighbour is the landmark of another layout vertex.
    pub fn jitter_matching_vertices(&mut self, steps: usize, seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut occupied = VProperty::new(self.target.num_vertices(), false);
        for l_v in self.layout.vertices() {
            occupied[self.l_matching_vertex[l_v]] = true;
        }
        let mut neighbours = Vec::new();
        for _ in 0..steps {
            for l_v in self.layout.vertices() {
                let t_v = self.l_matching_vertex[l_v];
                neighbours.clear();
                neighbours.extend(self.target.vv_ccw_iter(t_v));
                if neighbours.is_empty() {
                    continue;
                }
                let t_v_new = neighbours[rng.random_range(0..neighbours.len())];
                if !occupied[t_v_new] {
                    occupied[t_v] = false;
                    occupied[t_v_new] = true;
                    self.l_matching_vertex[l_v] = t_v_new;
                }
            }
        }
    }

    /// Pin the layout vertices to distinct target vertices, chosen at random.
    pub fn randomize_matching_vertices(&mut self, seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut t_vertices: Vec<VH> = self.target.vertices().collect();
        t_vertices.shuffle(&mut rng);
        for (l_v, t_v) in self.layout.vertices().zip(t_vertices) {
            self.l_matching_vertex[l_v] = t_v;
        }
    }

    /// Write `<base>_layout.obj`, `<base>_target_input.obj` and `<base>.inp`.
    /// The descriptor refers to the meshes relative to its own directory, and
    /// to their vertices by their index in those files.
    pub fn save(&self, base: &Path) -> Result<(), Error> {
        check_parent_dir(base)?;
        let name = base_name(base);
        let layout_file = format!("{}_layout.obj", name);
        let target_file = format!("{}_target_input.obj", name);
        self.layout.write_obj(&suffixed(base, "_layout.obj"))?;
        self.target.write_obj(&suffixed(base, "_target_input.obj"))?;
        let inp_path = suffixed(base, ".inp");
        let mut out = BufWriter::new(File::create(&inp_path)?);
        writeln!(out, "# {}", base.display())?;
        writeln!(out)?;
        writeln!(out, "lf {}", layout_file)?;
        writeln!(out, "tf {}", target_file)?;
        writeln!(out)?;
        // Indices as they are numbered in the written OBJ files.
        let l_index = self.layout.obj_vertex_indices();
        let t_index = self.target.obj_vertex_indices();
        for l_v in self.layout.obj_vertex_order() {
            writeln!(
                out,
                "lv {} {}",
                l_index[l_v],
                t_index[self.l_matching_vertex[l_v]]
            )?;
        }
        out.flush()?;
        log::info!("Saved embedding input to {}", inp_path.display());
        Ok(())
    }

    /// Read an input descriptor written by [`EmbeddingInput::save`].
    pub fn load_inp(path: &Path) -> Result<Self, Error> {
        let invalid = |line: usize, message: String| Error::InvalidInputFile {
            path: path.to_path_buf(),
            line,
            message,
        };
        let dir = path.parent().unwrap_or(Path::new(""));
        let reader = BufReader::new(File::open(path)?);
        let mut layout_file: Option<PathBuf> = None;
        let mut target_file: Option<PathBuf> = None;
        let mut pairs: Vec<(usize, u32, u32)> = Vec::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let lnum = i + 1;
            let mut tokens = line.split_whitespace();
            match tokens.next() {
                None => continue,
                Some(t) if t.starts_with('#') => continue,
                Some("lf") => {
                    let file = tokens
                        .next()
                        .ok_or_else(|| invalid(lnum, "missing layout file name".into()))?;
                    layout_file = Some(dir.join(file));
                }
                Some("tf") => {
                    let file = tokens
                        .next()
                        .ok_or_else(|| invalid(lnum, "missing target file name".into()))?;
                    target_file = Some(dir.join(file));
                }
                Some("lv") => {
                    let mut index = || -> Result<u32, Error> {
                        tokens
                            .next()
                            .ok_or_else(|| invalid(lnum, "expecting two vertex indices".into()))?
                            .parse::<u32>()
                            .map_err(|e| invalid(lnum, format!("{}", e)))
                    };
                    let l_v = index()?;
                    let t_v = index()?;
                    pairs.push((lnum, l_v, t_v));
                }
                Some(other) => {
                    return Err(invalid(lnum, format!("unknown record '{}'", other)));
                }
            }
        }
        let layout_file = layout_file.ok_or_else(|| invalid(0, "no layout file".into()))?;
        let target_file = target_file.ok_or_else(|| invalid(0, "no target file".into()))?;
        let layout = PolyMesh::load_obj(&layout_file)?;
        let target = PolyMesh::load_obj(&target_file)?;
        let mut matching: Vec<Option<VH>> = vec![None; layout.num_vertices()];
        for (lnum, l_v, t_v) in pairs {
            let slot = matching
                .get_mut(l_v as usize)
                .ok_or_else(|| invalid(lnum, format!("no layout vertex {}", l_v)))?;
            if slot.replace(t_v.into()).is_some() {
                return Err(invalid(lnum, format!("layout vertex {} matched twice", l_v)));
            }
        }
        let matching = matching
            .into_iter()
            .enumerate()
            .map(|(i, t_v)| t_v.ok_or_else(|| invalid(0, format!("layout vertex {} has no landmark", i))))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(layout, target, matching)
    }
}

/// For every layout vertex, the closest target vertex that isn't matched to an
/// earlier layout vertex.
pub fn find_matching_vertices_by_proximity(
    layout: &PolyMesh,
    target: &PolyMesh,
) -> Result<Vec<VH>, Error> {
    let mut taken = vec![false; target.num_vertices()];
    let mut matching = Vec::with_capacity(layout.num_vertices());
    for l_v in layout.vertices() {
        let p = layout.point(l_v);
        let best = target
            .vertices()
            .filter(|t_v| !taken[t_v.index() as usize])
            .map(|t_v| (t_v, target.point(t_v).distance_squared(p)))
            .fold(None, |best: Option<(VH, f64)>, (t_v, d)| match best {
                Some((_, bd)) if bd <= d => best,
                _ => Some((t_v, d)),
            });
        let (t_v, _) = best.ok_or_else(|| {
            Error::InvalidMatching(format!(
                "no unmatched target vertex left for layout vertex {}",
                l_v
            ))
        })?;
        taken[t_v.index() as usize] = true;
        matching.push(t_v);
    }
    Ok(matching)
}

/// `base` with `suffix` appended to its file name.
pub(crate) fn suffixed(base: &Path, suffix: &str) -> PathBuf {
    let mut s: OsString = base.as_os_str().to_owned();
    s.push(suffix);
    PathBuf::from(s)
}

pub(crate) fn base_name(base: &Path) -> String {
    base.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Files can only be written next to `base` if its directory exists.
pub(crate) fn check_parent_dir(base: &Path) -> Result<(), Error> {
    match base.parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.is_dir() => {
            Err(Error::MissingDirectory(dir.to_path_buf()))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
pub(crate) mod test {
    use std::path::PathBuf;

    use glam::DVec3;

    use crate::{
        element::{Handle, VH},
        error::Error,
        primitive,
    };

    use super::EmbeddingInput;

    pub(crate) fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("lembed-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).expect("Cannot create temporary directory");
        dir
    }

    /// 4 x 4 grid with unit cells, and a quad layout on its corners.
    pub(crate) fn grid_quad_input() -> EmbeddingInput {
        let target = primitive::grid(4, 4, 1.0).expect("Cannot create grid");
        let layout = primitive::quad([
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(4.0, 0.0, 0.0),
            DVec3::new(4.0, 4.0, 0.0),
            DVec3::new(0.0, 4.0, 0.0),
        ])
        .expect("Cannot create quad");
        EmbeddingInput::with_proximity_matching(layout, target).expect("Cannot match landmarks")
    }

    #[test]
    fn t_proximity_matching() {
        let input = grid_quad_input();
        let corners: Vec<VH> = input
            .layout()
            .vertices()
            .map(|l_v| input.matching_target_vertex(l_v))
            .collect();
        assert_eq!(corners, [0u32, 4, 24, 20].map(VH::from));
    }

    #[test]
    fn t_proximity_matching_skips_taken() {
        let target = primitive::grid(1, 1, 1.0).expect("Cannot create grid");
        // Both layout vertices are closest to target vertex 0.
        let layout = primitive::triangle([
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(0.1, 0.0, 0.0),
            DVec3::new(0.0, 0.9, 0.0),
        ])
        .expect("Cannot create triangle");
        let input = EmbeddingInput::with_proximity_matching(layout, target)
            .expect("Cannot match landmarks");
        assert_eq!(input.matching_target_vertex(0u32.into()), 0u32.into());
        assert_eq!(input.matching_target_vertex(1u32.into()), 1u32.into());
        assert_eq!(input.matching_target_vertex(2u32.into()), 2u32.into());
    }

    #[test]
    fn t_invalid_matching() {
        let target = primitive::grid(1, 1, 1.0).expect("Cannot create grid");
        let layout = primitive::triangle([DVec3::ZERO, DVec3::X, DVec3::Y])
            .expect("Cannot create triangle");
        for matching in [
            vec![0u32, 1],
            vec![0u32, 1, 1],
            vec![0u32, 1, 9],
        ] {
            let matching = matching.into_iter().map(VH::from).collect();
            assert!(matches!(
                EmbeddingInput::new(layout.clone(), target.clone(), matching),
                Err(Error::InvalidMatching(_))
            ));
        }
    }

    #[test]
    fn t_inp_round_trip() {
        let dir = temp_dir("inp");
        let base = dir.join("quad");
        let input = grid_quad_input();
        input.save(&base).expect("Cannot save input");
        let loaded = EmbeddingInput::load_inp(&dir.join("quad.inp")).expect("Cannot load input");
        assert_eq!(loaded.layout().num_vertices(), 4);
        assert_eq!(loaded.target().num_vertices(), 25);
        // The target is renumbered in file order, the landmarks stay put.
        let t_order = input.target().obj_vertex_order();
        for l_v in input.layout().vertices() {
            let t_v = loaded.matching_target_vertex(l_v);
            assert_eq!(t_order[t_v.index() as usize], input.matching_target_vertex(l_v));
            assert_eq!(
                loaded.target().point(t_v),
                input.target().point(input.matching_target_vertex(l_v))
            );
        }
        std::fs::remove_dir_all(&dir).ok();
    }

    fn landmarks(input: &EmbeddingInput) -> Vec<VH> {
        input
            .layout()
            .vertices()
            .map(|l_v| input.matching_target_vertex(l_v))
            .collect()
    }

    /// Rebuilding the input validates the matching.
    fn revalidate(input: &EmbeddingInput) {
        EmbeddingInput::new(
            input.layout().clone(),
            input.target().clone(),
            landmarks(input),
        )
        .expect("Invalid landmarks");
    }

    #[test]
    fn t_jitter_single_step() {
        let before = grid_quad_input();
        let mut after = before.clone();
        after.jitter_matching_vertices(1, 42);
        revalidate(&after);
        for (old, new) in landmarks(&before).into_iter().zip(landmarks(&after)) {
            assert!(old == new || before.target().find_halfedge(old, new).is_some());
        }
    }

    #[test]
    fn t_jitter_is_seeded() {
        let mut a = grid_quad_input();
        let mut b = grid_quad_input();
        a.jitter_matching_vertices(20, 3);
        b.jitter_matching_vertices(20, 3);
        revalidate(&a);
        assert_eq!(landmarks(&a), landmarks(&b));
    }

    #[test]
    fn t_jitter_crowded() {
        // Every target vertex is a landmark, so none of them can move.
        let target = primitive::grid(1, 1, 1.0).expect("Cannot create grid");
        let layout = primitive::quad([DVec3::ZERO, DVec3::X, DVec3::ONE, DVec3::Y])
            .expect("Cannot create quad");
        let mut input =
            EmbeddingInput::with_proximity_matching(layout, target).expect("Cannot match");
        let before = landmarks(&input);
        input.jitter_matching_vertices(10, 0);
        assert_eq!(landmarks(&input), before);
    }

    #[test]
    fn t_randomize_matching() {
        let mut a = grid_quad_input();
        let mut b = grid_quad_input();
        a.randomize_matching_vertices(11);
        b.randomize_matching_vertices(11);
        revalidate(&a);
        assert_eq!(landmarks(&a), landmarks(&b));
    }

    #[test]
    fn t_from_decimation() {
        let target = primitive::grid(4, 4, 1.0).expect("Cannot create grid");
        let input = EmbeddingInput::from_decimation(target, 16).expect("Cannot generate input");
        assert_eq!(input.layout().num_vertices(), 16);
        for l_v in input.layout().vertices() {
            assert_eq!(
                input.layout().point(l_v),
                input.target().point(input.matching_target_vertex(l_v))
            );
        }
    }

    #[test]
    fn t_save_into_missing_directory() {
        let base = temp_dir("missing").join("not-here").join("quad");
        assert!(matches!(
            grid_quad_input().save(&base),
            Err(Error::MissingDirectory(_))
        ));
    }
}
