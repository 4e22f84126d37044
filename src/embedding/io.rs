use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    element::{Handle, HH, VH},
    error::Error,
    input::{base_name, check_parent_dir, suffixed, EmbeddingInput},
    mesh::PolyMesh,
    property::{HProperty, VProperty},
};

use super::Embedding;

/// Record of one embedded layout halfedge, as read from a file.
struct EmbeddedRecord {
    line: usize,
    from: u32,
    to: u32,
    chain: Vec<u32>,
}

/// Landmarks of the layout vertices in the numbering of the saved target. Every
/// layout vertex needs exactly one, at the position of its landmark in the
/// input.
fn read_landmarks(
    input: &EmbeddingInput,
    t_mesh: &PolyMesh,
    records: &[(usize, u32, u32)],
    invalid: &impl Fn(usize, String) -> Error,
) -> Result<VProperty<VH>, Error> {
    let layout = input.layout();
    let mut matching: VProperty<Option<VH>> = VProperty::new(layout.num_vertices(), None);
    let mut taken = VProperty::new(t_mesh.num_vertices(), false);
    for &(line, l_v, t_v) in records {
        if l_v as usize >= layout.num_vertices() {
            return Err(invalid(line, format!("no layout vertex {}", l_v)));
        }
        if t_v as usize >= t_mesh.num_vertices() {
            return Err(invalid(line, format!("no target vertex {}", t_v)));
        }
        let (l_v, t_v) = (VH::from(l_v), VH::from(t_v));
        if t_mesh.point(t_v) != input.target().point(input.matching_target_vertex(l_v)) {
            return Err(invalid(
                line,
                format!("landmark of layout vertex {} moved", l_v.index()),
            ));
        }
        if std::mem::replace(&mut taken[t_v], true) {
            return Err(invalid(line, format!("target vertex {} is taken", t_v.index())));
        }
        if matching[l_v].replace(t_v).is_some() {
            return Err(invalid(
                line,
                format!("layout vertex {} matched twice", l_v.index()),
            ));
        }
    }
    let mut out = VProperty::new(layout.num_vertices(), VH::from(0u32));
    for l_v in layout.vertices() {
        out[l_v] = matching[l_v].ok_or_else(|| {
            invalid(0, format!("layout vertex {} has no landmark", l_v.index()))
        })?;
    }
    Ok(out)
}

impl Embedding {
    /// Write the embedding next to `base`:
    ///
    /// - `<base>_target.obj`: the target mesh, including the vertices inserted
    ///   by embedded paths.
    /// - `<base>.inp` with its meshes, see [`EmbeddingInput::save`].
    /// - `<base>.lem`: the files above, the landmark of every layout vertex and
    ///   the target vertex sequence of every embedded layout halfedge.
    ///
    /// Vertices are referred to by their index in the written OBJ files, see
    /// [`PolyMesh::obj_vertex_order`].
    pub fn save(&self, base: &Path) -> Result<(), Error> {
        check_parent_dir(base)?;
        let name = base_name(base);
        self.t_mesh.write_obj(&suffixed(base, "_target.obj"))?;
        self.input.save(base)?;
        let layout = self.layout_mesh();
        let l_index = layout.obj_vertex_indices();
        let t_index = self.t_mesh.obj_vertex_indices();
        let lem_path = suffixed(base, ".lem");
        let mut out = BufWriter::new(File::create(&lem_path)?);
        writeln!(out, "# {}", base.display())?;
        writeln!(out)?;
        writeln!(out, "inp {}.inp", name)?;
        writeln!(out, "tf {}_target.obj", name)?;
        writeln!(out)?;
        for l_v in layout.obj_vertex_order() {
            writeln!(
                out,
                "lv {} {}",
                l_index[l_v],
                t_index[self.l_matching_vertex[l_v]]
            )?;
        }
        writeln!(out)?;
        for l_he in layout.halfedges() {
            if !self.is_embedded(l_he) {
                continue;
            }
            write!(
                out,
                "ee {} {} :",
                l_index[l_he.tail(layout)],
                l_index[l_he.head(layout)]
            )?;
            for t_v in self.get_embedded_path(l_he) {
                write!(out, " {}", t_index[t_v])?;
            }
            writeln!(out)?;
        }
        out.flush()?;
        log::info!(
            "Saved embedding with {} of {} layout edges to {}",
            self.num_embedded_edges(),
            layout.num_edges(),
            lem_path.display()
        );
        Ok(())
    }

    /// Read an embedding written by [`Embedding::save`]. File names inside the
    /// descriptors are relative to the directory of `<base>.lem`.
    pub fn load(base: &Path) -> Result<Self, Error> {
        let lem_path = suffixed(base, ".lem");
        let invalid = |line: usize, message: String| Error::InvalidEmbeddingFile {
            path: lem_path.clone(),
            line,
            message,
        };
        let dir = lem_path.parent().unwrap_or(Path::new(""));
        let reader = BufReader::new(File::open(&lem_path)?);
        let mut inp_file: Option<PathBuf> = None;
        let mut target_file: Option<PathBuf> = None;
        let mut landmarks: Vec<(usize, u32, u32)> = Vec::new();
        let mut records: Vec<EmbeddedRecord> = Vec::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let lnum = i + 1;
            let mut tokens = line.split_whitespace();
            match tokens.next() {
                None => continue,
                Some(t) if t.starts_with('#') => continue,
                Some("inp") => {
                    let file = tokens
                        .next()
                        .ok_or_else(|| invalid(lnum, "missing input file name".into()))?;
                    inp_file = Some(dir.join(file));
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
                    landmarks.push((lnum, l_v, t_v));
                }
                Some("ee") => {
                    let parse = |token: Option<&str>| -> Result<u32, Error> {
                        token
                            .ok_or_else(|| invalid(lnum, "expecting a vertex index".into()))?
                            .parse::<u32>()
                            .map_err(|e| invalid(lnum, format!("{}", e)))
                    };
                    let from = parse(tokens.next())?;
                    let to = parse(tokens.next())?;
                    if tokens.next() != Some(":") {
                        return Err(invalid(lnum, "expecting ':' after the layout halfedge".into()));
                    }
                    let chain = tokens
                        .map(|t| parse(Some(t)))
                        .collect::<Result<Vec<_>, _>>()?;
                    if chain.len() < 2 {
                        return Err(invalid(lnum, "a path needs at least two vertices".into()));
                    }
                    records.push(EmbeddedRecord {
                        line: lnum,
                        from,
                        to,
                        chain,
                    });
                }
                Some(other) => {
                    return Err(invalid(lnum, format!("unknown record '{}'", other)));
                }
            }
        }
        let inp_file = inp_file.ok_or_else(|| invalid(0, "no input file".into()))?;
        let target_file = target_file.ok_or_else(|| invalid(0, "no target file".into()))?;
        let input = EmbeddingInput::load_inp(&inp_file)?;
        let t_mesh = PolyMesh::load_obj(&target_file)?;
        if t_mesh.num_vertices() < input.target().num_vertices() {
            return Err(invalid(
                0,
                format!(
                    "target mesh has {} vertices, fewer than the {} of the input",
                    t_mesh.num_vertices(),
                    input.target().num_vertices()
                ),
            ));
        }
        let l_matching_vertex = read_landmarks(&input, &t_mesh, &landmarks, &invalid)?;
        let mut em = Embedding::from_parts(Arc::new(input), t_mesh, l_matching_vertex);
        let mut claimed: Vec<(HH, usize)> = Vec::with_capacity(records.len());
        for record in &records {
            let l_he = em.claim_record(record, &invalid)?;
            claimed.push((l_he, record.chain.len() - 1));
        }
        // A halfedge recorded twice with different paths claims more target
        // halfedges than either path has edges.
        let mut counts = HProperty::new(em.layout_mesh().num_halfedges(), 0usize);
        for t_h in em.t_mesh.halfedges() {
            if let Some(l_he) = em.t_matching_halfedge[t_h] {
                counts[l_he] += 1;
            }
        }
        for (l_he, nedges) in claimed {
            if counts[l_he] != nedges {
                return Err(Error::InconsistentEmbedding(l_he));
            }
        }
        log::info!(
            "Loaded embedding with {} of {} layout edges from {}",
            em.num_embedded_edges(),
            em.layout_mesh().num_edges(),
            lem_path.display()
        );
        Ok(em)
    }

    /// Claim the target halfedges along a recorded path. Claims that already
    /// exist must agree with the record.
    fn claim_record(
        &mut self,
        record: &EmbeddedRecord,
        invalid: &impl Fn(usize, String) -> Error,
    ) -> Result<HH, Error> {
        let layout = self.input.layout();
        let nlverts = layout.num_vertices() as u32;
        if record.from >= nlverts || record.to >= nlverts {
            return Err(invalid(
                record.line,
                format!("layout mesh has {} vertices", nlverts),
            ));
        }
        let (l_from, l_to) = (VH::from(record.from), VH::from(record.to));
        let l_he = layout
            .find_halfedge(l_from, l_to)
            .ok_or(Error::HalfedgeNotFound(l_from, l_to))?;
        let ntverts = self.t_mesh.num_vertices() as u32;
        if let Some(i) = record.chain.iter().find(|i| **i >= ntverts) {
            return Err(invalid(
                record.line,
                format!("no target vertex {}", i),
            ));
        }
        let chain: Vec<VH> = record.chain.iter().map(|i| VH::from(*i)).collect();
        let (first, last) = (chain[0], chain[chain.len() - 1]);
        if first != self.l_matching_vertex[l_from] || last != self.l_matching_vertex[l_to] {
            return Err(Error::InconsistentEmbedding(l_he));
        }
        let inner = &chain[1..chain.len() - 1];
        if inner.iter().any(|t_v| self.t_matching_vertex[*t_v].is_some()) {
            return Err(Error::InconsistentEmbedding(l_he));
        }
        let mut visited = vec![false; self.t_mesh.num_vertices()];
        for t_v in &chain {
            if std::mem::replace(&mut visited[t_v.index() as usize], true) {
                return Err(Error::InconsistentEmbedding(l_he));
            }
        }
        for pair in chain.windows(2) {
            let t_h = self
                .t_mesh
                .find_halfedge(pair[0], pair[1])
                .ok_or(Error::HalfedgeNotFound(pair[0], pair[1]))?;
            let agrees = |current: Option<HH>, expected: HH| current.is_none_or(|c| c == expected);
            if !agrees(self.t_matching_halfedge[t_h], l_he)
                || !agrees(self.t_matching_halfedge[t_h.opposite()], l_he.opposite())
            {
                return Err(Error::InconsistentEmbedding(l_he));
            }
            self.t_matching_halfedge[t_h] = Some(l_he);
            self.t_matching_halfedge[t_h.opposite()] = Some(l_he.opposite());
        }
        Ok(l_he)
    }
}
