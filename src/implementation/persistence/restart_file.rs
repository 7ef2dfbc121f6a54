// Copyright 2020 Xavier Gillard
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! Hot-restart file (section 6): {mesh indices, barrier contents, iteration
//! counter, seed} serialised as one JSON document, separate from the Cache
//! file proper.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::common::{EvalStatus, EvaluatorKind};
use crate::error::MadsResult;
use crate::implementation::barrier::progressive::ProgressiveBarrier;
use crate::implementation::cache::eval_point::{Eval, EvalPoint};
use crate::implementation::mesh::granular::GranularMesh;
use crate::implementation::point::Point;

#[derive(Serialize, Deserialize)]
struct Incumbent {
    point: Point,
    raw_outputs: Vec<f64>,
    f: f64,
    h: f64,
    tag: u64,
}

impl Incumbent {
    fn from_eval_point(ep: &EvalPoint) -> Option<Self> {
        let eval = ep.eval(EvaluatorKind::BlackBox)?;
        Some(Incumbent {
            point: ep.point.clone(),
            raw_outputs: eval.raw_outputs.clone(),
            f: eval.f,
            h: eval.h,
            tag: eval.tag,
        })
    }

    fn into_eval_point(self) -> EvalPoint {
        let mut ep = EvalPoint::new(self.point, "restart");
        ep.set_eval(
            EvaluatorKind::BlackBox,
            Eval { raw_outputs: self.raw_outputs, status: EvalStatus::Ok, f: self.f, h: self.h, tag: self.tag, counted: true },
        );
        ep
    }
}

#[derive(Serialize, Deserialize)]
struct RestartDocument {
    mesh_indices: Vec<i64>,
    h_max: f64,
    best_feasible: Option<Incumbent>,
    best_infeasible: Option<Incumbent>,
    iteration: usize,
    seed: u64,
}

/// Everything a restarted run needs to pick the driver loop back up; apply
/// with `RestartState::apply`.
pub struct RestartState {
    doc: RestartDocument,
}

impl RestartState {
    pub fn iteration(&self) -> usize {
        self.doc.iteration
    }
    pub fn seed(&self) -> u64 {
        self.doc.seed
    }

    /// Reinstates `mesh` and `barrier` in place.
    pub fn apply(self, mesh: &mut GranularMesh, barrier: &ProgressiveBarrier) {
        mesh.set_mesh_indices(self.doc.mesh_indices);
        barrier.restore(
            self.doc.best_feasible.map(Incumbent::into_eval_point),
            self.doc.best_infeasible.map(Incumbent::into_eval_point),
            self.doc.h_max,
        );
    }
}

pub fn save(
    mesh: &GranularMesh,
    barrier: &ProgressiveBarrier,
    iteration: usize,
    seed: u64,
    path: impl AsRef<Path>,
) -> MadsResult<()> {
    let doc = RestartDocument {
        mesh_indices: mesh.mesh_indices().to_vec(),
        h_max: barrier.h_max(),
        best_feasible: barrier.best_feasible().as_ref().and_then(Incumbent::from_eval_point),
        best_infeasible: barrier.best_infeasible().as_ref().and_then(Incumbent::from_eval_point),
        iteration,
        seed,
    };
    let file = File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), &doc)?;
    Ok(())
}

pub fn load(path: impl AsRef<Path>) -> MadsResult<RestartState> {
    let file = File::open(path)?;
    let doc: RestartDocument = serde_json::from_reader(BufReader::new(file))?;
    Ok(RestartState { doc })
}

#[cfg(test)]
mod test_restart_file {
    use super::*;
    use crate::implementation::cache::eval_point::Eval;

    #[test]
    fn save_then_load_restores_mesh_and_barrier() {
        let mut mesh = GranularMesh::new(vec![0.0; 2], vec![-10.0; 2], vec![10.0; 2], 1.0, false, 0.1, None, None);
        mesh.refine();
        mesh.refine();
        let barrier = ProgressiveBarrier::new(f64::INFINITY, EvaluatorKind::BlackBox);
        let mut ep = EvalPoint::new(Point::from_values(&[1.0, 1.0]), "poll");
        ep.set_eval(
            EvaluatorKind::BlackBox,
            Eval { raw_outputs: vec![2.0], status: EvalStatus::Ok, f: 2.0, h: 0.0, tag: 7, counted: true },
        );
        barrier.update(&ep);

        let file = tempfile::NamedTempFile::new().unwrap();
        save(&mesh, &barrier, 42, 99, file.path()).unwrap();
        let state = load(file.path()).unwrap();
        assert_eq!(state.iteration(), 42);
        assert_eq!(state.seed(), 99);

        let mut fresh_mesh = GranularMesh::new(vec![0.0; 2], vec![-10.0; 2], vec![10.0; 2], 1.0, false, 0.1, None, None);
        let fresh_barrier = ProgressiveBarrier::new(f64::INFINITY, EvaluatorKind::BlackBox);
        state.apply(&mut fresh_mesh, &fresh_barrier);

        assert_eq!(fresh_mesh.mesh_indices(), mesh.mesh_indices());
        assert_eq!(fresh_barrier.best_feasible().unwrap().f(EvaluatorKind::BlackBox), 2.0);
    }
}
