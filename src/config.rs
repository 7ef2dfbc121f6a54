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

//! The problem-declaration option table (section 6), gathered into a single
//! validated, immutable, `Send + Sync` snapshot built with `derive_builder`.

use derive_builder::Builder;

use crate::common::{DirectionType, InputType, OutputType};
use crate::error::MadsError;
use crate::implementation::queue::sort_keys::SortKeyKind;

#[derive(Debug, Clone, Builder)]
#[builder(build_fn(skip, error = "MadsError"))]
pub struct Parameters {
    pub dimension: usize,
    pub x0: Vec<f64>,
    pub lower_bound: Vec<Option<f64>>,
    pub upper_bound: Vec<Option<f64>>,
    #[builder(default)]
    pub bb_input_type: Vec<InputType>,
    #[builder(default)]
    pub granularity: Vec<f64>,
    pub bb_output_type: Vec<OutputType>,
    #[builder(default)]
    pub bb_exe: Option<String>,
    #[builder(default = "1000")]
    pub max_bb_eval: usize,
    #[builder(default)]
    pub max_eval: Option<usize>,
    #[builder(default)]
    pub max_time: Option<std::time::Duration>,
    #[builder(default)]
    pub direction_type: DirectionType,
    #[builder(default = "false")]
    pub anisotropic_mesh: bool,
    #[builder(default = "0.1")]
    pub anisotropic_ratio: f64,
    #[builder(default)]
    pub eval_queue_sort: SortKeyKind,
    #[builder(default = "true")]
    pub opportunism: bool,
    #[builder(default = "1")]
    pub block_size: usize,
    #[builder(default = "num_cpus::get().max(1)")]
    pub nb_threads: usize,
    #[builder(default = "0")]
    pub seed: u64,
    #[builder(default = "f64::INFINITY")]
    pub h_max_0: f64,
    #[builder(default = "1.0")]
    pub initial_frame_size: f64,
    #[builder(default)]
    pub min_mesh_size: Option<f64>,
    #[builder(default)]
    pub min_frame_size: Option<f64>,
    #[builder(default)]
    pub cache_file: Option<String>,
}

impl ParametersBuilder {
    pub fn build(&self) -> Result<Parameters, MadsError> {
        let dimension = self
            .dimension
            .ok_or_else(|| MadsError::Parameter("DIMENSION is required".into()))?;
        if dimension == 0 {
            return Err(MadsError::Parameter("DIMENSION must be > 0".into()));
        }
        let x0 = self
            .x0
            .clone()
            .ok_or_else(|| MadsError::Parameter("X0 is required".into()))?;
        if x0.len() != dimension {
            return Err(MadsError::Parameter(format!(
                "X0 has length {} but DIMENSION is {}",
                x0.len(),
                dimension
            )));
        }
        let lower_bound = self
            .lower_bound
            .clone()
            .unwrap_or_else(|| vec![None; dimension]);
        let upper_bound = self
            .upper_bound
            .clone()
            .unwrap_or_else(|| vec![None; dimension]);
        if lower_bound.len() != dimension || upper_bound.len() != dimension {
            return Err(MadsError::Parameter(
                "LOWER_BOUND / UPPER_BOUND must have length DIMENSION".into(),
            ));
        }
        for i in 0..dimension {
            if let (Some(lb), Some(ub)) = (lower_bound[i], upper_bound[i]) {
                if lb > ub {
                    return Err(MadsError::Parameter(format!(
                        "inconsistent bounds at coordinate {i}: lower {lb} > upper {ub}"
                    )));
                }
            }
        }
        let bb_input_type = self
            .bb_input_type
            .clone()
            .unwrap_or_else(|| vec![InputType::Continuous; dimension]);
        if bb_input_type.len() != dimension {
            return Err(MadsError::Parameter(
                "BB_INPUT_TYPE must have length DIMENSION".into(),
            ));
        }
        let granularity = self
            .granularity
            .clone()
            .unwrap_or_else(|| {
                bb_input_type
                    .iter()
                    .map(|t| match t {
                        InputType::Integer | InputType::Binary => 1.0,
                        _ => 0.0,
                    })
                    .collect()
            });
        if granularity.len() != dimension {
            return Err(MadsError::Parameter(
                "GRANULARITY must have length DIMENSION".into(),
            ));
        }
        if granularity.iter().any(|g| *g < 0.0) {
            return Err(MadsError::Parameter("GRANULARITY must be non-negative".into()));
        }
        let bb_output_type = self
            .bb_output_type
            .clone()
            .ok_or_else(|| MadsError::Parameter("BB_OUTPUT_TYPE is required".into()))?;
        if bb_output_type.is_empty() {
            return Err(MadsError::Parameter("BB_OUTPUT_TYPE must not be empty".into()));
        }
        if !bb_output_type
            .iter()
            .any(|t| matches!(t, OutputType::Objective))
        {
            return Err(MadsError::Parameter(
                "BB_OUTPUT_TYPE must declare exactly one objective".into(),
            ));
        }

        Ok(Parameters {
            dimension,
            x0,
            lower_bound,
            upper_bound,
            bb_input_type,
            granularity,
            bb_output_type,
            bb_exe: self.bb_exe.clone().unwrap_or(None),
            max_bb_eval: self.max_bb_eval.unwrap_or(1000),
            max_eval: self.max_eval.clone().unwrap_or(None),
            max_time: self.max_time.unwrap_or(None),
            direction_type: self.direction_type.unwrap_or_default(),
            anisotropic_mesh: self.anisotropic_mesh.unwrap_or(false),
            anisotropic_ratio: self.anisotropic_ratio.unwrap_or(0.1),
            eval_queue_sort: self.eval_queue_sort.clone().unwrap_or_default(),
            opportunism: self.opportunism.unwrap_or(true),
            block_size: self.block_size.unwrap_or(1).max(1),
            nb_threads: self.nb_threads.unwrap_or_else(|| num_cpus::get().max(1)),
            seed: self.seed.unwrap_or(0),
            h_max_0: self.h_max_0.unwrap_or(f64::INFINITY),
            initial_frame_size: self.initial_frame_size.unwrap_or(1.0),
            min_mesh_size: self.min_mesh_size.clone().unwrap_or(None),
            min_frame_size: self.min_frame_size.clone().unwrap_or(None),
            cache_file: self.cache_file.clone().unwrap_or(None),
        })
    }
}

#[cfg(test)]
mod test_parameters {
    use super::*;

    fn base() -> ParametersBuilder {
        let mut b = ParametersBuilder::default();
        b.dimension(5)
            .x0(vec![0.0; 5])
            .bb_output_type(vec![OutputType::Objective]);
        b
    }

    #[test]
    fn defaults_fill_in_sensibly() {
        let p = base().build().unwrap();
        assert_eq!(p.nb_threads, num_cpus::get().max(1));
        assert_eq!(p.block_size, 1);
        assert!(p.opportunism);
        assert_eq!(p.lower_bound.len(), 5);
        assert_eq!(p.granularity, vec![0.0; 5]);
    }

    #[test]
    fn rejects_zero_dimension() {
        let mut b = ParametersBuilder::default();
        b.dimension(0).x0(vec![]).bb_output_type(vec![OutputType::Objective]);
        assert!(b.build().is_err());
    }

    #[test]
    fn rejects_inconsistent_bounds() {
        let mut b = base();
        b.lower_bound(vec![Some(1.0), None, None, None, None])
            .upper_bound(vec![Some(0.0), None, None, None, None]);
        assert!(b.build().is_err());
    }

    #[test]
    fn rejects_missing_objective() {
        let mut b = ParametersBuilder::default();
        b.dimension(2).x0(vec![0.0, 0.0]).bb_output_type(vec![OutputType::Extra]);
        assert!(b.build().is_err());
    }
}
