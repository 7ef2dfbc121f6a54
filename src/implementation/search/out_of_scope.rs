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

//! The quadratic-model and Nelder-Mead search methods are out of scope:
//! only the `SearchMethod` hook they would implement is specified here,
//! with no internals. Both implementations below propose nothing; they
//! exist so a caller can wire them into a declared search order without a
//! compile error, and are expected to be replaced by a real implementation
//! outside this crate.

use crate::abstraction::search_method::{SearchMethod, SearchStrictness};
use crate::implementation::barrier::progressive::ProgressiveBarrier;
use crate::implementation::mesh::granular::GranularMesh;
use crate::implementation::point::Point;

pub struct QuadraticModelSearch;
impl SearchMethod for QuadraticModelSearch {
    fn name(&self) -> &str {
        "quadratic-model"
    }
    fn generate(&self, _barrier: &ProgressiveBarrier, _mesh: &GranularMesh) -> Vec<Point> {
        Vec::new()
    }
    fn strictness(&self) -> SearchStrictness {
        SearchStrictness::Strict
    }
}

pub struct NelderMeadSearch;
impl SearchMethod for NelderMeadSearch {
    fn name(&self) -> &str {
        "nelder-mead"
    }
    fn generate(&self, _barrier: &ProgressiveBarrier, _mesh: &GranularMesh) -> Vec<Point> {
        Vec::new()
    }
    fn strictness(&self) -> SearchStrictness {
        SearchStrictness::Strict
    }
}
