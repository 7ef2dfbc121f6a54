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

//! Batch black-box protocol: `BB_EXE` is invoked once per block with a
//! single argument, the path to a temp file holding one whitespace-separated
//! input vector per line. It must print one output line per input line, in
//! `BB_OUTPUT_TYPE` order; a line whose first token does not parse as a
//! number is a failure for that row, as is any exit code other than 0 (which
//! fails the whole block).

use std::io::Write;
use std::process::Command;

use log::warn;
use tempfile::NamedTempFile;

use crate::abstraction::evaluator::{EvalOutcome, Evaluator};
use crate::implementation::point::Point;

pub struct BatchEvaluator {
    exe: String,
    arity: usize,
}

impl BatchEvaluator {
    /// `arity` is `BB_OUTPUT_TYPE.len()`: every printed line must carry
    /// exactly that many whitespace-separated values.
    pub fn new(exe: impl Into<String>, arity: usize) -> Self {
        BatchEvaluator { exe: exe.into(), arity }
    }

    fn write_input(&self, block: &[Point]) -> std::io::Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        for point in block {
            let line: Vec<String> = point
                .values()
                .into_iter()
                .map(|v| v.to_string())
                .collect();
            writeln!(file, "{}", line.join(" "))?;
        }
        file.flush()?;
        Ok(file)
    }
}

impl Evaluator for BatchEvaluator {
    fn eval_block(&self, block: &[Point]) -> Vec<EvalOutcome> {
        let input = match self.write_input(block) {
            Ok(f) => f,
            Err(e) => {
                warn!("batch evaluator: failed to write input file: {e}");
                return vec![EvalOutcome::failed(); block.len()];
            }
        };

        let output = Command::new(&self.exe).arg(input.path()).output();
        match output {
            Err(e) => {
                warn!("batch evaluator: failed to spawn {}: {e}", self.exe);
                vec![EvalOutcome::failed(); block.len()]
            }
            Ok(out) if !out.status.success() => {
                warn!("batch evaluator: {} exited with {}", self.exe, out.status);
                vec![EvalOutcome::failed(); block.len()]
            }
            Ok(out) => {
                let stdout = String::from_utf8_lossy(&out.stdout);
                let lines: Vec<&str> = stdout.lines().collect();
                block
                    .iter()
                    .enumerate()
                    .map(|(i, _)| match lines.get(i) {
                        Some(line) => parse_row(line, self.arity),
                        None => EvalOutcome::failed(),
                    })
                    .collect()
            }
        }
    }
}

fn parse_row(line: &str, arity: usize) -> EvalOutcome {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != arity {
        return EvalOutcome::failed();
    }
    let mut values = Vec::with_capacity(arity);
    for token in tokens {
        match token.parse::<f64>() {
            Ok(v) => values.push(v),
            Err(_) => return EvalOutcome::failed(),
        }
    }
    EvalOutcome::success(values)
}

#[cfg(test)]
mod test_batch_evaluator {
    use super::*;

    #[test]
    fn a_well_formed_row_parses_to_success() {
        let outcome = parse_row("1.0 -2.5 0.0", 3);
        assert!(outcome.ok);
        assert_eq!(outcome.outputs, vec![1.0, -2.5, 0.0]);
    }

    #[test]
    fn a_row_starting_with_a_non_numeric_token_fails() {
        let outcome = parse_row("NaN-ish garbage 1.0", 3);
        assert!(!outcome.ok);
    }

    #[test]
    fn a_row_with_the_wrong_arity_fails() {
        let outcome = parse_row("1.0 2.0", 3);
        assert!(!outcome.ok);
    }

    #[test]
    fn missing_lines_fail_the_corresponding_rows() {
        let block = vec![Point::from_values(&[0.0]), Point::from_values(&[1.0])];
        let evaluator = BatchEvaluator::new("/path/does/not/exist", 1);
        let outcomes = evaluator.eval_block(&block);
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| !o.ok));
    }
}
