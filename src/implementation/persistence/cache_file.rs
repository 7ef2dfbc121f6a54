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

//! Cache file round trip (section 6): one JSON line per evaluated point,
//! carrying its inputs, raw outputs, and status, so a run can be resumed
//! without re-paying already-spent black-box evaluations.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::common::{EvalStatus, EvaluatorKind};
use crate::error::MadsResult;
use crate::implementation::cache::eval_point::Eval;
use crate::implementation::cache::store::Cache;
use crate::implementation::point::Point;

#[derive(Serialize, Deserialize)]
struct CacheRecord {
    point: Point,
    status: EvalStatus,
    raw_outputs: Vec<f64>,
    f: f64,
    h: f64,
    tag: u64,
}

/// Writes every black-box entry currently in `cache` to `path`, one JSON
/// object per line. Entries still `Pending` are skipped: a restarted run
/// must re-submit them.
pub fn save(cache: &Cache, path: impl AsRef<Path>) -> MadsResult<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    for ep in cache.snapshot() {
        if let Some(eval) = ep.eval(EvaluatorKind::BlackBox) {
            if eval.status == EvalStatus::Pending {
                continue;
            }
            let record = CacheRecord {
                point: ep.point.clone(),
                status: eval.status,
                raw_outputs: eval.raw_outputs.clone(),
                f: eval.f,
                h: eval.h,
                tag: eval.tag,
            };
            serde_json::to_writer(&mut writer, &record)?;
            writer.write_all(b"\n")?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Loads `path` into a fresh `Cache`, preserving each record's original
/// tag so replayed ordering stays reproducible.
pub fn load(path: impl AsRef<Path>) -> MadsResult<Cache> {
    let cache = Cache::new();
    let file = File::open(path)?;
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: CacheRecord = serde_json::from_str(&line)?;
        let eval = Eval {
            raw_outputs: record.raw_outputs,
            status: record.status,
            f: record.f,
            h: record.h,
            tag: record.tag,
            counted: true,
        };
        cache.smart_insert(record.point.clone(), "restart", EvaluatorKind::BlackBox);
        cache.record(&record.point, EvaluatorKind::BlackBox, eval);
    }
    Ok(cache)
}

#[cfg(test)]
mod test_cache_file {
    use super::*;

    #[test]
    fn save_then_load_round_trips_feasible_points() {
        let cache = Cache::new();
        let p = Point::from_values(&[1.0, 2.0]);
        let (cell, _) = cache.smart_insert(p.clone(), "poll", EvaluatorKind::BlackBox);
        cell.lock().set_eval(
            EvaluatorKind::BlackBox,
            Eval { raw_outputs: vec![3.0], status: EvalStatus::Ok, f: 3.0, h: 0.0, tag: 0, counted: true },
        );

        let file = tempfile::NamedTempFile::new().unwrap();
        save(&cache, file.path()).unwrap();
        let reloaded = load(file.path()).unwrap();

        assert_eq!(reloaded.len(), 1);
        let entry = reloaded.find(&p).unwrap();
        let eval = entry.lock().eval(EvaluatorKind::BlackBox).unwrap().clone();
        assert_eq!(eval.status, EvalStatus::Ok);
        assert_eq!(eval.f, 3.0);
    }

    #[test]
    fn pending_entries_are_not_persisted() {
        let cache = Cache::new();
        cache.smart_insert(Point::from_values(&[0.0]), "poll", EvaluatorKind::BlackBox);
        let file = tempfile::NamedTempFile::new().unwrap();
        save(&cache, file.path()).unwrap();
        let reloaded = load(file.path()).unwrap();
        assert_eq!(reloaded.len(), 0);
    }
}
