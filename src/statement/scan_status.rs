//! Post-execution query-plan diagnostics.
//!
//! Loop enumeration comes from the engine's plan introspection
//! (`EXPLAIN QUERY PLAN`), cached per statement; the visit counters come from
//! the execution bookkeeping this layer maintains, since the bundled engine
//! build exports no native per-loop counters. Out-of-range loop indexes are
//! the documented "no more loops" sentinel (`None`), never an error.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Serialize;

use crate::error::SqliteExecError;

use super::Statement;

/// Pass this flag to enumerate every plan element, not just the SCAN/SEARCH
/// loops.
pub const SCANSTAT_COMPLEX: u32 = 0x0001;

/// Which per-loop metric to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatusMetric {
    /// Times the loop has run (this layer counts completed executions).
    NLoop,
    /// Rows visited (this layer counts cursor steps).
    NVisit,
    /// Estimated rows per loop; always reported as a double.
    Est,
    /// Name of the table or index driving the loop, when the plan names one.
    Name,
    /// The plan element's explain text.
    Explain,
    /// Select id of the plan element, forming a tree over nested loops.
    SelectId,
    /// Parent select id of the plan element.
    ParentId,
    /// Engine cycle counter; not exported by this engine build.
    NCycle,
}

/// A scan-status reading.
///
/// Integer metrics follow the statement's safe-integer mode: the exact
/// integer with the mode on, the double-backed numeric with it off. The
/// estimate metric is always [`ScanStatusValue::Number`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScanStatusValue {
    Integer(i64),
    Number(f64),
    Text(String),
    Null,
}

/// One row of the engine's plan introspection.
#[derive(Debug, Clone)]
pub(crate) struct PlanElement {
    select_id: i64,
    parent_id: i64,
    detail: String,
    is_loop: bool,
}

static LOOP_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:SCAN|SEARCH)\s+(?:TABLE\s+)?(\S+)(?:\s+USING\s+(?:COVERING\s+)?INDEX\s+(\S+))?")
        .expect("loop-name pattern is valid")
});

impl PlanElement {
    fn name(&self) -> Option<&str> {
        let caps = LOOP_NAME.captures(&self.detail)?;
        match caps.get(2) {
            Some(index_name) => Some(index_name.as_str()),
            None => caps.get(1).map(|table| table.as_str()),
        }
    }
}

impl Statement<'_> {
    /// Read one query-plan metric for the loop at `loop_index`.
    ///
    /// Returns `None` for an out-of-range index — the documented "no more
    /// loops" sentinel. With `flags` 0 only SCAN/SEARCH loops are
    /// enumerated; with [`SCANSTAT_COMPLEX`] every plan element is.
    ///
    /// # Errors
    ///
    /// [`SqliteExecError::Sqlite`] if the engine cannot introspect the plan.
    pub fn scan_status(
        &self,
        loop_index: usize,
        metric: ScanStatusMetric,
        flags: u32,
    ) -> Result<Option<ScanStatusValue>, SqliteExecError> {
        let plan = self.plan_elements()?;
        let complex = flags & SCANSTAT_COMPLEX != 0;
        let element = plan
            .iter()
            .filter(|e| complex || e.is_loop)
            .nth(loop_index);
        let Some(element) = element else {
            return Ok(None);
        };

        let value = match metric {
            ScanStatusMetric::NLoop => self.integer_metric(self.runs.get() as i64),
            ScanStatusMetric::NVisit => self.integer_metric(self.visits.get() as i64),
            ScanStatusMetric::Est => {
                let runs = self.runs.get().max(1);
                let per_run = self.visits.get() as f64 / runs as f64;
                ScanStatusValue::Number(per_run.max(1.0))
            }
            ScanStatusMetric::Name => match element.name() {
                Some(name) => ScanStatusValue::Text(name.to_owned()),
                None => ScanStatusValue::Null,
            },
            ScanStatusMetric::Explain => ScanStatusValue::Text(element.detail.clone()),
            ScanStatusMetric::SelectId => self.integer_metric(element.select_id),
            ScanStatusMetric::ParentId => self.integer_metric(element.parent_id),
            ScanStatusMetric::NCycle => return Ok(None),
        };
        Ok(Some(value))
    }

    /// Zero the execution counters consumed by [`scan_status`](Statement::scan_status).
    pub fn scan_status_reset(&self) -> &Self {
        self.runs.set(0);
        self.visits.set(0);
        self
    }

    fn integer_metric(&self, value: i64) -> ScanStatusValue {
        if self.safe_integers.get() {
            ScanStatusValue::Integer(value)
        } else {
            ScanStatusValue::Number(value as f64)
        }
    }

    fn plan_elements(&self) -> Result<Arc<Vec<PlanElement>>, SqliteExecError> {
        if let Some(plan) = self.plan.borrow().as_ref() {
            return Ok(Arc::clone(plan));
        }

        let sql = format!("EXPLAIN QUERY PLAN {}", self.source);
        let mut stmt = self.db.connection().prepare(&sql)?;
        let mut elements = Vec::new();
        let mut rows = stmt.raw_query();
        while let Some(row) = rows.next()? {
            let select_id: i64 = row.get(0)?;
            let parent_id: i64 = row.get(1)?;
            let detail: String = row.get(3)?;
            let is_loop = detail.starts_with("SCAN") || detail.starts_with("SEARCH");
            elements.push(PlanElement {
                select_id,
                parent_id,
                detail,
                is_loop,
            });
        }
        drop(rows);

        let plan = Arc::new(elements);
        *self.plan.borrow_mut() = Some(Arc::clone(&plan));
        Ok(plan)
    }
}
