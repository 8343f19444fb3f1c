//! Device interface.
//!
//! [`SaiInterface`] is the capability the convergence engine drives: create,
//! remove, set and get per object, plus bulk variants. All identifiers
//! passed through this trait are real ids; callers translate from virtual
//! ids before calling.

use crate::entry::{EntryKey, ObjectKey};
use crate::error::{SaiResult, SaiStatus};
use crate::meta::{AttrMeta, SaiAttribute};
use crate::types::{ObjectType, Rid};

/// How a bulk call treats a failing item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BulkOpErrorMode {
    /// Stop at the first failure; later items are reported `NotExecuted`.
    #[default]
    StopOnError,
    /// Execute every item; the call succeeds even if some items fail.
    IgnoreError,
}

/// Result of a bulk call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkResponse {
    /// Overall status of the call.
    pub status: SaiStatus,
    /// One status per item, in request order.
    pub object_statuses: Vec<SaiStatus>,
    /// Ids assigned by bulk create (null for failed items); empty otherwise.
    pub object_ids: Vec<Rid>,
}

impl BulkResponse {
    pub fn failed_items(&self) -> impl Iterator<Item = (usize, SaiStatus)> + '_ {
        self.object_statuses
            .iter()
            .enumerate()
            .filter(|(_, status)| !status.is_success())
            .map(|(i, status)| (i, *status))
    }
}

/// Runs `op` over `items` honoring the error mode.
pub fn run_bulk<I, T>(
    items: I,
    mode: BulkOpErrorMode,
    mut op: impl FnMut(I::Item) -> SaiResult<T>,
) -> (BulkResponse, Vec<Option<T>>)
where
    I: IntoIterator,
{
    let mut statuses = Vec::new();
    let mut outputs = Vec::new();
    let mut overall = SaiStatus::Success;
    let mut stopped = false;
    for item in items {
        if stopped {
            statuses.push(SaiStatus::NotExecuted);
            outputs.push(None);
            continue;
        }
        match op(item) {
            Ok(out) => {
                statuses.push(SaiStatus::Success);
                outputs.push(Some(out));
            }
            Err(err) => {
                statuses.push(err.to_status());
                outputs.push(None);
                if mode == BulkOpErrorMode::StopOnError {
                    overall = SaiStatus::Failure;
                    stopped = true;
                }
            }
        }
    }
    let response = BulkResponse {
        status: overall,
        object_statuses: statuses,
        object_ids: Vec::new(),
    };
    (response, outputs)
}

/// Vendor-neutral device interface.
pub trait SaiInterface {
    /// Creates an OID object and returns the id the device assigned.
    fn create(
        &mut self,
        object_type: ObjectType,
        switch_id: Rid,
        attrs: &[SaiAttribute],
    ) -> SaiResult<Rid>;

    fn create_entry(&mut self, entry: &EntryKey, attrs: &[SaiAttribute]) -> SaiResult<()>;

    fn remove(&mut self, key: &ObjectKey) -> SaiResult<()>;

    fn set(&mut self, key: &ObjectKey, attr: &SaiAttribute) -> SaiResult<()>;

    /// Reads the requested attributes; attributes the object does not hold
    /// are left out of the result.
    fn get(&self, key: &ObjectKey, attrs: &[&'static AttrMeta]) -> SaiResult<Vec<SaiAttribute>>;

    fn object_type_query(&self, oid: Rid) -> ObjectType;

    fn switch_id_query(&self, oid: Rid) -> Rid;

    fn bulk_create(
        &mut self,
        object_type: ObjectType,
        switch_id: Rid,
        attr_lists: &[Vec<SaiAttribute>],
        mode: BulkOpErrorMode,
    ) -> BulkResponse {
        let (mut response, ids) = run_bulk(attr_lists, mode, |attrs| {
            self.create(object_type, switch_id, attrs)
        });
        response.object_ids = ids.into_iter().map(Option::unwrap_or_default).collect();
        response
    }

    fn bulk_create_entries(
        &mut self,
        entries: &[(EntryKey, Vec<SaiAttribute>)],
        mode: BulkOpErrorMode,
    ) -> BulkResponse {
        run_bulk(entries, mode, |(entry, attrs)| self.create_entry(entry, attrs)).0
    }

    fn bulk_remove(&mut self, keys: &[ObjectKey], mode: BulkOpErrorMode) -> BulkResponse {
        run_bulk(keys, mode, |key| self.remove(key)).0
    }

    fn bulk_set(&mut self, items: &[(ObjectKey, SaiAttribute)], mode: BulkOpErrorMode) -> BulkResponse {
        run_bulk(items, mode, |(key, attr)| self.set(key, attr)).0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SaiError;
    use pretty_assertions::assert_eq;

    fn flaky(i: &u32) -> SaiResult<u32> {
        if *i == 2 {
            Err(SaiError::status(SaiStatus::TableFull, "item 2"))
        } else {
            Ok(*i * 10)
        }
    }

    #[test]
    fn test_stop_on_error_marks_rest_not_executed() {
        let items = [1u32, 2, 3];
        let (response, outputs) = run_bulk(&items, BulkOpErrorMode::StopOnError, flaky);
        assert_eq!(response.status, SaiStatus::Failure);
        assert_eq!(
            response.object_statuses,
            vec![SaiStatus::Success, SaiStatus::TableFull, SaiStatus::NotExecuted]
        );
        assert_eq!(outputs, vec![Some(10), None, None]);
    }

    #[test]
    fn test_ignore_error_keeps_going() {
        let items = [1u32, 2, 3];
        let (response, outputs) = run_bulk(&items, BulkOpErrorMode::IgnoreError, flaky);
        assert_eq!(response.status, SaiStatus::Success);
        assert_eq!(response.failed_items().collect::<Vec<_>>(), vec![(1, SaiStatus::TableFull)]);
        assert_eq!(outputs, vec![Some(10), None, Some(30)]);
    }
}
