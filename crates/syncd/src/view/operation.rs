//! Operations recorded while a view is transformed, and their reordering.

use itertools::Itertools;
use log::debug;
use sonic_sai::{ObjectKey, SaiAttribute, Vid};
use std::collections::HashMap;
use std::fmt;

use crate::error::Result;
use crate::fatal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OpKind {
    Create,
    Remove,
    Set,
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OpKind::Create => "create",
            OpKind::Remove => "remove",
            OpKind::Set => "set",
        })
    }
}

/// One device operation in view (VID) identity.
#[derive(Debug, Clone, PartialEq)]
pub struct AsicOperation {
    pub id: u64,
    pub kind: OpKind,
    pub key: ObjectKey,
    pub attrs: Vec<SaiAttribute>,
    /// Value replaced by a set, kept for logging.
    pub previous: Option<SaiAttribute>,
}

impl AsicOperation {
    pub fn is_oid_remove(&self) -> bool {
        self.kind == OpKind::Remove && self.key.object_id().is_some()
    }

    pub fn is_entry_remove(&self) -> bool {
        self.kind == OpKind::Remove && self.key.entry().is_some()
    }

    /// Field/value pairs as written to the operation log.
    pub fn fields(&self) -> Vec<(String, String)> {
        if self.kind == OpKind::Create && self.attrs.is_empty() {
            return vec![("NULL".to_string(), "NULL".to_string())];
        }
        self.attrs
            .iter()
            .map(|a| (a.name().to_string(), a.value.to_string()))
            .collect()
    }
}

impl fmt::Display for AsicOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.key)?;
        for (field, value) in self.fields() {
            write!(f, " {field}={value}")?;
        }
        if let Some(previous) = &self.previous {
            write!(f, " (was {})", previous.value)?;
        }
        Ok(())
    }
}

/// Chronological operation log of a view.
#[derive(Debug, Clone, Default)]
pub struct OperationLog {
    next_id: u64,
    ops: Vec<AsicOperation>,
    /// Operation that dropped the reference count of a VID to zero.
    last_release: HashMap<Vid, u64>,
}

impl OperationLog {
    pub fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn push(&mut self, op: AsicOperation) {
        debug!("asic op: {op}");
        self.ops.push(op);
    }

    pub fn record_release(&mut self, vid: Vid, op_id: u64) {
        self.last_release.insert(vid, op_id);
    }

    pub fn operations(&self) -> &[AsicOperation] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn clear(&mut self) {
        self.ops.clear();
        self.last_release.clear();
    }

    /// `"create: n, remove: n, set: n"` summary.
    pub fn summary(&self) -> String {
        let counts = self.ops.iter().counts_by(|op| op.kind);
        [OpKind::Create, OpKind::Remove, OpKind::Set]
            .iter()
            .map(|kind| format!("{kind}: {}", counts.get(kind).copied().unwrap_or(0)))
            .join(", ")
    }

    /// Operations in execution order.
    ///
    /// With `hoist_removes`, entry removes run first and every OID remove
    /// runs directly after the operation that released its last reference,
    /// so resources are freed before anything new is created. With
    /// `collapse`, an adjacent create/remove of the same object cancels and
    /// adjacent sets of the same attribute keep only the last one.
    pub fn optimized(&self, hoist_removes: bool, collapse: bool) -> Result<Vec<AsicOperation>> {
        let ordered = if hoist_removes {
            self.hoisted()?
        } else {
            self.ops.clone()
        };
        Ok(if collapse {
            collapse_adjacent(ordered)
        } else {
            ordered
        })
    }

    fn hoisted(&self) -> Result<Vec<AsicOperation>> {
        let mut out: Vec<AsicOperation> =
            self.ops.iter().filter(|op| op.is_entry_remove()).cloned().collect();
        let mut index = out.len();

        for op in self.ops.iter().filter(|op| !op.is_entry_remove()) {
            if !op.is_oid_remove() {
                out.push(op.clone());
                continue;
            }
            let vid = op.key.object_id().map(Vid::from).unwrap_or_default();
            let Some(release_id) = self.last_release.get(&vid) else {
                // Never referenced during this run.
                out.insert(index, op.clone());
                index += 1;
                continue;
            };
            let position = out
                .iter()
                .position(|o| o.id == *release_id)
                .ok_or_else(|| fatal!("operation {release_id} releasing {vid} not found"))?;
            if out[position].kind == OpKind::Remove {
                out.push(op.clone());
            } else {
                index = index.max(position + 1);
                out.insert(index, op.clone());
                index += 1;
            }
        }

        if out.len() != self.ops.len() {
            return Err(fatal!(
                "optimized operation count {} differs from {}",
                out.len(),
                self.ops.len()
            ));
        }
        Ok(out)
    }
}

fn collapse_adjacent(ops: Vec<AsicOperation>) -> Vec<AsicOperation> {
    let mut out: Vec<AsicOperation> = Vec::with_capacity(ops.len());
    for op in ops {
        if let Some(top) = out.last_mut() {
            if top.key == op.key {
                match (top.kind, op.kind) {
                    (OpKind::Create, OpKind::Remove) => {
                        debug!("dropping create/remove pair of {}", op.key);
                        out.pop();
                        continue;
                    }
                    (OpKind::Set, OpKind::Set)
                        if top.attrs.first().map(|a| a.name())
                            == op.attrs.first().map(|a| a.name()) =>
                    {
                        let previous = top.previous.take();
                        *top = op;
                        top.previous = previous;
                        continue;
                    }
                    _ => {}
                }
            }
        }
        out.push(op);
    }
    out
}
