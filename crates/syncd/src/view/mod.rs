//! AsicView: one snapshot of the ASIC object graph.
//!
//! Objects live in an arena owned by the view and are addressed by
//! [`ObjectIdx`]; cross-object references are plain VIDs inside attribute
//! values and entry keys. The view keeps the VID/RID maps, a reference
//! counter over the VIDs its objects point at, and the log of device
//! operations produced while the current view is transformed into the
//! temporary one.

mod object;
mod operation;

pub use object::{ObjectIdx, ObjectStatus, SaiObject};
pub use operation::{AsicOperation, OpKind, OperationLog};

use log::{debug, warn};
use sonic_sai::meta::{attr_by_name, is_ignored_on_load};
use sonic_sai::{IpPrefix, ObjectKey, ObjectType, Rid, SaiAttribute, Vid};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Result, SyncdError};
use crate::fatal;
use crate::ref_counter::OidRefCounter;

/// Table dump: `"<TypeName>:<serialized-key>"` to attribute name/value pairs.
pub type TableDump = BTreeMap<String, BTreeMap<String, String>>;

#[derive(Debug, Clone, Default)]
pub struct AsicView {
    objects: Vec<SaiObject>,
    by_key: BTreeMap<ObjectKey, ObjectIdx>,
    by_vid: BTreeMap<Vid, ObjectIdx>,
    by_type: BTreeMap<ObjectType, BTreeSet<ObjectIdx>>,
    routes_by_prefix: BTreeMap<IpPrefix, BTreeSet<ObjectIdx>>,

    vid_to_rid: BTreeMap<Vid, Rid>,
    rid_to_vid: BTreeMap<Rid, Vid>,
    /// VIDs removed during this run, still needed to address the device.
    removed_vid_to_rid: BTreeMap<Vid, Rid>,

    refs: OidRefCounter,
    ops: OperationLog,

    /// Temporary VID to current VID hints for the candidate finder.
    pre_match: BTreeMap<Vid, Vid>,
    /// Serialized entry keys matched between the views, per type.
    non_oid_map: BTreeMap<ObjectType, BTreeMap<String, String>>,
}

impl AsicView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a view from a table dump. A `NULL` field marks an object
    /// without attributes; device-maintained counters are skipped.
    pub fn from_dump(dump: &TableDump) -> Result<Self> {
        let mut view = Self::new();
        for (key, fields) in dump {
            let key: ObjectKey = key.parse()?;
            let object_type = key.object_type();
            let mut object = SaiObject::new(key);
            for (name, value) in fields {
                if name == "NULL" {
                    continue;
                }
                let meta = attr_by_name(object_type, name)?;
                if is_ignored_on_load(meta) {
                    debug!("ignoring {name} on {}", object.key);
                    continue;
                }
                object.attrs.insert(meta.name, SaiAttribute::parse(meta, value)?);
            }
            view.insert_object(object)?;
        }
        Ok(view)
    }

    /// Inverse of [`AsicView::from_dump`] over live objects.
    pub fn to_dump(&self) -> TableDump {
        self.by_key
            .values()
            .map(|idx| {
                let object = self.object(*idx);
                let mut fields: BTreeMap<String, String> = object
                    .attributes()
                    .map(|a| (a.name().to_string(), a.value.to_string()))
                    .collect();
                if fields.is_empty() {
                    fields.insert("NULL".to_string(), "NULL".to_string());
                }
                (object.key.to_string(), fields)
            })
            .collect()
    }

    /// Adds a loaded object. References are counted leniently: a VID the
    /// view has no object for is tracked as soon as something points at it.
    pub fn insert_object(&mut self, object: SaiObject) -> Result<ObjectIdx> {
        if self.by_key.contains_key(&object.key) {
            return Err(SyncdError::InvalidParameter(format!(
                "object {} already exists",
                object.key
            )));
        }
        if object.object_type() == ObjectType::Switch && !self.objects_of_type(ObjectType::Switch).is_empty() {
            return Err(SyncdError::NotSupported(format!(
                "more than one switch in view: {}",
                object.key
            )));
        }

        if let Some(vid) = object.vid() {
            self.refs.insert_if_absent(vid);
        }
        for vid in object.attr_vids().into_iter().chain(object.key_vids()) {
            self.refs.insert_if_absent(vid);
            self.refs.increment(vid)?;
        }
        Ok(self.index(object))
    }

    fn index(&mut self, object: SaiObject) -> ObjectIdx {
        let idx = ObjectIdx(self.objects.len());
        self.by_key.insert(object.key.clone(), idx);
        if let Some(vid) = object.vid() {
            self.by_vid.insert(vid, idx);
        }
        self.by_type.entry(object.object_type()).or_default().insert(idx);
        if let Some(sonic_sai::EntryKey::Route(route)) = object.key.entry() {
            self.routes_by_prefix.entry(route.dest).or_default().insert(idx);
        }
        self.objects.push(object);
        idx
    }

    fn unindex(&mut self, idx: ObjectIdx) {
        let object = &self.objects[idx.0];
        self.by_key.remove(&object.key);
        if let Some(vid) = object.vid() {
            self.by_vid.remove(&vid);
        }
        if let Some(set) = self.by_type.get_mut(&object.object_type()) {
            set.remove(&idx);
        }
        if let Some(sonic_sai::EntryKey::Route(route)) = object.key.entry() {
            if let Some(set) = self.routes_by_prefix.get_mut(&route.dest) {
                set.remove(&idx);
            }
        }
    }

    /// Records that `vid` is backed by `rid` on the device.
    pub fn set_identity(&mut self, vid: Vid, rid: Rid) {
        self.vid_to_rid.insert(vid, rid);
        self.rid_to_vid.insert(rid, vid);
        self.refs.insert_if_absent(vid);
    }

    /// Attribute-less stand-in for an object that exists on the device but
    /// was never mentioned by this view.
    pub fn create_dummy_existing_object(&mut self, rid: Rid, vid: Vid) -> Result<ObjectIdx> {
        let object_type = vid
            .object_type()
            .ok_or_else(|| fatal!("cannot create dummy object for {vid}: unknown type"))?;
        let key = ObjectKey::oid(object_type, vid);
        if self.by_key.contains_key(&key) {
            return Err(fatal!("dummy object {key} already exists"));
        }
        self.set_identity(vid, rid);
        Ok(self.index(SaiObject::new(key)))
    }

    pub fn object(&self, idx: ObjectIdx) -> &SaiObject {
        &self.objects[idx.0]
    }

    pub fn object_mut(&mut self, idx: ObjectIdx) -> &mut SaiObject {
        &mut self.objects[idx.0]
    }

    pub fn find(&self, key: &ObjectKey) -> Option<ObjectIdx> {
        self.by_key.get(key).copied()
    }

    pub fn find_vid(&self, vid: Vid) -> Option<ObjectIdx> {
        self.by_vid.get(&vid).copied()
    }

    /// Live objects in key order.
    pub fn live(&self) -> Vec<ObjectIdx> {
        self.by_key.values().copied().collect()
    }

    /// Every object ever held, removed ones included.
    pub fn all(&self) -> impl Iterator<Item = (ObjectIdx, &SaiObject)> {
        self.objects.iter().enumerate().map(|(i, o)| (ObjectIdx(i), o))
    }

    pub fn live_count(&self) -> usize {
        self.by_key.len()
    }

    pub fn objects_of_type(&self, object_type: ObjectType) -> Vec<ObjectIdx> {
        self.by_type
            .get(&object_type)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn not_processed_of_type(&self, object_type: ObjectType) -> Vec<ObjectIdx> {
        self.objects_of_type(object_type)
            .into_iter()
            .filter(|idx| self.object(*idx).status == ObjectStatus::NotProcessed)
            .collect()
    }

    pub fn routes_with_prefix(&self, prefix: &IpPrefix) -> Vec<ObjectIdx> {
        self.routes_by_prefix
            .get(prefix)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn count_by_type(&self) -> BTreeMap<ObjectType, usize> {
        self.by_type
            .iter()
            .filter(|(_, set)| !set.is_empty())
            .map(|(ot, set)| (*ot, set.len()))
            .collect()
    }

    pub fn vid_to_rid(&self, vid: Vid) -> Option<Rid> {
        self.vid_to_rid.get(&vid).copied()
    }

    pub fn rid_to_vid(&self, rid: Rid) -> Option<Vid> {
        self.rid_to_vid.get(&rid).copied()
    }

    pub fn removed_vid_to_rid(&self, vid: Vid) -> Option<Rid> {
        self.removed_vid_to_rid.get(&vid).copied()
    }

    pub fn take_removed_vid(&mut self, vid: Vid) -> Option<Rid> {
        self.removed_vid_to_rid.remove(&vid)
    }

    pub fn has_rid(&self, rid: Rid) -> bool {
        self.rid_to_vid.contains_key(&rid)
    }

    pub fn vid_rid_map(&self) -> &BTreeMap<Vid, Rid> {
        &self.vid_to_rid
    }

    pub fn rid_vid_map(&self) -> &BTreeMap<Rid, Vid> {
        &self.rid_to_vid
    }

    pub fn ref_count(&self, vid: Vid) -> Result<u32> {
        self.refs.count(vid)
    }

    pub fn refs(&self) -> &OidRefCounter {
        &self.refs
    }

    pub fn ops(&self) -> &OperationLog {
        &self.ops
    }

    pub fn pre_match(&self, temp_vid: Vid) -> Option<Vid> {
        self.pre_match.get(&temp_vid).copied()
    }

    pub fn insert_pre_match(&mut self, temp_vid: Vid, current_vid: Vid) {
        self.pre_match.insert(temp_vid, current_vid);
    }

    pub fn pre_match_len(&self) -> usize {
        self.pre_match.len()
    }

    pub fn insert_non_oid_match(&mut self, object_type: ObjectType, from: String, to: String) {
        self.non_oid_map.entry(object_type).or_default().insert(from, to);
    }

    pub fn non_oid_match(&self, object_type: ObjectType, key: &str) -> Option<&str> {
        self.non_oid_map
            .get(&object_type)
            .and_then(|map| map.get(key))
            .map(String::as_str)
    }

    fn release(&mut self, vids: Vec<Vid>, op_id: u64) -> Result<()> {
        for vid in vids {
            if self.refs.decrement(vid)? == 0 && !vid.is_null() {
                self.ops.record_release(vid, op_id);
            }
        }
        Ok(())
    }

    /// Adds `object` to the view and logs its creation. Every VID it
    /// references must already be tracked.
    pub fn asic_create(&mut self, object: SaiObject) -> Result<ObjectIdx> {
        if self.by_key.contains_key(&object.key) {
            return Err(fatal!("cannot create {}, it already exists", object.key));
        }
        self.refs.increment_all(object.attr_vids())?;
        if let Some(vid) = object.vid() {
            self.refs.insert(vid)?;
        } else {
            self.refs.increment_all(object.key_vids())?;
        }

        let id = self.ops.allocate_id();
        self.ops.push(AsicOperation {
            id,
            kind: OpKind::Create,
            key: object.key.clone(),
            attrs: object.attributes().cloned().collect(),
            previous: None,
        });
        Ok(self.index(object))
    }

    /// Removes an unreferenced, not yet processed object and logs it.
    pub fn asic_remove(&mut self, idx: ObjectIdx) -> Result<()> {
        let object = self.object(idx).clone();
        if object.status != ObjectStatus::NotProcessed {
            return Err(fatal!("cannot remove {object}, expected not processed"));
        }

        let id = self.ops.allocate_id();
        if let Some(vid) = object.vid() {
            let count = self.refs.count(vid)?;
            if count != 0 {
                return Err(fatal!("cannot remove {object}, reference count is {count}"));
            }
            self.refs.remove(vid)?;
            if let Some(rid) = self.vid_to_rid.remove(&vid) {
                self.rid_to_vid.remove(&rid);
                self.removed_vid_to_rid.insert(vid, rid);
            }
        } else {
            self.release(object.key_vids(), id)?;
        }
        self.release(object.attr_vids(), id)?;

        self.ops.push(AsicOperation {
            id,
            kind: OpKind::Remove,
            key: object.key.clone(),
            attrs: Vec::new(),
            previous: None,
        });
        self.unindex(idx);
        self.object_mut(idx).status = ObjectStatus::Removed;
        Ok(())
    }

    /// Sets one attribute and logs it, moving references from the old
    /// value to the new one.
    pub fn asic_set(&mut self, idx: ObjectIdx, attr: SaiAttribute) -> Result<()> {
        let previous = self.object(idx).attr(attr.name()).cloned();
        let id = self.ops.allocate_id();

        let old_vids = previous
            .as_ref()
            .map(|p| p.oids().into_iter().map(Vid::from).collect())
            .unwrap_or_default();
        self.release(old_vids, id)?;
        self.refs.increment_all(attr.oids().into_iter().map(Vid::from))?;

        let object = self.object_mut(idx);
        object.attrs.insert(attr.name(), attr.clone());
        let key = object.key.clone();
        self.ops.push(AsicOperation {
            id,
            kind: OpKind::Set,
            key,
            attrs: vec![attr],
            previous,
        });
        Ok(())
    }

    /// Every object must be `Final` or `Removed`.
    pub fn check_objects_status(&self, label: &str) -> Result<()> {
        let pending: Vec<&SaiObject> = self
            .objects
            .iter()
            .filter(|o| !o.status.is_terminal())
            .collect();
        for object in pending.iter().take(16) {
            warn!("{label}: {object} did not reach a final state");
        }
        if pending.is_empty() {
            Ok(())
        } else {
            Err(fatal!(
                "{label} view has {} objects in non-final state",
                pending.len()
            ))
        }
    }

    /// The same objects and identity maps with run state cleared, ready to
    /// be the current view of the next run.
    pub fn into_baseline(self) -> Result<AsicView> {
        let mut baseline = AsicView::new();
        for (vid, rid) in &self.vid_to_rid {
            baseline.set_identity(*vid, *rid);
        }
        for idx in self.by_key.values() {
            let mut object = self.objects[idx.0].clone();
            object.status = ObjectStatus::NotProcessed;
            object.created = false;
            baseline.insert_object(object)?;
        }
        Ok(baseline)
    }
}
