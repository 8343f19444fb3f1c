//! In-memory virtual switch.
//!
//! Implements [`SaiInterface`] over a plain object table. It allocates real
//! ids, tracks which objects reference which, refuses to remove referenced
//! objects, and can be told to fail specific calls.

use log::debug;
use std::collections::{BTreeMap, HashMap};

use crate::api::SaiInterface;
use crate::entry::{EntryKey, ObjectKey};
use crate::error::{SaiError, SaiResult, SaiStatus};
use crate::meta::{AttrMeta, SaiAttribute};
use crate::types::{ObjectType, Oid, Rid};

/// Global context bits stamped on ids allocated by the virtual switch.
const VS_CONTEXT: u8 = 0x01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceOp {
    Create,
    Remove,
    Set,
    Get,
}

/// A call observed by the virtual switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCall {
    pub op: DeviceOp,
    pub key: ObjectKey,
    /// `name=value` of every attribute passed with the call.
    pub attrs: Vec<String>,
}

#[derive(Debug, Clone)]
struct Fault {
    op: DeviceOp,
    object_type: Option<ObjectType>,
    status: SaiStatus,
}

#[derive(Debug, Clone, Default)]
struct StoredObject {
    attrs: BTreeMap<&'static str, SaiAttribute>,
}

#[derive(Debug, Clone)]
pub struct VirtualSwitch {
    switch_index: u8,
    objects: BTreeMap<ObjectKey, StoredObject>,
    next_index: HashMap<ObjectType, u64>,
    references: HashMap<Oid, u32>,
    faults: Vec<Fault>,
    calls: Vec<DeviceCall>,
}

impl Default for VirtualSwitch {
    fn default() -> Self {
        Self::new(0)
    }
}

impl VirtualSwitch {
    pub fn new(switch_index: u8) -> Self {
        Self {
            switch_index,
            objects: BTreeMap::new(),
            next_index: HashMap::new(),
            references: HashMap::new(),
            faults: Vec::new(),
            calls: Vec::new(),
        }
    }

    fn allocate(&mut self, object_type: ObjectType) -> Rid {
        let next = self.next_index.entry(object_type).or_insert(0);
        *next += 1;
        if object_type == ObjectType::Switch {
            return Rid::compose(self.switch_index, object_type, VS_CONTEXT, 0);
        }
        Rid::compose(self.switch_index, object_type, VS_CONTEXT, *next)
    }

    /// Seeds an object the way switch init discovers it; no call is logged.
    pub fn insert_existing(&mut self, object_type: ObjectType, attrs: Vec<SaiAttribute>) -> Rid {
        let rid = self.allocate(object_type);
        let key = ObjectKey::oid(object_type, rid);
        self.store(key, &attrs);
        rid
    }

    /// Makes every later `op` on `object_type` (any type when `None`) fail.
    pub fn inject_fault(&mut self, op: DeviceOp, object_type: Option<ObjectType>, status: SaiStatus) {
        self.faults.push(Fault {
            op,
            object_type,
            status,
        });
    }

    pub fn clear_faults(&mut self) {
        self.faults.clear();
    }

    pub fn calls(&self) -> &[DeviceCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn contains(&self, key: &ObjectKey) -> bool {
        self.objects.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &ObjectKey> {
        self.objects.keys()
    }

    /// Number of stored attributes referencing `oid`.
    pub fn reference_count(&self, oid: impl Into<Oid>) -> u32 {
        self.references.get(&oid.into()).copied().unwrap_or(0)
    }

    pub fn attribute(&self, key: &ObjectKey, name: &str) -> Option<&SaiAttribute> {
        self.objects.get(key).and_then(|o| o.attrs.get(name))
    }

    fn check_fault(&self, op: DeviceOp, object_type: ObjectType) -> SaiResult<()> {
        match self
            .faults
            .iter()
            .find(|f| f.op == op && f.object_type.map_or(true, |t| t == object_type))
        {
            Some(fault) => Err(SaiError::status(
                fault.status,
                format!("injected {op:?} failure on {object_type}"),
            )),
            None => Ok(()),
        }
    }

    fn record(&mut self, op: DeviceOp, key: &ObjectKey, attrs: &[SaiAttribute]) {
        self.calls.push(DeviceCall {
            op,
            key: key.clone(),
            attrs: attrs.iter().map(|a| a.to_string()).collect(),
        });
    }

    fn exists(&self, oid: Oid) -> bool {
        match oid.object_type() {
            Some(object_type) => self.objects.contains_key(&ObjectKey::oid(object_type, oid)),
            None => false,
        }
    }

    fn check_references(&self, oids: impl IntoIterator<Item = Oid>) -> SaiResult<()> {
        for oid in oids {
            if !oid.is_null() && !self.exists(oid) {
                return Err(SaiError::status(
                    SaiStatus::InvalidObjectId,
                    format!("{oid} does not exist"),
                ));
            }
        }
        Ok(())
    }

    fn add_refs(&mut self, oids: &[Oid]) {
        for oid in oids.iter().filter(|o| !o.is_null()) {
            *self.references.entry(*oid).or_insert(0) += 1;
        }
    }

    fn drop_refs(&mut self, oids: &[Oid]) {
        for oid in oids.iter().filter(|o| !o.is_null()) {
            if let Some(count) = self.references.get_mut(oid) {
                *count = count.saturating_sub(1);
            }
        }
    }

    fn store(&mut self, key: ObjectKey, attrs: &[SaiAttribute]) {
        let mut oids: Vec<Oid> = attrs.iter().flat_map(|a| a.oids()).collect();
        if let ObjectKey::Entry(entry) = &key {
            oids.extend(entry.oids());
        }
        self.add_refs(&oids);
        let stored = StoredObject {
            attrs: attrs.iter().map(|a| (a.name(), a.clone())).collect(),
        };
        self.objects.insert(key, stored);
    }
}

impl SaiInterface for VirtualSwitch {
    fn create(
        &mut self,
        object_type: ObjectType,
        switch_id: Rid,
        attrs: &[SaiAttribute],
    ) -> SaiResult<Rid> {
        if object_type.is_non_object_id() || object_type == ObjectType::Null {
            return Err(SaiError::invalid_parameter(format!(
                "{object_type} cannot be created by id"
            )));
        }
        if object_type != ObjectType::Switch {
            self.check_references([Oid::from(switch_id)])?;
        }
        self.check_fault(DeviceOp::Create, object_type)?;
        self.check_references(attrs.iter().flat_map(|a| a.oids()))?;

        let rid = self.allocate(object_type);
        let key = ObjectKey::oid(object_type, rid);
        debug!("vs: create {key}");
        self.record(DeviceOp::Create, &key, attrs);
        self.store(key, attrs);
        Ok(rid)
    }

    fn create_entry(&mut self, entry: &EntryKey, attrs: &[SaiAttribute]) -> SaiResult<()> {
        let key = ObjectKey::Entry(entry.clone());
        if self.objects.contains_key(&key) {
            return Err(SaiError::status(SaiStatus::ItemAlreadyExists, key.to_string()));
        }
        self.check_references(entry.oids())?;
        self.check_fault(DeviceOp::Create, entry.object_type())?;
        self.check_references(attrs.iter().flat_map(|a| a.oids()))?;

        debug!("vs: create {key}");
        self.record(DeviceOp::Create, &key, attrs);
        self.store(key, attrs);
        Ok(())
    }

    fn remove(&mut self, key: &ObjectKey) -> SaiResult<()> {
        if !self.objects.contains_key(key) {
            return Err(SaiError::status(SaiStatus::ItemNotFound, key.to_string()));
        }
        if let Some(oid) = key.object_id() {
            if self.reference_count(oid) > 0 {
                return Err(SaiError::status(SaiStatus::ObjectInUse, key.to_string()));
            }
        }
        self.check_fault(DeviceOp::Remove, key.object_type())?;

        debug!("vs: remove {key}");
        self.record(DeviceOp::Remove, key, &[]);
        if let Some(stored) = self.objects.remove(key) {
            let mut oids: Vec<Oid> = stored.attrs.values().flat_map(|a| a.oids()).collect();
            if let ObjectKey::Entry(entry) = key {
                oids.extend(entry.oids());
            }
            self.drop_refs(&oids);
        }
        if let Some(oid) = key.object_id() {
            self.references.remove(&oid);
        }
        Ok(())
    }

    fn set(&mut self, key: &ObjectKey, attr: &SaiAttribute) -> SaiResult<()> {
        if !self.objects.contains_key(key) {
            return Err(SaiError::status(SaiStatus::ItemNotFound, key.to_string()));
        }
        if !attr.meta.is_settable() {
            return Err(SaiError::status(
                SaiStatus::InvalidAttribute,
                format!("{} is not settable", attr.name()),
            ));
        }
        self.check_references(attr.oids())?;
        self.check_fault(DeviceOp::Set, key.object_type())?;

        debug!("vs: set {key} {attr}");
        self.record(DeviceOp::Set, key, std::slice::from_ref(attr));
        let previous = self
            .objects
            .get_mut(key)
            .and_then(|o| o.attrs.insert(attr.name(), attr.clone()));
        if let Some(previous) = previous {
            self.drop_refs(&previous.oids());
        }
        self.add_refs(&attr.oids());
        Ok(())
    }

    fn get(&self, key: &ObjectKey, attrs: &[&'static AttrMeta]) -> SaiResult<Vec<SaiAttribute>> {
        self.check_fault(DeviceOp::Get, key.object_type())?;
        let stored = self
            .objects
            .get(key)
            .ok_or_else(|| SaiError::status(SaiStatus::ItemNotFound, key.to_string()))?;
        Ok(attrs
            .iter()
            .filter_map(|meta| stored.attrs.get(meta.name).cloned())
            .collect())
    }

    fn object_type_query(&self, oid: Rid) -> ObjectType {
        oid.object_type().unwrap_or(ObjectType::Null)
    }

    fn switch_id_query(&self, oid: Rid) -> Rid {
        oid.switch_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::BulkOpErrorMode;
    use crate::entry::{IpPrefix, RouteEntry};
    use pretty_assertions::assert_eq;

    fn attr(ot: ObjectType, name: &str, text: &str) -> SaiAttribute {
        SaiAttribute::from_text(ot, name, text).unwrap()
    }

    fn switch_with_vr(vs: &mut VirtualSwitch) -> (Rid, Rid) {
        let switch = vs.insert_existing(
            ObjectType::Switch,
            vec![attr(ObjectType::Switch, "SAI_SWITCH_ATTR_INIT_SWITCH", "true")],
        );
        let vr = vs.insert_existing(ObjectType::VirtualRouter, Vec::new());
        (switch, vr)
    }

    #[test]
    fn test_create_assigns_typed_ids() {
        let mut vs = VirtualSwitch::default();
        let (switch, _) = switch_with_vr(&mut vs);
        let nhg = vs
            .create(
                ObjectType::NextHopGroup,
                switch,
                &[attr(
                    ObjectType::NextHopGroup,
                    "SAI_NEXT_HOP_GROUP_ATTR_TYPE",
                    "SAI_NEXT_HOP_GROUP_TYPE_ECMP",
                )],
            )
            .unwrap();
        assert_eq!(vs.object_type_query(nhg), ObjectType::NextHopGroup);
        assert_eq!(vs.switch_id_query(nhg), switch);
        assert_eq!(vs.calls().len(), 1);
    }

    #[test]
    fn test_remove_referenced_object_is_rejected() {
        let mut vs = VirtualSwitch::default();
        let (switch, vr) = switch_with_vr(&mut vs);
        let route = EntryKey::Route(RouteEntry {
            dest: "10.0.0.0/24".parse::<IpPrefix>().unwrap(),
            switch_id: switch.into(),
            vr: vr.into(),
        });
        vs.create_entry(&route, &[]).unwrap();
        assert_eq!(vs.reference_count(vr), 1);

        let vr_key = ObjectKey::oid(ObjectType::VirtualRouter, vr);
        let err = vs.remove(&vr_key).unwrap_err();
        assert_eq!(err.to_status(), SaiStatus::ObjectInUse);

        vs.remove(&ObjectKey::Entry(route)).unwrap();
        assert_eq!(vs.reference_count(vr), 0);
        vs.remove(&vr_key).unwrap();
    }

    #[test]
    fn test_unknown_reference_is_rejected() {
        let mut vs = VirtualSwitch::default();
        let (switch, _) = switch_with_vr(&mut vs);
        let missing = Rid::compose(0, ObjectType::NextHop, VS_CONTEXT, 42);
        let err = vs
            .create(
                ObjectType::NextHopGroupMember,
                switch,
                &[attr(
                    ObjectType::NextHopGroupMember,
                    "SAI_NEXT_HOP_GROUP_MEMBER_ATTR_NEXT_HOP_ID",
                    &missing.to_string(),
                )],
            )
            .unwrap_err();
        assert_eq!(err.to_status(), SaiStatus::InvalidObjectId);
    }

    #[test]
    fn test_set_moves_references() {
        let mut vs = VirtualSwitch::default();
        let (switch, _) = switch_with_vr(&mut vs);
        let p1 = vs.insert_existing(ObjectType::Policer, Vec::new());
        let p2 = vs.insert_existing(ObjectType::Policer, Vec::new());
        let group = vs.create(ObjectType::HostifTrapGroup, switch, &[]).unwrap();
        let key = ObjectKey::oid(ObjectType::HostifTrapGroup, group);
        let name = "SAI_HOSTIF_TRAP_GROUP_ATTR_POLICER";

        vs.set(&key, &attr(ObjectType::HostifTrapGroup, name, &p1.to_string())).unwrap();
        assert_eq!(vs.reference_count(p1), 1);
        vs.set(&key, &attr(ObjectType::HostifTrapGroup, name, &p2.to_string())).unwrap();
        assert_eq!(vs.reference_count(p1), 0);
        assert_eq!(vs.reference_count(p2), 1);
    }

    #[test]
    fn test_create_only_attribute_cannot_be_set() {
        let mut vs = VirtualSwitch::default();
        let (_, vr) = switch_with_vr(&mut vs);
        let key = ObjectKey::oid(ObjectType::VirtualRouter, vr);
        let bogus = attr(ObjectType::Port, "SAI_PORT_ATTR_HW_LANE_LIST", "1:1");
        let err = vs.set(&key, &bogus).unwrap_err();
        assert_eq!(err.to_status(), SaiStatus::InvalidAttribute);
    }

    #[test]
    fn test_injected_fault_and_bulk() {
        let mut vs = VirtualSwitch::default();
        let (switch, _) = switch_with_vr(&mut vs);
        vs.inject_fault(DeviceOp::Create, Some(ObjectType::Policer), SaiStatus::TableFull);
        let lists = vec![Vec::new(), Vec::new()];
        let response = vs.bulk_create(ObjectType::Policer, switch, &lists, BulkOpErrorMode::IgnoreError);
        assert_eq!(response.status, SaiStatus::Success);
        assert_eq!(response.object_statuses, vec![SaiStatus::TableFull, SaiStatus::TableFull]);
        assert!(response.object_ids.iter().all(|id| id.is_null()));

        vs.clear_faults();
        let response = vs.bulk_create(ObjectType::Policer, switch, &lists, BulkOpErrorMode::StopOnError);
        assert_eq!(response.status, SaiStatus::Success);
        assert_eq!(response.object_ids.len(), 2);
    }

    #[test]
    fn test_get_returns_present_attributes_only() {
        let mut vs = VirtualSwitch::default();
        let (switch, _) = switch_with_vr(&mut vs);
        let key = ObjectKey::oid(ObjectType::Switch, switch);
        let metas: Vec<&'static AttrMeta> = crate::meta::attributes(ObjectType::Switch).iter().collect();
        let attrs = vs.get(&key, &metas).unwrap();
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].name(), "SAI_SWITCH_ATTR_INIT_SWITCH");
    }
}
