//! Replays the operation log of a compared view against the device.
//!
//! Operations are recorded in VID identity. Every key and OID attribute is
//! translated to the RID space right before the call; objects created here
//! get their new RID bound in both views so that later operations and the
//! next run can address them. Any device failure is fatal: by the time an
//! operation fails, earlier ones have already changed the hardware.

use log::{debug, info};
use sonic_sai::{
    BulkOpErrorMode, BulkResponse, EntryKey, ObjectKey, ObjectType, Oid, Rid, SaiAttribute,
    SaiInterface, Vid,
};
use std::collections::{BTreeMap, BTreeSet};

use crate::config::ExecutionConfig;
use crate::error::Result;
use crate::fatal;
use crate::switch::SwitchContext;
use crate::view::{AsicOperation, AsicView, OpKind};

pub struct AsicExecutor<'a, S: SaiInterface + ?Sized> {
    sai: &'a mut S,
    current: &'a mut AsicView,
    temp: &'a mut AsicView,
    switch: &'a mut SwitchContext,
    config: &'a ExecutionConfig,
    counts: BTreeMap<(OpKind, ObjectType), usize>,
}

impl<'a, S: SaiInterface + ?Sized> AsicExecutor<'a, S> {
    pub fn new(
        sai: &'a mut S,
        current: &'a mut AsicView,
        temp: &'a mut AsicView,
        switch: &'a mut SwitchContext,
        config: &'a ExecutionConfig,
    ) -> Self {
        Self {
            sai,
            current,
            temp,
            switch,
            config,
            counts: BTreeMap::new(),
        }
    }

    /// Executes `ops` in order and returns how many reached the device.
    pub fn execute(mut self, ops: Vec<AsicOperation>) -> Result<usize> {
        let total = ops.len();
        info!("executing {total} asic operations");

        if self.config.use_bulk {
            let mut batch: Vec<AsicOperation> = Vec::new();
            for op in ops {
                if batch.first().is_some_and(|first| !same_batch(first, &op))
                    || depends_on_batch(&batch, &op)
                {
                    self.flush(std::mem::take(&mut batch))?;
                }
                batch.push(op);
            }
            self.flush(batch)?;
        } else {
            for op in &ops {
                self.execute_single(op)?;
            }
        }

        for ((kind, object_type), count) in &self.counts {
            info!("{kind} {object_type}: {count}");
        }
        Ok(total)
    }

    fn count(&mut self, op: &AsicOperation) {
        *self
            .counts
            .entry((op.kind, op.key.object_type()))
            .or_default() += 1;
    }

    fn translate_vid(&self, vid: Vid) -> Result<Rid> {
        if vid.is_null() {
            return Ok(Rid::NULL);
        }
        self.current
            .vid_to_rid(vid)
            .or_else(|| self.current.removed_vid_to_rid(vid))
            .ok_or_else(|| fatal!("{vid} has no rid"))
    }

    fn translate_oid(&self, oid: Oid) -> Result<Oid> {
        self.translate_vid(Vid::from(oid)).map(Oid::from)
    }

    fn translate_key(&self, key: &ObjectKey) -> Result<ObjectKey> {
        key.try_map_oids(|oid| self.translate_oid(oid))
    }

    fn translate_attrs(&self, attrs: &[SaiAttribute]) -> Result<Vec<SaiAttribute>> {
        attrs
            .iter()
            .map(|attr| attr.try_map_oids(|oid| self.translate_oid(oid)))
            .collect()
    }

    fn switch_rid_for(&self, object_type: ObjectType, vid: Vid) -> Result<Rid> {
        if object_type == ObjectType::Switch {
            return Ok(Rid::NULL);
        }
        self.translate_vid(vid.switch_id())
    }

    fn bind(&mut self, vid: Vid, rid: Rid) {
        debug!("bound {vid} to {rid}");
        self.current.set_identity(vid, rid);
        self.temp.set_identity(vid, rid);
    }

    fn after_remove(&mut self, key: &ObjectKey, rid_key: &ObjectKey) {
        if let (Some(vid), Some(rid)) = (key.object_id(), rid_key.object_id()) {
            self.current.take_removed_vid(Vid::from(vid));
            let rid = Rid::from(rid);
            if self.switch.is_discovered(rid) {
                debug!("discovered {rid} removed");
                self.switch.remove_discovered(rid);
            }
        }
    }

    fn execute_single(&mut self, op: &AsicOperation) -> Result<()> {
        self.count(op);
        let object_type = op.key.object_type();
        match op.kind {
            OpKind::Create => {
                let attrs = self.translate_attrs(&op.attrs)?;
                match &op.key {
                    ObjectKey::Oid { oid, .. } => {
                        let vid = Vid::from(*oid);
                        let switch_rid = self.switch_rid_for(object_type, vid)?;
                        let rid = self
                            .sai
                            .create(object_type, switch_rid, &attrs)
                            .map_err(|e| fatal!("{op} failed: {e}"))?;
                        self.bind(vid, rid);
                    }
                    ObjectKey::Entry(entry) => {
                        let entry = self.translate_entry(entry)?;
                        self.sai
                            .create_entry(&entry, &attrs)
                            .map_err(|e| fatal!("{op} failed: {e}"))?;
                    }
                }
            }
            OpKind::Remove => {
                let rid_key = self.translate_key(&op.key)?;
                self.sai
                    .remove(&rid_key)
                    .map_err(|e| fatal!("{op} failed: {e}"))?;
                self.after_remove(&op.key, &rid_key);
            }
            OpKind::Set => {
                let rid_key = self.translate_key(&op.key)?;
                for attr in self.translate_attrs(&op.attrs)? {
                    self.sai
                        .set(&rid_key, &attr)
                        .map_err(|e| fatal!("{op} failed: {e}"))?;
                }
            }
        }
        Ok(())
    }

    fn translate_entry(&self, entry: &EntryKey) -> Result<EntryKey> {
        entry.try_map_oids(|oid| self.translate_oid(oid))
    }

    fn flush(&mut self, batch: Vec<AsicOperation>) -> Result<()> {
        let Some(first) = batch.first() else {
            return Ok(());
        };
        if batch.len() == 1 {
            return self.execute_single(first);
        }

        let kind = first.kind;
        let object_type = first.key.object_type();
        debug!("bulk {kind} of {} {object_type}", batch.len());
        for op in &batch {
            self.count(op);
        }
        let mode = BulkOpErrorMode::StopOnError;

        match kind {
            OpKind::Create if first.key.entry().is_none() => {
                let vid = first.key.object_id().map(Vid::from).unwrap_or_default();
                let switch_rid = self.switch_rid_for(object_type, vid)?;
                let lists = batch
                    .iter()
                    .map(|op| self.translate_attrs(&op.attrs))
                    .collect::<Result<Vec<_>>>()?;
                let response = self.sai.bulk_create(object_type, switch_rid, &lists, mode);
                check_bulk(&response, batch.len(), |index| {
                    batch.get(index).map(|op| op.to_string())
                })?;
                for (op, rid) in batch.iter().zip(response.object_ids) {
                    if let Some(oid) = op.key.object_id() {
                        self.bind(Vid::from(oid), rid);
                    }
                }
            }
            OpKind::Create => {
                let entries = batch
                    .iter()
                    .map(|op| {
                        let entry = op
                            .key
                            .entry()
                            .ok_or_else(|| fatal!("{} is not an entry", op.key))?;
                        Ok((self.translate_entry(entry)?, self.translate_attrs(&op.attrs)?))
                    })
                    .collect::<Result<Vec<_>>>()?;
                let response = self.sai.bulk_create_entries(&entries, mode);
                check_bulk(&response, batch.len(), |index| {
                    batch.get(index).map(|op| op.to_string())
                })?;
            }
            OpKind::Remove => {
                let keys = batch
                    .iter()
                    .map(|op| self.translate_key(&op.key))
                    .collect::<Result<Vec<_>>>()?;
                let response = self.sai.bulk_remove(&keys, mode);
                check_bulk(&response, batch.len(), |index| {
                    batch.get(index).map(|op| op.to_string())
                })?;
                for (op, rid_key) in batch.iter().zip(&keys) {
                    self.after_remove(&op.key, rid_key);
                }
            }
            OpKind::Set => {
                let mut items = Vec::with_capacity(batch.len());
                for op in &batch {
                    let rid_key = self.translate_key(&op.key)?;
                    for attr in self.translate_attrs(&op.attrs)? {
                        items.push((rid_key.clone(), attr));
                    }
                }
                let response = self.sai.bulk_set(&items, mode);
                check_bulk(&response, items.len(), |index| {
                    items.get(index).map(|(key, attr)| format!("set {key} {attr}"))
                })?;
            }
        }
        Ok(())
    }
}

fn same_batch(first: &AsicOperation, op: &AsicOperation) -> bool {
    first.kind == op.kind
        && first.key.object_type() == op.key.object_type()
        && first.key.entry().is_some() == op.key.entry().is_some()
}

/// Whether `op` points at an object a pending bulk create has not made yet.
fn depends_on_batch(batch: &[AsicOperation], op: &AsicOperation) -> bool {
    let pending: BTreeSet<Oid> = batch
        .iter()
        .filter(|b| b.kind == OpKind::Create)
        .filter_map(|b| b.key.object_id())
        .collect();
    if pending.is_empty() {
        return false;
    }
    let key_oids = match &op.key {
        ObjectKey::Entry(entry) => entry.oids(),
        ObjectKey::Oid { .. } => Vec::new(),
    };
    key_oids
        .into_iter()
        .chain(op.attrs.iter().flat_map(|a| a.oids()))
        .any(|oid| pending.contains(&oid))
}

/// Fails on the first failed item, then on the overall status. `describe`
/// names a requested item; statuses past the request are reported by index.
fn check_bulk(
    response: &BulkResponse,
    requested: usize,
    describe: impl Fn(usize) -> Option<String>,
) -> Result<()> {
    let failed = response.failed_items().next();
    if let Some((index, status)) = failed {
        let item = describe(index).unwrap_or_else(|| format!("item {index} of {requested}"));
        return Err(fatal!("bulk {item} failed: {status}"));
    }
    if !response.status.is_success() {
        return Err(fatal!(
            "bulk call of {requested} items failed: {}",
            response.status
        ));
    }
    Ok(())
}

/// Reads every object of `view` back from the device and compares it with
/// the view. Mismatches are logged; the result tells whether there were any.
pub fn check_consistency<S: SaiInterface + ?Sized>(sai: &S, view: &AsicView) -> Result<bool> {
    let translate = |oid: Oid| -> Result<Oid> {
        let vid = Vid::from(oid);
        if vid.is_null() {
            return Ok(Oid::NULL);
        }
        view.vid_to_rid(vid)
            .map(Oid::from)
            .ok_or_else(|| fatal!("{vid} has no rid"))
    };

    let mut consistent = true;
    for idx in view.live() {
        let object = view.object(idx);
        let rid_key = object.key.try_map_oids(translate)?;
        let metas: Vec<_> = object.attributes().map(|a| a.meta).collect();
        let read = sai
            .get(&rid_key, &metas)
            .map_err(|e| fatal!("get {rid_key} failed: {e}"))?;

        for attr in object.attributes() {
            let expected = attr.try_map_oids(translate)?;
            match read.iter().find(|r| r.name() == attr.name()) {
                Some(actual) if actual.value.equivalent(&expected.value) => {}
                Some(actual) => {
                    log::error!(
                        "{} {}: device has {}, view has {}",
                        object.key,
                        attr.name(),
                        actual.value,
                        expected.value
                    );
                    consistent = false;
                }
                None => {
                    log::error!("{} {}: missing on device", object.key, attr.name());
                    consistent = false;
                }
            }
        }
    }

    if consistent {
        info!("device is consistent with the view");
    }
    Ok(consistent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sonic_sai::vs::{DeviceOp, VirtualSwitch};
    use sonic_sai::SaiStatus;

    fn attr(ot: ObjectType, name: &str, text: &str) -> SaiAttribute {
        SaiAttribute::from_text(ot, name, text).unwrap()
    }

    fn op(id: u64, kind: OpKind, key: ObjectKey, attrs: Vec<SaiAttribute>) -> AsicOperation {
        AsicOperation {
            id,
            kind,
            key,
            attrs,
            previous: None,
        }
    }

    struct Fixture {
        vs: VirtualSwitch,
        current: AsicView,
        temp: AsicView,
        switch: SwitchContext,
    }

    fn fixture() -> Fixture {
        let mut vs = VirtualSwitch::new(0);
        let switch_rid = vs.insert_existing(ObjectType::Switch, Vec::new());
        let switch_vid = Vid::compose(0, ObjectType::Switch, 0, 0);
        let mut current = AsicView::new();
        let mut temp = AsicView::new();
        current.set_identity(switch_vid, switch_rid);
        temp.set_identity(switch_vid, switch_rid);
        Fixture {
            vs,
            current,
            temp,
            switch: SwitchContext::new(switch_vid, switch_rid),
        }
    }

    fn run(f: &mut Fixture, ops: Vec<AsicOperation>, config: &ExecutionConfig) -> Result<usize> {
        AsicExecutor::new(&mut f.vs, &mut f.current, &mut f.temp, &mut f.switch, config)
            .execute(ops)
    }

    #[test]
    fn test_create_binds_identity_in_both_views() {
        let mut f = fixture();
        let policer = Vid::compose(0, ObjectType::Policer, 0, 7);
        let ops = vec![op(
            1,
            OpKind::Create,
            ObjectKey::oid(ObjectType::Policer, policer),
            vec![attr(ObjectType::Policer, "SAI_POLICER_ATTR_CIR", "100")],
        )];

        assert_eq!(run(&mut f, ops, &ExecutionConfig::default()).unwrap(), 1);
        let rid = f.current.vid_to_rid(policer).unwrap();
        assert_eq!(f.temp.vid_to_rid(policer), Some(rid));
        let key = ObjectKey::oid(ObjectType::Policer, rid);
        assert!(f.vs.contains(&key));
        assert_eq!(
            f.vs.attribute(&key, "SAI_POLICER_ATTR_CIR").unwrap().value.to_string(),
            "100"
        );
    }

    #[test]
    fn test_oid_attributes_are_translated() {
        let mut f = fixture();
        let vr = Vid::compose(0, ObjectType::VirtualRouter, 0, 1);
        let rif = Vid::compose(0, ObjectType::RouterInterface, 0, 2);
        let ops = vec![
            op(1, OpKind::Create, ObjectKey::oid(ObjectType::VirtualRouter, vr), Vec::new()),
            op(
                2,
                OpKind::Create,
                ObjectKey::oid(ObjectType::RouterInterface, rif),
                vec![
                    attr(
                        ObjectType::RouterInterface,
                        "SAI_ROUTER_INTERFACE_ATTR_VIRTUAL_ROUTER_ID",
                        &vr.to_string(),
                    ),
                    attr(
                        ObjectType::RouterInterface,
                        "SAI_ROUTER_INTERFACE_ATTR_TYPE",
                        "SAI_ROUTER_INTERFACE_TYPE_LOOPBACK",
                    ),
                ],
            ),
        ];
        run(&mut f, ops, &ExecutionConfig::default()).unwrap();

        let vr_rid = f.current.vid_to_rid(vr).unwrap();
        let rif_rid = f.current.vid_to_rid(rif).unwrap();
        let stored = f
            .vs
            .attribute(
                &ObjectKey::oid(ObjectType::RouterInterface, rif_rid),
                "SAI_ROUTER_INTERFACE_ATTR_VIRTUAL_ROUTER_ID",
            )
            .unwrap();
        assert_eq!(stored.value.to_string(), vr_rid.to_string());
        assert_eq!(f.vs.reference_count(vr_rid), 1);
    }

    #[test]
    fn test_remove_uses_removed_identity() {
        let mut f = fixture();
        let rid = f.vs.insert_existing(ObjectType::Policer, Vec::new());
        let vid = Vid::compose(0, ObjectType::Policer, 0, 3);
        f.current.set_identity(vid, rid);
        f.switch.add_discovered_rid(rid);

        // The comparison moved the identity aside when it removed the object.
        let idx = f
            .current
            .insert_object(crate::view::SaiObject::new(ObjectKey::oid(ObjectType::Policer, vid)))
            .unwrap();
        f.current.asic_remove(idx).unwrap();
        assert_eq!(f.current.vid_to_rid(vid), None);

        let ops = vec![op(1, OpKind::Remove, ObjectKey::oid(ObjectType::Policer, vid), Vec::new())];
        run(&mut f, ops, &ExecutionConfig::default()).unwrap();
        assert!(!f.vs.contains(&ObjectKey::oid(ObjectType::Policer, rid)));
        assert_eq!(f.current.removed_vid_to_rid(vid), None);
        assert!(!f.switch.is_discovered(rid));
    }

    #[test]
    fn test_unknown_vid_is_fatal() {
        let mut f = fixture();
        let ghost = Vid::compose(0, ObjectType::Policer, 0, 99);
        let ops = vec![op(
            1,
            OpKind::Set,
            ObjectKey::oid(ObjectType::Policer, ghost),
            vec![attr(ObjectType::Policer, "SAI_POLICER_ATTR_CIR", "1")],
        )];
        let err = run(&mut f, ops, &ExecutionConfig::default()).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(f.vs.calls().len(), 0);
    }

    #[test]
    fn test_device_failure_is_fatal() {
        let mut f = fixture();
        f.vs.inject_fault(DeviceOp::Create, Some(ObjectType::Policer), SaiStatus::TableFull);
        let ops = vec![op(
            1,
            OpKind::Create,
            ObjectKey::oid(ObjectType::Policer, Vid::compose(0, ObjectType::Policer, 0, 1)),
            Vec::new(),
        )];
        assert!(run(&mut f, ops, &ExecutionConfig::default()).unwrap_err().is_fatal());
    }

    #[test]
    fn test_bulk_flushes_before_dependent_create() {
        let mut f = fixture();
        let root = Vid::compose(0, ObjectType::SchedulerGroup, 0, 1);
        let child = Vid::compose(0, ObjectType::SchedulerGroup, 0, 2);
        let third = Vid::compose(0, ObjectType::SchedulerGroup, 0, 3);
        let ops = vec![
            op(1, OpKind::Create, ObjectKey::oid(ObjectType::SchedulerGroup, root), Vec::new()),
            op(
                2,
                OpKind::Create,
                ObjectKey::oid(ObjectType::SchedulerGroup, child),
                vec![attr(
                    ObjectType::SchedulerGroup,
                    "SAI_SCHEDULER_GROUP_ATTR_PARENT_NODE",
                    &root.to_string(),
                )],
            ),
            op(3, OpKind::Create, ObjectKey::oid(ObjectType::SchedulerGroup, third), Vec::new()),
        ];
        let config = ExecutionConfig {
            use_bulk: true,
            ..ExecutionConfig::default()
        };

        assert_eq!(run(&mut f, ops, &config).unwrap(), 3);
        let root_rid = f.current.vid_to_rid(root).unwrap();
        assert_eq!(f.vs.reference_count(root_rid), 1);
        assert!(f.current.vid_to_rid(third).is_some());
    }

    #[test]
    fn test_consistency_check_detects_drift() {
        let mut f = fixture();
        let vid = Vid::compose(0, ObjectType::Policer, 0, 1);
        let ops = vec![op(
            1,
            OpKind::Create,
            ObjectKey::oid(ObjectType::Policer, vid),
            vec![attr(ObjectType::Policer, "SAI_POLICER_ATTR_CIR", "100")],
        )];
        run(&mut f, ops, &ExecutionConfig::default()).unwrap();

        let mut object = crate::view::SaiObject::new(ObjectKey::oid(ObjectType::Policer, vid));
        let cir = attr(ObjectType::Policer, "SAI_POLICER_ATTR_CIR", "100");
        object.attrs.insert(cir.name(), cir);
        f.temp.insert_object(object).unwrap();
        assert!(check_consistency(&f.vs, &f.temp).unwrap());

        let rid = f.temp.vid_to_rid(vid).unwrap();
        f.vs.set(
            &ObjectKey::oid(ObjectType::Policer, rid),
            &attr(ObjectType::Policer, "SAI_POLICER_ATTR_CIR", "5"),
        )
        .unwrap();
        assert!(!check_consistency(&f.vs, &f.temp).unwrap());
    }

    fn response(status: SaiStatus, items: &[SaiStatus]) -> BulkResponse {
        BulkResponse {
            status,
            object_statuses: items.to_vec(),
            object_ids: Vec::new(),
        }
    }

    #[test]
    fn test_bulk_overall_failure_is_fatal_with_successful_items() {
        let response = response(SaiStatus::Failure, &[SaiStatus::Success, SaiStatus::Success]);
        let err = check_bulk(&response, 2, |i| Some(format!("set {i}"))).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(err.to_string(), "Fatal: bulk call of 2 items failed: SAI_STATUS_FAILURE");
    }

    #[test]
    fn test_bulk_status_past_the_request_does_not_panic() {
        let batch = vec!["only".to_string()];
        let response = response(
            SaiStatus::Failure,
            &[SaiStatus::Success, SaiStatus::InvalidParameter],
        );
        let err = check_bulk(&response, batch.len(), |i| batch.get(i).cloned()).unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("item 1 of 1"), "{err}");
    }

    #[test]
    fn test_bulk_success() {
        let response = response(SaiStatus::Success, &[SaiStatus::Success]);
        assert!(check_bulk(&response, 1, |_| None).is_ok());
    }
}
