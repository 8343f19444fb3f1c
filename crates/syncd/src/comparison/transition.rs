//! Object set transition: the attribute sets that turn a current object
//! into its temporary counterpart.

use log::{debug, info};
use sonic_sai::meta::AttrDefault;
use sonic_sai::{AttrMeta, AttrValue, Oid, SaiAttribute, Vid};

use super::ComparisonLogic;
use crate::error::Result;
use crate::fatal;
use crate::view::{ObjectIdx, ObjectStatus};

impl ComparisonLogic<'_> {
    /// Sets needed to make `current_idx` equal to `temp_idx`, in
    /// current-view identity. `Ok(None)` means the transition is not
    /// possible and the current object has to be replaced. Nothing is
    /// changed here, the caller applies the returned list.
    pub(super) fn plan_set_transition(
        &self,
        current_idx: ObjectIdx,
        temp_idx: ObjectIdx,
    ) -> Result<Option<Vec<SaiAttribute>>> {
        let current_obj = self.current.object(current_idx);
        let temp_obj = self.temp.object(temp_idx);
        let matched = temp_obj.status == ObjectStatus::Matched;
        let finder = self.finder();
        let mut sets = Vec::new();

        for attr in temp_obj.attributes() {
            let meta = attr.meta;
            match current_obj.attr(attr.name()) {
                Some(current) => {
                    if finder.has_equal_attribute(attr, current) {
                        continue;
                    }
                    if meta.is_settable() {
                        sets.push(self.translate_attribute(attr)?);
                        continue;
                    }
                    if matched {
                        return Err(fatal!(
                            "create-only {} differs on matched {}: current {}, temporary {}",
                            meta.name,
                            temp_obj.key,
                            current.value,
                            attr.value
                        ));
                    }
                    info!("{} differs on {}, cannot be set", meta.name, current_obj.key);
                    return Ok(None);
                }
                None if meta.is_settable() && !meta.conditional => {
                    let default = self.switch.default_attribute(&*self.temp, meta)?;
                    if default.is_some_and(|d| d.value.equivalent(&attr.value)) {
                        debug!("{} on {} is already at its default", meta.name, temp_obj.key);
                        continue;
                    }
                    sets.push(self.translate_attribute(attr)?);
                }
                None if matched && meta.is_create_only() => {
                    // Switch-created object, the value was chosen at init.
                    debug!("skipping create-only {} on matched {}", meta.name, temp_obj.key);
                }
                None => {
                    info!("{} missing on {}, cannot be set", meta.name, current_obj.key);
                    return Ok(None);
                }
            }
        }

        for current in current_obj
            .attributes()
            .filter(|a| !temp_obj.has_attr(a.name()))
        {
            let meta = current.meta;

            if meta.conditional || meta.mandatory {
                if matched && meta.is_settable() {
                    match meta.default {
                        AttrDefault::SwitchInternal if !meta.is_oid() => {
                            debug!("leaving {} on {} unchanged", meta.name, current_obj.key);
                        }
                        AttrDefault::SwitchInternal => {
                            let default = self.switch_internal_oid_default(current_idx, meta)?;
                            if default.value != current.value {
                                sets.push(default);
                            }
                        }
                        _ => {
                            info!("mandatory {} on {} has no default", meta.name, current_obj.key);
                            return Ok(None);
                        }
                    }
                    continue;
                }
                if matched && meta.is_create_only() {
                    continue;
                }
                info!("{} only set on current {}", meta.name, current_obj.key);
                return Ok(None);
            }

            let Some(default) = self.switch.default_attribute(&*self.current, meta)? else {
                info!("{} on {} has no default to restore", meta.name, current_obj.key);
                return Ok(None);
            };
            if default.value.equivalent(&current.value) {
                continue;
            }
            if !meta.is_settable() {
                info!("create-only {} on {} is not at its default", meta.name, current_obj.key);
                return Ok(None);
            }
            sets.push(default);
        }

        Ok(Some(sets))
    }

    /// Value a discovered object held for an OID attribute at switch init,
    /// null when it held none or the object is gone.
    fn switch_internal_oid_default(
        &self,
        current_idx: ObjectIdx,
        meta: &'static AttrMeta,
    ) -> Result<SaiAttribute> {
        let object = self.current.object(current_idx);
        let vid = object
            .vid()
            .ok_or_else(|| fatal!("{} has no VID for {}", object.key, meta.name))?;
        let rid = self
            .current
            .vid_to_rid(vid)
            .ok_or_else(|| fatal!("matched {vid} has no rid"))?;
        let value = self
            .switch
            .default_oid_attr(rid, meta.name)
            .and_then(|default| self.current.rid_to_vid(default))
            .unwrap_or(Vid::NULL);
        Ok(SaiAttribute::new(meta, AttrValue::Oid(Oid::from(value))))
    }

    /// Resets every attribute of an object that cannot be removed and
    /// marks it final. A stand-in is added to the temporary view when it
    /// does not already hold the object.
    pub(super) fn bring_to_default_state(&mut self, current_idx: ObjectIdx) -> Result<()> {
        let object = self.current.object(current_idx).clone();
        info!("bringing {} to default state", object.key);

        for attr in object.attributes() {
            let meta = attr.meta;
            if !meta.is_settable() {
                debug!("keeping create-only {} on {}", meta.name, object.key);
                continue;
            }
            let default = self
                .switch
                .default_attribute(&*self.current, meta)?
                .ok_or_else(|| fatal!("{} on {} has no default", meta.name, object.key))?;
            if !default.value.equivalent(&attr.value) {
                self.current.asic_set(current_idx, default)?;
            }
        }

        self.current.object_mut(current_idx).status = ObjectStatus::Final;

        // Kept on the device, so the temporary view holds it too.
        if let Some(vid) = object.vid() {
            let rid = self
                .current
                .vid_to_rid(vid)
                .ok_or_else(|| fatal!("non-removable {vid} has no rid"))?;
            if !self.temp.has_rid(rid) {
                let idx = self.temp.create_dummy_existing_object(rid, vid)?;
                self.temp.object_mut(idx).status = ObjectStatus::Final;
            }
        }
        Ok(())
    }

    /// The default trap group may only be referenced by traps that were
    /// reset to it; it is kept and reset, never removed.
    pub(super) fn bring_default_trap_group_to_final_state(&mut self) -> Result<()> {
        let Some(rid) = self.switch.default_trap_group_rid() else {
            return Ok(());
        };
        if self.temp.has_rid(rid) {
            return Ok(());
        }
        let vid = self
            .current
            .rid_to_vid(rid)
            .ok_or_else(|| fatal!("default trap group {rid} missing from current view"))?;
        let idx = self
            .current
            .find_vid(vid)
            .ok_or_else(|| fatal!("default trap group {vid} has no object"))?;
        if self.current.object(idx).status != ObjectStatus::NotProcessed {
            return Ok(());
        }
        self.bring_to_default_state(idx)
    }
}
