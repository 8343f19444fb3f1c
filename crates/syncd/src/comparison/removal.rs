//! Removal of current objects that have no temporary counterpart.

use log::{debug, info, warn};
use sonic_sai::meta::{entry_key_reference_types, referencing_attrs};
use sonic_sai::{AttrValue, ObjectType, Oid, SaiAttribute, Vid};

use super::{ComparisonLogic, REMOVE_FIRST_TYPES};
use crate::error::Result;
use crate::fatal;
use crate::view::{ObjectIdx, ObjectStatus};

impl ComparisonLogic<'_> {
    /// Removes an unreferenced current object, or resets it when the
    /// device does not let it go.
    pub(super) fn remove_existing(&mut self, current_idx: ObjectIdx) -> Result<()> {
        let object = self.current.object(current_idx);
        if object.status != ObjectStatus::NotProcessed {
            return Err(fatal!("cannot remove {object}, expected not processed"));
        }
        if object.object_type() == ObjectType::Switch {
            return Err(fatal!("switch {object} cannot be removed"));
        }

        if let Some(vid) = object.vid() {
            let count = self.current.ref_count(vid)?;
            if count != 0 {
                return Err(fatal!("cannot remove {object}, reference count is {count}"));
            }
            let rid = self
                .current
                .vid_to_rid(vid)
                .ok_or_else(|| fatal!("current {vid} has no rid"))?;
            if self.switch.is_non_removable(rid, vid) {
                return self.bring_to_default_state(current_idx);
            }
        }

        debug!("removing {}", self.current.object(current_idx).key);
        self.current.asic_remove(current_idx)
    }

    /// Removes `current_idx` together with every object that cannot be
    /// detached from it.
    pub(super) fn remove_dependency_tree(&mut self, current_idx: ObjectIdx) -> Result<()> {
        let object = self.current.object(current_idx);
        let Some(vid) = object.vid() else {
            return self.remove_existing(current_idx);
        };
        let object_type = object.object_type();

        if self.current.ref_count(vid)? > 0 {
            info!(
                "{} is referenced {} times, removing its users",
                object.key,
                self.current.ref_count(vid)?
            );
            self.remove_attribute_users(vid, object_type)?;
            self.remove_entry_users(vid, object_type)?;
        }

        self.remove_existing(current_idx)
    }

    fn remove_attribute_users(&mut self, vid: Vid, object_type: ObjectType) -> Result<()> {
        let target = Oid::from(vid);

        for meta in referencing_attrs(object_type) {
            for user_idx in self.current.objects_of_type(meta.object_type) {
                let user = self.current.object(user_idx);
                let status = user.status;
                if !matches!(status, ObjectStatus::NotProcessed | ObjectStatus::Matched) {
                    continue;
                }
                let Some(attr) = user.attr(meta.name) else {
                    continue;
                };
                if !attr.oids().contains(&target) {
                    continue;
                }

                match (meta.is_create_only(), meta.is_settable(), status) {
                    (true, _, ObjectStatus::NotProcessed) => self.remove_dependency_tree(user_idx)?,
                    (_, true, _) if meta.allow_null && matches!(attr.value, AttrValue::Oid(_)) => {
                        debug!("detaching {} from {vid} through {}", user.key, meta.name);
                        let null = SaiAttribute::new(meta, AttrValue::Oid(Oid::NULL));
                        self.current.asic_set(user_idx, null)?;
                    }
                    (_, true, ObjectStatus::NotProcessed) => self.remove_dependency_tree(user_idx)?,
                    _ => {
                        return Err(fatal!(
                            "cannot release {vid} held by {} {} through {}",
                            status,
                            user.key,
                            meta.name
                        ))
                    }
                }
            }
        }
        Ok(())
    }

    fn remove_entry_users(&mut self, vid: Vid, object_type: ObjectType) -> Result<()> {
        for entry_type in ObjectType::ALL
            .iter()
            .copied()
            .filter(|t| entry_key_reference_types(*t).contains(&object_type))
        {
            for user_idx in self.current.objects_of_type(entry_type) {
                let user = self.current.object(user_idx);
                if !user.key_vids().contains(&vid) {
                    continue;
                }
                if user.status != ObjectStatus::NotProcessed {
                    return Err(fatal!("cannot release {vid} held by {user}"));
                }
                self.remove_existing(user_idx)?;
            }
        }
        Ok(())
    }

    /// Frees the resources of a configured object type before its
    /// replacement is created.
    pub(super) fn break_before_make(
        &mut self,
        temp_idx: ObjectIdx,
        candidate: Option<ObjectIdx>,
    ) -> Result<()> {
        let object_type = self.temp.object(temp_idx).object_type();
        if !self.breaks.contains(object_type) {
            return Ok(());
        }

        let victim = match candidate {
            Some(idx) => idx,
            None => match self.finder().find_similar_match(temp_idx) {
                Some(idx) => idx,
                None => {
                    warn!(
                        "no similar {object_type} to break before creating {}",
                        self.temp.object(temp_idx).key
                    );
                    return Ok(());
                }
            },
        };

        info!(
            "break before make: removing {} for {}",
            self.current.object(victim).key,
            self.temp.object(temp_idx).key
        );
        self.remove_dependency_tree(victim)
    }

    /// Removes what is still not processed: first the types that pin other
    /// objects, then anything unreferenced, pass after pass.
    pub(super) fn remove_leftovers(&mut self) -> Result<()> {
        for object_type in REMOVE_FIRST_TYPES {
            for idx in self.current.not_processed_of_type(object_type) {
                let Some(vid) = self.current.object(idx).vid() else {
                    continue;
                };
                if self.current.ref_count(vid)? == 0 {
                    self.remove_existing(idx)?;
                }
            }
        }

        let mut pass = 0;
        loop {
            if pass >= self.engine.max_removal_passes {
                return Err(fatal!(
                    "leftover removal did not settle after {pass} passes"
                ));
            }
            pass += 1;

            let mut removed = 0;
            for idx in self.current.live() {
                let object = self.current.object(idx);
                if object.status != ObjectStatus::NotProcessed {
                    continue;
                }
                if let Some(vid) = object.vid() {
                    if self.current.ref_count(vid)? != 0 {
                        continue;
                    }
                }
                self.remove_existing(idx)?;
                removed += 1;
            }

            debug!("removal pass {pass} handled {removed} objects");
            if removed == 0 {
                return Ok(());
            }
        }
    }
}
