//! Comparison logic.
//!
//! Transforms the current view into the temporary view one object at a
//! time, recording in the current view the device operations that take
//! the hardware along. Nothing here touches the device; the operation log
//! is replayed later by the executor.
//!
//! Run order: identity linking, existing-object backfill, internal object
//! sanity checks, pre-match hinting, the recursive transition of every
//! temporary object, default restoration and leftover removal, and
//! finally the post-condition checks on both views.

mod removal;
mod transition;

use itertools::Itertools;
use log::{debug, error, info, warn};
use sonic_sai::meta::AttrValueType;
use sonic_sai::{AttrValue, EntryKey, ObjectKey, ObjectType, Oid, Rid, SaiAttribute, Vid};
use std::collections::{BTreeMap, BTreeSet};

use crate::config::{BreakConfig, EngineConfig};
use crate::error::Result;
use crate::fatal;
use crate::finder::CandidateFinder;
use crate::switch::SwitchContext;
use crate::view::{AsicView, ObjectIdx, ObjectStatus, SaiObject};

/// Object types the switch creates per port; they always exist on both sides.
const INTERNAL_OBJECT_TYPES: [ObjectType; 3] = [
    ObjectType::Queue,
    ObjectType::SchedulerGroup,
    ObjectType::IngressPriorityGroup,
];

/// Removed before anything else when unreferenced, they pin bridge ports
/// and VLANs otherwise.
const REMOVE_FIRST_TYPES: [ObjectType; 3] = [
    ObjectType::VlanMember,
    ObjectType::StpPort,
    ObjectType::BridgePort,
];

pub struct ComparisonLogic<'a> {
    current: &'a mut AsicView,
    temp: &'a mut AsicView,
    switch: &'a SwitchContext,
    breaks: &'a BreakConfig,
    engine: &'a EngineConfig,
    /// Temporary objects whose processing is on the stack.
    in_progress: BTreeSet<ObjectIdx>,
}

impl<'a> ComparisonLogic<'a> {
    pub fn new(
        current: &'a mut AsicView,
        temp: &'a mut AsicView,
        switch: &'a SwitchContext,
        breaks: &'a BreakConfig,
        engine: &'a EngineConfig,
    ) -> Self {
        Self {
            current,
            temp,
            switch,
            breaks,
            engine,
            in_progress: BTreeSet::new(),
        }
    }

    /// Runs the whole comparison. On success every object of both views is
    /// final or removed and the current view holds the operation log.
    pub fn compare_views(&mut self) -> Result<()> {
        self.match_oids()?;
        self.populate_existing_objects()?;
        self.check_internal_objects();
        self.create_pre_match_map();
        self.log_view_object_count();

        self.apply_view_transition()?;

        info!(
            "ASIC operations to execute: {} ({})",
            self.current.ops().len(),
            self.current.ops().summary()
        );

        self.temp.check_objects_status("temporary")?;
        self.current.check_objects_status("current")?;
        self.check_map()?;

        if self.current.live_count() != self.temp.live_count() {
            return Err(fatal!(
                "object count differs after transition: current {}, temporary {}",
                self.current.live_count(),
                self.temp.live_count()
            ));
        }
        Ok(())
    }

    fn finder(&self) -> CandidateFinder<'_> {
        CandidateFinder::new(&*self.current, &*self.temp, self.switch)
    }

    /// Objects with the same VID in both views are the same device object.
    fn match_oids(&mut self) -> Result<()> {
        let temp_oids: Vec<(ObjectIdx, Vid)> = self
            .temp
            .live()
            .into_iter()
            .filter_map(|idx| self.temp.object(idx).vid().map(|vid| (idx, vid)))
            .collect();

        let mut matched = 0;
        for (temp_idx, vid) in temp_oids {
            let Some(current_idx) = self.current.find_vid(vid) else {
                continue;
            };
            let rid = self
                .current
                .vid_to_rid(vid)
                .ok_or_else(|| fatal!("current view has no rid for {vid}"))?;

            self.temp.set_identity(vid, rid);
            self.temp.object_mut(temp_idx).status = ObjectStatus::Matched;
            self.current.object_mut(current_idx).status = ObjectStatus::Matched;
            matched += 1;
        }
        info!("matched {matched} objects by VID");
        Ok(())
    }

    /// Adds attribute-less stand-ins for switch-created objects the
    /// temporary view never mentions, so they are not removed.
    fn populate_existing_objects(&mut self) -> Result<()> {
        if self.temp.objects_of_type(ObjectType::Switch).is_empty() {
            info!("no switch in temporary view, skipping existing objects");
            return Ok(());
        }

        for rid in self.switch.discovered_rids() {
            if rid.is_null() || self.temp.has_rid(rid) {
                continue;
            }
            let vid = self
                .current
                .rid_to_vid(rid)
                .ok_or_else(|| fatal!("existing object {rid} missing from current view"))?;

            if self.switch.is_init_view_removed(vid) {
                debug!("{vid} was removed in init view, not populating");
                continue;
            }

            let warm_internal = self.switch.is_warm_boot_vid(vid)
                && vid
                    .object_type()
                    .is_some_and(|ot| INTERNAL_OBJECT_TYPES.contains(&ot));
            if !warm_internal && !self.switch.is_cold_boot_vid(vid) {
                debug!("{vid} ({rid}) is not a default existing object");
                continue;
            }

            let temp_idx = self.temp.create_dummy_existing_object(rid, vid)?;
            self.temp.object_mut(temp_idx).status = ObjectStatus::Matched;
            let current_idx = self
                .current
                .find_vid(vid)
                .ok_or_else(|| fatal!("existing object {vid} has no current object"))?;
            self.current.object_mut(current_idx).status = ObjectStatus::Matched;
            debug!("populated existing {vid} ({rid})");
        }
        Ok(())
    }

    fn check_internal_objects(&self) {
        for object_type in INTERNAL_OBJECT_TYPES {
            let current = self.current.objects_of_type(object_type);
            let temp = self.temp.objects_of_type(object_type);
            if current.len() != temp.len() {
                warn!(
                    "{object_type} count differs: current {}, temporary {}",
                    current.len(),
                    temp.len()
                );
            }
            for idx in temp {
                let object = self.temp.object(idx);
                if object.status != ObjectStatus::Matched {
                    error!("{object} is not matched, expected only after cold boot");
                }
            }
        }
    }

    /// Seeds temporary-to-current VID hints by walking the OID attributes
    /// of matched anchors and of routes whose prefix is unique in both views.
    fn create_pre_match_map(&mut self) {
        let mut hints = BTreeMap::new();

        for temp_idx in self.temp.live() {
            let temp_obj = self.temp.object(temp_idx);
            if temp_obj.status != ObjectStatus::Matched {
                continue;
            }
            let Some(current_idx) = temp_obj.vid().and_then(|vid| self.current.find_vid(vid)) else {
                continue;
            };
            self.collect_pre_matches(current_idx, temp_idx, &mut hints);
        }

        for temp_idx in self.temp.objects_of_type(ObjectType::RouteEntry) {
            let Some(EntryKey::Route(route)) = self.temp.object(temp_idx).key.entry() else {
                continue;
            };
            let temp_routes = self.temp.routes_with_prefix(&route.dest);
            let current_routes = self.current.routes_with_prefix(&route.dest);
            if let ([_], [current_idx]) = (temp_routes.as_slice(), current_routes.as_slice()) {
                self.collect_pre_matches(*current_idx, temp_idx, &mut hints);
            }
        }

        for (temp_vid, current_vid) in hints {
            self.temp.insert_pre_match(temp_vid, current_vid);
        }
        info!("pre-match map has {} entries", self.temp.pre_match_len());
    }

    fn collect_pre_matches(
        &self,
        current_idx: ObjectIdx,
        temp_idx: ObjectIdx,
        hints: &mut BTreeMap<Vid, Vid>,
    ) {
        let current_obj = self.current.object(current_idx);
        let temp_obj = self.temp.object(temp_idx);

        for attr in temp_obj
            .attributes()
            .filter(|a| a.meta.value_type == AttrValueType::Oid)
        {
            let AttrValue::Oid(temp_oid) = &attr.value else {
                continue;
            };
            let Some(AttrValue::Oid(current_oid)) = current_obj.attr(attr.name()).map(|a| &a.value) else {
                continue;
            };
            let (temp_vid, current_vid) = (Vid::from(*temp_oid), Vid::from(*current_oid));
            if temp_vid.is_null()
                || current_vid.is_null()
                || temp_vid.object_type() != current_vid.object_type()
                || hints.contains_key(&temp_vid)
            {
                continue;
            }
            hints.insert(temp_vid, current_vid);

            if let (Some(c), Some(t)) = (self.current.find_vid(current_vid), self.temp.find_vid(temp_vid)) {
                self.collect_pre_matches(c, t, hints);
            }
        }
    }

    fn log_view_object_count(&self) {
        let current = self.current.count_by_type();
        let temp = self.temp.count_by_type();
        let mut differs = false;
        for object_type in current.keys().chain(temp.keys()).unique() {
            let c = current.get(object_type).copied().unwrap_or(0);
            let t = temp.get(object_type).copied().unwrap_or(0);
            if c != t {
                warn!("{object_type} count differs: current {c}, temporary {t}");
                differs = true;
            }
        }
        if differs {
            warn!("object counts differ between views, ASIC operations will follow");
        }
    }

    fn check_switch(&self) -> Result<()> {
        let current = self.current.objects_of_type(ObjectType::Switch);
        let temp = self.temp.objects_of_type(ObjectType::Switch);
        match (current.as_slice(), temp.as_slice()) {
            ([], []) => Ok(()),
            ([c], [t]) => {
                let (cvid, tvid) = (self.current.object(*c).vid(), self.temp.object(*t).vid());
                if cvid == tvid {
                    Ok(())
                } else {
                    Err(fatal!(
                        "current switch {:?} differs from temporary switch {:?}",
                        cvid,
                        tvid
                    ))
                }
            }
            _ => Err(fatal!(
                "unsupported number of switches: current {}, temporary {}",
                current.len(),
                temp.len()
            )),
        }
    }

    fn check_matched_ports(&self) -> Result<()> {
        for idx in self.temp.objects_of_type(ObjectType::Port) {
            let port = self.temp.object(idx);
            if port.status != ObjectStatus::Matched {
                return Err(fatal!("port {port} is not matched, ports cannot be created"));
            }
        }
        Ok(())
    }

    fn apply_view_transition(&mut self) -> Result<()> {
        self.check_switch()?;
        self.check_matched_ports()?;

        let (routes, others): (Vec<ObjectIdx>, Vec<ObjectIdx>) = self
            .temp
            .live()
            .into_iter()
            .partition(|idx| self.temp.object(*idx).object_type() == ObjectType::RouteEntry);
        let (default_routes, routes): (Vec<ObjectIdx>, Vec<ObjectIdx>) =
            routes.into_iter().partition(|idx| {
                matches!(
                    self.temp.object(*idx).key.entry(),
                    Some(EntryKey::Route(route)) if route.dest.is_default()
                )
            });

        for temp_idx in others.into_iter().chain(default_routes).chain(routes) {
            self.process_object(temp_idx, 0)?;
        }

        self.bring_default_trap_group_to_final_state()?;
        self.remove_leftovers()
    }

    fn process_object(&mut self, temp_idx: ObjectIdx, depth: usize) -> Result<()> {
        if self.temp.object(temp_idx).status == ObjectStatus::Final {
            return Ok(());
        }
        if depth > self.engine.max_recursion_depth {
            return Err(fatal!(
                "dependency chain of {} deeper than {}",
                self.temp.object(temp_idx),
                self.engine.max_recursion_depth
            ));
        }
        if !self.in_progress.insert(temp_idx) {
            return Err(fatal!(
                "dependency cycle through {}",
                self.temp.object(temp_idx)
            ));
        }
        let result = self.process_object_for_view_transition(temp_idx, depth);
        self.in_progress.remove(&temp_idx);
        result
    }

    fn process_object_for_view_transition(&mut self, temp_idx: ObjectIdx, depth: usize) -> Result<()> {
        let temp_obj = self.temp.object(temp_idx);
        let dependencies: Vec<Vid> = temp_obj
            .attr_vids()
            .into_iter()
            .chain(temp_obj.key_vids())
            .collect();

        for vid in dependencies {
            let dependency = self.temp.find_vid(vid).ok_or_else(|| {
                fatal!(
                    "{} references {vid} which is not in the temporary view",
                    self.temp.object(temp_idx).key
                )
            })?;
            self.process_object(dependency, depth + 1)?;
        }

        let candidate = self.finder().find_current_best_match(temp_idx)?;

        let Some(current_idx) = candidate else {
            debug!("no match for {}, creating", self.temp.object(temp_idx).key);
            self.break_before_make(temp_idx, None)?;
            return self.create_new_object(temp_idx);
        };

        debug!(
            "best match for {} is {}",
            self.temp.object(temp_idx).key,
            self.current.object(current_idx).key
        );

        match self.plan_set_transition(current_idx, temp_idx)? {
            Some(sets) => {
                for attr in sets {
                    self.current.asic_set(current_idx, attr)?;
                }
                self.update_object_status(current_idx, temp_idx)
            }
            None => {
                let temp_obj = self.temp.object(temp_idx);
                if temp_obj.status == ObjectStatus::Matched {
                    return Err(fatal!("set transition failed on matched {temp_obj}"));
                }
                if temp_obj.object_type() == ObjectType::Switch {
                    return Err(fatal!("set transition failed on switch {temp_obj}"));
                }
                if temp_obj.is_oid_object() {
                    self.break_before_make(temp_idx, Some(current_idx))?;
                } else {
                    // The new entry has the same key, the old one must go first.
                    self.remove_existing(current_idx)?;
                }
                self.create_new_object(temp_idx)
            }
        }
    }

    /// Temporary VID in current-view identity.
    fn translate_temporary_vid(&self, vid: Vid) -> Result<Vid> {
        if vid.is_null() {
            return Ok(vid);
        }
        if let Some(rid) = self.temp.vid_to_rid(vid) {
            return self
                .current
                .rid_to_vid(rid)
                .ok_or_else(|| fatal!("rid {rid} of temporary {vid} missing from current view"));
        }
        match self.temp.find_vid(vid) {
            Some(idx) if self.temp.object(idx).created => Ok(vid),
            _ => Err(fatal!("temporary {vid} has no rid and was not created")),
        }
    }

    fn translate_oid(&self, oid: Oid) -> Result<Oid> {
        self.translate_temporary_vid(Vid::from(oid)).map(Oid::from)
    }

    fn translate_attribute(&self, attr: &SaiAttribute) -> Result<SaiAttribute> {
        attr.try_map_oids(|oid| self.translate_oid(oid))
    }

    fn create_new_object(&mut self, temp_idx: ObjectIdx) -> Result<()> {
        let temp_obj = self.temp.object(temp_idx).clone();
        if temp_obj.status != ObjectStatus::NotProcessed {
            return Err(fatal!("cannot create {temp_obj}, expected not processed"));
        }

        let key = match temp_obj.key.entry() {
            Some(entry) => ObjectKey::Entry(entry.try_map_oids(|oid| self.translate_oid(oid))?),
            None => temp_obj.key.clone(),
        };
        let mut object = SaiObject::new(key.clone());
        for attr in temp_obj.attributes() {
            let attr = self.translate_attribute(attr)?;
            object.attrs.insert(attr.name(), attr);
        }
        object.created = true;
        object.status = ObjectStatus::Final;
        self.current.asic_create(object)?;

        let temp_obj = self.temp.object_mut(temp_idx);
        temp_obj.created = true;
        temp_obj.status = ObjectStatus::Final;

        if key.entry().is_some() {
            let object_type = key.object_type();
            let temp_key = temp_obj.serialized_key();
            let current_key = key.serialize_key();
            self.temp
                .insert_non_oid_match(object_type, temp_key.clone(), current_key.clone());
            self.current.insert_non_oid_match(object_type, current_key, temp_key);
        }
        Ok(())
    }

    fn update_object_status(&mut self, current_idx: ObjectIdx, temp_idx: ObjectIdx) -> Result<()> {
        let current_obj = self.current.object(current_idx);
        let temp_obj = self.temp.object(temp_idx);
        let consistent = current_obj.status == temp_obj.status
            && matches!(
                current_obj.status,
                ObjectStatus::NotProcessed | ObjectStatus::Matched
            );
        if !consistent {
            return Err(fatal!(
                "cannot finalize {current_obj} against {temp_obj}"
            ));
        }

        match (temp_obj.vid(), current_obj.vid()) {
            (Some(temp_vid), Some(current_vid)) => {
                let rid: Rid = self
                    .current
                    .vid_to_rid(current_vid)
                    .ok_or_else(|| fatal!("current {current_vid} has no rid"))?;
                self.temp.set_identity(temp_vid, rid);
            }
            _ => {
                let object_type = temp_obj.object_type();
                let temp_key = temp_obj.serialized_key();
                let current_key = current_obj.serialized_key();
                self.temp
                    .insert_non_oid_match(object_type, temp_key.clone(), current_key.clone());
                self.current.insert_non_oid_match(object_type, current_key, temp_key);
            }
        }

        self.current.object_mut(current_idx).status = ObjectStatus::Final;
        self.temp.object_mut(temp_idx).status = ObjectStatus::Final;
        Ok(())
    }

    /// Both maps cover the same RIDs once the transition is done.
    fn check_map(&self) -> Result<()> {
        let current = self.current.vid_rid_map();
        let temp = self.temp.vid_rid_map();
        if current.len() != temp.len() {
            return Err(fatal!(
                "VID/RID map size differs: current {}, temporary {}",
                current.len(),
                temp.len()
            ));
        }
        let current_rids: BTreeSet<Rid> = current.values().copied().collect();
        let temp_rids: BTreeSet<Rid> = temp.values().copied().collect();
        if let Some(rid) = current_rids.symmetric_difference(&temp_rids).next() {
            return Err(fatal!("rid {rid} is mapped in only one view"));
        }
        Ok(())
    }
}
