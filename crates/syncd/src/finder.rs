//! Candidate finder.
//!
//! For an object of the temporary view, picks the current-view object it
//! can be transitioned from. Non-OID entries are found by key; OID objects
//! are scored by how many attributes they share with the temporary object
//! after translating object ids into current-view identity.

use log::{debug, warn};
use sonic_sai::meta::{referencing_attrs, AttrValueType};
use sonic_sai::{AttrValue, EntryKey, ObjectKey, ObjectType, Oid, SaiAttribute, Vid};

use crate::error::Result;
use crate::fatal;
use crate::switch::SwitchContext;
use crate::view::{AsicView, ObjectIdx, ObjectStatus, SaiObject};

const MAX_CHILDREN_DEPTH: usize = 64;

pub struct CandidateFinder<'a> {
    current: &'a AsicView,
    temp: &'a AsicView,
    switch: &'a SwitchContext,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    idx: ObjectIdx,
    equal_attrs: usize,
}

impl<'a> CandidateFinder<'a> {
    pub fn new(current: &'a AsicView, temp: &'a AsicView, switch: &'a SwitchContext) -> Self {
        Self {
            current,
            temp,
            switch,
        }
    }

    /// Current-view object `temp_idx` should be transitioned from, or
    /// `None` if it has to be created.
    pub fn find_current_best_match(&self, temp_idx: ObjectIdx) -> Result<Option<ObjectIdx>> {
        let temp_obj = self.temp.object(temp_idx);

        if let Some(vid) = temp_obj.vid() {
            if temp_obj.status == ObjectStatus::Matched {
                return self
                    .current
                    .find_vid(vid)
                    .map(Some)
                    .ok_or_else(|| fatal!("matched object {vid} missing from current view"));
            }
        }

        match temp_obj.key.entry() {
            Some(entry) => self.find_entry(entry),
            None if temp_obj.object_type() == ObjectType::Switch => self.find_switch(),
            None => self.find_generic(temp_obj),
        }
    }

    fn find_entry(&self, entry: &EntryKey) -> Result<Option<ObjectIdx>> {
        let mut oids = entry.oids();
        oids.push(entry.switch_id());
        for oid in oids.into_iter().filter(|o| !o.is_null()) {
            if self.temp.vid_to_rid(oid.into()).is_none() {
                // Depends on an object created in this run, cannot exist yet.
                return Ok(None);
            }
        }

        let key = entry.try_map_oids(|oid| {
            if oid.is_null() {
                return Ok(oid);
            }
            let rid = self
                .temp
                .vid_to_rid(oid.into())
                .ok_or_else(|| fatal!("temporary {oid} has no rid"))?;
            self.current
                .rid_to_vid(rid)
                .map(Oid::from)
                .ok_or_else(|| fatal!("rid {rid} of temporary {oid} missing from current view"))
        })?;

        let key = ObjectKey::Entry(key);
        match self.current.find(&key) {
            None => Ok(None),
            Some(idx) if self.current.object(idx).status == ObjectStatus::NotProcessed => Ok(Some(idx)),
            Some(idx) => Err(fatal!(
                "current entry {} already processed",
                self.current.object(idx)
            )),
        }
    }

    fn find_switch(&self) -> Result<Option<ObjectIdx>> {
        let switches = self.current.objects_of_type(ObjectType::Switch);
        match switches.as_slice() {
            [] => Ok(None),
            [idx] if self.current.object(*idx).status == ObjectStatus::NotProcessed => Ok(Some(*idx)),
            [idx] => Err(fatal!(
                "current switch {} already processed",
                self.current.object(*idx)
            )),
            _ => Err(fatal!("{} switches in current view", switches.len())),
        }
    }

    /// Temporary id expressed in current-view identity: through the RID for
    /// matched objects, unchanged for objects created in this run.
    fn temp_oid_in_current(&self, oid: Oid) -> Option<Oid> {
        if oid.is_null() {
            return Some(oid);
        }
        let vid = Vid::from(oid);
        if let Some(rid) = self.temp.vid_to_rid(vid) {
            return self.current.rid_to_vid(rid).map(Oid::from);
        }
        match self.current.find_vid(vid) {
            Some(idx) if self.current.object(idx).created => Some(oid),
            _ => None,
        }
    }

    /// Whether a temporary attribute holds the same value as a current one.
    pub fn has_equal_attribute(&self, temp: &SaiAttribute, current: &SaiAttribute) -> bool {
        if !temp.meta.is_oid() {
            return temp.value.equivalent(&current.value);
        }
        match temp.value.try_map_oids(|oid| self.temp_oid_in_current(oid).ok_or(())) {
            Ok(value) => value == current.value,
            Err(()) => false,
        }
    }

    /// A differing create-only attribute rules the candidate out.
    fn is_compatible(&self, temp_obj: &SaiObject, current_obj: &SaiObject) -> Result<bool> {
        for attr in temp_obj.attributes().filter(|a| a.meta.is_create_only()) {
            match current_obj.attr(attr.name()) {
                Some(current) if !self.has_equal_attribute(attr, current) => return Ok(false),
                Some(_) => {}
                None => match self.switch.default_attribute(self.temp, attr.meta)? {
                    Some(default) if default.value.equivalent(&attr.value) => {}
                    _ => return Ok(false),
                },
            }
        }
        for attr in current_obj.attributes().filter(|a| a.meta.is_create_only()) {
            if temp_obj.has_attr(attr.name()) {
                continue;
            }
            match self.switch.default_attribute(self.current, attr.meta)? {
                Some(default) if default.value.equivalent(&attr.value) => {}
                _ => return Ok(false),
            }
        }
        Ok(true)
    }

    fn equal_attribute_count(&self, temp_obj: &SaiObject, current_obj: &SaiObject) -> usize {
        temp_obj
            .attributes()
            .filter(|attr| {
                current_obj
                    .attr(attr.name())
                    .is_some_and(|current| self.has_equal_attribute(attr, current))
            })
            .count()
    }

    fn find_generic(&self, temp_obj: &SaiObject) -> Result<Option<ObjectIdx>> {
        let mut candidates = Vec::new();
        for idx in self.current.not_processed_of_type(temp_obj.object_type()) {
            let current_obj = self.current.object(idx);
            if !self.is_compatible(temp_obj, current_obj)? {
                continue;
            }
            candidates.push(Candidate {
                idx,
                equal_attrs: self.equal_attribute_count(temp_obj, current_obj),
            });
        }

        match candidates.len() {
            0 => return Ok(None),
            1 => return Ok(Some(candidates[0].idx)),
            _ => {}
        }

        if let Some(found) = self.select_by_label(temp_obj, &candidates) {
            return Ok(Some(found));
        }

        if let Some(current_vid) = temp_obj.vid().and_then(|vid| self.temp.pre_match(vid)) {
            if let Some(found) = candidates
                .iter()
                .find(|c| self.current.object(c.idx).vid() == Some(current_vid))
            {
                debug!("pre-match selected {current_vid} for {}", temp_obj.key);
                return Ok(Some(found.idx));
            }
        }

        let keyed = self.filter_by_key_attributes(temp_obj, &candidates);
        if keyed.len() == 1 {
            return Ok(Some(keyed[0].idx));
        }
        let candidates = if keyed.is_empty() { candidates } else { keyed };

        Ok(Some(self.select_best(temp_obj, candidates)))
    }

    fn select_by_label(&self, temp_obj: &SaiObject, candidates: &[Candidate]) -> Option<ObjectIdx> {
        let name = match temp_obj.object_type() {
            ObjectType::Lag => "SAI_LAG_ATTR_LABEL",
            ObjectType::VirtualRouter => "SAI_VIRTUAL_ROUTER_ATTR_LABEL",
            _ => return None,
        };
        let label = temp_obj.attr(name)?;
        let labeled: Vec<Candidate> = candidates
            .iter()
            .filter(|c| {
                self.current
                    .object(c.idx)
                    .attr(name)
                    .is_some_and(|a| a.value == label.value)
            })
            .copied()
            .collect();
        labeled.iter().max_by_key(|c| c.equal_attrs).map(|c| c.idx)
    }

    fn filter_by_key_attributes(&self, temp_obj: &SaiObject, candidates: &[Candidate]) -> Vec<Candidate> {
        let keys: Vec<&SaiAttribute> = temp_obj.attributes().filter(|a| a.meta.key).collect();
        if keys.is_empty() {
            return Vec::new();
        }
        candidates
            .iter()
            .filter(|c| {
                let current_obj = self.current.object(c.idx);
                keys.iter().all(|attr| {
                    current_obj
                        .attr(attr.name())
                        .is_some_and(|current| self.has_equal_attribute(attr, current))
                })
            })
            .copied()
            .collect()
    }

    fn select_best(&self, temp_obj: &SaiObject, mut candidates: Vec<Candidate>) -> ObjectIdx {
        candidates.sort_by(|a, b| {
            b.equal_attrs
                .cmp(&a.equal_attrs)
                .then_with(|| self.current.object(a.idx).key.cmp(&self.current.object(b.idx).key))
        });
        let best = candidates[0];
        let tied: Vec<Candidate> = candidates
            .iter()
            .take_while(|c| c.equal_attrs == best.equal_attrs)
            .copied()
            .collect();
        if tied.len() == 1 {
            return best.idx;
        }

        if let Some(temp_vid) = temp_obj.vid() {
            let temp_children = children_count(self.temp, temp_vid, 0);
            let same: Vec<&Candidate> = tied
                .iter()
                .filter(|c| {
                    self.current
                        .object(c.idx)
                        .vid()
                        .is_some_and(|vid| children_count(self.current, vid, 0) == temp_children)
                })
                .collect();
            if let [only] = same.as_slice() {
                return only.idx;
            }
        }

        warn!(
            "{} candidates tie for {}, taking the lowest id",
            tied.len(),
            temp_obj.key
        );
        best.idx
    }

    /// Least divergent not processed object of the same type, used to make
    /// room before creating a replacement.
    pub fn find_similar_match(&self, temp_idx: ObjectIdx) -> Option<ObjectIdx> {
        let temp_obj = self.temp.object(temp_idx);
        self.current
            .not_processed_of_type(temp_obj.object_type())
            .into_iter()
            .map(|idx| {
                let count = self.equal_attribute_count(temp_obj, self.current.object(idx));
                (idx, count)
            })
            .min_by(|(a, ca), (b, cb)| {
                cb.cmp(ca)
                    .then_with(|| self.current.object(*a).key.cmp(&self.current.object(*b).key))
            })
            .map(|(idx, _)| idx)
    }
}

/// Number of objects depending on `vid`, following dependents of other
/// types transitively.
pub fn children_count(view: &AsicView, vid: Vid, depth: usize) -> usize {
    if depth > MAX_CHILDREN_DEPTH {
        warn!("children of {vid} nested deeper than {MAX_CHILDREN_DEPTH}");
        return 0;
    }
    let Some(object_type) = vid.object_type() else {
        return 0;
    };
    let target = AttrValue::Oid(vid.into());
    let mut count = 0;
    for meta in referencing_attrs(object_type)
        .iter()
        .filter(|m| m.value_type == AttrValueType::Oid)
    {
        for user in view.objects_of_type(meta.object_type) {
            let user_obj = view.object(user);
            if user_obj.attr(meta.name).map(|a| &a.value) != Some(&target) {
                continue;
            }
            count += 1;
            let follow = !matches!(meta.object_type, ObjectType::Port | ObjectType::Switch)
                && meta.object_type != object_type;
            if let (true, Some(user_vid)) = (follow, user_obj.vid()) {
                count += children_count(view, user_vid, depth + 1);
            }
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::TableDump;
    use pretty_assertions::assert_eq;
    use sonic_sai::Rid;
    use std::collections::BTreeMap;

    fn fields(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn policer(dump: &mut TableDump, index: u64, mode: &str, cir: &str) {
        dump.insert(
            format!("SAI_OBJECT_TYPE_POLICER:oid:0x1200000000000{index}"),
            fields(&[
                ("SAI_POLICER_ATTR_METER_TYPE", "SAI_METER_TYPE_BYTES"),
                ("SAI_POLICER_ATTR_MODE", mode),
                ("SAI_POLICER_ATTR_CIR", cir),
            ]),
        );
    }

    fn context() -> SwitchContext {
        SwitchContext::new(
            Vid::compose(0, ObjectType::Switch, 0, 0),
            Rid::compose(0, ObjectType::Switch, 1, 0),
        )
    }

    #[test]
    fn test_generic_prefers_most_equal_attributes() {
        let mut current = TableDump::new();
        policer(&mut current, 1, "SAI_POLICER_MODE_SR_TCM", "100");
        policer(&mut current, 2, "SAI_POLICER_MODE_SR_TCM", "200");
        policer(&mut current, 3, "SAI_POLICER_MODE_TR_TCM", "200");
        let mut temp = TableDump::new();
        policer(&mut temp, 9, "SAI_POLICER_MODE_SR_TCM", "200");

        let current = AsicView::from_dump(&current).unwrap();
        let temp = AsicView::from_dump(&temp).unwrap();
        let ctx = context();
        let finder = CandidateFinder::new(&current, &temp, &ctx);

        let found = finder.find_current_best_match(temp.live()[0]).unwrap().unwrap();
        assert_eq!(
            current.object(found).key.to_string(),
            "SAI_OBJECT_TYPE_POLICER:oid:0x12000000000002"
        );
    }

    #[test]
    fn test_create_only_difference_disqualifies() {
        let mut current = TableDump::new();
        policer(&mut current, 1, "SAI_POLICER_MODE_TR_TCM", "200");
        let mut temp = TableDump::new();
        policer(&mut temp, 9, "SAI_POLICER_MODE_SR_TCM", "200");

        let current = AsicView::from_dump(&current).unwrap();
        let temp = AsicView::from_dump(&temp).unwrap();
        let ctx = context();
        let finder = CandidateFinder::new(&current, &temp, &ctx);
        assert_eq!(finder.find_current_best_match(temp.live()[0]).unwrap(), None);
        // Still usable as a break-before-make victim.
        assert_eq!(finder.find_similar_match(temp.live()[0]), Some(current.live()[0]));
    }

    #[test]
    fn test_ties_break_on_lowest_id() {
        let mut current = TableDump::new();
        policer(&mut current, 2, "SAI_POLICER_MODE_SR_TCM", "100");
        policer(&mut current, 1, "SAI_POLICER_MODE_SR_TCM", "100");
        let mut temp = TableDump::new();
        policer(&mut temp, 9, "SAI_POLICER_MODE_SR_TCM", "100");

        let current = AsicView::from_dump(&current).unwrap();
        let temp = AsicView::from_dump(&temp).unwrap();
        let ctx = context();
        let finder = CandidateFinder::new(&current, &temp, &ctx);
        let found = finder.find_current_best_match(temp.live()[0]).unwrap().unwrap();
        assert_eq!(
            current.object(found).key.to_string(),
            "SAI_OBJECT_TYPE_POLICER:oid:0x12000000000001"
        );
    }

    #[test]
    fn test_oid_attribute_equality_goes_through_rid() {
        let mut current = TableDump::new();
        current.insert(
            "SAI_OBJECT_TYPE_HOSTIF_TRAP_GROUP:oid:0x11000000000001".to_string(),
            fields(&[("SAI_HOSTIF_TRAP_GROUP_ATTR_POLICER", "oid:0x12000000000001")]),
        );
        let mut temp = TableDump::new();
        temp.insert(
            "SAI_OBJECT_TYPE_HOSTIF_TRAP_GROUP:oid:0x11000000000007".to_string(),
            fields(&[("SAI_HOSTIF_TRAP_GROUP_ATTR_POLICER", "oid:0x12000000000005")]),
        );
        let mut current = AsicView::from_dump(&current).unwrap();
        let mut temp = AsicView::from_dump(&temp).unwrap();
        let rid = Rid::compose(0, ObjectType::Policer, 1, 1);
        current.set_identity(Vid::new(0x12000000000001), rid);
        temp.set_identity(Vid::new(0x12000000000005), rid);

        let ctx = context();
        let finder = CandidateFinder::new(&current, &temp, &ctx);
        let t = temp.object(temp.live()[0]).attr("SAI_HOSTIF_TRAP_GROUP_ATTR_POLICER").unwrap();
        let c = current.object(current.live()[0]).attr("SAI_HOSTIF_TRAP_GROUP_ATTR_POLICER").unwrap();
        assert!(finder.has_equal_attribute(t, c));
    }

    #[test]
    fn test_children_count() {
        let mut dump = TableDump::new();
        dump.insert(
            "SAI_OBJECT_TYPE_NEXT_HOP_GROUP:oid:0x5000000000001".to_string(),
            fields(&[("SAI_NEXT_HOP_GROUP_ATTR_TYPE", "SAI_NEXT_HOP_GROUP_TYPE_ECMP")]),
        );
        for i in 2..4 {
            dump.insert(
                format!("SAI_OBJECT_TYPE_NEXT_HOP_GROUP_MEMBER:oid:0x2d00000000000{i}"),
                fields(&[
                    ("SAI_NEXT_HOP_GROUP_MEMBER_ATTR_NEXT_HOP_GROUP_ID", "oid:0x5000000000001"),
                    ("SAI_NEXT_HOP_GROUP_MEMBER_ATTR_NEXT_HOP_ID", "oid:0x4000000000009"),
                ]),
            );
        }
        let view = AsicView::from_dump(&dump).unwrap();
        assert_eq!(children_count(&view, Vid::new(0x5000000000001), 0), 2);
        assert_eq!(children_count(&view, Vid::new(0x4000000000009), 0), 2);
    }
}
