//! What the engine knows about the physical switch.
//!
//! Holds the objects the switch created by itself at init (discovered RIDs,
//! cold/warm boot VIDs, hidden default objects), the switch-internal
//! defaults of discovered OID attributes and the removal policy. The engine
//! consults it to resolve attribute defaults and to decide whether a
//! leftover object may be removed or must only be reset.

use log::warn;
use sonic_sai::meta::{AttrDefault, DEFAULT_TRAP_GROUP_ATTR};
use sonic_sai::{AttrMeta, AttrValue, MacAddress, ObjectType, Rid, SaiAttribute, Vid};
use std::collections::{BTreeMap, BTreeSet};

use crate::config::RemovalPolicy;
use crate::error::Result;
use crate::view::AsicView;

#[derive(Debug, Clone)]
pub struct SwitchContext {
    switch_vid: Vid,
    switch_rid: Rid,
    default_mac: Option<MacAddress>,
    discovered_rids: BTreeSet<Rid>,
    cold_boot_vids: BTreeMap<Vid, ObjectType>,
    warm_boot_vids: BTreeSet<Vid>,
    /// Switch attribute name to the default object it reports.
    hidden: BTreeMap<String, Rid>,
    default_oid_attrs: BTreeMap<(Rid, &'static str), Rid>,
    init_view_removed_vids: BTreeSet<Vid>,
    policy: RemovalPolicy,
}

impl SwitchContext {
    pub fn new(switch_vid: Vid, switch_rid: Rid) -> Self {
        Self {
            switch_vid,
            switch_rid,
            default_mac: None,
            discovered_rids: BTreeSet::new(),
            cold_boot_vids: BTreeMap::new(),
            warm_boot_vids: BTreeSet::new(),
            hidden: BTreeMap::new(),
            default_oid_attrs: BTreeMap::new(),
            init_view_removed_vids: BTreeSet::new(),
            policy: RemovalPolicy::default(),
        }
    }

    pub fn switch_vid(&self) -> Vid {
        self.switch_vid
    }

    pub fn switch_rid(&self) -> Rid {
        self.switch_rid
    }

    pub fn set_default_mac(&mut self, mac: MacAddress) {
        self.default_mac = Some(mac);
    }

    pub fn set_policy(&mut self, policy: RemovalPolicy) {
        self.policy = policy;
    }

    /// Records an object the switch created at cold boot.
    pub fn add_cold_boot_object(&mut self, rid: Rid, vid: Vid, object_type: ObjectType) {
        self.discovered_rids.insert(rid);
        self.cold_boot_vids.insert(vid, object_type);
    }

    /// Records a cold boot VID whose RID is not known.
    pub fn add_cold_boot_vid(&mut self, vid: Vid, object_type: ObjectType) {
        self.cold_boot_vids.insert(vid, object_type);
    }

    /// Records an object discovered after a warm boot.
    pub fn add_warm_boot_object(&mut self, rid: Rid, vid: Vid) {
        self.discovered_rids.insert(rid);
        self.warm_boot_vids.insert(vid);
    }

    pub fn add_discovered_rid(&mut self, rid: Rid) {
        self.discovered_rids.insert(rid);
    }

    /// Records the default object reported under switch attribute `name`.
    /// Does not mark it discovered.
    pub fn add_hidden(&mut self, name: impl Into<String>, rid: Rid) {
        self.hidden.insert(name.into(), rid);
    }

    /// Records the value a discovered object held for an OID attribute at init.
    pub fn add_default_oid_attr(&mut self, rid: Rid, name: &'static str, value: Rid) {
        self.default_oid_attrs.insert((rid, name), value);
    }

    pub fn add_init_view_removed_vid(&mut self, vid: Vid) {
        self.init_view_removed_vids.insert(vid);
    }

    pub fn discovered_rids(&self) -> impl Iterator<Item = Rid> + '_ {
        self.discovered_rids.iter().copied()
    }

    pub fn is_discovered(&self, rid: Rid) -> bool {
        self.discovered_rids.contains(&rid)
    }

    pub fn remove_discovered(&mut self, rid: Rid) {
        self.discovered_rids.remove(&rid);
    }

    pub fn cold_boot_vids(&self) -> &BTreeMap<Vid, ObjectType> {
        &self.cold_boot_vids
    }

    pub fn is_cold_boot_vid(&self, vid: Vid) -> bool {
        self.cold_boot_vids.contains_key(&vid)
    }

    pub fn is_warm_boot_vid(&self, vid: Vid) -> bool {
        self.warm_boot_vids.contains(&vid)
    }

    pub fn is_init_view_removed(&self, vid: Vid) -> bool {
        self.init_view_removed_vids.contains(&vid)
    }

    pub fn hidden(&self) -> &BTreeMap<String, Rid> {
        &self.hidden
    }

    pub fn hidden_rid(&self, name: &str) -> Option<Rid> {
        self.hidden.get(name).copied()
    }

    pub fn is_hidden_rid(&self, rid: Rid) -> bool {
        self.hidden.values().any(|r| *r == rid)
    }

    pub fn default_trap_group_rid(&self) -> Option<Rid> {
        self.hidden_rid(DEFAULT_TRAP_GROUP_ATTR)
    }

    pub fn default_oid_attr(&self, rid: Rid, name: &str) -> Option<Rid> {
        self.default_oid_attrs
            .iter()
            .find(|((r, n), _)| *r == rid && *n == name)
            .map(|(_, value)| *value)
    }

    /// Discovered objects the device does not let us remove are reset to
    /// their defaults instead.
    pub fn is_non_removable(&self, rid: Rid, vid: Vid) -> bool {
        if self.is_hidden_rid(rid) {
            return true;
        }
        if !self.is_cold_boot_vid(vid) {
            return false;
        }
        match vid.object_type() {
            Some(object_type) => self.policy.keeps(object_type),
            None => true,
        }
    }

    /// Default value of `meta` expressed in `view` identity, if one is known.
    pub fn default_attribute(
        &self,
        view: &AsicView,
        meta: &'static AttrMeta,
    ) -> Result<Option<SaiAttribute>> {
        Ok(match meta.default {
            AttrDefault::None | AttrDefault::SwitchInternal => None,
            AttrDefault::Const(text) => Some(SaiAttribute::parse(meta, text)?),
            AttrDefault::EmptyList => Some(SaiAttribute::parse(meta, "0:null")?),
            AttrDefault::SwitchMac => self
                .default_mac
                .map(|mac| SaiAttribute::new(meta, AttrValue::Mac(mac))),
            AttrDefault::SwitchAttr(name) => {
                let vid = self.hidden_rid(name).and_then(|rid| view.rid_to_vid(rid));
                match vid {
                    Some(vid) => Some(SaiAttribute::new(meta, AttrValue::Oid(vid.into()))),
                    None => {
                        warn!("default object for {} ({name}) not found in view", meta.name);
                        None
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sonic_sai::meta::attr_by_name;

    fn rid(ot: ObjectType, index: u64) -> Rid {
        Rid::compose(0, ot, 1, index)
    }

    fn vid(ot: ObjectType, index: u64) -> Vid {
        Vid::compose(0, ot, 0, index)
    }

    fn context() -> SwitchContext {
        SwitchContext::new(vid(ObjectType::Switch, 0), rid(ObjectType::Switch, 0))
    }

    #[test]
    fn test_non_removable_classification() {
        let mut ctx = context();
        ctx.add_cold_boot_object(rid(ObjectType::Queue, 1), vid(ObjectType::Queue, 1), ObjectType::Queue);
        ctx.add_cold_boot_object(
            rid(ObjectType::BridgePort, 1),
            vid(ObjectType::BridgePort, 1),
            ObjectType::BridgePort,
        );
        ctx.add_cold_boot_object(rid(ObjectType::Vlan, 1), vid(ObjectType::Vlan, 1), ObjectType::Vlan);
        ctx.add_hidden("SAI_SWITCH_ATTR_DEFAULT_VLAN_ID", rid(ObjectType::Vlan, 1));

        assert!(ctx.is_non_removable(rid(ObjectType::Queue, 1), vid(ObjectType::Queue, 1)));
        assert!(!ctx.is_non_removable(rid(ObjectType::BridgePort, 1), vid(ObjectType::BridgePort, 1)));
        assert!(ctx.is_non_removable(rid(ObjectType::Vlan, 1), vid(ObjectType::Vlan, 1)));
        // Created by the control plane, always removable.
        assert!(!ctx.is_non_removable(rid(ObjectType::Queue, 9), vid(ObjectType::Queue, 9)));
    }

    #[test]
    fn test_default_oid_attr_lookup() {
        let mut ctx = context();
        let sg = rid(ObjectType::SchedulerGroup, 3);
        let parent = rid(ObjectType::SchedulerGroup, 1);
        ctx.add_default_oid_attr(sg, "SAI_SCHEDULER_GROUP_ATTR_PARENT_NODE", parent);
        assert_eq!(ctx.default_oid_attr(sg, "SAI_SCHEDULER_GROUP_ATTR_PARENT_NODE"), Some(parent));
        assert_eq!(ctx.default_oid_attr(sg, "SAI_SCHEDULER_GROUP_ATTR_SCHEDULER_PROFILE_ID"), None);
    }

    #[test]
    fn test_default_attribute_resolution() {
        let mut ctx = context();
        let view = AsicView::new();

        let mtu = attr_by_name(ObjectType::Port, "SAI_PORT_ATTR_MTU").unwrap();
        let value = ctx.default_attribute(&view, mtu).unwrap().unwrap();
        assert_eq!(value.to_string(), "SAI_PORT_ATTR_MTU=1514");

        let speed = attr_by_name(ObjectType::Port, "SAI_PORT_ATTR_SPEED").unwrap();
        assert_eq!(ctx.default_attribute(&view, speed).unwrap(), None);

        let mac = attr_by_name(ObjectType::RouterInterface, "SAI_ROUTER_INTERFACE_ATTR_SRC_MAC_ADDRESS").unwrap();
        assert_eq!(ctx.default_attribute(&view, mac).unwrap(), None);
        ctx.set_default_mac("00:11:22:33:44:55".parse().unwrap());
        let value = ctx.default_attribute(&view, mac).unwrap().unwrap();
        assert_eq!(value.value.to_string(), "00:11:22:33:44:55");

        // Trap group default needs the hidden object mapped in the view.
        let group = attr_by_name(ObjectType::HostifTrap, "SAI_HOSTIF_TRAP_ATTR_TRAP_GROUP").unwrap();
        ctx.add_hidden(DEFAULT_TRAP_GROUP_ATTR, rid(ObjectType::HostifTrapGroup, 1));
        assert_eq!(ctx.default_attribute(&view, group).unwrap(), None);
    }
}
