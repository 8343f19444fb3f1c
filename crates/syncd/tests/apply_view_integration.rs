//! Apply-view runs against the virtual switch.
//!
//! Every scenario starts from the same device: a switch with two ports and
//! its default virtual router, all created by the switch at cold boot. The
//! requested configuration is built from a table dump on top of those
//! objects, the way a control plane pushes it.

use pretty_assertions::assert_eq;
use sonic_sai::vs::DeviceOp;
use sonic_sai::{ObjectKey, ObjectType, Rid, SaiAttribute, SaiStatus, Vid, VirtualSwitch};
use sonic_syncd::{
    apply_view, compare_snapshots, ApplyReport, ApplyViewConfig, AsicView, ComparisonLogic,
    OpKind, Snapshot, SwitchContext, SyncdError, TableDump,
};
use std::collections::BTreeMap;
use tempfile::TempDir;

const SWITCH: &str = "SAI_OBJECT_TYPE_SWITCH:oid:0x21000000000000";
const PORT1: &str = "SAI_OBJECT_TYPE_PORT:oid:0x1000000000001";
const PORT2: &str = "SAI_OBJECT_TYPE_PORT:oid:0x1000000000002";
const VR: &str = "SAI_OBJECT_TYPE_VIRTUAL_ROUTER:oid:0x3000000000003";

const RIF: &str = "SAI_OBJECT_TYPE_ROUTER_INTERFACE:oid:0x6000000000010";
const NH: &str = "SAI_OBJECT_TYPE_NEXT_HOP:oid:0x4000000000011";
const ROUTE: &str = r#"SAI_OBJECT_TYPE_ROUTE_ENTRY:{"dest":"10.1.0.0/16","switch_id":"oid:0x21000000000000","vr":"oid:0x3000000000003"}"#;

type Fields<'a> = &'a [(&'a str, &'a str)];

fn base_dump() -> TableDump {
    let mut dump = TableDump::new();
    add(&mut dump, SWITCH, &[]);
    add(
        &mut dump,
        PORT1,
        &[("SAI_PORT_ATTR_HW_LANE_LIST", "4:1,2,3,4"), ("SAI_PORT_ATTR_SPEED", "100000")],
    );
    add(
        &mut dump,
        PORT2,
        &[("SAI_PORT_ATTR_HW_LANE_LIST", "4:5,6,7,8"), ("SAI_PORT_ATTR_SPEED", "100000")],
    );
    add(&mut dump, VR, &[]);
    dump
}

fn add(dump: &mut TableDump, key: &str, fields: Fields<'_>) {
    let mut map: BTreeMap<String, String> = fields
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();
    if map.is_empty() {
        map.insert("NULL".to_string(), "NULL".to_string());
    }
    dump.insert(key.to_string(), map);
}

fn vid_of(key: &str) -> Vid {
    let key: ObjectKey = key.parse().unwrap();
    Vid::from(key.object_id().unwrap())
}

fn routed_objects(dump: &mut TableDump) {
    add(
        dump,
        RIF,
        &[
            ("SAI_ROUTER_INTERFACE_ATTR_VIRTUAL_ROUTER_ID", "oid:0x3000000000003"),
            ("SAI_ROUTER_INTERFACE_ATTR_TYPE", "SAI_ROUTER_INTERFACE_TYPE_PORT"),
            ("SAI_ROUTER_INTERFACE_ATTR_PORT_ID", "oid:0x1000000000001"),
        ],
    );
    add(
        dump,
        NH,
        &[
            ("SAI_NEXT_HOP_ATTR_TYPE", "SAI_NEXT_HOP_TYPE_IP"),
            ("SAI_NEXT_HOP_ATTR_IP", "10.0.0.1"),
            ("SAI_NEXT_HOP_ATTR_ROUTER_INTERFACE_ID", "oid:0x6000000000010"),
        ],
    );
    add(dump, ROUTE, &[("SAI_ROUTE_ENTRY_ATTR_NEXT_HOP_ID", "oid:0x4000000000011")]);
}

struct Device {
    vs: VirtualSwitch,
    current: AsicView,
    switch: SwitchContext,
    config: ApplyViewConfig,
}

impl Device {
    /// The cold-booted switch, already reflected in the current view.
    fn new() -> Self {
        let mut vs = VirtualSwitch::new(0);
        let mut current = AsicView::from_dump(&base_dump()).unwrap();

        let mut identities = Vec::new();
        for idx in current.live() {
            let object = current.object(idx);
            let attrs: Vec<SaiAttribute> = object.attributes().cloned().collect();
            let rid = vs.insert_existing(object.object_type(), attrs);
            identities.push((object.vid().unwrap(), object.object_type(), rid));
        }

        let switch_rid = identities
            .iter()
            .find(|(_, ot, _)| *ot == ObjectType::Switch)
            .map(|(_, _, rid)| *rid)
            .unwrap();
        let mut switch = SwitchContext::new(vid_of(SWITCH), switch_rid);
        for (vid, object_type, rid) in identities {
            current.set_identity(vid, rid);
            if object_type == ObjectType::Switch {
                continue;
            }
            switch.add_cold_boot_object(rid, vid, object_type);
            if object_type == ObjectType::VirtualRouter {
                switch.add_hidden("SAI_SWITCH_ATTR_DEFAULT_VIRTUAL_ROUTER_ID", rid);
            }
        }

        let mut config = ApplyViewConfig::default();
        config.execution.consistency_check = true;

        Device {
            vs,
            current,
            switch,
            config,
        }
    }

    fn apply(&mut self, dump: &TableDump) -> Result<ApplyReport, SyncdError> {
        let temp = AsicView::from_dump(dump).unwrap();
        apply_view(&mut self.vs, &mut self.current, temp, &mut self.switch, &self.config)
    }

    fn rid(&self, key: &str) -> Rid {
        self.current.vid_to_rid(vid_of(key)).unwrap()
    }

    /// Runs only the comparison and returns what it would send.
    fn plan(&self, dump: &TableDump) -> (AsicView, AsicView) {
        let mut current = self.current.clone();
        let mut temp = AsicView::from_dump(dump).unwrap();
        let breaks = self.config.break_config().unwrap();
        ComparisonLogic::new(&mut current, &mut temp, &self.switch, &breaks, &self.config.engine)
            .compare_views()
            .unwrap();
        (current, temp)
    }
}

fn shape(report_ops: &[sonic_syncd::AsicOperation]) -> Vec<(OpKind, ObjectType)> {
    report_ops
        .iter()
        .map(|op| (op.kind, op.key.object_type()))
        .collect()
}

fn assert_reference_counts(view: &AsicView) {
    let mut expected: BTreeMap<Vid, u32> = BTreeMap::new();
    for idx in view.live() {
        let object = view.object(idx);
        for vid in object.attr_vids().into_iter().chain(object.key_vids()) {
            *expected.entry(vid).or_default() += 1;
        }
    }
    for idx in view.live() {
        if let Some(vid) = view.object(idx).vid() {
            assert_eq!(
                view.ref_count(vid).unwrap(),
                expected.get(&vid).copied().unwrap_or(0),
                "reference count of {vid}"
            );
        }
    }
}

fn assert_maps_symmetric(view: &AsicView) {
    assert_eq!(view.vid_rid_map().len(), view.rid_vid_map().len());
    for (vid, rid) in view.vid_rid_map() {
        assert_eq!(view.rid_vid_map().get(rid), Some(vid));
    }
}

#[test]
fn test_same_configuration_is_a_no_op() {
    let mut device = Device::new();
    let report = device.apply(&base_dump()).unwrap();

    assert_eq!(
        report,
        ApplyReport {
            operations: 0,
            executed: 0,
            consistent: Some(true),
        }
    );
    assert!(device.vs.calls().is_empty());
    assert_eq!(device.current.live_count(), 4);
}

#[test]
fn test_route_is_programmed_after_its_dependencies() {
    let mut device = Device::new();
    let mut dump = base_dump();
    routed_objects(&mut dump);

    let (current, _) = device.plan(&dump);
    assert_eq!(
        shape(current.ops().operations()),
        vec![
            (OpKind::Create, ObjectType::RouterInterface),
            (OpKind::Create, ObjectType::NextHop),
            (OpKind::Create, ObjectType::RouteEntry),
        ]
    );

    let report = device.apply(&dump).unwrap();
    assert_eq!(report.executed, 3);
    assert_eq!(report.consistent, Some(true));
    assert_eq!(device.vs.object_count(), 7);

    let nh_rid = device.rid(NH);
    let route = device
        .vs
        .keys()
        .find(|key| key.object_type() == ObjectType::RouteEntry)
        .cloned()
        .unwrap();
    let next_hop = device
        .vs
        .attribute(&route, "SAI_ROUTE_ENTRY_ATTR_NEXT_HOP_ID")
        .unwrap();
    assert_eq!(next_hop.value.to_string(), nh_rid.to_string());
    assert_eq!(device.vs.reference_count(nh_rid), 1);

    assert_reference_counts(&device.current);
    assert_maps_symmetric(&device.current);

    // And converging again changes nothing.
    device.vs.clear_calls();
    let report = device.apply(&dump).unwrap();
    assert_eq!(report.operations, 0);
    assert!(device.vs.calls().is_empty());
}

#[test]
fn test_every_object_ends_in_a_terminal_state() {
    let device = Device::new();
    let mut dump = base_dump();
    routed_objects(&mut dump);

    let (current, temp) = device.plan(&dump);
    for view in [&current, &temp] {
        for (_, object) in view.all() {
            assert!(object.status.is_terminal(), "{} is {}", object.key, object.status);
        }
    }
}

#[test]
fn test_dropped_objects_are_removed_users_first() {
    let mut device = Device::new();
    let mut dump = base_dump();
    routed_objects(&mut dump);
    device.apply(&dump).unwrap();

    let (current, _) = device.plan(&base_dump());
    assert_eq!(
        shape(current.ops().operations()),
        vec![
            (OpKind::Remove, ObjectType::RouteEntry),
            (OpKind::Remove, ObjectType::NextHop),
            (OpKind::Remove, ObjectType::RouterInterface),
        ]
    );

    let report = device.apply(&base_dump()).unwrap();
    assert_eq!(report.executed, 3);
    assert_eq!(device.vs.object_count(), 4);
    assert_eq!(device.current.live_count(), 4);
    assert_reference_counts(&device.current);
    assert_maps_symmetric(&device.current);
}

#[test]
fn test_dropped_attribute_is_restored_to_default() {
    let mut device = Device::new();
    let port1 = ObjectKey::oid(ObjectType::Port, device.rid(PORT1));

    let mut dump = base_dump();
    dump.get_mut(PORT1)
        .unwrap()
        .insert("SAI_PORT_ATTR_MTU".to_string(), "9100".to_string());
    device.apply(&dump).unwrap();
    let mtu = device.vs.attribute(&port1, "SAI_PORT_ATTR_MTU").unwrap();
    assert_eq!(mtu.value.to_string(), "9100");

    let report = device.apply(&base_dump()).unwrap();
    assert_eq!(report.executed, 1);
    let set = device.vs.calls().last().unwrap();
    assert_eq!(set.op, DeviceOp::Set);
    assert_eq!(set.attrs, vec!["SAI_PORT_ATTR_MTU=1514".to_string()]);
    let mtu = device.vs.attribute(&port1, "SAI_PORT_ATTR_MTU").unwrap();
    assert_eq!(mtu.value.to_string(), "1514");
}

#[test]
fn test_create_only_change_on_switch_object_is_rejected() {
    let mut device = Device::new();
    let mut dump = base_dump();
    dump.get_mut(PORT1)
        .unwrap()
        .insert("SAI_PORT_ATTR_HW_LANE_LIST".to_string(), "4:9,10,11,12".to_string());

    let err = device.apply(&dump).unwrap_err();
    assert!(matches!(err, SyncdError::Comparison { .. }), "{err}");
    assert!(err.is_fatal_comparison());
    assert!(device.vs.calls().is_empty());
    assert_eq!(device.current.live_count(), 4);
}

#[test]
fn test_device_failure_during_execution_is_fatal() {
    let mut device = Device::new();
    device
        .vs
        .inject_fault(DeviceOp::Create, Some(ObjectType::RouterInterface), SaiStatus::Failure);
    let mut dump = base_dump();
    routed_objects(&mut dump);

    let err = device.apply(&dump).unwrap_err();
    assert!(err.is_fatal(), "{err}");
    assert_eq!(device.vs.object_count(), 4);
    assert_eq!(device.current.live_count(), 4);
}

#[test]
fn test_bulk_execution_reaches_the_same_device_state() {
    let mut device = Device::new();
    device.config.execution.use_bulk = true;
    let mut dump = base_dump();
    routed_objects(&mut dump);

    let report = device.apply(&dump).unwrap();
    assert_eq!(report.executed, 3);
    assert_eq!(report.consistent, Some(true));
    assert_eq!(device.vs.object_count(), 7);
}

fn interface_with_next_hops(dump: &mut TableDump, rif: &str, port: &str, next_hops: &[&str]) {
    let rif_oid = rif.split_once(':').unwrap().1;
    add(
        dump,
        rif,
        &[
            ("SAI_ROUTER_INTERFACE_ATTR_VIRTUAL_ROUTER_ID", "oid:0x3000000000003"),
            ("SAI_ROUTER_INTERFACE_ATTR_TYPE", "SAI_ROUTER_INTERFACE_TYPE_PORT"),
            ("SAI_ROUTER_INTERFACE_ATTR_PORT_ID", port),
        ],
    );
    for (i, nh) in next_hops.iter().enumerate() {
        let ip = format!("10.0.0.{}", i + 1);
        add(
            dump,
            nh,
            &[
                ("SAI_NEXT_HOP_ATTR_TYPE", "SAI_NEXT_HOP_TYPE_IP"),
                ("SAI_NEXT_HOP_ATTR_IP", &ip),
                ("SAI_NEXT_HOP_ATTR_ROUTER_INTERFACE_ID", rif_oid),
            ],
        );
    }
}

#[test]
fn test_break_before_make_frees_the_interface_first() {
    let mut device = Device::new();
    device.config.policy.break_before_make = vec!["SAI_OBJECT_TYPE_ROUTER_INTERFACE".to_string()];

    let mut dump = base_dump();
    interface_with_next_hops(
        &mut dump,
        RIF,
        "oid:0x1000000000001",
        &[
            "SAI_OBJECT_TYPE_NEXT_HOP:oid:0x4000000000011",
            "SAI_OBJECT_TYPE_NEXT_HOP:oid:0x4000000000012",
        ],
    );
    device.apply(&dump).unwrap();
    // Held by both next hops.
    assert_eq!(device.current.ref_count(vid_of(RIF)).unwrap(), 2);

    // Same interface moved to the other port, under new ids.
    let mut moved = base_dump();
    interface_with_next_hops(
        &mut moved,
        "SAI_OBJECT_TYPE_ROUTER_INTERFACE:oid:0x6000000000020",
        "oid:0x1000000000002",
        &[
            "SAI_OBJECT_TYPE_NEXT_HOP:oid:0x4000000000021",
            "SAI_OBJECT_TYPE_NEXT_HOP:oid:0x4000000000022",
        ],
    );

    let (current, _) = device.plan(&moved);
    let ops = current.ops().optimized(true, false).unwrap();
    assert_eq!(
        shape(&ops),
        vec![
            (OpKind::Remove, ObjectType::NextHop),
            (OpKind::Remove, ObjectType::NextHop),
            (OpKind::Remove, ObjectType::RouterInterface),
            (OpKind::Create, ObjectType::RouterInterface),
            (OpKind::Create, ObjectType::NextHop),
            (OpKind::Create, ObjectType::NextHop),
        ]
    );

    let report = device.apply(&moved).unwrap();
    assert_eq!(report.executed, 6);
    assert_eq!(device.vs.object_count(), 7);
    assert_reference_counts(&device.current);
    assert_maps_symmetric(&device.current);
}

#[test]
fn test_snapshot_of_converged_device_compares_equal_to_itself() {
    let mut device = Device::new();
    let mut dump = base_dump();
    routed_objects(&mut dump);
    device.apply(&dump).unwrap();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("asic.json");
    let snapshot = Snapshot::from_view(&device.current, &device.switch).unwrap();
    snapshot.save(&path).unwrap();

    let reloaded = Snapshot::load(&path).unwrap();
    assert_eq!(reloaded.object_count(), 7);
    let ops = compare_snapshots(&snapshot, &reloaded, &ApplyViewConfig::default()).unwrap();
    assert!(ops.is_empty(), "{ops:?}");
}
