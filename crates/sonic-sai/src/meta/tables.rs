use super::AclDataKind::{Oid as AclOid, OidList as AclOidList, Scalar};
use super::AttrAccess::{CreateAndSet as CAS, CreateOnly as CO, ReadOnly as RO};
use super::AttrDefault::{EmptyList, SwitchAttr, SwitchMac};
use super::AttrMeta as A;
use super::AttrValueType as T;
use crate::types::ObjectType;
use crate::types::ObjectType::*;

const NULL_OID: &str = "oid:0x0";
const NULL_PTR: &str = "ptr:0x0";
const DISABLED: &str = "disabled";
const FORWARD: &str = "SAI_PACKET_ACTION_FORWARD";

/// Switch attribute holding the default trap group.
pub const DEFAULT_TRAP_GROUP_ATTR: &str = "SAI_SWITCH_ATTR_DEFAULT_TRAP_GROUP";

static SWITCH: &[A] = &[
    A::new(Switch, "SAI_SWITCH_ATTR_INIT_SWITCH", T::Bool, CO).mandatory(),
    A::new(Switch, "SAI_SWITCH_ATTR_SRC_MAC_ADDRESS", T::Mac, CAS).default_value(SwitchMac),
    A::new(Switch, "SAI_SWITCH_ATTR_FDB_AGING_TIME", T::U32, CAS).default_const("0"),
    A::new(Switch, "SAI_SWITCH_ATTR_ECMP_DEFAULT_HASH_SEED", T::U32, CAS).default_const("0"),
    A::new(Switch, "SAI_SWITCH_ATTR_VXLAN_DEFAULT_PORT", T::U16, CAS).default_const("4789"),
    A::new(Switch, "SAI_SWITCH_ATTR_PORT_STATE_CHANGE_NOTIFY", T::Pointer, CAS).default_const(NULL_PTR),
    A::new(Switch, "SAI_SWITCH_ATTR_FDB_EVENT_NOTIFY", T::Pointer, CAS).default_const(NULL_PTR),
    A::new(Switch, "SAI_SWITCH_ATTR_ECMP_HASH_IPV4", T::Oid, CAS)
        .refs(&[Hash])
        .allow_null()
        .default_const(NULL_OID),
    A::new(Switch, "SAI_SWITCH_ATTR_QOS_DSCP_TO_TC_MAP", T::Oid, CAS)
        .refs(&[QosMap])
        .allow_null()
        .default_const(NULL_OID),
    A::new(Switch, "SAI_SWITCH_ATTR_INGRESS_ACL", T::Oid, CAS)
        .refs(&[AclTable, AclTableGroup])
        .allow_null()
        .default_const(NULL_OID),
    // Default objects the switch creates at init, reported read-only.
    A::new(Switch, "SAI_SWITCH_ATTR_CPU_PORT", T::Oid, RO),
    A::new(Switch, "SAI_SWITCH_ATTR_DEFAULT_VIRTUAL_ROUTER_ID", T::Oid, RO),
    A::new(Switch, DEFAULT_TRAP_GROUP_ATTR, T::Oid, RO),
    A::new(Switch, "SAI_SWITCH_ATTR_DEFAULT_VLAN_ID", T::Oid, RO),
    A::new(Switch, "SAI_SWITCH_ATTR_DEFAULT_STP_INST_ID", T::Oid, RO),
    A::new(Switch, "SAI_SWITCH_ATTR_DEFAULT_1Q_BRIDGE_ID", T::Oid, RO),
];

static PORT: &[A] = &[
    A::new(Port, "SAI_PORT_ATTR_HW_LANE_LIST", T::U32List, CO).mandatory().key(),
    A::new(Port, "SAI_PORT_ATTR_SPEED", T::U32, CAS)
        .mandatory()
        .default_value(super::AttrDefault::SwitchInternal),
    A::new(Port, "SAI_PORT_ATTR_ADMIN_STATE", T::Bool, CAS).default_const("false"),
    A::new(Port, "SAI_PORT_ATTR_MTU", T::U32, CAS).default_const("1514"),
    A::new(Port, "SAI_PORT_ATTR_FEC_MODE", T::Enum, CAS).default_const("SAI_PORT_FEC_MODE_NONE"),
    A::new(Port, "SAI_PORT_ATTR_PORT_VLAN_ID", T::U16, CAS).default_const("1"),
    A::new(Port, "SAI_PORT_ATTR_PRIORITY_FLOW_CONTROL", T::U8, CAS).default_const("0"),
    A::new(Port, "SAI_PORT_ATTR_QOS_DSCP_TO_TC_MAP", T::Oid, CAS)
        .refs(&[QosMap])
        .allow_null()
        .default_const(NULL_OID),
    A::new(Port, "SAI_PORT_ATTR_QOS_TC_TO_QUEUE_MAP", T::Oid, CAS)
        .refs(&[QosMap])
        .allow_null()
        .default_const(NULL_OID),
    A::new(Port, "SAI_PORT_ATTR_INGRESS_ACL", T::Oid, CAS)
        .refs(&[AclTable, AclTableGroup])
        .allow_null()
        .default_const(NULL_OID),
    A::new(Port, "SAI_PORT_ATTR_EGRESS_ACL", T::Oid, CAS)
        .refs(&[AclTable, AclTableGroup])
        .allow_null()
        .default_const(NULL_OID),
    A::new(Port, "SAI_PORT_ATTR_POLICER_ID", T::Oid, CAS)
        .refs(&[Policer])
        .allow_null()
        .default_const(NULL_OID),
];

static QUEUE: &[A] = &[
    A::new(Queue, "SAI_QUEUE_ATTR_TYPE", T::Enum, CO).mandatory(),
    A::new(Queue, "SAI_QUEUE_ATTR_PORT", T::Oid, CO).mandatory().refs(&[Port]),
    A::new(Queue, "SAI_QUEUE_ATTR_INDEX", T::U8, CO).mandatory(),
    A::new(Queue, "SAI_QUEUE_ATTR_PARENT_SCHEDULER_NODE", T::Oid, CAS)
        .mandatory()
        .refs(&[SchedulerGroup, Port])
        .default_value(super::AttrDefault::SwitchInternal),
    A::new(Queue, "SAI_QUEUE_ATTR_WRED_PROFILE_ID", T::Oid, CAS)
        .refs(&[Wred])
        .allow_null()
        .default_const(NULL_OID),
    A::new(Queue, "SAI_QUEUE_ATTR_BUFFER_PROFILE_ID", T::Oid, CAS)
        .refs(&[BufferProfile])
        .allow_null()
        .default_const(NULL_OID),
    A::new(Queue, "SAI_QUEUE_ATTR_SCHEDULER_PROFILE_ID", T::Oid, CAS)
        .refs(&[Scheduler])
        .allow_null()
        .default_const(NULL_OID),
];

static SCHEDULER_GROUP: &[A] = &[
    A::new(SchedulerGroup, "SAI_SCHEDULER_GROUP_ATTR_PORT_ID", T::Oid, CO)
        .mandatory()
        .refs(&[Port]),
    A::new(SchedulerGroup, "SAI_SCHEDULER_GROUP_ATTR_LEVEL", T::U8, CO).mandatory(),
    A::new(SchedulerGroup, "SAI_SCHEDULER_GROUP_ATTR_MAX_CHILDS", T::U8, CO).mandatory(),
    A::new(SchedulerGroup, "SAI_SCHEDULER_GROUP_ATTR_SCHEDULER_PROFILE_ID", T::Oid, CAS)
        .refs(&[Scheduler])
        .allow_null()
        .default_const(NULL_OID),
    A::new(SchedulerGroup, "SAI_SCHEDULER_GROUP_ATTR_PARENT_NODE", T::Oid, CAS)
        .mandatory()
        .refs(&[SchedulerGroup, Port])
        .default_value(super::AttrDefault::SwitchInternal),
];

static INGRESS_PRIORITY_GROUP: &[A] = &[
    A::new(IngressPriorityGroup, "SAI_INGRESS_PRIORITY_GROUP_ATTR_PORT", T::Oid, CO)
        .mandatory()
        .refs(&[Port]),
    A::new(IngressPriorityGroup, "SAI_INGRESS_PRIORITY_GROUP_ATTR_INDEX", T::U8, CO).mandatory(),
    A::new(IngressPriorityGroup, "SAI_INGRESS_PRIORITY_GROUP_ATTR_BUFFER_PROFILE", T::Oid, CAS)
        .refs(&[BufferProfile])
        .allow_null()
        .default_const(NULL_OID),
];

static VIRTUAL_ROUTER: &[A] = &[
    A::new(VirtualRouter, "SAI_VIRTUAL_ROUTER_ATTR_ADMIN_V4_STATE", T::Bool, CAS).default_const("true"),
    A::new(VirtualRouter, "SAI_VIRTUAL_ROUTER_ATTR_ADMIN_V6_STATE", T::Bool, CAS).default_const("true"),
    A::new(VirtualRouter, "SAI_VIRTUAL_ROUTER_ATTR_SRC_MAC_ADDRESS", T::Mac, CAS)
        .default_value(SwitchMac),
    A::new(VirtualRouter, "SAI_VIRTUAL_ROUTER_ATTR_VIOLATION_TTL1_PACKET_ACTION", T::Enum, CAS)
        .default_const("SAI_PACKET_ACTION_TRAP"),
    A::new(VirtualRouter, "SAI_VIRTUAL_ROUTER_ATTR_LABEL", T::Chardata, CAS)
        .key()
        .default_const(""),
];

static ROUTER_INTERFACE: &[A] = &[
    A::new(RouterInterface, "SAI_ROUTER_INTERFACE_ATTR_VIRTUAL_ROUTER_ID", T::Oid, CO)
        .mandatory()
        .refs(&[VirtualRouter]),
    A::new(RouterInterface, "SAI_ROUTER_INTERFACE_ATTR_TYPE", T::Enum, CO).mandatory(),
    A::new(RouterInterface, "SAI_ROUTER_INTERFACE_ATTR_PORT_ID", T::Oid, CO)
        .conditional()
        .refs(&[Port, Lag]),
    A::new(RouterInterface, "SAI_ROUTER_INTERFACE_ATTR_VLAN_ID", T::Oid, CO)
        .conditional()
        .refs(&[Vlan]),
    A::new(RouterInterface, "SAI_ROUTER_INTERFACE_ATTR_SRC_MAC_ADDRESS", T::Mac, CAS)
        .default_value(SwitchMac),
    A::new(RouterInterface, "SAI_ROUTER_INTERFACE_ATTR_ADMIN_V4_STATE", T::Bool, CAS).default_const("true"),
    A::new(RouterInterface, "SAI_ROUTER_INTERFACE_ATTR_ADMIN_V6_STATE", T::Bool, CAS).default_const("true"),
    A::new(RouterInterface, "SAI_ROUTER_INTERFACE_ATTR_MTU", T::U32, CAS).default_const("1514"),
];

static NEXT_HOP: &[A] = &[
    A::new(NextHop, "SAI_NEXT_HOP_ATTR_TYPE", T::Enum, CO).mandatory(),
    A::new(NextHop, "SAI_NEXT_HOP_ATTR_IP", T::IpAddress, CO).conditional(),
    A::new(NextHop, "SAI_NEXT_HOP_ATTR_ROUTER_INTERFACE_ID", T::Oid, CO)
        .conditional()
        .refs(&[RouterInterface]),
];

static NEXT_HOP_GROUP: &[A] = &[A::new(NextHopGroup, "SAI_NEXT_HOP_GROUP_ATTR_TYPE", T::Enum, CO).mandatory()];

static NEXT_HOP_GROUP_MEMBER: &[A] = &[
    A::new(NextHopGroupMember, "SAI_NEXT_HOP_GROUP_MEMBER_ATTR_NEXT_HOP_GROUP_ID", T::Oid, CO)
        .mandatory()
        .refs(&[NextHopGroup]),
    A::new(NextHopGroupMember, "SAI_NEXT_HOP_GROUP_MEMBER_ATTR_NEXT_HOP_ID", T::Oid, CO)
        .mandatory()
        .refs(&[NextHop]),
    A::new(NextHopGroupMember, "SAI_NEXT_HOP_GROUP_MEMBER_ATTR_WEIGHT", T::U32, CAS).default_const("1"),
];

static ROUTE_ENTRY: &[A] = &[
    A::new(RouteEntry, "SAI_ROUTE_ENTRY_ATTR_PACKET_ACTION", T::Enum, CAS).default_const(FORWARD),
    A::new(RouteEntry, "SAI_ROUTE_ENTRY_ATTR_NEXT_HOP_ID", T::Oid, CAS)
        .refs(&[NextHop, NextHopGroup, RouterInterface, Port])
        .allow_null()
        .default_const(NULL_OID),
    A::new(RouteEntry, "SAI_ROUTE_ENTRY_ATTR_META_DATA", T::U32, CAS).default_const("0"),
];

static NEIGHBOR_ENTRY: &[A] = &[
    A::new(NeighborEntry, "SAI_NEIGHBOR_ENTRY_ATTR_DST_MAC_ADDRESS", T::Mac, CAS).mandatory(),
    A::new(NeighborEntry, "SAI_NEIGHBOR_ENTRY_ATTR_PACKET_ACTION", T::Enum, CAS).default_const(FORWARD),
    A::new(NeighborEntry, "SAI_NEIGHBOR_ENTRY_ATTR_NO_HOST_ROUTE", T::Bool, CAS).default_const("false"),
];

static FDB_ENTRY: &[A] = &[
    A::new(FdbEntry, "SAI_FDB_ENTRY_ATTR_TYPE", T::Enum, CAS).mandatory(),
    A::new(FdbEntry, "SAI_FDB_ENTRY_ATTR_BRIDGE_PORT_ID", T::Oid, CAS)
        .refs(&[BridgePort])
        .allow_null()
        .default_const(NULL_OID),
    A::new(FdbEntry, "SAI_FDB_ENTRY_ATTR_PACKET_ACTION", T::Enum, CAS).default_const(FORWARD),
];

static NAT_ENTRY: &[A] = &[
    A::new(NatEntry, "SAI_NAT_ENTRY_ATTR_NAT_TYPE", T::Enum, CAS).default_const("SAI_NAT_TYPE_NONE"),
    A::new(NatEntry, "SAI_NAT_ENTRY_ATTR_SRC_IP", T::IpAddress, CAS).default_const("0.0.0.0"),
    A::new(NatEntry, "SAI_NAT_ENTRY_ATTR_DST_IP", T::IpAddress, CAS).default_const("0.0.0.0"),
    A::new(NatEntry, "SAI_NAT_ENTRY_ATTR_ENABLE_PACKET_COUNT", T::Bool, CAS).default_const("false"),
    A::new(NatEntry, "SAI_NAT_ENTRY_ATTR_HIT_BIT_COR", T::Bool, CAS).default_const("false"),
    A::new(NatEntry, "SAI_NAT_ENTRY_ATTR_HIT_BIT", T::Bool, CAS).default_const("false"),
];

static INSEG_ENTRY: &[A] = &[
    A::new(InsegEntry, "SAI_INSEG_ENTRY_ATTR_NUM_OF_POP", T::U32, CAS).default_const("0"),
    A::new(InsegEntry, "SAI_INSEG_ENTRY_ATTR_PACKET_ACTION", T::Enum, CAS).default_const(FORWARD),
    A::new(InsegEntry, "SAI_INSEG_ENTRY_ATTR_NEXT_HOP_ID", T::Oid, CAS)
        .refs(&[NextHop, NextHopGroup, RouterInterface, Port])
        .allow_null()
        .default_const(NULL_OID),
];

static VLAN: &[A] = &[
    A::new(Vlan, "SAI_VLAN_ATTR_VLAN_ID", T::U16, CO).mandatory().key(),
    A::new(Vlan, "SAI_VLAN_ATTR_LEARN_DISABLE", T::Bool, CAS).default_const("false"),
    A::new(Vlan, "SAI_VLAN_ATTR_MAX_LEARNED_ADDRESSES", T::U32, CAS).default_const("0"),
    A::new(Vlan, "SAI_VLAN_ATTR_STP_INSTANCE", T::Oid, CAS)
        .refs(&[Stp])
        .default_value(SwitchAttr("SAI_SWITCH_ATTR_DEFAULT_STP_INST_ID")),
];

static VLAN_MEMBER: &[A] = &[
    A::new(VlanMember, "SAI_VLAN_MEMBER_ATTR_VLAN_ID", T::Oid, CO).mandatory().refs(&[Vlan]),
    A::new(VlanMember, "SAI_VLAN_MEMBER_ATTR_BRIDGE_PORT_ID", T::Oid, CO)
        .mandatory()
        .refs(&[BridgePort]),
    A::new(VlanMember, "SAI_VLAN_MEMBER_ATTR_VLAN_TAGGING_MODE", T::Enum, CAS)
        .default_const("SAI_VLAN_TAGGING_MODE_UNTAGGED"),
];

static BRIDGE: &[A] = &[
    A::new(Bridge, "SAI_BRIDGE_ATTR_TYPE", T::Enum, CO).mandatory(),
    A::new(Bridge, "SAI_BRIDGE_ATTR_LEARN_DISABLE", T::Bool, CAS).default_const("false"),
];

static BRIDGE_PORT: &[A] = &[
    A::new(BridgePort, "SAI_BRIDGE_PORT_ATTR_TYPE", T::Enum, CO).mandatory(),
    A::new(BridgePort, "SAI_BRIDGE_PORT_ATTR_PORT_ID", T::Oid, CO)
        .conditional()
        .refs(&[Port, Lag]),
    A::new(BridgePort, "SAI_BRIDGE_PORT_ATTR_BRIDGE_ID", T::Oid, CAS)
        .refs(&[Bridge])
        .default_value(SwitchAttr("SAI_SWITCH_ATTR_DEFAULT_1Q_BRIDGE_ID")),
    A::new(BridgePort, "SAI_BRIDGE_PORT_ATTR_ADMIN_STATE", T::Bool, CAS).default_const("false"),
    A::new(BridgePort, "SAI_BRIDGE_PORT_ATTR_FDB_LEARNING_MODE", T::Enum, CAS)
        .default_const("SAI_BRIDGE_PORT_FDB_LEARNING_MODE_HW"),
];

static STP: &[A] = &[];

static STP_PORT: &[A] = &[
    A::new(StpPort, "SAI_STP_PORT_ATTR_STP", T::Oid, CO).mandatory().refs(&[Stp]),
    A::new(StpPort, "SAI_STP_PORT_ATTR_BRIDGE_PORT", T::Oid, CO)
        .mandatory()
        .refs(&[BridgePort]),
    A::new(StpPort, "SAI_STP_PORT_ATTR_STATE", T::Enum, CAS).mandatory(),
];

static LAG: &[A] = &[
    A::new(Lag, "SAI_LAG_ATTR_LABEL", T::Chardata, CAS).key().default_const(""),
    A::new(Lag, "SAI_LAG_ATTR_PORT_VLAN_ID", T::U16, CAS).default_const("1"),
    A::new(Lag, "SAI_LAG_ATTR_INGRESS_ACL", T::Oid, CAS)
        .refs(&[AclTable, AclTableGroup])
        .allow_null()
        .default_const(NULL_OID),
];

static LAG_MEMBER: &[A] = &[
    A::new(LagMember, "SAI_LAG_MEMBER_ATTR_LAG_ID", T::Oid, CO).mandatory().refs(&[Lag]),
    A::new(LagMember, "SAI_LAG_MEMBER_ATTR_PORT_ID", T::Oid, CO).mandatory().refs(&[Port]),
    A::new(LagMember, "SAI_LAG_MEMBER_ATTR_EGRESS_DISABLE", T::Bool, CAS).default_const("false"),
    A::new(LagMember, "SAI_LAG_MEMBER_ATTR_INGRESS_DISABLE", T::Bool, CAS).default_const("false"),
];

static HOSTIF_TRAP_GROUP: &[A] = &[
    A::new(HostifTrapGroup, "SAI_HOSTIF_TRAP_GROUP_ATTR_ADMIN_STATE", T::Bool, CAS).default_const("true"),
    A::new(HostifTrapGroup, "SAI_HOSTIF_TRAP_GROUP_ATTR_QUEUE", T::U32, CAS).default_const("0"),
    A::new(HostifTrapGroup, "SAI_HOSTIF_TRAP_GROUP_ATTR_POLICER", T::Oid, CAS)
        .refs(&[Policer])
        .allow_null()
        .default_const(NULL_OID),
];

static HOSTIF_TRAP: &[A] = &[
    A::new(HostifTrap, "SAI_HOSTIF_TRAP_ATTR_TRAP_TYPE", T::Enum, CO).mandatory().key(),
    A::new(HostifTrap, "SAI_HOSTIF_TRAP_ATTR_PACKET_ACTION", T::Enum, CAS).mandatory(),
    A::new(HostifTrap, "SAI_HOSTIF_TRAP_ATTR_TRAP_PRIORITY", T::U32, CAS).default_const("0"),
    A::new(HostifTrap, "SAI_HOSTIF_TRAP_ATTR_TRAP_GROUP", T::Oid, CAS)
        .refs(&[HostifTrapGroup])
        .default_value(SwitchAttr(DEFAULT_TRAP_GROUP_ATTR)),
];

static HOSTIF: &[A] = &[
    A::new(Hostif, "SAI_HOSTIF_ATTR_TYPE", T::Enum, CO).mandatory(),
    A::new(Hostif, "SAI_HOSTIF_ATTR_OBJ_ID", T::Oid, CO)
        .conditional()
        .refs(&[Port, Lag, RouterInterface]),
    A::new(Hostif, "SAI_HOSTIF_ATTR_NAME", T::Chardata, CO).conditional(),
    A::new(Hostif, "SAI_HOSTIF_ATTR_OPER_STATUS", T::Bool, CAS).default_const("false"),
];

static POLICER: &[A] = &[
    A::new(Policer, "SAI_POLICER_ATTR_METER_TYPE", T::Enum, CO).mandatory(),
    A::new(Policer, "SAI_POLICER_ATTR_MODE", T::Enum, CO).mandatory(),
    A::new(Policer, "SAI_POLICER_ATTR_CBS", T::U64, CAS).default_const("0"),
    A::new(Policer, "SAI_POLICER_ATTR_CIR", T::U64, CAS).default_const("0"),
    A::new(Policer, "SAI_POLICER_ATTR_PBS", T::U64, CAS).default_const("0"),
    A::new(Policer, "SAI_POLICER_ATTR_PIR", T::U64, CAS).default_const("0"),
    A::new(Policer, "SAI_POLICER_ATTR_RED_PACKET_ACTION", T::Enum, CAS).default_const(FORWARD),
];

static WRED: &[A] = &[
    A::new(Wred, "SAI_WRED_ATTR_GREEN_ENABLE", T::Bool, CAS).default_const("false"),
    A::new(Wred, "SAI_WRED_ATTR_GREEN_MIN_THRESHOLD", T::U32, CAS).default_const("0"),
    A::new(Wred, "SAI_WRED_ATTR_GREEN_MAX_THRESHOLD", T::U32, CAS).default_const("0"),
    A::new(Wred, "SAI_WRED_ATTR_ECN_MARK_MODE", T::Enum, CAS).default_const("SAI_ECN_MARK_MODE_NONE"),
];

static QOS_MAP: &[A] = &[
    A::new(QosMap, "SAI_QOS_MAP_ATTR_TYPE", T::Enum, CO).mandatory(),
    A::new(QosMap, "SAI_QOS_MAP_ATTR_MAP_TO_VALUE_LIST", T::QosMapList, CAS).mandatory(),
];

static SCHEDULER: &[A] = &[
    A::new(Scheduler, "SAI_SCHEDULER_ATTR_SCHEDULING_TYPE", T::Enum, CAS)
        .default_const("SAI_SCHEDULING_TYPE_WRR"),
    A::new(Scheduler, "SAI_SCHEDULER_ATTR_SCHEDULING_WEIGHT", T::U8, CAS).default_const("1"),
    A::new(Scheduler, "SAI_SCHEDULER_ATTR_METER_TYPE", T::Enum, CAS).default_const("SAI_METER_TYPE_BYTES"),
    A::new(Scheduler, "SAI_SCHEDULER_ATTR_MIN_BANDWIDTH_RATE", T::U64, CAS).default_const("0"),
    A::new(Scheduler, "SAI_SCHEDULER_ATTR_MAX_BANDWIDTH_RATE", T::U64, CAS).default_const("0"),
];

static BUFFER_POOL: &[A] = &[
    A::new(BufferPool, "SAI_BUFFER_POOL_ATTR_TYPE", T::Enum, CO).mandatory(),
    A::new(BufferPool, "SAI_BUFFER_POOL_ATTR_SIZE", T::U64, CAS).mandatory(),
    A::new(BufferPool, "SAI_BUFFER_POOL_ATTR_THRESHOLD_MODE", T::Enum, CO)
        .default_const("SAI_BUFFER_POOL_THRESHOLD_MODE_DYNAMIC"),
    A::new(BufferPool, "SAI_BUFFER_POOL_ATTR_XOFF_SIZE", T::U64, CAS).default_const("0"),
];

static BUFFER_PROFILE: &[A] = &[
    A::new(BufferProfile, "SAI_BUFFER_PROFILE_ATTR_POOL_ID", T::Oid, CAS)
        .mandatory()
        .refs(&[BufferPool]),
    A::new(BufferProfile, "SAI_BUFFER_PROFILE_ATTR_RESERVED_BUFFER_SIZE", T::U64, CAS).default_const("0"),
    A::new(BufferProfile, "SAI_BUFFER_PROFILE_ATTR_SHARED_DYNAMIC_TH", T::I32, CAS).default_const("0"),
    A::new(BufferProfile, "SAI_BUFFER_PROFILE_ATTR_XOFF_TH", T::U64, CAS).default_const("0"),
    A::new(BufferProfile, "SAI_BUFFER_PROFILE_ATTR_XON_TH", T::U64, CAS).default_const("0"),
];

static ACL_TABLE: &[A] = &[
    A::new(AclTable, "SAI_ACL_TABLE_ATTR_ACL_STAGE", T::Enum, CO).mandatory(),
    A::new(AclTable, "SAI_ACL_TABLE_ATTR_ACL_BIND_POINT_TYPE_LIST", T::EnumList, CO)
        .default_value(EmptyList),
    A::new(AclTable, "SAI_ACL_TABLE_ATTR_SIZE", T::U32, CO).default_const("0"),
    A::new(AclTable, "SAI_ACL_TABLE_ATTR_FIELD_SRC_IP", T::Bool, CO).default_const("false"),
    A::new(AclTable, "SAI_ACL_TABLE_ATTR_FIELD_DST_IP", T::Bool, CO).default_const("false"),
    A::new(AclTable, "SAI_ACL_TABLE_ATTR_FIELD_L4_SRC_PORT", T::Bool, CO).default_const("false"),
    A::new(AclTable, "SAI_ACL_TABLE_ATTR_FIELD_IN_PORTS", T::Bool, CO).default_const("false"),
];

static ACL_TABLE_GROUP: &[A] = &[
    A::new(AclTableGroup, "SAI_ACL_TABLE_GROUP_ATTR_ACL_STAGE", T::Enum, CO).mandatory(),
    A::new(AclTableGroup, "SAI_ACL_TABLE_GROUP_ATTR_ACL_BIND_POINT_TYPE_LIST", T::EnumList, CO)
        .default_value(EmptyList),
    A::new(AclTableGroup, "SAI_ACL_TABLE_GROUP_ATTR_TYPE", T::Enum, CO)
        .default_const("SAI_ACL_TABLE_GROUP_TYPE_SEQUENTIAL"),
];

static ACL_TABLE_GROUP_MEMBER: &[A] = &[
    A::new(AclTableGroupMember, "SAI_ACL_TABLE_GROUP_MEMBER_ATTR_ACL_TABLE_GROUP_ID", T::Oid, CO)
        .mandatory()
        .refs(&[AclTableGroup]),
    A::new(AclTableGroupMember, "SAI_ACL_TABLE_GROUP_MEMBER_ATTR_ACL_TABLE_ID", T::Oid, CO)
        .mandatory()
        .refs(&[AclTable]),
    A::new(AclTableGroupMember, "SAI_ACL_TABLE_GROUP_MEMBER_ATTR_PRIORITY", T::U32, CO).mandatory(),
];

static ACL_ENTRY: &[A] = &[
    A::new(AclEntry, "SAI_ACL_ENTRY_ATTR_TABLE_ID", T::Oid, CO).mandatory().refs(&[AclTable]),
    A::new(AclEntry, "SAI_ACL_ENTRY_ATTR_PRIORITY", T::U32, CAS).default_const("0"),
    A::new(AclEntry, "SAI_ACL_ENTRY_ATTR_ADMIN_STATE", T::Bool, CAS).default_const("true"),
    A::new(AclEntry, "SAI_ACL_ENTRY_ATTR_FIELD_SRC_IP", T::AclField(Scalar), CAS).default_const(DISABLED),
    A::new(AclEntry, "SAI_ACL_ENTRY_ATTR_FIELD_DST_IP", T::AclField(Scalar), CAS).default_const(DISABLED),
    A::new(AclEntry, "SAI_ACL_ENTRY_ATTR_FIELD_L4_SRC_PORT", T::AclField(Scalar), CAS)
        .default_const(DISABLED),
    A::new(AclEntry, "SAI_ACL_ENTRY_ATTR_FIELD_IN_PORTS", T::AclField(AclOidList), CAS)
        .refs(&[Port, Lag])
        .default_const(DISABLED),
    A::new(AclEntry, "SAI_ACL_ENTRY_ATTR_ACTION_PACKET_ACTION", T::AclAction(Scalar), CAS)
        .default_const(DISABLED),
    A::new(AclEntry, "SAI_ACL_ENTRY_ATTR_ACTION_REDIRECT", T::AclAction(AclOid), CAS)
        .refs(&[Port, Lag, NextHop, NextHopGroup])
        .default_const(DISABLED),
    A::new(AclEntry, "SAI_ACL_ENTRY_ATTR_ACTION_COUNTER", T::AclAction(AclOid), CAS)
        .refs(&[AclCounter])
        .default_const(DISABLED),
    A::new(AclEntry, "SAI_ACL_ENTRY_ATTR_ACTION_SET_POLICER", T::AclAction(AclOid), CAS)
        .refs(&[Policer])
        .default_const(DISABLED),
];

static ACL_COUNTER: &[A] = &[
    A::new(AclCounter, "SAI_ACL_COUNTER_ATTR_TABLE_ID", T::Oid, CO).mandatory().refs(&[AclTable]),
    A::new(AclCounter, "SAI_ACL_COUNTER_ATTR_ENABLE_PACKET_COUNT", T::Bool, CO).default_const("false"),
    A::new(AclCounter, "SAI_ACL_COUNTER_ATTR_ENABLE_BYTE_COUNT", T::Bool, CO).default_const("false"),
    A::new(AclCounter, "SAI_ACL_COUNTER_ATTR_PACKETS", T::U64, CAS).default_const("0"),
    A::new(AclCounter, "SAI_ACL_COUNTER_ATTR_BYTES", T::U64, CAS).default_const("0"),
];

static HASH: &[A] = &[
    A::new(Hash, "SAI_HASH_ATTR_NATIVE_HASH_FIELD_LIST", T::EnumList, CAS).default_value(EmptyList),
];

pub(super) fn for_type(object_type: ObjectType) -> &'static [A] {
    match object_type {
        Null => &[],
        Switch => SWITCH,
        Port => PORT,
        Queue => QUEUE,
        SchedulerGroup => SCHEDULER_GROUP,
        IngressPriorityGroup => INGRESS_PRIORITY_GROUP,
        VirtualRouter => VIRTUAL_ROUTER,
        RouterInterface => ROUTER_INTERFACE,
        NextHop => NEXT_HOP,
        NextHopGroup => NEXT_HOP_GROUP,
        NextHopGroupMember => NEXT_HOP_GROUP_MEMBER,
        RouteEntry => ROUTE_ENTRY,
        NeighborEntry => NEIGHBOR_ENTRY,
        FdbEntry => FDB_ENTRY,
        NatEntry => NAT_ENTRY,
        InsegEntry => INSEG_ENTRY,
        Vlan => VLAN,
        VlanMember => VLAN_MEMBER,
        Bridge => BRIDGE,
        BridgePort => BRIDGE_PORT,
        Stp => STP,
        StpPort => STP_PORT,
        Lag => LAG,
        LagMember => LAG_MEMBER,
        HostifTrapGroup => HOSTIF_TRAP_GROUP,
        HostifTrap => HOSTIF_TRAP,
        Hostif => HOSTIF,
        Policer => POLICER,
        Wred => WRED,
        QosMap => QOS_MAP,
        Scheduler => SCHEDULER,
        BufferPool => BUFFER_POOL,
        BufferProfile => BUFFER_PROFILE,
        AclTable => ACL_TABLE,
        AclTableGroup => ACL_TABLE_GROUP,
        AclTableGroupMember => ACL_TABLE_GROUP_MEMBER,
        AclEntry => ACL_ENTRY,
        AclCounter => ACL_COUNTER,
        Hash => HASH,
    }
}
