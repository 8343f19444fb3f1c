//! Object identifiers and object types.
//!
//! Every hardware object is addressed in one of two identifier spaces: the
//! virtual space owned by the control plane (VIDs) and the real space owned
//! by the device driver (RIDs). [`SaiObjectId`] is tagged with the space so
//! the two cannot be mixed by accident. Identifiers carried inside attribute
//! values and entry keys use the [`Opaque`] space because the same value is
//! rewritten from one space to the other on its way to the device.
//!
//! Both spaces share the same bit layout:
//!
//! ```text
//! 63      56 55      48 47      40 39                                  0
//! +---------+----------+----------+-------------------------------------+
//! | switch  |  object  |  global  |             object index            |
//! |  index  |   type   |  context |                                     |
//! +---------+----------+----------+-------------------------------------+
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::str::FromStr;

use crate::error::SaiError;

/// Raw object id type (matches sai_object_id_t in C).
pub type RawSaiObjectId = u64;

const SWITCH_INDEX_SHIFT: u32 = 56;
const OBJECT_TYPE_SHIFT: u32 = 48;
const CONTEXT_SHIFT: u32 = 40;
const INDEX_MASK: u64 = 0x00ff_ffff_ffff;

/// Marker trait for identifier spaces.
pub trait IdSpace: Send + Sync + 'static {
    /// Short name used in debug output.
    fn space_name() -> &'static str;
}

/// Control-plane identifiers, stable across restarts.
#[derive(Debug, Clone, Copy)]
pub struct Virtual;

/// Driver-assigned identifiers, valid while the hardware object exists.
#[derive(Debug, Clone, Copy)]
pub struct Real;

/// Identifiers embedded in attribute values and entry keys.
#[derive(Debug, Clone, Copy)]
pub struct Opaque;

impl IdSpace for Virtual {
    fn space_name() -> &'static str {
        "Vid"
    }
}

impl IdSpace for Real {
    fn space_name() -> &'static str {
        "Rid"
    }
}

impl IdSpace for Opaque {
    fn space_name() -> &'static str {
        "Oid"
    }
}

/// An object id tagged with its identifier space.
#[derive(Clone, Copy)]
pub struct SaiObjectId<S: IdSpace> {
    raw: RawSaiObjectId,
    _marker: PhantomData<S>,
}

/// Virtual object id.
pub type Vid = SaiObjectId<Virtual>;
/// Real object id.
pub type Rid = SaiObjectId<Real>;
/// Space-less object id as found in values and keys.
pub type Oid = SaiObjectId<Opaque>;

impl<S: IdSpace> SaiObjectId<S> {
    /// The null object id (SAI_NULL_OBJECT_ID).
    pub const NULL: Self = Self {
        raw: 0,
        _marker: PhantomData,
    };

    /// Returns `None` for the null id.
    pub fn from_raw(raw: RawSaiObjectId) -> Option<Self> {
        (raw != 0).then_some(Self::new(raw))
    }

    pub const fn new(raw: RawSaiObjectId) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    /// Builds an id from its layout fields.
    pub const fn compose(
        switch_index: u8,
        object_type: ObjectType,
        context: u8,
        index: u64,
    ) -> Self {
        Self::new(
            ((switch_index as u64) << SWITCH_INDEX_SHIFT)
                | ((object_type as u64 & 0xff) << OBJECT_TYPE_SHIFT)
                | ((context as u64) << CONTEXT_SHIFT)
                | (index & INDEX_MASK),
        )
    }

    pub const fn as_raw(&self) -> RawSaiObjectId {
        self.raw
    }

    pub const fn is_null(&self) -> bool {
        self.raw == 0
    }

    /// Object type encoded in the id, `None` for null or unknown codes.
    pub fn object_type(&self) -> Option<ObjectType> {
        if self.is_null() {
            return None;
        }
        ObjectType::from_raw(((self.raw >> OBJECT_TYPE_SHIFT) & 0xff) as u32)
    }

    pub const fn switch_index(&self) -> u8 {
        (self.raw >> SWITCH_INDEX_SHIFT) as u8
    }

    pub const fn context(&self) -> u8 {
        (self.raw >> CONTEXT_SHIFT) as u8
    }

    pub const fn object_index(&self) -> u64 {
        self.raw & INDEX_MASK
    }

    /// Same id with a different object index.
    pub const fn with_object_index(&self, index: u64) -> Self {
        Self::new((self.raw & !INDEX_MASK) | (index & INDEX_MASK))
    }

    /// Switch id that owns this object.
    pub const fn switch_id(&self) -> Self {
        Self::compose(self.switch_index(), ObjectType::Switch, self.context(), 0)
    }

    /// Reinterprets the id in another space.
    pub const fn cast<T: IdSpace>(self) -> SaiObjectId<T> {
        SaiObjectId::new(self.raw)
    }
}

impl<S: IdSpace> fmt::Debug for SaiObjectId<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{:x})", S::space_name(), self.raw)
    }
}

impl<S: IdSpace> fmt::Display for SaiObjectId<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "oid:0x{:x}", self.raw)
    }
}

impl<S: IdSpace> FromStr for SaiObjectId<S> {
    type Err = SaiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix("oid:0x")
            .ok_or_else(|| SaiError::parse("object id", s))?;
        u64::from_str_radix(hex, 16)
            .map(Self::new)
            .map_err(|_| SaiError::parse("object id", s))
    }
}

impl<S: IdSpace> PartialEq for SaiObjectId<S> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<S: IdSpace> Eq for SaiObjectId<S> {}

impl<S: IdSpace> PartialOrd for SaiObjectId<S> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<S: IdSpace> Ord for SaiObjectId<S> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl<S: IdSpace> Hash for SaiObjectId<S> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<S: IdSpace> Default for SaiObjectId<S> {
    fn default() -> Self {
        Self::NULL
    }
}

impl<S: IdSpace> Serialize for SaiObjectId<S> {
    fn serialize<Z: Serializer>(&self, serializer: Z) -> Result<Z::Ok, Z::Error> {
        serializer.collect_str(self)
    }
}

impl<'de, S: IdSpace> Deserialize<'de> for SaiObjectId<S> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl From<Vid> for Oid {
    fn from(vid: Vid) -> Self {
        vid.cast()
    }
}

impl From<Rid> for Oid {
    fn from(rid: Rid) -> Self {
        rid.cast()
    }
}

impl From<Oid> for Vid {
    fn from(oid: Oid) -> Self {
        oid.cast()
    }
}

impl From<Oid> for Rid {
    fn from(oid: Oid) -> Self {
        oid.cast()
    }
}

macro_rules! define_object_types {
    ($($variant:ident = $code:literal => $name:literal),+ $(,)?) => {
        /// SAI object types known to this model.
        #[repr(u32)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum ObjectType {
            $($variant = $code,)+
        }

        impl ObjectType {
            pub const ALL: &'static [ObjectType] = &[$(ObjectType::$variant,)+];

            pub fn from_raw(code: u32) -> Option<Self> {
                match code {
                    $($code => Some(ObjectType::$variant),)+
                    _ => None,
                }
            }

            /// Name as used in serialized keys, e.g. `SAI_OBJECT_TYPE_PORT`.
            pub const fn name(&self) -> &'static str {
                match self {
                    $(ObjectType::$variant => $name,)+
                }
            }
        }

        impl FromStr for ObjectType {
            type Err = SaiError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(ObjectType::$variant),)+
                    _ => Err(SaiError::UnknownObjectType { name: s.to_string() }),
                }
            }
        }
    };
}

define_object_types! {
    Null = 0 => "SAI_OBJECT_TYPE_NULL",
    Port = 1 => "SAI_OBJECT_TYPE_PORT",
    Lag = 2 => "SAI_OBJECT_TYPE_LAG",
    VirtualRouter = 3 => "SAI_OBJECT_TYPE_VIRTUAL_ROUTER",
    NextHop = 4 => "SAI_OBJECT_TYPE_NEXT_HOP",
    NextHopGroup = 5 => "SAI_OBJECT_TYPE_NEXT_HOP_GROUP",
    RouterInterface = 6 => "SAI_OBJECT_TYPE_ROUTER_INTERFACE",
    AclTable = 7 => "SAI_OBJECT_TYPE_ACL_TABLE",
    AclEntry = 8 => "SAI_OBJECT_TYPE_ACL_ENTRY",
    AclCounter = 9 => "SAI_OBJECT_TYPE_ACL_COUNTER",
    AclTableGroup = 11 => "SAI_OBJECT_TYPE_ACL_TABLE_GROUP",
    AclTableGroupMember = 12 => "SAI_OBJECT_TYPE_ACL_TABLE_GROUP_MEMBER",
    Hostif = 13 => "SAI_OBJECT_TYPE_HOSTIF",
    Stp = 16 => "SAI_OBJECT_TYPE_STP",
    HostifTrapGroup = 17 => "SAI_OBJECT_TYPE_HOSTIF_TRAP_GROUP",
    Policer = 18 => "SAI_OBJECT_TYPE_POLICER",
    Wred = 19 => "SAI_OBJECT_TYPE_WRED",
    QosMap = 20 => "SAI_OBJECT_TYPE_QOS_MAP",
    Queue = 21 => "SAI_OBJECT_TYPE_QUEUE",
    Scheduler = 22 => "SAI_OBJECT_TYPE_SCHEDULER",
    SchedulerGroup = 23 => "SAI_OBJECT_TYPE_SCHEDULER_GROUP",
    BufferPool = 24 => "SAI_OBJECT_TYPE_BUFFER_POOL",
    BufferProfile = 25 => "SAI_OBJECT_TYPE_BUFFER_PROFILE",
    IngressPriorityGroup = 26 => "SAI_OBJECT_TYPE_INGRESS_PRIORITY_GROUP",
    LagMember = 27 => "SAI_OBJECT_TYPE_LAG_MEMBER",
    Hash = 28 => "SAI_OBJECT_TYPE_HASH",
    FdbEntry = 32 => "SAI_OBJECT_TYPE_FDB_ENTRY",
    Switch = 33 => "SAI_OBJECT_TYPE_SWITCH",
    HostifTrap = 34 => "SAI_OBJECT_TYPE_HOSTIF_TRAP",
    NeighborEntry = 36 => "SAI_OBJECT_TYPE_NEIGHBOR_ENTRY",
    RouteEntry = 37 => "SAI_OBJECT_TYPE_ROUTE_ENTRY",
    Vlan = 38 => "SAI_OBJECT_TYPE_VLAN",
    VlanMember = 39 => "SAI_OBJECT_TYPE_VLAN_MEMBER",
    NextHopGroupMember = 45 => "SAI_OBJECT_TYPE_NEXT_HOP_GROUP_MEMBER",
    StpPort = 46 => "SAI_OBJECT_TYPE_STP_PORT",
    Bridge = 57 => "SAI_OBJECT_TYPE_BRIDGE",
    BridgePort = 58 => "SAI_OBJECT_TYPE_BRIDGE_PORT",
    InsegEntry = 68 => "SAI_OBJECT_TYPE_INSEG_ENTRY",
    NatEntry = 82 => "SAI_OBJECT_TYPE_NAT_ENTRY",
}

impl ObjectType {
    /// Object types addressed by a structured key instead of an id.
    pub const fn is_non_object_id(&self) -> bool {
        matches!(
            self,
            ObjectType::FdbEntry
                | ObjectType::NeighborEntry
                | ObjectType::RouteEntry
                | ObjectType::InsegEntry
                | ObjectType::NatEntry
        )
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
