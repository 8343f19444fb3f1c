//! Object keys.
//!
//! OID objects are keyed by their id. Non-OID entries (routes, neighbors,
//! FDB, NAT and MPLS in-segment entries) are keyed by a structure that embeds
//! other objects' ids. The serialized form of an entry is a JSON object with
//! its members in sorted order and ids written as `oid:0x..`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use crate::error::{SaiError, SaiResult};
use crate::types::{ObjectType, Oid};

/// Ethernet MAC address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct MacAddress(pub [u8; 6]);

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

impl FromStr for MacAddress {
    type Err = SaiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 6];
        let mut parts = s.split(':');
        for byte in bytes.iter_mut() {
            let part = parts.next().ok_or_else(|| SaiError::parse("mac", s))?;
            *byte = u8::from_str_radix(part, 16).map_err(|_| SaiError::parse("mac", s))?;
        }
        if parts.next().is_some() {
            return Err(SaiError::parse("mac", s));
        }
        Ok(MacAddress(bytes))
    }
}

/// IP prefix such as `10.0.0.0/24` or `::/0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IpPrefix {
    pub addr: IpAddr,
    pub len: u8,
}

impl IpPrefix {
    pub fn new(addr: IpAddr, len: u8) -> SaiResult<Self> {
        let max = if addr.is_ipv4() { 32 } else { 128 };
        if len > max {
            return Err(SaiError::invalid_parameter(format!(
                "prefix length {len} too long for {addr}"
            )));
        }
        Ok(Self { addr, len })
    }

    /// Default route prefix (`0.0.0.0/0` or `::/0`).
    pub fn is_default(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Display for IpPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.len)
    }
}

impl FromStr for IpPrefix {
    type Err = SaiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, len) = s
            .split_once('/')
            .ok_or_else(|| SaiError::parse("ip prefix", s))?;
        let addr: IpAddr = addr.parse().map_err(|_| SaiError::parse("ip prefix", s))?;
        let len: u8 = len.parse().map_err(|_| SaiError::parse("ip prefix", s))?;
        IpPrefix::new(addr, len)
    }
}

macro_rules! serde_via_string {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

serde_via_string!(MacAddress);
serde_via_string!(IpPrefix);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RouteEntry {
    pub dest: IpPrefix,
    pub switch_id: Oid,
    pub vr: Oid,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NeighborEntry {
    pub ip: IpAddr,
    pub rif: Oid,
    pub switch_id: Oid,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FdbEntry {
    /// Bridge or VLAN the MAC is learned on.
    pub bvid: Oid,
    pub mac: MacAddress,
    pub switch_id: Oid,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NatEntry {
    pub dst_ip: IpAddr,
    pub l4_dst_port: u16,
    pub l4_src_port: u16,
    pub nat_type: String,
    pub proto: u8,
    pub src_ip: IpAddr,
    pub switch_id: Oid,
    pub vr: Oid,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InsegEntry {
    pub label: u32,
    pub switch_id: Oid,
}

/// Structured key of a non-OID entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntryKey {
    Route(RouteEntry),
    Neighbor(NeighborEntry),
    Fdb(FdbEntry),
    Nat(NatEntry),
    Inseg(InsegEntry),
}

impl EntryKey {
    pub fn object_type(&self) -> ObjectType {
        match self {
            EntryKey::Route(_) => ObjectType::RouteEntry,
            EntryKey::Neighbor(_) => ObjectType::NeighborEntry,
            EntryKey::Fdb(_) => ObjectType::FdbEntry,
            EntryKey::Nat(_) => ObjectType::NatEntry,
            EntryKey::Inseg(_) => ObjectType::InsegEntry,
        }
    }

    pub fn switch_id(&self) -> Oid {
        match self {
            EntryKey::Route(e) => e.switch_id,
            EntryKey::Neighbor(e) => e.switch_id,
            EntryKey::Fdb(e) => e.switch_id,
            EntryKey::Nat(e) => e.switch_id,
            EntryKey::Inseg(e) => e.switch_id,
        }
    }

    /// Embedded ids other than the switch, in member order.
    pub fn oids(&self) -> Vec<Oid> {
        match self {
            EntryKey::Route(e) => vec![e.vr],
            EntryKey::Neighbor(e) => vec![e.rif],
            EntryKey::Fdb(e) => vec![e.bvid],
            EntryKey::Nat(e) => vec![e.vr],
            EntryKey::Inseg(_) => Vec::new(),
        }
    }

    /// Rewrites every embedded id, the switch id included.
    pub fn try_map_oids<E>(&self, mut f: impl FnMut(Oid) -> Result<Oid, E>) -> Result<Self, E> {
        let mut key = self.clone();
        match &mut key {
            EntryKey::Route(e) => {
                e.switch_id = f(e.switch_id)?;
                e.vr = f(e.vr)?;
            }
            EntryKey::Neighbor(e) => {
                e.switch_id = f(e.switch_id)?;
                e.rif = f(e.rif)?;
            }
            EntryKey::Fdb(e) => {
                e.switch_id = f(e.switch_id)?;
                e.bvid = f(e.bvid)?;
            }
            EntryKey::Nat(e) => {
                e.switch_id = f(e.switch_id)?;
                e.vr = f(e.vr)?;
            }
            EntryKey::Inseg(e) => {
                e.switch_id = f(e.switch_id)?;
            }
        }
        Ok(key)
    }

    /// Canonical JSON form used inside serialized keys.
    pub fn serialize_key(&self) -> String {
        let json = match self {
            EntryKey::Route(e) => serde_json::to_string(e),
            EntryKey::Neighbor(e) => serde_json::to_string(e),
            EntryKey::Fdb(e) => serde_json::to_string(e),
            EntryKey::Nat(e) => serde_json::to_string(e),
            EntryKey::Inseg(e) => serde_json::to_string(e),
        };
        // Plain structs of strings and integers always serialize.
        json.unwrap_or_default()
    }

    pub fn deserialize_key(object_type: ObjectType, s: &str) -> SaiResult<Self> {
        let err = |_| SaiError::parse("entry key", s);
        Ok(match object_type {
            ObjectType::RouteEntry => EntryKey::Route(serde_json::from_str(s).map_err(err)?),
            ObjectType::NeighborEntry => EntryKey::Neighbor(serde_json::from_str(s).map_err(err)?),
            ObjectType::FdbEntry => EntryKey::Fdb(serde_json::from_str(s).map_err(err)?),
            ObjectType::NatEntry => EntryKey::Nat(serde_json::from_str(s).map_err(err)?),
            ObjectType::InsegEntry => EntryKey::Inseg(serde_json::from_str(s).map_err(err)?),
            other => {
                return Err(SaiError::invalid_parameter(format!(
                    "{other} is not an entry type"
                )))
            }
        })
    }
}

/// Key of any object: an id for OID objects or a structured entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectKey {
    Oid { object_type: ObjectType, oid: Oid },
    Entry(EntryKey),
}

impl ObjectKey {
    pub fn oid(object_type: ObjectType, oid: impl Into<Oid>) -> Self {
        ObjectKey::Oid {
            object_type,
            oid: oid.into(),
        }
    }

    pub fn object_type(&self) -> ObjectType {
        match self {
            ObjectKey::Oid { object_type, .. } => *object_type,
            ObjectKey::Entry(entry) => entry.object_type(),
        }
    }

    /// Id of an OID object, `None` for entries.
    pub fn object_id(&self) -> Option<Oid> {
        match self {
            ObjectKey::Oid { oid, .. } => Some(*oid),
            ObjectKey::Entry(_) => None,
        }
    }

    pub fn entry(&self) -> Option<&EntryKey> {
        match self {
            ObjectKey::Entry(entry) => Some(entry),
            ObjectKey::Oid { .. } => None,
        }
    }

    pub fn try_map_oids<E>(&self, mut f: impl FnMut(Oid) -> Result<Oid, E>) -> Result<Self, E> {
        Ok(match self {
            ObjectKey::Oid { object_type, oid } => ObjectKey::Oid {
                object_type: *object_type,
                oid: f(*oid)?,
            },
            ObjectKey::Entry(entry) => ObjectKey::Entry(entry.try_map_oids(f)?),
        })
    }

    /// Key without the type prefix.
    pub fn serialize_key(&self) -> String {
        match self {
            ObjectKey::Oid { oid, .. } => oid.to_string(),
            ObjectKey::Entry(entry) => entry.serialize_key(),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.object_type(), self.serialize_key())
    }
}

impl FromStr for ObjectKey {
    type Err = SaiError;

    /// Parses `"<TypeName>:<serialized-key>"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (type_name, key) = s
            .split_once(':')
            .ok_or_else(|| SaiError::parse("object key", s))?;
        let object_type: ObjectType = type_name.parse()?;
        if object_type.is_non_object_id() {
            Ok(ObjectKey::Entry(EntryKey::deserialize_key(object_type, key)?))
        } else {
            Ok(ObjectKey::Oid {
                object_type,
                oid: key.parse()?,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn route(dest: &str) -> EntryKey {
        EntryKey::Route(RouteEntry {
            dest: dest.parse().unwrap(),
            switch_id: Oid::new(0x21000000000000),
            vr: Oid::new(0x3000000000022),
        })
    }

    #[test]
    fn test_mac_parse() {
        let mac: MacAddress = "00:11:22:aa:bb:cc".parse().unwrap();
        assert_eq!(mac.to_string(), "00:11:22:AA:BB:CC");
        assert!("00:11:22".parse::<MacAddress>().is_err());
        assert!("00:11:22:aa:bb:cc:dd".parse::<MacAddress>().is_err());
    }

    #[test]
    fn test_prefix_parse() {
        let p: IpPrefix = "0.0.0.0/0".parse().unwrap();
        assert!(p.is_default());
        let p: IpPrefix = "fc00::/7".parse().unwrap();
        assert_eq!(p.len, 7);
        assert!("10.0.0.0/33".parse::<IpPrefix>().is_err());
    }

    #[test]
    fn test_route_key_text_form() {
        let key = ObjectKey::Entry(route("10.0.0.0/24"));
        let text = key.to_string();
        assert_eq!(
            text,
            "SAI_OBJECT_TYPE_ROUTE_ENTRY:{\"dest\":\"10.0.0.0/24\",\"switch_id\":\"oid:0x21000000000000\",\"vr\":\"oid:0x3000000000022\"}"
        );
        assert_eq!(text.parse::<ObjectKey>().unwrap(), key);
    }

    #[test]
    fn test_oid_key_text_form() {
        let key: ObjectKey = "SAI_OBJECT_TYPE_PORT:oid:0x1000000000002".parse().unwrap();
        assert_eq!(key.object_type(), ObjectType::Port);
        assert_eq!(key.object_id(), Some(Oid::new(0x1000000000002)));
        assert!("SAI_OBJECT_TYPE_PORT".parse::<ObjectKey>().is_err());
    }

    #[test]
    fn test_map_oids_rewrites_switch_and_vr() {
        let mapped = route("10.0.0.0/8")
            .try_map_oids(|oid| Ok::<_, ()>(Oid::new(oid.as_raw() + 1)))
            .unwrap();
        match mapped {
            EntryKey::Route(r) => {
                assert_eq!(r.switch_id, Oid::new(0x21000000000001));
                assert_eq!(r.vr, Oid::new(0x3000000000023));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_map_oids_propagates_error() {
        let result = route("10.0.0.0/8").try_map_oids(|_| Err::<Oid, _>("missing"));
        assert_eq!(result, Err("missing"));
    }
}
