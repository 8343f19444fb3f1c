//! Attribute values and their textual wire form.

use std::fmt;
use std::net::IpAddr;

use super::{AclDataKind, AttrMeta, AttrValueType};
use crate::entry::MacAddress;
use crate::error::{SaiError, SaiResult};
use crate::types::{ObjectType, Oid};

/// Payload of an ACL field or action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AclData {
    Disabled,
    Scalar(String),
    Oid(Oid),
    OidList(Vec<Oid>),
}

/// One `key=value` pair of a QoS map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QosMapping {
    pub key: u32,
    pub value: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I32(i32),
    Mac(MacAddress),
    Ip(IpAddr),
    Enum(String),
    Chardata(String),
    Oid(Oid),
    OidList(Vec<Oid>),
    U32List(Vec<u32>),
    EnumList(Vec<String>),
    QosMapList(Vec<QosMapping>),
    AclField(AclData),
    AclAction(AclData),
    Pointer(u64),
}

fn parse_num<N: std::str::FromStr>(what: &'static str, s: &str) -> SaiResult<N> {
    s.parse().map_err(|_| SaiError::parse(what, s))
}

/// Splits `"N:a,b,c"` into its items, checking the count. `"0:null"` is empty.
fn parse_list<T>(
    what: &'static str,
    s: &str,
    mut item: impl FnMut(&str) -> SaiResult<T>,
) -> SaiResult<Vec<T>> {
    let (count, rest) = s.split_once(':').ok_or_else(|| SaiError::parse(what, s))?;
    let count: usize = parse_num(what, count)?;
    if count == 0 {
        return Ok(Vec::new());
    }
    let items = rest.split(',').map(&mut item).collect::<SaiResult<Vec<T>>>()?;
    if items.len() != count {
        return Err(SaiError::parse(what, s));
    }
    Ok(items)
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    if items.is_empty() {
        return f.write_str("0:null");
    }
    write!(f, "{}:", items.len())?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

fn parse_acl_data(kind: AclDataKind, s: &str) -> SaiResult<AclData> {
    if s == "disabled" {
        return Ok(AclData::Disabled);
    }
    Ok(match kind {
        AclDataKind::Scalar => AclData::Scalar(s.to_string()),
        AclDataKind::Oid => AclData::Oid(s.parse()?),
        AclDataKind::OidList => AclData::OidList(parse_list("acl oid list", s, str::parse)?),
    })
}

impl fmt::Display for AclData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AclData::Disabled => f.write_str("disabled"),
            AclData::Scalar(s) => f.write_str(s),
            AclData::Oid(oid) => write!(f, "{oid}"),
            AclData::OidList(list) => write_list(f, list),
        }
    }
}

impl fmt::Display for QosMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

impl AclData {
    fn oids(&self) -> Vec<Oid> {
        match self {
            AclData::Oid(oid) => vec![*oid],
            AclData::OidList(list) => list.clone(),
            AclData::Disabled | AclData::Scalar(_) => Vec::new(),
        }
    }

    fn try_map_oids<E>(&self, f: &mut impl FnMut(Oid) -> Result<Oid, E>) -> Result<Self, E> {
        Ok(match self {
            AclData::Oid(oid) => AclData::Oid(f(*oid)?),
            AclData::OidList(list) => AclData::OidList(list.iter().map(|o| f(*o)).collect::<Result<_, E>>()?),
            other => other.clone(),
        })
    }
}

impl AttrValue {
    /// Parses the textual form according to the attribute's value type.
    pub fn parse(meta: &AttrMeta, s: &str) -> SaiResult<Self> {
        Ok(match meta.value_type {
            AttrValueType::Bool => match s {
                "true" => AttrValue::Bool(true),
                "false" => AttrValue::Bool(false),
                _ => return Err(SaiError::parse("bool", s)),
            },
            AttrValueType::U8 => AttrValue::U8(parse_num("u8", s)?),
            AttrValueType::U16 => AttrValue::U16(parse_num("u16", s)?),
            AttrValueType::U32 => AttrValue::U32(parse_num("u32", s)?),
            AttrValueType::U64 => AttrValue::U64(parse_num("u64", s)?),
            AttrValueType::I32 => AttrValue::I32(parse_num("i32", s)?),
            AttrValueType::Mac => AttrValue::Mac(s.parse()?),
            AttrValueType::IpAddress => AttrValue::Ip(parse_num("ip address", s)?),
            AttrValueType::Enum => AttrValue::Enum(s.to_string()),
            AttrValueType::Chardata => AttrValue::Chardata(s.to_string()),
            AttrValueType::Oid => AttrValue::Oid(s.parse()?),
            AttrValueType::OidList => AttrValue::OidList(parse_list("oid list", s, str::parse)?),
            AttrValueType::U32List => {
                AttrValue::U32List(parse_list("u32 list", s, |i| parse_num("u32", i))?)
            }
            AttrValueType::EnumList => {
                AttrValue::EnumList(parse_list("enum list", s, |i| Ok(i.to_string()))?)
            }
            AttrValueType::QosMapList => AttrValue::QosMapList(parse_list("qos map", s, |i| {
                let (key, value) = i.split_once('=').ok_or_else(|| SaiError::parse("qos map", i))?;
                Ok(QosMapping {
                    key: parse_num("qos map key", key)?,
                    value: parse_num("qos map value", value)?,
                })
            })?),
            AttrValueType::AclField(kind) => AttrValue::AclField(parse_acl_data(kind, s)?),
            AttrValueType::AclAction(kind) => AttrValue::AclAction(parse_acl_data(kind, s)?),
            AttrValueType::Pointer => {
                let hex = s.strip_prefix("ptr:0x").ok_or_else(|| SaiError::parse("pointer", s))?;
                AttrValue::Pointer(u64::from_str_radix(hex, 16).map_err(|_| SaiError::parse("pointer", s))?)
            }
        })
    }

    /// Object ids referenced by this value, null ids included.
    pub fn oids(&self) -> Vec<Oid> {
        match self {
            AttrValue::Oid(oid) => vec![*oid],
            AttrValue::OidList(list) => list.clone(),
            AttrValue::AclField(data) | AttrValue::AclAction(data) => data.oids(),
            _ => Vec::new(),
        }
    }

    pub fn try_map_oids<E>(&self, mut f: impl FnMut(Oid) -> Result<Oid, E>) -> Result<Self, E> {
        Ok(match self {
            AttrValue::Oid(oid) => AttrValue::Oid(f(*oid)?),
            AttrValue::OidList(list) => {
                AttrValue::OidList(list.iter().map(|o| f(*o)).collect::<Result<_, E>>()?)
            }
            AttrValue::AclField(data) => AttrValue::AclField(data.try_map_oids(&mut f)?),
            AttrValue::AclAction(data) => AttrValue::AclAction(data.try_map_oids(&mut f)?),
            other => other.clone(),
        })
    }

    /// Value equality as the device sees it: QoS maps ignore order and
    /// pointers compare by null-ness only.
    pub fn equivalent(&self, other: &AttrValue) -> bool {
        match (self, other) {
            (AttrValue::QosMapList(a), AttrValue::QosMapList(b)) => {
                let mut a = a.clone();
                let mut b = b.clone();
                a.sort();
                b.sort();
                a == b
            }
            (AttrValue::Pointer(a), AttrValue::Pointer(b)) => (*a == 0) == (*b == 0),
            _ => self == other,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Bool(v) => write!(f, "{v}"),
            AttrValue::U8(v) => write!(f, "{v}"),
            AttrValue::U16(v) => write!(f, "{v}"),
            AttrValue::U32(v) => write!(f, "{v}"),
            AttrValue::U64(v) => write!(f, "{v}"),
            AttrValue::I32(v) => write!(f, "{v}"),
            AttrValue::Mac(v) => write!(f, "{v}"),
            AttrValue::Ip(v) => write!(f, "{v}"),
            AttrValue::Enum(v) | AttrValue::Chardata(v) => f.write_str(v),
            AttrValue::Oid(v) => write!(f, "{v}"),
            AttrValue::OidList(v) => write_list(f, v),
            AttrValue::U32List(v) => write_list(f, v),
            AttrValue::EnumList(v) => write_list(f, v),
            AttrValue::QosMapList(v) => write_list(f, v),
            AttrValue::AclField(v) | AttrValue::AclAction(v) => write!(f, "{v}"),
            AttrValue::Pointer(v) => write!(f, "ptr:0x{v:x}"),
        }
    }
}

/// Attribute id and value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaiAttribute {
    pub meta: &'static AttrMeta,
    pub value: AttrValue,
}

impl SaiAttribute {
    pub fn new(meta: &'static AttrMeta, value: AttrValue) -> Self {
        Self { meta, value }
    }

    pub fn parse(meta: &'static AttrMeta, text: &str) -> SaiResult<Self> {
        Ok(Self::new(meta, AttrValue::parse(meta, text)?))
    }

    /// Looks the attribute up by name and parses its value.
    pub fn from_text(object_type: ObjectType, name: &str, text: &str) -> SaiResult<Self> {
        Self::parse(super::attr_by_name(object_type, name)?, text)
    }

    pub fn name(&self) -> &'static str {
        self.meta.name
    }

    pub fn oids(&self) -> Vec<Oid> {
        self.value.oids()
    }

    pub fn try_map_oids<E>(&self, f: impl FnMut(Oid) -> Result<Oid, E>) -> Result<Self, E> {
        Ok(Self::new(self.meta, self.value.try_map_oids(f)?))
    }
}

impl fmt::Display for SaiAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.meta.name, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::attr_by_name;
    use pretty_assertions::assert_eq;

    fn attr(ot: ObjectType, name: &str, text: &str) -> SaiAttribute {
        SaiAttribute::from_text(ot, name, text).unwrap()
    }

    #[test]
    fn test_scalar_text_round_trip() {
        for (ot, name, text) in [
            (ObjectType::Port, "SAI_PORT_ATTR_ADMIN_STATE", "true"),
            (ObjectType::Port, "SAI_PORT_ATTR_MTU", "9100"),
            (ObjectType::Switch, "SAI_SWITCH_ATTR_SRC_MAC_ADDRESS", "00:11:22:33:44:55"),
            (ObjectType::NextHop, "SAI_NEXT_HOP_ATTR_IP", "10.0.0.1"),
            (ObjectType::Switch, "SAI_SWITCH_ATTR_FDB_EVENT_NOTIFY", "ptr:0x7f00"),
        ] {
            assert_eq!(attr(ot, name, text).value.to_string(), text);
        }
    }

    #[test]
    fn test_lists() {
        let lanes = attr(ObjectType::Port, "SAI_PORT_ATTR_HW_LANE_LIST", "4:1,2,3,4");
        assert_eq!(lanes.value, AttrValue::U32List(vec![1, 2, 3, 4]));
        let empty = attr(ObjectType::Hash, "SAI_HASH_ATTR_NATIVE_HASH_FIELD_LIST", "0:null");
        assert_eq!(empty.value, AttrValue::EnumList(Vec::new()));
        assert_eq!(empty.value.to_string(), "0:null");

        let meta = attr_by_name(ObjectType::Port, "SAI_PORT_ATTR_HW_LANE_LIST").unwrap();
        assert!(AttrValue::parse(meta, "3:1,2").is_err());
    }

    #[test]
    fn test_acl_data() {
        let disabled = attr(ObjectType::AclEntry, "SAI_ACL_ENTRY_ATTR_ACTION_REDIRECT", "disabled");
        assert_eq!(disabled.value, AttrValue::AclAction(AclData::Disabled));
        assert!(disabled.oids().is_empty());

        let redirect = attr(
            ObjectType::AclEntry,
            "SAI_ACL_ENTRY_ATTR_ACTION_REDIRECT",
            "oid:0x1000000000002",
        );
        assert_eq!(redirect.oids(), vec![Oid::new(0x1000000000002)]);

        let ports = attr(
            ObjectType::AclEntry,
            "SAI_ACL_ENTRY_ATTR_FIELD_IN_PORTS",
            "2:oid:0x1000000000002,oid:0x1000000000003",
        );
        assert_eq!(ports.oids().len(), 2);
        assert_eq!(ports.value.to_string(), "2:oid:0x1000000000002,oid:0x1000000000003");
    }

    #[test]
    fn test_qos_map_equivalence_ignores_order() {
        let a = attr(ObjectType::QosMap, "SAI_QOS_MAP_ATTR_MAP_TO_VALUE_LIST", "2:0=1,1=0");
        let b = attr(ObjectType::QosMap, "SAI_QOS_MAP_ATTR_MAP_TO_VALUE_LIST", "2:1=0,0=1");
        assert_ne!(a.value, b.value);
        assert!(a.value.equivalent(&b.value));
    }

    #[test]
    fn test_pointer_equivalence_by_nullness() {
        assert!(AttrValue::Pointer(0x10).equivalent(&AttrValue::Pointer(0x20)));
        assert!(!AttrValue::Pointer(0).equivalent(&AttrValue::Pointer(0x20)));
    }

    #[test]
    fn test_map_oids() {
        let nh = attr(ObjectType::RouteEntry, "SAI_ROUTE_ENTRY_ATTR_NEXT_HOP_ID", "oid:0x4000000000001");
        let mapped = nh
            .try_map_oids(|_| Ok::<_, ()>(Oid::new(0x4000000000099)))
            .unwrap();
        assert_eq!(mapped.to_string(), "SAI_ROUTE_ENTRY_ATTR_NEXT_HOP_ID=oid:0x4000000000099");
    }
}
