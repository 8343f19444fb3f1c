//! Static attribute registry.
//!
//! Each object type owns a compile-time table of [`AttrMeta`] descriptors
//! (see [`tables`]). The registry answers lookups by name, lists the
//! attributes of a type, and keeps a derived reverse index of which
//! attributes may point at a given object type.

mod tables;
pub mod value;

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::error::{SaiError, SaiResult};
use crate::types::ObjectType;

pub use tables::DEFAULT_TRAP_GROUP_ATTR;
pub use value::{AclData, AttrValue, QosMapping, SaiAttribute};

/// Shape of the data an ACL field or action carries when enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AclDataKind {
    Scalar,
    Oid,
    OidList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrValueType {
    Bool,
    U8,
    U16,
    U32,
    U64,
    I32,
    Mac,
    IpAddress,
    Enum,
    Chardata,
    Oid,
    OidList,
    U32List,
    EnumList,
    QosMapList,
    AclField(AclDataKind),
    AclAction(AclDataKind),
    Pointer,
}

impl AttrValueType {
    /// True when values of this type can reference other objects.
    pub const fn carries_oids(&self) -> bool {
        matches!(
            self,
            AttrValueType::Oid
                | AttrValueType::OidList
                | AttrValueType::AclField(AclDataKind::Oid | AclDataKind::OidList)
                | AttrValueType::AclAction(AclDataKind::Oid | AclDataKind::OidList)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrAccess {
    CreateOnly,
    CreateAndSet,
    ReadOnly,
}

/// Where the value of an attribute comes from when it is not given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrDefault {
    /// No default; the attribute cannot be reset.
    None,
    /// Fixed value in textual form.
    Const(&'static str),
    EmptyList,
    /// The switch source MAC address.
    SwitchMac,
    /// The object the switch reports under the given switch attribute.
    SwitchAttr(&'static str),
    /// Vendor-chosen at switch init, known only for discovered objects.
    SwitchInternal,
}

/// Attribute descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttrMeta {
    pub object_type: ObjectType,
    pub name: &'static str,
    pub value_type: AttrValueType,
    pub access: AttrAccess,
    pub mandatory: bool,
    pub conditional: bool,
    /// Identifies the object among its siblings (lane list, VLAN id, label).
    pub key: bool,
    pub allow_null: bool,
    pub allowed_types: &'static [ObjectType],
    pub default: AttrDefault,
}

impl AttrMeta {
    pub const fn new(
        object_type: ObjectType,
        name: &'static str,
        value_type: AttrValueType,
        access: AttrAccess,
    ) -> Self {
        Self {
            object_type,
            name,
            value_type,
            access,
            mandatory: false,
            conditional: false,
            key: false,
            allow_null: false,
            allowed_types: &[],
            default: AttrDefault::None,
        }
    }

    pub const fn mandatory(self) -> Self {
        Self {
            mandatory: true,
            ..self
        }
    }

    pub const fn conditional(self) -> Self {
        Self {
            conditional: true,
            ..self
        }
    }

    pub const fn key(self) -> Self {
        Self { key: true, ..self }
    }

    pub const fn allow_null(self) -> Self {
        Self {
            allow_null: true,
            ..self
        }
    }

    pub const fn refs(self, allowed_types: &'static [ObjectType]) -> Self {
        Self {
            allowed_types,
            ..self
        }
    }

    pub const fn default_value(self, default: AttrDefault) -> Self {
        Self { default, ..self }
    }

    pub const fn default_const(self, text: &'static str) -> Self {
        self.default_value(AttrDefault::Const(text))
    }

    pub const fn is_create_only(&self) -> bool {
        matches!(self.access, AttrAccess::CreateOnly)
    }

    pub const fn is_settable(&self) -> bool {
        matches!(self.access, AttrAccess::CreateAndSet)
    }

    pub const fn is_oid(&self) -> bool {
        self.value_type.carries_oids()
    }

    /// Attribute may reference objects of `object_type`.
    pub fn may_reference(&self, object_type: ObjectType) -> bool {
        self.allowed_types.contains(&object_type)
    }
}

/// Attribute table of an object type.
pub fn attributes(object_type: ObjectType) -> &'static [AttrMeta] {
    tables::for_type(object_type)
}

pub fn attr_by_name(object_type: ObjectType, name: &str) -> SaiResult<&'static AttrMeta> {
    attributes(object_type)
        .iter()
        .find(|meta| meta.name == name)
        .ok_or_else(|| SaiError::UnknownAttribute {
            object_type: object_type.to_string(),
            attr: name.to_string(),
        })
}

static REVERSE_GRAPH: Lazy<HashMap<ObjectType, Vec<&'static AttrMeta>>> = Lazy::new(|| {
    let mut graph: HashMap<ObjectType, Vec<&'static AttrMeta>> = HashMap::new();
    for object_type in ObjectType::ALL {
        for meta in attributes(*object_type) {
            for target in meta.allowed_types {
                graph.entry(*target).or_default().push(meta);
            }
        }
    }
    graph
});

/// Attributes of any object type that may point at `object_type`.
pub fn referencing_attrs(object_type: ObjectType) -> &'static [&'static AttrMeta] {
    REVERSE_GRAPH
        .get(&object_type)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Object types whose ids can be embedded in the key of an entry type.
pub fn entry_key_reference_types(object_type: ObjectType) -> &'static [ObjectType] {
    match object_type {
        ObjectType::RouteEntry | ObjectType::NatEntry => &[ObjectType::VirtualRouter],
        ObjectType::NeighborEntry => &[ObjectType::RouterInterface],
        ObjectType::FdbEntry => &[ObjectType::Bridge, ObjectType::Vlan],
        _ => &[],
    }
}

/// Attributes never loaded into a view: counters the device updates itself.
pub fn is_ignored_on_load(meta: &AttrMeta) -> bool {
    matches!(
        meta.name,
        "SAI_ACL_COUNTER_ATTR_PACKETS"
            | "SAI_ACL_COUNTER_ATTR_BYTES"
            | "SAI_NAT_ENTRY_ATTR_HIT_BIT"
            | "SAI_NAT_ENTRY_ATTR_HIT_BIT_COR"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_every_table_belongs_to_its_type() {
        for object_type in ObjectType::ALL {
            for meta in attributes(*object_type) {
                assert_eq!(meta.object_type, *object_type, "{}", meta.name);
                assert!(
                    meta.allowed_types.is_empty() || meta.is_oid(),
                    "{} references types without carrying ids",
                    meta.name
                );
            }
        }
    }

    #[test]
    fn test_lookup_by_name() {
        let meta = attr_by_name(ObjectType::Port, "SAI_PORT_ATTR_HW_LANE_LIST").unwrap();
        assert!(meta.key);
        assert!(meta.is_create_only());
        assert!(attr_by_name(ObjectType::Port, "SAI_PORT_ATTR_NOPE").is_err());
    }

    #[test]
    fn test_reverse_graph() {
        let names: Vec<&str> = referencing_attrs(ObjectType::NextHop)
            .iter()
            .map(|m| m.name)
            .collect();
        assert!(names.contains(&"SAI_ROUTE_ENTRY_ATTR_NEXT_HOP_ID"));
        assert!(names.contains(&"SAI_NEXT_HOP_GROUP_MEMBER_ATTR_NEXT_HOP_ID"));
        assert!(referencing_attrs(ObjectType::Null).is_empty());
    }

    #[test]
    fn test_ignored_counters() {
        let packets = attr_by_name(ObjectType::AclCounter, "SAI_ACL_COUNTER_ATTR_PACKETS").unwrap();
        assert!(is_ignored_on_load(packets));
        let table = attr_by_name(ObjectType::AclCounter, "SAI_ACL_COUNTER_ATTR_TABLE_ID").unwrap();
        assert!(!is_ignored_on_load(table));
    }
}
