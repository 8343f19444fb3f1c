use sonic_sai::{ObjectKey, ObjectType, SaiAttribute, Vid};
use std::collections::BTreeMap;
use std::fmt;

/// Lifecycle of an object during one convergence run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectStatus {
    NotProcessed,
    /// Same VID with the same RID exists in both views.
    Matched,
    /// Current view already reflects the temporary view for this object.
    Final,
    /// Removed from the current view and the device.
    Removed,
}

impl ObjectStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ObjectStatus::Final | ObjectStatus::Removed)
    }
}

impl fmt::Display for ObjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectStatus::NotProcessed => "not processed",
            ObjectStatus::Matched => "matched",
            ObjectStatus::Final => "final",
            ObjectStatus::Removed => "removed",
        };
        f.write_str(name)
    }
}

/// Index of an object in its view's arena. Stable for the life of the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectIdx(pub(crate) usize);

#[derive(Debug, Clone, PartialEq)]
pub struct SaiObject {
    pub key: ObjectKey,
    pub attrs: BTreeMap<&'static str, SaiAttribute>,
    pub status: ObjectStatus,
    /// Created during this run, so it has no RID yet.
    pub created: bool,
}

impl SaiObject {
    pub fn new(key: ObjectKey) -> Self {
        Self {
            key,
            attrs: BTreeMap::new(),
            status: ObjectStatus::NotProcessed,
            created: false,
        }
    }

    pub fn object_type(&self) -> ObjectType {
        self.key.object_type()
    }

    pub fn is_oid_object(&self) -> bool {
        !self.object_type().is_non_object_id()
    }

    /// VID of an OID object, `None` for entries.
    pub fn vid(&self) -> Option<Vid> {
        self.key.object_id().map(Vid::from)
    }

    pub fn attr(&self, name: &str) -> Option<&SaiAttribute> {
        self.attrs.get(name)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = &SaiAttribute> {
        self.attrs.values()
    }

    /// Non-null VIDs referenced by attributes, in attribute order.
    pub fn attr_vids(&self) -> Vec<Vid> {
        self.attrs
            .values()
            .flat_map(|a| a.oids())
            .filter(|oid| !oid.is_null())
            .map(Vid::from)
            .collect()
    }

    /// Non-null VIDs embedded in the entry key (switch excluded).
    pub fn key_vids(&self) -> Vec<Vid> {
        self.key
            .entry()
            .map(|entry| {
                entry
                    .oids()
                    .into_iter()
                    .filter(|oid| !oid.is_null())
                    .map(Vid::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn serialized_key(&self) -> String {
        self.key.serialize_key()
    }
}

impl fmt::Display for SaiObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.key, self.status)
    }
}
