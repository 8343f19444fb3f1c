//! Persisted ASIC snapshots and their offline comparison.
//!
//! A snapshot is the JSON rendering of the syncd database of one switch:
//! the `VIDTORID` map, one `ASIC_STATE:<Type>:<key>` table per object, the
//! `COLDVIDS` discovered at cold boot and the `HIDDEN` switch default
//! objects. Every table is wrapped as `{"value": {...}}`.
//!
//! Comparing two snapshots runs the convergence engine without a device:
//! the first snapshot is the current view, the second one, re-indexed so
//! its VIDs cannot collide with the first, is the temporary view.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use sonic_sai::meta::attr_by_name;
use sonic_sai::{ObjectKey, ObjectType, Oid, Rid, SaiAttribute, Vid};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use crate::comparison::ComparisonLogic;
use crate::config::ApplyViewConfig;
use crate::error::{Result, SyncdError};
use crate::switch::SwitchContext;
use crate::view::{AsicOperation, AsicView, TableDump};

const ASIC_STATE_PREFIX: &str = "ASIC_STATE:";

/// Objects that exist from switch init with the same VID and RID in every
/// snapshot of the same switch.
const STARTING_POINT_TYPES: [ObjectType; 5] = [
    ObjectType::Switch,
    ObjectType::Port,
    ObjectType::Queue,
    ObjectType::SchedulerGroup,
    ObjectType::IngressPriorityGroup,
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Table<T> {
    value: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SnapshotDocument {
    #[serde(rename = "VIDTORID")]
    vid_to_rid: Table<BTreeMap<Vid, Rid>>,

    #[serde(rename = "COLDVIDS", default)]
    cold_vids: Table<BTreeMap<Vid, String>>,

    #[serde(rename = "HIDDEN", default)]
    hidden: Table<BTreeMap<String, Rid>>,

    #[serde(flatten)]
    tables: BTreeMap<String, serde_json::Value>,
}

fn snapshot_error(message: impl Into<String>) -> SyncdError {
    SyncdError::Snapshot(message.into())
}

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    vid_to_rid: BTreeMap<Vid, Rid>,
    dump: TableDump,
    cold_vids: BTreeMap<Vid, ObjectType>,
    hidden: BTreeMap<String, Rid>,
    switch_vid: Vid,
    switch_rid: Rid,
}

impl Snapshot {
    pub fn from_json(text: &str) -> Result<Self> {
        let document: SnapshotDocument = serde_json::from_str(text)?;

        let mut dump = TableDump::new();
        for (name, table) in document.tables {
            let Some(key) = name.strip_prefix(ASIC_STATE_PREFIX) else {
                continue;
            };
            let table: Table<BTreeMap<String, String>> = serde_json::from_value(table)?;
            dump.insert(key.to_string(), table.value);
        }

        let cold_vids = document
            .cold_vids
            .value
            .into_iter()
            .map(|(vid, name)| {
                name.parse::<ObjectType>()
                    .map(|object_type| (vid, object_type))
                    .map_err(|_| snapshot_error(format!("cold vid {vid}: unknown type {name}")))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        Self::new(document.vid_to_rid.value, dump, cold_vids, document.hidden.value)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("loading snapshot from {}", path.display());
        let snapshot = Self::from_json(&fs::read_to_string(path)?)?;
        info!(
            "{}: {} objects, {} oids, {} cold vids, {} hidden",
            path.display(),
            snapshot.dump.len(),
            snapshot.vid_to_rid.len(),
            snapshot.cold_vids.len(),
            snapshot.hidden.len()
        );
        Ok(snapshot)
    }

    fn new(
        vid_to_rid: BTreeMap<Vid, Rid>,
        dump: TableDump,
        cold_vids: BTreeMap<Vid, ObjectType>,
        hidden: BTreeMap<String, Rid>,
    ) -> Result<Self> {
        let switches: Vec<(&Vid, &Rid)> = vid_to_rid
            .iter()
            .filter(|(vid, _)| vid.object_type() == Some(ObjectType::Switch))
            .collect();
        let [(switch_vid, switch_rid)] = switches.as_slice() else {
            return Err(snapshot_error(format!(
                "expected exactly one switch, found {}",
                switches.len()
            )));
        };
        let (switch_vid, switch_rid) = (**switch_vid, **switch_rid);

        for name in hidden.keys() {
            attr_by_name(ObjectType::Switch, name)
                .map_err(|_| snapshot_error(format!("unknown hidden switch attribute {name}")))?;
        }

        Ok(Self {
            vid_to_rid,
            dump,
            cold_vids,
            hidden,
            switch_vid,
            switch_rid,
        })
    }

    /// Builds a snapshot from a view and the switch it was taken from.
    pub fn from_view(view: &AsicView, switch: &SwitchContext) -> Result<Self> {
        let cold_vids = switch.cold_boot_vids().clone();
        Self::new(
            view.vid_rid_map().clone(),
            view.to_dump(),
            cold_vids,
            switch.hidden().clone(),
        )
    }

    pub fn to_json(&self) -> Result<String> {
        let tables = self
            .dump
            .iter()
            .map(|(key, fields)| {
                let table = Table {
                    value: fields.clone(),
                };
                Ok((format!("{ASIC_STATE_PREFIX}{key}"), serde_json::to_value(table)?))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;
        let document = SnapshotDocument {
            vid_to_rid: Table {
                value: self.vid_to_rid.clone(),
            },
            cold_vids: Table {
                value: self
                    .cold_vids
                    .iter()
                    .map(|(vid, object_type)| (*vid, object_type.name().to_string()))
                    .collect(),
            },
            hidden: Table {
                value: self.hidden.clone(),
            },
            tables,
        };
        Ok(serde_json::to_string_pretty(&document)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn switch_vid(&self) -> Vid {
        self.switch_vid
    }

    pub fn object_count(&self) -> usize {
        self.dump.len()
    }

    pub fn max_object_index(&self) -> u64 {
        self.vid_to_rid
            .keys()
            .map(Vid::object_index)
            .max()
            .unwrap_or(0)
    }

    /// Same snapshot with every VID outside the starting point moved above
    /// both `self` and `other_max` object indices. Keys, attributes, the
    /// VID/RID map and cold VIDs are rewritten; RIDs are left alone.
    pub fn reindexed(&self, other_max: u64) -> Result<Self> {
        let mut index = self.max_object_index().max(other_max) + 1;
        info!(
            "re-indexing from {index}, max index {} other {other_max}",
            self.max_object_index()
        );

        let mut old_to_new = BTreeMap::new();
        let mut vid_to_rid = BTreeMap::new();
        for (old, rid) in &self.vid_to_rid {
            let keep = old
                .object_type()
                .is_some_and(|ot| STARTING_POINT_TYPES.contains(&ot));
            let new = if keep { *old } else { old.with_object_index(index) };
            index += 1;
            old_to_new.insert(*old, new);
            vid_to_rid.insert(new, *rid);
        }

        let translate = |oid: Oid| -> Result<Oid> {
            let vid = Vid::from(oid);
            if vid.is_null() {
                return Ok(oid);
            }
            old_to_new
                .get(&vid)
                .map(|new| Oid::from(*new))
                .ok_or_else(|| snapshot_error(format!("{vid} missing from VID/RID map")))
        };

        let mut dump = TableDump::new();
        for (key, fields) in &self.dump {
            let old_key: ObjectKey = key.parse()?;
            let object_type = old_key.object_type();
            let new_key = old_key.try_map_oids(translate)?;
            let mut new_fields = BTreeMap::new();
            for (name, value) in fields {
                if name == "NULL" {
                    new_fields.insert(name.clone(), value.clone());
                    continue;
                }
                let attr = SaiAttribute::from_text(object_type, name, value)?.try_map_oids(translate)?;
                new_fields.insert(name.clone(), attr.value.to_string());
            }
            dump.insert(new_key.to_string(), new_fields);
        }

        let cold_vids = self
            .cold_vids
            .iter()
            .filter_map(|(vid, object_type)| {
                // Bridge ports and VLAN members may be gone since cold boot.
                old_to_new.get(vid).map(|new| (*new, *object_type))
            })
            .collect();

        Ok(Self {
            vid_to_rid,
            dump,
            cold_vids,
            hidden: self.hidden.clone(),
            switch_vid: self.switch_vid,
            switch_rid: self.switch_rid,
        })
    }

    /// The snapshot as a view, bound to its RIDs.
    pub fn view(&self) -> Result<AsicView> {
        let mut view = AsicView::from_dump(&self.dump)?;
        for (vid, rid) in &self.vid_to_rid {
            if view.find_vid(*vid).is_some() {
                view.set_identity(*vid, *rid);
            } else {
                warn!("{vid} ({rid}) has no object in the snapshot, not mapped");
            }
        }
        Ok(view)
    }

    /// The snapshot's objects only, with no identity: what a control plane
    /// would request.
    pub fn unbound_view(&self) -> Result<AsicView> {
        AsicView::from_dump(&self.dump)
    }

    pub fn switch_context(&self) -> Result<SwitchContext> {
        let mut switch = SwitchContext::new(self.switch_vid, self.switch_rid);
        // No live device behind a snapshot, so nothing is registered as
        // discovered and no existing object gets populated.
        for (vid, object_type) in &self.cold_vids {
            switch.add_cold_boot_vid(*vid, *object_type);
        }
        let mapped: BTreeSet<Rid> = self.vid_to_rid.values().copied().collect();
        for (name, rid) in &self.hidden {
            if !mapped.contains(rid) {
                return Err(snapshot_error(format!("hidden {name} {rid} is not mapped")));
            }
            switch.add_hidden(name.clone(), *rid);
        }
        Ok(switch)
    }
}

/// Starting point objects must carry the same VID and RID in both snapshots.
pub fn check_starting_point(a: &Snapshot, b: &Snapshot) -> Result<()> {
    for (vid, rid) in &a.vid_to_rid {
        if !vid
            .object_type()
            .is_some_and(|ot| STARTING_POINT_TYPES.contains(&ot))
        {
            continue;
        }
        match b.vid_to_rid.get(vid) {
            None => return Err(snapshot_error(format!("{vid} missing from second snapshot"))),
            Some(other) if other != rid => {
                return Err(snapshot_error(format!(
                    "{vid} has different rids: {rid} vs {other}"
                )))
            }
            Some(_) => {}
        }
    }
    info!("starting point matches");
    Ok(())
}

/// A VID present in both maps must map to the same RID.
pub fn check_vid_rid_maps(a: &Snapshot, b: &Snapshot) -> Result<()> {
    for (vid, rid) in &a.vid_to_rid {
        if let Some(other) = b.vid_to_rid.get(vid) {
            if other != rid {
                return Err(snapshot_error(format!(
                    "{vid} exists in both snapshots with different rids: {rid} vs {other}"
                )));
            }
        }
    }
    Ok(())
}

pub fn check_hidden(a: &Snapshot, b: &Snapshot) -> Result<()> {
    if a.hidden.len() != b.hidden.len() {
        return Err(snapshot_error(format!(
            "hidden object count differs: {} vs {}",
            a.hidden.len(),
            b.hidden.len()
        )));
    }
    for (name, rid) in &a.hidden {
        match b.hidden.get(name) {
            None => return Err(snapshot_error(format!("second snapshot misses hidden {name}"))),
            Some(other) if other != rid => {
                return Err(snapshot_error(format!("hidden {name} differs: {rid} vs {other}")))
            }
            Some(_) => {}
        }
    }
    Ok(())
}

/// Operations that would turn the switch in snapshot `a` into snapshot `b`.
/// Nothing is executed.
pub fn compare_snapshots(
    a: &Snapshot,
    b: &Snapshot,
    config: &ApplyViewConfig,
) -> Result<Vec<AsicOperation>> {
    if a.object_count() != b.object_count() {
        warn!(
            "snapshots differ in object count: {} vs {}",
            a.object_count(),
            b.object_count()
        );
    }

    let b = b.reindexed(a.max_object_index())?;
    check_starting_point(a, &b)?;
    check_vid_rid_maps(a, &b)?;
    check_vid_rid_maps(&b, a)?;
    check_hidden(a, &b)?;

    let mut current = a.view()?;
    let mut temp = b.unbound_view()?;
    let mut switch = a.switch_context()?;
    switch.set_policy(config.removal_policy()?);
    let breaks = config.break_config()?;

    ComparisonLogic::new(&mut current, &mut temp, &switch, &breaks, &config.engine)
        .compare_views()?;

    Ok(current.ops().operations().to_vec())
}
