//! Per-VID reference counts.
//!
//! A tracked VID counts how many attributes and entry keys in the same view
//! point at it. A non-zero count is the only thing that keeps an OID object
//! from being removed. Every misuse is a consistency violation and returns
//! [`SyncdError::Fatal`](crate::error::SyncdError::Fatal).

use sonic_sai::Vid;
use std::collections::HashMap;

use crate::error::Result;
use crate::fatal;

#[derive(Debug, Clone, Default)]
pub struct OidRefCounter {
    counts: HashMap<Vid, u32>,
}

impl OidRefCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exists(&self, vid: Vid) -> bool {
        self.counts.contains_key(&vid)
    }

    /// Starts tracking `vid` at zero.
    pub fn insert(&mut self, vid: Vid) -> Result<()> {
        if vid.is_null() {
            return Err(fatal!("null vid cannot be reference counted"));
        }
        if self.counts.contains_key(&vid) {
            return Err(fatal!("reference count for {vid} already exists"));
        }
        self.counts.insert(vid, 0);
        Ok(())
    }

    /// Starts tracking `vid` unless it is already tracked or null.
    pub fn insert_if_absent(&mut self, vid: Vid) {
        if !vid.is_null() {
            self.counts.entry(vid).or_insert(0);
        }
    }

    pub fn count(&self, vid: Vid) -> Result<u32> {
        self.counts
            .get(&vid)
            .copied()
            .ok_or_else(|| fatal!("reference count for {vid} does not exist"))
    }

    /// Null ids are ignored.
    pub fn increment(&mut self, vid: Vid) -> Result<u32> {
        if vid.is_null() {
            return Ok(0);
        }
        let count = self
            .counts
            .get_mut(&vid)
            .ok_or_else(|| fatal!("cannot increment reference count of untracked {vid}"))?;
        *count += 1;
        Ok(*count)
    }

    /// Null ids are ignored. Returns the new count.
    pub fn decrement(&mut self, vid: Vid) -> Result<u32> {
        if vid.is_null() {
            return Ok(0);
        }
        let count = self
            .counts
            .get_mut(&vid)
            .ok_or_else(|| fatal!("cannot decrement reference count of untracked {vid}"))?;
        if *count == 0 {
            return Err(fatal!("reference count of {vid} would become negative"));
        }
        *count -= 1;
        Ok(*count)
    }

    pub fn increment_all(&mut self, vids: impl IntoIterator<Item = Vid>) -> Result<()> {
        for vid in vids {
            self.increment(vid)?;
        }
        Ok(())
    }

    pub fn decrement_all(&mut self, vids: impl IntoIterator<Item = Vid>) -> Result<()> {
        for vid in vids {
            self.decrement(vid)?;
        }
        Ok(())
    }

    /// Stops tracking `vid`; it must not be referenced anymore.
    pub fn remove(&mut self, vid: Vid) -> Result<()> {
        match self.counts.get(&vid) {
            None => Err(fatal!("reference count for {vid} does not exist")),
            Some(count) if *count > 0 => Err(fatal!(
                "cannot remove {vid}, still referenced {count} times"
            )),
            Some(_) => {
                self.counts.remove(&vid);
                Ok(())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Vid, u32)> + '_ {
        self.counts.iter().map(|(vid, count)| (*vid, *count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sonic_sai::ObjectType;

    fn vid(index: u64) -> Vid {
        Vid::compose(0, ObjectType::NextHop, 0, index)
    }

    #[test]
    fn test_increment_then_decrement_restores_count() {
        let mut refs = OidRefCounter::new();
        refs.insert(vid(1)).unwrap();
        for _ in 0..3 {
            refs.increment(vid(1)).unwrap();
        }
        assert_eq!(refs.count(vid(1)).unwrap(), 3);
        for _ in 0..3 {
            refs.decrement(vid(1)).unwrap();
        }
        assert_eq!(refs.count(vid(1)).unwrap(), 0);
    }

    #[test]
    fn test_decrement_below_zero_is_fatal() {
        let mut refs = OidRefCounter::new();
        refs.insert(vid(1)).unwrap();
        assert!(refs.decrement(vid(1)).unwrap_err().is_fatal());
    }

    #[test]
    fn test_untracked_vid_is_fatal() {
        let mut refs = OidRefCounter::new();
        assert!(refs.increment(vid(7)).unwrap_err().is_fatal());
        assert!(refs.decrement(vid(7)).unwrap_err().is_fatal());
        assert!(refs.count(vid(7)).unwrap_err().is_fatal());
    }

    #[test]
    fn test_null_is_never_tracked() {
        let mut refs = OidRefCounter::new();
        assert!(refs.insert(Vid::NULL).is_err());
        assert_eq!(refs.increment(Vid::NULL).unwrap(), 0);
        assert_eq!(refs.decrement(Vid::NULL).unwrap(), 0);
        refs.insert_if_absent(Vid::NULL);
        assert!(refs.is_empty());
    }

    #[test]
    fn test_double_insert_is_fatal() {
        let mut refs = OidRefCounter::new();
        refs.insert(vid(1)).unwrap();
        assert!(refs.insert(vid(1)).is_err());
        refs.insert_if_absent(vid(1));
        assert_eq!(refs.len(), 1);
    }

    #[test]
    fn test_remove_requires_zero() {
        let mut refs = OidRefCounter::new();
        refs.insert(vid(1)).unwrap();
        refs.increment_all([vid(1), vid(1)]).unwrap();
        assert!(refs.remove(vid(1)).unwrap_err().is_fatal());
        refs.decrement_all([vid(1), vid(1)]).unwrap();
        refs.remove(vid(1)).unwrap();
        assert!(!refs.exists(vid(1)));
        assert!(refs.remove(vid(1)).is_err());
    }
}
