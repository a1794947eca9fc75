use core::fmt::{Display, Formatter, Result as FmtResult};
use std::collections::BTreeMap;
use std::collections::btree_map::Iter;
use strum::{AsRefStr, EnumIter};

/// Placeholder shown in a slot whose value could not be retrieved.
pub const SENTINEL: &str = "N/A";

/// The slots a banner document is expected to carry.
///
/// The serialized form of each variant is the `id` attribute of the element that holds the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, AsRefStr, EnumIter)]
pub enum Slot {
    #[strum(serialize = "uptime-value")]
    Uptime,
    #[strum(serialize = "total-days-value")]
    TotalDays,
    #[strum(serialize = "life-percentage-value")]
    LifePercentage,
    #[strum(serialize = "years-rounded-value")]
    YearsRounded,
    #[strum(serialize = "repos-value")]
    Repos,
    #[strum(serialize = "stars-value")]
    Stars,
    #[strum(serialize = "followers-value")]
    Followers,
    #[strum(serialize = "commits-value")]
    Commits,
    #[strum(serialize = "contributed-value")]
    Contributed,
    #[strum(serialize = "merged-prs-value")]
    MergedPrs,
}

impl Display for Slot {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_ref())
    }
}

/// Rendered display strings keyed by slot identifier.
///
/// Keys are kept sorted so documents are always patched, and reported, in the same order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotMap {
    values: BTreeMap<String, String>,
}

impl SlotMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value of a slot, replacing any previous value.
    pub fn insert(&mut self, slot: impl AsRef<str>, value: impl Into<String>) {
        let _ = self.values.insert(slot.as_ref().to_string(), value.into());
    }

    #[must_use]
    pub fn get(&self, slot: impl AsRef<str>) -> Option<&str> {
        self.values.get(slot.as_ref()).map(String::as_str)
    }

    /// Merge another map into this one; values from `other` win on conflicting keys.
    pub fn merge(&mut self, other: Self) {
        self.values.extend(other.values);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, String, String> {
        self.values.iter()
    }
}

impl<'a> IntoIterator for &'a SlotMap {
    type Item = (&'a String, &'a String);
    type IntoIter = Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for SlotMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (slot, value) in iter {
            map.insert(slot, value);
        }
        map
    }
}
