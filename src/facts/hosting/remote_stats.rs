use crate::facts::{SENTINEL, Slot, SlotMap};

/// GitHub statistics for one user.
///
/// Each field is `None` when its source could not be reached; such fields render as [`SENTINEL`]. The
/// badge-sourced fields are display strings as rendered by the badge service (e.g. `"1.2k"`) and are never
/// parsed as numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteStats {
    pub repo_count: Option<u64>,
    pub follower_count: Option<u64>,
    pub star_total: Option<u64>,
    pub commit_count: Option<String>,
    pub contribution_count: Option<String>,
    pub merged_prs: Option<String>,
    pub merged_pr_percent: Option<String>,
}

impl RemoteStats {
    /// Statistics with every field unavailable.
    #[must_use]
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Number of fields that could not be retrieved.
    #[must_use]
    pub fn missing_fields(&self) -> usize {
        [
            self.repo_count.is_none(),
            self.follower_count.is_none(),
            self.star_total.is_none(),
            self.commit_count.is_none(),
            self.contribution_count.is_none(),
            self.merged_prs.is_none(),
            self.merged_pr_percent.is_none(),
        ]
        .into_iter()
        .filter(|missing| *missing)
        .count()
    }

    /// `"{prs} ({percent})"`, or `None` unless both halves are known.
    #[must_use]
    pub fn merged_prs_summary(&self) -> Option<String> {
        match (&self.merged_prs, &self.merged_pr_percent) {
            (Some(prs), Some(percent)) => Some(format!("{prs} ({percent})")),
            _ => None,
        }
    }

    /// The banner slots fed by these statistics.
    #[must_use]
    pub fn slots(&self) -> SlotMap {
        let mut slots = SlotMap::new();
        slots.insert(Slot::Repos, display_or_sentinel(self.repo_count));
        slots.insert(Slot::Stars, display_or_sentinel(self.star_total));
        slots.insert(Slot::Followers, display_or_sentinel(self.follower_count));
        slots.insert(Slot::Commits, self.commit_count.as_deref().unwrap_or(SENTINEL));
        slots.insert(Slot::Contributed, self.contribution_count.as_deref().unwrap_or(SENTINEL));
        slots.insert(Slot::MergedPrs, self.merged_prs_summary().unwrap_or_else(|| SENTINEL.to_string()));
        slots
    }
}

fn display_or_sentinel(value: Option<u64>) -> String {
    value.map_or_else(|| SENTINEL.to_string(), |v| v.to_string())
}
