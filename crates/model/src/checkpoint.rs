//! Stream positions and their total order.
//!
//! A [`Checkpoint`] marks how far the replicated stream has progressed. It is
//! ordered primarily by its pseudo-GTID (and index within that GTID window)
//! and only falls back to the binlog file/offset pair when no pseudo-GTID is
//! available on either side.
//!
//! The order is total over `Option<Checkpoint>`, so an absent checkpoint is
//! a valid operand everywhere and compares as the earliest possible position.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Immutable position marker in the replicated stream.
///
/// Every field is independently optional. The JSON field names match the
/// record keys written by the publisher; any other field is rejected.
///
/// `==` and `Hash` are structural and compare every field. Two checkpoints
/// can be at the same position (`cmp_position` returns `Equal`) without being
/// `==`, for example `{G,1}` and `{G,1,mysql-bin.000001:4}`. Use
/// [`compare_checkpoints`] for position equality.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Checkpoint {
    #[serde(rename = "pseudoGTID", default)]
    pseudo_gtid: Option<String>,
    #[serde(rename = "pseudoGTIDIndex", default)]
    pseudo_gtid_index: i32,
    #[serde(rename = "binlogFilename", default)]
    binlog_filename: Option<String>,
    #[serde(rename = "binlogPosition", default)]
    binlog_position: i64,
}

impl Checkpoint {
    /// Create an empty checkpoint carrying no position information.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a checkpoint positioned by binlog file and offset only.
    #[must_use]
    pub fn at_binlog(filename: impl Into<String>, position: i64) -> Self {
        Self {
            binlog_filename: Some(filename.into()),
            binlog_position: position,
            ..Self::default()
        }
    }

    /// Create a checkpoint positioned by pseudo-GTID and index only.
    #[must_use]
    pub fn at_pseudo_gtid(pseudo_gtid: impl Into<String>, index: i32) -> Self {
        Self {
            pseudo_gtid: Some(pseudo_gtid.into()),
            pseudo_gtid_index: index,
            ..Self::default()
        }
    }

    /// Return a copy carrying the given binlog file and offset.
    #[must_use]
    pub fn with_binlog(self, filename: impl Into<String>, position: i64) -> Self {
        Self {
            binlog_filename: Some(filename.into()),
            binlog_position: position,
            ..self
        }
    }

    /// Return a copy carrying the given pseudo-GTID and index.
    #[must_use]
    pub fn with_pseudo_gtid(self, pseudo_gtid: impl Into<String>, index: i32) -> Self {
        Self {
            pseudo_gtid: Some(pseudo_gtid.into()),
            pseudo_gtid_index: index,
            ..self
        }
    }

    #[must_use]
    pub fn pseudo_gtid(&self) -> Option<&str> {
        self.pseudo_gtid.as_deref()
    }

    #[must_use]
    pub const fn pseudo_gtid_index(&self) -> i32 {
        self.pseudo_gtid_index
    }

    #[must_use]
    pub fn binlog_filename(&self) -> Option<&str> {
        self.binlog_filename.as_deref()
    }

    #[must_use]
    pub const fn binlog_position(&self) -> i64 {
        self.binlog_position
    }

    /// Compare two present checkpoints.
    ///
    /// Precedence: pseudo-GTID pair, then pseudo-GTID presence, then
    /// filename pair, then filename presence, otherwise equal. A checkpoint
    /// carrying a pseudo-GTID is later than one without, whatever their
    /// binlog coordinates say.
    #[must_use]
    pub fn cmp_position(&self, other: &Self) -> Ordering {
        match (&self.pseudo_gtid, &other.pseudo_gtid) {
            (Some(left), Some(right)) => left
                .cmp(right)
                .then_with(|| self.pseudo_gtid_index.cmp(&other.pseudo_gtid_index)),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => match (&self.binlog_filename, &other.binlog_filename) {
                (Some(left), Some(right)) => left
                    .cmp(right)
                    .then_with(|| self.binlog_position.cmp(&other.binlog_position)),
                (Some(_), None) => Ordering::Greater,
                (None, Some(_)) => Ordering::Less,
                (None, None) => Ordering::Equal,
            },
        }
    }

    /// Whether this checkpoint is strictly later than `other`.
    #[must_use]
    pub fn is_after(&self, other: Option<&Self>) -> bool {
        compare_checkpoints(Some(self), other) == Ordering::Greater
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.pseudo_gtid, &self.binlog_filename) {
            (Some(gtid), Some(file)) => write!(
                f,
                "{gtid}#{} ({file}:{})",
                self.pseudo_gtid_index, self.binlog_position
            ),
            (Some(gtid), None) => write!(f, "{gtid}#{}", self.pseudo_gtid_index),
            (None, Some(file)) => write!(f, "{file}:{}", self.binlog_position),
            (None, None) => f.write_str("<empty>"),
        }
    }
}

/// Compare two possibly absent checkpoints.
///
/// An absent checkpoint is earlier than any present one and equal to another
/// absent one. Never fails: every combination of present and missing fields
/// has a defined result.
#[must_use]
pub fn compare_checkpoints(left: Option<&Checkpoint>, right: Option<&Checkpoint>) -> Ordering {
    match (left, right) {
        (Some(left), Some(right)) => left.cmp_position(right),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

/// One "latest wins" step: keep `seed` unless `candidate` is strictly later.
#[must_use]
pub fn fold_latest(seed: Option<Checkpoint>, candidate: Option<Checkpoint>) -> Option<Checkpoint> {
    match compare_checkpoints(seed.as_ref(), candidate.as_ref()) {
        Ordering::Less => candidate,
        Ordering::Equal | Ordering::Greater => seed,
    }
}

/// Reduce checkpoints from any number of sources to the latest one.
pub fn latest_checkpoint<I>(checkpoints: I) -> Option<Checkpoint>
where
    I: IntoIterator<Item = Checkpoint>,
{
    checkpoints
        .into_iter()
        .map(Some)
        .fold(None, fold_latest)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn binlog(file: &str, pos: i64) -> Checkpoint {
        Checkpoint::at_binlog(file, pos)
    }

    fn gtid(id: &str, index: i32) -> Checkpoint {
        Checkpoint::at_pseudo_gtid(id, index)
    }

    #[test]
    fn gtid_index_breaks_ties_within_window() {
        assert_eq!(gtid("G", 5).cmp_position(&gtid("G", 7)), Ordering::Less);
        assert_eq!(gtid("G", 7).cmp_position(&gtid("G", 5)), Ordering::Greater);
        assert_eq!(gtid("G", 7).cmp_position(&gtid("G", 7)), Ordering::Equal);
    }

    #[test]
    fn gtid_compares_before_index() {
        assert_eq!(gtid("A", 100).cmp_position(&gtid("B", 0)), Ordering::Less);
    }

    #[test]
    fn gtid_outranks_binlog_coordinates() {
        let with_gtid = gtid("G", 0).with_binlog("mysql-bin.000001", 4);
        let without = binlog("mysql-bin.999999", i64::MAX);
        assert_eq!(with_gtid.cmp_position(&without), Ordering::Greater);
        assert_eq!(without.cmp_position(&with_gtid), Ordering::Less);
    }

    #[test]
    fn gtid_pair_ignores_binlog_coordinates() {
        let earlier = gtid("G", 1).with_binlog("mysql-bin.000009", 900);
        let later = gtid("G", 2).with_binlog("mysql-bin.000001", 4);
        assert_eq!(earlier.cmp_position(&later), Ordering::Less);
    }

    #[test]
    fn binlog_fallback_compares_file_then_position() {
        assert_eq!(
            binlog("mysql-bin.000002", 100).cmp_position(&binlog("mysql-bin.000002", 50)),
            Ordering::Greater
        );
        assert_eq!(
            binlog("mysql-bin.000001", 9999).cmp_position(&binlog("mysql-bin.000002", 0)),
            Ordering::Less
        );
    }

    #[test]
    fn filename_outranks_missing_filename() {
        assert_eq!(
            binlog("mysql-bin.000001", 0).cmp_position(&Checkpoint::new()),
            Ordering::Greater
        );
        assert_eq!(
            Checkpoint::new().cmp_position(&binlog("mysql-bin.000001", 0)),
            Ordering::Less
        );
    }

    #[test]
    fn empty_checkpoints_are_equal() {
        assert_eq!(Checkpoint::new().cmp_position(&Checkpoint::new()), Ordering::Equal);
    }

    #[test]
    fn absent_checkpoint_is_earliest() {
        let present = binlog("x", 1);
        assert_eq!(compare_checkpoints(None, Some(&present)), Ordering::Less);
        assert_eq!(compare_checkpoints(Some(&present), None), Ordering::Greater);
        assert_eq!(compare_checkpoints(None, None), Ordering::Equal);
        assert_eq!(
            compare_checkpoints(Some(&Checkpoint::new()), None),
            Ordering::Greater
        );
    }

    #[test]
    fn is_after_is_strict() {
        let c = binlog("mysql-bin.000003", 10);
        assert!(!c.is_after(Some(&c)));
        assert!(c.is_after(None));
        assert!(binlog("mysql-bin.000003", 11).is_after(Some(&c)));
    }

    #[test]
    fn fold_latest_keeps_seed_on_tie() {
        let seed = binlog("mysql-bin.000001", 7).with_pseudo_gtid("G", 1);
        let tie = gtid("G", 1);
        let kept = fold_latest(Some(seed.clone()), Some(tie));
        assert_eq!(kept, Some(seed));
    }

    #[test]
    fn fold_latest_ignores_absent_candidate() {
        let seed = binlog("mysql-bin.000001", 7);
        assert_eq!(fold_latest(Some(seed.clone()), None), Some(seed));
    }

    #[test]
    fn latest_checkpoint_picks_maximum() {
        let latest = latest_checkpoint(vec![
            binlog("mysql-bin.000002", 10),
            gtid("G-0002", 3),
            binlog("mysql-bin.000009", 10),
            gtid("G-0001", 9),
        ]);
        assert_eq!(latest, Some(gtid("G-0002", 3)));
        assert_eq!(latest_checkpoint(Vec::new()), None);
    }

    #[test]
    fn json_field_names_match_record_keys() {
        let json = r#"{"pseudoGTID":"ABC","pseudoGTIDIndex":4,"binlogFilename":"mysql-bin.000010","binlogPosition":1234}"#;
        let parsed: Checkpoint = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.pseudo_gtid(), Some("ABC"));
        assert_eq!(parsed.pseudo_gtid_index(), 4);
        assert_eq!(parsed.binlog_filename(), Some("mysql-bin.000010"));
        assert_eq!(parsed.binlog_position(), 1234);
    }

    #[test]
    fn json_missing_fields_default() {
        let parsed: Checkpoint = serde_json::from_str(r#"{"binlogFilename":"f"}"#).unwrap();
        assert_eq!(parsed, Checkpoint::at_binlog("f", 0));
    }

    #[test]
    fn json_unknown_fields_rejected() {
        let json = r#"{"binlogFile":"mysql-bin.000009","pos":9}"#;
        assert!(serde_json::from_str::<Checkpoint>(json).is_err());
    }

    #[test]
    fn structural_equality_is_stricter_than_position_equality() {
        let bare = gtid("G", 1);
        let with_file = gtid("G", 1).with_binlog("mysql-bin.000001", 4);
        assert_eq!(bare.cmp_position(&with_file), Ordering::Equal);
        assert_ne!(bare, with_file);
    }

    #[test]
    fn display_prefers_gtid() {
        assert_eq!(gtid("G", 3).to_string(), "G#3");
        assert_eq!(binlog("mysql-bin.000001", 4).to_string(), "mysql-bin.000001:4");
        assert_eq!(Checkpoint::new().to_string(), "<empty>");
    }
}
