//! Spatial grouping of resolved positions.
//!
//! # Responsibility
//! - Cluster resolved positions whose coordinates are tolerance-equal so a
//!   declustering widget can spread them out.
//! - Provide a deterministic circular spread layout for grouped markers.
//!
//! # Invariants
//! - First-fit, not nearest-fit: a position joins the first existing group
//!   (in creation order) whose anchor is within tolerance on both axes.
//! - Output depends only on the order of the input slice.
//! - `tolerance == 0.0` is exact-coordinate grouping.
//! - A positive tolerance is inclusive: two decimal coordinates exactly one
//!   tolerance apart group together despite binary rounding.

use crate::model::entry::ResolvedPosition;
use crate::model::group::LocationGroup;
use std::error::Error;
use std::f64::consts::TAU;
use std::fmt::{Display, Formatter};

/// Default coordinate tolerance in degrees (about 50 m in latitude).
pub const DEFAULT_TOLERANCE: f64 = 0.0005;

/// Rounding slack, in ulps of the compared magnitudes.
const ROUNDING_ULPS: f64 = 4.0;

pub type GroupingResult<T> = Result<T, GroupingError>;

#[derive(Debug, Clone, PartialEq)]
pub enum GroupingError {
    InvalidTolerance(f64),
}

impl Display for GroupingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTolerance(value) => write!(
                f,
                "grouping tolerance must be a finite non-negative number, got {value}"
            ),
        }
    }
}

impl Error for GroupingError {}

/// Validates a tolerance value.
pub fn check_tolerance(tolerance: f64) -> GroupingResult<f64> {
    if tolerance.is_finite() && tolerance >= 0.0 {
        Ok(tolerance)
    } else {
        Err(GroupingError::InvalidTolerance(tolerance))
    }
}

/// Groups positions by tolerance-equal coordinates.
///
/// Members keep input order inside each group; groups are returned in
/// creation order.
pub fn group_positions(
    positions: &[ResolvedPosition],
    tolerance: f64,
) -> GroupingResult<Vec<LocationGroup>> {
    let tolerance = check_tolerance(tolerance)?;
    let mut groups: Vec<LocationGroup> = Vec::new();

    for position in positions {
        let existing = groups.iter_mut().find(|group| {
            within_tolerance(group.lat, position.lat, tolerance)
                && within_tolerance(group.lon, position.lon, tolerance)
        });
        match existing {
            Some(group) => group.members.push(position.person.clone()),
            None => groups.push(LocationGroup {
                lat: position.lat,
                lon: position.lon,
                members: vec![position.person.clone()],
            }),
        }
    }

    Ok(groups)
}

/// Inclusive per-axis comparison.
///
/// The subtraction and the tolerance literal each carry rounding error
/// proportional to their magnitude, so a positive tolerance is widened by a
/// few ulps of the operands. Zero stays an exact comparison.
fn within_tolerance(a: f64, b: f64, tolerance: f64) -> bool {
    if tolerance == 0.0 {
        return a == b;
    }
    let magnitude = a.abs().max(b.abs()) + tolerance;
    (a - b).abs() <= tolerance + magnitude * f64::EPSILON * ROUNDING_ULPS
}

/// Pixel offsets placing `count` members evenly on a circle.
///
/// A single member stays on the anchor. The first member sits straight
/// above the anchor and the rest follow clockwise.
pub fn spread_offsets(count: usize, radius_px: f64) -> Vec<(f64, f64)> {
    match count {
        0 => Vec::new(),
        1 => vec![(0.0, 0.0)],
        _ => (0..count)
            .map(|index| {
                let angle = TAU * index as f64 / count as f64;
                (radius_px * angle.sin(), -radius_px * angle.cos())
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        check_tolerance, group_positions, spread_offsets, within_tolerance, GroupingError,
    };
    use crate::model::entry::ResolvedPosition;

    fn at(person: &str, lat: f64, lon: f64) -> ResolvedPosition {
        ResolvedPosition {
            person: person.to_string(),
            lat,
            lon,
            place: String::new(),
            info: String::new(),
            year: 2000,
        }
    }

    #[test]
    fn zero_tolerance_groups_exact_matches_only() {
        let groups = group_positions(
            &[at("A", 1.0, 1.0), at("B", 1.0, 1.0), at("C", 1.0, 1.0001)],
            0.0,
        )
        .unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].members, vec!["A", "B"]);
        assert_eq!(groups[1].members, vec!["C"]);
    }

    #[test]
    fn first_fit_uses_anchor_not_nearest_group() {
        // C is within tolerance of both anchors but joins the first group.
        let groups = group_positions(
            &[at("A", 0.0, 0.0), at("B", 0.0008, 0.0), at("C", 0.0004, 0.0)],
            0.0005,
        )
        .unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].members, vec!["A", "C"]);
        assert_eq!(groups[1].members, vec!["B"]);
    }

    #[test]
    fn tolerance_bound_is_inclusive_for_decimal_coordinates() {
        let groups = group_positions(
            &[at("A", 48.8566, 2.3522), at("B", 48.8571, 2.3527)],
            0.0005,
        )
        .unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].members, vec!["A", "B"]);

        assert!(within_tolerance(-1.5536, -1.5531, 0.0005));
        assert!(within_tolerance(179.9995, 180.0, 0.0005));
        assert!(!within_tolerance(48.8566, 48.85711, 0.0005));
        assert!(!within_tolerance(2.3522, 2.3522000000001, 0.0));
    }

    #[test]
    fn both_axes_must_be_within_tolerance() {
        let groups =
            group_positions(&[at("A", 0.0, 0.0), at("B", 0.0, 0.001)], 0.0005).unwrap();
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn invalid_tolerance_is_rejected() {
        assert_eq!(
            check_tolerance(-0.1).unwrap_err(),
            GroupingError::InvalidTolerance(-0.1)
        );
        assert!(group_positions(&[], f64::NAN).is_err());
    }

    #[test]
    fn spread_offsets_are_on_circle() {
        assert!(spread_offsets(0, 30.0).is_empty());
        assert_eq!(spread_offsets(1, 30.0), vec![(0.0, 0.0)]);

        let offsets = spread_offsets(4, 30.0);
        assert_eq!(offsets.len(), 4);
        assert!((offsets[0].0).abs() < 1e-9);
        assert!((offsets[0].1 + 30.0).abs() < 1e-9);
        for (dx, dy) in offsets {
            assert!(((dx * dx + dy * dy).sqrt() - 30.0).abs() < 1e-9);
        }
    }
}
