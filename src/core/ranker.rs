use crate::core::cache::AvailabilitySnapshot;
use crate::core::locations::LocationIndex;
use crate::domain::model::{Location, LocationId};

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub location_id: LocationId,
    pub distance: f64,
    pub count: u32,
}

/// 依直線距離排序候選地點。
///
/// 只保留 `count > 0` 且存在於索引中的地點；排序為 stable，
/// 距離相同時維持快照中的順序。
pub fn rank_candidates(
    snapshot: &AvailabilitySnapshot,
    target: &Location,
    index: &LocationIndex,
) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = snapshot
        .iter()
        .filter(|(_, count)| *count > 0)
        .filter_map(|(id, count)| {
            index.get(id).map(|source| Candidate {
                location_id: id.clone(),
                distance: source.distance_to(target),
                count: *count,
            })
        })
        .collect();

    candidates.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> LocationIndex {
        LocationIndex::new(vec![
            Location::new("T", "Center", 0.0, 0.0),
            Location::new("Near", "Center", 1.0, 0.0),
            Location::new("Far", "East", 0.0, 2.0),
            Location::new("Farther", "East", 3.0, 4.0),
            Location::new("TieA", "West", -2.0, 0.0),
        ])
    }

    fn snapshot(pairs: &[(&str, u32)]) -> AvailabilitySnapshot {
        pairs.iter().map(|(id, c)| (id.to_string(), *c)).collect()
    }

    #[test]
    fn test_ranks_by_ascending_distance() {
        let index = index();
        let target = index.get("T").unwrap().clone();
        let snap = snapshot(&[("Farther", 1), ("Near", 2), ("Far", 3)]);

        let ranked = rank_candidates(&snap, &target, &index);
        let order: Vec<&str> = ranked.iter().map(|c| c.location_id.as_str()).collect();

        assert_eq!(order, vec!["Near", "Far", "Farther"]);
        assert_eq!(ranked[2].distance, 5.0);
        assert_eq!(ranked[1].count, 3);
    }

    #[test]
    fn test_filters_empty_and_unindexed_locations() {
        let index = index();
        let target = index.get("T").unwrap().clone();
        let snap = snapshot(&[("Near", 0), ("Ghost", 9), ("Far", 1)]);

        let ranked = rank_candidates(&snap, &target, &index);

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].location_id, "Far");
    }

    #[test]
    fn test_ties_keep_snapshot_order() {
        let index = index();
        let target = index.get("T").unwrap().clone();

        let ranked = rank_candidates(&snapshot(&[("TieA", 1), ("Far", 1)]), &target, &index);
        assert_eq!(ranked[0].location_id, "TieA");
        assert_eq!(ranked[1].location_id, "Far");

        let ranked = rank_candidates(&snapshot(&[("Far", 1), ("TieA", 1)]), &target, &index);
        assert_eq!(ranked[0].location_id, "Far");
        assert_eq!(ranked[1].location_id, "TieA");
    }

    #[test]
    fn test_target_itself_is_a_candidate_at_zero_distance() {
        let index = index();
        let target = index.get("T").unwrap().clone();

        let ranked = rank_candidates(&snapshot(&[("Near", 1), ("T", 4)]), &target, &index);

        assert_eq!(ranked[0].location_id, "T");
        assert_eq!(ranked[0].distance, 0.0);
    }
}
