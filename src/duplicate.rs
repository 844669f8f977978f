//! Near-duplicate clustering over image fingerprints

use std::collections::{HashMap, HashSet, VecDeque};

use log::debug;
use serde::Serialize;

use crate::ImageId;
use crate::dhash::Fingerprint;
use crate::vptree::{Hamming, VpTree};

/// Images judged near-identical, `canonical` was seen first
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub canonical: ImageId,
    pub members: Vec<ImageId>,
}

/// Group images whose fingerprints lie within `radius` bits of each other
///
/// Fingerprints are visited in first-seen order. An unclaimed fingerprint opens
/// a group and claims every unclaimed fingerprint reachable through chains of
/// range queries, so a group never shrinks when the radius grows. Groups come
/// back in order of their canonical id, groups of a single image are omitted.
pub fn find_duplicates<I>(records: I, radius: u32) -> Vec<DuplicateGroup>
where
    I: IntoIterator<Item = (ImageId, Fingerprint)>,
{
    // (position of the first image, fingerprint, ids sharing it)
    let mut distinct: Vec<(usize, Fingerprint, Vec<ImageId>)> = vec![];
    let mut slot: HashMap<Fingerprint, usize> = HashMap::new();
    let mut seen: HashSet<ImageId> = HashSet::new();
    for (position, (id, fingerprint)) in records.into_iter().enumerate() {
        if !seen.insert(id) {
            continue;
        }
        match slot.get(&fingerprint) {
            Some(&i) => distinct[i].2.push(id),
            None => {
                slot.insert(fingerprint, distinct.len());
                distinct.push((position, fingerprint, vec![id]));
            }
        }
    }

    let tree = VpTree::build(distinct.iter().map(|(_, fp, _)| *fp).collect(), Hamming);
    debug!("built duplicate index over {} distinct fingerprints", tree.len());

    let mut claimed = vec![false; distinct.len()];
    let mut groups = vec![];
    for start in 0..distinct.len() {
        if claimed[start] {
            continue;
        }
        claimed[start] = true;

        let mut component = vec![start];
        let mut queue = VecDeque::from([start]);
        while let Some(i) = queue.pop_front() {
            for neighbor in tree.within(&distinct[i].1, radius as f64) {
                if !claimed[neighbor.index] {
                    claimed[neighbor.index] = true;
                    component.push(neighbor.index);
                    queue.push_back(neighbor.index);
                }
            }
        }

        // ids of every fingerprint in the component, in input order
        let mut ids = component
            .iter()
            .flat_map(|&i| {
                let (first, _, ids) = &distinct[i];
                ids.iter().enumerate().map(move |(j, &id)| ((*first, j), id))
            })
            .collect::<Vec<_>>();
        if ids.len() < 2 {
            continue;
        }
        ids.sort_unstable_by_key(|&(order, _)| order);

        let canonical = ids[0].1;
        let members = ids[1..].iter().map(|&(_, id)| id).collect();
        groups.push(DuplicateGroup { canonical, members });
    }

    groups
}

/// Flag values to write back: canonical images stay visible, members are duplicates
pub fn duplicate_flags(groups: &[DuplicateGroup]) -> HashMap<ImageId, bool> {
    let mut flags = HashMap::new();
    for group in groups {
        flags.insert(group.canonical, false);
        for &member in &group.members {
            flags.insert(member, true);
        }
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(values: &[(ImageId, u128)]) -> Vec<(ImageId, Fingerprint)> {
        values.iter().map(|&(id, v)| (id, Fingerprint::new(v))).collect()
    }

    #[test]
    fn test_radius_boundary() {
        let population = records(&[(1, 0), (2, 1)]);
        assert_eq!(
            find_duplicates(population.clone(), 1),
            vec![DuplicateGroup { canonical: 1, members: vec![2] }]
        );
        assert!(find_duplicates(population, 0).is_empty());
    }

    #[test]
    fn test_identical_fingerprints_at_radius_zero() {
        let population = records(&[(7, 0xABCD), (3, 0xFFFF_0000), (9, 0xABCD)]);
        assert_eq!(
            find_duplicates(population, 0),
            vec![DuplicateGroup { canonical: 7, members: vec![9] }]
        );
    }

    #[test]
    fn test_shared_and_unique_fingerprints() {
        let shared = 0x5555_5555_5555_5555u128;
        let mut values = vec![];
        for id in 0..5 {
            values.push((id, shared));
        }
        // each unique fingerprint is at least 16 bits from everything else
        for (id, shift) in (5..10).zip([0, 16, 32, 48, 64]) {
            values.push((id, 0xFFFFu128 << shift));
        }
        let groups = find_duplicates(records(&values), 4);
        assert_eq!(groups, vec![DuplicateGroup { canonical: 0, members: vec![1, 2, 3, 4] }]);
    }

    #[test]
    fn test_exact_copies_of_near_duplicate_are_members() {
        // 2 and 3 share a fingerprint one bit away from 1
        let groups = find_duplicates(records(&[(1, 0b100), (2, 0b101), (3, 0b101)]), 1);
        assert_eq!(groups, vec![DuplicateGroup { canonical: 1, members: vec![2, 3] }]);
    }

    #[test]
    fn test_groups_are_disjoint() {
        let population = records(&[(1, 0), (2, 0b1), (3, 0b11), (4, 0xF000), (5, 0xF001), (6, 0xFFFF_FFFF)]);
        let groups = find_duplicates(population, 1);
        let mut seen = HashSet::new();
        for group in &groups {
            assert!(seen.insert(group.canonical));
            for member in &group.members {
                assert!(seen.insert(*member));
            }
        }
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0], DuplicateGroup { canonical: 1, members: vec![2, 3] });
        assert_eq!(groups[1], DuplicateGroup { canonical: 4, members: vec![5] });
    }

    #[test]
    fn test_repeated_ids_are_ignored() {
        let groups = find_duplicates(records(&[(1, 0), (1, 0), (2, 0xFF)]), 0);
        assert!(groups.is_empty());
    }

    #[test]
    fn test_idempotent() {
        let population = records(&[(1, 0b1010), (2, 0b1011), (3, 0b0), (4, 0xFF00), (5, 0b1010)]);
        assert_eq!(find_duplicates(population.clone(), 2), find_duplicates(population, 2));
    }

    #[test]
    fn test_monotonic_in_radius() {
        // X, A, C with d(X, A) = 2, d(A, C) = 1, d(X, C) = 3
        let population = records(&[(1, 0b0000), (2, 0b0011), (3, 0b0111), (4, 0xFF00), (5, 0xFF01)]);
        let mut previous: Vec<DuplicateGroup> = vec![];
        for radius in 0..=8 {
            let groups = find_duplicates(population.clone(), radius);
            for old in &previous {
                let old_ids = std::iter::once(old.canonical).chain(old.members.iter().copied()).collect::<HashSet<_>>();
                assert!(
                    groups.iter().any(|g| {
                        let ids = std::iter::once(g.canonical).chain(g.members.iter().copied()).collect::<HashSet<_>>();
                        old_ids.is_subset(&ids)
                    }),
                    "group {old:?} at radius {} lost at radius {radius}",
                    radius - 1
                );
            }
            previous = groups;
        }
    }

    #[test]
    fn test_duplicate_flags() {
        let groups = vec![
            DuplicateGroup { canonical: 1, members: vec![2, 3] },
            DuplicateGroup { canonical: 4, members: vec![5] },
        ];
        let flags = duplicate_flags(&groups);
        assert_eq!(flags.len(), 5);
        assert!(!flags[&1] && !flags[&4]);
        assert!(flags[&2] && flags[&3] && flags[&5]);
    }

    #[test]
    fn test_empty_population() {
        assert!(find_duplicates(Vec::<(ImageId, Fingerprint)>::new(), 3).is_empty());
    }
}
