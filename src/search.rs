//! Similarity and color lookups over a snapshot of the store

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::ImageId;
use crate::color::{Color, LabPoint, to_hex, to_lab};
use crate::dhash::Fingerprint;
use crate::error::{Error, Result};
use crate::vptree::{Euclidean, Hamming, VpTree};

/// Hamming index over the fingerprints of a population
pub struct FingerprintIndex {
    tree: VpTree<Fingerprint, Hamming>,
    /// ids sharing each indexed fingerprint, in input order
    ids: Vec<Vec<ImageId>>,
    lookup: HashMap<ImageId, Fingerprint>,
}

impl FingerprintIndex {
    pub fn build<I>(records: I) -> Self
    where
        I: IntoIterator<Item = (ImageId, Fingerprint)>,
    {
        let mut points = vec![];
        let mut ids: Vec<Vec<ImageId>> = vec![];
        let mut slot: HashMap<Fingerprint, usize> = HashMap::new();
        let mut lookup: HashMap<ImageId, Fingerprint> = HashMap::new();
        for (id, fingerprint) in records {
            if lookup.contains_key(&id) {
                continue;
            }
            lookup.insert(id, fingerprint);
            match slot.get(&fingerprint) {
                Some(&i) => ids[i].push(id),
                None => {
                    slot.insert(fingerprint, points.len());
                    points.push(fingerprint);
                    ids.push(vec![id]);
                }
            }
        }
        debug!("built fingerprint index: {} images, {} distinct", lookup.len(), points.len());
        Self { tree: VpTree::build(points, Hamming), ids, lookup }
    }

    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }

    pub fn fingerprint(&self, id: ImageId) -> Option<Fingerprint> {
        self.lookup.get(&id).copied()
    }

    /// Up to `k` images most similar to `id`, nearest first
    pub fn similar_images(&self, id: ImageId, k: usize) -> Result<Vec<ImageId>> {
        Ok(self.similar_with_distance(id, k)?.into_iter().map(|(id, _)| id).collect())
    }

    /// Like [`similar_images`](Self::similar_images) with the Hamming distance of each result
    pub fn similar_with_distance(&self, id: ImageId, k: usize) -> Result<Vec<(ImageId, u32)>> {
        let query = self.fingerprint(id).ok_or(Error::UnknownId(id))?;
        let k = k.min(self.len().saturating_sub(1));
        if k == 0 {
            return Ok(vec![]);
        }

        let mut result = Vec::with_capacity(k);
        // fingerprints are shared, keep widening until k other images are found
        let mut want = k.saturating_add(1);
        loop {
            result.clear();
            let neighbors = self.tree.k_nearest(&query, want);
            let exhausted = neighbors.len() < want;
            let expanded = neighbors
                .iter()
                .flat_map(|n| self.ids[n.index].iter().map(move |&other| (other, n.distance as u32)))
                .filter(|&(other, _)| other != id);
            result.extend(expanded.take(k));
            if result.len() == k || exhausted {
                return Ok(result);
            }
            want = want.saturating_mul(2);
        }
    }
}

/// LAB index over a set of colors
pub struct ColorIndex {
    tree: VpTree<LabPoint, Euclidean>,
}

impl ColorIndex {
    /// Index every distinct color, in first-seen order
    pub fn build<I>(colors: I) -> Self
    where
        I: IntoIterator<Item = Color>,
    {
        let mut seen = HashSet::new();
        let points = colors.into_iter().filter(|c| seen.insert(*c)).map(to_lab).collect::<Vec<_>>();
        debug!("built color index over {} colors", points.len());
        Self { tree: VpTree::build(points, Euclidean) }
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// The `n` stored colors perceptually closest to `query`, nearest first
    pub fn nearest_colors(&self, query: Color, n: usize) -> Vec<Color> {
        self.nearest_with_distance(query, n).into_iter().map(|(color, _)| color).collect()
    }

    pub fn nearest_with_distance(&self, query: Color, n: usize) -> Vec<(Color, f64)> {
        self.tree
            .k_nearest(&to_lab(query), n)
            .into_iter()
            .map(|neighbor| (to_hex(*neighbor.point), neighbor.distance))
            .collect()
    }
}
