// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

use crate::crossing::gaps_cross;
use crate::gaps::Gap;
use tracing::debug;

/// Gaps grouped into networks of crossing gaps.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GapClusters {
    /// All x gaps followed by all y gaps.
    pub gaps: Vec<Gap>,
    /// Cluster id of every gap in `gaps`, counting from zero.
    pub cluster_ids: Vec<usize>,
    /// Ascending indices into `gaps` for every cluster, by cluster id.
    pub clusters: Vec<Vec<usize>>,
    /// First index of a y gap in `gaps`.
    pub split_index: usize,
}

impl GapClusters {
    /// Separates a cluster's members into x gap and y gap indices.
    pub fn split(&self, cluster: &[usize]) -> (Vec<usize>, Vec<usize>) {
        cluster.iter().partition(|&&index| index < self.split_index)
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }
}

/// Collects every gap reachable from `start` through crossings.
fn take_a_walk(gaps: &[Gap], start: usize, visited: &mut [bool]) -> Vec<usize> {
    let mut component = Vec::new();
    let mut stack = vec![start];
    visited[start] = true;

    while let Some(current) = stack.pop() {
        component.push(current);

        for (candidate, other) in gaps.iter().enumerate() {
            if !visited[candidate] && gaps_cross(&gaps[current], other) {
                visited[candidate] = true;
                stack.push(candidate);
            }
        }
    }

    component.sort_unstable();
    component
}

/// Groups gaps into connected components of the crossing graph.
pub fn find_clusters(x_gaps: &[Gap], y_gaps: &[Gap]) -> GapClusters {
    let gaps: Vec<Gap> = x_gaps.iter().chain(y_gaps).copied().collect();
    let split_index = x_gaps.len();

    let mut visited = vec![false; gaps.len()];
    let mut cluster_ids = vec![0usize; gaps.len()];
    let mut clusters = Vec::new();

    for start in 0..gaps.len() {
        if visited[start] {
            continue;
        }

        let component = take_a_walk(&gaps, start, &mut visited);
        for &member in &component {
            cluster_ids[member] = clusters.len();
        }
        clusters.push(component);
    }

    debug!(
        gaps = gaps.len(),
        clusters = clusters.len(),
        "clustered gaps"
    );

    GapClusters {
        gaps,
        cluster_ids,
        clusters,
        split_index,
    }
}
