//! Per-event driver combining layer clustering and cross-layer linking.

use std::collections::BTreeMap;

use calocluster_core::cluster::sort_by_energy;
use calocluster_core::clustering::{ClusteringConfig, ClusteringStatistics};
use calocluster_core::layers::is_valid_layer;
use calocluster_core::{Cluster2d, Cluster3d, ClusterRecord, ConfigError, Hit};

use crate::{GeometryContext, LayerClustering, ShowerLinking};

/// Clusters produced from one event.
#[derive(Debug, Clone, Default)]
pub struct ClusterOutput {
    /// 2D clusters left out of every 3D candidate, highest energy first.
    pub clusters_2d: Vec<Cluster2d>,
    /// Kept 3D clusters, highest energy first.
    pub clusters_3d: Vec<Cluster3d>,
    /// Counters for the event.
    pub statistics: ClusteringStatistics,
}

impl ClusterOutput {
    /// Flattens both lists into one energy-ordered record list.
    #[must_use]
    pub fn records(&self) -> Vec<ClusterRecord> {
        let mut records: Vec<ClusterRecord> = self
            .clusters_3d
            .iter()
            .map(ClusterRecord::from)
            .chain(self.clusters_2d.iter().map(ClusterRecord::from))
            .collect();
        sort_by_energy(&mut records);
        records
    }

    /// True when the event produced no cluster of either kind.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clusters_2d.is_empty() && self.clusters_3d.is_empty()
    }
}

/// Shower clustering engine bound to one run's geometry.
///
/// Holds no per-event state, so one engine can serve events in sequence;
/// every call to [`cluster_event`](Self::cluster_event) starts from scratch.
#[derive(Debug, Clone)]
pub struct ShowerClustering<'g> {
    geometry: &'g GeometryContext,
    layer: LayerClustering,
    linking: ShowerLinking,
}

impl<'g> ShowerClustering<'g> {
    /// Creates an engine after validating `config`.
    ///
    /// # Errors
    /// Returns the [`ConfigError`] raised by [`ClusteringConfig::validate`].
    pub fn new(geometry: &'g GeometryContext, config: ClusteringConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let linking = ShowerLinking::new(&config);
        Ok(Self {
            geometry,
            layer: LayerClustering::new(config),
            linking,
        })
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &ClusteringConfig {
        self.layer.config()
    }

    /// Get the geometry the engine was built for.
    #[must_use]
    pub fn geometry(&self) -> &'g GeometryContext {
        self.geometry
    }

    /// Clusters one event.
    ///
    /// Hits on layers outside `0..LAYER_MAX` are dropped and counted. The
    /// remaining hits are clustered layer by layer, the 2D clusters are
    /// linked across layers, and both output lists come back sorted by
    /// descending energy.
    #[must_use]
    pub fn cluster_event(&self, hits: &[Hit]) -> ClusterOutput {
        let mut stats = ClusteringStatistics::default();

        let mut by_layer: BTreeMap<usize, Vec<Hit>> = BTreeMap::new();
        for hit in hits {
            if is_valid_layer(hit.layer) {
                by_layer.entry(hit.layer).or_default().push(*hit);
            } else {
                log::trace!("dropping hit on cell {} with layer {}", hit.cell, hit.layer);
                stats.hits_rejected += 1;
            }
        }
        stats.hits_processed = hits.len() - stats.hits_rejected;
        stats.layers_with_hits = by_layer.len();

        let mut layer_state = self.layer.create_state();
        let mut clusters_2d = Vec::new();
        for layer_hits in by_layer.values() {
            clusters_2d.extend(self.layer.cluster(self.geometry, layer_hits, &mut layer_state));
            stats.hits_replaced += layer_state.replaced();
        }
        stats.clusters_2d = clusters_2d.len();

        let mut link_state = self.linking.create_state();
        let linked = self.linking.link(self.geometry, clusters_2d, &mut link_state);
        stats.candidates_3d = linked.candidates;
        stats.candidates_discarded = linked.discarded;
        stats.clusters_3d = linked.clusters_3d.len();
        stats.unclaimed_2d = linked.unclaimed.len();

        let mut output = ClusterOutput {
            clusters_2d: linked.unclaimed,
            clusters_3d: linked.clusters_3d,
            statistics: stats,
        };
        sort_by_energy(&mut output.clusters_2d);
        sort_by_energy(&mut output.clusters_3d);

        log::debug!(
            "event: {} hits ({} rejected) on {} layers -> {} 2d clusters, {}/{} 3d candidates kept, {} 2d unclaimed",
            stats.hits_processed,
            stats.hits_rejected,
            stats.layers_with_hits,
            stats.clusters_2d,
            stats.clusters_3d,
            stats.candidates_3d,
            stats.unclaimed_2d
        );
        output
    }
}
