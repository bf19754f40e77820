//! Tracks, their graph projections, and the overview histogram (`spec.md` §3, §4.6, §4.7).

use crate::entities::handle::{Handle, HandleId, HandleKind};
use crate::error::{Error, Result};
use crate::value_objects::property::Property;

/// Whether a track holds discrete events or scalar samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Events,
    Samples,
}

/// The operation category a track's events belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackCategory {
    Region,
    Dispatch,
    MemAlloc,
    MemCopy,
    Stream,
    Pmc,
}

/// A single `(category, name, value)` metadata tuple carried on a track.
#[derive(Debug, Clone)]
pub struct TrackMetadata {
    pub category: String,
    pub name: String,
    pub value: String,
}

/// A fixed-count bucket histogram over a track's event durations or
/// sample values, populated during metadata load (`spec.md` §4.7).
#[derive(Debug, Clone)]
pub struct Histogram {
    pub bucket_lo: f64,
    pub bucket_hi: f64,
    pub counts: Vec<u64>,
}

impl Histogram {
    #[must_use]
    pub fn new(bucket_lo: f64, bucket_hi: f64, bucket_count: usize) -> Self {
        Self {
            bucket_lo,
            bucket_hi,
            counts: vec![0; bucket_count],
        }
    }

    /// Bucket index `value` falls into, clamped to the histogram's range.
    pub fn record(&mut self, value: f64) {
        if self.counts.is_empty() || self.bucket_hi <= self.bucket_lo {
            return;
        }
        let span = self.bucket_hi - self.bucket_lo;
        let frac = ((value - self.bucket_lo) / span).clamp(0.0, 0.999_999);
        let idx = (frac * self.counts.len() as f64) as usize;
        self.counts[idx.min(self.counts.len() - 1)] += 1;
    }
}

/// A linearly ordered stream of events or samples bound to one
/// hardware/software addressable unit (`spec.md` §3).
#[derive(Debug, Clone)]
pub struct Track {
    id: HandleId,
    kind: TrackKind,
    category: TrackCategory,
    name: String,
    sub_name: String,
    min_ts: u64,
    max_ts: u64,
    min_value: Option<f64>,
    max_value: Option<f64>,
    metadata: Vec<TrackMetadata>,
    /// Opaque key the storage layer uses to bound queries to this track.
    dm_handle: u64,
    pub histogram: Option<Histogram>,
}

impl Track {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: HandleId,
        kind: TrackKind,
        category: TrackCategory,
        name: String,
        sub_name: String,
        min_ts: u64,
        max_ts: u64,
        dm_handle: u64,
    ) -> Self {
        Self {
            id,
            kind,
            category,
            name,
            sub_name,
            min_ts,
            max_ts,
            min_value: None,
            max_value: None,
            metadata: Vec::new(),
            dm_handle,
            histogram: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> HandleId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    #[must_use]
    pub fn dm_handle(&self) -> u64 {
        self.dm_handle
    }

    #[must_use]
    pub fn time_range(&self) -> (u64, u64) {
        (self.min_ts, self.max_ts)
    }

    pub fn push_metadata(&mut self, category: String, name: String, value: String) {
        self.metadata.push(TrackMetadata { category, name, value });
    }

    pub fn set_value_range(&mut self, min_value: f64, max_value: f64) {
        self.min_value = Some(min_value);
        self.max_value = Some(max_value);
    }
}

impl Handle for Track {
    fn kind(&self) -> HandleKind {
        HandleKind::Track
    }

    fn get_u64(&self, property: Property, index: u64) -> Result<u64> {
        match property {
            Property::TrackId => Ok(self.id.raw()),
            Property::TrackType => Ok(match self.kind {
                TrackKind::Events => 0,
                TrackKind::Samples => 1,
            }),
            Property::TrackCategory => Ok(match self.category {
                TrackCategory::Region => 0,
                TrackCategory::Dispatch => 1,
                TrackCategory::MemAlloc => 2,
                TrackCategory::MemCopy => 3,
                TrackCategory::Stream => 4,
                TrackCategory::Pmc => 5,
            }),
            Property::TrackMinTimestamp => Ok(self.min_ts),
            Property::TrackMaxTimestamp => Ok(self.max_ts),
            Property::TrackMetadataCount => Ok(self.metadata.len() as u64),
            Property::TrackDmHandle => Ok(self.dm_handle),
            _ => Err(self.reject(property)),
        }
    }

    fn get_f64(&self, property: Property, _index: u64) -> Result<f64> {
        match property {
            Property::TrackMinValue => self
                .min_value
                .ok_or_else(|| Error::NotLoaded { resource: "track value range".into() }),
            Property::TrackMaxValue => self
                .max_value
                .ok_or_else(|| Error::NotLoaded { resource: "track value range".into() }),
            _ => Err(self.reject(property)),
        }
    }

    fn get_string(&self, property: Property, index: u64) -> Result<String> {
        match property {
            Property::TrackName => Ok(self.name.clone()),
            Property::TrackSubName => Ok(self.sub_name.clone()),
            Property::TrackMetadataCategory => {
                Self::check_index(index, self.metadata.len() as u64)?;
                Ok(self.metadata[index as usize].category.clone())
            }
            Property::TrackMetadataName => {
                Self::check_index(index, self.metadata.len() as u64)?;
                Ok(self.metadata[index as usize].name.clone())
            }
            Property::TrackMetadataValue => {
                Self::check_index(index, self.metadata.len() as u64)?;
                Ok(self.metadata[index as usize].value.clone())
            }
            _ => Err(self.reject(property)),
        }
    }
}

/// Render hint a [`Graph`] carries for its bound track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderHint {
    Flame,
    Line,
}

/// A renderable projection of a [`Track`], bound to a LOD tier (`spec.md` §4.6).
#[derive(Debug, Clone)]
pub struct Graph {
    id: HandleId,
    track: HandleId,
    render_hint: RenderHint,
    lod_tier: u32,
}

impl Graph {
    #[must_use]
    pub fn new(id: HandleId, track: HandleId, track_kind: TrackKind) -> Self {
        let render_hint = match track_kind {
            TrackKind::Events => RenderHint::Flame,
            TrackKind::Samples => RenderHint::Line,
        };
        Self {
            id,
            track,
            render_hint,
            lod_tier: 0,
        }
    }

    #[must_use]
    pub fn id(&self) -> HandleId {
        self.id
    }

    #[must_use]
    pub fn track(&self) -> HandleId {
        self.track
    }

    pub fn set_lod_tier(&mut self, tier: u32) {
        self.lod_tier = tier;
    }
}

impl Handle for Graph {
    fn kind(&self) -> HandleKind {
        HandleKind::Graph
    }

    fn get_u64(&self, property: Property, _index: u64) -> Result<u64> {
        match property {
            Property::GraphRenderHint => Ok(match self.render_hint {
                RenderHint::Flame => 0,
                RenderHint::Line => 1,
            }),
            Property::GraphLodTier => Ok(u64::from(self.lod_tier)),
            _ => Err(self.reject(property)),
        }
    }

    fn get_object(&self, property: Property, _index: u64) -> Result<Option<HandleId>> {
        match property {
            Property::GraphTrack => Ok(Some(self.track)),
            _ => Err(self.reject(property)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn histogram_clamps_into_range() {
        let mut h = Histogram::new(0.0, 100.0, 10);
        h.record(-5.0);
        h.record(999.0);
        h.record(50.0);
        assert_eq!(h.counts.iter().sum::<u64>(), 3);
    }

    #[test]
    fn track_rejects_foreign_property() {
        let t = Track::new(
            HandleId::new(1),
            TrackKind::Events,
            TrackCategory::Region,
            "gpu0".into(),
            String::new(),
            0,
            100,
            42,
        );
        assert!(matches!(
            t.get_u64(Property::GraphLodTier, 0),
            Err(Error::UnhandledProperty { .. })
        ));
    }

    #[test]
    fn track_name_length_probe_roundtrip() {
        let t = Track::new(
            HandleId::new(1),
            TrackKind::Events,
            TrackCategory::Region,
            "gpu0".into(),
            String::new(),
            0,
            100,
            42,
        );
        let s = t.get_string(Property::TrackName, 0).unwrap();
        assert_eq!(s.len(), 4);
        assert_eq!(s, "gpu0");
    }
}
