use indexmap::IndexMap;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::EventId;
use crate::error::{EngineError, EngineResult};

/// Tuning for the card relaxation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CardLayoutConfig {
    pub iterations: usize,
    pub k_anchor: f64,
    pub k_repulse: f64,
    pub friction: f64,
    pub card_width: f64,
    pub card_height: f64,
    /// Ideal slot sits this many pixels above the marker.
    pub anchor_offset_y: f64,
    /// Half-width of the random start perturbation. Zero starts every card
    /// exactly at its slot.
    pub jitter: f64,
    pub seed: u64,
}

impl Default for CardLayoutConfig {
    fn default() -> Self {
        Self {
            iterations: 60,
            k_anchor: 0.08,
            k_repulse: 0.5,
            friction: 0.6,
            card_width: 220.0,
            card_height: 96.0,
            anchor_offset_y: 64.0,
            jitter: 0.0,
            seed: 0x5eed_ca2d,
        }
    }
}

impl CardLayoutConfig {
    pub fn validate(self) -> EngineResult<Self> {
        for (value, name) in [
            (self.k_anchor, "k_anchor"),
            (self.k_repulse, "k_repulse"),
            (self.card_width, "card_width"),
            (self.card_height, "card_height"),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(EngineError::InvalidData(format!(
                    "card layout `{name}` must be finite and > 0"
                )));
            }
        }
        if !self.friction.is_finite() || !(0.0..1.0).contains(&self.friction) {
            return Err(EngineError::InvalidData(
                "card layout friction must be in [0, 1)".to_owned(),
            ));
        }
        if !self.anchor_offset_y.is_finite() || !self.jitter.is_finite() || self.jitter < 0.0 {
            return Err(EngineError::InvalidData(
                "card layout offset and jitter must be finite (jitter >= 0)".to_owned(),
            ));
        }
        Ok(self)
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_card_size(mut self, width: f64, height: f64) -> Self {
        self.card_width = width;
        self.card_height = height;
        self
    }
}

/// Screen-space marker of one expanded event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardAnchor {
    pub id: EventId,
    pub x: f64,
    pub y: f64,
}

impl CardAnchor {
    #[must_use]
    pub fn new(id: EventId, x: f64, y: f64) -> Self {
        Self { id, x, y }
    }
}

/// Card position relative to its marker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CardOffset {
    pub offset_x: f64,
    pub offset_y: f64,
}

/// Simulation state of one card; lives for a single solve.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    pub id: EventId,
    pub tx: f64,
    pub ty: f64,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardLayout {
    pub offsets: IndexMap<EventId, CardOffset>,
    pub initial_energy: f64,
    pub final_energy: f64,
}

/// Total pairwise overlap area of the cards' bounding boxes.
#[must_use]
pub fn overlap_energy(nodes: &[LayoutNode], card_width: f64, card_height: f64) -> f64 {
    let mut energy = 0.0;
    for (i, a) in nodes.iter().enumerate() {
        for b in &nodes[i + 1..] {
            let overlap_x = card_width - (a.x - b.x).abs();
            let overlap_y = card_height - (a.y - b.y).abs();
            if overlap_x > 0.0 && overlap_y > 0.0 {
                energy += overlap_x * overlap_y;
            }
        }
    }
    energy
}

/// Places cards near their markers while pushing overlapping ones apart.
///
/// Output is deterministic for a given `config.seed`; the generator is only
/// consulted for start jitter and for pairs sitting exactly on top of each
/// other along the push axis.
#[must_use]
pub fn solve_card_layout(anchors: &[CardAnchor], config: CardLayoutConfig) -> CardLayout {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut nodes: Vec<LayoutNode> = anchors
        .iter()
        .filter(|anchor| anchor.x.is_finite() && anchor.y.is_finite())
        .map(|anchor| {
            let tx = anchor.x;
            let ty = anchor.y - config.anchor_offset_y;
            let (jx, jy) = if config.jitter > 0.0 {
                (
                    rng.gen_range(-config.jitter..=config.jitter),
                    rng.gen_range(-config.jitter..=config.jitter),
                )
            } else {
                (0.0, 0.0)
            };
            LayoutNode {
                id: anchor.id.clone(),
                tx,
                ty,
                x: tx + jx,
                y: ty + jy,
                vx: 0.0,
                vy: 0.0,
            }
        })
        .collect();

    let initial_energy = overlap_energy(&nodes, config.card_width, config.card_height);
    if nodes.len() > 1 && initial_energy > 0.0 {
        let mut forces = vec![(0.0_f64, 0.0_f64); nodes.len()];
        for _ in 0..config.iterations {
            relax_once(&mut nodes, &mut forces, config, &mut rng);
        }
    }
    let final_energy = overlap_energy(&nodes, config.card_width, config.card_height);
    trace!(
        cards = nodes.len(),
        initial_energy,
        final_energy,
        "card layout solved"
    );

    // Targets sit `anchor_offset_y` above the marker, so the marker is recoverable.
    let offsets = nodes
        .into_iter()
        .map(|node| {
            let offset = CardOffset {
                offset_x: node.x - node.tx,
                offset_y: node.y - (node.ty + config.anchor_offset_y),
            };
            (node.id, offset)
        })
        .collect();

    CardLayout {
        offsets,
        initial_energy,
        final_energy,
    }
}

fn relax_once(
    nodes: &mut [LayoutNode],
    forces: &mut [(f64, f64)],
    config: CardLayoutConfig,
    rng: &mut StdRng,
) {
    for (force, node) in forces.iter_mut().zip(nodes.iter()) {
        *force = (
            (node.tx - node.x) * config.k_anchor,
            (node.ty - node.y) * config.k_anchor,
        );
    }

    for i in 0..nodes.len() {
        for j in i + 1..nodes.len() {
            let dx = nodes[i].x - nodes[j].x;
            let dy = nodes[i].y - nodes[j].y;
            let overlap_x = config.card_width - dx.abs();
            let overlap_y = config.card_height - dy.abs();
            if overlap_x <= 0.0 || overlap_y <= 0.0 {
                continue;
            }
            if overlap_x < overlap_y {
                let push = overlap_x * config.k_repulse * direction(dx, rng);
                forces[i].0 += push;
                forces[j].0 -= push;
            } else {
                let push = overlap_y * config.k_repulse * direction(dy, rng);
                forces[i].1 += push;
                forces[j].1 -= push;
            }
        }
    }

    for (node, (fx, fy)) in nodes.iter_mut().zip(forces.iter()) {
        node.vx += fx;
        node.vy += fy;
        node.x += node.vx;
        node.y += node.vy;
        node.vx *= config.friction;
        node.vy *= config.friction;
    }
}

fn direction(delta: f64, rng: &mut StdRng) -> f64 {
    if delta > 0.0 {
        1.0
    } else if delta < 0.0 {
        -1.0
    } else if rng.gen_bool(0.5) {
        1.0
    } else {
        -1.0
    }
}
