// ═══════════════════════════════════════════════════════════════════════
// Geometry — positions in inches, distances, base overlap, coherency
// All comparisons go through the shared epsilon; never strict equality.
// ═══════════════════════════════════════════════════════════════════════

use serde::{Deserialize, Serialize};

/// Shared tolerance for every distance comparison on the battlefield.
pub const EPS: f64 = 1e-9;

/// A point on the battlefield, in inches from the bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Position { x, y }
    }
}

/// Euclidean distance between two positions.
pub fn distance(a: Position, b: Position) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

/// Whether `b` lies within `range` inches of `a`.
pub fn in_range(a: Position, b: Position, range: f64) -> bool {
    distance(a, b) <= range + EPS
}

/// Whether two circular bases overlap. Touching bases do not overlap.
pub fn bases_overlap(p1: Position, d1: f64, p2: Position, d2: f64) -> bool {
    distance(p1, p2) < (d1 + d2) / 2.0 - EPS
}

/// Unit coherency: a lone model is always coherent; otherwise every model
/// must stand within `radius` of at least one other model.
pub fn unit_coherency_valid(positions: &[Position], radius: f64) -> bool {
    if positions.len() <= 1 {
        return true;
    }
    positions.iter().enumerate().all(|(i, &p)| {
        positions
            .iter()
            .enumerate()
            .any(|(j, &q)| i != j && in_range(p, q, radius))
    })
}

/// Project a position back onto the board rectangle [0,w]×[0,h].
pub fn clamp(pos: Position, width: f64, height: f64) -> Position {
    Position {
        x: pos.x.clamp(0.0, width),
        y: pos.y.clamp(0.0, height),
    }
}

/// The point `dist` inches from `from` along the line toward `to`.
/// Returns `to` itself when the endpoints are closer than `dist`.
pub fn step_toward(from: Position, to: Position, dist: f64) -> Position {
    let total = distance(from, to);
    if total <= dist + EPS {
        return to;
    }
    let t = dist / total;
    Position {
        x: from.x + (to.x - from.x) * t,
        y: from.y + (to.y - from.y) * t,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_symmetry() {
        let a = Position::new(3.0, 4.0);
        let b = Position::new(0.0, 0.0);
        assert!((distance(a, b) - 5.0).abs() < EPS);
        assert!((distance(a, b) - distance(b, a)).abs() < EPS);
    }

    #[test]
    fn test_in_range_epsilon() {
        let a = Position::new(0.0, 0.0);
        let b = Position::new(12.0, 0.0);
        assert!(in_range(a, b, 12.0));
        assert!(!in_range(a, b, 11.9));
    }

    #[test]
    fn test_bases_overlap() {
        let a = Position::new(0.0, 0.0);
        let b = Position::new(1.0, 0.0);
        // Two 1" bases touching exactly — not overlapping
        assert!(!bases_overlap(a, 1.0, b, 1.0));
        let c = Position::new(0.9, 0.0);
        assert!(bases_overlap(a, 1.0, c, 1.0));
    }

    #[test]
    fn test_coherency_single_model() {
        assert!(unit_coherency_valid(&[Position::new(5.0, 5.0)], 1.0));
        assert!(unit_coherency_valid(&[], 1.0));
    }

    #[test]
    fn test_coherency_chain() {
        // A chain of 1"-spaced models is coherent at radius 1
        let chain: Vec<Position> = (0..5).map(|i| Position::new(i as f64, 0.0)).collect();
        assert!(unit_coherency_valid(&chain, 1.0));
    }

    #[test]
    fn test_coherency_straggler() {
        let positions = vec![
            Position::new(0.0, 0.0),
            Position::new(1.0, 0.0),
            Position::new(10.0, 10.0),
        ];
        assert!(!unit_coherency_valid(&positions, 1.0));
    }

    #[test]
    fn test_clamp() {
        let p = clamp(Position::new(-2.0, 50.0), 60.0, 44.0);
        assert!((p.x - 0.0).abs() < EPS);
        assert!((p.y - 44.0).abs() < EPS);
    }

    #[test]
    fn test_step_toward() {
        let from = Position::new(0.0, 0.0);
        let to = Position::new(10.0, 0.0);
        let p = step_toward(from, to, 3.0);
        assert!((p.x - 3.0).abs() < EPS);
        // Short hops land on the target
        let q = step_toward(from, Position::new(1.0, 0.0), 3.0);
        assert!((q.x - 1.0).abs() < EPS);
    }
}
