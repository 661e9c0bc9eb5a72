use std::f32::consts::{FRAC_PI_2, TAU};

use eframe::egui::{Pos2, Vec2};

pub fn circle_radius(count: usize, spacing: f32) -> f32 {
    spacing.max(100.0 + count as f32 * spacing / 10.0)
}

/// Evenly spaced around a circle, first node at 12 o'clock, then clockwise on screen.
pub fn circular(count: usize, spacing: f32, center: Pos2) -> Vec<Pos2> {
    if count == 0 {
        return Vec::new();
    }

    let radius = circle_radius(count, spacing);
    (0..count)
        .map(|index| {
            let angle = -FRAC_PI_2 + (index as f32 / count as f32) * TAU;
            center + Vec2::angled(angle) * radius
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use super::{circle_radius, circular};

    #[test]
    fn starts_at_twelve_and_turns_clockwise() {
        let positions = circular(4, 100.0, pos2(0.0, 0.0));
        let radius = circle_radius(4, 100.0);
        assert_eq!(radius, 140.0);

        assert!(positions[0].x.abs() < 1e-3);
        assert!((positions[0].y + radius).abs() < 1e-3);
        // y grows downward on screen, so the next node clockwise is to the right.
        assert!((positions[1].x - radius).abs() < 1e-3);
        assert!(positions[1].y.abs() < 1e-3);
    }

    #[test]
    fn radius_never_drops_below_spacing() {
        assert_eq!(circle_radius(0, 400.0), 400.0);
        assert_eq!(circle_radius(100, 50.0), 600.0);
    }

    #[test]
    fn no_two_nodes_coincide() {
        let positions = circular(64, 80.0, pos2(10.0, 10.0));
        for a in 0..positions.len() {
            for b in (a + 1)..positions.len() {
                assert!(positions[a].distance(positions[b]) > 1.0);
            }
        }
    }
}
