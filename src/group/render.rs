use geo_types::Coord;

use super::StrokeGroup;
use crate::cell::GestureCell;

/// Corrections below this amount leave the initial placement fully visible.
const BLEND_START: f64 = 0.45;
/// Corrections above this amount show only the corrected placement.
const BLEND_END: f64 = 0.55;

/// Pressure of the initial and of the corrected instance of an element for
/// a given correction amount. The two always add up to 1.
pub fn correction_weights(amount: f64) -> (f64, f64) {
    let initial = if amount < BLEND_START {
        1.0
    } else if amount > BLEND_END {
        0.0
    } else {
        (BLEND_END - amount) / (BLEND_END - BLEND_START)
    };
    (initial, 1.0 - initial)
}

impl StrokeGroup {
    /// Write every synthesized element into the cell twice: the element
    /// picked initially, then the element picked by the correction, both at
    /// the placement blended by the correction amount.
    pub fn render_synthesized_strokes(&self, cell: &mut dyn GestureCell) {
        let c = self.correction_amount;
        let (initial, corrected) = correction_weights(c);
        let blend = |a: f64, b: f64| (1.0 - c) * a + c * b;
        for (target, fixed) in self.targets.iter().zip(self.corrected.iter()) {
            let scale = Coord {
                x: blend(target.scale.x, fixed.scale.x),
                y: blend(target.scale.y, fixed.scale.y),
            };
            let angle = blend(target.angle, fixed.angle);
            let pos = Coord {
                x: blend(target.position.x, fixed.position.x),
                y: blend(target.position.y, fixed.position.y),
            };
            self.element(target.element).synthesize(cell, initial, scale, angle, pos);
            self.element(fixed.element).synthesize(cell, corrected, scale, angle, pos);
        }
    }

    /// Copy the reference strokes into the cell, shifted by `offset`.
    pub fn copy(&self, cell: &mut dyn GestureCell, offset: Coord<f64>, stretch: bool) {
        for path in self.stroke_paths.iter() {
            path.copy(cell, offset, stretch);
        }
    }
}
