use std::fmt;

const SCALE_STEP: f64 = 0.04;
const LIFT_STEP: f64 = 12.0;
const DEPTH_STEP: f64 = 50.0;
const MAX_DEPTH: u8 = 3;

/// Where a card sits in the visible stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardTransform {
    /// Already swiped, parked outside the viewport.
    OffScreen,
    Active,
    /// Waiting behind the active card, `depth` steps back (1..=3).
    Stacked { depth: u8 },
}

impl CardTransform {
    pub fn scale(&self) -> f64 {
        match self {
            CardTransform::Stacked { depth } => 1.0 - f64::from(*depth) * SCALE_STEP,
            _ => 1.0,
        }
    }

    /// Vertical offset in pixels, negative is up.
    pub fn translate_y(&self) -> f64 {
        match self {
            CardTransform::Stacked { depth } => -f64::from(*depth) * LIFT_STEP,
            _ => 0.0,
        }
    }

    pub fn translate_z(&self) -> f64 {
        match self {
            CardTransform::Stacked { depth } => -f64::from(*depth) * DEPTH_STEP,
            _ => 0.0,
        }
    }
}

impl fmt::Display for CardTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardTransform::OffScreen => write!(f, "translateX(100vw)"),
            CardTransform::Active => write!(f, "rotate(0deg) scale(1)"),
            CardTransform::Stacked { .. } => write!(
                f,
                "scale({:.2}) translateY({}px) translateZ({}px)",
                self.scale(),
                self.translate_y(),
                self.translate_z()
            ),
        }
    }
}

pub fn card_transform(index: i64, cursor: i64) -> CardTransform {
    let relative = index.saturating_sub(cursor);
    if relative < 0 {
        CardTransform::OffScreen
    } else if relative == 0 {
        CardTransform::Active
    } else {
        CardTransform::Stacked {
            depth: relative.min(i64::from(MAX_DEPTH)) as u8,
        }
    }
}
