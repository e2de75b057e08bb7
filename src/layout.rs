//! Overlay geometry: transformation matrices, page rotation and watermark style

/// Represents a PDF transformation matrix [a b c d e f]
/// where: x' = a*x + c*y + e, y' = b*x + d*y + f
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformMatrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl TransformMatrix {
    /// Identity matrix (no transformation)
    pub fn identity() -> Self {
        Self { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 0.0, f: 0.0 }
    }

    /// Pure translation
    pub fn translation(tx: f32, ty: f32) -> Self {
        Self { e: tx, f: ty, ..Self::identity() }
    }

    /// Counter-clockwise rotation by a quarter-turn multiple.
    /// Exact values, no trigonometry, so corners land on whole points.
    pub fn rotation(rotation: Rotation) -> Self {
        let (cos, sin) = match rotation {
            Rotation::None => (1.0, 0.0),
            Rotation::Quarter => (0.0, 1.0),
            Rotation::Half => (-1.0, 0.0),
            Rotation::ThreeQuarter => (0.0, -1.0),
        };
        Self { a: cos, b: sin, c: -sin, d: cos, e: 0.0, f: 0.0 }
    }

    /// Concatenate: apply `self` first, then `next`
    pub fn then(&self, next: &TransformMatrix) -> Self {
        Self {
            a: self.a * next.a + self.b * next.c,
            b: self.a * next.b + self.b * next.d,
            c: self.c * next.a + self.d * next.c,
            d: self.c * next.b + self.d * next.d,
            e: self.e * next.a + self.f * next.c + next.e,
            f: self.e * next.b + self.f * next.d + next.f,
        }
    }

    /// Map a point through this matrix
    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Check if this is (approximately) the identity matrix
    pub fn is_identity(&self) -> bool {
        (self.a - 1.0).abs() < 0.001 &&
        self.b.abs() < 0.001 &&
        self.c.abs() < 0.001 &&
        (self.d - 1.0).abs() < 0.001 &&
        self.e.abs() < 0.001 &&
        self.f.abs() < 0.001
    }

    /// The six `cm` operands in PDF order
    pub fn operands(&self) -> [f32; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }
}

/// Page rotation as stored in the `/Rotate` entry (clockwise, quarter turns)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    None,
    Quarter,
    Half,
    ThreeQuarter,
}

impl Rotation {
    /// Normalise any multiple of 90 (negative or over 360 included)
    pub fn from_degrees(degrees: i64) -> Option<Self> {
        match degrees.rem_euclid(360) {
            0 => Some(Rotation::None),
            90 => Some(Rotation::Quarter),
            180 => Some(Rotation::Half),
            270 => Some(Rotation::ThreeQuarter),
            _ => None,
        }
    }

    pub fn degrees(&self) -> i64 {
        match self {
            Rotation::None => 0,
            Rotation::Quarter => 90,
            Rotation::Half => 180,
            Rotation::ThreeQuarter => 270,
        }
    }
}

/// Transform that makes overlay text read upright on a rotated page
///
/// The overlay is drawn in the unrotated MediaBox space of a `width` x `height`
/// page. Rotating by the page's own rotation and translating back into the box
/// puts the overlay origin on the corner that is displayed bottom-left.
/// This intentionally differs from the legacy `(height, 0)` / `(0, width)`
/// translations for 90 and 270, which push the text off non-square pages.
pub fn overlay_transform(rotation: Rotation, width: f32, height: f32) -> TransformMatrix {
    let (tx, ty) = match rotation {
        Rotation::None => return TransformMatrix::identity(),
        Rotation::Quarter => (width, 0.0),
        Rotation::Half => (width, height),
        Rotation::ThreeQuarter => (0.0, height),
    };
    TransformMatrix::rotation(rotation).then(&TransformMatrix::translation(tx, ty))
}

/// Fixed watermark appearance
#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkStyle {
    /// Standard Type1 font used for the overlay
    pub font: String,
    /// Font size in points
    pub font_size: f32,
    /// Fill gray level (0 = black, 1 = white)
    pub fill_gray: f32,
    /// Distance of both lines from the left edge
    pub x: f32,
    /// Baseline of the first line, measured from the bottom edge
    pub baseline_y: f32,
    /// Vertical distance between the two lines
    pub line_spacing: f32,
}

impl Default for WatermarkStyle {
    fn default() -> Self {
        Self {
            font: "Helvetica".to_string(),
            font_size: 10.0,
            fill_gray: 0.2,
            x: 10.0,
            baseline_y: 20.0,
            line_spacing: 12.0,
        }
    }
}

impl WatermarkStyle {
    /// Baseline origins of line 1 and line 2 in overlay space
    pub fn line_origins(&self) -> [(f32, f32); 2] {
        [
            (self.x, self.baseline_y),
            (self.x, self.baseline_y - self.line_spacing),
        ]
    }
}

/// Split watermark text into its two display lines
///
/// Only the first two newline-separated segments are used; anything after
/// the second newline is dropped.
pub fn split_lines(text: &str) -> (&str, &str) {
    let mut lines = text.split('\n');
    let first = lines.next().unwrap_or("");
    let second = lines.next().unwrap_or("");
    (first, second)
}
