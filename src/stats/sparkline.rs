//! Sparkline geometry for recent latency samples.
//!
//! Produces one bar per sample on a fixed canvas. Missing samples become a
//! short gap marker in the alert color so they never read as "fast".

/// Default canvas width.
pub const DEFAULT_WIDTH: f64 = 100.0;
/// Default canvas height.
pub const DEFAULT_HEIGHT: f64 = 24.0;
/// Normalization ceiling when no sample carries a usable value.
pub const DEFAULT_CEILING: f64 = 100.0;
/// Minimum drawn height of any bar, gap markers included.
pub const MIN_BAR_HEIGHT: f64 = 2.0;

pub const VALUE_COLOR: &str = "#3B82F6";
pub const GAP_COLOR: &str = "#EF4444";

/// Number of block levels used by text renderers.
const LEVELS: f64 = 8.0;

/// Drawing surface dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarKind {
    /// A measured latency.
    Value,
    /// A failed or missing probe.
    Gap,
}

/// One rectangle, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub kind: BarKind,
}

impl Bar {
    pub fn color(&self) -> &'static str {
        match self.kind {
            BarKind::Value => VALUE_COLOR,
            BarKind::Gap => GAP_COLOR,
        }
    }
}

/// Normalized bar series, or an explicit marker that there was nothing to draw.
#[derive(Debug, Clone, PartialEq)]
pub enum Sparkline {
    NoData,
    Bars { canvas: Canvas, bars: Vec<Bar> },
}

impl Sparkline {
    /// Lay out `samples` (oldest first) on `canvas`.
    pub fn build(samples: &[Option<f64>], canvas: Canvas) -> Self {
        if samples.is_empty() {
            return Sparkline::NoData;
        }

        let count = samples.len() as f64;
        let max = samples
            .iter()
            .flatten()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        let ceiling = if max.is_finite() && max > 0.0 {
            max
        } else {
            DEFAULT_CEILING
        };

        let step = canvas.width / count;
        let bar_width = ((canvas.width / count).floor() - 1.0).max(1.0);

        let bars = samples
            .iter()
            .enumerate()
            .map(|(i, sample)| {
                let x = i as f64 * step;
                match sample {
                    None => Bar {
                        x,
                        y: canvas.height - MIN_BAR_HEIGHT,
                        width: bar_width,
                        height: MIN_BAR_HEIGHT,
                        kind: BarKind::Gap,
                    },
                    Some(value) => {
                        let height = (value.max(0.0) / ceiling * canvas.height)
                            .max(MIN_BAR_HEIGHT)
                            .min(canvas.height);
                        Bar {
                            x,
                            y: canvas.height - height,
                            width: bar_width,
                            height,
                            kind: BarKind::Value,
                        }
                    }
                }
            })
            .collect();

        Sparkline::Bars { canvas, bars }
    }

    pub fn bars(&self) -> &[Bar] {
        match self {
            Sparkline::NoData => &[],
            Sparkline::Bars { bars, .. } => bars,
        }
    }

    /// Quantize each bar to a 0..=7 block level. Gap markers map to `None`.
    pub fn levels(&self) -> Vec<Option<u8>> {
        let Sparkline::Bars { canvas, bars } = self else {
            return Vec::new();
        };

        bars.iter()
            .map(|bar| match bar.kind {
                BarKind::Gap => None,
                BarKind::Value => {
                    let level = (bar.height / canvas.height * LEVELS).ceil() as u8;
                    Some(level.saturating_sub(1).min(7))
                }
            })
            .collect()
    }
}
