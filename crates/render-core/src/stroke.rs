//! Stroke styles.
//!
//! A [`BasicStroke`] maps directly onto PDF line state operators. Anything
//! else must be turned into a filled outline by a [`StrokeOutliner`].

use crate::shape::Shape;
use std::fmt::Debug;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

impl LineCap {
    /// Operand of the `J` operator.
    pub fn pdf_value(self) -> i64 {
        match self {
            LineCap::Butt => 0,
            LineCap::Square => 2,
            LineCap::Round => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

impl LineJoin {
    /// Operand of the `j` operator.
    pub fn pdf_value(self) -> i64 {
        match self {
            LineJoin::Miter => 0,
            LineJoin::Bevel => 2,
            LineJoin::Round => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BasicStroke {
    pub width: f32,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f32,
    pub dash: Option<Vec<f32>>,
    pub dash_phase: f32,
}

impl Default for BasicStroke {
    fn default() -> Self {
        Self {
            width: 1.0,
            cap: LineCap::Square,
            join: LineJoin::Miter,
            miter_limit: 10.0,
            dash: None,
            dash_phase: 0.0,
        }
    }
}

impl BasicStroke {
    pub fn new(width: f32) -> Self {
        Self {
            width,
            ..Self::default()
        }
    }

    pub fn with_cap(mut self, cap: LineCap) -> Self {
        self.cap = cap;
        self
    }

    pub fn with_join(mut self, join: LineJoin) -> Self {
        self.join = join;
        self
    }

    pub fn with_dash(mut self, dash: Vec<f32>, phase: f32) -> Self {
        self.dash = Some(dash);
        self.dash_phase = phase;
        self
    }

    /// Width, dash lengths and phase multiplied by `factor`.
    pub fn scaled(&self, factor: f32) -> BasicStroke {
        BasicStroke {
            width: self.width * factor,
            dash: self
                .dash
                .as_ref()
                .map(|d| d.iter().map(|len| len * factor).collect()),
            dash_phase: self.dash_phase * factor,
            ..self.clone()
        }
    }
}

/// Converts a path into the filled area a custom stroke would cover.
pub trait StrokeOutliner: Debug + Send + Sync {
    fn outline(&self, shape: &Shape) -> Shape;
}

#[derive(Debug, Clone)]
pub enum Stroke {
    Basic(BasicStroke),
    Custom(Arc<dyn StrokeOutliner>),
}

impl Default for Stroke {
    fn default() -> Self {
        Stroke::Basic(BasicStroke::default())
    }
}

impl From<BasicStroke> for Stroke {
    fn from(stroke: BasicStroke) -> Self {
        Stroke::Basic(stroke)
    }
}

impl Stroke {
    pub fn as_basic(&self) -> Option<&BasicStroke> {
        match self {
            Stroke::Basic(b) => Some(b),
            Stroke::Custom(_) => None,
        }
    }
}
