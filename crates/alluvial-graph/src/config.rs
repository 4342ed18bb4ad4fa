use std::fmt;

use alluvial_core::errors::AlluvialError;
use serde::{Deserialize, Serialize};

/// Where unused vertical space ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlign {
    /// Stack modules from the lower edge; spare space stays on top.
    #[default]
    Bottom,
    /// Grow margins so every network fills the full height.
    Justify,
    /// Stack modules against the upper edge; spare space stays below.
    Top,
}

/// Metric used to size or sort modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleSize {
    /// Aggregated flow relative to the largest network flow.
    #[default]
    Flow,
    /// Leaf count relative to the network's leaf count.
    Nodes,
}

impl fmt::Display for VerticalAlign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VerticalAlign::Bottom => "bottom",
            VerticalAlign::Justify => "justify",
            VerticalAlign::Top => "top",
        })
    }
}

/// Parameters of [`Diagram::update_layout`](crate::Diagram::update_layout).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    /// Total drawing height.
    pub height: f64,
    /// Width of the gap between networks, as a multiple of `module_width`.
    pub streamline_fraction: f64,
    /// Width of every module column.
    pub module_width: f64,
    /// Modules with less flow are collapsed to zero height.
    pub flow_threshold: f64,
    /// Placement of unused vertical space.
    pub vertical_align: VerticalAlign,
    /// Exponent of the base margin between unrelated modules.
    pub margin_exponent: f64,
    /// Metric for module heights.
    pub module_size: ModuleSize,
    /// Metric for the automatic module order.
    pub sort_modules_by: ModuleSize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            height: 600.0,
            streamline_fraction: 2.0,
            module_width: 100.0,
            flow_threshold: 8e-3,
            vertical_align: VerticalAlign::Bottom,
            margin_exponent: 5.0,
            module_size: ModuleSize::Flow,
            sort_modules_by: ModuleSize::Flow,
        }
    }
}

impl LayoutConfig {
    /// Rejects parameters the layout cannot work with.
    pub fn validate(&self) -> Result<(), AlluvialError> {
        let checks = [
            ("height", self.height),
            ("streamlineFraction", self.streamline_fraction),
            ("moduleWidth", self.module_width),
            ("flowThreshold", self.flow_threshold),
        ];
        for (name, value) in checks {
            if !value.is_finite() || value < 0.0 {
                return Err(AlluvialError::layout(
                    "invalid-parameter",
                    "layout parameter must be finite and non-negative",
                )
                .with_context("parameter", name)
                .with_context("value", value));
            }
        }
        if !self.margin_exponent.is_finite() {
            return Err(
                AlluvialError::layout("invalid-parameter", "margin exponent must be finite")
                    .with_context("parameter", "marginExponent")
                    .with_context("value", self.margin_exponent),
            );
        }
        Ok(())
    }

    /// Copy with invalid fields replaced by their defaults.
    pub fn sanitised(&self) -> Self {
        let defaults = Self::default();
        let usable = |value: f64, fallback: f64| {
            if value.is_finite() && value >= 0.0 {
                value
            } else {
                fallback
            }
        };
        Self {
            height: usable(self.height, defaults.height),
            streamline_fraction: usable(self.streamline_fraction, defaults.streamline_fraction),
            module_width: usable(self.module_width, defaults.module_width),
            flow_threshold: usable(self.flow_threshold, defaults.flow_threshold),
            margin_exponent: if self.margin_exponent.is_finite() {
                self.margin_exponent
            } else {
                defaults.margin_exponent
            },
            ..*self
        }
    }
}
