//! Responsive Breakpoints
//!
//! Maps a terminal width (in columns) to a named layout density. Surfaces use
//! the resulting flags to decide how much chrome to draw: narrow terminals get
//! a single column, wide ones get side panels.
//!
//! Width is taken as `Option<i32>` because resize notifications are not
//! always trustworthy: some terminals report zero or negative sizes during
//! reattach, and a headless surface has no width at all. All of those resolve
//! to [`Breakpoint::Narrow`], the most conservative layout.

use serde::{Deserialize, Serialize};

/// Widths below this are narrow
pub const COMPACT_MIN_WIDTH: i32 = 60;

/// Widths at or above this are normal
pub const NORMAL_MIN_WIDTH: i32 = 100;

/// Widths at or above this are wide
pub const WIDE_MIN_WIDTH: i32 = 160;

/// Named layout breakpoint
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Breakpoint {
    /// Below 60 columns (or unknown width)
    #[default]
    Narrow,
    /// 60..100 columns
    Compact,
    /// 100..160 columns
    Normal,
    /// 160 columns and above
    Wide,
}

impl Breakpoint {
    /// Human-readable label
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Narrow => "narrow",
            Self::Compact => "compact",
            Self::Normal => "normal",
            Self::Wide => "wide",
        }
    }
}

impl std::fmt::Display for Breakpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Resolved breakpoint plus convenience flags
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakpointInfo {
    /// The resolved breakpoint
    pub breakpoint: Breakpoint,
    /// `breakpoint == Narrow`
    pub is_narrow: bool,
    /// `breakpoint == Compact`
    pub is_compact: bool,
    /// `breakpoint == Normal`
    pub is_normal: bool,
    /// `breakpoint == Wide`
    pub is_wide: bool,
}

impl From<Breakpoint> for BreakpointInfo {
    fn from(breakpoint: Breakpoint) -> Self {
        Self {
            breakpoint,
            is_narrow: breakpoint == Breakpoint::Narrow,
            is_compact: breakpoint == Breakpoint::Compact,
            is_normal: breakpoint == Breakpoint::Normal,
            is_wide: breakpoint == Breakpoint::Wide,
        }
    }
}

impl Default for BreakpointInfo {
    fn default() -> Self {
        Breakpoint::default().into()
    }
}

/// Resolve a terminal width to a breakpoint
///
/// `None` and non-positive widths resolve to narrow.
#[must_use]
pub fn resolve(width: Option<i32>) -> BreakpointInfo {
    let breakpoint = match width {
        Some(w) if w >= WIDE_MIN_WIDTH => Breakpoint::Wide,
        Some(w) if w >= NORMAL_MIN_WIDTH => Breakpoint::Normal,
        Some(w) if w >= COMPACT_MIN_WIDTH => Breakpoint::Compact,
        _ => Breakpoint::Narrow,
    };
    breakpoint.into()
}

/// Resolve a width as reported by a terminal backend
#[must_use]
pub fn resolve_width(columns: u16) -> BreakpointInfo {
    resolve(Some(i32::from(columns)))
}
