//! Placement types: where an ad sits on the page and which network slot
//! it is bound to.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque identifier for a purchasable ad slot, assigned by the ad
/// network. One per position, globally unique within a page load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(String);

impl SlotId {
    /// Creates a slot ID. The id is opaque to us but must be non-empty.
    pub fn new(id: impl Into<String>) -> Result<Self, Error> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(Error::InvalidSlotId(id));
        }
        Ok(Self(id))
    }

    /// Returns the raw identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SlotId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Enumerated ad positions on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdPosition {
    Header,
    Sidebar,
    Footer,
    InArticle,
    BetweenPosts,
    InContent1,
    InContent2,
}

impl AdPosition {
    /// All positions, in page order.
    pub const ALL: [AdPosition; 7] = [
        AdPosition::Header,
        AdPosition::Sidebar,
        AdPosition::Footer,
        AdPosition::InArticle,
        AdPosition::BetweenPosts,
        AdPosition::InContent1,
        AdPosition::InContent2,
    ];

    /// The default format for this position when the placement does not
    /// specify one explicitly.
    #[must_use]
    pub fn default_format(&self) -> AdFormat {
        match self {
            AdPosition::Header | AdPosition::Footer => AdFormat::Fixed {
                width: 728,
                height: 90,
            },
            AdPosition::Sidebar => AdFormat::Fixed {
                width: 300,
                height: 600,
            },
            AdPosition::InArticle => AdFormat::Fluid {
                layout_key: "in-article".to_string(),
            },
            AdPosition::BetweenPosts | AdPosition::InContent1 | AdPosition::InContent2 => {
                AdFormat::Auto
            }
        }
    }

    /// Kebab-case name used in storage and mount-point ids.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AdPosition::Header => "header",
            AdPosition::Sidebar => "sidebar",
            AdPosition::Footer => "footer",
            AdPosition::InArticle => "in-article",
            AdPosition::BetweenPosts => "between-posts",
            AdPosition::InContent1 => "in-content-1",
            AdPosition::InContent2 => "in-content-2",
        }
    }
}

impl fmt::Display for AdPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AdPosition {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "header" => Ok(AdPosition::Header),
            "sidebar" => Ok(AdPosition::Sidebar),
            "footer" => Ok(AdPosition::Footer),
            "in-article" => Ok(AdPosition::InArticle),
            "between-posts" => Ok(AdPosition::BetweenPosts),
            "in-content-1" => Ok(AdPosition::InContent1),
            "in-content-2" => Ok(AdPosition::InContent2),
            other => Err(Error::UnknownPosition(other.to_string())),
        }
    }
}

/// Requested shape of a slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum AdFormat {
    /// Let the network choose the size.
    Auto,
    /// A fixed rectangle.
    Fixed { width: u32, height: u32 },
    /// A fluid layout driven by a network-supplied layout key.
    Fluid { layout_key: String },
}

/// One ad position on a page, bound to a network slot.
///
/// Constructed when a placement mounts and dropped when it unmounts;
/// never persisted. Whether the slot has actually been requested lives
/// in the page session, not here, so remounting the same placement does
/// not re-request the slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdPlacement {
    /// Where on the page this placement sits.
    pub position: AdPosition,
    /// The network slot bound to this position.
    pub slot_id: SlotId,
    /// Requested shape; defaults per position.
    pub format: AdFormat,
    /// Whether the slot may resize with the viewport.
    pub responsive: bool,
}

impl AdPlacement {
    /// Creates a placement with an explicit format.
    #[must_use]
    pub fn new(position: AdPosition, slot_id: SlotId, format: AdFormat, responsive: bool) -> Self {
        Self {
            position,
            slot_id,
            format,
            responsive,
        }
    }

    /// Creates a placement using the position's default format.
    #[must_use]
    pub fn for_position(position: AdPosition, slot_id: SlotId) -> Self {
        Self {
            format: position.default_format(),
            position,
            slot_id,
            responsive: true,
        }
    }

    /// The layout key, if this placement uses a fluid format.
    #[must_use]
    pub fn layout_key(&self) -> Option<&str> {
        match &self.format {
            AdFormat::Fluid { layout_key } => Some(layout_key),
            _ => None,
        }
    }
}
