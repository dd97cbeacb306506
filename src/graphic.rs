use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{AppError, AppResult};

/// Semantic tag classifying why a graphic exists on a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GraphicKind {
    MeasurementHighlight,
    ItemMarker,
    Annotation,
    Sketch,
}

impl GraphicKind {
    pub fn as_tag(&self) -> &'static str {
        match self {
            GraphicKind::MeasurementHighlight => "measurement-highlight",
            GraphicKind::ItemMarker => "item-marker",
            GraphicKind::Annotation => "annotation",
            GraphicKind::Sketch => "sketch",
        }
    }

    pub fn parse(value: &str) -> AppResult<Self> {
        match value.trim() {
            "measurement-highlight" => Ok(GraphicKind::MeasurementHighlight),
            "item-marker" => Ok(GraphicKind::ItemMarker),
            "annotation" => Ok(GraphicKind::Annotation),
            "sketch" => Ok(GraphicKind::Sketch),
            _ => Err(AppError::Parse(format!("invalid graphic kind: {value}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SymbolKind {
    SimpleMarker,
    SimpleLine,
    SimpleFill,
}

impl SymbolKind {
    pub fn as_tag(&self) -> &'static str {
        match self {
            SymbolKind::SimpleMarker => "simple-marker",
            SymbolKind::SimpleLine => "simple-line",
            SymbolKind::SimpleFill => "simple-fill",
        }
    }
}

/// Visual style descriptor carried by a graphic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub color: String,
    pub size: f64,
}

impl Symbol {
    pub fn new(kind: SymbolKind, color: impl Into<String>, size: f64) -> Self {
        Self {
            kind,
            color: color.into(),
            size,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl Extent {
    fn from_points<'a>(points: impl Iterator<Item = &'a [f64; 2]>) -> Option<Self> {
        let mut extent: Option<Extent> = None;
        for &[x, y] in points {
            extent = Some(match extent {
                Some(e) => Extent {
                    xmin: e.xmin.min(x),
                    ymin: e.ymin.min(y),
                    xmax: e.xmax.max(x),
                    ymax: e.ymax.max(y),
                },
                None => Extent {
                    xmin: x,
                    ymin: y,
                    xmax: x,
                    ymax: y,
                },
            });
        }
        extent
    }

    pub fn center(&self) -> [f64; 2] {
        [
            (self.xmin + self.xmax) / 2.0,
            (self.ymin + self.ymax) / 2.0,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Geometry {
    Point { longitude: f64, latitude: f64 },
    Polyline { path: Vec<[f64; 2]> },
    Polygon { rings: Vec<Vec<[f64; 2]>> },
}

impl Geometry {
    /// Bounding extent used as the camera target when zooming to a graphic.
    pub fn extent(&self) -> Extent {
        match self {
            Geometry::Point {
                longitude,
                latitude,
            } => Extent {
                xmin: *longitude,
                ymin: *latitude,
                xmax: *longitude,
                ymax: *latitude,
            },
            Geometry::Polyline { path } => {
                Extent::from_points(path.iter()).unwrap_or(EMPTY_EXTENT)
            }
            Geometry::Polygon { rings } => {
                Extent::from_points(rings.iter().flatten()).unwrap_or(EMPTY_EXTENT)
            }
        }
    }
}

const EMPTY_EXTENT: Extent = Extent {
    xmin: 0.0,
    ymin: 0.0,
    xmax: 0.0,
    ymax: 0.0,
};

/// Identity attributes attached to a graphic. `kind` classifies why the
/// graphic exists; `item_id` names the domain entity it represents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<GraphicKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graphic {
    pub geometry: Geometry,
    pub symbol: Symbol,
    #[serde(default)]
    pub attributes: Attributes,
}

impl Graphic {
    pub fn new(geometry: Geometry, symbol: Symbol) -> Self {
        Self {
            geometry,
            symbol,
            attributes: Attributes::default(),
        }
    }

    pub fn with_kind(mut self, kind: GraphicKind) -> Self {
        self.attributes.kind = Some(kind);
        self
    }

    pub fn with_item(mut self, item_id: impl Into<String>) -> Self {
        self.attributes.item_id = Some(item_id.into());
        self
    }

    pub fn is_kind(&self, kind: GraphicKind) -> bool {
        self.attributes.kind == Some(kind)
    }

    pub fn is_item(&self, item_id: &str) -> bool {
        self.attributes.item_id.as_deref() == Some(item_id)
    }
}

/// Reconstructs a graphic from its serialized payload. The payload is either
/// the bare graphic object or an envelope `{graphic, coordinates?, zoom?}`.
/// Malformed input propagates the parse error.
pub fn deserialize_graphic(raw: &str) -> AppResult<Graphic> {
    let parsed: Value = serde_json::from_str(raw)?;
    let payload = match parsed.get("graphic") {
        Some(inner) => inner.clone(),
        None => parsed,
    };
    Ok(serde_json::from_value(payload)?)
}

/// Keeps only items whose serialized-map field parses to an object with at
/// least one key, distinguishing real map data from an empty placeholder.
pub fn filter_non_empty<T>(
    items: Vec<T>,
    map_field: impl Fn(&T) -> &str,
) -> AppResult<Vec<T>> {
    let mut kept = Vec::with_capacity(items.len());
    for item in items {
        let parsed: Value = serde_json::from_str(map_field(&item))?;
        let has_keys = parsed
            .as_object()
            .map(|object| !object.is_empty())
            .unwrap_or(false);
        if has_keys {
            kept.push(item);
        }
    }
    Ok(kept)
}
