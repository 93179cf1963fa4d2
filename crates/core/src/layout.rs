//! Placement of diagram shapes on a bounded canvas.
//!
//! Every item is placed either manually (a fixed point plus an [`Anchor`])
//! or sequentially by a top-down, left-to-right shelf packer: items fill a
//! line from `start_x` until the next one would cross
//! `start_x + max_line_width`, then the cursor wraps to a new line below.
//! There is no backtracking and no best-fit search.
//!
//! All coordinates are millimetres with the y axis pointing up, so a new
//! line sits at a smaller y than the previous one.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::model::PrioritizedItem;

// ---------------------------------------------------------------------------
// Anchors and placement types
// ---------------------------------------------------------------------------

/// Which point of a shape's bounding box is pinned to the placement point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    #[default]
    Center,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl Anchor {
    /// Offset from the pinned point to the centre of a box of `size`.
    pub fn center_offset(self, size: ShapeSize) -> (f64, f64) {
        let half_w = size.width / 2.0;
        let half_h = size.height / 2.0;
        let dx = match self {
            Self::TopLeft | Self::CenterLeft | Self::BottomLeft => half_w,
            Self::TopCenter | Self::Center | Self::BottomCenter => 0.0,
            Self::TopRight | Self::CenterRight | Self::BottomRight => -half_w,
        };
        let dy = match self {
            Self::TopLeft | Self::TopCenter | Self::TopRight => -half_h,
            Self::CenterLeft | Self::Center | Self::CenterRight => 0.0,
            Self::BottomLeft | Self::BottomCenter | Self::BottomRight => half_h,
        };
        (dx, dy)
    }
}

/// How an item's position is determined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementType {
    #[default]
    Sequential,
    Manual,
}

// ---------------------------------------------------------------------------
// Shape geometry
// ---------------------------------------------------------------------------

/// Width and height of a shape in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeSize {
    pub width: f64,
    pub height: f64,
}

impl ShapeSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned bounding box (y up: `top > bottom`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.right - self.left
    }
}

/// Shape dimensions, supplied by the diagram collaborator's template library.
pub trait ShapeCatalog {
    /// Size of the shape named `name`, or `None` if the library lacks it.
    fn shape_size(&self, name: &str) -> Option<ShapeSize>;
}

impl ShapeCatalog for HashMap<String, ShapeSize> {
    fn shape_size(&self, name: &str) -> Option<ShapeSize> {
        self.get(name).copied()
    }
}

impl ShapeCatalog for BTreeMap<String, ShapeSize> {
    fn shape_size(&self, name: &str) -> Option<ShapeSize> {
        self.get(name).copied()
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Sequential packing parameters, all in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub start_x: f64,
    pub start_y: f64,
    pub max_line_width: f64,
    pub horizontal_gap: f64,
    pub vertical_gap: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            start_x: 20.0,
            start_y: 270.0,
            max_line_width: 250.0,
            horizontal_gap: 5.0,
            vertical_gap: 10.0,
        }
    }
}

impl LayoutConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        let all_finite = [
            self.start_x,
            self.start_y,
            self.max_line_width,
            self.horizontal_gap,
            self.vertical_gap,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !all_finite {
            return Err(CoreError::Validation(
                "layout values must be finite numbers".to_string(),
            ));
        }
        if self.max_line_width <= 0.0 {
            return Err(CoreError::Validation(format!(
                "max_line_width must be positive, got {}",
                self.max_line_width
            )));
        }
        if self.horizontal_gap < 0.0 || self.vertical_gap < 0.0 {
            return Err(CoreError::Validation(
                "layout gaps must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Block-label shapes spawned on top of every placed item of a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    pub shape_name: String,
    /// Items whose name contains one of these (case-insensitive) get two
    /// labels, one per half of their top edge.
    pub split_keywords: Vec<String>,
    /// Field that carries the label counter.
    pub field_name: String,
    pub first_label: u32,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            shape_name: "block_label".to_string(),
            split_keywords: vec!["double".to_string(), "twin".to_string()],
            field_name: "label".to_string(),
            first_label: 1,
        }
    }
}

impl LabelConfig {
    pub fn is_split(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.split_keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .any(|k| !k.is_empty() && name.contains(&k))
    }
}

/// Layout settings of one diagram page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageLayout {
    pub page: String,
    /// Sheets whose items go on this page; empty takes every sheet.
    pub source_sheets: Vec<String>,
    pub layout: LayoutConfig,
    /// Predefined items placed before the extracted ones.
    pub fixed_items: Vec<LayoutItem>,
    pub labels: Option<LabelConfig>,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            page: "Page-1".to_string(),
            source_sheets: Vec::new(),
            layout: LayoutConfig::default(),
            fixed_items: Vec::new(),
            labels: None,
        }
    }
}

impl PageLayout {
    pub fn accepts(&self, sheet: &str) -> bool {
        self.source_sheets.is_empty() || self.source_sheets.iter().any(|s| s == sheet)
    }
}

// ---------------------------------------------------------------------------
// Items and commands
// ---------------------------------------------------------------------------

/// Something to be placed on a page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutItem {
    pub shape_name: String,
    /// Display name, checked against the label split keywords.
    pub name: String,
    pub placement: PlacementType,
    pub anchor: Anchor,
    /// Fixed point for manual placement. A manual item without one is
    /// placed sequentially.
    pub position: Option<(f64, f64)>,
    pub fields: BTreeMap<String, String>,
}

impl LayoutItem {
    pub fn sequential(shape_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            shape_name: shape_name.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn manual(shape_name: impl Into<String>, x: f64, y: f64, anchor: Anchor) -> Self {
        Self {
            shape_name: shape_name.into(),
            placement: PlacementType::Manual,
            anchor,
            position: Some((x, y)),
            ..Self::default()
        }
    }

    /// Layout item for an extracted line item, or `None` when its rule
    /// names no target shape.
    pub fn from_prioritized(item: &PrioritizedItem) -> Option<Self> {
        let shape = &item.item.shape;
        if !shape.has_shape() {
            return None;
        }
        let mut fields = BTreeMap::new();
        fields.insert("name".to_string(), item.item.name.clone());
        fields.insert("quantity".to_string(), item.item.quantity.to_string());
        fields.insert("priority".to_string(), item.priority.to_string());
        Some(Self {
            shape_name: shape.target_shape_name.clone(),
            name: item.item.name.clone(),
            placement: shape.placement,
            anchor: shape.anchor,
            position: shape.coordinates_xy,
            fields,
        })
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// Instruction for the diagram collaborator: drop `shape_name` so that its
/// `anchor` point lands on `(x, y)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementCommand {
    pub shape_name: String,
    pub x: f64,
    pub y: f64,
    pub anchor: Anchor,
    pub mode: PlacementType,
    pub fields: BTreeMap<String, String>,
}

impl PlacementCommand {
    /// Bounding box of the placed shape, given its size.
    pub fn bounds(&self, size: ShapeSize) -> Bounds {
        let (dx, dy) = self.anchor.center_offset(size);
        let (cx, cy) = (self.x + dx, self.y + dy);
        Bounds {
            left: cx - size.width / 2.0,
            right: cx + size.width / 2.0,
            top: cy + size.height / 2.0,
            bottom: cy - size.height / 2.0,
        }
    }
}

/// Placement commands of one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutResult {
    pub page: String,
    pub commands: Vec<PlacementCommand>,
    /// Shape names the catalog did not know; their items were not placed.
    pub skipped: Vec<String>,
}

// ---------------------------------------------------------------------------
// Shelf packer
// ---------------------------------------------------------------------------

/// Cursor state of the sequential packer.
#[derive(Debug, Clone)]
pub struct ShelfPacker {
    config: LayoutConfig,
    cursor_x: f64,
    cursor_y: f64,
    row_height: f64,
    row_has_items: bool,
}

impl ShelfPacker {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            cursor_x: config.start_x,
            cursor_y: config.start_y,
            row_height: 0.0,
            row_has_items: false,
        }
    }

    /// Reserve room for a shape of `size` and return its centre.
    ///
    /// A line never wraps while still empty, so a shape wider than the line
    /// sits alone on its own line.
    pub fn place(&mut self, size: ShapeSize) -> (f64, f64) {
        let limit = self.config.start_x + self.config.max_line_width;
        if self.row_has_items && self.cursor_x + size.width > limit {
            self.cursor_x = self.config.start_x;
            self.cursor_y -= self.row_height.max(size.height) + self.config.vertical_gap;
            self.row_height = 0.0;
            self.row_has_items = false;
        }

        let center = (
            self.cursor_x + size.width / 2.0,
            self.cursor_y - size.height / 2.0,
        );
        self.cursor_x += size.width + self.config.horizontal_gap;
        self.row_height = self.row_height.max(size.height);
        self.row_has_items = true;
        center
    }
}

/// Lay out `items` (after the page's fixed items) on one page.
pub fn layout_page(
    page: &PageLayout,
    items: &[LayoutItem],
    catalog: &dyn ShapeCatalog,
) -> LayoutResult {
    let mut packer = ShelfPacker::new(page.layout);
    let mut result = LayoutResult {
        page: page.page.clone(),
        ..LayoutResult::default()
    };
    let mut next_label = page.labels.as_ref().map(|l| l.first_label).unwrap_or(1);

    for item in page.fixed_items.iter().chain(items) {
        let Some(size) = catalog.shape_size(&item.shape_name) else {
            result.skipped.push(item.shape_name.clone());
            continue;
        };

        let command = match (item.placement, item.position) {
            (PlacementType::Manual, Some((x, y))) => PlacementCommand {
                shape_name: item.shape_name.clone(),
                x,
                y,
                anchor: item.anchor,
                mode: PlacementType::Manual,
                fields: item.fields.clone(),
            },
            _ => {
                let (x, y) = packer.place(size);
                PlacementCommand {
                    shape_name: item.shape_name.clone(),
                    x,
                    y,
                    anchor: Anchor::Center,
                    mode: PlacementType::Sequential,
                    fields: item.fields.clone(),
                }
            }
        };

        let labels = match &page.labels {
            Some(config) => {
                label_commands(config, item, &command, size, catalog, &mut next_label)
            }
            None => Ok(Vec::new()),
        };
        result.commands.push(command);
        match labels {
            Ok(labels) => result.commands.extend(labels),
            Err(missing) => {
                if !result.skipped.contains(&missing) {
                    result.skipped.push(missing);
                }
            }
        }
    }
    result
}

/// Label shapes flush against the top edge of `main`.
///
/// Returns the label shape name as error when the catalog lacks it.
fn label_commands(
    config: &LabelConfig,
    item: &LayoutItem,
    main: &PlacementCommand,
    size: ShapeSize,
    catalog: &dyn ShapeCatalog,
    next_label: &mut u32,
) -> Result<Vec<PlacementCommand>, String> {
    if catalog.shape_size(&config.shape_name).is_none() {
        return Err(config.shape_name.clone());
    }

    let bounds = main.bounds(size);
    let xs = if config.is_split(&item.name) {
        vec![
            bounds.left + bounds.width() / 4.0,
            bounds.left + bounds.width() * 3.0 / 4.0,
        ]
    } else {
        vec![bounds.left + bounds.width() / 2.0]
    };

    Ok(xs
        .into_iter()
        .map(|x| {
            let label = *next_label;
            *next_label += 1;
            let mut fields = BTreeMap::new();
            fields.insert(config.field_name.clone(), label.to_string());
            PlacementCommand {
                shape_name: config.shape_name.clone(),
                x,
                y: bounds.top,
                anchor: Anchor::BottomCenter,
                mode: main.mode,
                fields,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn catalog() -> HashMap<String, ShapeSize> {
        let mut c = HashMap::new();
        c.insert("box".to_string(), ShapeSize::new(40.0, 20.0));
        c.insert("tall".to_string(), ShapeSize::new(40.0, 50.0));
        c.insert("wide".to_string(), ShapeSize::new(300.0, 10.0));
        c.insert("block_label".to_string(), ShapeSize::new(10.0, 5.0));
        c
    }

    fn page(layout: LayoutConfig) -> PageLayout {
        PageLayout {
            layout,
            ..PageLayout::default()
        }
    }

    fn narrow() -> LayoutConfig {
        LayoutConfig {
            start_x: 0.0,
            start_y: 100.0,
            max_line_width: 100.0,
            horizontal_gap: 5.0,
            vertical_gap: 10.0,
        }
    }

    fn left_edge(c: &PlacementCommand) -> f64 {
        c.bounds(ShapeSize::new(40.0, 20.0)).left
    }

    #[test]
    fn three_items_wrap_after_two() {
        let items: Vec<LayoutItem> = (0..3).map(|_| LayoutItem::sequential("box", "b")).collect();
        let result = layout_page(&page(narrow()), &items, &catalog());
        let cmds = &result.commands;
        assert_eq!(cmds.len(), 3);
        assert_eq!(left_edge(&cmds[0]), 0.0);
        assert_eq!(left_edge(&cmds[1]), 45.0);
        assert_eq!(cmds[0].y, cmds[1].y);
        assert_eq!(left_edge(&cmds[2]), 0.0);
        // New line is one row height plus the vertical gap lower.
        assert_eq!(cmds[0].y - cmds[2].y, 20.0 + 10.0);
    }

    #[test]
    fn item_is_centred_below_cursor() {
        let result = layout_page(&page(narrow()), &[LayoutItem::sequential("box", "b")], &catalog());
        let c = &result.commands[0];
        assert_eq!((c.x, c.y), (20.0, 90.0));
        assert_eq!(c.anchor, Anchor::Center);
        assert_eq!(c.mode, PlacementType::Sequential);
    }

    #[test]
    fn wrap_uses_tallest_item_of_row() {
        let items = vec![
            LayoutItem::sequential("tall", "t"),
            LayoutItem::sequential("box", "b"),
            LayoutItem::sequential("box", "b"),
        ];
        let result = layout_page(&page(narrow()), &items, &catalog());
        let third = result.commands[2].bounds(ShapeSize::new(40.0, 20.0));
        assert_eq!(third.top, 100.0 - 50.0 - 10.0);
    }

    #[test]
    fn oversized_item_sits_alone() {
        let items = vec![
            LayoutItem::sequential("wide", "w"),
            LayoutItem::sequential("box", "b"),
        ];
        let result = layout_page(&page(narrow()), &items, &catalog());
        let wide = result.commands[0].bounds(ShapeSize::new(300.0, 10.0));
        assert_eq!(wide.left, 0.0);
        assert_eq!(wide.top, 100.0);
        let next = result.commands[1].bounds(ShapeSize::new(40.0, 20.0));
        assert_eq!(next.left, 0.0);
        assert_eq!(next.top, 100.0 - 20.0 - 10.0);
    }

    #[test]
    fn manual_items_keep_their_point_and_do_not_move_cursor() {
        let items = vec![
            LayoutItem::manual("box", 200.0, 50.0, Anchor::TopLeft),
            LayoutItem::sequential("box", "b"),
        ];
        let result = layout_page(&page(narrow()), &items, &catalog());
        let manual = &result.commands[0];
        assert_eq!((manual.x, manual.y), (200.0, 50.0));
        assert_eq!(manual.mode, PlacementType::Manual);
        let b = manual.bounds(ShapeSize::new(40.0, 20.0));
        assert_eq!((b.left, b.top, b.right, b.bottom), (200.0, 50.0, 240.0, 30.0));
        assert_eq!(left_edge(&result.commands[1]), 0.0);
    }

    #[test]
    fn manual_without_position_falls_back_to_sequential() {
        let mut item = LayoutItem::sequential("box", "b");
        item.placement = PlacementType::Manual;
        let result = layout_page(&page(narrow()), &[item], &catalog());
        assert_eq!(result.commands[0].mode, PlacementType::Sequential);
    }

    #[test]
    fn anchor_offsets() {
        let size = ShapeSize::new(10.0, 4.0);
        assert_eq!(Anchor::Center.center_offset(size), (0.0, 0.0));
        assert_eq!(Anchor::TopLeft.center_offset(size), (5.0, -2.0));
        assert_eq!(Anchor::BottomRight.center_offset(size), (-5.0, 2.0));
        assert_eq!(Anchor::CenterRight.center_offset(size), (-5.0, 0.0));
        assert_eq!(Anchor::TopCenter.center_offset(size), (0.0, -2.0));
    }

    #[test]
    fn unknown_shapes_are_skipped() {
        let items = vec![LayoutItem::sequential("ghost", "g"), LayoutItem::sequential("box", "b")];
        let result = layout_page(&page(narrow()), &items, &catalog());
        assert_eq!(result.skipped, vec!["ghost"]);
        assert_eq!(result.commands.len(), 1);
        assert_eq!(left_edge(&result.commands[0]), 0.0);
    }

    #[test]
    fn fixed_items_come_first() {
        let mut p = page(narrow());
        p.fixed_items = vec![LayoutItem::sequential("box", "fixed").with_field("name", "fixed")];
        let result = layout_page(&p, &[LayoutItem::sequential("box", "b")], &catalog());
        assert_eq!(result.commands[0].fields.get("name").map(String::as_str), Some("fixed"));
        assert_eq!(left_edge(&result.commands[1]), 45.0);
    }

    #[test]
    fn labels_sit_on_top_edge_with_counter() {
        let mut p = page(narrow());
        p.labels = Some(LabelConfig::default());
        let items = vec![
            LayoutItem::sequential("box", "Pump"),
            LayoutItem::sequential("box", "Double pump"),
        ];
        let result = layout_page(&p, &items, &catalog());
        let labels: Vec<&PlacementCommand> = result
            .commands
            .iter()
            .filter(|c| c.shape_name == "block_label")
            .collect();
        assert_eq!(labels.len(), 3);

        // Single label centred on the first box's top edge.
        assert_eq!((labels[0].x, labels[0].y), (20.0, 100.0));
        assert_eq!(labels[0].anchor, Anchor::BottomCenter);
        assert_eq!(labels[0].fields["label"], "1");

        // Split label: one per half of the second box (left edge 45).
        assert_eq!(labels[1].x, 55.0);
        assert_eq!(labels[2].x, 75.0);
        assert_eq!(labels[2].fields["label"], "3");
    }

    #[test]
    fn missing_label_shape_is_reported_once() {
        let mut p = page(narrow());
        p.labels = Some(LabelConfig {
            shape_name: "nope".into(),
            ..LabelConfig::default()
        });
        let items = vec![LayoutItem::sequential("box", "a"), LayoutItem::sequential("box", "b")];
        let result = layout_page(&p, &items, &catalog());
        assert_eq!(result.commands.len(), 2);
        assert_eq!(result.skipped, vec!["nope"]);
    }

    #[test]
    fn prioritized_items_map_to_layout_items() {
        use crate::model::{LineItem, ShapeRef};

        let mut prioritized = PrioritizedItem {
            item: LineItem {
                sheet: "S".into(),
                name: "Pump".into(),
                quantity: 2,
                first_row: 4,
                context: String::new(),
                shape: ShapeRef {
                    target_shape_name: "pump_symbol".into(),
                    anchor: Anchor::TopLeft,
                    placement: PlacementType::Manual,
                    coordinates_xy: Some((10.0, 20.0)),
                },
            },
            priority: 7,
        };
        let item = LayoutItem::from_prioritized(&prioritized).unwrap();
        assert_eq!(item.shape_name, "pump_symbol");
        assert_eq!(item.position, Some((10.0, 20.0)));
        assert_eq!(item.fields["quantity"], "2");
        assert_eq!(item.fields["priority"], "7");

        prioritized.item.shape.target_shape_name.clear();
        assert!(LayoutItem::from_prioritized(&prioritized).is_none());
    }

    #[test]
    fn page_accepts_source_sheets() {
        let mut p = PageLayout::default();
        assert!(p.accepts("Any"));
        p.source_sheets = vec!["Heating".into()];
        assert!(p.accepts("Heating"));
        assert!(!p.accepts("Cooling"));
    }

    #[test]
    fn config_validation() {
        assert!(LayoutConfig::default().validate().is_ok());
        let bad = LayoutConfig {
            max_line_width: 0.0,
            ..LayoutConfig::default()
        };
        assert_matches!(bad.validate(), Err(CoreError::Validation(_)));
        let bad = LayoutConfig {
            vertical_gap: -1.0,
            ..LayoutConfig::default()
        };
        assert!(bad.validate().is_err());
        let bad = LayoutConfig {
            start_x: f64::NAN,
            ..LayoutConfig::default()
        };
        assert!(bad.validate().is_err());
    }
}
