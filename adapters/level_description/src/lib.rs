#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Converts a generated level into the JSON level description consumed by
//! the renderer.
//!
//! Coordinates are pixels measured from the top-left corner of the map.
//! The adapter only describes what to draw; it never assumes how the
//! renderer animates any of it.

mod tiles;

use std::io::Write;

use anyhow::Context;
use cave_forge_core::Position;
use cave_forge_system_pipeline::GeneratedLevel;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use tiles::MapCell;

/// Presentation choices applied while describing a level.
#[derive(Clone, Debug, PartialEq)]
pub struct DescriptionStyle {
    /// Pixel edge of a tile. `None` uses the physics tile size of the level.
    pub tile_size: Option<u32>,
    /// Sprite key of the goal marker.
    pub goal_tile_key: String,
    /// Sprite prefix shared by floating platforms.
    pub platform_tile_prefix: String,
    /// Sprite prefix used by the auto-tiled terrain.
    pub terrain_tile_prefix: String,
    /// Parallax layers, drawn back to front.
    pub backgrounds: Vec<BackgroundStyle>,
    /// Whether to emit the decorative `map_matrix`.
    pub include_map_matrix: bool,
}

impl Default for DescriptionStyle {
    fn default() -> Self {
        Self {
            tile_size: None,
            goal_tile_key: "goal_flag".to_owned(),
            platform_tile_prefix: "platform".to_owned(),
            terrain_tile_prefix: "cave".to_owned(),
            backgrounds: vec![
                BackgroundStyle::new("cave_bg_far", -3, 0.1),
                BackgroundStyle::new("cave_bg_mid", -2, 0.3),
                BackgroundStyle::new("cave_bg_near", -1, 0.6),
            ],
            include_map_matrix: true,
        }
    }
}

/// One parallax layer before it is sized to the level.
#[derive(Clone, Debug, PartialEq)]
pub struct BackgroundStyle {
    /// Sprite drawn on the layer.
    pub sprite_key: String,
    /// Draw order; must be negative so the layer sits behind the terrain.
    pub depth: i32,
    /// Camera follow factor in `[0, 1]`.
    pub scroll_speed: f64,
}

impl BackgroundStyle {
    /// Creates a layer description.
    #[must_use]
    pub fn new(sprite_key: impl Into<String>, depth: i32, scroll_speed: f64) -> Self {
        Self {
            sprite_key: sprite_key.into(),
            depth,
            scroll_speed,
        }
    }
}

/// Rejected presentation choices.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum DescriptionError {
    /// The tile size resolved to zero pixels.
    #[error("tile size must be at least one pixel")]
    ZeroTileSize,
    /// A sprite key or prefix was empty.
    #[error("`{0}` must not be empty")]
    EmptyKey(&'static str),
    /// A background layer would be drawn in front of the terrain.
    #[error("background layer {index} has depth {depth}; layers must use negative depth")]
    BackgroundDepth {
        /// Position of the layer in the style.
        index: usize,
        /// Rejected depth.
        depth: i32,
    },
    /// A background layer scrolls outside `[0, 1]`.
    #[error("background layer {index} has scroll speed {speed}; expected a value in [0, 1]")]
    BackgroundScroll {
        /// Position of the layer in the style.
        index: usize,
        /// Rejected scroll speed.
        speed: f64,
    },
}

/// Pixel position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal pixel offset.
    pub x: u64,
    /// Vertical pixel offset, growing downward.
    pub y: u64,
}

/// Level exit marker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalDescription {
    /// Horizontal pixel offset.
    pub x: u64,
    /// Vertical pixel offset.
    pub y: u64,
    /// Sprite key of the marker.
    pub tile_key: String,
    /// Whether the marker blocks movement like terrain.
    pub is_full_block: bool,
}

/// Static floating platform.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformDescription {
    /// Entity type, always `"platform"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Horizontal pixel offset of the left edge.
    pub x: u64,
    /// Vertical pixel offset of the top edge.
    pub y: u64,
    /// Width in pixels.
    pub width: u64,
    /// Sprite prefix for the platform segments.
    pub tile_prefix: String,
    /// Whether the platform blocks from every side.
    pub is_full_block: bool,
}

/// Value carried by a coin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinProperties {
    /// Score awarded on pickup.
    pub value: u32,
}

/// Collectible coin.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinDescription {
    /// Entity type, always `"coin"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Horizontal pixel offset.
    pub x: u64,
    /// Vertical pixel offset.
    pub y: u64,
    /// Pickup properties.
    pub properties: CoinProperties,
}

/// Enemy entity. Generated levels currently place none.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyDescription {
    /// Enemy type.
    #[serde(rename = "type")]
    pub kind: String,
    /// Horizontal pixel offset.
    pub x: u64,
    /// Vertical pixel offset.
    pub y: u64,
}

/// Parallax background layer sized to the level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundLayer {
    /// Entity type, always `"layer"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Horizontal pixel offset.
    pub x: u64,
    /// Vertical pixel offset.
    pub y: u64,
    /// Width in pixels.
    pub width: u64,
    /// Height in pixels.
    pub height: u64,
    /// Sprite drawn on the layer.
    pub sprite_key: String,
    /// Negative draw order.
    pub depth: i32,
    /// Camera follow factor in `[0, 1]`.
    pub scroll_speed: f64,
}

/// Complete renderer contract for one level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelDescription {
    /// Player start.
    pub player_spawn: Point,
    /// Level exit.
    pub goal: GoalDescription,
    /// Floating platforms.
    pub platforms: Vec<PlatformDescription>,
    /// Collectibles.
    pub coins: Vec<CoinDescription>,
    /// Enemies.
    pub enemies: Vec<EnemyDescription>,
    /// Parallax layers.
    pub backgrounds: Vec<BackgroundLayer>,
    /// Auto-tiled terrain, row-major.
    #[serde(
        rename = "map_matrix",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub map_matrix: Option<Vec<Vec<MapCell>>>,
}

impl LevelDescription {
    /// Describes `level` using `style`.
    pub fn from_level(
        level: &GeneratedLevel,
        style: &DescriptionStyle,
    ) -> Result<Self, DescriptionError> {
        let tile = resolve_tile_size(level, style)?;
        check_style(style)?;

        let to_pixels = |position: Position| Point {
            x: u64::from(position.x()) * tile,
            y: u64::from(position.y()) * tile,
        };
        let grid = level.grid();
        let goal = to_pixels(level.goal());

        let platforms = level
            .platforms()
            .iter()
            .map(|platform| {
                let origin = to_pixels(platform.origin());
                PlatformDescription {
                    kind: "platform".to_owned(),
                    x: origin.x,
                    y: origin.y,
                    width: u64::from(platform.width()) * tile,
                    tile_prefix: style.platform_tile_prefix.clone(),
                    is_full_block: false,
                }
            })
            .collect();

        let coins = level
            .coins()
            .iter()
            .map(|coin| {
                let point = to_pixels(coin.position());
                CoinDescription {
                    kind: "coin".to_owned(),
                    x: point.x,
                    y: point.y,
                    properties: CoinProperties {
                        value: coin.value(),
                    },
                }
            })
            .collect();

        let width = u64::from(grid.width()) * tile;
        let height = u64::from(grid.height()) * tile;
        let backgrounds = style
            .backgrounds
            .iter()
            .map(|layer| BackgroundLayer {
                kind: "layer".to_owned(),
                x: 0,
                y: 0,
                width,
                height,
                sprite_key: layer.sprite_key.clone(),
                depth: layer.depth,
                scroll_speed: layer.scroll_speed,
            })
            .collect();

        Ok(Self {
            player_spawn: to_pixels(level.spawn()),
            goal: GoalDescription {
                x: goal.x,
                y: goal.y,
                tile_key: style.goal_tile_key.clone(),
                is_full_block: false,
            },
            platforms,
            coins,
            enemies: Vec::new(),
            backgrounds,
            map_matrix: style
                .include_map_matrix
                .then(|| tiles::auto_tile(grid, &style.terrain_tile_prefix)),
        })
    }
}

/// Writes `description` as pretty-printed JSON.
pub fn write_json(description: &LevelDescription, mut writer: impl Write) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut writer, description)
        .context("failed to serialise level description")?;
    writer
        .flush()
        .context("failed to flush level description")?;
    Ok(())
}

fn resolve_tile_size(level: &GeneratedLevel, style: &DescriptionStyle) -> Result<u64, DescriptionError> {
    let tile = match style.tile_size {
        Some(size) => u64::from(size),
        None => {
            let size = level.config().physics.tile_size.round();
            if size.is_finite() && size >= 1.0 {
                size as u64
            } else {
                0
            }
        }
    };
    if tile == 0 {
        return Err(DescriptionError::ZeroTileSize);
    }
    Ok(tile)
}

fn check_style(style: &DescriptionStyle) -> Result<(), DescriptionError> {
    let keys = [
        ("goal_tile_key", &style.goal_tile_key),
        ("platform_tile_prefix", &style.platform_tile_prefix),
        ("terrain_tile_prefix", &style.terrain_tile_prefix),
    ];
    if let Some((name, _)) = keys.iter().find(|(_, key)| key.trim().is_empty()) {
        return Err(DescriptionError::EmptyKey(*name));
    }
    for (index, layer) in style.backgrounds.iter().enumerate() {
        if layer.sprite_key.trim().is_empty() {
            return Err(DescriptionError::EmptyKey("background.sprite_key"));
        }
        if layer.depth >= 0 {
            return Err(DescriptionError::BackgroundDepth {
                index,
                depth: layer.depth,
            });
        }
        if !(0.0..=1.0).contains(&layer.scroll_speed) {
            return Err(DescriptionError::BackgroundScroll {
                index,
                speed: layer.scroll_speed,
            });
        }
    }
    Ok(())
}
