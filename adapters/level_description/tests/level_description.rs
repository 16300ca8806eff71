use cave_forge_core::GenerationConfig;
use cave_forge_level_description::{
    write_json, DescriptionError, DescriptionStyle, LevelDescription,
};
use cave_forge_system_pipeline::{generate_until_success, GeneratedLevel};

fn level() -> GeneratedLevel {
    let mut config = GenerationConfig::with_seed("describe");
    config.cave.width = 48;
    config.cave.height = 24;
    config.cave.min_region_size = 12;
    config.coins.coin_count = 10;
    config.goal.require_unreachable = false;
    config.goal.min_distance = 5.0;
    config.physics.jump_velocity = 600.0;
    generate_until_success(&config, 64).expect("level")
}

#[test]
fn coordinates_are_scaled_to_pixels() {
    let level = level();
    let description =
        LevelDescription::from_level(&level, &DescriptionStyle::default()).expect("description");

    assert_eq!(description.player_spawn.x, u64::from(level.spawn().x()) * 32);
    assert_eq!(description.player_spawn.y, u64::from(level.spawn().y()) * 32);
    assert_eq!(description.goal.x, u64::from(level.goal().x()) * 32);
    assert_eq!(description.goal.tile_key, "goal_flag");
    assert_eq!(description.coins.len(), level.coins().len());
    assert_eq!(description.platforms.len(), level.platforms().len());
    assert!(description.enemies.is_empty());
    for layer in &description.backgrounds {
        assert!(layer.depth < 0);
        assert!((0.0..=1.0).contains(&layer.scroll_speed));
        assert_eq!(layer.width, 48 * 32);
        assert_eq!(layer.height, 24 * 32);
    }

    let matrix = description.map_matrix.expect("map matrix");
    assert_eq!(matrix.len(), 24);
    assert!(matrix.iter().all(|row| row.len() == 48));
}

#[test]
fn explicit_tile_size_overrides_physics() {
    let level = level();
    let style = DescriptionStyle {
        tile_size: Some(16),
        include_map_matrix: false,
        ..DescriptionStyle::default()
    };
    let description = LevelDescription::from_level(&level, &style).expect("description");

    assert_eq!(description.goal.y, u64::from(level.goal().y()) * 16);
    assert!(description.map_matrix.is_none());

    let zero = DescriptionStyle {
        tile_size: Some(0),
        ..DescriptionStyle::default()
    };
    assert_eq!(
        LevelDescription::from_level(&level, &zero),
        Err(DescriptionError::ZeroTileSize)
    );
}

#[test]
fn json_uses_renderer_field_names() {
    let level = level();
    let description =
        LevelDescription::from_level(&level, &DescriptionStyle::default()).expect("description");
    let mut buffer = Vec::new();
    write_json(&description, &mut buffer).expect("write");

    let value: serde_json::Value = serde_json::from_slice(&buffer).expect("json");
    assert!(value["playerSpawn"]["x"].is_u64());
    assert_eq!(value["goal"]["tileKey"], "goal_flag");
    assert_eq!(value["goal"]["isFullBlock"], false);
    assert_eq!(value["backgrounds"][0]["type"], "layer");
    assert!(value["backgrounds"][0]["scrollSpeed"].is_f64());
    assert!(value["map_matrix"].is_array());
    if let Some(coin) = value["coins"].get(0) {
        assert_eq!(coin["type"], "coin");
        assert_eq!(coin["properties"]["value"], 1);
    }

    let restored: LevelDescription = serde_json::from_slice(&buffer).expect("restore");
    assert_eq!(restored, description);
}
