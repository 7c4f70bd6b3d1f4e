use stratus_core::config::StratusConfig;

/// Configuration for a single benchmark scene.
#[derive(Debug, Clone)]
pub struct SceneConfig {
    pub name: &'static str,
    pub config: StratusConfig,
    /// Clock hour the scene starts at.
    pub start_hours: f64,
    /// Simulated seconds per scene second. High values force frequent
    /// lighting changes and therefore re-shade traffic.
    pub time_scale: f64,
    /// Respawn every fragment each `n` frames.
    pub respawn_every: Option<u32>,
}

/// The standard suite, derived from `base` so a user config carries through.
pub fn standard_scenes(base: &StratusConfig) -> Vec<SceneConfig> {
    let mut sparse = base.clone();
    sparse.clouds.cloud_count = 3;
    sparse.clouds.layer_count = 2;

    let mut dense = base.clone();
    dense.clouds.cloud_count = base.clouds.cloud_count.max(1) * 3;
    dense.clouds.layer_count = base.clouds.layer_count.max(6);
    dense.worker.batch_size = base.worker.batch_size.max(8);
    dense.worker.max_in_flight = base.worker.max_in_flight.max(16);

    vec![
        SceneConfig {
            name: "sparse",
            config: sparse,
            start_hours: 12.0,
            time_scale: 1.0,
            respawn_every: None,
        },
        SceneConfig {
            name: "default",
            config: base.clone(),
            start_hours: 17.5,
            time_scale: 120.0,
            respawn_every: None,
        },
        SceneConfig {
            name: "dense",
            config: dense,
            start_hours: 6.0,
            time_scale: 600.0,
            respawn_every: None,
        },
        SceneConfig {
            name: "full-respawn",
            config: base.clone(),
            start_hours: 9.0,
            time_scale: 1.0,
            respawn_every: Some(30),
        },
    ]
}

/// Look up scenes by name; `None` keeps the whole suite.
pub fn select_scenes(scenes: Vec<SceneConfig>, filter: Option<&str>) -> Vec<SceneConfig> {
    match filter {
        Some(name) => scenes.into_iter().filter(|s| s.name == name).collect(),
        None => scenes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_scenes_are_valid() {
        let scenes = standard_scenes(&StratusConfig::default());
        assert_eq!(scenes.len(), 4);
        for scene in &scenes {
            assert!(scene.config.validate().is_ok(), "scene {}", scene.name);
        }
    }

    #[test]
    fn test_dense_outweighs_sparse() {
        let scenes = standard_scenes(&StratusConfig::default());
        let sparse = &scenes[0].config.clouds;
        let dense = &scenes[2].config.clouds;
        assert!(dense.cloud_count > sparse.cloud_count);
        assert!(dense.layer_count > sparse.layer_count);
    }

    #[test]
    fn test_select_by_name() {
        let all = standard_scenes(&StratusConfig::default());
        let picked = select_scenes(all.clone(), Some("dense"));
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].name, "dense");
        assert!(select_scenes(all.clone(), Some("missing")).is_empty());
        assert_eq!(select_scenes(all, None).len(), 4);
    }
}
