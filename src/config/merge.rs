use super::schema::{Config, ConfigLayer, StorageLayout};

/// Defaults ← user layer ← repo layer, later layers winning per-field.
pub fn merge_layers(user: Option<ConfigLayer>, repo: Option<ConfigLayer>) -> Config {
    let mut config = Config::default();
    for layer in [user, repo].into_iter().flatten() {
        layer.apply_to(&mut config);
    }
    config
}

/// Environment variables override every file layer.
pub fn apply_env_overrides(config: &mut Config) {
    if let Ok(author) = std::env::var("TABD_AUTHOR")
        && !author.trim().is_empty()
    {
        config.author = author;
    }
    if let Ok(layout) = std::env::var("TABD_STORAGE_LAYOUT") {
        match layout.trim() {
            "repository" => config.storage.layout = StorageLayout::Repository,
            "home_directory" => config.storage.layout = StorageLayout::HomeDirectory,
            "vcs_notes" => config.storage.layout = StorageLayout::VcsNotes,
            other => {
                if !other.is_empty() {
                    tracing::warn!(layout = other, "unknown TABD_STORAGE_LAYOUT ignored");
                }
            }
        }
    }
    if let Ok(filter) = std::env::var("TABD_LOG")
        && !filter.trim().is_empty()
    {
        config.logging.filter = Some(filter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::StorageLayerConfig;

    #[test]
    fn repo_layer_overrides_user_layer_per_field() {
        let user = ConfigLayer {
            author: Some("alice".into()),
            storage: Some(StorageLayerConfig {
                layout: Some(StorageLayout::HomeDirectory),
                notes_push: Some(true),
                notes_fetch: None,
            }),
            ..ConfigLayer::default()
        };
        let repo = ConfigLayer {
            storage: Some(StorageLayerConfig {
                layout: Some(StorageLayout::VcsNotes),
                notes_push: None,
                notes_fetch: None,
            }),
            ..ConfigLayer::default()
        };

        let merged = merge_layers(Some(user), Some(repo));
        assert_eq!(merged.author, "alice");
        assert_eq!(merged.storage.layout, StorageLayout::VcsNotes);
        assert!(merged.storage.notes_push, "user-layer field survives");
    }

    #[test]
    fn missing_layers_fall_back_to_defaults() {
        let merged = merge_layers(None, None);
        assert_eq!(merged.storage.layout, StorageLayout::Repository);
        assert!(merged.author.is_empty());
        assert_eq!(merged.clipboard.poll_interval_ms, 500);
    }

    #[test]
    fn layer_parses_from_partial_toml() {
        let layer: ConfigLayer = toml::from_str(
            r#"
            author = "bob"

            [storage]
            layout = "vcs_notes"
            notes_push = true
            "#,
        )
        .unwrap();
        let merged = merge_layers(Some(layer), None);
        assert_eq!(merged.author, "bob");
        assert_eq!(merged.storage.layout, StorageLayout::VcsNotes);
        assert!(merged.storage.notes_push);
        assert!(!merged.storage.notes_fetch);
    }
}
