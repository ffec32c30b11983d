//! Appearance Settings
//!
//! User preferences that travel with a backup file. Persisting and
//! broadcasting them is the settings store's job; this is only the shape.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::panel::{DialSize, LayoutMode};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppearanceSettings {
    pub attach_title: bool,
    pub custom_color: String,
    /// Base64 data URI of the wallpaper image
    pub custom_image: String,
    pub default_folder: String,
    pub dial_colors: BTreeMap<String, String>,
    pub dial_images: BTreeMap<String, String>,
    pub dial_size: DialSize,
    pub grid_layout: LayoutMode,
    pub max_columns: String,
    pub new_tab: bool,
    pub show_title: bool,
    pub square_dials: bool,
    pub switch_title: bool,
    pub theme_option: String,
    pub transparent_dials: bool,
    pub wallpaper: String,
}

impl Default for AppearanceSettings {
    fn default() -> Self {
        Self {
            attach_title: false,
            custom_color: String::new(),
            custom_image: String::new(),
            default_folder: String::new(),
            dial_colors: BTreeMap::new(),
            dial_images: BTreeMap::new(),
            dial_size: DialSize::Tiny,
            grid_layout: LayoutMode::FullScreen,
            max_columns: "Unlimited".to_string(),
            new_tab: false,
            show_title: true,
            square_dials: false,
            switch_title: false,
            theme_option: "System Theme".to_string(),
            transparent_dials: false,
            wallpaper: "dark-wallpaper".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings_fill_defaults() {
        let s: AppearanceSettings = serde_json::from_str(r#"{"gridLayout":"3-panel","showTitle":false}"#).unwrap();
        assert_eq!(s.grid_layout, LayoutMode::ThreePanel);
        assert!(!s.show_title);
        assert_eq!(s.wallpaper, "dark-wallpaper");
    }
}
