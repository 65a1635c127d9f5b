//! Localization store.
//!
//! Each supported language is one JSON file named after its language code
//! (`en_US.json`, `zh_CN.json`, ...). A file maps label keys to strings and
//! option-list keys (`voice_map`, `emotion_map`, ...) to ordered
//! display-name to API-code objects.

mod store;

pub use store::{DEFAULT_LANGUAGE, LocaleError, LocaleTable, Localization, OptionMap};

/// Label key for a parameter id (`advanced_sep` -> `param_advanced_settings`).
pub fn label_key(param_id: &str) -> String {
    format!("param_{}", param_id.replace("_sep", "_settings"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    const EN: &str = r#"{
        "language_display_name": "English",
        "generate_button": "Generate",
        "voice_custom_option": "Custom...",
        "voice_map": {"Wise Woman": "Wise_Woman", "Calm Woman": "Calm_Woman"},
        "emotion_map": {"Happy": "happy", "Auto": "auto"}
    }"#;

    const ZH: &str = r#"{
        "language_display_name": "简体中文",
        "generate_button": "生成",
        "voice_map": {"沉稳女性": "Calm_Woman", "睿智女性": "Wise_Woman"}
    }"#;

    fn write_langs(dir: &Path) {
        std::fs::write(dir.join("en_US.json"), EN).unwrap();
        std::fs::write(dir.join("zh_CN.json"), ZH).unwrap();
    }

    #[test]
    fn test_discover_loads_default_language() {
        let temp_dir = TempDir::new().unwrap();
        write_langs(temp_dir.path());

        let lang = Localization::discover(temp_dir.path(), DEFAULT_LANGUAGE);

        assert_eq!(lang.current_code(), "en_US");
        assert_eq!(lang.display_name(), "English");
        assert_eq!(lang.get("generate_button"), "Generate");
    }

    #[test]
    fn test_available_languages_uses_display_names() {
        let temp_dir = TempDir::new().unwrap();
        write_langs(temp_dir.path());

        let lang = Localization::discover(temp_dir.path(), DEFAULT_LANGUAGE);

        assert_eq!(lang.available_languages(), vec!["English", "简体中文"]);
    }

    #[test]
    fn test_set_language_swaps_whole_table() {
        let temp_dir = TempDir::new().unwrap();
        write_langs(temp_dir.path());
        let mut lang = Localization::discover(temp_dir.path(), DEFAULT_LANGUAGE);
        let before = lang.table();

        lang.set_language("简体中文").unwrap();

        assert_eq!(lang.current_code(), "zh_CN");
        assert_eq!(lang.get("generate_button"), "生成");
        assert_eq!(lang.get("voice_custom_option"), "");
        // Snapshots taken earlier keep the old language.
        assert_eq!(before.get("generate_button"), "Generate");
    }

    #[test]
    fn test_missing_key_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        write_langs(temp_dir.path());
        let lang = Localization::discover(temp_dir.path(), DEFAULT_LANGUAGE);

        assert_eq!(lang.get("no_such_key"), "");
        assert!(lang.table().options("no_such_map").is_empty());
    }

    #[test]
    fn test_missing_file_yields_empty_table() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("en_US.json"), EN).unwrap();
        let mut lang = Localization::discover(temp_dir.path(), DEFAULT_LANGUAGE);
        std::fs::remove_file(temp_dir.path().join("en_US.json")).unwrap();

        let result = lang.set_language("English");

        assert!(matches!(result, Err(LocaleError::NotFound(_))));
        assert_eq!(lang.get("generate_button"), "");
    }

    #[test]
    fn test_missing_directory_does_not_crash() {
        let lang = Localization::discover("/nonexistent/langs", DEFAULT_LANGUAGE);

        assert_eq!(lang.available_languages(), vec!["English"]);
        assert_eq!(lang.get("generate_button"), "");
    }

    #[test]
    fn test_invalid_file_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        write_langs(temp_dir.path());
        std::fs::write(temp_dir.path().join("broken.json"), "{ not json").unwrap();

        let lang = Localization::discover(temp_dir.path(), DEFAULT_LANGUAGE);

        assert_eq!(lang.available_languages().len(), 2);
    }

    #[test]
    fn test_option_map_keeps_file_order() {
        let table = LocaleTable::from_json(EN).unwrap();
        let emotions = table.options("emotion_map");

        assert_eq!(emotions.displays(), vec!["Happy", "Auto"]);
        assert_eq!(emotions.first(), Some(("Happy", "happy")));
        assert_eq!(emotions.code_for("Auto"), Some("auto"));
        assert_eq!(emotions.display_for("happy"), Some("Happy"));
        assert_eq!(emotions.code_for("auto"), None);
    }

    #[test]
    fn test_find_language_by_code_or_name() {
        let temp_dir = TempDir::new().unwrap();
        write_langs(temp_dir.path());
        let lang = Localization::discover(temp_dir.path(), DEFAULT_LANGUAGE);

        assert_eq!(lang.find_language("zh_cn"), Some("简体中文"));
        assert_eq!(lang.find_language("english"), Some("English"));
        assert_eq!(lang.find_language("klingon"), None);
    }

    #[test]
    fn test_custom_sentinel() {
        let en = LocaleTable::from_json(EN).unwrap();
        let zh = LocaleTable::from_json(ZH).unwrap();

        assert_eq!(en.custom_sentinel(), Some("Custom..."));
        assert_eq!(zh.custom_sentinel(), None);
    }

    #[test]
    fn test_label_key() {
        assert_eq!(label_key("speed"), "param_speed");
        assert_eq!(label_key("advanced_sep"), "param_advanced_settings");
    }
}
