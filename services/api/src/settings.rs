use crate::cli::SettingsArgs;
use hr_review::config::{AiApiConfig, AiProvider, AiSettingsStore, ConfigError};
use hr_review::error::AppError;
use std::path::PathBuf;

const DEFAULT_SETTINGS_PATH: &str = ".hr-review/ai_settings.json";

pub(crate) fn run_settings(args: SettingsArgs) -> Result<(), AppError> {
    let path = args
        .path
        .clone()
        .or_else(|| std::env::var_os("APP_AI_SETTINGS_PATH").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_PATH));
    let store = AiSettingsStore::new(path);

    let updated = apply(store.load(), &args)?;
    store.save(&updated)?;

    println!("AI settings saved to {}", store.path().display());
    println!("- provider: {}", updated.provider.as_str());
    println!("- model: {}", updated.model);
    println!(
        "- api key: {}",
        if updated.has_api_key() { "set" } else { "not set" }
    );
    Ok(())
}

fn apply(mut config: AiApiConfig, args: &SettingsArgs) -> Result<AiApiConfig, ConfigError> {
    if let Some(provider) = args.provider.as_deref() {
        config.provider = AiProvider::parse(provider)
            .ok_or_else(|| ConfigError::InvalidProvider(provider.to_string()))?;
    }
    if let Some(model) = args.model.as_deref().map(str::trim).filter(|model| !model.is_empty()) {
        config.model = model.to_string();
    }
    if args.clear_key {
        config.api_key = None;
    } else if let Some(key) = args.api_key.as_deref().map(str::trim).filter(|key| !key.is_empty()) {
        config.api_key = Some(key.to_string());
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hr_review::config::DEFAULT_MODEL;

    fn args() -> SettingsArgs {
        SettingsArgs {
            path: None,
            api_key: None,
            provider: None,
            model: None,
            clear_key: false,
        }
    }

    #[test]
    fn only_given_fields_change() {
        let updated = apply(
            AiApiConfig::default(),
            &SettingsArgs {
                api_key: Some("  secret ".to_string()),
                ..args()
            },
        )
        .expect("valid settings");

        assert_eq!(updated.api_key(), Some("secret"));
        assert_eq!(updated.model, DEFAULT_MODEL);
        assert_eq!(updated.provider, AiProvider::Gemini);
    }

    #[test]
    fn clearing_the_key_keeps_model_choice() {
        let existing = AiApiConfig {
            api_key: Some("old".to_string()),
            provider: AiProvider::Gemini,
            model: "custom-model".to_string(),
        };
        let updated = apply(
            existing,
            &SettingsArgs {
                clear_key: true,
                ..args()
            },
        )
        .expect("valid settings");

        assert!(!updated.has_api_key());
        assert_eq!(updated.model, "custom-model");
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let err = apply(
            AiApiConfig::default(),
            &SettingsArgs {
                provider: Some("openai".to_string()),
                ..args()
            },
        )
        .expect_err("unsupported provider");
        assert!(matches!(err, ConfigError::InvalidProvider(name) if name == "openai"));
    }
}
