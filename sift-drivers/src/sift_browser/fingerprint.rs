use crate::sift_browser::behavioral::Entropy;
use serde::{Deserialize, Serialize};
use sift_common::{PipelineConfig, Viewport};

/// Client characteristics presented by one browsing context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FingerprintProfile {
    pub user_agent: String,
    pub viewport: Viewport,
    pub device_scale_factor: f64,
    pub platform: String,
    pub languages: Vec<String>,
}

impl FingerprintProfile {
    /// Derive a profile from the pipeline settings, drawing the pixel ratio
    /// from `device_scale_factors`.
    pub fn from_config(config: &PipelineConfig, entropy: &mut Entropy) -> Self {
        let device_scale_factor = entropy
            .choose(&config.device_scale_factors)
            .copied()
            .unwrap_or(1.0);

        Self {
            user_agent: config.user_agent.clone(),
            viewport: config.viewport,
            device_scale_factor,
            platform: platform_for(&config.user_agent).to_string(),
            languages: languages_from_headers(config),
        }
    }
}

fn platform_for(user_agent: &str) -> &'static str {
    if user_agent.contains("Macintosh") {
        "MacIntel"
    } else if user_agent.contains("Linux") {
        "Linux x86_64"
    } else {
        "Win32"
    }
}

/// Language tags from the configured `Accept-Language` header, without weights.
fn languages_from_headers(config: &PipelineConfig) -> Vec<String> {
    let langs: Vec<String> = config
        .headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("accept-language"))
        .map(|(_, v)| {
            v.split(',')
                .filter_map(|part| part.split(';').next())
                .map(|tag| tag.trim().to_string())
                .filter(|tag| !tag.is_empty())
                .collect()
        })
        .unwrap_or_default();

    if langs.is_empty() {
        vec!["en-US".to_string(), "en".to_string()]
    } else {
        langs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_uses_configured_scale_factors() {
        let cfg = PipelineConfig::default();
        let mut e = Entropy::seeded(9);
        for _ in 0..20 {
            let p = FingerprintProfile::from_config(&cfg, &mut e);
            assert!(cfg.device_scale_factors.contains(&p.device_scale_factor));
            assert_eq!(p.viewport, Viewport { width: 1920, height: 1080 });
        }
    }

    #[test]
    fn languages_come_from_accept_language() {
        let cfg = PipelineConfig::default();
        let p = FingerprintProfile::from_config(&cfg, &mut Entropy::seeded(1));
        assert_eq!(p.languages, vec!["en-US", "en"]);
        assert_eq!(p.platform, "Win32");
    }

    #[test]
    fn missing_accept_language_falls_back() {
        let mut cfg = PipelineConfig::default();
        cfg.headers.clear();
        cfg.user_agent = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)".into();
        let p = FingerprintProfile::from_config(&cfg, &mut Entropy::seeded(1));
        assert_eq!(p.languages, vec!["en-US", "en"]);
        assert_eq!(p.platform, "MacIntel");
    }

    #[test]
    fn profile_serializes_with_plain_field_names() {
        let p = FingerprintProfile::from_config(&PipelineConfig::default(), &mut Entropy::seeded(3));
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["viewport"]["width"], 1920);
        assert_eq!(v["device_scale_factor"], p.device_scale_factor);
        let back: FingerprintProfile = serde_json::from_value(v).unwrap();
        assert_eq!(back.languages, p.languages);
    }
}
