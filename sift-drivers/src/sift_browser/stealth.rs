use super::fingerprint::FingerprintProfile;

/// Construct Chrome command-line arguments for a fingerprint.
pub fn build_stealth_arguments(profile: &FingerprintProfile, headless: bool) -> Vec<String> {
    let mut args = vec![
        "--disable-blink-features=AutomationControlled".to_string(),
        "--disable-infobars".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--no-sandbox".to_string(),
        "--disable-extensions".to_string(),
        "--disable-plugins-discovery".to_string(),
        "--no-first-run".to_string(),
        "--no-default-browser-check".to_string(),
        format!("--user-agent={}", profile.user_agent),
        format!(
            "--window-size={},{}",
            profile.viewport.width, profile.viewport.height
        ),
        format!("--force-device-scale-factor={}", profile.device_scale_factor),
        format!("--lang={}", profile.languages.join(",")),
    ];
    if headless {
        args.push("--headless=new".to_string());
        args.push("--disable-gpu".to_string());
    }
    args
}

/// JavaScript evasions applied after navigation to reduce automation signals.
pub struct StealthScripts;

impl StealthScripts {
    pub fn core_evasions() -> &'static str {
        r#"
            Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
            Object.defineProperty(navigator, 'plugins', { get: () => [1,2,3] });
            if (!window.chrome) window.chrome = { runtime: {} };
        "#
    }

    /// Pin `navigator.platform` and `navigator.languages` to the profile.
    pub fn profile_overrides(profile: &FingerprintProfile) -> String {
        let langs = serde_json::to_string(&profile.languages).unwrap_or_else(|_| "[]".into());
        let platform =
            serde_json::to_string(&profile.platform).unwrap_or_else(|_| "\"Win32\"".into());
        format!(
            "Object.defineProperty(navigator, 'platform', {{ get: () => {platform} }});\
             Object.defineProperty(navigator, 'languages', {{ get: () => {langs} }});"
        )
    }
}
