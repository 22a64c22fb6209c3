use anyhow::{Result, anyhow};
use platform_obs::DEFAULT_SERVICE_NAME;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub service_name: String,
    pub seed_demo: bool,
    pub cors_allowed_origins: Vec<String>,
}

impl AppConfig {
    /// Reads the process environment after loading `.env`, if present.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let service_name = lookup("CRM_SERVICE_NAME")
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_SERVICE_NAME.into());

        let seed_demo = match lookup("CRM_SEED_DEMO") {
            Some(raw) => parse_flag(&raw)
                .ok_or_else(|| anyhow!("CRM_SEED_DEMO must be a boolean, got `{raw}`"))?,
            None => false,
        };

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .filter_map(|s| {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            })
            .collect::<Vec<_>>();

        Ok(Self {
            service_name,
            seed_demo,
            cors_allowed_origins,
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" | "" => Some(false),
        _ => None,
    }
}
