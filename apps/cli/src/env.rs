use serde::{Deserialize, Deserializer};

/// Settings read from `LUMEN_*` variables, after loading `.env`.
#[derive(Debug, Default, Deserialize)]
pub struct Env {
    #[serde(default, deserialize_with = "filter_empty")]
    pub gemini_api_key: Option<String>,
    #[serde(default, deserialize_with = "filter_empty")]
    pub gemini_api_base: Option<String>,
    #[serde(default, deserialize_with = "filter_empty")]
    pub gemini_model: Option<String>,
    #[serde(default, deserialize_with = "filter_empty")]
    pub voice: Option<String>,
    #[serde(default, deserialize_with = "filter_empty")]
    pub output_dir: Option<String>,
}

fn filter_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

pub fn load() -> anyhow::Result<Env> {
    let _ = dotenvy::dotenv();
    Ok(envy::prefixed("LUMEN_").from_env::<Env>()?)
}
