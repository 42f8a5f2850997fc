use std::time::Duration;

use lumen_speech_interface::{BoxFuture, SpeechSynthesizer};

use crate::{Error, GenerateContentRequest, GenerateContentResponse};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-preview-tts";
pub const DEFAULT_VOICE: &str = "Kore";

#[derive(Debug, Clone)]
pub struct GeminiTtsConfig {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub voice: String,
    pub timeout: Duration,
}

#[derive(Debug, Default)]
pub struct GeminiTtsBuilder {
    api_base: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    voice: Option<String>,
    timeout: Option<Duration>,
}

impl GeminiTtsBuilder {
    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> crate::Result<GeminiTts> {
        let api_key = self
            .api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or(Error::MissingApiKey)?;

        let api_base = self
            .api_base
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();
        reqwest::Url::parse(&api_base).map_err(|e| Error::InvalidApiBase(e.to_string()))?;

        let config = GeminiTtsConfig {
            api_base,
            api_key,
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            voice: self.voice.unwrap_or_else(|| DEFAULT_VOICE.to_string()),
            timeout: self.timeout.unwrap_or(Duration::from_secs(60)),
        };

        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(GeminiTts { client, config })
    }
}

/// Speech synthesis over the Gemini `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct GeminiTts {
    client: reqwest::Client,
    config: GeminiTtsConfig,
}

impl GeminiTts {
    pub fn builder() -> GeminiTtsBuilder {
        GeminiTtsBuilder::default()
    }

    pub fn config(&self) -> &GeminiTtsConfig {
        &self.config
    }

    fn endpoint(&self) -> crate::Result<reqwest::Url> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.api_base, self.config.model
        );
        reqwest::Url::parse_with_params(&url, &[("key", self.config.api_key.as_str())])
            .map_err(|e| Error::InvalidApiBase(e.to_string()))
    }

    /// Returns the base64 PCM for `text`, or `None` when the response carried
    /// no audio.
    pub async fn generate_speech(&self, text: &str) -> crate::Result<Option<String>> {
        let request = GenerateContentRequest::speech(text, &self.config.voice);

        let response = self
            .client
            .post(self.endpoint()?)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, chars = text.chars().count(), "gemini_tts_request_failed");
            return Err(Error::Status { status, body });
        }

        let body = response.bytes().await?;
        let parsed: GenerateContentResponse = serde_json::from_slice(&body)?;
        let audio = parsed.into_audio_data();

        tracing::debug!(
            chars = text.chars().count(),
            audio_b64_len = audio.as_ref().map(String::len).unwrap_or(0),
            "gemini_tts_response"
        );

        Ok(audio)
    }
}

impl SpeechSynthesizer for GeminiTts {
    fn synthesize<'a>(
        &'a self,
        text: &'a str,
    ) -> BoxFuture<'a, lumen_speech_interface::Result<Option<String>>> {
        Box::pin(async move { Ok(self.generate_speech(text).await?) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> GeminiTts {
        GeminiTts::builder()
            .api_base(server.uri())
            .api_key("test-key")
            .model("tts-model")
            .voice("Charon")
            .build()
            .unwrap()
    }

    #[test]
    fn build_requires_api_key() {
        assert!(matches!(
            GeminiTts::builder().build(),
            Err(Error::MissingApiKey)
        ));
        assert!(matches!(
            GeminiTts::builder().api_key("  ").build(),
            Err(Error::MissingApiKey)
        ));
    }

    #[test]
    fn build_applies_defaults() {
        let tts = GeminiTts::builder().api_key("k").build().unwrap();
        assert_eq!(tts.config().api_base, DEFAULT_API_BASE);
        assert_eq!(tts.config().model, DEFAULT_MODEL);
        assert_eq!(tts.config().voice, DEFAULT_VOICE);
    }

    #[test]
    fn build_rejects_invalid_base() {
        assert!(matches!(
            GeminiTts::builder().api_key("k").api_base("not a url").build(),
            Err(Error::InvalidApiBase(_))
        ));
    }

    #[tokio::test]
    async fn returns_inline_audio() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/tts-model:generateContent"))
            .and(query_param("key", "test-key"))
            .and(body_partial_json(serde_json::json!({
                "contents": [{ "parts": [{ "text": "Hello." }] }],
                "generationConfig": {
                    "speechConfig": {
                        "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": "Charon" } }
                    }
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": { "parts": [{ "inlineData": { "mimeType": "audio/L16", "data": "AAABAA==" } }] }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tts = client_for(&server);
        let audio = tts.synthesize("Hello.").await.unwrap();
        assert_eq!(audio.as_deref(), Some("AAABAA=="));
    }

    #[tokio::test]
    async fn empty_candidates_are_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": []
            })))
            .mount(&server)
            .await;

        assert_eq!(client_for(&server).generate_speech("x").await.unwrap(), None);
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota"))
            .mount(&server)
            .await;

        let err = client_for(&server).generate_speech("x").await.unwrap_err();
        match err {
            Error::Status { status, body } => {
                assert_eq!(status.as_u16(), 429);
                assert_eq!(body, "quota");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_a_json_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        assert!(matches!(
            client_for(&server).generate_speech("x").await,
            Err(Error::Json(_))
        ));
    }
}
