//! Answer generation through OpenAI-compatible chat providers.

use super::{extractive_summary, format_context, Answer, Hit, NO_CONTEXT_ANSWER};
use crate::config::{GenerationSettings, Prompts};
use crate::error::{HarkError, Result};
use crate::openai::{create_client, create_compatible_client, env_key};
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// A text generation provider.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Provider name used in logs and answers.
    fn name(&self) -> &str;

    /// Complete a system + user prompt pair.
    async fn generate(&self, system: &str, user: &str) -> Result<String>;
}

/// Chat completions against any OpenAI-compatible endpoint.
pub struct ChatGenerator {
    name: String,
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl ChatGenerator {
    pub fn new(
        name: &str,
        client: async_openai::Client<async_openai::config::OpenAIConfig>,
        model: &str,
        temperature: f32,
    ) -> Self {
        Self {
            name: name.to_string(),
            client,
            model: model.to_string(),
            temperature,
        }
    }
}

#[async_trait]
impl Generator for ChatGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self, system, user), fields(provider = %self.name, model = %self.model))]
    async fn generate(&self, system: &str, user: &str) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system.to_string())
                .build()
                .map_err(|e| HarkError::Generation(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user.to_string())
                .build()
                .map_err(|e| HarkError::Generation(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| HarkError::Generation(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| HarkError::OpenAI(format!("Failed to generate response: {}", e)))?;

        let answer = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| HarkError::Generation("Empty response from LLM".to_string()))?;

        debug!("Generated {} characters", answer.len());
        Ok(answer)
    }
}

/// Tries each provider in order, then falls back to an extractive summary.
pub struct AnswerEngine {
    providers: Vec<Arc<dyn Generator>>,
    prompts: Prompts,
    max_context_hits: usize,
}

impl AnswerEngine {
    pub fn new(providers: Vec<Arc<dyn Generator>>, prompts: Prompts, max_context_hits: usize) -> Self {
        Self {
            providers,
            prompts,
            max_context_hits,
        }
    }

    /// Groq first, then OpenAI, each only when its API key is set.
    pub fn from_settings(settings: &GenerationSettings, prompts: Prompts) -> Result<Self> {
        let mut providers: Vec<Arc<dyn Generator>> = Vec::new();

        if settings.enabled {
            if let Some(key) = env_key("GROQ_API_KEY") {
                let client = create_compatible_client(&settings.groq_api_base, &key)?;
                providers.push(Arc::new(ChatGenerator::new(
                    "groq",
                    client,
                    &settings.groq_model,
                    settings.temperature,
                )));
            }
            if env_key("OPENAI_API_KEY").is_some() {
                providers.push(Arc::new(ChatGenerator::new(
                    "openai",
                    create_client()?,
                    &settings.openai_model,
                    settings.temperature,
                )));
            }
        }

        Ok(Self::new(providers, prompts, settings.max_context_hits))
    }

    /// Names of configured providers, in fallback order.
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Answer `question` from `hits`. Never fails: provider errors fall through.
    #[instrument(skip(self, hits), fields(hits = hits.len()))]
    pub async fn answer(&self, question: &str, hits: &[Hit]) -> Answer {
        if hits.is_empty() {
            return Answer {
                text: NO_CONTEXT_ANSWER.to_string(),
                provider: None,
            };
        }

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert(
            "context".to_string(),
            format_context(hits, self.max_context_hits),
        );
        let system = self.prompts.render_with_custom(&self.prompts.answer.system, &vars);
        let user = self.prompts.render_with_custom(&self.prompts.answer.user, &vars);

        for provider in &self.providers {
            match provider.generate(&system, &user).await {
                Ok(text) => {
                    info!("Answer generated by {}", provider.name());
                    return Answer {
                        text,
                        provider: Some(provider.name().to_string()),
                    };
                }
                Err(e) => warn!("{} failed: {}", provider.name(), e),
            }
        }

        Answer {
            text: extractive_summary(hits),
            provider: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::test_support::hit;
    use std::sync::Mutex;

    struct FakeGenerator {
        name: &'static str,
        reply: Option<&'static str>,
        prompts: Mutex<Vec<String>>,
    }

    impl FakeGenerator {
        fn new(name: &'static str, reply: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                name,
                reply,
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Generator for FakeGenerator {
        fn name(&self) -> &str {
            self.name
        }

        async fn generate(&self, _system: &str, user: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(user.to_string());
            self.reply
                .map(str::to_string)
                .ok_or_else(|| HarkError::Generation("unavailable".to_string()))
        }
    }

    #[tokio::test]
    async fn test_falls_through_to_next_provider() {
        let broken = FakeGenerator::new("groq", None);
        let working = FakeGenerator::new("openai", Some("Cats sit."));
        let engine = AnswerEngine::new(
            vec![broken.clone() as Arc<dyn Generator>, working.clone()],
            Prompts::default(),
            10,
        );

        let answer = engine
            .answer("what did the cat do?", &[hit("ep", 0.0, 5.0, "the cat sat")])
            .await;

        assert_eq!(answer.text, "Cats sit.");
        assert_eq!(answer.provider.as_deref(), Some("openai"));

        let prompt = &working.prompts.lock().unwrap()[0];
        assert!(prompt.contains("[ep 0.0-5.0] the cat sat"));
        assert!(prompt.contains("Question: what did the cat do?"));
        assert_eq!(broken.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_extractive_fallback() {
        let engine = AnswerEngine::new(
            vec![FakeGenerator::new("groq", None) as Arc<dyn Generator>],
            Prompts::default(),
            10,
        );

        let answer = engine.answer("q", &[hit("ep", 12.0, 20.0, "words")]).await;

        assert_eq!(answer.provider, None);
        assert!(answer.text.starts_with("Based on the most relevant segments:"));
        assert!(answer.text.contains("- ep @ 12.0s: words..."));
    }

    #[tokio::test]
    async fn test_no_hits_skips_providers() {
        let generator = FakeGenerator::new("groq", Some("made up"));
        let engine = AnswerEngine::new(vec![generator.clone() as Arc<dyn Generator>], Prompts::default(), 10);

        let answer = engine.answer("q", &[]).await;

        assert_eq!(answer.text, NO_CONTEXT_ANSWER);
        assert!(generator.prompts.lock().unwrap().is_empty());
    }

    #[test]
    fn test_disabled_generation_has_no_providers() {
        let settings = GenerationSettings {
            enabled: false,
            ..GenerationSettings::default()
        };
        let engine = AnswerEngine::from_settings(&settings, Prompts::default()).unwrap();
        assert!(engine.provider_names().is_empty());
    }
}
