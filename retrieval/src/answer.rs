//! Answer generation grounded in a retrieved article.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::config::GenerationConfig;
use crate::error::{Result, RetrievalError};

/// Build the prompt sent to the chat model.
///
/// The model is told to answer only from `article_text`.
pub fn build_prompt(question: &str, article_text: &str) -> String {
    format!(
        "Ты - финансовый AI-ассистент банка. Твоя задача - давать точные и грамотные ответы \
         на вопросы клиентов о финансовых инструментах и услугах.\n\
         \n\
         Используй ТОЛЬКО информацию из предоставленной статьи для ответа. Не добавляй \
         информацию, которой нет в статье.\n\
         \n\
         СТАТЬЯ:\n\
         {article_text}\n\
         \n\
         ВОПРОС КЛИЕНТА:\n\
         {question}\n\
         \n\
         Дай четкий, профессиональный и понятный ответ на русском языке. Ответ должен быть \
         информативным, но кратким (2-4 предложения)."
    )
}

/// Produces an answer for a question given supporting article text.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Generate an answer to `question` using `article_text` as context.
    async fn generate(&self, question: &str, article_text: &str) -> Result<String>;
}

/// Generator backed by an OpenAI-compatible `/chat/completions` endpoint.
pub struct ChatCompletionsGenerator {
    api_key: String,
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl ChatCompletionsGenerator {
    /// Create a generator. Fails when no API key is configured.
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| RetrievalError::Config("generation API key missing".to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            api_key,
            base_url: config.endpoint_url.trim_end_matches('/').to_string(),
            model: config.model_name.clone(),
            client,
        })
    }
}

#[async_trait]
impl AnswerGenerator for ChatCompletionsGenerator {
    async fn generate(&self, question: &str, article_text: &str) -> Result<String> {
        let prompt = build_prompt(question, article_text);

        let body = serde_json::json!({
            "model": self.model,
            "messages": [{
                "role": "user",
                "content": [{"type": "text", "text": prompt}]
            }]
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Generation(format!(
                "{status}: {error_text}"
            )));
        }

        let result: ChatCompletionResponse = response.json().await?;
        let answer = result
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| RetrievalError::Generation("no answer in response".to_string()))?;

        debug!("Generated answer of {} chars", answer.len());
        Ok(answer)
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}
