//! The text-completion oracle behind every chat session.
//!
//! The oracle is an opaque external capability: it takes a fixed system
//! instruction, the prior exchanges of the current conversation, and one new
//! prompt, and returns a single text reply. `OpenAICompatibleClient` speaks
//! to any OpenAI-compatible chat-completions endpoint, which covers both the
//! OpenAI and Gemini backends the service supports.

use async_openai::{
    Client,
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;

/// How a chat request can fail.
///
/// There is deliberately no transient/permanent split: every failed send is
/// treated identically by the session layer (discard the handle, report, let
/// the learner retry). A missing credential is the one unrecoverable case.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// The oracle credential or endpoint is not configured. No call can
    /// succeed until the environment is fixed, so this is never retried.
    #[error("oracle is not configured: {0}")]
    Configuration(String),
    /// A single send failed: network, quota, or a malformed reply.
    #[error("oracle request failed: {0}")]
    Communication(String),
}

impl From<OpenAIError> for OracleError {
    fn from(err: OpenAIError) -> Self {
        OracleError::Communication(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeRole {
    User,
    Model,
}

/// One prior message in an oracle conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub role: ExchangeRole,
    pub text: String,
}

/// A client capable of one conversational completion round trip.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(
        &self,
        system_instruction: &str,
        history: &[Exchange],
        prompt: &str,
    ) -> Result<String, OracleError>;
}

/// `ChatClient` implementation for any OpenAI-compatible API.
pub struct OpenAICompatibleClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAICompatibleClient {
    /// Creates a client from an explicit configuration.
    ///
    /// The caller is expected to have validated the credential (the API
    /// service does this at startup and fails fast if it is missing).
    pub fn new(config: OpenAIConfig, model: String) -> Self {
        Self {
            client: Client::with_config(config),
            model,
        }
    }

    /// Creates a client from `OPENAI_API_KEY`, for library users that skip
    /// the service's config layer.
    pub fn from_env(model: String) -> Result<Self, OracleError> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            OracleError::Configuration("OPENAI_API_KEY environment variable not set".to_string())
        })?;
        Ok(Self::new(OpenAIConfig::new().with_api_key(api_key), model))
    }
}

#[async_trait]
impl ChatClient for OpenAICompatibleClient {
    async fn complete(
        &self,
        system_instruction: &str,
        history: &[Exchange],
        prompt: &str,
    ) -> Result<String, OracleError> {
        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::with_capacity(history.len() + 2);
        messages.push(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system_instruction)
                .build()?
                .into(),
        );
        for exchange in history {
            let message = match exchange.role {
                ExchangeRole::User => ChatCompletionRequestUserMessageArgs::default()
                    .content(exchange.text.clone())
                    .build()?
                    .into(),
                ExchangeRole::Model => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(exchange.text.clone())
                    .build()?
                    .into(),
            };
            messages.push(message);
        }
        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()?
                .into(),
        );

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .build()?;

        let response = self.client.chat().create(request).await?;
        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| OracleError::Communication("reply had no text content".to_string()))
    }
}
