//! OpenAI chat-completions client.

use serde::{Deserialize, Serialize};

use super::{
    AiSettings, PLACEHOLDER_REVIEW, PLACEHOLDER_SUMMARY, RoadmapStep, TextGenerator,
    placeholder_roadmap,
};
use crate::error::{NeoError, NeoResult};

static SUMMARY_PROMPT: &str = "You are an expert at summarizing text concisely. \
Provide a summary of the following note in one or two sentences.";

static ROADMAP_PROMPT: &str = "You are a world-class productivity coach and project planner. \
A user will provide a goal, and you must break it down into a clear, actionable roadmap. \
Return the output as a JSON array of objects, where each object has 'step', 'title', and \
'description' keys. The JSON should be clean and ready for parsing. Do not include any text \
outside of the JSON array.";

const SUMMARY_MAX_TOKENS: u32 = 60;
const ROADMAP_MAX_TOKENS: u32 = 500;
const REVIEW_MAX_TOKENS: u32 = 400;

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: String,
}

fn review_prompt(tasks: &str, notes: &str) -> String {
    format!(
        "Based on the following tasks and notes from the past week, generate a concise weekly review in markdown format.\n\
         The review should have three sections:\n\
         1. A summary of accomplishments.\n\
         2. Key insights from the notes.\n\
         3. A brief, actionable plan for the next week.\n\
         \n\
         Tasks: {tasks}\n\
         Notes: {notes}"
    )
}

/// Parse the model's roadmap reply. Models sometimes wrap the array in a
/// markdown code fence even when asked not to.
pub(crate) fn parse_roadmap(content: &str) -> NeoResult<Vec<RoadmapStep>> {
    let trimmed = content.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed);

    serde_json::from_str(body.trim())
        .map_err(|e| NeoError::Ai(format!("Roadmap reply is not a JSON step list: {}", e)))
}

pub struct OpenAiClient {
    settings: AiSettings,
    http: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(settings: AiSettings) -> Self {
        OpenAiClient {
            settings,
            http: reqwest::Client::new(),
        }
    }

    pub fn settings(&self) -> &AiSettings {
        &self.settings
    }

    pub fn is_configured(&self) -> bool {
        self.settings.has_api_key()
    }

    /// Wait out the simulated latency before handing back placeholder content.
    async fn placeholder<T>(&self, what: &str, value: T) -> T {
        log::warn!("OpenAI API key not configured. Returning placeholder {}.", what);
        tokio::time::sleep(self.settings.placeholder_delay).await;
        value
    }

    async fn complete(&self, messages: Vec<ChatMessage<'_>>, max_tokens: u32) -> NeoResult<String> {
        let api_key = self.settings.api_key.as_deref().unwrap_or_default();
        let request = ChatRequest {
            model: &self.settings.model,
            messages,
            max_tokens,
        };

        let response = self
            .http
            .post(&self.settings.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            log::debug!("OpenAI error body: {}", text);
            return Err(NeoError::Ai(format!("OpenAI API error: {}", status)));
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| NeoError::Ai(format!("Failed to parse OpenAI response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or_else(|| NeoError::Ai("No response from OpenAI".into()))
    }
}

impl TextGenerator for OpenAiClient {
    async fn summarize(&self, text: &str) -> NeoResult<String> {
        if !self.is_configured() {
            return Ok(self.placeholder("summary", PLACEHOLDER_SUMMARY.to_string()).await);
        }

        let messages = vec![
            ChatMessage {
                role: "system",
                content: SUMMARY_PROMPT,
            },
            ChatMessage {
                role: "user",
                content: text,
            },
        ];
        self.complete(messages, SUMMARY_MAX_TOKENS)
            .await
            .inspect_err(|e| log::error!("Error summarizing text: {}", e))
    }

    async fn plan_roadmap(&self, goal: &str) -> NeoResult<Vec<RoadmapStep>> {
        if !self.is_configured() {
            return Ok(self.placeholder("roadmap", placeholder_roadmap()).await);
        }

        let messages = vec![
            ChatMessage {
                role: "system",
                content: ROADMAP_PROMPT,
            },
            ChatMessage {
                role: "user",
                content: goal,
            },
        ];
        let content = self.complete(messages, ROADMAP_MAX_TOKENS).await;
        content
            .and_then(|c| parse_roadmap(&c))
            .inspect_err(|e| log::error!("Error generating goal roadmap: {}", e))
    }

    async fn weekly_review(&self, tasks: &str, notes: &str) -> NeoResult<String> {
        if !self.is_configured() {
            return Ok(self.placeholder("review", PLACEHOLDER_REVIEW.to_string()).await);
        }

        let prompt = review_prompt(tasks, notes);
        let messages = vec![ChatMessage {
            role: "user",
            content: &prompt,
        }];
        self.complete(messages, REVIEW_MAX_TOKENS)
            .await
            .inspect_err(|e| log::error!("Error generating weekly review: {}", e))
    }
}
