//! HTTP narrative provider for OpenAI-compatible chat completion APIs.
//!
//! Configured from the environment:
//!   NARRATOR_API_URL   base URL, requests go to `{url}/chat/completions`
//!   NARRATOR_API_KEY   bearer token; without it the runner stays offline
//!   NARRATOR_MODEL     model name
//!
//! Calls block. The engine runs them on worker threads (or inline when
//! the runner drives simulated time).

use fishbun_core::{
    day_controller::DailyEvent,
    narrative::{parse_daily_event, EventRequest, NarrativeError, Narrator, ReviewRequest},
};
use std::time::Duration;

const DEFAULT_API_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

pub struct HttpNarrator {
    client:  reqwest::blocking::Client,
    api_url: String,
    api_key: String,
    model:   String,
}

impl HttpNarrator {
    /// `None` when no API key is set.
    pub fn from_env(timeout: Duration) -> anyhow::Result<Option<Self>> {
        let Ok(api_key) = std::env::var("NARRATOR_API_KEY") else {
            return Ok(None);
        };
        if api_key.trim().is_empty() {
            return Ok(None);
        }
        let api_url = std::env::var("NARRATOR_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_owned());
        let model = std::env::var("NARRATOR_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_owned());
        let client = reqwest::blocking::Client::builder().timeout(timeout).build()?;
        Ok(Some(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_owned(),
            api_key,
            model,
        }))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn complete(&self, prompt: &str, json_mode: bool) -> Result<String, NarrativeError> {
        let url = format!("{}/chat/completions", self.api_url);
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": 0.9,
            "max_tokens": 256,
        });
        if json_mode {
            body["response_format"] = serde_json::json!({"type": "json_object"});
        }

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .map_err(|e| NarrativeError::Transport(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(NarrativeError::Transport(format!("{status}: {error_body}")));
        }

        let json: serde_json::Value = response
            .json()
            .map_err(|e| NarrativeError::Malformed(format!("response parse failed: {e}")))?;
        extract_content(&json)
    }
}

impl Narrator for HttpNarrator {
    fn daily_event(&self, request: &EventRequest) -> Result<DailyEvent, NarrativeError> {
        let text = self.complete(&event_prompt(request), true)?;
        parse_daily_event(&text)
    }

    fn day_review(&self, request: &ReviewRequest) -> Result<String, NarrativeError> {
        let text = self.complete(&review_prompt(request), false)?;
        Ok(text.trim().to_owned())
    }
}

fn event_prompt(request: &EventRequest) -> String {
    format!(
        "You run the world of a fish-bun (bungeoppang) street stall game.\n\
         Day {day}, stall reputation {reputation}.\n\
         Invent one thing that happens around a Korean street food stall today \
         (weather, a festival, local news).\n\
         Write the title and description in {language}.\n\
         Reply with a JSON object only:\n\
         {{\"title\": short title, \"description\": one sentence, \
         \"effect\": one of \"NORMAL\", \"RUSH\", \"SLOW\", \"RICH\"}}\n\
         RUSH brings more customers, SLOW fewer, RICH customers tip, NORMAL changes nothing.",
        day = request.day,
        reputation = request.reputation,
        language = request.language.display_name(),
    )
}

fn review_prompt(request: &ReviewRequest) -> String {
    let mut mood = String::new();
    if request.burnt > 5 {
        mood.push_str("Complain about the burnt smell. ");
    }
    if request.served > 20 {
        mood.push_str("Rave about how popular the stall is. ");
    }
    format!(
        "Write a short, playful customer review of a fish-bun stall.\n\
         Day {day}: served {served} customers, burnt {burnt} buns, earned {earned} KRW.\n\
         {mood}Stay under 150 characters. Write it in {language}.",
        day = request.day,
        served = request.served,
        burnt = request.burnt,
        earned = request.earned,
        language = request.language.display_name(),
    )
}

fn extract_content(json: &serde_json::Value) -> Result<String, NarrativeError> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| NarrativeError::Malformed("missing choices[0].message.content".to_owned()))
}
