use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::DisambiguationError;

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const SYSTEM_INSTRUCTION: &str = "You are an assistant for working with python \
I give to you data and you need to split it into elements.";

static BRACKETED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[[^\[\]]*\]").unwrap());

/// An oracle that re-segments an ambiguous item list. The answer is free text
/// and must be parsed with [`parse_item_list`].
#[async_trait]
pub trait Disambiguator: Send + Sync {
    async fn disambiguate(&self, items: &[String]) -> Result<String, DisambiguationError>;
}

pub fn build_client() -> Result<Client, DisambiguationError> {
    let client = Client::builder()
        // Talk to the endpoint directly, ignoring system proxy settings.
        .no_proxy()
        .user_agent("menu-structurer/0.1")
        .timeout(REQUEST_TIMEOUT)
        .build()?;
    Ok(client)
}

/// Chat-completions backed [`Disambiguator`].
pub struct OpenAiDisambiguator {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiDisambiguator {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Result<Self, DisambiguationError> {
        Ok(Self {
            client: build_client()?,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f64,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// The instruction asks for a python list back, so the items go in as one.
pub fn user_prompt(items: &[String]) -> String {
    let listed: Vec<String> = items.iter().map(|item| python_str(item)).collect();
    format!(
        "It's part of menu split please by items [{}] and return only list with split items",
        listed.join(", ")
    )
}

// Single-quoted unless the text holds a single quote and no double quote.
fn python_str(text: &str) -> String {
    let quote = if text.contains('\'') && !text.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(text.len() + 2);
    out.push(quote);
    for c in text.chars() {
        if c == '\\' || c == quote {
            out.push('\\');
        }
        out.push(c);
    }
    out.push(quote);
    out
}

#[async_trait]
impl Disambiguator for OpenAiDisambiguator {
    async fn disambiguate(&self, items: &[String]) -> Result<String, DisambiguationError> {
        let prompt = user_prompt(items);
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_INSTRUCTION,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: 0.7,
        };

        debug!(items = items.len(), model = %self.model, "requesting disambiguation");
        let response: ChatResponse = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                DisambiguationError::MalformedResponse("missing choices[0].message.content".into())
            })
    }
}

/// Pulls the item list out of a free-text answer: the last `[...]` span,
/// split on commas, with quotes and whitespace stripped. An answer without a
/// bracketed list yields no items.
pub fn parse_item_list(response: &str) -> Vec<String> {
    let Some(list) = BRACKETED.find_iter(response).last() else {
        return Vec::new();
    };
    let inner = &list.as_str()[1..list.len() - 1];
    inner
        .split(',')
        .map(|item| item.trim_matches(|c: char| c == '\'' || c == '"' || c.is_whitespace()))
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_last_bracketed_list() {
        let response = "Here [1] is an explanation... ['Garlic', 'Chives', 'Lemon']";
        assert_eq!(parse_item_list(response), vec!["Garlic", "Chives", "Lemon"]);
    }

    #[test]
    fn double_quotes_and_padding_are_stripped() {
        let response = "```python\n[ \"Buffalo\" ,\"Honey BBQ\",  'Mango Habanero' ]\n```";
        assert_eq!(
            parse_item_list(response),
            vec!["Buffalo", "Honey BBQ", "Mango Habanero"]
        );
    }

    #[test]
    fn no_brackets_is_empty() {
        assert!(parse_item_list("Sorry, I cannot split this.").is_empty());
        assert!(parse_item_list("[]").is_empty());
    }

    #[test]
    fn prompt_embeds_items() {
        let prompt = user_prompt(&["HOT".to_string(), "MILD".to_string()]);
        assert_eq!(
            prompt,
            "It's part of menu split please by items ['HOT', 'MILD'] and return only list with split items"
        );
    }

    #[test]
    fn prompt_quotes_items_like_python() {
        let prompt = user_prompt(&[
            "Blanton's".to_string(),
            r#"Say "when""#.to_string(),
            r#"It's "hot""#.to_string(),
        ]);
        assert!(prompt.contains(r#"["Blanton's", 'Say "when"', 'It\'s "hot"']"#));
    }
}
