//! Best-effort client for the advisory endpoint.
//!
//! Every call posts `{prompt, data}` and decodes a call-specific JSON body.
//! Failures are logged and turned into `None`, except motivational messages,
//! which fall back to a canned pool.

use crate::models::{
    MotivationalMessage, RestSuggestion, Suggestion, Task, TaskInput, TaskPrediction, Theme,
};
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;
use tokio::{sync::watch, task::JoinHandle, time::interval};
use tracing::{debug, warn};

const SUGGESTION_PROMPT: &str = "Suggest how to schedule this task. Reply as JSON \
{\"timeOfDay\": string, \"restBreaks\": string[], \"productivity\": string}.";

const PREDICTION_PROMPT: &str = "Estimate how likely this task is to be completed. Reply as JSON \
{\"successRate\": number, \"confidence\": number, \"factors\": string[], \"recommendations\": string[]}.";

const REST_PROMPT: &str = "Look at this task history and suggest rest periods. Reply as JSON \
{\"suggestedBreaks\": string[], \"restDuration\": string, \"reasoning\": string}.";

const LONG_MESSAGE_PROMPT: &str = "Write a detailed, story-like motivational message of two or \
three paragraphs built around one vivid image and a concrete next step. Reply as JSON \
{\"message\": string, \"theme\": \"success\" | \"encouragement\" | \"challenge\", \"icon\": string}.";

const SHORT_MESSAGE_PROMPT: &str = "Write a concise, punchy motivational message of one or two \
sentences ending with an emoji. Reply as JSON \
{\"message\": string, \"theme\": \"success\" | \"encouragement\" | \"challenge\", \"icon\": string}.";

/// Canned messages longer than this, in UTF-16 code units, are long ones.
pub const SHORT_MESSAGE_LIMIT: usize = 100;

const FALLBACK_MESSAGES: &[(&str, Theme)] = &[
    (
        "Think of each task as a seed you're planting in the garden of your future. Every small \
         action you take - completing a task, maintaining consistency, pushing through challenges \
         - is like providing water and sunlight to these seeds. Though you may not see results \
         immediately, beneath the surface, your dedication is nurturing roots that will soon \
         blossom into remarkable achievements. Trust in this process of growth, for like any \
         master gardener knows, the most beautiful gardens are built one thoughtful action at a \
         time. 🌱",
        Theme::Encouragement,
    ),
    (
        "Your journey is like a mosaic - each completed task, no matter how small, is a beautiful \
         piece contributing to the masterpiece of your success! ✨",
        Theme::Success,
    ),
    (
        "Imagine standing at the base of a mountain. The peak may seem distant, but every step \
         you take, every task you complete, brings you closer to the summit. Like countless \
         climbers before you, success isn't about making one giant leap - it's about maintaining \
         a steady pace, finding solid footing, and keeping your eyes fixed on your goal. As you \
         tackle each challenge, you're not just climbing higher, you're becoming stronger, more \
         resilient, and more capable than ever before. The view from the top will be worth every \
         step of the journey. 🏔️",
        Theme::Challenge,
    ),
    (
        "Like a star burning bright in the darkness, your persistence lights the way forward. \
         Shine on! 🌟",
        Theme::Success,
    ),
    (
        "Consider the mighty oak that grows from a tiny acorn. Each task you complete, each \
         challenge you overcome, is like adding another ring to your tree of success. Though some \
         days may bring storms, and others sunshine, your consistent effort ensures steady \
         growth. Your branches reach higher with every achievement, your roots grow deeper with \
         every lesson learned, and your strength builds with every obstacle faced. This is how \
         lasting success is built - not in a single season, but through patient, persistent \
         growth through all seasons. 🌳",
        Theme::Encouragement,
    ),
    (
        "Your determination is like a compass, always pointing toward your dreams. Keep \
         navigating forward! 🧭",
        Theme::Challenge,
    ),
    (
        "Just as a river carves its path through mountains not through force but through \
         persistent flow, your daily dedication is reshaping the landscape of your future. Every \
         task completed, every small victory achieved, is like a droplet contributing to this \
         powerful flow. While each individual action might seem small, together they create an \
         unstoppable force that can overcome any obstacle. Let your consistency be your strength, \
         and watch as your persistent effort transforms challenges into achievements. 🌊",
        Theme::Success,
    ),
    (
        "Every step forward, no matter how small, is a victory worth celebrating. You've got \
         this! 💫",
        Theme::Encouragement,
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLength {
    Long,
    Short,
}

#[derive(Debug, Serialize)]
struct AdvisoryRequest<'a> {
    prompt: &'a str,
    data: Value,
}

#[derive(Debug, Deserialize)]
struct MotivationReply {
    message: String,
    theme: Theme,
    #[serde(default)]
    icon: String,
}

#[derive(Debug)]
pub struct AdvisoryClient {
    client: reqwest::Client,
    endpoint: String,
    long_mode: AtomicBool,
}

impl AdvisoryClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            long_mode: AtomicBool::new(true),
        })
    }

    pub async fn task_suggestions(&self, task: &TaskInput) -> Option<Suggestion> {
        self.ask("task suggestions", SUGGESTION_PROMPT, task).await
    }

    pub async fn task_prediction(&self, task: &Task) -> Option<TaskPrediction> {
        self.ask("task prediction", PREDICTION_PROMPT, task).await
    }

    pub async fn rest_suggestions(&self, history: &[Task]) -> Option<RestSuggestion> {
        self.ask("rest suggestions", REST_PROMPT, history).await
    }

    /// Flips between long and short messages on every call. Never fails:
    /// on any error a canned message of the current length is returned.
    pub async fn motivational_message(&self) -> MotivationalMessage {
        let length = self.next_length();
        let prompt = match length {
            MessageLength::Long => LONG_MESSAGE_PROMPT,
            MessageLength::Short => SHORT_MESSAGE_PROMPT,
        };

        match self
            .post::<MotivationReply>(prompt, Value::Object(Default::default()))
            .await
        {
            Ok(reply) => MotivationalMessage {
                message: format!("{} {}", reply.message, reply.icon).trim_end().to_string(),
                theme: reply.theme,
            },
            Err(err) => {
                warn!("motivational message unavailable, using fallback: {err}");
                fallback_message(length)
            }
        }
    }

    fn next_length(&self) -> MessageLength {
        // fetch_xor returns the old value; the new mode is its negation.
        if self.long_mode.fetch_xor(true, Ordering::SeqCst) {
            MessageLength::Short
        } else {
            MessageLength::Long
        }
    }

    async fn ask<T, D>(&self, what: &str, prompt: &str, data: &D) -> Option<T>
    where
        T: DeserializeOwned,
        D: Serialize + ?Sized,
    {
        let data = match serde_json::to_value(data) {
            Ok(data) => data,
            Err(err) => {
                warn!("failed to encode {what} request: {err}");
                return None;
            }
        };

        match self.post(prompt, data).await {
            Ok(reply) => Some(reply),
            Err(err) => {
                warn!("{what} request failed: {err}");
                None
            }
        }
    }

    async fn post<T: DeserializeOwned>(&self, prompt: &str, data: Value) -> Result<T, reqwest::Error> {
        debug!(endpoint = %self.endpoint, "advisory request");
        self.client
            .post(&self.endpoint)
            .json(&AdvisoryRequest { prompt, data })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

pub fn is_long(message: &str) -> bool {
    message.encode_utf16().count() > SHORT_MESSAGE_LIMIT
}

/// Picks a canned message of the requested length at random.
pub fn fallback_message(length: MessageLength) -> MotivationalMessage {
    let want_long = length == MessageLength::Long;
    let pool: Vec<(&str, Theme)> = FALLBACK_MESSAGES
        .iter()
        .copied()
        .filter(|(message, _)| is_long(message) == want_long)
        .collect();
    let (message, theme) = pool
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(FALLBACK_MESSAGES[0]);

    MotivationalMessage {
        message: message.to_string(),
        theme,
    }
}

/// Publishes one message right away and another every `every` until the
/// returned handle is aborted.
pub fn spawn_motivation_cycle(
    client: Arc<AdvisoryClient>,
    every: Duration,
    latest: watch::Sender<Option<MotivationalMessage>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        loop {
            ticker.tick().await;
            let message = client.motivational_message().await;
            latest.send_replace(Some(message));
        }
    })
}
