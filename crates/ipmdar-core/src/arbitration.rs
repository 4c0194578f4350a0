//! Competition between certified assistants: fastest answer wins, peers review it, and any
//! peer that flags a problem races to supply a correction.
//!
//! "Fastest" is decided by sampled times, never by completion order. Answer times are drawn
//! from [1, 5] and correction times from [1, 3]; a time is drawn only for a call that
//! succeeded.

use crate::assistant::{Assistant, AssistantResult};
use crate::providers::ProviderKind;
use crate::sampling::Sampler;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

pub const RESPONSE_TIME_RANGE: (f64, f64) = (1.0, 5.0);
pub const CORRECTION_TIME_RANGE: (f64, f64) = (1.0, 3.0);

/// Substituted when a peer fails to produce its analysis, or flags the answer and then fails
/// to produce the correction.
pub const ANALYSIS_FALLBACK: &str =
    "I apologize, but I encountered an error when analyzing the response. Please try again.";

/// Case-insensitive markers that turn an analysis into a correction request.
pub const CORRECTION_MARKERS: [&str; 6] =
    ["incorrect", "inaccurate", "error", "mistake", "wrong", "false"];

/// Anything that can take part in a competition.
#[async_trait]
pub trait Contender: Send + Sync {
    fn id(&self) -> &str;
    fn provider(&self) -> ProviderKind;
    async fn respond(&self, prompt: &str) -> AssistantResult<String>;
}

#[async_trait]
impl Contender for Assistant {
    fn id(&self) -> &str {
        Assistant::id(self)
    }

    fn provider(&self) -> ProviderKind {
        Assistant::provider(self)
    }

    async fn respond(&self, prompt: &str) -> AssistantResult<String> {
        Ok(self.answer(prompt).await?.response)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompetitionResult {
    pub winner: String,
    pub winning_time: f64,
    pub winning_response: String,
    pub winning_provider: ProviderKind,
    /// Analysis text per reviewing peer (every contender except the winner).
    pub analyses: BTreeMap<String, String>,
    pub correction_needed: bool,
    pub correction_winner: Option<String>,
    pub correction_response: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompetitionOutcome {
    Decided(CompetitionResult),
    /// No contender produced an answer.
    NoCandidates,
}

/// First entry with the smallest time; later ties lose.
pub fn select_fastest<T>(timed: impl IntoIterator<Item = (T, f64)>) -> Option<(T, f64)> {
    timed.into_iter().fold(None, |best, (item, time)| match best {
        Some((_, best_time)) if time >= best_time => best,
        _ => Some((item, time)),
    })
}

pub fn needs_correction(analysis: &str) -> bool {
    let lower = analysis.to_lowercase();
    CORRECTION_MARKERS.iter().any(|m| lower.contains(m))
}

pub fn analysis_prompt(query: &str, response: &str) -> String {
    format!(
        "The following is a response to the query: '{}'. Please analyze it for accuracy and provide feedback: {}",
        query, response
    )
}

pub fn correction_prompt(query: &str, response: &str) -> String {
    format!(
        "The following response to '{}' contains inaccuracies. Please provide a corrected response: {}",
        query, response
    )
}

pub struct ArbitrationEngine {
    sampler: Arc<dyn Sampler>,
}

impl ArbitrationEngine {
    pub fn new(sampler: Arc<dyn Sampler>) -> Self {
        Self { sampler }
    }

    fn draw(&self, (low, high): (f64, f64)) -> f64 {
        self.sampler.uniform(low, high)
    }

    /// Run one competition over `contenders`, which the caller has already restricted to
    /// certified assistants.
    pub async fn compete(
        &self,
        query: &str,
        contenders: &[Arc<dyn Contender>],
    ) -> CompetitionOutcome {
        let mut answers = Vec::with_capacity(contenders.len());
        for contender in contenders {
            match contender.respond(query).await {
                Ok(response) => {
                    let time = self.draw(RESPONSE_TIME_RANGE);
                    answers.push(((contender, response), time));
                }
                Err(e) => tracing::warn!(
                    target: "ipmdar::arbitration",
                    contender = contender.id(),
                    error = %e,
                    "contender dropped from competition"
                ),
            }
        }

        let Some(((winner, winning_response), winning_time)) = select_fastest(answers) else {
            tracing::warn!(target: "ipmdar::arbitration", "no candidates produced an answer");
            return CompetitionOutcome::NoCandidates;
        };
        tracing::info!(
            target: "ipmdar::arbitration",
            winner = winner.id(),
            time = winning_time,
            "competition winner selected"
        );

        let review = analysis_prompt(query, &winning_response);
        let fix = correction_prompt(query, &winning_response);
        let mut analyses = BTreeMap::new();
        let mut corrections = Vec::new();
        for peer in contenders.iter().filter(|c| c.id() != winner.id()) {
            let analysis = match peer.respond(&review).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(
                        target: "ipmdar::arbitration",
                        peer = peer.id(),
                        error = %e,
                        "analysis failed"
                    );
                    analyses.insert(peer.id().to_string(), ANALYSIS_FALLBACK.to_string());
                    continue;
                }
            };
            let flagged = needs_correction(&analysis);
            analyses.insert(peer.id().to_string(), analysis);
            if !flagged {
                continue;
            }

            match peer.respond(&fix).await {
                Ok(correction) => {
                    let time = self.draw(CORRECTION_TIME_RANGE);
                    corrections.push(((peer.id().to_string(), correction), time));
                }
                Err(e) => {
                    tracing::warn!(
                        target: "ipmdar::arbitration",
                        peer = peer.id(),
                        error = %e,
                        "correction failed"
                    );
                    analyses.insert(peer.id().to_string(), ANALYSIS_FALLBACK.to_string());
                }
            }
        }

        let correction = select_fastest(corrections).map(|(entry, _)| entry);
        CompetitionOutcome::Decided(CompetitionResult {
            winner: winner.id().to_string(),
            winning_time,
            winning_response,
            winning_provider: winner.provider(),
            analyses,
            correction_needed: correction.is_some(),
            correction_winner: correction.as_ref().map(|(id, _)| id.clone()),
            correction_response: correction.map(|(_, text)| text),
        })
    }
}
