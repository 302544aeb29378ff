//! Spam score sampling through a third-party scoring service

use crate::{
    client::{new_correlation_id, MailTransport, ReportFetcher, TestMessage},
    error::Result,
    models::{Config, ProbeEndpoint, SpamScoreSettings},
    store::{epoch_seconds, MetricsStore},
    types::Direction,
};
use regex::{Captures, Regex};
use std::sync::Arc;

/// Highest score the service hands out
pub const MAX_SPAM_SCORE: u8 = 10;

/// Reduces a report page to visible text and finds the score in it
#[derive(Debug, Clone)]
pub struct ReportParser {
    hidden_blocks: Regex,
    comments: Regex,
    tags: Regex,
    numeric_entities: Regex,
    score: Regex,
}

impl ReportParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            hidden_blocks: Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)\s*>")?,
            comments: Regex::new(r"(?s)<!--.*?-->")?,
            tags: Regex::new(r"(?s)<[^>]*>")?,
            numeric_entities: Regex::new(r"&#(?:([0-9]{1,7})|[xX]([0-9a-fA-F]{1,6}));")?,
            score: Regex::new(r"(?i)Your lovely total:\s*(\d+)(?:\.\d+)?/\d+")?,
        })
    }

    /// Visible text of an HTML document: scripts, styles, comments and tags
    /// dropped, common entities decoded
    pub fn extract_text(&self, html: &str) -> String {
        let text = self.hidden_blocks.replace_all(html, "");
        let text = self.comments.replace_all(&text, "");
        let text = self.tags.replace_all(&text, "");
        let text = self.numeric_entities.replace_all(&text, |caps: &Captures| {
            let code = match (caps.get(1), caps.get(2)) {
                (Some(dec), _) => dec.as_str().parse::<u32>().ok(),
                (None, Some(hex)) => u32::from_str_radix(hex.as_str(), 16).ok(),
                _ => None,
            };
            code.and_then(char::from_u32).map(String::from).unwrap_or_default()
        });

        text.replace("&nbsp;", " ")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#39;", "'")
            .replace("&apos;", "'")
            .replace("&amp;", "&")
    }

    /// Integer part of the total score, clamped to [`MAX_SPAM_SCORE`].
    /// `None` when the page carries no score.
    pub fn parse_score(&self, text: &str) -> Option<u8> {
        let caps = self.score.captures(text)?;
        // Only digits are captured, so parsing fails on overflow alone
        let score = caps[1]
            .parse::<u64>()
            .map(|value| value.min(u64::from(MAX_SPAM_SCORE)) as u8)
            .unwrap_or(MAX_SPAM_SCORE);
        Some(score)
    }

    /// Score of an HTML report page
    pub fn score_from_html(&self, html: &str) -> Option<u8> {
        self.parse_score(&self.extract_text(html))
    }
}

/// Sends a probe to the scoring service and reads back the verdict
pub struct SpamScoreProbe {
    transport: Arc<dyn MailTransport>,
    store: Arc<MetricsStore>,
    sender: ProbeEndpoint,
    settings: SpamScoreSettings,
    fetcher: ReportFetcher,
    parser: ReportParser,
}

impl SpamScoreProbe {
    /// Probe sending from the internal side to the configured intake address
    pub fn new(config: &Config, transport: Arc<dyn MailTransport>, store: Arc<MetricsStore>) -> Result<Self> {
        Ok(Self {
            transport,
            store,
            sender: config.internal.clone(),
            settings: config.spam_score.clone(),
            fetcher: ReportFetcher::new(config.timeout())?,
            parser: ReportParser::new()?,
        })
    }

    /// Fetch `report_url` and extract the score. Any failure yields 0.
    pub async fn extract_score(&self, report_url: &str) -> u8 {
        let html = match self.fetcher.fetch(report_url).await {
            Ok(html) => html,
            Err(e) => {
                tracing::error!(url = report_url, "Error fetching spam score report: {}", e);
                return 0;
            }
        };

        match self.parser.score_from_html(&html) {
            Some(score) => {
                tracing::info!("Successfully parsed score: {}", score);
                score
            }
            None => {
                tracing::warn!(url = report_url, "Spam score report carries no score, recording 0");
                0
            }
        }
    }

    /// Send one probe to the intake address, then read and record the score
    pub async fn run(&self) -> u8 {
        let correlation_id = new_correlation_id();
        tracing::info!("Starting spam score test with ID: {}", correlation_id);
        tracing::info!(
            "Sending email to spam score test from {} to {}",
            self.sender.address,
            self.settings.intake_address
        );

        let message = TestMessage::new(correlation_id.as_str(), &self.sender.address, &self.settings.intake_address);
        let sent = match self.transport.submit(&self.sender, &message).await {
            Ok(()) => {
                tracing::info!("Successfully sent test email with ID: {}", correlation_id);
                true
            }
            Err(e) => {
                tracing::error!("Failed to send test email: {}", e);
                false
            }
        };
        // The intake submission leaves through the internal side
        self.store.record_send(Direction::InternalToExternal, sent);

        tracing::info!("Retrieving spam score from url {}", self.settings.report_url);
        let score = self.extract_score(&self.settings.report_url).await;
        self.store.record_spam_score(score, epoch_seconds());

        score
    }
}
