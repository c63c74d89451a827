use std::sync::Arc;

use tracing::{error, info};

use civicbot_common::{Intent, NewReport, Priority};
use civicbot_nlp::{classify, extract};
use civicbot_store::ReportStore;

use crate::fusion;
use crate::geocode::{Geocoder, LocationResolver};
use crate::image::ImageAnalyzer;
use crate::replies::{ReportAck, ResponseSynthesizer};

/// One inbound event from the messaging channel.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub sender_id: String,
    pub body: String,
    pub media_url: Option<String>,
}

/// Runs one inbound message through the full pipeline and always produces
/// a reply — collaborator failures degrade to fallbacks, and persistence
/// failures degrade to an apology rather than a false success.
pub struct MessageHandler<G> {
    store: Arc<dyn ReportStore>,
    images: ImageAnalyzer,
    locations: LocationResolver<G>,
    replies: ResponseSynthesizer,
}

impl<G: Geocoder> MessageHandler<G> {
    pub fn new(
        store: Arc<dyn ReportStore>,
        images: ImageAnalyzer,
        locations: LocationResolver<G>,
        replies: ResponseSynthesizer,
    ) -> Self {
        Self {
            store,
            images,
            locations,
            replies,
        }
    }

    pub async fn handle(&self, msg: &InboundMessage) -> String {
        let intent = classify(&msg.body, msg.media_url.is_some());
        info!(sender = msg.sender_id.as_str(), intent = ?intent, "Handling inbound message");

        match intent {
            Intent::Greeting => self.replies.greeting(),
            Intent::Help => self.replies.help(),
            Intent::Thanks => self.replies.thanks(),
            Intent::Unclear => self.replies.unclear(),
            Intent::StatusCheck => self.handle_status_check(&msg.body).await,
            Intent::Report => self.handle_report(msg).await,
        }
    }

    async fn handle_status_check(&self, body: &str) -> String {
        let Some(id) = parse_report_id(body) else {
            return self.replies.status_reply(None, None);
        };

        match self.store.get(id).await {
            Ok(report) => self.replies.status_reply(report.as_ref(), Some(id)),
            Err(e) => {
                error!(error = %e, report_id = id, "Status lookup failed");
                self.replies.failure()
            }
        }
    }

    async fn handle_report(&self, msg: &InboundMessage) -> String {
        let text = extract(&msg.body);

        let image = match &msg.media_url {
            Some(url) => Some(self.images.analyze(url).await),
            None => None,
        };

        let fused = fusion::resolve(&text, image.as_ref());
        let coordinates = self.locations.resolve(&text.location).await;

        let description = if msg.body.trim().is_empty() {
            "Photo report".to_string()
        } else {
            msg.body.clone()
        };

        let new = NewReport::builder()
            .reporter_id(msg.sender_id.clone())
            .issue_type(fused.issue_type)
            .description(description)
            .location_text(text.location.clone())
            .coordinates(coordinates)
            .image_reference(msg.media_url.clone())
            .department(fused.issue_type.department())
            .priority(Priority::from_urgency(text.urgency))
            .build();

        match self.store.create(new).await {
            Ok(report_id) => {
                info!(
                    report_id,
                    issue = %fused.issue_type,
                    location = text.location.as_str(),
                    urgency = %text.urgency,
                    geocoded = coordinates.is_some(),
                    "Report created"
                );
                self.replies.report_ack(&ReportAck {
                    report_id,
                    issue_type: fused.issue_type,
                    location: text.location,
                    department: fused.issue_type.department(),
                    urgency: text.urgency,
                    confidence: fused.confidence,
                    has_photo: msg.media_url.is_some(),
                })
            }
            Err(e) => {
                error!(error = %e, sender = msg.sender_id.as_str(), "Failed to persist report");
                self.replies.failure()
            }
        }
    }
}

/// First contiguous run of digits in the message, if any.
fn parse_report_id(body: &str) -> Option<i64> {
    let digits: String = body
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_and_embedded_ids() {
        assert_eq!(parse_report_id("123"), Some(123));
        assert_eq!(parse_report_id("status of 42 please"), Some(42));
        assert_eq!(parse_report_id("  #7  "), Some(7));
        assert_eq!(parse_report_id("any update?"), None);
        assert_eq!(parse_report_id(""), None);
    }
}
