use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use civicbot_common::{Department, IssueType, Report, ReportStatus, Urgency};

/// Below this confidence the ack carries a calibration disclaimer.
const CONFIDENCE_DISCLAIMER_THRESHOLD: f32 = 0.7;

// ---------------------------------------------------------------------------
// Template pools
// ---------------------------------------------------------------------------

const REPORT_ACK: [&str; 3] = [
    "✅ *Report received!*\n\nI've logged the {issue} at {location}.\n*Report ID:* #{id}\n\nOur {department} team has been notified. Thank you for your report! 🏘️",
    "📋 *Thank you for reporting!*\n\nYour {issue} issue at {location} is now documented.\n*Tracking ID:* #{id}\n\nThe {department} team will work on resolving this. 🌟",
    "🎯 *Report submitted!*\n\nThe {issue} at {location} has been recorded.\n*Reference ID:* #{id}\n\nThanks for helping keep the neighborhood great! 🙌",
];

const URGENT_ACK: [&str; 3] = [
    "🚨 *Urgent report logged!*\n\nI've prioritized the {issue} at {location}.\n*Report ID:* #{id}\n\nThe {department} team has been alerted for quick action.",
    "🚨 I can see this {issue} at {location} needs immediate attention.\n*Report ID:* #{id}\n\nI've marked it high priority and notified {department}.",
    "🚨 *Understood — treating this as urgent.*\n\nReport #{id} for the {issue} at {location} has been escalated to {department}.",
];

const PHOTO_ACK: [&str; 3] = [
    "📸 *Photo received!*\n\nI've logged your {issue} report at {location}.\n*Report ID:* #{id}\n\nThe photo helps our {department} team assess the situation. 🎯",
    "📸 *Great photo, thanks!*\n\nYour {issue} report at {location} is documented.\n*Tracking ID:* #{id}\n\nThe visual evidence makes this much easier to evaluate. 👍",
    "📸 *Visual evidence captured!*\n\nReport #{id} has been created for the {issue} at {location} and routed to {department}. 📝",
];

/// Appended when an urgent report also carried a photo (the urgent pool has
/// no photo acknowledgment of its own).
const PHOTO_NOTE: [&str; 2] = [
    "📸 Your photo is attached to the report.",
    "📸 The photo you sent has been included for the crew.",
];

const URGENCY_NOTE: [&str; 2] = [
    "⚠️ This looks like it may need prompt attention — I've flagged it for follow-up.",
    "⚠️ I've flagged this for follow-up since it could be hazardous.",
];

const CONFIDENCE_NOTE: [&str; 2] = [
    "By the way, I'm about {pct}% sure about the issue type — the team will verify.",
    "Quick note: I'm {pct}% confident in this classification, so our team will double-check.",
];

const PHOTO_TIP: [&str; 2] = [
    "💡 *Pro tip:* include a photo next time for faster resolution! 📸",
    "📸 *Helpful hint:* photos help us understand issues better!",
];

const GREETING: [&str; 3] = [
    "👋 Hello! I'm CivicBot, your neighborhood assistant. I can help you report potholes, garbage problems, street light outages, and more. What would you like to report today?",
    "Hi there! 😊 CivicBot here, ready to help with any community concerns. What issue would you like to report?",
    "Hey! I'm CivicBot. Tell me what you're seeing and where — I'll take care of logging it. What's on your mind?",
];

const HELP: [&str; 2] = [
    "🆘 *Here's how I can help:*\n\n🕳️ Potholes & road damage\n🗑️ Garbage & sanitation issues\n💡 Street light problems\n💧 Water leaks & flooding\n🚦 Traffic signal trouble\n🎨 Graffiti & vandalism\n\n*Just send me:*\n• A description of the issue\n• The location (like 'on Main Street')\n• A photo if possible! 📸\n\nYou can also send a report number to check its status.",
    "I'm your community reporting assistant! I understand natural language, so just say things like:\n\n\"There's a large pothole on Main Street\"\n\"Garbage overflowing on Oak Avenue\"\n\"Street light out at 5th and Elm\"\n\nInclude a location and a photo when you can — I'll handle the rest. Send a report number any time to check on its status. 📷",
];

const THANKS: [&str; 4] = [
    "You're very welcome! 😊 I'm happy to help make our community better.",
    "My pleasure! Thanks for being an awesome community member! 🌟",
    "You're welcome! Together we can keep our neighborhood great!",
    "Happy to help! Don't hesitate to report any other issues you see! 🏘️",
];

const UNCLEAR: [&str; 3] = [
    "I'm not quite sure what you'd like to report. Could you describe the issue? For example: \"pothole on Main Street\" or \"street light out on 5th Avenue\".",
    "I want to make sure I help with the right thing! Could you tell me more about what you're seeing? Potholes, garbage problems, and street light issues are what I handle best.",
    "Let me help you report that! Could you share a bit more detail about the issue and its location? For example: \"There's a large pothole on Maple Street.\"",
];

const FAILURE: [&str; 3] = [
    "🤖 Oops! I'm having trouble saving your report right now. Please try again in a moment — nothing was lost on your side.",
    "⚠️ Sorry, something went wrong on my end and your report wasn't saved. Please send it again in a minute.",
    "❌ My apologies — a temporary issue stopped me from filing that. Please try your report again shortly.",
];

const NOT_FOUND: [&str; 2] = [
    "❌ I couldn't find a report with ID #{id}. Please check the number and try again — or type 'help' if you're stuck.",
    "❌ Hmm, report #{id} doesn't seem to exist. Double-check the number and try again?",
];

const ASK_FOR_ID: [&str; 2] = [
    "Happy to check on a report! Reply with just the report number (for example: 42).",
    "Which report should I look up? Send me the report ID number and I'll check.",
];

const RECEIVED_NOTE: [&str; 2] = [
    "It's in the queue awaiting review — the team will look at it soon!",
    "It's been received and is waiting for assessment. Thanks for your patience! 🙏",
];

const IN_PROGRESS_NOTE: [&str; 2] = [
    "Good news — the team is actively working on it! 🔄",
    "Our crew is on it and making headway.",
];

const RESOLVED_NOTE: [&str; 2] = [
    "It's been resolved! Thanks for helping improve the community! 🎉",
    "All done — the issue has been addressed. Your report made a difference!",
];

const ARCHIVED_NOTE: [&str; 2] = [
    "This one was resolved and has since been archived.",
    "It was resolved a while back and is now archived.",
];

// ---------------------------------------------------------------------------
// Synthesizer
// ---------------------------------------------------------------------------

/// Context for a report acknowledgment.
#[derive(Debug, Clone)]
pub struct ReportAck {
    pub report_id: i64,
    pub issue_type: IssueType,
    pub location: String,
    pub department: Department,
    pub urgency: Urgency,
    pub confidence: f32,
    pub has_photo: bool,
}

/// Turns pipeline outcomes into human-facing text. Phrasing variants are
/// picked uniformly at random from fixed pools — presentation variety only,
/// with no influence on stored data. Seedable for deterministic tests.
pub struct ResponseSynthesizer {
    rng: Mutex<StdRng>,
}

impl ResponseSynthesizer {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn pick<'a>(&self, pool: &[&'a str]) -> &'a str {
        let mut rng = self.rng.lock().expect("rng lock poisoned");
        pool[rng.random_range(0..pool.len())]
    }

    pub fn report_ack(&self, ack: &ReportAck) -> String {
        let pool: &[&str] = if ack.urgency == Urgency::High {
            &URGENT_ACK
        } else if ack.has_photo {
            &PHOTO_ACK
        } else {
            &REPORT_ACK
        };

        let mut reply = fill_ack(self.pick(pool), ack);

        if ack.urgency == Urgency::High && ack.has_photo {
            reply.push_str("\n\n");
            reply.push_str(self.pick(&PHOTO_NOTE));
        }

        if ack.urgency == Urgency::Medium {
            reply.push_str("\n\n");
            reply.push_str(self.pick(&URGENCY_NOTE));
        }

        if ack.confidence < CONFIDENCE_DISCLAIMER_THRESHOLD {
            let pct = (ack.confidence * 100.0).round() as i32;
            reply.push_str("\n\n");
            reply.push_str(&self.pick(&CONFIDENCE_NOTE).replace("{pct}", &pct.to_string()));
        }

        if !ack.has_photo {
            reply.push_str("\n\n");
            reply.push_str(self.pick(&PHOTO_TIP));
        }

        reply
    }

    pub fn status_reply(&self, report: Option<&Report>, requested_id: Option<i64>) -> String {
        let Some(report) = report else {
            return match requested_id {
                Some(id) => self.pick(&NOT_FOUND).replace("{id}", &id.to_string()),
                None => self.pick(&ASK_FOR_ID).to_string(),
            };
        };

        let note = match report.status {
            ReportStatus::Received => self.pick(&RECEIVED_NOTE),
            ReportStatus::InProgress => self.pick(&IN_PROGRESS_NOTE),
            ReportStatus::Resolved => self.pick(&RESOLVED_NOTE),
            ReportStatus::Archived => self.pick(&ARCHIVED_NOTE),
        };

        format!(
            "📋 *Report #{id}*\n\n*Issue:* {issue}\n*Location:* {location}\n*Status:* {status}\n*Submitted:* {date}\n\n{note}",
            id = report.id,
            issue = report.issue_type.human_label(),
            location = report.location_text,
            status = report.status.human_label(),
            date = report.created_at.format("%Y-%m-%d"),
        )
    }

    pub fn greeting(&self) -> String {
        self.pick(&GREETING).to_string()
    }

    pub fn help(&self) -> String {
        self.pick(&HELP).to_string()
    }

    pub fn thanks(&self) -> String {
        self.pick(&THANKS).to_string()
    }

    pub fn unclear(&self) -> String {
        self.pick(&UNCLEAR).to_string()
    }

    pub fn failure(&self) -> String {
        self.pick(&FAILURE).to_string()
    }
}

impl Default for ResponseSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

fn fill_ack(template: &str, ack: &ReportAck) -> String {
    template
        .replace("{issue}", ack.issue_type.human_label())
        .replace("{location}", &ack.location)
        .replace("{id}", &ack.report_id.to_string())
        .replace("{department}", ack.department.human_label())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn ack() -> ReportAck {
        ReportAck {
            report_id: 7,
            issue_type: IssueType::Pothole,
            location: "Main Street".to_string(),
            department: Department::PublicWorks,
            urgency: Urgency::Normal,
            confidence: 1.0,
            has_photo: false,
        }
    }

    fn report(status: ReportStatus) -> Report {
        Report {
            id: 42,
            reporter_id: "+15551234567".to_string(),
            issue_type: IssueType::StreetLight,
            description: "light out on Elm".to_string(),
            location_text: "Elm Street".to_string(),
            coordinates: None,
            image_reference: None,
            department: Department::PublicWorks,
            status,
            priority: civicbot_common::Priority::Medium,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            resolved_at: None,
        }
    }

    #[test]
    fn same_seed_is_deterministic() {
        let a = ResponseSynthesizer::seeded(11);
        let b = ResponseSynthesizer::seeded(11);
        assert_eq!(a.report_ack(&ack()), b.report_ack(&ack()));
        assert_eq!(a.greeting(), b.greeting());
    }

    #[test]
    fn ack_carries_issue_location_and_id() {
        let synth = ResponseSynthesizer::seeded(3);
        let reply = synth.report_ack(&ack());
        assert!(reply.contains("pothole"));
        assert!(reply.contains("Main Street"));
        assert!(reply.contains("#7"));
        assert!(reply.contains("Public Works"));
    }

    #[test]
    fn high_urgency_uses_urgent_marker() {
        let synth = ResponseSynthesizer::seeded(3);
        let reply = synth.report_ack(&ReportAck {
            urgency: Urgency::High,
            ..ack()
        });
        assert!(reply.contains("🚨"));
    }

    #[test]
    fn medium_urgency_appends_flag_note() {
        let synth = ResponseSynthesizer::seeded(3);
        let reply = synth.report_ack(&ReportAck {
            urgency: Urgency::Medium,
            ..ack()
        });
        assert!(reply.contains("⚠️"));
    }

    #[test]
    fn low_confidence_appends_percentage_disclaimer() {
        let synth = ResponseSynthesizer::seeded(3);
        let reply = synth.report_ack(&ReportAck {
            confidence: 0.45,
            ..ack()
        });
        assert!(reply.contains("45%"));

        let confident = synth.report_ack(&ack());
        assert!(!confident.contains('%'));
    }

    #[test]
    fn photo_reports_acknowledge_the_image() {
        let synth = ResponseSynthesizer::seeded(3);
        let reply = synth.report_ack(&ReportAck {
            has_photo: true,
            ..ack()
        });
        assert!(reply.contains("📸"));

        let urgent_with_photo = synth.report_ack(&ReportAck {
            has_photo: true,
            urgency: Urgency::High,
            ..ack()
        });
        assert!(urgent_with_photo.contains("🚨"));
        assert!(urgent_with_photo.contains("📸"));
    }

    #[test]
    fn status_reply_includes_the_essentials() {
        let synth = ResponseSynthesizer::seeded(3);
        let reply = synth.status_reply(Some(&report(ReportStatus::InProgress)), Some(42));
        assert!(reply.contains("#42"));
        assert!(reply.contains("street light"));
        assert!(reply.contains("Elm Street"));
        assert!(reply.contains("In Progress"));
    }

    #[test]
    fn missing_report_yields_not_found() {
        let synth = ResponseSynthesizer::seeded(3);
        let reply = synth.status_reply(None, Some(123));
        assert!(reply.contains("#123"));
        assert!(reply.contains("❌"));
    }

    #[test]
    fn status_check_without_id_asks_for_one() {
        let synth = ResponseSynthesizer::seeded(3);
        let reply = synth.status_reply(None, None);
        assert!(ASK_FOR_ID.contains(&reply.as_str()));
    }

    #[test]
    fn fixed_pool_replies_come_from_their_pools() {
        let synth = ResponseSynthesizer::seeded(9);
        assert!(THANKS.contains(&synth.thanks().as_str()));
        assert!(GREETING.contains(&synth.greeting().as_str()));
        assert!(UNCLEAR.contains(&synth.unclear().as_str()));
        assert!(FAILURE.contains(&synth.failure().as_str()));
    }
}
