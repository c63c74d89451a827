use std::sync::LazyLock;

use regex::Regex;

use civicbot_common::{IssueType, Urgency};

/// Sentinel location when no pattern matched. The location resolver treats
/// this (case-insensitively) as "do not geocode".
pub const UNKNOWN_LOCATION: &str = "Unknown";

/// What the text extractor learned from one message.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSignal {
    pub issue_type: IssueType,
    pub confidence: f32,
    pub location: String,
    pub urgency: Urgency,
    pub emergency: bool,
}

struct IssueSpec {
    issue: IssueType,
    keywords: &'static [&'static str],
    weight: f32,
    emergency: bool,
}

/// Keyword evidence table. Declaration order is the tie-break between
/// candidates with equal confidence, so the order here is load-bearing.
const ISSUE_TABLE: &[IssueSpec] = &[
    IssueSpec {
        issue: IssueType::Pothole,
        keywords: &[
            "pothole",
            "road damage",
            "street damage",
            "hole in road",
            "road hole",
            "asphalt damage",
            "cracked road",
            "road crack",
        ],
        weight: 1.0,
        emergency: false,
    },
    IssueSpec {
        issue: IssueType::Garbage,
        keywords: &[
            "garbage",
            "trash",
            "rubbish",
            "waste",
            "dump",
            "litter",
            "cleanup",
            "sanitation",
            "overflowing bin",
            "dumpster",
        ],
        weight: 0.9,
        emergency: false,
    },
    IssueSpec {
        issue: IssueType::StreetLight,
        keywords: &[
            "street light",
            "streetlight",
            "light out",
            "dark street",
            "lamp post",
            "light pole",
            "broken light",
            "flickering light",
        ],
        weight: 0.8,
        emergency: false,
    },
    IssueSpec {
        issue: IssueType::WaterIssue,
        keywords: &[
            "water leak",
            "flood",
            "leak",
            "pipe burst",
            "drainage",
            "sewage",
            "overflow",
            "water main",
            "flooding",
        ],
        weight: 1.0,
        emergency: true,
    },
    IssueSpec {
        issue: IssueType::Traffic,
        keywords: &[
            "traffic light",
            "stop light",
            "signal broken",
            "road block",
            "accident",
            "car crash",
            "congestion",
        ],
        weight: 1.0,
        emergency: true,
    },
    IssueSpec {
        issue: IssueType::Graffiti,
        keywords: &["graffiti", "vandalism", "spray paint", "tagging", "defaced"],
        weight: 0.7,
        emergency: false,
    },
];

/// Corroborating evidence bonus: a second keyword phrase of the same type.
const MULTI_KEYWORD_BONUS: f32 = 0.2;

const URGENCY_KEYWORDS: [&str; 7] = [
    "urgent",
    "emergency",
    "asap",
    "immediately",
    "critical",
    "dangerous",
    "hazard",
];

/// Ordered location patterns; the first one whose trimmed capture is longer
/// than five characters wins.
static LOCATION_PATTERNS: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)\b(?:at|on|near|around|beside|opposite)\s+([^,.!?]+)").unwrap(),
        Regex::new(r"(?i)\b(\d+\s+\w+\s+(?:street|st|avenue|ave|road|rd|boulevard|blvd|lane|ln))\b")
            .unwrap(),
        Regex::new(r"(?i)\b(?:location|address)[:\s]+([^,.!?]+)").unwrap(),
        Regex::new(r"(?i)\bin\s+([^,.!?]+?(?:area|neighborhood|district))").unwrap(),
    ]
});

const MIN_LOCATION_LEN: usize = 5;

/// Extract issue type, confidence, location, and urgency from free text.
/// Pure function — no I/O, deterministic for identical input.
pub fn extract(message: &str) -> TextSignal {
    let lower = message.to_lowercase();

    let mut best: Option<(IssueType, f32)> = None;
    let mut any_emergency = false;

    for spec in ISSUE_TABLE {
        let matched = spec.keywords.iter().filter(|k| lower.contains(*k)).count();
        if matched == 0 {
            continue;
        }

        let mut confidence = spec.weight;
        if matched > 1 {
            confidence = (confidence + MULTI_KEYWORD_BONUS).min(1.0);
        }
        any_emergency |= spec.emergency;

        // Strictly-greater keeps the earliest declared type on ties.
        if best.is_none_or(|(_, c)| confidence > c) {
            best = Some((spec.issue, confidence));
        }
    }

    let (issue_type, confidence) = best.unwrap_or((IssueType::Other, 0.0));

    let urgency = if URGENCY_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Urgency::High
    } else if any_emergency {
        Urgency::Medium
    } else {
        Urgency::Normal
    };

    TextSignal {
        issue_type,
        confidence,
        location: extract_location(message).unwrap_or_else(|| UNKNOWN_LOCATION.to_string()),
        urgency,
        emergency: urgency.is_elevated(),
    }
}

fn extract_location(message: &str) -> Option<String> {
    for pattern in LOCATION_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(message) {
            let candidate = caps[1].trim();
            if candidate.len() > MIN_LOCATION_LEN {
                return Some(title_case(candidate));
            }
        }
    }
    None
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
