use std::time::Duration;

use tracing::{debug, warn};

use civicbot_common::IssueType;
use vision_client::{AnnotateResult, VisionClient};

/// Service-reported confidence below this is ignored.
const VISION_CONFIDENCE_THRESHOLD: f32 = 0.7;

/// Basic-analysis quality cutoff: payloads above this size read as usable.
const GOOD_QUALITY_MIN_KB: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisSource {
    VisionApi,
    Basic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageQuality {
    Good,
    Poor,
}

/// What image analysis learned about an attachment. Always well-formed:
/// the basic fallback carries no classification but never an error.
#[derive(Debug, Clone)]
pub struct ImageSignal {
    pub issue_type: Option<IssueType>,
    pub confidence: f32,
    pub safe: bool,
    pub source: AnalysisSource,
    pub quality: Option<ImageQuality>,
}

impl ImageSignal {
    /// Payload-size heuristic used when the vision service is not
    /// configured or unavailable.
    fn basic(payload_len: usize) -> Self {
        let size_kb = payload_len as f64 / 1024.0;
        Self {
            issue_type: None,
            confidence: 0.0,
            safe: true,
            source: AnalysisSource::Basic,
            quality: Some(if size_kb > GOOD_QUALITY_MIN_KB {
                ImageQuality::Good
            } else {
                ImageQuality::Poor
            }),
        }
    }
}

struct VisualSpec {
    issue: IssueType,
    keywords: &'static [&'static str],
}

/// Label/object vocabulary tuned for what the vision service actually
/// returns — broader than the text keyword table, same issue types.
const VISUAL_TABLE: &[VisualSpec] = &[
    VisualSpec {
        issue: IssueType::Pothole,
        keywords: &["pothole", "road", "asphalt", "pavement", "damage", "crack"],
    },
    VisualSpec {
        issue: IssueType::Garbage,
        keywords: &["garbage", "trash", "litter", "waste", "rubbish", "dumpster", "bin"],
    },
    VisualSpec {
        issue: IssueType::Graffiti,
        keywords: &["graffiti", "vandalism", "spray paint", "tagging", "wall writing"],
    },
    VisualSpec {
        issue: IssueType::WaterIssue,
        keywords: &["water", "flood", "leak", "flooding", "pool", "puddle"],
    },
    VisualSpec {
        issue: IssueType::Traffic,
        keywords: &["car", "vehicle", "automobile", "accident", "traffic"],
    },
    VisualSpec {
        issue: IssueType::StreetLight,
        keywords: &["street light", "lamp", "light pole", "streetlight", "lamp post"],
    },
];

/// Map annotation labels and object names onto issue-type candidates.
fn classify_annotations(result: &AnnotateResult) -> ImageSignal {
    let mut candidates: Vec<(IssueType, f32)> = Vec::new();

    let annotations = result
        .label_annotations
        .iter()
        .map(|l| (l.description.as_str(), l.score))
        .chain(
            result
                .localized_object_annotations
                .iter()
                .map(|o| (o.name.as_str(), o.score)),
        );

    for (text, score) in annotations {
        if score <= VISION_CONFIDENCE_THRESHOLD {
            continue;
        }
        let lower = text.to_lowercase();
        for spec in VISUAL_TABLE {
            if spec.keywords.iter().any(|k| lower.contains(k)) {
                candidates.push((spec.issue, score));
            }
        }
    }

    // One candidate per type, best score wins, then rank by score.
    candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    let mut seen = Vec::new();
    candidates.retain(|(issue, _)| {
        if seen.contains(issue) {
            false
        } else {
            seen.push(*issue);
            true
        }
    });

    let (issue_type, confidence) = candidates
        .first()
        .map(|(issue, score)| (Some(*issue), *score))
        .unwrap_or((None, 0.0));

    ImageSignal {
        issue_type,
        confidence,
        safe: result
            .safe_search_annotation
            .as_ref()
            .map(|s| s.is_safe())
            .unwrap_or(true),
        source: AnalysisSource::VisionApi,
        quality: None,
    }
}

/// Image signal extractor. Downloads the attachment and, when a vision
/// credential is configured, runs it through the annotation service.
/// Every failure path degrades to the basic heuristic — analysis never
/// fails the pipeline.
pub struct ImageAnalyzer {
    http: reqwest::Client,
    vision: Option<VisionClient>,
}

impl ImageAnalyzer {
    pub fn new(vision_api_key: Option<&str>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            http,
            vision: vision_api_key.map(VisionClient::new),
        }
    }

    pub async fn analyze(&self, image_url: &str) -> ImageSignal {
        let payload = match self.download(image_url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, url = image_url, "Could not download attachment");
                return ImageSignal::basic(0);
            }
        };

        let Some(vision) = &self.vision else {
            debug!(
                payload_kb = payload.len() / 1024,
                "No vision credential, basic analysis only"
            );
            return ImageSignal::basic(payload.len());
        };

        match vision.annotate(&payload).await {
            Ok(result) => {
                let signal = classify_annotations(&result);
                debug!(
                    issue = ?signal.issue_type,
                    confidence = signal.confidence,
                    "Vision annotation complete"
                );
                signal
            }
            Err(e) => {
                warn!(error = %e, "Vision service unavailable, falling back to basic analysis");
                ImageSignal::basic(payload.len())
            }
        }
    }

    async fn download(&self, url: &str) -> anyhow::Result<Vec<u8>> {
        let resp = self.http.get(url).send().await?.error_for_status()?;
        Ok(resp.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vision_client::{LabelAnnotation, ObjectAnnotation, SafeSearchAnnotation};

    fn label(description: &str, score: f32) -> LabelAnnotation {
        LabelAnnotation {
            description: description.to_string(),
            score,
        }
    }

    #[test]
    fn labels_below_threshold_are_ignored() {
        let result = AnnotateResult {
            label_annotations: vec![label("pothole", 0.65)],
            ..Default::default()
        };
        let signal = classify_annotations(&result);
        assert_eq!(signal.issue_type, None);
        assert_eq!(signal.confidence, 0.0);
        assert_eq!(signal.source, AnalysisSource::VisionApi);
    }

    #[test]
    fn best_scoring_type_wins() {
        let result = AnnotateResult {
            label_annotations: vec![label("asphalt", 0.8), label("trash", 0.95)],
            ..Default::default()
        };
        let signal = classify_annotations(&result);
        assert_eq!(signal.issue_type, Some(IssueType::Garbage));
        assert_eq!(signal.confidence, 0.95);
    }

    #[test]
    fn duplicate_types_keep_highest_score() {
        let result = AnnotateResult {
            label_annotations: vec![label("road", 0.75), label("pothole", 0.92)],
            localized_object_annotations: vec![ObjectAnnotation {
                name: "asphalt".to_string(),
                score: 0.8,
            }],
            ..Default::default()
        };
        let signal = classify_annotations(&result);
        assert_eq!(signal.issue_type, Some(IssueType::Pothole));
        assert_eq!(signal.confidence, 0.92);
    }

    #[test]
    fn safe_search_flag_is_honored() {
        let result = AnnotateResult {
            safe_search_annotation: Some(SafeSearchAnnotation {
                adult: "LIKELY".to_string(),
                violence: "UNLIKELY".to_string(),
            }),
            ..Default::default()
        };
        assert!(!classify_annotations(&result).safe);
    }

    #[test]
    fn basic_fallback_reads_payload_size() {
        let small = ImageSignal::basic(10 * 1024);
        assert_eq!(small.quality, Some(ImageQuality::Poor));
        assert_eq!(small.issue_type, None);
        assert_eq!(small.confidence, 0.0);
        assert!(small.safe);

        let big = ImageSignal::basic(200 * 1024);
        assert_eq!(big.quality, Some(ImageQuality::Good));
        assert_eq!(big.source, AnalysisSource::Basic);
    }
}
