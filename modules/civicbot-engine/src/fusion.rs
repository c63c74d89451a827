use civicbot_common::IssueType;
use civicbot_nlp::TextSignal;

use crate::image::ImageSignal;

/// The fused classification: the issue type that will be persisted, plus
/// the confidence of whichever signal supplied it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusedSignal {
    pub issue_type: IssueType,
    pub confidence: f32,
}

/// Combine text and image classification. Text is the default — it is
/// always present. The image signal takes over only when it carries an
/// actual issue type AND strictly beats the text confidence. No blending.
pub fn resolve(text: &TextSignal, image: Option<&ImageSignal>) -> FusedSignal {
    if let Some(image) = image {
        if let Some(image_issue) = image.issue_type {
            if image.confidence > text.confidence {
                return FusedSignal {
                    issue_type: image_issue,
                    confidence: image.confidence,
                };
            }
        }
    }

    FusedSignal {
        issue_type: text.issue_type,
        confidence: text.confidence,
    }
}
