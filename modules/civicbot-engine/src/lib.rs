//! The message-understanding pipeline: image signal extraction, signal
//! fusion, location resolution, response synthesis, and the handler that
//! runs an inbound message through all of it.

pub mod fusion;
pub mod geocode;
pub mod handler;
pub mod image;
pub mod replies;

pub use fusion::{resolve, FusedSignal};
pub use geocode::{Geocoder, LocationResolver};
pub use handler::{InboundMessage, MessageHandler};
pub use image::{AnalysisSource, ImageAnalyzer, ImageQuality, ImageSignal};
pub use replies::{ReportAck, ResponseSynthesizer};
