mod dispatcher;
mod orchestrator;

pub mod extractors;

pub use dispatcher::FormatDispatcher;
pub use extractors::{DocumentDecoder, StandardDecoders};
pub use orchestrator::{ExtractionEvent, ExtractionOrchestrator};
