//! Morning briefing: prompt, marker protocol, transport and conversation driver

pub mod commit;
pub mod decoder;
pub mod driver;
pub mod marker;
pub mod prompt;
pub mod transport;
pub mod types;

pub use commit::BriefingCommitter;
pub use decoder::Utf8StreamDecoder;
pub use driver::{BriefingDriver, BriefingEvent, BriefingState, APOLOGY_MESSAGE, OPENING_MESSAGE};
pub use marker::{parse_selection, strip_selection, SELECTION_CLOSE, SELECTION_OPEN};
pub use prompt::{build_system_prompt, render_task_list};
pub use transport::{BriefingTransport, ByteStream, HttpBriefingTransport};
pub use types::{BriefingRequest, BriefingResult, Message, Role};
