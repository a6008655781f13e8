pub mod chat;
pub mod feedback;
pub mod summary;
pub mod template;
pub mod transcription;

pub use chat::*;
pub use feedback::*;
pub use summary::*;
pub use template::*;
pub use transcription::*;
