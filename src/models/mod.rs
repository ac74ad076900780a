pub mod file_record;
pub mod organization;
pub mod session;

pub use file_record::{BlobRef, FileKind, FileRecord};
pub use generated_test::{GeneratedTest, QuestionCount};
pub use organization::Organization;
pub use session::{DialogState, Session};
