//! Command implementations.

pub mod document;
pub mod milestone;
pub mod project;
pub mod questions;
pub mod session;

pub use self::document::execute_document;
pub use self::milestone::execute_milestone;
pub use self::project::execute_project;
pub use self::questions::execute_questions;
pub use self::session::execute_session;
