//! Line-oriented text buffer with cursor navigation, directional search,
//! and search-gated line edits.
//!
//! A [`Buffer`] is threaded through a chain of operations, each consuming
//! the previous value and returning the next. A failed search flips the
//! status to [`Status::NotFound`], which turns later edits into no-ops until
//! the cursor is moved or a search succeeds.
pub mod buffer;
pub mod encoding;
pub mod io;
pub mod script;
pub mod search;

pub use buffer::{Buffer, Status};
pub use encoding::TextEncoding;
pub use io::SourceFile;
pub use script::{Command, Script, Session};
pub use search::{Direction, LineMatcher, Pattern, SearchOptions};
