// Library exports for richtext-core

pub mod outline;
pub mod richtext;

pub use richtext::caret::{CaretPosition, CaretStyle, RichTextCaret, Selection};
pub use richtext::config::{EditorConfig, FontSizes};
pub use richtext::document::Document;
pub use richtext::editor::RichTextEditor;
pub use richtext::error::{ConfigError, EditError, EditResult};
pub use richtext::text_block::{BlockKind, TextBlock};
pub use richtext::text_soup::TextSoup;
pub use richtext::text_span::{SpanKind, TextSpan};
