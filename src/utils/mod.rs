pub mod logging;

pub use logging::{truncate_text, truncate_words};
