mod strings;
mod time_status;

pub use strings::{ConfiguredStrings, EnglishStrings, StringProvider, TextKey};
pub use time_status::{FormatWindow, format_components, format_time_status};
