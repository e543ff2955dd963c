//! Urgency evaluation: fixed-unit duration decomposition plus the colour and
//! time-status classifiers. Everything here is pure.

mod classify;
mod duration;

pub use classify::{classify_color, classify_time_status};
pub use duration::{
    DAY_MS, HOUR_MS, MINUTE_MS, MONTH_MS, SECOND_MS, YEAR_MS, decompose, parse_interval,
};
