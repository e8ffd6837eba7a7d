pub mod image_store;

use chrono::{Local, NaiveDate};

/// The server's local calendar date, used wherever the workflow asks for `today`.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
