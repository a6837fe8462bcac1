pub mod datetime_input;
pub mod popup;
