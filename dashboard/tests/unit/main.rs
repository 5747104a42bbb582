//! Integration tests

mod test_builder;
mod test_http;
mod test_tracker;
