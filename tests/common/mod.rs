#![allow(dead_code)]

pub mod fake_service;

pub use fake_service::{FakeService, RecordedRequest};
