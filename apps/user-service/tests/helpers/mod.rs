#![allow(dead_code)]

pub mod app_test_builder;

pub use app_test_builder::{AppTestBuilder, TestApp, TestResponse};
