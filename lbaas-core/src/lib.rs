//! Load Balancer API Core Library
//!
//! This library provides the pieces every resource manager builds on:
//! - Configuration management
//! - The HTTP backend seam and its reqwest implementation
//! - Call recording and an in-memory stub service
//! - Shared error types

pub mod client;
pub mod config;

// Re-export commonly used types
pub use client::{
    ApiResponse, ClientError, HttpBackend, RecordedCall, RecordingBackend, RestClient,
    StubBackend,
};
pub use config::model::{Config, EndpointSettings, GlobalSettings};

/// 重新导出HTTP方法类型，调用方无需直接依赖reqwest
pub use reqwest::Method;
