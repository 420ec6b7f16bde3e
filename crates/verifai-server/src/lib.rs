pub mod api;
pub mod app;
pub mod audit;
pub mod batch;
pub mod config;
pub mod logging;
pub mod openapi;
pub mod pipeline;
pub mod rag;
pub mod state;
