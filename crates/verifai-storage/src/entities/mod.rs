pub mod audit_log;
pub mod batch_job;
pub mod chat_message;
pub mod setting;
pub mod vector_document;
pub mod verification;
