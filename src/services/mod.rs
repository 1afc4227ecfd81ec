pub mod attempt_service;
pub mod export_service;
pub mod grading_service;
pub mod import_service;
pub mod platform_client;
pub mod sample_service;
pub mod session_service;
