pub mod analytics_service;
pub mod assignment_engine;
pub mod audit_service;
pub mod comment_service;
pub mod error;
pub mod notification_service;
pub mod ticket_service;
