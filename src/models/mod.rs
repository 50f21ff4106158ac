pub mod analyticsmodel;
pub mod auditmodel;
pub mod commentmodel;
pub mod notificationmodel;
pub mod performancemodel;
pub mod ticketmodel;
pub mod usermodel;
