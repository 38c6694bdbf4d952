pub mod activity_service;
pub mod backup_service;
pub mod building_service;
pub mod fieldwork_service;
pub mod notification_service;
pub mod report_service;
pub mod session_service;
pub mod setup_service;
pub mod territory_service;
pub mod user_service;
pub mod visit_service;
