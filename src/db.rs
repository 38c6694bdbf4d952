pub mod activity_repo;
pub use activity_repo::ActivityRepository;
pub mod assignment_repo;
pub use assignment_repo::AssignmentRepository;
pub mod building_repo;
pub use building_repo::BuildingRepository;
pub mod notification_repo;
pub use notification_repo::NotificationRepository;
pub mod outing_repo;
pub use outing_repo::OutingRepository;
pub mod report_repo;
pub use report_repo::ReportRepository;
pub mod schema_repo;
pub use schema_repo::SchemaRepository;
pub mod session_repo;
pub use session_repo::SessionRepository;
pub mod territory_repo;
pub use territory_repo::TerritoryRepository;
pub mod user_repo;
pub use user_repo::UserRepository;
pub mod visit_repo;
pub use visit_repo::VisitRepository;
