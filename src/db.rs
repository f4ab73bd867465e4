pub mod user_repo;
pub use user_repo::UserRepository;
pub mod tenancy_repo;
pub use tenancy_repo::OrganizationRepository;
pub mod store_repo;
pub use store_repo::StoreRepository;
pub mod item_repo;
pub use item_repo::ItemRepository;
pub mod history_repo;
pub use history_repo::HistoryRepository;
pub mod store_access_repo;
pub use store_access_repo::StoreAccessRepository;
