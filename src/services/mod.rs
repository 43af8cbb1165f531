pub mod auth_service;
pub mod reservation_service;

pub use auth_service::AuthService;
pub use reservation_service::ReservationService;
