pub mod app;
pub mod clock;
pub mod config;
pub mod controller;
pub mod dates;
pub mod errors;
pub mod handlers;
pub mod history;
pub mod models;
pub mod state;
pub mod storage;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use controller::JournalController;
pub use state::AppState;
pub use storage::FileStore;
