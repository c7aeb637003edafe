//! Page components for the console.
//!
//! Each page is a Leptos component that renders a specific route. Pages are
//! only mounted for admitted principals.

pub mod home;
pub mod settings;

pub use home::HomePage;
pub use settings::SettingsPage;
