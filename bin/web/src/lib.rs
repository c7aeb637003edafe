//! DeadSimpleML web console.
//!
//! This crate provides the Leptos-based web interface for DeadSimpleML:
//! the access gate around the whole console, capability guards for
//! individual features, and the landing and settings pages.

#![allow(non_snake_case)]

pub mod app;
pub mod auth;
#[cfg(feature = "ssr")]
pub mod config;
#[cfg(feature = "ssr")]
pub mod error;
pub mod pages;
pub mod user;

#[cfg(feature = "hydrate")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn hydrate() {
    use crate::app::App;
    console_error_panic_hook::set_once();
    leptos::mount::hydrate_body(App);
}
