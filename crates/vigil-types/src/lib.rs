pub mod api;
pub mod jalali;
pub mod models;
