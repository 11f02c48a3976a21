pub mod health;
pub mod ui_device;
