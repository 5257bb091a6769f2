pub mod app;
pub mod domain;
pub mod infra;

pub fn init() {
    infra::logging::init();
}
