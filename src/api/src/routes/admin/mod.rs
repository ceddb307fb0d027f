mod convocatoria;
mod dashboard;
mod logout;
mod registries;

pub use convocatoria::*;
pub use dashboard::admin_dashboard;
pub use logout::log_out;
pub use registries::*;
