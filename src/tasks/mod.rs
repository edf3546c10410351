mod debug_task;
mod flight_phase_task;
mod gps_task;
mod ground_link_task;
mod pressure_task;
mod sensor_task;
mod telemetry_task;

pub use debug_task::debug_task;
pub use flight_phase_task::flight_phase_task;
pub use gps_task::gps_task;
pub use ground_link_task::ground_link_task;
pub use pressure_task::pressure_task;
pub use sensor_task::sensor_task;
pub use telemetry_task::telemetry_task;
