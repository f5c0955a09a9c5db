mod config_cmd;
mod particle;
mod serve;
mod sync_cmd;
mod toggl;

pub use config_cmd::ConfigCommand;
pub use particle::ParticleCommand;
pub use serve::ServeCommand;
pub use sync_cmd::SyncCommand;
pub use toggl::TogglCommand;
