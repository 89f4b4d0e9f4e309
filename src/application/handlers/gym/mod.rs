//! Gym settings handlers.

mod save_gym_settings;

pub use save_gym_settings::{SaveGymSettingsCommand, SaveGymSettingsHandler};
