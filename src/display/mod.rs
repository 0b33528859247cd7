pub mod leds;
pub mod settings;

pub use leds::{FlashReason, LedController, LedZone};
pub use settings::{Claim, LcdSettings, PanelButton, SettingsMode, SettingsSession};
