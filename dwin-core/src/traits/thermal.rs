//! Thermal collaborator

/// Heated parts the UI can address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Heater {
    Hotend,
    Bed,
}

/// Temperatures in whole degrees Celsius
pub trait Thermal {
    fn current(&self, heater: Heater) -> i16;
    fn target(&self, heater: Heater) -> i16;
    fn set_target(&mut self, heater: Heater, celsius: i16);
}
