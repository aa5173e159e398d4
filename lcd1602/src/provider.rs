//! Acquisition of the display lines from the platform.
use crate::bus::ParallelBus;
use crate::error::SetupError;
use lcd1602_gpio::{GpioDirection, GpioDriver, GpioLine};
use log::debug;

pub const DATA_LINES: usize = 8;

/// Role of a control line of the display.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ControlRole {
    RegisterSelect,
    ReadWrite,
    Enable,
}

/// Source of the lines a display is wired to.
///
/// All lines are handed out as outputs driven low. They are released when dropped.
pub trait LineProvider {
    fn acquire_control_line(&self, role: ControlRole) -> Result<Box<dyn GpioLine + '_>, SetupError>;

    /// Acquires the data lines, D0 first.
    fn acquire_data_bus(&self) -> Result<[Box<dyn GpioLine + '_>; DATA_LINES], SetupError>;

    /// Acquires every line and assembles the bus.
    fn acquire_bus(&self) -> Result<ParallelBus<'_>, SetupError> {
        let rs = self.acquire_control_line(ControlRole::RegisterSelect)?;
        let rw = self.acquire_control_line(ControlRole::ReadWrite)?;
        let e = self.acquire_control_line(ControlRole::Enable)?;
        let data = self.acquire_data_bus()?;
        Ok(ParallelBus::new(rs, rw, e, data))
    }
}

/// Line offsets of a display on one chip.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PinMap {
    pub rs: usize,
    pub rw: usize,
    pub e: usize,
    /// Data line offsets, D0 first. Must hold exactly [DATA_LINES] entries.
    pub data: Vec<usize>,
}

/// [LineProvider] taking the lines of a [PinMap] from a [GpioDriver].
#[derive(Debug)]
pub struct DriverLines<'d, D: GpioDriver> {
    driver: &'d D,
    pins: PinMap,
}

impl<'d, D: GpioDriver> DriverLines<'d, D> {
    pub fn new(driver: &'d D, pins: PinMap) -> Self {
        DriverLines { driver, pins }
    }

    pub fn pins(&self) -> &PinMap {
        &self.pins
    }
}

impl<D: GpioDriver> LineProvider for DriverLines<'_, D> {
    fn acquire_control_line(&self, role: ControlRole) -> Result<Box<dyn GpioLine + '_>, SetupError> {
        let index = match role {
            ControlRole::RegisterSelect => self.pins.rs,
            ControlRole::ReadWrite => self.pins.rw,
            ControlRole::Enable => self.pins.e,
        };
        debug!("Acquiring {:?} line {}", role, index);
        self.driver
            .get_line(index, GpioDirection::Output)
            .map_err(|source| SetupError::MissingLine { role, source })
    }

    fn acquire_data_bus(&self) -> Result<[Box<dyn GpioLine + '_>; DATA_LINES], SetupError> {
        if self.pins.data.len() != DATA_LINES {
            return Err(SetupError::WrongLineCount {
                expected: DATA_LINES,
                found: self.pins.data.len(),
            });
        }

        debug!("Acquiring data lines {:?}", self.pins.data);
        let lines = self
            .pins
            .data
            .iter()
            .enumerate()
            .map(|(bit, &index)| {
                self.driver
                    .get_line(index, GpioDirection::Output)
                    .map_err(|source| SetupError::MissingDataLine { bit, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        lines.try_into().map_err(|lines: Vec<_>| SetupError::WrongLineCount {
            expected: DATA_LINES,
            found: lines.len(),
        })
    }
}
