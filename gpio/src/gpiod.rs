//! GpiodDriver implementation for managing GPIO lines using the gpiod library.
//!
//! The character device has no way to flip the direction of a requested line in place, so
//! [GpiodLine::set_direction] releases the request and requests the line again.
use crate::{GpioDirection, GpioDriver, GpioError, GpioLine, GpioResult};
use bitvec::vec::BitVec;
use log::trace;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::AtomicU8;

/// GpiodDriver is a GPIO driver that uses the gpiod library to manage GPIO lines.
pub struct GpiodDriver {
    chip: gpiod::Chip,
    used_lines: BitVec<AtomicU8>,
}

impl GpiodDriver {
    pub fn new(chip: gpiod::Chip) -> Self {
        let n = chip.num_lines() as usize;
        let bits = BitVec::repeat(false, n);
        Self {
            chip,
            used_lines: bits,
        }
    }

    fn request(&self, index: usize, direction: GpioDirection) -> GpioResult<GpiodRequest> {
        let offset = [index as u32];
        let request = match direction {
            GpioDirection::Input => GpiodRequest::Input(self.chip.request_lines(
                gpiod::Options::input(offset).consumer(env!("CARGO_PKG_NAME")),
            )?),
            GpioDirection::Output => {
                let lines = self.chip.request_lines(
                    gpiod::Options::output(offset).consumer(env!("CARGO_PKG_NAME")),
                )?;
                lines.set_values([false])?;
                GpiodRequest::Output(lines)
            }
        };
        trace!("{:?}[{}] requested as {:?}", self, index, direction);
        Ok(request)
    }
}

impl Debug for GpiodDriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "GpiodDriver({})", self.chip.name())
    }
}

impl GpioDriver for GpiodDriver {
    fn count(&self) -> GpioResult<usize> {
        Ok(self.chip.num_lines() as usize)
    }

    fn get_line(&self, index: usize, direction: GpioDirection) -> GpioResult<Box<dyn GpioLine + '_>> {
        if index >= self.count()? {
            return Err(GpioError::InvalidArgument);
        }

        if self.used_lines[index] {
            return Err(GpioError::AlreadyInUse);
        }

        let request = self.request(index, direction)?;
        self.used_lines.set_aliased(index, true);

        Ok(Box::new(GpiodLine {
            driver: self,
            index,
            request: Some(request),
            level: false,
        }))
    }
}

enum GpiodRequest {
    Input(gpiod::Lines<gpiod::Input>),
    Output(gpiod::Lines<gpiod::Output>),
}

impl GpiodRequest {
    fn direction(&self) -> GpioDirection {
        match self {
            GpiodRequest::Input(_) => GpioDirection::Input,
            GpiodRequest::Output(_) => GpioDirection::Output,
        }
    }
}

/// A single requested line. `request` is `None` only after a failed direction switch.
pub struct GpiodLine<'a> {
    driver: &'a GpiodDriver,
    index: usize,
    request: Option<GpiodRequest>,
    level: bool,
}

impl Debug for GpiodLine<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let direction = match &self.request {
            Some(request) => format!("{:?}", request.direction()),
            None => "released".to_string(),
        };
        write!(f, "{:?}[{}][{}]", self.driver, self.index, direction)
    }
}

impl GpioLine for GpiodLine<'_> {
    fn index(&self) -> usize {
        self.index
    }

    fn direction(&self) -> GpioDirection {
        match &self.request {
            Some(request) => request.direction(),
            None => GpioDirection::Input,
        }
    }

    fn set_direction(&mut self, direction: GpioDirection) -> GpioResult<()> {
        if self.request.as_ref().map(GpiodRequest::direction) == Some(direction) {
            return Ok(());
        }

        // The old request has to go before the line can be requested again.
        self.request = None;
        self.request = Some(self.driver.request(self.index, direction)?);
        self.level = false;
        Ok(())
    }

    fn write(&mut self, value: bool) -> GpioResult<()> {
        match &self.request {
            Some(GpiodRequest::Output(lines)) => {
                lines.set_values([value])?;
                self.level = value;
                Ok(())
            }
            _ => Err(GpioError::WrongDirection(GpioDirection::Output)),
        }
    }

    fn read(&self) -> GpioResult<bool> {
        match &self.request {
            Some(GpiodRequest::Input(lines)) => {
                let values = lines.get_values([false])?;
                Ok(values[0])
            }
            Some(GpiodRequest::Output(_)) => Ok(self.level),
            None => Err(GpioError::WrongDirection(GpioDirection::Input)),
        }
    }
}

impl Drop for GpiodLine<'_> {
    fn drop(&mut self) {
        self.request = None;
        self.driver.used_lines.set_aliased(self.index, false);
    }
}
