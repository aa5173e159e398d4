//! The parallel 8-bit bus of the controller, on top of individual GPIO lines.
use crate::command::BusWord;
use embedded_hal::delay::DelayNs;
use lcd1602_gpio::{GpioLine, GpioResult};
use log::trace;
use std::thread::sleep;
use std::time::Duration;

/// Index of DB7, which carries the busy flag during a status read.
pub const BUSY_FLAG_BIT: usize = 7;

/// [DelayNs] backed by [std::thread::sleep].
#[derive(Copy, Clone, Debug, Default)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        sleep(Duration::from_nanos(ns as u64));
    }
}

/// Lines of the controller bus. Data lines are ordered D0 first, so bit `n` of a word goes to `data[n]`.
#[derive(Debug)]
pub struct ParallelBus<'a> {
    rs: Box<dyn GpioLine + 'a>,
    rw: Box<dyn GpioLine + 'a>,
    e: Box<dyn GpioLine + 'a>,
    data: [Box<dyn GpioLine + 'a>; 8],
}

impl<'a> ParallelBus<'a> {
    pub fn new(
        rs: Box<dyn GpioLine + 'a>,
        rw: Box<dyn GpioLine + 'a>,
        e: Box<dyn GpioLine + 'a>,
        data: [Box<dyn GpioLine + 'a>; 8],
    ) -> Self {
        ParallelBus { rs, rw, e, data }
    }

    /// Drives RS and RW.
    pub fn set_register_lines(&mut self, rs: bool, rw: bool) -> GpioResult<()> {
        self.rw.write(rw)?;
        self.rs.write(rs)?;
        Ok(())
    }

    /// Gets the current (RS, RW) levels.
    pub fn register_lines(&self) -> GpioResult<(bool, bool)> {
        Ok((self.rs.read()?, self.rw.read()?))
    }

    /// Puts a byte on the data lines, LSb on D0.
    pub fn write_data(&mut self, value: u8) -> GpioResult<()> {
        for (bit, line) in self.data.iter_mut().enumerate() {
            line.write(value & (1 << bit) != 0)?;
        }
        Ok(())
    }

    /// Latches the current data and register lines into the controller.
    pub fn pulse_enable(&mut self, delay: &mut impl DelayNs, width_us: u32) -> GpioResult<()> {
        self.e.write(true)?;
        delay.delay_us(width_us);
        self.e.write(false)?;
        Ok(())
    }

    /// Sets RS and RW for `word`, then puts its data on the bus. Does not latch.
    pub fn present(&mut self, word: BusWord) -> GpioResult<()> {
        trace!("Sending data: {:08b}, RS: {}", word.data, word.rs);
        self.set_register_lines(word.rs, word.rw)?;
        self.write_data(word.data)
    }

    pub(crate) fn busy_line(&mut self) -> &mut (dyn GpioLine + 'a) {
        &mut *self.data[BUSY_FLAG_BIT]
    }

    pub(crate) fn enable_line(&mut self) -> &mut (dyn GpioLine + 'a) {
        &mut *self.e
    }
}
