//! Simulated GPIO chip.
//!
//! [SimDriver] keeps the state of every line in memory and records each operation done through its
//! lines as a [SimEvent]. Input levels can be scripted per line, and direction switches can be made
//! to fail, which is enough to drive the LCD protocol without hardware.
//!
//! Line state and history share one lock, so the history of lines driven from several threads is
//! in the order the operations took effect.
use crate::{GpioDirection, GpioDriver, GpioError, GpioLine, GpioResult};
use std::collections::VecDeque;
use std::fmt::{Debug, Formatter};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Something that happened on a simulated line.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SimEvent {
    Acquire { line: usize, direction: GpioDirection },
    Release { line: usize },
    Direction { line: usize, direction: GpioDirection },
    Write { line: usize, value: bool },
    Read { line: usize, value: bool },
}

/// A word latched into the controller by a falling edge on the enable line while RW was low.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SimLatch {
    pub rs: bool,
    pub data: u8,
}

/// Offsets of the parallel LCD bus on a simulated chip, used to decode the event history.
#[derive(Copy, Clone, Debug)]
pub struct SimBusMap {
    pub rs: usize,
    pub rw: usize,
    pub e: usize,
    /// Data lines, D0 first.
    pub data: [usize; 8],
}

#[derive(Debug, Default)]
struct SimLineState {
    direction: GpioDirection,
    level: bool,
    in_use: bool,
    input_script: VecDeque<bool>,
    default_input: bool,
    refuse: Option<GpioDirection>,
}

#[derive(Debug, Default)]
struct SimChip {
    lines: Vec<SimLineState>,
    events: Vec<SimEvent>,
}

#[derive(Default)]
pub struct SimDriver {
    chip: Mutex<SimChip>,
}

impl SimDriver {
    pub fn new(count: usize) -> Self {
        let lines = (0..count).map(|_| SimLineState::default()).collect();
        Self {
            chip: Mutex::new(SimChip { lines, events: Vec::new() }),
        }
    }

    // A panicking test thread must not hide the history from the others.
    fn chip(&self) -> MutexGuard<'_, SimChip> {
        self.chip.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues levels returned by successive reads of `line` while it is an input.
    pub fn script_input(&self, line: usize, values: impl IntoIterator<Item = bool>) {
        self.chip().lines[line].input_script.extend(values);
    }

    /// Sets the level read from `line` once its script has run out.
    pub fn set_default_input(&self, line: usize, value: bool) {
        self.chip().lines[line].default_input = value;
    }

    /// Makes every later attempt to switch `line` to `direction` fail.
    pub fn refuse_direction(&self, line: usize, direction: GpioDirection) {
        self.chip().lines[line].refuse = Some(direction);
    }

    pub fn events(&self) -> Vec<SimEvent> {
        self.chip().events.clone()
    }

    /// Number of operations done on any line since creation or the last [SimDriver::clear_events].
    pub fn activity(&self) -> usize {
        self.chip().events.len()
    }

    pub fn clear_events(&self) {
        self.chip().events.clear();
    }

    pub fn level(&self, line: usize) -> bool {
        self.chip().lines[line].level
    }

    pub fn direction(&self, line: usize) -> GpioDirection {
        self.chip().lines[line].direction
    }

    pub fn is_in_use(&self, line: usize) -> bool {
        self.chip().lines[line].in_use
    }

    /// Counts reads of `line` in the recorded history.
    pub fn reads_of(&self, line: usize) -> usize {
        self.chip()
            .events
            .iter()
            .filter(|event| matches!(event, SimEvent::Read { line: l, .. } if *l == line))
            .count()
    }

    /// Replays the recorded history and collects every word latched on the bus.
    pub fn latches(&self, map: &SimBusMap) -> Vec<SimLatch> {
        let chip = self.chip();
        let mut levels = vec![false; chip.lines.len()];
        let mut latches = Vec::new();

        for event in chip.events.iter() {
            if let SimEvent::Write { line, value } = *event {
                let falling = line == map.e && levels[line] && !value;
                levels[line] = value;
                if falling && !levels[map.rw] {
                    let mut data = 0u8;
                    for (bit, &data_line) in map.data.iter().enumerate() {
                        if levels[data_line] {
                            data |= 1 << bit;
                        }
                    }
                    latches.push(SimLatch {
                        rs: levels[map.rs],
                        data,
                    });
                }
            }
        }

        latches
    }
}

impl Debug for SimDriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SimDriver({})", self.chip().lines.len())
    }
}

impl GpioDriver for SimDriver {
    fn count(&self) -> GpioResult<usize> {
        Ok(self.chip().lines.len())
    }

    fn get_line(&self, index: usize, direction: GpioDirection) -> GpioResult<Box<dyn GpioLine + '_>> {
        let mut chip = self.chip();
        let state = chip.lines.get_mut(index).ok_or(GpioError::InvalidArgument)?;
        if state.in_use {
            return Err(GpioError::AlreadyInUse);
        }
        state.in_use = true;
        state.direction = direction;
        state.level = false;
        chip.events.push(SimEvent::Acquire { line: index, direction });
        Ok(Box::new(SimLine { driver: self, index }))
    }
}

pub struct SimLine<'a> {
    driver: &'a SimDriver,
    index: usize,
}

impl Debug for SimLine<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}[{}]", self.driver, self.index)
    }
}

impl GpioLine for SimLine<'_> {
    fn index(&self) -> usize {
        self.index
    }

    fn direction(&self) -> GpioDirection {
        self.driver.direction(self.index)
    }

    fn set_direction(&mut self, direction: GpioDirection) -> GpioResult<()> {
        let mut chip = self.driver.chip();
        let state = &mut chip.lines[self.index];
        if state.refuse == Some(direction) {
            return Err(GpioError::Other(format!("line {} refused {:?}", self.index, direction)));
        }
        if state.direction == direction {
            return Ok(());
        }
        state.direction = direction;
        state.level = false;
        chip.events.push(SimEvent::Direction { line: self.index, direction });
        Ok(())
    }

    fn write(&mut self, value: bool) -> GpioResult<()> {
        let mut chip = self.driver.chip();
        let state = &mut chip.lines[self.index];
        if state.direction != GpioDirection::Output {
            return Err(GpioError::WrongDirection(GpioDirection::Output));
        }
        state.level = value;
        chip.events.push(SimEvent::Write { line: self.index, value });
        Ok(())
    }

    fn read(&self) -> GpioResult<bool> {
        let mut chip = self.driver.chip();
        let state = &mut chip.lines[self.index];
        let value = match state.direction {
            GpioDirection::Output => state.level,
            GpioDirection::Input => state.input_script.pop_front().unwrap_or(state.default_input),
        };
        chip.events.push(SimEvent::Read { line: self.index, value });
        Ok(value)
    }
}

impl Drop for SimLine<'_> {
    fn drop(&mut self) {
        let mut chip = self.driver.chip();
        chip.lines[self.index].in_use = false;
        chip.events.push(SimEvent::Release { line: self.index });
    }
}
