//! Audio-processing context
//!
//! The context owns every source and gain bus of one audio graph and renders
//! them into buffers. Sources live in a generational arena: handles go stale
//! instead of aliasing when a slot is reused, and one-shot sources are
//! reclaimed once their scheduled stop time has been rendered past.
//!
//! Routing is deliberately flat: a source feeds either the destination or one
//! gain bus, and every bus feeds the destination.

use crate::engine::buffer::AudioBuffer;
use crate::engine::param::AudioParam;
use crate::engine::voice::Voice;
use crate::error::{NebulaError, Result};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};
use uuid::Uuid;

/// Lifecycle state of a context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// Rendering advances time
    Running,
    /// Held by platform policy; renders silence without advancing time
    Suspended,
    /// Released; every operation fails
    Closed,
}

impl fmt::Display for ContextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextState::Running => write!(f, "running"),
            ContextState::Suspended => write!(f, "suspended"),
            ContextState::Closed => write!(f, "closed"),
        }
    }
}

/// Handle to a source in a context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId {
    index: usize,
    generation: u32,
}

impl SourceId {
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Handle to a gain bus in a context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BusId(usize);

/// Where a source's output goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Destination,
    Bus(BusId),
}

/// Playback state of one source at a point in time
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceState {
    /// Never started, or stopped and not yet restarted
    Idle,
    /// Start scheduled in the future
    Scheduled { start: f64 },
    /// Producing output
    Playing,
    /// Past its stop time
    Stopped,
}

impl SourceState {
    pub fn is_active(&self) -> bool {
        matches!(self, SourceState::Scheduled { .. } | SourceState::Playing)
    }
}

struct SourceSlot {
    voice: Box<dyn Voice>,
    output: Output,
    start: Option<f64>,
    stop: Option<f64>,
    one_shot: bool,
}

impl SourceSlot {
    fn state_at(&self, time: f64) -> SourceState {
        match (self.start, self.stop) {
            (None, _) => SourceState::Idle,
            (Some(_), Some(stop)) if stop <= time => SourceState::Stopped,
            (Some(start), _) if start > time => SourceState::Scheduled { start },
            (Some(_), _) => SourceState::Playing,
        }
    }
}

/// One audio graph plus its clock
pub struct AudioContext {
    id: Uuid,
    state: ContextState,
    sample_rate: u32,
    frame: u64,
    slots: Vec<Option<SourceSlot>>,
    generations: Vec<u32>,
    free: Vec<usize>,
    buses: Vec<AudioParam>,
    lease: Option<Arc<AtomicUsize>>,
}

impl fmt::Debug for AudioContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioContext")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("sample_rate", &self.sample_rate)
            .field("frame", &self.frame)
            .field("sources", &self.source_count())
            .field("buses", &self.buses.len())
            .finish()
    }
}

impl AudioContext {
    /// Create a running context not tied to any platform
    pub fn new(sample_rate: u32) -> Self {
        Self::with_state(sample_rate, ContextState::Running, None)
    }

    pub(crate) fn with_state(
        sample_rate: u32,
        state: ContextState,
        lease: Option<Arc<AtomicUsize>>,
    ) -> Self {
        let id = Uuid::new_v4();
        debug!(context = %id, sample_rate, %state, "audio context opened");
        Self {
            id,
            state,
            sample_rate,
            frame: 0,
            slots: Vec::new(),
            generations: Vec::new(),
            free: Vec::new(),
            buses: Vec::new(),
            lease,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> ContextState {
        self.state
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Context clock in seconds
    pub fn current_time(&self) -> f64 {
        self.frame as f64 / self.sample_rate as f64
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Let the clock run again after a platform suspension
    pub fn resume(&mut self) -> Result<()> {
        self.ensure_open()?;
        if self.state == ContextState::Suspended {
            self.state = ContextState::Running;
            debug!(context = %self.id, "audio context resumed");
        }
        Ok(())
    }

    pub fn suspend(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.state = ContextState::Suspended;
        Ok(())
    }

    /// Drop every source and bus and release the context
    ///
    /// Closing twice is harmless.
    pub fn close(&mut self) {
        if self.state == ContextState::Closed {
            return;
        }
        self.slots.clear();
        self.generations.clear();
        self.free.clear();
        self.buses.clear();
        self.state = ContextState::Closed;
        if let Some(lease) = self.lease.take() {
            lease.fetch_sub(1, Ordering::SeqCst);
        }
        debug!(context = %self.id, "audio context closed");
    }

    pub fn is_closed(&self) -> bool {
        self.state == ContextState::Closed
    }

    fn ensure_open(&self) -> Result<()> {
        if self.state == ContextState::Closed {
            return Err(NebulaError::ContextClosed);
        }
        Ok(())
    }

    // ========================================================================
    // Buses
    // ========================================================================

    /// Add a gain stage feeding the destination
    pub fn create_bus(&mut self, gain: f32) -> Result<BusId> {
        self.ensure_open()?;
        self.buses.push(AudioParam::new(gain));
        Ok(BusId(self.buses.len() - 1))
    }

    pub fn bus_gain(&self, bus: BusId) -> Result<&AudioParam> {
        self.ensure_open()?;
        self.buses
            .get(bus.0)
            .ok_or(NebulaError::UnknownBus { index: bus.0 })
    }

    pub fn bus_gain_mut(&mut self, bus: BusId) -> Result<&mut AudioParam> {
        self.ensure_open()?;
        self.buses
            .get_mut(bus.0)
            .ok_or(NebulaError::UnknownBus { index: bus.0 })
    }

    // ========================================================================
    // Sources
    // ========================================================================

    /// Register a long-lived source; it stays until the context closes
    pub fn add_source(&mut self, voice: Box<dyn Voice>, output: Output) -> Result<SourceId> {
        self.insert(voice, output, false)
    }

    /// Register a source that is reclaimed once its scheduled stop passes
    pub fn add_one_shot(&mut self, voice: Box<dyn Voice>, output: Output) -> Result<SourceId> {
        self.insert(voice, output, true)
    }

    fn insert(&mut self, voice: Box<dyn Voice>, output: Output, one_shot: bool) -> Result<SourceId> {
        self.ensure_open()?;
        if let Output::Bus(bus) = output {
            if bus.0 >= self.buses.len() {
                return Err(NebulaError::UnknownBus { index: bus.0 });
            }
        }
        let slot = SourceSlot {
            voice,
            output,
            start: None,
            stop: None,
            one_shot,
        };
        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(slot);
                index
            }
            None => {
                self.slots.push(Some(slot));
                self.generations.push(0);
                self.slots.len() - 1
            }
        };
        Ok(SourceId {
            index,
            generation: self.generations[index],
        })
    }

    fn slot(&self, id: SourceId) -> Result<&SourceSlot> {
        self.ensure_open()?;
        match (self.slots.get(id.index), self.generations.get(id.index)) {
            (Some(Some(slot)), Some(&generation)) if generation == id.generation => Ok(slot),
            _ => Err(NebulaError::UnknownSource { index: id.index }),
        }
    }

    fn slot_mut(&mut self, id: SourceId) -> Result<&mut SourceSlot> {
        self.ensure_open()?;
        match (self.slots.get_mut(id.index), self.generations.get(id.index)) {
            (Some(Some(slot)), Some(&generation)) if generation == id.generation => Ok(slot),
            _ => Err(NebulaError::UnknownSource { index: id.index }),
        }
    }

    /// Schedule a source to start at `at` (clamped to now)
    ///
    /// A source that has stopped may be started again.
    pub fn start_source(&mut self, id: SourceId, at: f64) -> Result<()> {
        let now = self.current_time();
        let slot = self.slot_mut(id)?;
        let state = slot.state_at(now);
        if state.is_active() {
            return Err(NebulaError::InvalidState {
                operation: "start".to_string(),
                state: format!("{:?}", state),
            });
        }
        slot.voice.reset();
        slot.start = Some(at.max(now));
        slot.stop = None;
        trace!(source = id.index, kind = slot.voice.kind(), at, "source started");
        Ok(())
    }

    /// Schedule a source to stop at `at` (clamped to its start)
    pub fn stop_source(&mut self, id: SourceId, at: f64) -> Result<()> {
        let now = self.current_time();
        let slot = self.slot_mut(id)?;
        match (slot.start, slot.state_at(now)) {
            (Some(start), state) if state.is_active() => {
                slot.stop = Some(at.max(start));
                trace!(source = id.index, at, "source stop scheduled");
                Ok(())
            }
            _ => Err(NebulaError::SourceAlreadyStopped { index: id.index }),
        }
    }

    /// Drop a source immediately, whatever its state
    pub fn remove_source(&mut self, id: SourceId) -> Result<()> {
        self.slot(id)?;
        self.slots[id.index] = None;
        self.generations[id.index] = self.generations[id.index].wrapping_add(1);
        self.free.push(id.index);
        Ok(())
    }

    pub fn source_state(&self, id: SourceId) -> Result<SourceState> {
        let now = self.current_time();
        Ok(self.slot(id)?.state_at(now))
    }

    /// Number of registered sources, whatever their state
    pub fn source_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Number of sources started and not yet stopped
    pub fn active_source_count(&self) -> usize {
        let now = self.current_time();
        self.slots
            .iter()
            .flatten()
            .filter(|s| s.state_at(now).is_active())
            .count()
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Render `frames` mono samples
    pub fn render(&mut self, frames: usize) -> Result<AudioBuffer> {
        self.ensure_open()?;
        let mut out = vec![0.0_f32; frames];
        if self.state == ContextState::Suspended {
            return Ok(AudioBuffer::from_mono(out, self.sample_rate));
        }

        let sample_rate = self.sample_rate as f64;
        let mut bus_acc = vec![0.0_f32; self.buses.len()];

        for (i, sample) in out.iter_mut().enumerate() {
            let time = (self.frame + i as u64) as f64 / sample_rate;
            bus_acc.iter_mut().for_each(|b| *b = 0.0);
            let mut direct = 0.0_f32;

            for slot in self.slots.iter_mut().flatten() {
                if slot.state_at(time) != SourceState::Playing {
                    continue;
                }
                let s = slot.voice.next_sample(time, sample_rate);
                match slot.output {
                    Output::Destination => direct += s,
                    Output::Bus(BusId(b)) => bus_acc[b] += s,
                }
            }

            let bussed: f32 = bus_acc
                .iter()
                .zip(&self.buses)
                .map(|(acc, gain)| acc * gain.value_at(time))
                .sum();
            *sample = direct + bussed;
        }

        self.frame += frames as u64;
        self.reap_finished();
        Ok(AudioBuffer::from_mono(out, self.sample_rate))
    }

    /// Render whole seconds of output
    pub fn render_secs(&mut self, secs: f64) -> Result<AudioBuffer> {
        let frames = (secs.max(0.0) * self.sample_rate as f64).round() as usize;
        self.render(frames)
    }

    fn reap_finished(&mut self) {
        let now = self.current_time();
        for index in 0..self.slots.len() {
            let finished = matches!(
                &self.slots[index],
                Some(slot) if slot.one_shot && slot.state_at(now) == SourceState::Stopped
            );
            if finished {
                self.slots[index] = None;
                self.generations[index] = self.generations[index].wrapping_add(1);
                self.free.push(index);
                trace!(source = index, "one-shot source reclaimed");
            }
        }
    }
}

impl Drop for AudioContext {
    fn drop(&mut self) {
        self.close();
    }
}
