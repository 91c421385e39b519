//! Ring of device-owned frame slots.
//!
//! Each slot cycles `Free -> Queued -> Filled -> Queued -> ...`. The device
//! owns a slot while it is `Queued`; user code owns it while it is `Filled`.
//! At most one slot is handed out at a time, enforced by [`FilledSlot`]
//! borrowing the ring mutably.

use std::time::Duration;

use super::errors::DeviceError;

/// Ownership state of one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Mapped but not yet given to the device.
    Free,
    /// Owned by the device, waiting to be filled.
    Queued,
    /// Holds a captured frame and belongs to user code.
    Filled,
}

/// A slot the device reports as filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DequeuedSlot {
    pub index: usize,
    pub bytes_used: usize,
}

/// The operations a capture backend has to provide.
///
/// Slot memory is created once when the backend is opened and lives until it
/// is dropped.
pub trait CaptureDevice {
    /// Number of slots negotiated with the driver (at least 2).
    fn slot_count(&self) -> usize;

    /// The mapped memory of slot `index`.
    ///
    /// Only meaningful while the slot is `Filled`.
    fn slot_memory(&self, index: usize) -> &[u8];

    /// Hand slot `index` to the device.
    fn enqueue(&mut self, index: usize) -> Result<(), DeviceError>;

    /// Take back a filled slot. `Ok(None)` means nothing is ready yet.
    fn dequeue(&mut self) -> Result<Option<DequeuedSlot>, DeviceError>;

    /// Block until the device may have a filled slot.
    /// Returns `Ok(false)` if `timeout` elapsed first.
    ///
    /// A backend whose `dequeue` already waits may return `Ok(true)` here and
    /// report `DeviceError::Timeout` from `dequeue` instead.
    fn wait_ready(&mut self, timeout: Duration) -> Result<bool, DeviceError>;

    fn start_streaming(&mut self) -> Result<(), DeviceError>;

    fn stop_streaming(&mut self) -> Result<(), DeviceError>;
}

/// Tracks slot ownership on top of a [`CaptureDevice`].
pub struct DeviceRingBuffer<D: CaptureDevice> {
    device: D,
    states: Vec<SlotState>,
    streaming: bool,
}

impl<D: CaptureDevice> std::fmt::Debug for DeviceRingBuffer<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceRingBuffer")
            .field("states", &self.states)
            .field("streaming", &self.streaming)
            .finish_non_exhaustive()
    }
}

impl<D: CaptureDevice> DeviceRingBuffer<D> {
    /// Wrap an opened device. All slots start `Free`.
    ///
    /// # Errors
    /// * `DeviceError::InsufficientBuffers` - the device has fewer than 2 slots
    pub fn new(device: D) -> Result<Self, DeviceError> {
        let count = device.slot_count();
        if count < 2 {
            return Err(DeviceError::InsufficientBuffers { granted: count });
        }
        Ok(Self {
            device,
            states: vec![SlotState::Free; count],
            streaming: false,
        })
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn slot_count(&self) -> usize {
        self.states.len()
    }

    pub fn state(&self, index: usize) -> SlotState {
        self.states[index]
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// Queue every free slot and start streaming.
    pub fn start(&mut self) -> Result<(), DeviceError> {
        for index in 0..self.states.len() {
            if self.states[index] == SlotState::Free {
                self.device.enqueue(index)?;
                self.states[index] = SlotState::Queued;
            }
        }
        self.device.start_streaming()?;
        self.streaming = true;
        log::info!("Streaming started with {} slot(s)", self.states.len());
        Ok(())
    }

    /// Stop streaming; the device gives up every slot.
    pub fn stop(&mut self) -> Result<(), DeviceError> {
        if !self.streaming {
            return Ok(());
        }
        self.streaming = false;
        self.device.stop_streaming()?;
        self.states.fill(SlotState::Free);
        log::info!("Streaming stopped");
        Ok(())
    }

    /// Wait for the next filled slot.
    ///
    /// Each wait is bounded by `timeout`; a device that is readable but has
    /// nothing to dequeue yet is waited on again.
    ///
    /// # Errors
    /// * `DeviceError::Timeout` - no slot became ready within `timeout`
    /// * `DeviceError::SlotState` - the device returned a slot it did not own
    /// * any I/O error from the device
    pub fn acquire(&mut self, timeout: Duration) -> Result<FilledSlot<'_, D>, DeviceError> {
        let dequeued = loop {
            if !self.device.wait_ready(timeout)? {
                return Err(DeviceError::Timeout(timeout));
            }
            if let Some(dequeued) = self.device.dequeue()? {
                break dequeued;
            }
            log::trace!("Slot not ready yet, waiting again");
        };

        let index = dequeued.index;
        let count = self.states.len();
        if index >= count {
            return Err(DeviceError::UnknownSlot { index, count });
        }
        self.transition(index, SlotState::Queued, SlotState::Filled)?;

        let length = self.device.slot_memory(index).len();
        Ok(FilledSlot {
            ring: self,
            index,
            bytes_used: dequeued.bytes_used.min(length),
            released: false,
        })
    }

    fn release_index(&mut self, index: usize) -> Result<(), DeviceError> {
        let actual = self.states[index];
        if actual != SlotState::Filled {
            return Err(DeviceError::SlotState {
                index,
                actual,
                expected: SlotState::Filled,
            });
        }
        self.device.enqueue(index)?;
        self.states[index] = SlotState::Queued;
        Ok(())
    }

    fn transition(
        &mut self,
        index: usize,
        expected: SlotState,
        next: SlotState,
    ) -> Result<(), DeviceError> {
        let actual = self.states[index];
        if actual != expected {
            return Err(DeviceError::SlotState {
                index,
                actual,
                expected,
            });
        }
        self.states[index] = next;
        Ok(())
    }
}

impl<D: CaptureDevice> Drop for DeviceRingBuffer<D> {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::warn!("Failed to stop streaming: {}", e);
        }
    }
}

/// A `Filled` slot lent to user code.
///
/// Call [`FilledSlot::release`] to give it back to the device. Dropping it
/// releases too, but can only log a failure.
pub struct FilledSlot<'r, D: CaptureDevice> {
    ring: &'r mut DeviceRingBuffer<D>,
    index: usize,
    bytes_used: usize,
    released: bool,
}

impl<D: CaptureDevice> std::fmt::Debug for FilledSlot<'_, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilledSlot")
            .field("index", &self.index)
            .field("bytes_used", &self.bytes_used)
            .finish_non_exhaustive()
    }
}

impl<D: CaptureDevice> FilledSlot<'_, D> {
    pub fn index(&self) -> usize {
        self.index
    }

    /// The captured bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.ring.device.slot_memory(self.index)[..self.bytes_used]
    }

    /// Re-queue the slot.
    pub fn release(mut self) -> Result<(), DeviceError> {
        self.released = true;
        self.ring.release_index(self.index)
    }
}

impl<D: CaptureDevice> Drop for FilledSlot<'_, D> {
    fn drop(&mut self) {
        if !self.released {
            if let Err(e) = self.ring.release_index(self.index) {
                log::warn!("Failed to re-queue slot {}: {}", self.index, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// In-memory device that fills queued slots in FIFO order.
    struct FakeDevice {
        memory: Vec<Vec<u8>>,
        queue: VecDeque<usize>,
        not_ready_polls: usize,
        streaming: bool,
    }

    impl FakeDevice {
        fn new(count: usize) -> Self {
            Self {
                memory: (0..count).map(|i| vec![i as u8; 8]).collect(),
                queue: VecDeque::new(),
                not_ready_polls: 0,
                streaming: false,
            }
        }
    }

    impl CaptureDevice for FakeDevice {
        fn slot_count(&self) -> usize {
            self.memory.len()
        }

        fn slot_memory(&self, index: usize) -> &[u8] {
            &self.memory[index]
        }

        fn enqueue(&mut self, index: usize) -> Result<(), DeviceError> {
            self.queue.push_back(index);
            Ok(())
        }

        fn dequeue(&mut self) -> Result<Option<DequeuedSlot>, DeviceError> {
            if self.not_ready_polls > 0 {
                self.not_ready_polls -= 1;
                return Ok(None);
            }
            Ok(self.queue.pop_front().map(|index| DequeuedSlot {
                index,
                bytes_used: 4,
            }))
        }

        fn wait_ready(&mut self, _timeout: Duration) -> Result<bool, DeviceError> {
            Ok(self.streaming && !self.queue.is_empty())
        }

        fn start_streaming(&mut self) -> Result<(), DeviceError> {
            self.streaming = true;
            Ok(())
        }

        fn stop_streaming(&mut self) -> Result<(), DeviceError> {
            self.streaming = false;
            self.queue.clear();
            Ok(())
        }
    }

    #[test]
    fn test_new_rejects_single_slot() {
        let err = DeviceRingBuffer::new(FakeDevice::new(1)).unwrap_err();
        assert!(matches!(err, DeviceError::InsufficientBuffers { granted: 1 }));
    }

    #[test]
    fn test_start_queues_every_slot() {
        let mut ring = DeviceRingBuffer::new(FakeDevice::new(3)).unwrap();
        assert_eq!(ring.state(0), SlotState::Free);
        ring.start().unwrap();
        assert!((0..3).all(|i| ring.state(i) == SlotState::Queued));
        assert!(ring.is_streaming());
    }

    #[test]
    fn test_acquire_and_release_cycle() {
        let mut ring = DeviceRingBuffer::new(FakeDevice::new(2)).unwrap();
        ring.start().unwrap();

        let slot = ring.acquire(Duration::from_millis(10)).unwrap();
        assert_eq!(slot.index(), 0);
        assert_eq!(slot.bytes(), &[0, 0, 0, 0]);
        slot.release().unwrap();
        assert_eq!(ring.state(0), SlotState::Queued);

        let slot = ring.acquire(Duration::from_millis(10)).unwrap();
        assert_eq!(slot.index(), 1);
        drop(slot);
        assert_eq!(ring.state(1), SlotState::Queued);
    }

    #[test]
    fn test_filled_state_while_held() {
        let mut ring = DeviceRingBuffer::new(FakeDevice::new(2)).unwrap();
        ring.start().unwrap();
        let slot = ring.acquire(Duration::from_millis(10)).unwrap();
        assert_eq!(slot.ring.state(0), SlotState::Filled);
        assert_eq!(slot.ring.state(1), SlotState::Queued);
    }

    #[test]
    fn test_acquire_retries_when_not_ready() {
        let mut device = FakeDevice::new(2);
        device.not_ready_polls = 3;
        let mut ring = DeviceRingBuffer::new(device).unwrap();
        ring.start().unwrap();
        let slot = ring.acquire(Duration::from_millis(10)).unwrap();
        assert_eq!(slot.index(), 0);
    }

    #[test]
    fn test_acquire_times_out_when_not_streaming() {
        let mut ring = DeviceRingBuffer::new(FakeDevice::new(2)).unwrap();
        let err = ring.acquire(Duration::from_millis(5)).unwrap_err();
        assert!(matches!(err, DeviceError::Timeout(_)));
    }

    #[test]
    fn test_filled_slot_debug_shows_index() {
        let mut ring = DeviceRingBuffer::new(FakeDevice::new(2)).unwrap();
        ring.start().unwrap();
        let slot = ring.acquire(Duration::from_millis(10)).unwrap();
        let text = format!("{:?}", slot);
        assert!(text.starts_with("FilledSlot"));
        assert!(text.contains("index: 0"));
        assert!(text.contains("bytes_used: 4"));
    }

    #[test]
    fn test_stop_frees_slots() {
        let mut ring = DeviceRingBuffer::new(FakeDevice::new(2)).unwrap();
        ring.start().unwrap();
        ring.stop().unwrap();
        assert!(!ring.is_streaming());
        assert_eq!(ring.state(0), SlotState::Free);
        assert_eq!(ring.state(1), SlotState::Free);
    }
}
