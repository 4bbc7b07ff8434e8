//! The boundary between a background scene and whatever drives it.
//!
//! A host hands out event subscriptions and frame callbacks. Scenes keep everything they
//! obtained in an [`OwnedResources`] list and give it all back in one teardown call.

/// Notifications a scene can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    Resize,
    PointerMove,
    PointerLeave,
}

/// Notification payloads, as delivered to a scene
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceEvent {
    Resize { width: u32, height: u32 },
    PointerMove { x: f32, y: f32 },
    PointerLeave,
}

impl SurfaceEvent {
    pub fn kind(&self) -> HostEvent {
        match self {
            SurfaceEvent::Resize { .. } => HostEvent::Resize,
            SurfaceEvent::PointerMove { .. } => HostEvent::PointerMove,
            SurfaceEvent::PointerLeave => HostEvent::PointerLeave,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHandle(u64);

pub trait Host {
    /// Pixel size of the drawing area offered to the scene
    fn surface_size(&self) -> (u32, u32);
    fn subscribe(&mut self, event: HostEvent) -> SubscriptionId;
    fn unsubscribe(&mut self, id: SubscriptionId);
    /// Ask for one callback at the next display refresh
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Everything a scene holds from its host
#[derive(Debug, Default)]
pub struct OwnedResources {
    subscriptions: Vec<SubscriptionId>,
    frame: Option<FrameHandle>,
}

impl OwnedResources {
    pub fn subscribe<H: Host>(&mut self, host: &mut H, event: HostEvent) {
        self.subscriptions.push(host.subscribe(event));
    }

    /// Request the next frame, replacing any handle already held
    pub fn schedule_frame<H: Host>(&mut self, host: &mut H) {
        if let Some(old) = self.frame.take() {
            host.cancel_frame(old);
        }
        self.frame = Some(host.request_frame());
    }

    /// The held frame callback has fired
    pub fn frame_fired(&mut self) {
        self.frame = None;
    }

    /// Give everything back. Safe to call repeatedly.
    pub fn release<H: Host>(&mut self, host: &mut H) {
        for id in self.subscriptions.drain(..) {
            host.unsubscribe(id);
        }
        if let Some(frame) = self.frame.take() {
            host.cancel_frame(frame);
        }
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty() && self.frame.is_none()
    }
}

/// Host backed by the terminal run loop.
///
/// Pure bookkeeping: the run loop asks it whether a frame is due and which events the
/// mounted scene listens to.
#[derive(Debug)]
pub struct TerminalHost {
    size: (u32, u32),
    next_id: u64,
    subscriptions: Vec<(SubscriptionId, HostEvent)>,
    pending_frame: Option<FrameHandle>,
}

impl TerminalHost {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            next_id: 1,
            subscriptions: Vec::new(),
            pending_frame: None,
        }
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn set_surface_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    pub fn is_subscribed(&self, event: HostEvent) -> bool {
        self.subscriptions.iter().any(|(_, e)| *e == event)
    }

    #[cfg(test)]
    pub fn active_subscriptions(&self) -> usize {
        self.subscriptions.len()
    }

    #[cfg(test)]
    pub fn has_pending_frame(&self) -> bool {
        self.pending_frame.is_some()
    }

    /// Consume the pending frame request. True if a frame was due.
    pub fn take_frame(&mut self) -> bool {
        self.pending_frame.take().is_some()
    }
}

impl Host for TerminalHost {
    fn surface_size(&self) -> (u32, u32) {
        self.size
    }

    fn subscribe(&mut self, event: HostEvent) -> SubscriptionId {
        let id = SubscriptionId(self.next_id());
        self.subscriptions.push((id, event));
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscriptions.retain(|(sub, _)| *sub != id);
    }

    fn request_frame(&mut self) -> FrameHandle {
        let handle = FrameHandle(self.next_id());
        self.pending_frame = Some(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending_frame == Some(handle) {
            self.pending_frame = None;
        }
    }
}
