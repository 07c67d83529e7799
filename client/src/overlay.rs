use crate::ports::{MapSurface, Overlay, OverlayHandle};

/// A named slot holding at most one overlay.
#[derive(Debug, Default)]
pub struct OverlaySlot {
    handle: Option<OverlayHandle>,
}

impl OverlaySlot {
    /// Remove whatever occupies the slot, then install `overlay`.
    pub fn replace<M: MapSurface + ?Sized>(&mut self, map: &M, overlay: &Overlay) -> OverlayHandle {
        self.clear(map);
        let handle = map.add_overlay(overlay);
        self.handle = Some(handle);
        handle
    }

    pub fn clear<M: MapSurface + ?Sized>(&mut self, map: &M) {
        if let Some(handle) = self.handle.take() {
            map.remove_overlay(handle);
        }
    }

    #[cfg(test)]
    pub fn handle(&self) -> Option<OverlayHandle> {
        self.handle
    }
}

/// An owned collection of overlays that is always rebuilt as a whole.
#[derive(Debug, Default)]
pub struct OverlayGroup {
    handles: Vec<OverlayHandle>,
}

impl OverlayGroup {
    pub fn clear<M: MapSurface + ?Sized>(&mut self, map: &M) {
        for handle in self.handles.drain(..) {
            map.remove_overlay(handle);
        }
    }

    pub fn push<M: MapSurface + ?Sized>(&mut self, map: &M, overlay: &Overlay) {
        self.handles.push(map.add_overlay(overlay));
    }

    /// Clear, then add every overlay in `overlays`.
    pub fn rebuild<M, I>(&mut self, map: &M, overlays: I)
    where
        M: MapSurface + ?Sized,
        I: IntoIterator<Item = Overlay>,
    {
        self.clear(map);
        for overlay in overlays {
            self.push(map, &overlay);
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.handles.len()
    }
}
