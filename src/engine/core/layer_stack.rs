use log::{debug, info};

use crate::engine::core::Layer;
use crate::engine::error::Result;
use crate::engine::events::Event;

struct Slot {
    layer: Box<dyn Layer>,
    attached: bool,
}

impl Slot {
    fn new(layer: Box<dyn Layer>) -> Self {
        Self { layer, attached: false }
    }

    /// Detaches the layer if it was attached and hands it back.
    fn release(mut self) -> Box<dyn Layer> {
        if self.attached {
            self.layer.on_detach();
            self.attached = false;
        }
        self.layer
    }
}

/// Layers in update order. Normal layers occupy `[0, insert_index)` and
/// overlays the rest, so overlays update last and see events first.
///
/// Layers are pushed unattached. `attach_pending` attaches them, and only
/// attached layers are detached when popped or dropped.
#[derive(Default)]
pub struct LayerStack {
    layers: Vec<Slot>,
    insert_index: usize,
}

impl LayerStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_layer(&mut self, layer: Box<dyn Layer>) {
        debug!("Pushing layer `{}`", layer.name());
        self.layers.insert(self.insert_index, Slot::new(layer));
        self.insert_index += 1;
    }

    pub fn push_overlay(&mut self, overlay: Box<dyn Layer>) {
        debug!("Pushing overlay `{}`", overlay.name());
        self.layers.push(Slot::new(overlay));
    }

    /// Runs `attach` on every layer not attached yet, front to back. A layer
    /// whose attach fails stays unattached and the error is returned.
    pub fn attach_pending(&mut self, mut attach: impl FnMut(&mut dyn Layer) -> Result<()>) -> Result<()> {
        for slot in self.layers.iter_mut().filter(|slot| !slot.attached) {
            info!("Attaching layer `{}`", slot.layer.name());
            attach(slot.layer.as_mut())?;
            slot.attached = true;
        }
        Ok(())
    }

    /// Removes the first normal layer called `name`, detaching it if it was
    /// attached. Overlays are never matched.
    pub fn pop_layer(&mut self, name: &str) -> Option<Box<dyn Layer>> {
        let index = self.layers[..self.insert_index]
            .iter()
            .position(|slot| slot.layer.name() == name)?;
        self.insert_index -= 1;
        Some(self.layers.remove(index).release())
    }

    /// Removes the first overlay called `name`, detaching it if it was
    /// attached.
    pub fn pop_overlay(&mut self, name: &str) -> Option<Box<dyn Layer>> {
        let offset = self.layers[self.insert_index..]
            .iter()
            .position(|slot| slot.layer.name() == name)?;
        Some(self.layers.remove(self.insert_index + offset).release())
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn overlay_count(&self) -> usize {
        self.layers.len() - self.insert_index
    }

    pub fn is_attached(&self, name: &str) -> bool {
        self.layers.iter().any(|slot| slot.attached && slot.layer.name() == name)
    }

    /// Front to back: normal layers first, overlays last.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &dyn Layer> {
        self.layers.iter().map(|slot| slot.layer.as_ref())
    }

    pub fn iter_mut(&mut self) -> impl DoubleEndedIterator<Item = &mut Box<dyn Layer>> {
        self.layers.iter_mut().map(|slot| &mut slot.layer)
    }

    pub fn names(&self) -> Vec<&str> {
        self.iter().map(|l| l.name()).collect()
    }

    /// Hands `event` to each layer from the top of the stack down, stopping
    /// once a layer marks it handled.
    pub fn dispatch_event(&mut self, event: &mut Event, mut handler: impl FnMut(&mut dyn Layer, &mut Event)) {
        for slot in self.layers.iter_mut().rev() {
            if event.handled {
                break;
            }
            handler(slot.layer.as_mut(), event);
        }
    }
}

impl Drop for LayerStack {
    fn drop(&mut self) {
        for slot in self.layers.drain(..) {
            slot.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::engine::error::EngineError;
    use crate::engine::events::{KeyPressedEvent, WindowCloseEvent};

    struct Named {
        name: &'static str,
        detached: Rc<RefCell<Vec<&'static str>>>,
    }

    impl Layer for Named {
        fn name(&self) -> &str {
            self.name
        }

        fn on_detach(&mut self) {
            self.detached.borrow_mut().push(self.name);
        }
    }

    fn layer(name: &'static str, log: &Rc<RefCell<Vec<&'static str>>>) -> Box<dyn Layer> {
        Box::new(Named {
            name,
            detached: Rc::clone(log),
        })
    }

    #[test]
    fn overlays_stay_above_layers() {
        let log = Rc::default();
        let mut stack = LayerStack::new();
        stack.push_overlay(layer("debug", &log));
        stack.push_layer(layer("game", &log));
        stack.push_layer(layer("hud", &log));
        stack.push_overlay(layer("console", &log));

        assert_eq!(stack.names(), ["game", "hud", "debug", "console"]);
        assert_eq!(stack.overlay_count(), 2);
    }

    #[test]
    fn pop_only_searches_own_region() {
        let log = Rc::default();
        let mut stack = LayerStack::new();
        stack.push_layer(layer("a", &log));
        stack.push_overlay(layer("b", &log));

        assert!(stack.pop_layer("b").is_none());
        assert!(stack.pop_overlay("a").is_none());

        let popped = stack.pop_layer("a").unwrap();
        assert_eq!(popped.name(), "a");
        stack.push_layer(layer("c", &log));
        assert_eq!(stack.names(), ["c", "b"]);

        assert!(stack.pop_overlay("b").is_some());
        assert_eq!(stack.names(), ["c"]);
        assert_eq!(stack.overlay_count(), 0);
    }

    #[test]
    fn events_go_top_down_until_handled() {
        let log = Rc::default();
        let mut stack = LayerStack::new();
        stack.push_layer(layer("bottom", &log));
        stack.push_layer(layer("middle", &log));
        stack.push_overlay(layer("top", &log));

        let mut visited = Vec::new();
        let mut event = Event::from(KeyPressedEvent {
            key: winit::keyboard::KeyCode::Space,
            repeat_count: 0,
        });
        stack.dispatch_event(&mut event, |layer, event| {
            visited.push(layer.name().to_owned());
            if layer.name() == "middle" {
                event.handled = true;
            }
        });
        assert_eq!(visited, ["top", "middle"]);
        assert!(event.handled);

        let mut handled = Event::from(WindowCloseEvent);
        handled.handled = true;
        let mut calls = 0;
        stack.dispatch_event(&mut handled, |_, _| calls += 1);
        assert_eq!(calls, 0);
    }

    #[test]
    fn drop_detaches_remaining_layers_in_order() {
        let log: Rc<RefCell<Vec<&'static str>>> = Rc::default();
        {
            let mut stack = LayerStack::new();
            stack.push_overlay(layer("overlay", &log));
            stack.push_layer(layer("first", &log));
            stack.push_layer(layer("second", &log));
            stack.attach_pending(|_| Ok(())).unwrap();
            drop(stack.pop_layer("first"));
        }
        assert_eq!(*log.borrow(), ["first", "second", "overlay"]);
    }

    #[test]
    fn unattached_layers_are_never_detached() {
        let log: Rc<RefCell<Vec<&'static str>>> = Rc::default();
        {
            let mut stack = LayerStack::new();
            stack.push_layer(layer("game", &log));
            stack.push_overlay(layer("debug", &log));
            assert!(stack.pop_overlay("debug").is_some());
            assert!(!stack.is_attached("game"));
        }
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn attach_pending_skips_attached_layers() {
        let log: Rc<RefCell<Vec<&'static str>>> = Rc::default();
        let mut attached = Vec::new();
        let mut stack = LayerStack::new();
        stack.push_layer(layer("a", &log));
        stack
            .attach_pending(|l| {
                attached.push(l.name().to_owned());
                Ok(())
            })
            .unwrap();
        stack.push_overlay(layer("b", &log));
        stack
            .attach_pending(|l| {
                attached.push(l.name().to_owned());
                Ok(())
            })
            .unwrap();
        assert_eq!(attached, ["a", "b"]);
        assert!(stack.is_attached("a") && stack.is_attached("b"));
    }

    #[test]
    fn failed_attach_leaves_layer_unattached() {
        let log: Rc<RefCell<Vec<&'static str>>> = Rc::default();
        let mut stack = LayerStack::new();
        stack.push_layer(layer("ok", &log));
        stack.push_layer(layer("broken", &log));
        let result = stack.attach_pending(|l| match l.name() {
            "broken" => Err(EngineError::RenderQueue("attach failed".into())),
            _ => Ok(()),
        });
        assert!(result.is_err());
        assert!(stack.is_attached("ok"));
        assert!(!stack.is_attached("broken"));

        drop(stack);
        assert_eq!(*log.borrow(), ["ok"]);
    }
}
