use std::collections::VecDeque;

use serde::Serialize;

use crate::graphics::{Palette, Point, Surface};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Escape,
    Enter,
    Space,
    Tab,
    Other(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputEvent {
    KeyDown { key: Key },
    MouseMove { position: Point },
    MouseDown { button: MouseButton, position: Point },
    MouseUp { button: MouseButton, position: Point },
    Quit,
}

/// Host services: input, presentation and the millisecond clock.
pub trait Platform {
    fn poll_event(&mut self) -> Option<InputEvent>;
    fn present(&mut self, surface: &Surface, palette: &Palette);
    fn millis(&self) -> u64;
    fn delay_millis(&mut self, ms: u64);
}

/// Platform with a virtual clock and a scripted event queue. Presented
/// frames are kept so callers can inspect the last one.
#[derive(Debug, Default)]
pub struct HeadlessPlatform {
    clock: u64,
    events: VecDeque<InputEvent>,
    frames_presented: usize,
    last_frame: Option<Surface>,
    last_palette: Option<Box<Palette>>,
}

impl HeadlessPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_event(&mut self, event: InputEvent) {
        self.events.push_back(event);
    }

    pub fn advance(&mut self, ms: u64) {
        self.clock += ms;
    }

    pub fn frames_presented(&self) -> usize {
        self.frames_presented
    }

    pub fn last_frame(&self) -> Option<&Surface> {
        self.last_frame.as_ref()
    }

    pub fn last_palette(&self) -> Option<&Palette> {
        self.last_palette.as_deref()
    }
}

impl Platform for HeadlessPlatform {
    fn poll_event(&mut self) -> Option<InputEvent> {
        self.events.pop_front()
    }

    fn present(&mut self, surface: &Surface, palette: &Palette) {
        self.frames_presented += 1;
        match self.last_frame.as_mut() {
            Some(frame) if frame.width() == surface.width() && frame.height() == surface.height() => {
                frame.pixels_mut().copy_from_slice(surface.pixels());
            }
            _ => self.last_frame = Some(surface.clone()),
        }
        self.last_palette = Some(Box::new(*palette));
    }

    fn millis(&self) -> u64 {
        self.clock
    }

    fn delay_millis(&mut self, ms: u64) {
        self.clock += ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_platform_replays_events_and_tracks_time() {
        let mut platform = HeadlessPlatform::new();
        platform.push_event(InputEvent::KeyDown { key: Key::Escape });
        platform.push_event(InputEvent::Quit);
        assert_eq!(
            platform.poll_event(),
            Some(InputEvent::KeyDown { key: Key::Escape })
        );
        assert_eq!(platform.poll_event(), Some(InputEvent::Quit));
        assert_eq!(platform.poll_event(), None);

        platform.delay_millis(60);
        platform.advance(15);
        assert_eq!(platform.millis(), 75);
    }

    #[test]
    fn present_keeps_latest_frame() {
        let mut platform = HeadlessPlatform::new();
        let mut surface = Surface::new(2, 2);
        let palette = [[1, 2, 3]; 256];
        platform.present(&surface, &palette);
        surface.fill(9);
        platform.present(&surface, &palette);

        assert_eq!(platform.frames_presented(), 2);
        assert_eq!(platform.last_frame().unwrap().pixel(1, 1), Some(9));
        assert_eq!(platform.last_palette().unwrap()[0], [1, 2, 3]);
    }
}
