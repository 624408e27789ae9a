//! System palette, gamma correction and fades.
//!
//! Fades are stepped by the frame loop: `start_fade` installs a fade and
//! `tick_fade` applies at most one step per call once its delay has passed.
//! Scene changes use the blocking `palette_fade`, which drives the platform
//! directly until the palette is black.

use asylum_formats::{PaletteData, ResourceId};

use super::surface::Surface;
use crate::config::MAX_GAMMA_LEVEL;
use crate::error::{ContentError, ContentResult};
use crate::platform::Platform;
use crate::resources::ResourceProvider;

pub type Palette = [[u8; 3]; 256];

pub const GREY_STEPS: i32 = 22;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Fade {
    target_id: ResourceId,
    original: Box<Palette>,
    target: Box<Palette>,
    step: i32,
    steps: i32,
    ms_per_step: u64,
    next_due: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct GreyMorph {
    original: Box<Palette>,
    grey: Box<Palette>,
}

#[derive(Debug, Clone)]
pub struct PaletteEngine {
    main: Box<Palette>,
    gamma_level: i32,
    fade: Option<Fade>,
    grey: Option<GreyMorph>,
    timer_installs: u32,
}

impl Default for PaletteEngine {
    fn default() -> Self {
        PaletteEngine::new(0)
    }
}

impl PaletteEngine {
    pub fn new(gamma_level: i32) -> Self {
        PaletteEngine {
            main: Box::new([[0; 3]; 256]),
            gamma_level: gamma_level.clamp(0, MAX_GAMMA_LEVEL),
            fade: None,
            grey: None,
            timer_installs: 0,
        }
    }

    pub fn palette(&self) -> &Palette {
        &self.main
    }

    pub fn gamma_level(&self) -> i32 {
        self.gamma_level
    }

    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    pub fn fade_target(&self) -> Option<ResourceId> {
        self.fade.as_ref().map(|fade| fade.target_id)
    }

    /// Number of fades installed so far; a restart to the same target does
    /// not count.
    pub fn timer_installs(&self) -> u32 {
        self.timer_installs
    }

    /// Writes the payload's 6-bit entries, scaled to 8 bits, starting at the
    /// payload's start index.
    pub fn setup_palette(&mut self, data: &PaletteData) {
        apply_entries(&mut self.main, data);
    }

    pub fn set_palette(
        &mut self,
        resources: &dyn ResourceProvider,
        id: ResourceId,
    ) -> ContentResult<()> {
        let data = palette_data(resources, id)?;
        self.setup_palette(data);
        Ok(())
    }

    /// Reapplies the gamma ramp from palette `id`; nothing happens at level 0.
    pub fn set_gamma_level(
        &mut self,
        resources: &dyn ResourceProvider,
        id: ResourceId,
    ) -> ContentResult<()> {
        if self.gamma_level == 0 {
            return Ok(());
        }
        let data = palette_data(resources, id)?;
        apply_gamma(data, &mut self.main, self.gamma_level);
        Ok(())
    }

    pub fn change_gamma_level(&mut self, level: i32) {
        self.gamma_level = level.clamp(0, MAX_GAMMA_LEVEL);
    }

    /// Starts fading towards palette `id`. Fading again to the target already
    /// in progress changes nothing; another target cancels the running fade.
    pub fn start_fade(
        &mut self,
        resources: &dyn ResourceProvider,
        id: ResourceId,
        ms_per_step: i32,
        steps: i32,
        now: u64,
    ) -> ContentResult<()> {
        if self.fade_target() == Some(id) {
            return Ok(());
        }
        self.stop_fade();

        if ms_per_step < 0 || steps <= 0 {
            log::warn!("ignoring palette fade to {id:#010x}: {ms_per_step} ms x {steps} steps");
            return Ok(());
        }

        let data = palette_data(resources, id)?;
        let mut target = self.main.clone();
        apply_entries(&mut target, data);
        if self.gamma_level > 0 {
            apply_gamma(data, &mut target, self.gamma_level);
        }

        self.fade = Some(Fade {
            target_id: id,
            original: self.main.clone(),
            target,
            step: 0,
            steps,
            ms_per_step: ms_per_step as u64,
            next_due: now,
        });
        self.timer_installs += 1;
        Ok(())
    }

    /// Applies the next fade step if it is due. Returns true when the
    /// palette changed.
    pub fn tick_fade(&mut self, now: u64) -> bool {
        let Some(fade) = self.fade.as_mut() else {
            return false;
        };
        if now < fade.next_due {
            return false;
        }

        fade.step += 1;
        interpolate(&mut self.main, &fade.original, &fade.target, fade.step, fade.steps);
        fade.next_due = now + fade.ms_per_step;
        if fade.step >= fade.steps {
            self.fade = None;
        }
        true
    }

    /// Cancels the running fade, keeping the palette as it stands.
    pub fn stop_fade(&mut self) {
        self.fade = None;
    }

    /// Cancels any fade and paints every entry but the first with one color.
    pub fn stop_fade_with_color(&mut self, red: u8, green: u8, blue: u8) {
        self.stop_fade();
        for entry in self.main.iter_mut().skip(1) {
            *entry = [red, green, blue];
        }
    }

    /// Blocking fade to black of the entries from `start` on, presenting
    /// `back` after every step.
    pub fn palette_fade(
        &mut self,
        start: i32,
        ms_per_step: i32,
        steps: i32,
        platform: &mut dyn Platform,
        back: &Surface,
    ) {
        if !(0..=255).contains(&start) || ms_per_step < 0 || steps <= 0 {
            return;
        }
        self.stop_fade();

        let original = self.main.clone();
        let mut black = self.main.clone();
        for entry in black.iter_mut().skip(start as usize) {
            *entry = [0; 3];
        }
        for step in 1..=steps {
            interpolate(&mut self.main, &original, &black, step, steps);
            platform.present(back, &self.main);
            platform.delay_millis(ms_per_step as u64);
        }
    }

    /// Remembers the current palette and its luminance-only counterpart.
    pub fn make_grey_palette(&mut self) {
        let mut grey = self.main.clone();
        for entry in grey.iter_mut() {
            let [r, g, b] = *entry;
            let luminance = (30 * r as u32 + 59 * g as u32 + 11 * b as u32) / 100;
            *entry = [luminance as u8; 3];
        }
        self.grey = Some(GreyMorph {
            original: self.main.clone(),
            grey,
        });
    }

    /// Step `0..GREY_STEPS` of the morph; the last step is fully grey.
    pub fn update_grey_palette(&mut self, step: i32) {
        let Some(morph) = self.grey.as_ref() else {
            return;
        };
        let step = (step + 1).clamp(0, GREY_STEPS);
        interpolate(&mut self.main, &morph.original, &morph.grey, step, GREY_STEPS);
    }
}

fn palette_data(resources: &dyn ResourceProvider, id: ResourceId) -> ContentResult<&PaletteData> {
    resources.palette(id).ok_or(ContentError::InvalidPalette(id))
}

fn apply_entries(palette: &mut Palette, data: &PaletteData) {
    let start = data.start as usize;
    for (slot, rgb) in palette
        .iter_mut()
        .skip(start)
        .zip(data.entries.iter().take(data.count as usize))
    {
        *slot = rgb.map(|channel| channel.saturating_mul(4));
    }
}

/// Gamma ramp over entries 1..256 of the payload, lifting dark channels
/// towards full brightness by `level` eighths of the remaining range.
fn apply_gamma(data: &PaletteData, target: &mut Palette, level: i32) {
    for index in 1..256usize {
        let Some(rgb) = data.entries.get(index) else {
            break;
        };
        let color = rgb.iter().copied().max().unwrap_or(0) as i32;
        if color == 0 {
            continue;
        }
        let gamma = color + (level * (63 - color) + 31) / 63;
        for channel in 0..3 {
            let value = rgb[channel] as i32;
            if value != 0 {
                target[index][channel] = (4 * ((color >> 1) + value * gamma) / color).min(255) as u8;
            }
        }
    }
}

fn interpolate(out: &mut Palette, from: &Palette, to: &Palette, step: i32, steps: i32) {
    for ((slot, a), b) in out.iter_mut().zip(from.iter()).zip(to.iter()) {
        for channel in 0..3 {
            let start = a[channel] as i32;
            let end = b[channel] as i32;
            slot[channel] = (start + step * (end - start) / steps) as u8;
        }
    }
}
