use asylum_formats::{GraphicFrame, GraphicResource, ResourceId, TransTable};
use bitflags::bitflags;

use super::blit::{self, Source, Target};
use super::masked::{blit_masked, MaskedDraw};
use super::surface::{Point, Rect, Surface, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::error::{ContentError, ContentResult};
use crate::resources::ResourceProvider;

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct DrawFlags: u32 {
        const MIRROR_LEFT_RIGHT = 0x0000_0002;
        /// Blend through the selected transparency table.
        const TRANS_TABLE = 0x1000_0000;
        const DIRECT = 0x8000_0000;
        const _ = !0;
    }
}

/// Back buffer plus the blit state the draw calls share: clip rectangle,
/// loaded transparency tables and the selected one.
#[derive(Debug, Clone)]
pub struct Compositor {
    back: Surface,
    clip_rect: Rect,
    trans_tables: Vec<TransTable>,
    selected: Option<usize>,
}

impl Default for Compositor {
    fn default() -> Self {
        Compositor::new()
    }
}

impl Compositor {
    pub fn new() -> Self {
        Compositor {
            back: Surface::screen(),
            clip_rect: Rect::screen(),
            trans_tables: Vec::new(),
            selected: None,
        }
    }

    pub fn back_buffer(&self) -> &Surface {
        &self.back
    }

    pub fn back_buffer_mut(&mut self) -> &mut Surface {
        &mut self.back
    }

    pub fn clip_rect(&self) -> Rect {
        self.clip_rect
    }

    pub fn set_clip_rect(&mut self, rect: Rect) {
        self.clip_rect = rect.intersection(&self.back.bounds());
    }

    /// Clips `destination` to the clip rectangle and trims `source` by the
    /// same amounts. Horizontal trims swap sides for mirrored draws since the
    /// source is read right to left.
    pub fn clip(&self, source: &mut Rect, destination: &mut Rect, mirrored: bool) {
        let clip = self.clip_rect;

        let diff_left = clip.left - destination.left;
        if diff_left > 0 {
            destination.left = clip.left;
            if mirrored {
                source.right -= diff_left;
            } else {
                source.left += diff_left;
            }
        }

        let diff_right = destination.right - clip.right;
        if diff_right > 0 {
            destination.right -= diff_right;
            if mirrored {
                source.left += diff_right;
            } else {
                source.right -= diff_right;
            }
        }

        let diff_top = clip.top - destination.top;
        if diff_top > 0 {
            destination.top = clip.top;
            source.top += diff_top;
        }

        let diff_bottom = destination.bottom - clip.bottom;
        if diff_bottom > 0 {
            source.bottom -= diff_bottom;
            destination.bottom -= diff_bottom;
        }
    }

    pub fn setup_trans_tables(&mut self, tables: Vec<TransTable>) {
        self.selected = if tables.is_empty() { None } else { Some(0) };
        self.trans_tables = tables;
    }

    pub fn clear_trans_tables(&mut self) {
        self.trans_tables.clear();
        self.selected = None;
    }

    /// Out-of-range indices leave the current selection untouched.
    pub fn select_trans_table(&mut self, index: usize) {
        if index < self.trans_tables.len() {
            self.selected = Some(index);
        }
    }

    pub fn selected_trans_table(&self) -> Option<usize> {
        self.selected
    }

    pub fn trans_table_count(&self) -> usize {
        self.trans_tables.len()
    }

    pub fn clear(&mut self) {
        self.back.fill(0);
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, width: i32, height: i32, color: u8) {
        self.back
            .fill_rect(Rect::new(x, y, x + width, y + height), color);
    }

    pub fn draw_wide_screen_bars(&mut self, bar_size: i32) {
        if bar_size <= 0 {
            return;
        }
        self.back.fill_rect(Rect::new(0, 0, SCREEN_WIDTH, bar_size), 0);
        self.back
            .fill_rect(Rect::new(0, SCREEN_HEIGHT - bar_size, SCREEN_WIDTH, SCREEN_HEIGHT), 0);
    }

    pub fn draw(
        &mut self,
        resources: &dyn ResourceProvider,
        resource_id: ResourceId,
        frame_index: u32,
        source: Point,
        flags: DrawFlags,
        color_key: bool,
    ) -> ContentResult<()> {
        let resource = graphic(resources, resource_id)?;
        self.draw_resource(resource, resource_id, frame_index, source, flags, color_key)
    }

    /// Draws through transparency table `table`, restoring the previous
    /// selection afterwards.
    pub fn draw_with_trans_table(
        &mut self,
        resources: &dyn ResourceProvider,
        resource_id: ResourceId,
        frame_index: u32,
        source: Point,
        flags: DrawFlags,
        table: usize,
    ) -> ContentResult<()> {
        let saved = self.selected;
        self.select_trans_table(table);
        let result = self.draw(
            resources,
            resource_id,
            frame_index,
            source,
            flags | DrawFlags::TRANS_TABLE | DrawFlags::DIRECT,
            true,
        );
        self.selected = saved;
        result
    }

    pub fn draw_resource(
        &mut self,
        resource: &GraphicResource,
        resource_id: ResourceId,
        frame_index: u32,
        source: Point,
        flags: DrawFlags,
        color_key: bool,
    ) -> ContentResult<()> {
        let frame = frame_of(resource, resource_id, frame_index)?;
        let (mut src, mut dest) = frame_rects(resource, frame, source, flags);
        let mirrored = flags.contains(DrawFlags::MIRROR_LEFT_RIGHT);
        self.clip(&mut src, &mut dest, mirrored);
        if !src.is_valid() || src.is_empty() {
            return Ok(());
        }
        self.blit(frame, src, dest, flags, color_key);
        Ok(())
    }

    /// Draws a frame partially hidden behind mask resource `mask_id` placed
    /// at `destination`.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_masked(
        &mut self,
        resources: &dyn ResourceProvider,
        resource_id: ResourceId,
        frame_index: u32,
        source: Point,
        flags: DrawFlags,
        mask_id: ResourceId,
        destination: Point,
    ) -> ContentResult<()> {
        let resource = graphic(resources, resource_id)?;
        let frame = frame_of(resource, resource_id, frame_index)?;
        let (mut src, mut dest) = frame_rects(resource, frame, source, flags);
        let mirrored = flags.contains(DrawFlags::MIRROR_LEFT_RIGHT);
        self.clip(&mut src, &mut dest, mirrored);

        let Some(mask) = resources.mask(mask_id) else {
            log::warn!("mask resource {mask_id:#010x} missing; drawing unmasked");
            if src.is_valid() && !src.is_empty() {
                self.blit(frame, src, dest, flags, true);
            }
            return Ok(());
        };

        let mut source_mask = Rect::new(0, 0, mask.width as i32, mask.height as i32);
        let mut destination_mask = Rect::new(
            destination.x,
            destination.y,
            destination.x + mask.width as i32,
            destination.y + mask.height as i32,
        );
        self.clip(&mut source_mask, &mut destination_mask, false);

        if !src.is_valid() || src.is_empty() {
            return Ok(());
        }

        if dest.intersects(&destination_mask) {
            blit_masked(
                &mut self.back,
                frame,
                mask,
                MaskedDraw {
                    source: src,
                    destination: dest,
                    source_mask,
                    destination_mask,
                    mirrored,
                },
            );
        } else {
            self.blit(frame, src, dest, flags, true);
        }
        Ok(())
    }

    /// Blends a frame against the background image rather than the back
    /// buffer; `background_offset` is the camera position inside the
    /// background frame.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_crossfade(
        &mut self,
        resources: &dyn ResourceProvider,
        resource_id: ResourceId,
        frame_index: u32,
        point: Point,
        background_id: ResourceId,
        background_offset: Point,
        table: usize,
    ) -> ContentResult<()> {
        let resource = graphic(resources, resource_id)?;
        let frame = frame_of(resource, resource_id, frame_index)?;
        let background = graphic(resources, background_id)?;
        let background_frame = frame_of(background, background_id, 0)?;

        let mut src = Rect::new(0, 0, frame.width as i32, frame.height as i32);
        let mut dest = src.translate(point.x + frame.x, point.y + frame.y);
        self.clip(&mut src, &mut dest, false);
        if !src.is_valid() || src.is_empty() {
            return Ok(());
        }

        let background_x = dest.left + background_offset.x;
        let background_y = dest.top + background_offset.y;
        let fits = background_x >= 0
            && background_y >= 0
            && background_x + dest.width() <= background_frame.width as i32
            && background_y + dest.height() <= background_frame.height as i32;
        if !fits {
            log::warn!(
                "crossfade of {resource_id:#010x} falls outside background {background_id:#010x}"
            );
            return Ok(());
        }

        let index = if table < self.trans_tables.len() {
            Some(table)
        } else {
            self.selected
        };
        let Some(table) = index.and_then(|index| self.trans_tables.get(index)) else {
            return Ok(());
        };
        let pitch = self.back.pitch();
        blit::blit_crossfade(
            Target::new(
                self.back.pixels_mut(),
                pitch,
                dest.left as usize,
                dest.top as usize,
            ),
            Source::new(&frame.pixels, frame.pitch(), src.left as usize, src.top as usize),
            Source::new(
                &background_frame.pixels,
                background_frame.pitch(),
                background_x as usize,
                background_y as usize,
            ),
            dest.width() as usize,
            dest.height() as usize,
            table,
        );
        Ok(())
    }

    fn blit(
        &mut self,
        frame: &GraphicFrame,
        source: Rect,
        destination: Rect,
        flags: DrawFlags,
        color_key: bool,
    ) {
        let width = destination.width() as usize;
        let height = destination.height() as usize;
        let mirrored = flags.contains(DrawFlags::MIRROR_LEFT_RIGHT);
        let pitch = self.back.pitch();
        let table_index = if flags.contains(DrawFlags::TRANS_TABLE) {
            self.selected
        } else {
            None
        };
        let target = Target::new(
            self.back.pixels_mut(),
            pitch,
            destination.left as usize,
            destination.top as usize,
        );
        let start_x = if mirrored {
            source.right as usize - 1
        } else {
            source.left as usize
        };
        let src = Source::new(&frame.pixels, frame.pitch(), start_x, source.top as usize);

        match table_index.and_then(|index| self.trans_tables.get(index)) {
            Some(table) if mirrored => {
                blit::blit_trans_table_mirrored(target, src, width, height, table)
            }
            Some(table) => blit::blit_trans_table(target, src, width, height, table),
            None if mirrored && color_key => {
                blit::blit_mirrored_color_key(target, src, width, height)
            }
            None if mirrored => blit::blit_mirrored(target, src, width, height),
            None if color_key => blit::blit_raw_color_key(target, src, width, height),
            None => blit::blit_raw(target, src, width, height),
        }
    }
}

fn graphic(resources: &dyn ResourceProvider, id: ResourceId) -> ContentResult<&GraphicResource> {
    resources.graphic(id).ok_or(ContentError::MissingGraphic(id))
}

fn frame_of(
    resource: &GraphicResource,
    id: ResourceId,
    frame_index: u32,
) -> ContentResult<&GraphicFrame> {
    resource
        .frame(frame_index as usize)
        .ok_or(ContentError::FrameOutOfRange {
            resource: id,
            frame: frame_index,
        })
}

/// Unclipped source and destination rectangles for a frame drawn at `source`.
fn frame_rects(
    resource: &GraphicResource,
    frame: &GraphicFrame,
    source: Point,
    flags: DrawFlags,
) -> (Rect, Rect) {
    let width = frame.width as i32;
    let height = frame.height as i32;
    let mut left = source.x + frame.x;
    if flags.contains(DrawFlags::MIRROR_LEFT_RIGHT) && resource.anchors_mirrored_frames() {
        left = source.x + resource.max_width - width - frame.x;
    }
    let top = source.y + frame.y;
    (
        Rect::new(0, 0, width, height),
        Rect::new(left, top, left + width, top + height),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::InMemoryResources;
    use asylum_formats::make_resource;

    const SENTINEL: u8 = 0xEE;

    fn resources_with(frame: GraphicFrame) -> (InMemoryResources, ResourceId) {
        let id = make_resource(5, 1);
        let mut resources = InMemoryResources::default();
        resources.insert_graphic(id, GraphicResource::new(vec![frame]));
        (resources, id)
    }

    #[test]
    fn color_key_only_skips_zero_in_keyed_mode() {
        let frame = GraphicFrame::new(0, 0, 3, 1, vec![4, 0, 6]).unwrap();
        let (resources, id) = resources_with(frame);

        let mut keyed = Compositor::new();
        keyed.back_buffer_mut().fill(SENTINEL);
        keyed
            .draw(&resources, id, 0, Point::new(10, 10), DrawFlags::empty(), true)
            .unwrap();
        assert_eq!(keyed.back_buffer().pixel(11, 10), Some(SENTINEL));
        assert_eq!(keyed.back_buffer().pixel(10, 10), Some(4));

        let mut raw = Compositor::new();
        raw.back_buffer_mut().fill(SENTINEL);
        raw.draw(&resources, id, 0, Point::new(10, 10), DrawFlags::empty(), false)
            .unwrap();
        assert_eq!(raw.back_buffer().pixel(11, 10), Some(0));
    }

    #[test]
    fn mirrored_draw_is_clipped_from_the_right_side_of_the_source() {
        let frame = GraphicFrame::new(0, 0, 4, 1, vec![1, 2, 3, 4]).unwrap();
        let (resources, id) = resources_with(frame);
        let mut compositor = Compositor::new();

        compositor
            .draw(
                &resources,
                id,
                0,
                Point::new(-1, 0),
                DrawFlags::MIRROR_LEFT_RIGHT,
                true,
            )
            .unwrap();

        // Column -1 would have shown pixel 4; the rest is 3, 2, 1.
        let row: Vec<u8> = (0..4).filter_map(|x| compositor.back_buffer().pixel(x, 0)).collect();
        assert_eq!(row, vec![3, 2, 1, 0]);
    }

    #[test]
    fn clip_trims_source_like_destination() {
        let compositor = Compositor::new();
        let mut src = Rect::new(0, 0, 20, 20);
        let mut dest = Rect::new(-5, 470, 15, 490);
        compositor.clip(&mut src, &mut dest, false);
        assert_eq!(dest, Rect::new(0, 470, 15, 480));
        assert_eq!(src, Rect::new(5, 0, 20, 10));

        let mut src = Rect::new(0, 0, 20, 20);
        let mut dest = Rect::new(630, 0, 650, 20);
        compositor.clip(&mut src, &mut dest, true);
        assert_eq!(src, Rect::new(10, 0, 20, 20));
    }

    #[test]
    fn trans_table_selection_is_restored_after_draw() {
        let frame = GraphicFrame::solid(1, 1, 2);
        let (resources, id) = resources_with(frame);
        let mut first = vec![0u8; 256 * 256];
        let mut second = vec![0u8; 256 * 256];
        first[(2 << 8) | 7] = 11;
        second[(2 << 8) | 7] = 22;

        let mut compositor = Compositor::new();
        compositor.setup_trans_tables(vec![TransTable { data: first }, TransTable { data: second }]);
        compositor.back_buffer_mut().fill(7);
        compositor
            .draw_with_trans_table(&resources, id, 0, Point::new(0, 0), DrawFlags::empty(), 1)
            .unwrap();

        assert_eq!(compositor.back_buffer().pixel(0, 0), Some(22));
        assert_eq!(compositor.selected_trans_table(), Some(0));

        compositor.select_trans_table(9);
        assert_eq!(compositor.selected_trans_table(), Some(0));
    }

    #[test]
    fn missing_frame_is_a_content_error() {
        let (resources, id) = resources_with(GraphicFrame::solid(1, 1, 1));
        let mut compositor = Compositor::new();
        let err = compositor
            .draw(&resources, id, 3, Point::default(), DrawFlags::empty(), true)
            .unwrap_err();
        assert_eq!(
            err,
            ContentError::FrameOutOfRange {
                resource: id,
                frame: 3
            }
        );
    }

    #[test]
    fn wide_screen_bars_cover_top_and_bottom() {
        let mut compositor = Compositor::new();
        compositor.back_buffer_mut().fill(5);
        compositor.draw_wide_screen_bars(8);
        assert_eq!(compositor.back_buffer().pixel(0, 7), Some(0));
        assert_eq!(compositor.back_buffer().pixel(0, 8), Some(5));
        assert_eq!(compositor.back_buffer().pixel(639, 472), Some(0));
        assert_eq!(compositor.back_buffer().pixel(639, 471), Some(5));
    }
}
