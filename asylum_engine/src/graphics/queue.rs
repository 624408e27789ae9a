use std::mem;

use asylum_formats::ResourceId;
use serde::Serialize;

use super::compositor::{Compositor, DrawFlags};
use super::surface::Point;
use crate::error::ContentResult;
use crate::resources::ResourceProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GraphicItemKind {
    Normal {
        /// One-based; zero or negative draws without a transparency table.
        trans_table: i32,
    },
    Masked {
        mask: ResourceId,
        destination: Point,
    },
    /// Blended against the background image instead of the back buffer.
    Crossfade {
        background: ResourceId,
        background_offset: Point,
        table: i32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GraphicQueueItem {
    pub resource_id: ResourceId,
    pub frame_index: u32,
    pub source: Point,
    #[serde(skip)]
    pub flags: DrawFlags,
    pub priority: i32,
    pub kind: GraphicItemKind,
}

/// Draw requests collected during a frame and resolved back to front.
#[derive(Debug, Clone, Default)]
pub struct DrawQueue {
    items: Vec<GraphicQueueItem>,
}

impl DrawQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[GraphicQueueItem] {
        &self.items
    }

    pub fn push(&mut self, item: GraphicQueueItem) {
        self.items.push(item);
    }

    pub fn add(
        &mut self,
        resource_id: ResourceId,
        frame_index: u32,
        source: Point,
        flags: DrawFlags,
        trans_table: i32,
        priority: i32,
    ) {
        self.push(GraphicQueueItem {
            resource_id,
            frame_index,
            source,
            flags,
            priority,
            kind: GraphicItemKind::Normal { trans_table },
        });
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_masked(
        &mut self,
        resource_id: ResourceId,
        frame_index: u32,
        source: Point,
        mask: ResourceId,
        destination: Point,
        flags: DrawFlags,
        priority: i32,
    ) {
        self.push(GraphicQueueItem {
            resource_id,
            frame_index,
            source,
            flags,
            priority,
            kind: GraphicItemKind::Masked { mask, destination },
        });
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_crossfade(
        &mut self,
        resource_id: ResourceId,
        frame_index: u32,
        source: Point,
        background: ResourceId,
        background_offset: Point,
        table: i32,
        priority: i32,
    ) {
        self.push(GraphicQueueItem {
            resource_id,
            frame_index,
            source,
            flags: DrawFlags::empty(),
            priority,
            kind: GraphicItemKind::Crossfade {
                background,
                background_offset,
                table,
            },
        });
    }

    /// Removes the first queued item drawing `resource_id`.
    pub fn remove_resource(&mut self, resource_id: ResourceId) {
        if let Some(index) = self
            .items
            .iter()
            .position(|item| item.resource_id == resource_id)
        {
            self.items.remove(index);
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Takes the queued items in draw order, leaving the queue empty.
    ///
    /// Selection sort on descending priority where the scan for the maximum
    /// keeps the last candidate among equals: items of equal priority come
    /// out in reverse insertion order.
    pub fn take_sorted(&mut self) -> Vec<GraphicQueueItem> {
        let mut items = mem::take(&mut self.items);
        for i in 0..items.len() {
            let mut max = i;
            for j in i + 1..items.len() {
                if items[j].priority >= items[max].priority {
                    max = j;
                }
            }
            if max != i {
                items.swap(i, max);
            }
        }
        items
    }

    /// Draws every queued item onto the compositor's back buffer.
    /// `performance` at or below 1 disables transparency tables.
    pub fn flush(
        &mut self,
        compositor: &mut Compositor,
        resources: &dyn ResourceProvider,
        performance: i32,
    ) -> ContentResult<()> {
        let items = self.take_sorted();
        for item in &items {
            match item.kind {
                GraphicItemKind::Normal { trans_table } if trans_table <= 0 || performance <= 1 => {
                    compositor.draw(
                        resources,
                        item.resource_id,
                        item.frame_index,
                        item.source,
                        item.flags,
                        true,
                    )?
                }
                GraphicItemKind::Normal { trans_table } => compositor.draw_with_trans_table(
                    resources,
                    item.resource_id,
                    item.frame_index,
                    item.source,
                    item.flags,
                    (trans_table - 1) as usize,
                )?,
                GraphicItemKind::Masked { mask, destination } => compositor.draw_masked(
                    resources,
                    item.resource_id,
                    item.frame_index,
                    item.source,
                    item.flags,
                    mask,
                    destination,
                )?,
                GraphicItemKind::Crossfade {
                    background,
                    background_offset,
                    table,
                } => compositor.draw_crossfade(
                    resources,
                    item.resource_id,
                    item.frame_index,
                    item.source,
                    background,
                    background_offset,
                    table.max(0) as usize,
                )?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::InMemoryResources;
    use asylum_formats::{make_resource, GraphicFrame, GraphicResource};

    fn order(queue: &mut DrawQueue) -> Vec<ResourceId> {
        queue
            .take_sorted()
            .iter()
            .map(|item| item.resource_id)
            .collect()
    }

    #[test]
    fn equal_priorities_come_out_in_reverse_insertion_order() {
        let mut queue = DrawQueue::new();
        queue.add(1, 0, Point::default(), DrawFlags::empty(), 0, 5);
        queue.add(2, 0, Point::default(), DrawFlags::empty(), 0, 5);
        assert_eq!(order(&mut queue), vec![2, 1]);
        assert!(queue.is_empty());
    }

    #[test]
    fn higher_priority_is_drawn_first() {
        let mut queue = DrawQueue::new();
        queue.add(1, 0, Point::default(), DrawFlags::empty(), 0, 1);
        queue.add(2, 0, Point::default(), DrawFlags::empty(), 0, 9);
        queue.add(3, 0, Point::default(), DrawFlags::empty(), 0, 4);
        assert_eq!(order(&mut queue), vec![2, 3, 1]);
    }

    #[test]
    fn three_equal_items_follow_the_selection_scan() {
        let mut queue = DrawQueue::new();
        for id in 1..=3 {
            queue.add(id, 0, Point::default(), DrawFlags::empty(), 0, 0);
        }
        assert_eq!(order(&mut queue), vec![3, 1, 2]);
    }

    #[test]
    fn earlier_item_owns_overlap_when_priorities_tie() {
        let a = make_resource(5, 10);
        let b = make_resource(5, 11);
        let mut resources = InMemoryResources::new();
        resources.insert_graphic(a, GraphicResource::new(vec![GraphicFrame::solid(4, 4, 0xA)]));
        resources.insert_graphic(b, GraphicResource::new(vec![GraphicFrame::solid(4, 4, 0xB)]));

        let mut queue = DrawQueue::new();
        queue.add(a, 0, Point::new(0, 0), DrawFlags::empty(), 0, 3);
        queue.add(b, 0, Point::new(2, 2), DrawFlags::empty(), 0, 3);

        let mut compositor = Compositor::new();
        queue.flush(&mut compositor, &resources, 5).unwrap();

        assert_eq!(compositor.back_buffer().pixel(3, 3), Some(0xA));
        assert_eq!(compositor.back_buffer().pixel(5, 5), Some(0xB));
        assert!(queue.is_empty());
    }

    #[test]
    fn remove_resource_drops_first_match_only() {
        let mut queue = DrawQueue::new();
        queue.add(7, 0, Point::default(), DrawFlags::empty(), 0, 0);
        queue.add(7, 1, Point::default(), DrawFlags::empty(), 0, 0);
        queue.remove_resource(7);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.items()[0].frame_index, 1);
    }
}
