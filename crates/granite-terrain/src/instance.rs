use granite_core::bytemuck::{self, Pod, Zeroable};
use granite_core::glam::{UVec2, Vec2};
use granite_core::static_assertions::const_assert_eq;

use std::mem;

/// Per-patch data consumed by the instanced terrain shader. Eight tightly packed floats.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[repr(C)]
pub struct TerrainInstance {
    /// Patch origin in height field texels.
    pub position: [f32; 2],
    pub patch_scale: f32,
    pub double_patch_scale: f32,
    pub morph_params: [f32; 2],
    pub level: f32,
    /// Patch edge length in height field texels.
    pub patch_size: f32,
}

unsafe impl Zeroable for TerrainInstance {}
unsafe impl Pod for TerrainInstance {}

pub const INSTANCE_STRIDE: usize = mem::size_of::<TerrainInstance>();

const_assert_eq!(INSTANCE_STRIDE, 32);

impl TerrainInstance {
    pub fn new(position: UVec2, patch_scale: u32, morph_params: Vec2, level: u32, patch_size: u32) -> Self {
        Self {
            position: position.as_vec2().to_array(),
            patch_scale: patch_scale as f32,
            double_patch_scale: patch_scale as f32 * 2.0,
            morph_params: morph_params.to_array(),
            level: level as f32,
            patch_size: patch_size as f32,
        }
    }

    #[inline]
    pub fn position(&self) -> UVec2 {
        Vec2::from_array(self.position).as_uvec2()
    }

    #[inline]
    pub fn level(&self) -> u32 {
        self.level as u32
    }

    /// Reads the instance at slot `index` of a buffer that starts at byte `offset`.
    pub fn read(buffer: &[u8], offset: usize, index: usize) -> Self {
        let start = offset + index * INSTANCE_STRIDE;
        bytemuck::pod_read_unaligned(&buffer[start..start + INSTANCE_STRIDE])
    }
}

/// Something instances can be appended to, up to a fixed capacity.
///
/// Pushing past capacity drops the instance but still counts it, so the caller can find out how large the buffer should have
/// been.
pub trait InstanceSink {
    fn capacity(&self) -> usize;

    /// Number of instances pushed so far, including the ones that did not fit.
    fn requested(&self) -> usize;

    fn push(&mut self, instance: TerrainInstance);

    /// Number of instances actually stored.
    #[inline]
    fn written(&self) -> usize {
        self.requested().min(self.capacity())
    }
}

/// Appends instances into a caller-owned byte buffer, starting at a byte offset.
pub struct ByteInstanceWriter<'a> {
    buffer: &'a mut [u8],
    offset: usize,
    capacity: usize,
    requested: usize,
}

impl<'a> ByteInstanceWriter<'a> {
    /// Capacity is `max_instances`, or whatever fits between `offset` and the end of `buffer` if that is less.
    pub fn new(buffer: &'a mut [u8], offset: usize, max_instances: usize) -> Self {
        let available = buffer.len().saturating_sub(offset) / INSTANCE_STRIDE;
        Self {
            buffer,
            offset,
            capacity: max_instances.min(available),
            requested: 0,
        }
    }
}

impl<'a> InstanceSink for ByteInstanceWriter<'a> {
    #[inline]
    fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    fn requested(&self) -> usize {
        self.requested
    }

    fn push(&mut self, instance: TerrainInstance) {
        if self.requested < self.capacity {
            let start = self.offset + self.requested * INSTANCE_STRIDE;
            self.buffer[start..start + INSTANCE_STRIDE].copy_from_slice(bytemuck::bytes_of(&instance));
        } else {
            log::error!(
                "instance index {} too big (capacity {})",
                self.requested,
                self.capacity
            );
        }
        self.requested += 1;
    }
}

/// Appends instances into a typed slice.
pub struct SliceInstanceWriter<'a> {
    instances: &'a mut [TerrainInstance],
    requested: usize,
}

impl<'a> SliceInstanceWriter<'a> {
    pub fn new(instances: &'a mut [TerrainInstance]) -> Self {
        Self {
            instances,
            requested: 0,
        }
    }
}

impl<'a> InstanceSink for SliceInstanceWriter<'a> {
    #[inline]
    fn capacity(&self) -> usize {
        self.instances.len()
    }

    #[inline]
    fn requested(&self) -> usize {
        self.requested
    }

    fn push(&mut self, instance: TerrainInstance) {
        if let Some(slot) = self.instances.get_mut(self.requested) {
            *slot = instance;
        } else {
            log::error!(
                "instance index {} too big (capacity {})",
                self.requested,
                self.instances.len()
            );
        }
        self.requested += 1;
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

#[cfg(test)]
mod test {
    use super::*;

    fn instance(level: u32) -> TerrainInstance {
        TerrainInstance::new(UVec2::new(32, 64), 2, Vec2::new(0.5, -1.5), level, 64)
    }

    #[test]
    fn record_layout() {
        let floats: [f32; 8] = bytemuck::cast(instance(1));
        assert_eq!(floats, [32.0, 64.0, 2.0, 4.0, 0.5, -1.5, 1.0, 64.0]);
    }

    #[test]
    fn byte_writer_respects_offset_and_capacity() {
        // Room for two records after the offset, even though four were requested.
        let mut buffer = vec![0u8; 8 + 2 * INSTANCE_STRIDE + 5];
        let mut writer = ByteInstanceWriter::new(&mut buffer, 8, 4);
        assert_eq!(writer.capacity(), 2);

        for level in 0..3 {
            writer.push(instance(level));
        }
        assert_eq!(writer.requested(), 3);
        assert_eq!(writer.written(), 2);

        assert!(buffer[..8].iter().all(|b| *b == 0));
        assert_eq!(TerrainInstance::read(&buffer, 8, 0).level(), 0);
        assert_eq!(TerrainInstance::read(&buffer, 8, 1).level(), 1);
        assert!(buffer[8 + 2 * INSTANCE_STRIDE..].iter().all(|b| *b == 0));
    }

    #[test]
    fn offset_past_end_has_no_capacity() {
        let mut buffer = vec![0u8; 16];
        let mut writer = ByteInstanceWriter::new(&mut buffer, 32, 10);
        assert_eq!(writer.capacity(), 0);
        writer.push(instance(0));
        assert_eq!(writer.requested(), 1);
        assert_eq!(writer.written(), 0);
    }

    #[test]
    fn slice_writer_counts_overflow() {
        let mut instances = [TerrainInstance::default(); 1];
        let mut writer = SliceInstanceWriter::new(&mut instances);
        writer.push(instance(3));
        writer.push(instance(4));
        assert_eq!(writer.requested(), 2);
        assert_eq!(writer.written(), 1);
        assert_eq!(instances[0].level(), 3);
        assert_eq!(instances[0].position(), UVec2::new(32, 64));
    }
}
