use crate::gpu::GpuContext;
use crate::shader::{UNIFORM_BLOCK_SIZE, UniformBlock};

/// Per-frame uniform storage addressed by dynamic offsets.
///
/// Each draw pushes its own copy of the blocks it uses, so later draws can
/// never overwrite the values of earlier ones before the frame is submitted.
/// The GPU buffer grows as needed and is reused across frames.
#[derive(Debug, Default)]
pub struct UniformArena {
    staging: Vec<u8>,
    allocation: Option<Allocation>,
}

#[derive(Debug)]
struct Allocation {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl Allocation {
    fn new(gpu: &GpuContext, needed: u64) -> Self {
        let size = needed.next_power_of_two().max(UNIFORM_BLOCK_SIZE * 16);
        log::debug!("uniform arena: allocating {size} bytes");

        let buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Uniform Arena"),
            size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Uniform Arena Bind Group"),
            layout: &gpu.layouts.uniforms,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(UNIFORM_BLOCK_SIZE),
                }),
            }],
        });
        Self { buffer, bind_group }
    }
}

impl UniformArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops the previous frame's blocks.
    pub fn clear(&mut self) {
        self.staging.clear();
    }

    /// Appends `block` and returns its dynamic offset.
    pub fn push(&mut self, block: &UniformBlock) -> u32 {
        let offset = self.staging.len() as u32;
        self.staging.extend_from_slice(block.as_bytes());
        offset
    }

    /// Number of blocks pushed this frame.
    pub fn len(&self) -> usize {
        self.staging.len() / UNIFORM_BLOCK_SIZE as usize
    }

    pub fn is_empty(&self) -> bool {
        self.staging.is_empty()
    }

    /// Bytes of the block pushed at `offset`.
    pub fn block(&self, offset: u32) -> Option<&[u8]> {
        let start = offset as usize;
        self.staging.get(start..start + UNIFORM_BLOCK_SIZE as usize)
    }

    /// Writes this frame's blocks to the GPU, growing the buffer if needed,
    /// and returns the bind group used for groups 0 and 1.
    pub fn upload(&mut self, gpu: &GpuContext) -> &wgpu::BindGroup {
        if self.staging.is_empty() {
            self.push(&UniformBlock::default());
        }

        let needed = self.staging.len() as u64;
        let allocation = match self.allocation.take() {
            Some(allocation) if allocation.buffer.size() >= needed => allocation,
            _ => Allocation::new(gpu, needed),
        };
        gpu.queue.write_buffer(&allocation.buffer, 0, &self.staging);
        &self.allocation.insert(allocation).bind_group
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::UniformValue;

    fn block_with(value: f32) -> UniformBlock {
        let mut block = UniformBlock::default();
        block.write(0, &UniformValue::Float(value));
        block
    }

    #[test]
    fn offsets_are_block_aligned() {
        let mut arena = UniformArena::new();
        let offsets: Vec<u32> = (0..4).map(|i| arena.push(&block_with(i as f32))).collect();
        assert_eq!(offsets, vec![0, 256, 512, 768]);
        assert_eq!(arena.len(), 4);
    }

    #[test]
    fn each_draw_keeps_its_own_values() {
        let mut arena = UniformArena::new();
        let first = arena.push(&block_with(1.0));
        let second = arena.push(&block_with(2.0));

        assert_eq!(&arena.block(first).unwrap()[..4], &1.0f32.to_ne_bytes()[..]);
        assert_eq!(&arena.block(second).unwrap()[..4], &2.0f32.to_ne_bytes()[..]);
    }

    #[test]
    fn clear_starts_a_new_frame() {
        let mut arena = UniformArena::new();
        arena.push(&block_with(1.0));
        arena.clear();
        assert!(arena.is_empty());
        assert_eq!(arena.push(&block_with(3.0)), 0);
    }
}
