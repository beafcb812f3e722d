use wgpu::{Buffer, BufferUsages, Device, Queue};

use life_backdrop::simulation::Grid;

/// Packed value for a dead cell
pub const DEAD_CELL: u32 = 0;

/// Alpha byte marking a live cell; the low 24 bits hold its RGB color
const ALIVE_FLAG: u32 = 0xFF00_0000;

/// Render parameters passed to the fragment shader (16 bytes)
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RenderParams {
    pub grid_width: u32,
    pub grid_height: u32,
    pub cell_size: f32,
    /// 1 when the surface format is sRGB and palette colors need linearizing
    pub srgb_target: u32,
}

/// Storage buffer holding one packed `u32` per cell, plus its uniforms.
///
/// Sized for one grid; a resized grid gets a fresh `CellBuffers`.
pub struct CellBuffers {
    pub cells_buffer: Buffer,
    pub params_buffer: Buffer,
    pub width: u32,
    pub height: u32,
    packed: Vec<u32>,
}

impl CellBuffers {
    pub fn new(device: &Device, width: u32, height: u32) -> Self {
        let cell_count = (width * height) as usize;
        let buffer_size = (cell_count * std::mem::size_of::<u32>()) as u64;

        let cells_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("cells-buffer"),
            size: buffer_size,
            usage: BufferUsages::STORAGE | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("render-params-buffer"),
            size: std::mem::size_of::<RenderParams>() as u64,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            cells_buffer,
            params_buffer,
            width,
            height,
            packed: vec![DEAD_CELL; cell_count],
        }
    }

    pub fn matches(&self, grid: &Grid) -> bool {
        self.width as usize == grid.width() && self.height as usize == grid.height()
    }

    /// Upload the cell field of `grid`, which must match these dimensions
    pub fn upload_cells(&mut self, queue: &Queue, grid: &Grid) {
        if !self.matches(grid) {
            log::warn!(
                "Skipping upload: grid {}x{} does not fit buffers {}x{}",
                grid.width(),
                grid.height(),
                self.width,
                self.height
            );
            return;
        }
        pack_cells(grid, &mut self.packed);
        queue.write_buffer(&self.cells_buffer, 0, bytemuck::cast_slice(&self.packed));
    }

    pub fn update_params(&self, queue: &Queue, cell_size: u32, srgb_target: bool) {
        let params = RenderParams {
            grid_width: self.width,
            grid_height: self.height,
            cell_size: cell_size as f32,
            srgb_target: srgb_target as u32,
        };
        queue.write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&params));
    }
}

/// Pack a grid into `out`, row-major, one `u32` per cell
pub fn pack_cells(grid: &Grid, out: &mut Vec<u32>) {
    out.clear();
    for y in 0..grid.height() as i64 {
        for x in 0..grid.width() as i64 {
            out.push(match grid.color_at(x, y) {
                Some(color) => ALIVE_FLAG | color.to_hex(),
                None => DEAD_CELL,
            });
        }
    }
}
