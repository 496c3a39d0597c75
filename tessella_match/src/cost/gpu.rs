//! GPU cost backend: a wgpu compute pass with one invocation per matrix
//! cell, arranged in 16×16 workgroups.
//!
//! Feature tensors are uploaded once per build; the finished matrix is
//! copied into a staging buffer and mapped back to the host. Only pixel,
//! mean-color and Sobel features have kernels here; embedding tensors are
//! rejected before any device work starts.

use super::{CostBackend, CostMatrix, FeaturePair, tile_count};
use crate::features::FeatureTensor;
use anyhow::{Context, Result, bail};
use tessella_core::{MosaicError, MosaicResult};
use wgpu::util::DeviceExt;

const WORKGROUP_SIZE: u32 = 16;
const SHADER: &str = include_str!("cost.wgsl");

/// Uniform block mirrored by `Params` in cost.wgsl.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct Params {
	n: u32,
	tile_bytes: u32,
	words_per_tile: u32,
	pad0: u32,
	w_pixel: f32,
	w_mean: f32,
	w_sobel: f32,
	pad1: f32,
}

/// Builds the matrix on a wgpu device, one thread per (i, j) cell.
pub struct GpuCostBackend {
	device: wgpu::Device,
	queue: wgpu::Queue,
}

impl GpuCostBackend {
	/// Acquires the highest-power adapter on the host; `None` when no
	/// usable device exists.
	pub fn new() -> Option<Self> {
		let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
		let adapter = futures::executor::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
			power_preference: wgpu::PowerPreference::HighPerformance,
			force_fallback_adapter: false,
			compatible_surface: None,
		}))?;
		log::debug!("gpu adapter: {}", adapter.get_info().name);

		let (device, queue) =
			futures::executor::block_on(adapter.request_device(&wgpu::DeviceDescriptor::default(), None)).ok()?;
		Some(Self { device, queue })
	}

	fn build_inner(&self, pairs: &[FeaturePair], n: usize) -> Result<CostMatrix> {
		// Sort the enabled tensors into the fixed binding slots.
		let mut w_pixel = 0.0f32;
		let mut w_mean = 0.0f32;
		let mut w_sobel = 0.0f32;
		let mut pixel: Option<(&[u8], &[u8], usize)> = None;
		let mut sobel: Option<(&[u8], &[u8], usize)> = None;
		let mut mean: Option<(&[f32], &[f32])> = None;

		for pair in pairs {
			match (&pair.receiver, &pair.donor) {
				(
					FeatureTensor::Pixels { data: r, tile_len },
					FeatureTensor::Pixels { data: d, .. },
				) => {
					w_pixel += pair.weight;
					pixel = Some((r, d, *tile_len));
				}
				(
					FeatureTensor::Sobel { data: r, tile_len },
					FeatureTensor::Sobel { data: d, .. },
				) => {
					w_sobel += pair.weight;
					sobel = Some((r, d, *tile_len));
				}
				(FeatureTensor::MeanColor { data: r }, FeatureTensor::MeanColor { data: d }) => {
					w_mean += pair.weight;
					mean = Some((r, d));
				}
				_ => bail!("feature {:?} has no gpu similarity implementation", pair.receiver.kind()),
			}
		}

		let tile_bytes = pixel.or(sobel).map_or(0, |(_, _, tile_len)| tile_len);
		let words_per_tile = tile_bytes.div_ceil(4).max(1);

		let params = Params {
			n: n as u32,
			tile_bytes: tile_bytes as u32,
			words_per_tile: words_per_tile as u32,
			pad0: 0,
			w_pixel,
			w_mean,
			w_sobel,
			pad1: 0.0,
		};

		let pack = |tensor: Option<&[u8]>| -> Vec<u32> {
			match tensor {
				Some(data) => pack_tiles(data, tile_bytes, words_per_tile),
				None => vec![0u32],
			}
		};
		let recv_pixels = pack(pixel.map(|(r, _, _)| r));
		let donor_pixels = pack(pixel.map(|(_, d, _)| d));
		let recv_sobel = pack(sobel.map(|(r, _, _)| r));
		let donor_sobel = pack(sobel.map(|(_, d, _)| d));
		let recv_mean = mean.map_or(vec![0.0f32; 3], |(r, _)| r.to_vec());
		let donor_mean = mean.map_or(vec![0.0f32; 3], |(_, d)| d.to_vec());

		let storage = |label: &str, contents: &[u8]| {
			self
				.device
				.create_buffer_init(&wgpu::util::BufferInitDescriptor {
					label: Some(label),
					contents,
					usage: wgpu::BufferUsages::STORAGE,
				})
		};

		let params_buffer = self
			.device
			.create_buffer_init(&wgpu::util::BufferInitDescriptor {
				label: Some("cost_params"),
				contents: bytemuck::bytes_of(&params),
				usage: wgpu::BufferUsages::UNIFORM,
			});
		let recv_pixels_buffer = storage("recv_pixels", bytemuck::cast_slice(&recv_pixels));
		let donor_pixels_buffer = storage("donor_pixels", bytemuck::cast_slice(&donor_pixels));
		let recv_sobel_buffer = storage("recv_sobel", bytemuck::cast_slice(&recv_sobel));
		let donor_sobel_buffer = storage("donor_sobel", bytemuck::cast_slice(&donor_sobel));
		let recv_mean_buffer = storage("recv_mean", bytemuck::cast_slice(&recv_mean));
		let donor_mean_buffer = storage("donor_mean", bytemuck::cast_slice(&donor_mean));

		let cost_size = (n * n * size_of::<f32>()) as u64;
		let cost_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
			label: Some("cost_matrix"),
			size: cost_size,
			usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
			mapped_at_creation: false,
		});
		let staging_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
			label: Some("cost_readback"),
			size: cost_size,
			usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
			mapped_at_creation: false,
		});

		let storage_layout = |binding: u32, read_only: bool| wgpu::BindGroupLayoutEntry {
			binding,
			visibility: wgpu::ShaderStages::COMPUTE,
			ty: wgpu::BindingType::Buffer {
				ty: wgpu::BufferBindingType::Storage { read_only },
				has_dynamic_offset: false,
				min_binding_size: None,
			},
			count: None,
		};
		let bind_group_layout = self
			.device
			.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
				label: Some("cost_bind_group_layout"),
				entries: &[
					wgpu::BindGroupLayoutEntry {
						binding: 0,
						visibility: wgpu::ShaderStages::COMPUTE,
						ty: wgpu::BindingType::Buffer {
							ty: wgpu::BufferBindingType::Uniform,
							has_dynamic_offset: false,
							min_binding_size: None,
						},
						count: None,
					},
					storage_layout(1, true),
					storage_layout(2, true),
					storage_layout(3, true),
					storage_layout(4, true),
					storage_layout(5, true),
					storage_layout(6, true),
					storage_layout(7, false),
				],
			});

		let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
			label: Some("cost_bind_group"),
			layout: &bind_group_layout,
			entries: &[
				wgpu::BindGroupEntry {
					binding: 0,
					resource: params_buffer.as_entire_binding(),
				},
				wgpu::BindGroupEntry {
					binding: 1,
					resource: recv_pixels_buffer.as_entire_binding(),
				},
				wgpu::BindGroupEntry {
					binding: 2,
					resource: donor_pixels_buffer.as_entire_binding(),
				},
				wgpu::BindGroupEntry {
					binding: 3,
					resource: recv_sobel_buffer.as_entire_binding(),
				},
				wgpu::BindGroupEntry {
					binding: 4,
					resource: donor_sobel_buffer.as_entire_binding(),
				},
				wgpu::BindGroupEntry {
					binding: 5,
					resource: recv_mean_buffer.as_entire_binding(),
				},
				wgpu::BindGroupEntry {
					binding: 6,
					resource: donor_mean_buffer.as_entire_binding(),
				},
				wgpu::BindGroupEntry {
					binding: 7,
					resource: cost_buffer.as_entire_binding(),
				},
			],
		});

		let shader = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
			label: Some("cost_kernel"),
			source: wgpu::ShaderSource::Wgsl(SHADER.into()),
		});
		let pipeline_layout = self
			.device
			.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
				label: Some("cost_pipeline_layout"),
				bind_group_layouts: &[&bind_group_layout],
				push_constant_ranges: &[],
			});
		let pipeline = self
			.device
			.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
				label: Some("cost_pipeline"),
				layout: Some(&pipeline_layout),
				module: &shader,
				entry_point: Some("main"),
				compilation_options: wgpu::PipelineCompilationOptions::default(),
				cache: None,
			});

		let mut encoder = self
			.device
			.create_command_encoder(&wgpu::CommandEncoderDescriptor {
				label: Some("cost_encoder"),
			});
		{
			let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
				label: Some("cost_pass"),
				timestamp_writes: None,
			});
			pass.set_pipeline(&pipeline);
			pass.set_bind_group(0, &bind_group, &[]);
			let groups = (n as u32).div_ceil(WORKGROUP_SIZE);
			pass.dispatch_workgroups(groups, groups, 1);
		}
		encoder.copy_buffer_to_buffer(&cost_buffer, 0, &staging_buffer, 0, cost_size);
		self.queue.submit(Some(encoder.finish()));

		let slice = staging_buffer.slice(..);
		let (tx, rx) = std::sync::mpsc::channel();
		slice.map_async(wgpu::MapMode::Read, move |result| {
			let _ = tx.send(result);
		});
		let _ = self.device.poll(wgpu::Maintain::Wait);
		rx.recv().context("gpu readback did not complete")??;

		let data = {
			let view = slice.get_mapped_range();
			bytemuck::cast_slice::<u8, f32>(&view).to_vec()
		};
		staging_buffer.unmap();

		Ok(CostMatrix::new(n, data)?)
	}
}

impl CostBackend for GpuCostBackend {
	fn name(&self) -> &'static str {
		"gpu"
	}

	fn build(&self, pairs: &[FeaturePair]) -> MosaicResult<CostMatrix> {
		let n = tile_count(pairs)?;
		self.build_inner(pairs, n).map_err(MosaicError::Image)
	}
}

/// Packs per-tile bytes four-per-u32, little-endian within each word, with
/// a zero-padded `words_per_tile` stride.
fn pack_tiles(data: &[u8], tile_len: usize, words_per_tile: usize) -> Vec<u32> {
	let n = data.len() / tile_len;
	let mut out = vec![0u32; n * words_per_tile];
	for t in 0..n {
		let tile = &data[t * tile_len..(t + 1) * tile_len];
		for (b, &byte) in tile.iter().enumerate() {
			out[t * words_per_tile + b / 4] |= u32::from(byte) << (8 * (b % 4));
		}
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::cost::CpuCostBackend;
	use tessella_image::{Image, TileGrid};

	#[test]
	fn pack_tiles_pads_each_tile_to_word_stride() {
		// Two tiles of 6 bytes each pack into 2 words per tile.
		let data = vec![1u8, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];
		let packed = pack_tiles(&data, 6, 2);
		assert_eq!(packed.len(), 4);
		assert_eq!(packed[0], u32::from_le_bytes([1, 2, 3, 4]));
		assert_eq!(packed[1], u32::from_le_bytes([5, 6, 0, 0]));
		assert_eq!(packed[2], u32::from_le_bytes([7, 8, 9, 10]));
		assert_eq!(packed[3], u32::from_le_bytes([11, 12, 0, 0]));
	}

	// Exercised only on hosts with a usable adapter; CI without a GPU
	// skips it at runtime.
	#[test]
	fn cpu_gpu_parity_on_mixed_features() {
		let Some(gpu) = GpuCostBackend::new() else {
			eprintln!("no gpu adapter available, skipping parity test");
			return;
		};

		let receiver = Image::from_fn(48, 48, |x, y| [(x * 5) as u8, (y * 5) as u8, ((x + y) * 3) as u8]);
		let donor = Image::from_fn(48, 48, |x, y| [(255 - x * 5) as u8, (y * 4) as u8, (x * y / 9) as u8]);
		let rg = TileGrid::partition(&receiver, 8).unwrap();
		let dg = TileGrid::partition(&donor, 8).unwrap();

		let pairs = [
			FeaturePair::new(
				0.5,
				FeatureTensor::pixels(&rg, true),
				FeatureTensor::pixels(&dg, true),
			),
			FeaturePair::new(0.2, FeatureTensor::mean_color(&rg), FeatureTensor::mean_color(&dg)),
			FeaturePair::new(0.3, FeatureTensor::sobel(&rg), FeatureTensor::sobel(&dg)),
		];

		let cpu_matrix = CpuCostBackend.build(&pairs).unwrap();
		let gpu_matrix = gpu.build(&pairs).unwrap();
		assert_eq!(cpu_matrix.n(), gpu_matrix.n());

		let max_diff = cpu_matrix
			.data()
			.iter()
			.zip(gpu_matrix.data())
			.map(|(a, b)| (a - b).abs())
			.fold(0.0f32, f32::max);
		assert!(max_diff <= 1e-4, "cpu/gpu disagree by {max_diff}");
	}

	#[test]
	fn embedding_features_are_rejected_before_device_work() {
		let Some(gpu) = GpuCostBackend::new() else {
			return;
		};

		let tensor = crate::features::FeatureTensor::Embedding {
			data: vec![1.0, 0.0],
			dim: 1,
		};
		assert!(gpu.build(&[FeaturePair::new(1.0, tensor.clone(), tensor)]).is_err());
	}
}
