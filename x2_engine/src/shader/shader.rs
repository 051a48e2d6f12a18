/// Graphic or compute pipeline built from reflected SPIR-V.
///
/// Loading a shader:
/// 1. parse the settings document
/// 2. read every bytecode file (relative to the settings file)
/// 3. reflect each module; duplicate stages keep the first one
/// 4. a single compute stage gives a compute pipeline, anything else a graphic one
/// 5. graphic: vertex inputs → vertex layout
/// 6. graphic: fragment outputs must match the subpass color attachments
///    (name → column index, location == index)
/// 7. descriptor bindings → one slot per set, classified from the set's bindings
/// 8. push constant ranges and set layouts (gaps filled with empty layouts)
/// 9. pipeline creation; module handles are dropped afterwards
///
/// Fields drop in declaration order: pipeline, set layouts, then the render
/// pass lease.

use std::path::Path;
use std::sync::Arc;
use bytemuck::Pod;
use rustc_hash::FxHashMap;
use crate::context::GraphicsContext;
use crate::error::Result;
use crate::graphics_device::{
    CommandBuffer, ComputePipelineDesc, DescriptorSetLayoutBinding, DescriptorType, GpuDescriptorSetLayout,
    GpuPipeline, GpuShaderModule, GraphicsPipelineDesc, ImageDim, PipelineStageDesc, PushConstantRange,
    ReflectedModule, ShaderStage, ShaderStageFlags, VertexInputLayout,
};
use crate::render_pass::{RenderPass, RenderPassLease};
use crate::{engine_bail_invalid, engine_debug, engine_err_invalid, engine_warn};
use super::shader_settings::ShaderSettings;
use super::slot::{classify_slot, SlotDescriptor};
use super::vertex_layout::build_vertex_input;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineKind {
    Graphic,
    Compute,
}

/// One reflected binding of a set, with the stages using it
struct SetBinding {
    name: String,
    descriptor_type: DescriptorType,
    image_dim: Option<ImageDim>,
    count: u32,
    stages: ShaderStageFlags,
}

pub struct Shader {
    pipeline: Arc<dyn GpuPipeline>,
    set_layouts: Vec<Arc<dyn GpuDescriptorSetLayout>>,
    render_pass: Option<RenderPassLease>,
    name: String,
    settings: ShaderSettings,
    kind: PipelineKind,
    subpass: u32,
    slots: FxHashMap<String, SlotDescriptor>,
    push_constant_ranges: Vec<PushConstantRange>,
    vertex_input: VertexInputLayout,
    color_attachments: Vec<String>,
}

impl Shader {
    /// Load a shader from its settings file
    ///
    /// The shader is named after the settings file stem.
    pub fn load(ctx: &GraphicsContext, path: &Path) -> Result<Self> {
        let settings = ShaderSettings::load(path)?;
        let directory = path.parent().unwrap_or_else(|| Path::new(""));

        let mut modules = Vec::with_capacity(settings.shader_paths.len());
        for relative in &settings.shader_paths {
            let file = directory.join(relative);
            let code = std::fs::read(&file)
                .map_err(|e| engine_err_invalid!("x2::Shader",
                    "Cannot read shader bytecode '{}': {}", file.display(), e))?;
            modules.push(code);
        }

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::from_settings(ctx, &name, settings, &modules)
    }

    /// Build a shader from settings and in-memory bytecode (one blob per
    /// settings path)
    pub fn from_settings(
        ctx: &GraphicsContext,
        name: &str,
        settings: ShaderSettings,
        modules: &[Vec<u8>],
    ) -> Result<Self> {
        let device = ctx.device();

        // Reflect, first module of each stage wins
        let mut stages: Vec<(ReflectedModule, &[u8])> = Vec::with_capacity(modules.len());
        for code in modules {
            let reflected = device.reflect_shader_module(code)?;
            if stages.iter().any(|(m, _)| m.stage == reflected.stage) {
                engine_warn!("x2::Shader",
                    "Shader '{}': duplicate {:?} stage skipped", name, reflected.stage);
                continue;
            }
            stages.push((reflected, code.as_slice()));
        }

        if stages.is_empty() {
            engine_bail_invalid!("x2::Shader", "Shader '{}' has no stage", name);
        }

        let kind = if stages.len() == 1 && stages[0].0.stage == ShaderStage::Compute {
            PipelineKind::Compute
        } else if stages.iter().any(|(m, _)| m.stage == ShaderStage::Compute) {
            engine_bail_invalid!("x2::Shader",
                "Shader '{}' mixes a compute stage with other stages", name);
        } else {
            PipelineKind::Graphic
        };

        let handles = stages
            .iter()
            .map(|(_, code)| device.create_shader_module(code))
            .collect::<Result<Vec<Box<dyn GpuShaderModule>>>>()?;

        let (slots, set_bindings) = build_slots(name, &stages)?;
        let push_constant_ranges = merge_push_constants(&stages);

        let mut set_layouts = Vec::with_capacity(set_bindings.len());
        for bindings in &set_bindings {
            set_layouts.push(device.create_descriptor_set_layout(bindings)?);
        }
        let layout_refs: Vec<&dyn GpuDescriptorSetLayout> = set_layouts.iter().map(|l| l.as_ref()).collect();

        let stage_descs: Vec<PipelineStageDesc> = stages
            .iter()
            .zip(&handles)
            .map(|((module, _), handle)| PipelineStageDesc {
                stage: module.stage.flags(),
                module: handle.as_ref(),
                entry_point: module.entry_point.as_str(),
            })
            .collect();

        let mut render_pass = None;
        let mut subpass = 0;
        let mut vertex_input = VertexInputLayout::default();
        let mut color_attachments = Vec::new();

        let pipeline = match kind {
            PipelineKind::Compute => {
                let stage = match stage_descs.into_iter().next() {
                    Some(stage) => stage,
                    None => engine_bail_invalid!("x2::Shader", "Shader '{}' has no stage", name),
                };
                device.create_compute_pipeline(&ComputePipelineDesc {
                    stage,
                    set_layouts: layout_refs,
                    push_constant_ranges: &push_constant_ranges,
                })?
            }
            PipelineKind::Graphic => {
                let vertex = match stages.iter().find(|(m, _)| m.stage == ShaderStage::Vertex) {
                    Some((module, _)) => module,
                    None => engine_bail_invalid!("x2::Shader", "Shader '{}' has no vertex stage", name),
                };
                vertex_input = build_vertex_input(&vertex.inputs)?;

                let pass_name = match &settings.render_pass {
                    Some(pass_name) => pass_name,
                    None => engine_bail_invalid!("x2::Shader",
                        "Graphic shader '{}' names no render pass", name),
                };
                let lease = ctx.lease_render_pass(pass_name)?;
                subpass = match &settings.subpass {
                    Some(subpass_name) => lease.subpass(subpass_name)?.index,
                    None => 0,
                };

                if let Some((fragment, _)) = stages.iter().find(|(m, _)| m.stage == ShaderStage::Fragment) {
                    color_attachments = match_fragment_outputs(name, fragment, &lease, subpass)?;
                }

                let pipeline = device.create_graphics_pipeline(&GraphicsPipelineDesc {
                    stages: stage_descs,
                    vertex_input: &vertex_input,
                    set_layouts: layout_refs,
                    push_constant_ranges: &push_constant_ranges,
                    state: &settings.state,
                    color_attachment_count: color_attachments.len() as u32,
                    render_pass: lease.gpu_render_pass(),
                    subpass,
                })?;
                render_pass = Some(lease);
                pipeline
            }
        };
        drop(handles);

        engine_debug!("x2::Shader", "Built {:?} shader '{}' ({} slots, {} sets)",
            kind, name, slots.len(), set_layouts.len());

        Ok(Self {
            pipeline,
            set_layouts,
            render_pass,
            name: name.to_string(),
            settings,
            kind,
            subpass,
            slots,
            push_constant_ranges,
            vertex_input,
            color_attachments,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings(&self) -> &ShaderSettings {
        &self.settings
    }

    pub fn kind(&self) -> PipelineKind {
        self.kind
    }

    /// Look up a slot by name
    pub fn slot(&self, name: &str) -> Result<&SlotDescriptor> {
        match self.slots.get(name) {
            Some(slot) => Ok(slot),
            None => engine_bail_invalid!("x2::Shader", "Shader '{}' has no slot '{}'", self.name, name),
        }
    }

    pub fn slots(&self) -> impl Iterator<Item = &SlotDescriptor> {
        self.slots.values()
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn descriptor_set_layout(&self, set: u32) -> Option<&dyn GpuDescriptorSetLayout> {
        self.set_layouts.get(set as usize).map(|l| l.as_ref())
    }

    /// Number of set layouts (highest set + 1)
    pub fn set_count(&self) -> usize {
        self.set_layouts.len()
    }

    pub fn pipeline(&self) -> &dyn GpuPipeline {
        self.pipeline.as_ref()
    }

    pub fn render_pass(&self) -> Option<&Arc<RenderPass>> {
        self.render_pass.as_ref().map(|lease| lease.render_pass())
    }

    pub fn subpass(&self) -> u32 {
        self.subpass
    }

    pub fn vertex_input(&self) -> &VertexInputLayout {
        &self.vertex_input
    }

    pub fn push_constant_ranges(&self) -> &[PushConstantRange] {
        &self.push_constant_ranges
    }

    /// Color attachments written by the fragment stage, in location order
    pub fn color_attachments(&self) -> &[String] {
        &self.color_attachments
    }

    /// Bind the pipeline
    pub fn bind(&self, cmd: &mut dyn CommandBuffer) -> Result<()> {
        cmd.bind_pipeline(self.pipeline.as_ref())
    }

    /// Push `value` at `offset` to every stage whose range overlaps it
    pub fn push_constants<T: Pod>(&self, cmd: &mut dyn CommandBuffer, offset: u32, value: &T) -> Result<()> {
        let data = bytemuck::bytes_of(value);
        let end = offset + data.len() as u32;
        let stages = self
            .push_constant_ranges
            .iter()
            .filter(|r| r.offset < end && offset < r.offset + r.size)
            .fold(ShaderStageFlags::empty(), |acc, r| acc | r.stages);

        if stages.is_empty() {
            engine_bail_invalid!("x2::Shader",
                "Shader '{}' has no push constant range covering {}..{}", self.name, offset, end);
        }
        cmd.push_constants(self.pipeline.as_ref(), stages, offset, data)
    }
}

/// Fragment outputs → color attachment names, checked against the subpass
fn match_fragment_outputs(
    name: &str,
    fragment: &ReflectedModule,
    render_pass: &RenderPassLease,
    subpass: u32,
) -> Result<Vec<String>> {
    let info = match render_pass.subpasses().get(subpass as usize) {
        Some(info) => info,
        None => engine_bail_invalid!("x2::Shader",
            "Render pass '{}' has no subpass {}", render_pass.name(), subpass),
    };

    let mut outputs = fragment.outputs.clone();
    outputs.sort_by_key(|o| o.location);

    let mut names = Vec::with_capacity(outputs.len());
    for output in outputs {
        match info.color_attachment_index(&output.name) {
            Some(index) if index == output.location => names.push(output.name),
            Some(index) => engine_bail_invalid!("x2::Shader",
                "Shader '{}': output '{}' at location {} but attachment index is {} in '{}'",
                name, output.name, output.location, index, render_pass.name()),
            None => engine_bail_invalid!("x2::Shader",
                "Shader '{}': output '{}' matches no color attachment of subpass '{}' in '{}'",
                name, output.name, info.name, render_pass.name()),
        }
    }
    Ok(names)
}

/// Merge bindings across stages, classify one slot per set and build the
/// per-set layout bindings (index = set, gaps empty)
fn build_slots(
    name: &str,
    stages: &[(ReflectedModule, &[u8])],
) -> Result<(FxHashMap<String, SlotDescriptor>, Vec<Vec<DescriptorSetLayoutBinding>>)> {
    let mut sets: FxHashMap<u32, FxHashMap<u32, SetBinding>> = FxHashMap::default();

    for (module, _) in stages {
        for reflected in &module.bindings {
            let set = sets.entry(reflected.set).or_default();
            match set.get_mut(&reflected.binding) {
                Some(existing) => {
                    if existing.descriptor_type != reflected.descriptor_type {
                        engine_bail_invalid!("x2::Shader",
                            "Shader '{}': set {} binding {} is {:?} in one stage and {:?} in another",
                            name, reflected.set, reflected.binding,
                            existing.descriptor_type, reflected.descriptor_type);
                    }
                    existing.stages |= module.stage.flags();
                }
                None => {
                    set.insert(reflected.binding, SetBinding {
                        name: reflected.name.clone(),
                        descriptor_type: reflected.descriptor_type,
                        image_dim: reflected.image_dim,
                        count: reflected.count.max(1),
                        stages: module.stage.flags(),
                    });
                }
            }
        }
    }

    let set_count = sets.keys().max().map(|max| max + 1).unwrap_or(0);
    let mut layouts = vec![Vec::new(); set_count as usize];
    let mut slots = FxHashMap::default();

    for (set_index, bindings) in sets {
        let mut ordered: Vec<(u32, SetBinding)> = bindings.into_iter().collect();
        ordered.sort_by_key(|(binding, _)| *binding);

        let slot_name = match ordered.first() {
            Some((0, first)) => first.name.clone(),
            _ => engine_bail_invalid!("x2::Shader",
                "Shader '{}': set {} has no binding 0 to name its slot", name, set_index),
        };

        let signature: Vec<(DescriptorType, Option<ImageDim>)> =
            ordered.iter().map(|(_, b)| (b.descriptor_type, b.image_dim)).collect();
        let slot_type = match classify_slot(&signature) {
            Some(slot_type) => slot_type,
            None => engine_bail_invalid!("x2::Shader",
                "Shader '{}': set {} ('{}') has an unsupported binding combination {:?}",
                name, set_index, slot_name, signature),
        };

        if slots.contains_key(&slot_name) {
            engine_bail_invalid!("x2::Shader",
                "Shader '{}': slot name '{}' used by two sets", name, slot_name);
        }

        layouts[set_index as usize] = ordered
            .iter()
            .map(|(binding, b)| DescriptorSetLayoutBinding {
                binding: *binding,
                descriptor_type: b.descriptor_type,
                count: b.count,
                stages: b.stages,
            })
            .collect();

        slots.insert(slot_name.clone(), SlotDescriptor {
            name: slot_name,
            set: set_index,
            slot_type,
            descriptor_types: signature.into_iter().map(|(t, _)| t).collect(),
        });
    }

    Ok((slots, layouts))
}

/// One range per stage covering all its blocks; identical ranges of
/// different stages are merged into one range with both stage bits
fn merge_push_constants(stages: &[(ReflectedModule, &[u8])]) -> Vec<PushConstantRange> {
    let mut ranges: Vec<PushConstantRange> = Vec::new();

    for (module, _) in stages {
        let start = module.push_constants.iter().map(|p| p.offset).min();
        let end = module.push_constants.iter().map(|p| p.offset + p.size).max();
        let (offset, end) = match (start, end) {
            (Some(start), Some(end)) if end > start => (start, end),
            _ => continue,
        };

        match ranges.iter_mut().find(|r| r.offset == offset && r.size == end - offset) {
            Some(range) => range.stages |= module.stage.flags(),
            None => ranges.push(PushConstantRange {
                stages: module.stage.flags(),
                offset,
                size: end - offset,
            }),
        }
    }
    ranges
}

#[cfg(test)]
#[path = "shader_tests.rs"]
mod tests;
