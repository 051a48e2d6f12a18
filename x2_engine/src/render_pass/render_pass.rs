/// Name-based render pass settings and the compiled render pass
///
/// Attachments, subpasses and dependencies are declared by name in a
/// [`RenderPassSettings`]. Compilation resolves names to indices:
/// - attachment index = declaration order of the attachment
/// - color reference order = the subpass's declared color list order, which
///   is also the fragment output location order
///
/// Each compiled subpass keeps a color-attachment name -> index map used to
/// validate fragment shader outputs.

use std::sync::Arc;
use rustc_hash::FxHashMap;
use crate::engine_bail_invalid;
use crate::error::Result;
use crate::graphics_device::{
    AccessFlags, AttachmentDesc, AttachmentRef, Format, GpuRenderPass, GraphicsDevice, ImageLayout,
    LoadOp, PipelineBindPoint, PipelineStage, RenderPassDesc, SampleCount, StoreOp,
    SubpassDependencyDesc, SubpassDesc, SUBPASS_EXTERNAL,
};

/// Subpass name standing for "outside the render pass" in dependencies
pub const EXTERNAL_SUBPASS: &str = "External";

// ===== ATTACHMENT =====

/// One named attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentDescriptor {
    pub format: Format,
    pub samples: SampleCount,
    pub load_op: LoadOp,
    pub store_op: StoreOp,
    pub stencil_load_op: LoadOp,
    pub stencil_store_op: StoreOp,
    pub initial_layout: ImageLayout,
    pub final_layout: ImageLayout,
    /// Layout while a subpass uses the attachment
    pub subpass_layout: ImageLayout,
}

impl AttachmentDescriptor {
    /// Cleared, stored color attachment left readable by shaders
    pub fn color(format: Format) -> Self {
        Self {
            format,
            samples: SampleCount::S1,
            load_op: LoadOp::Clear,
            store_op: StoreOp::Store,
            stencil_load_op: LoadOp::DontCare,
            stencil_store_op: StoreOp::DontCare,
            initial_layout: ImageLayout::Undefined,
            final_layout: ImageLayout::ShaderReadOnlyOptimal,
            subpass_layout: ImageLayout::ColorAttachmentOptimal,
        }
    }

    /// Cleared, stored depth attachment left readable by shaders
    pub fn depth(format: Format) -> Self {
        Self {
            subpass_layout: ImageLayout::DepthStencilAttachmentOptimal,
            ..Self::color(format)
        }
    }

    pub fn with_load_op(mut self, load_op: LoadOp) -> Self {
        self.load_op = load_op;
        self
    }

    pub fn with_store_op(mut self, store_op: StoreOp) -> Self {
        self.store_op = store_op;
        self
    }

    pub fn with_layouts(mut self, initial: ImageLayout, final_layout: ImageLayout) -> Self {
        self.initial_layout = initial;
        self.final_layout = final_layout;
        self
    }

    pub fn with_samples(mut self, samples: SampleCount) -> Self {
        self.samples = samples;
        self
    }
}

// ===== SUBPASS =====

/// One named subpass
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubpassDescriptor {
    pub bind_point: PipelineBindPoint,
    /// Color attachment names; order = fragment output locations
    pub color_attachments: Vec<String>,
    pub depth_stencil_attachment: Option<String>,
    pub input_attachments: Vec<String>,
}

impl SubpassDescriptor {
    /// Graphics subpass writing `colors` (in location order) and an optional depth attachment
    pub fn graphics(colors: &[&str], depth: Option<&str>) -> Self {
        Self {
            bind_point: PipelineBindPoint::Graphics,
            color_attachments: colors.iter().map(|c| c.to_string()).collect(),
            depth_stencil_attachment: depth.map(str::to_string),
            input_attachments: Vec::new(),
        }
    }

    pub fn with_input_attachments(mut self, inputs: &[&str]) -> Self {
        self.input_attachments = inputs.iter().map(|i| i.to_string()).collect();
        self
    }
}

// ===== DEPENDENCY =====

/// Dependency between two named subpasses (or [`EXTERNAL_SUBPASS`])
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyDescriptor {
    pub src_subpass: String,
    pub dst_subpass: String,
    pub src_stage: PipelineStage,
    pub dst_stage: PipelineStage,
    pub src_access: AccessFlags,
    pub dst_access: AccessFlags,
    pub by_region: bool,
}

// ===== SETTINGS =====

/// Declarative description of a render pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderPassSettings {
    attachments: Vec<(String, AttachmentDescriptor)>,
    subpasses: Vec<(String, SubpassDescriptor)>,
    dependencies: Vec<DependencyDescriptor>,
}

impl RenderPassSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an attachment. Re-declaring a name replaces it in place.
    pub fn add_attachment(&mut self, name: &str, descriptor: AttachmentDescriptor) -> &mut Self {
        match self.attachments.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = descriptor,
            None => self.attachments.push((name.to_string(), descriptor)),
        }
        self
    }

    /// Declare a subpass. Re-declaring a name replaces it in place.
    pub fn add_subpass(&mut self, name: &str, descriptor: SubpassDescriptor) -> &mut Self {
        match self.subpasses.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = descriptor,
            None => self.subpasses.push((name.to_string(), descriptor)),
        }
        self
    }

    pub fn add_dependency(&mut self, dependency: DependencyDescriptor) -> &mut Self {
        self.dependencies.push(dependency);
        self
    }

    /// External -> `subpass` and `subpass` -> External dependencies covering
    /// attachment writes before and shader reads after the pass.
    pub fn add_external_dependencies(&mut self, subpass: &str) -> &mut Self {
        let attachment_stages = PipelineStage::COLOR_ATTACHMENT_OUTPUT
            | PipelineStage::EARLY_FRAGMENT_TESTS
            | PipelineStage::LATE_FRAGMENT_TESTS;
        let attachment_writes = AccessFlags::COLOR_ATTACHMENT_WRITE | AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE;

        self.add_dependency(DependencyDescriptor {
            src_subpass: EXTERNAL_SUBPASS.to_string(),
            dst_subpass: subpass.to_string(),
            src_stage: attachment_stages | PipelineStage::FRAGMENT_SHADER | PipelineStage::TRANSFER,
            dst_stage: attachment_stages | PipelineStage::FRAGMENT_SHADER,
            src_access: attachment_writes | AccessFlags::TRANSFER_WRITE,
            dst_access: attachment_writes | AccessFlags::SHADER_READ | AccessFlags::COLOR_ATTACHMENT_READ,
            by_region: true,
        });
        self.add_dependency(DependencyDescriptor {
            src_subpass: subpass.to_string(),
            dst_subpass: EXTERNAL_SUBPASS.to_string(),
            src_stage: attachment_stages,
            dst_stage: PipelineStage::FRAGMENT_SHADER | PipelineStage::TRANSFER | attachment_stages,
            src_access: attachment_writes,
            dst_access: AccessFlags::SHADER_READ | AccessFlags::TRANSFER_READ | attachment_writes,
            by_region: true,
        })
    }

    pub fn attachments(&self) -> &[(String, AttachmentDescriptor)] {
        &self.attachments
    }

    pub fn subpasses(&self) -> &[(String, SubpassDescriptor)] {
        &self.subpasses
    }

    pub fn dependencies(&self) -> &[DependencyDescriptor] {
        &self.dependencies
    }

    fn attachment_index(&self, pass_name: &str, name: &str) -> Result<u32> {
        match self.attachments.iter().position(|(n, _)| n == name) {
            Some(index) => Ok(index as u32),
            None => engine_bail_invalid!("x2::RenderPass",
                "Render pass '{}' references undeclared attachment '{}'", pass_name, name),
        }
    }

    fn subpass_index(&self, pass_name: &str, name: &str) -> Result<u32> {
        if name == EXTERNAL_SUBPASS {
            return Ok(SUBPASS_EXTERNAL);
        }
        match self.subpasses.iter().position(|(n, _)| n == name) {
            Some(index) => Ok(index as u32),
            None => engine_bail_invalid!("x2::RenderPass",
                "Render pass '{}' references undeclared subpass '{}'", pass_name, name),
        }
    }

    /// Resolve every name to an index
    ///
    /// Returns the native description and, per subpass, its layout info.
    pub fn compile(&self, pass_name: &str) -> Result<(RenderPassDesc, Vec<SubpassInfo>)> {
        if self.subpasses.is_empty() {
            engine_bail_invalid!("x2::RenderPass", "Render pass '{}' declares no subpass", pass_name);
        }

        let attachments = self
            .attachments
            .iter()
            .map(|(_, a)| AttachmentDesc {
                format: a.format,
                samples: a.samples,
                load_op: a.load_op,
                store_op: a.store_op,
                stencil_load_op: a.stencil_load_op,
                stencil_store_op: a.stencil_store_op,
                initial_layout: a.initial_layout,
                final_layout: a.final_layout,
            })
            .collect();

        let mut subpasses = Vec::with_capacity(self.subpasses.len());
        let mut infos = Vec::with_capacity(self.subpasses.len());

        for (subpass_index, (subpass_name, subpass)) in self.subpasses.iter().enumerate() {
            let reference = |name: &str| -> Result<AttachmentRef> {
                let attachment = self.attachment_index(pass_name, name)?;
                Ok(AttachmentRef {
                    attachment,
                    layout: self.attachments[attachment as usize].1.subpass_layout,
                })
            };

            let mut color_refs = Vec::with_capacity(subpass.color_attachments.len());
            let mut color_indices = FxHashMap::default();
            for (column, name) in subpass.color_attachments.iter().enumerate() {
                color_refs.push(reference(name)?);
                color_indices.insert(name.clone(), column as u32);
            }

            let depth_ref = match &subpass.depth_stencil_attachment {
                Some(name) => Some(reference(name)?),
                None => None,
            };

            let input_refs = subpass
                .input_attachments
                .iter()
                .map(|name| {
                    let attachment = self.attachment_index(pass_name, name)?;
                    Ok(AttachmentRef { attachment, layout: ImageLayout::ShaderReadOnlyOptimal })
                })
                .collect::<Result<Vec<_>>>()?;

            subpasses.push(SubpassDesc {
                bind_point: subpass.bind_point,
                color_attachments: color_refs,
                depth_stencil_attachment: depth_ref,
                input_attachments: input_refs,
            });
            infos.push(SubpassInfo {
                name: subpass_name.clone(),
                index: subpass_index as u32,
                color_attachments: subpass.color_attachments.clone(),
                color_attachment_indices: color_indices,
                depth_stencil_attachment: subpass.depth_stencil_attachment.clone(),
            });
        }

        let dependencies = self
            .dependencies
            .iter()
            .map(|d| {
                Ok(SubpassDependencyDesc {
                    src_subpass: self.subpass_index(pass_name, &d.src_subpass)?,
                    dst_subpass: self.subpass_index(pass_name, &d.dst_subpass)?,
                    src_stage: d.src_stage,
                    dst_stage: d.dst_stage,
                    src_access: d.src_access,
                    dst_access: d.dst_access,
                    by_region: d.by_region,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok((RenderPassDesc { attachments, subpasses, dependencies }, infos))
    }
}

// ===== COMPILED RENDER PASS =====

/// Compiled layout of one subpass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubpassInfo {
    pub name: String,
    pub index: u32,
    color_attachments: Vec<String>,
    color_attachment_indices: FxHashMap<String, u32>,
    depth_stencil_attachment: Option<String>,
}

impl SubpassInfo {
    /// Column of a color attachment (= fragment output location)
    pub fn color_attachment_index(&self, name: &str) -> Option<u32> {
        self.color_attachment_indices.get(name).copied()
    }

    /// Color attachment names in location order
    pub fn color_attachments(&self) -> &[String] {
        &self.color_attachments
    }

    pub fn depth_stencil_attachment(&self) -> Option<&str> {
        self.depth_stencil_attachment.as_deref()
    }
}

/// A compiled render pass
///
/// Immutable once compiled; shared between shaders, framebuffers and
/// features through `Arc`.
pub struct RenderPass {
    name: String,
    gpu: Arc<dyn GpuRenderPass>,
    settings: RenderPassSettings,
    subpasses: Vec<SubpassInfo>,
}

impl RenderPass {
    /// Compile `settings` into a native render pass
    pub fn compile(device: &dyn GraphicsDevice, name: &str, settings: RenderPassSettings) -> Result<Self> {
        let (desc, subpasses) = settings.compile(name)?;
        let gpu = device.create_render_pass(&desc)?;
        Ok(Self {
            name: name.to_string(),
            gpu,
            settings,
            subpasses,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn gpu_render_pass(&self) -> &dyn GpuRenderPass {
        self.gpu.as_ref()
    }

    pub fn settings(&self) -> &RenderPassSettings {
        &self.settings
    }

    pub fn subpasses(&self) -> &[SubpassInfo] {
        &self.subpasses
    }

    /// Look up a subpass by name
    pub fn subpass(&self, name: &str) -> Result<&SubpassInfo> {
        match self.subpasses.iter().find(|s| s.name == name) {
            Some(info) => Ok(info),
            None => engine_bail_invalid!("x2::RenderPass",
                "Render pass '{}' has no subpass '{}'", self.name, name),
        }
    }

    pub fn attachment_count(&self) -> usize {
        self.settings.attachments.len()
    }

    /// Attachment names in attachment index order
    pub fn attachment_names(&self) -> impl Iterator<Item = &str> {
        self.settings.attachments.iter().map(|(n, _)| n.as_str())
    }

    pub fn attachment_index(&self, name: &str) -> Option<usize> {
        self.settings.attachments.iter().position(|(n, _)| n == name)
    }

    pub fn attachment(&self, name: &str) -> Option<&AttachmentDescriptor> {
        self.settings.attachments.iter().find(|(n, _)| n == name).map(|(_, a)| a)
    }
}

impl std::fmt::Debug for RenderPass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderPass")
            .field("name", &self.name)
            .field("subpasses", &self.subpasses)
            .finish()
    }
}

#[cfg(test)]
#[path = "render_pass_tests.rs"]
mod tests;
