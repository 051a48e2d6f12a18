/// Mock graphics device for unit tests (no GPU required)
///
/// Every created object gets a numeric id. Object creation/destruction is
/// recorded in `events`, recorded GPU commands in `commands`; tests assert on
/// both. Reflection data is registered per bytecode blob.

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use rustc_hash::{FxHashMap, FxHashSet};
use crate::engine_bail;
use crate::error::Result;
use crate::graphics_device::*;

/// Shared string log
pub type MockLog = Arc<Mutex<Vec<String>>>;

fn event_name(event: &str) -> &str {
    event.split([' ', '(']).next().unwrap_or(event)
}

fn push(log: &MockLog, entry: String) {
    log.lock().unwrap().push(entry);
}

// ============================================================================
// Mock handles
// ============================================================================

pub struct MockBuffer {
    pub id: u64,
    pub data: Mutex<Vec<u8>>,
}

impl GpuBuffer for MockBuffer {
    fn size(&self) -> u64 {
        self.data.lock().unwrap().len() as u64
    }

    fn write(&self, offset: u64, data: &[u8]) -> Result<()> {
        let mut bytes = self.data.lock().unwrap();
        let end = offset as usize + data.len();
        if end > bytes.len() {
            engine_bail!("x2::mock", "write of {} bytes at {} overflows buffer #{}", data.len(), offset, self.id);
        }
        bytes[offset as usize..end].copy_from_slice(data);
        Ok(())
    }

    fn read(&self, offset: u64, len: u64) -> Result<Vec<u8>> {
        let bytes = self.data.lock().unwrap();
        let end = (offset + len) as usize;
        if end > bytes.len() {
            engine_bail!("x2::mock", "read past the end of buffer #{}", self.id);
        }
        Ok(bytes[offset as usize..end].to_vec())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct MockBufferView {
    pub format: Format,
}

impl GpuBufferView for MockBufferView {
    fn format(&self) -> Format {
        self.format
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct MockImage {
    pub id: u64,
    pub desc: ImageDesc,
}

impl GpuImage for MockImage {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct MockImageView {
    pub id: u64,
    pub desc: ImageViewDesc,
}

impl GpuImageView for MockImageView {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct MockSampler;

impl GpuSampler for MockSampler {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct MockRenderPass {
    pub id: u64,
    pub desc: RenderPassDesc,
    events: MockLog,
}

impl GpuRenderPass for MockRenderPass {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for MockRenderPass {
    fn drop(&mut self) {
        push(&self.events, format!("destroy_render_pass #{}", self.id));
    }
}

pub struct MockFramebuffer {
    pub id: u64,
    pub extent: Extent2D,
    pub layers: u32,
    pub attachment_ids: Vec<u64>,
}

impl GpuFramebuffer for MockFramebuffer {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct MockShaderModule;

impl GpuShaderModule for MockShaderModule {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct MockDescriptorSetLayout {
    pub id: u64,
    pub bindings: Vec<DescriptorSetLayoutBinding>,
}

impl GpuDescriptorSetLayout for MockDescriptorSetLayout {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct MockPipeline {
    pub id: u64,
    pub bind_point: PipelineBindPoint,
    pub color_attachment_count: u32,
    pub vertex_input: VertexInputLayout,
    pub set_layout_count: usize,
    pub push_constant_ranges: Vec<PushConstantRange>,
    events: MockLog,
}

impl GpuPipeline for MockPipeline {
    fn bind_point(&self) -> PipelineBindPoint {
        self.bind_point
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for MockPipeline {
    fn drop(&mut self) {
        push(&self.events, format!("destroy_pipeline #{}", self.id));
    }
}

pub struct MockDescriptorSet {
    pub id: u64,
}

impl GpuDescriptorSet for MockDescriptorSet {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct MockSemaphore {
    pub name: &'static str,
}

impl GpuSemaphore for MockSemaphore {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock CommandBuffer
// ============================================================================

pub struct MockCommandBuffer {
    pub id: u64,
    commands: MockLog,
}

impl MockCommandBuffer {
    fn record(&self, command: String) -> Result<()> {
        push(&self.commands, command);
        Ok(())
    }
}

impl CommandBuffer for MockCommandBuffer {
    fn reset(&mut self) -> Result<()> {
        self.record("reset".to_string())
    }

    fn begin(&mut self) -> Result<()> {
        self.record("begin".to_string())
    }

    fn end(&mut self) -> Result<()> {
        self.record("end".to_string())
    }

    fn begin_render_pass(
        &mut self,
        _render_pass: &dyn GpuRenderPass,
        framebuffer: &dyn GpuFramebuffer,
        extent: Extent2D,
        clear_values: &[ClearValue],
    ) -> Result<()> {
        let fb_id = framebuffer
            .as_any()
            .downcast_ref::<MockFramebuffer>()
            .map(|fb| fb.id)
            .unwrap_or(0);
        self.record(format!(
            "begin_render_pass(fb #{}, {}x{}, {} clears)",
            fb_id, extent.width, extent.height, clear_values.len()
        ))
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.record("end_render_pass".to_string())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.record(format!("set_viewport({}x{})", viewport.width, viewport.height))
    }

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()> {
        self.record(format!("set_scissor({}x{})", scissor.width, scissor.height))
    }

    fn bind_pipeline(&mut self, _pipeline: &dyn GpuPipeline) -> Result<()> {
        self.record("bind_pipeline".to_string())
    }

    fn bind_descriptor_set(
        &mut self,
        _pipeline: &dyn GpuPipeline,
        set_index: u32,
        _set: &dyn GpuDescriptorSet,
    ) -> Result<()> {
        self.record(format!("bind_descriptor_set({})", set_index))
    }

    fn push_constants(
        &mut self,
        _pipeline: &dyn GpuPipeline,
        _stages: ShaderStageFlags,
        offset: u32,
        data: &[u8],
    ) -> Result<()> {
        self.record(format!("push_constants({}, {} bytes)", offset, data.len()))
    }

    fn bind_vertex_buffer(&mut self, _buffer: &dyn GpuBuffer, _offset: u64) -> Result<()> {
        self.record("bind_vertex_buffer".to_string())
    }

    fn bind_index_buffer(&mut self, _buffer: &dyn GpuBuffer, _offset: u64, _index_type: IndexType) -> Result<()> {
        self.record("bind_index_buffer".to_string())
    }

    fn draw(&mut self, vertex_count: u32, instance_count: u32, _first_vertex: u32, _first_instance: u32) -> Result<()> {
        self.record(format!("draw({}, {})", vertex_count, instance_count))
    }

    fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        _first_index: u32,
        _vertex_offset: i32,
        _first_instance: u32,
    ) -> Result<()> {
        self.record(format!("draw_indexed({}, {})", index_count, instance_count))
    }

    fn dispatch(&mut self, x: u32, y: u32, z: u32) -> Result<()> {
        self.record(format!("dispatch({}, {}, {})", x, y, z))
    }

    fn pipeline_barrier(&mut self, barriers: &[ImageBarrier]) -> Result<()> {
        let layouts: Vec<String> = barriers
            .iter()
            .map(|b| format!("{:?}->{:?}", b.old_layout, b.new_layout))
            .collect();
        self.record(format!("pipeline_barrier({})", layouts.join(", ")))
    }

    fn blit_image(
        &mut self,
        _src: &dyn GpuImage,
        src_extent: Extent2D,
        _dst: &dyn GpuImage,
        dst_extent: Extent2D,
    ) -> Result<()> {
        self.record(format!(
            "blit_image({}x{} -> {}x{})",
            src_extent.width, src_extent.height, dst_extent.width, dst_extent.height
        ))
    }

    fn submit(&mut self, wait: &[&dyn GpuSemaphore], signal: &[&dyn GpuSemaphore]) -> Result<()> {
        self.record(format!("submit(wait {}, signal {})", wait.len(), signal.len()))
    }

    fn wait(&mut self) -> Result<()> {
        self.record("wait".to_string())
    }
}

// ============================================================================
// Mock Swapchain
// ============================================================================

pub struct MockSwapchain {
    pub extent: Extent2D,
    images: Vec<Arc<dyn GpuImage>>,
    next: Mutex<u32>,
    image_available: MockSemaphore,
    render_finished: MockSemaphore,
    pub events: MockLog,
}

impl MockSwapchain {
    pub fn new(image_count: u32, extent: Extent2D) -> Self {
        let images = (0..image_count)
            .map(|i| {
                Arc::new(MockImage {
                    id: 10_000 + i as u64,
                    desc: ImageDesc::new_2d(extent, Format::B8G8R8A8_UNORM, ImageUsage::TRANSFER_DST),
                }) as Arc<dyn GpuImage>
            })
            .collect();
        Self {
            extent,
            images,
            next: Mutex::new(0),
            image_available: MockSemaphore { name: "image_available" },
            render_finished: MockSemaphore { name: "render_finished" },
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Swapchain for MockSwapchain {
    fn acquire_next_image(&self) -> Result<u32> {
        let mut next = self.next.lock().unwrap();
        let index = *next;
        *next = (index + 1) % self.images.len() as u32;
        push(&self.events, format!("acquire({})", index));
        Ok(index)
    }

    fn present(&self, image_index: u32) -> Result<bool> {
        push(&self.events, format!("present({})", image_index));
        Ok(false)
    }

    fn image(&self, image_index: u32) -> Result<Arc<dyn GpuImage>> {
        match self.images.get(image_index as usize) {
            Some(image) => Ok(image.clone()),
            None => engine_bail!("x2::mock", "swapchain image {} out of range", image_index),
        }
    }

    fn image_available(&self) -> &dyn GpuSemaphore {
        &self.image_available
    }

    fn render_finished(&self) -> &dyn GpuSemaphore {
        &self.render_finished
    }

    fn recreate(&self, extent: Extent2D) -> Result<()> {
        push(&self.events, format!("recreate({}x{})", extent.width, extent.height));
        Ok(())
    }

    fn image_count(&self) -> u32 {
        self.images.len() as u32
    }

    fn extent(&self) -> Extent2D {
        self.extent
    }

    fn format(&self) -> Format {
        Format::B8G8R8A8_UNORM
    }
}

// ============================================================================
// Mock GraphicsDevice
// ============================================================================

/// Recording device
pub struct MockGraphicsDevice {
    next_id: AtomicU64,
    /// Object creation / destruction / descriptor update events
    pub events: MockLog,
    /// Commands recorded by every command buffer, in order
    pub commands: MockLog,
    reflections: Mutex<FxHashMap<Vec<u8>, ReflectedModule>>,
    render_pass_descs: Mutex<Vec<RenderPassDesc>>,
    descriptor_writes: Mutex<Vec<(u64, Vec<(u32, DescriptorType)>)>>,
    failing: Mutex<FxHashSet<&'static str>>,
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            events: Arc::new(Mutex::new(Vec::new())),
            commands: Arc::new(Mutex::new(Vec::new())),
            reflections: Mutex::new(FxHashMap::default()),
            render_pass_descs: Mutex::new(Vec::new()),
            descriptor_writes: Mutex::new(Vec::new()),
            failing: Mutex::new(FxHashSet::default()),
        }
    }

    fn id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn check(&self, operation: &'static str) -> Result<()> {
        if self.failing.lock().unwrap().contains(operation) {
            engine_bail!("x2::mock", "{} failed (injected)", operation);
        }
        Ok(())
    }

    /// Make every following call of `operation` (e.g. "update_descriptor_set") fail
    pub fn fail(&self, operation: &'static str) {
        self.failing.lock().unwrap().insert(operation);
    }

    pub fn clear_failures(&self) {
        self.failing.lock().unwrap().clear();
    }

    /// Register the reflection returned for `code`
    pub fn register_module(&self, code: &[u8], module: ReflectedModule) {
        self.reflections.lock().unwrap().insert(code.to_vec(), module);
    }

    /// Register `modules` under generated bytecode blobs and return the blobs
    pub fn register_shader(&self, name: &str, modules: Vec<ReflectedModule>) -> Vec<Vec<u8>> {
        modules
            .into_iter()
            .enumerate()
            .map(|(i, module)| {
                let code = format!("{}#{}", name, i).into_bytes();
                self.register_module(&code, module);
                code
            })
            .collect()
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    pub fn clear_commands(&self) {
        self.commands.lock().unwrap().clear();
    }

    /// Number of events named `name` (the text before the first space or parenthesis)
    pub fn count_events(&self, name: &str) -> usize {
        self.events.lock().unwrap().iter().filter(|e| event_name(e) == name).count()
    }

    pub fn render_pass_descs(&self) -> Vec<RenderPassDesc> {
        self.render_pass_descs.lock().unwrap().clone()
    }

    /// (descriptor set id, [(binding, type)]) for every update, in order
    pub fn descriptor_writes(&self) -> Vec<(u64, Vec<(u32, DescriptorType)>)> {
        self.descriptor_writes.lock().unwrap().clone()
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn create_buffer(&self, desc: &BufferDesc) -> Result<Arc<dyn GpuBuffer>> {
        self.check("create_buffer")?;
        let id = self.id();
        push(&self.events, format!("create_buffer #{} ({} bytes)", id, desc.size));
        Ok(Arc::new(MockBuffer { id, data: Mutex::new(vec![0u8; desc.size as usize]) }))
    }

    fn create_buffer_view(&self, _buffer: &dyn GpuBuffer, format: Format) -> Result<Arc<dyn GpuBufferView>> {
        self.check("create_buffer_view")?;
        push(&self.events, format!("create_buffer_view ({:?})", format));
        Ok(Arc::new(MockBufferView { format }))
    }

    fn create_image(&self, desc: &ImageDesc) -> Result<Arc<dyn GpuImage>> {
        self.check("create_image")?;
        let id = self.id();
        push(&self.events, format!(
            "create_image #{} ({}x{} {:?} x{})",
            id, desc.extent.width, desc.extent.height, desc.format, desc.array_layers
        ));
        if desc.initial_data.is_some() {
            push(&self.events, format!("upload_image #{}", id));
        }
        Ok(Arc::new(MockImage { id, desc: desc.clone() }))
    }

    fn create_image_view(
        &self,
        _image: &dyn GpuImage,
        _format: Format,
        desc: &ImageViewDesc,
    ) -> Result<Arc<dyn GpuImageView>> {
        self.check("create_image_view")?;
        let id = self.id();
        push(&self.events, format!("create_image_view #{} ({:?})", id, desc.view_type));
        Ok(Arc::new(MockImageView { id, desc: *desc }))
    }

    fn create_sampler(&self, _desc: &SamplerDesc) -> Result<Arc<dyn GpuSampler>> {
        self.check("create_sampler")?;
        push(&self.events, "create_sampler".to_string());
        Ok(Arc::new(MockSampler))
    }

    fn create_render_pass(&self, desc: &RenderPassDesc) -> Result<Arc<dyn GpuRenderPass>> {
        self.check("create_render_pass")?;
        let id = self.id();
        push(&self.events, format!("create_render_pass #{}", id));
        self.render_pass_descs.lock().unwrap().push(desc.clone());
        Ok(Arc::new(MockRenderPass { id, desc: desc.clone(), events: self.events.clone() }))
    }

    fn create_framebuffer(
        &self,
        _render_pass: &dyn GpuRenderPass,
        attachments: &[&dyn GpuImageView],
        extent: Extent2D,
        layers: u32,
    ) -> Result<Arc<dyn GpuFramebuffer>> {
        self.check("create_framebuffer")?;
        let id = self.id();
        let attachment_ids = attachments
            .iter()
            .map(|view| view.as_any().downcast_ref::<MockImageView>().map(|v| v.id).unwrap_or(0))
            .collect();
        push(&self.events, format!("create_framebuffer #{} ({}x{})", id, extent.width, extent.height));
        Ok(Arc::new(MockFramebuffer { id, extent, layers, attachment_ids }))
    }

    fn reflect_shader_module(&self, code: &[u8]) -> Result<ReflectedModule> {
        match self.reflections.lock().unwrap().get(code) {
            Some(module) => Ok(module.clone()),
            None => engine_bail!("x2::mock", "no reflection registered for a {}-byte module", code.len()),
        }
    }

    fn create_shader_module(&self, _code: &[u8]) -> Result<Box<dyn GpuShaderModule>> {
        self.check("create_shader_module")?;
        push(&self.events, "create_shader_module".to_string());
        Ok(Box::new(MockShaderModule))
    }

    fn create_descriptor_set_layout(
        &self,
        bindings: &[DescriptorSetLayoutBinding],
    ) -> Result<Arc<dyn GpuDescriptorSetLayout>> {
        self.check("create_descriptor_set_layout")?;
        let id = self.id();
        push(&self.events, format!("create_descriptor_set_layout #{} ({} bindings)", id, bindings.len()));
        Ok(Arc::new(MockDescriptorSetLayout { id, bindings: bindings.to_vec() }))
    }

    fn create_graphics_pipeline(&self, desc: &GraphicsPipelineDesc) -> Result<Arc<dyn GpuPipeline>> {
        self.check("create_graphics_pipeline")?;
        let id = self.id();
        push(&self.events, format!("create_graphics_pipeline #{} (subpass {})", id, desc.subpass));
        Ok(Arc::new(MockPipeline {
            id,
            bind_point: PipelineBindPoint::Graphics,
            color_attachment_count: desc.color_attachment_count,
            vertex_input: desc.vertex_input.clone(),
            set_layout_count: desc.set_layouts.len(),
            push_constant_ranges: desc.push_constant_ranges.to_vec(),
            events: self.events.clone(),
        }))
    }

    fn create_compute_pipeline(&self, desc: &ComputePipelineDesc) -> Result<Arc<dyn GpuPipeline>> {
        self.check("create_compute_pipeline")?;
        let id = self.id();
        push(&self.events, format!("create_compute_pipeline #{}", id));
        Ok(Arc::new(MockPipeline {
            id,
            bind_point: PipelineBindPoint::Compute,
            color_attachment_count: 0,
            vertex_input: VertexInputLayout::default(),
            set_layout_count: desc.set_layouts.len(),
            push_constant_ranges: desc.push_constant_ranges.to_vec(),
            events: self.events.clone(),
        }))
    }

    fn allocate_descriptor_set(&self, _layout: &dyn GpuDescriptorSetLayout) -> Result<Arc<dyn GpuDescriptorSet>> {
        self.check("allocate_descriptor_set")?;
        let id = self.id();
        push(&self.events, format!("allocate_descriptor_set #{}", id));
        Ok(Arc::new(MockDescriptorSet { id }))
    }

    fn update_descriptor_set(&self, set: &dyn GpuDescriptorSet, writes: &[DescriptorWrite]) -> Result<()> {
        self.check("update_descriptor_set")?;
        let set_id = set.as_any().downcast_ref::<MockDescriptorSet>().map(|s| s.id).unwrap_or(0);
        let summary = writes.iter().map(|w| (w.binding, w.descriptor_type)).collect();
        self.descriptor_writes.lock().unwrap().push((set_id, summary));
        push(&self.events, format!("update_descriptor_set #{} ({} writes)", set_id, writes.len()));
        Ok(())
    }

    fn create_command_buffer(&self) -> Result<Box<dyn CommandBuffer>> {
        self.check("create_command_buffer")?;
        let id = self.id();
        push(&self.events, format!("create_command_buffer #{}", id));
        Ok(Box::new(MockCommandBuffer { id, commands: self.commands.clone() }))
    }

    fn wait_idle(&self) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// Reflection builders
// ============================================================================

pub fn reflected_module(stage: ShaderStage) -> ReflectedModule {
    ReflectedModule {
        stage,
        entry_point: "main".to_string(),
        inputs: Vec::new(),
        outputs: Vec::new(),
        bindings: Vec::new(),
        push_constants: Vec::new(),
    }
}

pub fn variable(name: &str, location: u32) -> ReflectedVariable {
    ReflectedVariable { name: name.to_string(), location }
}

pub fn binding(
    name: &str,
    set: u32,
    binding: u32,
    descriptor_type: DescriptorType,
    image_dim: Option<ImageDim>,
) -> ReflectedBinding {
    ReflectedBinding { name: name.to_string(), set, binding, descriptor_type, image_dim, count: 1 }
}

/// Vertex stage reading every `Vertex` field
pub fn mesh_vertex_module() -> ReflectedModule {
    let mut module = reflected_module(ShaderStage::Vertex);
    module.inputs = vec![
        variable("inPosition", 0),
        variable("inTexCoord", 1),
        variable("inNormal", 2),
    ];
    module
}

/// Vertex stage of a full-screen triangle (no inputs)
pub fn full_screen_vertex_module() -> ReflectedModule {
    reflected_module(ShaderStage::Vertex)
}

/// Fragment stage writing `outputs` in order
pub fn fragment_module(outputs: &[&str], bindings: Vec<ReflectedBinding>) -> ReflectedModule {
    let mut module = reflected_module(ShaderStage::Fragment);
    module.outputs = outputs
        .iter()
        .enumerate()
        .map(|(i, name)| variable(name, i as u32))
        .collect();
    module.bindings = bindings;
    module
}

// ============================================================================
// Context
// ============================================================================

/// Mock device plus a context with every built-in render pass registered
pub fn mock_context() -> (Arc<MockGraphicsDevice>, Arc<crate::context::GraphicsContext>) {
    let device = Arc::new(MockGraphicsDevice::new());
    let ctx = crate::context::GraphicsContext::new(device.clone()).unwrap();
    (device, ctx)
}
